mod client;

pub use client::{
    Attempt, Clock, ContactForm, Dispatch, Liveness, SubmissionClient, SystemClock,
};

use std::{future::Future, sync::LazyLock};

use chrono::TimeDelta;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// How long a success or error banner stays up before the form goes idle again.
pub const RESET_DELAY_MS: i64 = 5_000;

pub const FALLBACK_MESSAGE: &str = "Failed to send message. Please try again later.";

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern should compile")
});

pub fn reset_delay() -> TimeDelta {
    TimeDelta::milliseconds(RESET_DELAY_MS)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Name,
    Email,
    Subject,
    Message,
}

impl Field {
    pub const ALL: [Field; 4] = [Field::Name, Field::Email, Field::Subject, Field::Message];

    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Name => "name",
            Field::Email => "email",
            Field::Subject => "subject",
            Field::Message => "message",
        }
    }

    pub fn placeholder(&self) -> &'static str {
        match self {
            Field::Name => "Name",
            Field::Email => "E-Mail",
            Field::Subject => "Subject",
            Field::Message => "Message",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormFields {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
}

impl FormFields {
    pub fn get(&self, field: Field) -> &str {
        match field {
            Field::Name => &self.name,
            Field::Email => &self.email,
            Field::Subject => &self.subject,
            Field::Message => &self.message,
        }
    }

    pub fn set(&mut self, field: Field, value: String) {
        let slot = match field {
            Field::Name => &mut self.name,
            Field::Email => &mut self.email,
            Field::Subject => &mut self.subject,
            Field::Message => &mut self.message,
        };
        *slot = value;
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Checks the fields the same way on both sides of the server function:
    /// every field present, then the email shape.
    pub fn validate(&self) -> Result<(), ContactError> {
        if Field::ALL
            .iter()
            .any(|field| self.get(*field).is_empty())
        {
            return Err(ContactError::MissingFields);
        }
        if !is_valid_email(&self.email) {
            return Err(ContactError::InvalidEmail);
        }
        Ok(())
    }
}

/// `<local>@<domain>.<tld>` with no whitespace and exactly one `@`.
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SubmissionState {
    #[default]
    Idle,
    Sending,
    Success,
    Error(String),
}

impl SubmissionState {
    pub fn is_sending(&self) -> bool {
        matches!(self, SubmissionState::Sending)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, SubmissionState::Success | SubmissionState::Error(_))
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            SubmissionState::Error(reason) => Some(reason),
            _ => None,
        }
    }
}

/// Everything that can end a submission badly. The `Display` text is what the
/// form shows to the visitor.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ContactError {
    #[error("All fields are required")]
    MissingFields,
    #[error("Invalid email address")]
    InvalidEmail,
    #[error("{0}")]
    Rejected(String),
    #[error("Failed to send message. Please try again later.")]
    Unavailable,
}

impl ContactError {
    fn from_relay(result: Result<RelayReply, GatewayError>) -> Result<(), Self> {
        match result {
            Ok(RelayReply { success: true, .. }) => Ok(()),
            Ok(RelayReply {
                message: Some(message),
                ..
            }) if !message.trim().is_empty() => Err(ContactError::Rejected(message)),
            Ok(_) => Err(ContactError::Unavailable),
            Err(err) => {
                log::warn!("contact relay failed: {err}");
                Err(ContactError::Unavailable)
            }
        }
    }
}

/// Provider-independent outcome of a single relay request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayReply {
    pub success: bool,
    pub message: Option<String>,
}

impl RelayReply {
    pub fn delivered(message: Option<String>) -> Self {
        Self {
            success: true,
            message,
        }
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    #[error("relay unreachable: {0}")]
    Transport(String),
    #[error("relay answered with status {0}")]
    Status(u16),
    #[error("malformed relay response: {0}")]
    Malformed(String),
}

/// The one operation the form needs from whatever forwards messages to an inbox.
pub trait RelayGateway {
    fn send(&self, fields: &FormFields)
        -> impl Future<Output = Result<RelayReply, GatewayError>>;
}
