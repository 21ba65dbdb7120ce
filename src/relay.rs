//! Server-side forwarding of contact messages to a forms-as-a-service relay.
//!
//! Two request shapes are supported: a JSON body posted to a FormSubmit-style
//! AJAX endpoint, and a multipart body carrying an access key for
//! Web3Forms-style endpoints. Both answer with a JSON body holding a success
//! flag and an optional message.

use std::{sync::Arc, time::Duration};

use http::{header::ACCEPT, StatusCode};
use reqwest::multipart::Form;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::contact::{FormFields, GatewayError, RelayGateway, RelayReply};

const FORMSUBMIT_ENDPOINT: &str = "https://formsubmit.co/ajax/";
const WEB3FORMS_ENDPOINT: &str = "https://api.web3forms.com/submit";
const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayProvider {
    Json { endpoint: Url },
    Multipart { endpoint: Url, access_key: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayConfig {
    pub provider: RelayProvider,
    pub timeout: Duration,
}

#[derive(Error, Debug)]
pub enum RelayConfigError {
    #[error("missing configuration: {0}")]
    Missing(&'static str),
    #[error("unknown contact relay {0:?}, expected \"web3forms\" or \"formsubmit\"")]
    UnknownProvider(String),
    #[error("invalid url in {var}: {source}")]
    InvalidUrl {
        var: &'static str,
        #[source]
        source: url::ParseError,
    },
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

impl RelayConfig {
    /// Loads the relay settings from the process environment.
    pub fn from_env() -> Result<Self, RelayConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(
        lookup: impl Fn(&'static str) -> Option<String>,
    ) -> Result<Self, RelayConfigError> {
        let var = |key: &'static str| lookup(key).filter(|v| !v.trim().is_empty());
        let access_key = var("WEB3FORMS_ACCESS_KEY");
        let endpoint_override = var("CONTACT_RELAY_URL")
            .map(|raw| {
                Url::parse(&raw).map_err(|source| RelayConfigError::InvalidUrl {
                    var: "CONTACT_RELAY_URL",
                    source,
                })
            })
            .transpose()?;

        let kind = var("CONTACT_RELAY").unwrap_or_else(|| {
            if access_key.is_some() {
                "web3forms".to_string()
            } else {
                "formsubmit".to_string()
            }
        });

        let provider = match kind.to_ascii_lowercase().as_str() {
            "web3forms" => RelayProvider::Multipart {
                endpoint: match endpoint_override {
                    Some(url) => url,
                    None => Url::parse(WEB3FORMS_ENDPOINT).map_err(|source| {
                        RelayConfigError::InvalidUrl {
                            var: "CONTACT_RELAY_URL",
                            source,
                        }
                    })?,
                },
                access_key: access_key.ok_or(RelayConfigError::Missing("WEB3FORMS_ACCESS_KEY"))?,
            },
            "formsubmit" => RelayProvider::Json {
                endpoint: match endpoint_override {
                    Some(url) => url,
                    None => {
                        let inbox = var("CONTACT_INBOX")
                            .ok_or(RelayConfigError::Missing("CONTACT_INBOX"))?;
                        Url::parse(FORMSUBMIT_ENDPOINT)
                            .and_then(|base| base.join(inbox.trim()))
                            .map_err(|source| RelayConfigError::InvalidUrl {
                                var: "CONTACT_INBOX",
                                source,
                            })?
                    }
                },
            },
            other => return Err(RelayConfigError::UnknownProvider(other.to_string())),
        };

        let timeout = match var("CONTACT_RELAY_TIMEOUT_SECS") {
            Some(raw) => raw.trim().parse::<u64>().map_err(|_| {
                RelayConfigError::Invalid(format!("CONTACT_RELAY_TIMEOUT_SECS={raw}"))
            })?,
            None => DEFAULT_TIMEOUT_SECS,
        };

        Ok(Self {
            provider,
            timeout: Duration::from_secs(timeout),
        })
    }
}

/// Posts contact messages to the configured provider.
#[derive(Debug, Clone)]
pub struct HttpRelay {
    client: reqwest::Client,
    provider: Arc<RelayProvider>,
}

impl HttpRelay {
    pub fn new(config: RelayConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            provider: Arc::new(config.provider),
        })
    }
}

#[derive(Serialize)]
struct JsonPayload<'a> {
    name: &'a str,
    email: &'a str,
    subject: &'a str,
    message: &'a str,
    #[serde(rename = "_captcha")]
    captcha: &'static str,
    #[serde(rename = "_template")]
    template: &'static str,
}

impl RelayGateway for HttpRelay {
    async fn send(&self, fields: &FormFields) -> Result<RelayReply, GatewayError> {
        let request = match &*self.provider {
            RelayProvider::Json { endpoint } => self.client.post(endpoint.clone()).json(&JsonPayload {
                name: &fields.name,
                email: &fields.email,
                subject: &fields.subject,
                message: &fields.message,
                captcha: "false",
                template: "table",
            }),
            RelayProvider::Multipart {
                endpoint,
                access_key,
            } => {
                let form = Form::new()
                    .text("access_key", access_key.clone())
                    .text("name", fields.name.clone())
                    .text("email", fields.email.clone())
                    .text("subject", fields.subject.clone())
                    .text("message", fields.message.clone());
                self.client.post(endpoint.clone()).multipart(form)
            }
        };

        let response = request
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|err| GatewayError::Transport(err.to_string()))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|err| GatewayError::Transport(err.to_string()))?;

        tracing::debug!(%status, "contact relay answered");
        interpret_response(status, &body)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SuccessFlag {
    Bool(bool),
    Text(String),
}

impl SuccessFlag {
    fn is_success(&self) -> bool {
        match self {
            SuccessFlag::Bool(b) => *b,
            SuccessFlag::Text(s) => s.eq_ignore_ascii_case("true"),
        }
    }
}

#[derive(Deserialize)]
struct ProviderResponse {
    success: Option<SuccessFlag>,
    message: Option<String>,
    error: Option<String>,
}

impl ProviderResponse {
    fn reason(self) -> Option<String> {
        self.message
            .or(self.error)
            .filter(|m| !m.trim().is_empty())
    }
}

/// Turns a provider answer into a [`RelayReply`]. A non-2xx status is a failure
/// whatever the body says.
pub fn interpret_response(status: StatusCode, body: &str) -> Result<RelayReply, GatewayError> {
    let parsed = serde_json::from_str::<ProviderResponse>(body);

    if !status.is_success() {
        return match parsed.ok().and_then(ProviderResponse::reason) {
            Some(reason) => Ok(RelayReply::rejected(reason)),
            None => Err(GatewayError::Status(status.as_u16())),
        };
    }

    let parsed = parsed.map_err(|err| GatewayError::Malformed(err.to_string()))?;
    let success = parsed.success.as_ref().is_some_and(SuccessFlag::is_success);
    let reason = parsed.reason();
    Ok(RelayReply {
        success,
        message: reason,
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&'static str, &str)]) -> impl Fn(&'static str) -> Option<String> {
        let map = pairs
            .iter()
            .map(|(k, v)| (*k, v.to_string()))
            .collect::<HashMap<_, _>>();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_config_defaults_to_web3forms_with_key() {
        let config = RelayConfig::from_lookup(lookup(&[("WEB3FORMS_ACCESS_KEY", "abc")])).unwrap();
        assert_eq!(
            config.provider,
            RelayProvider::Multipart {
                endpoint: Url::parse(WEB3FORMS_ENDPOINT).unwrap(),
                access_key: "abc".to_string(),
            }
        );
        assert_eq!(config.timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
    }

    #[test]
    fn test_config_formsubmit_inbox() {
        let config = RelayConfig::from_lookup(lookup(&[
            ("CONTACT_INBOX", "me@example.com"),
            ("CONTACT_RELAY_TIMEOUT_SECS", "3"),
        ]))
        .unwrap();
        assert_eq!(
            config.provider,
            RelayProvider::Json {
                endpoint: Url::parse("https://formsubmit.co/ajax/me@example.com").unwrap(),
            }
        );
        assert_eq!(config.timeout, Duration::from_secs(3));
    }

    #[test]
    fn test_config_url_override() {
        let config = RelayConfig::from_lookup(lookup(&[
            ("CONTACT_RELAY", "FormSubmit"),
            ("CONTACT_RELAY_URL", "http://127.0.0.1:9000/relay"),
        ]))
        .unwrap();
        assert_eq!(
            config.provider,
            RelayProvider::Json {
                endpoint: Url::parse("http://127.0.0.1:9000/relay").unwrap(),
            }
        );
    }

    #[test]
    fn test_config_errors() {
        assert!(matches!(
            RelayConfig::from_lookup(lookup(&[])),
            Err(RelayConfigError::Missing("CONTACT_INBOX"))
        ));
        assert!(matches!(
            RelayConfig::from_lookup(lookup(&[("CONTACT_RELAY", "web3forms")])),
            Err(RelayConfigError::Missing("WEB3FORMS_ACCESS_KEY"))
        ));
        assert!(matches!(
            RelayConfig::from_lookup(lookup(&[("CONTACT_RELAY", "carrier-pigeon")])),
            Err(RelayConfigError::UnknownProvider(_))
        ));
        assert!(matches!(
            RelayConfig::from_lookup(lookup(&[
                ("WEB3FORMS_ACCESS_KEY", "abc"),
                ("CONTACT_RELAY_URL", "not a url"),
            ])),
            Err(RelayConfigError::InvalidUrl { .. })
        ));
        assert!(matches!(
            RelayConfig::from_lookup(lookup(&[
                ("WEB3FORMS_ACCESS_KEY", "abc"),
                ("CONTACT_RELAY_TIMEOUT_SECS", "soon"),
            ])),
            Err(RelayConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_boolean_success() {
        let reply =
            interpret_response(StatusCode::OK, r#"{"success":true,"message":"Email sent"}"#)
                .unwrap();
        assert_eq!(reply, RelayReply::delivered(Some("Email sent".to_string())));
    }

    #[test]
    fn test_string_success_flag() {
        let reply = interpret_response(
            StatusCode::OK,
            r#"{"success":"true","message":"The form was submitted successfully."}"#,
        )
        .unwrap();
        assert!(reply.success);

        let reply = interpret_response(
            StatusCode::OK,
            r#"{"success":"false","message":"This form needs Activation."}"#,
        )
        .unwrap();
        assert_eq!(reply, RelayReply::rejected("This form needs Activation."));
    }

    #[test]
    fn test_provider_failure_message() {
        let reply =
            interpret_response(StatusCode::OK, r#"{"success":false,"message":"Quota exceeded"}"#)
                .unwrap();
        assert_eq!(reply, RelayReply::rejected("Quota exceeded"));

        let reply = interpret_response(StatusCode::OK, r#"{"error":"Bad key"}"#).unwrap();
        assert_eq!(reply, RelayReply::rejected("Bad key"));
    }

    #[test]
    fn test_error_status_wins_over_body() {
        let reply = interpret_response(
            StatusCode::TOO_MANY_REQUESTS,
            r#"{"success":true,"message":"Slow down"}"#,
        )
        .unwrap();
        assert_eq!(reply, RelayReply::rejected("Slow down"));

        assert_eq!(
            interpret_response(StatusCode::BAD_GATEWAY, "<html>oops</html>"),
            Err(GatewayError::Status(502))
        );
        assert_eq!(
            interpret_response(StatusCode::INTERNAL_SERVER_ERROR, r#"{"success":true}"#),
            Err(GatewayError::Status(500))
        );
    }

    #[test]
    fn test_malformed_success_body() {
        assert!(matches!(
            interpret_response(StatusCode::OK, "Thanks!"),
            Err(GatewayError::Malformed(_))
        ));

        let reply = interpret_response(StatusCode::OK, "{}").unwrap();
        assert_eq!(reply, RelayReply::default());
    }
}
