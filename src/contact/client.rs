use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use chrono::{DateTime, Utc};

use super::{
    reset_delay, ContactError, Field, FormFields, GatewayError, RelayGateway, RelayReply,
    SubmissionState,
};

pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Shared "still mounted" flag. Once ended, completions for the instance are dropped.
#[derive(Debug, Clone)]
pub struct Liveness(Arc<AtomicBool>);

impl Liveness {
    fn new() -> Self {
        Self(Arc::new(AtomicBool::new(true)))
    }

    pub fn is_alive(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    pub fn end(&self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Ticket for one outbound relay request.
#[derive(Debug, Clone)]
pub struct Dispatch {
    attempt: u64,
    fields: FormFields,
    liveness: Liveness,
}

impl Dispatch {
    pub fn fields(&self) -> &FormFields {
        &self.fields
    }

    pub fn is_live(&self) -> bool {
        self.liveness.is_alive()
    }
}

#[derive(Debug)]
pub enum Attempt {
    /// Fields passed validation; the caller must send them and report back.
    Send(Dispatch),
    /// Validation failed and the form is now in the error state.
    Rejected(ContactError),
    /// A request is already outstanding.
    InFlight,
}

/// Field values and submission status for one mounted contact form.
#[derive(Debug)]
pub struct ContactForm<C = SystemClock> {
    clock: C,
    fields: FormFields,
    state: SubmissionState,
    reset_at: Option<DateTime<Utc>>,
    attempt: u64,
    liveness: Liveness,
}

impl Default for ContactForm<SystemClock> {
    fn default() -> Self {
        Self::new(SystemClock)
    }
}

impl<C: Clock> ContactForm<C> {
    pub fn new(clock: C) -> Self {
        Self {
            clock,
            fields: FormFields::default(),
            state: SubmissionState::Idle,
            reset_at: None,
            attempt: 0,
            liveness: Liveness::new(),
        }
    }

    pub fn fields(&self) -> &FormFields {
        &self.fields
    }

    pub fn state(&self) -> &SubmissionState {
        &self.state
    }

    pub fn reset_deadline(&self) -> Option<DateTime<Utc>> {
        self.reset_at
    }

    pub fn liveness(&self) -> Liveness {
        self.liveness.clone()
    }

    /// Returns `false` when the edit was ignored because a request is in flight.
    pub fn update_field(&mut self, field: Field, value: String) -> bool {
        if self.state.is_sending() {
            return false;
        }
        self.fields.set(field, value);
        true
    }

    pub fn begin_submit(&mut self) -> Attempt {
        if self.state.is_sending() {
            return Attempt::InFlight;
        }
        if let Err(err) = self.fields.validate() {
            self.finish(Err(err.clone()));
            return Attempt::Rejected(err);
        }

        self.attempt += 1;
        self.reset_at = None;
        self.state = SubmissionState::Sending;
        Attempt::Send(Dispatch {
            attempt: self.attempt,
            fields: self.fields.clone(),
            liveness: self.liveness.clone(),
        })
    }

    /// Applies the relay's answer. Returns `false` if the dispatch no longer
    /// belongs to this form (unmounted, reset, or superseded).
    pub fn complete(
        &mut self,
        dispatch: &Dispatch,
        result: Result<RelayReply, GatewayError>,
    ) -> bool {
        if !dispatch.is_live() || dispatch.attempt != self.attempt || !self.state.is_sending() {
            return false;
        }
        self.finish(ContactError::from_relay(result));
        true
    }

    fn finish(&mut self, outcome: Result<(), ContactError>) {
        match outcome {
            Ok(()) => {
                self.state = SubmissionState::Success;
                self.fields.clear();
            }
            Err(err) => self.state = SubmissionState::Error(err.to_string()),
        }
        self.reset_at = Some(self.clock.now() + reset_delay());
    }

    /// Returns to idle once the reset deadline has passed. Returns `true` if it did.
    pub fn tick(&mut self) -> bool {
        match self.reset_at {
            Some(deadline) if self.clock.now() >= deadline => {
                self.reset_at = None;
                self.state = SubmissionState::Idle;
                true
            }
            _ => false,
        }
    }

    /// Called by the one-shot reset timer. Goes idle whenever a deadline is still
    /// armed, without consulting the clock, so a wall clock that lags the timer
    /// cannot leave a banner up. A submission that started since the timer was
    /// armed has already cleared the deadline and is left alone.
    pub fn expire(&mut self) -> bool {
        if self.reset_at.take().is_none() || !self.state.is_terminal() {
            return false;
        }
        self.state = SubmissionState::Idle;
        true
    }

    pub fn reset(&mut self) {
        self.fields.clear();
        self.state = SubmissionState::Idle;
        self.reset_at = None;
        // orphan whatever is still in flight
        self.attempt += 1;
    }

    pub fn unmount(&mut self) {
        self.liveness.end();
    }
}

/// A [`ContactForm`] that owns its gateway, for callers that can hold the form
/// across the relay call.
pub struct SubmissionClient<G, C = SystemClock> {
    form: ContactForm<C>,
    gateway: G,
}

impl<G: RelayGateway> SubmissionClient<G, SystemClock> {
    pub fn new(gateway: G) -> Self {
        Self::with_clock(gateway, SystemClock)
    }
}

impl<G: RelayGateway, C: Clock> SubmissionClient<G, C> {
    pub fn with_clock(gateway: G, clock: C) -> Self {
        Self {
            form: ContactForm::new(clock),
            gateway,
        }
    }

    pub fn form(&self) -> &ContactForm<C> {
        &self.form
    }

    pub fn fields(&self) -> &FormFields {
        self.form.fields()
    }

    pub fn state(&self) -> &SubmissionState {
        self.form.state()
    }

    pub fn update_field(&mut self, field: Field, value: String) -> bool {
        self.form.update_field(field, value)
    }

    pub fn tick(&mut self) -> bool {
        self.form.tick()
    }

    pub async fn submit(&mut self) -> &SubmissionState {
        if let Attempt::Send(dispatch) = self.form.begin_submit() {
            let result = self.gateway.send(dispatch.fields()).await;
            self.form.complete(&dispatch, result);
        }
        self.form.state()
    }
}
