//! Client side of the two site forms: a small submission state machine and an
//! HTTP client that drives it from the service's JSON answers.

use reqwest::{Client, StatusCode, Url};
use serde::Serialize;
use serde_json::Value;

use crate::routes::{ContactForm, SubscribeBody};

const UNEXPECTED: &str = "An unexpected error occurred. Please try again later.";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FormState {
    #[default]
    Idle,
    Submitting,
    Success(String),
    Error(String),
}

impl FormState {
    /// Moves to `Submitting`. Refused (returns `false`) while a submission is in flight.
    pub fn begin(&mut self) -> bool {
        if self.is_submitting() {
            return false;
        }
        *self = FormState::Submitting;
        true
    }

    pub fn finish(&mut self, outcome: Result<String, String>) {
        if !self.is_submitting() {
            return;
        }
        *self = match outcome {
            Ok(message) => FormState::Success(message),
            Err(message) => FormState::Error(message),
        };
    }

    /// Editing a field clears the previous result.
    pub fn edit(&mut self) {
        if matches!(self, FormState::Success(_) | FormState::Error(_)) {
            *self = FormState::Idle;
        }
    }

    pub fn is_submitting(&self) -> bool {
        matches!(self, FormState::Submitting)
    }
}

pub struct FormClient {
    http_client: Client,
    base_url: Url,
}

impl FormClient {
    pub fn new(base_url: &str) -> anyhow::Result<Self> {
        let base_url = Url::parse(base_url).map_err(|e| anyhow::anyhow!(e.to_string()))?;
        Ok(Self {
            http_client: Client::new(),
            base_url,
        })
    }

    pub async fn subscribe(&self, state: &mut FormState, email: &str) {
        let body = SubscribeBody {
            email: Some(email.to_string()),
        };
        self.submit(
            state,
            "/subscribe",
            &body,
            ("Successfully subscribed!", "Failed to subscribe. Please try again."),
        )
        .await
    }

    pub async fn send_inquiry(&self, state: &mut FormState, form: &ContactForm) {
        self.submit(
            state,
            "/contact",
            form,
            (
                "Thank you for your message!",
                "Failed to submit the form. Please try again later.",
            ),
        )
        .await
    }

    #[tracing::instrument(name = "Submitting form", skip(self, state, body, fallbacks))]
    async fn submit<T: Serialize>(
        &self,
        state: &mut FormState,
        path: &str,
        body: &T,
        fallbacks: (&str, &str),
    ) {
        if !state.begin() {
            return;
        }
        let outcome = match self.post(path, body).await {
            Ok((status, reply)) => read_reply(status, &reply, fallbacks),
            Err(e) => {
                tracing::warn!("Form submission failed. {e}");
                Err(UNEXPECTED.to_string())
            }
        };
        state.finish(outcome);
    }

    async fn post<T: Serialize>(
        &self,
        path: &str,
        body: &T,
    ) -> anyhow::Result<(StatusCode, Value)> {
        let url = self.base_url.join(path)?;
        let response = self.http_client.post(url).json(body).send().await?;
        let status = response.status();
        let reply = response.json::<Value>().await?;
        Ok((status, reply))
    }
}

/// `409` means the subscriber already exists, which the form reports as success.
fn read_reply(
    status: StatusCode,
    reply: &Value,
    (success, failure): (&str, &str),
) -> Result<String, String> {
    let field = |name: &str| reply.get(name).and_then(Value::as_str).map(str::to_string);
    if status.is_success() || status == StatusCode::CONFLICT {
        Ok(field("message").unwrap_or_else(|| success.to_string()))
    } else {
        Err(field("error").unwrap_or_else(|| failure.to_string()))
    }
}
