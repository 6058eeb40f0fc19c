use anyhow::Context;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{field::display, Span};

use crate::domain::{EmailAddress, NewSubscriber};
use crate::record_store::{RecordStore, StoreError, Table};
use crate::AppState;

use super::error_chain_fmt;

const SUBSCRIBED: &str = "Successfully subscribed to the newsletter";
const SIMULATED: &str = "[DEV MODE] Successfully subscribed to the newsletter";
const ALREADY_SUBSCRIBED: &str = "You are already subscribed to our newsletter";

#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct SubscribeBody {
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(thiserror::Error)]
pub enum SubscribeError {
    #[error("Newsletter subscription is currently unavailable. Please try again later.")]
    NotConfigured,
    #[error("Invalid email address")]
    InvalidEmail(String),
    #[error("Failed to subscribe. Please try again later.")]
    PersistenceError(#[source] StoreError),
    #[error("Internal server error")]
    UnexpectedError(#[from] anyhow::Error),
}

impl std::fmt::Debug for SubscribeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl IntoResponse for SubscribeError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            Self::NotConfigured => {
                tracing::error!("Subscription store is not configured");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    json!({
                        "error": self.to_string(),
                        "details": "Database connection not configured",
                    }),
                )
            }
            Self::InvalidEmail(reason) => {
                tracing::warn!("Rejected subscription. {reason}");
                (StatusCode::BAD_REQUEST, json!({ "error": self.to_string() }))
            }
            Self::PersistenceError(_) | Self::UnexpectedError(_) => {
                tracing::error!(error.cause_chain = ?self, "Failed to process subscription");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": self.to_string() }),
                )
            }
        };
        (status, Json(body)).into_response()
    }
}

#[tracing::instrument(
    name = "Adding new subscriber",
    skip(state, body),
    fields(subscriber_email = tracing::field::Empty)
)]
pub async fn subscribe<S: RecordStore>(
    state: State<AppState<S>>,
    body: Bytes,
) -> Result<Response, SubscribeError> {
    let store = &state.subscriber_store;
    // Local development without store credentials accepts subscriptions without
    // persisting them. A configured store is always used, whatever the environment.
    let simulate = !store.is_configured() && state.environment.is_development();
    if !store.is_configured() && !simulate {
        return Err(SubscribeError::NotConfigured);
    }

    let body: SubscribeBody = serde_json::from_slice(&body)
        .context("Failed to parse the subscription request body.")?;
    let email = EmailAddress::parse(body.email.unwrap_or_default())
        .map_err(SubscribeError::InvalidEmail)?;
    Span::current().record("subscriber_email", &display(&email));

    if simulate {
        tracing::info!("Development mode: simulating subscription for {email}");
        return Ok(created(SIMULATED, json!({ "email": email })));
    }

    match store
        .insert(Table::Subscribers, &NewSubscriber::new(email))
        .await
    {
        Ok(rows) => Ok(created(SUBSCRIBED, rows)),
        Err(StoreError::DuplicateKey(diagnostic)) => {
            tracing::info!("Subscriber already exists. {diagnostic}");
            Ok((
                StatusCode::CONFLICT,
                Json(json!({ "message": ALREADY_SUBSCRIBED })),
            )
                .into_response())
        }
        Err(StoreError::NotConfigured) => Err(SubscribeError::NotConfigured),
        Err(e) => Err(SubscribeError::PersistenceError(e)),
    }
}

fn created(message: &str, data: Value) -> Response {
    (
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": message,
            "data": data,
        })),
    )
        .into_response()
}
