use anyhow::Context;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{field::display, Span};

use crate::domain::{InquiryValidationError, NewInquiry};
use crate::record_store::{RecordStore, StoreError, Table};
use crate::AppState;

use super::error_chain_fmt;

const THANK_YOU: &str = "Thank you for your message! We'll get back to you soon.";

/// Fields of the site's contact form. Missing fields read as empty.
#[derive(Deserialize, Serialize, Debug, Clone, Default)]
#[serde(default)]
pub struct ContactForm {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub message: String,
}

#[derive(thiserror::Error)]
pub enum ContactError {
    #[error("Database connection not available. Please try again later.")]
    NotConfigured,
    #[error("{0}")]
    ValidationError(InquiryValidationError),
    #[error("Failed to submit the form. Please try again later.")]
    PersistenceError(#[source] StoreError),
    #[error("Internal server error")]
    UnexpectedError(#[from] anyhow::Error),
}

impl std::fmt::Debug for ContactError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl IntoResponse for ContactError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            Self::NotConfigured => {
                tracing::error!("Inquiry store is not configured");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    json!({ "error": self.to_string() }),
                )
            }
            Self::ValidationError(e) => (
                StatusCode::BAD_REQUEST,
                json!({ "error": e.to_string(), "field": e.field() }),
            ),
            Self::PersistenceError(_) | Self::UnexpectedError(_) => {
                tracing::error!(error.cause_chain = ?self, "Failed to record contact inquiry");
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
    name = "Recording a contact inquiry",
    skip(state, body),
    fields(inquirer_email = tracing::field::Empty)
)]
pub async fn contact<S: RecordStore>(
    state: State<AppState<S>>,
    body: Bytes,
) -> Result<Response, ContactError> {
    let store = &state.inquiry_store;
    if !store.is_configured() {
        return Err(ContactError::NotConfigured);
    }

    let form: ContactForm =
        serde_json::from_slice(&body).context("Failed to parse the contact form body.")?;
    let inquiry = NewInquiry::try_from(form).map_err(ContactError::ValidationError)?;
    Span::current().record("inquirer_email", &display(&inquiry.email));

    match store.insert(Table::UserQueries, &inquiry).await {
        Ok(_) => Ok((
            StatusCode::CREATED,
            Json(json!({ "success": true, "message": THANK_YOU })),
        )
            .into_response()),
        Err(StoreError::NotConfigured) => Err(ContactError::NotConfigured),
        Err(e) => Err(ContactError::PersistenceError(e)),
    }
}
