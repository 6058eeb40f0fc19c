use std::time::Duration;

use reqwest::{header, Client, ClientBuilder, StatusCode, Url};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{RecordStore, StoreError, Table};

/// Postgres error code for `unique_violation`.
const UNIQUE_VIOLATION: &str = "23505";

/// Client for a PostgREST-style REST endpoint (`{url}/rest/v1/{table}`).
pub struct RestStore {
    connection: Option<Connection>,
}

struct Connection {
    http_client: Client,
    url: Url,
}

#[derive(Deserialize, Debug, Default)]
struct ErrorBody {
    code: Option<String>,
    message: Option<String>,
    details: Option<String>,
}

impl RestStore {
    pub fn new(
        url: &str,
        api_key: Secret<String>,
        timeout: Option<Duration>,
    ) -> anyhow::Result<Self> {
        let mut url =
            Url::parse(url).map_err(|e| anyhow::anyhow!("Invalid store url {url}. {e}"))?;
        // Table paths are joined relative to the base, so any path prefix must end in `/`.
        if !url.path().ends_with('/') {
            url.set_path(&format!("{}/", url.path()));
        }

        let mut headers = header::HeaderMap::new();
        headers.insert(
            "apikey",
            api_key
                .expose_secret()
                .parse()
                .map_err(|e| anyhow::anyhow!("Failed to parse store api key: {e}"))?,
        );
        headers.insert(
            header::AUTHORIZATION,
            format!("Bearer {}", api_key.expose_secret())
                .parse()
                .map_err(|e| anyhow::anyhow!("Failed to parse store api key: {e}"))?,
        );

        let mut builder = ClientBuilder::new().default_headers(headers);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http_client = builder.build().map_err(|e| anyhow::anyhow!(e.to_string()))?;

        Ok(Self {
            connection: Some(Connection { http_client, url }),
        })
    }

    pub fn unconfigured() -> Self {
        Self { connection: None }
    }
}

impl RecordStore for RestStore {
    fn is_configured(&self) -> bool {
        self.connection.is_some()
    }

    #[tracing::instrument(
        name = "Insert into record store",
        skip(self, record),
        fields(table = table.name())
    )]
    async fn insert<R>(&self, table: Table, record: &R) -> Result<Value, StoreError>
    where
        R: Serialize + Sync,
    {
        let Some(connection) = &self.connection else {
            return Err(StoreError::NotConfigured);
        };
        let url = connection
            .url
            .join(&format!("rest/v1/{}", table.name()))
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        let response = connection
            .http_client
            .post(url)
            .header("prefer", prefer(table))
            .json(&[record])
            .send()
            .await
            .map_err(|e| {
                StoreError::Unavailable(format!("Failed to reach the record store. {e}"))
            })?;

        let status = response.status();
        let body = response.bytes().await.map_err(|e| {
            StoreError::Unavailable(format!("{status}: failed to read the store response. {e}"))
        })?;
        if status.is_success() {
            // `return=minimal` inserts (and 204s) answer with no body at all.
            if body.iter().all(u8::is_ascii_whitespace) {
                return Ok(Value::Array(vec![]));
            }
            return serde_json::from_slice::<Value>(&body)
                .map_err(|e| StoreError::Unknown(format!("Unreadable insert response. {e}")));
        }

        Err(classify(status, &String::from_utf8_lossy(&body)))
    }
}

/// Only subscriptions echo the stored row back. Inquiries are written with the
/// public key, which may be allowed to insert but not to read.
fn prefer(table: Table) -> &'static str {
    match table {
        Table::Subscribers => "return=representation",
        Table::UserQueries => "return=minimal",
    }
}

fn classify(status: StatusCode, body: &str) -> StoreError {
    let error = serde_json::from_str::<ErrorBody>(body).unwrap_or_default();
    let diagnostic = format!(
        "{status}: {} {}",
        error.message.as_deref().unwrap_or(body),
        error.details.as_deref().unwrap_or_default()
    )
    .trim_end()
    .to_string();

    if error.code.as_deref() == Some(UNIQUE_VIOLATION) {
        return StoreError::DuplicateKey(diagnostic);
    }
    match status {
        StatusCode::BAD_GATEWAY | StatusCode::SERVICE_UNAVAILABLE | StatusCode::GATEWAY_TIMEOUT => {
            StoreError::Unavailable(diagnostic)
        }
        _ => StoreError::Unknown(diagnostic),
    }
}
