use std::sync::Arc;

use axum::body::Body;
use axum::http::Request;
use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::configuration::{ApplicationSettings, Settings, StoreKey};
use crate::record_store::RecordStore;
use crate::routes::{contact, health_check, subscribe};
use crate::AppState;

pub struct Application {
    port: u16,
    listener: TcpListener,
    router: Router,
}

impl Application {
    pub async fn build(configuration: Settings) -> anyhow::Result<Self> {
        let subscriber_store = configuration.store.client(StoreKey::Service)?;
        let inquiry_store = configuration.store.client(StoreKey::Anon)?;
        if !subscriber_store.is_configured() {
            tracing::warn!("No service key for the record store. Subscriptions are unavailable.");
        }
        if !inquiry_store.is_configured() {
            tracing::warn!("No anon key for the record store. Contact inquiries are unavailable.");
        }
        Self::build_with_stores(
            &configuration.application,
            subscriber_store,
            inquiry_store,
        )
        .await
    }

    /// Builds the application around caller-provided stores instead of the
    /// configured REST client.
    pub async fn build_with_stores<S: RecordStore>(
        settings: &ApplicationSettings,
        subscriber_store: S,
        inquiry_store: S,
    ) -> anyhow::Result<Self> {
        let address = format!("{}:{}", settings.host, settings.port);
        let listener = TcpListener::bind(&address).await?;
        let port = listener.local_addr()?.port();
        tracing::info!(
            "Listening on {}:{port} ({} mode)",
            settings.host,
            settings.environment.as_str()
        );

        let app_state = AppState {
            subscriber_store: Arc::new(subscriber_store),
            inquiry_store: Arc::new(inquiry_store),
            environment: settings.environment,
        };
        Ok(Self {
            port,
            listener,
            router: router(app_state),
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> Result<(), std::io::Error> {
        axum::serve(self.listener, self.router).await
    }
}

pub fn router<S: RecordStore>(app_state: AppState<S>) -> Router {
    Router::new()
        .route("/health_check", get(health_check))
        .route("/subscribe", post(subscribe::<S>))
        .route("/contact", post(contact::<S>))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                        let request_id = request
                            .headers()
                            .get("x-request-id")
                            .and_then(|v| v.to_str().ok())
                            .unwrap_or_default();
                        tracing::info_span!(
                            "http_request",
                            method = %request.method(),
                            uri = %request.uri(),
                            request_id = %request_id,
                        )
                    }),
                )
                .layer(PropagateRequestIdLayer::x_request_id()),
        )
        .with_state(app_state)
}
