pub mod cards;
pub mod client;
pub mod error;
pub mod explorer;
pub mod filters;
pub mod handlers;
pub mod ical;
pub mod models;
pub mod openapi;
pub mod settings;
pub mod store;
pub mod validation;
pub mod view;
pub mod week;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::{HeaderValue, Method};
use axum::{
    Router,
    routing::{get, post},
};
use handlers::{
    create_explorer, delete_explorer, get_explorer, get_ical, get_meta, go_to_week, healthz_live,
    healthz_ready, next_week, previous_week, reset_filters, root, update_filters,
};
use tower_http::LatencyUnit;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::{Level, info, warn};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::client::ContentApiClient;
use crate::explorer::ExplorerRegistry;
use crate::ical::ICalExporter;
use crate::openapi::ApiDoc;
use crate::settings::Settings;

#[derive(Clone)]
pub struct AppState {
    pub(crate) settings: Settings,
    pub(crate) client: Arc<ContentApiClient>,
    pub(crate) explorers: ExplorerRegistry,
    pub(crate) exporter: Arc<ICalExporter>,
}

impl AppState {
    pub fn new(settings: Settings) -> Result<Self, reqwest::Error> {
        let client = ContentApiClient::new(settings.api_base_url.clone(), settings.request_timeout())?;
        Ok(Self {
            client: Arc::new(client),
            explorers: ExplorerRegistry::new(settings.max_explorers, settings.explorer_idle()),
            exporter: Arc::new(ICalExporter::new(settings.club_name.clone(), settings.timezone)),
            settings,
        })
    }
}

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let settings = Settings::from_env()?;

    let env_filter = if settings.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .without_time()
        .init();

    let state = AppState::new(settings)?;
    let app = build_router(state.clone());

    let addr = SocketAddr::from(([0, 0, 0, 0], state.settings.port));
    info!(
        api = %state.settings.api_base_url,
        timezone = %state.settings.timezone,
        "Starting Gabi Schedule API on {addr}"
    );
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn cors_layer(origin: Option<&str>) -> CorsLayer {
    let Some(origin) = origin else {
        return CorsLayer::permissive();
    };
    match HeaderValue::from_str(origin) {
        Ok(value) => CorsLayer::new()
            .allow_origin(value)
            .allow_methods([Method::GET, Method::POST, Method::DELETE])
            .allow_headers(Any),
        Err(err) => {
            warn!(error = %err, origin, "invalid CORS origin, allowing any");
            CorsLayer::permissive()
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_response(
            DefaultOnResponse::new()
                .level(Level::INFO)
                .latency_unit(LatencyUnit::Millis),
        );
    let cors = cors_layer(state.settings.cors_origin.as_deref());

    let mut router = Router::new()
        .route("/", get(root))
        .route("/healthz/live", get(healthz_live))
        .route("/healthz/ready", get(healthz_ready))
        .route("/meta", get(get_meta))
        .route("/explorers", post(create_explorer))
        .route("/explorers/{id}", get(get_explorer).delete(delete_explorer))
        .route("/explorers/{id}/next", post(next_week))
        .route("/explorers/{id}/previous", post(previous_week))
        .route("/explorers/{id}/week", post(go_to_week))
        .route(
            "/explorers/{id}/filters",
            post(update_filters).delete(reset_filters),
        )
        .route("/schedule.ical", get(get_ical))
        .with_state(state.clone());

    if state.settings.enable_swagger {
        let openapi = ApiDoc::openapi();
        let swagger = SwaggerUi::new("/docs").url("/openapi.json", openapi);
        router = router.merge(swagger);
    }

    router.layer(cors).layer(trace_layer)
}
