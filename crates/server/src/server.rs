use std::{future::Future, sync::Arc};

use axum::{
    Router,
    http::{HeaderValue, request::Parts},
    routing::{get, post},
};
use regex::Regex;
use tower_http::{
    cors::{AllowHeaders, AllowMethods, AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{health, summary, sync, transactions};
use engine::Engine;

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
}

/// Origins allowed to call the API from a browser.
///
/// `"*"` (or an empty list) allows every origin without credentials; an
/// explicit list enables credentials. `allowed_origin_regex` adds origins
/// matching the pattern (e.g. preview deployments).
#[derive(Clone, Debug)]
pub struct CorsSettings {
    pub allowed_origins: Vec<String>,
    pub allowed_origin_regex: Option<String>,
}

impl Default for CorsSettings {
    fn default() -> Self {
        Self {
            allowed_origins: vec!["*".to_string()],
            allowed_origin_regex: None,
        }
    }
}

pub fn cors_layer(settings: &CorsSettings) -> Result<CorsLayer, regex::Error> {
    let origins: Vec<&str> = settings
        .allowed_origins
        .iter()
        .map(|origin| origin.trim())
        .filter(|origin| !origin.is_empty())
        .collect();
    let pattern = settings
        .allowed_origin_regex
        .as_deref()
        .filter(|p| !p.trim().is_empty())
        .map(Regex::new)
        .transpose()?;

    if origins.is_empty() || origins.contains(&"*") {
        return Ok(CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any));
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("ignoring invalid CORS origin {origin:?}");
                None
            }
        })
        .collect();

    let allow_origin = AllowOrigin::predicate(move |origin: &HeaderValue, _: &Parts| {
        allowed.contains(origin)
            || pattern.as_ref().is_some_and(|re| {
                origin.to_str().is_ok_and(|origin| re.is_match(origin))
            })
    });

    Ok(CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_credentials(true)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request()))
}

pub fn router(engine: Arc<Engine>, cors: CorsLayer) -> Router {
    let state = ServerState { engine };

    let api = Router::new()
        .route("/health", get(health::get))
        .route("/sync", post(sync::sync))
        .route("/transactions", get(transactions::list))
        .route("/summary", get(summary::get));

    Router::new()
        .route("/", get(health::get))
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

pub async fn run_with_listener<F>(
    engine: Engine,
    cors: CorsLayer,
    listener: tokio::net::TcpListener,
    shutdown: F,
) -> Result<(), std::io::Error>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, router(Arc::new(engine), cors))
        .with_graceful_shutdown(shutdown)
        .await
}
