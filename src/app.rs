use std::any::Any;
use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, State},
    http::{HeaderValue, StatusCode},
    middleware::from_fn_with_state,
    response::{IntoResponse, Json, Response},
    routing::{delete, get, patch, post},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceBuilder;
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{self, AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::access::AccessGate;
use crate::config::{AppConfig, SecurityConfig};
use crate::database::Store;
use crate::error::ApiError;
use crate::handlers;
use crate::identity::IdentityProvider;
use crate::middleware::{require_admin, require_authenticated};

/// Shared handles for every request. All fields are cheap clones.
#[derive(Clone)]
pub struct AppState {
    pub gate: AccessGate,
    pub identity: Arc<dyn IdentityProvider>,
    pub store: Arc<dyn Store>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(identity: Arc<dyn IdentityProvider>, store: Arc<dyn Store>, config: Arc<AppConfig>) -> Self {
        Self {
            gate: AccessGate::new(identity.clone(), store.clone()),
            identity,
            store,
            config,
        }
    }
}

pub fn app(state: AppState) -> Router {
    let mut router = Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health))
        .merge(auth_public_routes())
        // Bearer token required
        .merge(protected_routes(&state))
        // Bearer token + admin flag
        .merge(admin_routes(&state));

    if state.config.api.enable_request_logging {
        router = router.layer(TraceLayer::new_for_http());
    }

    router
        .layer(
            ServiceBuilder::new()
                .layer(CatchPanicLayer::custom(panic_response))
                .layer(cors_layer(&state.config.security)),
        )
        .layer(DefaultBodyLimit::max(state.config.api.max_request_size_bytes))
        .with_state(state)
}

fn auth_public_routes() -> Router<AppState> {
    use handlers::public::auth;

    Router::new()
        .route("/auth/signup", post(auth::signup))
        .route("/auth/login", post(auth::login))
        .route("/auth/forgot-password", post(auth::forgot_password))
        .route("/auth/reset-password", post(auth::reset_password))
}

fn protected_routes(state: &AppState) -> Router<AppState> {
    use handlers::protected::{establishment, jammer, session, user};

    Router::new()
        .route("/auth/verify", get(session::verify))
        .route("/user/:user_id/estabelecimentos", get(user::establishments))
        .route("/user/:user_id/estabelecimentos-completo", get(user::establishments_complete))
        .route("/estabelecimento/:id/jammers", get(establishment::jammers))
        .route("/jammer/:id", patch(jammer::update_state))
        .route_layer(from_fn_with_state(state.clone(), require_authenticated))
}

fn admin_routes(state: &AppState) -> Router<AppState> {
    use handlers::elevated::admin;

    Router::new()
        .route("/admin/users", get(admin::list_users))
        .route("/admin/estabelecimentos", get(admin::list_establishments))
        .route("/admin/estabelecimento", post(admin::create_establishment))
        .route("/admin/estabelecimento/:id", delete(admin::delete_establishment))
        .route("/admin/jammers", get(admin::list_jammers))
        .route("/admin/jammer", post(admin::create_jammer))
        .route("/admin/jammer/:id", delete(admin::delete_jammer))
        // Layers run bottom-up: authenticate first, then check the admin flag
        .route_layer(from_fn_with_state(state.clone(), require_admin))
        .route_layer(from_fn_with_state(state.clone(), require_authenticated))
}

fn cors_layer(security: &SecurityConfig) -> CorsLayer {
    if security.allows_any_origin() {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(cors::Any)
        .allow_headers(cors::Any)
}

fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    tracing::error!("Handler panicked: {}", detail);

    ApiError::internal_server_error("Erro interno do servidor").into_response()
}

async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "success": true,
        "data": {
            "name": "Jammer API",
            "version": version,
            "description": "Establishments and jammers, scoped to the user who owns them",
            "endpoints": {
                "home": "/ (public)",
                "health": "/health (public)",
                "auth": "/auth/signup, /auth/login, /auth/forgot-password, /auth/reset-password (public)",
                "session": "/auth/verify (protected)",
                "user": "/user/:user_id/estabelecimentos[-completo] (protected, own user only)",
                "establishment": "/estabelecimento/:id/jammers (protected, owner or admin)",
                "jammer": "/jammer/:id (protected, owner or admin)",
                "admin": "/admin/* (admin only)",
            }
        }
    }))
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match state.store.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "ok"
                }
            })),
        ),
        Err(e) => {
            tracing::warn!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "success": false,
                    "error": "Banco de dados indisponível",
                    "code": "SERVICE_UNAVAILABLE",
                    "data": {
                        "status": "degraded",
                        "timestamp": now,
                    }
                })),
            )
        }
    }
}
