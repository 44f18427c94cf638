/// Application state and router builder
///
/// # Example
///
/// ```no_run
/// use chorely_api::{app::{build_router, AppState}, config::Config};
/// use chorely_shared::db::pool::create_pool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = create_pool(config.database.pool_config()).await?;
/// let app = build_router(AppState::new(pool, config));
///
/// let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
/// axum::serve(listener, app).await?;
/// # Ok(())
/// # }
/// ```

use crate::{
    config::Config,
    middleware::{auth::require_session, security::SecurityHeadersLayer},
    routes,
};
use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post, put},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    cors::CorsLayer,
    timeout::TimeoutLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// Cloned into every handler through `State`; the pool and config are both
/// reference counted.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(db: PgPool, config: Config) -> Self {
        Self {
            db,
            config: Arc::new(config),
        }
    }

    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }
}

fn cors_layer(config: &Config) -> CorsLayer {
    if config.api.cors_origins.iter().any(|origin| origin == "*") {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = config
        .api
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
        .max_age(Duration::from_secs(3600))
}

/// Builds the complete router with all routes and middleware
///
/// ```text
/// /health                                   public
/// /v1/auth/{register,login,refresh}         public
/// /v1/households[/:id]                      bearer token
/// /v1/households/:id/members[/:member_id]
/// /v1/households/:id/history
/// /v1/tasks[/:id]
/// /v1/tasks/:id/{toggle,history,comments}
/// /v1/tasks/:id/comments/:comment_id
/// /v1/history
/// /v1/users, /v1/users/me, /v1/users/:id/{role,households}
/// ```
///
/// Layers, outermost first: security headers, CORS, trace, timeout.
pub fn build_router(state: AppState) -> Router {
    let auth_routes = Router::new()
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login))
        .route("/refresh", post(routes::auth::refresh));

    let protected_routes = Router::new()
        .route(
            "/households",
            get(routes::households::list_households).post(routes::households::create_household),
        )
        .route(
            "/households/:id",
            get(routes::households::get_household)
                .put(routes::households::update_household)
                .delete(routes::households::delete_household),
        )
        .route("/households/:id/members", post(routes::members::add_member))
        .route(
            "/households/:id/members/:member_id",
            put(routes::members::update_member).delete(routes::members::remove_member),
        )
        .route("/households/:id/history", get(routes::history::household_history))
        .route("/tasks", post(routes::tasks::create_task))
        .route(
            "/tasks/:id",
            get(routes::tasks::get_task)
                .put(routes::tasks::update_task)
                .delete(routes::tasks::delete_task),
        )
        .route("/tasks/:id/toggle", post(routes::tasks::toggle_task))
        .route("/tasks/:id/history", get(routes::history::task_history))
        .route(
            "/tasks/:id/comments",
            get(routes::comments::list_comments).post(routes::comments::add_comment),
        )
        .route(
            "/tasks/:id/comments/:comment_id",
            put(routes::comments::update_comment).delete(routes::comments::delete_comment),
        )
        .route("/history", get(routes::history::query_history))
        .route("/users", get(routes::users::list_users))
        .route(
            "/users/me",
            get(routes::users::get_me).put(routes::users::update_me),
        )
        .route("/users/:id/role", put(routes::users::set_role))
        .route("/users/:id/households", get(routes::users::user_households))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            require_session,
        ));

    let v1_routes = Router::new()
        .nest("/auth", auth_routes)
        .merge(protected_routes);

    let timeout = Duration::from_secs(state.config.api.request_timeout_seconds);

    Router::new()
        .route("/health", get(routes::health::health_check))
        .nest("/v1", v1_routes)
        .layer(TimeoutLayer::new(timeout))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors_layer(&state.config))
        .layer(SecurityHeadersLayer::new(state.config.api.production))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(origins: &[&str]) -> Config {
        let origins = origins.join(",");
        Config::from_lookup(|name| match name {
            "DATABASE_URL" => Some("postgresql://localhost/chorely".to_string()),
            "JWT_SECRET" => Some("test-secret-key-at-least-32-bytes-long".to_string()),
            "CORS_ORIGINS" => Some(origins.clone()),
            _ => None,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_app_state_exposes_secret() {
        let config = config(&["*"]);
        let pool = sqlx::postgres::PgPoolOptions::new()
            .connect_lazy(&config.database.url)
            .unwrap();

        let state = AppState::new(pool, config);
        assert_eq!(state.jwt_secret(), "test-secret-key-at-least-32-bytes-long");
    }

    #[test]
    fn test_cors_layer_builds_for_origin_list() {
        let _ = cors_layer(&config(&["https://chorely.app"]));
        let _ = cors_layer(&config(&["*"]));
    }
}
