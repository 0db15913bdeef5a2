use axum::{
    http::HeaderValue,
    middleware as axum_mw,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

mod config;
mod db;
mod error;
mod middleware;
mod models;
mod plans;
mod routes;
mod services;

use config::Config;
use plans::PlanCatalog;
use services::email::Mailer;

#[derive(Clone)]
pub struct AppState {
    pub db: sqlx::PgPool,
    pub config: Arc<Config>,
    pub plans: Arc<PlanCatalog>,
    pub mailer: Mailer,
}

fn build_router(state: AppState) -> Router {
    let origins: Vec<HeaderValue> = state
        .config
        .cors_origins
        .iter()
        .filter_map(|o| o.parse().ok())
        .collect();
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any);

    // --- Auth routes (no auth required) ---
    let auth_routes = Router::new()
        .route("/register", post(routes::auth::register))
        .route("/verify-email", post(routes::auth::verify_email))
        .route("/resend-code", post(routes::auth::resend_code))
        .route("/login", post(routes::auth::login))
        .route("/forgot-password", post(routes::auth::forgot_password))
        .route("/reset-password", post(routes::auth::reset_password));

    // --- Authenticated routes ---
    let organization_routes = Router::new()
        .route("/", post(routes::organizations::create_organization))
        .route("/me", get(routes::organizations::get_my_organization))
        .route(
            "/:id",
            get(routes::organizations::get_organization)
                .put(routes::organizations::update_organization),
        )
        .route(
            "/:id/branches",
            post(routes::organizations::create_branch).get(routes::organizations::get_branches),
        )
        .route(
            "/:id/fund-buckets",
            post(routes::organizations::create_fund_bucket)
                .get(routes::organizations::get_fund_buckets),
        )
        .layer(axum_mw::from_fn_with_state(
            state.clone(),
            middleware::auth::authenticate,
        ));

    let member_routes = Router::new()
        .route(
            "/",
            get(routes::members::list_members).post(routes::members::create_member),
        )
        .route(
            "/:id",
            get(routes::members::get_member)
                .put(routes::members::update_member)
                .delete(routes::members::delete_member),
        )
        .layer(axum_mw::from_fn_with_state(
            state.clone(),
            middleware::auth::authenticate,
        ));

    let event_routes = Router::new()
        .route(
            "/",
            get(routes::events::list_events).post(routes::events::create_event),
        )
        .route(
            "/:id",
            get(routes::events::get_event)
                .put(routes::events::update_event)
                .delete(routes::events::delete_event),
        )
        .route("/:id/register", post(routes::events::register_for_event))
        .layer(axum_mw::from_fn_with_state(
            state.clone(),
            middleware::auth::authenticate,
        ));

    let donation_routes = Router::new()
        .route(
            "/",
            post(routes::donations::create_donation).get(routes::donations::list_donations),
        )
        .route("/stats/summary", get(routes::donations::donation_stats))
        .route(
            "/:id",
            get(routes::donations::get_donation).put(routes::donations::update_donation),
        )
        .layer(axum_mw::from_fn_with_state(
            state.clone(),
            middleware::auth::authenticate,
        ));

    // Plan catalog is public; everything keyed by organization needs a token.
    let plan_routes = Router::new()
        .route("/plans", get(routes::subscriptions::list_plans))
        .route("/plans/:planId", get(routes::subscriptions::get_plan));

    let subscription_routes = Router::new()
        .route("/", post(routes::subscriptions::create_subscription))
        .route(
            "/:organizationId",
            get(routes::subscriptions::get_subscription)
                .put(routes::subscriptions::update_subscription),
        )
        .route(
            "/:organizationId/cancel",
            post(routes::subscriptions::cancel_subscription),
        )
        .route(
            "/:organizationId/reactivate",
            post(routes::subscriptions::reactivate_subscription),
        )
        .route(
            "/:organizationId/features/:featureKey",
            get(routes::subscriptions::check_feature),
        )
        .route(
            "/:organizationId/limits",
            get(routes::subscriptions::check_limits),
        )
        .route(
            "/:organizationId/usage",
            put(routes::subscriptions::update_usage),
        )
        .layer(axum_mw::from_fn_with_state(
            state.clone(),
            middleware::auth::authenticate,
        ))
        .merge(plan_routes);

    Router::new()
        .nest("/api/auth", auth_routes)
        .nest("/api/organizations", organization_routes)
        .nest("/api/members", member_routes)
        .nest("/api/events", event_routes)
        .nest("/api/donations", donation_routes)
        .nest("/api/subscriptions", subscription_routes)
        .route("/api/health", get(routes::health::health))
        .layer(cors)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let config = Arc::new(Config::from_env());

    let env_filter = || {
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into())
    };
    // JSON logs for production collectors, plain text for local runs.
    if config.is_production() {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter())
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter()).init();
    }

    let pool = db::create_pool(&config).await;
    db::init_schema(&pool)
        .await
        .expect("Failed to initialize database schema");

    let state = AppState {
        db: pool,
        mailer: Mailer::new(&config.email, &config.client_url),
        plans: Arc::new(PlanCatalog::default()),
        config: config.clone(),
    };

    let app = build_router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("Listening on {addr}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind listener");
    axum::serve(listener, app)
        .await
        .expect("Server error");
}
