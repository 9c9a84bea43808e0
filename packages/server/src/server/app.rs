//! Application setup and server configuration.

use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, Extension},
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    middleware,
    routing::{get, post, put},
    Router,
};
use plantnet::{PlantNetOptions, PlantNetService};
use sqlx::PgPool;
use tower_governor::{governor::GovernorConfigBuilder, GovernorLayer};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::domains::auth::JwtService;
use crate::kernel::{
    CloudinaryOptions, CloudinaryStore, LogOtpSender, PlantNetAdapter, ServerDeps,
};
use crate::server::middleware::jwt_auth_middleware;
use crate::server::routes;

/// Uploads: up to 8 images of 10 MB each, plus form overhead.
const MAX_BODY_BYTES: usize = 85 * 1024 * 1024;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub deps: Arc<ServerDeps>,
}

/// Build the Axum application router
///
/// Returns (Router, Arc<ServerDeps>) - deps are handed back for tests and
/// auxiliary tasks.
pub fn build_app(pool: PgPool, config: &Config) -> (Router, Arc<ServerDeps>) {
    // External services
    let plantnet = Arc::new(PlantNetService::new(PlantNetOptions {
        api_key: config.plantnet_api_key.clone(),
    }));
    let image_store = Arc::new(CloudinaryStore::new(CloudinaryOptions {
        cloud_name: config.cloudinary_cloud_name.clone(),
        upload_preset: config.cloudinary_upload_preset.clone(),
        api_key: config.cloudinary_api_key.clone(),
        api_secret: config.cloudinary_api_secret.clone(),
    }));

    let jwt_service = Arc::new(JwtService::new(
        &config.jwt_secret,
        config.jwt_issuer.clone(),
    ));

    let deps = Arc::new(ServerDeps::new(
        pool.clone(),
        image_store,
        Arc::new(PlantNetAdapter::new(plantnet)),
        Arc::new(LogOtpSender),
        jwt_service.clone(),
        config.admin_identifiers.clone(),
    ));

    let app_state = AppState {
        db_pool: pool,
        deps: deps.clone(),
    };

    // CORS: configured origins, or any origin for development
    let cors = if config.allowed_origins.is_empty() {
        CorsLayer::new()
            .allow_origin(tower_http::cors::Any)
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
            .allow_headers([AUTHORIZATION, CONTENT_TYPE])
    } else {
        let origins: Vec<HeaderValue> = config
            .allowed_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
            .allow_headers([AUTHORIZATION, CONTENT_TYPE])
    };

    // Rate limiting: 10 requests per second per IP with bursts up to 20
    let rate_limit_config = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(10)
            .burst_size(20)
            .use_headers()
            .finish()
            .expect("Rate limiter configuration is valid and should never fail"),
    );
    let rate_limit_layer = GovernorLayer {
        config: rate_limit_config,
    };

    let jwt_service_for_middleware = jwt_service.clone();

    let api = Router::new()
        // Auth
        .route("/auth/send-otp", post(routes::auth::send_otp_handler))
        .route("/auth/verify-otp", post(routes::auth::verify_otp_handler))
        // Users
        .route(
            "/users/me",
            get(routes::users::me_handler).put(routes::users::update_me_handler),
        )
        .route("/users/profile/:username", get(routes::users::profile_handler))
        .route(
            "/users/check-username/:username",
            get(routes::users::check_username_handler),
        )
        .route("/users/search", get(routes::users::search_handler))
        .route("/users/upload-pfp", post(routes::users::upload_pfp_handler))
        .route("/users/suggestions", get(routes::users::suggestions_handler))
        .route("/users/blocked", get(routes::users::blocked_handler))
        .route("/users/:id/follow", post(routes::users::follow_handler))
        .route("/users/:id/followers", get(routes::users::followers_handler))
        .route("/users/:id/following", get(routes::users::following_handler))
        .route("/users/:id/block", post(routes::users::block_handler))
        .route("/users/:id/unblock", post(routes::users::unblock_handler))
        // Posts
        .route("/posts", post(routes::posts::create_post_handler))
        .route("/posts/feed", get(routes::posts::feed_handler))
        .route("/posts/explore", get(routes::posts::explore_handler))
        .route("/posts/tags", get(routes::posts::tags_handler))
        .route(
            "/posts/adoption-map",
            get(routes::posts::adoption_map_handler),
        )
        .route("/posts/mine", get(routes::posts::my_posts_handler))
        .route(
            "/posts/liked/:username",
            get(routes::posts::liked_posts_handler),
        )
        .route(
            "/posts/:id",
            get(routes::posts::get_post_handler)
                .put(routes::posts::edit_post_handler)
                .delete(routes::posts::delete_post_handler),
        )
        .route("/posts/:id/like", post(routes::posts::like_handler))
        .route("/posts/:id/comment", post(routes::posts::comment_handler))
        .route(
            "/posts/:id/adopt/:action",
            post(routes::adoptions::post_adoption_handler),
        )
        // Plants
        .route(
            "/plants",
            get(routes::plants::list_plants_handler).post(routes::plants::create_plant_handler),
        )
        .route(
            "/plants/:id",
            get(routes::plants::get_plant_handler).delete(routes::plants::delete_plant_handler),
        )
        .route(
            "/plants/:id/adoption",
            get(routes::adoptions::plant_adoption_status_handler),
        )
        .route(
            "/plants/:id/adopt/:action",
            post(routes::adoptions::plant_adoption_handler),
        )
        // Adoption hub
        .route("/adoptions/me", get(routes::adoptions::my_adoptions_handler))
        .route(
            "/adoptions/history",
            get(routes::adoptions::adoption_history_handler),
        )
        // Messages
        .route(
            "/messages/conversations",
            get(routes::messages::conversations_handler),
        )
        .route(
            "/messages/conversation/:username",
            get(routes::messages::conversation_handler),
        )
        .route("/messages/send", post(routes::messages::send_message_handler))
        .route(
            "/messages/mark-read/:username",
            put(routes::messages::mark_read_handler),
        )
        .route(
            "/messages/unread-count",
            get(routes::messages::unread_count_handler),
        )
        // Notifications
        .route("/notifications", get(routes::notifications::list_handler))
        .route(
            "/notifications/unread-count",
            get(routes::notifications::unread_count_handler),
        )
        .route(
            "/notifications/mark-all-read",
            put(routes::notifications::mark_all_read_handler),
        )
        .route(
            "/notifications/:id/read",
            put(routes::notifications::mark_read_handler),
        )
        // Identification
        .route("/identify", post(routes::identify::identify_handler));

    let app = Router::new()
        .nest("/api", api)
        // Health check (no rate limit concerns, still behind trace/cors)
        .route("/health", get(routes::health::health_handler))
        // Middleware layers (applied in reverse order - last added runs first)
        .layer(middleware::from_fn(move |req, next| {
            jwt_auth_middleware(jwt_service_for_middleware.clone(), req, next)
        }))
        .layer(rate_limit_layer)
        .layer(Extension(app_state))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    (app, deps)
}
