pub mod config;
pub mod dtos;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod startup;
pub mod utils;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    middleware::{from_fn, from_fn_with_state},
    routing::{delete, get, patch, post, put},
    Router,
};
use service_core::middleware::{
    metrics::metrics_middleware,
    rate_limit::{create_ip_rate_limiter, ip_rate_limit_middleware, IpRateLimiter},
    security_headers::security_headers_middleware,
    tracing::{request_id_middleware, REQUEST_ID_HEADER},
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use crate::config::MarketplaceConfig;
use crate::services::{
    AdminService, AuthService, BookingNotifier, BookingService, CaptchaVerifier, EmailProvider,
    JwtService, PackageService, Repositories, Storage,
};

#[derive(Clone)]
pub struct AppState {
    pub config: MarketplaceConfig,
    pub repositories: Repositories,
    pub jwt: JwtService,
    pub auth: AuthService,
    pub packages: PackageService,
    pub bookings: BookingService,
    pub admin: AdminService,
    pub auth_rate_limiter: IpRateLimiter,
}

impl AppState {
    /// Wire every service over the given stores and outbound providers.
    pub fn new(
        config: MarketplaceConfig,
        repositories: Repositories,
        storage: Arc<dyn Storage>,
        email: Arc<dyn EmailProvider>,
        captcha: Arc<dyn CaptchaVerifier>,
    ) -> Self {
        let jwt = JwtService::new(&config.jwt);
        let auth = AuthService::new(
            repositories.users.clone(),
            jwt.clone(),
            captcha,
            config.admin.clone(),
        );
        let packages = PackageService::new(
            repositories.packages.clone(),
            repositories.users.clone(),
            storage,
            config.uploads.max_images,
        );
        let bookings = BookingService::new(
            repositories.bookings.clone(),
            repositories.packages.clone(),
            repositories.users.clone(),
            BookingNotifier::new(email),
        );
        let admin = AdminService::new(
            repositories.users.clone(),
            repositories.packages.clone(),
            repositories.bookings.clone(),
        );
        let auth_rate_limiter = create_ip_rate_limiter(
            config.security.auth_rate_limit_attempts,
            config.security.auth_rate_limit_window_seconds,
        );

        Self {
            config,
            repositories,
            jwt,
            auth,
            packages,
            bookings,
            admin,
            auth_rate_limiter,
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    // Signup and login share one per-IP budget
    let account_routes = Router::new()
        .route("/api/users/signup", post(handlers::users::signup))
        .route("/api/users/login", post(handlers::users::login))
        .layer(from_fn_with_state(
            state.auth_rate_limiter.clone(),
            ip_rate_limit_middleware,
        ));

    let package_routes = Router::new()
        .route(
            "/api/packages",
            get(handlers::packages::list_packages).post(handlers::packages::create_package),
        )
        .route("/api/packages/add", post(handlers::packages::create_package))
        .route(
            "/api/packages/seller/:seller_id",
            get(handlers::packages::list_seller_packages),
        )
        .route("/api/packages/:id", get(handlers::packages::get_package))
        .route("/api/packages/edit/:id", put(handlers::packages::edit_package))
        .route(
            "/api/packages/delete/:id",
            delete(handlers::packages::delete_package),
        );

    let booking_routes = Router::new()
        .route(
            "/api/bookings",
            get(handlers::bookings::list_bookings).post(handlers::bookings::create_booking),
        )
        .route("/api/bookings/:id", get(handlers::bookings::get_booking))
        .route(
            "/api/bookings/seller/:seller_id",
            get(handlers::bookings::list_seller_bookings),
        )
        .route(
            "/api/bookings/seller/:seller_id/pending",
            get(handlers::bookings::list_seller_pending_bookings),
        )
        .route(
            "/api/bookings/tourist/:tourist_id",
            get(handlers::bookings::list_tourist_bookings),
        )
        .route(
            "/api/bookings/approve/:id",
            patch(handlers::bookings::approve_booking),
        )
        .route(
            "/api/bookings/reject/:id",
            patch(handlers::bookings::reject_booking),
        );

    let admin_routes = Router::new()
        .route("/api/admin/stats", get(handlers::admin::stats))
        .route(
            "/api/admin/pending-approvals",
            get(handlers::admin::pending_approvals),
        )
        .route("/api/admin/top-packages", get(handlers::admin::top_packages))
        .route(
            "/api/admin/approve-package/:id",
            put(handlers::admin::approve_package),
        )
        .route(
            "/api/admin/reject-package/:id",
            put(handlers::admin::reject_package),
        )
        .route("/api/admin/users", get(handlers::admin::list_users))
        .route("/api/admin/block-user/:id", put(handlers::admin::block_user))
        .route(
            "/api/admin/unblock-user/:id",
            put(handlers::admin::unblock_user),
        )
        .route(
            "/api/admin/delete-user/:id",
            delete(handlers::admin::delete_user),
        )
        .route_layer(from_fn_with_state(
            state.clone(),
            middleware::require_admin,
        ));

    Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/metrics", get(handlers::metrics::metrics))
        .merge(account_routes)
        .merge(package_routes)
        .merge(booking_routes)
        .merge(admin_routes)
        .nest_service("/uploads", ServeDir::new(&state.config.uploads.dir))
        .fallback(handlers::route_not_found)
        .layer(DefaultBodyLimit::max(state.config.uploads.max_body_bytes))
        .layer(from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(
            |request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get(REQUEST_ID_HEADER)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                )
            },
        ))
        .layer(from_fn(request_id_middleware))
        .layer(from_fn(security_headers_middleware))
        .layer(cors_layer(&state.config.security.allowed_origins))
        .with_state(state)
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins = allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::error!(origin = %origin, error = %e, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect::<Vec<HeaderValue>>();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
}
