use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::auth::{auth_middleware, AuthService};
use crate::services::Services;

use super::handlers::{
    admin_create_testimonial, admin_dashboard, admin_delete_testimonial, admin_list_waitlist,
    admin_update_stats, admin_update_testimonial, get_stats, health_check, join_waitlist,
    list_testimonials, track_visit, AppState,
};

pub fn create_api_router(services: Services, auth_service: Arc<AuthService>) -> Router {
    let state = Arc::new(AppState { services });

    let admin_routes = Router::new()
        .route("/dashboard", get(admin_dashboard))
        .route("/waitlist", get(admin_list_waitlist))
        .route("/stats", put(admin_update_stats))
        .route("/testimonials", post(admin_create_testimonial))
        .route(
            "/testimonials/{id}",
            put(admin_update_testimonial).delete(admin_delete_testimonial),
        )
        .route_layer(middleware::from_fn_with_state(auth_service, auth_middleware))
        .with_state(Arc::clone(&state));

    let public_routes = Router::new()
        .route("/stats", get(get_stats))
        .route("/waitlist", post(join_waitlist))
        .route("/testimonials", get(list_testimonials))
        .route("/visits", post(track_visit))
        .with_state(state);

    Router::new()
        .route("/health", get(health_check))
        .nest("/api/admin", admin_routes)
        .nest("/api", public_routes)
        .layer(CorsLayer::permissive())
}
