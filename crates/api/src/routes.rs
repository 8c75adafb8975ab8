use crate::handlers::*;
use crate::AppState;
use axum::{
    routing::{get, post},
    Router,
};

pub fn create_router() -> Router<AppState> {
    Router::new()
        // Fleet
        .route(
            "/api/v1/airport/airplane_types/",
            get(list_airplane_types).post(create_airplane_type),
        )
        .route(
            "/api/v1/airport/airplane_types/:id/",
            get(get_airplane_type)
                .put(update_airplane_type)
                .patch(patch_airplane_type),
        )
        .route(
            "/api/v1/airport/airplanes/",
            get(list_airplanes).post(create_airplane),
        )
        .route(
            "/api/v1/airport/airplanes/:id/",
            get(get_airplane).put(update_airplane).patch(patch_airplane),
        )
        .route(
            "/api/v1/airport/airplanes/:id/upload-image/",
            post(upload_airplane_image),
        )
        // Network
        .route(
            "/api/v1/airport/airports/",
            get(list_airports).post(create_airport),
        )
        .route(
            "/api/v1/airport/airports/:id/",
            get(get_airport).put(update_airport).patch(patch_airport),
        )
        .route("/api/v1/airport/routes/", get(list_routes).post(create_route))
        .route(
            "/api/v1/airport/routes/:id/",
            get(get_route).put(update_route).patch(patch_route),
        )
        // Schedule
        .route("/api/v1/airport/crews/", get(list_crews).post(create_crew))
        .route(
            "/api/v1/airport/crews/:id/",
            get(get_crew).put(update_crew).patch(patch_crew),
        )
        .route(
            "/api/v1/airport/flights/",
            get(list_flights).post(create_flight),
        )
        .route(
            "/api/v1/airport/flights/:id/",
            get(get_flight).put(update_flight).patch(patch_flight),
        )
        // Orders
        .route("/api/v1/airport/orders/", get(list_orders).post(create_order))
        .route(
            "/api/v1/airport/orders/:id/",
            get(get_order).put(update_order).patch(patch_order),
        )
        // Users
        .route("/api/v1/user/register/", post(register))
        .route("/api/v1/user/token/", post(obtain_token))
        .route("/api/v1/user/token/refresh/", post(refresh_token))
        .route("/api/v1/user/token/verify/", post(verify_token))
        .route("/api/v1/user/me/", get(get_me).put(update_me).patch(patch_me))
        // Health and metrics
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/metrics", get(metrics))
}
