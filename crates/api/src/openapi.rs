use crate::handlers::{fleet, health, network, orders, schedule, users};
use airport_models::{
    AccessToken, AirplaneDetail, AirplaneImage, AirplaneImageUpload, AirplaneListItem,
    AirplanePage, AirplanePatch, AirplaneRequest, AirplaneType, AirplaneTypePage,
    AirplaneTypePatch, AirplaneTypeRequest, AirplaneView, Airport, AirportPage, AirportPatch,
    AirportRequest, CrewPage, CrewPatch, CrewRequest, CrewView, FlightDetail, FlightListItem,
    FlightPage, FlightPatch, FlightRequest, FlightSummary, FlightView, OrderListItem, OrderPage,
    OrderPatch, OrderRequest, OrderView, RefreshRequest, RegisterRequest, RouteDetail,
    RouteListItem, RoutePage, RoutePatch, RouteRequest, RouteView, TicketListItem,
    TicketRequest, TicketView, TokenPair, TokenRequest, UserPatch, UserView, VerifyRequest,
};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

pub const OPENAPI_PATH: &str = "/api/v1/doc/";
pub const SWAGGER_PATH: &str = "/api/v1/doc/swagger";

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "jwt",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        fleet::list_airplane_types,
        fleet::create_airplane_type,
        fleet::get_airplane_type,
        fleet::update_airplane_type,
        fleet::patch_airplane_type,
        fleet::list_airplanes,
        fleet::create_airplane,
        fleet::get_airplane,
        fleet::update_airplane,
        fleet::patch_airplane,
        fleet::upload_airplane_image,
        network::list_airports,
        network::create_airport,
        network::get_airport,
        network::update_airport,
        network::patch_airport,
        network::list_routes,
        network::create_route,
        network::get_route,
        network::update_route,
        network::patch_route,
        schedule::list_crews,
        schedule::create_crew,
        schedule::get_crew,
        schedule::update_crew,
        schedule::patch_crew,
        schedule::list_flights,
        schedule::create_flight,
        schedule::get_flight,
        schedule::update_flight,
        schedule::patch_flight,
        orders::list_orders,
        orders::create_order,
        orders::get_order,
        orders::update_order,
        orders::patch_order,
        users::register,
        users::obtain_token,
        users::refresh_token,
        users::verify_token,
        users::get_me,
        users::update_me,
        users::patch_me,
        health::healthz,
        health::readyz,
        health::metrics,
    ),
    components(
        schemas(
            AirplaneType,
            AirplaneTypeRequest,
            AirplaneTypePatch,
            AirplaneTypePage,
            AirplaneRequest,
            AirplanePatch,
            AirplaneView,
            AirplaneListItem,
            AirplaneDetail,
            AirplaneImage,
            AirplaneImageUpload,
            AirplanePage,
            Airport,
            AirportRequest,
            AirportPatch,
            AirportPage,
            RouteRequest,
            RoutePatch,
            RouteView,
            RouteListItem,
            RouteDetail,
            RoutePage,
            CrewRequest,
            CrewPatch,
            CrewView,
            CrewPage,
            FlightRequest,
            FlightPatch,
            FlightView,
            FlightListItem,
            FlightDetail,
            FlightPage,
            TicketRequest,
            TicketView,
            TicketListItem,
            FlightSummary,
            OrderRequest,
            OrderPatch,
            OrderView,
            OrderListItem,
            OrderPage,
            RegisterRequest,
            UserPatch,
            UserView,
            TokenRequest,
            TokenPair,
            RefreshRequest,
            AccessToken,
            VerifyRequest,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "fleet", description = "Airplane types, airplanes and their images"),
        (name = "network", description = "Airports and routes"),
        (name = "schedule", description = "Crews and flights"),
        (name = "orders", description = "Orders and tickets of the caller"),
        (name = "user", description = "Registration, tokens and profile"),
        (name = "health", description = "Health and monitoring endpoints"),
    ),
    info(
        title = "Airport Service API",
        description = "Fleet, routes, flights and ticket orders",
        version = "0.1.0"
    ),
    servers(
        (url = "http://localhost:8000", description = "Local development server")
    )
)]
pub struct ApiDoc;

/// Swagger UI under `/api/v1/doc/swagger/`, backed by the JSON document at `/api/v1/doc/`.
pub fn create_swagger_ui() -> SwaggerUi {
    SwaggerUi::new(SWAGGER_PATH)
        .url(OPENAPI_PATH, ApiDoc::openapi())
        .config(
            utoipa_swagger_ui::Config::new([OPENAPI_PATH])
                .try_it_out_enabled(true)
                .display_request_duration(true),
        )
}
