use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Airport {
    pub id: i64,
    pub name: String,
    pub closest_big_city: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct AirportRequest {
    pub name: String,
    pub closest_big_city: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct AirportPatch {
    pub name: Option<String>,
    pub closest_big_city: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Route {
    pub id: i64,
    pub source_id: i64,
    pub destination_id: i64,
    pub distance: i32,
}

#[derive(Debug, Clone)]
pub struct NewRoute {
    pub source_id: i64,
    pub destination_id: i64,
    pub distance: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct RouteRequest {
    /// Source airport id.
    pub source: i64,
    /// Destination airport id.
    pub destination: i64,
    pub distance: i32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct RoutePatch {
    pub source: Option<i64>,
    pub destination: Option<i64>,
    pub distance: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct RouteView {
    pub id: i64,
    pub source: i64,
    pub destination: i64,
    pub distance: i32,
}

/// Route with both ends shown as the closest big city.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct RouteListItem {
    pub id: i64,
    pub source: String,
    pub destination: String,
    pub distance: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct RouteDetail {
    pub id: i64,
    pub source: Airport,
    pub destination: Airport,
    pub distance: i32,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RouteQuery {
    /// Page number, starting at 1.
    pub page: Option<String>,
    /// Filter routes by source airport's closest big city (ex. `?source=Kyiv`).
    pub source: Option<String>,
    /// Filter routes by destination airport's closest big city (ex. `?destination=Lviv`).
    pub destination: Option<String>,
}
