use super::{created, paginated, requested_page, Created};
use crate::error::ApiResult;
use crate::middleware::{ApiJson, CurrentUser, ResourceId, StaffUser};
use crate::state::AppState;
use airport_control::filters::city_filter;
use airport_models::{
    Airport, AirportPage, AirportPatch, AirportRequest, Page, PageQuery, RouteDetail,
    RouteListItem, RoutePage, RoutePatch, RouteQuery, RouteRequest, RouteView,
};
use axum::extract::{OriginalUri, Query, State};
use axum::Json;
use tracing::instrument;

// ---- Airports ----

#[utoipa::path(
    get,
    path = "/api/v1/airport/airports/",
    tag = "network",
    params(PageQuery),
    responses(
        (status = 200, description = "Airports", body = AirportPage),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Invalid page")
    ),
    security(("jwt" = []))
)]
#[instrument(skip_all)]
pub async fn list_airports(
    State(state): State<AppState>,
    _user: CurrentUser,
    OriginalUri(uri): OriginalUri,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<Page<Airport>>> {
    let page = requested_page(&state, query.page.as_deref())?;
    let listing = state.catalog.list_airports(page).await?;
    paginated(&uri, listing)
}

#[utoipa::path(
    post,
    path = "/api/v1/airport/airports/",
    tag = "network",
    request_body = AirportRequest,
    responses(
        (status = 201, description = "Airport created", body = Airport),
        (status = 400, description = "Invalid input"),
        (status = 403, description = "Staff only")
    ),
    security(("jwt" = []))
)]
#[instrument(skip_all)]
pub async fn create_airport(
    State(state): State<AppState>,
    _staff: StaffUser,
    ApiJson(request): ApiJson<AirportRequest>,
) -> ApiResult<Created<Airport>> {
    Ok(created(state.catalog.create_airport(request).await?))
}

#[utoipa::path(
    get,
    path = "/api/v1/airport/airports/{id}/",
    tag = "network",
    params(("id" = i64, Path, description = "Airport id")),
    responses(
        (status = 200, description = "Airport", body = Airport),
        (status = 404, description = "Not found")
    ),
    security(("jwt" = []))
)]
#[instrument(skip_all, fields(id = id))]
pub async fn get_airport(
    State(state): State<AppState>,
    _user: CurrentUser,
    ResourceId(id): ResourceId,
) -> ApiResult<Json<Airport>> {
    Ok(Json(state.catalog.get_airport(id).await?))
}

#[utoipa::path(
    put,
    path = "/api/v1/airport/airports/{id}/",
    tag = "network",
    params(("id" = i64, Path, description = "Airport id")),
    request_body = AirportRequest,
    responses(
        (status = 200, description = "Airport updated", body = Airport),
        (status = 400, description = "Invalid input"),
        (status = 404, description = "Not found")
    ),
    security(("jwt" = []))
)]
#[instrument(skip_all, fields(id = id))]
pub async fn update_airport(
    State(state): State<AppState>,
    _staff: StaffUser,
    ResourceId(id): ResourceId,
    ApiJson(request): ApiJson<AirportRequest>,
) -> ApiResult<Json<Airport>> {
    Ok(Json(state.catalog.update_airport(id, request).await?))
}

#[utoipa::path(
    patch,
    path = "/api/v1/airport/airports/{id}/",
    tag = "network",
    params(("id" = i64, Path, description = "Airport id")),
    request_body = AirportPatch,
    responses(
        (status = 200, description = "Airport updated", body = Airport),
        (status = 400, description = "Invalid input"),
        (status = 404, description = "Not found")
    ),
    security(("jwt" = []))
)]
#[instrument(skip_all, fields(id = id))]
pub async fn patch_airport(
    State(state): State<AppState>,
    _staff: StaffUser,
    ResourceId(id): ResourceId,
    ApiJson(patch): ApiJson<AirportPatch>,
) -> ApiResult<Json<Airport>> {
    Ok(Json(state.catalog.patch_airport(id, patch).await?))
}

// ---- Routes ----

#[utoipa::path(
    get,
    path = "/api/v1/airport/routes/",
    tag = "network",
    params(RouteQuery),
    responses(
        (status = 200, description = "Routes", body = RoutePage),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Invalid page")
    ),
    security(("jwt" = []))
)]
#[instrument(skip_all)]
pub async fn list_routes(
    State(state): State<AppState>,
    _user: CurrentUser,
    OriginalUri(uri): OriginalUri,
    Query(query): Query<RouteQuery>,
) -> ApiResult<Json<Page<RouteListItem>>> {
    let filter = city_filter(query.source.as_deref(), query.destination.as_deref());
    let page = requested_page(&state, query.page.as_deref())?;
    let listing = state.catalog.list_routes(&filter, page).await?;
    paginated(&uri, listing)
}

#[utoipa::path(
    post,
    path = "/api/v1/airport/routes/",
    tag = "network",
    request_body = RouteRequest,
    responses(
        (status = 201, description = "Route created", body = RouteView),
        (status = 400, description = "Invalid input"),
        (status = 403, description = "Staff only")
    ),
    security(("jwt" = []))
)]
#[instrument(skip_all)]
pub async fn create_route(
    State(state): State<AppState>,
    _staff: StaffUser,
    ApiJson(request): ApiJson<RouteRequest>,
) -> ApiResult<Created<RouteView>> {
    Ok(created(state.catalog.create_route(request).await?))
}

#[utoipa::path(
    get,
    path = "/api/v1/airport/routes/{id}/",
    tag = "network",
    params(("id" = i64, Path, description = "Route id")),
    responses(
        (status = 200, description = "Route with both airports", body = RouteDetail),
        (status = 404, description = "Not found")
    ),
    security(("jwt" = []))
)]
#[instrument(skip_all, fields(id = id))]
pub async fn get_route(
    State(state): State<AppState>,
    _user: CurrentUser,
    ResourceId(id): ResourceId,
) -> ApiResult<Json<RouteDetail>> {
    Ok(Json(state.catalog.get_route(id).await?))
}

#[utoipa::path(
    put,
    path = "/api/v1/airport/routes/{id}/",
    tag = "network",
    params(("id" = i64, Path, description = "Route id")),
    request_body = RouteRequest,
    responses(
        (status = 200, description = "Route updated", body = RouteView),
        (status = 400, description = "Invalid input"),
        (status = 404, description = "Not found")
    ),
    security(("jwt" = []))
)]
#[instrument(skip_all, fields(id = id))]
pub async fn update_route(
    State(state): State<AppState>,
    _staff: StaffUser,
    ResourceId(id): ResourceId,
    ApiJson(request): ApiJson<RouteRequest>,
) -> ApiResult<Json<RouteView>> {
    Ok(Json(state.catalog.update_route(id, request).await?))
}

#[utoipa::path(
    patch,
    path = "/api/v1/airport/routes/{id}/",
    tag = "network",
    params(("id" = i64, Path, description = "Route id")),
    request_body = RoutePatch,
    responses(
        (status = 200, description = "Route updated", body = RouteView),
        (status = 400, description = "Invalid input"),
        (status = 404, description = "Not found")
    ),
    security(("jwt" = []))
)]
#[instrument(skip_all, fields(id = id))]
pub async fn patch_route(
    State(state): State<AppState>,
    _staff: StaffUser,
    ResourceId(id): ResourceId,
    ApiJson(patch): ApiJson<RoutePatch>,
) -> ApiResult<Json<RouteView>> {
    Ok(Json(state.catalog.patch_route(id, patch).await?))
}
