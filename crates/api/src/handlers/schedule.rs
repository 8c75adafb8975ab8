use super::{created, paginated, requested_page, Created};
use crate::error::ApiResult;
use crate::middleware::{ApiJson, CurrentUser, ResourceId, StaffUser};
use crate::state::AppState;
use airport_control::filters::parse_route_filter;
use airport_models::{
    CrewPage, CrewPatch, CrewRequest, CrewView, FlightDetail, FlightListItem, FlightPage,
    FlightPatch, FlightQuery, FlightRequest, FlightView, Page, PageQuery,
};
use axum::extract::{OriginalUri, Query, State};
use axum::Json;
use tracing::instrument;

// ---- Crews ----

#[utoipa::path(
    get,
    path = "/api/v1/airport/crews/",
    tag = "schedule",
    params(PageQuery),
    responses(
        (status = 200, description = "Crew members", body = CrewPage),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Invalid page")
    ),
    security(("jwt" = []))
)]
#[instrument(skip_all)]
pub async fn list_crews(
    State(state): State<AppState>,
    _user: CurrentUser,
    OriginalUri(uri): OriginalUri,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<Page<CrewView>>> {
    let page = requested_page(&state, query.page.as_deref())?;
    let listing = state.catalog.list_crews(page).await?;
    paginated(&uri, listing)
}

#[utoipa::path(
    post,
    path = "/api/v1/airport/crews/",
    tag = "schedule",
    request_body = CrewRequest,
    responses(
        (status = 201, description = "Crew member created", body = CrewView),
        (status = 400, description = "Invalid input"),
        (status = 403, description = "Staff only")
    ),
    security(("jwt" = []))
)]
#[instrument(skip_all)]
pub async fn create_crew(
    State(state): State<AppState>,
    _staff: StaffUser,
    ApiJson(request): ApiJson<CrewRequest>,
) -> ApiResult<Created<CrewView>> {
    Ok(created(state.catalog.create_crew(request).await?))
}

#[utoipa::path(
    get,
    path = "/api/v1/airport/crews/{id}/",
    tag = "schedule",
    params(("id" = i64, Path, description = "Crew member id")),
    responses(
        (status = 200, description = "Crew member", body = CrewView),
        (status = 404, description = "Not found")
    ),
    security(("jwt" = []))
)]
#[instrument(skip_all, fields(id = id))]
pub async fn get_crew(
    State(state): State<AppState>,
    _user: CurrentUser,
    ResourceId(id): ResourceId,
) -> ApiResult<Json<CrewView>> {
    Ok(Json(state.catalog.get_crew(id).await?))
}

#[utoipa::path(
    put,
    path = "/api/v1/airport/crews/{id}/",
    tag = "schedule",
    params(("id" = i64, Path, description = "Crew member id")),
    request_body = CrewRequest,
    responses(
        (status = 200, description = "Crew member updated", body = CrewView),
        (status = 400, description = "Invalid input"),
        (status = 404, description = "Not found")
    ),
    security(("jwt" = []))
)]
#[instrument(skip_all, fields(id = id))]
pub async fn update_crew(
    State(state): State<AppState>,
    _staff: StaffUser,
    ResourceId(id): ResourceId,
    ApiJson(request): ApiJson<CrewRequest>,
) -> ApiResult<Json<CrewView>> {
    Ok(Json(state.catalog.update_crew(id, request).await?))
}

#[utoipa::path(
    patch,
    path = "/api/v1/airport/crews/{id}/",
    tag = "schedule",
    params(("id" = i64, Path, description = "Crew member id")),
    request_body = CrewPatch,
    responses(
        (status = 200, description = "Crew member updated", body = CrewView),
        (status = 400, description = "Invalid input"),
        (status = 404, description = "Not found")
    ),
    security(("jwt" = []))
)]
#[instrument(skip_all, fields(id = id))]
pub async fn patch_crew(
    State(state): State<AppState>,
    _staff: StaffUser,
    ResourceId(id): ResourceId,
    ApiJson(patch): ApiJson<CrewPatch>,
) -> ApiResult<Json<CrewView>> {
    Ok(Json(state.catalog.patch_crew(id, patch).await?))
}

// ---- Flights ----

#[utoipa::path(
    get,
    path = "/api/v1/airport/flights/",
    tag = "schedule",
    params(FlightQuery),
    responses(
        (status = 200, description = "Flights", body = FlightPage),
        (status = 400, description = "Invalid route filter"),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Invalid page")
    ),
    security(("jwt" = []))
)]
#[instrument(skip_all)]
pub async fn list_flights(
    State(state): State<AppState>,
    _user: CurrentUser,
    OriginalUri(uri): OriginalUri,
    Query(query): Query<FlightQuery>,
) -> ApiResult<Json<Page<FlightListItem>>> {
    let filter = parse_route_filter(query.route.as_deref())?;
    let page = requested_page(&state, query.page.as_deref())?;
    let listing = state.catalog.list_flights(&filter, page).await?;
    paginated(&uri, listing)
}

#[utoipa::path(
    post,
    path = "/api/v1/airport/flights/",
    tag = "schedule",
    request_body = FlightRequest,
    responses(
        (status = 201, description = "Flight created", body = FlightView),
        (status = 400, description = "Invalid input"),
        (status = 403, description = "Staff only")
    ),
    security(("jwt" = []))
)]
#[instrument(skip_all)]
pub async fn create_flight(
    State(state): State<AppState>,
    _staff: StaffUser,
    ApiJson(request): ApiJson<FlightRequest>,
) -> ApiResult<Created<FlightView>> {
    Ok(created(state.catalog.create_flight(request).await?))
}

#[utoipa::path(
    get,
    path = "/api/v1/airport/flights/{id}/",
    tag = "schedule",
    params(("id" = i64, Path, description = "Flight id")),
    responses(
        (status = 200, description = "Flight with route, airplane and crew names", body = FlightDetail),
        (status = 404, description = "Not found")
    ),
    security(("jwt" = []))
)]
#[instrument(skip_all, fields(id = id))]
pub async fn get_flight(
    State(state): State<AppState>,
    _user: CurrentUser,
    ResourceId(id): ResourceId,
) -> ApiResult<Json<FlightDetail>> {
    Ok(Json(state.catalog.get_flight(id).await?))
}

#[utoipa::path(
    put,
    path = "/api/v1/airport/flights/{id}/",
    tag = "schedule",
    params(("id" = i64, Path, description = "Flight id")),
    request_body = FlightRequest,
    responses(
        (status = 200, description = "Flight updated", body = FlightView),
        (status = 400, description = "Invalid input"),
        (status = 404, description = "Not found")
    ),
    security(("jwt" = []))
)]
#[instrument(skip_all, fields(id = id))]
pub async fn update_flight(
    State(state): State<AppState>,
    _staff: StaffUser,
    ResourceId(id): ResourceId,
    ApiJson(request): ApiJson<FlightRequest>,
) -> ApiResult<Json<FlightView>> {
    Ok(Json(state.catalog.update_flight(id, request).await?))
}

#[utoipa::path(
    patch,
    path = "/api/v1/airport/flights/{id}/",
    tag = "schedule",
    params(("id" = i64, Path, description = "Flight id")),
    request_body = FlightPatch,
    responses(
        (status = 200, description = "Flight updated", body = FlightView),
        (status = 400, description = "Invalid input"),
        (status = 404, description = "Not found")
    ),
    security(("jwt" = []))
)]
#[instrument(skip_all, fields(id = id))]
pub async fn patch_flight(
    State(state): State<AppState>,
    _staff: StaffUser,
    ResourceId(id): ResourceId,
    ApiJson(patch): ApiJson<FlightPatch>,
) -> ApiResult<Json<FlightView>> {
    Ok(Json(state.catalog.patch_flight(id, patch).await?))
}
