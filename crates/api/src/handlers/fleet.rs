use super::{created, paginated, requested_page, Created};
use crate::error::ApiResult;
use crate::middleware::{ApiJson, CurrentUser, ResourceId, StaffUser};
use crate::state::AppState;
use airport_control::filters::parse_id_list;
use airport_control::{AirplaneFilter, NO_FILE};
use airport_metrics::TracingService;
use airport_models::{
    AirplaneDetail, AirplaneImage, AirplaneImageUpload, AirplaneListItem, AirplanePage,
    AirplanePatch, AirplaneQuery, AirplaneRequest, AirplaneType, AirplaneTypePage,
    AirplaneTypePatch, AirplaneTypeRequest, AirplaneView, AirportError, Page, PageQuery,
};
use axum::extract::multipart::{Multipart, MultipartRejection};
use axum::extract::{OriginalUri, Query, State};
use axum::Json;
use tracing::instrument;

// ---- Airplane types ----

#[utoipa::path(
    get,
    path = "/api/v1/airport/airplane_types/",
    tag = "fleet",
    params(PageQuery),
    responses(
        (status = 200, description = "Airplane types", body = AirplaneTypePage),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Invalid page")
    ),
    security(("jwt" = []))
)]
#[instrument(skip_all)]
pub async fn list_airplane_types(
    State(state): State<AppState>,
    _user: CurrentUser,
    OriginalUri(uri): OriginalUri,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<Page<AirplaneType>>> {
    let page = requested_page(&state, query.page.as_deref())?;
    let listing = state.catalog.list_airplane_types(page).await?;
    paginated(&uri, listing)
}

#[utoipa::path(
    post,
    path = "/api/v1/airport/airplane_types/",
    tag = "fleet",
    request_body = AirplaneTypeRequest,
    responses(
        (status = 201, description = "Airplane type created", body = AirplaneType),
        (status = 400, description = "Invalid input"),
        (status = 403, description = "Staff only")
    ),
    security(("jwt" = []))
)]
#[instrument(skip_all)]
pub async fn create_airplane_type(
    State(state): State<AppState>,
    _staff: StaffUser,
    ApiJson(request): ApiJson<AirplaneTypeRequest>,
) -> ApiResult<Created<AirplaneType>> {
    Ok(created(state.catalog.create_airplane_type(request).await?))
}

#[utoipa::path(
    get,
    path = "/api/v1/airport/airplane_types/{id}/",
    tag = "fleet",
    params(("id" = i64, Path, description = "Airplane type id")),
    responses(
        (status = 200, description = "Airplane type", body = AirplaneType),
        (status = 404, description = "Not found")
    ),
    security(("jwt" = []))
)]
#[instrument(skip_all, fields(id = id))]
pub async fn get_airplane_type(
    State(state): State<AppState>,
    _user: CurrentUser,
    ResourceId(id): ResourceId,
) -> ApiResult<Json<AirplaneType>> {
    Ok(Json(state.catalog.get_airplane_type(id).await?))
}

#[utoipa::path(
    put,
    path = "/api/v1/airport/airplane_types/{id}/",
    tag = "fleet",
    params(("id" = i64, Path, description = "Airplane type id")),
    request_body = AirplaneTypeRequest,
    responses(
        (status = 200, description = "Airplane type updated", body = AirplaneType),
        (status = 400, description = "Invalid input"),
        (status = 404, description = "Not found")
    ),
    security(("jwt" = []))
)]
#[instrument(skip_all, fields(id = id))]
pub async fn update_airplane_type(
    State(state): State<AppState>,
    _staff: StaffUser,
    ResourceId(id): ResourceId,
    ApiJson(request): ApiJson<AirplaneTypeRequest>,
) -> ApiResult<Json<AirplaneType>> {
    Ok(Json(state.catalog.update_airplane_type(id, request).await?))
}

#[utoipa::path(
    patch,
    path = "/api/v1/airport/airplane_types/{id}/",
    tag = "fleet",
    params(("id" = i64, Path, description = "Airplane type id")),
    request_body = AirplaneTypePatch,
    responses(
        (status = 200, description = "Airplane type updated", body = AirplaneType),
        (status = 400, description = "Invalid input"),
        (status = 404, description = "Not found")
    ),
    security(("jwt" = []))
)]
#[instrument(skip_all, fields(id = id))]
pub async fn patch_airplane_type(
    State(state): State<AppState>,
    _staff: StaffUser,
    ResourceId(id): ResourceId,
    ApiJson(patch): ApiJson<AirplaneTypePatch>,
) -> ApiResult<Json<AirplaneType>> {
    Ok(Json(state.catalog.patch_airplane_type(id, patch).await?))
}

// ---- Airplanes ----

#[utoipa::path(
    get,
    path = "/api/v1/airport/airplanes/",
    tag = "fleet",
    params(AirplaneQuery),
    responses(
        (status = 200, description = "Airplanes", body = AirplanePage),
        (status = 400, description = "Invalid filter"),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Invalid page")
    ),
    security(("jwt" = []))
)]
#[instrument(skip_all)]
pub async fn list_airplanes(
    State(state): State<AppState>,
    _user: CurrentUser,
    OriginalUri(uri): OriginalUri,
    Query(query): Query<AirplaneQuery>,
) -> ApiResult<Json<Page<AirplaneListItem>>> {
    let filter = AirplaneFilter {
        airplane_type_ids: parse_id_list("airplane_types", query.airplane_types.as_deref())?,
    };
    let page = requested_page(&state, query.page.as_deref())?;
    let listing = state.catalog.list_airplanes(&filter, page).await?;
    paginated(&uri, listing)
}

#[utoipa::path(
    post,
    path = "/api/v1/airport/airplanes/",
    tag = "fleet",
    request_body = AirplaneRequest,
    responses(
        (status = 201, description = "Airplane created", body = AirplaneView),
        (status = 400, description = "Invalid input"),
        (status = 403, description = "Staff only")
    ),
    security(("jwt" = []))
)]
#[instrument(skip_all)]
pub async fn create_airplane(
    State(state): State<AppState>,
    _staff: StaffUser,
    ApiJson(request): ApiJson<AirplaneRequest>,
) -> ApiResult<Created<AirplaneView>> {
    Ok(created(state.catalog.create_airplane(request).await?))
}

#[utoipa::path(
    get,
    path = "/api/v1/airport/airplanes/{id}/",
    tag = "fleet",
    params(("id" = i64, Path, description = "Airplane id")),
    responses(
        (status = 200, description = "Airplane", body = AirplaneDetail),
        (status = 404, description = "Not found")
    ),
    security(("jwt" = []))
)]
#[instrument(skip_all, fields(id = id))]
pub async fn get_airplane(
    State(state): State<AppState>,
    _user: CurrentUser,
    ResourceId(id): ResourceId,
) -> ApiResult<Json<AirplaneDetail>> {
    Ok(Json(state.catalog.get_airplane(id).await?))
}

#[utoipa::path(
    put,
    path = "/api/v1/airport/airplanes/{id}/",
    tag = "fleet",
    params(("id" = i64, Path, description = "Airplane id")),
    request_body = AirplaneRequest,
    responses(
        (status = 200, description = "Airplane updated", body = AirplaneView),
        (status = 400, description = "Invalid input"),
        (status = 404, description = "Not found")
    ),
    security(("jwt" = []))
)]
#[instrument(skip_all, fields(id = id))]
pub async fn update_airplane(
    State(state): State<AppState>,
    _staff: StaffUser,
    ResourceId(id): ResourceId,
    ApiJson(request): ApiJson<AirplaneRequest>,
) -> ApiResult<Json<AirplaneView>> {
    Ok(Json(state.catalog.update_airplane(id, request).await?))
}

#[utoipa::path(
    patch,
    path = "/api/v1/airport/airplanes/{id}/",
    tag = "fleet",
    params(("id" = i64, Path, description = "Airplane id")),
    request_body = AirplanePatch,
    responses(
        (status = 200, description = "Airplane updated", body = AirplaneView),
        (status = 400, description = "Invalid input"),
        (status = 404, description = "Not found")
    ),
    security(("jwt" = []))
)]
#[instrument(skip_all, fields(id = id))]
pub async fn patch_airplane(
    State(state): State<AppState>,
    _staff: StaffUser,
    ResourceId(id): ResourceId,
    ApiJson(patch): ApiJson<AirplanePatch>,
) -> ApiResult<Json<AirplaneView>> {
    Ok(Json(state.catalog.patch_airplane(id, patch).await?))
}

async fn image_field(mut multipart: Multipart) -> Result<Option<Vec<u8>>, AirportError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AirportError::Malformed {
            reason: e.body_text(),
        })?
    {
        if field.name() == Some("image") {
            let bytes = field.bytes().await.map_err(|e| AirportError::Malformed {
                reason: e.body_text(),
            })?;
            return Ok(Some(bytes.to_vec()));
        }
    }
    Ok(None)
}

#[utoipa::path(
    post,
    path = "/api/v1/airport/airplanes/{id}/upload-image/",
    tag = "fleet",
    params(("id" = i64, Path, description = "Airplane id")),
    request_body(content = AirplaneImageUpload, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Image stored", body = AirplaneImage),
        (status = 400, description = "Missing or unrecognised image"),
        (status = 403, description = "Staff only"),
        (status = 404, description = "Not found")
    ),
    security(("jwt" = []))
)]
#[instrument(skip_all, fields(id = id))]
pub async fn upload_airplane_image(
    State(state): State<AppState>,
    _staff: StaffUser,
    ResourceId(id): ResourceId,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Json<AirplaneImage>> {
    // Unknown airplanes are a 404 whatever the body.
    state.catalog.get_airplane(id).await?;
    let bytes = match multipart {
        Ok(multipart) => image_field(multipart).await?,
        Err(_) => None,
    }
    .ok_or_else(|| AirportError::field("image", NO_FILE))?;

    let stored = state.catalog.upload_airplane_image(id, &bytes).await?;
    state.metrics.record_image_uploaded();
    TracingService::log_image_uploaded(id, stored.image.as_deref().unwrap_or_default());
    Ok(Json(stored))
}
