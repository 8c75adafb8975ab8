use super::{created, paginated, requested_page, Created};
use crate::error::ApiResult;
use crate::middleware::{ApiJson, CurrentUser, ResourceId};
use crate::state::AppState;
use airport_metrics::TracingService;
use airport_models::{
    OrderListItem, OrderPage, OrderPatch, OrderRequest, OrderView, Page, PageQuery,
};
use axum::extract::{OriginalUri, Query, State};
use axum::Json;
use tracing::instrument;

#[utoipa::path(
    get,
    path = "/api/v1/airport/orders/",
    tag = "orders",
    params(PageQuery),
    responses(
        (status = 200, description = "The caller's orders, newest first", body = OrderPage),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Invalid page")
    ),
    security(("jwt" = []))
)]
#[instrument(skip_all, fields(user_id = user.id))]
pub async fn list_orders(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    OriginalUri(uri): OriginalUri,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<Page<OrderListItem>>> {
    let page = requested_page(&state, query.page.as_deref())?;
    let listing = state.booking.list_orders(user.id, page).await?;
    paginated(&uri, listing)
}

#[utoipa::path(
    post,
    path = "/api/v1/airport/orders/",
    tag = "orders",
    request_body = OrderRequest,
    responses(
        (status = 201, description = "Order placed", body = OrderView),
        (status = 400, description = "Invalid or taken seats"),
        (status = 401, description = "Not authenticated")
    ),
    security(("jwt" = []))
)]
#[instrument(skip_all, fields(user_id = user.id))]
pub async fn create_order(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiJson(request): ApiJson<OrderRequest>,
) -> ApiResult<Created<OrderView>> {
    let order = state.booking.create_order(user.id, request).await?;
    state.metrics.record_order_created(order.tickets.len());
    TracingService::log_order_placed(user.id, order.id, order.tickets.len());
    Ok(created(order))
}

#[utoipa::path(
    get,
    path = "/api/v1/airport/orders/{id}/",
    tag = "orders",
    params(("id" = i64, Path, description = "Order id")),
    responses(
        (status = 200, description = "Order", body = OrderListItem),
        (status = 404, description = "Not found or not the caller's")
    ),
    security(("jwt" = []))
)]
#[instrument(skip_all, fields(user_id = user.id, id = id))]
pub async fn get_order(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ResourceId(id): ResourceId,
) -> ApiResult<Json<OrderListItem>> {
    Ok(Json(state.booking.get_order(user.id, id).await?))
}

#[utoipa::path(
    put,
    path = "/api/v1/airport/orders/{id}/",
    tag = "orders",
    params(("id" = i64, Path, description = "Order id")),
    request_body = OrderRequest,
    responses(
        (status = 200, description = "Tickets replaced", body = OrderView),
        (status = 400, description = "Invalid or taken seats"),
        (status = 404, description = "Not found or not the caller's")
    ),
    security(("jwt" = []))
)]
#[instrument(skip_all, fields(user_id = user.id, id = id))]
pub async fn update_order(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ResourceId(id): ResourceId,
    ApiJson(request): ApiJson<OrderRequest>,
) -> ApiResult<Json<OrderView>> {
    let order = state.booking.update_order(user.id, id, request).await?;
    state.metrics.record_tickets_replaced(order.tickets.len());
    Ok(Json(order))
}

#[utoipa::path(
    patch,
    path = "/api/v1/airport/orders/{id}/",
    tag = "orders",
    params(("id" = i64, Path, description = "Order id")),
    request_body = OrderPatch,
    responses(
        (status = 200, description = "Order, with tickets replaced when given", body = OrderView),
        (status = 400, description = "Invalid or taken seats"),
        (status = 404, description = "Not found or not the caller's")
    ),
    security(("jwt" = []))
)]
#[instrument(skip_all, fields(user_id = user.id, id = id))]
pub async fn patch_order(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ResourceId(id): ResourceId,
    ApiJson(patch): ApiJson<OrderPatch>,
) -> ApiResult<Json<OrderView>> {
    let replaces_tickets = patch.tickets.is_some();
    let order = state.booking.patch_order(user.id, id, patch).await?;
    if replaces_tickets {
        state.metrics.record_tickets_replaced(order.tickets.len());
    }
    Ok(Json(order))
}
