pub mod fleet;
pub mod health;
pub mod network;
pub mod orders;
pub mod schedule;
pub mod users;

pub use fleet::*;
pub use health::*;
pub use network::*;
pub use orders::*;
pub use schedule::*;
pub use users::*;

use crate::error::ApiResult;
use crate::pagination::to_page;
use crate::state::AppState;
use airport_control::filters::{ensure_page_exists, parse_page};
use airport_models::{AirportError, Page, PageRequest, Paginated};
use axum::http::{StatusCode, Uri};
use axum::Json;

pub type Created<T> = (StatusCode, Json<T>);

pub(crate) fn created<T>(body: T) -> Created<T> {
    (StatusCode::CREATED, Json(body))
}

pub(crate) fn requested_page(state: &AppState, raw: Option<&str>) -> Result<PageRequest, AirportError> {
    parse_page(raw, state.page_size())
}

pub(crate) fn paginated<T>(uri: &Uri, listing: Paginated<T>) -> ApiResult<Json<Page<T>>> {
    ensure_page_exists(&listing)?;
    Ok(Json(to_page(uri, listing)))
}
