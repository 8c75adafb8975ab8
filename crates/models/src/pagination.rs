use crate::{
    AirplaneListItem, AirplaneType, Airport, CrewView, FlightListItem, OrderListItem,
    RouteListItem,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// 1-based page window over an ordered listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub number: i64,
    pub size: i64,
}

impl PageRequest {
    pub fn new(number: i64, size: i64) -> Self {
        Self { number, size }
    }

    pub fn first(size: i64) -> Self {
        Self::new(1, size)
    }

    /// `None` when the window starts beyond what an `i64` offset can address.
    pub fn checked_offset(&self) -> Option<i64> {
        self.number.checked_sub(1)?.checked_mul(self.size)
    }

    pub fn offset(&self) -> i64 {
        self.checked_offset().unwrap_or(i64::MAX)
    }

    pub fn limit(&self) -> i64 {
        self.size
    }
}

/// A page of items plus the total count of the unpaginated listing.
#[derive(Debug, Clone, PartialEq)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub count: i64,
    pub page: PageRequest,
}

impl<T> Paginated<T> {
    pub fn has_next(&self) -> bool {
        self.page.number.saturating_mul(self.page.size) < self.count
    }

    pub fn has_previous(&self) -> bool {
        self.page.number > 1
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Paginated<U> {
        Paginated {
            items: self.items.into_iter().map(f).collect(),
            count: self.count,
            page: self.page,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[aliases(
    AirplaneTypePage = Page<AirplaneType>,
    AirplanePage = Page<AirplaneListItem>,
    AirportPage = Page<Airport>,
    RoutePage = Page<RouteListItem>,
    CrewPage = Page<CrewView>,
    FlightPage = Page<FlightListItem>,
    OrderPage = Page<OrderListItem>
)]
pub struct Page<T> {
    pub count: i64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<T>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageQuery {
    /// Page number, starting at 1.
    pub page: Option<String>,
}
