use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgRow;
use sqlx::{FromRow, Row};
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Order {
    pub id: i64,
    pub created_time: DateTime<Utc>,
    pub user_id: i64,
    #[sqlx(skip)]
    pub tickets: Vec<Ticket>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
    pub id: i64,
    pub row: i32,
    pub seat: i32,
    pub flight_id: i64,
    pub order_id: i64,
}

// Not derived: a field named `row` clashes with the derive's own `row` binding.
impl<'r> FromRow<'r, PgRow> for Ticket {
    fn from_row(record: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: record.try_get("id")?,
            row: record.try_get("row")?,
            seat: record.try_get("seat")?,
            flight_id: record.try_get("flight_id")?,
            order_id: record.try_get("order_id")?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NewTicket {
    pub row: i32,
    pub seat: i32,
    pub flight_id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct TicketRequest {
    pub row: i32,
    pub seat: i32,
    /// Flight id.
    pub flight: i64,
}

impl From<&TicketRequest> for NewTicket {
    fn from(request: &TicketRequest) -> Self {
        Self {
            row: request.row,
            seat: request.seat,
            flight_id: request.flight,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct OrderRequest {
    pub tickets: Vec<TicketRequest>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct OrderPatch {
    pub tickets: Option<Vec<TicketRequest>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TicketView {
    pub id: i64,
    pub row: i32,
    pub seat: i32,
    pub flight: i64,
}

impl From<&Ticket> for TicketView {
    fn from(ticket: &Ticket) -> Self {
        Self {
            id: ticket.id,
            row: ticket.row,
            seat: ticket.seat,
            flight: ticket.flight_id,
        }
    }
}

/// Returned by create and update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct OrderView {
    pub id: i64,
    pub created_time: DateTime<Utc>,
    pub tickets: Vec<TicketView>,
}

impl From<&Order> for OrderView {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id,
            created_time: order.created_time,
            tickets: order.tickets.iter().map(TicketView::from).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct FlightSummary {
    pub id: i64,
    /// `"{source city}-{destination city}"`.
    pub route: String,
    pub departure_time: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TicketListItem {
    pub id: i64,
    pub row: i32,
    pub seat: i32,
    pub flight: FlightSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct OrderListItem {
    pub id: i64,
    pub created_time: DateTime<Utc>,
    pub tickets: Vec<TicketListItem>,
}
