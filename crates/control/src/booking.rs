use crate::store::{AirportStore, StoreResult, TakenSeat, UNIQUE_SEAT_MESSAGE};
use crate::validation::{out_of_range, Validator, EMPTY_LIST};
use airport_models::{
    Airplane, AirportError, FieldErrors, Flight, FlightSummary, NewTicket, Order, OrderListItem,
    OrderPatch, OrderRequest, OrderView, PageRequest, Paginated, TicketListItem, TicketRequest,
    NON_FIELD_ERRORS,
};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;
use tracing::{info, instrument};

/// Orders and tickets of the calling user.
#[derive(Clone)]
pub struct BookingService {
    store: Arc<dyn AirportStore>,
}

impl BookingService {
    pub fn new(store: Arc<dyn AirportStore>) -> Self {
        Self { store }
    }

    pub async fn list_orders(&self, user_id: i64, page: PageRequest) -> StoreResult<Paginated<OrderListItem>> {
        let listing = self.store.list_orders(user_id, page).await?;
        let items = self.order_list_items(&listing.items).await?;
        Ok(Paginated {
            items,
            count: listing.count,
            page: listing.page,
        })
    }

    pub async fn get_order(&self, user_id: i64, order_id: i64) -> StoreResult<OrderListItem> {
        let order = self.find_order(user_id, order_id).await?;
        let mut items = self.order_list_items(std::slice::from_ref(&order)).await?;
        items.pop().ok_or(AirportError::NotFound {
            resource: "order",
            id: order_id,
        })
    }

    #[instrument(skip(self, request), fields(tickets = request.tickets.len()))]
    pub async fn create_order(&self, user_id: i64, request: OrderRequest) -> StoreResult<OrderView> {
        let tickets = self.validate_tickets(&request.tickets, None).await?;
        let order = self.store.create_order(user_id, &tickets).await?;
        info!(
            "User {} placed order {} with {} ticket(s)",
            user_id,
            order.id,
            order.tickets.len()
        );
        Ok(OrderView::from(&order))
    }

    /// Full update: the order's tickets become exactly `request.tickets`.
    pub async fn update_order(
        &self,
        user_id: i64,
        order_id: i64,
        request: OrderRequest,
    ) -> StoreResult<OrderView> {
        self.patch_order(
            user_id,
            order_id,
            OrderPatch {
                tickets: Some(request.tickets),
            },
        )
        .await
    }

    /// Partial update: tickets are replaced only when present.
    #[instrument(skip(self, patch))]
    pub async fn patch_order(&self, user_id: i64, order_id: i64, patch: OrderPatch) -> StoreResult<OrderView> {
        let order = self.find_order(user_id, order_id).await?;
        let Some(requested) = patch.tickets else {
            return Ok(OrderView::from(&order));
        };

        let tickets = self.validate_tickets(&requested, Some(order.id)).await?;
        let order = self.store.replace_tickets(order.id, &tickets).await?;
        info!("Order {} now holds {} ticket(s)", order.id, order.tickets.len());
        Ok(OrderView::from(&order))
    }

    async fn find_order(&self, user_id: i64, order_id: i64) -> StoreResult<Order> {
        self.store
            .order_for_user(order_id, user_id)
            .await?
            .ok_or(AirportError::NotFound {
                resource: "order",
                id: order_id,
            })
    }

    /// Check every requested ticket against its flight's airplane and the
    /// seats already sold. `replacing` names an order whose own tickets
    /// are about to be released.
    async fn validate_tickets(
        &self,
        requested: &[TicketRequest],
        replacing: Option<i64>,
    ) -> StoreResult<Vec<NewTicket>> {
        if requested.is_empty() {
            return Err(AirportError::field("tickets", EMPTY_LIST));
        }

        let flight_ids: Vec<i64> = requested
            .iter()
            .map(|t| t.flight)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let flights: HashMap<i64, Flight> = self
            .store
            .flights_by_ids(&flight_ids)
            .await?
            .into_iter()
            .map(|f| (f.id, f))
            .collect();
        let airplane_ids: Vec<i64> = flights
            .values()
            .map(|f| f.airplane_id)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let airplanes: HashMap<i64, Airplane> = self
            .store
            .airplanes_by_ids(&airplane_ids)
            .await?
            .into_iter()
            .map(|a| (a.id, a))
            .collect();
        let taken: HashSet<TakenSeat> = self
            .store
            .taken_seats(&flight_ids, replacing)
            .await?
            .into_iter()
            .collect();

        let mut validator = Validator::new();
        let mut claimed = HashSet::new();
        for (index, ticket) in requested.iter().enumerate() {
            let errors = check_ticket(ticket, &flights, &airplanes, &taken, &mut claimed);
            if !errors.is_empty() {
                validator.nested("tickets", index, errors);
            }
        }
        validator.finish()?;

        Ok(requested.iter().map(NewTicket::from).collect())
    }

    async fn order_list_items(&self, orders: &[Order]) -> StoreResult<Vec<OrderListItem>> {
        let flight_ids: Vec<i64> = orders
            .iter()
            .flat_map(|o| o.tickets.iter().map(|t| t.flight_id))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let summaries = self.flight_summaries(&flight_ids).await?;

        let mut items = Vec::with_capacity(orders.len());
        for order in orders {
            let mut tickets = Vec::with_capacity(order.tickets.len());
            for ticket in &order.tickets {
                let flight = summaries
                    .get(&ticket.flight_id)
                    .cloned()
                    .ok_or(AirportError::NotFound {
                        resource: "flight",
                        id: ticket.flight_id,
                    })?;
                tickets.push(TicketListItem {
                    id: ticket.id,
                    row: ticket.row,
                    seat: ticket.seat,
                    flight,
                });
            }
            items.push(OrderListItem {
                id: order.id,
                created_time: order.created_time,
                tickets,
            });
        }
        Ok(items)
    }

    async fn flight_summaries(&self, flight_ids: &[i64]) -> StoreResult<HashMap<i64, FlightSummary>> {
        let flights = self.store.flights_by_ids(flight_ids).await?;
        let route_ids: Vec<i64> = flights
            .iter()
            .map(|f| f.route_id)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let routes = self.store.routes_by_ids(&route_ids).await?;
        let airport_ids: Vec<i64> = routes
            .iter()
            .flat_map(|r| [r.source_id, r.destination_id])
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let cities: HashMap<i64, String> = self
            .store
            .airports_by_ids(&airport_ids)
            .await?
            .into_iter()
            .map(|a| (a.id, a.closest_big_city))
            .collect();
        let route_names: HashMap<i64, String> = routes
            .iter()
            .map(|r| {
                let city = |id: i64| cities.get(&id).map(String::as_str).unwrap_or_default();
                (
                    r.id,
                    format!("{}-{}", city(r.source_id), city(r.destination_id)),
                )
            })
            .collect();

        Ok(flights
            .into_iter()
            .map(|flight| {
                let summary = FlightSummary {
                    id: flight.id,
                    route: route_names.get(&flight.route_id).cloned().unwrap_or_default(),
                    departure_time: flight.departure_time,
                };
                (flight.id, summary)
            })
            .collect())
    }
}

/// Field errors of one requested ticket. Seats that pass are recorded in
/// `claimed` so a later duplicate in the same request is rejected.
fn check_ticket(
    ticket: &TicketRequest,
    flights: &HashMap<i64, Flight>,
    airplanes: &HashMap<i64, Airplane>,
    taken: &HashSet<TakenSeat>,
    claimed: &mut HashSet<TakenSeat>,
) -> FieldErrors {
    let mut validator = Validator::new();
    validator
        .min_value("row", ticket.row.into(), 1)
        .min_value("seat", ticket.seat.into(), 1);
    let airplane = flights
        .get(&ticket.flight)
        .and_then(|flight| airplanes.get(&flight.airplane_id));
    validator.reference("flight", ticket.flight, airplane.is_some());
    if !validator.is_valid() {
        return validator.into_errors();
    }

    if let Some(airplane) = airplane {
        if ticket.row > airplane.rows {
            validator.add("row", out_of_range("row", "rows", airplane.rows));
        }
        if ticket.seat > airplane.seats_in_row {
            validator.add(
                "seat",
                out_of_range("seat", "seats_in_row", airplane.seats_in_row),
            );
        }
    }
    if !validator.is_valid() {
        return validator.into_errors();
    }

    let seat = TakenSeat::from(&NewTicket::from(ticket));
    if taken.contains(&seat) || !claimed.insert(seat) {
        validator.add(NON_FIELD_ERRORS, UNIQUE_SEAT_MESSAGE);
    }
    validator.into_errors()
}
