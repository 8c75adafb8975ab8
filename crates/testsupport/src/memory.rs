use airport_control::{
    AirplaneFilter, AirportStore, CityFilter, StoreResult, TakenSeat, UNIQUE_EMAIL_MESSAGE,
    UNIQUE_SEAT_MESSAGE,
};
use airport_models::{
    Airplane, AirplaneType, Airport, AirportError, Crew, Flight, NewAirplane, NewFlight,
    NewRoute, NewTicket, NewUser, Order, PageRequest, Paginated, Route, Ticket, User,
    NON_FIELD_ERRORS,
};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct Tables {
    next_id: i64,
    users: BTreeMap<i64, User>,
    airplane_types: BTreeMap<i64, AirplaneType>,
    airplanes: BTreeMap<i64, Airplane>,
    airports: BTreeMap<i64, Airport>,
    routes: BTreeMap<i64, Route>,
    crews: BTreeMap<i64, Crew>,
    flights: BTreeMap<i64, Flight>,
    orders: BTreeMap<i64, Order>,
    tickets: BTreeMap<i64, Ticket>,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn city(&self, airport_id: i64) -> &str {
        self.airports
            .get(&airport_id)
            .map(|a| a.closest_big_city.as_str())
            .unwrap_or_default()
    }

    fn route_matches(&self, route_id: i64, filter: &CityFilter) -> bool {
        self.routes
            .get(&route_id)
            .map(|r| filter.matches(self.city(r.source_id), self.city(r.destination_id)))
            .unwrap_or(false)
    }

    fn tickets_of(&self, order_id: i64) -> Vec<Ticket> {
        self.tickets
            .values()
            .filter(|t| t.order_id == order_id)
            .cloned()
            .collect()
    }

    fn with_tickets(&self, order: &Order) -> Order {
        Order {
            tickets: self.tickets_of(order.id),
            ..order.clone()
        }
    }

    /// Rejects seats already sold, except those of `excluding_order`, and
    /// duplicates within `tickets`.
    fn check_seats(&self, tickets: &[NewTicket], excluding_order: Option<i64>) -> StoreResult<()> {
        let mut seats: HashSet<TakenSeat> = self
            .tickets
            .values()
            .filter(|t| Some(t.order_id) != excluding_order)
            .map(TakenSeat::from)
            .collect();
        for ticket in tickets {
            if !seats.insert(TakenSeat::from(ticket)) {
                return Err(AirportError::field(NON_FIELD_ERRORS, UNIQUE_SEAT_MESSAGE));
            }
        }
        Ok(())
    }

    fn insert_tickets(&mut self, order_id: i64, tickets: &[NewTicket]) -> Vec<Ticket> {
        tickets
            .iter()
            .map(|t| {
                let ticket = Ticket {
                    id: self.next_id(),
                    row: t.row,
                    seat: t.seat,
                    flight_id: t.flight_id,
                    order_id,
                };
                self.tickets.insert(ticket.id, ticket.clone());
                ticket
            })
            .collect()
    }
}

fn paginate<T: Clone>(items: Vec<T>, page: PageRequest) -> Paginated<T> {
    let count = items.len() as i64;
    let items = items
        .into_iter()
        .skip(page.offset().max(0) as usize)
        .take(page.limit().max(0) as usize)
        .collect();
    Paginated { items, count, page }
}

fn by_ids<T: Clone>(table: &BTreeMap<i64, T>, ids: &[i64]) -> Vec<T> {
    table
        .iter()
        .filter(|(id, _)| ids.contains(id))
        .map(|(_, v)| v.clone())
        .collect()
}

fn replace<T>(table: &mut BTreeMap<i64, T>, id: i64, value: T, resource: &'static str) -> StoreResult<()> {
    match table.get_mut(&id) {
        Some(slot) => {
            *slot = value;
            Ok(())
        }
        None => Err(AirportError::NotFound { resource, id }),
    }
}

/// `AirportStore` kept in memory. Ids come from one shared sequence.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
    offline: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `ping` fail, as an unreachable database would.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub async fn ticket_count(&self) -> usize {
        self.tables.read().await.tickets.len()
    }

    pub async fn order_count(&self) -> usize {
        self.tables.read().await.orders.len()
    }
}

#[async_trait]
impl AirportStore for MemoryStore {
    async fn ping(&self) -> StoreResult<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(AirportError::DatabaseError {
                reason: "connection refused".to_string(),
            });
        }
        Ok(())
    }

    async fn insert_user(&self, user: NewUser) -> StoreResult<User> {
        let mut tables = self.tables.write().await;
        if tables
            .users
            .values()
            .any(|u| u.email.eq_ignore_ascii_case(&user.email))
        {
            return Err(AirportError::field("email", UNIQUE_EMAIL_MESSAGE));
        }
        let created = User {
            id: tables.next_id(),
            email: user.email,
            password_hash: user.password_hash,
            is_staff: user.is_staff,
            date_joined: Utc::now(),
        };
        tables.users.insert(created.id, created.clone());
        Ok(created)
    }

    async fn user_by_id(&self, id: i64) -> StoreResult<Option<User>> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .values()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn update_user(&self, user: &User) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        if tables
            .users
            .values()
            .any(|u| u.id != user.id && u.email.eq_ignore_ascii_case(&user.email))
        {
            return Err(AirportError::field("email", UNIQUE_EMAIL_MESSAGE));
        }
        replace(&mut tables.users, user.id, user.clone(), "user")
    }

    async fn list_airplane_types(&self, page: PageRequest) -> StoreResult<Paginated<AirplaneType>> {
        let tables = self.tables.read().await;
        Ok(paginate(tables.airplane_types.values().cloned().collect(), page))
    }

    async fn airplane_types_by_ids(&self, ids: &[i64]) -> StoreResult<Vec<AirplaneType>> {
        Ok(by_ids(&self.tables.read().await.airplane_types, ids))
    }

    async fn insert_airplane_type(&self, name: &str) -> StoreResult<AirplaneType> {
        let mut tables = self.tables.write().await;
        let created = AirplaneType {
            id: tables.next_id(),
            name: name.to_string(),
        };
        tables.airplane_types.insert(created.id, created.clone());
        Ok(created)
    }

    async fn update_airplane_type(&self, airplane_type: &AirplaneType) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        replace(
            &mut tables.airplane_types,
            airplane_type.id,
            airplane_type.clone(),
            "airplane type",
        )
    }

    async fn list_airplanes(
        &self,
        filter: &AirplaneFilter,
        page: PageRequest,
    ) -> StoreResult<Paginated<Airplane>> {
        let tables = self.tables.read().await;
        let items = tables
            .airplanes
            .values()
            .filter(|a| {
                filter
                    .airplane_type_ids
                    .as_ref()
                    .map(|ids| ids.contains(&a.airplane_type_id))
                    .unwrap_or(true)
            })
            .cloned()
            .collect();
        Ok(paginate(items, page))
    }

    async fn airplanes_by_ids(&self, ids: &[i64]) -> StoreResult<Vec<Airplane>> {
        Ok(by_ids(&self.tables.read().await.airplanes, ids))
    }

    async fn insert_airplane(&self, airplane: NewAirplane) -> StoreResult<Airplane> {
        let mut tables = self.tables.write().await;
        let created = Airplane {
            id: tables.next_id(),
            name: airplane.name,
            rows: airplane.rows,
            seats_in_row: airplane.seats_in_row,
            airplane_type_id: airplane.airplane_type_id,
            image: None,
        };
        tables.airplanes.insert(created.id, created.clone());
        Ok(created)
    }

    async fn update_airplane(&self, airplane: &Airplane) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        replace(&mut tables.airplanes, airplane.id, airplane.clone(), "airplane")
    }

    async fn list_airports(&self, page: PageRequest) -> StoreResult<Paginated<Airport>> {
        let tables = self.tables.read().await;
        Ok(paginate(tables.airports.values().cloned().collect(), page))
    }

    async fn airports_by_ids(&self, ids: &[i64]) -> StoreResult<Vec<Airport>> {
        Ok(by_ids(&self.tables.read().await.airports, ids))
    }

    async fn insert_airport(&self, name: &str, closest_big_city: &str) -> StoreResult<Airport> {
        let mut tables = self.tables.write().await;
        let created = Airport {
            id: tables.next_id(),
            name: name.to_string(),
            closest_big_city: closest_big_city.to_string(),
        };
        tables.airports.insert(created.id, created.clone());
        Ok(created)
    }

    async fn update_airport(&self, airport: &Airport) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        replace(&mut tables.airports, airport.id, airport.clone(), "airport")
    }

    async fn list_routes(&self, filter: &CityFilter, page: PageRequest) -> StoreResult<Paginated<Route>> {
        let tables = self.tables.read().await;
        let items = tables
            .routes
            .values()
            .filter(|r| tables.route_matches(r.id, filter))
            .cloned()
            .collect();
        Ok(paginate(items, page))
    }

    async fn routes_by_ids(&self, ids: &[i64]) -> StoreResult<Vec<Route>> {
        Ok(by_ids(&self.tables.read().await.routes, ids))
    }

    async fn insert_route(&self, route: NewRoute) -> StoreResult<Route> {
        let mut tables = self.tables.write().await;
        let created = Route {
            id: tables.next_id(),
            source_id: route.source_id,
            destination_id: route.destination_id,
            distance: route.distance,
        };
        tables.routes.insert(created.id, created.clone());
        Ok(created)
    }

    async fn update_route(&self, route: &Route) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        replace(&mut tables.routes, route.id, route.clone(), "route")
    }

    async fn list_crews(&self, page: PageRequest) -> StoreResult<Paginated<Crew>> {
        let tables = self.tables.read().await;
        Ok(paginate(tables.crews.values().cloned().collect(), page))
    }

    async fn crews_by_ids(&self, ids: &[i64]) -> StoreResult<Vec<Crew>> {
        Ok(by_ids(&self.tables.read().await.crews, ids))
    }

    async fn insert_crew(&self, first_name: &str, last_name: &str) -> StoreResult<Crew> {
        let mut tables = self.tables.write().await;
        let created = Crew {
            id: tables.next_id(),
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
        };
        tables.crews.insert(created.id, created.clone());
        Ok(created)
    }

    async fn update_crew(&self, crew: &Crew) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        replace(&mut tables.crews, crew.id, crew.clone(), "crew")
    }

    async fn list_flights(&self, filter: &CityFilter, page: PageRequest) -> StoreResult<Paginated<Flight>> {
        let tables = self.tables.read().await;
        let items = tables
            .flights
            .values()
            .filter(|f| tables.route_matches(f.route_id, filter))
            .cloned()
            .collect();
        Ok(paginate(items, page))
    }

    async fn flights_by_ids(&self, ids: &[i64]) -> StoreResult<Vec<Flight>> {
        Ok(by_ids(&self.tables.read().await.flights, ids))
    }

    async fn insert_flight(&self, flight: NewFlight) -> StoreResult<Flight> {
        let mut tables = self.tables.write().await;
        let mut crew_ids = flight.crew_ids;
        crew_ids.sort_unstable();
        crew_ids.dedup();
        let created = Flight {
            id: tables.next_id(),
            route_id: flight.route_id,
            airplane_id: flight.airplane_id,
            departure_time: flight.departure_time,
            arrival_time: flight.arrival_time,
            crew_ids,
        };
        tables.flights.insert(created.id, created.clone());
        Ok(created)
    }

    async fn update_flight(&self, flight: &Flight) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        let mut updated = flight.clone();
        updated.crew_ids.sort_unstable();
        updated.crew_ids.dedup();
        replace(&mut tables.flights, flight.id, updated, "flight")
    }

    async fn list_orders(&self, user_id: i64, page: PageRequest) -> StoreResult<Paginated<Order>> {
        let tables = self.tables.read().await;
        let mut orders: Vec<Order> = tables
            .orders
            .values()
            .filter(|o| o.user_id == user_id)
            .map(|o| tables.with_tickets(o))
            .collect();
        orders.sort_by(|a, b| b.created_time.cmp(&a.created_time).then(b.id.cmp(&a.id)));
        Ok(paginate(orders, page))
    }

    async fn order_for_user(&self, order_id: i64, user_id: i64) -> StoreResult<Option<Order>> {
        let tables = self.tables.read().await;
        Ok(tables
            .orders
            .get(&order_id)
            .filter(|o| o.user_id == user_id)
            .map(|o| tables.with_tickets(o)))
    }

    async fn create_order(&self, user_id: i64, tickets: &[NewTicket]) -> StoreResult<Order> {
        let mut tables = self.tables.write().await;
        tables.check_seats(tickets, None)?;

        let mut order = Order {
            id: tables.next_id(),
            created_time: Utc::now(),
            user_id,
            tickets: Vec::new(),
        };
        tables.orders.insert(order.id, order.clone());
        order.tickets = tables.insert_tickets(order.id, tickets);
        Ok(order)
    }

    async fn replace_tickets(&self, order_id: i64, tickets: &[NewTicket]) -> StoreResult<Order> {
        let mut tables = self.tables.write().await;
        let order = tables
            .orders
            .get(&order_id)
            .cloned()
            .ok_or(AirportError::NotFound {
                resource: "order",
                id: order_id,
            })?;
        tables.check_seats(tickets, Some(order_id))?;

        tables.tickets.retain(|_, t| t.order_id != order_id);
        let inserted = tables.insert_tickets(order_id, tickets);
        Ok(Order {
            tickets: inserted,
            ..order
        })
    }

    async fn taken_seats(
        &self,
        flight_ids: &[i64],
        excluding_order: Option<i64>,
    ) -> StoreResult<Vec<TakenSeat>> {
        let tables = self.tables.read().await;
        Ok(tables
            .tickets
            .values()
            .filter(|t| flight_ids.contains(&t.flight_id) && Some(t.order_id) != excluding_order)
            .map(TakenSeat::from)
            .collect())
    }
}
