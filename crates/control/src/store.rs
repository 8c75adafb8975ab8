use airport_models::{
    Airplane, AirplaneType, Airport, AirportError, Crew, Flight, NewAirplane, NewFlight,
    NewRoute, NewTicket, NewUser, Order, PageRequest, Paginated, Route, Ticket, User,
};
use async_trait::async_trait;

pub type StoreResult<T> = Result<T, AirportError>;

pub const UNIQUE_SEAT_MESSAGE: &str = "The fields row, seat, flight must make a unique set.";
pub const UNIQUE_EMAIL_MESSAGE: &str = "user with this email already exists.";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AirplaneFilter {
    pub airplane_type_ids: Option<Vec<i64>>,
}

/// Case-insensitive substring match on the closest big city of either end.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CityFilter {
    pub source: Option<String>,
    pub destination: Option<String>,
}

impl CityFilter {
    pub fn matches(&self, source_city: &str, destination_city: &str) -> bool {
        fn contains(haystack: &str, needle: &Option<String>) -> bool {
            needle
                .as_ref()
                .map(|n| haystack.to_lowercase().contains(&n.to_lowercase()))
                .unwrap_or(true)
        }
        contains(source_city, &self.source) && contains(destination_city, &self.destination)
    }
}

/// Occupied `(flight, row, seat)` triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TakenSeat {
    pub flight_id: i64,
    pub row: i32,
    pub seat: i32,
}

impl From<&Ticket> for TakenSeat {
    fn from(ticket: &Ticket) -> Self {
        Self {
            flight_id: ticket.flight_id,
            row: ticket.row,
            seat: ticket.seat,
        }
    }
}

impl From<&NewTicket> for TakenSeat {
    fn from(ticket: &NewTicket) -> Self {
        Self {
            flight_id: ticket.flight_id,
            row: ticket.row,
            seat: ticket.seat,
        }
    }
}

/// Persistence boundary of the service.
///
/// Listings are ordered by id, except orders which are newest first.
/// `*_by_ids` lookups return whatever subset exists, in id order.
/// Updates return `NotFound` when the row is gone.
#[async_trait]
pub trait AirportStore: Send + Sync {
    async fn ping(&self) -> StoreResult<()>;

    // Users
    async fn insert_user(&self, user: NewUser) -> StoreResult<User>;
    async fn user_by_id(&self, id: i64) -> StoreResult<Option<User>>;
    async fn user_by_email(&self, email: &str) -> StoreResult<Option<User>>;
    async fn update_user(&self, user: &User) -> StoreResult<()>;

    // Airplane types
    async fn list_airplane_types(&self, page: PageRequest) -> StoreResult<Paginated<AirplaneType>>;
    async fn airplane_types_by_ids(&self, ids: &[i64]) -> StoreResult<Vec<AirplaneType>>;
    async fn insert_airplane_type(&self, name: &str) -> StoreResult<AirplaneType>;
    async fn update_airplane_type(&self, airplane_type: &AirplaneType) -> StoreResult<()>;

    // Airplanes
    async fn list_airplanes(
        &self,
        filter: &AirplaneFilter,
        page: PageRequest,
    ) -> StoreResult<Paginated<Airplane>>;
    async fn airplanes_by_ids(&self, ids: &[i64]) -> StoreResult<Vec<Airplane>>;
    async fn insert_airplane(&self, airplane: NewAirplane) -> StoreResult<Airplane>;
    async fn update_airplane(&self, airplane: &Airplane) -> StoreResult<()>;

    // Airports
    async fn list_airports(&self, page: PageRequest) -> StoreResult<Paginated<Airport>>;
    async fn airports_by_ids(&self, ids: &[i64]) -> StoreResult<Vec<Airport>>;
    async fn insert_airport(&self, name: &str, closest_big_city: &str) -> StoreResult<Airport>;
    async fn update_airport(&self, airport: &Airport) -> StoreResult<()>;

    // Routes
    async fn list_routes(&self, filter: &CityFilter, page: PageRequest)
        -> StoreResult<Paginated<Route>>;
    async fn routes_by_ids(&self, ids: &[i64]) -> StoreResult<Vec<Route>>;
    async fn insert_route(&self, route: NewRoute) -> StoreResult<Route>;
    async fn update_route(&self, route: &Route) -> StoreResult<()>;

    // Crews
    async fn list_crews(&self, page: PageRequest) -> StoreResult<Paginated<Crew>>;
    async fn crews_by_ids(&self, ids: &[i64]) -> StoreResult<Vec<Crew>>;
    async fn insert_crew(&self, first_name: &str, last_name: &str) -> StoreResult<Crew>;
    async fn update_crew(&self, crew: &Crew) -> StoreResult<()>;

    // Flights, with their crew ids
    async fn list_flights(&self, filter: &CityFilter, page: PageRequest)
        -> StoreResult<Paginated<Flight>>;
    async fn flights_by_ids(&self, ids: &[i64]) -> StoreResult<Vec<Flight>>;
    async fn insert_flight(&self, flight: NewFlight) -> StoreResult<Flight>;
    async fn update_flight(&self, flight: &Flight) -> StoreResult<()>;

    // Orders, with their tickets
    async fn list_orders(&self, user_id: i64, page: PageRequest) -> StoreResult<Paginated<Order>>;
    async fn order_for_user(&self, order_id: i64, user_id: i64) -> StoreResult<Option<Order>>;
    /// Creates the order and all its tickets atomically.
    async fn create_order(&self, user_id: i64, tickets: &[NewTicket]) -> StoreResult<Order>;
    /// Atomically swaps the order's tickets for `tickets`.
    async fn replace_tickets(&self, order_id: i64, tickets: &[NewTicket]) -> StoreResult<Order>;
    /// Seats already sold on the given flights, ignoring tickets of `excluding_order`.
    async fn taken_seats(
        &self,
        flight_ids: &[i64],
        excluding_order: Option<i64>,
    ) -> StoreResult<Vec<TakenSeat>>;
}
