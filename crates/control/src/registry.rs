use crate::store::{
    AirplaneFilter, AirportStore, CityFilter, StoreResult, TakenSeat, UNIQUE_EMAIL_MESSAGE,
    UNIQUE_SEAT_MESSAGE,
};
use airport_models::{
    Airplane, AirplaneType, Airport, AirportError, Crew, Flight, NewAirplane, NewFlight,
    NewRoute, NewTicket, NewUser, Order, PageRequest, Paginated, Route, Ticket, User,
    NON_FIELD_ERRORS,
};
use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use std::collections::HashMap;
use tracing::{info, instrument};

const UNIQUE_VIOLATION: &str = "23505";

const FLIGHT_COLUMNS: &str = "f.id, f.route_id, f.airplane_id, f.departure_time, f.arrival_time";
const TICKET_COLUMNS: &str = r#"id, "row", seat, flight_id, order_id"#;

/// Turn a unique violation into a 400 on `field`; other errors pass through.
fn unique_violation(error: sqlx::Error, field: &str, message: &str) -> AirportError {
    let is_unique = matches!(
        &error,
        sqlx::Error::Database(db) if db.code().as_deref() == Some(UNIQUE_VIOLATION)
    );
    if is_unique {
        AirportError::field(field, message)
    } else {
        AirportError::SqlxError(error)
    }
}

fn ensure_updated(rows_affected: u64, resource: &'static str, id: i64) -> StoreResult<()> {
    if rows_affected == 0 {
        return Err(AirportError::NotFound { resource, id });
    }
    Ok(())
}

/// PostgreSQL backed store.
#[derive(Debug, Clone)]
pub struct PgRegistry {
    pool: PgPool,
}

impl PgRegistry {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn attach_crews(&self, flights: &mut [Flight]) -> StoreResult<()> {
        let ids: Vec<i64> = flights.iter().map(|f| f.id).collect();
        let links: Vec<(i64, i64)> = sqlx::query_as(
            "SELECT flight_id, crew_id FROM flight_crews WHERE flight_id = ANY($1) ORDER BY crew_id",
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let mut by_flight: HashMap<i64, Vec<i64>> = HashMap::new();
        for (flight_id, crew_id) in links {
            by_flight.entry(flight_id).or_default().push(crew_id);
        }
        for flight in flights.iter_mut() {
            flight.crew_ids = by_flight.remove(&flight.id).unwrap_or_default();
        }
        Ok(())
    }

    async fn attach_tickets(&self, orders: &mut [Order]) -> StoreResult<()> {
        let ids: Vec<i64> = orders.iter().map(|o| o.id).collect();
        let tickets: Vec<Ticket> = sqlx::query_as(&format!(
            "SELECT {TICKET_COLUMNS} FROM tickets WHERE order_id = ANY($1) ORDER BY id"
        ))
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let mut by_order: HashMap<i64, Vec<Ticket>> = HashMap::new();
        for ticket in tickets {
            by_order.entry(ticket.order_id).or_default().push(ticket);
        }
        for order in orders.iter_mut() {
            order.tickets = by_order.remove(&order.id).unwrap_or_default();
        }
        Ok(())
    }

    async fn insert_tickets(
        tx: &mut Transaction<'_, Postgres>,
        order_id: i64,
        tickets: &[NewTicket],
    ) -> StoreResult<Vec<Ticket>> {
        let mut inserted = Vec::with_capacity(tickets.len());
        for ticket in tickets {
            let row: Ticket = sqlx::query_as(&format!(
                r#"INSERT INTO tickets ("row", seat, flight_id, order_id) VALUES ($1, $2, $3, $4)
                   RETURNING {TICKET_COLUMNS}"#
            ))
            .bind(ticket.row)
            .bind(ticket.seat)
            .bind(ticket.flight_id)
            .bind(order_id)
            .fetch_one(&mut **tx)
            .await
            .map_err(|e| unique_violation(e, NON_FIELD_ERRORS, UNIQUE_SEAT_MESSAGE))?;
            inserted.push(row);
        }
        Ok(inserted)
    }

    async fn replace_flight_crews(
        tx: &mut Transaction<'_, Postgres>,
        flight_id: i64,
        crew_ids: &[i64],
    ) -> StoreResult<()> {
        sqlx::query("DELETE FROM flight_crews WHERE flight_id = $1")
            .bind(flight_id)
            .execute(&mut **tx)
            .await?;
        for crew_id in crew_ids {
            sqlx::query(
                "INSERT INTO flight_crews (flight_id, crew_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
            )
            .bind(flight_id)
            .bind(crew_id)
            .execute(&mut **tx)
            .await?;
        }
        Ok(())
    }
}

#[async_trait]
impl AirportStore for PgRegistry {
    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    #[instrument(skip(self, user), fields(email = %user.email))]
    async fn insert_user(&self, user: NewUser) -> StoreResult<User> {
        let created: User = sqlx::query_as(
            r#"
            INSERT INTO users (email, password_hash, is_staff)
            VALUES ($1, $2, $3)
            RETURNING id, email, password_hash, is_staff, date_joined
            "#,
        )
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.is_staff)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| unique_violation(e, "email", UNIQUE_EMAIL_MESSAGE))?;

        info!("Created user {}", created.id);
        Ok(created)
    }

    async fn user_by_id(&self, id: i64) -> StoreResult<Option<User>> {
        let user = sqlx::query_as(
            "SELECT id, email, password_hash, is_staff, date_joined FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let user = sqlx::query_as(
            "SELECT id, email, password_hash, is_staff, date_joined FROM users WHERE LOWER(email) = LOWER($1)",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn update_user(&self, user: &User) -> StoreResult<()> {
        let result = sqlx::query(
            "UPDATE users SET email = $1, password_hash = $2, is_staff = $3 WHERE id = $4",
        )
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.is_staff)
        .bind(user.id)
        .execute(&self.pool)
        .await
        .map_err(|e| unique_violation(e, "email", UNIQUE_EMAIL_MESSAGE))?;
        ensure_updated(result.rows_affected(), "user", user.id)
    }

    async fn list_airplane_types(&self, page: PageRequest) -> StoreResult<Paginated<AirplaneType>> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM airplane_types")
            .fetch_one(&self.pool)
            .await?;
        let items = sqlx::query_as("SELECT id, name FROM airplane_types ORDER BY id LIMIT $1 OFFSET $2")
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await?;
        Ok(Paginated { items, count, page })
    }

    async fn airplane_types_by_ids(&self, ids: &[i64]) -> StoreResult<Vec<AirplaneType>> {
        let items = sqlx::query_as("SELECT id, name FROM airplane_types WHERE id = ANY($1) ORDER BY id")
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;
        Ok(items)
    }

    #[instrument(skip(self))]
    async fn insert_airplane_type(&self, name: &str) -> StoreResult<AirplaneType> {
        let created = sqlx::query_as("INSERT INTO airplane_types (name) VALUES ($1) RETURNING id, name")
            .bind(name)
            .fetch_one(&self.pool)
            .await?;
        Ok(created)
    }

    async fn update_airplane_type(&self, airplane_type: &AirplaneType) -> StoreResult<()> {
        let result = sqlx::query("UPDATE airplane_types SET name = $1 WHERE id = $2")
            .bind(&airplane_type.name)
            .bind(airplane_type.id)
            .execute(&self.pool)
            .await?;
        ensure_updated(result.rows_affected(), "airplane type", airplane_type.id)
    }

    async fn list_airplanes(
        &self,
        filter: &AirplaneFilter,
        page: PageRequest,
    ) -> StoreResult<Paginated<Airplane>> {
        let type_ids = filter.airplane_type_ids.as_deref();
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM airplanes WHERE ($1::BIGINT[] IS NULL OR airplane_type_id = ANY($1))",
        )
        .bind(type_ids)
        .fetch_one(&self.pool)
        .await?;
        let items = sqlx::query_as(
            r#"
            SELECT id, name, rows, seats_in_row, airplane_type_id, image
            FROM airplanes
            WHERE ($1::BIGINT[] IS NULL OR airplane_type_id = ANY($1))
            ORDER BY id
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(type_ids)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;
        Ok(Paginated { items, count, page })
    }

    async fn airplanes_by_ids(&self, ids: &[i64]) -> StoreResult<Vec<Airplane>> {
        let items = sqlx::query_as(
            "SELECT id, name, rows, seats_in_row, airplane_type_id, image FROM airplanes WHERE id = ANY($1) ORDER BY id",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(items)
    }

    #[instrument(skip(self))]
    async fn insert_airplane(&self, airplane: NewAirplane) -> StoreResult<Airplane> {
        let created = sqlx::query_as(
            r#"
            INSERT INTO airplanes (name, rows, seats_in_row, airplane_type_id)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, rows, seats_in_row, airplane_type_id, image
            "#,
        )
        .bind(&airplane.name)
        .bind(airplane.rows)
        .bind(airplane.seats_in_row)
        .bind(airplane.airplane_type_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(created)
    }

    async fn update_airplane(&self, airplane: &Airplane) -> StoreResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE airplanes
            SET name = $1, rows = $2, seats_in_row = $3, airplane_type_id = $4, image = $5
            WHERE id = $6
            "#,
        )
        .bind(&airplane.name)
        .bind(airplane.rows)
        .bind(airplane.seats_in_row)
        .bind(airplane.airplane_type_id)
        .bind(&airplane.image)
        .bind(airplane.id)
        .execute(&self.pool)
        .await?;
        ensure_updated(result.rows_affected(), "airplane", airplane.id)
    }

    async fn list_airports(&self, page: PageRequest) -> StoreResult<Paginated<Airport>> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM airports")
            .fetch_one(&self.pool)
            .await?;
        let items = sqlx::query_as(
            "SELECT id, name, closest_big_city FROM airports ORDER BY id LIMIT $1 OFFSET $2",
        )
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;
        Ok(Paginated { items, count, page })
    }

    async fn airports_by_ids(&self, ids: &[i64]) -> StoreResult<Vec<Airport>> {
        let items = sqlx::query_as(
            "SELECT id, name, closest_big_city FROM airports WHERE id = ANY($1) ORDER BY id",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(items)
    }

    #[instrument(skip(self))]
    async fn insert_airport(&self, name: &str, closest_big_city: &str) -> StoreResult<Airport> {
        let created = sqlx::query_as(
            "INSERT INTO airports (name, closest_big_city) VALUES ($1, $2) RETURNING id, name, closest_big_city",
        )
        .bind(name)
        .bind(closest_big_city)
        .fetch_one(&self.pool)
        .await?;
        Ok(created)
    }

    async fn update_airport(&self, airport: &Airport) -> StoreResult<()> {
        let result = sqlx::query("UPDATE airports SET name = $1, closest_big_city = $2 WHERE id = $3")
            .bind(&airport.name)
            .bind(&airport.closest_big_city)
            .bind(airport.id)
            .execute(&self.pool)
            .await?;
        ensure_updated(result.rows_affected(), "airport", airport.id)
    }

    async fn list_routes(&self, filter: &CityFilter, page: PageRequest) -> StoreResult<Paginated<Route>> {
        const FROM: &str = r#"
            FROM routes r
            JOIN airports s ON s.id = r.source_id
            JOIN airports d ON d.id = r.destination_id
            WHERE ($1::TEXT IS NULL OR POSITION(LOWER($1) IN LOWER(s.closest_big_city)) > 0)
              AND ($2::TEXT IS NULL OR POSITION(LOWER($2) IN LOWER(d.closest_big_city)) > 0)
        "#;
        let count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) {FROM}"))
            .bind(&filter.source)
            .bind(&filter.destination)
            .fetch_one(&self.pool)
            .await?;
        let items = sqlx::query_as(&format!(
            "SELECT r.id, r.source_id, r.destination_id, r.distance {FROM} ORDER BY r.id LIMIT $3 OFFSET $4"
        ))
        .bind(&filter.source)
        .bind(&filter.destination)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;
        Ok(Paginated { items, count, page })
    }

    async fn routes_by_ids(&self, ids: &[i64]) -> StoreResult<Vec<Route>> {
        let items = sqlx::query_as(
            "SELECT id, source_id, destination_id, distance FROM routes WHERE id = ANY($1) ORDER BY id",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(items)
    }

    #[instrument(skip(self))]
    async fn insert_route(&self, route: NewRoute) -> StoreResult<Route> {
        let created = sqlx::query_as(
            r#"
            INSERT INTO routes (source_id, destination_id, distance)
            VALUES ($1, $2, $3)
            RETURNING id, source_id, destination_id, distance
            "#,
        )
        .bind(route.source_id)
        .bind(route.destination_id)
        .bind(route.distance)
        .fetch_one(&self.pool)
        .await?;
        Ok(created)
    }

    async fn update_route(&self, route: &Route) -> StoreResult<()> {
        let result = sqlx::query(
            "UPDATE routes SET source_id = $1, destination_id = $2, distance = $3 WHERE id = $4",
        )
        .bind(route.source_id)
        .bind(route.destination_id)
        .bind(route.distance)
        .bind(route.id)
        .execute(&self.pool)
        .await?;
        ensure_updated(result.rows_affected(), "route", route.id)
    }

    async fn list_crews(&self, page: PageRequest) -> StoreResult<Paginated<Crew>> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM crews")
            .fetch_one(&self.pool)
            .await?;
        let items = sqlx::query_as(
            "SELECT id, first_name, last_name FROM crews ORDER BY id LIMIT $1 OFFSET $2",
        )
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;
        Ok(Paginated { items, count, page })
    }

    async fn crews_by_ids(&self, ids: &[i64]) -> StoreResult<Vec<Crew>> {
        let items = sqlx::query_as(
            "SELECT id, first_name, last_name FROM crews WHERE id = ANY($1) ORDER BY id",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(items)
    }

    #[instrument(skip(self))]
    async fn insert_crew(&self, first_name: &str, last_name: &str) -> StoreResult<Crew> {
        let created = sqlx::query_as(
            "INSERT INTO crews (first_name, last_name) VALUES ($1, $2) RETURNING id, first_name, last_name",
        )
        .bind(first_name)
        .bind(last_name)
        .fetch_one(&self.pool)
        .await?;
        Ok(created)
    }

    async fn update_crew(&self, crew: &Crew) -> StoreResult<()> {
        let result = sqlx::query("UPDATE crews SET first_name = $1, last_name = $2 WHERE id = $3")
            .bind(&crew.first_name)
            .bind(&crew.last_name)
            .bind(crew.id)
            .execute(&self.pool)
            .await?;
        ensure_updated(result.rows_affected(), "crew", crew.id)
    }

    async fn list_flights(&self, filter: &CityFilter, page: PageRequest) -> StoreResult<Paginated<Flight>> {
        const FROM: &str = r#"
            FROM flights f
            JOIN routes r ON r.id = f.route_id
            JOIN airports s ON s.id = r.source_id
            JOIN airports d ON d.id = r.destination_id
            WHERE ($1::TEXT IS NULL OR POSITION(LOWER($1) IN LOWER(s.closest_big_city)) > 0)
              AND ($2::TEXT IS NULL OR POSITION(LOWER($2) IN LOWER(d.closest_big_city)) > 0)
        "#;
        let count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) {FROM}"))
            .bind(&filter.source)
            .bind(&filter.destination)
            .fetch_one(&self.pool)
            .await?;
        let mut items: Vec<Flight> = sqlx::query_as(&format!(
            "SELECT {FLIGHT_COLUMNS} {FROM} ORDER BY f.id LIMIT $3 OFFSET $4"
        ))
        .bind(&filter.source)
        .bind(&filter.destination)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;
        self.attach_crews(&mut items).await?;
        Ok(Paginated { items, count, page })
    }

    async fn flights_by_ids(&self, ids: &[i64]) -> StoreResult<Vec<Flight>> {
        let mut items: Vec<Flight> = sqlx::query_as(&format!(
            "SELECT {FLIGHT_COLUMNS} FROM flights f WHERE f.id = ANY($1) ORDER BY f.id"
        ))
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;
        self.attach_crews(&mut items).await?;
        Ok(items)
    }

    #[instrument(skip(self, flight), fields(route_id = flight.route_id))]
    async fn insert_flight(&self, flight: NewFlight) -> StoreResult<Flight> {
        let mut tx = self.pool.begin().await?;
        let mut created: Flight = sqlx::query_as(
            r#"
            INSERT INTO flights (route_id, airplane_id, departure_time, arrival_time)
            VALUES ($1, $2, $3, $4)
            RETURNING id, route_id, airplane_id, departure_time, arrival_time
            "#,
        )
        .bind(flight.route_id)
        .bind(flight.airplane_id)
        .bind(flight.departure_time)
        .bind(flight.arrival_time)
        .fetch_one(&mut *tx)
        .await?;
        Self::replace_flight_crews(&mut tx, created.id, &flight.crew_ids).await?;
        tx.commit().await?;

        created.crew_ids = flight.crew_ids;
        info!("Created flight {}", created.id);
        Ok(created)
    }

    async fn update_flight(&self, flight: &Flight) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;
        let result = sqlx::query(
            r#"
            UPDATE flights
            SET route_id = $1, airplane_id = $2, departure_time = $3, arrival_time = $4
            WHERE id = $5
            "#,
        )
        .bind(flight.route_id)
        .bind(flight.airplane_id)
        .bind(flight.departure_time)
        .bind(flight.arrival_time)
        .bind(flight.id)
        .execute(&mut *tx)
        .await?;
        ensure_updated(result.rows_affected(), "flight", flight.id)?;
        Self::replace_flight_crews(&mut tx, flight.id, &flight.crew_ids).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn list_orders(&self, user_id: i64, page: PageRequest) -> StoreResult<Paginated<Order>> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;
        let mut items: Vec<Order> = sqlx::query_as(
            r#"
            SELECT id, created_time, user_id FROM orders
            WHERE user_id = $1
            ORDER BY created_time DESC, id DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(user_id)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;
        self.attach_tickets(&mut items).await?;
        Ok(Paginated { items, count, page })
    }

    async fn order_for_user(&self, order_id: i64, user_id: i64) -> StoreResult<Option<Order>> {
        let order: Option<Order> = sqlx::query_as(
            "SELECT id, created_time, user_id FROM orders WHERE id = $1 AND user_id = $2",
        )
        .bind(order_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        match order {
            Some(order) => {
                let mut orders = [order];
                self.attach_tickets(&mut orders).await?;
                let [order] = orders;
                Ok(Some(order))
            }
            None => Ok(None),
        }
    }

    #[instrument(skip(self, tickets), fields(tickets = tickets.len()))]
    async fn create_order(&self, user_id: i64, tickets: &[NewTicket]) -> StoreResult<Order> {
        let mut tx = self.pool.begin().await?;
        let mut order: Order = sqlx::query_as(
            "INSERT INTO orders (user_id) VALUES ($1) RETURNING id, created_time, user_id",
        )
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await?;
        order.tickets = Self::insert_tickets(&mut tx, order.id, tickets).await?;
        tx.commit().await?;

        info!("Created order {} with {} ticket(s)", order.id, order.tickets.len());
        Ok(order)
    }

    #[instrument(skip(self, tickets), fields(tickets = tickets.len()))]
    async fn replace_tickets(&self, order_id: i64, tickets: &[NewTicket]) -> StoreResult<Order> {
        let mut tx = self.pool.begin().await?;
        let order: Option<Order> = sqlx::query_as(
            "SELECT id, created_time, user_id FROM orders WHERE id = $1 FOR UPDATE",
        )
        .bind(order_id)
        .fetch_optional(&mut *tx)
        .await?;
        let mut order = order.ok_or(AirportError::NotFound {
            resource: "order",
            id: order_id,
        })?;

        sqlx::query("DELETE FROM tickets WHERE order_id = $1")
            .bind(order_id)
            .execute(&mut *tx)
            .await?;
        order.tickets = Self::insert_tickets(&mut tx, order_id, tickets).await?;
        tx.commit().await?;
        Ok(order)
    }

    async fn taken_seats(
        &self,
        flight_ids: &[i64],
        excluding_order: Option<i64>,
    ) -> StoreResult<Vec<TakenSeat>> {
        let tickets: Vec<Ticket> = sqlx::query_as(&format!(
            r#"
            SELECT {TICKET_COLUMNS} FROM tickets
            WHERE flight_id = ANY($1) AND ($2::BIGINT IS NULL OR order_id <> $2)
            "#
        ))
        .bind(flight_ids)
        .bind(excluding_order)
        .fetch_all(&self.pool)
        .await?;
        Ok(tickets.iter().map(TakenSeat::from).collect())
    }
}
