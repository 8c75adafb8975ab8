//! Every entity `PgRegistry` reads with `query_as` must map from a PostgreSQL row.
//! These checks run without a database.

use airport_models::{Airplane, AirplaneType, Airport, Crew, Flight, Order, Route, Ticket, User};
use sqlx::postgres::PgRow;
use sqlx::FromRow;

fn maps_from_pg_row<T>()
where
    T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
{
}

#[test]
fn catalog_entities_map_from_rows() {
    maps_from_pg_row::<AirplaneType>();
    maps_from_pg_row::<Airplane>();
    maps_from_pg_row::<Airport>();
    maps_from_pg_row::<Route>();
    maps_from_pg_row::<Crew>();
    maps_from_pg_row::<Flight>();
}

#[test]
fn booking_and_account_entities_map_from_rows() {
    maps_from_pg_row::<Order>();
    maps_from_pg_row::<Ticket>();
    maps_from_pg_row::<User>();
}
