//! Runs against a live PostgreSQL named by `DATABASE_URL`.
//! `cargo test -p airport-control --features postgres_tests`
#![cfg(feature = "postgres_tests")]

use airport_control::{run_migrations, AirportStore, PgRegistry};
use airport_models::{AirportError, NewAirplane, NewFlight, NewRoute, NewTicket, NewUser};
use chrono::{Duration, Utc};
use sqlx::PgPool;

async fn registry() -> PgRegistry {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let pool = PgPool::connect(&url).await.expect("connect");
    run_migrations(&pool).await.expect("migrate");
    // Idempotent.
    assert!(run_migrations(&pool).await.expect("migrate twice").is_empty());
    PgRegistry::new(pool)
}

#[tokio::test]
async fn order_round_trip_and_seat_uniqueness() {
    let store = registry().await;
    store.ping().await.unwrap();

    let suffix = uuid::Uuid::new_v4().simple().to_string();
    let user = store
        .insert_user(NewUser {
            email: format!("pg-{suffix}@test.com"),
            password_hash: "unusable".into(),
            is_staff: false,
        })
        .await
        .unwrap();

    let airplane_type = store.insert_airplane_type("Test Type").await.unwrap();
    let airplane = store
        .insert_airplane(NewAirplane {
            name: "Test Airplane".into(),
            rows: 10,
            seats_in_row: 6,
            airplane_type_id: airplane_type.id,
        })
        .await
        .unwrap();
    let source = store.insert_airport("A", "Source").await.unwrap();
    let destination = store.insert_airport("B", "Destination").await.unwrap();
    let route = store
        .insert_route(NewRoute {
            source_id: source.id,
            destination_id: destination.id,
            distance: 1000,
        })
        .await
        .unwrap();
    let crew = store.insert_crew("Amelia", "Earhart").await.unwrap();
    let now = Utc::now();
    let flight = store
        .insert_flight(NewFlight {
            route_id: route.id,
            airplane_id: airplane.id,
            departure_time: now,
            arrival_time: now + Duration::hours(2),
            crew_ids: vec![crew.id],
        })
        .await
        .unwrap();
    assert_eq!(
        store.flights_by_ids(&[flight.id]).await.unwrap()[0].crew_ids,
        vec![crew.id]
    );

    let seat = NewTicket {
        row: 1,
        seat: 1,
        flight_id: flight.id,
    };
    let order = store.create_order(user.id, &[seat]).await.unwrap();
    assert_eq!(order.tickets.len(), 1);

    let err = store.create_order(user.id, &[seat]).await.unwrap_err();
    assert!(matches!(err, AirportError::Validation(_)));

    let fetched = store.order_for_user(order.id, user.id).await.unwrap().unwrap();
    assert_eq!(fetched.tickets, order.tickets);

    let replaced = store
        .replace_tickets(
            order.id,
            &[NewTicket {
                row: 2,
                seat: 2,
                flight_id: flight.id,
            }],
        )
        .await
        .unwrap();
    assert_eq!(replaced.tickets[0].row, 2);
    let taken = store.taken_seats(&[flight.id], None).await.unwrap();
    assert_eq!(taken.len(), 1);
}
