use airport_control::AirportStore;
use airport_models::{
    Airplane, AirplaneType, Airport, Flight, NewAirplane, NewFlight, NewRoute, NewTicket, NewUser,
    Order, Route, User,
};
use chrono::{DateTime, TimeZone, Utc};
use image::{ImageFormat, Rgb, RgbImage};
use std::io::Cursor;

/// 2024-03-01T10:00:00Z
pub fn departure() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0)
        .single()
        .expect("valid timestamp")
}

/// 2024-03-01T12:00:00Z
pub fn arrival() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0)
        .single()
        .expect("valid timestamp")
}

/// A small, fully decodable image in `format`.
pub fn sample_image(format: ImageFormat) -> Vec<u8> {
    let image = RgbImage::from_pixel(4, 3, Rgb([30, 120, 200]));
    let mut bytes = Cursor::new(Vec::new());
    image.write_to(&mut bytes, format).expect("encode sample image");
    bytes.into_inner()
}

pub fn sample_png() -> Vec<u8> {
    sample_image(ImageFormat::Png)
}

/// Inserts a user directly, bypassing hashing. The stored hash never verifies.
pub async fn sample_user(store: &dyn AirportStore, email: &str, is_staff: bool) -> User {
    store
        .insert_user(NewUser {
            email: email.to_string(),
            password_hash: "unusable".to_string(),
            is_staff,
        })
        .await
        .expect("insert user")
}

pub async fn sample_airport(store: &dyn AirportStore, name: &str, city: &str) -> Airport {
    store
        .insert_airport(name, city)
        .await
        .expect("insert airport")
}

pub async fn sample_airplane_type(store: &dyn AirportStore, name: &str) -> AirplaneType {
    store
        .insert_airplane_type(name)
        .await
        .expect("insert airplane type")
}

pub async fn sample_airplane(
    store: &dyn AirportStore,
    name: &str,
    rows: i32,
    seats_in_row: i32,
    airplane_type: Option<&AirplaneType>,
) -> Airplane {
    let airplane_type_id = match airplane_type {
        Some(airplane_type) => airplane_type.id,
        None => sample_airplane_type(store, "Test Type").await.id,
    };
    store
        .insert_airplane(NewAirplane {
            name: name.to_string(),
            rows,
            seats_in_row,
            airplane_type_id,
        })
        .await
        .expect("insert airplane")
}

/// Route between two fresh airports in the given cities.
pub async fn sample_route(store: &dyn AirportStore, source_city: &str, destination_city: &str) -> Route {
    let source = sample_airport(store, "Test Airport", source_city).await;
    let destination = sample_airport(store, "Test Airport", destination_city).await;
    store
        .insert_route(NewRoute {
            source_id: source.id,
            destination_id: destination.id,
            distance: 1000,
        })
        .await
        .expect("insert route")
}

pub async fn sample_flight(store: &dyn AirportStore, route: &Route, airplane: &Airplane) -> Flight {
    store
        .insert_flight(NewFlight {
            route_id: route.id,
            airplane_id: airplane.id,
            departure_time: departure(),
            arrival_time: arrival(),
            crew_ids: Vec::new(),
        })
        .await
        .expect("insert flight")
}

pub async fn sample_order(store: &dyn AirportStore, user: &User, seats: &[(i64, i32, i32)]) -> Order {
    let tickets: Vec<NewTicket> = seats
        .iter()
        .map(|&(flight_id, row, seat)| NewTicket {
            row,
            seat,
            flight_id,
        })
        .collect();
    store
        .create_order(user.id, &tickets)
        .await
        .expect("insert order")
}
