mod common;

use airport_models::Flight;
use airport_testsupport::{sample_airplane, sample_flight, sample_order, sample_route};
use axum::http::{Method, StatusCode};
use common::TestApp;
use serde_json::json;

async fn flight(app: &TestApp) -> Flight {
    let route = sample_route(app.store.as_ref(), "Kyiv", "Lviv").await;
    let airplane = sample_airplane(app.store.as_ref(), "B737", 10, 6, None).await;
    sample_flight(app.store.as_ref(), &route, &airplane).await
}

#[tokio::test]
async fn places_order_and_lists_it() {
    let app = TestApp::new();
    let (_, token) = app.login("test@test.com", false).await;
    let flight = flight(&app).await;

    let (status, order) = app
        .post(
            "/api/v1/airport/orders/",
            Some(&token),
            json!({"tickets": [
                {"row": 1, "seat": 1, "flight": flight.id},
                {"row": 1, "seat": 2, "flight": flight.id},
            ]}),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(order["tickets"].as_array().unwrap().len(), 2);
    assert_eq!(order["tickets"][0]["flight"], flight.id);

    let (status, body) = app.get("/api/v1/airport/orders/", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);
    let ticket = &body["results"][0]["tickets"][0];
    assert_eq!(ticket["flight"]["route"], "Kyiv-Lviv");
    assert_eq!(ticket["flight"]["departure_time"], "2024-03-01T10:00:00Z");

    let metrics = app.state.metrics.get_prometheus_metrics().unwrap();
    assert!(metrics.contains("airport_orders_created_total 1"));
    assert!(metrics.contains("airport_tickets_sold_total 2"));
}

#[tokio::test]
async fn users_only_see_their_own_orders() {
    let app = TestApp::new();
    let (owner, _) = app.login("owner@test.com", false).await;
    let (_, token) = app.login("test@test.com", false).await;
    let flight = flight(&app).await;
    let order = sample_order(app.store.as_ref(), &owner, &[(flight.id, 1, 1)]).await;

    let (_, body) = app.get("/api/v1/airport/orders/", Some(&token)).await;
    assert_eq!(body["count"], 0);

    let (status, _) = app
        .get(&format!("/api/v1/airport/orders/{}/", order.id), Some(&token))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn seat_outside_airplane_is_rejected() {
    let app = TestApp::new();
    let (_, token) = app.login("test@test.com", false).await;
    let flight = flight(&app).await;

    let (status, body) = app
        .post(
            "/api/v1/airport/orders/",
            Some(&token),
            json!({"tickets": [{"row": 11, "seat": 1, "flight": flight.id}]}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["tickets.0.row"],
        json!(["row number must be in available range:(1, rows): (1, 10)"])
    );
    assert_eq!(app.store.order_count().await, 0);
}

#[tokio::test]
async fn taken_seat_is_rejected() {
    let app = TestApp::new();
    let (owner, _) = app.login("owner@test.com", false).await;
    let (_, token) = app.login("test@test.com", false).await;
    let flight = flight(&app).await;
    sample_order(app.store.as_ref(), &owner, &[(flight.id, 3, 4)]).await;

    let (status, body) = app
        .post(
            "/api/v1/airport/orders/",
            Some(&token),
            json!({"tickets": [{"row": 3, "seat": 4, "flight": flight.id}]}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["tickets.0.non_field_errors"],
        json!(["The fields row, seat, flight must make a unique set."])
    );
    assert_eq!(app.store.ticket_count().await, 1);
}

#[tokio::test]
async fn empty_order_is_rejected() {
    let app = TestApp::new();
    let (_, token) = app.login("test@test.com", false).await;

    let (status, body) = app
        .post("/api/v1/airport/orders/", Some(&token), json!({"tickets": []}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["tickets"], json!(["This list may not be empty."]));
}

#[tokio::test]
async fn order_tickets_can_be_replaced() {
    let app = TestApp::new();
    let (user, token) = app.login("test@test.com", false).await;
    let flight = flight(&app).await;
    let order = sample_order(app.store.as_ref(), &user, &[(flight.id, 1, 1)]).await;
    let uri = format!("/api/v1/airport/orders/{}/", order.id);

    // Keeping your own seat is not a conflict.
    let (status, body) = app
        .json(
            Method::PUT,
            &uri,
            Some(&token),
            json!({"tickets": [
                {"row": 1, "seat": 1, "flight": flight.id},
                {"row": 2, "seat": 2, "flight": flight.id},
            ]}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["tickets"].as_array().unwrap().len(), 2);

    let (status, body) = app
        .json(Method::PATCH, &uri, Some(&token), json!({}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["tickets"].as_array().unwrap().len(), 2);
    assert_eq!(app.store.ticket_count().await, 2);
}
