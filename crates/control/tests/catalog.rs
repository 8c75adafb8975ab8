mod common;

use airport_control::{AirplaneFilter, CityFilter};
use airport_models::{
    AirplanePatch, AirplaneRequest, AirplaneTypeRequest, AirportError, CrewRequest, FlightPatch,
    FlightRequest, PageRequest, RouteRequest,
};
use airport_testsupport::{
    arrival, departure, sample_airplane, sample_airplane_type, sample_airport, sample_png,
    sample_route,
};
use common::services;

fn first_page() -> PageRequest {
    PageRequest::first(10)
}

#[tokio::test]
async fn creates_airplane_with_capacity() {
    let s = services();
    let airplane_type = s
        .catalog
        .create_airplane_type(AirplaneTypeRequest {
            name: " Narrow body ".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(airplane_type.name, "Narrow body");

    let view = s
        .catalog
        .create_airplane(AirplaneRequest {
            name: "Boeing 737".to_string(),
            rows: 20,
            seats_in_row: 6,
            airplane_type: airplane_type.id,
        })
        .await
        .unwrap();
    assert_eq!(view.capacity, 120);
    assert_eq!(view.airplane_type, airplane_type.id);
    assert_eq!(view.image, None);

    let detail = s.catalog.get_airplane(view.id).await.unwrap();
    assert_eq!(detail.airplane_type, "Narrow body");
}

#[tokio::test]
async fn airplane_validation_reports_all_fields() {
    let s = services();
    let err = s
        .catalog
        .create_airplane(AirplaneRequest {
            name: "".to_string(),
            rows: 0,
            seats_in_row: 6,
            airplane_type: 999,
        })
        .await
        .unwrap_err();

    match err {
        AirportError::Validation(errors) => {
            assert!(errors.contains_key("name"));
            assert!(errors.contains_key("rows"));
            assert_eq!(
                errors["airplane_type"],
                vec!["Invalid pk \"999\" - object does not exist."]
            );
            assert!(!errors.contains_key("seats_in_row"));
        }
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[tokio::test]
async fn airplanes_filter_by_type() {
    let s = services();
    let store = s.store.as_ref();
    let type_1 = sample_airplane_type(store, "Type 1").await;
    let type_2 = sample_airplane_type(store, "Type 2").await;
    let untyped = sample_airplane(store, "Test Airplane", 10, 6, None).await;
    let first = sample_airplane(store, "Airplane 1", 10, 6, Some(&type_1)).await;
    let second = sample_airplane(store, "Airplane 2", 10, 6, Some(&type_2)).await;

    let filter = AirplaneFilter {
        airplane_type_ids: Some(vec![type_1.id, type_2.id]),
    };
    let listing = s.catalog.list_airplanes(&filter, first_page()).await.unwrap();
    let ids: Vec<i64> = listing.items.iter().map(|a| a.id).collect();

    assert_eq!(ids, vec![first.id, second.id]);
    assert!(!ids.contains(&untyped.id));
    assert_eq!(listing.items[0].airplane_type, "Type 1");
    assert_eq!(listing.items[0].capacity, 60);
}

#[tokio::test]
async fn patch_keeps_untouched_fields() {
    let s = services();
    let airplane = sample_airplane(s.store.as_ref(), "Old name", 10, 6, None).await;

    let view = s
        .catalog
        .patch_airplane(
            airplane.id,
            AirplanePatch {
                rows: Some(12),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(view.name, "Old name");
    assert_eq!(view.rows, 12);
    assert_eq!(view.capacity, 72);
}

#[tokio::test]
async fn missing_ids_are_not_found() {
    let s = services();
    assert!(matches!(
        s.catalog.get_airplane(404).await,
        Err(AirportError::NotFound { .. })
    ));
    assert!(matches!(
        s.catalog
            .update_airplane_type(404, AirplaneTypeRequest { name: "x".into() })
            .await,
        Err(AirportError::NotFound { .. })
    ));
}

#[tokio::test]
async fn route_endpoints_must_differ() {
    let s = services();
    let airport = sample_airport(s.store.as_ref(), "Boryspil", "Kyiv").await;

    let err = s
        .catalog
        .create_route(RouteRequest {
            source: airport.id,
            destination: airport.id,
            distance: 500,
        })
        .await
        .unwrap_err();
    match err {
        AirportError::Validation(errors) => assert_eq!(
            errors["non_field_errors"],
            vec!["Source and destination airports must be different."]
        ),
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[tokio::test]
async fn routes_filter_by_city_and_render_both_shapes() {
    let s = services();
    let store = s.store.as_ref();
    let wanted = sample_route(store, "Source 1", "Destination 1").await;
    let _other = sample_route(store, "Source 1", "Destination 2").await;

    let filter = CityFilter {
        source: Some("source 1".to_string()),
        destination: Some("Destination 1".to_string()),
    };
    let listing = s.catalog.list_routes(&filter, first_page()).await.unwrap();
    assert_eq!(listing.count, 1);
    assert_eq!(listing.items[0].id, wanted.id);
    assert_eq!(listing.items[0].source, "Source 1");

    let detail = s.catalog.get_route(wanted.id).await.unwrap();
    assert_eq!(detail.source.closest_big_city, "Source 1");
    assert_eq!(detail.destination.closest_big_city, "Destination 1");
}

#[tokio::test]
async fn flights_need_departure_before_arrival() {
    let s = services();
    let store = s.store.as_ref();
    let route = sample_route(store, "Kyiv", "Lviv").await;
    let airplane = sample_airplane(store, "A320", 30, 6, None).await;

    let err = s
        .catalog
        .create_flight(FlightRequest {
            route: route.id,
            airplane: airplane.id,
            departure_time: arrival(),
            arrival_time: departure(),
            crews: vec![],
        })
        .await
        .unwrap_err();
    match err {
        AirportError::Validation(errors) => assert_eq!(
            errors["non_field_errors"],
            vec!["Departure time must be earlier than arrival time."]
        ),
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[tokio::test]
async fn flight_detail_lists_crew_names() {
    let s = services();
    let store = s.store.as_ref();
    let route = sample_route(store, "Kyiv", "Lviv").await;
    let airplane = sample_airplane(store, "A320", 30, 6, None).await;
    let captain = s
        .catalog
        .create_crew(CrewRequest {
            first_name: "Amelia".into(),
            last_name: "Earhart".into(),
        })
        .await
        .unwrap();

    let flight = s
        .catalog
        .create_flight(FlightRequest {
            route: route.id,
            airplane: airplane.id,
            departure_time: departure(),
            arrival_time: arrival(),
            crews: vec![captain.id, captain.id],
        })
        .await
        .unwrap();
    assert_eq!(flight.crews, vec![captain.id]);

    let detail = s.catalog.get_flight(flight.id).await.unwrap();
    assert_eq!(detail.crews, vec!["Amelia Earhart".to_string()]);
    assert_eq!(detail.route.source, "Kyiv");
    assert_eq!(detail.airplane.capacity, 180);

    let unknown_crew = s
        .catalog
        .patch_flight(
            flight.id,
            FlightPatch {
                crews: Some(vec![captain.id, 9999]),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(unknown_crew, AirportError::Validation(ref e) if e.contains_key("crews")));
}

#[tokio::test]
async fn flights_filter_by_route_cities() {
    let s = services();
    let store = s.store.as_ref();
    let airplane = sample_airplane(store, "A320", 30, 6, None).await;
    let first = sample_route(store, "Source 1", "Dest 1").await;
    let second = sample_route(store, "Source 2", "Dest 2").await;
    let wanted = airport_testsupport::sample_flight(store, &first, &airplane).await;
    airport_testsupport::sample_flight(store, &second, &airplane).await;

    let filter = airport_control::filters::parse_route_filter(Some("Source 1-Dest 1")).unwrap();
    let listing = s.catalog.list_flights(&filter, first_page()).await.unwrap();
    assert_eq!(listing.items.len(), 1);
    assert_eq!(listing.items[0].id, wanted.id);
    assert_eq!(listing.items[0].route.destination, "Dest 1");
}

#[tokio::test]
async fn image_upload_stores_file_and_replaces_previous() {
    let s = services();
    let airplane = sample_airplane(s.store.as_ref(), "Boeing 737", 10, 6, None).await;

    let png = sample_png();
    let first = s.catalog.upload_airplane_image(airplane.id, &png).await.unwrap();
    let url = first.image.clone().unwrap();
    assert!(url.starts_with("/media/uploads/airplanes/boeing-737-"));
    assert!(url.ends_with(".png"));

    let relative = url.trim_start_matches("/media/");
    let stored = s.media_root.path().join(relative);
    assert!(stored.exists());

    let second = s.catalog.upload_airplane_image(airplane.id, &png).await.unwrap();
    assert_ne!(second.image, first.image);
    assert!(!stored.exists(), "previous image should be removed");
}

#[tokio::test]
async fn image_upload_rejects_non_images() {
    let s = services();
    let airplane = sample_airplane(s.store.as_ref(), "Boeing 737", 10, 6, None).await;

    let err = s
        .catalog
        .upload_airplane_image(airplane.id, b"plain text")
        .await
        .unwrap_err();
    assert!(matches!(err, AirportError::Validation(ref e) if e.contains_key("image")));
}

#[tokio::test]
async fn image_upload_rejects_corrupted_images() {
    let s = services();
    let airplane = sample_airplane(s.store.as_ref(), "Boeing 737", 10, 6, None).await;

    let mut corrupted = b"\x89PNG\r\n\x1a\n".to_vec();
    corrupted.extend_from_slice(b"this is not image data");
    let err = s
        .catalog
        .upload_airplane_image(airplane.id, &corrupted)
        .await
        .unwrap_err();
    assert!(matches!(err, AirportError::Validation(ref e) if e.contains_key("image")));

    let stored = s.media_root.path().join("uploads/airplanes");
    let files = std::fs::read_dir(&stored).map(|d| d.count()).unwrap_or(0);
    assert_eq!(files, 0);
}
