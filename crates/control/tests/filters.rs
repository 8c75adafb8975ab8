use airport_control::filters::{
    city_filter, ensure_page_exists, parse_id_list, parse_page, parse_route_filter,
};
use airport_control::validation::{out_of_range, Validator};
use airport_control::{slugify, validate_image, INVALID_IMAGE};
use airport_testsupport::{sample_image, sample_png};
use image::ImageFormat;
use airport_models::{AirportError, PageRequest, Paginated};

#[test]
fn page_defaults_to_first() {
    assert_eq!(parse_page(None, 10).unwrap(), PageRequest::new(1, 10));
    assert_eq!(parse_page(Some(""), 10).unwrap(), PageRequest::new(1, 10));
    assert_eq!(parse_page(Some("3"), 5).unwrap(), PageRequest::new(3, 5));
}

#[test]
fn bad_page_numbers_are_invalid_pages() {
    for raw in [
        "0",
        "-1",
        "two",
        "1.5",
        "9223372036854775807",
        "922337203685477581",
        "99999999999999999999",
    ] {
        assert!(
            matches!(parse_page(Some(raw), 10), Err(AirportError::InvalidPage)),
            "page {raw:?} should be rejected"
        );
    }
}

#[test]
fn pages_past_the_end_do_not_exist() {
    let empty: Paginated<i32> = Paginated {
        items: vec![],
        count: 0,
        page: PageRequest::new(1, 10),
    };
    assert!(ensure_page_exists(&empty).is_ok());

    let past_end: Paginated<i32> = Paginated {
        items: vec![],
        count: 10,
        page: PageRequest::new(2, 10),
    };
    assert!(matches!(
        ensure_page_exists(&past_end),
        Err(AirportError::InvalidPage)
    ));
}

#[test]
fn id_lists_parse_or_fail_on_the_field() {
    assert_eq!(parse_id_list("airplane_types", None).unwrap(), None);
    assert_eq!(
        parse_id_list("airplane_types", Some("1, 2,3")).unwrap(),
        Some(vec![1, 2, 3])
    );

    match parse_id_list("airplane_types", Some("1,x")) {
        Err(AirportError::Validation(errors)) => assert!(errors.contains_key("airplane_types")),
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[test]
fn route_filter_needs_two_parts() {
    let filter = parse_route_filter(Some("Kyiv-Lviv")).unwrap();
    assert_eq!(filter.source.as_deref(), Some("Kyiv"));
    assert_eq!(filter.destination.as_deref(), Some("Lviv"));
    assert!(filter.matches("kyiv", "LVIV"));
    assert!(!filter.matches("Odesa", "Lviv"));

    assert!(parse_route_filter(None).unwrap().source.is_none());
    for raw in ["Kyiv", "Kyiv-Lviv-Odesa", "-Lviv"] {
        assert!(parse_route_filter(Some(raw)).is_err(), "{raw:?} should be rejected");
    }
}

#[test]
fn city_filter_ignores_blank_values() {
    let filter = city_filter(Some("  "), Some("Dest"));
    assert!(filter.source.is_none());
    assert!(filter.matches("Anywhere", "Destination 1"));
    assert!(!filter.matches("Anywhere", "Source 1"));
}

#[test]
fn text_length_is_measured_after_trimming() {
    let padded = format!("  {}  ", "x".repeat(255));
    let mut validator = Validator::new();
    validator.text("name", &padded, 255);
    assert!(validator.is_valid());

    let mut validator = Validator::new();
    validator.text("name", &format!(" {} ", "x".repeat(256)), 255);
    assert!(!validator.is_valid());
}

#[test]
fn validator_collects_every_error() {
    let mut validator = Validator::new();
    validator
        .text("name", "   ", 255)
        .text("city", &"x".repeat(256), 255)
        .min_value("rows", 0, 1)
        .reference("airplane_type", 42, false);
    let errors = validator.into_errors();

    assert_eq!(errors["name"], vec!["This field may not be blank."]);
    assert_eq!(
        errors["city"],
        vec!["Ensure this field has no more than 255 characters."]
    );
    assert_eq!(
        errors["rows"],
        vec!["Ensure this value is greater than or equal to 1."]
    );
    assert_eq!(
        errors["airplane_type"],
        vec!["Invalid pk \"42\" - object does not exist."]
    );
}

#[test]
fn nested_errors_are_keyed_by_index() {
    let mut inner = Validator::new();
    inner.add("row", out_of_range("row", "rows", 5));

    let mut outer = Validator::new();
    outer.nested("tickets", 1, inner.into_errors());
    let errors = outer.into_errors();

    assert_eq!(
        errors["tickets.1.row"],
        vec!["row number must be in available range:(1, rows): (1, 5)"]
    );
}

#[test]
fn decodable_images_keep_their_format() {
    assert_eq!(validate_image(&sample_png()).unwrap(), "png");
    assert_eq!(validate_image(&sample_image(ImageFormat::Jpeg)).unwrap(), "jpg");
}

#[test]
fn signatures_without_image_data_are_rejected() {
    let mut truncated = sample_png();
    truncated.truncate(20);

    for bytes in [
        truncated,
        b"\x89PNG\r\n\x1a\ngarbage after the signature".to_vec(),
        b"%PDF-1.7".to_vec(),
        b"plain text".to_vec(),
    ] {
        match validate_image(&bytes) {
            Err(AirportError::Validation(errors)) => {
                assert_eq!(errors["image"], vec![INVALID_IMAGE]);
            }
            other => panic!("expected image error, got {other:?}"),
        }
    }
}

#[test]
fn slugs_are_lowercase_and_dashed() {
    assert_eq!(slugify("Boeing 737 MAX"), "boeing-737-max");
    assert_eq!(slugify("  Airbus  A320!! "), "airbus-a320");
    assert_eq!(slugify("!!!"), "");
}
