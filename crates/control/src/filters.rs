use crate::store::CityFilter;
use airport_models::{AirportError, PageRequest, Paginated};

/// Parse the `page` query parameter. Absent or empty means the first page.
pub fn parse_page(raw: Option<&str>, page_size: i64) -> Result<PageRequest, AirportError> {
    let raw = match raw.map(str::trim) {
        None | Some("") => return Ok(PageRequest::first(page_size)),
        Some(raw) => raw,
    };
    let page = match raw.parse::<i64>() {
        Ok(number) if number >= 1 => PageRequest::new(number, page_size),
        _ => return Err(AirportError::InvalidPage),
    };
    // No listing is long enough to reach a window that overflows the offset.
    page.checked_offset()
        .map(|_| page)
        .ok_or(AirportError::InvalidPage)
}

/// The first page always exists, even when empty; any later page must
/// start inside the listing.
pub fn ensure_page_exists<T>(page: &Paginated<T>) -> Result<(), AirportError> {
    if page.page.number > 1 && page.page.offset() >= page.count {
        return Err(AirportError::InvalidPage);
    }
    Ok(())
}

/// Parse a comma separated id list such as `1,2,3`. Empty means no filter.
pub fn parse_id_list(field: &str, raw: Option<&str>) -> Result<Option<Vec<i64>>, AirportError> {
    let raw = match raw.map(str::trim) {
        None | Some("") => return Ok(None),
        Some(raw) => raw,
    };
    raw.split(',')
        .map(|part| {
            part.trim().parse::<i64>().map_err(|_| {
                AirportError::field(field, format!("Enter a whole number, got \"{}\".", part.trim()))
            })
        })
        .collect::<Result<Vec<_>, _>>()
        .map(Some)
}

/// Parse `Source-Destination` into a city filter on both route ends.
pub fn parse_route_filter(raw: Option<&str>) -> Result<CityFilter, AirportError> {
    let raw = match raw.map(str::trim) {
        None | Some("") => return Ok(CityFilter::default()),
        Some(raw) => raw,
    };
    let parts: Vec<&str> = raw.split('-').collect();
    match parts.as_slice() {
        [source, destination] if !source.trim().is_empty() && !destination.trim().is_empty() => {
            Ok(CityFilter {
                source: Some(source.trim().to_string()),
                destination: Some(destination.trim().to_string()),
            })
        }
        _ => Err(AirportError::field(
            "route",
            "Route must have the form \"Source-Destination\".",
        )),
    }
}

/// Build a source/destination city filter from the two optional parameters.
pub fn city_filter(source: Option<&str>, destination: Option<&str>) -> CityFilter {
    let keep = |value: Option<&str>| {
        value
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    };
    CityFilter {
        source: keep(source),
        destination: keep(destination),
    }
}
