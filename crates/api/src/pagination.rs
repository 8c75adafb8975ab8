use airport_models::{Page, Paginated};
use axum::http::Uri;

/// Wrap a listing with `next`/`previous` links relative to the request.
///
/// Links keep every query parameter except `page`, which is replaced;
/// the link to page 1 carries no `page` at all.
pub fn to_page<T>(uri: &Uri, listing: Paginated<T>) -> Page<T> {
    let next = listing
        .has_next()
        .then(|| page_link(uri, listing.page.number + 1));
    let previous = listing
        .has_previous()
        .then(|| page_link(uri, listing.page.number - 1));

    Page {
        count: listing.count,
        next,
        previous,
        results: listing.items,
    }
}

fn page_link(uri: &Uri, number: i64) -> String {
    let mut query = form_urlencoded::Serializer::new(String::new());
    if let Some(raw) = uri.query() {
        for (key, value) in form_urlencoded::parse(raw.as_bytes()) {
            if key != "page" {
                query.append_pair(&key, &value);
            }
        }
    }
    if number > 1 {
        query.append_pair("page", &number.to_string());
    }

    let query = query.finish();
    if query.is_empty() {
        uri.path().to_string()
    } else {
        format!("{}?{}", uri.path(), query)
    }
}
