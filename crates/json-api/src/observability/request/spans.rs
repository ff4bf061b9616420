//! Route labels for request spans and metrics.

use uuid::Uuid;

/// Stand-in for path segments that identify a single record.
const RECORD_PLACEHOLDER: &str = "{uuid}";

/// Labels derived from a request path, shared by the span and the request metrics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct RouteLabels {
    /// Path with record identifiers collapsed, e.g. `/orders/{uuid}/payment`.
    pub(super) route: String,

    /// `METHOD route`, used as the OpenTelemetry span name.
    pub(super) span_name: String,

    /// First path segment, e.g. `orders` or `olive-branches`. Empty for `/`.
    pub(super) resource: String,
}

pub(super) fn route_labels(method: &str, path: &str) -> RouteLabels {
    let route = collapse_record_ids(path);
    let span_name = format!("{method} {route}");

    let resource = path
        .trim_start_matches('/')
        .split('/')
        .next()
        .unwrap_or_default()
        .to_owned();

    RouteLabels {
        route,
        span_name,
        resource,
    }
}

fn collapse_record_ids(path: &str) -> String {
    let segments: Vec<&str> = path
        .split('/')
        .filter(|segment| !segment.is_empty())
        .map(|segment| {
            if Uuid::parse_str(segment).is_ok() {
                RECORD_PLACEHOLDER
            } else {
                segment
            }
        })
        .collect();

    format!("/{}", segments.join("/"))
}
