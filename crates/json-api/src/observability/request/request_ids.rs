//! Request ID resolution and response header helpers.

use salvo::{
    http::{StatusCode, header::HeaderValue},
    prelude::Response,
};
use tracing::{debug, warn};
use uuid::Uuid;

pub(super) const REQUEST_ID_HEADER: &str = "x-request-id";

/// Longest caller-supplied ID carried into logs and echoed back.
const MAX_REQUEST_ID_LEN: usize = 128;

/// Use the caller's ID when it is safe to log and echo, otherwise mint one.
///
/// The payment gateway and upstream proxies supply their own IDs. Anything
/// blank, oversized, or containing characters outside visible ASCII is
/// replaced.
pub(super) fn resolve_request_id(header_value: Option<String>) -> String {
    match header_value {
        Some(value) if is_acceptable(&value) => value,
        Some(value) => {
            debug!(len = value.len(), "replacing unusable caller request id");

            generate_request_id()
        }
        None => generate_request_id(),
    }
}

fn is_acceptable(value: &str) -> bool {
    !value.is_empty()
        && value.len() <= MAX_REQUEST_ID_LEN
        && value.bytes().all(|byte| byte.is_ascii_graphic())
}

pub(super) fn set_request_id_header(res: &mut Response, request_id: &str) {
    let header_value = match HeaderValue::from_str(request_id) {
        Ok(value) => value,
        Err(source) => {
            warn!(
                request_id,
                "could not encode request id for response header: {source}"
            );

            return;
        }
    };

    res.headers_mut().insert(REQUEST_ID_HEADER, header_value);
}

pub(super) fn response_status_or_ok(status_code: Option<StatusCode>) -> StatusCode {
    status_code.unwrap_or(StatusCode::OK)
}

fn generate_request_id() -> String {
    Uuid::now_v7().to_string()
}
