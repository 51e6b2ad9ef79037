//! HTTP header → RPC metadata forwarding.

use axum::http::HeaderMap;
use tonic::metadata::{AsciiMetadataKey, AsciiMetadataValue};

/// Prefix marking a header as explicit RPC metadata.
pub const METADATA_PREFIX: &str = "grpc-metadata-";

/// Headers forwarded under their own name.
const FORWARDED: [&str; 2] = ["authorization", "x-request-id"];

/// Wrap `message` in an RPC request carrying the forwardable headers.
pub fn rpc_request<T>(headers: &HeaderMap, message: T) -> tonic::Request<T> {
    let mut request = tonic::Request::new(message);
    let metadata = request.metadata_mut();

    for (name, value) in headers {
        let name = name.as_str();
        let key = match name.strip_prefix(METADATA_PREFIX) {
            Some(stripped) => stripped,
            None if FORWARDED.contains(&name) => name,
            None => continue,
        };
        // Binary metadata would need base64 framing.
        if key.is_empty() || key.ends_with("-bin") {
            continue;
        }

        let Ok(key) = AsciiMetadataKey::from_bytes(key.as_bytes()) else {
            continue;
        };
        let Ok(value) = AsciiMetadataValue::try_from(value.as_bytes()) else {
            continue;
        };
        metadata.insert(key, value);
    }

    request
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn forwards_selected_and_prefixed_headers() {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_static("Bearer abc"));
        headers.insert("x-request-id", HeaderValue::from_static("req-1"));
        headers.insert("grpc-metadata-tenant", HeaderValue::from_static("acme"));
        headers.insert("cookie", HeaderValue::from_static("session=1"));
        headers.insert("grpc-metadata-blob-bin", HeaderValue::from_static("AAAA"));

        let request = rpc_request(&headers, ());
        let metadata = request.metadata();

        assert_eq!(metadata.get("authorization").unwrap(), "Bearer abc");
        assert_eq!(metadata.get("x-request-id").unwrap(), "req-1");
        assert_eq!(metadata.get("tenant").unwrap(), "acme");
        assert!(metadata.get("cookie").is_none());
        assert_eq!(metadata.len(), 3);
    }
}
