//! Request extractors that fail with wire-shaped [`RpcError`]s.

use std::convert::Infallible;

use axum::body::Bytes;
use axum::extract::{FromRequest, FromRequestParts, Query, Request};
use axum::http::request::Parts;
use serde::de::DeserializeOwned;

use crate::audit::Caller;
use crate::service::RpcError;

/// Header carrying the authenticated identity, set by the fronting proxy.
pub const CALLER_HEADER: &str = "x-forwarded-user";

/// JSON body whose rejections are `bad_request` (empty) or `bad_json`.
#[derive(Debug)]
pub struct JsonBody<T>(pub T);

impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = RpcError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|e| RpcError::bad_request(e.body_text()))?;
        parse_body(&bytes).map(JsonBody)
    }
}

/// Parses a raw request body.
///
/// # Errors
///
/// `bad_request` for a blank body, `bad_json` when it does not deserialize.
pub fn parse_body<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, RpcError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Err(RpcError::bad_request("request body is required"));
    }
    serde_json::from_slice(bytes).map_err(|_| RpcError::bad_json("request body must be valid JSON"))
}

/// Query string whose rejections are `bad_request`.
#[derive(Debug)]
pub struct QueryParams<T>(pub T);

impl<T, S> FromRequestParts<S> for QueryParams<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = RpcError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|e| RpcError::bad_request(e.body_text()))?;
        Ok(QueryParams(value))
    }
}

impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let identity = parts
            .headers
            .get(CALLER_HEADER)
            .and_then(|v| v.to_str().ok());
        Ok(Caller::new(identity))
    }
}

#[cfg(test)]
mod tests {
    use axum::http::Request as HttpRequest;
    use serde::Deserialize;
    use steprpc_core::messages::InvokeRequest;

    use super::*;

    #[derive(Debug, Deserialize)]
    struct Target {
        target: Option<String>,
    }

    async fn query(uri: &str) -> Result<Target, RpcError> {
        let (mut parts, ()) = HttpRequest::get(uri).body(()).unwrap().into_parts();
        QueryParams::<Target>::from_request_parts(&mut parts, &())
            .await
            .map(|QueryParams(t)| t)
    }

    #[tokio::test]
    async fn query_params_parse() {
        assert_eq!(query("/p?target=demo%231").await.unwrap().target.as_deref(), Some("demo#1"));
        assert!(query("/p").await.unwrap().target.is_none());
    }

    #[tokio::test]
    async fn malformed_query_is_bad_request() {
        let err = query("/p?target=a&target=b").await.unwrap_err();
        assert_eq!(err.code(), "bad_request");
    }

    #[test]
    fn blank_body_is_bad_request() {
        let err = parse_body::<InvokeRequest>(b"  \n").unwrap_err();
        assert_eq!(err.code(), "bad_request");
        assert_eq!(err.to_string(), "request body is required");
    }

    #[test]
    fn malformed_body_is_bad_json() {
        assert_eq!(parse_body::<InvokeRequest>(b"{nope").unwrap_err().code(), "bad_json");
        assert_eq!(
            parse_body::<InvokeRequest>(br#"{"requestId": 5}"#).unwrap_err().code(),
            "bad_json"
        );
    }

    #[test]
    fn partial_body_parses_with_defaults() {
        let req: InvokeRequest = parse_body(br#"{"operation":"junit"}"#).unwrap();
        assert_eq!(req.operation, "junit");
        assert!(req.request_id.is_empty());
    }
}
