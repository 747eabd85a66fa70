//! Custom Axum extractors
//!
//! Rejections are turned into `ApiError` so malformed input gets the same
//! `{error, code}` body as every other 400.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{FromRequest, FromRequestParts, Query, Request};
use axum::http::request::Parts;
use axum::http::HeaderMap;
use axum::Json;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::error::ApiError;
use crate::models::{parse_id_str, RecordId};

/// JSON body whose parse failures become 400 `INVALID_BODY`
pub struct JsonBody<T>(pub T);

impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e: JsonRejection| ApiError::bad_request("INVALID_BODY", e.body_text()))?;
        Ok(Self(value))
    }
}

/// Query string whose parse failures become 400 `INVALID_QUERY`
pub struct QueryParams<T>(pub T);

impl<T, S> FromRequestParts<S> for QueryParams<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|e: QueryRejection| ApiError::bad_request("INVALID_QUERY", e.body_text()))?;
        Ok(Self(value))
    }
}

#[derive(Deserialize)]
struct IdQuery {
    id: Option<String>,
}

/// The `?id=` of a single-row operation
pub struct IdParam(pub RecordId);

impl<S> FromRequestParts<S> for IdParam
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let QueryParams(query) = QueryParams::<IdQuery>::from_request_parts(parts, state).await?;
        let id = RecordId::parse(query.id.as_deref())?;
        Ok(Self(id))
    }
}

/// Who made the request, for the audit trail
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    /// `X-User-Id`, or 0 when absent or unparseable
    pub user_id: i64,
    /// First `X-Forwarded-For` hop
    pub ip_address: Option<String>,
}

impl Actor {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let header = |name: &str| headers.get(name).and_then(|v| v.to_str().ok());

        let user_id = header("x-user-id").and_then(parse_id_str).unwrap_or(0);
        let ip_address = header("x-forwarded-for")
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|ip| !ip.is_empty())
            .map(str::to_owned);

        Self {
            user_id,
            ip_address,
        }
    }
}

impl<S> FromRequestParts<S> for Actor
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_headers(&parts.headers))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn actor_from_headers() {
        let mut headers = HeaderMap::new();
        headers.insert("x-user-id", HeaderValue::from_static("42"));
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.7, 10.0.0.1"),
        );

        let actor = Actor::from_headers(&headers);
        assert_eq!(actor.user_id, 42);
        assert_eq!(actor.ip_address.as_deref(), Some("203.0.113.7"));
    }

    #[test]
    fn anonymous_actor() {
        let mut headers = HeaderMap::new();
        headers.insert("x-user-id", HeaderValue::from_static("admin"));

        let actor = Actor::from_headers(&headers);
        assert_eq!(actor.user_id, 0);
        assert_eq!(actor.ip_address, None);
    }
}
