use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use common_http_errors::ApiError;

/// Authenticated user id, resolved upstream by the auth layer and forwarded
/// in the `X-User-ID` header. The core trusts the value once present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserId(pub i64);

#[axum::async_trait]
impl<S> FromRequestParts<S> for UserId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get("x-user-id")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.trim().parse::<i64>().ok())
            .map(UserId)
            .ok_or(ApiError::Unauthorized)
    }
}
