//! Bearer-token authentication.

use axum::http::{HeaderMap, header};

use super::handlers::{ApiError, reject};
use super::state::AppState;
use crate::error::PixxelError;
use crate::store::{Identity, ProjectStore, User};

/// Token from an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

/// Resolve the caller and make sure their user record exists.
pub async fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<(Identity, User), ApiError> {
    let identity = bearer_token(headers)
        .and_then(|token| state.identity_for(token))
        .cloned()
        .ok_or_else(|| reject(PixxelError::Unauthenticated))?;
    let user = state.store.store_user(Some(&identity)).await.map_err(reject)?;
    Ok((identity, user))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_bearer_token() {
        assert_eq!(bearer_token(&headers("Bearer abc")), Some("abc"));
        assert_eq!(bearer_token(&headers("bearer  abc ")), Some("abc"));
        assert_eq!(bearer_token(&headers("Basic abc")), None);
        assert_eq!(bearer_token(&headers("Bearer ")), None);
        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }
}
