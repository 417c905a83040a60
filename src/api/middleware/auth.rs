use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
};

use crate::api::error::ApiError;
use crate::api::state::AppState;
use crate::auth::bearer_token;
use crate::error::Error;
use crate::models::UserId;

/// The caller's identity, taken from a verified `Authorization: Bearer` token.
/// Handlers that take this extractor reject unauthenticated requests with 401.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser(pub UserId);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = AppState::from_ref(state);

        let header = match parts.headers.get(header::AUTHORIZATION) {
            Some(value) => Some(value.to_str().map_err(|_| {
                Error::Unauthenticated(
                    "Invalid authorization header format. Expected: 'Bearer <token>'".into(),
                )
            })?),
            None => None,
        };
        let token = bearer_token(header)?;
        let user = state.tracker.authenticate(token)?;
        Ok(AuthUser(user))
    }
}
