use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::models::UserId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    #[serde(rename = "userId")]
    pub user_id: i64,
    pub iat: i64,
    pub exp: i64,
}

/// HS256 signing and verification keys derived from the shared secret.
#[derive(Clone)]
pub struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl TokenKeys {
    pub fn new(secret: &str, ttl_hours: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl: Duration::hours(ttl_hours),
        }
    }

    /// Issue a token for `user` valid from now.
    pub fn issue(&self, user: UserId) -> Result<String> {
        self.issue_at(user, Utc::now())
    }

    pub fn issue_at(&self, user: UserId, issued_at: DateTime<Utc>) -> Result<String> {
        let claims = Claims {
            user_id: user.0,
            iat: issued_at.timestamp(),
            exp: (issued_at + self.ttl).timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| Error::Token(e.to_string()))
    }

    /// Verify a token and return the user it was issued to.
    pub fn verify(&self, token: &str) -> Result<UserId> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);

        let claims = decode::<Claims>(token, &self.decoding, &validation)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => Error::Unauthenticated("Token has expired".into()),
                _ => {
                    log::debug!("Rejected token: {e}");
                    Error::Unauthenticated("Invalid token".into())
                }
            })?
            .claims;

        if claims.user_id <= 0 {
            return Err(Error::Unauthenticated("Invalid token: missing user ID".into()));
        }
        Ok(UserId(claims.user_id))
    }
}

/// Extract the token from an `Authorization: Bearer <token>` header value.
pub fn bearer_token(header: Option<&str>) -> Result<&str> {
    let value = header
        .ok_or_else(|| Error::Unauthenticated("Authorization header is missing".into()))?;
    let token = value.strip_prefix("Bearer ").ok_or_else(|| {
        Error::Unauthenticated(
            "Invalid authorization header format. Expected: 'Bearer <token>'".into(),
        )
    })?;
    let token = token.trim();
    if token.is_empty() {
        return Err(Error::Unauthenticated("Authentication token is missing".into()));
    }
    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(err: Error) -> String {
        match err {
            Error::Unauthenticated(msg) => msg,
            other => panic!("expected Unauthenticated, got {other:?}"),
        }
    }

    #[test]
    fn test_issue_and_verify() {
        let keys = TokenKeys::new("secret", 24);
        let token = keys.issue(UserId(42)).unwrap();
        assert_eq!(keys.verify(&token).unwrap(), UserId(42));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = TokenKeys::new("secret", 24).issue(UserId(1)).unwrap();
        let err = TokenKeys::new("other", 24).verify(&token).unwrap_err();
        assert_eq!(message(err), "Invalid token");
    }

    #[test]
    fn test_expired_token_rejected() {
        let keys = TokenKeys::new("secret", 1);
        let token = keys
            .issue_at(UserId(1), Utc::now() - Duration::hours(2))
            .unwrap();
        assert_eq!(message(keys.verify(&token).unwrap_err()), "Token has expired");
    }

    #[test]
    fn test_garbage_rejected() {
        let keys = TokenKeys::new("secret", 24);
        assert_eq!(message(keys.verify("not.a.token").unwrap_err()), "Invalid token");
        assert_eq!(message(keys.verify("").unwrap_err()), "Invalid token");
    }

    #[test]
    fn test_claims_use_user_id_key() {
        let claims = Claims {
            user_id: 5,
            iat: 0,
            exp: 1,
        };
        let json = serde_json::to_value(&claims).unwrap();
        assert_eq!(json["userId"], 5);
    }

    #[test]
    fn test_bearer_token() {
        assert_eq!(bearer_token(Some("Bearer abc.def.ghi")).unwrap(), "abc.def.ghi");
        assert_eq!(
            message(bearer_token(None).unwrap_err()),
            "Authorization header is missing"
        );
        assert!(message(bearer_token(Some("abc.def.ghi")).unwrap_err())
            .starts_with("Invalid authorization header format"));
        assert!(message(bearer_token(Some("Basic dXNlcjpwYXNz")).unwrap_err())
            .starts_with("Invalid authorization header format"));
        assert_eq!(
            message(bearer_token(Some("Bearer   ")).unwrap_err()),
            "Authentication token is missing"
        );
    }
}
