//! `AuthService` port: decodes an opaque bearer token into account
//! identity, the way the Matrix homeserver stack in the retrieval pack
//! holds a `jsonwebtoken::DecodingKey` on its globals service and calls
//! `jsonwebtoken::decode` against it. Token *issuance* is explicitly out
//! of scope (spec §1) — this crate only verifies.

#![deny(unsafe_code)]

use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::Deserialize;

/// The decoded identity the room runtime trusts once a token verifies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountClaims {
    pub account_id: i64,
    pub email: String,
}

#[derive(Debug, Deserialize)]
struct TokenClaims {
    #[serde(rename = "sub")]
    account_id: i64,
    email: String,
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("token is malformed or signature is invalid")]
    InvalidToken,
    #[error("token has expired")]
    Expired,
}

/// `decodeToken(token) -> { accountId, email } | error` (spec §6).
pub trait AuthService: Send + Sync {
    fn decode_token(&self, token: &str) -> Result<AccountClaims, AuthError>;
}

/// HS256-verified JWT implementation. The signing secret is provisioned
/// out of band by whatever issues tokens (the out-of-scope AuthService
/// issuer named in spec §1); this adapter only holds the verification
/// key.
pub struct JwtAuthService {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtAuthService {
    pub fn from_hs256_secret(secret: &[u8]) -> Self {
        Self {
            decoding_key: DecodingKey::from_secret(secret),
            validation: Validation::new(jsonwebtoken::Algorithm::HS256),
        }
    }
}

impl AuthService for JwtAuthService {
    fn decode_token(&self, token: &str) -> Result<AccountClaims, AuthError> {
        let data = decode::<TokenClaims>(token, &self.decoding_key, &self.validation).map_err(|e| {
            use jsonwebtoken::errors::ErrorKind;
            match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::Expired,
                _ => AuthError::InvalidToken,
            }
        })?;
        Ok(AccountClaims {
            account_id: data.claims.account_id,
            email: data.claims.email,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde::Serialize;

    #[derive(Serialize)]
    struct TestClaims {
        sub: i64,
        email: String,
        exp: usize,
    }

    fn token_for(account_id: i64, email: &str, secret: &[u8], exp: usize) -> String {
        let claims = TestClaims {
            sub: account_id,
            email: email.to_string(),
            exp,
        };
        encode(&Header::default(), &claims, &EncodingKey::from_secret(secret)).unwrap()
    }

    #[test]
    fn decodes_valid_token() {
        let secret = b"test-secret";
        let service = JwtAuthService::from_hs256_secret(secret);
        let token = token_for(42, "hero@example.test", secret, 9_999_999_999);

        let claims = service.decode_token(&token).unwrap();
        assert_eq!(claims.account_id, 42);
        assert_eq!(claims.email, "hero@example.test");
    }

    #[test]
    fn rejects_token_signed_with_wrong_secret() {
        let service = JwtAuthService::from_hs256_secret(b"real-secret");
        let token = token_for(1, "x@example.test", b"wrong-secret", 9_999_999_999);

        let err = service.decode_token(&token).unwrap_err();
        assert!(matches!(err, AuthError::InvalidToken));
    }

    #[test]
    fn rejects_expired_token() {
        let secret = b"test-secret";
        let service = JwtAuthService::from_hs256_secret(secret);
        let token = token_for(1, "x@example.test", secret, 1);

        let err = service.decode_token(&token).unwrap_err();
        assert!(matches!(err, AuthError::Expired));
    }
}
