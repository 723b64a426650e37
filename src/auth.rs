use crate::error::ApiError;
use actix_web::{dev::Payload, http::header, web, FromRequest, HttpRequest};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use log::debug;
use serde::{Deserialize, Serialize};
use std::future::{ready, Ready};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

const TOKEN_TYPE: &str = "access";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    pub sub: String,
    pub iat: u64,
    pub exp: u64,
    #[serde(rename = "type")]
    pub token_type: String,
}

/// Fails with `BcryptError::Truncation` instead of ignoring bytes bcrypt
/// cannot see.
pub fn verify_password(password: &str, hash: &str) -> bcrypt::BcryptResult<bool> {
    bcrypt::non_truncating_verify(password, hash)
}

pub struct Auth {
    hash_cost: u32,
    token_ttl: Duration,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl Auth {
    pub fn new(secret: &[u8], hash_cost: u32, token_ttl: Duration) -> Self {
        Auth {
            hash_cost,
            token_ttl,
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
        }
    }

    pub fn hash_password(&self, password: &str) -> bcrypt::BcryptResult<String> {
        bcrypt::non_truncating_hash(password, self.hash_cost)
    }

    pub fn issue_token(&self, username: &str) -> jsonwebtoken::errors::Result<String> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        let claims = Claims {
            sub: username.to_owned(),
            iat: now,
            exp: now.saturating_add(self.token_ttl.as_secs()),
            token_type: TOKEN_TYPE.to_owned(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
    }

    /// Checks signature and expiry.
    pub fn verify_token(&self, token: &str) -> jsonwebtoken::errors::Result<Claims> {
        let validation = Validation::new(Algorithm::HS256);
        decode::<Claims>(token, &self.decoding_key, &validation).map(|data| data.claims)
    }
}

/// The username carried by a valid `Authorization: Bearer` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BearerIdentity {
    pub username: String,
}

impl BearerIdentity {
    fn from_request_headers(req: &HttpRequest) -> Result<Self, ApiError> {
        let auth = req
            .app_data::<web::Data<Auth>>()
            .ok_or(ApiError::Internal("Authentication unavailable"))?;
        let value = req
            .headers()
            .get(header::AUTHORIZATION)
            .ok_or(ApiError::MissingToken)?;
        let token = value
            .to_str()
            .ok()
            .and_then(|v| v.strip_prefix("Bearer "))
            .ok_or(ApiError::InvalidToken)?;
        let claims = auth.verify_token(token.trim()).map_err(|err| {
            debug!("rejected bearer token: {}", err);
            ApiError::InvalidToken
        })?;
        if claims.token_type != TOKEN_TYPE {
            return Err(ApiError::InvalidToken);
        }
        Ok(BearerIdentity {
            username: claims.sub,
        })
    }
}

impl FromRequest for BearerIdentity {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(BearerIdentity::from_request_headers(req))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    fn auth(secret: &[u8]) -> Auth {
        Auth::new(secret, 4, Duration::from_secs(900))
    }

    #[test]
    fn hashes_verify_only_their_password() {
        let auth = auth(b"secret");
        let hash = auth.hash_password("hunter2").unwrap();
        assert_ne!(hash, "hunter2");
        assert!(verify_password("hunter2", &hash).unwrap());
        assert!(!verify_password("hunter3", &hash).unwrap());
    }

    #[test]
    fn hashes_are_salted() {
        let auth = auth(b"secret");
        let first = auth.hash_password("hunter2").unwrap();
        let second = auth.hash_password("hunter2").unwrap();
        assert_ne!(first, second);
        assert!(verify_password("hunter2", &first).unwrap());
        assert!(verify_password("hunter2", &second).unwrap());
    }

    #[test]
    fn long_passwords_are_refused_not_truncated() {
        let auth = auth(b"secret");
        let prefix = "a".repeat(72);
        let one = format!("{}one", prefix);
        let two = format!("{}two", prefix);
        assert!(matches!(
            auth.hash_password(&one),
            Err(bcrypt::BcryptError::Truncation(_))
        ));
        let hash = bcrypt::hash(&one, 4).unwrap();
        assert!(matches!(
            verify_password(&two, &hash),
            Err(bcrypt::BcryptError::Truncation(_))
        ));
    }

    #[test]
    fn huge_token_lifetime_does_not_overflow() {
        let auth = Auth::new(b"secret", 4, Duration::from_secs(u64::MAX));
        let token = auth.issue_token("alice").unwrap();
        let claims = auth.verify_token(&token).unwrap();
        assert_eq!(claims.exp, u64::MAX);
        assert_eq!(claims.sub, "alice");
    }

    #[test]
    fn token_carries_username() {
        let auth = auth(b"secret");
        let token = auth.issue_token("alice").unwrap();
        let claims = auth.verify_token(&token).unwrap();
        assert_eq!(claims.sub, "alice");
        assert_eq!(claims.token_type, "access");
        assert_eq!(claims.exp, claims.iat + 900);
    }

    #[test]
    fn foreign_or_tampered_tokens_are_rejected() {
        let token = auth(b"secret").issue_token("alice").unwrap();
        assert!(auth(b"other secret").verify_token(&token).is_err());
        let mut tampered = token.clone();
        tampered.push('x');
        assert!(auth(b"secret").verify_token(&tampered).is_err());
        assert!(auth(b"secret").verify_token("not a token").is_err());
    }

    #[test]
    fn bearer_identity_from_header() {
        let data = web::Data::new(auth(b"secret"));
        let token = data.issue_token("alice").unwrap();
        let req = TestRequest::default()
            .app_data(data.clone())
            .insert_header((header::AUTHORIZATION, format!("Bearer {}", token)))
            .to_http_request();
        assert_eq!(
            BearerIdentity::from_request_headers(&req).unwrap(),
            BearerIdentity {
                username: "alice".to_owned()
            }
        );

        let req = TestRequest::default()
            .app_data(data.clone())
            .to_http_request();
        assert!(matches!(
            BearerIdentity::from_request_headers(&req),
            Err(ApiError::MissingToken)
        ));

        let req = TestRequest::default()
            .app_data(data)
            .insert_header((header::AUTHORIZATION, "Basic YWxpY2U6cHc="))
            .to_http_request();
        assert!(matches!(
            BearerIdentity::from_request_headers(&req),
            Err(ApiError::InvalidToken)
        ));
    }
}
