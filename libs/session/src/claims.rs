use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::OffsetDateTime;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("token signing failed: {0}")]
    Sign(#[source] jsonwebtoken::errors::Error),

    #[error("token rejected: {0}")]
    Verify(#[source] jsonwebtoken::errors::Error),
}

/// Token payload: subject user id, login and the group ids the caller
/// held at login time.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub login: String,
    pub groups: Vec<String>,
    pub exp: i64,
}

/// HS256 keys plus token lifetime.
#[derive(Clone)]
pub struct SessionKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl_secs: i64,
}

impl SessionKeys {
    #[must_use]
    pub fn new(secret: &[u8], ttl_secs: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl_secs,
        }
    }

    #[must_use]
    pub fn ttl_secs(&self) -> i64 {
        self.ttl_secs
    }

    pub fn sign(
        &self,
        user_id: &str,
        login: &str,
        groups: Vec<String>,
    ) -> Result<String, SessionError> {
        let claims = Claims {
            sub: user_id.to_owned(),
            login: login.to_owned(),
            groups,
            exp: OffsetDateTime::now_utc().unix_timestamp() + self.ttl_secs,
        };
        jsonwebtoken::encode(&Header::default(), &claims, &self.encoding)
            .map_err(SessionError::Sign)
    }

    pub fn verify(&self, token: &str) -> Result<Claims, SessionError> {
        let data =
            jsonwebtoken::decode::<Claims>(token, &self.decoding, &Validation::default())
                .map_err(SessionError::Verify)?;
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_verify_round_trip() {
        let keys = SessionKeys::new(b"test-secret", 3600);
        let token = keys
            .sign("u1", "alice", vec!["admins".to_owned(), "users".to_owned()])
            .unwrap();

        let claims = keys.verify(&token).unwrap();
        assert_eq!(claims.sub, "u1");
        assert_eq!(claims.login, "alice");
        assert_eq!(claims.groups, vec!["admins", "users"]);
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let keys = SessionKeys::new(b"secret-a", 3600);
        let other = SessionKeys::new(b"secret-b", 3600);
        let token = keys.sign("u1", "alice", vec![]).unwrap();

        assert!(matches!(
            other.verify(&token),
            Err(SessionError::Verify(_))
        ));
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let keys = SessionKeys::new(b"secret", -120);
        let token = keys.sign("u1", "alice", vec![]).unwrap();
        assert!(keys.verify(&token).is_err());
    }
}
