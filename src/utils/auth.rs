use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // user id
    pub email: String,
    pub sid: Uuid, // session id
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn new(user_id: i64, email: String, session_id: Uuid, ttl_hours: i64) -> Self {
        let now = Utc::now();
        let exp = now + Duration::hours(ttl_hours);

        Self {
            sub: user_id.to_string(),
            email,
            sid: session_id,
            exp: exp.timestamp(),
            iat: now.timestamp(),
        }
    }

    pub fn user_id(&self) -> Option<i64> {
        self.sub.parse().ok()
    }
}

pub fn create_token(secret: &str, claims: &Claims) -> Result<String, jsonwebtoken::errors::Error> {
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(secret.as_ref()),
    )
}

pub fn verify_token(secret: &str, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_ref()),
        &Validation::default(),
    )?;

    Ok(token_data.claims)
}

pub fn hash_password(password: &str, cost: u32) -> Result<String, bcrypt::BcryptError> {
    bcrypt::hash(password, cost)
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool, bcrypt::BcryptError> {
    bcrypt::verify(password, hash)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_round_trip_keeps_session() {
        let session = Uuid::new_v4();
        let claims = Claims::new(7, "admin@inventory.com".into(), session, 1);
        let token = create_token("secret", &claims).unwrap();

        let decoded = verify_token("secret", &token).unwrap();
        assert_eq!(decoded.user_id(), Some(7));
        assert_eq!(decoded.sid, session);
        assert!(verify_token("other-secret", &token).is_err());
    }

    #[test]
    fn expired_tokens_are_rejected() {
        let claims = Claims::new(1, "a@b.c".into(), Uuid::new_v4(), -2);
        let token = create_token("secret", &claims).unwrap();
        assert!(verify_token("secret", &token).is_err());
    }

    #[test]
    fn password_hash_verifies() {
        let hash = hash_password("admin", 4).unwrap();
        assert!(verify_password("admin", &hash).unwrap());
        assert!(!verify_password("nope", &hash).unwrap());
    }
}
