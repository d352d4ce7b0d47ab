use std::time::{SystemTime, UNIX_EPOCH};

use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: String,
    pub exp: usize,
}

/// Issues an HS256 token for `user_id`
///
/// ### Returns
///
/// The token and its expiry as a Unix timestamp in seconds
pub fn create_token(jwt_secret: &str, ttl_hours: u64, user_id: &str) -> anyhow::Result<(String, u64)> {
    let now = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs();
    let expires_at = now + ttl_hours * 3600;

    let claims = Claims {
        sub: user_id.to_string(),
        exp: expires_at as usize,
    };

    let token = encode(&Header::default(), &claims, &EncodingKey::from_secret(jwt_secret.as_bytes()))?;

    Ok((token, expires_at))
}

/// Verifies the signature and expiry of a token
pub fn verify_token(jwt_secret: &str, token: &str) -> anyhow::Result<Claims> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(jwt_secret.as_bytes()),
        &Validation::default(),
    )?;

    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_keeps_subject() {
        let (token, expires_at) = create_token("secret", 2, "user-1").unwrap();
        let claims = verify_token("secret", &token).unwrap();
        assert_eq!(claims.sub, "user-1");
        assert_eq!(claims.exp as u64, expires_at);
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let (token, _) = create_token("secret", 2, "user-1").unwrap();
        assert!(verify_token("other", &token).is_err());
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let claims = Claims { sub: "user-1".into(), exp: 1_000 };
        let token = encode(&Header::default(), &claims, &EncodingKey::from_secret(b"secret")).unwrap();
        assert!(verify_token("secret", &token).is_err());
    }
}
