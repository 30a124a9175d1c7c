use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use super::guard::SessionError;
use super::role::Role;

/// Payload of the bearer token issued by the remote API at login/signup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    pub user_id: i64,
    pub username: String,
    pub role_id: i64,
    /// Unix epoch seconds.
    pub exp: i64,
}

impl Claims {
    pub fn role(&self) -> Role {
        Role::from_id(self.role_id)
    }

    /// A token is usable only while `exp` lies strictly in the future.
    pub fn is_expired_at(&self, now: i64) -> bool {
        self.exp <= now
    }
}

/// Reads the claims of a compact JWT without checking its signature or
/// expiry. The remote API verifies signatures; this side only reads the
/// claims to choose pages and navigation, and the guard judges expiry.
pub fn decode_token(token: &str) -> Result<Claims, SessionError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();

    decode::<Claims>(token.trim(), &DecodingKey::from_secret(&[]), &validation)
        .map(|data| data.claims)
        .map_err(|_| SessionError::InvalidToken)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn compact(payload: &serde_json::Value) -> String {
        jsonwebtoken::encode(
            &jsonwebtoken::Header::default(),
            payload,
            &jsonwebtoken::EncodingKey::from_secret(b"backend-only"),
        )
        .unwrap()
    }

    #[test]
    fn decodes_camel_case_claims() {
        let token = compact(&json!({
            "userId": 7,
            "username": "jane@example.com",
            "roleId": 99,
            "exp": 1_900_000_000
        }));

        let claims = decode_token(&token).expect("decodable token");
        assert_eq!(claims.user_id, 7);
        assert_eq!(claims.username, "jane@example.com");
        assert_eq!(claims.role(), Role::Administrator);
        assert_eq!(claims.exp, 1_900_000_000);
    }

    #[test]
    fn ignores_extra_claims() {
        let token = compact(&json!({
            "userId": 1,
            "username": "u",
            "roleId": 1,
            "exp": 10,
            "iat": 5
        }));
        assert!(decode_token(&token).is_ok());
    }

    #[test]
    fn rejects_malformed_tokens() {
        assert_eq!(decode_token(""), Err(SessionError::InvalidToken));
        assert_eq!(decode_token("not-a-jwt"), Err(SessionError::InvalidToken));
        assert_eq!(decode_token("a..c"), Err(SessionError::InvalidToken));
        assert_eq!(decode_token("a.!!!.c"), Err(SessionError::InvalidToken));
    }

    #[test]
    fn reads_claims_whatever_the_signing_key() {
        let payload = json!({"userId": 2, "username": "u", "roleId": 1, "exp": 10});
        let token = jsonwebtoken::encode(
            &jsonwebtoken::Header::new(Algorithm::HS512),
            &payload,
            &jsonwebtoken::EncodingKey::from_secret(b"another-key"),
        )
        .unwrap();

        let claims = decode_token(&token).expect("signature is not checked here");
        assert_eq!(claims.user_id, 2);
        assert!(claims.is_expired_at(10));
    }

    #[test]
    fn rejects_payload_missing_role() {
        let token = compact(&json!({"userId": 1, "username": "u", "exp": 10}));
        assert_eq!(decode_token(&token), Err(SessionError::InvalidToken));
    }

    #[test]
    fn expiry_is_strict() {
        let claims = Claims {
            user_id: 1,
            username: "u".to_string(),
            role_id: 1,
            exp: 100,
        };
        assert!(claims.is_expired_at(100));
        assert!(claims.is_expired_at(101));
        assert!(!claims.is_expired_at(99));
    }
}
