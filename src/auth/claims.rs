/// JWT Claims structures
///
/// Typed payloads for the two token kinds. Each token is decoded once into
/// one of these structs; nothing downstream reads claims by name.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Claims for short-lived access tokens
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct AccessClaims {
    /// Subject (user ID)
    pub sub: Uuid,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issuer
    pub iss: String,
}

impl AccessClaims {
    pub fn new(user_id: Uuid, issued_at: i64, expires_at: i64, issuer: &str) -> Self {
        Self {
            sub: user_id,
            iat: issued_at,
            exp: expires_at,
            iss: issuer.to_string(),
        }
    }
}

/// Claims for long-lived refresh tokens
///
/// `userID` and `sessionID` keep the wire names existing clients expect.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct RefreshClaims {
    #[serde(rename = "userID")]
    pub user_id: Uuid,
    #[serde(rename = "sessionID")]
    pub session_id: String,
    pub iat: i64,
    pub exp: i64,
    pub iss: String,
}

impl RefreshClaims {
    pub fn new(
        user_id: Uuid,
        session_id: String,
        issued_at: i64,
        expires_at: i64,
        issuer: &str,
    ) -> Self {
        Self {
            user_id,
            session_id,
            iat: issued_at,
            exp: expires_at,
            iss: issuer.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_refresh_claims_wire_names() {
        let user_id = Uuid::new_v4();
        let claims = RefreshClaims::new(user_id, "abc".to_string(), 10, 20, "test");
        let json = serde_json::to_value(&claims).unwrap();

        assert_eq!(json["userID"], user_id.to_string());
        assert_eq!(json["sessionID"], "abc");
        assert_eq!(json["exp"], 20);
        assert!(json.get("user_id").is_none());
    }

    #[test]
    fn test_refresh_claims_reject_missing_session() {
        let json = serde_json::json!({
            "userID": Uuid::new_v4().to_string(),
            "iat": 1,
            "exp": 2,
            "iss": "test"
        });
        assert!(serde_json::from_value::<RefreshClaims>(json).is_err());
    }

    #[test]
    fn test_access_claims_invalid_subject() {
        let json = serde_json::json!({"sub": "invalid-uuid", "iat": 1, "exp": 2, "iss": "test"});
        assert!(serde_json::from_value::<AccessClaims>(json).is_err());
    }
}
