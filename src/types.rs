use serde::{Deserialize, Serialize};

use crate::session::AccessToken;

/// Token payload returned by the login and refresh endpoints.
///
/// Only the access token matters to the client; anything else the server
/// sends (user profile, roles) is kept in `extra` for the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[non_exhaustive]
pub struct TokenResponse {
    #[serde(alias = "accessToken", alias = "token")]
    pub access_token: AccessToken,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default, alias = "expiresIn")]
    pub expires_in: Option<u64>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_accepts_snake_and_camel_case() {
        let snake: TokenResponse =
            serde_json::from_value(json!({ "access_token": "T1", "token_type": "Bearer" }))
                .unwrap();
        assert_eq!(snake.access_token.as_str(), "T1");
        assert_eq!(snake.token_type.as_deref(), Some("Bearer"));

        let camel: TokenResponse =
            serde_json::from_value(json!({ "accessToken": "T2", "expiresIn": 900 })).unwrap();
        assert_eq!(camel.access_token.as_str(), "T2");
        assert_eq!(camel.expires_in, Some(900));
    }

    #[test]
    fn test_keeps_extra_fields() {
        let response: TokenResponse = serde_json::from_value(json!({
            "token": "T3",
            "user": { "id": 12, "role": "seller" }
        }))
        .unwrap();

        assert_eq!(response.access_token.as_str(), "T3");
        assert_eq!(response.extra["user"]["role"], "seller");
    }

    #[test]
    fn test_missing_token_is_rejected() {
        let result = serde_json::from_value::<TokenResponse>(json!({ "user": {} }));
        assert!(result.is_err());
    }
}
