use serde::{Deserialize, Serialize};

/// Claims carried by an access token.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Claims {
    /// User id, encoded as a string.
    pub sub: Option<String>,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct AccessToken {
    pub access_token: String,
    pub token_type: String,
}

impl AccessToken {
    pub fn bearer(access_token: String) -> Self {
        Self {
            access_token,
            token_type: "bearer".to_string(),
        }
    }
}
