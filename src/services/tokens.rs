use std::str::FromStr;

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

use crate::models::auth::Claims;
use crate::settings;

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("Unsupported signing algorithm: {0}")]
    UnsupportedAlgorithm(String),
    #[error("Signing secret must not be empty")]
    EmptySecret,
    #[error("Could not sign token: {0}")]
    Signing(jsonwebtoken::errors::Error),
    #[error("Invalid token: {0}")]
    Invalid(String),
}

/// Issues and checks HMAC-signed bearer tokens. The secret is fixed at
/// construction.
#[derive(Clone)]
pub struct TokenService {
    algorithm: Algorithm,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    default_ttl: Duration,
}

impl TokenService {
    pub fn new(secret: &[u8], algorithm: Algorithm, default_ttl: Duration) -> Result<Self, TokenError> {
        if !matches!(algorithm, Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512) {
            return Err(TokenError::UnsupportedAlgorithm(format!("{algorithm:?}")));
        }
        if secret.is_empty() {
            return Err(TokenError::EmptySecret);
        }

        Ok(Self {
            algorithm,
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            default_ttl,
        })
    }

    pub fn from_settings(auth: &settings::Auth) -> Result<Self, TokenError> {
        let algorithm = Algorithm::from_str(&auth.algorithm)
            .map_err(|_| TokenError::UnsupportedAlgorithm(auth.algorithm.clone()))?;

        Self::new(
            auth.secret_key.as_bytes(),
            algorithm,
            Duration::minutes(auth.access_token_expire_minutes),
        )
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    pub fn issue(&self, user_id: i64, ttl: Duration) -> Result<String, TokenError> {
        let now = Utc::now();
        let claims = Claims {
            sub: Some(user_id.to_string()),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        };

        encode(&Header::new(self.algorithm), &claims, &self.encoding_key).map_err(TokenError::Signing)
    }

    /// Returns the user id in `sub`. The header must name the configured
    /// algorithm and the token must not be past `exp`.
    pub fn validate(&self, token: &str) -> Result<i64, TokenError> {
        let mut validation = Validation::new(self.algorithm);
        validation.leeway = 0;

        let data = decode::<Claims>(token, &self.decoding_key, &validation)
            .map_err(|e| TokenError::Invalid(e.to_string()))?;
        let subject = data
            .claims
            .sub
            .ok_or_else(|| TokenError::Invalid("missing subject".to_string()))?;

        subject
            .parse()
            .map_err(|_| TokenError::Invalid(format!("subject '{subject}' is not a user id")))
    }
}

#[cfg(test)]
mod tests {
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use base64::Engine;
    use rstest::{fixture, rstest};
    use serde_json::json;

    use super::*;

    #[fixture]
    fn tokens() -> TokenService {
        TokenService::new(b"test-secret", Algorithm::HS256, Duration::hours(8)).unwrap()
    }

    fn segment(value: serde_json::Value) -> String {
        URL_SAFE_NO_PAD.encode(value.to_string())
    }

    #[rstest]
    fn issued_token_round_trips(tokens: TokenService) {
        let token = tokens.issue(42, tokens.default_ttl()).unwrap();

        assert_eq!(tokens.validate(&token).unwrap(), 42);
    }

    #[rstest]
    fn expired_token_is_rejected(tokens: TokenService) {
        let token = tokens.issue(42, Duration::minutes(-1)).unwrap();

        assert!(matches!(tokens.validate(&token), Err(TokenError::Invalid(_))));
    }

    #[rstest]
    fn other_secret_is_rejected(tokens: TokenService) {
        let foreign = TokenService::new(b"other-secret", Algorithm::HS256, Duration::hours(1)).unwrap();
        let token = foreign.issue(42, Duration::hours(1)).unwrap();

        assert!(tokens.validate(&token).is_err());
    }

    #[rstest]
    fn other_algorithm_is_rejected(tokens: TokenService) {
        let foreign = TokenService::new(b"test-secret", Algorithm::HS512, Duration::hours(1)).unwrap();
        let token = foreign.issue(42, Duration::hours(1)).unwrap();

        assert!(tokens.validate(&token).is_err());
    }

    #[rstest]
    fn unsigned_token_is_rejected(tokens: TokenService) {
        let exp = (Utc::now() + Duration::hours(1)).timestamp();
        let token = format!(
            "{}.{}.",
            segment(json!({"alg": "none", "typ": "JWT"})),
            segment(json!({"sub": "42", "exp": exp, "iat": 0})),
        );

        assert!(tokens.validate(&token).is_err());
    }

    #[rstest]
    fn altered_payload_is_rejected(tokens: TokenService) {
        let token = tokens.issue(42, Duration::hours(1)).unwrap();
        let parts: Vec<&str> = token.split('.').collect();
        let exp = (Utc::now() + Duration::hours(1)).timestamp();
        let forged = format!(
            "{}.{}.{}",
            parts[0],
            segment(json!({"sub": "1", "exp": exp, "iat": 0})),
            parts[2]
        );

        assert!(tokens.validate(&forged).is_err());
    }

    #[rstest]
    fn token_without_subject_is_rejected(tokens: TokenService) {
        let exp = (Utc::now() + Duration::hours(1)).timestamp();
        let token = encode(
            &Header::new(Algorithm::HS256),
            &json!({"exp": exp, "iat": 0}),
            &EncodingKey::from_secret(b"test-secret"),
        )
        .unwrap();

        assert!(matches!(tokens.validate(&token), Err(TokenError::Invalid(_))));
    }

    #[rstest]
    fn non_numeric_subject_is_rejected(tokens: TokenService) {
        let exp = (Utc::now() + Duration::hours(1)).timestamp();
        let token = encode(
            &Header::new(Algorithm::HS256),
            &json!({"sub": "ana", "exp": exp, "iat": 0}),
            &EncodingKey::from_secret(b"test-secret"),
        )
        .unwrap();

        assert!(tokens.validate(&token).is_err());
    }

    #[rstest]
    #[case("RS256")]
    #[case("none")]
    fn asymmetric_or_unknown_algorithms_are_refused(#[case] algorithm: &str) {
        let auth = settings::Auth {
            secret_key: "secret".to_string(),
            algorithm: algorithm.to_string(),
            access_token_expire_minutes: 60,
        };

        assert!(matches!(
            TokenService::from_settings(&auth),
            Err(TokenError::UnsupportedAlgorithm(_))
        ));
    }
}
