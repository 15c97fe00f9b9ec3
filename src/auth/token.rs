//! Signed identity tokens
//!
//! Tokens are HS512 JWTs carrying `{ user: { custId, staffId, name, email, role }, iat, exp }`.
//! The `user` nesting is what older clients and tokens expect. Nothing is stored server
//! side: a token is valid exactly when its signature checks out and `exp` has not passed.

use std::collections::HashSet;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use super::principal::Role;

pub const TOKEN_LIFETIME_DAYS: i64 = 7;

const ALGORITHM: Algorithm = Algorithm::HS512;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("JWT secret is not configured")]
    MissingSecret,

    #[error("JWT generation error: {0}")]
    Signing(String),

    #[error("Malformed token: {0}")]
    Malformed(String),

    #[error("Token signature does not match")]
    InvalidSignature,

    #[error("Token has expired")]
    Expired,

    #[error("Invalid token claims: {0}")]
    InvalidClaims(String),
}

/// Identity fields carried under the `user` claim
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserClaims {
    pub cust_id: Option<i64>,
    pub staff_id: Option<i64>,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub role: Option<Role>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimSet {
    pub user: UserClaims,
    pub iat: i64,
    pub exp: i64,
}

/// Wire shape before the `user` claim has been checked
#[derive(Debug, Deserialize)]
struct RawClaims {
    #[serde(default)]
    user: Option<Value>,
    #[serde(default)]
    iat: i64,
    exp: i64,
}

/// Issues and verifies tokens with the process-wide signing secret
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    lifetime: Duration,
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("lifetime", &self.lifetime)
            .finish_non_exhaustive()
    }
}

impl TokenService {
    fn new(secret: &str, lifetime: Duration) -> Result<Self, TokenError> {
        if secret.is_empty() {
            return Err(TokenError::MissingSecret);
        }

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            lifetime,
        })
    }

    /// Every token expires seven days after issuance
    pub fn with_secret(secret: &str) -> Result<Self, TokenError> {
        Self::new(secret, Duration::days(TOKEN_LIFETIME_DAYS))
    }

    pub fn issue(&self, user: &UserClaims) -> Result<String, TokenError> {
        self.issue_at(user, Utc::now())
    }

    pub fn issue_at(&self, user: &UserClaims, now: DateTime<Utc>) -> Result<String, TokenError> {
        let claims = ClaimSet {
            user: user.clone(),
            iat: now.timestamp(),
            exp: (now + self.lifetime).timestamp(),
        };

        encode(&Header::new(ALGORITHM), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    pub fn verify(&self, token: &str) -> Result<ClaimSet, TokenError> {
        self.verify_at(token, Utc::now())
    }

    /// Checks signature, then expiry against `now`, then the shape of the `user` claim
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<ClaimSet, TokenError> {
        let mut validation = Validation::new(ALGORITHM);
        // Expiry is checked below against the caller's clock
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.required_spec_claims = HashSet::from(["exp".to_string()]);

        let raw = decode::<RawClaims>(token, &self.decoding_key, &validation)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature => TokenError::InvalidSignature,
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Malformed(e.to_string()),
            })?
            .claims;

        if now.timestamp() >= raw.exp {
            return Err(TokenError::Expired);
        }

        let user = match raw.user {
            Some(user @ Value::Object(_)) => serde_json::from_value::<UserClaims>(user)
                .map_err(|e| TokenError::InvalidClaims(e.to_string()))?,
            Some(_) => return Err(TokenError::InvalidClaims("`user` is not an object".to_string())),
            None => return Err(TokenError::InvalidClaims("missing `user` claim".to_string())),
        };

        Ok(ClaimSet { user, iat: raw.iat, exp: raw.exp })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    const SECRET: &str = "test-secret-that-is-at-least-32-characters-long";

    fn service() -> TokenService {
        TokenService::with_secret(SECRET).unwrap()
    }

    fn customer() -> UserClaims {
        UserClaims {
            cust_id: Some(42),
            staff_id: None,
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            role: Some(Role::Customer),
        }
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    fn sign_raw(payload: &Value) -> String {
        encode(&Header::new(ALGORITHM), payload, &EncodingKey::from_secret(SECRET.as_bytes())).unwrap()
    }

    #[test]
    fn round_trips_claims_within_window() {
        let tokens = service();
        let token = tokens.issue_at(&customer(), t0()).unwrap();

        let claims = tokens.verify_at(&token, t0() + Duration::days(3)).unwrap();
        assert_eq!(claims.user, customer());
        assert_eq!(claims.iat, t0().timestamp());
        assert_eq!(claims.exp, (t0() + Duration::days(7)).timestamp());
    }

    #[test]
    fn round_trips_staff_without_role() {
        let tokens = service();
        let staff = UserClaims {
            cust_id: None,
            staff_id: Some(7),
            name: "Sam".to_string(),
            email: "sam@example.com".to_string(),
            role: None,
        };
        let token = tokens.issue(&staff).unwrap();
        assert_eq!(tokens.verify(&token).unwrap().user, staff);
    }

    #[test]
    fn uses_hs512_and_three_segments() {
        let token = service().issue(&customer()).unwrap();
        assert_eq!(token.split('.').count(), 3);
        let header = jsonwebtoken::decode_header(&token).unwrap();
        assert_eq!(header.alg, Algorithm::HS512);
    }

    #[test]
    fn wire_claims_are_nested_under_user() {
        let token = service().issue(&customer()).unwrap();
        let mut validation = Validation::new(ALGORITHM);
        validation.validate_exp = false;
        let value = decode::<Value>(&token, &DecodingKey::from_secret(SECRET.as_bytes()), &validation)
            .unwrap()
            .claims;
        assert_eq!(value["user"]["custId"], 42);
        assert_eq!(value["user"]["staffId"], Value::Null);
        assert_eq!(value["user"]["role"], "customer");
    }

    #[test]
    fn expires_after_seven_days() {
        let tokens = service();
        let token = tokens.issue_at(&customer(), t0()).unwrap();

        let just_before = t0() + Duration::days(7) - Duration::seconds(1);
        assert!(tokens.verify_at(&token, just_before).is_ok());

        let just_after = t0() + Duration::days(7) + Duration::seconds(1);
        assert_eq!(tokens.verify_at(&token, just_after), Err(TokenError::Expired));
    }

    #[test]
    fn rejects_token_signed_with_other_secret() {
        let other = TokenService::with_secret("another-secret-also-longer-than-32-chars").unwrap();
        let token = other.issue(&customer()).unwrap();
        assert_eq!(service().verify(&token), Err(TokenError::InvalidSignature));
    }

    #[test]
    fn rejects_swapped_payload() {
        let tokens = service();
        let original = tokens.issue(&customer()).unwrap();
        let mut admin = customer();
        admin.role = Some(Role::Admin);
        let forged_source = tokens.issue(&admin).unwrap();

        let parts: Vec<&str> = original.split('.').collect();
        let forged_payload = forged_source.split('.').nth(1).unwrap();
        let forged = format!("{}.{}.{}", parts[0], forged_payload, parts[2]);

        assert_eq!(tokens.verify(&forged), Err(TokenError::InvalidSignature));
    }

    #[test]
    fn signature_failure_wins_over_expiry() {
        let other = TokenService::with_secret("another-secret-also-longer-than-32-chars").unwrap();
        let token = other.issue_at(&customer(), t0()).unwrap();
        let later = t0() + Duration::days(30);
        assert_eq!(service().verify_at(&token, later), Err(TokenError::InvalidSignature));
    }

    #[test]
    fn rejects_garbage() {
        assert!(matches!(service().verify("not-a-token"), Err(TokenError::Malformed(_))));
    }

    #[test]
    fn rejects_missing_user_claim() {
        let exp = (Utc::now() + Duration::days(1)).timestamp();
        let token = sign_raw(&json!({ "exp": exp, "iat": 0 }));
        assert!(matches!(service().verify(&token), Err(TokenError::InvalidClaims(_))));
    }

    #[test]
    fn rejects_non_object_user_claim() {
        let exp = (Utc::now() + Duration::days(1)).timestamp();
        let token = sign_raw(&json!({ "user": "ada", "exp": exp }));
        assert!(matches!(service().verify(&token), Err(TokenError::InvalidClaims(_))));
    }

    #[test]
    fn accepts_legacy_null_id_slot() {
        let exp = (Utc::now() + Duration::days(1)).timestamp();
        let token = sign_raw(&json!({
            "user": { "custId": null, "staffId": 3, "name": "Kim", "email": "kim@example.com", "role": "staff" },
            "iat": 0,
            "exp": exp
        }));
        let claims = service().verify(&token).unwrap();
        assert_eq!(claims.user.staff_id, Some(3));
        assert_eq!(claims.user.cust_id, None);
        assert_eq!(claims.user.role, Some(Role::Staff));
    }

    #[test]
    fn unknown_role_string_survives_as_unknown() {
        let exp = (Utc::now() + Duration::days(1)).timestamp();
        let token = sign_raw(&json!({
            "user": { "custId": 1, "staffId": null, "name": "Eve", "email": "eve@example.com", "role": "superuser" },
            "exp": exp
        }));
        assert_eq!(service().verify(&token).unwrap().user.role, Some(Role::Unknown));
    }

    #[test]
    fn requires_a_secret() {
        assert_eq!(TokenService::with_secret("").unwrap_err(), TokenError::MissingSecret);
    }
}
