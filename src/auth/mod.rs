use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::ApiError;

/// Roles allowed to create, update or delete members.
pub const MUTATION_ROLES: [&str; 3] = ["MemberEditors", "Deity", "Administrator"];

/// Roles allowed to list another subject's characters.
pub const CHARACTER_LIST_ROLES: [&str; 3] = ["Administrator", "Deity", "MemberEditor"];

/// Identity and role claims attached to a request by the upstream gateway
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    #[serde(default)]
    pub sub: Option<String>,
    #[serde(default, alias = "cognito:username", skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(
        default,
        rename = "cognito:groups",
        alias = "groups",
        deserialize_with = "one_or_many"
    )]
    pub groups: Vec<String>,
    #[serde(default, deserialize_with = "epoch_seconds", skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
}

impl Claims {
    pub fn new(sub: impl Into<String>, groups: &[&str]) -> Self {
        Self {
            sub: Some(sub.into()),
            username: None,
            groups: groups.iter().map(|g| g.to_string()).collect(),
            exp: None,
        }
    }

    /// Build claims from an untyped claim map, as delivered by a gateway authorizer
    pub fn from_value(value: &Value) -> Option<Self> {
        serde_json::from_value(value.clone()).ok()
    }

    pub fn has_any_role(&self, roles: &[&str]) -> bool {
        self.groups.iter().any(|g| roles.contains(&g.as_str()))
    }

    pub fn subject(&self) -> Option<&str> {
        self.sub.as_deref().filter(|s| !s.is_empty())
    }
}

/// Role claims arrive as a single string, an array, or the gateway's "[a b]" form
fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => split_role_string(&s),
        Some(Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s.trim().to_string()),
                _ => None,
            })
            .filter(|s| !s.is_empty())
            .collect(),
        _ => Vec::new(),
    })
}

// REST authorizers stringify every claim, including exp
fn epoch_seconds<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_i64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

fn split_role_string(raw: &str) -> Vec<String> {
    let trimmed = raw.trim();
    match trimmed.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
        Some(inner) => inner
            .split(|c: char| c == ',' || c.is_whitespace())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
        None if trimmed.is_empty() => Vec::new(),
        None => vec![trimmed.to_string()],
    }
}

/// Mutation policy: create/update/delete require one of the editor roles
pub fn authorize_mutation(claims: Option<&Claims>) -> Result<(), ApiError> {
    let claims = claims.ok_or_else(|| ApiError::unauthorized("Authentication required"))?;
    if claims.has_any_role(&MUTATION_ROLES) {
        Ok(())
    } else {
        Err(ApiError::forbidden("Insufficient permissions to modify members"))
    }
}

/// Character-list policy. Returns the subject whose characters may be listed.
pub fn authorize_character_list(
    claims: Option<&Claims>,
    requested: Option<&str>,
) -> Result<String, ApiError> {
    let claims = claims.ok_or_else(|| ApiError::unauthorized("Authentication required"))?;
    let caller = claims
        .subject()
        .ok_or_else(|| ApiError::unauthorized("Token has no subject"))?;

    let requested = requested.map(str::trim).filter(|s| !s.is_empty());
    match requested {
        None => Ok(caller.to_string()),
        Some(sub) if sub == caller => Ok(caller.to_string()),
        Some(sub) if claims.has_any_role(&CHARACTER_LIST_ROLES) => Ok(sub.to_string()),
        Some(_) => Err(ApiError::forbidden(
            "Insufficient permissions to view another user's characters",
        )),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    #[error("JWT generation error: {0}")]
    TokenGeneration(String),
    #[error("Invalid JWT token: {0}")]
    InvalidToken(String),
    #[error("JWT secret not configured")]
    MissingSecret,
}

/// Sign claims with an HMAC secret
pub fn generate_jwt(claims: &Claims, secret: &str) -> Result<String, JwtError> {
    if secret.is_empty() {
        return Err(JwtError::MissingSecret);
    }

    let encoding_key = EncodingKey::from_secret(secret.as_bytes());
    encode(&Header::default(), claims, &encoding_key)
        .map_err(|e| JwtError::TokenGeneration(e.to_string()))
}

/// Decode a bearer token. With `verify` off the signature is trusted as already
/// checked by the gateway in front of us.
pub fn decode_jwt(token: &str, secret: Option<&str>, verify: bool) -> Result<Claims, JwtError> {
    let mut validation = Validation::default();
    validation.required_spec_claims.clear();
    validation.validate_exp = verify;
    validation.validate_aud = false;

    let key = if verify {
        let secret = secret.filter(|s| !s.is_empty()).ok_or(JwtError::MissingSecret)?;
        DecodingKey::from_secret(secret.as_bytes())
    } else {
        validation.insecure_disable_signature_validation();
        DecodingKey::from_secret(&[])
    };

    decode::<Claims>(token, &key, &validation)
        .map(|data| data.claims)
        .map_err(|e| JwtError::InvalidToken(e.to_string()))
}
