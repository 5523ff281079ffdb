use axum::http::HeaderMap;

use crate::auth::{decode_jwt, Claims};
use crate::config::SecurityConfig;

/// Extract the bearer token from the Authorization header
pub fn extract_bearer_token(headers: &HeaderMap) -> Result<String, String> {
    let auth_header = headers
        .get("authorization")
        .ok_or_else(|| "Missing Authorization header".to_string())?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| "Invalid Authorization header format".to_string())?;

    if let Some(token) = auth_str.strip_prefix("Bearer ") {
        if token.trim().is_empty() {
            return Err("Empty JWT token".to_string());
        }
        Ok(token.trim().to_string())
    } else {
        Err("Authorization header must use Bearer token format".to_string())
    }
}

/// Claims attached to a plain HTTP request. A missing or undecodable token
/// yields no claims; the route's authorization policy decides what that means.
pub fn claims_from_headers(headers: &HeaderMap, security: &SecurityConfig) -> Option<Claims> {
    let token = match extract_bearer_token(headers) {
        Ok(token) => token,
        Err(reason) => {
            tracing::trace!("No bearer claims: {}", reason);
            return None;
        }
    };

    match decode_jwt(&token, security.jwt_secret.as_deref(), security.verify_jwt) {
        Ok(claims) => Some(claims),
        Err(err) => {
            tracing::debug!("Rejected bearer token: {}", err);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::generate_jwt;
    use axum::http::HeaderValue;

    fn security(verify: bool) -> SecurityConfig {
        SecurityConfig {
            cors_origin: "*".into(),
            jwt_secret: Some("secret".into()),
            verify_jwt: verify,
        }
    }

    #[test]
    fn bearer_prefix_is_required() {
        let mut headers = HeaderMap::new();
        assert!(extract_bearer_token(&headers).is_err());

        headers.insert("authorization", HeaderValue::from_static("Basic abc"));
        assert!(extract_bearer_token(&headers).is_err());

        headers.insert("authorization", HeaderValue::from_static("Bearer abc.def.ghi"));
        assert_eq!(extract_bearer_token(&headers).unwrap(), "abc.def.ghi");
    }

    #[test]
    fn verified_token_yields_claims() {
        let token = generate_jwt(&Claims::new("user-1", &["Administrator"]), "secret").unwrap();
        let mut headers = HeaderMap::new();
        headers.insert(
            "authorization",
            HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
        );

        let claims = claims_from_headers(&headers, &security(true)).unwrap();
        assert_eq!(claims.subject(), Some("user-1"));
        assert!(claims.has_any_role(&["Administrator"]));
    }

    #[test]
    fn wrong_signature_yields_no_claims_when_verifying() {
        let token = generate_jwt(&Claims::new("user-1", &["Administrator"]), "other").unwrap();
        let mut headers = HeaderMap::new();
        headers.insert(
            "authorization",
            HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
        );

        assert!(claims_from_headers(&headers, &security(true)).is_none());
        assert!(claims_from_headers(&headers, &security(false)).is_some());
    }
}
