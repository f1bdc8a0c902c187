//! Bearer token claims and extraction

use axum::http::{header::AUTHORIZATION, HeaderMap};
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Claims carried by an access token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: a user id, optionally prefixed with `user:`
    pub sub: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    /// Roles, expanded into permissions by the role policy
    #[serde(default)]
    pub roles: Vec<String>,

    /// Permissions granted directly
    #[serde(default)]
    pub perms: Vec<String>,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Issued at (Unix timestamp)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,

    /// Token ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub aud: Option<String>,
}

impl Claims {
    pub fn has_permission(&self, perm: &str) -> bool {
        self.perms.iter().any(|p| p == perm)
    }

    /// Id of the user this token was issued to
    pub fn subject_id(&self) -> &str {
        self.sub.strip_prefix("user:").unwrap_or(&self.sub)
    }
}

/// Validates a raw token into claims
pub trait TokenValidator: Send + Sync + Clone {
    fn validate_token(&self, token: &str) -> Result<Claims, Error>;
}

/// Extract token from Authorization header (Bearer scheme)
pub fn extract_token(headers: &HeaderMap) -> Result<String, Error> {
    let auth_header = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| Error::Unauthorized("Please authenticate".to_string()))?;

    match auth_header.strip_prefix("Bearer ") {
        Some(token) if !token.trim().is_empty() => Ok(token.trim().to_string()),
        _ => Err(Error::Unauthorized(
            "Invalid Authorization header format".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(sub: &str) -> Claims {
        Claims {
            sub: sub.to_string(),
            email: None,
            username: None,
            roles: vec!["user".to_string()],
            perms: vec!["getProducts".to_string()],
            exp: 0,
            iat: None,
            jti: None,
            iss: None,
            aud: None,
        }
    }

    #[test]
    fn test_subject_id() {
        assert_eq!(claims("user:0190").subject_id(), "0190");
        assert_eq!(claims("0190").subject_id(), "0190");
    }

    #[test]
    fn test_role_and_permission_checks() {
        let claims = claims("user:1");
        assert_eq!(claims.roles, vec!["user".to_string()]);
        assert!(claims.has_permission("getProducts"));
        assert!(!claims.has_permission("manageProducts"));
    }

    #[test]
    fn test_extract_token() {
        let mut headers = HeaderMap::new();
        assert!(matches!(extract_token(&headers), Err(Error::Unauthorized(_))));

        headers.insert(AUTHORIZATION, "Basic abc".parse().unwrap());
        assert!(extract_token(&headers).is_err());

        headers.insert(AUTHORIZATION, "Bearer ".parse().unwrap());
        assert!(extract_token(&headers).is_err());

        headers.insert(AUTHORIZATION, "Bearer abc.def.ghi".parse().unwrap());
        assert_eq!(extract_token(&headers).unwrap(), "abc.def.ghi");
    }
}
