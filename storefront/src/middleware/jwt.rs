//! JWT authentication middleware

use std::{fs, sync::Arc};

use axum::{
    body::Body,
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};

use super::token::{extract_token, Claims, TokenValidator};
use crate::{config::JwtConfig, error::Error};

/// Paths served without a token
const PUBLIC_PATHS: &[&str] = &["/health", "/ready"];

/// JWT authentication middleware state
#[derive(Clone)]
pub struct JwtAuth {
    decoding_key: Arc<DecodingKey>,
    validation: Validation,
}

impl JwtAuth {
    /// Create the middleware from the configured key file
    pub fn new(config: &JwtConfig) -> Result<Self, Error> {
        let key = fs::read(&config.key_path).map_err(|e| {
            let path_display = config.key_path.display().to_string();
            Error::Config(Box::new(figment::Error::from(format!(
                "Failed to read JWT key from path '{}'\n\n\
                Troubleshooting:\n\
                1. Verify the file exists: ls -la {}\n\
                2. Check file permissions (must be readable)\n\
                3. For RS*/ES*: use a PEM format public key\n\
                4. For HS*: use a raw secret file\n\n\
                Error: {}",
                path_display, path_display, e
            ))))
        })?;

        let algorithm = parse_algorithm(&config.algorithm)?;

        let decoding_key = match algorithm {
            Algorithm::RS256 | Algorithm::RS384 | Algorithm::RS512 => {
                DecodingKey::from_rsa_pem(&key)?
            }
            Algorithm::ES256 | Algorithm::ES384 => DecodingKey::from_ec_pem(&key)?,
            _ => DecodingKey::from_secret(&key),
        };

        let mut validation = Validation::new(algorithm);
        if let Some(issuer) = &config.issuer {
            validation.set_issuer(&[issuer]);
        }
        if let Some(audience) = &config.audience {
            validation.set_audience(&[audience]);
        }

        tracing::debug!(algorithm = ?algorithm, "JWT validation configured");

        Ok(Self {
            decoding_key: Arc::new(decoding_key),
            validation,
        })
    }

    /// Validate the bearer token and inject its claims
    pub async fn middleware(
        State(auth): State<Self>,
        mut request: Request<Body>,
        next: Next,
    ) -> Result<Response, Error> {
        if PUBLIC_PATHS.contains(&request.uri().path()) {
            return Ok(next.run(request).await);
        }

        let token = extract_token(request.headers())?;
        let claims = auth.validate_token(&token).map_err(|e| {
            tracing::debug!(error = %e, "Rejected bearer token");
            e
        })?;

        request.extensions_mut().insert(claims);

        Ok(next.run(request).await)
    }
}

impl TokenValidator for JwtAuth {
    fn validate_token(&self, token: &str) -> Result<Claims, Error> {
        let token_data = decode::<Claims>(token, &self.decoding_key, &self.validation)?;
        Ok(token_data.claims)
    }
}

fn parse_algorithm(name: &str) -> Result<Algorithm, Error> {
    match name.to_uppercase().as_str() {
        "RS256" => Ok(Algorithm::RS256),
        "RS384" => Ok(Algorithm::RS384),
        "RS512" => Ok(Algorithm::RS512),
        "ES256" => Ok(Algorithm::ES256),
        "ES384" => Ok(Algorithm::ES384),
        "HS256" => Ok(Algorithm::HS256),
        "HS384" => Ok(Algorithm::HS384),
        "HS512" => Ok(Algorithm::HS512),
        alg => Err(Error::Config(Box::new(figment::Error::from(format!(
            "Unsupported JWT algorithm: {}",
            alg
        ))))),
    }
}
