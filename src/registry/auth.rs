//! Anonymous bearer-token negotiation
//!
//! Registries that guard pulls answer the first request with 401 and a
//! `WWW-Authenticate: Bearer` challenge. Pulling public images needs no
//! credentials; requesting the challenge's token endpoint without them
//! yields a short-lived anonymous token.

use crate::error::{PackerError, Result};
use crate::output::OutputManager;
use serde::Deserialize;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthChallenge {
    pub realm: String,
    pub service: Option<String>,
    pub scope: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    token: Option<String>,
    access_token: Option<String>,
}

/// Parse a `Bearer realm="...",service="...",scope="..."` challenge header
pub fn parse_challenge(auth_header: &str) -> Option<AuthChallenge> {
    let params_str = auth_header.strip_prefix("Bearer ")?;
    let mut params = HashMap::new();

    for param in params_str.split(',') {
        let param = param.trim();
        if let Some(eq_pos) = param.find('=') {
            let key = param[..eq_pos].trim();
            let value = param[eq_pos + 1..].trim().trim_matches('"');
            params.insert(key, value);
        }
    }

    params.get("realm").map(|realm| AuthChallenge {
        realm: realm.to_string(),
        service: params.get("service").map(|s| s.to_string()),
        scope: params.get("scope").map(|s| s.to_string()),
    })
}

/// Request an anonymous token for the challenge's realm/service/scope
pub async fn anonymous_token(
    client: &reqwest::Client,
    challenge: &AuthChallenge,
    output: &OutputManager,
) -> Result<String> {
    let mut params = Vec::new();
    if let Some(service) = &challenge.service {
        params.push(format!("service={}", service));
    }
    if let Some(scope) = &challenge.scope {
        params.push(format!("scope={}", scope));
    }
    let url = if params.is_empty() {
        challenge.realm.clone()
    } else {
        format!("{}?{}", challenge.realm, params.join("&"))
    };

    output.detail(&format!("Requesting anonymous token from {}", challenge.realm));

    let response = client
        .get(&url)
        .send()
        .await
        .map_err(|e| PackerError::Store(format!("Failed to request registry token: {}", e)))?;

    if !response.status().is_success() {
        return Err(PackerError::Store(format!(
            "Registry token request failed with status {}",
            response.status()
        )));
    }

    let token_response: TokenResponse = response
        .json()
        .await
        .map_err(|e| PackerError::Parse(format!("Failed to parse token response: {}", e)))?;

    token_response
        .token
        .or(token_response.access_token)
        .ok_or_else(|| PackerError::Store("Registry token response carried no token".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_bearer_challenge() {
        let challenge = parse_challenge(
            "Bearer realm=\"https://auth.docker.io/token\",service=\"registry.docker.io\",scope=\"repository:library/busybox:pull\"",
        )
        .unwrap();
        assert_eq!(challenge.realm, "https://auth.docker.io/token");
        assert_eq!(challenge.service.as_deref(), Some("registry.docker.io"));
        assert_eq!(
            challenge.scope.as_deref(),
            Some("repository:library/busybox:pull")
        );
    }

    #[test]
    fn test_parse_challenge_without_scope() {
        let challenge = parse_challenge("Bearer realm=\"https://r.example/token\"").unwrap();
        assert_eq!(challenge.realm, "https://r.example/token");
        assert_eq!(challenge.service, None);
        assert_eq!(challenge.scope, None);
    }

    #[test]
    fn test_parse_challenge_rejects_non_bearer() {
        assert!(parse_challenge("Basic realm=\"registry\"").is_none());
        assert!(parse_challenge("Bearer service=\"no-realm\"").is_none());
    }
}
