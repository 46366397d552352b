//! Registry authentication.
//!
//! A release run in CI authenticates with the actor identity and the
//! platform's short-lived token; outside CI the local Docker config
//! is consulted, and everything else falls back to anonymous.

use anyhow::Result;
use base64::Engine;
use oci_distribution::secrets::RegistryAuth;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// Docker config file structure (the parts we read)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DockerConfig {
    #[serde(default)]
    pub auths: HashMap<String, DockerAuthEntry>,
}

/// Entry in the Docker config auths section
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DockerAuthEntry {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl DockerAuthEntry {
    /// Decode this entry into registry credentials. An `auth` field is
    /// base64 `user:pass` and takes precedence over the split fields.
    pub fn to_registry_auth(&self) -> RegistryAuth {
        if let Some(auth) = &self.auth {
            if let Ok(decoded) = base64::engine::general_purpose::STANDARD.decode(auth) {
                if let Ok(decoded_str) = String::from_utf8(decoded) {
                    if let Some((user, pass)) = decoded_str.split_once(':') {
                        return RegistryAuth::Basic(user.to_string(), pass.to_string());
                    }
                }
            }
        }

        if let (Some(username), Some(password)) = (&self.username, &self.password) {
            return RegistryAuth::Basic(username.clone(), password.clone());
        }

        RegistryAuth::Anonymous
    }
}

/// Resolve push credentials for a registry host.
pub fn resolve_auth(registry: &str) -> Result<RegistryAuth> {
    if let Some(auth) = auth_from_env() {
        debug!("Using registry credentials from environment");
        return Ok(auth);
    }

    if let Some(auth) = auth_from_docker_config(registry)? {
        debug!("Using registry credentials from Docker config");
        return Ok(auth);
    }

    debug!("No credentials found for {}, using anonymous", registry);
    Ok(RegistryAuth::Anonymous)
}

fn auth_from_env() -> Option<RegistryAuth> {
    let pairs = [
        ("SMSB_REGISTRY_USER", "SMSB_REGISTRY_TOKEN"),
        ("GITHUB_ACTOR", "GITHUB_TOKEN"),
    ];

    for (user_var, token_var) in pairs {
        if let (Ok(user), Ok(token)) = (std::env::var(user_var), std::env::var(token_var)) {
            if !user.is_empty() && !token.is_empty() {
                return Some(RegistryAuth::Basic(user, token));
            }
        }
    }
    None
}

fn auth_from_docker_config(registry: &str) -> Result<Option<RegistryAuth>> {
    let Some(home) = dirs::home_dir() else {
        return Ok(None);
    };
    let config_path = home.join(".docker").join("config.json");
    if !config_path.exists() {
        return Ok(None);
    }

    let content = std::fs::read_to_string(&config_path)?;
    let config: DockerConfig = serde_json::from_str(&content)?;

    // Docker config keys may be bare hosts or full URLs
    let entry = config.auths.iter().find_map(|(key, entry)| {
        let host = key
            .trim_start_matches("https://")
            .trim_start_matches("http://")
            .trim_end_matches('/');
        (host == registry).then_some(entry)
    });

    Ok(entry.map(|e| e.to_registry_auth()))
}
