// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! Configuration for the manager service.
//!
//! Everything comes from environment variables. `TB_ALLOW_ORIGINS` is
//! required; a missing or inconsistent auth configuration is a startup
//! failure (the process exits non-zero). An unreachable broker is not.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};

/// Default bind address for the HTTP server.
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:1323";

/// Default broker endpoint.
pub const DEFAULT_SPIDER_REST_URL: &str = "http://localhost:1024/spider";

/// Authentication mode, delegated to middleware; the service only
/// validates that the configuration is coherent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthConfig {
    Disabled,
    Basic { username: String, password: String },
    Jwt { iam_manager_url: String },
}

impl AuthConfig {
    /// Build from the raw TB_AUTH_* variables.
    pub fn from_parts(
        enabled: Option<&str>,
        mode: Option<&str>,
        username: Option<&str>,
        password: Option<&str>,
        iam_url: Option<&str>,
    ) -> Result<Self> {
        // only the exact string "true" enables auth (typos such as
        // "ture" read as disabled)
        if enabled != Some("true") {
            return Ok(AuthConfig::Disabled);
        }
        match mode {
            Some("basic") => {
                let username = username
                    .filter(|s| !s.is_empty())
                    .context("TB_API_USERNAME is required in basic auth mode")?;
                let password = password
                    .filter(|s| !s.is_empty())
                    .context("TB_API_PASSWORD is required in basic auth mode")?;
                Ok(AuthConfig::Basic {
                    username: username.to_string(),
                    password: password.to_string(),
                })
            }
            Some("jwt") => {
                let iam_url = iam_url
                    .filter(|s| !s.is_empty())
                    .context("TB_IAM_MANAGER_REST_URL is required in jwt auth mode")?;
                Ok(AuthConfig::Jwt {
                    iam_manager_url: iam_url.to_string(),
                })
            }
            other => bail!(
                "TB_AUTH_MODE is not set properly (got {other:?}); set it to 'basic' or 'jwt'"
            ),
        }
    }
}

/// Manager configuration.
#[derive(Debug, Clone)]
pub struct ManagerConfig {
    pub bind_address: SocketAddr,
    /// Broker (cloud-abstraction service) endpoint
    pub spider_rest_url: String,
    /// Directory holding the durable store snapshot
    pub store_dir: PathBuf,
    /// CORS whitelist; required
    pub allow_origins: String,
    pub auth: AuthConfig,
    /// Advertised endpoint, banner only
    pub self_endpoint: String,
    /// Deadline for the MCI live-status fan-out
    pub mci_status_deadline: Duration,
}

impl ManagerConfig {
    /// Load configuration from the environment.
    pub fn from_env() -> Result<Self> {
        let bind_address = std::env::var("TB_BIND_ADDRESS")
            .unwrap_or_else(|_| DEFAULT_BIND_ADDRESS.to_string())
            .parse()
            .context("Invalid TB_BIND_ADDRESS")?;

        let spider_rest_url = std::env::var("TB_SPIDER_REST_URL")
            .unwrap_or_else(|_| DEFAULT_SPIDER_REST_URL.to_string());

        let store_dir = std::env::var("TB_STORE_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("meta"));

        let allow_origins = std::env::var("TB_ALLOW_ORIGINS").ok().filter(|s| !s.is_empty()).context(
            "TB_ALLOW_ORIGINS env variable for CORS is unset; provide a proper value and restart",
        )?;

        let auth = AuthConfig::from_parts(
            std::env::var("TB_AUTH_ENABLED").ok().as_deref(),
            std::env::var("TB_AUTH_MODE").ok().as_deref(),
            std::env::var("TB_API_USERNAME").ok().as_deref(),
            std::env::var("TB_API_PASSWORD").ok().as_deref(),
            std::env::var("TB_IAM_MANAGER_REST_URL").ok().as_deref(),
        )?;

        let self_endpoint = std::env::var("TB_SELF_ENDPOINT").unwrap_or_default();

        Ok(Self {
            bind_address,
            spider_rest_url,
            store_dir,
            allow_origins,
            auth,
            self_endpoint,
            mci_status_deadline: Duration::from_secs(60),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // from_env() is not tested directly: std::env::set_var is unsafe to
    // race against other test threads. The parsing logic lives in
    // AuthConfig::from_parts, which is testable in isolation.

    #[test]
    fn auth_disabled_unless_exactly_true() {
        for v in [None, Some("false"), Some("ture"), Some("TRUE"), Some("1")] {
            assert_eq!(
                AuthConfig::from_parts(v, Some("basic"), Some("u"), Some("p"), None).unwrap(),
                AuthConfig::Disabled
            );
        }
    }

    #[test]
    fn basic_mode_requires_credentials() {
        let ok = AuthConfig::from_parts(Some("true"), Some("basic"), Some("u"), Some("p"), None)
            .unwrap();
        assert_eq!(
            ok,
            AuthConfig::Basic {
                username: "u".into(),
                password: "p".into()
            }
        );
        assert!(AuthConfig::from_parts(Some("true"), Some("basic"), None, Some("p"), None).is_err());
        assert!(
            AuthConfig::from_parts(Some("true"), Some("basic"), Some("u"), Some(""), None).is_err()
        );
    }

    #[test]
    fn jwt_mode_requires_iam_url() {
        let ok = AuthConfig::from_parts(Some("true"), Some("jwt"), None, None, Some("http://iam"))
            .unwrap();
        assert_eq!(
            ok,
            AuthConfig::Jwt {
                iam_manager_url: "http://iam".into()
            }
        );
        assert!(AuthConfig::from_parts(Some("true"), Some("jwt"), None, None, None).is_err());
    }

    #[test]
    fn unknown_mode_is_fatal() {
        assert!(AuthConfig::from_parts(Some("true"), Some("oauth"), None, None, None).is_err());
        assert!(AuthConfig::from_parts(Some("true"), None, None, None, None).is_err());
    }
}
