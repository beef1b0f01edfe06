/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

use std::{fmt, time::Duration};

use serde::Deserialize;

use crate::{
    net::{BasicCredentials, OAuthCredentials, OFFICE365_ENDPOINT},
    service::{ExchangeService, DEFAULT_TIMEOUT},
    version::ExchangeVersion,
    Error,
};

/// Settings for connecting to an EWS endpoint, usually read from a TOML
/// file such as:
///
/// ```toml
/// endpoint = "https://mail.example.com/EWS/Exchange.asmx"
/// version = "Exchange2010_SP1"
/// timeout_secs = 30
///
/// [credentials]
/// type = "basic"
/// username = "alice@example.com"
/// password = "hunter2"
/// ```
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    #[serde(default)]
    pub version: ExchangeVersion,

    #[serde(default)]
    pub credentials: Option<CredentialsConfig>,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Clone, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum CredentialsConfig {
    Basic { username: String, password: String },
    OAuth { token: String },
}

impl fmt::Debug for CredentialsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .finish_non_exhaustive(),
            Self::OAuth { .. } => f.debug_struct("OAuth").finish_non_exhaustive(),
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            version: ExchangeVersion::default(),
            credentials: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl ServiceConfig {
    pub fn from_toml(contents: &str) -> Result<Self, Error> {
        Ok(toml::from_str(contents)?)
    }

    /// Builds a service talking to the configured endpoint over HTTPS.
    pub fn into_service(self) -> Result<ExchangeService, Error> {
        let builder = ExchangeService::builder()
            .url(self.endpoint)
            .version(self.version)
            .timeout(Duration::from_secs(self.timeout_secs));

        let builder = match self.credentials {
            Some(CredentialsConfig::Basic { username, password }) => {
                builder.credentials(BasicCredentials::new(username, password))
            }
            Some(CredentialsConfig::OAuth { token }) => builder.credentials(OAuthCredentials::new(token)),
            None => builder,
        };

        builder.build()
    }
}

fn default_endpoint() -> String {
    String::from(OFFICE365_ENDPOINT)
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT.as_secs()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn omitted_settings_take_defaults() {
        let config = ServiceConfig::from_toml("").unwrap();

        assert_eq!(config.endpoint, OFFICE365_ENDPOINT);
        assert_eq!(config.version, ExchangeVersion::Exchange2013);
        assert_eq!(config.timeout_secs, 100);
        assert!(config.credentials.is_none());
    }

    #[test]
    fn full_config_is_read() {
        let config = ServiceConfig::from_toml(
            r#"
            endpoint = "https://mail.example.com/EWS/Exchange.asmx"
            version = "Exchange2010_SP1"
            timeout_secs = 30

            [credentials]
            type = "oauth"
            token = "eyJ0eXAi"
            "#,
        )
        .unwrap();

        assert_eq!(config.version, ExchangeVersion::Exchange2010Sp1);
        assert!(matches!(config.credentials, Some(CredentialsConfig::OAuth { .. })));

        let service = config.into_service().unwrap();
        assert_eq!(service.url(), "https://mail.example.com/EWS/Exchange.asmx");
        assert_eq!(service.version(), ExchangeVersion::Exchange2010Sp1);
    }

    #[test]
    fn unknown_versions_are_rejected() {
        let error = ServiceConfig::from_toml(r#"version = "Exchange2003""#).unwrap_err();
        assert!(matches!(error, Error::Config(_)));
    }

    #[test]
    fn passwords_are_not_printed() {
        let config = ServiceConfig::from_toml(
            r#"
            [credentials]
            type = "basic"
            username = "alice@example.com"
            password = "hunter2"
            "#,
        )
        .unwrap();

        let printed = format!("{config:?}");
        assert!(printed.contains("alice@example.com"));
        assert!(!printed.contains("hunter2"));
    }
}
