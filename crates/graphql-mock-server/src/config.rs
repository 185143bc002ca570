//! Configuration for the standalone mock server.
//!
//! A YAML file lists the mocks to register at startup plus listener settings.

use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::Path;

use crate::entities::{MockDefinition, MockRegistry};
use crate::error::HarnessError;
use crate::use_cases::register_mock;

/// Port the standalone server listens on unless told otherwise.
pub const DEFAULT_PORT: u16 = 7332;

/// Example configuration printed by `--print-config`.
pub const EXAMPLE_CONFIG: &str = r#"settings:
  host: 127.0.0.1
  port: 7332

mocks:
  # Matches this query with any variables, once.
  - request:
      query: "{ posts { title } }"
    response:
      data:
        posts:
          - title: Hello World

  # Matches only these variables; `count: ~` allows unlimited matches.
  - request:
      query: "query Post($id: ID!) { post(id: $id) { title } }"
      variables:
        id: "1"
    response:
      data:
        post:
          title: Hello World
      count: ~

  # Answers successive matches in order.
  - request:
      query: "{ counter }"
    response:
      - data: { counter: 1 }
      - data: { counter: 2 }
"#;

/// Main configuration for the mock server.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct MockServerConfig {
    /// Listener settings
    #[serde(default)]
    pub settings: ServerSettings,

    /// Mocks registered at startup
    #[serde(default)]
    pub mocks: Vec<MockDefinition>,
}

impl MockServerConfig {
    /// Load and validate configuration from a YAML file.
    pub fn from_file(path: &Path) -> Result<Self, HarnessError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse and validate configuration from YAML text.
    pub fn from_yaml(yaml: &str) -> Result<Self, HarnessError> {
        let config: Self = serde_yaml::from_str(yaml)
            .map_err(|e| HarnessError::ConfigurationError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check every mock against the registration rules, duplicates included.
    pub fn validate(&self) -> Result<(), HarnessError> {
        let mut scratch = MockRegistry::new();
        for (i, mock) in self.mocks.iter().enumerate() {
            register_mock(&mut scratch, mock.request.clone(), mock.response.clone())
                .map_err(|e| HarnessError::ConfigurationError(format!("Mock {}: {}", i, e)))?;
        }
        Ok(())
    }
}

/// Listener settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: IpAddr,

    /// 0 lets the OS pick a free port
    #[serde(default = "default_port")]
    pub port: u16,
}

impl ServerSettings {
    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::LOCALHOST)
}

fn default_port() -> u16 {
    DEFAULT_PORT
}
