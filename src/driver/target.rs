use serde::{Deserialize, Serialize};
use std::{fmt, time::Duration};

/// One addressed meter plus its credentials. The gateway never looks inside
/// `credentials`; they go to the driver as-is.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    pub address: String,
    pub port: u16,
    #[serde(default)]
    pub credentials: Credentials,
}

impl Target {
    pub fn new(address: impl Into<String>, port: u16) -> Self {
        Self {
            address: address.into(),
            port,
            credentials: Credentials::default(),
        }
    }

    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = credentials;
        self
    }

    pub fn id(&self) -> TargetId {
        TargetId::new(&self.address, self.port)
    }
}

/// Association credentials for a meter. Hex strings are kept exactly as supplied.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Credentials {
    pub auth_password: String,
    pub system_title: String,
    pub block_cipher_key: String,
    pub authentication_key: String,
    pub client_address: u16,
    pub server_address: u16,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn redact(s: &str) -> &'static str {
            if s.is_empty() {
                ""
            } else {
                "<redacted>"
            }
        }
        f.debug_struct("Credentials")
            .field("auth_password", &redact(&self.auth_password))
            .field("system_title", &self.system_title)
            .field("block_cipher_key", &redact(&self.block_cipher_key))
            .field("authentication_key", &redact(&self.authentication_key))
            .field("client_address", &self.client_address)
            .field("server_address", &self.server_address)
            .finish()
    }
}

/// Identity of a target within a batch: `address:port`, with IPv6 literals bracketed.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TargetId(String);

impl TargetId {
    pub fn new(address: &str, port: u16) -> Self {
        if address.contains(':') && !address.starts_with('[') {
            TargetId(format!("[{}]:{}", address, port))
        } else {
            TargetId(format!("{}:{}", address, port))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Connection knobs forwarded to the driver untouched. Retrying and timing out
/// are the driver's job; the gateway only carries the numbers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionOptions {
    pub retries: u32,
    pub retry_delay_secs: u64,
    pub connection_timeout_secs: u64,
    /// Profile entries to request per read; 0 lets the driver decide.
    pub max_entries: u32,
}

impl ConnectionOptions {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }

    pub fn connection_timeout(&self) -> Duration {
        Duration::from_secs(self.connection_timeout_secs)
    }
}

impl Default for ConnectionOptions {
    fn default() -> Self {
        Self {
            retries: 3,
            retry_delay_secs: 5,
            connection_timeout_secs: 60,
            max_entries: 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ipv6_ids_are_bracketed() {
        let t = Target::new("2401:4900:833f:2688::2", 4059);
        assert_eq!(t.id().as_str(), "[2401:4900:833f:2688::2]:4059");
        assert_eq!(Target::new("10.0.0.7", 4059).id().to_string(), "10.0.0.7:4059");
    }

    #[test]
    fn debug_hides_keys() {
        let creds = Credentials {
            auth_password: "0000000000000000".into(),
            system_title: "6162636465666768".into(),
            block_cipher_key: "49423031494230324942303349423034".into(),
            authentication_key: "49423031494230324942303349423034".into(),
            client_address: 48,
            server_address: 1,
        };
        let rendered = format!("{:?}", creds);
        assert!(!rendered.contains("4942303149423032"));
        assert!(rendered.contains("6162636465666768"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn targets_deserialize_without_credentials() {
        let t: Target = serde_yaml::from_str("address: 192.168.1.100\nport: 4059\n").unwrap();
        assert_eq!(t.credentials, Credentials::default());
        assert_eq!(t.port, 4059);
    }
}
