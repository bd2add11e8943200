use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::ModelError;

pub const DEFAULT_SSH_PORT: u16 = 22;

/// Address book entry for a cluster node reachable over SSH.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeSpec {
    /// Short hostname, used to label results and log lines.
    pub hostname: String,
    /// IP address to connect to. Falls back to `hostname` when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    /// Login user. `None` leaves the choice to the ssh client configuration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Ceph roles hosted on the node (`mon`, `osd`, `client`, ...).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub roles: Vec<String>,
}

fn default_port() -> u16 {
    DEFAULT_SSH_PORT
}

impl NodeSpec {
    pub fn new(hostname: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
            address: None,
            user: None,
            port: DEFAULT_SSH_PORT,
            roles: Vec::new(),
        }
    }

    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.roles.push(role.into());
        self
    }

    /// Host part used for connecting: the address if known, else the hostname.
    pub fn target(&self) -> &str {
        self.address.as_deref().unwrap_or(&self.hostname)
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    /// `user@host` (or bare `host`) as understood by the ssh client.
    pub fn destination(&self) -> String {
        match &self.user {
            Some(user) => format!("{user}@{}", self.target()),
            None => self.target().to_string(),
        }
    }
}

impl FromStr for NodeSpec {
    type Err = ModelError;

    /// Parses `host`, `host:port`, `user@host` and `user@host:port`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim();
        let invalid = |why: &str| ModelError::InvalidNode(s.to_string(), why.to_string());

        let (user, rest) = match raw.split_once('@') {
            Some((user, _)) if user.is_empty() => return Err(invalid("empty user")),
            Some((user, rest)) => (Some(user.to_string()), rest),
            None => (None, raw),
        };

        let (host, port) = match rest.rsplit_once(':') {
            Some((host, port)) => {
                let port = port.parse::<u16>().map_err(|_| invalid("invalid port"))?;
                (host, port)
            }
            None => (rest, DEFAULT_SSH_PORT),
        };
        if host.is_empty() {
            return Err(invalid("empty host"));
        }

        Ok(Self {
            hostname: host.to_string(),
            address: None,
            user,
            port,
            roles: Vec::new(),
        })
    }
}

impl fmt::Display for NodeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.destination(), self.port)
    }
}
