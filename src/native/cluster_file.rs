//! Cluster file parsing
//!
//! A cluster file holds one connection string:
//!
//! ```text
//! # comments and blank lines are ignored
//! description:id@host:port[,host:port...]
//! ```
//!
//! Coordinators may carry a `:tls` suffix. Errors are engine status codes so
//! they can be reported through the cluster future.

use std::fs;
use std::path::Path;

use super::codes;

/// A coordinator address from the connection string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Coordinator {
    pub host: String,
    pub port: u16,
    pub tls: bool,
}

/// Parsed cluster file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterFile {
    pub description: String,
    pub id: String,
    pub coordinators: Vec<Coordinator>,
}

impl ClusterFile {
    /// Read and parse a cluster file
    pub fn load(path: &Path) -> Result<Self, i32> {
        let contents = fs::read_to_string(path).map_err(|e| {
            tracing::debug!("Cannot read cluster file {}: {}", path.display(), e);
            codes::NO_CLUSTER_FILE_FOUND
        })?;
        Self::parse(&contents)
    }

    /// Parse cluster file contents
    pub fn parse(contents: &str) -> Result<Self, i32> {
        let line = contents
            .lines()
            .map(str::trim)
            .find(|l| !l.is_empty() && !l.starts_with('#'))
            .ok_or(codes::CONNECTION_STRING_INVALID)?;

        let (key, addresses) = line
            .split_once('@')
            .ok_or(codes::CONNECTION_STRING_INVALID)?;
        let (description, id) = key
            .split_once(':')
            .ok_or(codes::CONNECTION_STRING_INVALID)?;

        if !is_token(description, true) || !is_token(id, false) {
            return Err(codes::CONNECTION_STRING_INVALID);
        }

        let coordinators = addresses
            .split(',')
            .map(|a| parse_coordinator(a.trim()))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            description: description.to_string(),
            id: id.to_string(),
            coordinators,
        })
    }

    /// Render back to connection string form
    pub fn connection_string(&self) -> String {
        let addresses: Vec<String> = self
            .coordinators
            .iter()
            .map(|c| {
                if c.tls {
                    format!("{}:{}:tls", c.host, c.port)
                } else {
                    format!("{}:{}", c.host, c.port)
                }
            })
            .collect();
        format!("{}:{}@{}", self.description, self.id, addresses.join(","))
    }
}

fn is_token(s: &str, allow_underscore: bool) -> bool {
    !s.is_empty()
        && s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || (allow_underscore && c == '_'))
}

fn parse_coordinator(address: &str) -> Result<Coordinator, i32> {
    let (address, tls) = match address.strip_suffix(":tls") {
        Some(rest) => (rest, true),
        None => (address, false),
    };

    let (host, port) = address
        .rsplit_once(':')
        .ok_or(codes::CONNECTION_STRING_INVALID)?;
    if host.is_empty() {
        return Err(codes::CONNECTION_STRING_INVALID);
    }
    let port = port
        .parse::<u16>()
        .map_err(|_| codes::CONNECTION_STRING_INVALID)?;

    Ok(Coordinator {
        host: host.to_string(),
        port,
        tls,
    })
}
