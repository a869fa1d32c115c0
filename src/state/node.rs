/// Node identity and per-node crawl status
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The two sides of the stargazer graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    User,
    Repo,
}

impl NodeKind {
    /// Infers the kind from identifier shape: repositories are `owner/name`
    pub fn of_identifier(id: &str) -> Self {
        if id.contains('/') {
            Self::Repo
        } else {
            Self::User
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Repo => "repo",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Crawl status of a single node, keyed by its identifier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeStatus {
    #[serde(rename = "type")]
    pub kind: NodeKind,

    /// `None` means the node has never been crawled
    pub last_pulled: Option<DateTime<Utc>>,

    pub had_error: bool,
}

impl NodeStatus {
    /// Status for a node that was just discovered and never crawled
    pub fn discovered(kind: NodeKind) -> Self {
        Self {
            kind,
            last_pulled: None,
            had_error: false,
        }
    }

    pub fn pulled(kind: NodeKind, at: DateTime<Utc>) -> Self {
        Self {
            kind,
            last_pulled: Some(at),
            had_error: false,
        }
    }

    pub fn failed(kind: NodeKind, at: DateTime<Utc>) -> Self {
        Self {
            kind,
            last_pulled: Some(at),
            had_error: true,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.last_pulled.is_none() && !self.had_error
    }
}
