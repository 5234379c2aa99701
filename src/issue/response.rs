//! Normalized issue state returned by both adapters

use serde::{Deserialize, Serialize};

/// Canonical two-valued issue status
///
/// Upstream vocabularies differ (`open`/`closed` on GitHub, `opened`/`closed`/
/// `reopened` on GitLab). Everything that is not "closed" counts as open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IssueStatus {
    Open,
    Closed,
}

impl IssueStatus {
    /// Map a provider state string, absent or not, onto the canonical status
    pub fn from_upstream(state: Option<&str>) -> Self {
        match state {
            Some(s) if s.eq_ignore_ascii_case("closed") => Self::Closed,
            _ => Self::Open,
        }
    }
}

impl std::fmt::Display for IssueStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Open => write!(f, "open"),
            Self::Closed => write!(f, "closed"),
        }
    }
}

/// Provider issue state at the moment of the call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueResponse {
    /// GitHub `number` or GitLab `iid`
    pub issue_number: u64,
    pub url: Option<String>,
    pub status: IssueStatus,
}

impl IssueResponse {
    pub fn new(issue_number: u64, url: Option<String>, status: IssueStatus) -> Self {
        Self {
            issue_number,
            url,
            status,
        }
    }
}
