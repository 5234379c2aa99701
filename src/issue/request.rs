//! Issue create/update request

use crate::{Result, TrackerError};
use serde::{Deserialize, Serialize};

/// Title and description for a create or update call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueRequest {
    pub title: String,
    /// May be empty, but must be present
    pub description: String,
}

impl IssueRequest {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
        }
    }

    /// Reject requests the upstream APIs would refuse anyway
    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(TrackerError::Validation(
                "title must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
