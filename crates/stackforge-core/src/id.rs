//! Name newtypes for the construct tree.
//!
//! Cross-stack coupling is by name, never by object reference: a deploy
//! action holds a `StackName` value, so the dependent stack can only be
//! built after the target stack's name is known.

use derive_more::Display;
use serde::{Deserialize, Serialize};

/// The name of a deployable stack. Unique within an [`crate::App`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[display("{_0}")]
pub struct StackName(String);

impl StackName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// File name of the synthesized template for this stack.
    pub fn template_file_name(&self) -> String {
        format!("{}.template.json", self.0)
    }
}

impl From<&str> for StackName {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

/// Logical id of a resource within a stack's template.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display)]
#[display("{_0}")]
pub struct LogicalId(String);

impl LogicalId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Derive a child id, e.g. the service role of a build project.
    pub fn child(&self, suffix: &str) -> LogicalId {
        LogicalId(format!("{}{}", self.0, suffix))
    }
}

impl From<&str> for LogicalId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Name of a pipeline artifact handed off between stages.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[display("{_0}")]
pub struct ArtifactName(String);

impl ArtifactName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ArtifactName {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}
