//! Stack, resource and template types.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::{Error, LogicalId, Result, StackName};

/// What happens to a resource when its stack is deprovisioned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RemovalPolicy {
    /// Delete the resource with the stack.
    Destroy,
    /// Keep the resource after the stack is gone.
    Retain,
}

impl RemovalPolicy {
    /// CloudFormation `DeletionPolicy` attribute value.
    pub fn deletion_policy(&self) -> &'static str {
        match self {
            RemovalPolicy::Destroy => "Delete",
            RemovalPolicy::Retain => "Retain",
        }
    }
}

impl std::fmt::Display for RemovalPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RemovalPolicy::Destroy => write!(f, "destroy"),
            RemovalPolicy::Retain => write!(f, "retain"),
        }
    }
}

/// A single declared resource: a CloudFormation type plus its properties.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resource {
    /// Provider type, e.g. `AWS::Lambda::Function`.
    #[serde(rename = "Type")]
    pub resource_type: String,
    /// Provider-specific properties.
    #[serde(rename = "Properties")]
    pub properties: serde_json::Value,
    /// Optional deletion policy attribute.
    #[serde(rename = "DeletionPolicy", skip_serializing_if = "Option::is_none")]
    pub deletion_policy: Option<String>,
    /// Logical ids this resource must be created after.
    #[serde(rename = "DependsOn", skip_serializing_if = "Vec::is_empty", default)]
    pub depends_on: Vec<LogicalId>,
}

impl Resource {
    pub fn new(resource_type: impl Into<String>, properties: serde_json::Value) -> Self {
        Self {
            resource_type: resource_type.into(),
            properties,
            deletion_policy: None,
            depends_on: Vec::new(),
        }
    }

    pub fn with_removal_policy(mut self, policy: RemovalPolicy) -> Self {
        self.deletion_policy = Some(policy.deletion_policy().to_string());
        self
    }

    pub fn depends_on(mut self, id: LogicalId) -> Self {
        self.depends_on.push(id);
        self
    }
}

/// The synthesized, machine-readable description of one stack.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Template {
    #[serde(rename = "AWSTemplateFormatVersion")]
    pub format_version: String,
    #[serde(rename = "Description", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "Resources")]
    pub resources: BTreeMap<LogicalId, Resource>,
}

impl Template {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// The seam between provider descriptors and the stack they land in.
///
/// A construct may render more than one resource (a build project brings
/// its service role along). Validation runs before any resource is added.
pub trait Construct {
    /// Check construct-local invariants.
    fn validate(&self) -> Result<()> {
        Ok(())
    }

    /// Render the resources this construct declares.
    fn render(&self) -> Vec<(LogicalId, Resource)>;
}

/// A named, independently deployable unit of infrastructure.
///
/// Immutable once registered with an [`crate::App`]; until then, constructs
/// are added one at a time and logical ids must be unique.
#[derive(Debug, Clone)]
pub struct Stack {
    name: StackName,
    description: Option<String>,
    resources: BTreeMap<LogicalId, Resource>,
}

impl Stack {
    pub fn new(name: impl Into<StackName>) -> Self {
        Self {
            name: name.into(),
            description: None,
            resources: BTreeMap::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn name(&self) -> &StackName {
        &self.name
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Validate and add a construct's resources to this stack.
    pub fn add(&mut self, construct: &impl Construct) -> Result<()> {
        construct.validate()?;
        for (logical_id, resource) in construct.render() {
            self.add_resource(logical_id, resource)?;
        }
        Ok(())
    }

    /// Add a single rendered resource under a unique logical id.
    pub fn add_resource(&mut self, logical_id: LogicalId, resource: Resource) -> Result<()> {
        if self.resources.contains_key(&logical_id) {
            return Err(Error::DuplicateLogicalId {
                stack: self.name.to_string(),
                logical_id: logical_id.to_string(),
            });
        }
        self.resources.insert(logical_id, resource);
        Ok(())
    }

    /// Render this stack to its template document.
    pub fn template(&self) -> Template {
        Template {
            format_version: "2010-09-09".to_string(),
            description: self.description.clone(),
            resources: self.resources.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct TestBucket;

    impl Construct for TestBucket {
        fn render(&self) -> Vec<(LogicalId, Resource)> {
            vec![(
                LogicalId::new("Bucket"),
                Resource::new("AWS::S3::Bucket", json!({})),
            )]
        }
    }

    #[test]
    fn duplicate_logical_id_is_rejected() {
        let mut stack = Stack::new("Test");
        stack.add(&TestBucket).unwrap();
        let err = stack.add(&TestBucket).unwrap_err();
        assert!(matches!(err, Error::DuplicateLogicalId { .. }));
    }

    #[test]
    fn template_carries_format_version_and_resources() {
        let mut stack = Stack::new("Test").with_description("test stack");
        stack.add(&TestBucket).unwrap();

        let json = stack.template().to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["AWSTemplateFormatVersion"], "2010-09-09");
        assert_eq!(value["Description"], "test stack");
        assert_eq!(value["Resources"]["Bucket"]["Type"], "AWS::S3::Bucket");
    }

    #[test]
    fn removal_policy_renders_as_deletion_policy() {
        let resource = Resource::new("AWS::S3::Bucket", json!({}))
            .with_removal_policy(RemovalPolicy::Retain);
        assert_eq!(resource.deletion_policy.as_deref(), Some("Retain"));

        let resource =
            Resource::new("AWS::S3::Bucket", json!({})).with_removal_policy(RemovalPolicy::Destroy);
        assert_eq!(resource.deletion_policy.as_deref(), Some("Delete"));
    }
}
