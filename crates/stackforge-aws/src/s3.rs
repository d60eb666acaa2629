//! S3 bucket descriptor.

use serde_json::json;
use stackforge_core::{Construct, Error, LogicalId, RemovalPolicy, Resource, Result};

/// A durable, optionally versioned bucket.
///
/// Invariant: `RemovalPolicy::Retain` forbids `auto_delete_objects`; a
/// retained bucket must never have its contents emptied automatically.
#[derive(Debug, Clone)]
pub struct Bucket {
    logical_id: LogicalId,
    bucket_name: Option<String>,
    versioned: bool,
    removal_policy: RemovalPolicy,
    auto_delete_objects: bool,
}

impl Bucket {
    pub fn new(logical_id: impl Into<LogicalId>) -> Self {
        Self {
            logical_id: logical_id.into(),
            bucket_name: None,
            versioned: false,
            removal_policy: RemovalPolicy::Destroy,
            auto_delete_objects: false,
        }
    }

    pub fn bucket_name(mut self, name: impl Into<String>) -> Self {
        self.bucket_name = Some(name.into());
        self
    }

    pub fn versioned(mut self, versioned: bool) -> Self {
        self.versioned = versioned;
        self
    }

    pub fn removal_policy(mut self, policy: RemovalPolicy) -> Self {
        self.removal_policy = policy;
        self
    }

    pub fn auto_delete_objects(mut self, auto_delete: bool) -> Self {
        self.auto_delete_objects = auto_delete;
        self
    }

    pub fn logical_id(&self) -> &LogicalId {
        &self.logical_id
    }

    /// `Ref` expression for this bucket; resolves to the bucket name.
    pub fn bucket_ref(&self) -> serde_json::Value {
        json!({ "Ref": self.logical_id.as_str() })
    }

    /// `Fn::GetAtt` expression for this bucket's ARN.
    pub fn arn(&self) -> serde_json::Value {
        json!({ "Fn::GetAtt": [self.logical_id.as_str(), "Arn"] })
    }
}

impl Construct for Bucket {
    fn validate(&self) -> Result<()> {
        if self.removal_policy == RemovalPolicy::Retain && self.auto_delete_objects {
            return Err(Error::PolicyConflict(self.logical_id.to_string()));
        }
        Ok(())
    }

    fn render(&self) -> Vec<(LogicalId, Resource)> {
        let mut properties = json!({});
        if let Some(name) = &self.bucket_name {
            properties["BucketName"] = json!(name);
        }
        if self.versioned {
            properties["VersioningConfiguration"] = json!({ "Status": "Enabled" });
        }
        let resource = Resource::new("AWS::S3::Bucket", properties)
            .with_removal_policy(self.removal_policy);
        vec![(self.logical_id.clone(), resource)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retain_with_auto_delete_is_rejected() {
        let bucket = Bucket::new("ArtifactBucket")
            .removal_policy(RemovalPolicy::Retain)
            .auto_delete_objects(true);
        let err = bucket.validate().unwrap_err();
        assert!(matches!(err, Error::PolicyConflict(_)));
    }

    #[test]
    fn retain_without_auto_delete_is_valid() {
        let bucket = Bucket::new("ArtifactBucket")
            .removal_policy(RemovalPolicy::Retain)
            .auto_delete_objects(false);
        assert!(bucket.validate().is_ok());
    }

    #[test]
    fn versioned_bucket_renders_name_and_versioning() {
        let bucket = Bucket::new("ArtifactBucket")
            .bucket_name("my-cdk-artifact-bucket")
            .versioned(true)
            .removal_policy(RemovalPolicy::Retain);

        let rendered = bucket.render();
        let (id, resource) = &rendered[0];
        assert_eq!(id.as_str(), "ArtifactBucket");
        assert_eq!(resource.resource_type, "AWS::S3::Bucket");
        assert_eq!(resource.properties["BucketName"], "my-cdk-artifact-bucket");
        assert_eq!(
            resource.properties["VersioningConfiguration"]["Status"],
            "Enabled"
        );
        assert_eq!(resource.deletion_policy.as_deref(), Some("Retain"));
    }
}
