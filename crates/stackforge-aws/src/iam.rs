//! IAM policy fragments and roles.

use serde_json::{Value, json};
use stackforge_core::{Construct, LogicalId, Resource};

/// Whether a statement grants or denies its actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    Allow,
    Deny,
}

impl std::fmt::Display for Effect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Effect::Allow => write!(f, "Allow"),
            Effect::Deny => write!(f, "Deny"),
        }
    }
}

/// A single policy statement.
#[derive(Debug, Clone)]
pub struct PolicyStatement {
    pub effect: Effect,
    pub actions: Vec<String>,
    pub resources: Vec<Value>,
}

impl PolicyStatement {
    /// Allow `actions` on literal resource ARNs or `*`.
    pub fn allow(actions: &[&str], resources: &[&str]) -> Self {
        Self {
            effect: Effect::Allow,
            actions: actions.iter().map(|a| a.to_string()).collect(),
            resources: resources.iter().map(|r| json!(r)).collect(),
        }
    }

    /// Allow `actions` on intrinsic-valued resources (refs, GetAtt).
    pub fn allow_values(actions: &[&str], resources: Vec<Value>) -> Self {
        Self {
            effect: Effect::Allow,
            actions: actions.iter().map(|a| a.to_string()).collect(),
            resources,
        }
    }

    pub fn to_json(&self) -> Value {
        json!({
            "Effect": self.effect.to_string(),
            "Action": self.actions,
            "Resource": self.resources,
        })
    }
}

/// An ordered set of statements forming one policy document.
#[derive(Debug, Clone, Default)]
pub struct PolicyDocument {
    pub statements: Vec<PolicyStatement>,
}

impl PolicyDocument {
    pub fn new(statements: Vec<PolicyStatement>) -> Self {
        Self { statements }
    }

    pub fn push(&mut self, statement: PolicyStatement) {
        self.statements.push(statement);
    }

    pub fn to_json(&self) -> Value {
        json!({
            "Version": "2012-10-17",
            "Statement": self.statements.iter().map(|s| s.to_json()).collect::<Vec<_>>(),
        })
    }
}

/// Trust policy allowing `service` to assume the role.
pub fn service_assume_role_policy(service: &str) -> Value {
    json!({
        "Version": "2012-10-17",
        "Statement": [{
            "Effect": "Allow",
            "Principal": { "Service": service },
            "Action": "sts:AssumeRole",
        }],
    })
}

/// An IAM role assumed by one AWS service.
#[derive(Debug, Clone)]
pub struct Role {
    logical_id: LogicalId,
    assumed_by: String,
    managed_policy_arns: Vec<String>,
    inline_policy: Option<PolicyDocument>,
}

impl Role {
    pub fn new(logical_id: impl Into<LogicalId>, assumed_by: impl Into<String>) -> Self {
        Self {
            logical_id: logical_id.into(),
            assumed_by: assumed_by.into(),
            managed_policy_arns: Vec::new(),
            inline_policy: None,
        }
    }

    pub fn with_managed_policy(mut self, arn: impl Into<String>) -> Self {
        self.managed_policy_arns.push(arn.into());
        self
    }

    pub fn with_inline_policy(mut self, document: PolicyDocument) -> Self {
        self.inline_policy = Some(document);
        self
    }

    pub fn logical_id(&self) -> &LogicalId {
        &self.logical_id
    }

    /// `Fn::GetAtt` expression for this role's ARN.
    pub fn arn(&self) -> Value {
        json!({ "Fn::GetAtt": [self.logical_id.as_str(), "Arn"] })
    }

    pub(crate) fn render_resource(&self) -> (LogicalId, Resource) {
        let mut properties = json!({
            "AssumeRolePolicyDocument": service_assume_role_policy(&self.assumed_by),
        });
        if !self.managed_policy_arns.is_empty() {
            properties["ManagedPolicyArns"] = json!(self.managed_policy_arns);
        }
        if let Some(document) = &self.inline_policy {
            properties["Policies"] = json!([{
                "PolicyName": format!("{}DefaultPolicy", self.logical_id),
                "PolicyDocument": document.to_json(),
            }]);
        }
        (
            self.logical_id.clone(),
            Resource::new("AWS::IAM::Role", properties),
        )
    }
}

impl Construct for Role {
    fn render(&self) -> Vec<(LogicalId, Resource)> {
        vec![self.render_resource()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statement_renders_effect_actions_resources() {
        let statement = PolicyStatement::allow(&["s3:GetObject"], &["*"]);
        let json = statement.to_json();
        assert_eq!(json["Effect"], "Allow");
        assert_eq!(json["Action"][0], "s3:GetObject");
        assert_eq!(json["Resource"][0], "*");
    }

    #[test]
    fn role_carries_trust_policy_for_service() {
        let role = Role::new("BuildRole", "codebuild.amazonaws.com");
        let (id, resource) = role.render_resource();
        assert_eq!(id.as_str(), "BuildRole");
        assert_eq!(resource.resource_type, "AWS::IAM::Role");
        assert_eq!(
            resource.properties["AssumeRolePolicyDocument"]["Statement"][0]["Principal"]
                ["Service"],
            "codebuild.amazonaws.com"
        );
    }

    #[test]
    fn inline_policy_renders_under_default_policy_name() {
        let role = Role::new("BuildRole", "codebuild.amazonaws.com").with_inline_policy(
            PolicyDocument::new(vec![PolicyStatement::allow(&["sts:AssumeRole"], &["*"])]),
        );
        let (_, resource) = role.render_resource();
        assert_eq!(
            resource.properties["Policies"][0]["PolicyName"],
            "BuildRoleDefaultPolicy"
        );
    }
}
