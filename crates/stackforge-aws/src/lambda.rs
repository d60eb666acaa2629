//! Lambda function descriptor.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use stackforge_core::{Construct, LogicalId, Resource};

use crate::iam::Role;

/// Execution runtime tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Runtime {
    Python39,
    Python312,
    NodeJs20,
}

impl std::fmt::Display for Runtime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Runtime::Python39 => write!(f, "python3.9"),
            Runtime::Python312 => write!(f, "python3.12"),
            Runtime::NodeJs20 => write!(f, "nodejs20.x"),
        }
    }
}

impl std::str::FromStr for Runtime {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "python3.9" => Ok(Runtime::Python39),
            "python3.12" => Ok(Runtime::Python312),
            "nodejs20.x" => Ok(Runtime::NodeJs20),
            _ => Err(format!("unknown runtime: {}", s)),
        }
    }
}

/// Where the function's packaged source lives.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Code {
    /// A repository-local asset directory, staged into the bootstrap
    /// assets bucket at deploy time.
    Asset { path: String },
    /// An already-uploaded object.
    S3 { bucket: String, key: String },
}

impl Code {
    pub fn from_asset(path: impl Into<String>) -> Self {
        Code::Asset { path: path.into() }
    }

    pub fn from_bucket(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Code::S3 {
            bucket: bucket.into(),
            key: key.into(),
        }
    }

    fn to_json(&self) -> Value {
        match self {
            Code::Asset { path } => json!({
                "S3Bucket": { "Fn::Sub": "stackforge-assets-${AWS::AccountId}-${AWS::Region}" },
                "S3Key": format!("{}.zip", path),
            }),
            Code::S3 { bucket, key } => json!({
                "S3Bucket": bucket,
                "S3Key": key,
            }),
        }
    }
}

/// A serverless function: name, runtime, entry point and source location.
/// Renders together with its basic execution role.
#[derive(Debug, Clone)]
pub struct Function {
    logical_id: LogicalId,
    function_name: String,
    runtime: Runtime,
    handler: String,
    code: Code,
}

impl Function {
    pub fn new(
        logical_id: impl Into<LogicalId>,
        function_name: impl Into<String>,
        runtime: Runtime,
        handler: impl Into<String>,
        code: Code,
    ) -> Self {
        Self {
            logical_id: logical_id.into(),
            function_name: function_name.into(),
            runtime,
            handler: handler.into(),
            code,
        }
    }

    pub fn logical_id(&self) -> &LogicalId {
        &self.logical_id
    }

    pub fn function_name(&self) -> &str {
        &self.function_name
    }

    pub fn runtime(&self) -> Runtime {
        self.runtime
    }

    pub fn handler(&self) -> &str {
        &self.handler
    }
}

impl Construct for Function {
    fn render(&self) -> Vec<(LogicalId, Resource)> {
        let role = Role::new(
            self.logical_id.child("ServiceRole"),
            "lambda.amazonaws.com",
        )
        .with_managed_policy(
            "arn:aws:iam::aws:policy/service-role/AWSLambdaBasicExecutionRole",
        );

        let function = Resource::new(
            "AWS::Lambda::Function",
            json!({
                "FunctionName": self.function_name,
                "Runtime": self.runtime.to_string(),
                "Handler": self.handler,
                "Code": self.code.to_json(),
                "Role": role.arn(),
            }),
        )
        .depends_on(role.logical_id().clone());

        vec![role.render_resource(), (self.logical_id.clone(), function)]
    }
}
