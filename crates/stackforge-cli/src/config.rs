//! KDL deployment configuration.
//!
//! Every field has a default, so an absent file or an empty document
//! yields a complete configuration; the file only overrides deployment
//! coordinates (repository, connection, bucket, function).

use kdl::{KdlDocument, KdlNode};
use stackforge_aws::codebuild::BuildImage;
use stackforge_aws::lambda::Runtime;
use stackforge_core::RemovalPolicy;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("KDL parse error: {0}")]
    Parse(#[from] kdl::KdlError),

    #[error("invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// The whole deployment configuration.
#[derive(Debug, Clone, Default)]
pub struct DeployConfig {
    pub lambda: LambdaConfig,
    pub source: SourceConfig,
    pub build: BuildConfig,
    pub artifacts: ArtifactStoreConfig,
}

/// The serverless function being delivered.
#[derive(Debug, Clone)]
pub struct LambdaConfig {
    pub name: String,
    pub runtime: Runtime,
    pub handler: String,
    pub asset: String,
}

impl Default for LambdaConfig {
    fn default() -> Self {
        Self {
            name: "sample-cdk-lambda".to_string(),
            runtime: Runtime::Python39,
            handler: "handler.handler".to_string(),
            asset: "lambda_functions".to_string(),
        }
    }
}

/// Repository coordinates and the pre-provisioned connection handle.
#[derive(Debug, Clone)]
pub struct SourceConfig {
    pub owner: String,
    pub repo: String,
    pub branch: String,
    pub connection_arn: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            owner: "dharmendrapoondla123".to_string(),
            repo: "lambda-cdk-pipeline".to_string(),
            branch: "main".to_string(),
            connection_arn: "arn:aws:codeconnections:ap-south-1:347156581188:connection/3712b2a1-b005-4a2f-9ff2-5db33267c2af".to_string(),
        }
    }
}

/// Build environment image and the repository-resident buildspec.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    pub image: BuildImage,
    pub buildspec: String,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            image: BuildImage::Standard7_0,
            buildspec: "buildspec.yml".to_string(),
        }
    }
}

/// Artifact bucket and its retention choice.
#[derive(Debug, Clone)]
pub struct ArtifactStoreConfig {
    pub bucket: String,
    pub removal_policy: RemovalPolicy,
}

impl Default for ArtifactStoreConfig {
    fn default() -> Self {
        Self {
            bucket: "my-cdk-artifact-bucket".to_string(),
            removal_policy: RemovalPolicy::Retain,
        }
    }
}

/// Load the configuration at `path`, or defaults if the file is absent.
pub fn load_or_default(path: &str) -> ConfigResult<DeployConfig> {
    if !std::path::Path::new(path).exists() {
        tracing::debug!(path, "no configuration file, using defaults");
        return Ok(DeployConfig::default());
    }
    load(path)
}

/// Load and parse the configuration at `path`.
pub fn load(path: &str) -> ConfigResult<DeployConfig> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parse a deployment configuration from KDL text.
pub fn parse_config(kdl: &str) -> ConfigResult<DeployConfig> {
    let doc: KdlDocument = kdl.parse()?;
    let mut config = DeployConfig::default();

    for node in doc.nodes() {
        match node.name().value() {
            "lambda" => parse_lambda(node, &mut config.lambda)?,
            "source" => parse_source(node, &mut config.source),
            "build" => parse_build(node, &mut config.build)?,
            "artifacts" => parse_artifacts(node, &mut config.artifacts),
            _ => {} // Ignore unknown nodes
        }
    }

    Ok(config)
}

fn parse_lambda(node: &KdlNode, lambda: &mut LambdaConfig) -> ConfigResult<()> {
    if let Some(name) = get_child_string(node, "name") {
        lambda.name = name;
    }
    if let Some(runtime) = get_child_string(node, "runtime") {
        lambda.runtime = runtime
            .parse()
            .map_err(|message| ConfigError::InvalidValue {
                field: "lambda runtime".to_string(),
                message,
            })?;
    }
    if let Some(handler) = get_child_string(node, "handler") {
        lambda.handler = handler;
    }
    if let Some(asset) = get_child_string(node, "asset") {
        lambda.asset = asset;
    }
    Ok(())
}

fn parse_source(node: &KdlNode, source: &mut SourceConfig) {
    if let Some(owner) = get_child_string(node, "owner") {
        source.owner = owner;
    }
    if let Some(repo) = get_child_string(node, "repo") {
        source.repo = repo;
    }
    if let Some(branch) = get_child_string(node, "branch") {
        source.branch = branch;
    }
    if let Some(arn) = get_child_string(node, "connection-arn") {
        source.connection_arn = arn;
    }
}

fn parse_build(node: &KdlNode, build: &mut BuildConfig) -> ConfigResult<()> {
    if let Some(image) = get_child_string(node, "image") {
        build.image = image
            .parse()
            .map_err(|message| ConfigError::InvalidValue {
                field: "build image".to_string(),
                message,
            })?;
    }
    if let Some(buildspec) = get_child_string(node, "buildspec") {
        build.buildspec = buildspec;
    }
    Ok(())
}

fn parse_artifacts(node: &KdlNode, artifacts: &mut ArtifactStoreConfig) {
    if let Some(bucket) = get_child_string(node, "bucket") {
        artifacts.bucket = bucket;
    }
    if let Some(keep) = get_child_bool(node, "keep") {
        artifacts.removal_policy = if keep {
            RemovalPolicy::Retain
        } else {
            RemovalPolicy::Destroy
        };
    }
}

// Helper functions for extracting values from KDL nodes

fn get_child_string(node: &KdlNode, name: &str) -> Option<String> {
    let child = node.children()?.nodes().iter().find(|c| c.name().value() == name)?;
    child
        .entries()
        .iter()
        .find(|e| e.name().is_none())
        .and_then(|e| e.value().as_string())
        .map(|s| s.to_string())
}

fn get_child_bool(node: &KdlNode, name: &str) -> Option<bool> {
    let child = node.children()?.nodes().iter().find(|c| c.name().value() == name)?;
    child
        .entries()
        .iter()
        .find(|e| e.name().is_none())
        .and_then(|e| e.value().as_bool())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config.lambda.name, "sample-cdk-lambda");
        assert_eq!(config.source.branch, "main");
        assert_eq!(config.build.buildspec, "buildspec.yml");
        assert_eq!(config.artifacts.removal_policy, RemovalPolicy::Retain);
    }

    #[test]
    fn sections_override_defaults() {
        let kdl = r#"
            lambda {
                name "orders-fn"
                runtime "python3.12"
                handler "orders.main"
                asset "functions/orders"
            }

            source {
                owner "acme"
                repo "orders"
                branch "release"
                connection-arn "arn:aws:codeconnections:eu-west-1:123456789012:connection/abc"
            }

            artifacts {
                bucket "acme-pipeline-artifacts"
                keep #false
            }
        "#;

        let config = parse_config(kdl).unwrap();
        assert_eq!(config.lambda.name, "orders-fn");
        assert_eq!(config.lambda.runtime, Runtime::Python312);
        assert_eq!(config.source.owner, "acme");
        assert_eq!(config.source.branch, "release");
        assert_eq!(config.artifacts.bucket, "acme-pipeline-artifacts");
        assert_eq!(config.artifacts.removal_policy, RemovalPolicy::Destroy);
    }

    #[test]
    fn unknown_runtime_is_rejected() {
        let kdl = r#"
            lambda {
                runtime "fortran77"
            }
        "#;

        let err = parse_config(kdl).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn unknown_build_image_is_rejected() {
        let kdl = r#"
            build {
                image "ubuntu:latest"
            }
        "#;

        let err = parse_config(kdl).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }
}
