//! CodeBuild project descriptor.

use serde::{Deserialize, Serialize};
use serde_json::json;
use stackforge_core::{Construct, LogicalId, Resource};

use crate::iam::{PolicyDocument, PolicyStatement, Role};

/// Curated build-environment image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildImage {
    Standard6_0,
    Standard7_0,
}

impl std::fmt::Display for BuildImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BuildImage::Standard6_0 => write!(f, "aws/codebuild/standard:6.0"),
            BuildImage::Standard7_0 => write!(f, "aws/codebuild/standard:7.0"),
        }
    }
}

impl std::str::FromStr for BuildImage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "aws/codebuild/standard:6.0" => Ok(BuildImage::Standard6_0),
            "aws/codebuild/standard:7.0" => Ok(BuildImage::Standard7_0),
            _ => Err(format!("unknown build image: {}", s)),
        }
    }
}

/// Container environment a build runs in.
#[derive(Debug, Clone)]
pub struct BuildEnvironment {
    pub build_image: BuildImage,
    pub compute_type: String,
}

impl BuildEnvironment {
    pub fn new(build_image: BuildImage) -> Self {
        Self {
            build_image,
            compute_type: "BUILD_GENERAL1_SMALL".to_string(),
        }
    }
}

/// The externally defined build procedure. Referenced by filename and
/// treated as opaque; the CI runner interprets it.
#[derive(Debug, Clone)]
pub struct BuildSpec {
    filename: String,
}

impl BuildSpec {
    pub fn from_source_filename(filename: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
        }
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }
}

/// A build project wired for pipeline input/output artifacts.
/// Renders its service role alongside the project.
#[derive(Debug, Clone)]
pub struct PipelineProject {
    logical_id: LogicalId,
    environment: BuildEnvironment,
    build_spec: BuildSpec,
    role_statements: Vec<PolicyStatement>,
}

impl PipelineProject {
    pub fn new(
        logical_id: impl Into<LogicalId>,
        environment: BuildEnvironment,
        build_spec: BuildSpec,
    ) -> Self {
        Self {
            logical_id: logical_id.into(),
            environment,
            build_spec,
            role_statements: Vec::new(),
        }
    }

    /// Grant additional permissions to the build's executing identity.
    pub fn add_to_role_policy(&mut self, statement: PolicyStatement) {
        self.role_statements.push(statement);
    }

    pub fn logical_id(&self) -> &LogicalId {
        &self.logical_id
    }

    /// `Ref` expression for this project; resolves to the project name.
    pub fn project_ref(&self) -> serde_json::Value {
        json!({ "Ref": self.logical_id.as_str() })
    }

    fn role(&self) -> Role {
        let mut document = PolicyDocument::new(vec![PolicyStatement::allow(
            &[
                "logs:CreateLogGroup",
                "logs:CreateLogStream",
                "logs:PutLogEvents",
            ],
            &["*"],
        )]);
        for statement in &self.role_statements {
            document.push(statement.clone());
        }
        Role::new(self.logical_id.child("Role"), "codebuild.amazonaws.com")
            .with_inline_policy(document)
    }
}

impl Construct for PipelineProject {
    fn render(&self) -> Vec<(LogicalId, Resource)> {
        let role = self.role();

        let project = Resource::new(
            "AWS::CodeBuild::Project",
            json!({
                "ServiceRole": role.arn(),
                "Artifacts": { "Type": "CODEPIPELINE" },
                "Source": {
                    "Type": "CODEPIPELINE",
                    "BuildSpec": self.build_spec.filename(),
                },
                "Environment": {
                    "Type": "LINUX_CONTAINER",
                    "ComputeType": self.environment.compute_type,
                    "Image": self.environment.build_image.to_string(),
                },
            }),
        )
        .depends_on(role.logical_id().clone());

        vec![role.render_resource(), (self.logical_id.clone(), project)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_project() -> PipelineProject {
        PipelineProject::new(
            "SynthProject",
            BuildEnvironment::new(BuildImage::Standard7_0),
            BuildSpec::from_source_filename("buildspec.yml"),
        )
    }

    #[test]
    fn renders_project_with_service_role() {
        let rendered = sample_project().render();
        assert_eq!(rendered.len(), 2);

        let (role_id, _) = &rendered[0];
        assert_eq!(role_id.as_str(), "SynthProjectRole");

        let (id, project) = &rendered[1];
        assert_eq!(id.as_str(), "SynthProject");
        assert_eq!(project.resource_type, "AWS::CodeBuild::Project");
        assert_eq!(project.properties["Source"]["BuildSpec"], "buildspec.yml");
        assert_eq!(
            project.properties["Environment"]["Image"],
            "aws/codebuild/standard:7.0"
        );
    }

    #[test]
    fn role_policy_statements_are_appended_after_logs() {
        let mut project = sample_project();
        project.add_to_role_policy(PolicyStatement::allow(
            &["s3:*", "sts:AssumeRole", "cloudformation:*"],
            &["*"],
        ));

        let rendered = project.render();
        let (_, role) = &rendered[0];
        let statements = &role.properties["Policies"][0]["PolicyDocument"]["Statement"];
        assert_eq!(statements.as_array().unwrap().len(), 2);
        assert_eq!(statements[1]["Action"][0], "s3:*");
    }

    #[test]
    fn build_image_parses_from_tag() {
        let image: BuildImage = "aws/codebuild/standard:7.0".parse().unwrap();
        assert_eq!(image, BuildImage::Standard7_0);
        assert!("ubuntu:latest".parse::<BuildImage>().is_err());
    }
}
