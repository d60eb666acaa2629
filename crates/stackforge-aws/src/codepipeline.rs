//! CodePipeline descriptors: artifacts, actions, stages and the pipeline.

use serde_json::{Value, json};
use std::collections::BTreeSet;
use stackforge_core::{ArtifactName, Construct, Error, LogicalId, Resource, Result, StackName};

use crate::iam::{PolicyDocument, PolicyStatement, Role};

/// A named, opaque handoff between pipeline stages.
#[derive(Debug, Clone)]
pub struct Artifact {
    name: ArtifactName,
}

impl Artifact {
    pub fn new(name: impl Into<ArtifactName>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &ArtifactName {
        &self.name
    }

    /// Address a file inside this artifact.
    pub fn at_path(&self, file: impl Into<String>) -> ArtifactPath {
        ArtifactPath {
            artifact: self.name.clone(),
            file: file.into(),
        }
    }
}

/// A file inside a named artifact, rendered `<Artifact>::<file>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPath {
    artifact: ArtifactName,
    file: String,
}

impl ArtifactPath {
    pub fn artifact(&self) -> &ArtifactName {
        &self.artifact
    }

    pub fn file(&self) -> &str {
        &self.file
    }
}

impl std::fmt::Display for ArtifactPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}::{}", self.artifact, self.file)
    }
}

/// One unit of work inside a stage, addressed to a specific provider.
#[derive(Debug, Clone)]
pub enum Action {
    /// Fetch a branch of a repository through a pre-provisioned
    /// CodeStar connection. The connection is referenced, never created.
    CodeStarConnectionsSource {
        action_name: String,
        owner: String,
        repo: String,
        branch: String,
        connection_arn: String,
        output: ArtifactName,
    },
    /// Run a CodeBuild project on an input artifact.
    CodeBuild {
        action_name: String,
        project: Value,
        input: ArtifactName,
        outputs: Vec<ArtifactName>,
    },
    /// Create or update a stack from a template file inside an artifact.
    /// Couples to the target stack by name only.
    CloudFormationCreateUpdateStack {
        action_name: String,
        stack_name: StackName,
        template_path: ArtifactPath,
        admin_permissions: bool,
    },
}

impl Action {
    pub fn action_name(&self) -> &str {
        match self {
            Action::CodeStarConnectionsSource { action_name, .. }
            | Action::CodeBuild { action_name, .. }
            | Action::CloudFormationCreateUpdateStack { action_name, .. } => action_name,
        }
    }

    pub fn is_source(&self) -> bool {
        matches!(self, Action::CodeStarConnectionsSource { .. })
    }

    fn inputs(&self) -> Vec<&ArtifactName> {
        match self {
            Action::CodeStarConnectionsSource { .. } => Vec::new(),
            Action::CodeBuild { input, .. } => vec![input],
            Action::CloudFormationCreateUpdateStack { template_path, .. } => {
                vec![template_path.artifact()]
            }
        }
    }

    fn outputs(&self) -> Vec<&ArtifactName> {
        match self {
            Action::CodeStarConnectionsSource { output, .. } => vec![output],
            Action::CodeBuild { outputs, .. } => outputs.iter().collect(),
            Action::CloudFormationCreateUpdateStack { .. } => Vec::new(),
        }
    }

    fn render(&self, deploy_role: Option<&Role>) -> Value {
        match self {
            Action::CodeStarConnectionsSource {
                action_name,
                owner,
                repo,
                branch,
                connection_arn,
                output,
            } => json!({
                "Name": action_name,
                "ActionTypeId": {
                    "Category": "Source",
                    "Owner": "AWS",
                    "Provider": "CodeStarSourceConnection",
                    "Version": "1",
                },
                "Configuration": {
                    "ConnectionArn": connection_arn,
                    "FullRepositoryId": format!("{}/{}", owner, repo),
                    "BranchName": branch,
                },
                "OutputArtifacts": [{ "Name": output.as_str() }],
            }),
            Action::CodeBuild {
                action_name,
                project,
                input,
                outputs,
            } => json!({
                "Name": action_name,
                "ActionTypeId": {
                    "Category": "Build",
                    "Owner": "AWS",
                    "Provider": "CodeBuild",
                    "Version": "1",
                },
                "Configuration": { "ProjectName": project },
                "InputArtifacts": [{ "Name": input.as_str() }],
                "OutputArtifacts": outputs
                    .iter()
                    .map(|o| json!({ "Name": o.as_str() }))
                    .collect::<Vec<_>>(),
            }),
            Action::CloudFormationCreateUpdateStack {
                action_name,
                stack_name,
                template_path,
                admin_permissions,
            } => {
                let mut configuration = json!({
                    "ActionMode": "CREATE_UPDATE",
                    "StackName": stack_name.as_str(),
                    "TemplatePath": template_path.to_string(),
                    "Capabilities": "CAPABILITY_NAMED_IAM",
                });
                if *admin_permissions {
                    if let Some(role) = deploy_role {
                        configuration["RoleArn"] = role.arn();
                    }
                }
                json!({
                    "Name": action_name,
                    "ActionTypeId": {
                        "Category": "Deploy",
                        "Owner": "AWS",
                        "Provider": "CloudFormation",
                        "Version": "1",
                    },
                    "Configuration": configuration,
                    "InputArtifacts": [{ "Name": template_path.artifact().as_str() }],
                })
            }
        }
    }
}

/// An ordered phase of the pipeline. All of a stage's actions run with
/// the input artifact set declared here.
#[derive(Debug, Clone)]
pub struct Stage {
    name: String,
    actions: Vec<Action>,
}

impl Stage {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }
}

/// Pipeline execution engine generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineType {
    V1,
    V2,
}

impl std::fmt::Display for PipelineType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelineType::V1 => write!(f, "V1"),
            PipelineType::V2 => write!(f, "V2"),
        }
    }
}

/// An ordered delivery pipeline over a shared artifact store.
///
/// Stage order is fixed and significant. `add_stage` enforces the
/// artifact discipline the external engine assumes: a stage consumes
/// only artifacts produced by earlier stages, and each artifact is
/// produced by at most one action.
#[derive(Debug, Clone)]
pub struct Pipeline {
    logical_id: LogicalId,
    artifact_bucket: LogicalId,
    pipeline_type: PipelineType,
    stages: Vec<Stage>,
    produced: BTreeSet<String>,
}

impl Pipeline {
    pub fn new(logical_id: impl Into<LogicalId>, artifact_bucket: LogicalId) -> Self {
        Self {
            logical_id: logical_id.into(),
            artifact_bucket,
            pipeline_type: PipelineType::V2,
            stages: Vec::new(),
            produced: BTreeSet::new(),
        }
    }

    pub fn pipeline_type(mut self, pipeline_type: PipelineType) -> Self {
        self.pipeline_type = pipeline_type;
        self
    }

    pub fn logical_id(&self) -> &LogicalId {
        &self.logical_id
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn stage_names(&self) -> Vec<&str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Append a stage, checking artifact and ordering discipline.
    pub fn add_stage(&mut self, name: impl Into<String>, actions: Vec<Action>) -> Result<()> {
        let name = name.into();
        if actions.is_empty() {
            return Err(Error::InvalidInput(format!("stage '{}' has no actions", name)));
        }

        let first_stage = self.stages.is_empty();
        for action in &actions {
            if first_stage && !action.is_source() {
                return Err(Error::InvalidInput(format!(
                    "first stage '{}' may only contain source actions",
                    name
                )));
            }
            if !first_stage && action.is_source() {
                return Err(Error::InvalidInput(format!(
                    "source action '{}' must be in the first stage",
                    action.action_name()
                )));
            }
            for input in action.inputs() {
                if !self.produced.contains(input.as_str()) {
                    return Err(Error::UnknownArtifact {
                        stage: name.clone(),
                        artifact: input.to_string(),
                    });
                }
            }
        }

        // Outputs become visible only to later stages.
        for action in &actions {
            for output in action.outputs() {
                if !self.produced.insert(output.to_string()) {
                    return Err(Error::DuplicateArtifact(output.to_string()));
                }
            }
        }

        self.stages.push(Stage { name, actions });
        Ok(())
    }

    fn deploy_role(&self) -> Option<Role> {
        let wants_admin = self.stages.iter().flat_map(|s| s.actions()).any(|a| {
            matches!(
                a,
                Action::CloudFormationCreateUpdateStack {
                    admin_permissions: true,
                    ..
                }
            )
        });
        wants_admin.then(|| {
            Role::new(
                self.logical_id.child("DeployRole"),
                "cloudformation.amazonaws.com",
            )
            .with_managed_policy("arn:aws:iam::aws:policy/AdministratorAccess")
        })
    }

    fn pipeline_role(&self, deploy_role: Option<&Role>) -> Role {
        let bucket_arn = json!({ "Fn::GetAtt": [self.artifact_bucket.as_str(), "Arn"] });
        let bucket_objects_arn = json!({
            "Fn::Join": ["", [{ "Fn::GetAtt": [self.artifact_bucket.as_str(), "Arn"] }, "/*"]]
        });

        let mut document = PolicyDocument::new(vec![PolicyStatement::allow_values(
            &["s3:GetObject*", "s3:GetBucket*", "s3:List*", "s3:PutObject"],
            vec![bucket_arn, bucket_objects_arn],
        )]);

        let connections: Vec<&str> = self
            .stages
            .iter()
            .flat_map(|s| s.actions())
            .filter_map(|a| match a {
                Action::CodeStarConnectionsSource { connection_arn, .. } => {
                    Some(connection_arn.as_str())
                }
                _ => None,
            })
            .collect();
        if !connections.is_empty() {
            document.push(PolicyStatement::allow(
                &["codestar-connections:UseConnection"],
                &connections,
            ));
        }

        if self.stages.iter().flat_map(|s| s.actions()).any(|a| {
            matches!(a, Action::CodeBuild { .. })
        }) {
            document.push(PolicyStatement::allow(
                &["codebuild:StartBuild", "codebuild:BatchGetBuilds"],
                &["*"],
            ));
        }

        if let Some(role) = deploy_role {
            document.push(PolicyStatement::allow(
                &[
                    "cloudformation:CreateStack",
                    "cloudformation:UpdateStack",
                    "cloudformation:DescribeStacks",
                ],
                &["*"],
            ));
            document.push(PolicyStatement::allow_values(
                &["iam:PassRole"],
                vec![role.arn()],
            ));
        }

        Role::new(self.logical_id.child("Role"), "codepipeline.amazonaws.com")
            .with_inline_policy(document)
    }
}

impl Construct for Pipeline {
    fn validate(&self) -> Result<()> {
        if self.stages.is_empty() {
            return Err(Error::InvalidInput(format!(
                "pipeline '{}' has no stages",
                self.logical_id
            )));
        }
        Ok(())
    }

    fn render(&self) -> Vec<(LogicalId, Resource)> {
        let deploy_role = self.deploy_role();
        let pipeline_role = self.pipeline_role(deploy_role.as_ref());

        let stages: Vec<Value> = self
            .stages
            .iter()
            .map(|stage| {
                json!({
                    "Name": stage.name(),
                    "Actions": stage
                        .actions()
                        .iter()
                        .map(|a| a.render(deploy_role.as_ref()))
                        .collect::<Vec<_>>(),
                })
            })
            .collect();

        let pipeline = Resource::new(
            "AWS::CodePipeline::Pipeline",
            json!({
                "RoleArn": pipeline_role.arn(),
                "PipelineType": self.pipeline_type.to_string(),
                "ArtifactStore": {
                    "Type": "S3",
                    "Location": { "Ref": self.artifact_bucket.as_str() },
                },
                "Stages": stages,
            }),
        )
        .depends_on(pipeline_role.logical_id().clone());

        let mut resources = vec![pipeline_role.render_resource()];
        if let Some(role) = &deploy_role {
            resources.push(role.render_resource());
        }
        resources.push((self.logical_id.clone(), pipeline));
        resources
    }
}
