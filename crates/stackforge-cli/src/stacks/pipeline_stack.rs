//! The continuous-delivery pipeline stack.

use stackforge_aws::codebuild::{BuildEnvironment, BuildSpec, PipelineProject};
use stackforge_aws::codepipeline::{Action, Artifact, Pipeline, PipelineType};
use stackforge_aws::iam::PolicyStatement;
use stackforge_aws::s3::Bucket;
use stackforge_core::{Result, Stack, StackName};

use crate::config::DeployConfig;

use super::PIPELINE_STACK_NAME;

/// Declare the delivery pipeline for `target`.
///
/// `target` is a plain name value; the target stack itself is never held
/// here, which keeps the two stacks free of a circular ownership edge.
pub fn pipeline_stack(config: &DeployConfig, target: &StackName) -> Result<Stack> {
    let mut stack = Stack::new(PIPELINE_STACK_NAME)
        .with_description("Source, build and deploy pipeline");

    // Artifact bucket for the pipeline. Retained artifacts must never be
    // auto-deleted, so the flag stays false.
    let artifact_bucket = Bucket::new("ArtifactBucket")
        .bucket_name(&config.artifacts.bucket)
        .versioned(true)
        .removal_policy(config.artifacts.removal_policy)
        .auto_delete_objects(false);
    stack.add(&artifact_bucket)?;

    let source_output = Artifact::new("SourceOutput");
    let build_output = Artifact::new("BuildOutput");

    // Build project synthesizing the target stack's template.
    let mut build_project = PipelineProject::new(
        "SynthProject",
        BuildEnvironment::new(config.build.image),
        BuildSpec::from_source_filename(&config.build.buildspec),
    );
    // TODO: narrow this to the artifact bucket and the target stack's ARN;
    // wildcard resources grant far more than the synth step uses.
    build_project.add_to_role_policy(PolicyStatement::allow(
        &["s3:*", "sts:AssumeRole", "cloudformation:*"],
        &["*"],
    ));
    stack.add(&build_project)?;

    let mut pipeline = Pipeline::new("CICDPipeline", artifact_bucket.logical_id().clone())
        .pipeline_type(PipelineType::V2);

    pipeline.add_stage(
        "Source",
        vec![Action::CodeStarConnectionsSource {
            action_name: "GitHub_Source".to_string(),
            owner: config.source.owner.clone(),
            repo: config.source.repo.clone(),
            branch: config.source.branch.clone(),
            connection_arn: config.source.connection_arn.clone(),
            output: source_output.name().clone(),
        }],
    )?;

    pipeline.add_stage(
        "Build",
        vec![Action::CodeBuild {
            action_name: "CDK_Build".to_string(),
            project: build_project.project_ref(),
            input: source_output.name().clone(),
            outputs: vec![build_output.name().clone()],
        }],
    )?;

    pipeline.add_stage(
        "Deploy",
        vec![Action::CloudFormationCreateUpdateStack {
            action_name: "CFN_Deploy".to_string(),
            stack_name: target.clone(),
            template_path: build_output.at_path(target.template_file_name()),
            admin_permissions: true,
        }],
    )?;

    stack.add(&pipeline)?;

    Ok(stack)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pipeline_json() -> serde_json::Value {
        let config = DeployConfig::default();
        let stack = pipeline_stack(&config, &StackName::new("LambdaStack")).unwrap();
        serde_json::to_value(stack.template()).unwrap()
    }

    #[test]
    fn stages_are_exactly_source_build_deploy() {
        let json = pipeline_json();
        let stages = json["Resources"]["CICDPipeline"]["Properties"]["Stages"]
            .as_array()
            .unwrap();
        let names: Vec<&str> = stages.iter().map(|s| s["Name"].as_str().unwrap()).collect();
        assert_eq!(names, vec!["Source", "Build", "Deploy"]);
    }

    #[test]
    fn artifact_bucket_is_versioned_and_retained() {
        let json = pipeline_json();
        let bucket = &json["Resources"]["ArtifactBucket"];
        assert_eq!(bucket["DeletionPolicy"], "Retain");
        assert_eq!(
            bucket["Properties"]["VersioningConfiguration"]["Status"],
            "Enabled"
        );
        assert_eq!(bucket["Properties"]["BucketName"], "my-cdk-artifact-bucket");
    }

    #[test]
    fn source_action_uses_the_configured_connection() {
        let config = DeployConfig::default();
        let json = pipeline_json();
        let source =
            &json["Resources"]["CICDPipeline"]["Properties"]["Stages"][0]["Actions"][0];
        assert_eq!(source["Name"], "GitHub_Source");
        assert_eq!(
            source["Configuration"]["ConnectionArn"],
            config.source.connection_arn
        );
        assert_eq!(
            source["Configuration"]["FullRepositoryId"],
            "dharmendrapoondla123/lambda-cdk-pipeline"
        );
        assert_eq!(source["Configuration"]["BranchName"], "main");
    }

    #[test]
    fn deploy_template_path_interpolates_target_name() {
        let config = DeployConfig::default();
        for target in ["LambdaStack", "OrdersStack"] {
            let stack = pipeline_stack(&config, &StackName::new(target)).unwrap();
            let json = serde_json::to_value(stack.template()).unwrap();
            let deploy =
                &json["Resources"]["CICDPipeline"]["Properties"]["Stages"][2]["Actions"][0];
            assert_eq!(deploy["Configuration"]["StackName"], target);
            assert_eq!(
                deploy["Configuration"]["TemplatePath"],
                format!("BuildOutput::{}.template.json", target)
            );
        }
    }

    #[test]
    fn admin_deploy_role_is_rendered() {
        let json = pipeline_json();
        let role = &json["Resources"]["CICDPipelineDeployRole"];
        assert_eq!(role["Type"], "AWS::IAM::Role");
        assert_eq!(
            role["Properties"]["ManagedPolicyArns"][0],
            "arn:aws:iam::aws:policy/AdministratorAccess"
        );
    }

    #[test]
    fn build_role_carries_the_broad_grant() {
        let json = pipeline_json();
        let statements = &json["Resources"]["SynthProjectRole"]["Properties"]["Policies"][0]
            ["PolicyDocument"]["Statement"];
        let broad = &statements[1];
        assert_eq!(broad["Action"][0], "s3:*");
        assert_eq!(broad["Action"][2], "cloudformation:*");
        assert_eq!(broad["Resource"][0], "*");
    }
}
