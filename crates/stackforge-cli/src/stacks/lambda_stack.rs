//! The serverless function stack.

use stackforge_aws::lambda::{Code, Function};
use stackforge_core::{Result, Stack};

use crate::config::LambdaConfig;

use super::LAMBDA_STACK_NAME;

/// Declare the stack holding the delivered function. Leaf stack; the
/// pipeline couples to it by name only.
pub fn lambda_stack(config: &LambdaConfig) -> Result<Stack> {
    let mut stack = Stack::new(LAMBDA_STACK_NAME)
        .with_description("Serverless function delivered by the pipeline");

    let function = Function::new(
        "SampleLambda",
        &config.name,
        config.runtime,
        &config.handler,
        Code::from_asset(&config.asset),
    );
    stack.add(&function)?;

    Ok(stack)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn function_identifier_matches_configuration() {
        let config = LambdaConfig::default();
        let stack = lambda_stack(&config).unwrap();

        let json = serde_json::to_value(stack.template()).unwrap();
        let function = &json["Resources"]["SampleLambda"]["Properties"];
        assert_eq!(function["FunctionName"], "sample-cdk-lambda");
        assert_eq!(function["Runtime"], "python3.9");
        assert_eq!(function["Handler"], "handler.handler");
    }

    #[test]
    fn stack_name_is_the_deploy_target() {
        let stack = lambda_stack(&LambdaConfig::default()).unwrap();
        assert_eq!(stack.name().as_str(), "LambdaStack");
        assert_eq!(
            stack.name().template_file_name(),
            "LambdaStack.template.json"
        );
    }
}
