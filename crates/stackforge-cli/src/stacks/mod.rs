//! Stack declarations and the composition root.

pub mod lambda_stack;
pub mod pipeline_stack;

pub use lambda_stack::lambda_stack;
pub use pipeline_stack::pipeline_stack;

use stackforge_core::{App, Result};

use crate::config::DeployConfig;

pub const LAMBDA_STACK_NAME: &str = "LambdaStack";
pub const PIPELINE_STACK_NAME: &str = "PipelineStack";

/// Declare every stack into a fresh [`App`].
///
/// Ordering is load-bearing: the lambda stack is registered first and its
/// assigned name is read back before the pipeline stack is constructed,
/// because the deploy action's template path interpolates that name.
pub fn declare(config: &DeployConfig, out_dir: &str) -> Result<App> {
    let mut app = App::new(out_dir);

    let target = app.add_stack(lambda_stack(&config.lambda)?)?;
    app.add_stack(pipeline_stack(config, &target)?)?;

    Ok(app)
}
