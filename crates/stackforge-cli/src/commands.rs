//! CLI command implementations.

use anyhow::Result;

use crate::config;
use crate::stacks;

/// Declare all stacks and write their templates to `out_dir`.
pub fn synth(config_path: &str, out_dir: &str) -> Result<()> {
    let config = config::load_or_default(config_path)?;
    let app = stacks::declare(&config, out_dir)?;

    let written = app.synth()?;
    for path in &written {
        println!("{}", path.display());
    }
    Ok(())
}

/// Parse a configuration file and report the result.
pub fn validate(path: &str) -> Result<()> {
    match config::load(path) {
        Ok(config) => {
            println!(
                "Configuration is valid: {}/{} @ {} -> {}",
                config.source.owner, config.source.repo, config.source.branch, config.lambda.name
            );
            Ok(())
        }
        Err(e) => {
            println!("Configuration error: {}", e);
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn synth_writes_both_templates() {
        let dir = tempfile::TempDir::new().unwrap();
        let out = dir.path().join("out");
        synth("does-not-exist.kdl", out.to_str().unwrap()).unwrap();

        assert!(out.join("LambdaStack.template.json").exists());
        assert!(out.join("PipelineStack.template.json").exists());
    }
}
