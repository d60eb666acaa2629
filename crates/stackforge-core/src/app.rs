//! The application accumulator.
//!
//! Every declared stack is registered here before synthesis. The
//! accumulator is an explicit value passed around by the composition
//! root; there is no process-wide construct context.

use std::path::{Path, PathBuf};

use crate::{Error, Result, Stack, StackName};

/// Gathers declared stacks and synthesizes one template file per stack.
#[derive(Debug)]
pub struct App {
    out_dir: PathBuf,
    stacks: Vec<Stack>,
}

impl App {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
            stacks: Vec::new(),
        }
    }

    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }

    /// Register a stack and hand back its assigned name.
    ///
    /// The returned name is the only handle other stacks may couple to;
    /// dependents take it as a plain value, never the stack itself.
    pub fn add_stack(&mut self, stack: Stack) -> Result<StackName> {
        if self.stacks.iter().any(|s| s.name() == stack.name()) {
            return Err(Error::DuplicateStack(stack.name().to_string()));
        }
        let name = stack.name().clone();
        self.stacks.push(stack);
        Ok(name)
    }

    pub fn stacks(&self) -> &[Stack] {
        &self.stacks
    }

    /// Path the template for `name` will be written to.
    pub fn template_path(&self, name: &StackName) -> PathBuf {
        self.out_dir.join(name.template_file_name())
    }

    /// Write `<name>.template.json` for every registered stack.
    ///
    /// Synthesis performs no provider calls; it only emits the declared
    /// graph for the external toolchain to execute.
    pub fn synth(&self) -> Result<Vec<PathBuf>> {
        std::fs::create_dir_all(&self.out_dir)?;

        let mut written = Vec::with_capacity(self.stacks.len());
        for stack in &self.stacks {
            let path = self.template_path(stack.name());
            let json = stack.template().to_json()?;
            std::fs::write(&path, json)?;
            tracing::info!(stack = %stack.name(), path = %path.display(), "synthesized template");
            written.push(path);
        }
        Ok(written)
    }
}
