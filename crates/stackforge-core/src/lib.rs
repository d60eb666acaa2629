//! Construct tree and template synthesis for stackforge.
//!
//! This crate contains:
//! - Name newtypes for stacks, logical ids and pipeline artifacts
//! - Stack, resource and template types
//! - The `Construct` rendering seam
//! - The `App` accumulator that synthesizes templates to disk

pub mod app;
pub mod error;
pub mod id;
pub mod stack;

pub use app::App;
pub use error::{Error, Result};
pub use id::{ArtifactName, LogicalId, StackName};
pub use stack::{Construct, RemovalPolicy, Resource, Stack, Template};
