//! AWS resource descriptors for stackforge.
//!
//! Each type here is a [`stackforge_core::Construct`]: a declarative
//! descriptor that renders to one or more template resources at synthesis
//! time and performs no provider calls itself.

pub mod codebuild;
pub mod codepipeline;
pub mod iam;
pub mod lambda;
pub mod s3;
