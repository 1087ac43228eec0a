pub mod catalog;
pub mod channel;
pub mod cli;
pub mod command;
pub mod config;
pub mod engine;
mod error;
pub mod forge;
pub mod queue;
pub mod reporter;
pub mod retry;

pub use engine::{
    EngineOptions, MigrationEngine,
    types::{
        ChangedFile, FileOperation, MigrationRequest, MigrationResult,
        MigrationStatus,
    },
};
pub use error::{CaretakerError, Result};

#[cfg(test)]
pub mod test_helpers;
