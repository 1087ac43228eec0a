//! Command execution for caretaker.
//!
//! Each subcommand lives in its own module and receives ready-made services
//! (engine, channel) so it can be exercised against a mock host:
//!
//! - **apply**: run the engine on a change list read from a JSON file
//! - **migrate**: compute a catalog migration through a channel, then apply it
//! - **batch**: apply many requests one at a time through a task queue
//! - **list**: describe the catalog
//! - **worker**: answer one channel request read from stdin
//! - **common**: service construction and output helpers

pub mod apply;
pub mod batch;
pub mod common;
pub mod list;
pub mod migrate;
pub mod worker;
