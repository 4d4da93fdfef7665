//! Operation catalogue and the machinery that turns one command line into
//! one (or, for list operations, a sequence of) Lambda API calls.

pub mod context;
pub mod params;
pub mod payload;
pub mod registry;
pub mod request;
pub mod runner;
pub mod select;

#[cfg(test)]
pub mod testing;

pub use params::{operation_command, ParsedArgs};
pub use registry::{find_operation, registry, Impact};
pub use runner::{execute, Confirm, ExecutionOptions, Outcome};
