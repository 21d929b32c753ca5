//! # Wrenchwise Cascade
//!
//! Turns a user turn plus conversation history into one unified chunk stream,
//! falling back through an ordered ladder of model tiers when the provider
//! runs out of capacity.
//!
//! Leaves first:
//! - [`prompt`] assembles the system instruction
//! - [`safety`] produces the safety preface
//! - [`history`] bounds the forwarded history
//! - [`tools`] gates tools by tier capability
//! - [`classify`] sorts provider failures
//! - [`executor`] runs the cascade

pub mod classify;
pub mod executor;
pub mod history;
pub mod locale;
pub mod prompt;
pub mod safety;
pub mod tools;

pub use classify::{ErrorKind, classify};
pub use executor::{CascadeStream, DEFAULT_HISTORY_LIMIT, ModelCascadeExecutor};
pub use history::truncate;
pub use prompt::{PromptError, build_instruction};
pub use safety::SafetyInterceptor;
pub use tools::resolve_tools;
