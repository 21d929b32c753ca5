//! Model provider implementations for Wrenchwise.
//!
//! All providers implement the `wrenchwise_core::Provider` trait.
//! The factory selects the backend based on configuration.

pub mod factory;
pub mod gemini;
pub mod scripted;

pub use factory::build_from_config;
pub use gemini::GeminiProvider;
pub use scripted::{Script, ScriptedProvider};
