//! # Wrenchwise Core
//!
//! Domain types, the provider trait, and error definitions for the Wrenchwise
//! inference gateway. This crate has **no framework dependencies** beyond
//! serde and tokio's channel types; every other crate depends inward on it.

pub mod chunk;
pub mod error;
pub mod ladder;
pub mod language;
pub mod message;
pub mod persona;
pub mod provider;

// Re-export key types at crate root for ergonomics
pub use chunk::{NO_TIER, SendResult, StreamChunk};
pub use error::{Error, ProviderError, Result};
pub use ladder::{LadderError, ModelLadder, ModelTier};
pub use language::{Language, Localized};
pub use message::{ConversationTurn, Part, Role};
pub use persona::AgentPersona;
pub use provider::{
    GenerateRequest, GenerateResponse, Provider, ProviderChunk, ProviderStream, ToolDeclaration,
};
