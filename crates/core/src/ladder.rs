//! The model ladder — the ordered list of tiers a cascade falls back through.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// One rung of the ladder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelTier {
    /// Opaque provider model identifier (e.g. "gemini-2.5-pro")
    pub id: String,

    /// Whether augmentation tools (web grounding, functions) may be sent to this tier
    pub supports_tools: bool,
}

impl ModelTier {
    /// A tier whose tool capability is derived from its identifier.
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        let supports_tools = is_pro_class(&id);
        Self { id, supports_tools }
    }

    /// A tier with an explicit tool capability.
    pub fn with_tools(id: impl Into<String>, supports_tools: bool) -> Self {
        Self {
            id: id.into(),
            supports_tools,
        }
    }
}

/// "pro"-class identifiers are the only ones with tool support by default.
pub fn is_pro_class(model_id: &str) -> bool {
    model_id.to_ascii_lowercase().contains("pro")
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LadderError {
    #[error("model ladder must contain at least one tier")]
    Empty,

    #[error("model tier #{0} has a blank identifier")]
    BlankId(usize),
}

/// A non-empty, totally ordered sequence of tiers. Index 0 is tried first.
///
/// Cheap to clone; the tiers are shared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelLadder {
    tiers: Arc<[ModelTier]>,
}

impl ModelLadder {
    pub fn new(tiers: Vec<ModelTier>) -> Result<Self, LadderError> {
        if tiers.is_empty() {
            return Err(LadderError::Empty);
        }
        if let Some(idx) = tiers.iter().position(|t| t.id.trim().is_empty()) {
            return Err(LadderError::BlankId(idx));
        }
        Ok(Self {
            tiers: tiers.into(),
        })
    }

    /// Build a ladder from bare identifiers, deriving tool support.
    pub fn from_ids<I, S>(ids: I) -> Result<Self, LadderError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(ids.into_iter().map(ModelTier::new).collect())
    }

    pub fn len(&self) -> usize {
        self.tiers.len()
    }

    /// Always false; kept for API symmetry with collections.
    pub fn is_empty(&self) -> bool {
        self.tiers.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&ModelTier> {
        self.tiers.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ModelTier> {
        self.tiers.iter()
    }

    pub fn tiers(&self) -> &[ModelTier] {
        &self.tiers
    }
}
