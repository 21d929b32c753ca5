//! Tool gating by tier capability.

use wrenchwise_core::{ModelTier, ToolDeclaration};

/// `requested` when the tier supports tools, otherwise nothing.
pub fn resolve_tools(tier: &ModelTier, requested: &[ToolDeclaration]) -> Vec<ToolDeclaration> {
    if tier.supports_tools {
        requested.to_vec()
    } else {
        Vec::new()
    }
}
