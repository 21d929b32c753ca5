//! System-instruction assembly.

use wrenchwise_core::{AgentPersona, Language};

use crate::locale;

/// Failures while assembling an instruction.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PromptError {
    #[error("persona '{persona}' has no system instruction for '{language}'")]
    MissingInstruction { persona: String, language: Language },
}

/// The persona's localized instruction followed by the global rules block.
pub fn build_instruction(
    persona: &AgentPersona,
    language: Language,
) -> Result<String, PromptError> {
    let instruction = persona.instruction(language).trim();
    if instruction.is_empty() {
        return Err(PromptError::MissingInstruction {
            persona: persona.id.clone(),
            language,
        });
    }

    let mut out = String::with_capacity(instruction.len() + 512);
    out.push_str(instruction);
    out.push_str("\n\n");
    out.push_str(locale::rules_heading(language));
    for rule in locale::global_rules(language) {
        out.push_str("\n- ");
        out.push_str(rule);
    }
    Ok(out)
}
