//! Agent personas — the assistant "characters" a user can talk to.
//!
//! Personas are loaded once at startup and are read-only afterwards.

use crate::language::{Language, Localized};
use serde::{Deserialize, Serialize};

/// An assistant persona definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentPersona {
    /// Stable identifier (e.g. "electrician")
    pub id: String,

    /// Display name
    pub name: String,

    /// Short localized title shown in pickers
    pub title: Localized,

    /// Localized description
    pub description: Localized,

    /// Presentation-only icon name, passed through untouched
    #[serde(default)]
    pub icon: String,

    /// Presentation-only accent color, passed through untouched
    #[serde(default)]
    pub color: String,

    /// Localized system instruction describing the persona's role and tone
    pub system_instruction: Localized,

    /// Localized disclaimer shown alongside the persona
    pub warning: Localized,
}

impl AgentPersona {
    /// The persona's instruction text for `language`.
    pub fn instruction(&self, language: Language) -> &str {
        self.system_instruction.get(language)
    }

    /// Every `field/language` pair that is missing or blank.
    ///
    /// An empty result means the persona is complete for all supported languages.
    pub fn missing_entries(&self) -> Vec<String> {
        let fields = [
            ("title", &self.title),
            ("description", &self.description),
            ("system_instruction", &self.system_instruction),
            ("warning", &self.warning),
        ];

        fields
            .iter()
            .flat_map(|(field, table)| {
                table
                    .missing()
                    .into_iter()
                    .map(move |lang| format!("{field}/{lang}"))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn persona() -> AgentPersona {
        AgentPersona {
            id: "electrician".into(),
            name: "Volt".into(),
            title: Localized::new("Electrician", "Elektriker"),
            description: Localized::new("Wiring help", "Hilfe bei Verkabelung"),
            icon: "bolt".into(),
            color: "#f5c400".into(),
            system_instruction: Localized::new("You are an electrician.", "Du bist Elektriker."),
            warning: Localized::new("Hire a pro.", "Beauftrage einen Profi."),
        }
    }

    #[test]
    fn complete_persona_has_no_missing_entries() {
        assert!(persona().missing_entries().is_empty());
        assert_eq!(persona().instruction(Language::De), "Du bist Elektriker.");
    }

    #[test]
    fn reports_each_missing_field_and_language() {
        let mut p = persona();
        p.warning.de.clear();
        p.title = Localized::default();
        let missing = p.missing_entries();
        assert_eq!(missing, vec!["title/en", "title/de", "warning/de"]);
    }

    #[test]
    fn deserializes_without_presentation_fields() {
        let json = r#"{
            "id": "plumber",
            "name": "Pipa",
            "title": {"en": "Plumber", "de": "Installateur"},
            "description": {"en": "Pipes", "de": "Rohre"},
            "system_instruction": {"en": "You fix pipes.", "de": "Du reparierst Rohre."},
            "warning": {"en": "Shut off water.", "de": "Wasser abstellen."}
        }"#;
        let p: AgentPersona = serde_json::from_str(json).unwrap();
        assert!(p.icon.is_empty());
        assert!(p.missing_entries().is_empty());
    }
}
