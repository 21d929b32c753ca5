//! Supported response languages.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A locale the application supports end to end.
///
/// Every localized table (persona texts, rule blocks, notices) must carry an
/// entry for each variant listed in [`Language::ALL`].
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    De,
}

impl Language {
    /// All supported languages, in display order.
    pub const ALL: [Language; 2] = [Language::En, Language::De];

    /// ISO 639-1 code.
    pub fn code(self) -> &'static str {
        match self {
            Self::En => "en",
            Self::De => "de",
        }
    }

    /// The language's name in itself, used in prompts ("respond in ...").
    pub fn native_name(self) -> &'static str {
        match self {
            Self::En => "English",
            Self::De => "Deutsch",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported language '{0}' (expected one of: en, de)")]
pub struct UnsupportedLanguage(pub String);

impl FromStr for Language {
    type Err = UnsupportedLanguage;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "en" | "en-us" | "en-gb" | "english" => Ok(Self::En),
            "de" | "de-de" | "de-at" | "de-ch" | "german" | "deutsch" => Ok(Self::De),
            other => Err(UnsupportedLanguage(other.to_string())),
        }
    }
}

/// A string available in every supported language.
///
/// A missing or blank entry is a configuration error; see [`Localized::missing`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Localized {
    #[serde(default)]
    pub en: String,
    #[serde(default)]
    pub de: String,
}

impl Localized {
    pub fn new(en: impl Into<String>, de: impl Into<String>) -> Self {
        Self {
            en: en.into(),
            de: de.into(),
        }
    }

    /// The entry for `language`.
    pub fn get(&self, language: Language) -> &str {
        match language {
            Language::En => &self.en,
            Language::De => &self.de,
        }
    }

    /// Languages whose entry is empty or only whitespace.
    pub fn missing(&self) -> Vec<Language> {
        Language::ALL
            .into_iter()
            .filter(|lang| self.get(*lang).trim().is_empty())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_codes_and_region_tags() {
        assert_eq!("en".parse::<Language>().unwrap(), Language::En);
        assert_eq!("DE-at".parse::<Language>().unwrap(), Language::De);
        assert!("fr".parse::<Language>().is_err());
    }

    #[test]
    fn serializes_as_lowercase_code() {
        let json = serde_json::to_string(&Language::De).unwrap();
        assert_eq!(json, r#""de""#);
    }

    #[test]
    fn detects_missing_and_blank_entries() {
        let table = Localized::new("Hello", "   ");
        assert_eq!(table.missing(), vec![Language::De]);
        assert_eq!(table.get(Language::En), "Hello");
    }
}
