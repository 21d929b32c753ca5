//! Keyword-based safety preface.

use wrenchwise_config::DEFAULT_SAFETY_KEYWORDS;
use wrenchwise_core::Language;

use crate::locale;

/// Scans outbound user text for hazard keywords.
///
/// Matching is a case-insensitive substring test, so `gas` also fires on
/// `Gasse`. False positives are accepted; a missed warning is not.
#[derive(Debug, Clone)]
pub struct SafetyInterceptor {
    keywords: Vec<String>,
}

impl SafetyInterceptor {
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let keywords = keywords
            .into_iter()
            .map(|k| k.as_ref().trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();
        Self { keywords }
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    /// The localized warning plus a blank-line separator, when `text` mentions a hazard.
    pub fn check_risk(&self, text: &str, language: Language) -> Option<String> {
        let haystack = text.to_lowercase();
        let hit = self.keywords.iter().find(|k| haystack.contains(k.as_str()))?;
        tracing::debug!(keyword = %hit, "Safety keyword matched");
        Some(format!("{}\n\n", locale::safety_warning(language)))
    }
}

impl Default for SafetyInterceptor {
    fn default() -> Self {
        Self::new(DEFAULT_SAFETY_KEYWORDS)
    }
}
