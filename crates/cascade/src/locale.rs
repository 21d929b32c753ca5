//! Fixed localized strings emitted by the cascade.

use wrenchwise_core::Language;

/// Markers that open each global rule line, in order.
pub const RULE_MARKERS: [&str; 4] = ["[LANGUAGE]", "[TONE]", "[FORMAT]", "[SAFETY]"];

const RULES_EN: [&str; 4] = [
    "[LANGUAGE] Always respond in English, whatever language the user writes in.",
    "[TONE] Stay in character and keep the tone described above.",
    "[FORMAT] Format answers as structured Markdown: short headings, numbered steps, bullet lists for tools and materials.",
    "[SAFETY] For high-voltage, gas, brake or other hazardous work, put safety guidance first and recommend a qualified professional.",
];

const RULES_DE: [&str; 4] = [
    "[LANGUAGE] Antworte immer auf Deutsch, egal in welcher Sprache der Nutzer schreibt.",
    "[TONE] Bleib in deiner Rolle und behalte den oben beschriebenen Ton bei.",
    "[FORMAT] Formatiere Antworten als strukturiertes Markdown: kurze Überschriften, nummerierte Schritte, Listen für Werkzeug und Material.",
    "[SAFETY] Stelle bei Hochspannung, Gas, Bremsen oder anderen gefährlichen Arbeiten Sicherheitshinweise an den Anfang und empfiehl eine Fachkraft.",
];

/// Global behavioral rules appended to every persona instruction.
pub fn global_rules(language: Language) -> &'static [&'static str] {
    match language {
        Language::En => &RULES_EN,
        Language::De => &RULES_DE,
    }
}

/// Heading placed above the global rules.
pub fn rules_heading(language: Language) -> &'static str {
    match language {
        Language::En => "Global rules:",
        Language::De => "Allgemeine Regeln:",
    }
}

/// Preface emitted before any model output when a hazard keyword matched.
pub fn safety_warning(language: Language) -> &'static str {
    match language {
        Language::En => {
            "⚠️ Safety first: this may involve dangerous work. Switch off power, gas or the \
             vehicle before you start, and call a qualified professional if in doubt."
        }
        Language::De => {
            "⚠️ Sicherheit geht vor: Hier kann es gefährlich werden. Schalte Strom, Gas oder \
             das Fahrzeug vorher ab und ziehe im Zweifel eine Fachkraft hinzu."
        }
    }
}

/// Notice shown when the cascade moves from one tier to the next.
pub fn transition_notice(language: Language, from: &str, to: &str) -> String {
    match language {
        Language::En => format!("\n\n_{from} is at capacity, continuing with {to}…_\n\n"),
        Language::De => format!("\n\n_{from} ist ausgelastet, weiter mit {to}…_\n\n"),
    }
}

/// The single terminal failure message.
pub fn failure_message(language: Language) -> &'static str {
    match language {
        Language::En => {
            "Sorry, I can't answer right now. Please try again in a few minutes."
        }
        Language::De => {
            "Entschuldigung, ich kann gerade nicht antworten. Bitte versuche es in ein paar \
             Minuten noch einmal."
        }
    }
}
