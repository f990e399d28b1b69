//! Message dictionaries for the terminal output.
//!
//! Lookups never fail: a missing key renders as the key itself, and
//! `{{name}}` placeholders are replaced from the supplied variables.

use crate::utils::error::{LookupError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

const EN: &str = include_str!("locales/en.json");
const NL: &str = include_str!("locales/nl.json");
const FR: &str = include_str!("locales/fr.json");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Nl,
    Fr,
}

impl Language {
    pub const ALL: [Language; 3] = [Language::En, Language::Nl, Language::Fr];

    pub fn code(&self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Nl => "nl",
            Language::Fr => "fr",
        }
    }

    pub fn supported_codes() -> Vec<&'static str> {
        Self::ALL.iter().map(Language::code).collect()
    }

    fn source(&self) -> &'static str {
        match self {
            Language::En => EN,
            Language::Nl => NL,
            Language::Fr => FR,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = LookupError;

    fn from_str(s: &str) -> Result<Self> {
        let code = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|lang| lang.code() == code)
            .ok_or_else(|| LookupError::InvalidConfigValueError {
                field: "language".to_string(),
                value: s.to_string(),
                reason: format!("Supported languages: {}", Self::supported_codes().join(", ")),
            })
    }
}

fn load_dictionary(language: Language) -> Result<HashMap<String, String>> {
    Ok(serde_json::from_str(language.source())?)
}

#[derive(Debug, Clone)]
pub struct I18n {
    language: Language,
    dict: HashMap<String, String>,
}

impl I18n {
    /// Falls back to English when a dictionary cannot be parsed.
    pub fn new(language: Language) -> Self {
        match load_dictionary(language) {
            Ok(dict) => Self { language, dict },
            Err(e) if language != Language::En => {
                tracing::warn!("Loading '{}' messages failed ({}), using en", language, e);
                Self::new(Language::En)
            }
            Err(e) => {
                tracing::error!("Loading en messages failed: {}", e);
                Self {
                    language,
                    dict: HashMap::new(),
                }
            }
        }
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn translate(&self, key: &str, vars: &[(&str, &str)]) -> String {
        let mut text = self
            .dict
            .get(key)
            .cloned()
            .unwrap_or_else(|| key.to_string());

        for (name, value) in vars {
            text = text.replace(&format!("{{{{{}}}}}", name), value);
        }
        text
    }

    pub fn t(&self, key: &str) -> String {
        self.translate(key, &[])
    }

    pub fn error_message(&self, error: &LookupError) -> String {
        let details = error.to_string();
        let participant = match error {
            LookupError::NotRegistered { participant } => participant.as_str(),
            _ => "",
        };
        self.translate(
            error.message_key(),
            &[("participant", participant), ("details", details.as_str())],
        )
    }
}

impl Default for I18n {
    fn default() -> Self {
        Self::new(Language::default())
    }
}
