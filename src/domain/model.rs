use crate::domain::facets::ServiceEntry;
use crate::utils::error::{LookupError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const PARTICIPANT_ID_SCHEME: &str = "iso6523-actorid-upis";

/// Peppol 參與者識別碼的編碼方案
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Scheme {
    /// Belgian enterprise number (KBO/BCE)
    #[serde(rename = "0208")]
    Enterprise,
    /// Belgian VAT number
    #[serde(rename = "9925")]
    Vat,
}

impl Scheme {
    pub fn code(&self) -> &'static str {
        match self {
            Scheme::Enterprise => "0208",
            Scheme::Vat => "9925",
        }
    }

    /// Country prefix embedded in the identifier value, if the scheme carries one.
    pub fn country_prefix(&self) -> Option<&'static str> {
        match self {
            Scheme::Enterprise => None,
            Scheme::Vat => Some("BE"),
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalIdentifier {
    scheme: Scheme,
    body: String,
}

impl CanonicalIdentifier {
    /// `body` must be exactly 10 ASCII digits.
    pub fn new(scheme: Scheme, body: &str) -> Result<Self> {
        if body.len() != 10 || !body.bytes().all(|b| b.is_ascii_digit()) {
            return Err(LookupError::InvalidFormat {
                input: body.to_string(),
            });
        }

        Ok(Self {
            scheme,
            body: body.to_string(),
        })
    }

    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    /// `0208:0123456749` or `9925:BE0123456749`
    pub fn value(&self) -> String {
        format!(
            "{}:{}{}",
            self.scheme.code(),
            self.scheme.country_prefix().unwrap_or(""),
            self.body
        )
    }

    pub fn participant_id(&self) -> String {
        format!("{}::{}", PARTICIPANT_ID_SCHEME, self.value())
    }
}

impl fmt::Display for CanonicalIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.participant_id())
    }
}

/// Pipeline output for one canonical identifier.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedParticipant {
    pub scheme: Scheme,
    pub participant_id: String,
    pub company_name: Option<String>,
    pub country: Option<String>,
    pub location: Option<String>,
    pub note: Option<String>,
    pub technical_contact: Option<String>,
    pub hosting_uri: Option<String>,
    pub access_point: Option<String>,
    pub provider: Option<String>,
    pub service_endpoint: Option<String>,
    pub document_types: Vec<ServiceEntry>,
    pub exists: bool,
    /// Raw answer of the existence facet, `None` when that facet was unavailable.
    #[serde(skip)]
    pub existence_answer: Option<bool>,
}

impl ResolvedParticipant {
    pub fn new(identifier: &CanonicalIdentifier) -> Self {
        Self {
            scheme: identifier.scheme(),
            participant_id: identifier.participant_id(),
            company_name: None,
            country: None,
            location: None,
            note: None,
            technical_contact: None,
            hosting_uri: None,
            access_point: None,
            provider: None,
            service_endpoint: None,
            document_types: Vec::new(),
            exists: false,
            existence_answer: None,
        }
    }

    pub fn is_country(&self, code: &str) -> bool {
        self.country
            .as_deref()
            .map(|c| c.eq_ignore_ascii_case(code))
            .unwrap_or(false)
    }
}

/// The two scheme results after cross-scheme gap filling.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReconciledPair {
    pub enterprise: ResolvedParticipant,
    pub vat: ResolvedParticipant,
}

impl ReconciledPair {
    pub fn sides(&self) -> [&ResolvedParticipant; 2] {
        [&self.enterprise, &self.vat]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    /// Two side-by-side records, one per scheme
    #[default]
    Pair,
    /// Legacy single merged record
    Single,
}

/// Assembled field: either a value or an explicit sentinel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldValue {
    Value(String),
    NotAvailable,
    Unknown,
}

impl FieldValue {
    pub fn or_not_available(value: Option<&str>) -> Self {
        match value {
            Some(v) if !v.trim().is_empty() => FieldValue::Value(v.to_string()),
            _ => FieldValue::NotAvailable,
        }
    }

    pub fn as_value(&self) -> Option<&str> {
        match self {
            FieldValue::Value(v) => Some(v),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParticipantReport {
    pub scheme: Scheme,
    pub participant_id: String,
    pub company_name: FieldValue,
    pub country: FieldValue,
    pub location: FieldValue,
    pub note: FieldValue,
    pub technical_contact: FieldValue,
    pub hosting_uri: FieldValue,
    pub access_point: FieldValue,
    pub provider: FieldValue,
    pub service_endpoint: FieldValue,
    pub document_types: Vec<ServiceEntry>,
    pub exists: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum ReportView {
    /// Terminal view: participant still on the government channel
    GovernmentChannel {
        provider: String,
        migration_url: String,
    },
    Pair {
        enterprise: ParticipantReport,
        vat: ParticipantReport,
    },
    Single {
        participant: ParticipantReport,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LookupReport {
    pub query: String,
    pub looked_up_at: DateTime<Utc>,
    #[serde(flatten)]
    pub view: ReportView,
}
