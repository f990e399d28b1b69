//! Access-point and software-provider inference.
//!
//! Endpoint entries are evaluated against [`ENDPOINT_RULES`] in order; each rule looks at the
//! entry's signals and the scan state so far and may produce one [`Effect`]. After the scan
//! (and again after cross-scheme reconciliation) [`FALLBACK_RULES`] fill whatever is left.

use crate::domain::facets::EndpointDetail;
use crate::domain::model::ResolvedParticipant;
use url::Url;

pub const HERMES_ACCESS_POINT: &str = "Hermes";
pub const HERMES_PROVIDER: &str = "Hermes (FPS BOSA)";
pub const HERMES_MIGRATION_URL: &str = "https://einvoice.belgium.be/en/article/choose-your-peppol-access-point";

pub const TEAMLEADER_ACCESS_POINT: &str = "Teamleader";
pub const TEAMLEADER_ENDPOINT: &str = "https://peppol.teamleader.eu/as4";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountryBrand {
    pub country: &'static str,
    pub brand: &'static str,
}

/// A known access-point operator and the substrings that identify it.
#[derive(Debug, Clone, Copy)]
pub struct Operator {
    pub name: &'static str,
    pub needles: &'static [&'static str],
    pub forced_provider: Option<&'static str>,
    pub country_brand: Option<CountryBrand>,
}

impl Operator {
    fn matches(&self, haystack: &str) -> bool {
        self.needles.iter().any(|n| haystack.contains(n))
    }
}

pub static OPERATORS: &[Operator] = &[
    Operator {
        name: HERMES_ACCESS_POINT,
        needles: &["hermes-belgium.be", "hermes.belgium.be"],
        forced_provider: Some(HERMES_PROVIDER),
        country_brand: None,
    },
    Operator {
        name: TEAMLEADER_ACCESS_POINT,
        needles: &["teamleader"],
        forced_provider: None,
        country_brand: None,
    },
    Operator {
        name: "Billit",
        needles: &["billit"],
        forced_provider: None,
        country_brand: None,
    },
    Operator {
        name: "Unifiedpost",
        needles: &["unifiedpost", "banqup"],
        forced_provider: None,
        country_brand: Some(CountryBrand {
            country: "BE",
            brand: "Banqup",
        }),
    },
    Operator {
        name: "Storecove",
        needles: &["storecove"],
        forced_provider: None,
        country_brand: None,
    },
    Operator {
        name: "Codabox",
        needles: &["codabox"],
        forced_provider: None,
        country_brand: None,
    },
    Operator {
        name: "Digiteal",
        needles: &["digiteal"],
        forced_provider: None,
        country_brand: None,
    },
    Operator {
        name: "e-invoice.be",
        needles: &["e-invoice.be"],
        forced_provider: None,
        country_brand: None,
    },
    Operator {
        name: "Pagero",
        needles: &["pagero"],
        forced_provider: None,
        country_brand: None,
    },
    Operator {
        name: "Basware",
        needles: &["basware"],
        forced_provider: None,
        country_brand: None,
    },
    Operator {
        name: "Tradeshift",
        needles: &["tradeshift"],
        forced_provider: None,
        country_brand: None,
    },
    Operator {
        name: "Babelway",
        needles: &["babelway"],
        forced_provider: None,
        country_brand: None,
    },
    Operator {
        name: "Odoo",
        needles: &["odoo"],
        forced_provider: None,
        country_brand: None,
    },
];

pub fn operator_matching(haystack: &str) -> Option<&'static Operator> {
    let haystack = haystack.to_ascii_lowercase();
    OPERATORS.iter().find(|op| op.matches(&haystack))
}

pub fn operator_named(name: &str) -> Option<&'static Operator> {
    OPERATORS
        .iter()
        .find(|op| op.name.eq_ignore_ascii_case(name))
}

/// Exact technical-contact addresses of known operators (lowercase, without `mailto:`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KnownContact {
    pub address: &'static str,
    pub access_point: &'static str,
    pub provider: &'static str,
    pub endpoint_override: Option<&'static str>,
    /// Pinned matches cannot be overridden by host or later contact matches.
    pub pinned: bool,
}

pub static KNOWN_CONTACTS: &[KnownContact] = &[
    KnownContact {
        address: "peppol@teamleader.eu",
        access_point: TEAMLEADER_ACCESS_POINT,
        provider: "Teamleader",
        endpoint_override: Some(TEAMLEADER_ENDPOINT),
        pinned: true,
    },
    KnownContact {
        address: "support@billit.be",
        access_point: "Billit",
        provider: "Billit",
        endpoint_override: None,
        pinned: false,
    },
    KnownContact {
        address: "peppol@unifiedpost.com",
        access_point: "Unifiedpost",
        provider: "Banqup",
        endpoint_override: None,
        pinned: false,
    },
    KnownContact {
        address: "support@storecove.com",
        access_point: "Storecove",
        provider: "Storecove",
        endpoint_override: None,
        pinned: false,
    },
    KnownContact {
        address: "peppol@codabox.com",
        access_point: "Codabox",
        provider: "CodaBox",
        endpoint_override: None,
        pinned: false,
    },
    KnownContact {
        address: "peppol@digiteal.eu",
        access_point: "Digiteal",
        provider: "Digiteal",
        endpoint_override: None,
        pinned: false,
    },
    KnownContact {
        address: "helpdesk@hermes-belgium.be",
        access_point: HERMES_ACCESS_POINT,
        provider: HERMES_PROVIDER,
        endpoint_override: None,
        pinned: false,
    },
];

/// Provider label by access-point name, used when no rule set one.
pub static PROVIDER_BY_ACCESS_POINT: &[(&str, &str)] = &[
    (HERMES_ACCESS_POINT, HERMES_PROVIDER),
    ("Unifiedpost", "Banqup"),
    ("Banqup", "Banqup"),
    ("Codabox", "CodaBox"),
    (TEAMLEADER_ACCESS_POINT, "Teamleader"),
];

pub fn strip_mailto(address: &str) -> &str {
    let trimmed = address.trim();
    match trimmed.get(..7) {
        Some(prefix) if prefix.eq_ignore_ascii_case("mailto:") => trimmed[7..].trim(),
        _ => trimmed,
    }
}

/// Lowercased host of a URI, or the lowercased input when it is not a URI.
///
/// `smp.example.eu:8080` parses with `smp.example.eu` as its scheme and no
/// host, so a host-less parse falls back to the authority of the raw input.
pub fn host_of(reference: &str) -> Option<String> {
    let reference = reference.trim();
    if reference.is_empty() {
        return None;
    }

    match Url::parse(reference) {
        Ok(url) => match url.host_str() {
            Some(host) => Some(host.to_ascii_lowercase()),
            None => bare_authority(reference),
        },
        Err(_) => Some(reference.to_ascii_lowercase()),
    }
}

fn bare_authority(reference: &str) -> Option<String> {
    let rest = reference
        .split_once("://")
        .map_or(reference, |(_, rest)| rest);
    let authority = rest
        .split(|c| matches!(c, '/' | ':' | '?' | '#'))
        .next()
        .unwrap_or_default()
        .trim();
    (!authority.is_empty()).then(|| authority.to_ascii_lowercase())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Contact,
    Host,
    Certificate,
    Description,
}

/// Normalized signals of one endpoint entry.
#[derive(Debug, Clone, Default)]
pub struct EntrySignals {
    /// Contact without `mailto:`, original case
    pub contact: Option<String>,
    /// Same, lowercased for comparisons
    pub contact_key: Option<String>,
    pub endpoint_reference: Option<String>,
    pub host: Option<String>,
    pub certificate_organization: Option<String>,
    pub description: Option<String>,
    pub country: Option<String>,
}

impl EntrySignals {
    pub fn from_detail(detail: &EndpointDetail, country: Option<&str>) -> Self {
        let contact = detail
            .technical_contact
            .as_deref()
            .map(strip_mailto)
            .filter(|c| !c.is_empty())
            .map(str::to_string);

        Self {
            contact_key: contact.as_ref().map(|c| c.to_ascii_lowercase()),
            contact,
            endpoint_reference: detail.endpoint_reference.clone(),
            host: detail.endpoint_reference.as_deref().and_then(host_of),
            certificate_organization: detail
                .certificate_organization
                .as_ref()
                .map(|o| o.to_ascii_lowercase()),
            description: detail
                .service_description
                .as_ref()
                .map(|d| d.to_ascii_lowercase()),
            country: country.map(|c| c.to_ascii_uppercase()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanState {
    pub technical_contact: Option<String>,
    pub access_point: Option<String>,
    pub access_point_signal: Option<Signal>,
    pub provider: Option<String>,
    pub service_endpoint: Option<String>,
    pub pinned: bool,
}

impl ScanState {
    /// Scanning stops once both a contact and an access point are known.
    pub fn is_complete(&self) -> bool {
        self.technical_contact.is_some() && self.access_point.is_some()
    }

    pub fn apply_to(self, participant: &mut ResolvedParticipant) {
        if let Some(contact) = self.technical_contact {
            participant.technical_contact = Some(contact);
        }
        if let Some(access_point) = self.access_point {
            participant.access_point = Some(access_point);
        }
        if let Some(provider) = self.provider {
            participant.provider = Some(provider);
        }
        if let Some(endpoint) = self.service_endpoint {
            participant.service_endpoint = Some(endpoint);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    RecordContact(String),
    RecordEndpoint(String),
    KnownOperator(&'static KnownContact),
    AccessPoint {
        name: &'static str,
        signal: Signal,
        forced_provider: Option<&'static str>,
    },
    Rebrand(&'static str),
}

impl Effect {
    pub fn apply(self, state: &mut ScanState) {
        match self {
            Effect::RecordContact(contact) => state.technical_contact = Some(contact),
            Effect::RecordEndpoint(endpoint) => state.service_endpoint = Some(endpoint),
            Effect::KnownOperator(known) => {
                state.access_point = Some(known.access_point.to_string());
                state.access_point_signal = Some(Signal::Contact);
                state.provider = Some(known.provider.to_string());
                if let Some(endpoint) = known.endpoint_override {
                    state.service_endpoint = Some(endpoint.to_string());
                }
                state.pinned |= known.pinned;
            }
            Effect::AccessPoint {
                name,
                signal,
                forced_provider,
            } => {
                state.access_point = Some(name.to_string());
                state.access_point_signal = Some(signal);
                if let Some(provider) = forced_provider {
                    state.provider = Some(provider.to_string());
                }
            }
            Effect::Rebrand(brand) => state.access_point = Some(brand.to_string()),
        }
    }
}

pub struct Rule {
    pub name: &'static str,
    pub evaluate: fn(&EntrySignals, &ScanState) -> Option<Effect>,
}

pub static ENDPOINT_RULES: &[Rule] = &[
    Rule {
        name: "technical-contact",
        evaluate: record_contact,
    },
    Rule {
        name: "endpoint-reference",
        evaluate: record_endpoint,
    },
    Rule {
        name: "known-contact",
        evaluate: known_contact,
    },
    Rule {
        name: "endpoint-host",
        evaluate: endpoint_host,
    },
    Rule {
        name: "country-brand",
        evaluate: country_brand,
    },
    Rule {
        name: "certificate-organization",
        evaluate: certificate_organization,
    },
    Rule {
        name: "service-description",
        evaluate: service_description,
    },
];

fn record_contact(signals: &EntrySignals, state: &ScanState) -> Option<Effect> {
    if state.technical_contact.is_some() {
        return None;
    }
    signals.contact.clone().map(Effect::RecordContact)
}

fn record_endpoint(signals: &EntrySignals, state: &ScanState) -> Option<Effect> {
    if state.service_endpoint.is_some() {
        return None;
    }
    signals.endpoint_reference.clone().map(Effect::RecordEndpoint)
}

fn known_contact(signals: &EntrySignals, state: &ScanState) -> Option<Effect> {
    let key = signals.contact_key.as_deref()?;
    let known = KNOWN_CONTACTS.iter().find(|k| k.address == key)?;

    if state.pinned || (state.access_point.is_some() && !known.pinned) {
        return None;
    }
    Some(Effect::KnownOperator(known))
}

fn endpoint_host(signals: &EntrySignals, state: &ScanState) -> Option<Effect> {
    if state.pinned {
        return None;
    }
    let overridable = match state.access_point_signal {
        None => true,
        Some(signal) => signal == Signal::Contact,
    };
    if !overridable {
        return None;
    }

    let operator = operator_matching(signals.host.as_deref()?)?;
    Some(Effect::AccessPoint {
        name: operator.name,
        signal: Signal::Host,
        forced_provider: operator.forced_provider,
    })
}

fn country_brand(signals: &EntrySignals, state: &ScanState) -> Option<Effect> {
    let brand = operator_named(state.access_point.as_deref()?)?.country_brand?;
    (signals.country.as_deref() == Some(brand.country)).then_some(Effect::Rebrand(brand.brand))
}

fn certificate_organization(signals: &EntrySignals, state: &ScanState) -> Option<Effect> {
    if state.access_point.is_some() {
        return None;
    }
    let operator = operator_matching(signals.certificate_organization.as_deref()?)?;
    Some(Effect::AccessPoint {
        name: operator.name,
        signal: Signal::Certificate,
        forced_provider: None,
    })
}

fn service_description(signals: &EntrySignals, state: &ScanState) -> Option<Effect> {
    if state.access_point.is_some() {
        return None;
    }
    let operator = operator_matching(signals.description.as_deref()?)?;
    Some(Effect::AccessPoint {
        name: operator.name,
        signal: Signal::Description,
        forced_provider: None,
    })
}

/// Runs every endpoint rule against one entry; returns the names of the rules that fired.
pub fn evaluate_entry(signals: &EntrySignals, state: &mut ScanState) -> Vec<&'static str> {
    let mut fired = Vec::new();
    for rule in ENDPOINT_RULES {
        if let Some(effect) = (rule.evaluate)(signals, state) {
            effect.apply(state);
            fired.push(rule.name);
        }
    }
    fired
}

/// 依序掃描 endpoint，contact 與 access point 都確定後即停止
pub fn scan_endpoints<I>(details: I, country: Option<&str>) -> ScanState
where
    I: IntoIterator<Item = EndpointDetail>,
{
    let mut state = ScanState::default();

    for (index, detail) in details.into_iter().enumerate() {
        let signals = EntrySignals::from_detail(&detail, country);
        let fired = evaluate_entry(&signals, &mut state);
        tracing::debug!("Endpoint entry {}: rules fired {:?}", index, fired);

        if state.is_complete() {
            tracing::debug!("Contact and access point known after entry {}", index);
            break;
        }
    }

    state
}

pub struct FallbackRule {
    pub name: &'static str,
    pub apply: fn(&mut ResolvedParticipant) -> bool,
}

/// Applied per participant after the scan and again after reconciliation.
pub static FALLBACK_RULES: &[FallbackRule] = &[
    FallbackRule {
        name: "hosting-uri",
        apply: hosting_uri_fallback,
    },
    FallbackRule {
        name: "country-brand",
        apply: apply_country_brand,
    },
    FallbackRule {
        name: "provider",
        apply: provider_fallback,
    },
];

/// Access point from the SMP hosting URI when nothing more specific matched.
pub fn hosting_uri_fallback(participant: &mut ResolvedParticipant) -> bool {
    if participant.access_point.is_some() {
        return false;
    }
    let Some(uri) = participant.hosting_uri.as_deref() else {
        return false;
    };
    let Some(host) = host_of(uri) else {
        return false;
    };

    let name = match operator_matching(&host) {
        Some(operator) => operator.name.to_string(),
        None => host.strip_prefix("www.").unwrap_or(&host).to_string(),
    };
    participant.access_point = Some(name);
    true
}

pub fn apply_country_brand(participant: &mut ResolvedParticipant) -> bool {
    let Some(brand) = participant
        .access_point
        .as_deref()
        .and_then(operator_named)
        .and_then(|op| op.country_brand)
    else {
        return false;
    };

    if !participant.is_country(brand.country) {
        return false;
    }
    participant.access_point = Some(brand.brand.to_string());
    true
}

/// Provider from the access point; the "unknown" marker is left to the assembler.
pub fn provider_fallback(participant: &mut ResolvedParticipant) -> bool {
    if participant.provider.is_some() {
        return false;
    }
    let Some(access_point) = participant.access_point.as_deref() else {
        return false;
    };

    let provider = PROVIDER_BY_ACCESS_POINT
        .iter()
        .find(|(ap, _)| ap.eq_ignore_ascii_case(access_point))
        .map(|(_, provider)| provider.to_string())
        .unwrap_or_else(|| access_point.to_string());
    participant.provider = Some(provider);
    true
}

pub fn apply_fallbacks(participant: &mut ResolvedParticipant) {
    for rule in FALLBACK_RULES {
        if (rule.apply)(participant) {
            tracing::debug!(
                "Fallback rule '{}' applied to {}",
                rule.name,
                participant.participant_id
            );
        }
    }
}

pub fn is_government_channel(provider: Option<&str>) -> bool {
    provider == Some(HERMES_PROVIDER)
}
