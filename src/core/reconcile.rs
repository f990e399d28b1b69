use crate::core::inference::apply_fallbacks;
use crate::domain::model::{ReconciledPair, ResolvedParticipant};

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map(|v| v.trim().is_empty()).unwrap_or(true)
}

/// Returns which side received the value, if any.
fn fill_gap(left: &mut Option<String>, right: &mut Option<String>) -> Option<&'static str> {
    match (is_blank(left), is_blank(right)) {
        (true, false) => {
            *left = right.clone();
            Some("enterprise")
        }
        (false, true) => {
            *right = left.clone();
            Some("vat")
        }
        _ => None,
    }
}

/// 雙向補齊兩個 scheme 的結果，只做一次，不迭代
pub fn reconcile(enterprise: ResolvedParticipant, vat: ResolvedParticipant) -> ReconciledPair {
    let mut enterprise = enterprise;
    let mut vat = vat;

    let shared: [(&str, &mut Option<String>, &mut Option<String>); 9] = [
        ("company_name", &mut enterprise.company_name, &mut vat.company_name),
        ("country", &mut enterprise.country, &mut vat.country),
        ("location", &mut enterprise.location, &mut vat.location),
        ("note", &mut enterprise.note, &mut vat.note),
        ("technical_contact", &mut enterprise.technical_contact, &mut vat.technical_contact),
        ("hosting_uri", &mut enterprise.hosting_uri, &mut vat.hosting_uri),
        ("access_point", &mut enterprise.access_point, &mut vat.access_point),
        ("provider", &mut enterprise.provider, &mut vat.provider),
        ("service_endpoint", &mut enterprise.service_endpoint, &mut vat.service_endpoint),
    ];

    for (name, left, right) in shared {
        if let Some(side) = fill_gap(left, right) {
            tracing::debug!("Reconciled '{}' into the {} result", name, side);
        }
    }

    if enterprise.document_types.is_empty() {
        enterprise.document_types = vat.document_types.clone();
    } else if vat.document_types.is_empty() {
        vat.document_types = enterprise.document_types.clone();
    }

    apply_fallbacks(&mut enterprise);
    apply_fallbacks(&mut vat);

    ReconciledPair { enterprise, vat }
}
