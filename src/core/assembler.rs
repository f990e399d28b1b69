use crate::core::inference::{is_government_channel, HERMES_MIGRATION_URL};
use crate::domain::facets::DirectoryFacets;
use crate::domain::model::{
    FieldValue, LookupReport, OutputMode, ParticipantReport, ReconciledPair, ReportView,
    ResolvedParticipant,
};
use chrono::Utc;

/// Existence as reported, or assumed when only the other facets answered.
///
/// Without an existence answer a business card or catalogue counts as proof of
/// existence, which can misreport a participant that was since removed.
pub fn existence_flag(facets: &DirectoryFacets) -> bool {
    match &facets.existence {
        Ok(existence) => existence.exists,
        Err(_) => facets.business_card.is_ok() || facets.catalogue.is_ok(),
    }
}

pub fn participant_report(participant: &ResolvedParticipant) -> ParticipantReport {
    ParticipantReport {
        scheme: participant.scheme,
        participant_id: participant.participant_id.clone(),
        company_name: FieldValue::or_not_available(participant.company_name.as_deref()),
        country: FieldValue::or_not_available(participant.country.as_deref()),
        location: FieldValue::or_not_available(participant.location.as_deref()),
        note: FieldValue::or_not_available(participant.note.as_deref()),
        technical_contact: FieldValue::or_not_available(
            participant.technical_contact.as_deref(),
        ),
        hosting_uri: FieldValue::or_not_available(participant.hosting_uri.as_deref()),
        access_point: FieldValue::or_not_available(participant.access_point.as_deref()),
        provider: match FieldValue::or_not_available(participant.provider.as_deref()) {
            FieldValue::NotAvailable => FieldValue::Unknown,
            value => value,
        },
        service_endpoint: FieldValue::or_not_available(participant.service_endpoint.as_deref()),
        document_types: participant.document_types.clone(),
        exists: participant.exists,
    }
}

/// The record shown in the legacy single-record mode.
fn primary_side(pair: &ReconciledPair) -> &ResolvedParticipant {
    if !pair.enterprise.exists && pair.vat.exists {
        &pair.vat
    } else {
        &pair.enterprise
    }
}

pub fn assemble(query: &str, pair: &ReconciledPair, mode: OutputMode) -> LookupReport {
    let government_provider = pair
        .sides()
        .into_iter()
        .filter_map(|p| p.provider.as_deref())
        .find(|provider| is_government_channel(Some(*provider)));

    let view = match (government_provider, mode) {
        (Some(provider), _) => {
            tracing::info!("Participant {} is on the government channel", query);
            ReportView::GovernmentChannel {
                provider: provider.to_string(),
                migration_url: HERMES_MIGRATION_URL.to_string(),
            }
        }
        (None, OutputMode::Pair) => ReportView::Pair {
            enterprise: participant_report(&pair.enterprise),
            vat: participant_report(&pair.vat),
        },
        (None, OutputMode::Single) => ReportView::Single {
            participant: participant_report(primary_side(pair)),
        },
    };

    LookupReport {
        query: query.to_string(),
        looked_up_at: Utc::now(),
        view,
    }
}
