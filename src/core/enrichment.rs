use crate::core::assembler::existence_flag;
use crate::core::inference::{apply_fallbacks, scan_endpoints};
use crate::domain::facets::{DirectoryFacets, ServiceEntry};
use crate::domain::model::ResolvedParticipant;
use crate::domain::ports::Directory;

/// Participant built from the summary facets only.
pub fn base_participant(facets: &DirectoryFacets) -> ResolvedParticipant {
    let mut participant = ResolvedParticipant::new(&facets.identifier);

    participant.existence_answer = facets.existence.as_ref().ok().map(|e| e.exists);
    participant.exists = existence_flag(facets);
    participant.hosting_uri = facets.hosting_uri().map(str::to_string);
    participant.document_types = facets.service_entries().to_vec();

    if let Some(entity) = facets
        .effective_business_card()
        .and_then(|card| card.primary_entity())
    {
        participant.company_name = entity.display_name().map(str::to_string);
        participant.country = non_empty(entity.countrycode.as_deref());
        participant.location = non_empty(entity.geoinfo.as_deref());
        participant.note = non_empty(entity.additionalinfo.as_deref());
        participant.technical_contact = entity.contact_address().map(str::to_string);
    }

    participant
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Invoice document family first, otherwise the first catalogue entry.
pub fn select_document_type(entries: &[ServiceEntry]) -> Option<&ServiceEntry> {
    let candidates = || entries.iter().filter(|e| !e.document_type_id.is_empty());
    candidates()
        .find(|e| e.is_invoice())
        .or_else(|| candidates().next())
}

/// 以第二次查詢補上技術聯絡人與 access point；任何失敗都只記錄，不影響整體結果
pub async fn enrich<D>(
    directory: &D,
    facets: &DirectoryFacets,
    mut participant: ResolvedParticipant,
) -> ResolvedParticipant
where
    D: Directory + ?Sized,
{
    match select_document_type(facets.service_entries()) {
        None => {
            tracing::debug!(
                "No service catalogue for {}, skipping detail enrichment",
                facets.identifier
            );
        }
        Some(entry) => {
            tracing::debug!(
                "Enriching {} via document type {}",
                facets.identifier,
                entry.document_type_id
            );

            match directory
                .fetch_service_detail(&facets.identifier, &entry.document_type_id)
                .await
            {
                Ok(detail) => {
                    let state =
                        scan_endpoints(detail.endpoint_details(), participant.country.as_deref());
                    state.apply_to(&mut participant);
                }
                Err(e) => {
                    tracing::warn!(
                        "{} for {}, keeping base information",
                        e,
                        facets.identifier
                    );
                }
            }
        }
    }

    apply_fallbacks(&mut participant);
    participant
}
