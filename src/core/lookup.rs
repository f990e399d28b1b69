use crate::core::assembler::assemble;
use crate::core::directory::{DirectoryClient, DirectorySettings};
use crate::core::enrichment::{base_participant, enrich};
use crate::core::normalizer::{normalize, NormalizedInput};
use crate::core::reconcile::reconcile;
use crate::domain::facets::DirectoryFacets;
use crate::domain::model::{
    CanonicalIdentifier, LookupReport, OutputMode, ReconciledPair, ResolvedParticipant,
};
use crate::domain::ports::{ConfigProvider, Directory};
use crate::utils::error::{LookupError, Result};
use std::time::Instant;

/// 查詢引擎：正規化 → 兩個 scheme 並行查詢 → 合併 → 組裝
pub struct LookupEngine<D: Directory> {
    directory: D,
    mode: OutputMode,
}

impl LookupEngine<DirectoryClient> {
    pub fn from_config<C: ConfigProvider>(config: &C) -> Result<Self> {
        let client = DirectoryClient::new(DirectorySettings::from_config(config))?;
        Ok(Self::new(client, config.output_mode()))
    }
}

impl<D: Directory> LookupEngine<D> {
    pub fn new(directory: D, mode: OutputMode) -> Self {
        Self { directory, mode }
    }

    pub fn mode(&self) -> OutputMode {
        self.mode
    }

    pub async fn lookup(&self, input: &str) -> Result<LookupReport> {
        let started = Instant::now();
        let normalized = normalize(input)?;
        tracing::info!("Looking up {}", normalized.body);

        let pair = self.resolve_pair(&normalized).await?;
        let report = assemble(&normalized.body, &pair, self.mode);

        tracing::info!(
            "Lookup of {} finished in {} ms",
            normalized.body,
            started.elapsed().as_millis()
        );
        Ok(report)
    }

    /// Runs both scheme pipelines and merges them; fails only when the
    /// directory gave nothing usable.
    pub async fn resolve_pair(&self, input: &NormalizedInput) -> Result<ReconciledPair> {
        let ((enterprise_facets, enterprise), (vat_facets, vat)) = tokio::join!(
            self.resolve_scheme(&input.enterprise),
            self.resolve_scheme(&input.vat)
        );

        if let Some(error) = total_failure(&[&enterprise_facets, &vat_facets]) {
            tracing::error!("{} for {}", error, input.body);
            return Err(error);
        }

        if let Some(error) = not_registered(input, &enterprise, &vat) {
            tracing::info!("{}", error);
            return Err(error);
        }

        Ok(reconcile(enterprise, vat))
    }

    async fn resolve_scheme(
        &self,
        identifier: &CanonicalIdentifier,
    ) -> (DirectoryFacets, ResolvedParticipant) {
        let facets = self.directory.fetch_facets(identifier).await;
        let participant = base_participant(&facets);
        let participant = enrich(&self.directory, &facets, participant).await;
        (facets, participant)
    }
}

fn total_failure(sides: &[&DirectoryFacets]) -> Option<LookupError> {
    if !sides.iter().all(|facets| facets.all_failed()) {
        return None;
    }

    let blocked = sides
        .iter()
        .flat_map(|facets| facets.failures())
        .all(|e| e.is_transport_blocked());

    Some(if blocked {
        LookupError::TransportBlocked
    } else {
        LookupError::UpstreamUnavailable
    })
}

fn not_registered(
    input: &NormalizedInput,
    enterprise: &ResolvedParticipant,
    vat: &ResolvedParticipant,
) -> Option<LookupError> {
    let denied = [enterprise, vat]
        .iter()
        .any(|p| p.existence_answer == Some(false));

    if enterprise.exists || vat.exists || !denied {
        return None;
    }

    Some(LookupError::NotRegistered {
        participant: input.body.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::facets::{
        BusinessCard, BusinessEntity, EntityName, ExistenceFacet, ServiceCatalogue, ServiceDetail,
    };
    use crate::domain::model::{ReportView, Scheme};
    use crate::utils::error::FacetError;
    use async_trait::async_trait;
    use std::collections::HashMap;

    /// Canned facets per scheme, keyed by scheme code.
    struct CannedDirectory {
        facets: HashMap<&'static str, fn(CanonicalIdentifier) -> DirectoryFacets>,
    }

    #[async_trait]
    impl Directory for CannedDirectory {
        async fn fetch_facets(&self, identifier: &CanonicalIdentifier) -> DirectoryFacets {
            (self.facets[identifier.scheme().code()])(identifier.clone())
        }

        async fn fetch_service_detail(
            &self,
            _identifier: &CanonicalIdentifier,
            _document_type_id: &str,
        ) -> Result<ServiceDetail> {
            Err(LookupError::EnrichmentFailed {
                message: "not canned".to_string(),
            })
        }
    }

    fn failed(identifier: CanonicalIdentifier) -> DirectoryFacets {
        DirectoryFacets {
            identifier,
            existence: Err(FacetError::ServiceUnavailable { status: 503 }),
            business_card: Err(FacetError::ServiceUnavailable { status: 503 }),
            catalogue: Err(FacetError::Network {
                message: "connection reset".to_string(),
            }),
        }
    }

    fn blocked(identifier: CanonicalIdentifier) -> DirectoryFacets {
        DirectoryFacets {
            identifier,
            existence: Err(FacetError::TransportBlocked),
            business_card: Err(FacetError::TransportBlocked),
            catalogue: Err(FacetError::TransportBlocked),
        }
    }

    fn absent(identifier: CanonicalIdentifier) -> DirectoryFacets {
        DirectoryFacets {
            identifier,
            existence: Ok(ExistenceFacet {
                exists: false,
                smp_host_uri: None,
            }),
            business_card: Err(FacetError::NotFound),
            catalogue: Err(FacetError::NotFound),
        }
    }

    fn registered(identifier: CanonicalIdentifier) -> DirectoryFacets {
        DirectoryFacets {
            identifier,
            existence: Err(FacetError::ServiceUnavailable { status: 500 }),
            business_card: Ok(BusinessCard {
                entity: vec![BusinessEntity {
                    name: vec![EntityName {
                        name: Some("Acme BV".to_string()),
                        language: None,
                    }],
                    ..Default::default()
                }],
            }),
            catalogue: Ok(ServiceCatalogue {
                smp_host_uri: Some("https://smp.billit.be".to_string()),
                ..Default::default()
            }),
        }
    }

    fn registered_be(identifier: CanonicalIdentifier) -> DirectoryFacets {
        let mut facets = absent(identifier);
        facets.business_card = Ok(BusinessCard {
            entity: vec![BusinessEntity {
                countrycode: Some("BE".to_string()),
                ..Default::default()
            }],
        });
        facets.existence = Ok(ExistenceFacet {
            exists: true,
            smp_host_uri: None,
        });
        facets
    }

    fn engine(
        enterprise: fn(CanonicalIdentifier) -> DirectoryFacets,
        vat: fn(CanonicalIdentifier) -> DirectoryFacets,
    ) -> LookupEngine<CannedDirectory> {
        let mut facets: HashMap<&'static str, fn(CanonicalIdentifier) -> DirectoryFacets> =
            HashMap::new();
        facets.insert(Scheme::Enterprise.code(), enterprise);
        facets.insert(Scheme::Vat.code(), vat);
        LookupEngine::new(CannedDirectory { facets }, OutputMode::Pair)
    }

    #[tokio::test]
    async fn test_invalid_input_fails_before_any_query() {
        let result = engine(failed, failed).lookup("12345").await;
        assert!(matches!(result, Err(LookupError::InvalidFormat { .. })));
    }

    #[tokio::test]
    async fn test_all_facets_failing_is_upstream_unavailable() {
        let result = engine(failed, failed).lookup("0123456749").await;
        assert!(matches!(result, Err(LookupError::UpstreamUnavailable)));
    }

    #[tokio::test]
    async fn test_blocked_transport_is_reported_distinctly() {
        let result = engine(blocked, blocked).lookup("0123456749").await;
        assert!(matches!(result, Err(LookupError::TransportBlocked)));

        let result = engine(blocked, failed).lookup("0123456749").await;
        assert!(matches!(result, Err(LookupError::UpstreamUnavailable)));
    }

    #[tokio::test]
    async fn test_one_failing_scheme_is_absorbed() {
        let report = engine(registered, failed).lookup("BE0123456749").await.unwrap();

        match report.view {
            ReportView::Pair { enterprise, vat } => {
                assert!(enterprise.exists);
                assert!(!vat.exists);
                assert_eq!(vat.company_name.as_value(), Some("Acme BV"));
                assert_eq!(enterprise.access_point.as_value(), Some("Billit"));
            }
            other => panic!("unexpected view: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_explicitly_absent_on_both_schemes_is_not_registered() {
        let result = engine(absent, absent).lookup("0123.456.749").await;
        match result {
            Err(LookupError::NotRegistered { participant }) => {
                assert_eq!(participant, "0123456749")
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_country_merged_across_schemes() {
        let report = engine(absent, registered_be).lookup("0123456749").await.unwrap();

        match report.view {
            ReportView::Pair { enterprise, vat } => {
                assert_eq!(enterprise.country.as_value(), Some("BE"));
                assert_eq!(vat.country.as_value(), Some("BE"));
                assert!(!enterprise.exists);
                assert!(vat.exists);
            }
            other => panic!("unexpected view: {:?}", other),
        }
    }
}
