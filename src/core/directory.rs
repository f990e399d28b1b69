use crate::domain::facets::{
    BusinessCard, DirectoryFacets, ExistenceFacet, FacetOutcome, ServiceCatalogue, ServiceDetail,
};
use crate::domain::model::CanonicalIdentifier;
use crate::domain::ports::{ConfigProvider, Directory};
use crate::utils::error::{FacetError, LookupError, Result};
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;

pub const DEFAULT_DIRECTORY_BASE_URL: &str = "https://peppol.helger.com/api";
/// Production SML
pub const DEFAULT_SML_ID: &str = "digitprod";
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 15;

/// The only upstream paths the relay forwards.
pub const RELAYABLE_PREFIXES: [&str; 3] = ["/ppidexistence/", "/businesscard/", "/smpquery/"];

pub fn is_relayable(endpoint: &str) -> bool {
    RELAYABLE_PREFIXES.iter().any(|p| endpoint.starts_with(p))
}

#[derive(Debug, Clone)]
pub struct DirectorySettings {
    pub base_url: String,
    pub sml_id: String,
    pub relay_url: Option<String>,
    pub timeout: Duration,
}

impl DirectorySettings {
    pub fn from_config<C: ConfigProvider>(config: &C) -> Self {
        Self {
            base_url: config.directory_base_url().trim_end_matches('/').to_string(),
            sml_id: config.sml_id().to_string(),
            relay_url: config.relay_url().map(str::to_string),
            timeout: config.request_timeout(),
        }
    }
}

impl Default for DirectorySettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_DIRECTORY_BASE_URL.to_string(),
            sml_id: DEFAULT_SML_ID.to_string(),
            relay_url: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECONDS),
        }
    }
}

/// Percent-encodes one path segment. A literal `+` is already `%2B`, so every
/// remaining `+` stands for a space.
pub fn encode_segment(value: &str) -> String {
    url::form_urlencoded::byte_serialize(value.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

/// Absorbed per-facet failure, as logged by `fetch_facets`.
pub fn facet_unavailable(error: &FacetError) -> LookupError {
    LookupError::FacetUnavailable(error.clone())
}

pub struct DirectoryClient {
    settings: DirectorySettings,
    client: Client,
}

impl DirectoryClient {
    pub fn new(settings: DirectorySettings) -> Result<Self> {
        let client = Client::builder()
            .timeout(settings.timeout)
            .user_agent(concat!("peppol-lookup/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { settings, client })
    }

    pub fn settings(&self) -> &DirectorySettings {
        &self.settings
    }

    pub fn existence_path(&self, identifier: &CanonicalIdentifier) -> String {
        format!(
            "/ppidexistence/{}/{}",
            self.settings.sml_id,
            encode_segment(&identifier.participant_id())
        )
    }

    pub fn business_card_path(&self, identifier: &CanonicalIdentifier) -> String {
        format!(
            "/businesscard/{}/{}",
            self.settings.sml_id,
            encode_segment(&identifier.participant_id())
        )
    }

    pub fn catalogue_path(&self, identifier: &CanonicalIdentifier) -> String {
        format!(
            "/smpquery/{}/{}?businessCard=true",
            self.settings.sml_id,
            encode_segment(&identifier.participant_id())
        )
    }

    pub fn service_detail_path(
        &self,
        identifier: &CanonicalIdentifier,
        document_type_id: &str,
    ) -> String {
        format!(
            "/smpquery/{}/{}/{}",
            self.settings.sml_id,
            encode_segment(&identifier.participant_id()),
            encode_segment(document_type_id)
        )
    }

    /// 先走 relay；relay 連不上時直接打上游一次，不再重試
    async fn send(&self, endpoint: &str) -> FacetOutcome<Response> {
        if let Some(relay_url) = self.settings.relay_url.as_deref() {
            match self
                .client
                .get(relay_url)
                .query(&[("endpoint", endpoint)])
                .send()
                .await
            {
                Ok(response) => return Ok(response),
                Err(e) => {
                    tracing::warn!("Relay unavailable ({}), retrying {} directly", e, endpoint);
                }
            }
        }

        let url = format!("{}{}", self.settings.base_url, endpoint);
        tracing::debug!("GET {}", url);

        self.client.get(&url).send().await.map_err(|e| {
            if e.is_connect() {
                FacetError::TransportBlocked
            } else {
                FacetError::Network {
                    message: e.to_string(),
                }
            }
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, endpoint: &str) -> FacetOutcome<T> {
        let response = self.send(endpoint).await?;
        let status = response.status();

        tracing::debug!("Directory response status for {}: {}", endpoint, status);

        if !status.is_success() {
            return Err(match status.as_u16() {
                404 => FacetError::NotFound,
                code if code >= 500 => FacetError::ServiceUnavailable { status: code },
                code => FacetError::UnexpectedStatus { status: code },
            });
        }

        response.json::<T>().await.map_err(|e| FacetError::Decode {
            message: e.to_string(),
        })
    }
}

#[async_trait]
impl Directory for DirectoryClient {
    async fn fetch_facets(&self, identifier: &CanonicalIdentifier) -> DirectoryFacets {
        let existence_path = self.existence_path(identifier);
        let business_card_path = self.business_card_path(identifier);
        let catalogue_path = self.catalogue_path(identifier);

        let (existence, business_card, catalogue) = tokio::join!(
            self.get_json::<ExistenceFacet>(&existence_path),
            self.get_json::<BusinessCard>(&business_card_path),
            self.get_json::<ServiceCatalogue>(&catalogue_path),
        );

        let facets = DirectoryFacets {
            identifier: identifier.clone(),
            existence,
            business_card,
            catalogue,
        };

        for (facet, outcome) in [
            ("existence", facets.existence.as_ref().err()),
            ("business card", facets.business_card.as_ref().err()),
            ("catalogue", facets.catalogue.as_ref().err()),
        ] {
            if let Some(error) = outcome.map(facet_unavailable) {
                tracing::debug!(
                    "{} for {} ({}, severity {:?})",
                    error,
                    identifier,
                    facet,
                    error.severity()
                );
            }
        }
        tracing::info!(
            "Fetched facets for {} ({} of 3 unavailable)",
            identifier,
            facets.failures().len()
        );

        facets
    }

    async fn fetch_service_detail(
        &self,
        identifier: &CanonicalIdentifier,
        document_type_id: &str,
    ) -> Result<ServiceDetail> {
        let path = self.service_detail_path(identifier, document_type_id);

        self.get_json::<ServiceDetail>(&path)
            .await
            .map_err(|e| LookupError::EnrichmentFailed {
                message: e.to_string(),
            })
    }
}
