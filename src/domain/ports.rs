use crate::domain::facets::{DirectoryFacets, ServiceDetail};
use crate::domain::model::{CanonicalIdentifier, OutputMode};
use crate::i18n::Language;
use crate::utils::error::Result;
use async_trait::async_trait;
use std::time::Duration;

pub trait ConfigProvider: Send + Sync {
    fn directory_base_url(&self) -> &str;
    fn sml_id(&self) -> &str;
    fn relay_url(&self) -> Option<&str>;
    fn request_timeout(&self) -> Duration;
    fn output_mode(&self) -> OutputMode;
    fn language(&self) -> Language;
}

/// Read-only access to the participant directory.
#[async_trait]
pub trait Directory: Send + Sync {
    /// Never fails as a whole; each facet carries its own outcome.
    async fn fetch_facets(&self, identifier: &CanonicalIdentifier) -> DirectoryFacets;

    async fn fetch_service_detail(
        &self,
        identifier: &CanonicalIdentifier,
        document_type_id: &str,
    ) -> Result<ServiceDetail>;
}
