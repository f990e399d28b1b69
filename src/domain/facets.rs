//! Wire shapes of the directory API responses, and the per-identifier facet bundle.

use crate::domain::model::CanonicalIdentifier;
use crate::utils::error::FacetError;
use serde::{Deserialize, Serialize};

pub type FacetOutcome<T> = std::result::Result<T, FacetError>;

/// `/ppidexistence/{sml}/{participant}`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExistenceFacet {
    #[serde(default)]
    pub exists: bool,
    #[serde(rename = "smpHostURI", default)]
    pub smp_host_uri: Option<String>,
}

/// `/businesscard/{sml}/{participant}`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BusinessCard {
    #[serde(default)]
    pub entity: Vec<BusinessEntity>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BusinessEntity {
    #[serde(default)]
    pub name: Vec<EntityName>,
    #[serde(default)]
    pub countrycode: Option<String>,
    #[serde(default)]
    pub geoinfo: Option<String>,
    #[serde(default)]
    pub additionalinfo: Option<String>,
    #[serde(default)]
    pub contact: Vec<EntityContact>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityName {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityContact {
    #[serde(rename = "type", default)]
    pub contact_type: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

impl BusinessCard {
    pub fn primary_entity(&self) -> Option<&BusinessEntity> {
        self.entity.first()
    }
}

impl BusinessEntity {
    pub fn display_name(&self) -> Option<&str> {
        self.name
            .first()
            .and_then(|n| n.name.as_deref())
            .filter(|n| !n.trim().is_empty())
    }

    /// First contact's name, falling back to its email.
    pub fn contact_address(&self) -> Option<&str> {
        let contact = self.contact.first()?;
        contact
            .name
            .as_deref()
            .filter(|v| !v.trim().is_empty())
            .or_else(|| contact.email.as_deref().filter(|v| !v.trim().is_empty()))
    }
}

/// `/smpquery/{sml}/{participant}?businessCard=true`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceCatalogue {
    #[serde(rename = "smpHostURI", default)]
    pub smp_host_uri: Option<String>,
    #[serde(default)]
    pub urls: Vec<ServiceEntry>,
    #[serde(rename = "businessCard", default)]
    pub business_card: Option<BusinessCard>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceEntry {
    #[serde(default)]
    pub href: Option<String>,
    #[serde(rename = "documentTypeID", default)]
    pub document_type_id: String,
    #[serde(rename = "niceName", default)]
    pub nice_name: Option<String>,
    #[serde(rename = "isDeprecated", default)]
    pub deprecated: bool,
}

impl ServiceEntry {
    /// Root element of the document type, e.g. `Invoice` for
    /// `busdox-docid-qns::urn:...:Invoice-2::Invoice##customization::2.1`.
    pub fn root_element(&self) -> &str {
        let syntax = self
            .document_type_id
            .split("##")
            .next()
            .unwrap_or_default();
        syntax.rsplit("::").next().unwrap_or(syntax).trim()
    }

    /// UBL or CII invoices. Invoice responses are `ApplicationResponse` documents.
    pub fn is_invoice(&self) -> bool {
        matches!(self.root_element(), "Invoice" | "CrossIndustryInvoice")
    }

    pub fn label(&self) -> &str {
        match self.nice_name.as_deref() {
            Some(name) if !name.trim().is_empty() => name,
            _ => &self.document_type_id,
        }
    }
}

/// `/smpquery/{sml}/{participant}/{documentType}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceDetail {
    #[serde(rename = "documentTypeID", default)]
    pub document_type_id: Option<String>,
    pub serviceinfo: ServiceInfo,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceInfo {
    #[serde(default)]
    pub processes: Vec<ProcessEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProcessEntry {
    #[serde(rename = "processID", default)]
    pub process_id: Option<String>,
    #[serde(default)]
    pub endpoints: Vec<EndpointEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointEntry {
    #[serde(default)]
    pub transport_profile: Option<String>,
    #[serde(default)]
    pub endpoint_reference: Option<String>,
    #[serde(default)]
    pub certificate_details: Option<CertificateDetails>,
    #[serde(default)]
    pub service_description: Option<String>,
    #[serde(default)]
    pub technical_contact_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CertificateDetails {
    #[serde(default)]
    pub subject: Option<String>,
}

impl ServiceDetail {
    /// Endpoint entries in document order, across all processes.
    pub fn endpoint_details(&self) -> impl Iterator<Item = EndpointDetail> + '_ {
        self.serviceinfo
            .processes
            .iter()
            .flat_map(|p| p.endpoints.iter())
            .map(EndpointDetail::from)
    }
}

/// Signals of a single endpoint entry that feed the inference rules.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EndpointDetail {
    pub technical_contact: Option<String>,
    pub endpoint_reference: Option<String>,
    pub certificate_organization: Option<String>,
    pub service_description: Option<String>,
}

impl From<&EndpointEntry> for EndpointDetail {
    fn from(entry: &EndpointEntry) -> Self {
        Self {
            technical_contact: non_empty(entry.technical_contact_url.as_deref()),
            endpoint_reference: non_empty(entry.endpoint_reference.as_deref()),
            certificate_organization: entry
                .certificate_details
                .as_ref()
                .and_then(|c| c.subject.as_deref())
                .and_then(subject_organization),
            service_description: non_empty(entry.service_description.as_deref()),
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// `O=` component of an X.500 subject such as `CN=PBE000123, O=Billit BV, C=BE`.
pub fn subject_organization(subject: &str) -> Option<String> {
    subject
        .split(',')
        .map(str::trim)
        .find_map(|part| {
            let (key, value) = part.split_once('=')?;
            key.trim().eq_ignore_ascii_case("O").then(|| value.trim())
        })
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// The three independently fetched facets for one identifier.
#[derive(Debug, Clone)]
pub struct DirectoryFacets {
    pub identifier: CanonicalIdentifier,
    pub existence: FacetOutcome<ExistenceFacet>,
    pub business_card: FacetOutcome<BusinessCard>,
    pub catalogue: FacetOutcome<ServiceCatalogue>,
}

impl DirectoryFacets {
    pub fn all_failed(&self) -> bool {
        self.existence.is_err() && self.business_card.is_err() && self.catalogue.is_err()
    }

    pub fn failures(&self) -> Vec<&FacetError> {
        [
            self.existence.as_ref().err(),
            self.business_card.as_ref().err(),
            self.catalogue.as_ref().err(),
        ]
        .into_iter()
        .flatten()
        .collect()
    }

    /// Summary business card, or the catalogue's embedded echo when the summary failed.
    pub fn effective_business_card(&self) -> Option<&BusinessCard> {
        self.business_card.as_ref().ok().or_else(|| {
            self.catalogue
                .as_ref()
                .ok()
                .and_then(|c| c.business_card.as_ref())
        })
    }

    pub fn hosting_uri(&self) -> Option<&str> {
        self.existence
            .as_ref()
            .ok()
            .and_then(|e| e.smp_host_uri.as_deref())
            .or_else(|| {
                self.catalogue
                    .as_ref()
                    .ok()
                    .and_then(|c| c.smp_host_uri.as_deref())
            })
            .filter(|u| !u.trim().is_empty())
    }

    pub fn service_entries(&self) -> &[ServiceEntry] {
        self.catalogue
            .as_ref()
            .map(|c| c.urls.as_slice())
            .unwrap_or(&[])
    }
}
