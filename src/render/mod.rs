//! Terminal and JSON rendering of lookup reports.

use crate::domain::model::{FieldValue, LookupReport, ParticipantReport, ReportView};
use crate::i18n::{I18n, Language};
use crate::utils::error::{LookupError, Result};
use serde::{Deserialize, Serialize};
use std::fmt::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Renders reports and keeps the most recent one so a language switch can
/// redraw it without another lookup.
pub struct Renderer {
    i18n: I18n,
    format: OutputFormat,
    last: Option<LookupReport>,
}

impl Renderer {
    pub fn new(language: Language, format: OutputFormat) -> Self {
        Self {
            i18n: I18n::new(language),
            format,
            last: None,
        }
    }

    pub fn i18n(&self) -> &I18n {
        &self.i18n
    }

    pub fn language(&self) -> Language {
        self.i18n.language()
    }

    pub fn last_result(&self) -> Option<&LookupReport> {
        self.last.as_ref()
    }

    /// Stores the report as the last result, replacing any earlier one.
    pub fn render(&mut self, report: LookupReport) -> Result<String> {
        let output = self.render_report(&report)?;
        self.last = Some(report);
        Ok(output)
    }

    /// Switches language and redraws the last result, if there is one.
    pub fn set_language(&mut self, language: Language) -> Option<Result<String>> {
        self.i18n = I18n::new(language);
        tracing::debug!("Renderer language set to {}", language);
        self.last.as_ref().map(|report| self.render_report(report))
    }

    pub fn render_report(&self, report: &LookupReport) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(report)?),
            OutputFormat::Text => Ok(self.render_text(report)),
        }
    }

    pub fn render_error(&self, error: &LookupError) -> String {
        match self.format {
            OutputFormat::Json => serde_json::json!({
                "error": error.message_key(),
                "message": self.i18n.error_message(error),
            })
            .to_string(),
            OutputFormat::Text => format!("❌ {}", self.i18n.error_message(error)),
        }
    }

    fn render_text(&self, report: &LookupReport) -> String {
        match &report.view {
            ReportView::GovernmentChannel {
                provider,
                migration_url,
            } => format!(
                "⚠️  {}\n👉 {}\n",
                self.i18n.translate("government_warning", &[("provider", provider.as_str())]),
                self.i18n.translate("government_cta", &[("url", migration_url.as_str())])
            ),
            ReportView::Pair { enterprise, vat } => format!(
                "{}\n{}",
                self.panel("panel_enterprise", enterprise),
                self.panel("panel_vat", vat)
            ),
            ReportView::Single { participant } => self.panel("panel_single", participant),
        }
    }

    fn field(&self, value: &FieldValue) -> String {
        match value {
            FieldValue::Value(v) => v.clone(),
            FieldValue::NotAvailable => self.i18n.t("not_available"),
            FieldValue::Unknown => self.i18n.t("unknown"),
        }
    }

    fn panel(&self, title_key: &str, participant: &ParticipantReport) -> String {
        let t = |key: &str| self.i18n.t(key);
        let mut out = String::new();

        let _ = writeln!(out, "== {} ==", t(title_key));
        let rows = [
            ("label_company_name", &participant.company_name),
            ("label_country", &participant.country),
            ("label_location", &participant.location),
            ("label_note", &participant.note),
            ("label_technical_contact", &participant.technical_contact),
            ("label_hosting_uri", &participant.hosting_uri),
            ("label_access_point", &participant.access_point),
            ("label_provider", &participant.provider),
            ("label_service_endpoint", &participant.service_endpoint),
        ];
        let _ = writeln!(
            out,
            "{}: {}",
            t("label_participant_id"),
            participant.participant_id
        );
        for (key, value) in rows {
            let _ = writeln!(out, "{}: {}", t(key), self.field(value));
        }

        if participant.document_types.is_empty() {
            let _ = writeln!(
                out,
                "{}: {}",
                t("label_document_types"),
                t("not_available")
            );
        } else {
            let _ = writeln!(out, "{}:", t("label_document_types"));
            for entry in &participant.document_types {
                if entry.deprecated {
                    let _ = writeln!(out, "  - {} ({})", entry.label(), t("deprecated"));
                } else {
                    let _ = writeln!(out, "  - {}", entry.label());
                }
            }
        }

        let status = if participant.exists {
            t("status_registered")
        } else {
            t("status_not_registered")
        };
        let _ = writeln!(out, "{}: {}", t("label_status"), status);
        out
    }
}
