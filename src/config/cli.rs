use crate::config::toml_config::LookupConfig;
use crate::domain::model::OutputMode;
use crate::render::OutputFormat;
use crate::utils::error::Result;
use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "peppol-lookup")]
#[command(about = "Look up a Belgian company on the Peppol e-invoicing network")]
pub struct CliConfig {
    /// Enterprise or VAT number, e.g. BE0123456749. Omit for interactive mode.
    pub number: Option<String>,

    #[arg(long, short, help = "TOML configuration file")]
    pub config: Option<PathBuf>,

    #[arg(long, help = "Directory API base URL")]
    pub base_url: Option<String>,

    #[arg(long, help = "Relay URL tried before the directory")]
    pub relay_url: Option<String>,

    #[arg(long, value_parser = ["en", "nl", "fr"])]
    pub lang: Option<String>,

    #[arg(long, help = "Show a single merged record instead of one per scheme")]
    pub single: bool,

    #[arg(long, help = "Print the report as JSON")]
    pub json: bool,

    #[arg(long, short, help = "Enable verbose output")]
    pub verbose: bool,
}

impl CliConfig {
    /// Configuration file (or defaults) with command line flags applied on top.
    pub fn resolve(&self) -> Result<LookupConfig> {
        let mut config = match &self.config {
            Some(path) => {
                tracing::debug!("Loading configuration from {}", path.display());
                LookupConfig::from_file(path)?
            }
            None => LookupConfig::default(),
        };
        self.apply_to(&mut config)?;
        Ok(config)
    }

    pub fn apply_to(&self, config: &mut LookupConfig) -> Result<()> {
        if let Some(base_url) = &self.base_url {
            config.directory.base_url = base_url.clone();
        }
        if let Some(relay_url) = &self.relay_url {
            config.directory.relay_url = Some(relay_url.clone());
        }
        if let Some(lang) = &self.lang {
            config.output.language = lang.parse()?;
        }
        if self.single {
            config.output.mode = OutputMode::Single;
        }
        if self.json {
            config.output.format = OutputFormat::Json;
        }
        Ok(())
    }
}
