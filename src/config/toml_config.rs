use crate::core::directory::{DEFAULT_DIRECTORY_BASE_URL, DEFAULT_SML_ID, DEFAULT_TIMEOUT_SECONDS};
use crate::core::ConfigProvider;
use crate::domain::model::OutputMode;
use crate::i18n::Language;
use crate::render::OutputFormat;
use crate::utils::error::{LookupError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const MAX_TIMEOUT_SECONDS: u64 = 120;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LookupConfig {
    pub directory: DirectoryConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectoryConfig {
    pub base_url: String,
    pub sml_id: String,
    pub relay_url: Option<String>,
    pub timeout_seconds: u64,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_DIRECTORY_BASE_URL.to_string(),
            sml_id: DEFAULT_SML_ID.to_string(),
            relay_url: None,
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub mode: OutputMode,
    pub language: Language,
    pub format: OutputFormat,
}

impl LookupConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(LookupError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| LookupError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${PEPPOL_RELAY_URL})，未設定的變數保持原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| LookupError::ConfigError {
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn validate_config(&self) -> Result<()> {
        validation::validate_url("directory.base_url", &self.directory.base_url)?;
        validation::validate_non_empty_string("directory.sml_id", &self.directory.sml_id)?;

        if let Some(relay_url) = self.relay_url() {
            validation::validate_url("directory.relay_url", relay_url)?;
        }

        validation::validate_range(
            "directory.timeout_seconds",
            self.directory.timeout_seconds,
            1,
            MAX_TIMEOUT_SECONDS,
        )?;

        Ok(())
    }

    pub fn format(&self) -> OutputFormat {
        self.output.format
    }
}

impl ConfigProvider for LookupConfig {
    fn directory_base_url(&self) -> &str {
        &self.directory.base_url
    }

    fn sml_id(&self) -> &str {
        &self.directory.sml_id
    }

    fn relay_url(&self) -> Option<&str> {
        self.directory
            .relay_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }

    fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.directory.timeout_seconds)
    }

    fn output_mode(&self) -> OutputMode {
        self.output.mode
    }

    fn language(&self) -> Language {
        self.output.language
    }
}

impl Validate for LookupConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
