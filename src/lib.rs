pub mod config;
pub mod core;
pub mod domain;
pub mod i18n;
pub mod render;
pub mod utils;

#[cfg(feature = "relay")]
pub mod relay;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::LookupConfig;

pub use core::{directory::DirectoryClient, lookup::LookupEngine};
pub use domain::model::{LookupReport, OutputMode, ReportView};
pub use i18n::{I18n, Language};
pub use render::{OutputFormat, Renderer};
pub use utils::error::{LookupError, Result};
