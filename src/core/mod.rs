pub mod assembler;
pub mod directory;
pub mod enrichment;
pub mod inference;
pub mod lookup;
pub mod normalizer;
pub mod reconcile;

pub use crate::domain::model::{LookupReport, ReconciledPair, ResolvedParticipant};
pub use crate::domain::ports::{ConfigProvider, Directory};
pub use crate::utils::error::Result;
