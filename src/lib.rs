// Library interface for the sportrs modules
// This allows integration tests to access the core functionality

pub mod aggregate;
pub mod codec;
pub mod config;
pub mod error;
pub mod export;
pub mod filter;
pub mod import;
pub mod logging;
pub mod mapping;
pub mod models;
pub mod session;
pub mod units;

// Re-export commonly used types for convenience
pub use aggregate::{aggregate_by_period, dataset_kpis, rollup_by_activity, PeriodKey};
pub use error::{ImportError, Result, SportRsError};
pub use filter::{ActivityFilter, DateRange, FilterOutcome, FilterWarning, TypeSelection};
pub use import::{BatchConfig, BatchOutcome, ImportManager, ImportedData};
pub use logging::{LogConfig, LogFormat, LogLevel};
pub use mapping::{build_mapping, CanonicalField, FieldMapping, MappingOutcome};
pub use models::*;
pub use session::{InputFingerprint, SessionState};
