pub mod error;
pub mod export;
pub mod format;
pub mod logfile;
pub mod models;

pub use error::{ConfigError, ExportError, PersistenceError, SamplerError};
pub use export::{ExportFormat, SessionReporter};
pub use logfile::LogFile;
pub use models::{SessionSnapshot, UsageEntry, WindowKey};
