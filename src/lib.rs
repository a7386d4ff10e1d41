pub mod analytics;
pub mod config;
pub mod format;
pub mod generator;
pub mod input;
pub mod models;
pub mod output;

// Re-export commonly used types
pub use analytics::{Analyzer, ReportSet};
pub use config::{Conditions, Config, PopulationConfig};
pub use generator::LogGenerator;
pub use input::LogReader;
pub use models::{Action, Port, Protocol, Record, User};
pub use output::{OutputFormat, ReportWriter};
