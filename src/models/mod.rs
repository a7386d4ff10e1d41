//! Access-log data model
//!
//! Value types shared by the generator and the analyzer, plus the
//! single-line text form every record is written to and read back from.

pub mod port;
pub mod record;
pub mod user;

pub use port::{Port, Protocol};
pub use record::{Action, Record, TIMESTAMP_FORMAT};
pub use user::{User, MAX_IPS_PER_USER};

use thiserror::Error;

/// Errors raised while building or parsing model values
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("Invalid username '{0}': expected letters, '_' or '.' only")]
    InvalidUsername(String),

    #[error("Invalid IP address count {0}: each user owns 1 or {max} source IPs", max = MAX_IPS_PER_USER)]
    InvalidIpCount(usize),

    #[error("Source IP {ip} does not belong to user '{user}'")]
    ForeignSourceIp { user: String, ip: String },

    #[error("Malformed log line: {0}")]
    Parse(String),
}
