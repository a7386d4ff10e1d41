use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

use super::{ModelError, Port, User};

/// Timestamp layout used by the date and time fields of a log line
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const FIELD_COUNT: usize = 8;

/// Disposition of a logged request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    Allow,
    Deny,
    Bypass,
    #[serde(rename = "Log-only")]
    LogOnly,
}

impl Action {
    pub const ALL: [Action; 4] = [Action::Allow, Action::Deny, Action::Bypass, Action::LogOnly];

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Allow => "Allow",
            Action::Deny => "Deny",
            Action::Bypass => "Bypass",
            Action::LogOnly => "Log-only",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Action::ALL
            .into_iter()
            .find(|action| action.as_str() == s)
            .ok_or_else(|| ModelError::Parse(format!("unknown action '{}'", s)))
    }
}

/// One access-log entry
///
/// `source_ip` is drawn from the user's addresses once, when the record is
/// built, and is the identity used when grouping records by source.
/// `dest` is an IP address; hostname destinations are rejected when parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub timestamp: NaiveDateTime,
    pub port: Port,
    pub user: User,
    pub source_ip: IpAddr,
    pub dest: IpAddr,
    pub action: Action,
}

impl Record {
    /// Build a record; `source_ip` must be one of the user's addresses
    pub fn new(
        timestamp: NaiveDateTime,
        port: Port,
        user: User,
        source_ip: IpAddr,
        dest: IpAddr,
        action: Action,
    ) -> Result<Self, ModelError> {
        if !user.owns_ip(&source_ip) {
            return Err(ModelError::ForeignSourceIp {
                user: user.username().to_string(),
                ip: source_ip.to_string(),
            });
        }

        Ok(Record {
            timestamp,
            port,
            user,
            source_ip,
            dest,
            action,
        })
    }

    pub fn username(&self) -> &str {
        self.user.username()
    }

    /// Serialize into the space-separated log line form
    pub fn to_line(&self) -> String {
        self.to_string()
    }

    /// Parse a log line produced by [`Record::to_line`]
    pub fn from_line(line: &str) -> Result<Self, ModelError> {
        line.parse()
    }

    fn parse_ip(field: &str, what: &str) -> Result<IpAddr, ModelError> {
        field
            .parse()
            .map_err(|e| ModelError::Parse(format!("bad {} '{}': {}", what, field, e)))
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {} {} {} {}",
            self.timestamp.format(TIMESTAMP_FORMAT),
            self.source_ip,
            self.dest,
            self.port.number,
            self.port.protocol,
            self.user.username(),
            self.action
        )
    }
}

impl FromStr for Record {
    type Err = ModelError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim_end_matches(['\r', '\n']);
        let fields: Vec<&str> = line.split(' ').collect();
        if fields.len() != FIELD_COUNT {
            return Err(ModelError::Parse(format!(
                "expected {} fields, found {}",
                FIELD_COUNT,
                fields.len()
            )));
        }

        let raw_timestamp = format!("{} {}", fields[0], fields[1]);
        let timestamp = NaiveDateTime::parse_from_str(&raw_timestamp, TIMESTAMP_FORMAT)
            .map_err(|e| ModelError::Parse(format!("bad timestamp '{}': {}", raw_timestamp, e)))?;

        let source_ip = Self::parse_ip(fields[2], "source IP")?;
        let dest = Self::parse_ip(fields[3], "destination")?;
        let port = Port::parse_fields(fields[4], fields[5])?;
        let user = User::new(fields[6], vec![source_ip])
            .map_err(|_| ModelError::Parse(format!("invalid username '{}'", fields[6])))?;
        let action = fields[7].parse()?;

        Record::new(timestamp, port, user, source_ip, dest, action)
    }
}
