//! Aggregate reports over a loaded access log
//!
//! Every report is an independent single pass over the full record set.
//! Records are grouped by their `source_ip`, fixed when the record was
//! written, so repeated runs over the same file always agree.

pub mod counter;

pub use counter::TopCounter;

use chrono::NaiveTime;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::net::IpAddr;

use crate::models::{Action, Port, Protocol, Record};

pub const TOP_SOURCE_IPS: usize = 10;
pub const TOP_DENIED_USERS: usize = 10;
pub const TOP_DESTINATIONS: usize = 5;
pub const TOP_BYPASSED_SERVICES: usize = 5;
pub const TOP_HOURS: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IpCount {
    pub ip: IpAddr,
    pub requests: usize,
}

/// A denied source, named by the user of its first denied record
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeniedUser {
    pub username: String,
    pub source_ip: IpAddr,
    pub requests: usize,
    pub top_destinations: Vec<IpCount>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceCount {
    pub port: Port,
    pub requests: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BypassReport {
    pub total_records: usize,
    pub tcp_bypassed: usize,
    /// `None` when there are no records at all
    pub tcp_percent: Option<f64>,
    pub top_services: Vec<ServiceCount>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HourCount {
    pub time: NaiveTime,
    pub requests: usize,
}

/// The four reports, in print order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportSet {
    pub top_allowed_ips: Vec<IpCount>,
    pub top_denied_users: Vec<DeniedUser>,
    pub bypass: BypassReport,
    pub rush_hours: Vec<HourCount>,
}

/// Computes aggregate reports over an in-memory record set
pub struct Analyzer {
    records: Vec<Record>,
}

impl Analyzer {
    pub fn new(records: Vec<Record>) -> Self {
        Analyzer { records }
    }

    /// Most frequent source IPs across all records
    pub fn top_source_ips(&self, n: usize) -> Vec<IpCount> {
        self.records
            .iter()
            .map(|r| r.source_ip)
            .collect::<TopCounter<_>>()
            .most_common(n)
            .into_iter()
            .map(|(ip, requests)| IpCount { ip, requests })
            .collect()
    }

    /// Most frequent denied sources, each with its top destinations
    pub fn top_denied_users(&self, n: usize, destinations: usize) -> Vec<DeniedUser> {
        let mut sources = TopCounter::new();
        let mut details: HashMap<IpAddr, (&str, TopCounter<IpAddr>)> = HashMap::new();

        for record in self.records.iter().filter(|r| r.action == Action::Deny) {
            sources.add(record.source_ip);
            details
                .entry(record.source_ip)
                .or_insert_with(|| (record.username(), TopCounter::new()))
                .1
                .add(record.dest);
        }

        sources
            .most_common(n)
            .into_iter()
            .filter_map(|(source_ip, requests)| {
                let (username, dests) = details.get(&source_ip)?;
                Some(DeniedUser {
                    username: username.to_string(),
                    source_ip,
                    requests,
                    top_destinations: dests
                        .most_common(destinations)
                        .into_iter()
                        .map(|(ip, requests)| IpCount { ip, requests })
                        .collect(),
                })
            })
            .collect()
    }

    /// Share of TCP bypass records among all records, plus top bypassed services
    pub fn bypass_report(&self, services: usize) -> BypassReport {
        let bypassed: Vec<&Record> = self
            .records
            .iter()
            .filter(|r| r.action == Action::Bypass)
            .collect();
        let tcp_bypassed = bypassed
            .iter()
            .filter(|r| r.port.protocol == Protocol::Tcp)
            .count();

        let total_records = self.records.len();
        let tcp_percent = match total_records {
            0 => None,
            total => Some(tcp_bypassed as f64 * 100.0 / total as f64),
        };

        let top_services = bypassed
            .iter()
            .map(|r| r.port)
            .collect::<TopCounter<_>>()
            .most_common(services)
            .into_iter()
            .map(|(port, requests)| ServiceCount { port, requests })
            .collect();

        BypassReport {
            total_records,
            tcp_bypassed,
            tcp_percent,
            top_services,
        }
    }

    /// Busiest clock times, ignoring the date; ties go to the earlier time
    pub fn rush_hours(&self, n: usize) -> Vec<HourCount> {
        let mut by_time: BTreeMap<NaiveTime, usize> = BTreeMap::new();
        for record in &self.records {
            *by_time.entry(record.timestamp.time()).or_insert(0) += 1;
        }

        let mut hours: Vec<HourCount> = by_time
            .into_iter()
            .map(|(time, requests)| HourCount { time, requests })
            .collect();
        hours.sort_by(|a, b| b.requests.cmp(&a.requests));
        hours.truncate(n);
        hours
    }

    /// Run all four reports with their default sizes
    pub fn report(&self) -> ReportSet {
        ReportSet {
            top_allowed_ips: self.top_source_ips(TOP_SOURCE_IPS),
            top_denied_users: self.top_denied_users(TOP_DENIED_USERS, TOP_DESTINATIONS),
            bypass: self.bypass_report(TOP_BYPASSED_SERVICES),
            rush_hours: self.rush_hours(TOP_HOURS),
        }
    }
}
