//! Constrained-random access-log generator
//!
//! Builds a fixed user population on the first `generate` call, then
//! synthesizes records day by day across the configured period so that each
//! day's action mix and rush-hour share follow the [`Conditions`](crate::config::Conditions).

pub mod names;
pub mod population;
pub mod schedule;

pub use population::PORT_CATALOG;
pub use schedule::DayPlan;

use chrono::{Duration, Timelike};
use indicatif::{ProgressBar, ProgressStyle};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use thiserror::Error;

use crate::config::{Config, ConfigError};
use crate::models::{Action, ModelError, Record, User};

/// Errors that can occur while generating a log
#[derive(Error, Debug)]
pub enum GeneratorError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Hour {0} is outside the day")]
    InvalidHour(u32),

    #[error("User population is empty")]
    NoUsers,
}

/// Most records reserved up-front; larger logs grow as they are generated
const MAX_RESERVED_RECORDS: usize = 1 << 16;

fn reserved_capacity(lines_count: usize) -> usize {
    lines_count.min(MAX_RESERVED_RECORDS)
}

/// Per-action record counts of a generated log
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionMix {
    counts: HashMap<Action, usize>,
}

impl ActionMix {
    pub fn from_records(records: &[Record]) -> Self {
        let mut counts = HashMap::new();
        for record in records {
            *counts.entry(record.action).or_insert(0) += 1;
        }
        ActionMix { counts }
    }

    pub fn count(&self, action: Action) -> usize {
        self.counts.get(&action).copied().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    /// Share of `action` in percent, 0 for an empty log
    pub fn percent(&self, action: Action) -> f64 {
        match self.total() {
            0 => 0.0,
            total => self.count(action) as f64 * 100.0 / total as f64,
        }
    }
}

/// Synthesizes access-log records under a set of statistical constraints
pub struct LogGenerator {
    config: Config,
    users: Vec<User>,
    rng: StdRng,
    show_progress: bool,
}

impl LogGenerator {
    /// Create a generator seeded from OS entropy
    pub fn new(config: Config) -> Result<Self, GeneratorError> {
        Self::with_rng(config, StdRng::from_entropy())
    }

    /// Create a generator with a fixed seed for reproducible output
    pub fn with_seed(config: Config, seed: u64) -> Result<Self, GeneratorError> {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(config: Config, rng: StdRng) -> Result<Self, GeneratorError> {
        config.validate()?;

        Ok(LogGenerator {
            config,
            users: Vec::new(),
            rng,
            show_progress: false,
        })
    }

    /// Show progress bars on stderr while building users, generating and writing
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// The user population; empty until the first call to `generate`
    pub fn users(&self) -> &[User] {
        &self.users
    }

    /// Build the user population once, before the first records are drawn
    fn populate(&mut self) -> Result<(), GeneratorError> {
        if !self.users.is_empty() {
            return Ok(());
        }

        let settings = &self.config.population;
        let progress = self.progress_bar(settings.user_count as u64, "Generating users");
        self.users = population::generate_users(
            &mut self.rng,
            settings,
            self.config.conditions.user_ip_count_limit,
            &progress,
        )?;
        progress.finish_and_clear();

        let ip_count: usize = self.users.iter().map(|u| u.ip_addresses().len()).sum();
        log::info!("Generated {} users owning {} source IPs", self.users.len(), ip_count);
        Ok(())
    }

    /// Generate roughly `lines_count` records spread evenly over the period
    pub fn generate(&mut self, lines_count: usize) -> Result<Vec<Record>, GeneratorError> {
        self.populate()?;

        let conditions = self.config.conditions.clone();
        let day_count = conditions.day_span();
        let lines_per_day = lines_count as f64 / day_count as f64;
        let plan = DayPlan::new(&conditions, lines_per_day);
        log::debug!("{} days, {:.2} lines per day", day_count, plan.lines_per_day());

        let progress = self.progress_bar(day_count as u64, "Generating logs");
        let mut records = Vec::with_capacity(reserved_capacity(lines_count));

        for day in 0..day_count {
            let day_start = conditions.start_date + Duration::days(day);
            let mut day_records = Vec::new();

            while !plan.is_complete(day_records.len()) {
                let produced = day_records.len();
                let hour = plan.hour_for(&mut self.rng, produced);
                let timestamp = day_start
                    .with_hour(hour)
                    .ok_or(GeneratorError::InvalidHour(hour))?;

                day_records.push(self.random_record(timestamp, plan.action_for(produced))?);
            }

            log::debug!("{}: {} records", day_start.date(), day_records.len());
            records.append(&mut day_records);
            progress.inc(1);
        }

        progress.finish_and_clear();
        Ok(records)
    }

    /// Write records to `path`, one line each
    pub fn write_records(&self, records: &[Record], path: &Path) -> Result<(), GeneratorError> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        let progress = self.progress_bar(records.len() as u64, "Writing records");

        for record in records {
            writeln!(writer, "{}", record)?;
            progress.inc(1);
        }

        writer.flush()?;
        progress.finish_and_clear();
        Ok(())
    }

    /// Generate `lines_count` records and write them to `path`
    pub fn generate_to_file(
        &mut self,
        lines_count: usize,
        path: &Path,
    ) -> Result<ActionMix, GeneratorError> {
        let records = self.generate(lines_count)?;
        self.write_records(&records, path)?;

        let mix = ActionMix::from_records(&records);
        log::info!(
            "Wrote {} records: Allow {:.1}%, Deny {:.1}%, Bypass {:.1}%, Log-only {:.1}%",
            mix.total(),
            mix.percent(Action::Allow),
            mix.percent(Action::Deny),
            mix.percent(Action::Bypass),
            mix.percent(Action::LogOnly),
        );
        Ok(mix)
    }

    fn random_record(
        &mut self,
        timestamp: chrono::NaiveDateTime,
        action: Action,
    ) -> Result<Record, GeneratorError> {
        let port = population::random_port(&mut self.rng);
        let user = self
            .users
            .choose(&mut self.rng)
            .cloned()
            .ok_or(GeneratorError::NoUsers)?;
        let source_ip = user.pick_ip(&mut self.rng);
        let dest = population::random_ip(&mut self.rng);

        Ok(Record::new(timestamp, port, user, source_ip, dest, action)?)
    }

    fn progress_bar(&self, len: u64, message: &'static str) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }

        let progress = ProgressBar::new(len);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{msg:<18} {percent:>3}%|{bar:40.cyan/blue}| {pos}/{len} [{elapsed_precise}]")
        {
            progress.set_style(style.progress_chars("#>-"));
        }
        progress.set_message(message);
        progress
    }
}
