use crate::analytics::ReportSet;
use std::fmt::{self, Write as _};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

/// Errors that can occur while writing reports
#[derive(Error, Debug)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Formatting error: {0}")]
    Format(#[from] fmt::Error),

    #[error("Unknown output format '{0}', expected 'console' or 'json'")]
    UnknownFormat(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Console,
    Json,
}

impl FromStr for OutputFormat {
    type Err = OutputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "console" => Ok(OutputFormat::Console),
            "json" => Ok(OutputFormat::Json),
            _ => Err(OutputError::UnknownFormat(s.to_string())),
        }
    }
}

/// Renders analysis reports to stdout or a file
pub struct ReportWriter {
    format: OutputFormat,
    writer: Option<Box<dyn Write>>,
}

impl ReportWriter {
    /// Create a report writer; without a path reports go to stdout
    pub fn new(format: OutputFormat, file_path: Option<PathBuf>) -> Result<Self, OutputError> {
        let writer: Option<Box<dyn Write>> = match file_path {
            Some(path) => Some(Box::new(BufWriter::new(File::create(path)?))),
            None => None,
        };

        Ok(ReportWriter { format, writer })
    }

    /// Write all reports
    pub fn write_reports(&mut self, reports: &ReportSet) -> Result<(), OutputError> {
        let output = self.render(reports)?;
        match &mut self.writer {
            Some(writer) => {
                writer.write_all(output.as_bytes())?;
                writer.flush()?;
            }
            None => {
                let mut stdout = io::stdout().lock();
                stdout.write_all(output.as_bytes())?;
                stdout.flush()?;
            }
        }
        Ok(())
    }

    pub fn render(&self, reports: &ReportSet) -> Result<String, OutputError> {
        match self.format {
            OutputFormat::Json => Ok(format!("{}\n", serde_json::to_string_pretty(reports)?)),
            OutputFormat::Console => {
                let mut out = String::new();
                render_console(reports, &mut out)?;
                Ok(out)
            }
        }
    }
}

fn render_console(reports: &ReportSet, out: &mut String) -> fmt::Result {
    writeln!(out, "Top 10 Allowed source IPs")?;
    for (i, entry) in reports.top_allowed_ips.iter().enumerate() {
        writeln!(out, "{} - {}", i + 1, entry.ip)?;
    }

    writeln!(out, "\nTop 10 Denied Users")?;
    for (i, user) in reports.top_denied_users.iter().enumerate() {
        writeln!(out, "{} - {}", i + 1, user.username)?;
        for dest in &user.top_destinations {
            writeln!(out, "    -> {} ({} requests)", dest.ip, dest.requests)?;
        }
    }

    writeln!(out)?;
    match reports.bypass.tcp_percent {
        Some(percent) => {
            writeln!(out, "Percentage of Bypassed TCP services: {:.2}%", percent)?;
            writeln!(out, "Top 5 bypassed services")?;
            for (i, service) in reports.bypass.top_services.iter().enumerate() {
                writeln!(out, "{} - {} ({} requests)", i + 1, service.port, service.requests)?;
            }
        }
        None => writeln!(out, "Something went wrong, it seems like the file is empty.")?,
    }

    writeln!(out, "\nTop 5 hours within the log file duration")?;
    for hour in &reports.rush_hours {
        writeln!(out, "time: {}, requests: {}", hour.time, hour.requests)?;
    }

    Ok(())
}
