use std::error::Error;
use std::path::PathBuf;
use std::time::Instant;
use structopt::StructOpt;

use netlog::analytics::Analyzer;
use netlog::format::{natural_size, precise_delta};
use netlog::input::LogReader;
use netlog::output::{OutputFormat, ReportWriter};

/// Access-log analytics reporter
#[derive(StructOpt, Debug)]
#[structopt(name = "log_analyzer", about = "Analyses a given log file.")]
struct Opt {
    /// File to be analysed
    #[structopt(short, long)]
    file: PathBuf,

    /// Report format: "console" or "json"
    #[structopt(long, default_value = "console")]
    format: OutputFormat,

    /// Write the reports to this file instead of stdout
    #[structopt(short, long)]
    output: Option<PathBuf>,
}

fn main() {
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let start = Instant::now();
    let opt = Opt::from_args();

    if !opt.file.exists() {
        eprintln!("File not found: {:?}", opt.file);
        std::process::exit(1);
    }

    if let Err(e) = run(&opt) {
        report_error(e.as_ref());
        std::process::exit(1);
    }

    println!("Process done in {}.", precise_delta(start.elapsed()));
}

fn run(opt: &Opt) -> Result<(), Box<dyn Error>> {
    let reader = LogReader::new(opt.file.clone());
    let analyzer = Analyzer::new(reader.read_records()?);

    let mut writer = ReportWriter::new(opt.format, opt.output.clone())?;
    writer.write_reports(&analyzer.report())?;

    println!();
    println!("Log file size: {}", natural_size(reader.file_size()?));
    Ok(())
}

fn report_error(err: &dyn Error) {
    log::error!("Analysis failed: {}", err);
    eprintln!("Error: {}", err);
    let mut source = err.source();
    while let Some(cause) = source {
        eprintln!("  caused by: {}", cause);
        source = cause.source();
    }
}
