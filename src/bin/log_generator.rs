use std::error::Error;
use std::path::PathBuf;
use std::time::Instant;
use structopt::StructOpt;

use netlog::config::Config;
use netlog::format::{natural_size, precise_delta};
use netlog::generator::LogGenerator;

/// Random access-log file generator
#[derive(StructOpt, Debug)]
#[structopt(name = "log_generator", about = "A random logs file generator tool")]
struct Opt {
    /// File to write generated content into
    #[structopt(short, long, default_value = "output.log")]
    output: PathBuf,

    /// Count of lines to be generated
    #[structopt(short, long, default_value = "100")]
    count: usize,

    /// TOML file with generation conditions and population shape
    #[structopt(long)]
    config: Option<PathBuf>,

    /// Write the default configuration to this path and exit
    #[structopt(long)]
    write_config: Option<PathBuf>,

    /// Seed for reproducible output
    #[structopt(long)]
    seed: Option<u64>,

    /// Hide progress bars
    #[structopt(short, long)]
    quiet: bool,
}

fn main() {
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let start = Instant::now();
    let opt = Opt::from_args();

    if let Err(e) = run(&opt) {
        report_error(e.as_ref());
        std::process::exit(1);
    }

    println!("Process done in {}", precise_delta(start.elapsed()));
}

fn run(opt: &Opt) -> Result<(), Box<dyn Error>> {
    if let Some(path) = &opt.write_config {
        Config::default().to_file(path)?;
        println!("Default configuration written to: {:?}", path);
        return Ok(());
    }

    let config = match &opt.config {
        Some(path) => {
            log::info!("Loading configuration from {:?}", path);
            Config::from_file(path)?
        }
        None => Config::default(),
    };

    let generator = match opt.seed {
        Some(seed) => LogGenerator::with_seed(config, seed)?,
        None => LogGenerator::new(config)?,
    };
    let mut generator = generator.with_progress(!opt.quiet);

    generator.generate_to_file(opt.count, &opt.output)?;
    println!("Records written into the file {}", opt.output.display());

    let size = std::fs::metadata(&opt.output)?.len();
    println!("Log file size: {}", natural_size(size));
    Ok(())
}

fn report_error(err: &dyn Error) {
    log::error!("Generation failed: {}", err);
    eprintln!("Error: {}", err);
    let mut source = err.source();
    while let Some(cause) = source {
        eprintln!("  caused by: {}", cause);
        source = cause.source();
    }
}
