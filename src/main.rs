use clap::Parser;
use simplelog::{ConfigBuilder, WriteLogger};
use std::fs::{self, File};
use std::path::PathBuf;
use waypoint::console;
use waypoint::core::config::{self, CliOverrides};

#[derive(Parser)]
#[command(name = "waypoint", about = "Console host for a navigation hierarchy")]
struct Args {
    /// Log level: off, error, warn, info, debug, trace
    #[arg(short, long)]
    log_level: Option<String>,

    /// Directory holding the navigation snapshot
    #[arg(short, long)]
    state_dir: Option<PathBuf>,

    /// Ignore any saved snapshot for this run
    #[arg(long)]
    fresh: bool,
}

fn main() -> std::io::Result<()> {
    let args = Args::parse();

    let file_config = config::load_config().unwrap_or_else(|e| {
        eprintln!("warning: {e}, using defaults");
        Default::default()
    });
    let cli = CliOverrides {
        log_level: args.log_level,
        state_dir: args.state_dir,
        fresh: args.fresh,
    };
    let base = config::base_dir().unwrap_or_else(|| PathBuf::from("."));
    let resolved = config::resolve(&file_config, &cli, &base);

    let log_config = ConfigBuilder::new()
        .set_time_format_rfc3339()
        .build();

    if let Some(parent) = resolved.log_file.parent() {
        let _ = fs::create_dir_all(parent);
    }
    if let Ok(log_file) = File::create(&resolved.log_file) {
        let _ = WriteLogger::init(resolved.log_level, log_config, log_file);
    }

    log::info!(
        "Waypoint starting up, state in {}",
        resolved.state_dir.display()
    );

    console::run(resolved)
}
