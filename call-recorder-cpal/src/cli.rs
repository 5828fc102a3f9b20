use std::path::PathBuf;

use call_recorder_core::{ConfigError, RecorderConfiguration};
use clap::{ArgAction, Parser, Subcommand};
use log::LevelFilter;

#[derive(Parser, Debug)]
#[command(name = "call-recorder", author, version, about = "Record call sessions to raw PCM and play them back")]
pub struct Cli {
    /// Recordings directory (overrides the configuration file)
    #[arg(short, long, global = true, value_name = "DIR")]
    pub dir: Option<PathBuf>,

    /// JSON configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// List recordings, oldest first
    List,

    /// List output devices usable with `play --device`
    Devices,

    /// Play a recording through an output device
    Play {
        /// File name inside the recordings directory, or a path to a .raw file
        file: PathBuf,

        /// Output device name (default: the host's default output)
        #[arg(long, value_name = "NAME")]
        device: Option<String>,
    },

    /// Record the default microphone as a call session
    Record {
        /// Session identifier embedded in the file name
        #[arg(short, long)]
        session: String,

        /// Seconds to record
        #[arg(short = 't', long, default_value_t = 10)]
        seconds: u64,
    },
}

impl Cli {
    pub fn log_level(&self) -> LevelFilter {
        match self.verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }

    /// Resolve the effective configuration: file (if any), then `--dir`,
    /// falling back to the per-user data directory.
    pub fn load_config(&self) -> Result<RecorderConfiguration, ConfigError> {
        let config = match &self.config {
            Some(path) => RecorderConfiguration::from_json_file(path)?,
            None => RecorderConfiguration::default().with_recordings_dir(default_recordings_dir()),
        };
        Ok(match &self.dir {
            Some(dir) => config.with_recordings_dir(dir.clone()),
            None => config,
        })
    }
}

/// `<data_dir>/call-recorder/recordings`, or `./recordings` when the
/// platform has no data directory.
pub fn default_recordings_dir() -> PathBuf {
    dirs::data_dir()
        .map(|d| d.join("call-recorder").join("recordings"))
        .unwrap_or_else(|| PathBuf::from("recordings"))
}

/// Dependencies stay at warn; this crate and the core crate follow `-v`.
/// `RUST_LOG` overrides both.
pub fn init_logging(cli: &Cli) {
    let mut builder = env_logger::Builder::new();
    builder.filter_level(LevelFilter::Warn);
    builder.filter_module("call_recorder_core", cli.log_level());
    builder.filter_module("call_recorder_cpal", cli.log_level());
    builder.filter_module("call_recorder", cli.log_level());
    if let Ok(filters) = std::env::var("RUST_LOG") {
        builder.parse_filters(&filters);
    }
    builder.format_timestamp_millis().init();
}
