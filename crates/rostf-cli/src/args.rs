//! Command-line interface definition.
//!
//! ```text
//! rostf [--config <path>] list   <recording>
//! rostf [--config <path>] latest <recording> <parent> <child>
//! rostf [--config <path>] at     <recording> <parent> <child> <secs>
//! rostf [--config <path>] chain  <recording> <from> <via> <to> [<secs>]
//! rostf [--config <path>] config [--init]
//! ```

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use rostf_types::Stamp;

const AFTER_HELP: &str = "\
<recording> is a JSON-lines file with one tf2_msgs/TFMessage per line.
Only samples within the buffer horizon of the newest sample of each
frame pair are kept; raise ROSTF_BUFFER_HORIZON_SECS to query older ones.";

#[derive(Debug, Parser)]
#[command(name = "rostf")]
#[command(about = "Inspect recorded /tf traffic")]
#[command(version)]
#[command(after_help = AFTER_HELP)]
pub struct Cli {
    /// Buffer settings file (defaults to ~/.rostf/config.toml)
    #[arg(short = 'c', long = "config", value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, PartialEq, Subcommand)]
pub enum Command {
    /// Show the effective buffer settings
    Config {
        /// Write the default settings instead
        #[arg(long)]
        init: bool,
    },

    /// List every frame pair with its sample count and newest stamp
    List {
        /// JSON-lines recording to replay
        recording: PathBuf,
    },

    /// Print the most recent transform of a frame pair
    Latest {
        recording: PathBuf,
        parent: String,
        child: String,
    },

    /// Print the transform of a frame pair closest to a time
    At {
        recording: PathBuf,
        parent: String,
        child: String,
        /// Time in seconds
        #[arg(value_parser = parse_time, allow_negative_numbers = true)]
        time: Stamp,
    },

    /// Compose `from -> via` with `via -> to`
    Chain {
        recording: PathBuf,
        from: String,
        via: String,
        to: String,
        /// Time in seconds (latest samples when omitted)
        #[arg(value_parser = parse_time, allow_negative_numbers = true)]
        time: Option<Stamp>,
    },
}

fn parse_time(raw: &str) -> Result<Stamp, String> {
    let secs: f64 = raw
        .parse()
        .map_err(|_| format!("'{raw}' is not a time in seconds"))?;
    Stamp::try_from_secs_f64(secs).map_err(|e| e.to_string())
}
