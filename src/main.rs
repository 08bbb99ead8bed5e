//! Binary entrypoint for the tavernbot CLI.
//!
//! Commands:
//! - `start` - open the engines and run the stdin console transport
//! - `init` - write a starter `config.toml`
//! - `status` - print a short summary of the stored data
//!
//! See the library crate docs for module-level details: `tavernbot::`.
use anyhow::Result;
use clap::{Parser, Subcommand};
use log::info;

use tavernbot::bot::{console, Bot};
use tavernbot::config::Config;

#[derive(Parser)]
#[command(name = "tavernbot")]
#[command(about = "Economy, casino, shop and word-chain bot for community chat servers")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path (can be used before or after subcommand)
    #[arg(short, long, default_value = "config.toml", global = true)]
    config: String,

    /// Verbose logging (-v, -vv for more; may appear before or after subcommand)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the bot against the console transport
    Start {
        /// Fixed RNG seed for a reproducible session
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Write a default configuration file
    Init,
    /// Show stored accounts, couples and catalog size
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Start { seed } => {
            let config = Config::load(&cli.config).await?;
            init_logging(&Some(config.clone()), cli.verbose);
            info!("Starting tavernbot v{}", env!("CARGO_PKG_VERSION"));
            let mut bot = match seed {
                Some(seed) => Bot::open_seeded(config, seed)?,
                None => Bot::open(config)?,
            };
            console::run(&mut bot).await?;
            info!("tavernbot stopped");
        }
        Commands::Init => {
            init_logging(&None, cli.verbose);
            Config::create_default(&cli.config).await?;
            info!("Configuration file created at {}", cli.config);
        }
        Commands::Status => {
            let config = Config::load(&cli.config).await?;
            init_logging(&Some(config.clone()), cli.verbose);
            let bot = Bot::open(config)?;
            println!("=== tavernbot status ===");
            println!("{}", bot.summary());
        }
    }

    Ok(())
}

fn init_logging(config: &Option<Config>, verbosity: u8) {
    use std::io::Write;
    let mut builder = env_logger::Builder::new();
    let base_level = match verbosity {
        0 => config
            .as_ref()
            .and_then(|c| c.logging.level.parse().ok())
            .unwrap_or(log::LevelFilter::Info),
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    builder.filter_level(base_level);

    let sinks = LogSinks {
        file: config
            .as_ref()
            .and_then(|c| c.logging.file.as_deref())
            .and_then(|path| open_append(path).ok())
            .map(std::sync::Mutex::new),
        security_path: config.as_ref().and_then(|c| c.logging.security_file.clone()),
    };
    // Foreground runs also echo to the console; redirected runs only write the files.
    let echo = sinks.file.is_none() || atty::is(atty::Stream::Stderr);
    builder.format(move |fmt, record| {
        let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
        let line = format!("{} [{}] {}", ts, record.level(), record.args());
        sinks.write(record.target(), &line);
        if echo {
            writeln!(fmt, "{}", line)
        } else {
            Ok(())
        }
    });
    let _ = builder.try_init();
}

fn open_append(path: &str) -> std::io::Result<std::fs::File> {
    std::fs::OpenOptions::new().create(true).append(true).open(path)
}

/// Files each log line is copied into. The security file only receives the
/// `"security"` target and is written whether or not a main log file is set.
struct LogSinks {
    file: Option<std::sync::Mutex<std::fs::File>>,
    security_path: Option<String>,
}

impl LogSinks {
    fn write(&self, target: &str, line: &str) {
        use std::io::Write;
        if let Some(file) = &self.file {
            if let Ok(mut guard) = file.lock() {
                let _ = writeln!(guard, "{}", line);
            }
        }
        if target == "security" {
            if let Some(path) = &self.security_path {
                if let Ok(mut sf) = open_append(path) {
                    let _ = writeln!(sf, "{}", line);
                }
            }
        }
    }
}
