//! CLI entry point for the Silt simulation server.

use clap::error::ErrorKind;
use clap::{Parser, ValueEnum};
use tracing::info;
use tracing_subscriber::filter::LevelFilter;

use silt_server::{Server, ServerConfig};

#[derive(Parser, Debug)]
#[command(
    name = "silt-server",
    about = "Headless cellular-material simulation server, remote-controlled over WebSocket"
)]
struct Args {
    /// WebSocket port (0 binds an ephemeral port).
    #[arg(short, long, default_value_t = 8080)]
    port: u16,

    /// Start the simulation immediately and pause after this many
    /// steps (0 = do not auto-start).
    #[arg(short, long, default_value_t = 0)]
    steps: u64,

    /// Log verbosity.
    #[arg(short = 'l', long, value_enum, default_value = "info")]
    log_level: LogLevel,

    /// Print timer statistics on exit.
    #[arg(long)]
    print_stats: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
    /// Accepted for compatibility; maps to `error`.
    Critical,
    Off,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => LevelFilter::TRACE,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Error | LogLevel::Critical => LevelFilter::ERROR,
            LogLevel::Off => LevelFilter::OFF,
        }
    }
}

fn main() {
    // Exit codes: 0 clean (including --help), 1 argument parse error.
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let code = match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
                _ => 1,
            };
            let _ = e.print();
            std::process::exit(code);
        }
    };

    tracing_subscriber::fmt()
        .with_max_level(LevelFilter::from(args.log_level))
        .init();

    info!(port = args.port, steps = args.steps, "starting silt server");

    let server = match Server::start(ServerConfig {
        port: args.port,
        auto_steps: args.steps,
    }) {
        Ok(server) => server,
        Err(e) => {
            eprintln!("failed to start server: {e}");
            std::process::exit(1);
        }
    };
    info!("send commands to ws://{}", server.local_addr());

    match server.wait() {
        Ok(machine) => {
            if args.print_stats {
                machine.timers().dump();
            }
        }
        Err(e) => {
            eprintln!("server did not shut down cleanly: {e}");
            std::process::exit(1);
        }
    }
}
