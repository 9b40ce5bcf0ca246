use anyhow::Result;
use clap::{Parser, Subcommand};
use pomodoro_flow::config::Config;
use pomodoro_flow::notify::Notifier;
use pomodoro_flow::session;
use pomodoro_flow::terminal::Terminal;
use pomodoro_flow::theme::Variant;
use pomodoro_flow::ws::websocket_server;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "pomodoro-flow")]
#[command(about = "Pomodoro timer cycling focus, short break and long break intervals", long_about = None)]
struct Cli {
    /// Config file (defaults to <config dir>/pomodoro-flow/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Compress durations to seconds for manual testing
    #[arg(long, global = true)]
    debug: bool,

    /// Widget preset: flow, lofi or lofi-minimal
    #[arg(long, global = true)]
    variant: Option<Variant>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Interactive timer in the terminal (default)
    Run,
    /// Serve the timer to UI clients over WebSocket
    Daemon {
        /// Listen address, e.g. 127.0.0.1:8765
        #[arg(long)]
        addr: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Commands::Run);

    // The terminal front end owns stdout; keep diagnostics quiet there.
    let default_filter = match (&command, cli.verbose) {
        (_, true) => "debug",
        (Commands::Run, false) => "warn",
        (Commands::Daemon { .. }, false) => "info",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .target(env_logger::Target::Stderr)
        .init();

    let mut config = Config::load(cli.config.as_deref())?;
    if cli.debug {
        config.debug = true;
    }
    if let Some(variant) = cli.variant {
        config.variant = variant;
    }
    if let Commands::Daemon { addr: Some(ref addr) } = command {
        config.server.addr = addr.clone();
    }
    config.validate()?;

    if config.debug {
        log::info!("Debug mode: durations compressed to seconds");
    }
    log::info!(
        "Pomodoro settings: {}min focus / {}min short break / {}min long break, {} sessions per cycle",
        config.settings.focus_minutes,
        config.settings.short_break_minutes,
        config.settings.long_break_minutes,
        config.settings.sessions_per_cycle
    );

    let (handle, task) = session::spawn(config.settings, config.session_options());

    let notifier = Notifier::new(config.variant.title(), &config.notifications);
    if let Some(path) = notifier.log_file() {
        log::info!("Logging activity to: {}", path.display());
    }
    notifier.log(&format!("=== {} session started ===", config.variant.title()));
    tokio::spawn(notifier.clone().run(handle.subscribe()));

    match command {
        Commands::Run => {
            Terminal::new(handle.clone(), config.variant, config.initial_theme())
                .run()
                .await?;
        }
        Commands::Daemon { .. } => {
            let addr = config.listen_addr()?;
            let listener = websocket_server::bind(addr).await?;
            let server = tokio::spawn(websocket_server::serve(listener, handle.clone()));

            tokio::select! {
                result = server => {
                    if let Ok(Err(e)) = result {
                        log::error!("WebSocket server error: {}", e);
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    log::info!("Received Ctrl-C, shutting down...");
                }
            }
        }
    }

    handle.shutdown()?;
    task.await?;
    notifier.log("=== Session ended ===");
    Ok(())
}
