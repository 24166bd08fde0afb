use anyhow::Result;
use clap::Parser;
use crossterm::{
    cursor::{Hide, Show},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::process;
use std::sync::Arc;

use lxcdash::app::App;
use lxcdash::config::load_config;
use lxcdash::events::input::CrosstermInput;
use lxcdash::logging;
use lxcdash::lxc::{ContainerRuntime, LxcClient};
use lxcdash::screen::{Screen, ScreenGuard};
use lxcdash::types::AppConfig;

#[derive(Parser, Debug)]
#[command(name = "lxcdash", version, about = "Terminal dashboard for LXC containers")]
struct Cli {
    /// Write debug logs to the cache directory
    #[arg(long)]
    debug: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if cli.debug {
        if let Err(e) = logging::init(&logging::default_log_path()) {
            eprintln!("Warning: {:#}", e);
        }
    }

    match run().await {
        Ok(()) => println!("Goodbye! 👋"),
        Err(e) => {
            tracing::error!("Fatal: {:#}", e);
            eprintln!("Error: {:#}", e);
            process::exit(1);
        }
    }
}

async fn run() -> Result<()> {
    let config = load_config().unwrap_or_else(|e| {
        tracing::warn!("Using default config: {:#}", e);
        AppConfig::default()
    });
    let runtime: Arc<dyn ContainerRuntime> = Arc::new(LxcClient::new(&config.pve_config_dir));

    install_panic_hook();
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, Hide)?;

    let result = async {
        let terminal = Terminal::new(CrosstermBackend::new(io::stdout()))?;
        let screen = ScreenGuard::new(Screen::new(terminal, true));
        let mut app = App::new(&config, runtime, screen, CrosstermInput).await?;
        app.run().await?;
        Ok::<(), anyhow::Error>(())
    }
    .await;

    restore_terminal();
    result
}

fn restore_terminal() {
    let _ = disable_raw_mode();
    let _ = execute!(io::stdout(), LeaveAlternateScreen, Show);
}

/// Puts the terminal back before the default hook prints the panic message.
fn install_panic_hook() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        restore_terminal();
        default_hook(info);
    }));
}
