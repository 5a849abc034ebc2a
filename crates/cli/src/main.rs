use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use owo_colors::OwoColorize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

use symposium_core::{Config, LoggingConfig, init_logging};
use symposium_dialogue::{DialogueController, RunEnd, Speaker};
use symposium_providers::{CancelToken, ProviderFactory};
use symposium_ui::{MarkdownMeasure, StageInfo, TerminalGuard, TerminalSink};

/// Symposium - two language models in unbounded conversation
#[derive(Parser, Debug)]
#[command(name = "symposium")]
#[command(about = "A TUI stage for an endless two-model dialogue", long_about = None)]
#[command(version = "0.1.0")]
struct Cli {
    /// Path to symposium.toml (default: ./symposium.toml)
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the dialogue session (runs until Ctrl+C, q, or Esc)
    Start,
    /// Show the configured speakers and session settings
    Status,
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.unwrap_or_else(|| PathBuf::from("symposium.toml"));

    match cli.command {
        Commands::Start => cmd_start(&config_path, cli.verbose).await,
        Commands::Status => cmd_status(&config_path),
    }
}

/// Load config from file or create from example
fn load_or_create_config(path: &Path) -> Result<Config> {
    if path.exists() {
        Config::from_file(path).map_err(|e| anyhow::anyhow!("failed to load config: {}", e))
    } else {
        println!("{} Config not found at {}", "Warning:".yellow().bold(), path.display());
        println!("{} Creating config from example...", "Info:".blue().bold());

        std::fs::write(path, Config::example()).context("failed to create config")?;

        println!(
            "{} Created config at {}. Edit the speakers and run again.",
            "Success:".green().bold(),
            path.display()
        );

        anyhow::bail!("edit {} and run again", path.display())
    }
}

/// Start the dialogue session
async fn cmd_start(config_path: &Path, verbose: bool) -> Result<()> {
    let config = load_or_create_config(config_path)?;

    // stderr is suppressed while the TUI owns the terminal; file logging
    // is the only way to watch events during a session.
    let logging = LoggingConfig::from(config.logging.clone()).with_quiet_stderr();
    let _log_guard = init_logging(Some(logging)).context("failed to initialize logging")?;

    if verbose {
        println!("{} Using config: {}", "Info:".blue().bold(), config_path.display());
        println!(
            "{} {} ({}) vs {} ({})",
            "Info:".blue().bold(),
            config.speakers.first.name.cyan(),
            config.speakers.first.provider.model_label(),
            config.speakers.second.name.cyan(),
            config.speakers.second.provider.model_label(),
        );
    }

    let first_provider = ProviderFactory::create_from_config(&config.speakers.first.provider)
        .with_context(|| format!("provider for {}", config.speakers.first.name))?;
    let second_provider = ProviderFactory::create_from_config(&config.speakers.second.provider)
        .with_context(|| format!("provider for {}", config.speakers.second.name))?;

    let first = Speaker::new(
        &config.speakers.first.name,
        &config.speakers.first.persona,
        first_provider,
    );
    let second = Speaker::new(
        &config.speakers.second.name,
        &config.speakers.second.persona,
        second_provider,
    );

    let cancel = CancelToken::new();
    spawn_cancel_watcher(cancel.clone());

    let (terminal_guard, terminal) = TerminalGuard::enter().context("failed to set up terminal")?;
    let sink = TerminalSink::new(terminal, StageInfo::from_config(&config));

    info!(
        first = %config.speakers.first.name,
        second = %config.speakers.second.name,
        "starting dialogue"
    );

    let mut controller = DialogueController::new(
        first,
        second,
        config.session.clone(),
        sink,
        MarkdownMeasure,
        cancel.clone(),
    );

    let end = controller.run().await;

    // Stop the key watcher and restore the terminal before printing.
    cancel.cancel();
    drop(terminal_guard);

    let log = controller.transcript().log();
    if !log.is_empty() {
        println!("{}", "Transcript".green().bold());
        println!();
        println!("{}", log);
    }

    match end {
        RunEnd::Cancelled => {
            println!("{} Session ended.", "Info:".blue().bold());
            Ok(())
        }
        RunEnd::Failed(e) => Err(anyhow::anyhow!(e)).context("dialogue ended with a stream failure"),
    }
}

/// Watch for Ctrl+C, q, or Esc and cancel the run.
///
/// Raw mode means Ctrl+C arrives as a key event rather than SIGINT, so
/// the watcher owns all quit paths.
fn spawn_cancel_watcher(cancel: CancelToken) {
    tokio::task::spawn_blocking(move || {
        loop {
            if cancel.is_cancelled() {
                break;
            }

            match crossterm::event::poll(Duration::from_millis(100)) {
                Ok(true) => match crossterm::event::read() {
                    Ok(Event::Key(key)) if is_quit_key(&key) => {
                        cancel.cancel();
                        break;
                    }
                    Ok(_) => {}
                    Err(_) => break,
                },
                Ok(false) => {}
                Err(_) => break,
            }
        }
    });
}

fn is_quit_key(key: &KeyEvent) -> bool {
    if key.kind != KeyEventKind::Press {
        return false;
    }

    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => true,
        KeyCode::Char('c') => key.modifiers.contains(KeyModifiers::CONTROL),
        _ => false,
    }
}

/// Show the configured speakers and session settings
fn cmd_status(config_path: &Path) -> Result<()> {
    let config = Config::from_file(config_path)
        .map_err(|e| anyhow::anyhow!("failed to load config from {}: {}", config_path.display(), e))?;

    println!("{}", "Symposium Status".green().bold());
    println!();

    println!("{} Speakers", "Info:".blue().bold());
    for speaker in [&config.speakers.first, &config.speakers.second] {
        println!("  - {} ({})", speaker.name.cyan(), speaker.provider.model_label());
    }

    println!();
    println!("{} Session", "Info:".blue().bold());
    println!("  Opening question: {}", config.session.opening_question);

    println!();
    println!("{} Layout", "Info:".blue().bold());
    println!("  Setup padding: {}", config.layout.setup_padding);
    println!("  Seed height: {}", config.layout.seed_height);

    println!();
    println!("{} Logging", "Info:".blue().bold());
    println!("  Level: {}", config.logging.level);
    println!("  File logging: {}", if config.logging.file { "enabled" } else { "disabled" });

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_quit_keys() {
        let press = |code, modifiers| KeyEvent {
            code,
            modifiers,
            kind: KeyEventKind::Press,
            state: crossterm::event::KeyEventState::NONE,
        };

        assert!(is_quit_key(&press(KeyCode::Char('q'), KeyModifiers::NONE)));
        assert!(is_quit_key(&press(KeyCode::Esc, KeyModifiers::NONE)));
        assert!(is_quit_key(&press(KeyCode::Char('c'), KeyModifiers::CONTROL)));
        assert!(!is_quit_key(&press(KeyCode::Char('c'), KeyModifiers::NONE)));
        assert!(!is_quit_key(&press(KeyCode::Char('x'), KeyModifiers::NONE)));
    }

    #[test]
    fn test_key_release_is_not_quit() {
        let key = KeyEvent {
            code: KeyCode::Char('q'),
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Release,
            state: crossterm::event::KeyEventState::NONE,
        };
        assert!(!is_quit_key(&key));
    }

    #[test]
    fn test_load_or_create_writes_example() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("symposium.toml");

        // First call scaffolds the file and asks the user to edit it.
        assert!(load_or_create_config(&path).is_err());
        assert!(path.exists());

        // Second call loads the scaffolded example.
        let config = load_or_create_config(&path).unwrap();
        assert_eq!(config.speakers.first.name, "Nietzsche");
    }
}
