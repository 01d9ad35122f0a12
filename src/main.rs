//! pomotune - focus/relax interval timer with a linked music player
//!
//! Plays the audio files of a directory while a Pomodoro-style timer runs:
//! - focus and relax periods for a configured number of iterations
//! - sequential or shuffled playback with autoplay
//! - optional link so pausing one pauses the other

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use tokio::io::{AsyncBufReadExt, BufReader};

use pomotune::audio::RodioBackend;
use pomotune::cli::{execute, status_report, Cli, Commands, ConsoleLine, Display, Flow};
use pomotune::library::{LoftyTagService, Queue};
use pomotune::AppContext;

/// Main entry point
#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.verbose);

    if let Err(e) = run(cli).await {
        Display::show_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

/// Initializes the tracing subscriber for logging.
///
/// `RUST_LOG` takes precedence over `--verbose`.
fn init_tracing(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    if let Some(Commands::Completions { shell }) = cli.command {
        generate_completions(shell);
        return Ok(());
    }

    let config = cli.config();
    tracing::debug!(?config, "Starting");

    let tags = Arc::new(LoftyTagService);
    let queue = Queue::load_from_directory(&config.library_path, config.shuffle, tags.as_ref())
        .context("could not load music library")?;

    // The output stream must outlive every session.
    let (_stream, backend) = RodioBackend::try_default().context("could not open audio output")?;

    let (ctx, mut events) = AppContext::start(&config, queue, Arc::new(backend), tags)?;
    Display::show_welcome(&status_report(&ctx));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("failed to read console input")? else {
                    break;
                };
                if line.trim().is_empty() {
                    continue;
                }
                match ConsoleLine::parse_line(&line) {
                    Ok(parsed) => match execute(&ctx, parsed.command).await {
                        Ok(Flow::Quit) => break,
                        Ok(Flow::Continue) => {}
                        Err(e) => Display::show_error(&format!("{:#}", e)),
                    },
                    Err(e) => {
                        let _ = e.print();
                    }
                }
            }
            Some(event) = events.recv() => {
                Display::show_event(&event);
            }
            _ = tokio::signal::ctrl_c() => {
                break;
            }
        }
    }

    if ctx.player().stop().await.is_ok() {
        tracing::debug!("Stopped playback on exit");
    }
    Ok(())
}

/// Generates shell completion scripts.
fn generate_completions(shell: clap_complete::Shell) {
    use clap_complete::generate;
    use std::io;

    let mut cmd = Cli::command();
    let bin_name = cmd.get_name().to_string();
    generate(shell, &mut cmd, bin_name, &mut io::stdout());
}
