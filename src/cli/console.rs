//! Executes console commands against the application context.

use anyhow::{Context, Result};

use crate::app::AppContext;
use crate::cli::commands::{ConsoleCommand, TimerAction};
use crate::cli::display::{Display, StatusReport};
use crate::types::TimerSettings;

/// Whether the console keeps reading after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Collects the current state of both sides.
pub fn status_report(ctx: &AppContext) -> StatusReport {
    StatusReport {
        player: ctx.player().snapshot(),
        timer: ctx.timer().state(),
        link: ctx.link_policy(),
    }
}

/// Runs one console command.
///
/// State changes are reported through the event stream; only settings that
/// produce no event are confirmed here.
///
/// # Errors
///
/// Returns the rejection from the player or timer.
pub async fn execute(ctx: &AppContext, command: ConsoleCommand) -> Result<Flow> {
    let player = ctx.player();
    let timer = ctx.timer();

    match command {
        ConsoleCommand::Play => {
            player.play().await?;
        }
        ConsoleCommand::Pause => {
            player.pause().await?;
        }
        ConsoleCommand::Stop => {
            player.stop().await?;
        }
        ConsoleCommand::Next => {
            player.next().await.context("no next track")?;
        }
        ConsoleCommand::Prev => {
            player.previous().await.context("no previous track")?;
        }
        ConsoleCommand::List => {
            Display::show_tracks(&player.tracks(), player.snapshot().position);
        }
        ConsoleCommand::Select { number } => {
            let index = number.checked_sub(1).context("track numbers start at 1")?;
            player
                .select(index)
                .await
                .with_context(|| format!("no track #{}", number))?;
        }
        ConsoleCommand::Shuffle { enabled } => {
            let snapshot = player.set_shuffle(enabled).await?;
            println!("shuffle {}", if snapshot.shuffle { "on" } else { "off" });
        }
        ConsoleCommand::Autoplay { enabled } => {
            let snapshot = player.set_autoplay(enabled).await?;
            println!("autoplay {}", if snapshot.autoplay { "on" } else { "off" });
        }
        ConsoleCommand::Link { enabled } => {
            ctx.set_link(enabled);
            println!("link {}", if enabled { "on" } else { "off" });
        }
        ConsoleCommand::RelaxPause { enabled } => {
            ctx.set_pause_during_relax(enabled);
            println!(
                "pause during relax {}",
                if enabled { "on" } else { "off" }
            );
        }
        ConsoleCommand::Volume { level } => {
            let snapshot = player.set_volume(level).await?;
            println!("volume {:.0}%", snapshot.volume * 100.0);
        }
        ConsoleCommand::Tag(args) => {
            let snapshot = player
                .save_tags(args.into())
                .await
                .context("failed to save tags")?;
            if let Some(track) = snapshot.current {
                println!("saved tags for {}", track.display_name());
            }
        }
        ConsoleCommand::Timer { action } => match action {
            TimerAction::Set {
                focus,
                relax,
                iterations,
            } => {
                timer
                    .set_settings(TimerSettings::new(focus, relax, iterations))
                    .await?;
            }
            TimerAction::Start => {
                timer.start().await?;
            }
            TimerAction::Pause => {
                timer.pause().await?;
            }
            TimerAction::Restart => {
                timer.restart().await?;
            }
        },
        ConsoleCommand::Status { json } => {
            let report = status_report(ctx);
            if json {
                Display::show_status_json(&report).context("failed to encode status")?;
            } else {
                Display::show_status(&report);
            }
        }
        ConsoleCommand::Quit => return Ok(Flow::Quit),
    }

    Ok(Flow::Continue)
}
