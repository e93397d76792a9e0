use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

use kef_connector::logging::{init_logging, init_logging_from_env, LoggingMode};
use kef_connector::{
    setup_platform, InMemoryRegistry, KefMediaPlayer, PendingRefresh, PollerConfig, PollingTask,
    SharedSessionPool, Snapshot, SpeakerConfig,
};

/// KEF speaker command-line host
///
/// Sets up one speaker, runs a command against it and prints the resulting
/// state as JSON. `watch` keeps polling and prints every new state until
/// interrupted.
#[derive(Parser, Debug)]
#[command(name = "kef-connector")]
#[command(about = "Drive a KEF wireless speaker and print its state as JSON")]
#[command(version)]
pub struct Args {
    /// IP address or hostname of the speaker (or KEF_HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Speaker model selecting the source list (LSX2, LSX2LT, LS50W2, LS60, XIO)
    #[arg(short, long, default_value = "default")]
    pub model: String,

    /// Display name; read from the speaker when omitted
    #[arg(short, long)]
    pub name: Option<String>,

    /// Volume ceiling, 0..1
    #[arg(long, default_value = "1.0")]
    pub max_volume: f64,

    /// Volume up/down step, as a fraction of full scale
    #[arg(long, default_value = "0.03")]
    pub volume_step: f64,

    /// Poll interval in seconds for `watch`
    #[arg(short = 's', long, default_value = "10")]
    pub scan_interval: u64,

    /// Verbose logging with source locations
    #[arg(long)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Action,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Action {
    /// Print the current state
    Status,
    /// Poll continuously and print each new state
    Watch,
    /// Wake the speaker, resuming the last source
    On,
    /// Put the speaker in standby
    Off,
    /// Select an input
    Source { name: String },
    Play,
    Pause,
    Toggle,
    Next,
    Previous,
    /// Set the volume level, 0..1
    Volume { level: f64 },
    VolumeUp,
    VolumeDown,
    Mute,
    Unmute,
}

impl Args {
    /// Build the speaker config, falling back to KEF_HOST for the address
    pub fn speaker_config(&self) -> Result<SpeakerConfig> {
        let host = match &self.host {
            Some(host) => host.clone(),
            None => std::env::var("KEF_HOST")
                .context("No speaker host given; pass --host or set KEF_HOST")?,
        };

        let mut config = SpeakerConfig::new(host)
            .with_model(self.model.clone())
            .with_maximum_volume(self.max_volume)
            .with_volume_step(self.volume_step);
        if let Some(name) = &self.name {
            config = config.with_name(name.clone());
        }

        config.validate()?;
        Ok(config)
    }

    pub fn poller_config(&self) -> Result<PollerConfig> {
        let config = PollerConfig::with_scan_interval(Duration::from_secs(self.scan_interval));
        config.validate()?;
        Ok(config)
    }
}

fn print_snapshot(snapshot: &Snapshot) -> Result<()> {
    let json = serde_json::to_string_pretty(snapshot).context("Failed to serialize state")?;
    println!("{}", json);
    Ok(())
}

/// Issue `action` and wait for its follow-up poll, if any
async fn run_command(player: &Arc<KefMediaPlayer>, action: &Action) -> Result<()> {
    let pending = match action {
        Action::Status | Action::Watch => PendingRefresh::none(),
        Action::On => player.turn_on().await?,
        Action::Off => player.turn_off().await?,
        Action::Source { name } => {
            if !player.catalog().contains(name) {
                return Err(anyhow::anyhow!(
                    "Unknown source '{}' for {}. Valid sources: {}",
                    name,
                    player.catalog().model(),
                    player.catalog().sources().join(", ")
                ));
            }
            player.select_source(name).await?
        }
        Action::Play => player.media_play().await?,
        Action::Pause => player.media_pause().await?,
        Action::Toggle => player.media_play_pause().await?,
        Action::Next => player.media_next_track().await?,
        Action::Previous => player.media_previous_track().await?,
        Action::Volume { level } => {
            player.set_volume_level(*level).await?;
            PendingRefresh::none()
        }
        Action::VolumeUp => {
            player.volume_up().await?;
            PendingRefresh::none()
        }
        Action::VolumeDown => {
            player.volume_down().await?;
            PendingRefresh::none()
        }
        Action::Mute => {
            player.mute_volume(true).await?;
            PendingRefresh::none()
        }
        Action::Unmute => {
            player.mute_volume(false).await?;
            PendingRefresh::none()
        }
    };

    if pending.is_scheduled() {
        info!("Waiting for the speaker to settle...");
    }
    pending.settled().await;
    Ok(())
}

/// Poll until Ctrl+C, printing each published snapshot
async fn watch(player: &Arc<KefMediaPlayer>, config: &PollerConfig) -> Result<()> {
    let mut updates = player.subscribe();
    let poller = PollingTask::start(player, config);
    info!(
        "Polling every {}s, press Ctrl+C to stop",
        poller.interval().as_secs()
    );

    loop {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = Arc::clone(&updates.borrow_and_update());
                print_snapshot(&snapshot)?;
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Stopping after {} poll(s)", poller.poll_count());
                break;
            }
        }
    }

    poller.shutdown().await;
    Ok(())
}

async fn run(args: Args) -> Result<()> {
    let config = args.speaker_config().context("Invalid speaker configuration")?;
    let poller_config = args.poller_config().context("Invalid poll interval")?;

    let mut registry = InMemoryRegistry::new();
    let player = setup_platform(&config, Arc::new(SharedSessionPool::new()), &mut registry)
        .await
        .context("Failed to set up speaker")?;

    if args.command == Action::Watch {
        return watch(&player, &poller_config).await;
    }

    run_command(&player, &args.command)
        .await
        .with_context(|| format!("Command {:?} failed", args.command))?;
    print_snapshot(&player.snapshot())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let logging = if args.debug {
        init_logging(LoggingMode::Debug)
    } else {
        init_logging_from_env()
    };
    logging.context("Failed to initialize logging")?;

    if let Err(e) = run(args).await {
        error!("{:#}", e);
        std::process::exit(1);
    }

    Ok(())
}
