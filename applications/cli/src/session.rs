/// Playback session - drives one queue from start to stop
use crate::config::CliConfig;
use crate::error::{CliError, Result};
use crate::simulator::SimulatedPrimitive;
use cadence_playback::{
    EventKind, FnValidator, MemoryQueue, Notification, NotificationBus, PlaybackController,
    PlaybackError, PlayerHandle, PlayerService, QueueItem, ServiceOptions,
};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::mpsc;
use tracing::{info, warn};

/// How notifications are reported
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Output {
    /// One log line per notification
    #[default]
    Log,
    /// One JSON object per notification on stdout
    Json,
}

/// What happened during a session
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionSummary {
    /// Locators that reached track start, in order
    pub started: Vec<String>,
    /// `error` notifications (failed or stalled loads)
    pub errors: usize,
    /// Items the validator refused
    pub rejected: usize,
    /// Every notification published
    pub notifications: usize,
}

/// Play `items` from `start` until the controller stops
pub async fn run(
    config: &CliConfig,
    items: Vec<QueueItem>,
    start: usize,
    output: Output,
) -> Result<SessionSummary> {
    if items.is_empty() {
        return Err(CliError::EmptyQueue);
    }
    if start >= items.len() {
        return Err(CliError::StartOutOfRange {
            index: start,
            len: items.len(),
        });
    }

    let bus = NotificationBus::new();
    let summary = Arc::new(Mutex::new(SessionSummary::default()));
    for kind in EventKind::ALL {
        let summary = Arc::clone(&summary);
        bus.subscribe(kind, move |notification| {
            record(&summary, notification);
            report(notification, output);
        });
    }
    let (_stop_subscription, mut stops) = bus.subscribe_channel(EventKind::Stop);

    let queue = MemoryQueue::from_items(items)
        .with_auto_next(config.queue.auto_next)
        .with_smart_previous(config.queue.smart_previous);
    let primitive = SimulatedPrimitive::new(config.simulation.clone());

    let mut controller = PlaybackController::new(primitive, queue, bus, config.playback.clone())?;
    if !config.queue.deny.is_empty() {
        let deny = Arc::new(config.queue.deny.clone());
        controller = controller.with_validator(Arc::new(FnValidator(move |item: QueueItem| {
            let deny = Arc::clone(&deny);
            async move {
                if let Some(pattern) = deny.iter().find(|p| item.url.contains(p.as_str())) {
                    anyhow::bail!("locator matches deny pattern '{}'", pattern);
                }
                Ok(item)
            }
        })));
    }

    let (error_tx, mut errors) = mpsc::unbounded_channel();
    let options = ServiceOptions {
        error_sink: Some(error_tx),
        ..ServiceOptions::default()
    };
    let (handle, task) = PlayerService::spawn(controller, options);

    info!("Starting playback at position {}", start);
    handle.play(start).await?;

    loop {
        tokio::select! {
            Some(_) = stops.recv() => break,
            Some(error) = errors.recv() => {
                if let PlaybackError::ValidationFailed { index, .. } = error {
                    summary
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner)
                        .rejected += 1;
                    skip_rejected(&handle, index).await?;
                }
            }
            else => break,
        }
    }

    let snapshot = handle.snapshot().await?;
    info!(
        "Session finished in state {:?} at position {}",
        snapshot.state, snapshot.position
    );

    handle.shutdown()?;
    if let Err(e) = task.await {
        warn!("Player service task failed: {}", e);
    }

    let summary = summary.lock().unwrap_or_else(PoisonError::into_inner).clone();
    Ok(summary)
}

/// A refused item never loads, so move past it the way an error would
async fn skip_rejected(handle: &PlayerHandle, index: usize) -> Result<()> {
    let queue_len = handle.snapshot().await?.queue_len;
    if index + 1 < queue_len {
        warn!("Skipping refused item at position {}", index);
        handle.play(index + 1).await?;
    } else {
        handle.stop().await?;
    }
    Ok(())
}

fn record(summary: &Mutex<SessionSummary>, notification: &Notification) {
    let mut summary = summary.lock().unwrap_or_else(PoisonError::into_inner);
    summary.notifications += 1;
    match notification.kind {
        EventKind::TrackStart => {
            if let Some(song) = &notification.song {
                summary.started.push(song.url.clone());
            }
        }
        EventKind::Error => summary.errors += 1,
        _ => {}
    }
}

fn report(notification: &Notification, output: Output) {
    match output {
        Output::Json => match serde_json::to_string(notification) {
            Ok(line) => println!("{}", line),
            Err(e) => warn!("Failed to encode notification: {}", e),
        },
        Output::Log => {
            let song = notification
                .song
                .as_ref()
                .map(|s| s.title.clone().unwrap_or_else(|| s.url.clone()))
                .unwrap_or_default();

            match notification.kind {
                EventKind::Progress => info!(
                    "{} {}% [{}] {}",
                    notification.kind, notification.progress, notification.position, song
                ),
                EventKind::Minutes => info!(
                    "{} {} [{}] {}",
                    notification.kind, notification.minute, notification.position, song
                ),
                EventKind::Heartbeat => info!(
                    "{} {:.1}s [{}] {}",
                    notification.kind,
                    notification.audio.current_time,
                    notification.position,
                    song
                ),
                _ => info!("{} [{}] {}", notification.kind, notification.position, song),
            }
        }
    }
}
