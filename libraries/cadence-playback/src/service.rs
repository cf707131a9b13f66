//! Player service - async driver
//!
//! Runs a `PlaybackController` on a single tokio task and funnels every
//! input onto it: caller commands, primitive signals, host media actions,
//! validation results and the stall timer. Validations run on their own
//! tasks so the controller stays responsive while they are in flight.

use crate::{
    controller::PlaybackController,
    error::{PlaybackError, Result},
    events::AudioProperties,
    media_session::{HostAction, MediaControls, MediaSession},
    primitive::{PlaybackPrimitive, PrimitiveSignal, SignalSender},
    queue::QueueStore,
    types::{PlaybackState, QueueItem},
};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, warn};

/// Point-in-time view of the player
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerSnapshot {
    pub state: PlaybackState,
    pub position: usize,
    pub song: Option<QueueItem>,
    pub audio: AudioProperties,
    pub progress: u32,
    pub minute: u64,
    pub queue_len: usize,
}

/// Commands sent to the service task
enum PlayerCommand {
    Play(usize, oneshot::Sender<Result<()>>),
    Next(oneshot::Sender<Result<()>>),
    Previous(oneshot::Sender<Result<()>>),
    Stop(oneshot::Sender<()>),
    TogglePlay(oneshot::Sender<Result<bool>>),
    Pause,
    Resume,
    Seek(f64, oneshot::Sender<Result<()>>),
    Snapshot(oneshot::Sender<PlayerSnapshot>),
    Append(QueueItem),
    RemoveAt(usize, oneshot::Sender<Option<QueueItem>>),
    ClearQueue,
    SetAutoNext(bool),
    SetSmartPrevious(bool),
    Shutdown,
}

/// Validation result posted back by a validation task
struct ValidationOutcome {
    generation: u64,
    index: usize,
    result: anyhow::Result<QueueItem>,
}

/// Optional collaborators for the service
#[derive(Default)]
pub struct ServiceOptions {
    /// Host media surface; registration is best-effort
    pub media_session: Option<Box<dyn MediaSession>>,
    /// Receives errors raised off the caller's path (validation failures)
    pub error_sink: Option<mpsc::UnboundedSender<PlaybackError>>,
}

/// Cloneable handle to a running player service
#[derive(Clone)]
pub struct PlayerHandle {
    commands: mpsc::UnboundedSender<PlayerCommand>,
    signals: SignalSender,
}

impl PlayerHandle {
    fn send(&self, command: PlayerCommand) -> Result<()> {
        self.commands
            .send(command)
            .map_err(|_| PlaybackError::ServiceClosed)
    }

    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> PlayerCommand,
    ) -> Result<T> {
        let (tx, rx) = oneshot::channel();
        self.send(make(tx))?;
        rx.await.map_err(|_| PlaybackError::ServiceClosed)
    }

    /// Play the item at `index`
    pub async fn play(&self, index: usize) -> Result<()> {
        self.request(|tx| PlayerCommand::Play(index, tx)).await?
    }

    /// Skip forward (user-initiated)
    pub async fn next(&self) -> Result<()> {
        self.request(PlayerCommand::Next).await?
    }

    /// Skip back or rewind
    pub async fn previous(&self) -> Result<()> {
        self.request(PlayerCommand::Previous).await?
    }

    pub async fn stop(&self) -> Result<()> {
        self.request(PlayerCommand::Stop).await
    }

    /// Toggle play/pause; returns whether the primitive is paused afterwards
    pub async fn toggle_play(&self) -> Result<bool> {
        self.request(PlayerCommand::TogglePlay).await?
    }

    pub fn pause(&self) -> Result<()> {
        self.send(PlayerCommand::Pause)
    }

    pub fn resume(&self) -> Result<()> {
        self.send(PlayerCommand::Resume)
    }

    /// Seek to a fraction (0.0 - 1.0) of the current item
    pub async fn seek(&self, fraction: f64) -> Result<()> {
        self.request(|tx| PlayerCommand::Seek(fraction, tx)).await?
    }

    pub async fn snapshot(&self) -> Result<PlayerSnapshot> {
        self.request(PlayerCommand::Snapshot).await
    }

    pub fn append(&self, item: QueueItem) -> Result<()> {
        self.send(PlayerCommand::Append(item))
    }

    pub async fn remove_at(&self, index: usize) -> Result<Option<QueueItem>> {
        self.request(|tx| PlayerCommand::RemoveAt(index, tx)).await
    }

    pub fn clear_queue(&self) -> Result<()> {
        self.send(PlayerCommand::ClearQueue)
    }

    pub fn set_auto_next(&self, enabled: bool) -> Result<()> {
        self.send(PlayerCommand::SetAutoNext(enabled))
    }

    pub fn set_smart_previous(&self, enabled: bool) -> Result<()> {
        self.send(PlayerCommand::SetSmartPrevious(enabled))
    }

    /// Sender the primitive (or a test) uses to report signals
    pub fn signals(&self) -> SignalSender {
        self.signals.clone()
    }

    /// Ask the service to stop. Pending requests fail with `ServiceClosed`.
    pub fn shutdown(&self) -> Result<()> {
        self.send(PlayerCommand::Shutdown)
    }
}

/// Runs a controller on its own task
pub struct PlayerService;

impl PlayerService {
    /// Start the service
    ///
    /// Attaches the primitive's signal subscription and registers host media
    /// handlers before the first command is processed. Both are torn down
    /// when the service stops.
    pub fn spawn<P, Q>(
        controller: PlaybackController<P, Q>,
        options: ServiceOptions,
    ) -> (PlayerHandle, JoinHandle<()>)
    where
        P: PlaybackPrimitive + 'static,
        Q: QueueStore + 'static,
    {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (signal_tx, signal_rx) = mpsc::unbounded_channel();
        let (host_tx, host_rx) = mpsc::unbounded_channel();
        let (validation_tx, validation_rx) = mpsc::unbounded_channel();

        let signals = SignalSender::new(signal_tx);
        let mut controller = controller;
        controller.primitive_mut().attach(signals.clone());

        let mut media_session = options.media_session;
        if let Some(session) = media_session.as_mut() {
            if let Err(e) = session.set_action_handlers(MediaControls::new(host_tx.clone())) {
                debug!("Media session unavailable: {}", e);
            }
        }

        let worker = Worker {
            controller,
            media_session,
            error_sink: options.error_sink,
            validation_tx,
            _host_tx: host_tx,
        };

        let task = tokio::spawn(worker.run(command_rx, signal_rx, host_rx, validation_rx));

        (
            PlayerHandle {
                commands: command_tx,
                signals,
            },
            task,
        )
    }
}

struct Worker<P, Q> {
    controller: PlaybackController<P, Q>,
    media_session: Option<Box<dyn MediaSession>>,
    error_sink: Option<mpsc::UnboundedSender<PlaybackError>>,
    validation_tx: mpsc::UnboundedSender<ValidationOutcome>,
    // Keeps the host channel open when no media session holds a sender
    _host_tx: mpsc::UnboundedSender<HostAction>,
}

impl<P, Q> Worker<P, Q>
where
    P: PlaybackPrimitive + 'static,
    Q: QueueStore + 'static,
{
    async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<PlayerCommand>,
        mut signals: mpsc::UnboundedReceiver<PrimitiveSignal>,
        mut host_actions: mpsc::UnboundedReceiver<HostAction>,
        mut validations: mpsc::UnboundedReceiver<ValidationOutcome>,
    ) {
        loop {
            let deadline = self.controller.stall_deadline();

            tokio::select! {
                command = commands.recv() => match command {
                    Some(PlayerCommand::Shutdown) | None => break,
                    Some(command) => self.dispatch(command),
                },
                Some(signal) = signals.recv() => self.controller.handle_signal(signal),
                Some(action) = host_actions.recv() => self.controller.handle_host_action(action),
                Some(outcome) = validations.recv() => {
                    if let Err(e) = self.controller.complete_validation(
                        outcome.generation,
                        outcome.index,
                        outcome.result,
                    ) {
                        self.report(e);
                    }
                }
                () = stall_sleep(deadline) => {
                    self.controller.check_stall(Instant::now());
                }
            }

            self.spawn_validations();
        }

        self.controller.primitive_mut().detach();
        if let Some(session) = self.media_session.as_mut() {
            session.clear_action_handlers();
        }
        debug!("Player service stopped");
    }

    fn dispatch(&mut self, command: PlayerCommand) {
        let controller = &mut self.controller;
        match command {
            PlayerCommand::Play(index, reply) => {
                reply.send(controller.play(index)).ok();
            }
            PlayerCommand::Next(reply) => {
                reply.send(controller.next()).ok();
            }
            PlayerCommand::Previous(reply) => {
                reply.send(controller.previous()).ok();
            }
            PlayerCommand::Stop(reply) => {
                controller.stop();
                reply.send(()).ok();
            }
            PlayerCommand::TogglePlay(reply) => {
                reply.send(controller.toggle_play()).ok();
            }
            PlayerCommand::Pause => controller.pause(),
            PlayerCommand::Resume => controller.resume(),
            PlayerCommand::Seek(fraction, reply) => {
                reply.send(controller.seek(fraction)).ok();
            }
            PlayerCommand::Snapshot(reply) => {
                reply.send(snapshot(controller)).ok();
            }
            PlayerCommand::Append(item) => controller.queue_mut().append(item),
            PlayerCommand::RemoveAt(index, reply) => {
                reply.send(controller.queue_mut().remove_at(index)).ok();
            }
            PlayerCommand::ClearQueue => controller.queue_mut().clear(),
            PlayerCommand::SetAutoNext(enabled) => controller.queue_mut().set_auto_next(enabled),
            PlayerCommand::SetSmartPrevious(enabled) => {
                controller.queue_mut().set_smart_previous(enabled);
            }
            // Handled by the run loop
            PlayerCommand::Shutdown => {}
        }
    }

    fn spawn_validations(&mut self) {
        for pending in self.controller.take_pending_validations() {
            let tx = self.validation_tx.clone();
            tokio::spawn(async move {
                let generation = pending.generation;
                let index = pending.index;
                let result = pending.run().await;
                tx.send(ValidationOutcome {
                    generation,
                    index,
                    result,
                })
                .ok();
            });
        }
    }

    fn report(&self, error: PlaybackError) {
        warn!("{}", error);
        if let Some(sink) = &self.error_sink {
            sink.send(error).ok();
        }
    }
}

async fn stall_sleep(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

fn snapshot<P, Q>(controller: &PlaybackController<P, Q>) -> PlayerSnapshot
where
    P: PlaybackPrimitive,
    Q: QueueStore,
{
    PlayerSnapshot {
        state: controller.state(),
        position: controller.position(),
        song: controller.current_item(),
        audio: controller.audio_properties(),
        progress: controller.progress(),
        minute: controller.minute(),
        queue_len: controller.queue().len(),
    }
}
