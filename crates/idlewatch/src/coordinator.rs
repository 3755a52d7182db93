//! The coordinator: an isolated Tokio task that owns the session state.
//!
//! One task owns the store, the timer pair, the activity channel, and
//! the sync schedule, communicating with the outside world through an
//! mpsc channel. This is the "actor model" — no shared mutable state,
//! just message passing — and it replaces the one-per-page global
//! singleton: each [`CoordinatorHandle`] reaches exactly one coordinator,
//! so tests construct as many isolated instances as they like.
//!
//! The single-task ownership is also the concurrency story: timers are
//! `select!` branches rather than spawned callbacks, so cancel-before-arm
//! is just overwriting a deadline field, and activity updates apply in
//! arrival order. The only operation with real latency — the authority
//! call — runs in a detached task and reports back through a channel,
//! so the activity path never waits on the network.

use std::sync::Arc;
use std::time::Duration;

use idlewatch_activity::ActivityKind;
use idlewatch_store::{
    ActivityOutcome, Clock, SessionConfig, SessionConfigUpdate, SessionStore,
    SessionStorage,
};
use idlewatch_sync::{
    corrected_last_activity_ms, expiry_drift, AuthorityResponse, SessionAuthority,
    SyncConfig, SyncError, SyncScheduler, SyncTrigger,
};
use idlewatch_timers::{IdleTimers, TimerFire};
use tokio::sync::{mpsc, oneshot};

use crate::{CoordinatorError, SessionEvents};

/// Command channel size. Commands are tiny and replied to quickly; a
/// small bound keeps a stuck caller from ballooning memory.
const COMMAND_CHANNEL_SIZE: usize = 32;

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

/// Commands sent to the coordinator through its channel.
///
/// The `oneshot::Sender` in most variants is a reply channel — the
/// caller sends a command and awaits the response on it.
enum Command {
    Begin {
        config: SessionConfig,
        reply: oneshot::Sender<()>,
    },
    UpdateConfig {
        update: SessionConfigUpdate,
        reply: oneshot::Sender<bool>,
    },
    TimeRemaining {
        reply: oneshot::Sender<Option<Duration>>,
    },
    IsActive {
        reply: oneshot::Sender<bool>,
    },
    End {
        reply: oneshot::Sender<()>,
    },
    Shutdown,
}

// ---------------------------------------------------------------------------
// Handle
// ---------------------------------------------------------------------------

/// Handle to a running coordinator. Used to send commands to it.
///
/// Cheap to clone — it's a pair of channel senders. The application
/// shell owns one and passes clones to whatever needs them (the
/// activity observer, the settings screen, the warning dialog).
#[derive(Clone)]
pub struct CoordinatorHandle {
    commands: mpsc::Sender<Command>,
    activity: mpsc::UnboundedSender<ActivityKind>,
}

impl CoordinatorHandle {
    /// Starts a session with the given timing config.
    ///
    /// Replaces any existing session, active or expired.
    pub async fn begin(
        &self,
        config: SessionConfig,
    ) -> Result<(), CoordinatorError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.commands
            .send(Command::Begin {
                config,
                reply: reply_tx,
            })
            .await
            .map_err(|_| CoordinatorError::ChannelClosed)?;
        reply_rx.await.map_err(|_| CoordinatorError::ChannelClosed)
    }

    /// Records an interaction signal (fire-and-forget).
    ///
    /// Never awaits anything — recording activity must stay
    /// instantaneous. Throttling, rescheduling, and the debounced sync
    /// all happen on the coordinator task.
    pub fn record_activity(&self, kind: ActivityKind) {
        let _ = self.activity.send(kind);
    }

    /// The sink an `ActivityObserver` forwards into. Same channel as
    /// [`record_activity`](Self::record_activity).
    pub fn activity_sink(&self) -> mpsc::UnboundedSender<ActivityKind> {
        self.activity.clone()
    }

    /// Merges a partial config change. Returns `false` when there is no
    /// session to update.
    pub async fn update_config(
        &self,
        update: SessionConfigUpdate,
    ) -> Result<bool, CoordinatorError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.commands
            .send(Command::UpdateConfig {
                update,
                reply: reply_tx,
            })
            .await
            .map_err(|_| CoordinatorError::ChannelClosed)?;
        reply_rx.await.map_err(|_| CoordinatorError::ChannelClosed)
    }

    /// Idle budget left, or `None` without an active session.
    pub async fn time_remaining(
        &self,
    ) -> Result<Option<Duration>, CoordinatorError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.commands
            .send(Command::TimeRemaining { reply: reply_tx })
            .await
            .map_err(|_| CoordinatorError::ChannelClosed)?;
        reply_rx.await.map_err(|_| CoordinatorError::ChannelClosed)
    }

    /// Whether the session is active right now.
    ///
    /// Self-correcting: if the idle budget is already spent — say the
    /// process was suspended past the deadline and the timer never got
    /// to fire — this transitions the session to expired (emitting the
    /// expiry callback) before answering `false`.
    pub async fn is_active(&self) -> Result<bool, CoordinatorError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.commands
            .send(Command::IsActive { reply: reply_tx })
            .await
            .map_err(|_| CoordinatorError::ChannelClosed)?;
        reply_rx.await.map_err(|_| CoordinatorError::ChannelClosed)
    }

    /// Ends the session: timers cancelled, sync stopped, persisted
    /// state cleared. Idempotent — ending twice, or with no session, is
    /// a quiet no-op.
    pub async fn end(&self) -> Result<(), CoordinatorError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.commands
            .send(Command::End { reply: reply_tx })
            .await
            .map_err(|_| CoordinatorError::ChannelClosed)?;
        reply_rx.await.map_err(|_| CoordinatorError::ChannelClosed)
    }

    /// Tears the coordinator task down. Pending deadlines and schedules
    /// die with it; persisted state is left as-is so a later
    /// coordinator can restore the session.
    pub async fn shutdown(&self) -> Result<(), CoordinatorError> {
        self.commands
            .send(Command::Shutdown)
            .await
            .map_err(|_| CoordinatorError::ChannelClosed)
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Builder for configuring and spawning a coordinator.
///
/// # Example
///
/// ```rust,ignore
/// use idlewatch::prelude::*;
///
/// let handle = CoordinatorBuilder::new()
///     .sync_config(SyncConfig::default())
///     .spawn(JsonFileStorage::new("/var/lib/kiosk"), my_authority, my_events);
/// handle.begin(SessionConfig::new(15, 2)).await?;
/// ```
pub struct CoordinatorBuilder {
    sync_config: SyncConfig,
    clock: Option<Clock>,
}

impl CoordinatorBuilder {
    /// Creates a builder with default settings.
    pub fn new() -> Self {
        Self {
            sync_config: SyncConfig::default(),
            clock: None,
        }
    }

    /// Sets the reconciler configuration.
    pub fn sync_config(mut self, config: SyncConfig) -> Self {
        self.sync_config = config;
        self
    }

    /// Pins the clock's epoch anchor. Tests use this to make
    /// restored-record arithmetic exact; production code leaves the
    /// default (anchored to the wall clock at spawn).
    pub fn clock(mut self, clock: Clock) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Spawns the coordinator task and returns its handle.
    ///
    /// Restores any persisted session record from `storage` before the
    /// loop starts: an unexpired record re-arms its timers from the
    /// original activity time, an expired-in-absence record emits the
    /// expiry callback immediately.
    ///
    /// Must be called inside a Tokio runtime.
    pub fn spawn<S, A, E>(
        self,
        storage: S,
        authority: A,
        events: E,
    ) -> CoordinatorHandle
    where
        S: SessionStorage,
        A: SessionAuthority,
        E: SessionEvents,
    {
        let (cmd_tx, cmd_rx) = mpsc::channel(COMMAND_CHANNEL_SIZE);
        let (act_tx, act_rx) = mpsc::unbounded_channel();
        let (res_tx, res_rx) = mpsc::unbounded_channel();

        let coordinator = Coordinator {
            clock: self.clock.unwrap_or_default(),
            store: SessionStore::restore(storage),
            timers: IdleTimers::new(),
            sync: SyncScheduler::new(self.sync_config),
            authority: Arc::new(authority),
            events,
            commands: cmd_rx,
            activity: act_rx,
            sync_results: res_rx,
            sync_results_tx: res_tx,
        };

        tokio::spawn(coordinator.run());

        CoordinatorHandle {
            commands: cmd_tx,
            activity: act_tx,
        }
    }
}

impl Default for CoordinatorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Spawns a coordinator with default settings.
pub fn spawn_coordinator<S, A, E>(
    storage: S,
    authority: A,
    events: E,
) -> CoordinatorHandle
where
    S: SessionStorage,
    A: SessionAuthority,
    E: SessionEvents,
{
    CoordinatorBuilder::new().spawn(storage, authority, events)
}

// ---------------------------------------------------------------------------
// The actor
// ---------------------------------------------------------------------------

/// The internal coordinator state. Runs inside a Tokio task.
struct Coordinator<S: SessionStorage, A: SessionAuthority, E: SessionEvents> {
    clock: Clock,
    store: SessionStore<S>,
    timers: IdleTimers,
    sync: SyncScheduler,
    authority: Arc<A>,
    events: E,
    commands: mpsc::Receiver<Command>,
    activity: mpsc::UnboundedReceiver<ActivityKind>,
    sync_results: mpsc::UnboundedReceiver<Result<AuthorityResponse, SyncError>>,
    /// Kept so detached authority tasks always have somewhere to report,
    /// and the results branch never closes while the actor lives.
    sync_results_tx: mpsc::UnboundedSender<Result<AuthorityResponse, SyncError>>,
}

impl<S, A, E> Coordinator<S, A, E>
where
    S: SessionStorage,
    A: SessionAuthority,
    E: SessionEvents,
{
    /// Runs the actor loop, processing commands until shutdown.
    async fn run(mut self) {
        tracing::debug!("coordinator started");
        self.restore_schedules();

        loop {
            tokio::select! {
                cmd = self.commands.recv() => match cmd {
                    Some(cmd) => {
                        if !self.handle_command(cmd) {
                            break;
                        }
                    }
                    // All handles dropped — nobody can reach us again.
                    None => break,
                },
                Some(kind) = self.activity.recv() => {
                    self.handle_activity(kind);
                }
                fire = self.timers.wait_for_fire() => {
                    self.handle_fire(fire);
                }
                trigger = self.sync.wait_for_due() => {
                    self.handle_sync_due(trigger);
                }
                Some(outcome) = self.sync_results.recv() => {
                    self.handle_sync_result(outcome);
                }
            }
        }

        tracing::debug!("coordinator stopped");
    }

    /// Re-derives ephemeral schedules from a restored record.
    ///
    /// Timers are never persisted — only the record is — so a reload
    /// recomputes them from `last_activity_ms`. A record whose deadline
    /// passed while no process was running expires right here, exactly
    /// as a continuously-running instance would have at that moment.
    fn restore_schedules(&mut self) {
        let now_ms = self.clock.now_ms();
        let Some(record) = self.store.record() else {
            return;
        };
        if !record.is_active {
            return;
        }
        if record.is_expired(now_ms) {
            self.expire();
            return;
        }

        let config = record.config;
        let elapsed = Duration::from_millis(record.elapsed_ms(now_ms));
        self.timers.arm(
            config.idle_timeout(),
            config.warning_lead_minutes,
            elapsed,
        );
        self.sync.start();
        tracing::info!(
            elapsed_secs = elapsed.as_secs(),
            "restored session re-armed"
        );
    }

    /// Returns `false` when the loop should exit.
    fn handle_command(&mut self, cmd: Command) -> bool {
        match cmd {
            Command::Begin { config, reply } => {
                self.store.begin(config, self.clock.now_ms());
                // A fresh period: full timers (re-derived from the
                // validated record), fresh heartbeat schedule.
                self.rearm_from_record();
                self.sync.stop();
                self.sync.start();
                let _ = reply.send(());
            }
            Command::UpdateConfig { update, reply } => {
                let merged = self.store.update_config(update);
                if merged {
                    self.rearm_from_record();
                }
                let _ = reply.send(merged);
            }
            Command::TimeRemaining { reply } => {
                let _ = reply.send(self.store.time_remaining(self.clock.now_ms()));
            }
            Command::IsActive { reply } => {
                let was_active =
                    self.store.record().is_some_and(|r| r.is_active);
                let active = self.store.is_active(self.clock.now_ms());
                if was_active && !active {
                    // The predicate self-corrected a lost timer; finish
                    // the expiry the timer would have performed.
                    self.timers.disarm();
                    self.sync.stop();
                    tracing::info!("session expired");
                    self.events.on_expired();
                }
                let _ = reply.send(active);
            }
            Command::End { reply } => {
                self.store.end();
                self.timers.disarm();
                self.sync.stop();
                let _ = reply.send(());
            }
            Command::Shutdown => return false,
        }
        true
    }

    /// One interaction signal from the observer (or the handle).
    fn handle_activity(&mut self, kind: ActivityKind) {
        match self.store.record_activity(self.clock.now_ms()) {
            ActivityOutcome::Recorded => {
                self.rearm_from_record();
                self.sync.note_activity();
                self.events.on_renewed();
                tracing::trace!(%kind, "activity extended session");
            }
            ActivityOutcome::Throttled => {
                tracing::trace!(%kind, "activity inside throttle floor");
            }
            ActivityOutcome::NoSession => {
                tracing::trace!(%kind, "activity without active session");
            }
        }
    }

    /// A timer deadline elapsed.
    fn handle_fire(&mut self, fire: TimerFire) {
        match fire {
            TimerFire::Warning { lead_minutes } => {
                tracing::info!(lead_minutes, "idle warning");
                self.events.on_warning(lead_minutes);
            }
            TimerFire::Expiry => self.expire(),
        }
    }

    /// A sync became due; dispatch it if the gate allows.
    fn handle_sync_due(&mut self, trigger: SyncTrigger) {
        match self.sync.try_begin() {
            Ok(()) => {
                tracing::trace!(?trigger, "sync dispatched");
                let authority = Arc::clone(&self.authority);
                let results = self.sync_results_tx.clone();
                tokio::spawn(async move {
                    let outcome = authority.check_session().await;
                    let _ = results.send(outcome);
                });
            }
            Err(skip) => {
                tracing::debug!(?trigger, %skip, "sync skipped");
            }
        }
    }

    /// A detached authority call resolved.
    fn handle_sync_result(
        &mut self,
        outcome: Result<AuthorityResponse, SyncError>,
    ) {
        self.sync.complete();

        let response = match outcome {
            Ok(response) => response,
            Err(e) => {
                tracing::debug!(error = %e, "sync failed — local timers stay authoritative");
                return;
            }
        };
        if !response.success {
            tracing::debug!(
                message = response.message.as_deref().unwrap_or_default(),
                "authority reported unsuccessful session check"
            );
            return;
        }
        let Some(view) = response.session else {
            tracing::debug!("authority response carried no session view");
            return;
        };
        let Some(record) = self.store.record().filter(|r| r.is_active) else {
            // The session ended or expired while the call was in
            // flight; its answer is stale.
            return;
        };

        let report = expiry_drift(
            record.expires_at_ms(),
            view.expires_at,
            self.sync.config().drift_tolerance,
        );
        if !report.exceeds_tolerance {
            tracing::debug!(
                drift_ms = report.drift.as_millis() as u64,
                "remote expiry within tolerance"
            );
            return;
        }

        tracing::warn!(
            drift_ms = report.drift.as_millis() as u64,
            direction = ?report.direction,
            "local and remote session expiry disagree"
        );

        if self.sync.config().correct_drift {
            // Togglable policy, off by default. Only this branch ever
            // lets the remote view move local timers.
            let corrected = corrected_last_activity_ms(
                view.expires_at,
                record.config.idle_timeout(),
            );
            if self.store.align_last_activity(corrected) {
                self.rearm_from_record();
                tracing::info!(
                    last_activity_ms = corrected,
                    "applied drift correction"
                );
            }
        }
    }

    /// Re-derives both timers from the record's existing activity time.
    fn rearm_from_record(&mut self) {
        let now_ms = self.clock.now_ms();
        let Some(record) = self.store.record().filter(|r| r.is_active) else {
            return;
        };
        let config = record.config;
        let elapsed = Duration::from_millis(record.elapsed_ms(now_ms));
        self.timers.arm(
            config.idle_timeout(),
            config.warning_lead_minutes,
            elapsed,
        );
    }

    /// The idle budget is spent: transition, persist, notify — once.
    fn expire(&mut self) {
        if self.store.mark_expired() {
            self.timers.disarm();
            self.sync.stop();
            tracing::info!("session expired");
            self.events.on_expired();
        }
    }
}
