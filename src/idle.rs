//! Idle-timeout sequencer.
//!
//! A two-stage timer owned by the app coordinator. The idle countdown runs
//! while the user is (potentially) away; on expiry the session is probed for
//! live busy status, and only a genuinely idle session moves to
//! [`TimerPhase::WarningShown`], where a short buffer countdown decides
//! between resume and termination.
//!
//! Countdown callbacks are spawned tasks that do nothing but sleep and send a
//! message back to the app loop. Every (re)arm bumps a generation counter and
//! aborts the previous task, so a stale expiry can never fire twice: even if
//! an aborted task's message is already in flight, its generation no longer
//! matches and the sequencer drops it.

use crate::app::AppMessage;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;

/// Seconds between the warning appearing and termination firing.
pub const DEFAULT_BUFFER_TIMEOUT: Duration = Duration::from_secs(10);

/// Where the sequencer is in its cycle. Derived state, never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerPhase {
    /// Counting down quietly (or disarmed entirely).
    Idle,
    /// The termination warning is up and the buffer countdown is running.
    WarningShown,
}

/// Outcome of an idle-countdown expiry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdleExpiry {
    /// The expiry belonged to an invalidated countdown; ignore it.
    Stale,
    /// Session is mid-transition; the countdown restarted as a grace period.
    Restarted,
    /// The caller must issue a live busy probe and report back via
    /// [`IdleSequencer::on_busy_probe`].
    ProbeBusy,
}

/// Outcome of the busy probe that follows an idle expiry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeOutcome {
    Stale,
    /// Session was busy; the idle countdown restarted.
    Restarted,
    /// Session was idle; the warning phase began and the buffer countdown is
    /// running. The caller should force the overlay visible.
    WarningStarted,
}

/// The two-stage idle/termination timer.
pub struct IdleSequencer {
    phase: TimerPhase,
    idle_timeout: Option<Duration>,
    buffer_timeout: Duration,
    auth_ok: bool,
    generation: u64,
    idle_timer: Option<JoinHandle<()>>,
    buffer_timer: Option<JoinHandle<()>>,
    tx: UnboundedSender<AppMessage>,
}

impl IdleSequencer {
    pub fn new(tx: UnboundedSender<AppMessage>) -> Self {
        Self::with_buffer_timeout(tx, DEFAULT_BUFFER_TIMEOUT)
    }

    /// Construct with a custom buffer duration (tests shorten it).
    pub fn with_buffer_timeout(tx: UnboundedSender<AppMessage>, buffer_timeout: Duration) -> Self {
        Self {
            phase: TimerPhase::Idle,
            idle_timeout: None,
            buffer_timeout,
            auth_ok: false,
            generation: 0,
            idle_timer: None,
            buffer_timer: None,
            tx,
        }
    }

    pub fn phase(&self) -> TimerPhase {
        self.phase
    }

    pub fn buffer_timeout(&self) -> Duration {
        self.buffer_timeout
    }

    /// Countdown tasks currently pending. Used by teardown tests.
    pub fn pending_countdowns(&self) -> usize {
        self.idle_timer.iter().chain(self.buffer_timer.iter()).count()
    }

    fn armed(&self) -> bool {
        self.idle_timeout.is_some() && self.auth_ok
    }

    /// Apply timeout config and the auth gate. Arms the idle countdown when
    /// the session is usable (auth satisfied, timeout enabled) and cancels
    /// it otherwise. The buffer countdown is not touched: an already-shown
    /// warning must not silently dismiss itself.
    pub fn configure(&mut self, idle_timeout: Option<Duration>, auth_ok: bool) {
        self.idle_timeout = idle_timeout;
        self.auth_ok = auth_ok;
        if self.armed() {
            if self.phase == TimerPhase::Idle {
                self.restart_idle();
            }
        } else {
            self.cancel_idle();
        }
    }

    /// A qualifying user interaction (key press, click, mouse move).
    /// Restarts the idle countdown, but only in the idle phase: interactions
    /// are not observed while the warning is up.
    pub fn note_interaction(&mut self) {
        if self.phase == TimerPhase::Idle {
            self.restart_idle();
        }
    }

    /// The idle countdown fired.
    ///
    /// `session_transitioning` is the store's view of the managed app being
    /// mid-start or mid-stop, which earns a grace period. Otherwise the
    /// caller must probe live busy status; the cached value is never
    /// trusted at expiry.
    pub fn on_idle_expired(&mut self, generation: u64, session_transitioning: bool) -> IdleExpiry {
        if generation != self.generation {
            return IdleExpiry::Stale;
        }
        self.idle_timer = None;
        if !self.armed() || self.phase != TimerPhase::Idle {
            return IdleExpiry::Stale;
        }
        if session_transitioning {
            self.restart_idle();
            return IdleExpiry::Restarted;
        }
        IdleExpiry::ProbeBusy
    }

    /// Result of the live busy probe issued after an idle expiry.
    pub fn on_busy_probe(&mut self, generation: u64, busy: bool) -> ProbeOutcome {
        if generation != self.generation || self.phase != TimerPhase::Idle {
            return ProbeOutcome::Stale;
        }
        if busy {
            self.restart_idle();
            return ProbeOutcome::Restarted;
        }
        self.phase = TimerPhase::WarningShown;
        self.start_buffer();
        ProbeOutcome::WarningStarted
    }

    /// The busy probe failed. Terminal for this cycle: the phase stays
    /// unchanged and no countdown is re-armed; the next qualifying
    /// interaction or reconfiguration starts a fresh cycle.
    pub fn on_probe_failed(&mut self, generation: u64) {
        let _ = generation;
    }

    /// The buffer countdown fired. Returns true exactly once per warning:
    /// the caller then fires the terminate request.
    pub fn on_buffer_expired(&mut self, generation: u64) -> bool {
        if generation != self.generation || self.phase != TimerPhase::WarningShown {
            return false;
        }
        self.buffer_timer = None;
        true
    }

    /// User chose to keep the session: cancel the buffer countdown, return
    /// to the idle phase and restart the idle countdown.
    pub fn resume(&mut self) {
        self.cancel_buffer();
        self.phase = TimerPhase::Idle;
        self.restart_idle();
    }

    /// Cancel both countdowns unconditionally. Called on teardown so no
    /// orphaned timer can fire into a dead app.
    pub fn shutdown(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        self.cancel_idle();
        self.cancel_buffer();
    }

    fn restart_idle(&mut self) {
        let Some(timeout) = self.idle_timeout else {
            return;
        };
        if !self.auth_ok {
            return;
        }
        self.generation = self.generation.wrapping_add(1);
        self.cancel_idle();
        let generation = self.generation;
        let tx = self.tx.clone();
        self.idle_timer = Some(tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            let _ = tx.send(AppMessage::IdleExpired { generation });
        }));
    }

    fn start_buffer(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        self.cancel_buffer();
        let generation = self.generation;
        let timeout = self.buffer_timeout;
        let tx = self.tx.clone();
        self.buffer_timer = Some(tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            let _ = tx.send(AppMessage::BufferExpired { generation });
        }));
    }

    fn cancel_idle(&mut self) {
        if let Some(handle) = self.idle_timer.take() {
            handle.abort();
        }
    }

    fn cancel_buffer(&mut self) {
        if let Some(handle) = self.buffer_timer.take() {
            handle.abort();
        }
    }
}
