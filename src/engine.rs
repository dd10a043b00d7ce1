//! The challenge session state machine.
//!
//! The engine is driven entirely from the outside: the host forwards pointer
//! presses and releases, and calls [`SessionEngine::tick`] on a fixed cadence
//! with the current pointer position. Every call runs to completion, including
//! any resolution and the spawn of the next challenge, before it returns.
//! Display updates are queued as [`Notification`]s for the host to drain.

use std::path::{Path, PathBuf};
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::challenge::{Challenge, Resolution, Verdict};
use crate::clock::{Clock, SystemClock};
use crate::error::SessionError;
use crate::geometry::{Playfield, Point, Rect, Size};
use crate::results::{ResultEntry, ResultLog};
use crate::scheduler::{self, ChallengeKind, Placement, RandomScheduler, Scheduler};

pub const MAX_LIVES: u8 = 3;
/// Points awarded per remaining score when a run ends
pub const FINAL_SCORE_MULTIPLIER: u32 = 250;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Secondary,
    Middle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameOverSummary {
    pub final_score: u32,
    pub fail_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Running,
    Stopped,
    GameOver(GameOverSummary),
}

/// Display updates for the host, in the order they happened
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    ChallengeSpawned {
        kind: ChallengeKind,
        placement: Placement,
    },
    ChallengeResolved {
        kind: ChallengeKind,
        verdict: Verdict,
    },
    ProgressChanged(u8),
    ScoreChanged {
        score: u32,
        lives: u8,
    },
    GameOver(GameOverSummary),
}

/// Geometry the engine lays challenges out in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineSettings {
    pub playfield: Playfield,
    pub target_size: Size,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            playfield: Playfield::new(80, 24, 3),
            target_size: Size::new(10, 3),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChallengeView {
    pub id: u64,
    pub kind: ChallengeKind,
    pub target: Option<Rect>,
    pub hazards: Vec<Rect>,
    pub holding: bool,
    pub clicks_seen: u8,
}

impl From<&Challenge> for ChallengeView {
    fn from(c: &Challenge) -> Self {
        Self {
            id: c.id,
            kind: c.kind,
            target: c.target,
            hazards: c.hazards.clone(),
            holding: c.is_holding(),
            clicks_seen: c.clicks_seen(),
        }
    }
}

/// Immutable copy of everything the view needs to draw a frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub phase: Phase,
    pub score: u32,
    pub lives: u8,
    pub percent_remaining: u8,
    pub challenge: Option<ChallengeView>,
    pub last_verdict: Option<Verdict>,
}

impl SessionSnapshot {
    pub fn running(&self) -> bool {
        self.phase == Phase::Running
    }
}

/// The engine the terminal app runs: wall clock, random kinds
pub type SystemEngine = SessionEngine<SystemClock, RandomScheduler, StdRng>;

pub struct SessionEngine<C: Clock, S: Scheduler, R: Rng> {
    clock: C,
    scheduler: S,
    rng: R,
    settings: EngineSettings,
    phase: Phase,
    score: u32,
    lives: u8,
    last_kind: ChallengeKind,
    challenge: Option<Challenge>,
    next_id: u64,
    log: ResultLog,
    percent_remaining: u8,
    last_verdict: Option<Verdict>,
    notifications: Vec<Notification>,
}

impl SessionEngine<SystemClock, RandomScheduler, StdRng> {
    /// Wall-clock engine; a seed makes challenge selection and placement repeatable.
    pub fn system(settings: EngineSettings, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self::new(SystemClock::new(), RandomScheduler, rng, settings)
    }
}

impl<C: Clock, S: Scheduler, R: Rng> SessionEngine<C, S, R> {
    pub fn new(clock: C, scheduler: S, rng: R, settings: EngineSettings) -> Self {
        Self {
            clock,
            scheduler,
            rng,
            settings,
            phase: Phase::Idle,
            score: 0,
            lives: MAX_LIVES,
            last_kind: ChallengeKind::NoClick,
            challenge: None,
            next_id: 0,
            log: ResultLog::new(),
            percent_remaining: 0,
            last_verdict: None,
            notifications: Vec::new(),
        }
    }

    pub fn is_running(&self) -> bool {
        self.phase == Phase::Running
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn lives(&self) -> u8 {
        self.lives
    }

    pub fn challenge(&self) -> Option<&Challenge> {
        self.challenge.as_ref()
    }

    pub fn result_log(&self) -> &ResultLog {
        &self.log
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// New geometry applies from the next spawn on.
    pub fn set_playfield(&mut self, playfield: Playfield) {
        self.settings.playfield = playfield;
    }

    pub fn drain_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.notifications)
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            phase: self.phase,
            score: self.score,
            lives: self.lives,
            percent_remaining: self.percent_remaining,
            challenge: self.challenge.as_ref().map(ChallengeView::from),
            last_verdict: self.last_verdict,
        }
    }

    /// Write the current log into `dir`. Session state is untouched either way.
    pub fn export_results(&self, dir: &Path) -> Result<PathBuf, SessionError> {
        let path = self.log.export_to_dir(dir, self.clock.wall())?;
        log::info!("exported {} results to {}", self.log.len(), path.display());
        Ok(path)
    }

    /// Begin a fresh run: score and lives reset, the log is cleared and the
    /// first challenge spawns immediately.
    pub fn start(&mut self) {
        self.score = 0;
        self.lives = MAX_LIVES;
        self.log.clear();
        self.last_verdict = None;
        self.challenge = None;
        self.phase = Phase::Running;
        log::info!("session started");
        self.notify_score();
        self.spawn();
    }

    /// Halt the run in place. Pending deadlines can no longer fire.
    pub fn stop(&mut self) -> Result<(), SessionError> {
        self.ensure_running("stop")?;
        self.phase = Phase::Stopped;
        log::info!("session stopped at score {}", self.score);
        Ok(())
    }

    pub fn pointer_down(&mut self, at: Point, button: PointerButton) -> Result<(), SessionError> {
        self.ensure_running("pointer down")?;
        if button != PointerButton::Primary {
            return Err(self.invalid("secondary pointer down"));
        }
        // Input that arrives after a deadline is spent on it; the fresh challenge never sees it.
        if self.fire_due_deadline() {
            return Err(self.invalid("late pointer down"));
        }

        let now = self.clock.now();
        let resolution = match self.challenge.as_mut() {
            Some(challenge) => challenge.on_press(at, now)?,
            None => return Err(self.invalid("pointer down")),
        };
        match resolution {
            Some(resolution) => self.resolve(resolution),
            None => self.refresh_progress(),
        }
        Ok(())
    }

    pub fn pointer_up(&mut self, _at: Point, button: PointerButton) -> Result<(), SessionError> {
        self.ensure_running("pointer up")?;
        if button != PointerButton::Primary {
            return Err(self.invalid("secondary pointer up"));
        }
        // Input that arrives after a deadline is spent on it; the fresh challenge never sees it.
        if self.fire_due_deadline() {
            return Err(self.invalid("late pointer up"));
        }

        let resolution = match self.challenge.as_mut() {
            Some(challenge) => challenge.on_release()?,
            None => return Err(self.invalid("pointer up")),
        };
        self.resolve(resolution);
        Ok(())
    }

    /// Progress tick. Fires overdue real-time deadlines, advances virtual
    /// time for dodge challenges using `delta`, and refreshes the progress
    /// percentage.
    pub fn tick(&mut self, delta: Duration, pointer: Point) -> Result<(), SessionError> {
        self.ensure_running("tick")?;
        if self.fire_due_deadline() {
            return Ok(());
        }

        let now = self.clock.now();
        let resolution = self
            .challenge
            .as_mut()
            .and_then(|c| c.advance_virtual(delta, pointer, now));
        match resolution {
            Some(resolution) => self.resolve(resolution),
            None => self.refresh_progress(),
        }
        Ok(())
    }

    fn ensure_running(&self, event: &'static str) -> Result<(), SessionError> {
        if self.is_running() {
            Ok(())
        } else {
            Err(SessionError::InvalidTransition { event, kind: None })
        }
    }

    fn invalid(&self, event: &'static str) -> SessionError {
        SessionError::InvalidTransition {
            event,
            kind: self.challenge.as_ref().map(|c| c.kind),
        }
    }

    /// Resolve the active challenge if its real-time deadline has passed.
    /// Returns whether anything fired.
    fn fire_due_deadline(&mut self) -> bool {
        let now = self.clock.now();
        let due = self.challenge.as_ref().and_then(|c| {
            c.pending_deadline()
                .filter(|(at, _)| now >= *at)
                .map(|(_, expiry)| c.on_deadline(expiry, now))
        });
        match due {
            Some(resolution) => {
                self.resolve(resolution);
                true
            }
            None => false,
        }
    }

    fn refresh_progress(&mut self) {
        let now = self.clock.now();
        let percent = self
            .challenge
            .as_ref()
            .map_or(0, |c| c.percent_remaining(now));
        if percent != self.percent_remaining {
            self.percent_remaining = percent;
            self.notifications.push(Notification::ProgressChanged(percent));
        }
    }

    fn notify_score(&mut self) {
        self.notifications.push(Notification::ScoreChanged {
            score: self.score,
            lives: self.lives,
        });
    }

    fn resolve(&mut self, resolution: Resolution) {
        let Some(resolved) = self.challenge.take() else {
            return;
        };
        log::debug!(
            "challenge #{} ({}) resolved: {}",
            resolved.id,
            resolved.kind,
            resolution.label()
        );

        match resolution.verdict {
            Verdict::Success => self.score += 1,
            Verdict::Failure(_) => {
                self.score = self.score.saturating_sub(1);
                self.lives = self.lives.saturating_sub(1);
            }
        }
        self.last_verdict = Some(resolution.verdict);
        self.log.push(ResultEntry::from_resolution(
            &resolution,
            self.score,
            self.clock.wall(),
        ));
        self.notifications.push(Notification::ChallengeResolved {
            kind: resolution.kind,
            verdict: resolution.verdict,
        });
        self.notify_score();

        if self.lives == 0 {
            self.challenge = Some(resolved);
            self.game_over();
        } else {
            self.spawn();
        }
    }

    fn game_over(&mut self) {
        let summary = GameOverSummary {
            final_score: self.score * FINAL_SCORE_MULTIPLIER,
            fail_count: self.log.failures(),
        };
        log::info!(
            "game over: final score {} after {} failures",
            summary.final_score,
            summary.fail_count
        );
        self.phase = Phase::GameOver(summary);
        self.notifications.push(Notification::GameOver(summary));

        self.score = 0;
        self.lives = MAX_LIVES;
        self.notify_score();
    }

    fn spawn(&mut self) {
        let kind = self
            .scheduler
            .next_kind(self.score, self.last_kind, &mut self.rng);
        let placement = scheduler::place(
            kind,
            self.score,
            &self.settings.playfield,
            self.settings.target_size,
            &mut self.rng,
        );

        self.next_id += 1;
        self.last_kind = kind;
        log::debug!("spawning challenge #{} ({kind})", self.next_id);
        self.notifications.push(Notification::ChallengeSpawned {
            kind,
            placement: placement.clone(),
        });
        self.challenge = Some(Challenge::new(
            self.next_id,
            kind,
            placement,
            self.clock.now(),
        ));
        self.percent_remaining = 0;
        self.refresh_progress();
    }
}
