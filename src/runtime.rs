use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::{Duration, Instant};

use crossterm::event::{self, Event as CtEvent, KeyEvent, MouseButton, MouseEvent, MouseEventKind};

use crate::engine::PointerButton;
use crate::geometry::Point;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerAction {
    Down(PointerButton),
    Up(PointerButton),
    Moved,
}

/// Mouse input translated into playfield coordinates
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PointerEvent {
    pub action: PointerAction,
    pub at: Point,
}

impl PointerEvent {
    /// `None` for mouse events the game does not use (scrolling)
    pub fn from_mouse(mouse: MouseEvent) -> Option<Self> {
        let action = match mouse.kind {
            MouseEventKind::Down(b) => PointerAction::Down(pointer_button(b)),
            MouseEventKind::Up(b) => PointerAction::Up(pointer_button(b)),
            MouseEventKind::Moved | MouseEventKind::Drag(_) => PointerAction::Moved,
            _ => return None,
        };
        Some(Self {
            action,
            at: Point::new(i32::from(mouse.column), i32::from(mouse.row)),
        })
    }
}

fn pointer_button(button: MouseButton) -> PointerButton {
    match button {
        MouseButton::Left => PointerButton::Primary,
        MouseButton::Right => PointerButton::Secondary,
        MouseButton::Middle => PointerButton::Middle,
    }
}

/// Unified event type consumed by the app runner
#[derive(Clone, Debug)]
pub enum FlinchEvent {
    Key(KeyEvent),
    Pointer(PointerEvent),
    Resize(u16, u16),
    /// Real time elapsed since the previous tick
    Tick(Duration),
}

/// Source of terminal events (keyboard, mouse, resize)
pub trait FlinchEventSource: Send + 'static {
    /// Block for up to `timeout` waiting for an event.
    fn recv_timeout(&self, timeout: Duration) -> Result<FlinchEvent, RecvTimeoutError>;
}

/// Production event source using crossterm
pub struct CrosstermEventSource {
    rx: Receiver<FlinchEvent>,
}

impl CrosstermEventSource {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();

        std::thread::spawn(move || loop {
            let ev = match event::read() {
                Ok(CtEvent::Key(key)) => Some(FlinchEvent::Key(key)),
                Ok(CtEvent::Mouse(mouse)) => PointerEvent::from_mouse(mouse).map(FlinchEvent::Pointer),
                Ok(CtEvent::Resize(w, h)) => Some(FlinchEvent::Resize(w, h)),
                Ok(_) => None,
                Err(err) => {
                    log::warn!("terminal input closed: {err}");
                    break;
                }
            };
            if let Some(ev) = ev {
                if tx.send(ev).is_err() {
                    break;
                }
            }
        });

        Self { rx }
    }
}

impl Default for CrosstermEventSource {
    fn default() -> Self {
        Self::new()
    }
}

impl FlinchEventSource for CrosstermEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<FlinchEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Configurable ticker interface
pub trait Ticker: Send + Sync + 'static {
    fn interval(&self) -> Duration;
}

/// Fixed interval ticker
#[derive(Clone, Copy, Debug)]
pub struct FixedTicker {
    interval: Duration,
}

impl FixedTicker {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

impl Ticker for FixedTicker {
    fn interval(&self) -> Duration {
        self.interval
    }
}

/// Test event source for unit tests
pub struct TestEventSource {
    rx: Receiver<FlinchEvent>,
}

impl TestEventSource {
    pub fn new(rx: Receiver<FlinchEvent>) -> Self {
        Self { rx }
    }
}

impl FlinchEventSource for TestEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<FlinchEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Runner that hands out input events and a tick once per interval.
///
/// Input never starves the tick: once an interval has passed since the last
/// tick, the next `step` yields a tick carrying the real elapsed time.
pub struct Runner<E: FlinchEventSource, T: Ticker> {
    event_source: E,
    ticker: T,
    last_tick: Instant,
}

impl<E: FlinchEventSource, T: Ticker> Runner<E, T> {
    pub fn new(event_source: E, ticker: T) -> Self {
        Self {
            event_source,
            ticker,
            last_tick: Instant::now(),
        }
    }

    pub fn step(&mut self) -> FlinchEvent {
        let interval = self.ticker.interval();
        let since = self.last_tick.elapsed();
        if since >= interval {
            return self.tick();
        }
        match self.event_source.recv_timeout(interval - since) {
            Ok(ev) => ev,
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => self.tick(),
        }
    }

    fn tick(&mut self) -> FlinchEvent {
        let now = Instant::now();
        let delta = now - self.last_tick;
        self.last_tick = now;
        FlinchEvent::Tick(delta)
    }
}
