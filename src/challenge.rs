//! The active challenge and its per-kind state.
//!
//! Each kind carries only the state it needs, and every timer is expressed as
//! a deadline derived from that state. Dropping a `Challenge` therefore drops
//! all of its timers with it.

use std::fmt;
use std::time::Duration;

use crate::clock::{self, VirtualElapsed};
use crate::error::SessionError;
use crate::geometry::{Point, Rect};
use crate::scheduler::{ChallengeKind, Placement, DOUBLE_CLICK_WINDOW_MS, HOLD_DURATION_MS};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickPhase {
    Armed,
    OneClickSeen { first_at: Duration },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoldPhase {
    Armed,
    Holding { pressed_at: Duration },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChallengeState {
    SingleClick,
    DoubleClick(ClickPhase),
    HoldClick(HoldPhase),
    NoClick,
    DodgeZone(VirtualElapsed),
    DodgeClick(VirtualElapsed),
}

impl ChallengeState {
    fn armed(kind: ChallengeKind) -> Self {
        match kind {
            ChallengeKind::SingleClick => ChallengeState::SingleClick,
            ChallengeKind::DoubleClick => ChallengeState::DoubleClick(ClickPhase::Armed),
            ChallengeKind::HoldClick => ChallengeState::HoldClick(HoldPhase::Armed),
            ChallengeKind::NoClick => ChallengeState::NoClick,
            ChallengeKind::DodgeZone => ChallengeState::DodgeZone(VirtualElapsed::new()),
            ChallengeKind::DodgeClick => ChallengeState::DodgeClick(VirtualElapsed::new()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailReason {
    DoubleClickTimeout,
    ReleasedEarly,
    TimedOut,
    ClickedForbiddenTarget,
    CaughtInZone,
    ClickedInsideHazard,
}

impl fmt::Display for FailReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            FailReason::DoubleClickTimeout => "double-click timeout",
            FailReason::ReleasedEarly => "released early",
            FailReason::TimedOut => "timed out",
            FailReason::ClickedForbiddenTarget => "clicked forbidden target",
            FailReason::CaughtInZone => "caught in zone",
            FailReason::ClickedInsideHazard => "clicked inside hazard",
        };
        f.write_str(reason)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Success,
    Failure(FailReason),
}

/// How a challenge ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub kind: ChallengeKind,
    pub verdict: Verdict,
    /// Zero for failures
    pub reaction_time: Duration,
}

impl Resolution {
    fn success(kind: ChallengeKind, reaction_time: Duration) -> Self {
        Self {
            kind,
            verdict: Verdict::Success,
            reaction_time,
        }
    }

    fn failure(kind: ChallengeKind, reason: FailReason) -> Self {
        Self {
            kind,
            verdict: Verdict::Failure(reason),
            reaction_time: Duration::ZERO,
        }
    }

    pub fn is_success(&self) -> bool {
        self.verdict == Verdict::Success
    }

    pub fn label(&self) -> String {
        match self.verdict {
            Verdict::Success => self.kind.success_label().to_string(),
            Verdict::Failure(reason) => format!("FAIL: {reason}"),
        }
    }
}

/// Which real-time timer a deadline belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expiry {
    Budget,
    Debounce,
    HoldComplete,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Challenge {
    pub id: u64,
    pub kind: ChallengeKind,
    pub target: Option<Rect>,
    pub hazards: Vec<Rect>,
    pub spawned_at: Duration,
    pub state: ChallengeState,
}

impl Challenge {
    pub fn new(id: u64, kind: ChallengeKind, placement: Placement, spawned_at: Duration) -> Self {
        Self {
            id,
            kind,
            target: placement.target,
            hazards: placement.hazards,
            spawned_at,
            state: ChallengeState::armed(kind),
        }
    }

    pub fn is_on_target(&self, p: Point) -> bool {
        self.target.is_some_and(|t| t.contains(p))
    }

    pub fn in_hazard(&self, p: Point) -> bool {
        self.hazards.iter().any(|h| h.contains(p))
    }

    pub fn is_holding(&self) -> bool {
        matches!(self.state, ChallengeState::HoldClick(HoldPhase::Holding { .. }))
    }

    pub fn clicks_seen(&self) -> u8 {
        match self.state {
            ChallengeState::DoubleClick(ClickPhase::OneClickSeen { .. }) => 1,
            _ => 0,
        }
    }

    /// Earliest pending real-time deadline. Dodge kinds run on virtual time
    /// and have none.
    pub fn pending_deadline(&self) -> Option<(Duration, Expiry)> {
        let budget = (self.spawned_at + self.kind.budget(), Expiry::Budget);
        match self.state {
            ChallengeState::SingleClick
            | ChallengeState::NoClick
            | ChallengeState::DoubleClick(ClickPhase::Armed)
            | ChallengeState::HoldClick(HoldPhase::Armed) => Some(budget),
            ChallengeState::DoubleClick(ClickPhase::OneClickSeen { first_at }) => {
                let debounce = first_at + Duration::from_millis(DOUBLE_CLICK_WINDOW_MS);
                if debounce <= budget.0 {
                    Some((debounce, Expiry::Debounce))
                } else {
                    Some(budget)
                }
            }
            ChallengeState::HoldClick(HoldPhase::Holding { pressed_at }) => Some((
                pressed_at + Duration::from_millis(HOLD_DURATION_MS),
                Expiry::HoldComplete,
            )),
            ChallengeState::DodgeZone(_) | ChallengeState::DodgeClick(_) => None,
        }
    }

    /// Primary-button press at `p`.
    ///
    /// `Ok(None)` means the press advanced the challenge without ending it.
    pub fn on_press(&mut self, p: Point, now: Duration) -> Result<Option<Resolution>, SessionError> {
        let reaction = now.saturating_sub(self.spawned_at);
        let kind = self.kind;
        let on_target = self.is_on_target(p);
        let in_hazard = self.in_hazard(p);
        let resolution = match &mut self.state {
            ChallengeState::SingleClick if on_target => {
                Resolution::success(kind, reaction)
            }
            ChallengeState::DoubleClick(phase) if on_target => {
                match *phase {
                    ClickPhase::Armed => {
                        *phase = ClickPhase::OneClickSeen { first_at: now };
                        return Ok(None);
                    }
                    ClickPhase::OneClickSeen { .. } => Resolution::success(kind, reaction),
                }
            }
            ChallengeState::HoldClick(phase @ HoldPhase::Armed) if on_target => {
                *phase = HoldPhase::Holding { pressed_at: now };
                return Ok(None);
            }
            ChallengeState::NoClick if on_target => {
                Resolution::failure(kind, FailReason::ClickedForbiddenTarget)
            }
            ChallengeState::DodgeZone(_) | ChallengeState::DodgeClick(_) if in_hazard => {
                Resolution::failure(kind, FailReason::ClickedInsideHazard)
            }
            ChallengeState::DodgeClick(_) if on_target => {
                Resolution::success(kind, reaction)
            }
            _ => {
                return Err(SessionError::InvalidTransition {
                    event: "pointer down",
                    kind: Some(kind),
                })
            }
        };
        Ok(Some(resolution))
    }

    /// Primary-button release; only meaningful while holding.
    pub fn on_release(&mut self) -> Result<Resolution, SessionError> {
        match self.state {
            ChallengeState::HoldClick(HoldPhase::Holding { .. }) => {
                Ok(Resolution::failure(self.kind, FailReason::ReleasedEarly))
            }
            _ => Err(SessionError::InvalidTransition {
                event: "pointer up",
                kind: Some(self.kind),
            }),
        }
    }

    /// Resolve the challenge for a deadline that has passed.
    pub fn on_deadline(&self, expiry: Expiry, now: Duration) -> Resolution {
        match (expiry, self.state) {
            (Expiry::HoldComplete, ChallengeState::HoldClick(HoldPhase::Holding { pressed_at })) => {
                Resolution::success(self.kind, pressed_at.saturating_sub(self.spawned_at))
            }
            (Expiry::Debounce, _) => Resolution::failure(self.kind, FailReason::DoubleClickTimeout),
            (Expiry::Budget, ChallengeState::NoClick) => {
                Resolution::success(self.kind, now.saturating_sub(self.spawned_at))
            }
            _ => Resolution::failure(self.kind, FailReason::TimedOut),
        }
    }

    /// Advance virtual time by one tick and check the dodge budget.
    pub fn advance_virtual(&mut self, delta: Duration, pointer: Point, now: Duration) -> Option<Resolution> {
        let in_hazard = self.in_hazard(pointer);
        let budget = self.kind.budget();
        let reaction = now.saturating_sub(self.spawned_at);
        match &mut self.state {
            ChallengeState::DodgeZone(elapsed) => {
                elapsed.advance(delta, in_hazard);
                if !elapsed.reached(budget) {
                    None
                } else if in_hazard {
                    Some(Resolution::failure(self.kind, FailReason::CaughtInZone))
                } else {
                    Some(Resolution::success(self.kind, reaction))
                }
            }
            ChallengeState::DodgeClick(elapsed) => {
                elapsed.advance(delta, in_hazard);
                elapsed
                    .reached(budget)
                    .then(|| Resolution::failure(self.kind, FailReason::TimedOut))
            }
            _ => None,
        }
    }

    /// Share of the current phase's time still left
    pub fn percent_remaining(&self, now: Duration) -> u8 {
        match self.state {
            ChallengeState::DodgeZone(elapsed) | ChallengeState::DodgeClick(elapsed) => {
                clock::percent_remaining(elapsed.elapsed(), self.kind.budget())
            }
            ChallengeState::HoldClick(HoldPhase::Holding { pressed_at }) => clock::percent_remaining(
                now.saturating_sub(pressed_at),
                Duration::from_millis(HOLD_DURATION_MS),
            ),
            _ => clock::percent_remaining(now.saturating_sub(self.spawned_at), self.kind.budget()),
        }
    }

}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    const TARGET: Rect = Rect::new(10, 5, 8, 3);
    const INSIDE: Point = Point::new(12, 6);
    const OUTSIDE: Point = Point::new(40, 20);

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    fn challenge(kind: ChallengeKind) -> Challenge {
        let placement = if kind == ChallengeKind::DodgeZone {
            Placement {
                target: None,
                hazards: vec![Rect::new(0, 2, 40, 22)],
            }
        } else if kind == ChallengeKind::DodgeClick {
            Placement {
                target: Some(Rect::new(50, 10, 8, 3)),
                hazards: vec![Rect::new(0, 2, 40, 22)],
            }
        } else {
            Placement {
                target: Some(TARGET),
                hazards: Vec::new(),
            }
        };
        Challenge::new(1, kind, placement, Duration::ZERO)
    }

    #[test]
    fn single_click_hit_measures_reaction() {
        let mut c = challenge(ChallengeKind::SingleClick);
        let res = c.on_press(INSIDE, ms(420)).unwrap().unwrap();
        assert!(res.is_success());
        assert_eq!(res.reaction_time, ms(420));
        assert_eq!(res.label(), "Single Click");
    }

    #[test]
    fn miss_is_an_invalid_transition() {
        let mut c = challenge(ChallengeKind::SingleClick);
        assert_matches!(
            c.on_press(OUTSIDE, ms(10)),
            Err(SessionError::InvalidTransition { event: "pointer down", .. })
        );
    }

    #[test]
    fn target_hit_test_is_half_open() {
        let mut c = challenge(ChallengeKind::NoClick);
        assert!(c.is_on_target(Point::new(17, 7)));
        assert!(!c.is_on_target(Point::new(18, 7)));
        assert!(!c.is_on_target(Point::new(17, 8)));
        assert!(c.on_press(Point::new(18, 5), ms(100)).is_err());
        assert_matches!(
            c.on_press(Point::new(10, 5), ms(100)),
            Ok(Some(Resolution {
                verdict: Verdict::Failure(FailReason::ClickedForbiddenTarget),
                ..
            }))
        );

        let dodge = challenge(ChallengeKind::DodgeZone);
        assert!(!dodge.is_on_target(INSIDE));
    }

    #[test]
    fn double_click_needs_two_presses() {
        let mut c = challenge(ChallengeKind::DoubleClick);
        assert_eq!(c.on_press(INSIDE, ms(100)).unwrap(), None);
        assert_eq!(c.clicks_seen(), 1);
        assert_eq!(c.pending_deadline(), Some((ms(700), Expiry::Debounce)));
        let res = c.on_press(INSIDE, ms(300)).unwrap().unwrap();
        assert!(res.label().contains("Doble Click"));
    }

    #[test]
    fn late_first_click_keeps_outer_budget() {
        let mut c = challenge(ChallengeKind::DoubleClick);
        c.on_press(INSIDE, ms(4800)).unwrap();
        assert_eq!(c.pending_deadline(), Some((ms(5000), Expiry::Budget)));
        assert_eq!(
            c.on_deadline(Expiry::Budget, ms(5000)).verdict,
            Verdict::Failure(FailReason::TimedOut)
        );
    }

    #[test]
    fn debounce_expiry_fails() {
        let c = challenge(ChallengeKind::DoubleClick);
        let res = c.on_deadline(Expiry::Debounce, ms(700));
        assert_eq!(res.verdict, Verdict::Failure(FailReason::DoubleClickTimeout));
        assert_eq!(res.label(), "FAIL: double-click timeout");
        assert_eq!(res.reaction_time, Duration::ZERO);
    }

    #[test]
    fn hold_switches_to_short_countdown() {
        let mut c = challenge(ChallengeKind::HoldClick);
        assert_eq!(c.pending_deadline(), Some((ms(5000), Expiry::Budget)));
        c.on_press(INSIDE, ms(200)).unwrap();
        assert!(c.is_holding());
        assert_eq!(c.pending_deadline(), Some((ms(1200), Expiry::HoldComplete)));
        assert_eq!(c.percent_remaining(ms(700)), 50);

        let res = c.on_deadline(Expiry::HoldComplete, ms(1200));
        assert!(res.is_success());
        assert_eq!(res.reaction_time, ms(200));
    }

    #[test]
    fn hold_release_fails_only_while_holding() {
        let mut c = challenge(ChallengeKind::HoldClick);
        assert!(c.on_release().is_err());
        c.on_press(INSIDE, ms(10)).unwrap();
        assert_eq!(
            c.on_release().unwrap().verdict,
            Verdict::Failure(FailReason::ReleasedEarly)
        );
    }

    #[test]
    fn second_press_while_holding_is_ignored() {
        let mut c = challenge(ChallengeKind::HoldClick);
        c.on_press(INSIDE, ms(10)).unwrap();
        assert!(c.on_press(INSIDE, ms(20)).is_err());
    }

    #[test]
    fn no_click_succeeds_on_budget_and_fails_on_press() {
        let c = challenge(ChallengeKind::NoClick);
        assert!(c.on_deadline(Expiry::Budget, ms(5000)).is_success());

        let mut c = challenge(ChallengeKind::NoClick);
        let res = c.on_press(INSIDE, ms(50)).unwrap().unwrap();
        assert_eq!(res.verdict, Verdict::Failure(FailReason::ClickedForbiddenTarget));
        assert!(c.on_press(OUTSIDE, ms(60)).is_err());
    }

    #[test]
    fn dodge_zone_evades_when_outside() {
        let mut c = challenge(ChallengeKind::DodgeZone);
        assert_eq!(c.pending_deadline(), None);
        let mut result = None;
        for i in 1..=40u64 {
            result = c.advance_virtual(ms(50), OUTSIDE, ms(50 * i));
            if result.is_some() {
                assert_eq!(i, 40);
            }
        }
        let res = result.unwrap();
        assert!(res.is_success());
        assert_eq!(res.label(), "Dodge Zone (evaded)");
    }

    #[test]
    fn dodge_zone_caught_when_inside_at_budget() {
        let mut c = challenge(ChallengeKind::DodgeZone);
        let inside = Point::new(5, 5);
        let mut result = None;
        for i in 1..=80u64 {
            result = c.advance_virtual(ms(50), inside, ms(50 * i));
            if result.is_some() {
                break;
            }
        }
        assert_eq!(result.unwrap().verdict, Verdict::Failure(FailReason::CaughtInZone));
    }

    #[test]
    fn dodge_click_hazard_then_target() {
        let mut c = challenge(ChallengeKind::DodgeClick);
        let res = c.on_press(Point::new(5, 5), ms(100)).unwrap().unwrap();
        assert_eq!(res.verdict, Verdict::Failure(FailReason::ClickedInsideHazard));

        let mut c = challenge(ChallengeKind::DodgeClick);
        let res = c.on_press(Point::new(52, 11), ms(300)).unwrap().unwrap();
        assert_eq!(res.label(), "Dodge Click (safe click)");
        assert_eq!(res.reaction_time, ms(300));
    }

    #[test]
    fn dodge_click_times_out_on_virtual_budget() {
        let mut c = challenge(ChallengeKind::DodgeClick);
        let mut result = None;
        let mut ticks = 0;
        while result.is_none() {
            ticks += 1;
            result = c.advance_virtual(ms(50), OUTSIDE, ms(50 * ticks));
        }
        assert_eq!(ticks, 25);
        assert_eq!(result.unwrap().verdict, Verdict::Failure(FailReason::TimedOut));
    }

    #[test]
    fn progress_uses_virtual_time_for_dodges() {
        let mut c = challenge(ChallengeKind::DodgeZone);
        c.advance_virtual(ms(1000), OUTSIDE, ms(1000));
        assert_eq!(c.percent_remaining(ms(1000)), 50);

        let c = challenge(ChallengeKind::SingleClick);
        assert_eq!(c.percent_remaining(ms(1250)), 75);
    }
}
