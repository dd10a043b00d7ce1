//! Challenge selection and placement.

use std::collections::VecDeque;
use std::time::Duration;

use rand::Rng;

use crate::geometry::{self, Playfield, Rect, Size};

/// Outer budget for the four basic kinds
pub const BASE_BUDGET_MS: u64 = 5000;
/// How long a HoldClick target must be held
pub const HOLD_DURATION_MS: u64 = 1000;
pub const DODGE_ZONE_BUDGET_MS: u64 = 4000;
pub const DODGE_CLICK_BUDGET_MS: u64 = 2500;
/// Window for the second press of a DoubleClick
pub const DOUBLE_CLICK_WINDOW_MS: u64 = 600;
/// Score from which dodge challenges join the draw
pub const FULL_ROSTER_SCORE: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum_macros::Display)]
pub enum ChallengeKind {
    SingleClick,
    DoubleClick,
    HoldClick,
    NoClick,
    DodgeZone,
    DodgeClick,
}

impl ChallengeKind {
    pub const ALL: [ChallengeKind; 6] = [
        ChallengeKind::SingleClick,
        ChallengeKind::DoubleClick,
        ChallengeKind::HoldClick,
        ChallengeKind::NoClick,
        ChallengeKind::DodgeZone,
        ChallengeKind::DodgeClick,
    ];

    /// Kinds that can be drawn at `score`
    pub fn eligible(score: u32) -> &'static [ChallengeKind] {
        if score >= FULL_ROSTER_SCORE {
            &Self::ALL
        } else {
            &Self::ALL[..4]
        }
    }

    /// Time limit of a freshly spawned challenge of this kind
    pub fn budget(self) -> Duration {
        let ms = match self {
            ChallengeKind::SingleClick
            | ChallengeKind::DoubleClick
            | ChallengeKind::HoldClick
            | ChallengeKind::NoClick => BASE_BUDGET_MS,
            ChallengeKind::DodgeZone => DODGE_ZONE_BUDGET_MS,
            ChallengeKind::DodgeClick => DODGE_CLICK_BUDGET_MS,
        };
        Duration::from_millis(ms)
    }

    pub fn is_dodge(self) -> bool {
        matches!(self, ChallengeKind::DodgeZone | ChallengeKind::DodgeClick)
    }

    /// Text drawn on the target
    pub fn caption(self) -> &'static str {
        match self {
            ChallengeKind::SingleClick => "1 CLICK",
            ChallengeKind::DoubleClick => "2 CLICKS",
            ChallengeKind::HoldClick => "HOLD",
            ChallengeKind::NoClick => "NO CLICK",
            ChallengeKind::DodgeZone => "DODGE",
            ChallengeKind::DodgeClick => "CLICK",
        }
    }

    /// Entry label written when the challenge is beaten
    pub fn success_label(self) -> &'static str {
        match self {
            ChallengeKind::SingleClick => "Single Click",
            ChallengeKind::DoubleClick => "Doble Click",
            ChallengeKind::HoldClick => "Hold Click (1s)",
            ChallengeKind::NoClick => "No Click",
            ChallengeKind::DodgeZone => "Dodge Zone (evaded)",
            ChallengeKind::DodgeClick => "Dodge Click (safe click)",
        }
    }
}

/// Uniform draw over the eligible kinds, redrawn until it differs from `last`.
pub fn next_kind<R: Rng + ?Sized>(score: u32, last: ChallengeKind, rng: &mut R) -> ChallengeKind {
    let eligible = ChallengeKind::eligible(score);
    loop {
        let kind = eligible[rng.gen_range(0..eligible.len())];
        if kind != last {
            return kind;
        }
    }
}

/// Picks the kind of each new challenge
pub trait Scheduler {
    fn next_kind<R: Rng + ?Sized>(&mut self, score: u32, last: ChallengeKind, rng: &mut R)
        -> ChallengeKind;
}

/// Production scheduler; never repeats the previous kind
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomScheduler;

impl Scheduler for RandomScheduler {
    fn next_kind<R: Rng + ?Sized>(
        &mut self,
        score: u32,
        last: ChallengeKind,
        rng: &mut R,
    ) -> ChallengeKind {
        next_kind(score, last, rng)
    }
}

/// Replays a fixed list of kinds verbatim, then falls back to [`RandomScheduler`].
///
/// Used to drive deterministic sessions; the replayed part is not checked
/// against the previous kind.
#[derive(Debug, Clone, Default)]
pub struct ScriptedScheduler {
    script: VecDeque<ChallengeKind>,
}

impl ScriptedScheduler {
    pub fn new<I: IntoIterator<Item = ChallengeKind>>(kinds: I) -> Self {
        Self {
            script: kinds.into_iter().collect(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.script.len()
    }
}

impl Scheduler for ScriptedScheduler {
    fn next_kind<R: Rng + ?Sized>(
        &mut self,
        score: u32,
        last: ChallengeKind,
        rng: &mut R,
    ) -> ChallengeKind {
        self.script
            .pop_front()
            .unwrap_or_else(|| next_kind(score, last, rng))
    }
}

/// Where a new challenge goes and what it guards
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    pub target: Option<Rect>,
    pub hazards: Vec<Rect>,
}

/// Lay out a challenge of `kind` on the playfield.
///
/// DodgeZone always gets at least one hazard and no target. DodgeClick may get
/// no hazard at all, but its target never overlaps one.
pub fn place<R: Rng + ?Sized>(
    kind: ChallengeKind,
    score: u32,
    playfield: &Playfield,
    target_size: Size,
    rng: &mut R,
) -> Placement {
    match kind {
        ChallengeKind::DodgeZone => Placement {
            target: None,
            hazards: geometry::hazard_zones(playfield, score, true, rng),
        },
        ChallengeKind::DodgeClick => {
            let hazards = geometry::hazard_zones(playfield, score, false, rng);
            let target = geometry::find_safe_spawn(playfield, target_size, &hazards, rng);
            Placement {
                target: Some(target),
                hazards,
            }
        }
        _ => Placement {
            target: Some(geometry::place_target(playfield, target_size, rng)),
            hazards: Vec::new(),
        },
    }
}
