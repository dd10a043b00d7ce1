//! Playfield geometry: hit-testing, hazard halves and hazard-free spawn points.

use rand::Rng;

use crate::error::SessionError;

/// Gap kept between spawned targets and the playfield edges
pub const SPAWN_MARGIN: i32 = 1;
/// Random candidates tried before falling back to a scan
pub const SAFE_SPAWN_ATTEMPTS: usize = 50;
/// Score from which two hazard halves may be active at once
pub const DOUBLE_ZONE_SCORE: u32 = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Size {
    pub width: i32,
    pub height: i32,
}

impl Size {
    pub const fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }
}

/// Axis-aligned rectangle with half-open extents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn at(origin: Point, size: Size) -> Self {
        Self::new(origin.x, origin.y, size.width, size.height)
    }

    pub fn right(&self) -> i32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.height
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x < self.right() && p.y >= self.y && p.y < self.bottom()
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        !self.is_empty()
            && !other.is_empty()
            && self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }
}

/// The area challenges live in; the top `header` rows belong to the status bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Playfield {
    pub width: i32,
    pub height: i32,
    pub header: i32,
}

impl Playfield {
    pub const fn new(width: i32, height: i32, header: i32) -> Self {
        Self {
            width,
            height,
            header,
        }
    }

    /// Region below the header
    pub fn arena(&self) -> Rect {
        Rect::new(0, self.header, self.width, (self.height - self.header).max(0))
    }

    /// Inclusive ranges of valid top-left corners for a target of `size`.
    /// Empty ranges collapse to their minimum.
    fn spawn_bounds(&self, size: Size) -> (i32, i32, i32, i32) {
        let arena = self.arena();
        let min_x = arena.x + SPAWN_MARGIN;
        let min_y = arena.y + SPAWN_MARGIN;
        let max_x = (arena.right() - size.width - SPAWN_MARGIN).max(min_x);
        let max_y = (arena.bottom() - size.height - SPAWN_MARGIN).max(min_y);
        (min_x, max_x, min_y, max_y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum ZoneSide {
    Left,
    Right,
    Top,
    Bottom,
}

impl ZoneSide {
    pub fn is_vertical(self) -> bool {
        matches!(self, ZoneSide::Left | ZoneSide::Right)
    }

    /// The half of `arena` this side covers
    pub fn rect(self, arena: Rect) -> Rect {
        let half_w = arena.width / 2;
        let half_h = arena.height / 2;
        match self {
            ZoneSide::Left => Rect::new(arena.x, arena.y, half_w, arena.height),
            ZoneSide::Right => Rect::new(arena.x + half_w, arena.y, arena.width - half_w, arena.height),
            ZoneSide::Top => Rect::new(arena.x, arena.y, arena.width, half_h),
            ZoneSide::Bottom => Rect::new(arena.x, arena.y + half_h, arena.width, arena.height - half_h),
        }
    }
}

fn vertical_side<R: Rng + ?Sized>(rng: &mut R) -> ZoneSide {
    if rng.gen_bool(0.5) {
        ZoneSide::Left
    } else {
        ZoneSide::Right
    }
}

fn horizontal_side<R: Rng + ?Sized>(rng: &mut R) -> ZoneSide {
    if rng.gen_bool(0.5) {
        ZoneSide::Top
    } else {
        ZoneSide::Bottom
    }
}

/// Pick the hazard halves for a dodge challenge.
///
/// From [`DOUBLE_ZONE_SCORE`] on, a 2-in-3 draw activates one vertical and one
/// horizontal half together. Otherwise a three-way selector yields a vertical
/// half, a horizontal half, or nothing. With `force_one` an empty draw becomes a
/// vertical half.
pub fn hazard_sides<R: Rng + ?Sized>(score: u32, force_one: bool, rng: &mut R) -> Vec<ZoneSide> {
    let mut sides = Vec::with_capacity(2);

    if score >= DOUBLE_ZONE_SCORE && rng.gen_ratio(2, 3) {
        sides.push(vertical_side(rng));
        sides.push(horizontal_side(rng));
        return sides;
    }

    match rng.gen_range(0..3) {
        0 => sides.push(vertical_side(rng)),
        1 => sides.push(horizontal_side(rng)),
        _ => {}
    }

    if sides.is_empty() && force_one {
        sides.push(vertical_side(rng));
    }
    sides
}

pub fn hazard_zones<R: Rng + ?Sized>(
    playfield: &Playfield,
    score: u32,
    force_one: bool,
    rng: &mut R,
) -> Vec<Rect> {
    let arena = playfield.arena();
    hazard_sides(score, force_one, rng)
        .into_iter()
        .map(|side| side.rect(arena))
        .collect()
}

/// Uniformly placed target anywhere in the arena, ignoring hazards
pub fn place_target<R: Rng + ?Sized>(playfield: &Playfield, size: Size, rng: &mut R) -> Rect {
    let (min_x, max_x, min_y, max_y) = playfield.spawn_bounds(size);
    let origin = Point::new(rng.gen_range(min_x..=max_x), rng.gen_range(min_y..=max_y));
    Rect::at(origin, size)
}

fn is_clear(candidate: &Rect, hazards: &[Rect]) -> bool {
    !hazards.iter().any(|h| h.intersects(candidate))
}

fn random_safe_spawn<R: Rng + ?Sized>(
    playfield: &Playfield,
    size: Size,
    hazards: &[Rect],
    rng: &mut R,
) -> Result<Rect, SessionError> {
    for _ in 0..SAFE_SPAWN_ATTEMPTS {
        let candidate = place_target(playfield, size, rng);
        if is_clear(&candidate, hazards) {
            return Ok(candidate);
        }
    }
    Err(SessionError::GeometryExhausted {
        attempts: SAFE_SPAWN_ATTEMPTS,
    })
}

/// Top-left-most hazard-free position in row-major order, or the first spawn
/// position when nothing is free.
pub(crate) fn fallback_spawn(playfield: &Playfield, size: Size, hazards: &[Rect]) -> Rect {
    let (min_x, max_x, min_y, max_y) = playfield.spawn_bounds(size);
    for y in min_y..=max_y {
        for x in min_x..=max_x {
            let candidate = Rect::at(Point::new(x, y), size);
            if is_clear(&candidate, hazards) {
                return candidate;
            }
        }
    }
    Rect::at(Point::new(min_x, min_y), size)
}

/// Spawn position for a target that must not touch any hazard.
///
/// Always terminates: after [`SAFE_SPAWN_ATTEMPTS`] random misses the
/// deterministic scan of [`fallback_spawn`] takes over.
pub fn find_safe_spawn<R: Rng + ?Sized>(
    playfield: &Playfield,
    size: Size,
    hazards: &[Rect],
    rng: &mut R,
) -> Rect {
    match random_safe_spawn(playfield, size, hazards, rng) {
        Ok(rect) => rect,
        Err(err) => {
            log::debug!("{err}, scanning for the top-left-most free spot");
            fallback_spawn(playfield, size, hazards)
        }
    }
}
