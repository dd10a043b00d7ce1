use std::time::Duration;

use flinch::clock::{ManualClock, TICK_RATE_MS};
use flinch::engine::{
    EngineSettings, GameOverSummary, Notification, Phase, PointerButton, SessionEngine,
};
use flinch::geometry::Point;
use flinch::scheduler::{ChallengeKind, ScriptedScheduler};
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Session-level scenarios driven through the public engine API with a
/// hand-advanced clock and a scripted challenge order.
type Engine = SessionEngine<ManualClock, ScriptedScheduler, StdRng>;

fn session(script: &[ChallengeKind]) -> (Engine, ManualClock) {
    seeded_session(script, 2024)
}

fn seeded_session(script: &[ChallengeKind], seed: u64) -> (Engine, ManualClock) {
    let clock = ManualClock::new();
    let mut engine = SessionEngine::new(
        clock.clone(),
        ScriptedScheduler::new(script.iter().copied()),
        StdRng::seed_from_u64(seed),
        EngineSettings::default(),
    );
    engine.start();
    (engine, clock)
}

fn on_target(engine: &Engine) -> Point {
    let t = engine
        .challenge()
        .and_then(|c| c.target)
        .expect("active challenge has a target");
    Point::new(t.x + t.width / 2, t.y + t.height / 2)
}

fn outside_hazards(engine: &Engine) -> Point {
    let challenge = engine.challenge().expect("active challenge");
    let field = engine.settings().playfield;
    (field.header..field.height)
        .flat_map(|y| (0..field.width).map(move |x| Point::new(x, y)))
        .find(|p| !challenge.in_hazard(*p))
        .expect("single hazard half leaves free space")
}

fn tick(engine: &mut Engine, clock: &ManualClock, ticks: u64, pointer: Point) {
    for _ in 0..ticks {
        clock.advance_ms(TICK_RATE_MS);
        let _ = engine.tick(Duration::from_millis(TICK_RATE_MS), pointer);
    }
}

fn labels(engine: &Engine) -> Vec<String> {
    engine
        .result_log()
        .entries()
        .iter()
        .map(|e| e.label.clone())
        .collect()
}

#[test]
fn double_click_within_window_succeeds() {
    let (mut engine, clock) = session(&[ChallengeKind::DoubleClick, ChallengeKind::NoClick]);
    let p = on_target(&engine);

    clock.advance_ms(200);
    engine.pointer_down(p, PointerButton::Primary).unwrap();
    clock.advance_ms(599);
    engine.pointer_down(p, PointerButton::Primary).unwrap();

    assert_eq!(labels(&engine), vec!["Doble Click"]);
    assert_eq!(engine.score(), 1);
    assert_eq!(
        engine.result_log().entries()[0].reaction_time,
        Duration::from_millis(799)
    );
}

#[test]
fn double_click_after_window_times_out_and_extra_click_is_not_counted() {
    let (mut engine, clock) = session(&[ChallengeKind::DoubleClick, ChallengeKind::HoldClick]);
    let p = on_target(&engine);

    engine.pointer_down(p, PointerButton::Primary).unwrap();
    clock.advance_ms(601);
    // The debounce expires first and swallows the late press.
    assert!(engine.pointer_down(p, PointerButton::Primary).is_err());

    assert_eq!(labels(&engine), vec!["FAIL: double-click timeout"]);
    assert_eq!(engine.lives(), 2);
    assert_eq!(engine.challenge().unwrap().kind, ChallengeKind::HoldClick);
}

#[test]
fn late_press_never_lands_on_the_replacement_challenge() {
    // Across seeds the stale press falls inside the new hazard or on the new
    // forbidden target often enough to catch it being counted twice.
    for next in [ChallengeKind::DodgeZone, ChallengeKind::NoClick] {
        for seed in 0..40 {
            let (mut engine, clock) = seeded_session(&[ChallengeKind::DoubleClick, next], seed);
            let p = on_target(&engine);

            engine.pointer_down(p, PointerButton::Primary).unwrap();
            clock.advance_ms(601);
            assert!(engine.pointer_down(p, PointerButton::Primary).is_err());

            assert_eq!(labels(&engine), vec!["FAIL: double-click timeout"], "seed {seed}");
            assert_eq!(engine.lives(), 2, "seed {seed}");
            assert_eq!(engine.challenge().unwrap().kind, next);
        }
    }
}

#[test]
fn late_release_is_spent_on_the_finished_hold() {
    let (mut engine, clock) = session(&[ChallengeKind::HoldClick, ChallengeKind::NoClick]);
    let p = on_target(&engine);

    engine.pointer_down(p, PointerButton::Primary).unwrap();
    clock.advance_ms(1200);
    assert!(engine.pointer_up(p, PointerButton::Primary).is_err());

    assert_eq!(labels(&engine), vec!["Hold Click (1s)"]);
    assert_eq!(engine.challenge().unwrap().kind, ChallengeKind::NoClick);
    // The next press is handled normally.
    let q = on_target(&engine);
    engine.pointer_down(q, PointerButton::Primary).unwrap();
    assert_eq!(
        labels(&engine),
        vec!["Hold Click (1s)", "FAIL: clicked forbidden target"]
    );
}

#[test]
fn double_click_window_is_half_open() {
    let (mut engine, clock) = session(&[ChallengeKind::DoubleClick, ChallengeKind::HoldClick]);
    let p = on_target(&engine);

    engine.pointer_down(p, PointerButton::Primary).unwrap();
    clock.advance_ms(600);
    let _ = engine.pointer_down(p, PointerButton::Primary);

    assert_eq!(labels(&engine), vec!["FAIL: double-click timeout"]);
}

#[test]
fn debounce_expires_on_tick_without_second_press() {
    let (mut engine, clock) = session(&[ChallengeKind::DoubleClick, ChallengeKind::NoClick]);
    let p = on_target(&engine);

    engine.pointer_down(p, PointerButton::Primary).unwrap();
    tick(&mut engine, &clock, 12, p);

    assert_eq!(labels(&engine), vec!["FAIL: double-click timeout"]);
}

#[test]
fn hold_released_at_999ms_fails() {
    let (mut engine, clock) = session(&[ChallengeKind::HoldClick, ChallengeKind::NoClick]);
    let p = on_target(&engine);

    engine.pointer_down(p, PointerButton::Primary).unwrap();
    clock.advance_ms(999);
    engine.pointer_up(p, PointerButton::Primary).unwrap();

    assert_eq!(labels(&engine), vec!["FAIL: released early"]);
    assert_eq!(engine.result_log().entries()[0].reaction_time, Duration::ZERO);
}

#[test]
fn hold_for_full_second_succeeds() {
    let (mut engine, clock) = session(&[ChallengeKind::HoldClick, ChallengeKind::NoClick]);
    let p = on_target(&engine);

    clock.advance_ms(300);
    engine.pointer_down(p, PointerButton::Primary).unwrap();
    tick(&mut engine, &clock, 20, p);

    assert_eq!(labels(&engine), vec!["Hold Click (1s)"]);
    assert_eq!(engine.score(), 1);
    assert_eq!(
        engine.result_log().entries()[0].reaction_time,
        Duration::from_millis(300)
    );
    // Releasing afterwards is a stray event.
    assert!(engine.pointer_up(p, PointerButton::Primary).is_err());
    assert_eq!(engine.result_log().len(), 1);
}

#[test]
fn hold_never_pressed_times_out() {
    let (mut engine, clock) = session(&[ChallengeKind::HoldClick, ChallengeKind::NoClick]);
    tick(&mut engine, &clock, 100, Point::default());
    assert_eq!(labels(&engine), vec!["FAIL: timed out"]);
}

#[test]
fn dodge_zone_evaded_outside_hazards() {
    let (mut engine, clock) = session(&[ChallengeKind::DodgeZone, ChallengeKind::NoClick]);
    let safe = outside_hazards(&engine);

    tick(&mut engine, &clock, 39, safe);
    assert!(engine.result_log().is_empty());
    tick(&mut engine, &clock, 1, safe);

    assert_eq!(labels(&engine), vec!["Dodge Zone (evaded)"]);
    assert_eq!(
        engine.result_log().entries()[0].reaction_time,
        Duration::from_millis(2000)
    );
}

#[test]
fn dodge_zone_click_inside_hazard_fails_immediately() {
    let (mut engine, clock) = session(&[ChallengeKind::DodgeZone, ChallengeKind::NoClick]);
    let hazard = engine.challenge().unwrap().hazards[0];
    let inside = Point::new(hazard.x + 1, hazard.y + 1);

    tick(&mut engine, &clock, 5, inside);
    engine.pointer_down(inside, PointerButton::Primary).unwrap();

    assert_eq!(labels(&engine), vec!["FAIL: clicked inside hazard"]);
    assert_eq!(engine.lives(), 2);
}

#[test]
fn dodge_zone_caught_when_inside_at_budget() {
    let (mut engine, clock) = session(&[ChallengeKind::DodgeZone, ChallengeKind::NoClick]);
    let hazard = engine.challenge().unwrap().hazards[0];
    let inside = Point::new(hazard.x + 1, hazard.y + 1);

    tick(&mut engine, &clock, 79, inside);
    assert!(engine.result_log().is_empty());
    tick(&mut engine, &clock, 1, inside);

    assert_eq!(labels(&engine), vec!["FAIL: caught in zone"]);
}

#[test]
fn dodge_click_on_safe_target_succeeds() {
    let (mut engine, clock) = session(&[ChallengeKind::DodgeClick, ChallengeKind::NoClick]);
    let p = on_target(&engine);
    assert!(!engine.challenge().unwrap().in_hazard(p));

    tick(&mut engine, &clock, 4, p);
    engine.pointer_down(p, PointerButton::Primary).unwrap();

    assert_eq!(labels(&engine), vec!["Dodge Click (safe click)"]);
}

#[test]
fn five_no_click_successes_unlock_every_kind() {
    let (mut engine, clock) = session(&[ChallengeKind::NoClick; 5]);

    tick(&mut engine, &clock, 500, Point::new(-1, -1));

    assert_eq!(engine.score(), 5);
    assert_eq!(engine.lives(), 3);
    assert_eq!(labels(&engine), vec!["No Click"; 5]);
    assert_eq!(ChallengeKind::eligible(engine.score()).len(), 6);
}

#[test]
fn no_click_pressed_on_target_fails() {
    let (mut engine, _clock) = session(&[ChallengeKind::NoClick, ChallengeKind::SingleClick]);
    let p = on_target(&engine);
    engine.pointer_down(p, PointerButton::Primary).unwrap();
    assert_eq!(labels(&engine), vec!["FAIL: clicked forbidden target"]);
}

#[test]
fn third_failure_ends_the_run_once() {
    use ChallengeKind::*;
    let (mut engine, _clock) = session(&[
        SingleClick,
        NoClick,
        SingleClick,
        SingleClick,
        SingleClick,
        NoClick,
        NoClick,
    ]);

    for _ in 0..7 {
        let p = on_target(&engine);
        engine.pointer_down(p, PointerButton::Primary).unwrap();
    }

    let game_overs: Vec<GameOverSummary> = engine
        .drain_notifications()
        .into_iter()
        .filter_map(|n| match n {
            Notification::GameOver(summary) => Some(summary),
            _ => None,
        })
        .collect();

    assert_eq!(
        game_overs,
        vec![GameOverSummary {
            final_score: 250,
            fail_count: 3
        }]
    );
    assert!(!engine.is_running());
    assert_eq!((engine.score(), engine.lives()), (0, 3));
    assert_eq!(engine.result_log().len(), 7);

    let p = on_target(&engine);
    assert!(engine.pointer_down(p, PointerButton::Primary).is_err());

    engine.start();
    assert_eq!(engine.phase(), Phase::Running);
    assert!(engine.result_log().is_empty());
    assert_eq!((engine.score(), engine.lives()), (0, 3));
}
