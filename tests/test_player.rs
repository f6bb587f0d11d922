use std::cell::RefCell;
use std::rc::Rc;

use approx::assert_abs_diff_eq;
use nalgebra::Vector3;

use liftoff::config::PlayerConfig;
use liftoff::player::*;
use liftoff::state_machine::{GamePhase, StateMachine};

fn make_player(health: i32) -> PlayerAgent {
    PlayerAgent::new(&PlayerConfig {
        health,
        start_position: Vector3::new(0.0, 0.0, 2.0),
        follow_speed: 5.0,
        touch_offset_y: 1.0,
    })
}

/// A player already told about `Ignition`.
fn ignited_player(health: i32) -> PlayerAgent {
    let player = make_player(health);
    let mut handler = player.phase_handler();
    handler(GamePhase::Ignition);
    player
}

// ── Damage and death ──────────────────────────────────────────────────────────

#[test]
fn new_player_is_alive_with_no_points() {
    let p = make_player(3);
    assert!(p.is_alive());
    assert_eq!(p.state().health, 3);
    assert_eq!(p.state().points, 0);
    assert!(!p.restart_offered());
}

#[test]
fn damage_below_health_keeps_player_alive() {
    let mut machine = StateMachine::default();
    machine.change_state(GamePhase::Launch);
    let mut p = make_player(3);

    p.apply_damage(2, &mut machine);

    assert!(p.is_alive());
    assert_eq!(p.state().health, 1);
    assert_eq!(machine.current(), GamePhase::Launch);
}

#[test]
fn lethal_damage_reports_death_once() {
    let mut machine = StateMachine::default();
    let deaths = Rc::new(RefCell::new(0));
    let sink = Rc::clone(&deaths);
    machine.subscribe(move |phase| {
        if phase == GamePhase::PlayerDied {
            *sink.borrow_mut() += 1;
        }
    });
    let mut p = make_player(1);

    p.apply_damage(1, &mut machine);
    p.apply_damage(5, &mut machine);

    assert!(!p.is_alive());
    assert!(p.restart_offered());
    assert_eq!(machine.current(), GamePhase::PlayerDied);
    assert_eq!(*deaths.borrow(), 1);
    assert_eq!(p.state().health, 0);
}

#[test]
fn death_stops_engine_and_input() {
    let mut machine = StateMachine::default();
    let mut p = ignited_player(1);
    machine.subscribe(p.phase_handler());
    assert!(p.engine_running());

    p.apply_damage(1, &mut machine);

    assert!(!p.engine_running());
    assert!(!p.input_allowed());
}

// ── Points ────────────────────────────────────────────────────────────────────

#[test]
fn points_accumulate_and_saturate() {
    let mut p = make_player(1);
    p.add_points(1);
    p.add_points(4);
    assert_eq!(p.state().points, 5);

    p.add_points(u32::MAX);
    assert_eq!(p.state().points, u32::MAX);
}

// ── Phase flags ───────────────────────────────────────────────────────────────

#[test]
fn input_follows_phase_notifications() {
    let p = make_player(1);
    let mut handler = p.phase_handler();
    assert!(!p.input_allowed());

    handler(GamePhase::Ignition);
    assert!(p.input_allowed());
    assert!(p.engine_running());

    handler(GamePhase::Pause);
    assert!(!p.input_allowed());

    handler(GamePhase::Ignition);
    handler(GamePhase::PlayerDied);
    assert!(!p.input_allowed());
}

// ── Following input ───────────────────────────────────────────────────────────

#[test]
fn follow_is_ignored_before_ignition() {
    let mut p = make_player(1);
    p.follow_target(Vector3::new(10.0, 10.0, 0.0), true, 0.1);
    assert_eq!(p.position(), Vector3::new(0.0, 0.0, 2.0));
}

#[test]
fn follow_requires_confirmed_input() {
    let mut p = ignited_player(1);
    p.follow_target(Vector3::new(10.0, 10.0, 0.0), false, 0.1);
    assert_eq!(p.position(), Vector3::new(0.0, 0.0, 2.0));
}

#[test]
fn follow_eases_toward_target_above_touch() {
    let mut p = ignited_player(1);

    // t = 5.0 * 0.1 = 0.5 of the way to (10, 11).
    p.follow_target(Vector3::new(10.0, 10.0, -4.0), true, 0.1);

    let pos = p.position();
    assert_abs_diff_eq!(pos.x, 5.0, epsilon = 1e-5);
    assert_abs_diff_eq!(pos.y, 5.5, epsilon = 1e-5);
    assert_abs_diff_eq!(pos.z, 2.0);
}

#[test]
fn follow_never_overshoots_on_long_frames() {
    let mut p = ignited_player(1);
    p.follow_target(Vector3::new(4.0, -2.0, 0.0), true, 10.0);
    let pos = p.position();
    assert_abs_diff_eq!(pos.x, 4.0, epsilon = 1e-5);
    assert_abs_diff_eq!(pos.y, -1.0, epsilon = 1e-5);
}

#[test]
fn later_phases_restore_input_only_after_ignition() {
    let p = make_player(1);
    let mut handler = p.phase_handler();

    handler(GamePhase::Launch);
    assert!(!p.input_allowed());

    handler(GamePhase::Ignition);
    handler(GamePhase::Launch);
    handler(GamePhase::Pause);
    assert!(!p.input_allowed());

    for phase in [GamePhase::Launch, GamePhase::AtmosphereHigh, GamePhase::Space, GamePhase::Planet7] {
        handler(GamePhase::Pause);
        handler(phase);
        assert!(p.input_allowed(), "{phase}");
    }
}

#[test]
fn hover_offset_is_exposed_for_aiming() {
    assert_eq!(make_player(1).touch_offset_y(), 1.0);
}
