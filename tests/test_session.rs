use approx::assert_abs_diff_eq;
use nalgebra::Vector3;
use rand::rngs::StdRng;
use rand::SeedableRng;

use liftoff::config::GameConfig;
use liftoff::entities::*;
use liftoff::error::ConfigError;
use liftoff::launch_pad::*;
use liftoff::session::*;
use liftoff::state_machine::GamePhase;

fn seeded_rng() -> StdRng {
    StdRng::seed_from_u64(42)
}

/// Default tuning, but with the flying spawners aimed well away from the
/// player so contacts only happen when a test sets them up.
fn quiet_config() -> GameConfig {
    let mut config = GameConfig::default();
    for spawner in &mut config.flying {
        spawner.anchor = Vector3::new(500.0, 500.0, 0.0);
    }
    config.level.debris.anchor = Vector3::new(-500.0, 500.0, 0.0);
    config
}

fn started_session() -> (Session, StdRng) {
    let mut rng = seeded_rng();
    let mut session = Session::new(&quiet_config()).unwrap();
    session.start(&mut rng).unwrap();
    (session, rng)
}

fn insert(session: &mut Session, entity: SpawnedEntity) -> EntityKey {
    session.world_mut().insert(entity)
}

fn idle() -> FrameInput {
    FrameInput::default()
}

fn pickup(role: EntityRole, at: Vector3<f32>) -> SpawnedEntity {
    SpawnedEntity::from_template(&Template::new("thing", '?', role), at)
}

// ── Construction ──────────────────────────────────────────────────────────────

#[test]
fn default_config_builds_a_session() {
    let session = Session::new(&GameConfig::default()).unwrap();
    assert_eq!(session.phase(), GamePhase::Countdown);
    assert_eq!(session.flying().len(), 2);
    assert_eq!(session.machine().subscriber_count(), 4);
}

#[test]
fn empty_flying_pool_aborts_construction() {
    let mut config = GameConfig::default();
    config.flying[1].templates.clear();
    assert!(matches!(
        Session::new(&config),
        Err(ConfigError::EmptyTemplatePool { .. })
    ));
}

#[test]
fn start_lays_out_scenery_and_shows_countdown() {
    let (session, _) = started_session();
    assert!(!session.world().is_empty());
    assert_eq!(session.machine().countdown_display(), Some(3));
}

// ── Countdown → Ignition ──────────────────────────────────────────────────────

#[test]
fn ignition_flags_flip_together_after_countdown() {
    let (mut session, mut rng) = started_session();

    for _ in 0..2 {
        session.tick(1.0, &idle(), &mut rng).unwrap();
        assert_eq!(session.phase(), GamePhase::Countdown);
        assert!(!session.player().input_allowed());
        assert!(session.flying().iter().all(|s| !s.is_enabled()));
    }

    session.tick(1.0, &idle(), &mut rng).unwrap();

    assert_eq!(session.phase(), GamePhase::Ignition);
    assert!(session.player().input_allowed());
    assert!(session.player().engine_running());
    assert!(session.flying().iter().all(|s| s.is_enabled()));
    assert!(session.launch_pad().is_launched());
}

#[test]
fn launch_pad_falls_away_after_ignition() {
    let (mut session, mut rng) = started_session();
    let start = session.launch_pad().body().position;

    for _ in 0..3 {
        session.tick(1.0, &idle(), &mut rng).unwrap();
    }
    session.tick(0.5, &idle(), &mut rng).unwrap();
    assert!(session.launch_pad().body().position.y < start.y);

    for _ in 0..10 {
        session.tick(0.5, &idle(), &mut rng).unwrap();
    }
    assert!(!session.launch_pad().is_present());
}

// ── Pause ─────────────────────────────────────────────────────────────────────

#[test]
fn pause_freezes_everything_until_resumed() {
    let (mut session, mut rng) = started_session();
    for _ in 0..4 {
        session.tick(1.0, &idle(), &mut rng).unwrap();
    }
    let frame = session.frame();
    let positions: Vec<Vector3<f32>> = session.world().values().map(|e| e.position).collect();

    session.toggle_pause();
    for _ in 0..5 {
        session.tick(1.0, &idle(), &mut rng).unwrap();
    }

    assert_eq!(session.phase(), GamePhase::Pause);
    assert_eq!(session.frame(), frame);
    let frozen: Vec<Vector3<f32>> = session.world().values().map(|e| e.position).collect();
    assert_eq!(positions, frozen);
    assert!(!session.player().input_allowed());

    session.toggle_pause();
    assert_eq!(session.phase(), GamePhase::Ignition);
}

#[test]
fn resuming_a_later_phase_gives_input_back() {
    let (mut session, mut rng) = started_session();
    for _ in 0..3 {
        session.tick(1.0, &idle(), &mut rng).unwrap();
    }
    session.machine_mut().change_state(GamePhase::Launch);
    assert!(session.player().input_allowed());

    session.toggle_pause();
    assert!(!session.player().input_allowed());
    session.toggle_pause();

    assert_eq!(session.phase(), GamePhase::Launch);
    assert!(session.player().input_allowed());

    let start = session.player().position();
    let input = FrameInput::steering(session.player(), Vector3::new(1.0, 0.0, 0.0), 3.0);
    session.tick(0.1, &input, &mut rng).unwrap();
    assert!(session.player().position().x > start.x);
}

#[test]
fn pausing_during_countdown_keeps_the_remaining_time() {
    let (mut session, mut rng) = started_session();
    session.tick(2.5, &idle(), &mut rng).unwrap();

    session.toggle_pause();
    session.tick(10.0, &idle(), &mut rng).unwrap();
    session.toggle_pause();
    assert_eq!(session.phase(), GamePhase::Countdown);

    session.tick(0.5, &idle(), &mut rng).unwrap();
    assert_eq!(session.phase(), GamePhase::Ignition);
    assert!(session.player().input_allowed());
}

// ── Input ─────────────────────────────────────────────────────────────────────

#[test]
fn steering_accounts_for_configured_hover_offset() {
    let mut config = quiet_config();
    config.player.touch_offset_y = 2.5;
    let mut rng = seeded_rng();
    let mut session = Session::new(&config).unwrap();
    session.start(&mut rng).unwrap();
    for _ in 0..3 {
        session.tick(1.0, &idle(), &mut rng).unwrap();
    }
    let start = session.player().position();

    let input = FrameInput::steering(session.player(), Vector3::new(1.0, 0.0, 0.0), 3.0);
    session.tick(0.1, &input, &mut rng).unwrap();

    let pos = session.player().position();
    assert_abs_diff_eq!(pos.x, start.x + 1.5, epsilon = 1e-4);
    assert_abs_diff_eq!(pos.y, start.y, epsilon = 1e-4);
}

#[test]
fn no_steering_means_no_input() {
    let (session, _) = started_session();
    assert_eq!(FrameInput::steering(session.player(), Vector3::zeros(), 3.0), FrameInput::default());
}

#[test]
fn player_follows_input_only_after_ignition() {
    let (mut session, mut rng) = started_session();
    let start = session.player().position();
    let input = FrameInput {
        target: Some(start + Vector3::new(5.0, 0.0, 0.0)),
        confirmed: true,
    };

    session.tick(0.1, &input, &mut rng).unwrap();
    assert_eq!(session.player().position(), start);

    for _ in 0..3 {
        session.tick(1.0, &idle(), &mut rng).unwrap();
    }
    session.tick(0.1, &input, &mut rng).unwrap();
    assert!(session.player().position().x > start.x);
}

// ── Contacts ──────────────────────────────────────────────────────────────────

#[test]
fn collectible_contact_awards_points_and_removes_it() {
    let (mut session, _) = started_session();
    let at = session.player().position();
    let star = insert(&mut session, pickup(EntityRole::Collectible { points: 3 }, at));

    let contacts = session.resolve_contacts();

    assert_eq!(contacts, Contacts { collected: 1, hits: 0 });
    assert_eq!(session.player_state().points, 3);
    assert!(!session.world().contains_key(star));
}

#[test]
fn hazard_contact_kills_one_health_player() {
    let (mut session, _) = started_session();
    let at = session.player().position() + Vector3::new(0.3, 0.3, 5.0);
    insert(&mut session, pickup(EntityRole::Hazard { damage: 1 }, at));

    let contacts = session.resolve_contacts();

    assert_eq!(contacts.hits, 1);
    assert!(!session.player().is_alive());
    assert_eq!(session.phase(), GamePhase::PlayerDied);
}

#[test]
fn scenery_and_distant_entities_are_not_contacts() {
    let (mut session, _) = started_session();
    let at = session.player().position();
    insert(&mut session, pickup(EntityRole::Scenery, at));
    let far = at + Vector3::new(3.0, 0.0, 0.0);
    insert(&mut session, pickup(EntityRole::Hazard { damage: 1 }, far));

    assert_eq!(session.resolve_contacts(), Contacts::default());
    assert!(session.player().is_alive());
}

#[test]
fn external_damage_entry_point_reports_death() {
    let (mut session, _) = started_session();
    session.damage_player(1);
    assert_eq!(session.phase(), GamePhase::PlayerDied);
    assert!(session.player().restart_offered());
}

#[test]
fn award_points_entry_point_adds_points() {
    let (mut session, _) = started_session();
    session.award_points(2);
    session.award_points(3);
    assert_eq!(session.player_state().points, 5);
}

// ── Configuration ─────────────────────────────────────────────────────────────

#[test]
fn partial_toml_overrides_defaults() {
    let config = GameConfig::from_toml_str(
        r#"
        countdown_seconds = 5.0

        [player]
        health = 3
        "#,
    )
    .unwrap();

    assert_eq!(config.countdown_seconds, 5.0);
    assert_eq!(config.player.health, 3);
    assert_eq!(config.level, GameConfig::default().level);
}

#[test]
fn default_config_survives_toml() {
    let text = GameConfig::default().to_toml_string().unwrap();
    let parsed = GameConfig::from_toml_str(&text).unwrap();
    assert_eq!(parsed, GameConfig::default());
}

#[test]
fn invalid_toml_values_are_rejected() {
    let err = GameConfig::from_toml_str("contact_radius = -1.0").unwrap_err();
    assert!(matches!(err, ConfigError::Negative { .. }));

    let err = GameConfig::from_toml_str("countdown_seconds = \"soon\"").unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)));
}

#[test]
fn player_must_start_with_health() {
    for health in [0, -2] {
        let mut config = GameConfig::default();
        config.player.health = health;
        match Session::new(&config) {
            Err(ConfigError::NotPositive { field, value }) => {
                assert_eq!(field, "player.health");
                assert_eq!(value, i64::from(health));
            }
            other => panic!("unexpected result: {:?}", other.err()),
        }
    }
}

#[test]
fn missing_config_file_is_an_io_error() {
    let err = GameConfig::load_from_file("/definitely/not/here.toml").unwrap_err();
    assert!(matches!(err, ConfigError::Io(_)));
}

// ── Launch pad ────────────────────────────────────────────────────────────────

#[test]
fn custom_physics_body_drives_launch_pad() {
    #[derive(Debug, Default)]
    struct Recorder {
        forces: Vec<Vector3<f32>>,
        y: f32,
    }
    impl PhysicsBody for Recorder {
        fn position(&self) -> Vector3<f32> {
            Vector3::new(0.0, self.y, 0.0)
        }
        fn speed(&self) -> f32 {
            0.0
        }
        fn add_force(&mut self, force: Vector3<f32>) {
            self.forces.push(force);
        }
        fn integrate(&mut self, delta_time: f32) {
            self.y -= delta_time;
        }
    }

    let config = GameConfig::default().launch_pad;
    let mut pad = LaunchPad::new(Recorder::default(), &config);
    pad.fixed_update(1.0);
    assert!(pad.body().forces.is_empty());

    let mut handler = pad.phase_handler();
    handler(GamePhase::Ignition);
    pad.fixed_update(1.0);
    assert_eq!(pad.body().forces, vec![Vector3::new(0.0, -config.acceleration, 0.0)]);
}
