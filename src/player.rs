/// The player agent: health, points, position and input permission.
///
/// Lifecycle behaviours read its `PlayerState`; only this agent writes it.

use std::cell::Cell;
use std::rc::Rc;

use nalgebra::Vector3;

use crate::config::PlayerConfig;
use crate::entities::PlayerState;
use crate::state_machine::{GamePhase, StateMachine};

/// Flags flipped by phase notifications.
#[derive(Debug, Default)]
struct PhaseFlags {
    /// Set by the first `Ignition`; input may come back after a pause only
    /// once this is set.
    ignited: Cell<bool>,
    input_allowed: Cell<bool>,
    engine_running: Cell<bool>,
}

#[derive(Debug)]
pub struct PlayerAgent {
    state: PlayerState,
    follow_speed: f32,
    touch_offset_y: f32,
    flags: Rc<PhaseFlags>,
    restart_offered: bool,
}

impl PlayerAgent {
    pub fn new(config: &PlayerConfig) -> Self {
        Self {
            state: PlayerState::new(config.health, config.start_position),
            follow_speed: config.follow_speed,
            touch_offset_y: config.touch_offset_y,
            flags: Rc::new(PhaseFlags::default()),
            restart_offered: false,
        }
    }

    pub fn state(&self) -> &PlayerState {
        &self.state
    }

    pub fn is_alive(&self) -> bool {
        self.state.alive
    }

    pub fn position(&self) -> Vector3<f32> {
        self.state.position
    }

    pub fn input_allowed(&self) -> bool {
        self.flags.input_allowed.get()
    }

    pub fn engine_running(&self) -> bool {
        self.flags.engine_running.get()
    }

    /// Set once the player has died; the host offers restart/quit.
    pub fn restart_offered(&self) -> bool {
        self.restart_offered
    }

    /// Hover distance above the input target.
    pub fn touch_offset_y(&self) -> f32 {
        self.touch_offset_y
    }

    /// Callback to register with the state machine.  `Ignition` turns input
    /// and the engine on; `Pause` and `PlayerDied` turn input off.  Any later
    /// flight phase, including one resumed from `Pause`, turns input back on.
    pub fn phase_handler(&self) -> impl FnMut(GamePhase) + 'static {
        let flags = Rc::clone(&self.flags);
        move |phase| match phase {
            GamePhase::Ignition => {
                flags.ignited.set(true);
                flags.input_allowed.set(true);
                flags.engine_running.set(true);
            }
            GamePhase::Pause | GamePhase::PlayerDied => {
                flags.input_allowed.set(false);
            }
            GamePhase::Countdown => {}
            _ => {
                if flags.ignited.get() {
                    flags.input_allowed.set(true);
                }
            }
        }
    }

    pub fn add_points(&mut self, amount: u32) {
        self.state.points = self.state.points.saturating_add(amount);
    }

    /// Subtract health; reaching zero kills the player and moves `machine` to
    /// `PlayerDied`.  Damage to a dead player is ignored.
    pub fn apply_damage(&mut self, amount: u32, machine: &mut StateMachine) {
        if !self.state.alive {
            return;
        }
        let amount = i32::try_from(amount).unwrap_or(i32::MAX);
        self.state.health = self.state.health.saturating_sub(amount);
        log::debug!("Player took {} damage, health {}", amount, self.state.health);

        if self.state.health <= 0 {
            self.die(machine);
        }
    }

    fn die(&mut self, machine: &mut StateMachine) {
        self.state.alive = false;
        self.flags.engine_running.set(false);
        self.restart_offered = true;
        log::info!(
            "Player died at ({:.2}, {:.2}) with {} points",
            self.state.position.x,
            self.state.position.y,
            self.state.points
        );
        machine.change_state(GamePhase::PlayerDied);
    }

    /// Ease toward `target` (plus the hover offset) when input is allowed and
    /// the input layer confirmed a touch this frame.  `z` is left alone.
    pub fn follow_target(&mut self, target: Vector3<f32>, confirmed: bool, delta_time: f32) {
        if !confirmed || !self.input_allowed() || !self.state.alive {
            return;
        }
        let goal = Vector3::new(target.x, target.y + self.touch_offset_y, self.state.position.z);
        let t = (self.follow_speed * delta_time).clamp(0.0, 1.0);
        self.state.position = self.state.position.lerp(&goal, t);
    }
}
