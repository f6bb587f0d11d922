/// The owned context for one play session.
///
/// `Session` builds every component, wires their phase handlers into the
/// state machine, and runs them in a fixed order once per frame.  Randomness
/// is injected into each call so tests can use a seeded RNG.

use nalgebra::Vector3;
use rand::Rng;

use crate::config::GameConfig;
use crate::entities::{EntityKey, EntityRole, PlayerState, World};
use crate::error::ConfigError;
use crate::flying_objects::FlyingObjectSpawner;
use crate::launch_pad::{KinematicBody, LaunchPad};
use crate::level_generator::LevelGenerator;
use crate::lifecycle::update_entities;
use crate::player::PlayerAgent;
use crate::state_machine::{GamePhase, StateMachine};

/// What the input layer hands over each frame.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FrameInput {
    /// World-space point the player should follow.
    pub target: Option<Vector3<f32>>,
    /// The input layer saw a confirmed touch/press this frame.
    pub confirmed: bool,
}

impl FrameInput {
    /// Target `reach` units from the player along `steer`, lowered by the
    /// player's hover offset so it ends up moving along `steer` itself.  A
    /// zero `steer` gives no input.
    pub fn steering(player: &PlayerAgent, steer: Vector3<f32>, reach: f32) -> Self {
        if steer == Vector3::zeros() {
            return Self::default();
        }
        let hover = Vector3::new(0.0, player.touch_offset_y(), 0.0);
        Self {
            target: Some(player.position() + steer * reach - hover),
            confirmed: true,
        }
    }
}

/// Contact outcomes from one frame.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Contacts {
    pub collected: u32,
    pub hits: u32,
}

pub struct Session {
    machine: StateMachine,
    world: World,
    level: LevelGenerator,
    flying: Vec<FlyingObjectSpawner>,
    player: PlayerAgent,
    launch_pad: LaunchPad<KinematicBody>,
    contact_radius: f32,
    frame: u64,
}

impl Session {
    /// Validate `config`, build every component and subscribe them in order:
    /// player, flying spawners, launch pad.
    pub fn new(config: &GameConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let mut machine = StateMachine::new(config.countdown_seconds);
        let level = LevelGenerator::new(&config.level)?;
        let flying = config
            .flying
            .iter()
            .map(FlyingObjectSpawner::new)
            .collect::<Result<Vec<_>, _>>()?;
        let player = PlayerAgent::new(&config.player);
        let launch_pad = LaunchPad::from_config(&config.launch_pad);

        machine.subscribe(player.phase_handler());
        for spawner in &flying {
            machine.subscribe(spawner.phase_handler());
        }
        machine.subscribe(launch_pad.phase_handler());

        log::info!(
            "Session ready: {} flying spawner(s), {} subscriber(s)",
            flying.len(),
            machine.subscriber_count()
        );

        Ok(Self {
            machine,
            world: World::with_key(),
            level,
            flying,
            player,
            launch_pad,
            contact_radius: config.contact_radius,
            frame: 0,
        })
    }

    // ── Accessors ────────────────────────────────────────────────────────────

    pub fn machine(&self) -> &StateMachine {
        &self.machine
    }

    /// For external subscribers and phase triggers.
    pub fn machine_mut(&mut self) -> &mut StateMachine {
        &mut self.machine
    }

    pub fn phase(&self) -> GamePhase {
        self.machine.current()
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    /// For hosts that place their own entities.
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn level(&self) -> &LevelGenerator {
        &self.level
    }

    pub fn flying(&self) -> &[FlyingObjectSpawner] {
        &self.flying
    }

    pub fn player(&self) -> &PlayerAgent {
        &self.player
    }

    pub fn player_state(&self) -> &PlayerState {
        self.player.state()
    }

    pub fn launch_pad(&self) -> &LaunchPad<KinematicBody> {
        &self.launch_pad
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    // ── Entry points ─────────────────────────────────────────────────────────

    /// Lay out the opening scenery and enter `Countdown`.
    pub fn start<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<(), ConfigError> {
        self.level.prefill(&mut self.world, rng)?;
        self.level.update(&mut self.world, rng)?;
        self.machine.start();
        Ok(())
    }

    pub fn damage_player(&mut self, amount: u32) {
        self.player.apply_damage(amount, &mut self.machine);
    }

    pub fn award_points(&mut self, amount: u32) {
        self.player.add_points(amount);
    }

    /// Enter `Pause` from any active phase, or leave it again.
    pub fn toggle_pause(&mut self) {
        if self.machine.is_paused() {
            self.machine.resume();
        } else {
            self.machine.change_state(GamePhase::Pause);
        }
    }

    // ── Frame ────────────────────────────────────────────────────────────────

    /// Advance one frame.  Nothing moves while paused.
    pub fn tick<R: Rng + ?Sized>(
        &mut self,
        delta_time: f32,
        input: &FrameInput,
        rng: &mut R,
    ) -> Result<Contacts, ConfigError> {
        if self.machine.is_paused() {
            return Ok(Contacts::default());
        }
        self.frame += 1;

        // ── 1. Phase timer ───────────────────────────────────────────────────
        self.machine.tick(delta_time);

        // ── 2. Player follows input ─────────────────────────────────────────
        if let Some(target) = input.target {
            self.player.follow_target(target, input.confirmed, delta_time);
        }

        // ── 3. Spawners ──────────────────────────────────────────────────────
        self.level.update(&mut self.world, rng)?;
        for spawner in &mut self.flying {
            spawner.update(delta_time, &mut self.world, rng)?;
        }

        // ── 4. Entity behaviours ─────────────────────────────────────────────
        update_entities(&mut self.world, self.player.state(), delta_time);
        self.launch_pad.fixed_update(delta_time);

        // ── 5. Contacts ──────────────────────────────────────────────────────
        Ok(self.resolve_contacts())
    }

    /// Apply contact outcomes between the live player and every entity within
    /// `contact_radius` in the xy plane.  Touched hazards and collectibles are
    /// removed; scenery is ignored.
    pub fn resolve_contacts(&mut self) -> Contacts {
        let mut contacts = Contacts::default();
        if !self.player.is_alive() {
            return contacts;
        }

        let player_at = self.player.position();
        let touching: Vec<EntityKey> = self
            .world
            .iter()
            .filter(|(_, e)| e.role != EntityRole::Scenery)
            .filter(|(_, e)| {
                let d = e.position - player_at;
                (d.x * d.x + d.y * d.y).sqrt() <= self.contact_radius
            })
            .map(|(key, _)| key)
            .collect();

        for key in touching {
            if !self.player.is_alive() {
                break;
            }
            let Some(entity) = self.world.remove(key) else {
                continue;
            };
            match entity.role {
                EntityRole::Collectible { points } => {
                    self.player.add_points(points);
                    contacts.collected += 1;
                }
                EntityRole::Hazard { damage } => {
                    self.player.apply_damage(damage, &mut self.machine);
                    contacts.hits += 1;
                }
                EntityRole::Scenery => {}
            }
        }
        contacts
    }
}
