/// Directional object spawner.
///
/// The spawn loop is a cooperative task expressed as a timer that the frame
/// tick winds down.  When it runs out the task "wakes": it spawns one object
/// and waits a random interval if enabled, otherwise it idles for
/// `IDLE_POLL_SECONDS` and looks again.

use std::cell::Cell;
use std::rc::Rc;

use nalgebra::Vector3;
use rand::Rng;

use crate::config::FlyingSpawnerConfig;
use crate::entities::{pick_template, EntityKey, SpawnedEntity, World};
use crate::error::ConfigError;
use crate::lifecycle::{DistanceGatedRemover, FigureEightMover, FlightMover, Motion, Rotator};
use crate::state_machine::GamePhase;

/// How long a disabled spawner sleeps between checks.
pub const IDLE_POLL_SECONDS: f32 = 0.1;

#[derive(Debug)]
pub struct FlyingObjectSpawner {
    config: FlyingSpawnerConfig,
    enabled: Rc<Cell<bool>>,
    /// Seconds until the task wakes again.
    wait: f32,
}

impl FlyingObjectSpawner {
    /// Starts disabled, with the task due to wake on the first update.
    pub fn new(config: &FlyingSpawnerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config: config.clone(),
            enabled: Rc::new(Cell::new(false)),
            wait: 0.0,
        })
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.get()
    }

    /// Seconds until the next wake.
    pub fn wait(&self) -> f32 {
        self.wait
    }

    /// Callback to register with the state machine.  It is the only thing
    /// that can flip `enabled`: entering `Ignition` turns the spawner on.
    pub fn phase_handler(&self) -> impl FnMut(GamePhase) + 'static {
        let enabled = Rc::clone(&self.enabled);
        let name = self.config.name.clone();
        move |phase| {
            if phase == GamePhase::Ignition {
                if !enabled.get() {
                    log::debug!("Flying spawner '{}' enabled", name);
                }
                enabled.set(true);
            }
        }
    }

    /// Advance the task by one frame.  Wakes at most once per call, so a long
    /// frame never produces a burst of spawns.
    pub fn update<R: Rng + ?Sized>(
        &mut self,
        delta_time: f32,
        world: &mut World,
        rng: &mut R,
    ) -> Result<Option<EntityKey>, ConfigError> {
        self.wait -= delta_time;
        if self.wait > 0.0 {
            return Ok(None);
        }

        if !self.enabled.get() {
            self.wait = IDLE_POLL_SECONDS;
            return Ok(None);
        }

        let key = self.spawn(world, rng)?;
        self.wait = rng.gen_range(self.config.interval_min..=self.config.interval_max);
        Ok(Some(key))
    }

    /// Spawn one object at the anchor plus a random offset.
    pub fn spawn<R: Rng + ?Sized>(&self, world: &mut World, rng: &mut R) -> Result<EntityKey, ConfigError> {
        let template = pick_template(&self.config.name, &self.config.templates, rng)?;

        let range = self.config.offset_range;
        let offset = Vector3::new(
            rng.gen_range(-range.x..=range.x),
            rng.gen_range(-range.y..=range.y),
            rng.gen_range(-range.z..=range.z),
        );
        let position = self.config.anchor + offset;

        let flight = FlightMover {
            direction: self.config.direction,
            speed: self.config.speed,
            downward_speed: self.config.downward_speed,
        };
        let mut entity = SpawnedEntity::from_template(template, position);
        entity.motion = Some(match self.config.figure_eight {
            Some(shape) => {
                let drift = flight.direction.vector(flight.downward_speed) * flight.speed;
                Motion::FigureEight(FigureEightMover::new(
                    position,
                    shape.speed,
                    shape.scale_x,
                    shape.scale_y,
                    drift,
                ))
            }
            None => Motion::Flight(flight),
        });
        entity.remover = Some(DistanceGatedRemover::euclidean(position, self.config.max_travel));
        if let Some(spin) = self.config.spin {
            entity.rotator = Some(Rotator::spin(spin, rng));
        }

        log::trace!(
            "'{}' spawned {} at ({:.2}, {:.2})",
            self.config.name,
            template.name,
            position.x,
            position.y
        );
        Ok(world.insert(entity))
    }
}
