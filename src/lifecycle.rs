/// Per-entity behaviours: movement, rotation and distance-gated removal.
///
/// These know nothing about spawners or phases.  Each tick they read the
/// player's `alive` flag and nothing else from the outside world.

use nalgebra::Vector3;
use rand::Rng;

use crate::entities::{EntityKey, FlightDirection, Heading, PlayerState, World};

// ── Movement ──────────────────────────────────────────────────────────────────

/// Scrolls a tile sideways while the player lives and drifts it downward
/// regardless.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DirectionalMover {
    pub heading: Heading,
    pub h_speed: f32,
    pub v_speed: f32,
}

impl DirectionalMover {
    pub fn step(&self, position: &mut Vector3<f32>, player_alive: bool, delta_time: f32) {
        if player_alive {
            position.x += self.heading.sign() * self.h_speed * delta_time;
        }
        position.y -= self.v_speed * delta_time;
    }
}

/// Straight-line flight for objects from a flying-object spawner.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FlightMover {
    pub direction: FlightDirection,
    pub speed: f32,
    pub downward_speed: f32,
}

impl FlightMover {
    pub fn step(&self, position: &mut Vector3<f32>, delta_time: f32) {
        *position += self.direction.vector(self.downward_speed) * self.speed * delta_time;
    }
}

/// Traces a figure eight (a Lissajous curve, `x = sin t`, `y = sin t cos t`)
/// around a centre that itself travels at `drift`, and turns to face the way
/// it is moving.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FigureEightMover {
    /// Radians of curve parameter per second.
    pub speed: f32,
    pub scale_x: f32,
    pub scale_y: f32,
    pub centre: Vector3<f32>,
    /// Centre velocity.  Zero keeps the loop in place.
    pub drift: Vector3<f32>,
    elapsed: f32,
}

impl FigureEightMover {
    /// Starts at `centre`, the crossing point of the eight.
    pub fn new(centre: Vector3<f32>, speed: f32, scale_x: f32, scale_y: f32, drift: Vector3<f32>) -> Self {
        Self {
            speed,
            scale_x,
            scale_y,
            centre,
            drift,
            elapsed: 0.0,
        }
    }

    /// Curve parameter so far.
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Move along the curve and point `rotation` (degrees about z) along the
    /// step just taken.  A zero-length step leaves `rotation` alone.
    pub fn step(&mut self, position: &mut Vector3<f32>, rotation: &mut f32, delta_time: f32) {
        self.centre += self.drift * delta_time;
        self.elapsed += delta_time * self.speed;

        let (sin, cos) = self.elapsed.sin_cos();
        let next = Vector3::new(
            self.centre.x + self.scale_x * sin,
            self.centre.y + self.scale_y * sin * cos,
            position.z,
        );
        let moved = next - *position;
        if moved.x != 0.0 || moved.y != 0.0 {
            *rotation = moved.y.atan2(moved.x).to_degrees();
        }
        *position = next;
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Motion {
    Directional(DirectionalMover),
    Flight(FlightMover),
    FigureEight(FigureEightMover),
}

impl Motion {
    pub fn step(&mut self, position: &mut Vector3<f32>, rotation: &mut f32, player_alive: bool, delta_time: f32) {
        match self {
            Motion::Directional(mover) => mover.step(position, player_alive, delta_time),
            Motion::Flight(mover) => mover.step(position, delta_time),
            Motion::FigureEight(mover) => mover.step(position, rotation, delta_time),
        }
    }
}

// ── Removal ───────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DistanceMetric {
    /// `|dx| > threshold`, checked only while the player is alive.
    Horizontal,
    /// `|d| >= threshold`, checked unconditionally.
    Euclidean,
}

/// Retires an entity once it has travelled far enough from where it spawned.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DistanceGatedRemover {
    pub origin: Vector3<f32>,
    pub threshold: f32,
    pub metric: DistanceMetric,
}

impl DistanceGatedRemover {
    pub fn horizontal(origin: Vector3<f32>, threshold: f32) -> Self {
        Self {
            origin,
            threshold,
            metric: DistanceMetric::Horizontal,
        }
    }

    pub fn euclidean(origin: Vector3<f32>, threshold: f32) -> Self {
        Self {
            origin,
            threshold,
            metric: DistanceMetric::Euclidean,
        }
    }

    pub fn travelled(&self, position: &Vector3<f32>) -> f32 {
        match self.metric {
            DistanceMetric::Horizontal => (position.x - self.origin.x).abs(),
            DistanceMetric::Euclidean => (position - self.origin).norm(),
        }
    }

    pub fn should_remove(&self, position: &Vector3<f32>, player_alive: bool) -> bool {
        match self.metric {
            DistanceMetric::Horizontal => player_alive && self.travelled(position) > self.threshold,
            DistanceMetric::Euclidean => self.travelled(position) >= self.threshold,
        }
    }
}

// ── Rotation ──────────────────────────────────────────────────────────────────

/// Continuous spin with a randomly drawn rate.  The rate must be computed
/// before the rotator does anything.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Rotator {
    Uninitialized { min_speed: f32, max_speed: f32 },
    Computed { rate: f32 },
}

impl Rotator {
    /// Bounds are taken in either order.  Both must be finite.
    pub fn new(min_speed: f32, max_speed: f32) -> Self {
        Rotator::Uninitialized {
            min_speed: min_speed.min(max_speed),
            max_speed: min_speed.max(max_speed),
        }
    }

    /// Collectible spin: a rate drawn from `[speed / 2, speed]`, always in
    /// the same direction.
    pub fn spin<R: Rng + ?Sized>(speed: f32, rng: &mut R) -> Self {
        let speed = speed.abs();
        Rotator::Computed {
            rate: rng.gen_range(0.5 * speed..=speed),
        }
    }

    /// Draw the rate from `[min_speed, max_speed]` and flip its sign half the
    /// time.  Calling again on a computed rotator keeps the existing rate.
    pub fn compute<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        if let Rotator::Uninitialized {
            min_speed,
            max_speed,
        } = *self
        {
            let mut rate = rng.gen_range(min_speed..=max_speed);
            if rng.gen_bool(0.5) {
                rate = -rate;
            }
            *self = Rotator::Computed { rate };
        }
    }

    /// Degrees per second, or `None` before `compute`.
    pub fn rate(&self) -> Option<f32> {
        match self {
            Rotator::Uninitialized { .. } => None,
            Rotator::Computed { rate } => Some(*rate),
        }
    }

    pub fn step(&self, rotation: &mut f32, delta_time: f32) {
        if let Rotator::Computed { rate } = self {
            *rotation = (*rotation + rate * delta_time).rem_euclid(360.0);
        }
    }
}

// ── World update ──────────────────────────────────────────────────────────────

/// Run every entity's behaviours for one tick and remove the ones whose
/// remover fired.  Removal happens before this returns, so the next tick
/// never sees a retired entity.
pub fn update_entities(world: &mut World, player: &PlayerState, delta_time: f32) -> Vec<EntityKey> {
    let mut retired: Vec<EntityKey> = Vec::new();

    for (key, entity) in world.iter_mut() {
        if let Some(rotator) = &entity.rotator {
            rotator.step(&mut entity.rotation, delta_time);
        }
        if let Some(motion) = &mut entity.motion {
            motion.step(&mut entity.position, &mut entity.rotation, player.alive, delta_time);
        }
        if let Some(remover) = &entity.remover {
            if remover.should_remove(&entity.position, player.alive) {
                retired.push(key);
            }
        }
    }

    for key in &retired {
        if let Some(entity) = world.remove(*key) {
            log::trace!("Retired {} at ({:.2}, {:.2})", entity.name, entity.position.x, entity.position.y);
        }
    }
    retired
}
