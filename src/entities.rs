/// World entity types, mostly pure data.
///
/// Behaviour attached to spawned entities lives in `lifecycle`; this module
/// only describes what an entity *is*.

use nalgebra::Vector3;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use slotmap::{new_key_type, SlotMap};

use crate::error::ConfigError;
use crate::lifecycle::{DistanceGatedRemover, Motion, Rotator};

new_key_type! {
    /// Handle to a spawned entity.  Goes stale once the entity is removed.
    pub struct EntityKey;
}

/// All live entities.  Spawners append, lifecycle behaviours remove.
pub type World = SlotMap<EntityKey, SpawnedEntity>;

// ── Templates ─────────────────────────────────────────────────────────────────

/// What happens when the player touches an entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EntityRole {
    /// Background tiles; no contact outcome.
    Scenery,
    /// Removes `damage` health on contact.
    Hazard { damage: u32 },
    /// Awards `points` on contact and is consumed.
    Collectible { points: u32 },
}

/// A candidate entity a spawner may instantiate.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Template {
    pub name: String,
    /// Single cell used by the terminal renderer.
    pub glyph: char,
    pub role: EntityRole,
}

impl Template {
    pub fn new(name: &str, glyph: char, role: EntityRole) -> Self {
        Self {
            name: name.to_string(),
            glyph,
            role,
        }
    }
}

/// Choose a template uniformly at random.  An empty pool is a configuration
/// error, never a silent no-op.
pub fn pick_template<'a, R: Rng + ?Sized>(
    spawner: &str,
    pool: &'a [Template],
    rng: &mut R,
) -> Result<&'a Template, ConfigError> {
    pool.choose(rng).ok_or_else(|| ConfigError::EmptyTemplatePool {
        spawner: spawner.to_string(),
    })
}

// ── Directions ────────────────────────────────────────────────────────────────

/// Horizontal heading of a scrolling tile stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Heading {
    Left,
    Right,
}

impl Heading {
    /// -1.0 for left, 1.0 for right.
    pub fn sign(self) -> f32 {
        match self {
            Heading::Left => -1.0,
            Heading::Right => 1.0,
        }
    }
}

/// Direction modes for flying objects.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlightDirection {
    Left,
    LeftDown,
    Right,
    RightDown,
    Down,
}

impl FlightDirection {
    /// Unscaled direction vector.  The diagonal modes scale the downward
    /// component by `downward_speed`; `Down` is always a unit vector.
    pub fn vector(self, downward_speed: f32) -> Vector3<f32> {
        match self {
            FlightDirection::Left => Vector3::new(-1.0, 0.0, 0.0),
            FlightDirection::LeftDown => Vector3::new(-1.0, -downward_speed, 0.0),
            FlightDirection::Right => Vector3::new(1.0, 0.0, 0.0),
            FlightDirection::RightDown => Vector3::new(1.0, -downward_speed, 0.0),
            FlightDirection::Down => Vector3::new(0.0, -1.0, 0.0),
        }
    }
}

// ── Spawned entities ──────────────────────────────────────────────────────────

/// Runtime record of something a spawner placed in the world.
#[derive(Clone, Debug)]
pub struct SpawnedEntity {
    pub name: String,
    pub glyph: char,
    pub role: EntityRole,
    pub position: Vector3<f32>,
    /// Rotation about the z axis, in degrees.
    pub rotation: f32,
    pub motion: Option<Motion>,
    pub remover: Option<DistanceGatedRemover>,
    pub rotator: Option<Rotator>,
}

impl SpawnedEntity {
    /// A bare entity at `position` with no behaviours attached.
    pub fn from_template(template: &Template, position: Vector3<f32>) -> Self {
        Self {
            name: template.name.clone(),
            glyph: template.glyph,
            role: template.role,
            position,
            rotation: 0.0,
            motion: None,
            remover: None,
            rotator: None,
        }
    }
}

// ── Player ────────────────────────────────────────────────────────────────────

/// The player's observable state.  Lifecycle behaviours read `alive` and
/// `position` every tick; only the player agent writes them.
#[derive(Clone, Debug, PartialEq)]
pub struct PlayerState {
    /// Goes from `true` to `false` once and never back.
    pub alive: bool,
    pub health: i32,
    /// Never decreases.
    pub points: u32,
    pub position: Vector3<f32>,
}

impl PlayerState {
    pub fn new(health: i32, position: Vector3<f32>) -> Self {
        Self {
            alive: true,
            health,
            points: 0,
            position,
        }
    }
}
