/// Scenery spawner: floor, ceiling and debris streams.
///
/// Each stream spawns a new tile at its anchor once the previous tile has
/// drifted far enough from it.  The generator never removes anything; every
/// tile carries its own `DistanceGatedRemover`.

use nalgebra::Vector3;
use rand::Rng;

use crate::config::{LevelConfig, StreamConfig};
use crate::entities::{pick_template, EntityKey, SpawnedEntity, World};
use crate::error::ConfigError;
use crate::lifecycle::{DirectionalMover, DistanceGatedRemover, Motion, Rotator};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StreamKind {
    Floor,
    Ceiling,
    Debris,
}

impl StreamKind {
    pub const ALL: [StreamKind; 3] = [StreamKind::Floor, StreamKind::Ceiling, StreamKind::Debris];

    fn index(self) -> usize {
        match self {
            StreamKind::Floor => 0,
            StreamKind::Ceiling => 1,
            StreamKind::Debris => 2,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            StreamKind::Floor => "floor",
            StreamKind::Ceiling => "ceiling",
            StreamKind::Debris => "debris",
        }
    }
}

#[derive(Debug)]
struct Stream {
    config: StreamConfig,
    /// Distance the last tile must cover before the next one spawns.
    gap: f32,
    last: Option<EntityKey>,
}

#[derive(Debug)]
pub struct LevelGenerator {
    streams: [Stream; 3],
    h_speed_min: f32,
    h_speed_max: f32,
    v_speed: f32,
    destroy_distance: f32,
}

impl LevelGenerator {
    pub fn new(config: &LevelConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let stream = |c: &StreamConfig| Stream {
            config: c.clone(),
            gap: c.initial_gap,
            last: None,
        };
        Ok(Self {
            streams: [stream(&config.floor), stream(&config.ceiling), stream(&config.debris)],
            h_speed_min: config.h_speed_min,
            h_speed_max: config.h_speed_max,
            v_speed: config.v_speed,
            destroy_distance: config.destroy_distance,
        })
    }

    /// Current spawn threshold for `kind`.
    pub fn gap(&self, kind: StreamKind) -> f32 {
        self.streams[kind.index()].gap
    }

    /// Key of the most recent tile; may already be stale.
    pub fn last_spawned(&self, kind: StreamKind) -> Option<EntityKey> {
        self.streams[kind.index()].last
    }

    pub fn anchor(&self, kind: StreamKind) -> Vector3<f32> {
        self.streams[kind.index()].config.anchor
    }

    /// Lay down each stream's `prefill_count` tiles behind its anchor, ending
    /// with the tile that sits on the anchor itself.
    pub fn prefill<R: Rng + ?Sized>(&mut self, world: &mut World, rng: &mut R) -> Result<usize, ConfigError> {
        let mut placed = 0;
        for kind in StreamKind::ALL {
            let (count, spacing, anchor, sign) = {
                let c = &self.streams[kind.index()].config;
                (c.prefill_count, c.tile_spacing, c.anchor, c.heading.sign())
            };
            for i in (0..count).rev() {
                let position = anchor + Vector3::new(sign * i as f32 * spacing, 0.0, 0.0);
                let key = self.place(kind, position, world, rng)?;
                self.streams[kind.index()].last = Some(key);
                placed += 1;
            }
        }
        if placed > 0 {
            log::debug!("Prefilled {} tiles", placed);
        }
        Ok(placed)
    }

    /// Check every stream once.  Returns how many tiles were spawned.
    pub fn update<R: Rng + ?Sized>(&mut self, world: &mut World, rng: &mut R) -> Result<usize, ConfigError> {
        let mut spawned = 0;
        for kind in StreamKind::ALL {
            if self.maybe_spawn(kind, world, rng)?.is_some() {
                spawned += 1;
            }
        }
        Ok(spawned)
    }

    /// Spawn on `kind` if its last tile is gone or has moved at least the
    /// current gap away from the anchor.
    pub fn maybe_spawn<R: Rng + ?Sized>(
        &mut self,
        kind: StreamKind,
        world: &mut World,
        rng: &mut R,
    ) -> Result<Option<EntityKey>, ConfigError> {
        let stream = &self.streams[kind.index()];
        let due = match stream.last.and_then(|key| world.get(key)) {
            // Never spawned, or already retired.
            None => true,
            Some(last) => (last.position.x - stream.config.anchor.x).abs() >= stream.gap,
        };
        if !due {
            return Ok(None);
        }

        let mut position = stream.config.anchor;
        let offset = stream.config.vertical_offset;
        if offset > 0.0 {
            position.y += rng.gen_range(-offset..=offset);
        }

        let key = self.place(kind, position, world, rng)?;
        let stream = &mut self.streams[kind.index()];
        stream.last = Some(key);
        if let Some(max_gap) = stream.config.max_gap {
            stream.gap = rng.gen_range(0.0..=max_gap);
        }
        Ok(Some(key))
    }

    fn place<R: Rng + ?Sized>(
        &self,
        kind: StreamKind,
        position: Vector3<f32>,
        world: &mut World,
        rng: &mut R,
    ) -> Result<EntityKey, ConfigError> {
        let config = &self.streams[kind.index()].config;
        let template = pick_template(kind.name(), &config.templates, rng)?;

        let mut entity = SpawnedEntity::from_template(template, position);
        entity.motion = Some(Motion::Directional(DirectionalMover {
            heading: config.heading,
            h_speed: rng.gen_range(self.h_speed_min..=self.h_speed_max),
            v_speed: self.v_speed,
        }));
        entity.remover = Some(DistanceGatedRemover::horizontal(position, self.destroy_distance));
        if let Some((min, max)) = config.rotation {
            let mut rotator = Rotator::new(min, max);
            rotator.compute(rng);
            entity.rotator = Some(rotator);
        }

        log::trace!("Spawned {} on {} at ({:.2}, {:.2})", template.name, kind.name(), position.x, position.y);
        Ok(world.insert(entity))
    }
}
