/// The launch platform that drops away under the rocket on ignition.
///
/// Force application is the physics layer's job; the pad only talks to it
/// through `PhysicsBody`.

use std::cell::Cell;
use std::rc::Rc;

use nalgebra::Vector3;

use crate::config::LaunchPadConfig;
use crate::state_machine::GamePhase;

/// What the pad needs from a physics body.
pub trait PhysicsBody {
    fn position(&self) -> Vector3<f32>;
    /// Velocity magnitude.
    fn speed(&self) -> f32;
    /// Continuous force for the current step.
    fn add_force(&mut self, force: Vector3<f32>);
    fn integrate(&mut self, delta_time: f32);
}

/// Unit-mass body with explicit Euler integration.
#[derive(Clone, Debug, PartialEq)]
pub struct KinematicBody {
    pub position: Vector3<f32>,
    pub velocity: Vector3<f32>,
    pending_force: Vector3<f32>,
}

impl KinematicBody {
    pub fn new(position: Vector3<f32>, velocity: Vector3<f32>) -> Self {
        Self {
            position,
            velocity,
            pending_force: Vector3::zeros(),
        }
    }
}

impl PhysicsBody for KinematicBody {
    fn position(&self) -> Vector3<f32> {
        self.position
    }

    fn speed(&self) -> f32 {
        self.velocity.norm()
    }

    fn add_force(&mut self, force: Vector3<f32>) {
        self.pending_force += force;
    }

    fn integrate(&mut self, delta_time: f32) {
        self.velocity += self.pending_force * delta_time;
        self.position += self.velocity * delta_time;
        self.pending_force = Vector3::zeros();
    }
}

#[derive(Debug)]
pub struct LaunchPad<B: PhysicsBody> {
    body: B,
    origin: Vector3<f32>,
    launch: Rc<Cell<bool>>,
    acceleration: f32,
    max_speed: f32,
    max_travel: f32,
    /// Cleared once the pad has fallen `max_travel` away.
    present: bool,
}

impl LaunchPad<KinematicBody> {
    pub fn from_config(config: &LaunchPadConfig) -> Self {
        let velocity = Vector3::new(0.0, -config.initial_speed, 0.0);
        LaunchPad::new(KinematicBody::new(config.position, velocity), config)
    }
}

impl<B: PhysicsBody> LaunchPad<B> {
    pub fn new(body: B, config: &LaunchPadConfig) -> Self {
        Self {
            origin: body.position(),
            body,
            launch: Rc::new(Cell::new(false)),
            acceleration: config.acceleration,
            max_speed: config.max_speed,
            max_travel: config.max_travel,
            present: true,
        }
    }

    pub fn body(&self) -> &B {
        &self.body
    }

    pub fn is_launched(&self) -> bool {
        self.launch.get()
    }

    pub fn is_present(&self) -> bool {
        self.present
    }

    /// Arms the pad on `Ignition`.
    pub fn phase_handler(&self) -> impl FnMut(GamePhase) + 'static {
        let launch = Rc::clone(&self.launch);
        move |phase| {
            if phase == GamePhase::Ignition {
                launch.set(true);
            }
        }
    }

    /// Push the pad downward until it reaches `max_speed`, and retire it once
    /// it has fallen `max_travel` from where it started.
    pub fn fixed_update(&mut self, delta_time: f32) {
        if !self.present || !self.launch.get() {
            return;
        }
        if self.body.speed() < self.max_speed {
            self.body.add_force(Vector3::new(0.0, -self.acceleration, 0.0));
        }
        self.body.integrate(delta_time);

        if (self.body.position() - self.origin).norm() >= self.max_travel {
            self.present = false;
            log::debug!("Launch pad retired");
        }
    }
}
