//! Runtime core of a side-scrolling rocket-launch arcade game.
//!
//! A phase state machine drives the mission; spawners keep the world filled
//! with scenery, debris and flying objects that retire themselves once they
//! have travelled far enough.

pub mod config;
pub mod entities;
pub mod error;
pub mod flying_objects;
pub mod launch_pad;
pub mod level_generator;
pub mod lifecycle;
pub mod player;
pub mod session;
pub mod state_machine;
