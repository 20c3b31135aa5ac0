//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Clamped timestep only
//! - Seeded RNG only
//! - Stable slot ids (no compaction)
//! - No rendering or platform dependencies
//!
//! Frame pipeline (one `tick` call): command dispatch → kinematics → platform
//! motion → collision resolution → event-driven particle emission → particle
//! integration → game-over recompute.

pub mod collision;
pub mod particles;
pub mod state;
pub mod store;
pub mod tick;

pub use collision::{BroadPhase, BruteForce, UniformGrid};
pub use particles::{Particle, ParticleStore};
pub use state::{Body, BodyKind, SimEvent, SimEventKind, SimState, Snapshot};
pub use store::{BodyId, BodyStore};
pub use tick::{Command, TickInput, tick};
