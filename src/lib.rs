//! Gravity Cubes - a 2D physics sandbox core
//!
//! Core modules:
//! - `sim`: Deterministic simulation (kinematics, collisions, particles, session state)
//! - `persistence`: Body-record save/load shape for external collaborators
//! - `tuning`: Data-driven physics balance
//!
//! Rendering, input polling, audio and file I/O live outside this crate: callers
//! feed `tick` a delta time plus discrete commands and read back a snapshot and
//! an ordered event sequence.

pub mod error;
pub mod persistence;
pub mod sim;
pub mod tuning;

pub use error::SimError;
pub use tuning::Tuning;

use glam::Vec3;

/// Arena geometry, capacities and the canonical layout constants
pub mod consts {
    use glam::Vec3;

    /// Fixed body-table capacity; spawn fails with `CapacityExceeded` beyond this
    pub const MAX_BODIES: usize = 100;
    /// Fixed particle-pool capacity; overflow recycles the oldest slot
    pub const MAX_PARTICLES: usize = 256;

    /// Arena bounds (world units)
    pub const ARENA_MIN_X: f32 = -15.0;
    pub const ARENA_MAX_X: f32 = 15.0;
    pub const ARENA_MIN_Y: f32 = -10.0;
    pub const ARENA_MAX_Y: f32 = 10.0;

    /// Body half-size limits; spawn sizes are clamped into this range
    pub const MIN_HALF_SIZE: f32 = 0.1;
    pub const MAX_HALF_SIZE: f32 = 10.0;

    /// Default half-size for a spawned cube
    pub const DEFAULT_CUBE_HALF_SIZE: f32 = 0.5;
    /// Randomized spawn half-size range for cubes
    pub const CUBE_HALF_SIZE_MIN: f32 = 0.3;
    pub const CUBE_HALF_SIZE_MAX: f32 = 0.8;
    /// Collectible half-size
    pub const COLLECTIBLE_HALF_SIZE: f32 = 0.15;

    /// Canonical layout: floor slab and side walls
    pub const FLOOR_POS_Y: f32 = -5.0;
    pub const FLOOR_HALF_SIZE: f32 = 10.0;
    pub const WALL_POS_X: f32 = 10.0;
    pub const WALL_HALF_SIZE: f32 = 0.5;
    /// Canonical layout: population counts
    pub const INITIAL_CUBES: usize = 6;
    pub const INITIAL_COLLECTIBLES: usize = 2;

    /// Rotation speed range for spawned cubes (radians/sec)
    pub const CUBE_SPIN_MAX: f32 = 0.9;
    /// Collectibles spin at a fixed rate
    pub const COLLECTIBLE_SPIN: f32 = 1.57;

    /// Fixed entity colors
    pub const PLATFORM_COLOR: Vec3 = Vec3::new(0.3, 0.3, 0.8);
    pub const WALL_COLOR: Vec3 = Vec3::new(0.3, 0.5, 0.8);
    pub const MOVING_PLATFORM_COLOR: Vec3 = Vec3::new(0.2, 0.7, 0.4);
    pub const COLLECTIBLE_COLOR: Vec3 = Vec3::new(1.0, 0.9, 0.1);

    /// Preset cube palette
    pub const PRESET_COLORS: [Vec3; 7] = [
        Vec3::new(0.9, 0.2, 0.3), // Red
        Vec3::new(0.2, 0.7, 0.3), // Green
        Vec3::new(0.3, 0.4, 0.9), // Blue
        Vec3::new(0.9, 0.7, 0.1), // Yellow
        Vec3::new(0.8, 0.3, 0.9), // Purple
        Vec3::new(0.2, 0.8, 0.8), // Cyan
        Vec3::new(1.0, 0.5, 0.0), // Orange
    ];
}

/// Pick a preset cube color by rolling `index` into the palette
#[inline]
pub fn preset_color(index: usize) -> Vec3 {
    consts::PRESET_COLORS[index % consts::PRESET_COLORS.len()]
}
