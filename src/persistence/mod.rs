//! Save/load record shape for the external persistence collaborator
//!
//! The core never touches files. It converts its entity store to and from an
//! ordered list of body records (plus the session score) and round-trips that
//! shape through JSON unchanged. Rotation phase and spin are transient and are
//! re-randomized on import.

use glam::{Vec2, Vec3};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::SimError;
use crate::consts::{COLLECTIBLE_SPIN, CUBE_SPIN_MAX, MAX_BODIES, MAX_HALF_SIZE, MIN_HALF_SIZE};
use crate::sim::{Body, BodyKind, SimState};

/// One body as the save/load collaborator sees it. `size` is the half-extent;
/// moving-platform parameters travel inside `kind`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BodyRecord {
    pub position: Vec2,
    pub size: f32,
    pub color: Vec3,
    pub is_static: bool,
    pub kind: BodyKind,
    pub velocity: Vec2,
}

impl BodyRecord {
    fn from_body(body: &Body) -> Self {
        Self {
            position: body.pos,
            size: body.half_size,
            color: body.color,
            is_static: body.is_static,
            kind: body.kind,
            velocity: body.vel,
        }
    }
}

/// Versionless save envelope: score plus the ordered body list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveData {
    pub score: u64,
    pub bodies: Vec<BodyRecord>,
}

/// Serialize a save envelope to JSON.
pub fn to_json(data: &SaveData) -> serde_json::Result<String> {
    serde_json::to_string_pretty(data)
}

/// Parse a save envelope from JSON.
pub fn from_json(json: &str) -> serde_json::Result<SaveData> {
    serde_json::from_str(json)
}

impl SimState {
    /// Capture the active bodies (in slot order) and the score.
    pub fn export_save(&self) -> SaveData {
        SaveData {
            score: self.score,
            bodies: self
                .bodies
                .iter_active()
                .map(BodyRecord::from_body)
                .collect(),
        }
    }

    /// Rebuild the entity store from a save envelope.
    ///
    /// Refuses with `CapacityExceeded` before mutating anything if the record
    /// list cannot fit; on success the previous world is fully replaced.
    pub fn import_save(&mut self, data: &SaveData) -> Result<(), SimError> {
        if data.bodies.len() > MAX_BODIES {
            return Err(SimError::CapacityExceeded { max: MAX_BODIES });
        }

        self.bodies.clear();
        self.particles.clear();
        self.events.clear();
        self.score = data.score;

        for record in &data.bodies {
            let half = record.size.clamp(MIN_HALF_SIZE, MAX_HALF_SIZE);
            let mut body = Body::new(
                record.kind,
                record.position,
                half,
                record.color,
                record.is_static,
            );
            body.vel = record.velocity;
            body.rotation_speed = match record.kind {
                BodyKind::Cube => self.rng.random_range(-CUBE_SPIN_MAX..CUBE_SPIN_MAX),
                BodyKind::Collectible => COLLECTIBLE_SPIN,
                _ => 0.0,
            };
            // Capacity was checked up front; a refusal here is unreachable
            self.bodies.spawn(body)?;
        }

        self.game_over = self.active_dynamic_cubes() == 0;
        log::info!(
            "restored {} bodies (score {})",
            data.bodies.len(),
            data.score
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_import_round_trip() {
        let mut source = SimState::new(31337);
        source.score = 40;

        let saved = source.export_save();
        let mut restored = SimState::empty(1);
        restored.import_save(&saved).unwrap();

        assert_eq!(restored.score, 40);
        assert_eq!(restored.export_save(), saved);
    }

    #[test]
    fn test_moving_platform_params_survive() {
        let mut state = SimState::empty(5);
        state
            .spawn_moving_platform(
                Vec2::new(0.0, 2.0),
                Vec2::new(3.0, 2.0),
                3.0,
                1.5,
                Vec3::new(0.2, 0.7, 0.4),
            )
            .unwrap();
        state
            .spawn_cube(Some(Vec2::new(1.0, 5.0)), Some(0.5), None)
            .unwrap();

        let saved = state.export_save();
        let mut restored = SimState::empty(6);
        restored.import_save(&saved).unwrap();

        let platform = restored
            .bodies
            .iter_active()
            .find(|b| matches!(b.kind, BodyKind::MovingPlatform { .. }))
            .unwrap();
        match platform.kind {
            BodyKind::MovingPlatform { start, end, speed, dir } => {
                assert_eq!(start, Vec2::new(0.0, 2.0));
                assert_eq!(end, Vec2::new(3.0, 2.0));
                assert_eq!(speed, 3.0);
                assert_eq!(dir, 1.0);
            }
            _ => unreachable!(),
        }
        assert!(platform.is_static);
    }

    #[test]
    fn test_json_round_trip() {
        let state = SimState::new(777);
        let saved = state.export_save();

        let json = to_json(&saved).unwrap();
        let parsed = from_json(&json).unwrap();
        assert_eq!(parsed, saved);
    }

    #[test]
    fn test_oversized_save_is_refused_without_mutation() {
        let mut state = SimState::new(2);
        let score_before = state.score;
        let bodies_before = state.bodies.active_count();

        let record = BodyRecord {
            position: Vec2::ZERO,
            size: 0.5,
            color: Vec3::ONE,
            is_static: false,
            kind: BodyKind::Cube,
            velocity: Vec2::ZERO,
        };
        let oversized = SaveData {
            score: 9,
            bodies: vec![record; MAX_BODIES + 1],
        };

        let err = state.import_save(&oversized).unwrap_err();
        assert_eq!(err, SimError::CapacityExceeded { max: MAX_BODIES });
        assert_eq!(state.score, score_before);
        assert_eq!(state.bodies.active_count(), bodies_before);
    }

    #[test]
    fn test_import_recomputes_game_over() {
        let platform_only = SaveData {
            score: 0,
            bodies: vec![BodyRecord {
                position: Vec2::new(0.0, -5.0),
                size: 10.0,
                color: Vec3::ONE,
                is_static: true,
                kind: BodyKind::Platform,
                velocity: Vec2::ZERO,
            }],
        };

        let mut state = SimState::new(3);
        assert!(!state.game_over);
        state.import_save(&platform_only).unwrap();
        assert!(state.game_over);
    }
}
