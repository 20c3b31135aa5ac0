//! Pairwise collision detection and resolution
//!
//! Broad phase: axis-aligned box rejection over all distinct active pairs,
//! behind a trait so the O(n²) scan can be swapped for a spatial grid without
//! touching resolution semantics. Narrow phase: bodies are treated as circles
//! of radius `half_size`. Resolution is a single pass per frame with no
//! iterative solver; residual penetration in clusters is accepted.

use std::collections::{HashMap, HashSet};

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;

use super::state::{Body, BodyKind, SimEvent, SimEventKind};
use crate::Tuning;

/// Candidate-pair producer.
///
/// Implementations must emit each pair `(i, j)` with `i < j` at most once,
/// sorted ascending, restricted to active bodies whose boxes overlap, and with
/// static-static pairs excluded. Under that contract every implementation
/// drives the resolver identically.
pub trait BroadPhase {
    fn candidate_pairs(&mut self, bodies: &[Body], out: &mut Vec<(usize, usize)>);
}

/// O(n²) scan; the default at sandbox scale.
#[derive(Debug, Default)]
pub struct BruteForce;

impl BroadPhase for BruteForce {
    fn candidate_pairs(&mut self, bodies: &[Body], out: &mut Vec<(usize, usize)>) {
        out.clear();
        for i in 0..bodies.len() {
            if !bodies[i].active {
                continue;
            }
            for j in (i + 1)..bodies.len() {
                if !bodies[j].active {
                    continue;
                }
                if bodies[i].is_static && bodies[j].is_static {
                    continue;
                }
                if aabb_overlap(&bodies[i], &bodies[j]) {
                    out.push((i, j));
                }
            }
        }
    }
}

/// Uniform-cell spatial grid. Bodies are inserted into every cell their box
/// covers; only bodies sharing a cell are tested.
#[derive(Debug)]
pub struct UniformGrid {
    cell_size: f32,
    cells: HashMap<(i32, i32), Vec<usize>>,
}

impl UniformGrid {
    pub fn new(cell_size: f32) -> Self {
        Self {
            cell_size: cell_size.max(1e-3),
            cells: HashMap::new(),
        }
    }

    fn cell_range(&self, center: f32, half: f32) -> std::ops::RangeInclusive<i32> {
        let lo = ((center - half) / self.cell_size).floor() as i32;
        let hi = ((center + half) / self.cell_size).floor() as i32;
        lo..=hi
    }
}

impl BroadPhase for UniformGrid {
    fn candidate_pairs(&mut self, bodies: &[Body], out: &mut Vec<(usize, usize)>) {
        out.clear();
        self.cells.clear();

        for (index, body) in bodies.iter().enumerate() {
            if !body.active {
                continue;
            }
            for cx in self.cell_range(body.pos.x, body.half_size) {
                for cy in self.cell_range(body.pos.y, body.half_size) {
                    self.cells.entry((cx, cy)).or_default().push(index);
                }
            }
        }

        let mut seen: HashSet<(usize, usize)> = HashSet::new();
        for bucket in self.cells.values() {
            for (slot, &a) in bucket.iter().enumerate() {
                for &b in &bucket[slot + 1..] {
                    let (i, j) = if a < b { (a, b) } else { (b, a) };
                    if bodies[i].is_static && bodies[j].is_static {
                        continue;
                    }
                    if aabb_overlap(&bodies[i], &bodies[j]) && seen.insert((i, j)) {
                        out.push((i, j));
                    }
                }
            }
        }
        // Cell iteration order is arbitrary; the contract wants ascending pairs
        out.sort_unstable();
    }
}

#[inline]
fn aabb_overlap(a: &Body, b: &Body) -> bool {
    let span = a.half_size + b.half_size;
    (a.pos.x - b.pos.x).abs() < span && (a.pos.y - b.pos.y).abs() < span
}

/// Random unit normal for coincident centers.
pub(crate) fn random_unit(rng: &mut Pcg32) -> Vec2 {
    let angle = rng.random_range(0.0..std::f32::consts::TAU);
    Vec2::new(angle.cos(), angle.sin())
}

fn pair_mut(bodies: &mut [Body], i: usize, j: usize) -> (&mut Body, &mut Body) {
    debug_assert!(i < j);
    let (head, tail) = bodies.split_at_mut(j);
    (&mut head[i], &mut tail[0])
}

/// Resolve every candidate pair once, in order. Returns the score gained from
/// pickups; collision/pickup events are appended to `events`.
pub fn resolve_pairs(
    bodies: &mut [Body],
    pairs: &[(usize, usize)],
    tuning: &Tuning,
    rng: &mut Pcg32,
    events: &mut Vec<SimEvent>,
) -> u64 {
    let mut score = 0;

    for &(i, j) in pairs {
        // A pickup earlier in this pass may have deactivated one of the two
        if !bodies[i].active || !bodies[j].active {
            continue;
        }

        let delta = bodies[i].pos - bodies[j].pos;
        let dist = delta.length();
        let radii = bodies[i].half_size + bodies[j].half_size;
        if dist >= radii {
            continue;
        }

        // Pickup wins over physical response
        let picked = match (bodies[i].kind, bodies[j].kind) {
            (BodyKind::Cube, BodyKind::Collectible) => Some(j),
            (BodyKind::Collectible, BodyKind::Cube) => Some(i),
            _ => None,
        };
        if let Some(coin) = picked {
            bodies[coin].active = false;
            score += tuning.collectible_reward;
            events.push(SimEvent {
                kind: SimEventKind::CollectiblePicked,
                position: bodies[coin].pos,
                color: bodies[coin].color,
                intensity: 1.0,
            });
            continue;
        }

        let (a, b) = pair_mut(bodies, i, j);
        if a.is_static && b.is_static {
            continue;
        }

        if a.is_static != b.is_static {
            let (moving, fixed) = if a.is_static { (b, a) } else { (a, b) };
            resolve_against_static(moving, fixed, radii, tuning, rng, events);
        } else {
            resolve_dynamic_pair(a, b, delta, dist, radii, tuning, rng, events);
        }
    }

    score
}

/// Push a dynamic body fully out of a static one and reflect its approach.
fn resolve_against_static(
    moving: &mut Body,
    fixed: &Body,
    radii: f32,
    tuning: &Tuning,
    rng: &mut Pcg32,
    events: &mut Vec<SimEvent>,
) {
    let delta = moving.pos - fixed.pos;
    let dist = delta.length();
    let normal = if dist > 0.0 {
        delta / dist
    } else {
        random_unit(rng)
    };

    moving.pos += normal * (radii - dist);

    let approach = moving.vel.dot(normal);
    if approach < 0.0 {
        // Reflect the normal component, scaled by the bounce factor;
        // tangential velocity is untouched
        moving.vel -= (1.0 + tuning.bounce_factor) * approach * normal;
        events.push(SimEvent {
            kind: SimEventKind::Collision,
            position: moving.pos,
            color: moving.color,
            intensity: -approach,
        });
    }
}

/// Mass-weighted separation and impulse exchange between two dynamic bodies.
#[allow(clippy::too_many_arguments)]
fn resolve_dynamic_pair(
    a: &mut Body,
    b: &mut Body,
    delta: Vec2,
    dist: f32,
    radii: f32,
    tuning: &Tuning,
    rng: &mut Pcg32,
    events: &mut Vec<SimEvent>,
) {
    let normal = if dist > 0.0 {
        delta / dist
    } else {
        random_unit(rng)
    };

    let mass_a = a.mass();
    let mass_b = b.mass();
    let total = mass_a + mass_b;

    // Heavier body moves less
    let overlap = radii - dist;
    a.pos += normal * overlap * (mass_b / total);
    b.pos -= normal * overlap * (mass_a / total);

    let rel_vel = a.vel - b.vel;
    let approach = rel_vel.dot(normal);
    if approach > 0.0 {
        // Already separating; leave the pair unresolved this frame
        return;
    }

    let impulse = -(1.0 + tuning.bounce_factor) * approach / (1.0 / mass_a + 1.0 / mass_b);
    a.vel += impulse * normal / mass_a;
    b.vel -= impulse * normal / mass_b;

    // Noise injection keeps stacks from settling into a dead equilibrium;
    // zeroed for momentum-conservation tests
    let jitter = tuning.collision_jitter;
    if jitter > 0.0 {
        a.vel.x += rng.random_range(-jitter..jitter);
        a.vel.y += rng.random_range(-jitter..jitter);
        b.vel.x += rng.random_range(-jitter..jitter);
        b.vel.y += rng.random_range(-jitter..jitter);
    }

    events.push(SimEvent {
        kind: SimEventKind::Collision,
        position: (a.pos + b.pos) * 0.5,
        color: a.color,
        intensity: -approach,
    });
}
