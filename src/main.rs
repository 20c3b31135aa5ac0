//! Headless demo driver
//!
//! Steps a seeded session at a fixed rate with a few scripted commands and
//! logs what happens. The rendering/audio collaborators attach to the library
//! API; this binary only smoke-tests it.

use gravity_cubes::sim::{Command, SimState, TickInput, tick};

const DT: f32 = 1.0 / 60.0;
const FRAMES: u32 = 600;

fn main() {
    env_logger::init();

    let seed = std::env::args()
        .nth(1)
        .and_then(|arg| arg.parse().ok())
        .unwrap_or(42);

    let mut state = SimState::new(seed);
    log::info!(
        "session seeded ({seed}): {} bodies",
        state.bodies.active_count()
    );

    for frame in 0..FRAMES {
        let mut input = TickInput::default();
        // Drop an extra cube every three seconds
        if frame > 0 && frame % 180 == 0 {
            input.commands.push(Command::SpawnCube {
                position: None,
                half_size: None,
                color: None,
            });
        }

        tick(&mut state, &input, DT);

        for event in state.events() {
            log::debug!("event: {event:?}");
        }
        if frame % 60 == 0 {
            let snapshot = state.snapshot();
            log::info!(
                "t={:>2}s score={} bodies={} particles={}",
                frame / 60,
                snapshot.score,
                snapshot.active_bodies,
                snapshot.active_particles
            );
        }
        if state.game_over {
            log::info!("session ended early at frame {frame}");
            break;
        }
    }

    let snapshot = state.snapshot();
    println!(
        "final score {} after {} ticks ({} bodies active, game over: {})",
        snapshot.score,
        state.time_ticks,
        snapshot.active_bodies,
        snapshot.game_over
    );
}
