/// Events emitted during a simulation step.
/// The presentation layer consumes these for sound and messages; the
/// simulation itself never depends on them.

use crate::domain::event::Event;

#[derive(Clone, Copy, Debug)]
#[allow(dead_code)]
pub enum GameEvent {
    WallBroken { x: i32, y: i32 },
    TreasureRevealed { x: i32, y: i32, kind: Event },
    TrapRevealed { x: i32, y: i32 },
    TreasurePicked { x: i32, y: i32, value: u32 },
    TrapArmed { x: i32, y: i32 },
    TrapDisarmed { x: i32, y: i32 },
    TrapExploded { x: i32, y: i32 },
}
