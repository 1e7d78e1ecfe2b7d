/// The step function: advances the world by one tick.
///
/// Processing order:
///   1. Turn (first-person quarter turns)
///   2. Movement resolution + facing / view alignment
///   3. Treasure pickup at the player's cell
///   4. Swing resolution (wall break / trap arm / trap disarm)
///   5. Fuse countdown → trap explosions
///   6. Message timer
///
/// Movement is one tile per input, only onto floor. Swings are
/// edge-triggered and target the tile directly ahead of the facing
/// direction. All grid mutation happens here, atomically within the
/// tick, so renderers never observe a partial explosion.

use rand::Rng;

use crate::domain::event::Event;
use crate::domain::tile::Tile;
use super::event::GameEvent;
use super::world::{Fuse, Phase, WorldState};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum MoveDir {
    Left,
    Right,
    Up,
    Down,
}

impl MoveDir {
    pub fn delta(self) -> (i32, i32) {
        match self {
            MoveDir::Left => (-1, 0),
            MoveDir::Right => (1, 0),
            MoveDir::Up => (0, -1),
            MoveDir::Down => (0, 1),
        }
    }
}

/// Quarter-turn of the first-person heading.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TurnDir {
    Left,
    Right,
}

pub const CHEAP_TREASURE_VALUE: u32 = 500;
pub const EXPENSIVE_TREASURE_VALUE: u32 = 1000;

/// Per-tick input. Movement and turn are absolute by the time they
/// reach the step; the input layer translates first-person forward /
/// backward keys into grid directions. Swing is edge-triggered.
#[derive(Clone, Copy, Debug, Default)]
pub struct FrameInput {
    pub movement: Option<MoveDir>,
    pub turn: Option<TurnDir>,
    pub swing: bool,
}

// ══════════════════════════════════════════════════════════════
// Main entry point
// ══════════════════════════════════════════════════════════════

pub fn step<R: Rng>(world: &mut WorldState, input: FrameInput, rng: &mut R) -> Vec<GameEvent> {
    if world.phase != Phase::Playing {
        return vec![];
    }

    let mut events: Vec<GameEvent> = Vec::new();
    world.tick += 1;
    world.anim_tick = world.anim_tick.wrapping_add(1);

    resolve_turn(world, input.turn);
    resolve_movement(world, input.movement);
    resolve_pickup(world, &mut events);
    if input.swing {
        resolve_swing(world, rng, &mut events);
    }
    resolve_fuses(world, &mut events);

    if world.message_timer > 0 {
        world.message_timer -= 1;
        if world.message_timer == 0 {
            world.message.clear();
        }
    }

    events
}

// ══════════════════════════════════════════════════════════════
// Turn / movement
// ══════════════════════════════════════════════════════════════

fn resolve_turn(world: &mut WorldState, turn: Option<TurnDir>) {
    let quarter = match turn {
        Some(TurnDir::Left) => -1,
        Some(TurnDir::Right) => 1,
        None => return,
    };
    world.view.turn(quarter);
    // Keep the swing target in lockstep with the heading.
    world.player.facing = world.view.facing();
}

fn resolve_movement(world: &mut WorldState, movement: Option<MoveDir>) {
    if world.player.move_cooldown > 0 {
        world.player.move_cooldown -= 1;
        return;
    }

    let (dx, dy) = match movement {
        Some(dir) => dir.delta(),
        None => return,
    };

    world.player.facing = (dx, dy);
    world.view.align_to(dx, dy);

    let nx = world.player.x + dx;
    let ny = world.player.y + dy;
    if world.grid.at(nx, ny).is_passable() {
        world.player.x = nx;
        world.player.y = ny;
        world.player.move_cooldown = world.speed.player_move_rate;
        world
            .camera
            .follow(nx, ny, world.grid.width(), world.grid.height());
    }
}

// ══════════════════════════════════════════════════════════════
// Pickup
// ══════════════════════════════════════════════════════════════

fn resolve_pickup(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    let (px, py) = (world.player.x, world.player.y);
    let kind = world.events.at(px, py);
    if !kind.is_treasure() {
        return;
    }
    let value = match kind {
        Event::CheapTreasure => CHEAP_TREASURE_VALUE,
        Event::ExpensiveTreasure => EXPENSIVE_TREASURE_VALUE,
        _ => unreachable!(),
    };
    world.score += value;
    world.events.clear(px, py);
    world.set_message(&format!("+{value}"), 5);
    events.push(GameEvent::TreasurePicked { x: px, y: py, value });
}

// ══════════════════════════════════════════════════════════════
// Swing: break walls, arm and disarm traps
// ══════════════════════════════════════════════════════════════

fn resolve_swing<R: Rng>(world: &mut WorldState, rng: &mut R, events: &mut Vec<GameEvent>) {
    let (fx, fy) = (
        world.player.x + world.player.facing.0,
        world.player.y + world.player.facing.1,
    );

    if !world.grid.in_bounds(fx, fy) {
        return;
    }

    match world.grid.at(fx, fy) {
        Tile::Wall => break_wall(world, fx, fy, rng, events),
        Tile::Floor => {
            if world.events.at(fx, fy).is_trap() {
                strike_trap(world, fx, fy, events);
            }
        }
    }
}

fn break_wall<R: Rng>(
    world: &mut WorldState,
    x: i32,
    y: i32,
    rng: &mut R,
    events: &mut Vec<GameEvent>,
) {
    world.grid.set(x, y, Tile::Floor);
    events.push(GameEvent::WallBroken { x, y });

    // Each cell rolls at most once, ever; a None roll is recorded too.
    if world.events.recorded(x, y) {
        return;
    }
    let rolled = Event::from_roll(rng.gen::<f64>());
    world.events.insert(x, y, rolled);
    match rolled {
        Event::Trap => events.push(GameEvent::TrapRevealed { x, y }),
        Event::CheapTreasure | Event::ExpensiveTreasure => {
            events.push(GameEvent::TreasureRevealed { x, y, kind: rolled })
        }
        Event::None => {}
    }
}

/// First hit arms the trap and lights its fuse; the trap survives.
/// A second hit while the fuse burns destroys the trap and cancels the
/// pending explosion.
fn strike_trap(world: &mut WorldState, x: i32, y: i32, events: &mut Vec<GameEvent>) {
    if world.fuse_at(x, y).is_none() {
        world.fuses.push(Fuse {
            x,
            y,
            remaining: world.speed.trap_fuse_ticks,
        });
        events.push(GameEvent::TrapArmed { x, y });
    } else {
        world.events.clear(x, y);
        world.cancel_fuse(x, y);
        events.push(GameEvent::TrapDisarmed { x, y });
    }
}

// ══════════════════════════════════════════════════════════════
// Fuses and explosions
// ══════════════════════════════════════════════════════════════

fn resolve_fuses(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    for fuse in world.fuses.iter_mut() {
        fuse.remaining = fuse.remaining.saturating_sub(1);
    }

    // Collect before mutating: an explosion may cancel other fuses.
    let expired: Vec<(i32, i32)> = world
        .fuses
        .iter()
        .filter(|f| f.remaining == 0)
        .map(|f| (f.x, f.y))
        .collect();

    for (x, y) in expired {
        // The fuse may have been cancelled by a neighbor's blast.
        if world.fuse_at(x, y).is_none() {
            continue;
        }
        explode(world, x, y);
        events.push(GameEvent::TrapExploded { x, y });
    }
}

/// Apply a trap explosion as one atomic mutation: the trap cell's event
/// clears, the 8 surrounding wall cells open to floor, and any events
/// on those neighbors are cleared — their fuses with them.
fn explode(world: &mut WorldState, x: i32, y: i32) {
    world.events.clear(x, y);
    world.cancel_fuse(x, y);

    for dy in -1..=1 {
        for dx in -1..=1 {
            if dx == 0 && dy == 0 {
                continue;
            }
            let (nx, ny) = (x + dx, y + dy);
            if world.grid.at(nx, ny) == Tile::Wall {
                world.grid.set(nx, ny, Tile::Floor); // out-of-bounds writes ignored
            }
            if world.events.at(nx, ny) != Event::None {
                world.events.clear(nx, ny);
                world.cancel_fuse(nx, ny);
            }
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::domain::tile::Grid;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(42)
    }

    /// Playing world: 9x9, all floor except a wall ring plus listed
    /// extra walls. Player at (4,4) facing east.
    fn world_with_walls(walls: &[(i32, i32)]) -> WorldState {
        let mut w = WorldState::new();
        w.speed = GameConfig::default().speed;
        w.grid = Grid::filled(9, 9);
        for y in 1..8 {
            for x in 1..8 {
                w.grid.set(x, y, Tile::Floor);
            }
        }
        for &(x, y) in walls {
            w.grid.set(x, y, Tile::Wall);
        }
        w.player.x = 4;
        w.player.y = 4;
        w.player.facing = (1, 0);
        w.phase = Phase::Playing;
        w
    }

    fn swing() -> FrameInput {
        FrameInput { swing: true, ..FrameInput::default() }
    }

    fn idle() -> FrameInput {
        FrameInput::default()
    }

    // ── movement ──

    #[test]
    fn movement_blocked_by_walls() {
        let mut w = world_with_walls(&[(5, 4)]);
        step(&mut w, FrameInput { movement: Some(MoveDir::Right), ..idle() }, &mut rng());
        assert_eq!((w.player.x, w.player.y), (4, 4));
        // Facing still updates toward the wall.
        assert_eq!(w.player.facing, (1, 0));
        step(&mut w, FrameInput { movement: Some(MoveDir::Down), ..idle() }, &mut rng());
        assert_eq!((w.player.x, w.player.y), (4, 5));
    }

    #[test]
    fn movement_aligns_the_view() {
        let mut w = world_with_walls(&[]);
        step(&mut w, FrameInput { movement: Some(MoveDir::Up), ..idle() }, &mut rng());
        assert_eq!(w.view.compass(), "N");
    }

    #[test]
    fn turn_rotates_view_and_facing_together() {
        let mut w = world_with_walls(&[]);
        w.view.align_to(0, 1); // south
        step(&mut w, FrameInput { turn: Some(TurnDir::Right), ..idle() }, &mut rng());
        assert_eq!(w.view.compass(), "W");
        assert_eq!(w.player.facing, (-1, 0));
    }

    // ── wall breaking ──

    #[test]
    fn breaking_a_wall_clears_it_and_records_exactly_one_roll() {
        let mut w = world_with_walls(&[(5, 4)]);
        let events = step(&mut w, swing(), &mut rng());
        assert_eq!(w.grid.at(5, 4), Tile::Floor);
        assert!(w.events.recorded(5, 4));
        assert!(matches!(events[0], GameEvent::WallBroken { x: 5, y: 4 }));
        // No event ever sits on a tile that is still wall.
        for (&(x, y), &e) in w.events.iter() {
            if e != Event::None {
                assert_eq!(w.grid.at(x, y), Tile::Floor);
            }
        }
    }

    #[test]
    fn swing_at_floor_without_event_is_a_noop() {
        let mut w = world_with_walls(&[]);
        let events = step(&mut w, swing(), &mut rng());
        assert!(events.is_empty());
        assert!(!w.events.recorded(5, 4));
    }

    #[test]
    fn swing_off_the_map_is_ignored() {
        let mut w = world_with_walls(&[]);
        w.player.x = 8; // standing on the border column, aiming outside
        w.player.facing = (1, 0);
        let before = w.grid.clone();
        let events = step(&mut w, swing(), &mut rng());
        assert!(events.is_empty());
        for y in 0..9 {
            for x in 0..9 {
                assert_eq!(w.grid.at(x, y), before.at(x, y));
            }
        }
    }

    // ── pickup ──

    #[test]
    fn stepping_onto_treasure_scores_and_clears_it() {
        let mut w = world_with_walls(&[]);
        w.events.insert(5, 4, Event::CheapTreasure);
        let events = step(
            &mut w,
            FrameInput { movement: Some(MoveDir::Right), ..idle() },
            &mut rng(),
        );
        assert_eq!(w.score, 500);
        assert_eq!(w.events.at(5, 4), Event::None);
        assert!(events
            .iter()
            .any(|e| matches!(e, GameEvent::TreasurePicked { value: 500, .. })));
    }

    #[test]
    fn expensive_treasure_scores_double() {
        let mut w = world_with_walls(&[]);
        w.events.insert(4, 4, Event::ExpensiveTreasure);
        step(&mut w, idle(), &mut rng());
        assert_eq!(w.score, 1000);
    }

    // ── trap lifecycle: arm, disarm, explode ──

    #[test]
    fn first_hit_arms_without_destroying() {
        let mut w = world_with_walls(&[]);
        w.events.insert(5, 4, Event::Trap);
        let events = step(&mut w, swing(), &mut rng());
        assert_eq!(w.events.at(5, 4), Event::Trap);
        assert!(w.fuse_at(5, 4).is_some());
        assert!(matches!(events[0], GameEvent::TrapArmed { x: 5, y: 4 }));
    }

    #[test]
    fn second_hit_destroys_and_cancels_the_fuse() {
        let mut w = world_with_walls(&[]);
        w.events.insert(5, 4, Event::Trap);
        step(&mut w, swing(), &mut rng());
        let events = step(&mut w, swing(), &mut rng());
        assert_eq!(w.events.at(5, 4), Event::None);
        assert!(w.fuse_at(5, 4).is_none());
        assert!(matches!(events[0], GameEvent::TrapDisarmed { x: 5, y: 4 }));

        // The cancelled fuse never fires, no matter how long we wait.
        for _ in 0..w.speed.trap_fuse_ticks * 2 {
            let events = step(&mut w, idle(), &mut rng());
            assert!(events.is_empty());
        }
        assert_eq!(w.grid.at(6, 5), Tile::Floor); // unchanged floor ring
    }

    #[test]
    fn fuse_expiry_explodes_neighborhood() {
        // Trap at (5,4) surrounded by walls on three neighbor cells;
        // one neighbor holds a treasure event that must be cleared.
        let mut w = world_with_walls(&[(6, 3), (6, 4), (6, 5)]);
        w.events.insert(5, 4, Event::Trap);
        w.events.insert(4, 3, Event::CheapTreasure);
        step(&mut w, swing(), &mut rng()); // arm

        for _ in 0..w.speed.trap_fuse_ticks {
            step(&mut w, idle(), &mut rng());
        }

        assert!(w.fuse_at(5, 4).is_none());
        assert_eq!(w.events.at(5, 4), Event::None);
        // Wall neighbors opened to floor.
        assert_eq!(w.grid.at(6, 3), Tile::Floor);
        assert_eq!(w.grid.at(6, 4), Tile::Floor);
        assert_eq!(w.grid.at(6, 5), Tile::Floor);
        // Neighbor event cleared.
        assert_eq!(w.events.at(4, 3), Event::None);
    }

    #[test]
    fn explosion_cancels_neighboring_armed_fuse() {
        // Two adjacent armed traps; the first to blow clears the second
        // trap's event AND its fuse, so only one explosion happens.
        let mut w = world_with_walls(&[]);
        w.events.insert(5, 4, Event::Trap);
        w.events.insert(5, 5, Event::Trap);
        step(&mut w, swing(), &mut rng()); // arm (5,4)
        w.player.facing = (1, 1); // not a swing target; set fuse directly
        w.fuses.push(Fuse { x: 5, y: 5, remaining: w.speed.trap_fuse_ticks });

        let mut explosions = 0;
        for _ in 0..w.speed.trap_fuse_ticks + 2 {
            let events = step(&mut w, idle(), &mut rng());
            explosions += events
                .iter()
                .filter(|e| matches!(e, GameEvent::TrapExploded { .. }))
                .count();
        }
        assert_eq!(explosions, 1);
        assert!(w.fuses.is_empty());
        assert_eq!(w.events.at(5, 5), Event::None);
    }

    #[test]
    fn explosion_does_not_open_out_of_bounds_cells() {
        // Trap in the corner pocket: neighbors outside the grid are
        // ignored, in-bounds border walls open.
        let mut w = world_with_walls(&[]);
        w.player.x = 1;
        w.player.y = 1;
        w.player.facing = (0, -1);
        w.grid.set(1, 0, Tile::Floor);
        w.events.insert(1, 0, Event::Trap);
        step(&mut w, swing(), &mut rng());
        for _ in 0..w.speed.trap_fuse_ticks {
            step(&mut w, idle(), &mut rng());
        }
        assert_eq!(w.events.at(1, 0), Event::None);
        assert_eq!(w.grid.at(0, 0), Tile::Floor);
        assert_eq!(w.grid.at(2, 0), Tile::Floor);
        // Out-of-bounds stays wall by definition.
        assert_eq!(w.grid.at(1, -1), Tile::Wall);
    }

    #[test]
    fn step_is_inert_outside_playing_phase() {
        let mut w = world_with_walls(&[(5, 4)]);
        w.phase = Phase::Title;
        let events = step(&mut w, swing(), &mut rng());
        assert!(events.is_empty());
        assert_eq!(w.grid.at(5, 4), Tile::Wall);
    }
}
