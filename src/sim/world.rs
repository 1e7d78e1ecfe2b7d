/// WorldState: the complete snapshot of a running game.
///
/// Grid and EventMap are created at dungeon generation and live for the
/// session. They are the single shared source of truth for both the
/// top-down composer and the raycasting projector; renderers read them
/// during a pass and never mutate. All grid mutation happens inside the
/// simulation step (wall breaks, trap explosions), between render
/// passes, so a pass always sees a consistent snapshot.
///
/// ## Camera / Viewport (top-down view)
///
/// World and screen coordinates are separate: the camera is a viewport
/// into the world, following the player with a dead zone and centering
/// maps smaller than the viewport.

use rand::Rng;

use crate::config::{GameConfig, SpeedConfig};
use crate::domain::event::EventMap;
use crate::domain::tile::Grid;
use crate::domain::view::ViewState;
use crate::sim::dungeon;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Phase {
    Title,
    Playing,
}

/// Which presentation the player is looking at. Both modes read the
/// same world; switching costs nothing.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ViewMode {
    TopDown,
    FirstPerson,
}

#[derive(Clone, Debug)]
pub struct Player {
    pub x: i32,
    pub y: i32,
    /// Last movement direction; swings target the tile ahead of this.
    pub facing: (i32, i32),
    /// Ticks until the next step is allowed while a key is held.
    pub move_cooldown: u32,
}

impl Player {
    pub fn new(x: i32, y: i32) -> Self {
        Player { x, y, facing: (0, 1), move_cooldown: 0 }
    }
}

/// A fuse ticking on an armed trap. Its presence in `WorldState::fuses`
/// IS the pending explosion; removing the entry is the cancellation
/// handle. Disarming or exploding a trap removes its fuse, so a stale
/// mutation can never fire against cells that have changed meaning.
#[derive(Clone, Copy, Debug)]
pub struct Fuse {
    pub x: i32,
    pub y: i32,
    pub remaining: u32,
}

// ── Camera: viewport into the world (top-down view) ──

#[derive(Clone, Debug)]
pub struct Camera2d {
    /// World coordinate of the top-left visible cell (negative when a
    /// small map is centered in a large viewport).
    pub x: i32,
    pub y: i32,
    pub view_w: usize,
    pub view_h: usize,
}

impl Camera2d {
    pub fn new() -> Self {
        Camera2d { x: 0, y: 0, view_w: 0, view_h: 0 }
    }

    /// Follow a target with a dead zone: only scroll when the target
    /// nears the viewport edge. Maps that fit are centered.
    pub fn follow(&mut self, tx: i32, ty: i32, world_w: usize, world_h: usize) {
        if self.view_w == 0 || self.view_h == 0 {
            return;
        }
        self.x = follow_axis(self.x, tx, world_w as i32, self.view_w as i32);
        self.y = follow_axis(self.y, ty, world_h as i32, self.view_h as i32);
    }

    /// Snap the viewport so the target is centered. Used on new games.
    pub fn center_on(&mut self, tx: i32, ty: i32, world_w: usize, world_h: usize) {
        if self.view_w == 0 || self.view_h == 0 {
            return;
        }
        self.x = center_axis(tx, world_w as i32, self.view_w as i32);
        self.y = center_axis(ty, world_h as i32, self.view_h as i32);
    }

    /// World to viewport coordinate; None when outside the visible area.
    #[allow(dead_code)]
    pub fn world_to_view(&self, wx: i32, wy: i32) -> Option<(usize, usize)> {
        let vx = wx - self.x;
        let vy = wy - self.y;
        if vx >= 0 && vx < self.view_w as i32 && vy >= 0 && vy < self.view_h as i32 {
            Some((vx as usize, vy as usize))
        } else {
            None
        }
    }
}

fn follow_axis(cur: i32, target: i32, world: i32, view: i32) -> i32 {
    if world <= view {
        return -((view - world) / 2);
    }
    // Dead zone: 20% margin on each side.
    let margin = view / 5;
    let mut pos = cur;
    if target < cur + margin {
        pos = target - margin;
    } else if target > cur + view - margin - 1 {
        pos = target - view + margin + 1;
    }
    pos.clamp(0, world - view)
}

fn center_axis(target: i32, world: i32, view: i32) -> i32 {
    if world <= view {
        -((view - world) / 2)
    } else {
        (target - view / 2).clamp(0, world - view)
    }
}

// ── World ──

pub struct WorldState {
    // ── Shared simulation state ──
    pub grid: Grid,
    pub events: EventMap,
    pub player: Player,
    pub view: ViewState,
    /// One entry per armed trap.
    pub fuses: Vec<Fuse>,

    // ── Game tracking ──
    pub score: u32,
    pub tick: u64,

    // ── Speed config ──
    pub speed: SpeedConfig,

    // ── Meta / UI ──
    pub phase: Phase,
    pub view_mode: ViewMode,
    pub message: String,
    pub message_timer: u32,
    pub anim_tick: u32,
    pub paused: bool,
    pub camera: Camera2d,
}

impl WorldState {
    pub fn new() -> Self {
        WorldState {
            grid: Grid::filled(0, 0),
            events: EventMap::new(),
            player: Player::new(1, 1),
            view: ViewState::new(),
            fuses: vec![],
            score: 0,
            tick: 0,
            speed: SpeedConfig::default(),
            phase: Phase::Title,
            view_mode: ViewMode::TopDown,
            message: String::new(),
            message_timer: 0,
            anim_tick: 0,
            paused: false,
            camera: Camera2d::new(),
        }
    }

    /// Generate a fresh dungeon and drop the player on the spawn point.
    /// Score persists across regenerations only if the caller wants it
    /// to; a new game resets it first.
    pub fn new_dungeon<R: Rng>(&mut self, config: &GameConfig, rng: &mut R) {
        self.grid = dungeon::generate(
            config.dungeon.width,
            config.dungeon.height,
            &config.dungeon.params(),
            rng,
        );
        self.events = EventMap::new();
        self.fuses.clear();
        let (sx, sy) = self.grid.spawn_point();
        self.player = Player::new(sx, sy);
        self.view = ViewState::new();
        self.tick = 0;
        self.anim_tick = 0;
        self.camera.center_on(sx, sy, self.grid.width(), self.grid.height());
    }

    /// Index of the fuse armed at (x, y), if any.
    pub fn fuse_at(&self, x: i32, y: i32) -> Option<usize> {
        self.fuses.iter().position(|f| f.x == x && f.y == y)
    }

    /// Cancel the pending explosion at (x, y). No-op when nothing is
    /// armed there.
    pub fn cancel_fuse(&mut self, x: i32, y: i32) {
        if let Some(i) = self.fuse_at(x, y) {
            self.fuses.swap_remove(i);
        }
    }

    pub fn set_message(&mut self, msg: &str, duration: u32) {
        self.message = msg.to_string();
        self.message_timer = duration;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fuse_lookup_and_cancel() {
        let mut w = WorldState::new();
        w.fuses.push(Fuse { x: 3, y: 4, remaining: 13 });
        w.fuses.push(Fuse { x: 5, y: 6, remaining: 13 });
        assert!(w.fuse_at(3, 4).is_some());
        w.cancel_fuse(3, 4);
        assert!(w.fuse_at(3, 4).is_none());
        assert!(w.fuse_at(5, 6).is_some());
        // Cancelling twice is harmless.
        w.cancel_fuse(3, 4);
        assert_eq!(w.fuses.len(), 1);
    }

    #[test]
    fn camera_centers_small_maps() {
        let mut cam = Camera2d::new();
        cam.view_w = 40;
        cam.view_h = 30;
        cam.center_on(5, 5, 30, 20);
        assert_eq!(cam.x, -5);
        assert_eq!(cam.y, -5);
    }

    #[test]
    fn camera_follow_scrolls_only_at_the_margin() {
        let mut cam = Camera2d::new();
        cam.view_w = 10;
        cam.view_h = 10;
        cam.center_on(20, 20, 60, 60);
        let (cx, cy) = (cam.x, cam.y);
        // Inside the dead zone: no scroll.
        cam.follow(20, 20, 60, 60);
        assert_eq!((cam.x, cam.y), (cx, cy));
        // Push past the right margin: camera moves.
        cam.follow(cx + 9, 20, 60, 60);
        assert!(cam.x > cx);
    }

    #[test]
    fn world_to_view_rejects_offscreen() {
        let mut cam = Camera2d::new();
        cam.view_w = 8;
        cam.view_h = 8;
        cam.x = 4;
        cam.y = 4;
        assert_eq!(cam.world_to_view(4, 4), Some((0, 0)));
        assert_eq!(cam.world_to_view(11, 11), Some((7, 7)));
        assert_eq!(cam.world_to_view(3, 4), None);
        assert_eq!(cam.world_to_view(12, 4), None);
    }
}
