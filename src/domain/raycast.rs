/// First-person raycasting projector — single source of truth for the
/// pseudo-3D view.
///
/// ## Architecture
///
/// A pure function of its inputs, evaluated once per frame:
///
///   {Grid, EventMap, Camera} → Frame (drawable primitives)
///
/// The projector knows nothing about terminals or pixels. It emits
/// rectangles and icons in output-surface units; any 2D drawing surface
/// can rasterize the result. The terminal rasterizer lives in `ui`.
///
/// ## Per-column algorithm
///
/// For column `i` of `rays` across the field of view:
///   1. March the ray in fixed small steps until the first wall cell or
///      out-of-bounds sample (bounds count as a hit) or max depth.
///   2. Hit → distance-shaded wall slice, fisheye-corrected by the cosine
///      of the ray's offset from the view angle, centered on the midline.
///   3. Behind-wall pass: peek one tile past the hit; a floor cell with
///      an event gets a depth-scaled icon sized from half the wall
///      slice's projected height.
///   4. Floor-event pass: keep marching to the first floor cell beyond
///      the wall; an event there becomes a half-height, half-width slice
///      projected at the event's straight-line distance from the camera.
///
/// ## Two distance measures
///
/// Wall slice height uses the raw marched ray distance. Event projection
/// height uses the Euclidean distance from the camera to the event
/// cell's center. These are deliberately different and must not be
/// unified: the marched distance belongs to the wall surface, the
/// Euclidean distance to the object behind it.

use super::event::{Event, EventMap};
use super::tile::Grid;

// ── Colors ──

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Rgb { r, g, b }
    }

    /// Multiply by an intensity in [0, 1].
    pub fn scaled(self, f: f32) -> Rgb {
        let f = f.clamp(0.0, 1.0);
        Rgb {
            r: (self.r as f32 * f) as u8,
            g: (self.g as f32 * f) as u8,
            b: (self.b as f32 * f) as u8,
        }
    }
}

pub const WALL_COLOR: Rgb = Rgb::new(141, 85, 36);
pub const CEILING_COLOR: Rgb = Rgb::new(136, 136, 136);
pub const FLOOR_COLOR: Rgb = Rgb::new(34, 34, 34);
pub const CHEAP_COLOR: Rgb = Rgb::new(255, 224, 102);
pub const EXPENSIVE_COLOR: Rgb = Rgb::new(255, 215, 0);
pub const TRAP_COLOR: Rgb = Rgb::new(162, 89, 198);

// ── Primitives ──

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Shape {
    Circle,
    Diamond,
    Triangle,
}

#[derive(Clone, Copy, PartialEq, Debug)]
pub enum Primitive {
    Rect { x: f32, y: f32, w: f32, h: f32, color: Rgb },
    Icon { shape: Shape, cx: f32, cy: f32, size: f32, color: Rgb },
}

/// One projected frame: an ordered list of primitives in surface units.
/// Later primitives paint over earlier ones.
#[derive(Clone, Debug)]
pub struct Frame {
    pub width: f32,
    pub height: f32,
    pub prims: Vec<Primitive>,
}

// ── Inputs ──

/// Continuous camera: the player's tile center plus a heading.
#[derive(Clone, Copy, Debug)]
pub struct Camera {
    pub x: f32,
    pub y: f32,
    pub angle: f32,
}

impl Camera {
    /// Camera derived from an integer player tile.
    pub fn at_tile(x: i32, y: i32, angle: f32) -> Self {
        Camera {
            x: x as f32 + 0.5,
            y: y as f32 + 0.5,
            angle,
        }
    }
}

/// Projection parameters. Defaults mirror the classic 60° / depth-16
/// configuration; all of them are config-overridable.
#[derive(Clone, Copy, Debug)]
pub struct Projection {
    pub fov: f32,
    pub max_depth: f32,
    /// March increment, as a fraction of a tile. Small enough that a ray
    /// cannot tunnel through a 1-unit cell.
    pub step: f32,
    pub wall_height: f32,
}

impl Default for Projection {
    fn default() -> Self {
        Projection {
            fov: std::f32::consts::PI / 3.0,
            max_depth: 16.0,
            step: 0.03,
            wall_height: 1.0,
        }
    }
}

/// How far past a wall hit the behind-wall pass peeks: one tile, enough
/// to land in the cell on the far side of the struck wall.
const BEHIND_PEEK: f32 = 1.0;

// ── Ray marching ──

#[derive(Clone, Copy, PartialEq, Debug)]
pub struct RayHit {
    /// Raw marched distance along the ray.
    pub dist: f32,
    /// Cell the terminating sample landed in. May be out of bounds when
    /// the ray left the grid (bounds are an implicit wall).
    pub cell: (i32, i32),
}

/// March a ray from (ox, oy) at `angle` until it samples a wall cell or
/// leaves the grid. Returns None when nothing is hit within max depth.
/// The first sample is already one step out, so a hit distance is never
/// zero.
pub fn march(grid: &Grid, ox: f32, oy: f32, angle: f32, p: &Projection) -> Option<RayHit> {
    let (dx, dy) = (angle.cos(), angle.sin());
    let mut dist = 0.0;
    while dist < p.max_depth {
        dist += p.step;
        let cx = (ox + dx * dist).floor() as i32;
        let cy = (oy + dy * dist).floor() as i32;
        if !grid.in_bounds(cx, cy) || grid.at(cx, cy).is_solid() {
            return Some(RayHit { dist, cell: (cx, cy) });
        }
    }
    None
}

/// Fisheye-corrected projected slice height.
///
/// `obliqueness` is the ray's angular offset from the view angle; the
/// cosine projects the raw distance onto the view axis so that a flat
/// wall renders flat instead of bulging at the screen edges.
pub fn projected_height(p: &Projection, dist: f32, obliqueness: f32, screen_h: f32) -> f32 {
    ((p.wall_height / (dist * obliqueness.cos())) * screen_h).min(screen_h)
}

fn event_style(event: Event) -> Option<(Shape, Rgb)> {
    match event {
        Event::None => None,
        Event::CheapTreasure => Some((Shape::Circle, CHEAP_COLOR)),
        Event::ExpensiveTreasure => Some((Shape::Diamond, EXPENSIVE_COLOR)),
        Event::Trap => Some((Shape::Triangle, TRAP_COLOR)),
    }
}

// ── Projection ──

/// Project one frame.
///
/// `rays` is the number of columns; `screen_w`/`screen_h` are the output
/// surface dimensions (the terminal rasterizer passes one ray per
/// column, so column width comes out as 1).
pub fn project(
    grid: &Grid,
    events: &EventMap,
    cam: Camera,
    p: &Projection,
    screen_w: f32,
    screen_h: f32,
    rays: usize,
) -> Frame {
    let mut prims = Vec::with_capacity(rays + 2);

    // Background: ceiling over the top half, floor over the bottom.
    prims.push(Primitive::Rect {
        x: 0.0,
        y: 0.0,
        w: screen_w,
        h: screen_h / 2.0,
        color: CEILING_COLOR,
    });
    prims.push(Primitive::Rect {
        x: 0.0,
        y: screen_h / 2.0,
        w: screen_w,
        h: screen_h / 2.0,
        color: FLOOR_COLOR,
    });

    let col_w = screen_w / rays as f32;

    for i in 0..rays {
        let ray_angle = cam.angle - p.fov / 2.0 + (i as f32 / rays as f32) * p.fov;
        let hit = match march(grid, cam.x, cam.y, ray_angle, p) {
            Some(h) => h,
            None => continue, // background only for this column
        };

        let obliqueness = ray_angle - cam.angle;
        let wall_h = projected_height(p, hit.dist, obliqueness, screen_h);
        let shade = (1.0 - hit.dist / p.max_depth).max(0.0);
        let col_x = i as f32 * col_w;

        prims.push(Primitive::Rect {
            x: col_x,
            y: (screen_h - wall_h) / 2.0,
            w: col_w,
            h: wall_h,
            color: WALL_COLOR.scaled(shade),
        });

        behind_wall_pass(
            grid, events, cam, ray_angle, &hit,
            col_x, col_w, wall_h, screen_h, &mut prims,
        );
        floor_event_pass(
            grid, events, cam, ray_angle, &hit, p,
            obliqueness, col_x, col_w, screen_h, &mut prims,
        );
    }

    Frame { width: screen_w, height: screen_h, prims }
}

/// Peek one tile past the wall hit. A floor cell there (distinct from
/// the struck wall cell) that carries an event gets a small icon sized
/// from half the wall slice's projected height, centered on the screen
/// midline so it reads as layered just behind the slice.
fn behind_wall_pass(
    grid: &Grid,
    events: &EventMap,
    cam: Camera,
    ray_angle: f32,
    hit: &RayHit,
    col_x: f32,
    col_w: f32,
    wall_h: f32,
    screen_h: f32,
    prims: &mut Vec<Primitive>,
) {
    let peek = hit.dist + BEHIND_PEEK;
    let cx = (cam.x + ray_angle.cos() * peek).floor() as i32;
    let cy = (cam.y + ray_angle.sin() * peek).floor() as i32;

    if !grid.in_bounds(cx, cy) || grid.at(cx, cy).is_solid() || (cx, cy) == hit.cell {
        return;
    }
    if let Some((shape, color)) = event_style(events.at(cx, cy)) {
        prims.push(Primitive::Icon {
            shape,
            cx: col_x + col_w / 2.0,
            cy: screen_h / 2.0,
            size: wall_h / 2.0,
            color,
        });
    }
}

/// Independent second march: continue past the wall hit to the first
/// floor cell beyond it. An event there renders as a half-height,
/// half-width wall-like slice at the event's own projected distance —
/// Euclidean, camera to cell center — with its icon on top.
fn floor_event_pass(
    grid: &Grid,
    events: &EventMap,
    cam: Camera,
    ray_angle: f32,
    hit: &RayHit,
    p: &Projection,
    obliqueness: f32,
    col_x: f32,
    col_w: f32,
    screen_h: f32,
    prims: &mut Vec<Primitive>,
) {
    let (dx, dy) = (ray_angle.cos(), ray_angle.sin());
    let mut dist = hit.dist;
    while dist < p.max_depth {
        dist += p.step;
        let cx = (cam.x + dx * dist).floor() as i32;
        let cy = (cam.y + dy * dist).floor() as i32;
        if !grid.in_bounds(cx, cy) {
            return; // left the grid without finding floor
        }
        if grid.at(cx, cy).is_solid() {
            continue;
        }

        // First floor cell beyond the wall: project its event, if any.
        if let Some((shape, color)) = event_style(events.at(cx, cy)) {
            let eu = ((cx as f32 + 0.5 - cam.x).powi(2)
                + (cy as f32 + 0.5 - cam.y).powi(2))
                .sqrt();
            let slice_h = projected_height(p, eu, obliqueness, screen_h) / 2.0;
            let shade = (1.0 - eu / p.max_depth).max(0.0);
            prims.push(Primitive::Rect {
                x: col_x + col_w / 4.0,
                y: (screen_h - slice_h) / 2.0,
                w: col_w / 2.0,
                h: slice_h,
                color: color.scaled(shade),
            });
            prims.push(Primitive::Icon {
                shape,
                cx: col_x + col_w / 2.0,
                cy: screen_h / 2.0,
                size: slice_h / 2.0,
                color,
            });
        }
        return;
    }
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════
