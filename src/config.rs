/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory (or CWD).
/// Falls back to sensible defaults if the file is missing or incomplete.

use serde::Deserialize;
use std::path::PathBuf;

use crate::domain::raycast::Projection;
use crate::sim::dungeon::DungeonParams;

// ── Public Config Struct ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub dungeon: DungeonConfig,
    pub view: ViewConfig,
    pub speed: SpeedConfig,
}

#[derive(Clone, Debug)]
pub struct DungeonConfig {
    pub width: usize,
    pub height: usize,
    pub room_min: i32,
    pub room_max: i32,
    pub room_attempts: usize,
}

impl DungeonConfig {
    pub fn params(&self) -> DungeonParams {
        DungeonParams {
            room_min: self.room_min,
            room_max: self.room_max,
            room_attempts: self.room_attempts,
        }
    }
}

#[derive(Clone, Debug)]
pub struct ViewConfig {
    pub fov_degrees: f32,
    pub max_depth: f32,
    pub ray_step: f32,
    pub wall_height: f32,
}

impl ViewConfig {
    pub fn projection(&self) -> Projection {
        Projection {
            fov: self.fov_degrees.to_radians(),
            max_depth: self.max_depth,
            step: self.ray_step,
            wall_height: self.wall_height,
        }
    }
}

#[derive(Clone, Debug)]
pub struct SpeedConfig {
    pub tick_rate_ms: u64,
    /// Ticks a held key waits between steps.
    pub player_move_rate: u32,
    /// Ticks between arming a trap and its explosion (~1s at 75ms).
    pub trap_fuse_ticks: u32,
}

impl Default for SpeedConfig {
    fn default() -> Self {
        SpeedConfig {
            tick_rate_ms: default_tick_rate(),
            player_move_rate: default_player_move(),
            trap_fuse_ticks: default_trap_fuse(),
        }
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig::from_toml(TomlConfig::default())
    }
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    dungeon: TomlDungeon,
    #[serde(default)]
    view: TomlView,
    #[serde(default)]
    speed: TomlSpeed,
}

#[derive(Deserialize, Debug)]
struct TomlDungeon {
    #[serde(default = "default_map_width")]
    width: usize,
    #[serde(default = "default_map_height")]
    height: usize,
    #[serde(default = "default_room_min")]
    room_min: i32,
    #[serde(default = "default_room_max")]
    room_max: i32,
    #[serde(default = "default_room_attempts")]
    room_attempts: usize,
}

#[derive(Deserialize, Debug)]
struct TomlView {
    #[serde(default = "default_fov")]
    fov_degrees: f32,
    #[serde(default = "default_max_depth")]
    max_depth: f32,
    #[serde(default = "default_ray_step")]
    ray_step: f32,
    #[serde(default = "default_wall_height")]
    wall_height: f32,
}

#[derive(Deserialize, Debug)]
struct TomlSpeed {
    #[serde(default = "default_tick_rate")]
    tick_rate_ms: u64,
    #[serde(default = "default_player_move")]
    player_move_rate: u32,
    #[serde(default = "default_trap_fuse")]
    trap_fuse_ticks: u32,
}

// ── Defaults ──

fn default_map_width() -> usize { 30 }
fn default_map_height() -> usize { 20 }
fn default_room_min() -> i32 { 4 }
fn default_room_max() -> i32 { 8 }
fn default_room_attempts() -> usize { 18 }

fn default_fov() -> f32 { 60.0 }
fn default_max_depth() -> f32 { 16.0 }
fn default_ray_step() -> f32 { 0.03 }
fn default_wall_height() -> f32 { 1.0 }

fn default_tick_rate() -> u64 { 75 }
fn default_player_move() -> u32 { 2 }
fn default_trap_fuse() -> u32 { 13 }   // ~1s at the 75ms tick

impl Default for TomlDungeon {
    fn default() -> Self {
        TomlDungeon {
            width: default_map_width(),
            height: default_map_height(),
            room_min: default_room_min(),
            room_max: default_room_max(),
            room_attempts: default_room_attempts(),
        }
    }
}

impl Default for TomlView {
    fn default() -> Self {
        TomlView {
            fov_degrees: default_fov(),
            max_depth: default_max_depth(),
            ray_step: default_ray_step(),
            wall_height: default_wall_height(),
        }
    }
}

impl Default for TomlSpeed {
    fn default() -> Self {
        TomlSpeed {
            tick_rate_ms: default_tick_rate(),
            player_move_rate: default_player_move(),
            trap_fuse_ticks: default_trap_fuse(),
        }
    }
}

// ── Loading ──

impl GameConfig {
    /// Load config from `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory.
    /// Missing file or missing keys gracefully fall back to defaults.
    pub fn load() -> Self {
        GameConfig::from_toml(load_toml(&candidate_dirs()))
    }

    fn from_toml(t: TomlConfig) -> Self {
        GameConfig {
            dungeon: DungeonConfig {
                width: t.dungeon.width,
                height: t.dungeon.height,
                room_min: t.dungeon.room_min,
                room_max: t.dungeon.room_max,
                room_attempts: t.dungeon.room_attempts,
            },
            view: ViewConfig {
                fov_degrees: t.view.fov_degrees,
                max_depth: t.view.max_depth,
                ray_step: t.view.ray_step,
                wall_height: t.view.wall_height,
            },
            speed: SpeedConfig {
                tick_rate_ms: t.speed.tick_rate_ms,
                player_move_rate: t.speed.player_move_rate,
                trap_fuse_ticks: t.speed.trap_fuse_ticks,
            },
        }
    }
}

/// Candidate directories to search: exe dir + CWD (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

/// Search for config.toml in candidate directories.
fn load_toml(search_dirs: &[PathBuf]) -> TomlConfig {
    for dir in search_dirs {
        let path = dir.join("config.toml");
        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(text) => match toml::from_str::<TomlConfig>(&text) {
                    Ok(cfg) => return cfg,
                    Err(e) => {
                        eprintln!("Warning: config.toml parse error: {e}");
                        eprintln!("Using default settings.");
                        return TomlConfig::default();
                    }
                },
                Err(e) => {
                    eprintln!("Warning: could not read {}: {e}", path.display());
                }
            }
        }
    }
    TomlConfig::default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_toml_fills_in_defaults() {
        let cfg: TomlConfig = toml::from_str(
            "[dungeon]\nwidth = 44\n\n[speed]\ntrap_fuse_ticks = 20\n",
        )
        .unwrap();
        let cfg = GameConfig::from_toml(cfg);
        assert_eq!(cfg.dungeon.width, 44);
        assert_eq!(cfg.dungeon.height, 20);
        assert_eq!(cfg.speed.trap_fuse_ticks, 20);
        assert_eq!(cfg.speed.tick_rate_ms, 75);
    }

    #[test]
    fn empty_toml_is_all_defaults() {
        let cfg = GameConfig::from_toml(toml::from_str("").unwrap());
        assert_eq!(cfg.dungeon.width, 30);
        assert_eq!(cfg.dungeon.room_attempts, 18);
        assert!((cfg.view.fov_degrees - 60.0).abs() < 1e-6);
    }

    #[test]
    fn projection_converts_degrees_to_radians() {
        let cfg = GameConfig::default();
        let p = cfg.view.projection();
        assert!((p.fov - std::f32::consts::PI / 3.0).abs() < 1e-5);
    }
}
