/// Entry point and game loop.

mod config;
mod domain;
mod sim;
mod ui;

use std::time::{Duration, Instant};

use crossterm::event::KeyCode;
use rand::rngs::ThreadRng;

use config::GameConfig;
use sim::event::GameEvent;
use sim::step::{self, FrameInput, MoveDir, TurnDir};
use sim::world::{Phase, ViewMode, WorldState};
use ui::input::InputState;
use ui::renderer::Renderer;
use ui::sound::SoundEngine;

const FRAME_SLEEP: Duration = Duration::from_millis(5);

fn main() {
    let config = GameConfig::load();

    let mut world = WorldState::new();
    world.speed = config.speed.clone();

    let mut renderer = Renderer::new();
    if let Err(e) = renderer.init() {
        eprintln!("Terminal init failed: {e}");
        return;
    }

    let sound = SoundEngine::new();

    let result = game_loop(&mut world, &mut renderer, sound.as_ref(), &config);

    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }

    if let Err(e) = result {
        eprintln!("Game error: {e}");
    }

    println!();
    println!("Thanks for delving into Mystery Miner!");
    println!("Final Score: {}", world.score);
}

fn game_loop(
    world: &mut WorldState,
    renderer: &mut Renderer,
    sound: Option<&SoundEngine>,
    config: &GameConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut kb = InputState::new();
    let mut rng = rand::thread_rng();
    let projection = config.view.projection();
    let tick_rate = Duration::from_millis(config.speed.tick_rate_ms);
    let mut last_tick = Instant::now();

    // Swings are edge-triggered: a press between ticks must not be lost.
    let mut pending_swing = false;
    let mut pending_turn: Option<TurnDir> = None;

    loop {
        kb.drain_events();

        if kb.ctrl_c_pressed() {
            break;
        }
        if handle_meta(world, &kb, config, &mut rng) {
            break;
        }

        if world.phase == Phase::Playing && !world.paused {
            if kb.any_pressed(KEYS_SWING) {
                pending_swing = true;
            }
            if let Some(t) = detect_turn(&kb, world.view_mode) {
                pending_turn = Some(t);
            }
        }

        if last_tick.elapsed() >= tick_rate {
            if world.paused {
                world.anim_tick = world.anim_tick.wrapping_add(1);
            } else {
                match world.phase {
                    Phase::Playing => {
                        let input = FrameInput {
                            movement: detect_movement(&kb, world),
                            turn: pending_turn.take(),
                            swing: std::mem::take(&mut pending_swing),
                        };
                        let events = step::step(world, input, &mut rng);
                        process_sound_events(sound, world, &events);
                    }
                    Phase::Title => {
                        world.anim_tick = world.anim_tick.wrapping_add(1);
                        if world.message_timer > 0 {
                            world.message_timer -= 1;
                            if world.message_timer == 0 {
                                world.message.clear();
                            }
                        }
                    }
                }
            }
            last_tick = Instant::now();
        }

        renderer.render(world, &projection)?;
        std::thread::sleep(FRAME_SLEEP);
    }

    Ok(())
}

fn process_sound_events(sound: Option<&SoundEngine>, world: &mut WorldState, events: &[GameEvent]) {
    for event in events {
        match event {
            GameEvent::TrapExploded { .. } => world.set_message("BOOM!", 10),
            GameEvent::TrapArmed { .. } => world.set_message("Trap armed! Hit it again!", 15),
            GameEvent::TrapDisarmed { .. } => world.set_message("Trap destroyed", 10),
            _ => {}
        }
    }

    let sfx = match sound {
        Some(s) => s,
        None => return,
    };
    for event in events {
        match event {
            GameEvent::WallBroken { .. } => sfx.play_break(),
            GameEvent::TreasurePicked { .. } => sfx.play_pickup(),
            GameEvent::TrapArmed { .. } => sfx.play_arm(),
            GameEvent::TrapDisarmed { .. } => sfx.play_disarm(),
            GameEvent::TrapExploded { .. } => sfx.play_explosion(),
            _ => {}
        }
    }
}

// ── Key Constants ──

const KEYS_LEFT: &[KeyCode] = &[KeyCode::Left, KeyCode::Char('a'), KeyCode::Char('A')];
const KEYS_RIGHT: &[KeyCode] = &[KeyCode::Right, KeyCode::Char('d'), KeyCode::Char('D')];
const KEYS_UP: &[KeyCode] = &[KeyCode::Up, KeyCode::Char('w'), KeyCode::Char('W')];
const KEYS_DOWN: &[KeyCode] = &[KeyCode::Down, KeyCode::Char('s'), KeyCode::Char('S')];
const KEYS_SWING: &[KeyCode] = &[KeyCode::Char(' ')];
const KEYS_CONFIRM: &[KeyCode] = &[KeyCode::Enter];
const KEYS_NEW_DUNGEON: &[KeyCode] = &[KeyCode::Char('r'), KeyCode::Char('R')];
const KEYS_VIEW_TOGGLE: &[KeyCode] = &[KeyCode::Tab, KeyCode::Char('m'), KeyCode::Char('M')];

/// Movement for the current view mode.
/// Top-down: arrows move absolutely. First-person: up/down walk along
/// the heading (left/right are turns, handled separately).
fn detect_movement(kb: &InputState, world: &WorldState) -> Option<MoveDir> {
    match world.view_mode {
        ViewMode::TopDown => {
            if kb.any_held(KEYS_UP) {
                Some(MoveDir::Up)
            } else if kb.any_held(KEYS_DOWN) {
                Some(MoveDir::Down)
            } else if kb.any_held(KEYS_LEFT) {
                Some(MoveDir::Left)
            } else if kb.any_held(KEYS_RIGHT) {
                Some(MoveDir::Right)
            } else {
                None
            }
        }
        ViewMode::FirstPerson => {
            let forward = kb.any_held(KEYS_UP);
            let backward = kb.any_held(KEYS_DOWN);
            if !forward && !backward {
                return None;
            }
            let (dx, dy) = world.view.facing();
            let (dx, dy) = if forward { (dx, dy) } else { (-dx, -dy) };
            match (dx, dy) {
                (1, 0) => Some(MoveDir::Right),
                (-1, 0) => Some(MoveDir::Left),
                (0, 1) => Some(MoveDir::Down),
                (0, -1) => Some(MoveDir::Up),
                _ => None,
            }
        }
    }
}

fn detect_turn(kb: &InputState, mode: ViewMode) -> Option<TurnDir> {
    if mode != ViewMode::FirstPerson {
        return None;
    }
    if kb.any_pressed(KEYS_LEFT) {
        Some(TurnDir::Left)
    } else if kb.any_pressed(KEYS_RIGHT) {
        Some(TurnDir::Right)
    } else {
        None
    }
}

fn start_new_game(world: &mut WorldState, config: &GameConfig, rng: &mut ThreadRng, mode: ViewMode) {
    world.score = 0;
    world.new_dungeon(config, rng);
    world.view_mode = mode;
    world.phase = Phase::Playing;
    world.paused = false;
    world.set_message("Break walls with SPACE — treasure hides inside", 40);
}

fn return_to_title(world: &mut WorldState) {
    world.phase = Phase::Title;
    world.paused = false;
    world.message.clear();
    world.message_timer = 0;
}

/// Meta keys: title menu, pause, view toggle, regeneration.
/// Returns true to quit.
fn handle_meta(
    world: &mut WorldState,
    kb: &InputState,
    config: &GameConfig,
    rng: &mut ThreadRng,
) -> bool {
    match world.phase {
        Phase::Title => {
            if kb.any_pressed(KEYS_CONFIRM) || kb.any_pressed(&[KeyCode::Char('2')]) {
                start_new_game(world, config, rng, ViewMode::TopDown);
            } else if kb.any_pressed(&[KeyCode::Char('3')]) {
                start_new_game(world, config, rng, ViewMode::FirstPerson);
            } else if kb.any_pressed(&[KeyCode::Char('q'), KeyCode::Char('Q'), KeyCode::Esc]) {
                return true;
            }
        }

        Phase::Playing => {
            if kb.any_pressed(&[KeyCode::F(1)]) {
                world.paused = !world.paused;
                return false;
            }
            if world.paused {
                if kb.any_pressed(&[KeyCode::Esc]) {
                    return_to_title(world);
                }
                return false; // block everything else while paused
            }
            if kb.any_pressed(&[KeyCode::Esc]) {
                return_to_title(world);
            } else if kb.any_pressed(KEYS_VIEW_TOGGLE) {
                world.view_mode = match world.view_mode {
                    ViewMode::TopDown => ViewMode::FirstPerson,
                    ViewMode::FirstPerson => ViewMode::TopDown,
                };
            } else if kb.any_pressed(KEYS_NEW_DUNGEON) {
                let mode = world.view_mode;
                let score = world.score;
                start_new_game(world, config, rng, mode);
                world.score = score; // regeneration keeps the run's score
                world.set_message("New dungeon", 20);
            }
        }
    }

    false
}
