/// Keyboard state tracker.
///
/// Distinguishes two kinds of key input:
///   - held keys, for continuous movement while a key stays down
///   - fresh presses, for edge-triggered actions (swing, turn, menus)
///
/// Terminals that support the kitty keyboard enhancement report Release
/// events; everywhere else a key counts as released once no Press or
/// Repeat has arrived for a short timeout.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crossterm::event::{self, poll, Event, KeyCode, KeyEventKind, KeyModifiers};

/// Without Release events, a key is considered dropped after this long
/// with no Press/Repeat.
const HOLD_TIMEOUT: Duration = Duration::from_millis(160);

pub struct InputState {
    /// Last Press/Repeat timestamp per key.
    held: HashMap<KeyCode, Instant>,
    /// Keys that went from up to down during the latest drain.
    fresh: Vec<KeyCode>,
    ctrl_c: bool,
    /// Honor Release events only when the terminal is known to emit them.
    honor_release: bool,
}

impl InputState {
    pub fn new() -> Self {
        InputState {
            held: HashMap::with_capacity(16),
            fresh: Vec::with_capacity(8),
            ctrl_c: false,
            honor_release: false,
        }
    }

    /// Drain all pending terminal events. Call once per frame, before
    /// the simulation tick.
    pub fn drain_events(&mut self) {
        self.fresh.clear();
        self.ctrl_c = false;

        while poll(Duration::ZERO).unwrap_or(false) {
            let Ok(Event::Key(key)) = event::read() else { continue };

            if key.modifiers.contains(KeyModifiers::CONTROL)
                && matches!(key.code, KeyCode::Char('c') | KeyCode::Char('C'))
            {
                self.ctrl_c = true;
            }

            match key.kind {
                KeyEventKind::Release => {
                    if self.honor_release {
                        self.held.remove(&key.code);
                    }
                    // Otherwise rely on timeout-based expiry.
                }
                _ => {
                    let was_down = self.held_now(key.code);
                    self.held.insert(key.code, Instant::now());
                    if !was_down {
                        self.fresh.push(key.code);
                    }
                }
            }
        }

        let now = Instant::now();
        self.held.retain(|_, t| now.duration_since(*t) < HOLD_TIMEOUT);
    }

    /// Is any of these keys currently down? (continuous actions)
    pub fn any_held(&self, codes: &[KeyCode]) -> bool {
        codes.iter().any(|c| self.held_now(*c))
    }

    /// Was any of these keys freshly pressed this frame? (edge trigger)
    pub fn any_pressed(&self, codes: &[KeyCode]) -> bool {
        codes.iter().any(|c| self.fresh.contains(c))
    }

    pub fn ctrl_c_pressed(&self) -> bool {
        self.ctrl_c
    }

    fn held_now(&self, code: KeyCode) -> bool {
        self.held
            .get(&code)
            .map(|t| t.elapsed() < HOLD_TIMEOUT)
            .unwrap_or(false)
    }
}
