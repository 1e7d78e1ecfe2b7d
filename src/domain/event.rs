/// Wall events: treasures and traps revealed by breaking walls.
///
/// Storage is a sparse map keyed by packed grid coordinate. A key exists
/// only for cells that have ever had a wall broken there — a `None` value
/// is a recorded empty roll, not an absent key. Missing entries read as
/// `None`, never as an error.

use std::collections::HashMap;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum Event {
    #[default]
    None,
    CheapTreasure,
    ExpensiveTreasure,
    Trap,
}

impl Event {
    /// Roll an event from a uniform sample in [0, 1).
    /// Bands: 10% expensive, 30% trap, 30% cheap, 30% nothing.
    pub fn from_roll(roll: f64) -> Event {
        if roll < 0.10 {
            Event::ExpensiveTreasure
        } else if roll < 0.40 {
            Event::Trap
        } else if roll < 0.70 {
            Event::CheapTreasure
        } else {
            Event::None
        }
    }

    pub fn is_treasure(self) -> bool {
        matches!(self, Event::CheapTreasure | Event::ExpensiveTreasure)
    }

    pub fn is_trap(self) -> bool {
        matches!(self, Event::Trap)
    }
}

/// Sparse event storage over the grid.
#[derive(Clone, Debug, Default)]
pub struct EventMap {
    entries: HashMap<(i32, i32), Event>,
}

impl EventMap {
    pub fn new() -> Self {
        EventMap { entries: HashMap::new() }
    }

    /// Event at (x, y). Missing entry = `Event::None`.
    #[inline]
    pub fn at(&self, x: i32, y: i32) -> Event {
        self.entries.get(&(x, y)).copied().unwrap_or(Event::None)
    }

    /// Has a wall ever been broken at (x, y)?
    pub fn recorded(&self, x: i32, y: i32) -> bool {
        self.entries.contains_key(&(x, y))
    }

    pub fn insert(&mut self, x: i32, y: i32, event: Event) {
        self.entries.insert((x, y), event);
    }

    /// Clear the event at (x, y), keeping the key recorded.
    pub fn clear(&mut self, x: i32, y: i32) {
        if let Some(e) = self.entries.get_mut(&(x, y)) {
            *e = Event::None;
        }
    }

    #[allow(dead_code)]
    pub fn iter(&self) -> impl Iterator<Item = (&(i32, i32), &Event)> {
        self.entries.iter()
    }
}
