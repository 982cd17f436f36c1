//! The shared game-state collaborator (spec.md §3, §5): an 8×8 grid, the
//! player's position, and the treasure table. Observed but not owned by
//! the reliability core — movement and file-transfer handlers mutate it
//! through [`SharedGame`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// Grid is `GRID_SIZE x GRID_SIZE`, matching `original_source/treasure_protocol.h`.
pub const GRID_SIZE: usize = 8;

/// Number of treasures placed on the grid.
pub const NUM_TREASURES: usize = 8;

/// A grid coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    pub x: u8,
    pub y: u8,
}

impl Position {
    pub const fn new(x: u8, y: u8) -> Self {
        Position { x, y }
    }
}

/// A movement direction, one per `MOVE_*` frame type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Right,
    Up,
    Down,
    Left,
}

impl Direction {
    /// The offset this direction applies to a position, as `(dx, dy)`.
    fn delta(self) -> (i16, i16) {
        match self {
            Direction::Right => (1, 0),
            Direction::Up => (0, 1),
            Direction::Down => (0, -1),
            Direction::Left => (-1, 0),
        }
    }
}

/// One treasure: its cell, its display/file name, and whether it has
/// been collected yet.
#[derive(Debug, Clone)]
pub struct Treasure {
    pub pos: Position,
    pub name: String,
    pub found: bool,
}

/// Player position, treasure table, and the two visibility grids
/// (spec.md §3's `GameState`).
#[derive(Debug, Clone)]
pub struct GameState {
    pub player: Position,
    pub treasures: [Treasure; NUM_TREASURES],
    visited: [[bool; GRID_SIZE]; GRID_SIZE],
    has_treasure: [[bool; GRID_SIZE]; GRID_SIZE],
}

impl GameState {
    /// An empty game with the player at the origin and no treasures
    /// placed — the client's view before any pickups occur (spec.md
    /// §3's "Lifecycle": client treasure entries populate opportunistically).
    pub fn new_empty() -> Self {
        let mut visited = [[false; GRID_SIZE]; GRID_SIZE];
        visited[0][0] = true;
        GameState {
            player: Position::new(0, 0),
            treasures: std::array::from_fn(|i| Treasure {
                pos: Position::default(),
                name: (i + 1).to_string(),
                found: false,
            }),
            visited,
            has_treasure: [[false; GRID_SIZE]; GRID_SIZE],
        }
    }

    /// A server-side game with treasures placed at `positions` (one per
    /// entry, `positions.len() == NUM_TREASURES`), named `"1".."8"` per
    /// `original_source/treasure_protocol.c:inicializar_jogo`'s `"%d"` scheme.
    pub fn new_with_treasures(positions: [Position; NUM_TREASURES]) -> Self {
        let mut game = Self::new_empty();
        let mut has_treasure = [[false; GRID_SIZE]; GRID_SIZE];
        for pos in &positions {
            has_treasure[pos.y as usize][pos.x as usize] = true;
        }
        for (i, pos) in positions.into_iter().enumerate() {
            game.treasures[i].pos = pos;
        }
        game.has_treasure = has_treasure;
        game
    }

    /// True if `(x, y)` has been visited.
    pub fn is_visited(&self, pos: Position) -> bool {
        self.visited[pos.y as usize][pos.x as usize]
    }

    /// True if `(x, y)` carries a treasure (server-only view; the
    /// client's `has_treasure` grid stays empty by construction).
    pub fn has_treasure_at(&self, pos: Position) -> bool {
        self.has_treasure[pos.y as usize][pos.x as usize]
    }

    /// Applies `direction` to the player's position if the destination
    /// is in-bounds, marking it visited. Returns `false` for an
    /// out-of-bounds move, leaving state untouched — the caller decides
    /// what to do with that (spec.md §4.5's ACK-before-bounds-check note).
    pub fn apply_move(&mut self, direction: Direction) -> bool {
        let (dx, dy) = direction.delta();
        let nx = self.player.x as i16 + dx;
        let ny = self.player.y as i16 + dy;
        if nx < 0 || ny < 0 || nx >= GRID_SIZE as i16 || ny >= GRID_SIZE as i16 {
            return false;
        }
        self.player = Position::new(nx as u8, ny as u8);
        self.visited[self.player.y as usize][self.player.x as usize] = true;
        true
    }

    /// If the player's current cell holds an unfound treasure, returns
    /// its index. Does not mark it found — that happens on transfer
    /// completion via `mark_found` (spec.md §4.6's EOF phase).
    pub fn treasure_at_current(&self) -> Option<usize> {
        self.treasures
            .iter()
            .position(|t| t.pos == self.player && !t.found)
    }

    /// Marks treasure `index` found, at most once (spec.md §3 invariant).
    pub fn mark_found(&mut self, index: usize) {
        if let Some(t) = self.treasures.get_mut(index) {
            t.found = true;
        }
    }

    /// Records the receive-side name for a treasure discovered by the
    /// client (it learns positions only through the move+transfer
    /// protocol, never by direct inspection).
    pub fn record_discovery(&mut self, pos: Position, name: String) -> usize {
        if let Some(existing) = self.treasures.iter().position(|t| t.pos == pos) {
            self.treasures[existing].name = name;
            self.treasures[existing].found = true;
            return existing;
        }
        let slot = self.treasures.iter().position(|t| t.pos == Position::default() && !t.found && t.name.is_empty());
        let slot = slot.unwrap_or_else(|| self.treasures.iter().position(|t| !t.found).unwrap_or(0));
        self.treasures[slot] = Treasure { pos, name, found: true };
        self.has_treasure[pos.y as usize][pos.x as usize] = true;
        slot
    }
}

/// `GameState` behind a mutex, paired with the redraw-pending flag
/// spec.md §4.7/§9 describe: "game mutations go through a dedicated
/// guard that publishes a redraw pending signal."
pub struct SharedGame {
    state: Mutex<GameState>,
    redraw_pending: AtomicBool,
}

impl SharedGame {
    pub fn new(initial: GameState) -> Self {
        SharedGame { state: Mutex::new(initial), redraw_pending: AtomicBool::new(true) }
    }

    /// Runs `f` with exclusive access to the game state, then marks a
    /// redraw pending.
    pub fn mutate<R>(&self, f: impl FnOnce(&mut GameState) -> R) -> R {
        let mut guard = self.state.lock().unwrap();
        let result = f(&mut guard);
        self.redraw_pending.store(true, Ordering::Release);
        result
    }

    /// A snapshot of the current state, taken under the lock, for rendering.
    pub fn snapshot(&self) -> GameState {
        self.state.lock().unwrap().clone()
    }

    /// Drains the redraw-pending flag, returning whether it was set.
    pub fn take_redraw_pending(&self) -> bool {
        self.redraw_pending.swap(false, Ordering::AcqRel)
    }
}
