// Food slots and the spawner that keeps them filled
//
// Placement is uniform rejection sampling over playable cells. The board is assumed
// to be large relative to everything occupying it, so the expected number of draws
// is small; the attempt cap only exists to turn a violated assumption into an error
// instead of a hang.

use log::debug;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::{Result, SimError};
use crate::grid::Board;
use crate::types::Cell;

/// Default draws allowed per requested cell before giving up
pub const DEFAULT_SPAWN_ATTEMPT_CAP: u64 = 10_000;

/// Slot table of food positions. `None` marks a slot waiting for respawn.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct FoodSet {
    slots: Vec<Option<Cell>>,
}

impl FoodSet {
    pub fn with_slots(n: usize) -> Self {
        FoodSet {
            slots: vec![None; n],
        }
    }

    /// Builds a food set from explicit slot contents
    pub fn from_slots(slots: Vec<Option<Cell>>) -> Self {
        FoodSet { slots }
    }

    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    pub fn get(&self, slot: usize) -> Option<Cell> {
        self.slots.get(slot).copied().flatten()
    }

    /// Present food cells in slot order
    pub fn cells(&self) -> Vec<Cell> {
        self.slots.iter().flatten().copied().collect()
    }

    pub fn slots(&self) -> &[Option<Cell>] {
        &self.slots
    }

    pub fn slot_of(&self, cell: Cell) -> Option<usize> {
        self.slots.iter().position(|s| *s == Some(cell))
    }

    pub fn contains(&self, cell: Cell) -> bool {
        self.slot_of(cell).is_some()
    }

    /// Empties a slot, returning what was there
    pub fn take(&mut self, slot: usize) -> Option<Cell> {
        self.slots.get_mut(slot).and_then(Option::take)
    }

    pub fn empty_slots(&self) -> Vec<usize> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, s)| s.is_none())
            .map(|(i, _)| i)
            .collect()
    }

    pub fn fill(&mut self, slot: usize, cell: Cell) {
        if let Some(s) = self.slots.get_mut(slot) {
            *s = Some(cell);
        }
    }
}

/// Chooses food cells that avoid the header band, snake bodies and existing food
#[derive(Debug, Clone)]
pub struct FoodSpawner {
    board: Board,
    attempt_cap: u64,
}

impl FoodSpawner {
    pub fn new(board: Board, attempt_cap: u64) -> Self {
        FoodSpawner {
            board,
            attempt_cap: attempt_cap.max(1),
        }
    }

    /// Produces exactly `count` distinct cells, none in `occupied` or `existing_food`
    ///
    /// # Errors
    /// `SimError::FoodSpawnExhausted` once `count * attempt_cap` draws have been rejected.
    pub fn spawn<R: Rng + ?Sized>(
        &self,
        occupied: &HashSet<Cell>,
        existing_food: &HashSet<Cell>,
        count: usize,
        rng: &mut R,
    ) -> Result<Vec<Cell>> {
        let mut produced: Vec<Cell> = Vec::with_capacity(count);
        let budget = self.attempt_cap.saturating_mul(count as u64);
        let mut attempts: u64 = 0;

        while produced.len() < count {
            if attempts >= budget {
                return Err(SimError::FoodSpawnExhausted {
                    requested: count,
                    attempts,
                });
            }
            attempts += 1;

            let candidate = self.board.random_cell(rng);
            if occupied.contains(&candidate)
                || existing_food.contains(&candidate)
                || produced.contains(&candidate)
            {
                continue;
            }
            produced.push(candidate);
        }

        debug!("Spawned {} food cell(s) in {} draw(s)", count, attempts);
        Ok(produced)
    }

    /// Fills every empty slot, returning the (slot, cell) pairs that were placed
    pub fn top_up<R: Rng + ?Sized>(
        &self,
        food: &mut FoodSet,
        occupied: &HashSet<Cell>,
        rng: &mut R,
    ) -> Result<Vec<(usize, Cell)>> {
        let empty = food.empty_slots();
        if empty.is_empty() {
            return Ok(Vec::new());
        }

        let existing: HashSet<Cell> = food.cells().into_iter().collect();
        let cells = self.spawn(occupied, &existing, empty.len(), rng)?;

        let placed: Vec<(usize, Cell)> = empty.into_iter().zip(cells).collect();
        for &(slot, cell) in &placed {
            food.fill(slot, cell);
        }
        Ok(placed)
    }
}
