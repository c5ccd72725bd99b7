// One snake: body, committed and pending direction, score

use log::debug;
use serde::{Deserialize, Serialize};

use crate::types::{Cell, Direction, Player};

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct SnakeEntity {
    player: Player,
    /// Head first
    body: Vec<Cell>,
    direction: Direction,
    pending_direction: Direction,
    score: u32,
}

impl SnakeEntity {
    /// Creates a snake whose body trails straight behind the head, away from `direction`
    pub fn new(player: Player, head: Cell, direction: Direction, length: usize) -> Self {
        let back = direction.opposite();
        let mut body = Vec::with_capacity(length.max(1));
        body.push(head);
        for i in 1..length.max(1) {
            let prev = body[i - 1];
            body.push(back.apply(&prev));
        }

        SnakeEntity {
            player,
            body,
            direction,
            pending_direction: direction,
            score: 0,
        }
    }

    /// Creates a snake from an explicit body (head first)
    pub fn from_body(player: Player, body: Vec<Cell>, direction: Direction) -> Self {
        SnakeEntity {
            player,
            body,
            direction,
            pending_direction: direction,
            score: 0,
        }
    }

    pub fn with_score(mut self, score: u32) -> Self {
        self.score = score;
        self
    }

    pub fn player(&self) -> Player {
        self.player
    }

    pub fn body(&self) -> &[Cell] {
        &self.body
    }

    pub fn head(&self) -> Option<Cell> {
        self.body.first().copied()
    }

    pub fn len(&self) -> usize {
        self.body.len()
    }

    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }

    pub fn is_alive(&self) -> bool {
        !self.body.is_empty()
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn pending_direction(&self) -> Direction {
        self.pending_direction
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    /// Records the requested direction; last write before a tick wins
    pub fn set_intent(&mut self, direction: Direction) {
        self.pending_direction = direction;
    }

    /// Commits the pending direction unless it would reverse the snake onto itself
    pub fn resolve_direction(&mut self) {
        if self.pending_direction.is_opposite(self.direction) {
            debug!(
                "{}: ignoring reversal {} -> {}",
                self.player,
                self.direction.as_str(),
                self.pending_direction.as_str()
            );
            return;
        }
        self.direction = self.pending_direction;
    }

    /// Candidate head one step in the committed direction. The body is not touched.
    pub fn advance(&self) -> Option<Cell> {
        self.head().map(|h| self.direction.apply(&h))
    }

    /// True if `cell` lies on the body behind the head
    pub fn hits_trailing_body(&self, cell: Cell) -> bool {
        self.body.iter().skip(1).any(|c| *c == cell)
    }

    /// Body this snake would have after moving its head to `head`
    pub fn body_after_move(&self, head: Cell, ate_food: bool) -> Vec<Cell> {
        let keep = if ate_food {
            self.body.len()
        } else {
            self.body.len().saturating_sub(1)
        };
        let mut next = Vec::with_capacity(keep + 1);
        next.push(head);
        next.extend(self.body.iter().take(keep).copied());
        next
    }

    /// Commits `head` to the front of the body; keeps the tail and scores when food was eaten
    pub fn grow_or_shrink(&mut self, head: Cell, ate_food: bool) {
        self.body.insert(0, head);
        if ate_food {
            self.score += 1;
        } else {
            self.body.pop();
        }
    }

    /// Clears the body. Idempotent.
    pub fn kill(&mut self) {
        self.body.clear();
    }
}
