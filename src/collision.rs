// Collision resolution for one tick
//
// Pipeline, applied identically for one or two snakes:
// 1. boundary policy on the candidate head (wrap, or die at the wall)
// 2. self-collision against the pre-update body behind the head
// 3. cross-snake collision on the post-move bodies of the snakes still moving,
//    arbitrated by post-move length
//
// A snake removed in step 1 or 2 has no body in step 3.

use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::food::FoodSet;
use crate::grid::Board;
use crate::snake::SnakeEntity;
use crate::types::{Cell, Player};

/// What happens when a head leaves the playable area
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BoundaryPolicy {
    /// Leaving the board is fatal
    ClampAndDie,
    /// Re-enter at the opposite edge
    Wrap,
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case", tag = "cause")]
pub enum DeathCause {
    Wall,
    SelfCollision,
    /// Shorter snake in a cross-snake collision
    LostArbitration { against: Player },
    /// Equal lengths in a cross-snake collision
    Tie { against: Player },
}

/// Outcome of the length comparison between two colliding snakes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arbitration {
    Survivor { winner: Player, loser: Player },
    Tie,
}

/// A snake that is attempting to move this tick
#[derive(Debug, Clone, Copy)]
pub struct MoveCandidate<'a> {
    pub snake: &'a SnakeEntity,
    /// Raw `advance()` result, before the boundary policy
    pub head: Cell,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fate {
    Moves { head: Cell, ate_food: bool },
    Dies(DeathCause),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Verdict {
    pub player: Player,
    pub fate: Fate,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub verdicts: Vec<Verdict>,
    /// Set when a cross-snake collision had a longer survivor
    pub winner: Option<Player>,
}

impl Resolution {
    pub fn verdict_for(&self, player: Player) -> Option<&Verdict> {
        self.verdicts.iter().find(|v| v.player == player)
    }
}

#[derive(Debug, Clone)]
pub struct CollisionResolver {
    board: Board,
    boundary: BoundaryPolicy,
}

impl CollisionResolver {
    pub fn new(board: Board, boundary: BoundaryPolicy) -> Self {
        CollisionResolver { board, boundary }
    }

    pub fn boundary(&self) -> BoundaryPolicy {
        self.boundary
    }

    /// Applies the boundary policy. `None` means the head hit the wall.
    pub fn place_head(&self, head: Cell) -> Option<Cell> {
        if self.board.is_in_bounds(head) {
            return Some(head);
        }
        match self.boundary {
            BoundaryPolicy::ClampAndDie => None,
            BoundaryPolicy::Wrap => Some(self.board.wrap(head)),
        }
    }

    /// Longer body survives; equal lengths remove both
    pub fn arbitrate(a: Player, a_len: usize, b: Player, b_len: usize) -> Arbitration {
        if a_len > b_len {
            Arbitration::Survivor {
                winner: a,
                loser: b,
            }
        } else if b_len > a_len {
            Arbitration::Survivor {
                winner: b,
                loser: a,
            }
        } else {
            Arbitration::Tie
        }
    }

    fn bodies_overlap(a: &[Cell], b: &[Cell]) -> bool {
        let cells: HashSet<&Cell> = a.iter().collect();
        b.iter().any(|c| cells.contains(c))
    }

    pub fn resolve(&self, candidates: &[MoveCandidate<'_>], food: &FoodSet) -> Resolution {
        let mut verdicts: Vec<Verdict> = candidates
            .iter()
            .map(|c| {
                let player = c.snake.player();
                let fate = match self.place_head(c.head) {
                    None => {
                        debug!("{} left the board at {}", player, c.head);
                        Fate::Dies(DeathCause::Wall)
                    }
                    Some(head) if c.snake.hits_trailing_body(head) => {
                        debug!("{} ran into itself at {}", player, head);
                        Fate::Dies(DeathCause::SelfCollision)
                    }
                    Some(head) => Fate::Moves {
                        head,
                        ate_food: food.contains(head),
                    },
                };
                Verdict { player, fate }
            })
            .collect();

        let mut winner = None;

        for i in 0..verdicts.len() {
            for j in (i + 1)..verdicts.len() {
                let (
                    Fate::Moves {
                        head: head_a,
                        ate_food: ate_a,
                    },
                    Fate::Moves {
                        head: head_b,
                        ate_food: ate_b,
                    },
                ) = (verdicts[i].fate, verdicts[j].fate)
                else {
                    continue;
                };

                let body_a = candidates[i].snake.body_after_move(head_a, ate_a);
                let body_b = candidates[j].snake.body_after_move(head_b, ate_b);
                if !Self::bodies_overlap(&body_a, &body_b) {
                    continue;
                }

                let (pa, pb) = (verdicts[i].player, verdicts[j].player);
                match Self::arbitrate(pa, body_a.len(), pb, body_b.len()) {
                    Arbitration::Survivor { winner: w, loser } => {
                        debug!(
                            "{} (len {}) and {} (len {}) collided; {} survives",
                            pa,
                            body_a.len(),
                            pb,
                            body_b.len(),
                            w
                        );
                        let loser_idx = if loser == pa { i } else { j };
                        verdicts[loser_idx].fate =
                            Fate::Dies(DeathCause::LostArbitration { against: w });
                        winner = Some(w);
                    }
                    Arbitration::Tie => {
                        debug!(
                            "{} and {} collided at equal length {}; both removed",
                            pa,
                            pb,
                            body_a.len()
                        );
                        verdicts[i].fate = Fate::Dies(DeathCause::Tie { against: pb });
                        verdicts[j].fate = Fate::Dies(DeathCause::Tie { against: pa });
                    }
                }
            }
        }

        Resolution { verdicts, winner }
    }
}
