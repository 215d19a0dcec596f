use crate::board::Board;
use crate::rng::RandomSource;
use crate::types::{GhostMode, GhostTransition, Position};

/// Knobs the ghost reads each turn; resolved from `RoundRules` for the
/// round's difficulty.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GhostTuning {
    pub pursuit_chance: f64,
    pub hunt_trigger_moves: u32,
    pub hunt_turns_min: u32,
    pub hunt_turns_max: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GhostStep {
    pub position: Position,
    pub moved: bool,
    pub transition: Option<GhostTransition>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GhostAi {
    mode: GhostMode,
    hunt_turns_remaining: u32,
    quiet_move_counter: u32,
}

impl Default for GhostAi {
    fn default() -> Self {
        Self::new()
    }
}

impl GhostAi {
    pub fn new() -> Self {
        Self {
            mode: GhostMode::Patrol,
            hunt_turns_remaining: 0,
            quiet_move_counter: 0,
        }
    }

    pub fn mode(&self) -> GhostMode {
        self.mode
    }

    pub fn is_hunting(&self) -> bool {
        self.mode == GhostMode::Hunting
    }

    pub fn hunt_turns_remaining(&self) -> u32 {
        self.hunt_turns_remaining
    }

    pub fn quiet_move_counter(&self) -> u32 {
        self.quiet_move_counter
    }

    /// Advances the ghost by one turn.
    ///
    /// Hunting: always takes the shortest-path step and burns one hunt turn,
    /// dropping back to patrol when none remain.
    ///
    /// Patrol: a single pursuit roll decides whether the ghost steps toward
    /// the player or holds still. Every patrol turn counts as a quiet move;
    /// reaching the trigger count starts a hunt of random length.
    pub fn step<R: RandomSource + ?Sized>(
        &mut self,
        board: &Board,
        ghost: Position,
        player: Position,
        tuning: &GhostTuning,
        rng: &mut R,
    ) -> GhostStep {
        match self.mode {
            GhostMode::Hunting => {
                let next = board.shortest_next_step(ghost, player);
                self.hunt_turns_remaining = self.hunt_turns_remaining.saturating_sub(1);
                let transition = if self.hunt_turns_remaining == 0 {
                    self.mode = GhostMode::Patrol;
                    self.quiet_move_counter = 0;
                    tracing::debug!(ghost = next, "ghost stopped hunting");
                    Some(GhostTransition::HuntEnded)
                } else {
                    None
                };
                GhostStep {
                    position: next,
                    moved: next != ghost,
                    transition,
                }
            }
            GhostMode::Patrol => {
                let next = if rng.bool(tuning.pursuit_chance) {
                    board.shortest_next_step(ghost, player)
                } else {
                    ghost
                };
                self.quiet_move_counter = self.quiet_move_counter.saturating_add(1);

                let transition = if self.quiet_move_counter >= tuning.hunt_trigger_moves {
                    let turns = rng.int(
                        tuning.hunt_turns_min as i32,
                        tuning.hunt_turns_max as i32,
                    ) as u32;
                    self.mode = GhostMode::Hunting;
                    self.hunt_turns_remaining = turns.max(1);
                    self.quiet_move_counter = 0;
                    tracing::debug!(ghost = next, turns, "ghost started hunting");
                    Some(GhostTransition::HuntStarted {
                        turns: self.hunt_turns_remaining,
                    })
                } else {
                    None
                };
                GhostStep {
                    position: next,
                    moved: next != ghost,
                    transition,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::{Rng, ScriptedRng};

    fn tuning(pursuit_chance: f64) -> GhostTuning {
        GhostTuning {
            pursuit_chance,
            hunt_trigger_moves: 5,
            hunt_turns_min: 2,
            hunt_turns_max: 5,
        }
    }

    #[test]
    fn patrol_miss_keeps_ghost_still_but_counts_the_turn() {
        let board = Board::new();
        let mut ai = GhostAi::new();
        let mut rng = ScriptedRng::unlucky();
        let step = ai.step(&board, 13, 1, &tuning(0.6), &mut rng);
        assert_eq!(step.position, 13);
        assert!(!step.moved);
        assert_eq!(step.transition, None);
        assert_eq!(ai.quiet_move_counter(), 1);
    }

    #[test]
    fn patrol_hit_steps_along_shortest_path() {
        let board = Board::new();
        let mut ai = GhostAi::new();
        let mut rng = ScriptedRng::new(&[0.1], 0.99);
        let step = ai.step(&board, 13, 1, &tuning(0.6), &mut rng);
        assert_eq!(step.position, board.shortest_next_step(13, 1));
        assert!(step.moved);
        assert_eq!(board.distance(step.position, 1), Some(3));
    }

    #[test]
    fn hard_pursuit_always_moves() {
        let board = Board::new();
        for seed in 0..100u32 {
            let mut ai = GhostAi::new();
            let mut rng = Rng::new(seed);
            let step = ai.step(&board, 25, 1, &tuning(1.0), &mut rng);
            assert!(step.moved);
        }
    }

    #[test]
    fn fifth_quiet_move_starts_hunt() {
        let board = Board::new();
        for seed in 0..200u32 {
            let mut ai = GhostAi::new();
            let mut rng = Rng::new(seed);
            for _ in 0..4 {
                let step = ai.step(&board, 25, 1, &tuning(0.0), &mut rng);
                assert_eq!(step.transition, None);
                assert!(!ai.is_hunting());
            }
            let step = ai.step(&board, 25, 1, &tuning(0.0), &mut rng);
            let Some(GhostTransition::HuntStarted { turns }) = step.transition else {
                panic!("expected hunt to start, seed={seed}");
            };
            assert!((2..=5).contains(&turns));
            assert!(ai.is_hunting());
            assert_eq!(ai.hunt_turns_remaining(), turns);
            assert_eq!(ai.quiet_move_counter(), 0);
        }
    }

    #[test]
    fn hunt_pursues_every_turn_then_ends() {
        let board = Board::new();
        let mut ai = GhostAi::new();
        // four quiet misses, a fifth miss, then hunt length draw 0.0 -> 2 turns
        let mut rng = ScriptedRng::new(&[0.99, 0.99, 0.99, 0.99, 0.99, 0.0], 0.99);
        let mut ghost = 25;
        for _ in 0..5 {
            ghost = ai.step(&board, ghost, 1, &tuning(0.6), &mut rng).position;
        }
        assert!(ai.is_hunting());
        assert_eq!(ai.hunt_turns_remaining(), 2);
        assert_eq!(ghost, 25);

        let first = ai.step(&board, ghost, 1, &tuning(0.6), &mut rng);
        assert_eq!(first.position, board.shortest_next_step(25, 1));
        assert_eq!(first.transition, None);
        assert!(ai.is_hunting());

        let second = ai.step(&board, first.position, 1, &tuning(0.6), &mut rng);
        assert_eq!(second.position, board.shortest_next_step(first.position, 1));
        assert_eq!(second.transition, Some(GhostTransition::HuntEnded));
        assert_eq!(ai.mode(), GhostMode::Patrol);
        assert_eq!(ai.quiet_move_counter(), 0);
    }

    #[test]
    fn hunting_ghost_does_not_consume_randomness() {
        let board = Board::new();
        let mut ai = GhostAi::new();
        let mut rng = ScriptedRng::new(&[0.99, 0.99, 0.99, 0.99, 0.99, 0.99], 0.5);
        for _ in 0..5 {
            ai.step(&board, 25, 1, &tuning(0.6), &mut rng);
        }
        assert_eq!(ai.hunt_turns_remaining(), 5);
        ai.step(&board, 25, 1, &tuning(0.6), &mut rng);
        assert_eq!(rng.next_f64(), 0.5);
    }
}
