use crate::board::Board;
use crate::error::TurnError;
use crate::ghost::{GhostAi, GhostTuning};
use crate::powerup::PowerupTable;
use crate::rng::{RandomSource, Rng};
use crate::rules::{DifficultyProfile, RoundRules};
use crate::types::{
    Difficulty, Encounter, EncounterResolution, GhostTransition, Position, PowerupOutcome,
    RoundEndReason, RoundEvent, RoundPhase, RoundSummary, RoundView, TurnOutcome,
};

mod spawn_system;

#[derive(Clone, Debug, Default)]
pub struct RoundOptions {
    pub player_start: Option<Position>,
    pub ghost_start: Option<Position>,
}

#[derive(Clone, Debug, Default)]
struct RoundCounters {
    hunts: u32,
    boosters: u32,
    hearts_found: u32,
    respawns: u32,
}

/// Authoritative state of a single round.
///
/// All mutation goes through [`RoundState::apply_move`] and
/// [`RoundState::resolve_encounter`]; a rejected call leaves every field as it
/// was.
#[derive(Clone, Debug)]
pub struct RoundState<R: RandomSource = Rng> {
    board: Board,
    rules: RoundRules,
    profile: DifficultyProfile,
    tuning: GhostTuning,
    powerups: PowerupTable,
    rng: R,
    difficulty: Difficulty,

    sanity: i32,
    score: u32,
    hearts: u32,
    player_position: Position,
    ghost_position: Position,
    ghost: GhostAi,
    phase: RoundPhase,
    turn: u32,
    events: Vec<RoundEvent>,
    counters: RoundCounters,
}

impl<R: RandomSource> RoundState<R> {
    pub fn new(
        difficulty: Difficulty,
        hearts: u32,
        rules: RoundRules,
        options: RoundOptions,
        mut rng: R,
    ) -> Self {
        let board = Board::new();
        let rules = rules.sanitized();
        let profile = *rules.profile(difficulty);
        let tuning = GhostTuning {
            pursuit_chance: profile.pursuit_chance,
            hunt_trigger_moves: rules.hunt_trigger_moves,
            hunt_turns_min: rules.hunt_turns_min,
            hunt_turns_max: rules.hunt_turns_max,
        };
        let powerups = rules.powerup_table();

        let player_position = Self::pick_player_spawn(&board, options.player_start, &mut rng);
        let ghost_position = Self::pick_ghost_spawn(
            &board,
            player_position,
            options.ghost_start,
            rules.min_spawn_distance,
            &mut rng,
        );

        tracing::info!(
            difficulty = difficulty.label(),
            sanity = profile.start_sanity,
            hearts,
            player = player_position,
            ghost = ghost_position,
            "round started"
        );

        Self {
            board,
            rules,
            profile,
            tuning,
            powerups,
            rng,
            difficulty,
            sanity: profile.start_sanity,
            score: 0,
            hearts,
            player_position,
            ghost_position,
            ghost: GhostAi::new(),
            phase: RoundPhase::Playing,
            turn: 0,
            events: Vec::new(),
            counters: RoundCounters::default(),
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn ghost(&self) -> &GhostAi {
        &self.ghost
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    pub fn sanity(&self) -> i32 {
        self.sanity
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn hearts(&self) -> u32 {
        self.hearts
    }

    pub fn player_position(&self) -> Position {
        self.player_position
    }

    pub fn ghost_position(&self) -> Position {
        self.ghost_position
    }

    pub fn phase(&self) -> RoundPhase {
        self.phase
    }

    pub fn turn(&self) -> u32 {
        self.turn
    }

    pub fn is_ended(&self) -> bool {
        matches!(self.phase, RoundPhase::Ended(_))
    }

    pub fn end_reason(&self) -> Option<RoundEndReason> {
        match self.phase {
            RoundPhase::Ended(reason) => Some(reason),
            _ => None,
        }
    }

    pub fn available_moves(&self) -> Vec<Position> {
        self.board.neighbors(self.player_position).to_vec()
    }

    /// Resolves one player move: power-up roll, ghost step, sanity drain,
    /// score, then encounter and terminal checks.
    pub fn apply_move(&mut self, requested: Position) -> Result<TurnOutcome, TurnError> {
        match self.phase {
            RoundPhase::Ended(_) => return Err(TurnError::RoundOver),
            RoundPhase::AwaitingRespawn => return Err(TurnError::EncounterPending),
            RoundPhase::Playing => {}
        }
        if !self.board.is_adjacent(self.player_position, requested) {
            return Err(TurnError::InvalidMove {
                from: self.player_position,
                requested,
            });
        }

        self.turn += 1;
        self.player_position = requested;

        let powerup = self.powerups.roll(&mut self.rng);
        match powerup {
            PowerupOutcome::Booster { sanity } => {
                self.sanity = self.sanity.saturating_add(sanity);
                self.counters.boosters += 1;
            }
            PowerupOutcome::Heart => {
                self.hearts = self.hearts.saturating_add(1);
                self.counters.hearts_found += 1;
            }
            PowerupOutcome::None => {}
        }
        if powerup != PowerupOutcome::None {
            self.events.push(RoundEvent::PowerupFound {
                turn: self.turn,
                powerup,
            });
        }

        let step = self.ghost.step(
            &self.board,
            self.ghost_position,
            self.player_position,
            &self.tuning,
            &mut self.rng,
        );
        self.ghost_position = step.position;
        match step.transition {
            Some(GhostTransition::HuntStarted { turns }) => {
                self.counters.hunts += 1;
                self.events.push(RoundEvent::HuntStarted {
                    turn: self.turn,
                    turns,
                });
            }
            Some(GhostTransition::HuntEnded) => {
                self.events.push(RoundEvent::HuntEnded { turn: self.turn });
            }
            None => {}
        }

        let sanity_lost = self.sanity_loss();
        self.sanity = self.sanity.saturating_sub(sanity_lost);
        self.score = self.score.saturating_add(self.rules.score_per_turn);

        let encounter = if self.player_position == self.ghost_position {
            self.events.push(RoundEvent::Encounter {
                turn: self.turn,
                position: self.player_position,
                hearts_available: self.hearts,
            });
            if self.hearts > 0 {
                self.phase = RoundPhase::AwaitingRespawn;
                Encounter::AwaitingRespawn
            } else {
                self.finish(RoundEndReason::CaughtNoRespawn);
                Encounter::Caught
            }
        } else {
            if self.sanity <= 0 {
                self.finish(RoundEndReason::SanityDepleted);
            }
            Encounter::None
        };

        tracing::debug!(
            turn = self.turn,
            player = self.player_position,
            ghost = self.ghost_position,
            sanity = self.sanity,
            sanity_lost,
            score = self.score,
            hunting = self.ghost.is_hunting(),
            "turn resolved"
        );

        Ok(TurnOutcome {
            turn: self.turn,
            sanity: self.sanity.max(0),
            sanity_lost,
            score: self.score,
            player_position: self.player_position,
            ghost_position: self.ghost_position,
            hearts: self.hearts,
            powerup,
            ghost_transition: step.transition,
            encounter,
            terminal: self.end_reason(),
        })
    }

    /// Second phase of an encounter. `respawn == true` spends a heart;
    /// anything else ends the round. Once the round has ended by capture the
    /// answer is always `CaughtNoRespawn`.
    pub fn resolve_encounter(&mut self, respawn: bool) -> Result<EncounterResolution, TurnError> {
        match self.phase {
            RoundPhase::Ended(RoundEndReason::CaughtNoRespawn) => {
                Ok(EncounterResolution::CaughtNoRespawn)
            }
            RoundPhase::Ended(_) => Err(TurnError::RoundOver),
            RoundPhase::Playing => Err(TurnError::NoPendingEncounter),
            RoundPhase::AwaitingRespawn => {
                if !respawn || self.hearts == 0 {
                    self.finish(RoundEndReason::CaughtNoRespawn);
                    return Ok(EncounterResolution::CaughtNoRespawn);
                }

                self.hearts -= 1;
                self.sanity = self.profile.respawn_sanity;
                let ghost_position = self.respawn_ghost();
                self.phase = RoundPhase::Playing;
                self.counters.respawns += 1;
                self.events.push(RoundEvent::Respawned {
                    turn: self.turn,
                    sanity: self.sanity,
                    ghost_position,
                });
                tracing::info!(
                    turn = self.turn,
                    sanity = self.sanity,
                    hearts = self.hearts,
                    ghost = ghost_position,
                    "player respawned"
                );
                Ok(EncounterResolution::Respawned {
                    sanity: self.sanity,
                    ghost_position,
                })
            }
        }
    }

    /// Ends a round the driver stopped playing. No-op once ended.
    pub fn abandon(&mut self) {
        if !self.is_ended() {
            self.finish(RoundEndReason::Abandoned);
        }
    }

    pub fn current_view(&self) -> RoundView {
        RoundView {
            position: self.player_position,
            ghost_position: self.ghost_position,
            sanity: self.sanity.max(0),
            score: self.score,
            hearts: self.hearts,
            hunt_mode: self.ghost.is_hunting(),
            available_moves: self.available_moves(),
            turn: self.turn,
            phase: self.phase,
        }
    }

    pub fn drain_events(&mut self) -> Vec<RoundEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn summary(&self) -> RoundSummary {
        RoundSummary {
            difficulty: self.difficulty,
            reason: self.end_reason(),
            turns: self.turn,
            score: self.score,
            hearts: self.hearts,
            hunts: self.counters.hunts,
            boosters: self.counters.boosters,
            hearts_found: self.counters.hearts_found,
            respawns: self.counters.respawns,
        }
    }

    fn sanity_loss(&self) -> i32 {
        let mut loss = self.profile.base_loss;
        if self.ghost.is_hunting() {
            loss = loss.saturating_add(self.profile.hunt_loss);
        }
        if self.rules.proximity_penalty_per_hop > 0 {
            let distance = self
                .board
                .distance(self.player_position, self.ghost_position)
                .unwrap_or(u32::MAX);
            if distance < self.rules.proximity_radius {
                let hops_inside =
                    i32::try_from(self.rules.proximity_radius - distance).unwrap_or(i32::MAX);
                loss = loss.saturating_add(
                    hops_inside.saturating_mul(self.rules.proximity_penalty_per_hop),
                );
            }
        }
        loss
    }

    fn finish(&mut self, reason: RoundEndReason) {
        self.phase = RoundPhase::Ended(reason);
        self.events.push(RoundEvent::RoundEnded {
            turn: self.turn,
            reason,
        });
        tracing::info!(
            turn = self.turn,
            reason = reason.key(),
            score = self.score,
            hearts = self.hearts,
            "round ended"
        );
    }
}
