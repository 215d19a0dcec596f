use crate::engine::{RoundOptions, RoundState};
use crate::error::TurnError;
use crate::rng::{RandomSource, Rng};
use crate::rules::RoundRules;
use crate::stats_store::{sanitize_name, StatsLedger};
use crate::types::{
    Difficulty, EncounterResolution, Position, RoundEvent, RoundSummary, RoundView, SessionStats,
    TurnOutcome,
};

/// A round bound to the player whose stats it will be folded into.
pub struct RoundHandle<R: RandomSource = Rng> {
    player_name: String,
    stats: SessionStats,
    round: RoundState<R>,
}

/// Loads the player's stats and opens a round carrying their hearts.
pub fn start_round<L, R>(
    ledger: &L,
    player_name: &str,
    difficulty: Difficulty,
    rules: RoundRules,
    options: RoundOptions,
    rng: R,
) -> RoundHandle<R>
where
    L: StatsLedger + ?Sized,
    R: RandomSource,
{
    let player_name = sanitize_name(player_name);
    let stats = ledger.load(&player_name);
    let hearts = u32::try_from(stats.hearts_of_dead).unwrap_or(u32::MAX);
    tracing::info!(
        player = %player_name,
        games_played = stats.games_played,
        hearts,
        "loaded player stats"
    );
    let round = RoundState::new(difficulty, hearts, rules, options, rng);
    RoundHandle {
        player_name,
        stats,
        round,
    }
}

impl<R: RandomSource> RoundHandle<R> {
    pub fn player_name(&self) -> &str {
        &self.player_name
    }

    /// Stats as loaded at round start.
    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    pub fn round(&self) -> &RoundState<R> {
        &self.round
    }

    pub fn is_ended(&self) -> bool {
        self.round.is_ended()
    }

    pub fn apply_move(&mut self, requested: Position) -> Result<TurnOutcome, TurnError> {
        self.round.apply_move(requested)
    }

    pub fn resolve_encounter(&mut self, respawn: bool) -> Result<EncounterResolution, TurnError> {
        self.round.resolve_encounter(respawn)
    }

    pub fn current_view(&self) -> RoundView {
        self.round.current_view()
    }

    pub fn drain_events(&mut self) -> Vec<RoundEvent> {
        self.round.drain_events()
    }

    pub fn summary(&self) -> RoundSummary {
        self.round.summary()
    }

    /// Folds the round into the player's stats and persists them. A round
    /// still in play is closed as abandoned first. Save failures are logged
    /// and the updated stats are returned either way.
    pub fn end_round<L: StatsLedger + ?Sized>(mut self, ledger: &mut L) -> SessionStats {
        self.round.abandon();
        let mut stats = self.stats;
        stats.record_round(self.round.score(), self.round.hearts());

        if let Err(error) = ledger.save(&self.player_name, &stats) {
            tracing::warn!(player = %self.player_name, %error, "failed to save player stats");
        }
        stats
    }
}
