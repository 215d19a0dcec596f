use serde::{Deserialize, Deserializer, Serialize};

use crate::constants::{
    get_pursuit_chance, get_sanity_drain, get_sanity_pool, BOARD_SIDE, BOOSTER_CHANCE_PERCENT,
    BOOSTER_SANITY, HEART_CHANCE_PERCENT, HEART_PRICE, HUNT_TRIGGER_MOVES, HUNT_TURNS_MAX,
    HUNT_TURNS_MIN, MIN_SPAWN_DISTANCE, PROXIMITY_PENALTY_PER_HOP, PROXIMITY_RADIUS,
    SCORE_PER_TURN,
};
use crate::powerup::PowerupTable;
use crate::types::Difficulty;

/// Upper bound for every sanity amount and per-turn loss in a rules file.
pub const MAX_SANITY_VALUE: i32 = 10_000;
pub const MAX_PENALTY_PER_HOP: i32 = 100;
pub const MAX_HUNT_TURNS: u32 = 1_000;

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DifficultyProfile {
    pub start_sanity: i32,
    pub respawn_sanity: i32,
    pub base_loss: i32,
    pub hunt_loss: i32,
    pub pursuit_chance: f64,
}

impl DifficultyProfile {
    pub fn for_difficulty(difficulty: Difficulty) -> Self {
        let (start_sanity, respawn_sanity) = get_sanity_pool(difficulty);
        let (base_loss, hunt_loss) = get_sanity_drain(difficulty);
        Self {
            start_sanity,
            respawn_sanity,
            base_loss,
            hunt_loss,
            pursuit_chance: get_pursuit_chance(difficulty),
        }
    }

    fn sanitized(self) -> Self {
        Self {
            start_sanity: self.start_sanity.clamp(1, MAX_SANITY_VALUE),
            respawn_sanity: self.respawn_sanity.clamp(1, MAX_SANITY_VALUE),
            base_loss: self.base_loss.clamp(1, MAX_SANITY_VALUE),
            hunt_loss: self.hunt_loss.clamp(0, MAX_SANITY_VALUE),
            pursuit_chance: if self.pursuit_chance.is_finite() {
                self.pursuit_chance.clamp(0.0, 1.0)
            } else {
                1.0
            },
        }
    }
}

/// A difficulty table as written in a rules file. Fields left out keep the
/// built-in value for that difficulty.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProfileOverrides {
    start_sanity: Option<i32>,
    respawn_sanity: Option<i32>,
    base_loss: Option<i32>,
    hunt_loss: Option<i32>,
    pursuit_chance: Option<f64>,
}

impl ProfileOverrides {
    fn apply_to(self, difficulty: Difficulty) -> DifficultyProfile {
        let base = DifficultyProfile::for_difficulty(difficulty);
        DifficultyProfile {
            start_sanity: self.start_sanity.unwrap_or(base.start_sanity),
            respawn_sanity: self.respawn_sanity.unwrap_or(base.respawn_sanity),
            base_loss: self.base_loss.unwrap_or(base.base_loss),
            hunt_loss: self.hunt_loss.unwrap_or(base.hunt_loss),
            pursuit_chance: self.pursuit_chance.unwrap_or(base.pursuit_chance),
        }
    }
}

fn easy_profile<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<DifficultyProfile, D::Error> {
    ProfileOverrides::deserialize(deserializer).map(|table| table.apply_to(Difficulty::Easy))
}

fn medium_profile<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<DifficultyProfile, D::Error> {
    ProfileOverrides::deserialize(deserializer).map(|table| table.apply_to(Difficulty::Medium))
}

fn hard_profile<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<DifficultyProfile, D::Error> {
    ProfileOverrides::deserialize(deserializer).map(|table| table.apply_to(Difficulty::Hard))
}

/// Every tunable constant of a round. Missing JSON fields fall back to the
/// defaults in `constants`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RoundRules {
    #[serde(deserialize_with = "easy_profile")]
    pub easy: DifficultyProfile,
    #[serde(deserialize_with = "medium_profile")]
    pub medium: DifficultyProfile,
    #[serde(deserialize_with = "hard_profile")]
    pub hard: DifficultyProfile,
    pub score_per_turn: u32,
    pub booster_chance_percent: u32,
    pub heart_chance_percent: u32,
    pub booster_sanity: i32,
    pub hunt_trigger_moves: u32,
    pub hunt_turns_min: u32,
    pub hunt_turns_max: u32,
    pub min_spawn_distance: u32,
    pub heart_price: u64,
    pub proximity_radius: u32,
    pub proximity_penalty_per_hop: i32,
}

impl Default for RoundRules {
    fn default() -> Self {
        Self {
            easy: DifficultyProfile::for_difficulty(Difficulty::Easy),
            medium: DifficultyProfile::for_difficulty(Difficulty::Medium),
            hard: DifficultyProfile::for_difficulty(Difficulty::Hard),
            score_per_turn: SCORE_PER_TURN,
            booster_chance_percent: BOOSTER_CHANCE_PERCENT,
            heart_chance_percent: HEART_CHANCE_PERCENT,
            booster_sanity: BOOSTER_SANITY,
            hunt_trigger_moves: HUNT_TRIGGER_MOVES,
            hunt_turns_min: HUNT_TURNS_MIN,
            hunt_turns_max: HUNT_TURNS_MAX,
            min_spawn_distance: MIN_SPAWN_DISTANCE,
            heart_price: HEART_PRICE,
            proximity_radius: PROXIMITY_RADIUS,
            proximity_penalty_per_hop: PROXIMITY_PENALTY_PER_HOP,
        }
    }
}

impl RoundRules {
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str::<Self>(text).map(Self::sanitized)
    }

    pub fn profile(&self, difficulty: Difficulty) -> &DifficultyProfile {
        match difficulty {
            Difficulty::Easy => &self.easy,
            Difficulty::Medium => &self.medium,
            Difficulty::Hard => &self.hard,
        }
    }

    pub fn powerup_table(&self) -> PowerupTable {
        PowerupTable {
            booster_chance_percent: self.booster_chance_percent,
            heart_chance_percent: self.heart_chance_percent,
            booster_sanity: self.booster_sanity,
        }
    }

    /// Pulls hand-edited values back into ranges the engine relies on:
    /// strictly positive base loss, ordered hunt bounds, percentages <= 100.
    /// Sanity amounts stop at [`MAX_SANITY_VALUE`] and the proximity radius
    /// at the cell count.
    pub fn sanitized(self) -> Self {
        let hunt_turns_min = self.hunt_turns_min.clamp(1, MAX_HUNT_TURNS);
        let cells = u32::from(BOARD_SIDE) * u32::from(BOARD_SIDE);
        Self {
            easy: self.easy.sanitized(),
            medium: self.medium.sanitized(),
            hard: self.hard.sanitized(),
            score_per_turn: self.score_per_turn,
            booster_chance_percent: self.booster_chance_percent.min(100),
            heart_chance_percent: self.heart_chance_percent.min(100),
            booster_sanity: self.booster_sanity.clamp(0, MAX_SANITY_VALUE),
            hunt_trigger_moves: self.hunt_trigger_moves.max(1),
            hunt_turns_min,
            hunt_turns_max: self.hunt_turns_max.clamp(hunt_turns_min, MAX_HUNT_TURNS),
            min_spawn_distance: self.min_spawn_distance,
            heart_price: self.heart_price.max(1),
            proximity_radius: self.proximity_radius.min(cells),
            proximity_penalty_per_hop: self
                .proximity_penalty_per_hop
                .clamp(0, MAX_PENALTY_PER_HOP),
        }
    }
}
