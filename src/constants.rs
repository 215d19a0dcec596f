use crate::types::Difficulty;

pub const BOARD_SIDE: u8 = 5;

pub const SCORE_PER_TURN: u32 = 10;
pub const BOOSTER_CHANCE_PERCENT: u32 = 45;
pub const HEART_CHANCE_PERCENT: u32 = 10;
pub const BOOSTER_SANITY: i32 = 20;

pub const HUNT_TRIGGER_MOVES: u32 = 5;
pub const HUNT_TURNS_MIN: u32 = 2;
pub const HUNT_TURNS_MAX: u32 = 5;

pub const MIN_SPAWN_DISTANCE: u32 = 4;
pub const HEART_PRICE: u64 = 2_000;

pub const PROXIMITY_RADIUS: u32 = 5;
pub const PROXIMITY_PENALTY_PER_HOP: i32 = 0;

/// (start sanity, respawn sanity)
pub fn get_sanity_pool(difficulty: Difficulty) -> (i32, i32) {
    match difficulty {
        Difficulty::Easy => (100, 50),
        Difficulty::Medium => (70, 35),
        Difficulty::Hard => (50, 25),
    }
}

/// (base loss per turn, extra loss per hunting turn)
pub fn get_sanity_drain(difficulty: Difficulty) -> (i32, i32) {
    match difficulty {
        Difficulty::Easy => (8, 6),
        Difficulty::Medium => (10, 6),
        Difficulty::Hard => (12, 6),
    }
}

/// Chance that a patrolling ghost steps toward the player.
pub fn get_pursuit_chance(difficulty: Difficulty) -> f64 {
    match difficulty {
        Difficulty::Easy => 0.6,
        Difficulty::Medium => 0.8,
        Difficulty::Hard => 1.0,
    }
}
