use serde::{Deserialize, Serialize};

/// Board cell number, 1-based and row-major.
pub type Position = u8;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "easy" | "1" => Some(Self::Easy),
            "medium" | "2" => Some(Self::Medium),
            "hard" | "3" => Some(Self::Hard),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Medium => "medium",
            Self::Hard => "hard",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GhostMode {
    Patrol,
    Hunting,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GhostTransition {
    HuntStarted { turns: u32 },
    HuntEnded,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PowerupOutcome {
    None,
    Booster { sanity: i32 },
    Heart,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundEndReason {
    SanityDepleted,
    CaughtNoRespawn,
    Abandoned,
}

impl RoundEndReason {
    pub fn key(self) -> &'static str {
        match self {
            Self::SanityDepleted => "sanity_depleted",
            Self::CaughtNoRespawn => "caught_no_respawn",
            Self::Abandoned => "abandoned",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundPhase {
    Playing,
    AwaitingRespawn,
    Ended(RoundEndReason),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Encounter {
    None,
    AwaitingRespawn,
    Caught,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EncounterResolution {
    Respawned {
        sanity: i32,
        #[serde(rename = "ghostPosition")]
        ghost_position: Position,
    },
    CaughtNoRespawn,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TurnOutcome {
    pub turn: u32,
    pub sanity: i32,
    #[serde(rename = "sanityLost")]
    pub sanity_lost: i32,
    pub score: u32,
    #[serde(rename = "playerPosition")]
    pub player_position: Position,
    #[serde(rename = "ghostPosition")]
    pub ghost_position: Position,
    pub hearts: u32,
    pub powerup: PowerupOutcome,
    #[serde(rename = "ghostTransition")]
    pub ghost_transition: Option<GhostTransition>,
    pub encounter: Encounter,
    pub terminal: Option<RoundEndReason>,
}

impl TurnOutcome {
    pub fn is_terminal(&self) -> bool {
        self.terminal.is_some()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RoundView {
    pub position: Position,
    #[serde(rename = "ghostPosition")]
    pub ghost_position: Position,
    pub sanity: i32,
    pub score: u32,
    pub hearts: u32,
    #[serde(rename = "huntMode")]
    pub hunt_mode: bool,
    #[serde(rename = "availableMoves")]
    pub available_moves: Vec<Position>,
    pub turn: u32,
    pub phase: RoundPhase,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RoundEvent {
    PowerupFound {
        turn: u32,
        powerup: PowerupOutcome,
    },
    HuntStarted {
        turn: u32,
        turns: u32,
    },
    HuntEnded {
        turn: u32,
    },
    Encounter {
        turn: u32,
        position: Position,
        #[serde(rename = "heartsAvailable")]
        hearts_available: u32,
    },
    Respawned {
        turn: u32,
        sanity: i32,
        #[serde(rename = "ghostPosition")]
        ghost_position: Position,
    },
    RoundEnded {
        turn: u32,
        reason: RoundEndReason,
    },
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RoundSummary {
    pub difficulty: Difficulty,
    pub reason: Option<RoundEndReason>,
    pub turns: u32,
    pub score: u32,
    pub hearts: u32,
    pub hunts: u32,
    pub boosters: u32,
    #[serde(rename = "heartsFound")]
    pub hearts_found: u32,
    pub respawns: u32,
}

/// Cross-session aggregate for one player.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionStats {
    #[serde(rename = "gamesPlayed", alias = "games_played")]
    pub games_played: u64,
    #[serde(rename = "totalScore", alias = "total_score")]
    pub total_score: u64,
    #[serde(rename = "bestScore", alias = "best_score")]
    pub best_score: u64,
    #[serde(rename = "heartsOfDead", alias = "hearts_of_dead")]
    pub hearts_of_dead: u64,
}

impl SessionStats {
    /// Folds a finished round into the aggregate.
    pub fn record_round(&mut self, score: u32, hearts: u32) {
        let score = score as u64;
        self.games_played = self.games_played.saturating_add(1);
        self.total_score = self.total_score.saturating_add(score);
        self.best_score = self.best_score.max(score);
        self.hearts_of_dead = hearts as u64;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn difficulty_parse_accepts_names_and_menu_numbers() {
        assert_eq!(Difficulty::parse("easy"), Some(Difficulty::Easy));
        assert_eq!(Difficulty::parse(" Medium "), Some(Difficulty::Medium));
        assert_eq!(Difficulty::parse("3"), Some(Difficulty::Hard));
        assert_eq!(Difficulty::parse("nightmare"), None);
        assert_eq!(Difficulty::parse(""), None);
    }

    #[test]
    fn record_round_accumulates_and_snapshots_hearts() {
        let mut stats = SessionStats {
            games_played: 2,
            total_score: 300,
            best_score: 200,
            hearts_of_dead: 4,
        };
        stats.record_round(150, 1);
        assert_eq!(stats.games_played, 3);
        assert_eq!(stats.total_score, 450);
        assert_eq!(stats.best_score, 200);
        assert_eq!(stats.hearts_of_dead, 1);

        stats.record_round(260, 0);
        assert_eq!(stats.best_score, 260);
        assert_eq!(stats.hearts_of_dead, 0);
    }

    #[test]
    fn session_stats_accept_snake_case_fields() {
        let raw = r#"{"games_played":3,"total_score":90,"best_score":50,"hearts_of_dead":1}"#;
        let stats: SessionStats = serde_json::from_str(raw).expect("stats parse");
        assert_eq!(stats.games_played, 3);
        assert_eq!(stats.hearts_of_dead, 1);
    }
}
