use serde::Serialize;

use crate::error::LedgerError;
use crate::rules::RoundRules;
use crate::stats_store::StatsLedger;
use crate::types::SessionStats;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum DeclineReason {
    ZeroQuantity,
    InsufficientPoints { affordable: u64 },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ShopOutcome {
    Purchased {
        hearts: u64,
        #[serde(rename = "pointsSpent")]
        points_spent: u64,
    },
    Declined {
        reason: DeclineReason,
    },
}

/// Sells Hearts of the Dead for banked points (`total_score`).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HeartShop {
    price: u64,
}

impl HeartShop {
    pub fn new(price: u64) -> Self {
        Self {
            price: price.max(1),
        }
    }

    pub fn from_rules(rules: &RoundRules) -> Self {
        Self::new(rules.heart_price)
    }

    pub fn price(&self) -> u64 {
        self.price
    }

    /// Hearts the player can afford right now.
    pub fn quote(&self, stats: &SessionStats) -> u64 {
        stats.total_score / self.price
    }

    /// Checks the whole order before touching `stats`; a declined order
    /// leaves them unchanged.
    pub fn purchase(&self, stats: &mut SessionStats, count: u64) -> ShopOutcome {
        if count == 0 {
            return ShopOutcome::Declined {
                reason: DeclineReason::ZeroQuantity,
            };
        }
        let affordable = self.quote(stats);
        if count > affordable {
            return ShopOutcome::Declined {
                reason: DeclineReason::InsufficientPoints { affordable },
            };
        }

        let points_spent = count * self.price;
        stats.total_score -= points_spent;
        stats.hearts_of_dead = stats.hearts_of_dead.saturating_add(count);
        ShopOutcome::Purchased {
            hearts: count,
            points_spent,
        }
    }
}

/// Load, buy, save. Declined orders are not written back.
pub fn purchase_hearts<L: StatsLedger + ?Sized>(
    ledger: &mut L,
    player_name: &str,
    count: u64,
    rules: &RoundRules,
) -> Result<ShopOutcome, LedgerError> {
    let shop = HeartShop::from_rules(rules);
    let mut stats = ledger.load(player_name);
    let outcome = shop.purchase(&mut stats, count);
    match outcome {
        ShopOutcome::Purchased {
            hearts,
            points_spent,
        } => {
            ledger.save(player_name, &stats)?;
            tracing::info!(
                player = player_name,
                hearts,
                points_spent,
                hearts_owned = stats.hearts_of_dead,
                "hearts purchased"
            );
        }
        ShopOutcome::Declined { reason } => {
            tracing::info!(player = player_name, count, ?reason, "heart purchase declined");
        }
    }
    Ok(outcome)
}
