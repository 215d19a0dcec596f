use crate::rng::RandomSource;
use crate::types::PowerupOutcome;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PowerupTable {
    pub booster_chance_percent: u32,
    pub heart_chance_percent: u32,
    pub booster_sanity: i32,
}

impl PowerupTable {
    /// Booster check first; the heart check only runs (with its own draw)
    /// when the booster misses, so one call yields at most one pickup.
    pub fn roll<R: RandomSource + ?Sized>(&self, rng: &mut R) -> PowerupOutcome {
        if rng.int(1, 100) <= self.booster_chance_percent as i32 {
            return PowerupOutcome::Booster {
                sanity: self.booster_sanity,
            };
        }
        if rng.int(1, 100) <= self.heart_chance_percent as i32 {
            return PowerupOutcome::Heart;
        }
        PowerupOutcome::None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::{Rng, ScriptedRng};

    fn table() -> PowerupTable {
        PowerupTable {
            booster_chance_percent: 45,
            heart_chance_percent: 10,
            booster_sanity: 20,
        }
    }

    #[test]
    fn booster_wins_without_drawing_for_heart() {
        // 0.44 -> 45, on the booster threshold
        let mut rng = ScriptedRng::new(&[0.44, 0.0], 0.99);
        assert_eq!(table().roll(&mut rng), PowerupOutcome::Booster { sanity: 20 });
        // the heart draw was never consumed
        assert_eq!(rng.next_f64(), 0.0);
    }

    #[test]
    fn heart_check_uses_second_independent_draw() {
        let mut rng = ScriptedRng::new(&[0.45, 0.09], 0.99);
        assert_eq!(table().roll(&mut rng), PowerupOutcome::Heart);

        let mut rng = ScriptedRng::new(&[0.45, 0.10], 0.99);
        assert_eq!(table().roll(&mut rng), PowerupOutcome::None);
    }

    #[test]
    fn zero_chances_never_yield_pickups() {
        let table = PowerupTable {
            booster_chance_percent: 0,
            heart_chance_percent: 0,
            booster_sanity: 20,
        };
        for seed in 0..200u32 {
            let mut rng = Rng::new(seed);
            assert_eq!(table.roll(&mut rng), PowerupOutcome::None);
        }
    }

    #[test]
    fn seeded_rates_track_configured_chances() {
        let mut rng = Rng::new(2_024);
        let mut boosters = 0;
        let mut hearts = 0;
        let rolls = 20_000;
        for _ in 0..rolls {
            match table().roll(&mut rng) {
                PowerupOutcome::Booster { .. } => boosters += 1,
                PowerupOutcome::Heart => hearts += 1,
                PowerupOutcome::None => {}
            }
        }
        let booster_rate = boosters as f64 / rolls as f64;
        // heart only rolls after a booster miss: 0.55 * 0.10
        let heart_rate = hearts as f64 / rolls as f64;
        assert!((booster_rate - 0.45).abs() < 0.02, "booster rate {booster_rate}");
        assert!((heart_rate - 0.055).abs() < 0.01, "heart rate {heart_rate}");
    }
}
