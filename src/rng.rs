/// Source of uniform draws consumed by the engine.
///
/// Everything random in a round (power-ups, ghost pursuit rolls, hunt length,
/// spawn placement) goes through this trait so a round can be replayed from a
/// seed or scripted in tests.
pub trait RandomSource {
    /// Uniform value in `[0, 1)`.
    fn next_f64(&mut self) -> f64;

    /// Uniform integer in `[min, max]`, both inclusive.
    fn int(&mut self, min: i32, max: i32) -> i32 {
        if max <= min {
            return min;
        }
        let span = (max - min + 1) as f64;
        let offset = (self.next_f64() * span).floor() as i32;
        min + offset.min(max - min)
    }

    fn bool(&mut self, probability: f64) -> bool {
        self.next_f64() < probability
    }

    fn pick_index(&mut self, len: usize) -> usize {
        if len <= 1 {
            return 0;
        }
        ((self.next_f64() * len as f64).floor() as usize).min(len - 1)
    }
}

#[derive(Clone, Debug)]
pub struct Rng {
    seed: u32,
}

impl Rng {
    pub fn new(seed: u32) -> Self {
        Self { seed }
    }
}

impl RandomSource for Rng {
    fn next_f64(&mut self) -> f64 {
        self.seed = self.seed.wrapping_add(0x6d2b79f5);
        let mut t = self.seed;
        t = (t ^ (t >> 15)).wrapping_mul(t | 1);
        t ^= t.wrapping_add((t ^ (t >> 7)).wrapping_mul(t | 61));
        let out = t ^ (t >> 14);
        out as f64 / 4_294_967_296.0
    }
}

impl<R: RandomSource + ?Sized> RandomSource for &mut R {
    fn next_f64(&mut self) -> f64 {
        (**self).next_f64()
    }
}

/// Replays a fixed list of draws, then repeats `fallback` forever.
#[cfg(test)]
#[derive(Clone, Debug)]
pub(crate) struct ScriptedRng {
    values: std::collections::VecDeque<f64>,
    fallback: f64,
}

#[cfg(test)]
impl ScriptedRng {
    pub(crate) fn new(values: &[f64], fallback: f64) -> Self {
        Self {
            values: values.iter().copied().collect(),
            fallback,
        }
    }

    /// Every draw misses: no power-ups, no patrol pursuit below 100%.
    pub(crate) fn unlucky() -> Self {
        Self::new(&[], 0.99)
    }
}

#[cfg(test)]
impl RandomSource for ScriptedRng {
    fn next_f64(&mut self) -> f64 {
        self.values.pop_front().unwrap_or(self.fallback)
    }
}
