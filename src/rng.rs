//! Seeded PRNG for roleplaying choices (names, details, random loadouts).
//! SplitMix64: same seed produces the same character. Not cryptographically secure.

const SPLITMIX64_GOLDEN: u64 = 0x9e3779b97f4a7c15;
const SPLITMIX64_M1: u64 = 0xbf58476d1ce4e5b9;
const SPLITMIX64_M2: u64 = 0x94d049bb133111eb;

#[derive(Debug, Clone, Copy)]
pub struct Rng {
    state: u64,
}

impl Rng {
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    /// Seeds from OS entropy. Falls back to the clock if entropy is unavailable.
    pub fn from_entropy() -> Self {
        let mut buf = [0_u8; 8];
        let seed = match getrandom::getrandom(&mut buf) {
            Ok(()) => u64::from_le_bytes(buf),
            Err(_) => std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|elapsed| elapsed.as_nanos() as u64)
                .unwrap_or(SPLITMIX64_GOLDEN),
        };
        Self::new(seed)
    }

    #[inline]
    pub fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(SPLITMIX64_GOLDEN);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(SPLITMIX64_M1);
        z = (z ^ (z >> 27)).wrapping_mul(SPLITMIX64_M2);
        z ^ (z >> 31)
    }

    /// Uniform index in `0..bound`. `bound` must be non-zero.
    pub fn below(&mut self, bound: usize) -> usize {
        (self.next_u64() % bound as u64) as usize
    }

    /// Uniform value in the inclusive range `low..=high`.
    pub fn between(&mut self, low: u8, high: u8) -> u8 {
        let span = usize::from(high.saturating_sub(low)) + 1;
        low + self.below(span) as u8
    }

    pub fn coin(&mut self) -> bool {
        self.next_u64() & 1 == 1
    }

    /// True with probability `1 / n`.
    pub fn one_in(&mut self, n: usize) -> bool {
        n > 0 && self.below(n) == 0
    }

    pub fn pick<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        if items.is_empty() {
            None
        } else {
            items.get(self.below(items.len()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splitmix64_deterministic() {
        let mut a = Rng::new(7);
        let mut b = Rng::new(7);
        for _ in 0..100 {
            assert_eq!(a.next_u64(), b.next_u64());
        }
    }

    #[test]
    fn splitmix64_different_seeds_differ() {
        let mut a = Rng::new(1);
        let mut b = Rng::new(2);
        assert_ne!(a.next_u64(), b.next_u64());
    }

    #[test]
    fn between_stays_inside_bounds() {
        let mut rng = Rng::new(11);
        for _ in 0..500 {
            let level = rng.between(1, 20);
            assert!((1..=20).contains(&level));
        }
    }

    #[test]
    fn pick_from_empty_is_none() {
        let mut rng = Rng::new(3);
        let empty: [u8; 0] = [];
        assert!(rng.pick(&empty).is_none());
        assert_eq!(rng.pick(&[42]), Some(&42));
    }
}
