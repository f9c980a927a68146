// Copyright 2025 Fernando Borretti
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

/// A minimal, zero-dependency, completely insecure PRNG. Sessions take one
/// explicitly, so the same seed always yields the same ordering.
#[derive(Clone, Debug)]
pub struct TinyRng {
    state: u64,
}

const A: u64 = 6364136223846793005;
const C: u64 = 1442695040888963407;

impl TinyRng {
    /// Initialize the RNG from a seed.
    pub fn from_seed(seed: u64) -> Self {
        Self { state: seed }
    }

    /// Seed from the wall clock.
    #[cfg(feature = "clock")]
    pub fn from_clock() -> Self {
        let nanos = chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default();
        Self::from_seed(nanos as u64)
    }

    pub fn next_u32(&mut self) -> u32 {
        let new = self.state.wrapping_mul(A).wrapping_add(C);
        self.state = new;
        (new >> 32) as u32
    }

    /// Generate a random number in range [0, max). `max` must be non-zero.
    pub fn generate(&mut self, max: u32) -> u32 {
        self.next_u32() % max
    }

    /// A uniformly chosen index into a slice of length `len`, or `None` if
    /// the slice is empty.
    pub fn index(&mut self, len: usize) -> Option<usize> {
        if len == 0 {
            None
        } else {
            Some(self.generate(len as u32) as usize)
        }
    }
}

/// Fisher-Yates shuffle.
pub fn shuffle<T>(v: Vec<T>, rng: &mut TinyRng) -> Vec<T> {
    let mut v = v;
    for i in (1..v.len()).rev() {
        let j = rng.generate(i as u32 + 1) as usize;
        v.swap(i, j);
    }
    v
}

/// Pick up to `n` elements without replacement.
pub fn sample<T>(v: Vec<T>, n: usize, rng: &mut TinyRng) -> Vec<T> {
    let mut v = shuffle(v, rng);
    v.truncate(n);
    v
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_seed_same_sequence() {
        let mut a = TinyRng::from_seed(42);
        let mut b = TinyRng::from_seed(42);
        for _ in 0..100 {
            assert_eq!(a.next_u32(), b.next_u32());
        }
    }

    #[test]
    fn test_generate_in_range() {
        let mut rng = TinyRng::from_seed(7);
        for _ in 0..1000 {
            assert!(rng.generate(3) < 3);
        }
    }

    #[test]
    fn test_index_of_empty() {
        let mut rng = TinyRng::from_seed(7);
        assert_eq!(rng.index(0), None);
        assert_eq!(rng.index(1), Some(0));
    }

    #[test]
    fn test_shuffle_is_permutation() {
        let mut rng = TinyRng::from_seed(1);
        let mut shuffled = shuffle((0..20).collect::<Vec<_>>(), &mut rng);
        shuffled.sort();
        assert_eq!(shuffled, (0..20).collect::<Vec<_>>());
    }

    #[test]
    fn test_sample() {
        let mut rng = TinyRng::from_seed(3);
        let picked = sample(vec![1, 2, 3, 4, 5], 3, &mut rng);
        assert_eq!(picked.len(), 3);
        let picked = sample(vec![1, 2], 3, &mut rng);
        assert_eq!(picked.len(), 2);
    }
}
