//! Compact difficulty targets
//!
//! A target is four bytes: three coefficient bytes and an index placing
//! them inside the 32-byte threshold a block hash must stay under.
//! Difficulty is the ratio of the minimum target to the current one,
//! computed in 64-bit floats.

use crate::core::Block;
use serde::{Deserialize, Serialize};

pub const TARGET_LEN: usize = 4;

/// Milliseconds of work one sample block is expected to represent
pub const BLOCK_TIME: u64 = 10 * 1000;
/// Retargeting window, in blocks
pub const BLOCK_SAMPLE_SIZE: u64 = 100;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target([u8; TARGET_LEN]);

impl Target {
    /// The minimum-difficulty (maximum) target.
    pub const MIN: Target = Target([0x00, 0xFF, 0xFF, 0x20]);

    pub fn new(bytes: [u8; TARGET_LEN]) -> Target {
        Target(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; TARGET_LEN] {
        &self.0
    }

    // NOTE: Not sure if an index of > 0x20 should be an error.
    fn index(&self) -> u32 {
        std::cmp::min(self.0[3] as u32, 0x20)
    }

    fn coefficient(&self) -> u32 {
        let mut result = 0u32;
        let coefficient_len = TARGET_LEN - 1;
        for i in 0..coefficient_len {
            result |= (self.0[i] as u32) << ((coefficient_len - i - 1) * 8);
        }
        result
    }

    pub fn difficulty(&self) -> f64 {
        let exponent_diff = (8 * (Target::MIN.index() - self.index())) as f64;
        let coefficient_diff = Target::MIN.coefficient() as f64 / self.coefficient() as f64;
        coefficient_diff * exponent_diff.exp2()
    }

    /// Expand to the full 32-byte threshold. Indices that would place the
    /// coefficient outside the hash yield an unreachable all-zero target.
    pub fn expand(&self) -> [u8; 32] {
        let mut full = [0u8; 32];

        let index = self.0[3] as usize;
        if index > 32 {
            return full;
        }

        let start = 32 - index;
        if start > 32 - 3 {
            return full;
        }

        for i in 0..3 {
            full[start + i] = self.0[i];
        }
        full
    }

    /// Bytewise comparison from the most significant end; equality counts
    /// as meeting the target.
    pub fn is_met_by(&self, hash: &[u8; 32]) -> bool {
        let full = self.expand();
        for i in 0..32 {
            if hash[i] < full[i] {
                return true;
            }
            if hash[i] > full[i] {
                return false;
            }
        }
        true
    }

    fn from_difficulty(difficulty: f64) -> Target {
        let exponent = difficulty.log2().round();
        let offset = difficulty / exponent.exp2();

        let index = ((256.0 - exponent) / 8.0) as u8;
        let coefficient = (Target::MIN.coefficient() as f64 / offset) as u32;

        Target([
            (coefficient >> 16) as u8,
            (coefficient >> 8) as u8,
            coefficient as u8,
            index,
        ])
    }
}

fn hash_rate(difficulty: f64, time: u64) -> f64 {
    (difficulty * 256.0 * BLOCK_SAMPLE_SIZE as f64) / time as f64
}

fn difficulty_for_hash_rate(hash_rate: f64) -> f64 {
    (hash_rate * BLOCK_TIME as f64) / 256.0
}

/// Derive the target for the block after `sample_end`, retargeting only on
/// sample boundaries.
pub fn calculate_target(
    sample_start: Option<&Block>,
    sample_end: Option<&Block>,
) -> Target {
    // Without a full sample window, stay at the minimum difficulty
    let (start, end) = match (sample_start, sample_end) {
        (Some(start), Some(end)) => (start, end),
        _ => return Target::MIN,
    };

    // Within the sample range, keep the last target
    if end.id % BLOCK_SAMPLE_SIZE != 0 {
        return end.target;
    }

    let sample_time = end.timestamp - start.timestamp;
    let current_difficulty = end.target.difficulty();
    let current_hash_rate = hash_rate(current_difficulty, sample_time);

    Target::from_difficulty(difficulty_for_hash_rate(current_hash_rate))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand() {
        let mut expected = [0u8; 32];
        expected[0] = 0x00;
        expected[1] = 0xFF;
        expected[2] = 0xFF;
        assert_eq!(Target::MIN.expand(), expected);

        let mut expected = [0u8; 32];
        expected[12] = 0x12;
        expected[13] = 0x34;
        expected[14] = 0x56;
        assert_eq!(Target::new([0x12, 0x34, 0x56, 0x14]).expand(), expected);

        // Coefficient would spill past the end of the hash
        assert_eq!(Target::new([0x12, 0x34, 0x56, 0x02]).expand(), [0u8; 32]);
    }

    #[test]
    fn test_difficulty_round_trip() {
        assert_eq!(Target::MIN.difficulty(), 1.0);
        assert_eq!(Target::from_difficulty(1.0), Target::MIN);

        assert_eq!(Target::new([0x00, 0xFF, 0xFF, 0x1F]).difficulty(), 256.0);
        assert_eq!(
            Target::from_difficulty(256.0),
            Target::new([0x00, 0xFF, 0xFF, 0x1F])
        );

        // NOTE: Not exact, but close enough for retargeting
        assert_eq!(
            Target::new([0x00, 0x12, 0x34, 0x1F]).difficulty(),
            3600.206008583691
        );
        assert_eq!(
            Target::from_difficulty(3600.206008583691),
            Target::new([0x01, 0x23, 0x40, 0x1E])
        );
    }

    #[test]
    fn test_hash_rate_units() {
        assert_eq!(hash_rate(1.0, BLOCK_SAMPLE_SIZE), 256.0);
        assert_eq!(difficulty_for_hash_rate(256.0), BLOCK_TIME as f64);
    }

    #[test]
    fn test_calculate_target_schedule() {
        // No full sample window yet
        assert_eq!(calculate_target(None, None), Target::MIN);

        // Off the sample boundary the last target is kept
        let end = Block {
            id: 101,
            target: Target::new([0x00, 0xFF, 0xFF, 0x1F]),
            ..Block::default()
        };
        assert_eq!(
            calculate_target(Some(&Block::default()), Some(&end)),
            end.target
        );

        // On a boundary the window is re-measured: 100 minimum-difficulty
        // blocks in 1000 seconds imply a 25.6 hash rate and difficulty 1000
        let start = Block::default();
        let end = Block {
            id: 200,
            timestamp: 1000,
            target: Target::MIN,
            ..Block::default()
        };
        assert_eq!(
            calculate_target(Some(&start), Some(&end)),
            Target::new([0x01, 0x06, 0x23, 0x1E])
        );
    }

    #[test]
    fn test_is_met_by_boundaries() {
        let target = Target::MIN;
        let threshold = target.expand();

        assert!(target.is_met_by(&threshold), "equality meets the target");

        let mut below = threshold;
        below[2] = 0xFE;
        assert!(target.is_met_by(&below));

        let mut above = threshold;
        above[3] = 0x01;
        assert!(!target.is_met_by(&above));

        // A spilled coefficient expands to all zeros, unreachable for any
        // non-zero hash
        let mut nonzero = [0u8; 32];
        nonzero[31] = 1;
        assert!(!Target::new([0x12, 0x34, 0x56, 0x02]).is_met_by(&nonzero));
    }
}
