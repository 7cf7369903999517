//! Body locations for hit placement
//!
//! Four coarse locations, each of which can carry its own armor piece.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Where an attack lands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HitLocation {
    Head,
    /// Center mass, half of all hits land here
    Body,
    Arm,
    Leg,
}

impl HitLocation {
    /// Returns all locations
    pub fn all() -> [HitLocation; 4] {
        [HitLocation::Head, HitLocation::Body, HitLocation::Arm, HitLocation::Leg]
    }

    /// Relative probability of being hit (sums to 1.0)
    pub fn hit_weight(&self) -> f32 {
        match self {
            HitLocation::Head => 0.20,
            HitLocation::Body => 0.50,
            HitLocation::Arm => 0.20,
            HitLocation::Leg => 0.10,
        }
    }

    /// Map a roll in 0..100 onto the cumulative thresholds 20/70/90/100
    pub fn from_roll(roll: u32) -> HitLocation {
        match roll {
            0..=19 => HitLocation::Head,
            20..=69 => HitLocation::Body,
            70..=89 => HitLocation::Arm,
            _ => HitLocation::Leg,
        }
    }

    /// Roll a weighted hit location
    pub fn roll(rng: &mut impl Rng) -> HitLocation {
        HitLocation::from_roll(rng.gen_range(0..100))
    }
}

impl std::fmt::Display for HitLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            HitLocation::Head => "head",
            HitLocation::Body => "body",
            HitLocation::Arm => "arm",
            HitLocation::Leg => "leg",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_weights_sum_to_one() {
        let total: f32 = HitLocation::all().iter().map(|l| l.hit_weight()).sum();
        assert!((total - 1.0).abs() < 0.001);
    }

    #[test]
    fn test_roll_thresholds() {
        assert_eq!(HitLocation::from_roll(0), HitLocation::Head);
        assert_eq!(HitLocation::from_roll(19), HitLocation::Head);
        assert_eq!(HitLocation::from_roll(20), HitLocation::Body);
        assert_eq!(HitLocation::from_roll(69), HitLocation::Body);
        assert_eq!(HitLocation::from_roll(70), HitLocation::Arm);
        assert_eq!(HitLocation::from_roll(89), HitLocation::Arm);
        assert_eq!(HitLocation::from_roll(90), HitLocation::Leg);
        assert_eq!(HitLocation::from_roll(99), HitLocation::Leg);
    }

    #[test]
    fn test_roll_distribution_roughly_matches_weights() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut body = 0;
        let trials = 10_000;
        for _ in 0..trials {
            if HitLocation::roll(&mut rng) == HitLocation::Body {
                body += 1;
            }
        }
        let rate = body as f32 / trials as f32;
        assert!((rate - 0.5).abs() < 0.03, "body rate {}", rate);
    }
}
