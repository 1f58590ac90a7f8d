//! Constrained-random target placement
//!
//! Pick a preferred region uniformly, sample a position inside it, reject it
//! if the target would overlap the exclusion zone, and retry up to
//! [`PLACEMENT_ATTEMPTS`] times. If every attempt is rejected, fall back to a
//! uniform position anywhere inside the margin-shrunk canvas.
//!
//! The fallback does NOT re-check the exclusion zone. That relaxation is what
//! guarantees termination for configurations where every preferred region
//! sits under the obstruction, so keep it.

use glam::Vec2;
use rand::Rng;

use super::geometry::{Rect, rects_overlap};
use crate::config::PlayfieldConfig;
use crate::consts::PLACEMENT_ATTEMPTS;

/// Everything placement needs, borrowed from the playfield config
#[derive(Debug, Clone, Copy)]
pub struct PlacementRules<'a> {
    pub exclusion_zone: Rect,
    pub preferred_regions: &'a [Rect],
    pub canvas: Rect,
    pub target_size: Vec2,
    pub fallback_margin: f32,
    pub max_attempts: u32,
}

impl<'a> PlacementRules<'a> {
    pub fn from_config(config: &'a PlayfieldConfig) -> Self {
        Self {
            exclusion_zone: config.exclusion_zone(),
            preferred_regions: &config.preferred_regions,
            canvas: config.canvas(),
            target_size: config.target_size(),
            fallback_margin: config.fallback_margin,
            max_attempts: PLACEMENT_ATTEMPTS,
        }
    }
}

/// Choose a new top-left position for the target
pub fn place_target<R: Rng + ?Sized>(rng: &mut R, rules: &PlacementRules<'_>) -> Vec2 {
    match sample_preferred(rng, rules) {
        Some(pos) => pos,
        None => {
            log::info!(
                "No clear spot after {} attempts, placing target anywhere",
                rules.max_attempts
            );
            sample_fallback(rng, rules)
        }
    }
}

/// Rejection-sample inside the preferred regions, `None` if the budget runs out
pub fn sample_preferred<R: Rng + ?Sized>(rng: &mut R, rules: &PlacementRules<'_>) -> Option<Vec2> {
    if rules.preferred_regions.is_empty() {
        return None;
    }

    for _ in 0..rules.max_attempts {
        let region = rules.preferred_regions[rng.random_range(0..rules.preferred_regions.len())];
        let pos = Vec2::new(
            region.x + rng.random::<f32>() * (region.w - rules.target_size.x),
            region.y + rng.random::<f32>() * (region.h - rules.target_size.y),
        );

        let target = Rect::from_pos_size(pos, rules.target_size);
        if !rects_overlap(&target, &rules.exclusion_zone) {
            return Some(pos);
        }
    }

    None
}

/// Uniform position inside the canvas shrunk by the fallback margin
pub fn sample_fallback<R: Rng + ?Sized>(rng: &mut R, rules: &PlacementRules<'_>) -> Vec2 {
    let margin = rules.fallback_margin;
    let span_x = (rules.canvas.w - rules.target_size.x - margin * 2.0).max(0.0);
    let span_y = (rules.canvas.h - rules.target_size.y - margin * 2.0).max(0.0);
    Vec2::new(
        rules.canvas.x + margin + rng.random::<f32>() * span_x,
        rules.canvas.y + margin + rng.random::<f32>() * span_y,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_placement_avoids_exclusion_zone() {
        let config = PlayfieldConfig::default();
        let rules = PlacementRules::from_config(&config);
        let mut rng = Pcg32::seed_from_u64(7);

        for _ in 0..1000 {
            let pos = place_target(&mut rng, &rules);
            let target = Rect::from_pos_size(pos, rules.target_size);
            assert!(
                !target.overlaps(&rules.exclusion_zone),
                "target at {pos:?} overlaps the obstruction"
            );
        }
    }

    #[test]
    fn test_placement_stays_in_preferred_regions() {
        let config = PlayfieldConfig::default();
        let rules = PlacementRules::from_config(&config);
        let mut rng = Pcg32::seed_from_u64(11);

        for _ in 0..200 {
            let pos = place_target(&mut rng, &rules);
            let target = Rect::from_pos_size(pos, rules.target_size);
            assert!(
                rules.preferred_regions.iter().any(|r| r.contains(&target)),
                "target at {pos:?} left every preferred region"
            );
        }
    }

    #[test]
    fn test_pathological_config_falls_back() {
        let config = PlayfieldConfig::default();
        let regions = [Rect::new(500.0, 450.0, 200.0, 200.0)];
        let rules = PlacementRules {
            // Covers the whole canvas, so every preferred sample is rejected
            exclusion_zone: config.canvas().expand(10.0),
            preferred_regions: &regions,
            ..PlacementRules::from_config(&config)
        };
        let mut rng = Pcg32::seed_from_u64(3);

        assert_eq!(sample_preferred(&mut rng, &rules), None);

        for _ in 0..100 {
            let pos = place_target(&mut rng, &rules);
            assert!(pos.x >= 50.0 && pos.x <= 1250.0 - 25.0 - 50.0);
            assert!(pos.y >= 50.0 && pos.y <= 875.0 - 35.0 - 50.0);
        }
    }

    #[test]
    fn test_no_regions_goes_straight_to_fallback() {
        let config = PlayfieldConfig::default();
        let rules = PlacementRules {
            preferred_regions: &[],
            ..PlacementRules::from_config(&config)
        };
        let mut rng = Pcg32::seed_from_u64(5);
        let pos = place_target(&mut rng, &rules);
        assert!(pos.x >= 50.0 && pos.y >= 50.0);
    }

    #[test]
    fn test_placement_is_deterministic_per_seed() {
        let config = PlayfieldConfig::default();
        let rules = PlacementRules::from_config(&config);
        let a = place_target(&mut Pcg32::seed_from_u64(99), &rules);
        let b = place_target(&mut Pcg32::seed_from_u64(99), &rules);
        assert_eq!(a, b);
    }
}
