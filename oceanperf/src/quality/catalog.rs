//! Static catalog of quality profiles.
//!
//! Every profile is authored as its own literal; no tier is derived from
//! another. The catalog hands out shared `Arc` references so the controller
//! can publish a profile by swapping a pointer.

use std::sync::{Arc, OnceLock};

use super::profile::QualityProfile;
use super::tier::Tier;

const VERY_LOW: QualityProfile = QualityProfile {
    name: "very-low",
    tier: Some(Tier::VeryLow),
    step_size: 12,
    target_fps: 24,
    effect_intensity: 0.4,
    atmosphere: false,
    reflections: false,
    shimmer: false,
    specular: false,
};

const LOW: QualityProfile = QualityProfile {
    name: "low",
    tier: Some(Tier::Low),
    step_size: 8,
    target_fps: 30,
    effect_intensity: 0.6,
    atmosphere: true,
    reflections: false,
    shimmer: false,
    specular: false,
};

const MEDIUM: QualityProfile = QualityProfile {
    name: "medium",
    tier: Some(Tier::Medium),
    step_size: 6,
    target_fps: 30,
    effect_intensity: 0.8,
    atmosphere: true,
    reflections: true,
    shimmer: false,
    specular: true,
};

const HIGH: QualityProfile = QualityProfile {
    name: "high",
    tier: Some(Tier::High),
    step_size: 4,
    target_fps: 60,
    effect_intensity: 1.0,
    atmosphere: true,
    reflections: true,
    shimmer: true,
    specular: true,
};

const EMERGENCY: QualityProfile = QualityProfile {
    name: "emergency",
    tier: None,
    step_size: 16,
    target_fps: 20,
    effect_intensity: 0.25,
    atmosphere: false,
    reflections: false,
    shimmer: false,
    specular: false,
};

const ULTRA: QualityProfile = QualityProfile {
    name: "ultra",
    tier: None,
    step_size: 3,
    target_fps: 60,
    effect_intensity: 1.2,
    atmosphere: true,
    reflections: true,
    shimmer: true,
    specular: true,
};

struct Profiles {
    ladder: [Arc<QualityProfile>; 4],
    emergency: Arc<QualityProfile>,
    ultra: Arc<QualityProfile>,
}

fn profiles() -> &'static Profiles {
    static PROFILES: OnceLock<Profiles> = OnceLock::new();
    PROFILES.get_or_init(|| Profiles {
        ladder: [
            Arc::new(VERY_LOW),
            Arc::new(LOW),
            Arc::new(MEDIUM),
            Arc::new(HIGH),
        ],
        emergency: Arc::new(EMERGENCY),
        ultra: Arc::new(ULTRA),
    })
}

/// Lookup table from [`Tier`] to [`QualityProfile`].
#[derive(Debug, Clone, Copy, Default)]
pub struct QualityProfileCatalog;

impl QualityProfileCatalog {
    /// Profile for a ladder tier.
    pub fn profile_for(tier: Tier) -> Arc<QualityProfile> {
        let index = match tier {
            Tier::VeryLow => 0,
            Tier::Low => 1,
            Tier::Medium => 2,
            Tier::High => 3,
        };
        Arc::clone(&profiles().ladder[index])
    }

    /// Ladder profiles in ascending tier order.
    pub fn all_profiles() -> Vec<Arc<QualityProfile>> {
        profiles().ladder.iter().map(Arc::clone).collect()
    }

    /// Minimal profile used when initialization fails.
    pub fn emergency() -> Arc<QualityProfile> {
        Arc::clone(&profiles().emergency)
    }

    /// Showcase profile above `High`; never reached by auto-adjustment.
    pub fn ultra() -> Arc<QualityProfile> {
        Arc::clone(&profiles().ultra)
    }

    pub fn very_low() -> Arc<QualityProfile> {
        Self::profile_for(Tier::VeryLow)
    }

    pub fn low() -> Arc<QualityProfile> {
        Self::profile_for(Tier::Low)
    }

    pub fn medium() -> Arc<QualityProfile> {
        Self::profile_for(Tier::Medium)
    }

    pub fn high() -> Arc<QualityProfile> {
        Self::profile_for(Tier::High)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_for_matches_tier() {
        for tier in Tier::ALL {
            assert_eq!(QualityProfileCatalog::profile_for(tier).tier, Some(tier));
        }
    }

    #[test]
    fn test_all_profiles_ordered() {
        let tiers: Vec<_> = QualityProfileCatalog::all_profiles()
            .iter()
            .map(|p| p.tier)
            .collect();
        assert_eq!(
            tiers,
            vec![
                Some(Tier::VeryLow),
                Some(Tier::Low),
                Some(Tier::Medium),
                Some(Tier::High)
            ]
        );
    }

    #[test]
    fn test_lookups_share_instances() {
        let a = QualityProfileCatalog::medium();
        let b = QualityProfileCatalog::profile_for(Tier::Medium);
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_special_profiles_are_off_ladder() {
        assert!(!QualityProfileCatalog::emergency().is_on_ladder());
        assert!(!QualityProfileCatalog::ultra().is_on_ladder());
    }

    #[test]
    fn test_load_increases_with_tier() {
        let loads: Vec<f32> = QualityProfileCatalog::all_profiles()
            .iter()
            .map(|p| p.computational_load())
            .collect();
        assert!(loads.windows(2).all(|w| w[0] < w[1]), "loads: {:?}", loads);
        assert!(
            QualityProfileCatalog::emergency().computational_load() < loads[0],
            "emergency must be the cheapest profile"
        );
        assert!(QualityProfileCatalog::ultra().computational_load() > loads[3]);
    }

    #[test]
    fn test_high_enables_every_layer() {
        let high = QualityProfileCatalog::high();
        assert!(high.atmosphere && high.reflections && high.shimmer && high.specular);
        assert_eq!(high.effects_multiplier(), 1.5);
    }
}
