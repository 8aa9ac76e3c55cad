//! Quality tiers and the profiles they map to.
//!
//! ```text
//! VeryLow ⇄ Low ⇄ Medium ⇄ High        (adjustable ladder)
//! Emergency, Ultra                     (outside the ladder)
//! ```
//!
//! # Example
//!
//! ```
//! use oceanperf::quality::{QualityProfileCatalog, Tier};
//!
//! let profile = QualityProfileCatalog::profile_for(Tier::Low);
//! assert_eq!(profile.tier, Some(Tier::Low));
//! assert_eq!(Tier::Low.upgrade(), Tier::Medium);
//! ```

mod catalog;
mod profile;
mod tier;

pub use catalog::QualityProfileCatalog;
pub use profile::QualityProfile;
pub use tier::{ParseTierError, Tier};
