//! Stake Value Catalog
//!
//! Static, ordered tiers for the two stake categories. Index 0 is the default
//! (shortest) tier. The catalog is loaded once at startup and handed to the
//! reward and redemption code explicitly.
//!
//! Lookups are total: an out-of-range tier resolves to the null tier
//! `StakeValue(0, "0")`, which accrues no reward.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::path::Path;
use thiserror::Error;

pub const SECONDS_PER_DAY: u64 = 86_400;

/// Coefficients carry at most this many decimal places
pub const COEFFICIENT_DECIMALS: u32 = 8;
pub const COEFFICIENT_SCALE: u128 = 10u128.pow(COEFFICIENT_DECIMALS);

/// Distinct owners considered per stake farm destination
pub const STAKE_FARM_COUNT: usize = 128;

/// Stake category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StakeCategory {
    /// Pooled participation, rewards split pro-rata per destination
    Farm,
    /// Individual time-locked deposit with a fixed per-position reward
    Lock,
}

impl StakeCategory {
    pub fn from_is_farm(is_farm: bool) -> Self {
        if is_farm {
            StakeCategory::Farm
        } else {
            StakeCategory::Lock
        }
    }

    pub fn is_farm(self) -> bool {
        self == StakeCategory::Farm
    }
}

impl std::fmt::Display for StakeCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Farm => write!(f, "farm"),
            Self::Lock => write!(f, "lock"),
        }
    }
}

/// One catalog tier: lock duration and reward coefficient
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakeValue {
    /// Lock duration in seconds
    pub time_lock: u64,
    /// Decimal reward coefficient, e.g. "1.1" or "0.00025"
    pub coefficient: Cow<'static, str>,
}

/// Sentinel returned for tiers the catalog does not define
pub static NULL_TIER: StakeValue = StakeValue {
    time_lock: 0,
    coefficient: Cow::Borrowed("0"),
};

impl StakeValue {
    pub const fn new(time_lock: u64, coefficient: &'static str) -> Self {
        Self {
            time_lock,
            coefficient: Cow::Borrowed(coefficient),
        }
    }

    pub fn is_null(&self) -> bool {
        self.time_lock == 0
    }

    /// Coefficient scaled by `COEFFICIENT_SCALE`, None if unparseable
    pub fn scaled_coefficient(&self) -> Option<u128> {
        parse_coefficient(&self.coefficient)
    }

    /// floor(amount * coefficient)
    pub fn reward_amount(&self, amount: u64) -> u64 {
        let weighted = weighted_amount(amount, &self.coefficient);
        u64::try_from(weighted).unwrap_or(u64::MAX)
    }
}

/// Parse a non-negative decimal string into fixed point (8 decimals)
pub fn parse_coefficient(coefficient: &str) -> Option<u128> {
    let s = coefficient.trim();
    let (whole, frac) = match s.split_once('.') {
        Some((whole, frac)) => (whole, frac),
        None => (s, ""),
    };
    if whole.is_empty() && frac.is_empty() {
        return None;
    }
    if frac.len() > COEFFICIENT_DECIMALS as usize {
        return None;
    }
    if !whole.bytes().all(|b| b.is_ascii_digit()) || !frac.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let whole_value: u128 = if whole.is_empty() { 0 } else { whole.parse().ok()? };
    let frac_value: u128 = if frac.is_empty() { 0 } else { frac.parse().ok()? };
    let frac_scale = 10u128.pow(COEFFICIENT_DECIMALS - frac.len() as u32);

    whole_value
        .checked_mul(COEFFICIENT_SCALE)?
        .checked_add(frac_value * frac_scale)
}

/// floor(amount * coefficient); unparseable coefficients weigh nothing
pub fn weighted_amount(amount: u64, coefficient: &str) -> u128 {
    match parse_coefficient(coefficient) {
        Some(scaled) => amount as u128 * scaled / COEFFICIENT_SCALE,
        None => 0,
    }
}

/// Catalog errors
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read catalog file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse catalog: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("{0} catalog is empty")]
    Empty(StakeCategory),

    #[error("{category} tier {index}: {reason}")]
    InvalidTier {
        category: StakeCategory,
        index: usize,
        reason: String,
    },
}

/// Ordered farm and lock tiers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakeCatalog {
    farm: Vec<StakeValue>,
    lock: Vec<StakeValue>,
}

const DEFAULT_FARM_TIERS: [StakeValue; 9] = [
    StakeValue::new(SECONDS_PER_DAY * 3, "1.0"),
    StakeValue::new(SECONDS_PER_DAY * 10, "1.1"),
    StakeValue::new(SECONDS_PER_DAY * 30, "1.2"),
    StakeValue::new(SECONDS_PER_DAY * 90, "1.4"),
    StakeValue::new(SECONDS_PER_DAY * 180, "1.6"),
    StakeValue::new(SECONDS_PER_DAY * 365, "2.0"),
    StakeValue::new(SECONDS_PER_DAY * 730, "2.5"),
    StakeValue::new(SECONDS_PER_DAY * 1095, "3.0"),
    StakeValue::new(SECONDS_PER_DAY * 1825, "4.0"),
];

const DEFAULT_LOCK_TIERS: [StakeValue; 11] = [
    StakeValue::new(SECONDS_PER_DAY * 3, "0.0002"),
    StakeValue::new(SECONDS_PER_DAY * 30, "0.00025"),
    StakeValue::new(SECONDS_PER_DAY * 90, "0.0003"),
    StakeValue::new(SECONDS_PER_DAY * 180, "0.0004"),
    StakeValue::new(SECONDS_PER_DAY * 365, "0.0005"),
    StakeValue::new(SECONDS_PER_DAY * 730, "0.00053"),
    StakeValue::new(SECONDS_PER_DAY * 1095, "0.00055"),
    StakeValue::new(SECONDS_PER_DAY * 1825, "0.00058"),
    StakeValue::new(SECONDS_PER_DAY * 3650, "0.00062"),
    StakeValue::new(SECONDS_PER_DAY * 7300, "0.00066"),
    StakeValue::new(SECONDS_PER_DAY * 10950, "0.0007"),
];

impl Default for StakeCatalog {
    fn default() -> Self {
        Self {
            farm: DEFAULT_FARM_TIERS.to_vec(),
            lock: DEFAULT_LOCK_TIERS.to_vec(),
        }
    }
}

impl StakeCatalog {
    /// Build and validate a catalog from explicit tier lists
    pub fn new(farm: Vec<StakeValue>, lock: Vec<StakeValue>) -> Result<Self, CatalogError> {
        let catalog = Self { farm, lock };
        catalog.validate()?;
        Ok(catalog)
    }

    /// Parse a TOML catalog with `[[farm]]` and `[[lock]]` tables
    pub fn from_toml_str(s: &str) -> Result<Self, CatalogError> {
        let catalog: StakeCatalog = toml::from_str(s)?;
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, CatalogError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    fn validate(&self) -> Result<(), CatalogError> {
        for category in [StakeCategory::Farm, StakeCategory::Lock] {
            let tiers = self.tiers(category);
            if tiers.is_empty() {
                return Err(CatalogError::Empty(category));
            }

            let mut previous = 0u64;
            for (index, tier) in tiers.iter().enumerate() {
                let invalid = |reason: &str| CatalogError::InvalidTier {
                    category,
                    index,
                    reason: reason.to_string(),
                };
                if tier.time_lock < 1 {
                    return Err(invalid("time lock must be at least 1 second"));
                }
                if tier.time_lock < previous {
                    return Err(invalid("tiers must be ordered by time lock"));
                }
                if tier.scaled_coefficient().is_none() {
                    return Err(invalid("coefficient is not a decimal with at most 8 places"));
                }
                previous = tier.time_lock;
            }
        }
        Ok(())
    }

    /// All tiers of a category, in index order
    pub fn tiers(&self, category: StakeCategory) -> &[StakeValue] {
        match category {
            StakeCategory::Farm => &self.farm,
            StakeCategory::Lock => &self.lock,
        }
    }

    /// Tier lookup; out-of-range indexes yield `NULL_TIER`
    pub fn lookup(&self, category: StakeCategory, tier_index: u16) -> &StakeValue {
        self.tiers(category)
            .get(tier_index as usize)
            .unwrap_or(&NULL_TIER)
    }

    pub fn time_lock(&self, category: StakeCategory, tier_index: u16) -> u64 {
        self.lookup(category, tier_index).time_lock
    }
}
