//! Unit Conversion Utilities
//!
//! Helpers for GBTC/mojo conversions and formatting.

/// Mojo per GBTC (1 GBTC = 10^12 mojo)
pub const MOJO_PER_GBTC: u64 = 1_000_000_000_000;

const GBTC_DECIMALS: usize = 12;

/// Convert mojo to a GBTC string with full precision (e.g., "0.000000001000")
pub fn mojo_to_gbtc_string(mojo: u64) -> String {
    format!(
        "{}.{:0width$}",
        mojo / MOJO_PER_GBTC,
        mojo % MOJO_PER_GBTC,
        width = GBTC_DECIMALS
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mojo_to_gbtc() {
        assert_eq!(mojo_to_gbtc_string(0), "0.000000000000");
        assert_eq!(mojo_to_gbtc_string(1), "0.000000000001");
        assert_eq!(mojo_to_gbtc_string(MOJO_PER_GBTC), "1.000000000000");
        assert_eq!(mojo_to_gbtc_string(525_000_000_000), "0.525000000000");
    }
}
