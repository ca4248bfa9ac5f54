//! `GasPolicy` (spec.md §3). Mutated only by the Relay Driver, on the
//! out-of-gas retry path; read only by itself — no cross-activity
//! synchronization needed (spec.md §5).
//!
//! Grounded on `executor/core_executor.go::getTransactor` /
//! `IncreaseGas` — `gas_limit` starts from config and is bumped by
//! `gas_increase` each time a submission comes back out-of-gas;
//! `gas_price` falls back to `DefaultGasPrice` (`executor/const.go`, 20
//! Gwei) when the configured price is zero.

pub const DEFAULT_GAS_PRICE: u64 = 20_000_000_000;

#[derive(Clone, Copy, Debug)]
pub struct GasPolicy {
    pub gas_limit: u64,
    pub gas_price: u64,
    pub gas_increment: u64,
}

impl GasPolicy {
    pub fn new(gas_limit: u64, gas_price: u64, gas_increment: u64) -> Self {
        Self {
            gas_limit,
            gas_price,
            gas_increment,
        }
    }

    /// The gas price to submit with: the configured value, or
    /// [`DEFAULT_GAS_PRICE`] if it was left at zero.
    pub fn effective_gas_price(&self) -> u64 {
        if self.gas_price == 0 {
            DEFAULT_GAS_PRICE
        } else {
            self.gas_price
        }
    }

    /// Bumps `gas_limit` on an out-of-gas classification. Monotonically
    /// non-decreasing for the process lifetime (spec.md §3).
    pub fn bump_for_out_of_gas(&mut self) {
        self.gas_limit += self.gas_increment;
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn falls_back_to_default_price_when_unset() {
        let policy = GasPolicy::new(500_000, 0, 100_000);
        assert_eq!(policy.effective_gas_price(), DEFAULT_GAS_PRICE);
    }

    #[test]
    fn keeps_configured_price_when_set() {
        let policy = GasPolicy::new(500_000, 7, 100_000);
        assert_eq!(policy.effective_gas_price(), 7);
    }

    #[test]
    fn out_of_gas_bump_is_monotonic() {
        let mut policy = GasPolicy::new(500_000, 0, 100_000);
        policy.bump_for_out_of_gas();
        assert_eq!(policy.gas_limit, 600_000);
        policy.bump_for_out_of_gas();
        assert_eq!(policy.gas_limit, 700_000);
    }
}
