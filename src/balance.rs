// 3.0: wallet state. one AccountBalance per user, one slot per holdable
// asset. accounts come into existence lazily with a fixed USDC grant; the
// engine never tops an account back up.

use crate::types::{minor_units, BalanceAsset, UserId};
use serde::{Deserialize, Serialize};

/// Paper-money grant for a brand-new account, in USDC minor units ($5000.00).
pub const STARTING_USDC: i64 = 500_000;

/// A single asset holding. `amount` is minor units at `decimals`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetBalance {
    #[serde(with = "minor_units")]
    pub amount: i64,
    pub decimals: u32,
}

impl AssetBalance {
    pub fn zero(asset: BalanceAsset) -> Self {
        Self {
            amount: 0,
            decimals: asset.decimals(),
        }
    }
}

/// Full wallet for one user. Fixed shape: every holdable asset has a slot
/// whether or not it has ever been touched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountBalance {
    pub user_id: UserId,
    pub usdc: AssetBalance,
    pub btc: AssetBalance,
    pub eth: AssetBalance,
    pub sol: AssetBalance,
}

impl AccountBalance {
    /// Fresh account with the starting grant.
    pub fn seed(user_id: UserId) -> Self {
        Self {
            user_id,
            usdc: AssetBalance {
                amount: STARTING_USDC,
                decimals: BalanceAsset::Usdc.decimals(),
            },
            btc: AssetBalance::zero(BalanceAsset::Btc),
            eth: AssetBalance::zero(BalanceAsset::Eth),
            sol: AssetBalance::zero(BalanceAsset::Sol),
        }
    }

    pub fn get(&self, asset: BalanceAsset) -> &AssetBalance {
        match asset {
            BalanceAsset::Usdc => &self.usdc,
            BalanceAsset::Btc => &self.btc,
            BalanceAsset::Eth => &self.eth,
            BalanceAsset::Sol => &self.sol,
        }
    }

    pub fn get_mut(&mut self, asset: BalanceAsset) -> &mut AssetBalance {
        match asset {
            BalanceAsset::Usdc => &mut self.usdc,
            BalanceAsset::Btc => &mut self.btc,
            BalanceAsset::Eth => &mut self.eth,
            BalanceAsset::Sol => &mut self.sol,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_grants_usdc_only() {
        let account = AccountBalance::seed(UserId::new("alice"));
        assert_eq!(account.usdc.amount, STARTING_USDC);
        assert_eq!(account.usdc.decimals, 2);
        for asset in [BalanceAsset::Btc, BalanceAsset::Eth, BalanceAsset::Sol] {
            assert_eq!(account.get(asset).amount, 0);
            assert_eq!(account.get(asset).decimals, 4);
        }
    }

    #[test]
    fn get_mut_targets_the_right_slot() {
        let mut account = AccountBalance::seed(UserId::new("alice"));
        account.get_mut(BalanceAsset::Eth).amount = 42;
        assert_eq!(account.eth.amount, 42);
        assert_eq!(account.btc.amount, 0);
    }

    #[test]
    fn balances_serialize_amounts_as_strings() {
        let account = AccountBalance::seed(UserId::new("alice"));
        let json = serde_json::to_value(&account).unwrap();
        assert_eq!(json["userId"], "alice");
        assert_eq!(json["usdc"]["amount"], "500000");
        assert_eq!(json["usdc"]["decimals"], 2);
    }
}
