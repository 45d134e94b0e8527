use proptest::prelude::*;

use cairn_nullables::NullChain;
use cairn_router::{EngineConfig, Router};
use cairn_types::{Address, Elevation, PoolId};

fn router(chain: &NullChain) -> (Router, PoolId) {
    let mut config = EngineConfig::default();
    config.params.unlock_delay_secs = [0; Elevation::COUNT];
    config.params.base_round_duration_secs = 100_000;
    let owner = config.owner();
    let mut router = Router::from_config(&config, chain.now()).unwrap();
    let token = router.register_token(&owner, "ROCK", 100, false).unwrap();
    router
        .add_pool(&owner, &chain.context(), token, Elevation::Plains)
        .unwrap();
    router.rollover(&chain.context(), Elevation::Plains).unwrap();
    (router, PoolId::new(token, Elevation::Plains))
}

proptest! {
    /// Pool totals always equal the sum of positions, and the tax kept by
    /// the router is exactly what withdrawals did not return.
    #[test]
    fn stake_and_tax_are_accounted(
        ops in prop::collection::vec((0usize..3, 1u128..1_000_000, any::<bool>(), 1u64..50), 1..30),
    ) {
        let mut chain = NullChain::new(0, 10);
        let (mut router, pool) = router(&chain);
        let users: Vec<Address> = (0..3).map(|i| Address::new(format!("crn_user{i}"))).collect();
        let mut taxed = 0u128;

        for (who, amount, is_deposit, blocks) in ops {
            let ctx = chain.advance_blocks(blocks);
            let user = &users[who];
            if is_deposit {
                router.deposit(user, &ctx, pool, amount, Some((who % 2) as u8)).unwrap();
            } else {
                let staked = router.staked(user, pool);
                if staked == 0 {
                    continue;
                }
                let receipt = router.withdraw(user, &ctx, pool, amount.min(staked)).unwrap();
                prop_assert_eq!(receipt.amount, receipt.returned + receipt.tax);
                taxed += receipt.tax;
            }
        }

        let total: u128 = users.iter().map(|u| router.staked(u, pool)).sum();
        prop_assert_eq!(router.pool(pool).unwrap().total_staked, total);
        prop_assert_eq!(router.collected_fees(pool.token), taxed);
        let now = chain.now();
        for user in &users {
            prop_assert!(router.claimable_rewards(user, pool, now).is_ok());
        }
    }
}
