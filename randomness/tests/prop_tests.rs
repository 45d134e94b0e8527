use proptest::prelude::*;

use cairn_randomness::{seal_hash, DrawPolicy, RandomnessCoordinator, RandomnessError};
use cairn_types::{Address, BlockContext, BlockHeight, Elevation, Hash32, Timestamp};

fn ctx(secs: u64, height: u64) -> BlockContext {
    BlockContext::new(Timestamp::new(secs), BlockHeight::new(height), Hash32::new([3; 32]))
}

proptest! {
    /// Any value other than the sealed one is rejected; the sealed one is accepted.
    #[test]
    fn reveal_accepts_only_the_sealed_value(
        value in prop::array::uniform32(0u8..),
        wrong in prop::array::uniform32(0u8..),
        gap in 1u64..1000,
    ) {
        let seeder = Address::new("crn_seeder");
        let value = Hash32::new(value);
        let wrong = Hash32::new(wrong);
        let mut c = RandomnessCoordinator::new(seeder.clone(), 60);
        c.submit_sealed_seed(
            &seeder,
            Elevation::Summit,
            7,
            Timestamp::new(1000),
            seal_hash(&value, &seeder),
            &ctx(990, 10),
        ).unwrap();

        if wrong != value {
            prop_assert_eq!(
                c.submit_unsealed_seed(&seeder, Elevation::Summit, wrong, &ctx(995, 10 + gap)),
                Err(RandomnessError::UnsealedSeedMismatch)
            );
        }
        let reveal_ctx = ctx(995, 10 + gap);
        let revealed = c.submit_unsealed_seed(&seeder, Elevation::Summit, value, &reveal_ctx);
        prop_assert!(revealed.is_ok());
    }

    /// Chance always stays within the configured bounds and is monotone in w1.
    #[test]
    fn chance_bounded_and_monotone(
        w0 in 0u128..1_000_000_000,
        w1 in 0u128..1_000_000_000,
        extra in 0u128..1_000_000,
        min in 0u64..5000,
    ) {
        let policy = DrawPolicy::new(10_000, min);
        let c = policy.totem_zero_chance_bps([w0, w1]);
        prop_assert!(c >= min && c <= 10_000 - min);
        let c2 = policy.totem_zero_chance_bps([w0, w1 + extra]);
        prop_assert!(c2 >= c);
    }

    /// Swapping the weights mirrors the chance.
    #[test]
    fn chance_is_symmetric(w0 in 0u128..1_000_000_000, w1 in 0u128..1_000_000_000) {
        let policy = DrawPolicy::new(10_000, 1000);
        let a = policy.totem_zero_chance_bps([w0, w1]);
        let b = policy.totem_zero_chance_bps([w1, w0]);
        prop_assert_eq!(a + b, 10_000);
    }
}
