//! Random transaction payloads.
//!
//! Every type in the model can be drawn from [`Standard`], so any [`Rng`] produces a
//! schema-valid [`Transaction`] with `rng.gen()`.

use std::ops::RangeInclusive;

use rand::distributions::{Distribution, Standard};
use rand::{thread_rng, Rng};

use crate::transaction::{
    Amount, Category, Counterparty, Currency, Origin, Transaction, TransactionType,
};

pub const USER_POOL_SIZE: u32 = 1_000;
pub const MERCHANT_POOL_SIZE: u32 = 100;
pub const TARGET_ACCOUNT_POOL_SIZE: u32 = 1_000;
pub const DEVICE_POOL_SIZE: u32 = 500;
pub const IP_PREFIXES: [&str; 4] = ["192.168.1", "10.0.0", "172.16.0", "203.0.113"];

/// Chance that an amount is drawn from the high-value range instead of the typical one.
pub const HIGH_VALUE_PROBABILITY: f64 = 0.05;

const TYPICAL_CENTS: RangeInclusive<u32> = 1..=500_000;
const HIGH_VALUE_CENTS: RangeInclusive<u32> = 1_000_000..=15_000_000;
const LAST_OCTET: RangeInclusive<u8> = 1..=254;

/// Draws one transaction from the thread-local RNG.
#[must_use]
pub fn generate() -> Transaction {
    thread_rng().gen()
}

/// Draws `size` independent transactions.
#[must_use]
pub fn generate_batch(size: usize) -> Vec<Transaction> {
    let mut rng = thread_rng();
    (0..size).map(|_| rng.gen()).collect()
}

impl Distribution<TransactionType> for Standard {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> TransactionType {
        TransactionType::ALL[rng.gen_range(0..TransactionType::ALL.len())]
    }
}

impl Distribution<Currency> for Standard {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Currency {
        Currency::ALL[rng.gen_range(0..Currency::ALL.len())]
    }
}

impl Distribution<Category> for Standard {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Category {
        Category::ALL[rng.gen_range(0..Category::ALL.len())]
    }
}

impl Distribution<Amount> for Standard {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Amount {
        let cents = if rng.gen_bool(HIGH_VALUE_PROBABILITY) {
            rng.gen_range(HIGH_VALUE_CENTS)
        } else {
            rng.gen_range(TYPICAL_CENTS)
        };
        Amount::from_whole_cents(cents)
    }
}

impl Distribution<Origin> for Standard {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Origin {
        let latitude: f64 = rng.gen_range(-90.0..=90.0);
        let longitude: f64 = rng.gen_range(-180.0..=180.0);
        let prefix = IP_PREFIXES[rng.gen_range(0..IP_PREFIXES.len())];
        Origin {
            location: format!("{latitude},{longitude}"),
            ip_address: format!("{prefix}.{}", rng.gen_range(LAST_OCTET)),
            device_id: format!("device_{}", rng.gen_range(1..=DEVICE_POOL_SIZE)),
        }
    }
}

impl Distribution<Transaction> for Standard {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Transaction {
        let transaction_type: TransactionType = rng.gen();
        let amount: Amount = rng.gen();
        let currency: Currency = rng.gen();
        let category: Category = rng.gen();
        let user_id = format!("user_{}", rng.gen_range(1..=USER_POOL_SIZE));
        let origin: Origin = rng.gen();
        let counterparty = sample_counterparty(transaction_type, rng);
        Transaction::from_parts(
            user_id,
            amount,
            transaction_type,
            currency,
            category,
            origin,
            counterparty,
        )
    }
}

fn sample_counterparty<R: Rng + ?Sized>(
    transaction_type: TransactionType,
    rng: &mut R,
) -> Option<Counterparty> {
    if transaction_type.requires_target_account() {
        let account = rng.gen_range(1..=TARGET_ACCOUNT_POOL_SIZE);
        Some(Counterparty::TargetAccount(format!("account_{account}")))
    } else if transaction_type.requires_merchant() {
        let merchant = rng.gen_range(1..=MERCHANT_POOL_SIZE);
        Some(Counterparty::Merchant(format!("merchant_{merchant}")))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use rust_decimal::Decimal;

    use super::*;
    use crate::transaction::NUM_DECIMAL_PLACES;

    fn pool_index(id: &str, prefix: &str) -> u32 {
        id.strip_prefix(prefix).unwrap().parse().unwrap()
    }

    #[test]
    fn test_generated_transactions_are_valid() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..10_000 {
            let tx: Transaction = rng.gen();
            let amount = tx.amount().value();
            assert!(amount > Decimal::ZERO);
            assert_eq!(amount.scale(), NUM_DECIMAL_PLACES);

            let tx_type = tx.transaction_type();
            assert!(TransactionType::ALL.contains(&tx_type));
            assert_eq!(tx.target_account_id().is_some(), tx_type == TransactionType::Transfer);
            assert_eq!(
                tx.merchant_id().is_some(),
                matches!(tx_type, TransactionType::Payment | TransactionType::Refund)
            );
            assert!(!(tx.target_account_id().is_some() && tx.merchant_id().is_some()));
        }
    }

    #[test]
    fn test_amount_ranges() {
        let mut rng = StdRng::seed_from_u64(11);
        let typical_max = Decimal::new(500_000, NUM_DECIMAL_PLACES);
        let high_min = Decimal::new(1_000_000, NUM_DECIMAL_PLACES);
        let high_max = Decimal::new(15_000_000, NUM_DECIMAL_PLACES);
        for _ in 0..10_000 {
            let amount: Amount = rng.gen();
            let value = amount.value();
            if amount.is_high_value() {
                assert!(value >= high_min && value <= high_max);
            } else {
                assert!(value <= typical_max);
            }
        }
    }

    #[test]
    fn test_high_value_share() {
        let mut rng = StdRng::seed_from_u64(42);
        let samples: u32 = 100_000;
        let high_value = (0..samples)
            .map(|_| rng.gen::<Transaction>())
            .filter(Transaction::is_high_value)
            .count();
        #[allow(clippy::cast_precision_loss)]
        let share = high_value as f64 / f64::from(samples);
        assert!((share - HIGH_VALUE_PROBABILITY).abs() < 0.005, "share was {share}");
    }

    #[test]
    fn test_pools_and_bounds() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..5_000 {
            let tx: Transaction = rng.gen();
            assert!((1..=USER_POOL_SIZE).contains(&pool_index(tx.user_id(), "user_")));

            let origin = tx.origin();
            assert!((1..=DEVICE_POOL_SIZE).contains(&pool_index(&origin.device_id, "device_")));

            let (prefix, octet) = origin.ip_address.rsplit_once('.').unwrap();
            assert!(IP_PREFIXES.contains(&prefix));
            let octet: u8 = octet.parse().unwrap();
            assert!(LAST_OCTET.contains(&octet));

            let (latitude, longitude) = origin.location.split_once(',').unwrap();
            let latitude: f64 = latitude.parse().unwrap();
            let longitude: f64 = longitude.parse().unwrap();
            assert!((-90.0..=90.0).contains(&latitude));
            assert!((-180.0..=180.0).contains(&longitude));

            if let Some(account) = tx.target_account_id() {
                assert!((1..=TARGET_ACCOUNT_POOL_SIZE).contains(&pool_index(account, "account_")));
            }
            if let Some(merchant) = tx.merchant_id() {
                assert!((1..=MERCHANT_POOL_SIZE).contains(&pool_index(merchant, "merchant_")));
            }
        }
    }

    #[test]
    fn test_every_type_is_drawn() {
        let mut rng = StdRng::seed_from_u64(5);
        let seen: HashSet<TransactionType> = (0..1_000).map(|_| rng.gen()).collect();
        assert_eq!(seen.len(), TransactionType::ALL.len());
    }

    #[test]
    fn test_generate_is_independent() {
        let first = generate();
        let second = generate();
        assert_ne!(first, second);

        let batch = generate_batch(50);
        assert_eq!(batch.len(), 50);
        let distinct: HashSet<String> = batch
            .iter()
            .map(|tx| serde_json::to_string(tx).unwrap())
            .collect();
        assert_eq!(distinct.len(), 50);
    }
}
