use std::collections::HashMap;
use std::time::Instant;

use log::warn;
use rand::{thread_rng, Rng};

use tx_loadgen::generator::HIGH_VALUE_PROBABILITY;
use tx_loadgen::transaction::{Transaction, TransactionType};

const SAMPLES: usize = 100_000;

fn main() {
    env_logger::init();

    let mut rng = thread_rng();
    let start = Instant::now();
    let transactions: Vec<Transaction> = (0..SAMPLES).map(|_| rng.gen()).collect();
    let elapsed = start.elapsed();
    warn!("Generating {SAMPLES} transactions took: {:.2?}", elapsed);

    let start_encoding = Instant::now();
    let mut encoded_bytes = 0;
    for tx in &transactions {
        encoded_bytes += serde_json::to_vec(tx).map_or(0, |body| body.len());
    }
    warn!(
        "Encoding took: {:.2?} ({} bytes)",
        start_encoding.elapsed(),
        encoded_bytes
    );

    let high_value = transactions.iter().filter(|tx| tx.is_high_value()).count();
    #[allow(clippy::cast_precision_loss)]
    let share = high_value as f64 / SAMPLES as f64;
    println!(
        "High-value share: {:.4} (expected {HIGH_VALUE_PROBABILITY})",
        share
    );

    let mut by_type: HashMap<TransactionType, usize> = HashMap::new();
    for tx in &transactions {
        *by_type.entry(tx.transaction_type()).or_default() += 1;
    }
    for tx_type in TransactionType::ALL {
        println!("{tx_type:?}: {}", by_type.get(&tx_type).copied().unwrap_or(0));
    }

    warn!("Total took: {:.2?}", start.elapsed());
}
