//! Writes a sample of generated payloads to `resources/output/sample.json`, one JSON array
//! in the same shape the batch endpoint receives.
//! can be run with `cargo run --example generator`

use std::error::Error;
use std::fs::{self, File};
use std::io::BufWriter;

use log::info;
use rand::{thread_rng, Rng};
use tx_loadgen::transaction::Transaction;

const SAMPLE_SIZE: usize = 1_000;

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    fs::create_dir_all("resources/output")?;
    let writer = BufWriter::new(File::create("resources/output/sample.json")?);
    let mut rng = thread_rng();
    let sample: Vec<Transaction> = (0..SAMPLE_SIZE).map(|_| rng.gen()).collect();
    serde_json::to_writer_pretty(writer, &sample)?;
    info!("Wrote {} transactions", sample.len());
    Ok(())
}
