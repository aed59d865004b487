#![allow(dead_code)]

use rand::Rng;
use rand::seq::SliceRandom;
use serde_json::{Value, json};
use std::fs::File;
use std::io::Error;
use std::path::Path;

const SECTIONS: [&str; 4] = ["Pressure", "Mass", "Temperature", "Volume"];
const TIERS: [&str; 5] = ["N/A", "5", "10", "15", "20"];

/// Reference number of the `i`-th generated transaction.
pub fn reference(i: usize) -> String {
    format!("CAL-{i:05}")
}

/// A random unpaid transaction whose amount equals the sum of its line items.
pub fn random_transaction<R: Rng>(rng: &mut R, i: usize) -> Value {
    let line_items: Vec<Value> = (0..rng.gen_range(1..=6))
        .map(|_| {
            json!({
                "section": SECTIONS.choose(rng).copied().unwrap_or_default(),
                "type": "Instrument",
                "range": "0-100",
                "price": rng.gen_range(1..=40) * 50,
            })
        })
        .collect();
    let amount: i64 = line_items
        .iter()
        .filter_map(|item| item["price"].as_i64())
        .sum();

    json!({
        "referenceNumber": reference(i),
        "clientName": format!("Client {}", rng.gen_range(1..=50)),
        "amount": amount,
        "status": "unpaid",
        "lineItems": line_items,
        "payments": [],
    })
}

/// Writes a snapshot of `rows` random transactions.
pub fn generate_snapshot(path: &Path, rows: usize) -> Result<(), Error> {
    let mut rng = rand::thread_rng();
    let records: Vec<Value> = (1..=rows).map(|i| random_transaction(&mut rng, i)).collect();
    let file = File::create(path)?;
    serde_json::to_writer(file, &json!({ "records": records }))?;
    Ok(())
}

/// Writes one instruction per transaction, each with a random fixed tier and the
/// amount left for the engine to pre-fill.
pub fn generate_instructions(path: &Path, rows: usize) -> Result<(), Error> {
    let mut rng = rand::thread_rng();
    let file = File::create(path)?;
    let mut wtr = csv::WriterBuilder::new().from_writer(file);

    wtr.write_record(["reference", "discount", "value", "amount"])?;
    for i in 1..=rows {
        let tier = TIERS.choose(&mut rng).copied().unwrap_or("N/A");
        wtr.write_record([reference(i).as_str(), tier, "", ""])?;
    }

    wtr.flush()?;
    Ok(())
}
