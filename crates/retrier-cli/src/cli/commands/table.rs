//! `retrier table <kind>` – print a generated backoff table.

use anyhow::Result;
use retrier_core::backoff;

pub fn run_table(kind: &str, start: u64, factor: u64, retries: usize) -> Result<()> {
    let table = backoff::generate(kind, start, factor, retries)?;
    println!("  {:>5}  {:>10}", "Retry", "Wait(s)");
    println!("  -----  ----------");
    for (i, wait) in table.iter().enumerate() {
        println!("  {:>5}  {:>10.3}", i + 1, wait.as_secs_f64());
    }
    Ok(())
}
