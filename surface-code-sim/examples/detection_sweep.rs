//! Detection rate versus physical error rate and lattice size.
//!
//! For each size, runs many independent noisy trials and reports the fraction
//! that produced at least one parity change, plus the mean number of reports.

use surface_code_sim::prelude::*;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    println!("═══ Detection sweep ═══");
    println!();

    let sizes = [3, 5, 7];
    let rates: Vec<f64> = (0..=6).map(|i| i as f64 * 0.0005).collect();

    print!("  p_err   ");
    for &n in &sizes {
        print!(" d={:<2} rate  mean ", n);
    }
    println!();

    let mut all_results = Vec::new();
    for &n in &sizes {
        let config = ExperimentConfig {
            width: n,
            height: n,
            rounds: 10,
            trials: 500,
            seed: 1,
            ..ExperimentConfig::default()
        };
        all_results.push(detection_sweep(&config, &rates)?);
    }

    for (i, &p) in rates.iter().enumerate() {
        print!("  {:.4}  ", p);
        for results in &all_results {
            print!("      {:.3} {:5.2} ", results[i].detection_rate, results[i].mean_reports);
        }
        println!();
    }
    Ok(())
}
