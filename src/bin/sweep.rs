//! Channel-error sweep driver.
//!
//! Solves the AoI- and QAoI-optimal policies for every error probability on
//! the experiment grid, characterizes each by Monte Carlo simulation, and
//! writes one JSON bundle for the plotting stage.

use std::time::Instant;

use qaoi::env_config;
use qaoi::storage::save_results;
use qaoi::sweep::{linspace, run_sweep, SweepConfig};

// Experiment constants.
const ERROR_GRID_LO: f64 = 0.0;
const ERROR_GRID_HI: f64 = 0.8;
const ERROR_GRID_POINTS: usize = 5;
const ERROR_PERIOD: usize = 1;
const QUERY_PERIOD: usize = 10;
const TOKEN_PROB: f64 = 0.2;
const BUCKET_SIZE: usize = 5;
const MAX_QUERY_MULTIPLE: usize = 5;
const DISCOUNT: f64 = 0.75;
const HISTOGRAM_STEPS: usize = 1_000_000;
const TRACE_STEPS: usize = 1_000;

struct Args {
    histogram_steps: usize,
    trace_steps: usize,
    seed: u64,
    output: String,
}

fn parse_args() -> Args {
    let args: Vec<String> = std::env::args().collect();
    let mut histogram_steps = HISTOGRAM_STEPS;
    let mut trace_steps = TRACE_STEPS;
    let mut seed = 42u64;
    let mut output = "data/sweep_results.json".to_string();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--steps" => {
                i += 1;
                if i < args.len() {
                    histogram_steps = args[i].parse().unwrap_or_else(|_| {
                        eprintln!("Invalid --steps value: {}", args[i]);
                        std::process::exit(1);
                    });
                }
            }
            "--trace-steps" => {
                i += 1;
                if i < args.len() {
                    trace_steps = args[i].parse().unwrap_or_else(|_| {
                        eprintln!("Invalid --trace-steps value: {}", args[i]);
                        std::process::exit(1);
                    });
                }
            }
            "--seed" => {
                i += 1;
                if i < args.len() {
                    seed = args[i].parse().unwrap_or_else(|_| {
                        eprintln!("Invalid --seed value: {}", args[i]);
                        std::process::exit(1);
                    });
                }
            }
            "--output" => {
                i += 1;
                if i < args.len() {
                    output = args[i].clone();
                }
            }
            "--help" | "-h" => {
                println!(
                    "Usage: sweep [--steps N] [--trace-steps N] [--seed N] [--output PATH]"
                );
                std::process::exit(0);
            }
            other => {
                eprintln!("Unknown argument: {}", other);
                std::process::exit(1);
            }
        }
        i += 1;
    }

    Args {
        histogram_steps,
        trace_steps,
        seed,
        output,
    }
}

fn main() {
    env_config::init_base_path();
    env_config::init_rayon_threads();
    let args = parse_args();

    let config = SweepConfig {
        error_grid: linspace(ERROR_GRID_LO, ERROR_GRID_HI, ERROR_GRID_POINTS),
        error_period: ERROR_PERIOD,
        query_period: QUERY_PERIOD,
        token_prob: TOKEN_PROB,
        bucket_size: BUCKET_SIZE,
        max_query_multiple: MAX_QUERY_MULTIPLE,
        discount: DISCOUNT,
        histogram_steps: args.histogram_steps,
        trace_steps: args.trace_steps,
        seed: args.seed,
    };

    println!("=== AoI/QAoI channel-error sweep ===");
    println!(
        "Grid: {:?} | T_q={} B={} p_b={} M={} gamma={}",
        config.error_grid,
        config.query_period,
        config.bucket_size,
        config.token_prob,
        config.max_query_multiple,
        config.discount
    );
    println!(
        "Simulation: {} histogram slots, {} trace slots, seed {}",
        config.histogram_steps, config.trace_steps, args.seed
    );
    println!();

    let t0 = Instant::now();
    let results = match run_sweep(&config) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Sweep failed: {e}");
            std::process::exit(1);
        }
    };

    println!("\n  eps  | AoI policy  E[AoI] E[QAoI] | QAoI policy E[AoI] E[QAoI]");
    println!("-------|-----------------------------|----------------------------");
    for point in &results.points {
        println!(
            " {:5.3} | {:17.3} {:7.3} | {:17.3} {:7.3}",
            point.error_prob,
            point.aoi_policy.mean_aoi,
            point.aoi_policy.mean_qaoi,
            point.qaoi_policy.mean_aoi,
            point.qaoi_policy.mean_qaoi
        );
    }

    save_results(&results, &args.output);
    println!(
        "\nResults written to {} ({:.1}s total)",
        args.output,
        t0.elapsed().as_secs_f64()
    );
}
