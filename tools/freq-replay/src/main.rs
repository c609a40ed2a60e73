use std::error::Error;
use std::io::Write;
use std::path::PathBuf;

use clap::Parser;
use env_logger::Builder;
use serde::{Deserialize, Serialize};

use sched_freq::config::GovernorConfig;
use sched_freq::{log_debug, log_warn};
use sched_freq::{DecisionOutcome, FixedTargetProvider, ScalingStrategy, TargetUtil, UtilizationSample};

#[derive(Parser, Debug)]
#[command(about, long_about = None)]
/// Replays utilization trace through the frequency selector
struct Args {
    /// Path to YAML file with governor configuration
    #[arg(short, long)]
    config: PathBuf,

    /// Path to CSV file with utilization samples (cpu,util,max[,target])
    #[arg(short, long)]
    trace: PathBuf,

    /// Path to produced JSON file with selected frequencies
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
struct TraceRecord {
    cpu: u32,
    util: u64,
    max: u64,
    target: Option<i64>,
}

#[derive(Debug, Serialize)]
struct ReplayRecord {
    cpu: u32,
    policy: u32,
    util: u64,
    target: Option<i64>,
    freq: u32,
    index: Option<usize>,
    outcome: String,
}

fn main() -> Result<(), Box<dyn Error>> {
    Builder::from_default_env()
        .format(|buf, record| writeln!(buf, "{}", record.args()))
        .init();

    let args = Args::parse();

    let config = GovernorConfig::from_file(&args.config.to_string_lossy())?;
    let mut setup = config.build()?;
    // samples with explicit target are decided in target-load mode with a fixed target
    let mut override_selector = setup.selector.clone();
    override_selector.set_strategy(ScalingStrategy::TargetLoad);

    let mut results = Vec::new();
    let (mut selected, mut no_data, mut fallback) = (0, 0, 0);
    let mut reader = csv::Reader::from_path(&args.trace)?;
    for record in reader.deserialize() {
        let record: TraceRecord = record?;
        let Some(pos) = setup.policy_of(record.cpu) else {
            log::warn!("no policy for cpu{}, sample skipped", record.cpu);
            continue;
        };
        let policy = &mut setup.policies[pos];
        let state = &mut setup.states[pos];
        let sample = UtilizationSample::new(record.util, record.max);

        let decision = match record.target {
            Some(target) => {
                override_selector.set_target_provider(Some(Box::new(FixedTargetProvider::new(TargetUtil::from_raw(
                    target,
                )))));
                override_selector.next_freq(policy, state, sample)
            }
            None => setup.selector.next_freq(policy, state, sample),
        };

        let (index, outcome) = match &decision.outcome {
            DecisionOutcome::Selected { index, .. } => {
                selected += 1;
                (Some(*index), "selected".to_string())
            }
            DecisionOutcome::NoTargetData => {
                no_data += 1;
                (None, "no_target_data".to_string())
            }
            DecisionOutcome::Fallback(e) => {
                fallback += 1;
                log_warn!(policy, "fallback for sample of cpu{}: {}", record.cpu, e);
                (None, format!("fallback: {}", e))
            }
        };
        log_debug!(policy, "util={} -> {} kHz", record.util, decision.freq);
        policy.set_cur(decision.freq);

        results.push(ReplayRecord {
            cpu: record.cpu,
            policy: policy.cpu(),
            util: record.util,
            target: record.target,
            freq: decision.freq,
            index,
            outcome,
        });
    }

    log::info!(
        "replayed {} samples: {} selected, {} without target data, {} fallbacks",
        results.len(),
        selected,
        no_data,
        fallback
    );

    let output = args
        .output
        .unwrap_or_else(|| args.trace.with_extension("freqs.json"));
    std::fs::File::create(output)?.write_all(serde_json::to_string_pretty(&results)?.as_bytes())?;
    Ok(())
}
