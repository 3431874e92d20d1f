use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use serde::Serialize;
use serde_json::json;
use ukf_tracker_rs::consistency::NisLogger;
use ukf_tracker_rs::{
    calculate_rmse, dataset, CtrvUkf, FilterConfig, NisFileWriter, NisRecorder, NisReporter,
    ProcessOutcome, SensorType, UkfState,
};

#[derive(Parser, Debug)]
#[command(name = "ukf_tracker")]
#[command(about = "Replay a lidar/radar measurement log through the CTRV unscented Kalman filter", long_about = None)]
struct Args {
    /// Measurement log (.txt or .txt.gz)
    #[arg(long)]
    input: PathBuf,

    /// JSON filter configuration (missing fields use defaults)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write per-step estimates as newline-delimited JSON
    #[arg(long)]
    output: Option<PathBuf>,

    /// Directory for NIS_lidar / NIS_radar files
    #[arg(long)]
    nis_dir: Option<PathBuf>,

    /// Ignore lidar measurements after initialization
    #[arg(long, default_value_t = false)]
    no_lidar: bool,

    /// Ignore radar measurements after initialization
    #[arg(long, default_value_t = false)]
    no_radar: bool,
}

#[derive(Serialize)]
struct StepRecord<'a> {
    #[serde(flatten)]
    estimate: &'a UkfState,
    sensor: SensorType,
    outcome: &'static str,
    nis: Option<f64>,
    ground_truth: Option<[f64; 4]>,
}

fn load_config(args: &Args) -> anyhow::Result<FilterConfig> {
    let mut config = match args.config.as_ref() {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("opening config {}", path.display()))?;
            serde_json::from_reader(file)
                .with_context(|| format!("parsing config {}", path.display()))?
        }
        None => FilterConfig::default(),
    };
    if args.no_lidar {
        config.use_lidar = false;
    }
    if args.no_radar {
        config.use_radar = false;
    }
    Ok(config)
}

fn open_output(path: Option<&Path>) -> anyhow::Result<Option<BufWriter<File>>> {
    path.map(|p| {
        File::create(p)
            .map(BufWriter::new)
            .with_context(|| format!("creating {}", p.display()))
    })
    .transpose()
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let config = load_config(&args)?;
    let records = dataset::load(&args.input)
        .with_context(|| format!("loading {}", args.input.display()))?;
    log::info!("Replaying {} measurements from {}", records.len(), args.input.display());

    let file_writer: Option<Box<dyn NisReporter>> = match args.nis_dir.as_ref() {
        Some(dir) => Some(Box::new(NisFileWriter::create(dir)?)),
        None => None,
    };
    let reporter = (NisRecorder::new(), (NisLogger, file_writer));
    let mut ukf = CtrvUkf::with_reporter(config, reporter)?;
    let mut output = open_output(args.output.as_deref())?;

    let mut estimations = Vec::new();
    let mut ground_truth = Vec::new();

    for (idx, record) in records.iter().enumerate() {
        let m = &record.measurement;
        let outcome = ukf
            .process_measurement(m)
            .with_context(|| format!("record {} (t={})", idx + 1, m.timestamp))?;

        let (label, nis) = match outcome {
            ProcessOutcome::Initialized => ("initialized", None),
            ProcessOutcome::Skipped => ("skipped", None),
            ProcessOutcome::Updated { nis, .. } => ("updated", Some(nis)),
        };

        let estimate = ukf.snapshot();
        if let Some(gt) = record.ground_truth {
            estimations.push(estimate.to_cartesian());
            ground_truth.push(gt.as_vector());
        }

        if let Some(out) = output.as_mut() {
            let step = StepRecord {
                estimate: &estimate,
                sensor: m.sensor_type(),
                outcome: label,
                nis,
                ground_truth: record.ground_truth.map(|gt| [gt.px, gt.py, gt.vx, gt.vy]),
            };
            serde_json::to_writer(&mut *out, &step)?;
            writeln!(out)?;
        }
    }

    if let Some(mut out) = output {
        out.flush()?;
    }

    let rmse = calculate_rmse(&estimations, &ground_truth);
    let final_state = ukf.snapshot();
    let (recorder, _) = ukf.into_reporter();
    let nis = recorder.summaries();

    let summary = json!({
        "input": args.input.display().to_string(),
        "measurements": records.len(),
        "lidar_updates": final_state.lidar_updates,
        "radar_updates": final_state.radar_updates,
        "skipped": final_state.skipped,
        "rmse": {
            "valid": rmse.valid,
            "px": rmse.value[0],
            "py": rmse.value[1],
            "vx": rmse.value[2],
            "vy": rmse.value[3],
        },
        "nis": {
            "lidar": nis.get(&SensorType::Lidar),
            "radar": nis.get(&SensorType::Radar),
        },
        "final_state": final_state,
    });

    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
