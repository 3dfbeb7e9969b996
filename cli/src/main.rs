//! `birdseye` CLI: model listing, sampling, scenario simulation, bearing sweeps.

mod logging;

use anyhow::{ensure, Context, Result};
use clap::{Args, Parser, Subcommand};
use logging::{init_logging, LogConfig};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use sensor_models::{ModelRegistry, ObservationModel, SensorConfig, TargetState};
use sim::{load_replay, save_replay, Observer, ReplayLog, Scenario, ScenarioKind};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "birdseye", about = "Sample and score sensor observation models")]
struct Cli {
    #[command(flatten)]
    log: LogConfig,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Clone, Debug)]
struct ModelArgs {
    /// Registry name of the observation model
    #[arg(long, default_value = "doublerssi")]
    model: String,
    /// JSON sensor configuration file
    #[arg(long)]
    config: Option<PathBuf>,
    /// Radiation pattern file (overrides the configuration)
    #[arg(long)]
    pattern: Option<PathBuf>,
    /// Log-normal fading std dev in dB (overrides the configuration)
    #[arg(long)]
    fading_sigma: Option<f64>,
}

impl ModelArgs {
    fn sensor_config(&self) -> Result<SensorConfig> {
        let mut config = match &self.config {
            Some(path) => SensorConfig::from_json_file(path)?,
            None => SensorConfig::default(),
        };
        if let Some(pattern) = &self.pattern {
            config.antenna_pattern_path = Some(pattern.clone());
        }
        if let Some(sigma) = self.fading_sigma {
            config.fading_sigma_db = Some(sigma);
        }
        config.validate()?;
        Ok(config)
    }

    fn build(&self) -> Result<(SensorConfig, Box<dyn ObservationModel>)> {
        let config = self.sensor_config()?;
        let model = ModelRegistry::extended().build(&self.model, &config)?;
        Ok((config, model))
    }
}

#[derive(Subcommand)]
enum Commands {
    /// List the registered observation models.
    Models,
    /// Sample observations for fixed emitter states.
    Sample {
        #[command(flatten)]
        model: ModelArgs,
        /// Emitter as `distance,bearing_deg`; repeat for several emitters
        #[arg(long = "target", value_parser = parse_target, required = true)]
        targets: Vec<TargetState>,
        /// Random seed for reproducibility
        #[arg(long, default_value_t = 42)]
        seed: u64,
        /// Number of observations to draw
        #[arg(long, default_value_t = 1)]
        count: usize,
    },
    /// Run a named scenario and record the sampled observations.
    Simulate {
        #[arg(value_enum)]
        scenario: ScenarioKind,
        #[command(flatten)]
        model: ModelArgs,
        /// Random seed for reproducibility
        #[arg(long, default_value_t = 42)]
        seed: u64,
        /// Save the replay log as JSON
        #[arg(long)]
        save_replay: Option<PathBuf>,
    },
    /// Score a bearing grid against every frame of a replay log.
    Sweep {
        /// Path to replay JSON file
        input: PathBuf,
        /// Bearing grid spacing (degrees)
        #[arg(long, default_value_t = 1.0)]
        step: f64,
        /// Candidate range (meters); defaults to each frame's true range
        #[arg(long)]
        distance: Option<f64>,
        /// Output summary to a JSON file
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

fn parse_target(s: &str) -> std::result::Result<TargetState, String> {
    let (distance, bearing) = s
        .split_once(',')
        .ok_or_else(|| format!("expected `distance,bearing`, got {s:?}"))?;
    let distance: f64 = distance
        .trim()
        .parse()
        .map_err(|e| format!("bad distance {distance:?}: {e}"))?;
    let bearing: f64 = bearing
        .trim()
        .parse()
        .map_err(|e| format!("bad bearing {bearing:?}: {e}"))?;
    Ok(TargetState::new(distance, bearing))
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let _log = init_logging(&cli.log)?;

    match cli.command {
        Commands::Models => list_models(),
        Commands::Sample {
            model,
            targets,
            seed,
            count,
        } => run_sample(&model, &targets, seed, count)?,
        Commands::Simulate {
            scenario,
            model,
            seed,
            save_replay: save_path,
        } => run_simulate(scenario, &model, seed, save_path.as_deref())?,
        Commands::Sweep {
            input,
            step,
            distance,
            output,
        } => run_sweep(&input, step, distance, output.as_deref())?,
    }

    Ok(())
}

fn list_models() {
    let defaults = ModelRegistry::default().names();
    for name in ModelRegistry::extended().names() {
        let marker = if defaults.contains(&name) { "*" } else { " " };
        println!("{marker} {name}");
    }
    println!("(* = available in the default registry)");
}

fn run_sample(args: &ModelArgs, targets: &[TargetState], seed: u64, count: usize) -> Result<()> {
    let (_, model) = args.build()?;
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    for i in 0..count {
        let obs = model
            .observation(targets, &mut rng)
            .with_context(|| format!("sampling {} observation {i}", model.name()))?;
        println!("{i}: {obs}");
    }
    Ok(())
}

fn run_simulate(
    kind: ScenarioKind,
    args: &ModelArgs,
    seed: u64,
    replay_path: Option<&Path>,
) -> Result<()> {
    let (config, model) = args.build()?;
    let mut scenario = Scenario::build(kind, seed);

    println!(
        "Running scenario '{}' with model '{}' (seed={}, duration={:.0}s)...",
        scenario.name, args.model, seed, scenario.duration
    );
    let start = std::time::Instant::now();
    let frames = Observer::new(model.as_ref(), seed).run(&mut scenario)?;
    println!(
        "Done: {} frames, elapsed={:.3}s",
        frames.len(),
        start.elapsed().as_secs_f64()
    );

    if let Some(rpath) = replay_path {
        let log = ReplayLog {
            scenario_name: scenario.name.clone(),
            model: args.model.clone(),
            seed,
            sim_dt: scenario.sim_dt,
            duration: scenario.duration,
            config,
            frames,
        };
        save_replay(&log, rpath)?;
        println!("Replay saved to {}", rpath.display());
    }
    Ok(())
}

/// Smallest angle between two bearings (degrees).
fn bearing_error(a: f64, b: f64) -> f64 {
    let d = (a - b).rem_euclid(360.0);
    d.min(360.0 - d)
}

fn run_sweep(
    input: &Path,
    step: f64,
    distance: Option<f64>,
    output_path: Option<&Path>,
) -> Result<()> {
    ensure!(step > 0.0 && step <= 360.0, "bearing step must be in (0, 360], got {step}");
    let log = load_replay(input)?;
    let model = ModelRegistry::extended().build(&log.model, &log.config)?;
    println!(
        "Sweeping '{}' ({} frames, model '{}')...",
        log.scenario_name,
        log.frames.len(),
        log.model
    );

    let n_bearings = (360.0 / step).floor() as usize;
    let mut errors = Vec::with_capacity(log.frames.len());
    for frame in &log.frames {
        let Some(truth) = frame.states.first() else {
            continue;
        };
        let range = distance.unwrap_or(truth.distance);
        let candidates: Vec<TargetState> = (0..n_bearings)
            .map(|i| TargetState::new(range, i as f64 * step + step / 2.0))
            .collect();
        let hyp = model.hypotheses(&candidates)?;
        let weights = model.weight(&hyp, &frame.observation)?;
        let best = weights.imax();
        let err = bearing_error(candidates[best].bearing, truth.bearing);
        tracing::debug!(
            time = frame.time,
            truth = truth.bearing,
            best = candidates[best].bearing,
            weight = weights[best],
            "sweep frame"
        );
        errors.push(err);
    }

    let mean_error = if errors.is_empty() {
        f64::NAN
    } else {
        errors.iter().sum::<f64>() / errors.len() as f64
    };
    println!(
        "Sweep done: {} frames scored, mean bearing error={:.1}°",
        errors.len(),
        mean_error
    );

    if let Some(opath) = output_path {
        let json = serde_json::json!({
            "scenario": log.scenario_name,
            "model": log.model,
            "seed": log.seed,
            "frames": errors.len(),
            "mean_bearing_error_deg": mean_error,
            "bearing_errors_deg": errors,
        });
        std::fs::write(opath, serde_json::to_string_pretty(&json)?)?;
        println!("Summary saved to {}", opath.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_target_pairs() {
        let t = parse_target("80, 30.5").unwrap();
        assert_eq!(t, TargetState::new(80.0, 30.5));
        assert!(parse_target("80").is_err());
        assert!(parse_target("x,1").is_err());
    }

    #[test]
    fn bearing_error_wraps() {
        assert_eq!(bearing_error(359.0, 1.0), 2.0);
        assert_eq!(bearing_error(10.0, 40.0), 30.0);
        assert_eq!(bearing_error(90.0, 270.0), 180.0);
    }

    #[test]
    fn cli_parses_simulate() {
        let cli = Cli::try_parse_from([
            "birdseye",
            "simulate",
            "orbit",
            "--model",
            "doublerssilofi",
            "--fading-sigma",
            "3",
            "--log-level",
            "debug",
        ])
        .unwrap();
        assert_eq!(cli.log.log_level, logging::LogLevel::Debug);
        match cli.command {
            Commands::Simulate {
                scenario, model, ..
            } => {
                assert_eq!(scenario, ScenarioKind::Orbit);
                assert_eq!(model.model, "doublerssilofi");
                assert_eq!(model.sensor_config().unwrap().fading_sigma_db, Some(3.0));
            }
            _ => panic!("expected simulate"),
        }
    }
}
