//! Microgrid simulator entry point: CLI wiring and episode execution.

mod cli;

use std::process;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use microgrid_sim::config::ScenarioConfig;
use microgrid_sim::io::export::export_csv;
use microgrid_sim::runner::{self, RunError};
use microgrid_sim::sim::env::GridEnvironment;
use microgrid_sim::sim::kpi::EpisodeReport;
use microgrid_sim::sim::policy::{Controller, IdlePolicy, RandomPolicy, SurplusSharingPolicy};
use microgrid_sim::sim::types::{EnvError, StepRecord};

use cli::{Cli, PolicyArg};

fn build_controller(cli: &Cli, seed: u64) -> Box<dyn Controller + Send> {
    match cli.policy {
        PolicyArg::Idle => Box::new(IdlePolicy),
        PolicyArg::Random => Box::new(RandomPolicy::new(seed, cli.random_max_kwh)),
        PolicyArg::Sharing => Box::new(SurplusSharingPolicy),
    }
}

fn load_scenario(cli: &Cli) -> ScenarioConfig {
    let loaded = match &cli.scenario {
        Some(path) => ScenarioConfig::from_toml_file(path),
        None => ScenarioConfig::from_preset(cli.preset_name()),
    };
    let mut scenario = loaded.unwrap_or_else(|e| {
        eprintln!("{e}");
        process::exit(1);
    });

    if let Some(seed) = cli.seed {
        scenario.simulation.seed = seed;
    }

    let errors = scenario.validate();
    if !errors.is_empty() {
        for e in &errors {
            eprintln!("{e}");
        }
        process::exit(1);
    }
    scenario
}

fn build_env(scenario: ScenarioConfig) -> GridEnvironment {
    GridEnvironment::new(scenario).unwrap_or_else(|e| {
        match &e {
            EnvError::InvalidConfig(errors) => {
                for err in errors {
                    eprintln!("{err}");
                }
            }
            EnvError::Weather(_) => eprintln!("error: {e}"),
        }
        process::exit(1);
    })
}

/// Runs every episode on the calling thread.
fn run_episodes(
    env: &mut GridEnvironment,
    controller: &mut dyn Controller,
    episodes: u32,
    max_steps: Option<usize>,
) -> Result<Vec<Vec<StepRecord>>, RunError> {
    (0..episodes)
        .map(|_| runner::run_episode(env, controller, max_steps))
        .collect()
}

#[cfg(feature = "tui")]
fn run_with_monitor(
    mut env: GridEnvironment,
    mut controller: Box<dyn Controller + Send>,
    cli: &Cli,
) -> Result<Vec<Vec<StepRecord>>, RunError> {
    use std::ops::ControlFlow;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::thread;
    use std::time::Duration;

    use microgrid_sim::sim::snapshot;

    let (publisher, rx) = snapshot::channel(env.config().simulation.snapshot_capacity);
    env.attach_publisher(publisher);

    let stop = Arc::new(AtomicBool::new(false));
    let delay = Duration::from_millis(cli.step_delay_ms);
    let episodes = cli.episodes;
    let max_steps = cli.max_steps;

    let sim_stop = Arc::clone(&stop);
    let handle = thread::spawn(move || -> Result<Vec<Vec<StepRecord>>, RunError> {
        let mut all = Vec::new();
        for _ in 0..episodes {
            if sim_stop.load(Ordering::Relaxed) {
                break;
            }
            let records =
                runner::run_episode_with(&mut env, controller.as_mut(), max_steps, |_| {
                    thread::sleep(delay);
                    if sim_stop.load(Ordering::Relaxed) {
                        ControlFlow::Break(())
                    } else {
                        ControlFlow::Continue(())
                    }
                })?;
            all.push(records);
        }
        Ok(all)
    });

    if let Err(e) = microgrid_sim::tui::run(rx) {
        tracing::error!(error = %e, "monitor failed");
    }
    stop.store(true, Ordering::Relaxed);

    handle.join().unwrap_or_else(|_| {
        eprintln!("error: simulation thread panicked");
        process::exit(1);
    })
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("microgrid_sim=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let scenario = load_scenario(&cli);
    let seed = scenario.simulation.seed;
    let mut env = build_env(scenario);
    let mut controller = build_controller(&cli, seed);

    #[cfg(feature = "tui")]
    let result = if cli.tui {
        run_with_monitor(env, controller, &cli)
    } else {
        run_episodes(&mut env, controller.as_mut(), cli.episodes, cli.max_steps)
    };
    #[cfg(not(feature = "tui"))]
    let result = run_episodes(&mut env, controller.as_mut(), cli.episodes, cli.max_steps);

    let episodes = result.unwrap_or_else(|e| {
        eprintln!("error: {e}");
        process::exit(1);
    });

    for (i, records) in episodes.iter().enumerate() {
        if !cli.quiet {
            for r in records {
                println!("{r}");
            }
        }
        println!("\nEpisode {}", i + 1);
        println!("{}", EpisodeReport::from_records(records));
    }

    if let Some(path) = &cli.telemetry_out {
        if let Err(e) = export_csv(&episodes, path) {
            eprintln!("error: failed to write CSV: {e}");
            process::exit(1);
        }
        eprintln!("Telemetry written to {}", path.display());
    }
}
