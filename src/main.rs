use gravsim::{Scenario, ScenarioConfig};
use gravsim::{bench_force_field, bench_simulate_curve};
use gravsim::simulation::diagnostics::conservation_report;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use log::info;

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::PathBuf;

#[derive(ValueEnum, Debug, Clone, Copy)]
enum Bench {
    Force,
    Simulate,
}

#[derive(Parser, Debug)]
#[command(about = "Newtonian N-body trajectories with an adaptive Runge-Kutta integrator")]
struct Args {
    /// Scenario file (YAML, or JSON with a .json extension); bare names are looked up in scenarios/
    #[arg(short, long, default_value = "two_body.yaml")]
    file_name: String,

    /// Write the trajectory JSON here instead of stdout
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// Pretty-print the JSON output
    #[arg(long)]
    pretty: bool,

    /// Print momentum / energy / center-of-mass drift to stderr
    #[arg(long)]
    report: bool,

    /// Run a benchmark instead of a scenario
    #[arg(long, value_enum)]
    bench: Option<Bench>,
}

fn scenario_path(file_name: &str) -> PathBuf {
    let direct = PathBuf::from(file_name);
    if direct.exists() {
        return direct;
    }
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("scenarios").join(file_name)
}

// load here to keep main clean
fn load_scenario(file_name: &str) -> Result<ScenarioConfig> {
    let config_path = scenario_path(file_name);
    let file = File::open(&config_path)
        .with_context(|| format!("opening scenario {}", config_path.display()))?;
    let reader = BufReader::new(file);

    let is_json = config_path.extension().is_some_and(|ext| ext == "json");
    let scenario_cfg: ScenarioConfig = if is_json {
        serde_json::from_reader(reader)?
    } else {
        serde_yaml::from_reader(reader)?
    };

    Ok(scenario_cfg)
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    match args.bench {
        Some(Bench::Force) => {
            bench_force_field();
            return Ok(());
        }
        Some(Bench::Simulate) => {
            bench_simulate_curve();
            return Ok(());
        }
        None => {}
    }

    let scenario_cfg = load_scenario(&args.file_name)?;
    let scenario = Scenario::build_scenario(scenario_cfg)?;
    info!("loaded {} bodies from {}", scenario.bodies.len(), args.file_name);

    let output = scenario.run()?;

    if args.report {
        let p = &scenario.parameters;
        let r = conservation_report(&output.trajectory, p.G, p.eps);
        eprintln!("momentum drift:       {:.3e}", r.momentum_drift);
        eprintln!("energy drift (rel):   {:.3e}", r.energy_drift);
        eprintln!("center of mass drift: {:.3e}", r.com_drift);
        eprintln!(
            "steps: {} accepted, {} rejected, {} force evaluations",
            output.stats.accepted_steps, output.stats.rejected_steps, output.stats.fn_evals
        );
    }

    let writer: Box<dyn Write> = match &args.out {
        Some(path) => Box::new(File::create(path)?),
        None => Box::new(io::stdout().lock()),
    };
    let mut writer = BufWriter::new(writer);
    if args.pretty {
        serde_json::to_writer_pretty(&mut writer, &output.trajectory)?;
    } else {
        serde_json::to_writer(&mut writer, &output.trajectory)?;
    }
    writeln!(writer)?;
    writer.flush()?;

    Ok(())
}
