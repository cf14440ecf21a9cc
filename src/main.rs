use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use nbody_sim::config::{Backend, Config};
use std::io;
use std::process::ExitCode;

/// Gravitational N-body simulation rendered independently of its update rate
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
  /// Number of bodies to simulate
  #[arg(short = 'n', long, default_value_t = 2048)]
  particles: u32,
  /// Simulation steps per second
  #[arg(long, default_value_t = 2.0)]
  update_rate: f64,
  /// Frames presented per second
  #[arg(long, default_value_t = 60.0)]
  render_rate: f64,
  /// Integration timestep per simulation step
  #[arg(long, default_value_t = 1e-6)]
  dt: f32,
  /// Particles per compute work-group
  #[arg(long, default_value_t = 64)]
  workgroup_size: u32,
  /// Where the force kernel runs
  #[arg(long, value_enum, default_value_t = Backend::Gpu)]
  backend: Backend,
  /// Run in headless mode (no window)
  #[arg(long, default_value_t = false)]
  headless: bool,
  /// Start with the simulation paused
  #[arg(long, default_value_t = false)]
  paused: bool,
  /// Seed for the initial conditions
  #[arg(long, default_value_t = 42)]
  seed: u64,
  /// Stop after this many seconds
  #[arg(long)]
  duration: Option<f64>,
  #[command(subcommand)]
  command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
  /// Generate shell completion scripts
  Completions {
    /// The shell to generate the script for
    #[arg(value_enum)]
    shell: Shell,
  },
}

impl From<&Args> for Config {
  fn from(args: &Args) -> Self {
    Config {
      update_rate: args.update_rate,
      render_rate: args.render_rate,
      num_particles: args.particles,
      delta_t: args.dt,
      workgroup_size: args.workgroup_size,
      backend: args.backend,
      headless: args.headless,
      paused: args.paused,
      seed: args.seed,
      duration: args.duration,
      ..Config::default()
    }
  }
}

fn main() -> ExitCode {
  let args = Args::parse();

  if let Some(Commands::Completions { shell }) = &args.command {
    let mut cmd = Args::command();
    let name = cmd.get_name().to_string();
    generate(*shell, &mut cmd, name, &mut io::stdout());
    return ExitCode::SUCCESS;
  }

  env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

  match nbody_sim::state::run(&Config::from(&args)) {
    Ok(()) => ExitCode::SUCCESS,
    Err(err) => {
      log::error!("{err:#}");
      ExitCode::FAILURE
    }
  }
}
