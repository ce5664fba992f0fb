use std::path::PathBuf;
use std::thread;
use std::time::Instant;

use clap::Parser;
use log::{error, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use aleator::midi::output::{OutputSink, TraceSink};
use aleator::{SessionConfig, midi};

#[derive(Parser)]
#[command(name = "aleator")]
#[command(about = "Stochastic MIDI note sequencer")]
struct Cli {
    /// List available MIDI output ports and exit
    #[arg(long)]
    list_ports: bool,

    /// Substring of the MIDI output port to connect to
    #[arg(long, default_value = "")]
    port: String,

    /// Session configuration file (JSON); omit for the built-in demo
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log events instead of opening a MIDI device
    #[arg(long)]
    dry_run: bool,

    /// Override the configured tempo (BPM)
    #[arg(long)]
    tempo: Option<f64>,

    /// Random seed for reproducible runs
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Stop after this many ticks (default: run until interrupted)
    #[arg(long)]
    ticks: Option<u64>,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    if cli.list_ports {
        match midi::list_ports() {
            Ok(ports) if ports.is_empty() => println!("no MIDI output ports available"),
            Ok(ports) => {
                for name in ports {
                    println!("{name}");
                }
            }
            Err(e) => {
                error!("{e}");
                std::process::exit(1);
            }
        }
        return;
    }

    if let Err(e) = run(&cli) {
        error!("{e}");
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = match &cli.config {
        Some(path) => SessionConfig::from_file(path)?,
        None => {
            info!("no config given, using the demo session");
            SessionConfig::demo()
        }
    };
    if let Some(bpm) = cli.tempo {
        config.tempo = bpm;
    }
    let tempo = config.tempo()?;

    let sink: Box<dyn OutputSink> = if cli.dry_run {
        Box::new(TraceSink)
    } else {
        Box::new(midi::connect(&cli.port)?)
    };

    let mut session = config.build(sink)?;
    session.program_change_all();
    info!("{} voices at {tempo}, seed {}", session.len(), cli.seed);

    let mut rng = StdRng::seed_from_u64(cli.seed);
    let period = tempo.tick_period();
    let start = Instant::now();
    let mut tick: u64 = 0;
    loop {
        if let Some(limit) = cli.ticks {
            if tick >= limit {
                break;
            }
        }
        session.tick(|| rng.gen_range(0.0..1.0));
        tick += 1;

        // Sleep to the nominal grid; drift is absorbed, jitter is not
        let deadline = start + period.mul_f64(tick as f64);
        let now = Instant::now();
        if deadline > now {
            thread::sleep(deadline - now);
        }
    }
    session.silence_all();
    Ok(())
}
