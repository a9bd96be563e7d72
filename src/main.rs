/* 3rd party libraries */
use clap::Parser;
use crossbeam_channel as cbc;
use log::{info, warn};
use std::path::PathBuf;
use std::time::Duration;

/* Custom libraries */
use control::Command;
use shared::{CarEvent, Direction, SimError};
use simulation::Simulation;

/* Modules */
mod config;
mod control;
mod dispatcher;
mod elevator;
mod shared;
mod simulation;

/* Command line */
#[derive(Parser)]
#[clap(name = "elevator_bank", about = "Multi-car elevator bank simulator")]
struct Cli {
    /// Path to the TOML configuration file
    #[clap(long, default_value = "config.toml")]
    config: PathBuf,

    /// Number of cars, overrides the configuration file
    #[clap(long)]
    cars: Option<usize>,

    /// Number of floors, overrides the configuration file
    #[clap(long)]
    floors: Option<u8>,

    /// Wall-clock milliseconds per simulated tick
    #[clap(long)]
    tick_ms: Option<u64>,

    /// Run a scripted scenario headless instead of reading commands from stdin
    #[clap(long)]
    demo: bool,

    /// Number of ticks the demo runs for
    #[clap(long, default_value = "120")]
    ticks: u64,

    /// Print a JSON fleet snapshot after every tick
    #[clap(long)]
    json: bool,
}

/* Main */
fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    // Load the configuration
    let mut config = if cli.config.exists() {
        unwrap_or_exit!(config::load_config(&cli.config))
    } else {
        info!("No configuration at {:?}, using defaults", cli.config);
        config::Config::default()
    };
    if let Some(cars) = cli.cars {
        config.simulation.n_cars = cars;
    }
    if let Some(floors) = cli.floors {
        config.simulation.n_floors = floors;
    }
    if let Some(tick_ms) = cli.tick_ms {
        config.simulation.tick_ms = tick_ms;
    }

    let mut sim = unwrap_or_exit!(Simulation::new(&config));

    if cli.demo {
        run_demo(&mut sim, cli.ticks, cli.json);
    } else {
        let tick = Duration::from_millis(config.simulation.tick_ms);
        unwrap_or_exit!(run_interactive(&mut sim, tick, cli.json));
    }
}

/// Drives the clock in real time while a control thread feeds commands.
fn run_interactive(sim: &mut Simulation, tick: Duration, json: bool) -> std::io::Result<()> {
    let (command_tx, command_rx) = cbc::unbounded::<Command>();
    let _control_thread = control::spawn_stdin_reader(command_tx)?;
    let ticker = cbc::tick(tick);
    let mut queued: Vec<Command> = Vec::new();

    info!("Commands: hall <floor> up|down, cab <car> <floor>, open|close|alarm <car>, status, quit");

    loop {
        cbc::select! {
            recv(command_rx) -> command => {
                match command {
                    Ok(Command::Quit) | Err(_) => break,
                    Ok(Command::Status) => print_snapshot(sim),
                    Ok(command) => queued.push(command),
                }
            }
            recv(ticker) -> _ => {
                // Queued commands land before the step so none is lost mid-tick
                for command in queued.drain(..) {
                    report(sim.apply(&command));
                }
                for event in sim.tick() {
                    print_event(&event);
                }
                if json {
                    print_snapshot(sim);
                }
            }
        }
    }

    info!("Simulation stopped at tick {}", sim.now().0);
    Ok(())
}

/// A fixed scenario: a few cab and hall calls spread over the first ticks.
fn run_demo(sim: &mut Simulation, ticks: u64, json: bool) {
    let top = sim.dispatcher().hall_calls().len() as u8 - 1;
    let script: Vec<(u64, Command)> = vec![
        (0, Command::CabCall { car_id: 0, floor: top.min(7) }),
        (0, Command::CabCall { car_id: 0, floor: top.min(2) }),
        (1, Command::HallCall { floor: top.min(6), direction: Direction::Up }),
        (3, Command::HallCall { floor: top.min(3), direction: Direction::Down }),
        (3, Command::HallCall { floor: top.min(3), direction: Direction::Down }),
        (8, Command::HallCall { floor: top, direction: Direction::Down }),
        (12, Command::Alarm(0)),
    ];

    for t in 0..ticks {
        for (_, command) in script.iter().filter(|(at, _)| *at == t) {
            report(sim.apply(command));
        }
        for event in sim.tick() {
            print_event(&event);
        }
        if json {
            print_snapshot(sim);
        }
        if t > 12 && sim.is_quiescent() {
            info!("All cars idle after {} ticks", sim.now().0);
            break;
        }
    }
}

fn report(result: Result<(), SimError>) {
    if let Err(e) = result {
        if e.is_warning() {
            warn!("{}", e);
        } else {
            log::error!("{}", e);
        }
    }
}

fn print_event(event: &CarEvent) {
    match event {
        CarEvent::FloorArrived {
            car_id,
            floor,
            direction,
        } => println!("car {} arrived at floor {} going {}", car_id, floor, direction),
        CarEvent::AlarmTriggered { car_id } => println!("car {} ALARM", car_id),
        CarEvent::FloorChanged { car_id, floor } => println!("car {} at floor {}", car_id, floor),
        CarEvent::StateChanged(_) => {}
    }
}

fn print_snapshot(sim: &Simulation) {
    match serde_json::to_string(&sim.snapshot()) {
        Ok(json) => println!("{}", json),
        Err(e) => warn!("Failed to serialize snapshot: {}", e),
    }
}
