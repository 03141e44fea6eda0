mod config;
mod control;
mod geo;
mod rotator;
mod telemetry;

use clap::{Parser, Subcommand};
use std::process::ExitCode;
use std::sync::atomic::AtomicBool;
use std::time::Duration;

use crate::config::Config;
use crate::control::ControlLoop;
use crate::geo::{decimal_year, GeoPoint, NullDeclination};
use crate::rotator::{Rotator, RotatorError};
use crate::telemetry::{Ingest, TelemetryState};

#[derive(Parser)]
#[command(name = "rocket-tracker")]
#[command(about = "Points an antenna rotator at a rocket using relayed GPS telemetry")]
struct Cli {
    /// Station configuration file
    #[arg(short, long, default_value = "station.yaml")]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest telemetry and continuously point the rotator
    Track,
    /// Ingest and log telemetry without moving the rotator
    Listen,
    /// One-shot pointing solution from the configured ground position
    Solve {
        #[arg(long, allow_negative_numbers = true)]
        latitude: f64,
        #[arg(long, allow_negative_numbers = true)]
        longitude: f64,
        /// Target altitude in meters
        #[arg(long, allow_negative_numbers = true)]
        altitude: f64,
    },
    /// Manual rotator control
    Rotator {
        #[command(subcommand)]
        action: RotatorAction,
    },
}

#[derive(Subcommand)]
enum RotatorAction {
    /// Query the protocol version
    Version,
    /// Query the current position
    Position,
    /// Move to an absolute position (degrees)
    Point {
        #[arg(allow_negative_numbers = true)]
        vertical: f64,
        #[arg(allow_negative_numbers = true)]
        horizontal: f64,
    },
    /// Calibrate the vertical axis
    CalibrateVertical {
        /// Persist the calibration on the device
        #[arg(long)]
        set: bool,
    },
    /// Calibrate the horizontal axis
    CalibrateHorizontal,
    /// Jog the vertical axis by a signed step count
    MoveVertical {
        #[arg(allow_negative_numbers = true)]
        steps: i64,
    },
    /// Jog the horizontal axis by a signed step count
    MoveHorizontal {
        #[arg(allow_negative_numbers = true)]
        steps: i64,
    },
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    let config = match Config::from_file(&cli.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error reading config {}: {}", cli.config, e);
            return ExitCode::FAILURE;
        }
    };

    match cli.command {
        Commands::Track => track(&config),
        Commands::Listen => listen(&config),
        Commands::Solve {
            latitude,
            longitude,
            altitude,
        } => solve(&config, GeoPoint::new(latitude, longitude, Some(altitude))),
        Commands::Rotator { action } => rotator_command(&config, action),
    }
}

fn track(config: &Config) -> ExitCode {
    let state = TelemetryState::new();

    let ingest = match Ingest::spawn(
        &config.telemetry.port,
        config.telemetry.baud,
        config.telemetry.log_file.clone(),
        state.clone(),
    ) {
        Ok(handle) => handle,
        Err(e) => {
            eprintln!("Error starting telemetry ingestion: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let rotator = match Rotator::open(&config.rotator.port, config.rotator.baud) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Error connecting to rotator: {}", e);
            ingest.stop();
            return ExitCode::FAILURE;
        }
    };

    let ground = config.ground.as_ref().map(|g| g.position());
    if ground.is_none() {
        log::warn!("no ground position configured; tracking will idle until one is set");
    }

    let mut control = ControlLoop::new(
        state,
        ground,
        rotator,
        NullDeclination,
        config.control.period,
    );

    // Runs until the process is terminated.
    let stop = AtomicBool::new(false);
    control.run(&stop);

    ingest.stop();
    ExitCode::SUCCESS
}

fn listen(config: &Config) -> ExitCode {
    let state = TelemetryState::new();

    let _ingest = match Ingest::spawn(
        &config.telemetry.port,
        config.telemetry.baud,
        config.telemetry.log_file.clone(),
        state.clone(),
    ) {
        Ok(handle) => handle,
        Err(e) => {
            eprintln!("Error starting telemetry ingestion: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let mut previous = None;
    loop {
        std::thread::sleep(Duration::from_millis(500));
        let latest = state.latest();
        if latest != previous {
            if let Some(packet) = &latest {
                println!(
                    "fix: lat {:.6} lon {:.6} alt {:.1} m",
                    packet.gps.latitude, packet.gps.longitude, packet.gps.altitude
                );
            }
            previous = latest;
        }
    }
}

fn solve(config: &Config, air: GeoPoint) -> ExitCode {
    let Some(ground) = config.ground.as_ref().map(|g| g.position()) else {
        eprintln!("No ground position in the config file");
        return ExitCode::FAILURE;
    };

    let distance = ground.distance_to(&air);
    let bearing = ground.bearing_to(&air, true);
    let magnetic = ground.magnetic_bearing_to(
        &air,
        &NullDeclination,
        decimal_year(chrono::Utc::now()),
        true,
    );

    println!("distance:       {:.1} m", distance);
    println!("bearing (true): {:.2} deg", bearing);
    println!("bearing (mag):  {:.2} deg", magnetic);
    match ground.elevation_to(&air) {
        Ok(elevation) => println!("elevation:      {:.2} deg", elevation),
        Err(e) => println!("elevation:      unavailable ({})", e),
    }

    ExitCode::SUCCESS
}

fn rotator_command(config: &Config, action: RotatorAction) -> ExitCode {
    let mut rotator = match Rotator::open(&config.rotator.port, config.rotator.baud) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Error connecting to rotator: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let result = match action {
        RotatorAction::Version => {
            println!("protocol version {}", rotator.protocol_version());
            Ok(())
        }
        RotatorAction::Position => rotator.position().map(|(vertical, horizontal)| {
            println!(
                "vertical {:.2} deg, horizontal {:.2} deg",
                vertical, horizontal
            )
        }),
        RotatorAction::Point {
            vertical,
            horizontal,
        } => rotator.set_position(vertical, horizontal),
        RotatorAction::CalibrateVertical { set } => rotator.calibrate_vertical(set),
        RotatorAction::CalibrateHorizontal => rotator.calibrate_horizontal(),
        RotatorAction::MoveVertical { steps } => rotator.move_vertical(steps),
        RotatorAction::MoveHorizontal { steps } => rotator.move_horizontal(steps),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if matches!(e, RotatorError::MalformedResponse(_)) {
                // The line may be desynced; drop any buffered bytes so the
                // next invocation starts clean.
                if let Err(e) = rotator.dump_input() {
                    log::warn!("failed to clear rotator input: {}", e);
                }
            }
            eprintln!("Rotator command failed: {}", e);
            ExitCode::FAILURE
        }
    }
}
