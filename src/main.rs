use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use agv_fleet_kernel::domain::scheduler::scheduler::Scheduler;
use agv_fleet_kernel::domain::vehicle::vehicle_controller::{DriveOutcome, DriveReport, VehicleController};
use agv_fleet_kernel::{generate_kernel_model, logger};
use anyhow::Context;
use clap::Parser;
use colored::Colorize;

/// Runs the configured vehicles along their routes through the scheduler.
#[derive(Debug, Parser)]
#[command(name = "agv-kernel", version)]
struct Args {
    /// Kernel configuration (plant model, scheduler settings, vehicle routes) as JSON.
    #[arg(short, long)]
    config: PathBuf,

    /// How long a vehicle waits for one route step before giving up.
    #[arg(long, default_value_t = 2000)]
    step_timeout_ms: u64,

    /// Treat freeing a resource that is not held as an error.
    #[arg(long)]
    strict_free: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    logger::init();

    let mut kernel_model =
        generate_kernel_model(&args.config).with_context(|| format!("Loading kernel configuration '{}'", args.config.display()))?;
    if args.strict_free {
        kernel_model.scheduler_config.strict_free = true;
    }

    let scheduler = Scheduler::new(kernel_model.plant_model, kernel_model.scheduler_config);
    scheduler.initialize()?;

    let step_timeout = Duration::from_millis(args.step_timeout_ms);
    let reports: Vec<(String, anyhow::Result<DriveReport>)> = thread::scope(|scope| {
        let handles: Vec<_> = kernel_model
            .vehicles
            .iter()
            .map(|vehicle_route| {
                let scheduler = &scheduler;
                scope.spawn(move || {
                    let controller = VehicleController::new_shared(vehicle_route.vehicle.as_str());
                    let report = controller.drive_route(scheduler, &vehicle_route.route, step_timeout).map_err(anyhow::Error::from);
                    (vehicle_route.vehicle.to_string(), report)
                })
            })
            .collect();

        handles.into_iter().map(|handle| handle.join().expect("Vehicle thread panicked")).collect()
    });

    println!("{}", "Vehicles".bold());
    for (vehicle, report) in &reports {
        match report {
            Ok(report) => {
                let outcome = match report.outcome {
                    DriveOutcome::Completed => "completed".green(),
                    DriveOutcome::Stalled => "stalled".yellow(),
                    DriveOutcome::Rejected => "rejected".red(),
                };
                let position = report.final_position.as_ref().map(|position| position.to_string()).unwrap_or_else(|| "-".to_string());
                println!("  {:<16} {:<10} {}/{} steps, at {}", vehicle, outcome, report.granted_steps, report.total_steps, position);
            }
            Err(e) => println!("  {:<16} {} {}", vehicle, "error".red(), e),
        }
    }

    let mut allocations: Vec<_> = scheduler.get_allocations()?.into_iter().collect();
    allocations.sort();
    println!("{}", "Allocations".bold());
    for (resource, client) in allocations {
        println!("  {:<24} {}", resource.to_string().cyan(), client);
    }

    let in_flight: usize = scheduler.count_in_flight().values().sum();
    if in_flight > 0 {
        println!("{} allocation attempt(s) still in flight.", in_flight.to_string().yellow());
    }

    scheduler.terminate()?;
    Ok(())
}
