// Strafe left and right at cruise altitude, optionally flying a box

use std::time::Duration;

use clap::Parser;
use demos::{init_logger, FlightArgs};
use offboard_lib::mission::{self, Mission};

#[derive(Parser, Debug)]
#[command(about = "Strafe left and right, then land", long_about = None)]
struct Cli {
    #[command(flatten)]
    flight: FlightArgs,

    /// Pause after each leg, in seconds
    #[arg(long, default_value = "2")]
    pause: u64,

    /// Fly a square with sides of one step instead
    #[arg(long)]
    square: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logger();
    let cli = Cli::parse();

    let mission = if cli.square {
        Mission::box_pattern(cli.flight.step)
    } else {
        Mission::strafe(cli.flight.step, Duration::from_secs(cli.pause))
    };

    for (i, step) in mission.steps().iter().enumerate() {
        println!("{:2}: {}", i + 1, step);
    }
    mission::fly(cli.flight.link(), cli.flight.flight_config(), &mission).await?;

    println!("Mission '{}' complete", mission.name());
    Ok(())
}
