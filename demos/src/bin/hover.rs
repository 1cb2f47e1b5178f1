// Connect, take off, hover in offboard mode and land

use std::time::Duration;

use clap::Parser;
use demos::{init_logger, FlightArgs};
use offboard_lib::mission::{self, Mission};

#[derive(Parser, Debug)]
#[command(about = "Take off, hover and land", long_about = None)]
struct Cli {
    #[command(flatten)]
    flight: FlightArgs,

    /// Hover duration, in seconds
    #[arg(long, default_value = "40")]
    duration: u64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logger();
    let cli = Cli::parse();

    let mission = Mission::hover(Duration::from_secs(cli.duration));
    mission::fly(cli.flight.link(), cli.flight.flight_config(), &mission).await?;

    println!("Hover complete, vehicle landed");
    Ok(())
}
