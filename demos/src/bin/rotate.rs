// Rotate left and right in place, printing the heading after each rotation

use std::time::Duration;

use clap::Parser;
use demos::{init_logger, FlightArgs};
use offboard_lib::session::FlightSession;

#[derive(Parser, Debug)]
#[command(about = "Rotate in place, then land", long_about = None)]
struct Cli {
    #[command(flatten)]
    flight: FlightArgs,

    /// Number of left/right rotation pairs
    #[arg(long, default_value = "2")]
    repeat: u32,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logger();
    let cli = Cli::parse();
    let degrees = cli.flight.rotation_step;

    let mut session = FlightSession::connect(cli.flight.link(), cli.flight.flight_config()).await?;
    session.takeoff().await?;

    for _ in 0..cli.repeat {
        session.rotate_left(degrees).await?;
        println!("Heading: {:.1}°", session.yaw());
        session.hold(Duration::from_secs(1)).await;

        session.rotate_right(degrees).await?;
        println!("Heading: {:.1}°", session.yaw());
        session.hold(Duration::from_secs(1)).await;
    }

    session.land().await?;
    session.disconnect().await;
    Ok(())
}
