// Test that the flight objects can be sent between threads

use std::sync::Arc;
use std::thread::spawn;

use offboard_lib::config::{FlightConfig, Timeouts};
use offboard_lib::session::FlightSession;
use offboard_lib::sim::{SimConfig, SimulatedLink};
use offboard_lib::Drone;

fn assert_send_sync<T: Send + Sync>() {}

#[test]
fn shared_objects_are_send_and_sync() {
    assert_send_sync::<Drone>();
    assert_send_sync::<FlightSession>();
    assert_send_sync::<SimulatedLink>();
}

#[tokio::test(start_paused = true)]
async fn drone_can_be_sent_to_thread() -> Result<(), Box<dyn std::error::Error>> {
    let link = Arc::new(SimulatedLink::new(SimConfig::default()));

    let drone = Drone::connect(link, &FlightConfig::default().system_address, Timeouts::default())
        .await?;

    let _ = spawn(move || drone).join().unwrap();
    Ok(())
}
