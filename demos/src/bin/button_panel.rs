// Interactive key panel: each line typed on stdin is one button press forwarded to the
// sequencer thread. 'q' or end of input shuts down, landing first if needed.

use clap::Parser;
use demos::{init_logger, FlightArgs};
use offboard_lib::sequencer::{Command, SequencerHandle};

#[derive(Parser, Debug)]
#[command(about = "Fly with one-shot commands typed on the keyboard", long_about = None)]
struct Cli {
    #[command(flatten)]
    flight: FlightArgs,
}

const PANEL: &str = "\
 t: takeoff        l: land
 a: move left      d: move right
 w: move forward   s: move backward
 z: rotate left    c: rotate right
 r: climb          f: descend
 q: quit
";

fn command(key: &str) -> Option<Command> {
    match key {
        "t" => Some(Command::Takeoff),
        "l" => Some(Command::Land),
        "a" => Some(Command::MoveLeft),
        "d" => Some(Command::MoveRight),
        "w" => Some(Command::MoveForward),
        "s" => Some(Command::MoveBackward),
        "z" => Some(Command::RotateLeft),
        "c" => Some(Command::RotateRight),
        "r" => Some(Command::Climb),
        "f" => Some(Command::Descend),
        _ => None,
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logger();
    let cli = Cli::parse();

    let sequencer = SequencerHandle::spawn(cli.flight.link(), cli.flight.flight_config())?;

    let events = sequencer.events();
    std::thread::spawn(move || {
        for event in events.iter() {
            println!("> {}", event);
        }
    });

    print!("{}", PANEL);
    for line in std::io::stdin().lines() {
        let line = line?;
        let key = line.trim();
        if key == "q" {
            break;
        }
        match command(key) {
            Some(command) => sequencer.send(command)?,
            None if key.is_empty() => (),
            None => println!("Unknown key '{}'", key),
        }
    }

    sequencer.shutdown();
    Ok(())
}
