/***************************************/
/*        3rd party libraries          */
/***************************************/
use crossbeam_channel as cbc;
use log::{debug, warn};
use std::io::BufRead;
use std::thread::{Builder, JoinHandle};

/***************************************/
/*           Local modules             */
/***************************************/
use crate::shared::{Direction, SimError};

/***************************************/
/*       Public data structures        */
/***************************************/
/// Input from the control surface, applied by the simulation at the next tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    HallCall { floor: u8, direction: Direction },
    CabCall { car_id: usize, floor: u8 },
    OpenDoor(usize),
    CloseDoor(usize),
    Alarm(usize),
    Status,
    Quit,
}

/***************************************/
/*             Public API              */
/***************************************/
pub fn parse_command(line: &str) -> Result<Command, SimError> {
    let words = line.split_whitespace().collect::<Vec<&str>>();
    let command = match words.as_slice() {
        ["hall", floor, direction] => Command::HallCall {
            floor: parse_number(floor)?,
            direction: parse_direction(direction)?,
        },
        ["cab", car, floor] => Command::CabCall {
            car_id: parse_number(car)?,
            floor: parse_number(floor)?,
        },
        ["open", car] => Command::OpenDoor(parse_number(car)?),
        ["close", car] => Command::CloseDoor(parse_number(car)?),
        ["alarm", car] => Command::Alarm(parse_number(car)?),
        ["status"] => Command::Status,
        ["quit"] | ["exit"] => Command::Quit,
        _ => return Err(SimError::InvalidRequest(format!("unknown command '{}'", line.trim()))),
    };
    Ok(command)
}

/// Reads commands from stdin on its own thread until `quit` or end of input.
pub fn spawn_stdin_reader(command_tx: cbc::Sender<Command>) -> std::io::Result<JoinHandle<()>> {
    Builder::new().name("control".into()).spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    warn!("Failed to read command: {}", e);
                    break;
                }
            };
            if line.trim().is_empty() {
                continue;
            }

            match parse_command(&line) {
                Ok(command) => {
                    debug!("Command: {:?}", command);
                    let quit = command == Command::Quit;
                    if command_tx.send(command).is_err() || quit {
                        return;
                    }
                }
                Err(e) => warn!("{}", e),
            }
        }
        let _ = command_tx.send(Command::Quit);
    })
}

/***************************************/
/*              Helpers                */
/***************************************/
fn parse_number<T: std::str::FromStr>(word: &str) -> Result<T, SimError> {
    word.parse::<T>()
        .map_err(|_| SimError::InvalidRequest(format!("'{}' is not a valid number", word)))
}

fn parse_direction(word: &str) -> Result<Direction, SimError> {
    match word {
        "up" | "u" => Ok(Direction::Up),
        "down" | "d" => Ok(Direction::Down),
        _ => Err(SimError::InvalidRequest(format!("'{}' is not up or down", word))),
    }
}

#[cfg(test)]
mod control_tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!(
            parse_command("hall 6 up").unwrap(),
            Command::HallCall {
                floor: 6,
                direction: Direction::Up
            }
        );
        assert_eq!(
            parse_command("  cab 2 7 ").unwrap(),
            Command::CabCall { car_id: 2, floor: 7 }
        );
        assert_eq!(parse_command("open 1").unwrap(), Command::OpenDoor(1));
        assert_eq!(parse_command("close 1").unwrap(), Command::CloseDoor(1));
        assert_eq!(parse_command("alarm 0").unwrap(), Command::Alarm(0));
        assert_eq!(parse_command("status").unwrap(), Command::Status);
        assert_eq!(parse_command("quit").unwrap(), Command::Quit);
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!(matches!(parse_command("hall 3 sideways"), Err(SimError::InvalidRequest(_))));
        assert!(matches!(parse_command("cab one 3"), Err(SimError::InvalidRequest(_))));
        assert!(matches!(parse_command("hall 300 up"), Err(SimError::InvalidRequest(_))));
        assert!(parse_command("fly 3").is_err());
    }
}
