/***************************************/
/*        3rd party libraries          */
/***************************************/
use serde::Deserialize;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/***************************************/
/*       Public data structures        */
/***************************************/
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
    None,
}

impl Direction {
    pub fn opposite(&self) -> Direction {
        match *self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::None => Direction::None,
        }
    }

    /// Index into a `[up, down]` hall call pair.
    pub fn call_index(&self) -> Option<usize> {
        match *self {
            Direction::Up => Some(0),
            Direction::Down => Some(1),
            Direction::None => None,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Direction::Up => write!(f, "up"),
            Direction::Down => write!(f, "down"),
            Direction::None => write!(f, "none"),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CarState {
    #[serde(rename = "idle")]
    Idle,
    #[serde(rename = "movingUp")]
    MovingUp,
    #[serde(rename = "movingDown")]
    MovingDown,
    #[serde(rename = "doorOpening")]
    DoorOpening,
    #[serde(rename = "doorOpen")]
    DoorOpen,
    #[serde(rename = "doorClosing")]
    DoorClosing,
    #[serde(rename = "alarm")]
    Alarm,
}

impl CarState {
    pub fn is_moving(&self) -> bool {
        matches!(self, CarState::MovingUp | CarState::MovingDown)
    }

    /// Stationary with the doors in some phase of their cycle, or idle.
    pub fn is_parked(&self) -> bool {
        matches!(
            self,
            CarState::Idle | CarState::DoorOpening | CarState::DoorOpen | CarState::DoorClosing
        )
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HallCall {
    pub floor: u8,
    pub direction: Direction,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CarStatus {
    pub id: usize,
    pub state: CarState,
    pub floor: u8,
    pub direction: Direction,
    #[serde(rename = "cabRequests")]
    pub cab_requests: Vec<bool>,
    #[serde(rename = "hallUp")]
    pub hall_up: Vec<bool>,
    #[serde(rename = "hallDown")]
    pub hall_down: Vec<bool>,
}

impl CarStatus {
    pub fn new(id: usize, n_floors: u8) -> CarStatus {
        CarStatus {
            id,
            state: CarState::Idle,
            floor: 0,
            direction: Direction::None,
            cab_requests: vec![false; n_floors as usize],
            hall_up: vec![false; n_floors as usize],
            hall_down: vec![false; n_floors as usize],
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct FleetSnapshot {
    pub tick: u64,
    #[serde(rename = "hallCalls")]
    pub hall_calls: Vec<[bool; 2]>,
    pub cars: BTreeMap<usize, CarStatus>,
}

impl FleetSnapshot {
    pub fn new(n_floors: u8) -> FleetSnapshot {
        FleetSnapshot {
            tick: 0,
            hall_calls: vec![[false, false]; n_floors as usize],
            cars: BTreeMap::new(),
        }
    }
}

/// Notifications published by a car for the display surface and dispatcher.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum CarEvent {
    FloorArrived {
        car_id: usize,
        floor: u8,
        direction: Direction,
    },
    FloorChanged {
        car_id: usize,
        floor: u8,
    },
    AlarmTriggered {
        car_id: usize,
    },
    StateChanged(CarStatus),
}
