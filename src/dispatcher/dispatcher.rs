/***************************************/
/*        3rd party libraries          */
/***************************************/
use log::{debug, info, warn};

/***************************************/
/*           Local modules             */
/***************************************/
use crate::config::{DispatcherConfig, FallbackPolicy};
use crate::elevator::{Car, Fleet};
use crate::shared::{CarEvent, CarState, Direction, HallCall, SimError};

/***************************************/
/*               Enums                 */
/***************************************/
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Assignment {
    /// The call was handed to this car.
    Assigned(usize),
    /// A car already stood at the floor and reopened its doors instead.
    DoorsReopened(usize),
    /// The same call is still outstanding; nothing changed.
    AlreadyPending,
}

/***************************************/
/*             Public API              */
/***************************************/
pub struct Dispatcher {
    n_floors: u8,
    fallback: FallbackPolicy,
    hall_calls: Vec<[bool; 2]>,
}

impl Dispatcher {
    pub fn new(n_floors: u8, config: &DispatcherConfig) -> Dispatcher {
        Dispatcher {
            n_floors,
            fallback: config.fallback,
            hall_calls: vec![[false, false]; n_floors as usize],
        }
    }

    pub fn assign_external_request(
        &mut self,
        fleet: &mut Fleet,
        floor: u8,
        direction: Direction,
    ) -> Result<Assignment, SimError> {
        if floor >= self.n_floors {
            return Err(SimError::FloorOutOfRange {
                floor,
                n_floors: self.n_floors,
            });
        }
        let index = direction.call_index().ok_or_else(|| {
            SimError::InvalidRequest(format!("hall call at floor {} has no direction", floor))
        })?;
        if fleet.is_empty() {
            warn!("No car available for {} call at floor {}", direction, floor);
            return Err(SimError::NoCarAvailable { floor, direction });
        }

        // Checking if the call has already been handled
        if self.hall_calls[floor as usize][index] {
            debug!("{} call at floor {} already outstanding", direction, floor);
            return Ok(Assignment::AlreadyPending);
        }

        // A car parked at the floor just reopens
        if let Some(car) = fleet
            .iter_mut()
            .find(|car| car.current_floor() == floor && car.state().is_parked())
        {
            car.handle_open_door();
            info!("Car {} reopens at floor {} for {} call", car.id(), floor, direction);
            return Ok(Assignment::DoorsReopened(car.id()));
        }

        let car_id = match self.select_car(fleet, floor, direction) {
            Some(id) => id,
            None => {
                warn!("No car available for {} call at floor {}", direction, floor);
                return Err(SimError::NoCarAvailable { floor, direction });
            }
        };

        fleet.car_mut(car_id)?.add_external_request(floor, direction)?;
        self.hall_calls[floor as usize][index] = true;
        info!("Assigned {} call at floor {} to car {}", direction, floor, car_id);
        Ok(Assignment::Assigned(car_id))
    }

    /// Chooses a car for a call no parked car can answer in place.
    ///
    /// Idle cars win, nearest first. Then cars already travelling toward the floor in
    /// the call's direction. Then the configured fallback. Cars standing at the call
    /// floor are skipped because they would refuse the request.
    pub fn select_car(&self, fleet: &Fleet, floor: u8, direction: Direction) -> Option<usize> {
        let candidates = fleet
            .cars()
            .iter()
            .filter(|car| car.current_floor() != floor)
            .collect::<Vec<&Car>>();

        let distance = |car: &&Car| car.current_floor().abs_diff(floor);

        let idle = candidates
            .iter()
            .copied()
            .filter(|car| car.state() == CarState::Idle)
            .min_by_key(distance);
        if let Some(car) = idle {
            return Some(car.id());
        }

        let passing = candidates
            .iter()
            .copied()
            .filter(|car| match direction {
                Direction::Up => car.state() == CarState::MovingUp && car.current_floor() < floor,
                Direction::Down => car.state() == CarState::MovingDown && car.current_floor() > floor,
                Direction::None => false,
            })
            .min_by_key(distance);
        if let Some(car) = passing {
            return Some(car.id());
        }

        match self.fallback {
            FallbackPolicy::FirstCar => candidates.first().map(|car| car.id()),
            FallbackPolicy::TravelCost => candidates
                .iter()
                .copied()
                .min_by_key(|car| projected_travel(car, floor))
                .map(|car| car.id()),
        }
    }

    /// Clears hall calls served by an arrival. Returns the calls that went dark.
    pub fn handle_event(&mut self, event: &CarEvent) -> Vec<HallCall> {
        let (floor, direction) = match *event {
            CarEvent::FloorArrived {
                floor, direction, ..
            } => (floor, direction),
            _ => return Vec::new(),
        };
        if floor >= self.n_floors {
            return Vec::new();
        }

        let served = match direction {
            Direction::None => vec![Direction::Up, Direction::Down],
            dir => vec![dir],
        };

        let mut cleared = Vec::new();
        for dir in served {
            if let Some(index) = dir.call_index() {
                if self.hall_calls[floor as usize][index] {
                    self.hall_calls[floor as usize][index] = false;
                    cleared.push(HallCall {
                        floor,
                        direction: dir,
                    });
                }
            }
        }
        cleared
    }

    pub fn is_outstanding(&self, floor: u8, direction: Direction) -> bool {
        match (self.hall_calls.get(floor as usize), direction.call_index()) {
            (Some(pair), Some(index)) => pair[index],
            _ => false,
        }
    }

    pub fn hall_calls(&self) -> &[[bool; 2]] {
        &self.hall_calls
    }

    pub fn outstanding(&self) -> Vec<HallCall> {
        let mut calls = Vec::new();
        for (floor, pair) in self.hall_calls.iter().enumerate() {
            for (index, direction) in [Direction::Up, Direction::Down].into_iter().enumerate() {
                if pair[index] {
                    calls.push(HallCall {
                        floor: floor as u8,
                        direction,
                    });
                }
            }
        }
        calls
    }
}

/// Floors a car would cover finishing its current sweep, then driving to `floor`.
pub fn projected_travel(car: &Car, floor: u8) -> u32 {
    let mut cost = 0u32;
    let mut last = car.current_floor();
    for stop in car.planned_stops() {
        cost += last.abs_diff(stop) as u32;
        last = stop;
    }
    cost + last.abs_diff(floor) as u32
}
