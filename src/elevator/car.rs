use crate::config::{ElevatorConfig, TieBreak};
use crate::shared::{CarEvent, CarState, CarStatus, Direction, SimError};
use crate::simulation::PhaseTimer;
use crossbeam_channel as cbc;
use log::{debug, info, warn};
use std::collections::BTreeSet;

/**
 * One elevator car: its position, its pending requests and its door/motion state machine.
 *
 * The car never reads the clock. Door and alarm phases are driven by one-shot `PhaseTimer`s
 * that the car sends out on `timer_tx` and gets back through `handle_timer` once they fire.
 * At most one timer is live per car; arming a new one supersedes the previous one.
 *
 * # Fields
 * - `id`:                  Stable identifier, index of the car in the fleet.
 * - `n_floors`:            Number of floors served; valid floors are `0..n_floors`.
 * - `floor`:               Current floor, changed only by `step`.
 * - `direction`:           Current or most recent travel direction, `None` only when idle.
 * - `state`:               Door/motion state.
 * - `internal_targets`:    Floors requested from inside the car.
 * - `external_up`:         Up hall calls assigned to this car.
 * - `external_down`:       Down hall calls assigned to this car.
 * - `timing`:              Phase durations and tie-break policy.
 * - `generation`:          Bumped every time a timer is armed or cancelled.
 * - `pending_timer`:       The only timer the car will currently accept.
 * - `event_tx`:            Publishes arrivals, alarms and status snapshots.
 * - `timer_tx`:            Hands phase timers to the simulation scheduler.
 */
pub struct Car {
    id: usize,
    n_floors: u8,
    floor: u8,
    direction: Direction,
    state: CarState,
    internal_targets: BTreeSet<u8>,
    external_up: BTreeSet<u8>,
    external_down: BTreeSet<u8>,
    timing: ElevatorConfig,
    generation: u64,
    pending_timer: Option<PhaseTimer>,
    event_tx: cbc::Sender<CarEvent>,
    timer_tx: cbc::Sender<PhaseTimer>,
}

impl Car {
    pub fn new(
        id: usize,
        n_floors: u8,
        config: &ElevatorConfig,
        event_tx: cbc::Sender<CarEvent>,
        timer_tx: cbc::Sender<PhaseTimer>,
    ) -> Car {
        Car {
            id,
            n_floors,
            floor: 0,
            direction: Direction::None,
            state: CarState::Idle,
            internal_targets: BTreeSet::new(),
            external_up: BTreeSet::new(),
            external_down: BTreeSet::new(),
            timing: config.clone(),
            generation: 0,
            pending_timer: None,
            event_tx,
            timer_tx,
        }
    }

    /***************************************/
    /*          Request injection          */
    /***************************************/
    pub fn add_internal_target(&mut self, floor: u8) -> Result<bool, SimError> {
        self.check_floor(floor)?;
        if floor == self.floor || !self.internal_targets.insert(floor) {
            return Ok(false);
        }

        debug!("Car {}: internal target {}", self.id, floor);
        self.after_request_added();
        Ok(true)
    }

    pub fn add_external_request(&mut self, floor: u8, direction: Direction) -> Result<bool, SimError> {
        self.check_floor(floor)?;
        if floor == self.floor {
            return Ok(false);
        }

        let inserted = match direction {
            Direction::Up => self.external_up.insert(floor),
            Direction::Down => self.external_down.insert(floor),
            Direction::None => {
                return Err(SimError::InvalidRequest(format!(
                    "hall call at floor {} has no direction",
                    floor
                )))
            }
        };
        if !inserted {
            return Ok(false);
        }

        debug!("Car {}: {} hall call at {}", self.id, direction, floor);
        self.after_request_added();
        Ok(true)
    }

    fn after_request_added(&mut self) {
        if self.state == CarState::Idle {
            self.decide_next_action();
        } else {
            self.publish_status();
        }
    }

    fn check_floor(&self, floor: u8) -> Result<(), SimError> {
        if floor >= self.n_floors {
            return Err(SimError::FloorOutOfRange {
                floor,
                n_floors: self.n_floors,
            });
        }
        Ok(())
    }

    /***************************************/
    /*           Read accessors            */
    /***************************************/
    pub fn id(&self) -> usize {
        self.id
    }

    pub fn current_floor(&self) -> u8 {
        self.floor
    }

    pub fn state(&self) -> CarState {
        self.state
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn pending_timer(&self) -> Option<PhaseTimer> {
        self.pending_timer
    }

    pub fn has_request_at(&self, floor: u8) -> bool {
        self.internal_targets.contains(&floor)
            || self.external_up.contains(&floor)
            || self.external_down.contains(&floor)
    }

    pub fn has_pending_requests(&self) -> bool {
        !(self.internal_targets.is_empty()
            && self.external_up.is_empty()
            && self.external_down.is_empty())
    }

    pub fn internal_targets(&self) -> &BTreeSet<u8> {
        &self.internal_targets
    }

    pub fn external_requests(&self, direction: Direction) -> Option<&BTreeSet<u8>> {
        match direction {
            Direction::Up => Some(&self.external_up),
            Direction::Down => Some(&self.external_down),
            Direction::None => None,
        }
    }

    pub fn status(&self) -> CarStatus {
        let mut status = CarStatus::new(self.id, self.n_floors);
        status.state = self.state;
        status.floor = self.floor;
        status.direction = self.direction;
        for &f in &self.internal_targets {
            status.cab_requests[f as usize] = true;
        }
        for &f in &self.external_up {
            status.hall_up[f as usize] = true;
        }
        for &f in &self.external_down {
            status.hall_down[f as usize] = true;
        }
        status
    }

    /// Pending stops in the order a sweep from the current floor would serve them.
    pub fn planned_stops(&self) -> Vec<u8> {
        let pending: BTreeSet<u8> = self.all_requests().collect();
        let above: Vec<u8> = pending.iter().copied().filter(|&f| f > self.floor).collect();
        let below: Vec<u8> = pending.iter().rev().copied().filter(|&f| f < self.floor).collect();

        let up_first = match self.direction {
            Direction::Up => true,
            Direction::Down => false,
            Direction::None => {
                self.pick_from_idle(above.first().copied(), below.first().copied()) != Direction::Down
            }
        };

        let mut stops = Vec::with_capacity(pending.len());
        if pending.contains(&self.floor) {
            stops.push(self.floor);
        }
        if up_first {
            stops.extend(above);
            stops.extend(below);
        } else {
            stops.extend(below);
            stops.extend(above);
        }
        stops
    }

    /***************************************/
    /*           State machine             */
    /***************************************/

    /// Moves one floor if the car is travelling; a no-op in every other state.
    pub fn step(&mut self) -> bool {
        let direction = match self.state {
            CarState::MovingUp => Direction::Up,
            CarState::MovingDown => Direction::Down,
            _ => return false,
        };

        let next = match direction {
            Direction::Up if self.floor + 1 < self.n_floors => self.floor + 1,
            Direction::Down if self.floor > 0 => self.floor - 1,
            _ => {
                warn!("Car {}: cannot move {} from floor {}", self.id, direction, self.floor);
                self.state = CarState::Idle;
                self.decide_next_action();
                return false;
            }
        };
        self.floor = next;
        self.send_event(CarEvent::FloorChanged {
            car_id: self.id,
            floor: next,
        });

        let ahead = self.has_requests_beyond(direction);
        let here_internal = self.internal_targets.contains(&next);
        let here_same = self.calls(direction).contains(&next);
        let here_opposite = self.calls(direction.opposite()).contains(&next);

        if here_internal || here_same || (!ahead && here_opposite) {
            let served = if ahead || here_same {
                direction
            } else if here_opposite || self.has_requests_beyond(direction.opposite()) {
                direction.opposite()
            } else {
                Direction::None
            };
            self.arrive(served);
        } else if !ahead {
            // Nothing left this way: reverse in place or go idle, doors stay shut.
            self.state = CarState::Idle;
            self.decide_next_action();
        } else {
            self.publish_status();
        }
        true
    }

    /// Picks the next move for an idle car.
    pub fn decide_next_action(&mut self) {
        if self.state != CarState::Idle {
            return;
        }

        let here = self.floor;
        if let Some(served) = self.served_in_place() {
            self.arrive(served);
            return;
        }

        let up_min = self.all_requests().filter(|&f| f > here).min();
        let down_max = self.all_requests().filter(|&f| f < here).max();
        let next = match (up_min, down_max) {
            (None, None) => Direction::None,
            (Some(_), None) => Direction::Up,
            (None, Some(_)) => Direction::Down,
            // Keep sweeping the way we were going before reversing.
            (Some(_), Some(_)) if self.direction != Direction::None => self.direction,
            (up, down) => self.pick_from_idle(up, down),
        };

        self.direction = next;
        match next {
            Direction::Up => self.set_state(CarState::MovingUp),
            Direction::Down => self.set_state(CarState::MovingDown),
            Direction::None => self.set_state(CarState::Idle),
        }
    }

    /// Direction to serve a request left at the current floor, if it should be served now.
    fn served_in_place(&self) -> Option<Direction> {
        let here = self.floor;
        if !self.has_request_at(here) {
            return None;
        }
        let up_here = self.external_up.contains(&here);
        let down_here = self.external_down.contains(&here);
        let sweeping_on = self.has_requests_beyond(self.direction);

        match self.direction {
            Direction::Up if up_here => Some(Direction::Up),
            Direction::Down if down_here => Some(Direction::Down),
            // An opposite call here waits until the sweep turns around.
            _ if sweeping_on => None,
            _ if up_here => Some(Direction::Up),
            _ if down_here => Some(Direction::Down),
            _ => Some(Direction::None),
        }
    }

    fn pick_from_idle(&self, up_min: Option<u8>, down_max: Option<u8>) -> Direction {
        match (up_min, down_max) {
            (None, None) => Direction::None,
            (Some(_), None) => Direction::Up,
            (None, Some(_)) => Direction::Down,
            (Some(up), Some(down)) => match self.timing.tie_break {
                TieBreak::PreferUp => Direction::Up,
                TieBreak::Nearest => {
                    if up - self.floor <= self.floor - down {
                        Direction::Up
                    } else {
                        Direction::Down
                    }
                }
            },
        }
    }

    fn arrive(&mut self, served: Direction) {
        let floor = self.floor;
        self.internal_targets.remove(&floor);
        match served {
            Direction::Up => {
                self.external_up.remove(&floor);
            }
            Direction::Down => {
                self.external_down.remove(&floor);
            }
            Direction::None => {
                self.external_up.remove(&floor);
                self.external_down.remove(&floor);
            }
        }
        if served != Direction::None {
            self.direction = served;
        }

        info!("Car {} arrived at floor {} ({})", self.id, floor, served);
        self.send_event(CarEvent::FloorArrived {
            car_id: self.id,
            floor,
            direction: served,
        });
        self.open_doors();
    }

    fn open_doors(&mut self) {
        self.set_state(CarState::DoorOpening);
        self.arm_timer(CarState::DoorOpening, self.timing.open_ticks);
    }

    /// Delivers a fired phase timer. Stale or cancelled timers are ignored.
    pub fn handle_timer(&mut self, timer: PhaseTimer) -> bool {
        match self.pending_timer {
            Some(pending) if pending.generation == timer.generation && timer.expected == self.state => {}
            _ => {
                debug!("Car {}: dropping stale {:?} timer", self.id, timer.expected);
                return false;
            }
        }
        self.pending_timer = None;

        match timer.expected {
            CarState::DoorOpening => {
                self.set_state(CarState::DoorOpen);
                self.arm_timer(CarState::DoorOpen, self.timing.dwell_ticks);
            }
            CarState::DoorOpen => {
                self.set_state(CarState::DoorClosing);
                self.arm_timer(CarState::DoorClosing, self.timing.close_ticks);
            }
            CarState::DoorClosing | CarState::Alarm => {
                self.state = CarState::Idle;
                self.decide_next_action();
            }
            _ => return false,
        }
        true
    }

    pub fn handle_open_door(&mut self) -> bool {
        match self.state {
            CarState::Idle | CarState::DoorOpen | CarState::DoorClosing => {
                debug!("Car {}: open door", self.id);
                self.open_doors();
                true
            }
            _ => false,
        }
    }

    pub fn handle_close_door(&mut self) -> bool {
        match self.state {
            CarState::DoorOpen | CarState::DoorOpening => {
                debug!("Car {}: close door", self.id);
                self.set_state(CarState::DoorClosing);
                self.arm_timer(CarState::DoorClosing, self.timing.close_ticks);
                true
            }
            _ => false,
        }
    }

    pub fn handle_alarm(&mut self) {
        warn!("Car {}: alarm at floor {}", self.id, self.floor);
        self.set_state(CarState::Alarm);
        self.arm_timer(CarState::Alarm, self.timing.alarm_ticks);
        self.send_event(CarEvent::AlarmTriggered { car_id: self.id });
    }

    /***************************************/
    /*              Helpers                */
    /***************************************/
    fn arm_timer(&mut self, expected: CarState, delay: u64) {
        self.generation += 1;
        let timer = PhaseTimer {
            car_id: self.id,
            expected,
            generation: self.generation,
            delay,
        };
        self.pending_timer = Some(timer);
        if self.timer_tx.send(timer).is_err() {
            warn!("Car {}: timer scheduler is gone, {:?} timer lost", self.id, expected);
        }
    }

    fn set_state(&mut self, state: CarState) {
        if state != self.state {
            debug!("Car {}: {:?} -> {:?}", self.id, self.state, state);
        }
        self.state = state;
        self.publish_status();
    }

    fn publish_status(&self) {
        self.send_event(CarEvent::StateChanged(self.status()));
    }

    fn send_event(&self, event: CarEvent) {
        if let Err(e) = self.event_tx.send(event) {
            warn!("Car {}: no event listener, dropped {:?}", self.id, e.into_inner());
        }
    }

    fn all_requests(&self) -> impl Iterator<Item = u8> + '_ {
        self.internal_targets
            .iter()
            .chain(self.external_up.iter())
            .chain(self.external_down.iter())
            .copied()
    }

    fn has_requests_beyond(&self, direction: Direction) -> bool {
        match direction {
            Direction::Up => self.all_requests().any(|f| f > self.floor),
            Direction::Down => self.all_requests().any(|f| f < self.floor),
            Direction::None => false,
        }
    }

    fn calls(&self, direction: Direction) -> &BTreeSet<u8> {
        match direction {
            Direction::Down => &self.external_down,
            _ => &self.external_up,
        }
    }

    /***************************************/
    /*            Test helpers             */
    /***************************************/
    #[cfg(test)]
    pub fn test_place(&mut self, floor: u8) {
        self.floor = floor;
    }
}
