/***************************************/
/*        3rd party libraries          */
/***************************************/
use crossbeam_channel as cbc;
use log::{debug, warn};

/***************************************/
/*           Local modules             */
/***************************************/
use crate::config::Config;
use crate::control::Command;
use crate::dispatcher::{Assignment, Dispatcher};
use crate::elevator::Fleet;
use crate::shared::{CarEvent, CarState, Direction, FleetSnapshot, SimError};
use crate::simulation::clock::{Clock, PhaseTimer, SimTime, TimerQueue};

/**
 * Single-threaded event loop for one run.
 *
 * Every mutation is serialised through this struct: commands are applied between ticks,
 * and each `tick` first delivers due phase timers, then steps every car one floor, then
 * hands the resulting events to the dispatcher before returning them to the caller.
 *
 * # Fields
 * - `clock`:       Simulated time.
 * - `timers`:      Pending phase timers, earliest first.
 * - `fleet`:       All cars.
 * - `dispatcher`:  Hall call bookkeeping and car selection.
 * - `event_rx`:    Events published by the cars.
 * - `timer_rx`:    Timers armed by the cars, waiting to be scheduled.
 */
pub struct Simulation {
    clock: Clock,
    timers: TimerQueue,
    fleet: Fleet,
    dispatcher: Dispatcher,
    event_rx: cbc::Receiver<CarEvent>,
    timer_rx: cbc::Receiver<PhaseTimer>,
}

impl Simulation {
    pub fn new(config: &Config) -> Result<Simulation, SimError> {
        let (event_tx, event_rx) = cbc::unbounded::<CarEvent>();
        let (timer_tx, timer_rx) = cbc::unbounded::<PhaseTimer>();

        let fleet = Fleet::new(config, event_tx, timer_tx)?;
        let dispatcher = Dispatcher::new(config.simulation.n_floors, &config.dispatcher);

        Ok(Simulation {
            clock: Clock::new(),
            timers: TimerQueue::new(),
            fleet,
            dispatcher,
            event_rx,
            timer_rx,
        })
    }

    pub fn now(&self) -> SimTime {
        self.clock.now()
    }

    pub fn fleet(&self) -> &Fleet {
        &self.fleet
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /***************************************/
    /*              Commands               */
    /***************************************/
    pub fn hall_call(&mut self, floor: u8, direction: Direction) -> Result<Assignment, SimError> {
        let assignment = self
            .dispatcher
            .assign_external_request(&mut self.fleet, floor, direction);
        self.schedule_timers();
        assignment
    }

    pub fn cab_call(&mut self, car_id: usize, floor: u8) -> Result<bool, SimError> {
        let added = self.fleet.car_mut(car_id)?.add_internal_target(floor);
        self.schedule_timers();
        added
    }

    pub fn open_door(&mut self, car_id: usize) -> Result<bool, SimError> {
        let opened = self.fleet.car_mut(car_id)?.handle_open_door();
        self.schedule_timers();
        Ok(opened)
    }

    pub fn close_door(&mut self, car_id: usize) -> Result<bool, SimError> {
        let closed = self.fleet.car_mut(car_id)?.handle_close_door();
        self.schedule_timers();
        Ok(closed)
    }

    pub fn alarm(&mut self, car_id: usize) -> Result<(), SimError> {
        self.fleet.car_mut(car_id)?.handle_alarm();
        self.schedule_timers();
        Ok(())
    }

    pub fn apply(&mut self, command: &Command) -> Result<(), SimError> {
        match *command {
            Command::HallCall { floor, direction } => self.hall_call(floor, direction).map(|_| ()),
            Command::CabCall { car_id, floor } => self.cab_call(car_id, floor).map(|_| ()),
            Command::OpenDoor(car_id) => self.open_door(car_id).map(|_| ()),
            Command::CloseDoor(car_id) => self.close_door(car_id).map(|_| ()),
            Command::Alarm(car_id) => self.alarm(car_id),
            Command::Status | Command::Quit => Ok(()),
        }
    }

    /***************************************/
    /*             Event loop              */
    /***************************************/
    pub fn tick(&mut self) -> Vec<CarEvent> {
        let now = self.clock.advance();
        self.schedule_timers();

        while let Some(timer) = self.timers.pop_due(now) {
            match self.fleet.car_mut(timer.car_id) {
                Ok(car) => {
                    car.handle_timer(timer);
                }
                Err(e) => warn!("Timer for {}", e),
            }
            self.schedule_timers();
        }

        for car in self.fleet.iter_mut() {
            car.step();
        }
        self.schedule_timers();

        self.drain_events()
    }

    /// Ticks until every car is idle with nothing pending, or `max_ticks` have passed.
    /// Returns the events produced along the way.
    pub fn run_until_idle(&mut self, max_ticks: u64) -> Vec<CarEvent> {
        let mut events = self.drain_events();
        for _ in 0..max_ticks {
            if self.is_quiescent() {
                break;
            }
            events.extend(self.tick());
        }
        events
    }

    pub fn is_quiescent(&self) -> bool {
        self.fleet.cars().iter().all(|car| {
            car.state() == CarState::Idle && !car.has_pending_requests() && car.pending_timer().is_none()
        })
    }

    pub fn snapshot(&self) -> FleetSnapshot {
        let n_floors = self.dispatcher.hall_calls().len() as u8;
        let mut snapshot = FleetSnapshot::new(n_floors);
        snapshot.tick = self.clock.now().0;
        snapshot.hall_calls = self.dispatcher.hall_calls().to_vec();
        for car in self.fleet.cars() {
            snapshot.cars.insert(car.id(), car.status());
        }
        snapshot
    }

    /***************************************/
    /*              Helpers                */
    /***************************************/
    fn schedule_timers(&mut self) {
        let now = self.clock.now();
        for timer in self.timer_rx.try_iter() {
            debug!("Car {}: {:?} timer in {} ticks", timer.car_id, timer.expected, timer.delay);
            self.timers.schedule(now, timer);
        }
    }

    fn drain_events(&mut self) -> Vec<CarEvent> {
        let events = self.event_rx.try_iter().collect::<Vec<CarEvent>>();
        for event in &events {
            for call in self.dispatcher.handle_event(event) {
                debug!("{} call at floor {} cleared", call.direction, call.floor);
            }
        }
        events
    }
}
