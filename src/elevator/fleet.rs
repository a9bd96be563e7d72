use crate::config::Config;
use crate::elevator::Car;
use crate::shared::{CarEvent, SimError};
use crate::simulation::PhaseTimer;
use crossbeam_channel as cbc;
use log::info;

/**
 * The fixed set of cars for one run.
 *
 * The fleet owns every `Car`. Readers (display, dispatcher) borrow it; mutation only goes
 * through the car's own request and override API.
 */
pub struct Fleet {
    cars: Vec<Car>,
}

impl Fleet {
    pub fn new(
        config: &Config,
        event_tx: cbc::Sender<CarEvent>,
        timer_tx: cbc::Sender<PhaseTimer>,
    ) -> Result<Fleet, SimError> {
        config.validate()?;

        let n_floors = config.simulation.n_floors;
        let cars = (0..config.simulation.n_cars)
            .map(|id| Car::new(id, n_floors, &config.elevator, event_tx.clone(), timer_tx.clone()))
            .collect::<Vec<Car>>();

        info!("Fleet of {} cars over {} floors", cars.len(), n_floors);
        Ok(Fleet { cars })
    }

    pub fn cars(&self) -> &[Car] {
        &self.cars
    }

    pub fn is_empty(&self) -> bool {
        self.cars.is_empty()
    }

    pub fn car(&self, id: usize) -> Result<&Car, SimError> {
        self.cars.get(id).ok_or(SimError::UnknownCar(id))
    }

    pub fn car_mut(&mut self, id: usize) -> Result<&mut Car, SimError> {
        self.cars.get_mut(id).ok_or(SimError::UnknownCar(id))
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Car> {
        self.cars.iter_mut()
    }

    #[cfg(test)]
    pub fn from_cars(cars: Vec<Car>) -> Fleet {
        Fleet { cars }
    }
}
