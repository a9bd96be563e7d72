/*
 * Unit tests for dispatcher module
 *
 * The unit tests follows the Arrange, Act, Assert pattern.
 *
 * Tests:
 *  - test_nearest_idle_car_is_assigned
 *  - test_duplicate_hall_call_is_noop_until_cleared
 *  - test_parked_car_reopens_instead_of_dispatching
 *  - test_passing_car_takes_compatible_call
 *  - test_fallback_policies
 *  - test_no_car_available
 *  - test_arrival_clears_matching_calls
 *  - test_invalid_hall_calls
 */

/***************************************/
/*             Unit tests              */
/***************************************/
#[cfg(test)]
mod dispatcher_tests {
    use crate::config::{DispatcherConfig, ElevatorConfig, FallbackPolicy};
    use crate::dispatcher::dispatcher::projected_travel;
    use crate::dispatcher::{Assignment, Dispatcher};
    use crate::elevator::{Car, Fleet};
    use crate::shared::Direction::{Down, Up};
    use crate::shared::{CarEvent, CarState, Direction, HallCall, SimError};
    use crate::simulation::PhaseTimer;
    use crossbeam_channel::{unbounded, Receiver};

    const N_FLOORS: u8 = 10;

    fn setup_fleet(floors: &[u8]) -> (Fleet, Receiver<CarEvent>, Receiver<PhaseTimer>) {
        // Arrange mock channels
        let (event_tx, event_rx) = unbounded::<CarEvent>();
        let (timer_tx, timer_rx) = unbounded::<PhaseTimer>();
        let config = ElevatorConfig::default();

        let cars = floors
            .iter()
            .enumerate()
            .map(|(id, &floor)| {
                let mut car = Car::new(id, N_FLOORS, &config, event_tx.clone(), timer_tx.clone());
                car.test_place(floor);
                car
            })
            .collect::<Vec<Car>>();

        (Fleet::from_cars(cars), event_rx, timer_rx)
    }

    fn setup_dispatcher(fallback: FallbackPolicy) -> Dispatcher {
        Dispatcher::new(N_FLOORS, &DispatcherConfig { fallback })
    }

    #[test]
    fn test_nearest_idle_car_is_assigned() {
        // Arrange
        let (mut fleet, _event_rx, _timer_rx) = setup_fleet(&[0, 5, 9]);
        let mut dispatcher = setup_dispatcher(FallbackPolicy::TravelCost);

        // Act
        let assignment = dispatcher.assign_external_request(&mut fleet, 6, Up);

        // Assert
        assert_eq!(assignment.unwrap(), Assignment::Assigned(1));
        assert!(dispatcher.is_outstanding(6, Up));
        assert!(!dispatcher.is_outstanding(6, Down));
        let car = fleet.car(1).unwrap();
        assert!(car.external_requests(Up).unwrap().contains(&6));
        assert_eq!(car.state(), CarState::MovingUp);
        assert!(!fleet.car(0).unwrap().has_pending_requests());
        assert!(!fleet.car(2).unwrap().has_pending_requests());
    }

    #[test]
    fn test_duplicate_hall_call_is_noop_until_cleared() {
        // Arrange
        let (mut fleet, event_rx, _timer_rx) = setup_fleet(&[0, 5, 9]);
        let mut dispatcher = setup_dispatcher(FallbackPolicy::TravelCost);

        // Act
        let first = dispatcher.assign_external_request(&mut fleet, 6, Up).unwrap();
        let second = dispatcher.assign_external_request(&mut fleet, 6, Up).unwrap();

        // Assert
        assert_eq!(first, Assignment::Assigned(1));
        assert_eq!(second, Assignment::AlreadyPending);
        assert_eq!(dispatcher.outstanding(), vec![HallCall { floor: 6, direction: Up }]);

        // Car 1 reaches floor 6 and the call goes dark
        fleet.car_mut(1).unwrap().step();
        let cleared = event_rx
            .try_iter()
            .flat_map(|event| dispatcher.handle_event(&event))
            .collect::<Vec<HallCall>>();
        assert_eq!(cleared, vec![HallCall { floor: 6, direction: Up }]);
        assert!(dispatcher.outstanding().is_empty());

        // A fresh call now finds car 1 parked there
        let third = dispatcher.assign_external_request(&mut fleet, 6, Up).unwrap();
        assert_eq!(third, Assignment::DoorsReopened(1));
    }

    #[test]
    fn test_parked_car_reopens_instead_of_dispatching() {
        // Arrange
        let (mut fleet, _event_rx, _timer_rx) = setup_fleet(&[0, 5, 9]);
        let mut dispatcher = setup_dispatcher(FallbackPolicy::TravelCost);

        // Act
        let assignment = dispatcher.assign_external_request(&mut fleet, 5, Down).unwrap();

        // Assert
        assert_eq!(assignment, Assignment::DoorsReopened(1));
        assert_eq!(fleet.car(1).unwrap().state(), CarState::DoorOpening);
        assert!(!dispatcher.is_outstanding(5, Down));
        assert!(fleet.cars().iter().all(|car| !car.has_pending_requests()));
    }

    #[test]
    fn test_passing_car_takes_compatible_call() {
        // Arrange
        let (mut fleet, _event_rx, _timer_rx) = setup_fleet(&[0, 9]);
        let mut dispatcher = setup_dispatcher(FallbackPolicy::FirstCar);
        fleet.car_mut(0).unwrap().add_internal_target(9).unwrap();
        fleet.car_mut(1).unwrap().add_internal_target(0).unwrap();

        // Act
        let up_call = dispatcher.assign_external_request(&mut fleet, 4, Up).unwrap();
        let down_call = dispatcher.assign_external_request(&mut fleet, 6, Down).unwrap();

        // Assert
        assert_eq!(up_call, Assignment::Assigned(0));
        assert_eq!(down_call, Assignment::Assigned(1));
    }

    #[test]
    fn test_fallback_policies() {
        // Arrange: car 0 climbs to 9, car 1 drops to 4; an up call at 1 suits neither
        let (mut fleet, _event_rx, _timer_rx) = setup_fleet(&[2, 5]);
        fleet.car_mut(0).unwrap().add_internal_target(9).unwrap();
        fleet.car_mut(1).unwrap().add_internal_target(4).unwrap();
        let first_car = setup_dispatcher(FallbackPolicy::FirstCar);
        let travel_cost = setup_dispatcher(FallbackPolicy::TravelCost);

        // Act
        let by_order = first_car.select_car(&fleet, 1, Up);
        let by_cost = travel_cost.select_car(&fleet, 1, Up);

        // Assert
        assert_eq!(projected_travel(fleet.car(0).unwrap(), 1), 15);
        assert_eq!(projected_travel(fleet.car(1).unwrap(), 1), 4);
        assert_eq!(by_order, Some(0));
        assert_eq!(by_cost, Some(1));
    }

    #[test]
    fn test_no_car_available() {
        // Arrange
        let (mut empty, _event_rx, _timer_rx) = setup_fleet(&[]);
        let (mut busy, _event_rx2, _timer_rx2) = setup_fleet(&[3]);
        busy.car_mut(0).unwrap().handle_alarm();
        let mut dispatcher = setup_dispatcher(FallbackPolicy::TravelCost);

        // Act
        let from_empty = dispatcher.assign_external_request(&mut empty, 3, Up);
        let from_busy = dispatcher.assign_external_request(&mut busy, 3, Up);

        // Assert
        assert!(matches!(
            from_empty,
            Err(SimError::NoCarAvailable { floor: 3, direction: Direction::Up })
        ));
        assert!(matches!(from_busy, Err(SimError::NoCarAvailable { .. })));
        assert!(!dispatcher.is_outstanding(3, Up));
    }

    #[test]
    fn test_arrival_clears_matching_calls() {
        // Arrange
        let (mut fleet, _event_rx, _timer_rx) = setup_fleet(&[0]);
        let mut dispatcher = setup_dispatcher(FallbackPolicy::TravelCost);
        dispatcher.assign_external_request(&mut fleet, 5, Up).unwrap();
        dispatcher.assign_external_request(&mut fleet, 5, Down).unwrap();
        dispatcher.assign_external_request(&mut fleet, 7, Down).unwrap();

        // Act
        let served_down = dispatcher.handle_event(&CarEvent::FloorArrived {
            car_id: 0,
            floor: 7,
            direction: Up,
        });
        let served_idle = dispatcher.handle_event(&CarEvent::FloorArrived {
            car_id: 0,
            floor: 5,
            direction: Direction::None,
        });

        // Assert
        assert!(served_down.is_empty());
        assert!(dispatcher.is_outstanding(7, Down));
        assert_eq!(
            served_idle,
            vec![HallCall { floor: 5, direction: Up }, HallCall { floor: 5, direction: Down }]
        );
        assert_eq!(dispatcher.outstanding(), vec![HallCall { floor: 7, direction: Down }]);
    }

    #[test]
    fn test_invalid_hall_calls() {
        // Arrange
        let (mut fleet, _event_rx, _timer_rx) = setup_fleet(&[0]);
        let mut dispatcher = setup_dispatcher(FallbackPolicy::TravelCost);

        // Act + Assert
        assert!(matches!(
            dispatcher.assign_external_request(&mut fleet, N_FLOORS, Up),
            Err(SimError::FloorOutOfRange { .. })
        ));
        assert!(matches!(
            dispatcher.assign_external_request(&mut fleet, 3, Direction::None),
            Err(SimError::InvalidRequest(_))
        ));
    }
}
