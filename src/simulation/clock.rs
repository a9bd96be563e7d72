/***************************************/
/*        3rd party libraries          */
/***************************************/
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/***************************************/
/*           Local modules             */
/***************************************/
use crate::shared::CarState;

/***************************************/
/*       Public data structures        */
/***************************************/
/// Simulated time, counted in clock ticks since the run started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct SimTime(pub u64);

impl SimTime {
    pub fn after(&self, ticks: u64) -> SimTime {
        SimTime(self.0 + ticks)
    }
}

#[derive(Debug, Default)]
pub struct Clock {
    now: SimTime,
}

impl Clock {
    pub fn new() -> Clock {
        Clock::default()
    }

    pub fn now(&self) -> SimTime {
        self.now
    }

    pub fn advance(&mut self) -> SimTime {
        self.now = self.now.after(1);
        self.now
    }
}

/**
 * A one-shot door or alarm phase timer requested by a car.
 *
 * The car bumps its generation whenever it supersedes a timer, so a timer is
 * only honoured when both `expected` and `generation` still match the car at
 * fire time. Cancelled timers stay in the queue and are dropped on delivery.
 */
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseTimer {
    pub car_id: usize,
    pub expected: CarState,
    pub generation: u64,
    pub delay: u64,
}

#[derive(Debug)]
struct Scheduled {
    at: SimTime,
    seq: u64,
    timer: PhaseTimer,
}

impl PartialEq for Scheduled {
    fn eq(&self, other: &Self) -> bool {
        self.at == other.at && self.seq == other.seq
    }
}

impl Eq for Scheduled {}

impl PartialOrd for Scheduled {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

// Reversed so the max-heap pops the earliest deadline, FIFO among equals.
impl Ord for Scheduled {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .at
            .cmp(&self.at)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

#[derive(Debug, Default)]
pub struct TimerQueue {
    heap: BinaryHeap<Scheduled>,
    seq: u64,
}

impl TimerQueue {
    pub fn new() -> TimerQueue {
        TimerQueue::default()
    }

    pub fn schedule(&mut self, now: SimTime, timer: PhaseTimer) {
        let at = now.after(timer.delay);
        self.heap.push(Scheduled {
            at,
            seq: self.seq,
            timer,
        });
        self.seq += 1;
    }

    /// Pops the next timer whose deadline is at or before `now`.
    pub fn pop_due(&mut self, now: SimTime) -> Option<PhaseTimer> {
        match self.heap.peek() {
            Some(next) if next.at <= now => self.heap.pop().map(|s| s.timer),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}

#[cfg(test)]
mod clock_tests {
    use super::*;

    fn timer(car_id: usize, delay: u64) -> PhaseTimer {
        PhaseTimer {
            car_id,
            expected: CarState::DoorOpening,
            generation: 0,
            delay,
        }
    }

    #[test]
    fn test_timers_fire_in_deadline_order() {
        // Arrange
        let mut queue = TimerQueue::new();
        let now = SimTime(10);
        queue.schedule(now, timer(0, 3));
        queue.schedule(now, timer(1, 1));
        queue.schedule(now, timer(2, 1));

        // Act + Assert
        assert_eq!(queue.pop_due(SimTime(10)), None);
        assert_eq!(queue.pop_due(SimTime(11)).map(|t| t.car_id), Some(1));
        assert_eq!(queue.pop_due(SimTime(11)).map(|t| t.car_id), Some(2));
        assert_eq!(queue.pop_due(SimTime(12)), None);
        assert_eq!(queue.pop_due(SimTime(13)).map(|t| t.car_id), Some(0));
        assert!(queue.is_empty());
    }

    #[test]
    fn test_clock_advances_one_tick() {
        let mut clock = Clock::new();
        assert_eq!(clock.now(), SimTime(0));
        assert_eq!(clock.advance(), SimTime(1));
        assert_eq!(clock.now().after(4), SimTime(5));
    }
}
