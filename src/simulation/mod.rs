pub mod clock;
pub mod simulation;

pub use clock::PhaseTimer;
pub use clock::SimTime;
pub use simulation::Simulation;
