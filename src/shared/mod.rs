pub mod error;
pub mod macros;
pub mod structs;

pub use error::SimError;
pub use structs::CarEvent;
pub use structs::CarState;
pub use structs::CarStatus;
pub use structs::Direction;
pub use structs::FleetSnapshot;
pub use structs::HallCall;
