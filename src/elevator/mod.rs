pub mod car;
pub mod fleet;

pub use car::Car;
pub use fleet::Fleet;
