/***************************************/
/*        3rd party libraries          */
/***************************************/
use thiserror::Error;

/***************************************/
/*           Local modules             */
/***************************************/
use crate::shared::Direction;

/***************************************/
/*       Public data structures        */
/***************************************/
#[derive(Error, Debug)]
pub enum SimError {
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("no car available for {direction} call at floor {floor}")]
    NoCarAvailable { floor: u8, direction: Direction },

    #[error("floor {floor} is outside the building (0..{n_floors})")]
    FloorOutOfRange { floor: u8, n_floors: u8 },

    #[error("unknown car {0}")]
    UnknownCar(usize),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("failed to read configuration file: {0}")]
    ConfigRead(#[from] std::io::Error),

    #[error("failed to parse configuration file: {0}")]
    ConfigParse(#[from] toml::de::Error),
}

impl SimError {
    /// Warnings leave the simulation untouched; the caller may retry.
    pub fn is_warning(&self) -> bool {
        matches!(
            self,
            SimError::NoCarAvailable { .. }
                | SimError::FloorOutOfRange { .. }
                | SimError::UnknownCar(_)
                | SimError::InvalidRequest(_)
        )
    }
}
