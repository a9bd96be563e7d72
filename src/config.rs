/***************************************/
/*        3rd party libraries          */
/***************************************/
use serde::Deserialize;
use std::fs;
use std::path::Path;

/***************************************/
/*           Local modules             */
/***************************************/
use crate::shared::SimError;

/***************************************/
/*       Public data structures        */
/***************************************/
#[derive(Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    pub simulation: SimulationConfig,
    pub elevator: ElevatorConfig,
    pub dispatcher: DispatcherConfig,
}

#[derive(Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct SimulationConfig {
    pub n_cars: usize,
    pub n_floors: u8,
    pub tick_ms: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig {
            n_cars: 5,
            n_floors: 20,
            tick_ms: 600,
        }
    }
}

/// Door and alarm phase durations, counted in clock ticks.
#[derive(Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct ElevatorConfig {
    pub open_ticks: u64,
    pub dwell_ticks: u64,
    pub close_ticks: u64,
    pub alarm_ticks: u64,
    pub tie_break: TieBreak,
}

impl Default for ElevatorConfig {
    fn default() -> Self {
        ElevatorConfig {
            open_ticks: 2,
            dwell_ticks: 3,
            close_ticks: 2,
            alarm_ticks: 5,
            tie_break: TieBreak::PreferUp,
        }
    }
}

/// Direction picked by an idle car with pending stops on both sides.
#[derive(Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TieBreak {
    PreferUp,
    Nearest,
}

#[derive(Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct DispatcherConfig {
    pub fallback: FallbackPolicy,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        DispatcherConfig {
            fallback: FallbackPolicy::TravelCost,
        }
    }
}

/// How a hall call is placed when no idle or passing car can take it.
#[derive(Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FallbackPolicy {
    FirstCar,
    TravelCost,
}

/***************************************/
/*             Public API              */
/***************************************/
pub fn load_config(path: &Path) -> Result<Config, SimError> {
    let config_str = fs::read_to_string(path)?;
    parse_config(&config_str)
}

pub fn parse_config(config_str: &str) -> Result<Config, SimError> {
    let config: Config = toml::from_str(config_str)?;
    Ok(config)
}

impl Config {
    pub fn validate(&self) -> Result<(), SimError> {
        if self.simulation.n_cars == 0 {
            return Err(SimError::InvalidConfiguration(
                "car count must be positive".to_string(),
            ));
        }
        if self.simulation.n_floors < 2 {
            return Err(SimError::InvalidConfiguration(format!(
                "floor count must be at least 2, got {}",
                self.simulation.n_floors
            )));
        }

        let phases = [
            ("open_ticks", self.elevator.open_ticks),
            ("dwell_ticks", self.elevator.dwell_ticks),
            ("close_ticks", self.elevator.close_ticks),
            ("alarm_ticks", self.elevator.alarm_ticks),
        ];
        for (name, ticks) in phases {
            if ticks == 0 {
                return Err(SimError::InvalidConfiguration(format!(
                    "{} must be at least one tick",
                    name
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod config_tests {
    use super::*;

    #[test]
    fn test_parse_partial_config_keeps_defaults() {
        // Arrange
        let input = r#"
            [simulation]
            n_cars = 3
            n_floors = 10

            [elevator]
            tie_break = "nearest"

            [dispatcher]
            fallback = "first_car"
        "#;

        // Act
        let config = parse_config(input).unwrap();

        // Assert
        assert_eq!(config.simulation.n_cars, 3);
        assert_eq!(config.simulation.n_floors, 10);
        assert_eq!(config.simulation.tick_ms, 600);
        assert_eq!(config.elevator.tie_break, TieBreak::Nearest);
        assert_eq!(config.elevator.dwell_ticks, 3);
        assert_eq!(config.dispatcher.fallback, FallbackPolicy::FirstCar);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_counts() {
        let mut config = Config::default();
        config.simulation.n_cars = 0;
        assert!(matches!(
            config.validate(),
            Err(SimError::InvalidConfiguration(_))
        ));

        let mut config = Config::default();
        config.simulation.n_floors = 1;
        assert!(matches!(
            config.validate(),
            Err(SimError::InvalidConfiguration(_))
        ));

        let mut config = Config::default();
        config.elevator.close_ticks = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_parse_garbage_is_parse_error() {
        assert!(matches!(
            parse_config("simulation = 3 ="),
            Err(SimError::ConfigParse(_))
        ));
    }
}
