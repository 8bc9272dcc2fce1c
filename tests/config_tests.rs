//! Configuration loading and board bring-up from TOML.

mod common;

use common::{NoDelay, SimulatedBoard};
use stepper_board::config::{parse_config, validate_config, SystemConfig};
use stepper_board::error::ConfigError;
use stepper_board::protocol::Opcode;
use stepper_board::{load_config, BoardSystem, Error, Microsteps};

const FULL_CONFIG: &str = r#"
[transport]
max_attempts = 5
response_delay_us = 200

[wait]
poll_interval_ms = 5
timeout_ms = 30000

[boards.gantry]
address = 0
microstepping = 8
enabled = true

[[boards.gantry.axes]]
axis = 0
speed_steps_per_sec = 1600.0
acceleration_steps_per_sec2 = 3200.0
steps_per_millimeter = 64.0

[[boards.gantry.axes]]
axis = 1
steps_per_revolution = 1600.0

[boards.turret]
address = 3
"#;

#[test]
fn parse_full_config() {
    let config = parse_config(FULL_CONFIG).expect("Should parse full config");

    assert_eq!(config.transport.max_attempts, 5);
    assert_eq!(config.transport.response_delay_us, 200);
    assert_eq!(config.wait.poll_interval_ms, 5);
    assert_eq!(config.wait.timeout_ms, Some(30000));

    let gantry = config.board("gantry").expect("Gantry should exist");
    assert_eq!(gantry.address.bus_address(), 0x20);
    assert_eq!(gantry.microstepping, Some(Microsteps::EIGHTH));
    assert!(gantry.enabled);
    assert_eq!(gantry.axes.len(), 2);
    let x = gantry.axis(0).unwrap();
    assert_eq!(x.speed, Some(1600.0));
    assert_eq!(x.acceleration, Some(3200.0));

    let turret = config.board("turret").expect("Turret should exist");
    assert_eq!(turret.address.bus_address(), 0x23);
    assert!(!turret.enabled);
}

#[test]
fn empty_config_uses_defaults() {
    let config = parse_config("").unwrap();
    assert_eq!(config.board_names().count(), 0);
    assert_eq!(config.transport.max_attempts, 3);
    assert_eq!(config.wait.timeout_ms, None);
}

#[test]
fn board_address_out_of_range() {
    let toml = r#"
[boards.gantry]
address = 4
"#;
    assert!(matches!(
        parse_config(toml),
        Err(Error::Config(ConfigError::ParseError(_)))
    ));
}

#[test]
fn axis_out_of_range() {
    let toml = r#"
[boards.gantry]
address = 0

[[boards.gantry.axes]]
axis = 3
"#;
    assert!(parse_config(toml).is_err());
}

#[test]
fn duplicate_board_address() {
    let toml = r#"
[boards.left]
address = 1

[boards.right]
address = 1
"#;
    assert_eq!(
        parse_config(toml).unwrap_err(),
        Error::Config(ConfigError::DuplicateBoardAddress(1))
    );
}

#[test]
fn duplicate_axis() {
    let toml = r#"
[boards.gantry]
address = 0

[[boards.gantry.axes]]
axis = 2

[[boards.gantry.axes]]
axis = 2
"#;
    assert!(matches!(
        parse_config(toml),
        Err(Error::Config(ConfigError::DuplicateAxis { axis: 2, .. }))
    ));
}

#[test]
fn non_positive_values_rejected() {
    let toml = r#"
[boards.gantry]
address = 0

[[boards.gantry.axes]]
axis = 0
steps_per_millimeter = -64.0
"#;
    assert!(matches!(
        parse_config(toml),
        Err(Error::Config(ConfigError::InvalidScaleFactor(_)))
    ));

    let toml = r#"
[wait]
poll_interval_ms = 0
"#;
    assert_eq!(
        parse_config(toml).unwrap_err(),
        Error::Config(ConfigError::InvalidPollInterval(0))
    );
}

#[test]
fn validate_default_config() {
    assert!(validate_config(&SystemConfig::default()).is_ok());
}

#[test]
fn load_config_from_file() {
    let path = std::env::temp_dir().join("stepper_board_load_config_test.toml");
    std::fs::write(&path, FULL_CONFIG).unwrap();

    let config = load_config(&path).unwrap();
    std::fs::remove_file(&path).ok();

    assert!(config.board("turret").is_some());
}

#[test]
fn load_missing_file() {
    let result = load_config("/nonexistent/stepper_board.toml");
    assert!(matches!(
        result,
        Err(Error::Config(ConfigError::IoError(_)))
    ));
}

#[test]
fn register_board_pushes_configuration() {
    let config = parse_config(FULL_CONFIG).unwrap();
    let mut system = BoardSystem::from_config(config);
    let sim = SimulatedBoard::new(0);

    let board = system
        .register_board("gantry", sim.clone(), NoDelay::default())
        .unwrap();

    assert!(system.is_registered("gantry"));
    assert!(!system.is_registered("turret"));
    assert_eq!(system.registered_count(), 1);
    assert_eq!(system.registered_address("gantry").unwrap().value(), 0);

    assert_eq!(board.name(), "gantry");
    assert_eq!(board.wait_config().poll_interval_ms, 5);
    assert_eq!(board.axis_config(0).unwrap().steps_per_millimeter, Some(64.0));
    assert_eq!(board.axis_config(1).unwrap().steps_per_revolution, Some(1600.0));
    assert_eq!(board.axis_config(2).unwrap().microsteps, Microsteps::EIGHTH);

    assert_eq!(
        sim.opcodes(),
        vec![
            Opcode::Initialize,
            Opcode::SetMicrostepping,
            Opcode::SetSpeed,
            Opcode::SetAcceleration,
            Opcode::EnableMotors,
        ]
    );
    let state = sim.state();
    assert_eq!(state.microstepping, 8);
    assert!(state.enabled);
    assert_eq!(state.axes[0].speed, 1600.0);
    assert_eq!(state.axes[0].acceleration, 3200.0);
}

#[test]
fn register_unknown_board() {
    let mut system = BoardSystem::from_config(SystemConfig::default());
    let result = system.register_board("feeder", SimulatedBoard::new(0), NoDelay::default());
    assert!(matches!(
        result,
        Err(Error::Config(ConfigError::BoardNotFound(_)))
    ));
}
