//! # Motor control parameters
//!
//! Parameter structures deserialised from the TOML files under `params/`.
//! Validation happens once at component construction; a bad file is a fatal
//! configuration error, not something to recover from at runtime.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

// External
use serde::Deserialize;
use thiserror::Error;

// Internal
use crate::motor::{ControlMode, MotorType};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Configuration for a single motor on the bus.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct MotorParams {
    /// The motor type, selecting the physical limit set.
    pub motor_type: MotorType,

    /// Identifier used when addressing the motor.
    pub send_can_id: u32,

    /// Identifier the motor replies from.
    pub recv_can_id: u32,

    /// Default control mode for the motor.
    pub control_mode: ControlMode,
}

/// Configuration for the arm component.
#[derive(Debug, Clone, Deserialize)]
pub struct ArmParams {
    /// The arm's joints, in joint order. This order fixes the broadcast
    /// order on the bus.
    pub motors: Vec<MotorParams>,
}

/// Configuration for the gripper component.
#[derive(Debug, Clone, Deserialize)]
pub struct GripperParams {
    /// The gripper's single actuator.
    pub motor: MotorParams,

    // ---- POSITION MAPPING ----

    /// Normalised opening considered fully open.
    ///
    /// Units: normalised opening (0 = closed, 1 = open)
    pub gripper_open_position: f64,

    /// Normalised opening considered fully closed.
    ///
    /// Units: normalised opening
    pub gripper_closed_position: f64,

    /// Normalised target used when grasping, slightly beyond closed so the
    /// force loop keeps squeezing.
    ///
    /// Units: normalised opening
    pub gripper_grasp_position: f64,

    /// Raw motor angle at the fully open position.
    ///
    /// Units: radians
    pub motor_open_position: f64,

    /// Raw motor angle at the fully closed position.
    ///
    /// Units: radians
    pub motor_closed_position: f64,

    // ---- LIMITS ----

    /// Default speed limit applied to motions.
    ///
    /// Units: radians/second
    pub default_speed_rads: f64,

    /// Default per-unit current limit applied to motions.
    ///
    /// Units: per-unit, `[0, 1]`
    pub default_torque_pu: f64,

    /// Hard ceiling for per-call speed overrides.
    ///
    /// Units: radians/second
    pub max_speed_rads: f64,

    /// Hard ceiling for per-call torque overrides.
    ///
    /// Units: per-unit, `[0, 1]`
    pub max_torque_pu: f64,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Errors raised by parameter validation.
#[derive(Debug, Error)]
pub enum ParamsError {
    #[error("Expected at least one motor in the configuration")]
    NoMotors,

    #[error("Gripper calibration is degenerate: {0}")]
    DegenerateCalibration(&'static str),

    #[error("Limit `{name}` must be strictly positive, found {value}")]
    NonPositiveLimit { name: &'static str, value: f64 },

    #[error("Per-unit torque `{name}` must lie in (0, 1], found {value}")]
    TorquePuOutOfRange { name: &'static str, value: f64 },
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl ArmParams {
    /// Check the parameters are valid.
    pub fn are_valid(&self) -> Result<(), ParamsError> {
        if self.motors.is_empty() {
            return Err(ParamsError::NoMotors);
        }

        Ok(())
    }
}

impl GripperParams {
    /// Check the parameters are valid.
    pub fn are_valid(&self) -> Result<(), ParamsError> {
        if self.gripper_open_position == self.gripper_closed_position {
            return Err(ParamsError::DegenerateCalibration(
                "open and closed normalised positions are equal",
            ));
        }

        if self.motor_open_position == self.motor_closed_position {
            return Err(ParamsError::DegenerateCalibration(
                "open and closed motor angles are equal",
            ));
        }

        for &(name, value) in &[
            ("default_speed_rads", self.default_speed_rads),
            ("max_speed_rads", self.max_speed_rads),
        ] {
            if value <= 0.0 {
                return Err(ParamsError::NonPositiveLimit { name, value });
            }
        }

        for &(name, value) in &[
            ("default_torque_pu", self.default_torque_pu),
            ("max_torque_pu", self.max_torque_pu),
        ] {
            if value <= 0.0 || value > 1.0 {
                return Err(ParamsError::TorquePuOutOfRange { name, value });
            }
        }

        Ok(())
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    const GRIPPER_TOML: &str = r#"
        gripper_open_position = 1.0
        gripper_closed_position = 0.0
        gripper_grasp_position = -0.1
        motor_open_position = -1.0472
        motor_closed_position = 0.0
        default_speed_rads = 5.0
        default_torque_pu = 0.3
        max_speed_rads = 10.0
        max_torque_pu = 1.0

        [motor]
        motor_type = "Dm4310"
        send_can_id = 0x8
        recv_can_id = 0x18
        control_mode = "PosForce"
    "#;

    #[test]
    fn test_gripper_params_from_toml() {
        let params: GripperParams = toml::from_str(GRIPPER_TOML).unwrap();
        params.are_valid().unwrap();

        assert_eq!(params.motor.motor_type, MotorType::Dm4310);
        assert_eq!(params.motor.control_mode, ControlMode::PosForce);
        assert_eq!(params.motor_open_position, -1.0472);
    }

    #[test]
    fn test_unknown_motor_type_rejected() {
        let toml_str = GRIPPER_TOML.replace("Dm4310", "Dm9999");
        assert!(toml::from_str::<GripperParams>(&toml_str).is_err());
    }

    #[test]
    fn test_degenerate_calibration_rejected() {
        let mut params: GripperParams = toml::from_str(GRIPPER_TOML).unwrap();
        params.motor_open_position = params.motor_closed_position;
        assert!(matches!(
            params.are_valid(),
            Err(ParamsError::DegenerateCalibration(_))
        ));
    }

    #[test]
    fn test_arm_params_need_motors() {
        let params = ArmParams { motors: vec![] };
        assert!(matches!(params.are_valid(), Err(ParamsError::NoMotors)));
    }
}
