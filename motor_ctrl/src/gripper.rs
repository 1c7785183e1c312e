//! # Gripper component
//!
//! A single actuator driving a gripper through a slider-crank style linkage.
//! Callers work in a normalised opening value in `[0, 1]` (0 = closed,
//! 1 = open); the component remaps that linearly onto the raw motor angle
//! using four calibration constants and issues position-force or MIT
//! commands depending on the configured control mode.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

// External
use log::info;
use std::time::Duration;

// Internal
use can_if::CanIo;
use util::maths::{clamp, lin_map};

use crate::collection::{DmCollection, RxMode};
use crate::encode::{MitParams, PosForceParams};
use crate::motor::{ControlMode, Motor, ParamReg};
use crate::params::GripperParams;
use crate::MotorCtrlError;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Proportional gain used for MIT-mode gripper motions.
const MIT_KP: f64 = 50.0;

/// Derivative gain used for MIT-mode gripper motions.
const MIT_KD: f64 = 1.0;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A gripper with one actuator and a normalised position mapping.
pub struct Gripper {
    collection: DmCollection,
    params: GripperParams,

    /// Current speed limit, adjustable at runtime via `set_limit`.
    ///
    /// Units: radians/second
    limit_speed_rads: f64,

    /// Current per-unit current limit, adjustable at runtime via `set_limit`.
    limit_torque_pu: f64,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Gripper {
    /// Build the gripper from its parameters.
    pub fn new(params: &GripperParams) -> Result<Self, MotorCtrlError> {
        params.are_valid()?;

        let mut collection = DmCollection::new();
        collection.add_motor(Motor::new(
            params.motor.motor_type,
            params.motor.send_can_id,
            params.motor.recv_can_id,
            params.motor.control_mode,
        ))?;

        info!(
            "Gripper initialised (control mode: {:?})",
            params.motor.control_mode
        );

        Ok(Self {
            collection,
            params: params.clone(),
            limit_speed_rads: params.default_speed_rads,
            limit_torque_pu: params.default_torque_pu,
        })
    }

    /// Get the gripper's motor.
    pub fn motor(&self) -> &Motor {
        // The collection is built with exactly one motor
        self.collection.motor(0).unwrap()
    }

    /// Get the current normalised opening from the last observed telemetry.
    pub fn opening(&self) -> f64 {
        self.motor_to_gripper(self.motor().telemetry().position)
    }

    /// Set the receive interpretation for the gripper motor.
    pub fn set_rx_mode(&mut self, mode: RxMode) {
        self.collection.set_rx_mode_all(mode)
    }

    /// Enable the gripper motor.
    pub fn enable<T: CanIo>(&mut self, io: &mut T) -> Result<(), MotorCtrlError> {
        self.collection.enable_all(io)
    }

    /// Disable the gripper motor.
    pub fn disable<T: CanIo>(&mut self, io: &mut T) -> Result<(), MotorCtrlError> {
        self.collection.disable_all(io)
    }

    /// Flash the current motor position as zero.
    pub fn set_zero<T: CanIo>(&mut self, io: &mut T) -> Result<(), MotorCtrlError> {
        self.collection.set_zero_all(io)
    }

    /// Request a state report from the motor.
    pub fn refresh<T: CanIo>(&mut self, io: &mut T) -> Result<(), MotorCtrlError> {
        self.collection.refresh_all(io)
    }

    /// Query the given register on the motor.
    pub fn query_param<T: CanIo>(
        &mut self,
        io: &mut T,
        reg: ParamReg,
    ) -> Result<(), MotorCtrlError> {
        self.collection.query_param_all(io, reg)
    }

    /// Drain available inbound frames and route them to the motor.
    pub fn recv_cycle<T: CanIo>(
        &mut self,
        io: &mut T,
        timeout: Duration,
    ) -> Result<usize, MotorCtrlError> {
        self.collection.recv_cycle(io, timeout)
    }

    /// Set the speed and torque limits applied to subsequent motions.
    ///
    /// Both values are clamped to the configured maxima.
    pub fn set_limit(&mut self, speed_rads: f64, torque_pu: f64) {
        self.limit_speed_rads = clamp(&speed_rads, &0.0, &self.params.max_speed_rads);
        self.limit_torque_pu = clamp(&torque_pu, &0.0, &self.params.max_torque_pu);
    }

    /// Drive the gripper fully open.
    pub fn open<T: CanIo>(&mut self, io: &mut T) -> Result<(), MotorCtrlError> {
        let target = self.params.gripper_open_position;
        self.move_to(io, target, None, None)
    }

    /// Drive the gripper fully closed.
    pub fn close<T: CanIo>(&mut self, io: &mut T) -> Result<(), MotorCtrlError> {
        let target = self.params.gripper_closed_position;
        self.move_to(io, target, None, None)
    }

    /// Grasp: drive slightly beyond closed so the force loop keeps the grip.
    ///
    /// Optional overrides are clamped to the configured maxima.
    pub fn grasp<T: CanIo>(
        &mut self,
        io: &mut T,
        torque_pu: Option<f64>,
        speed_rads: Option<f64>,
    ) -> Result<(), MotorCtrlError> {
        let target = self.params.gripper_grasp_position;
        self.move_to(io, target, speed_rads, torque_pu)
    }

    /// Drive the gripper to a normalised opening.
    ///
    /// Targets outside `[0, 1]` are clamped into range before remapping, so a
    /// demanded 0.0 always lands on the configured closed motor angle and 1.0
    /// on the open angle. Optional speed/torque overrides are clamped to the
    /// configured maxima.
    pub fn set_position<T: CanIo>(
        &mut self,
        io: &mut T,
        position: f64,
        speed_rads: Option<f64>,
        torque_pu: Option<f64>,
    ) -> Result<(), MotorCtrlError> {
        let target = clamp(&position, &0.0, &1.0);
        self.move_to(io, target, speed_rads, torque_pu)
    }

    // ---- PRIVATE ----

    /// Issue the control command driving the motor to a normalised target.
    fn move_to<T: CanIo>(
        &mut self,
        io: &mut T,
        gripper_position: f64,
        speed_rads: Option<f64>,
        torque_pu: Option<f64>,
    ) -> Result<(), MotorCtrlError> {
        let q = self.gripper_to_motor(gripper_position);

        let dq = match speed_rads {
            Some(s) => clamp(&s, &0.0, &self.params.max_speed_rads),
            None => self.limit_speed_rads,
        };
        let i = match torque_pu {
            Some(t) => clamp(&t, &0.0, &self.params.max_torque_pu),
            None => self.limit_torque_pu,
        };

        match self.motor().control_mode() {
            ControlMode::PosForce => self.collection.posforce_control_one(
                io,
                0,
                &PosForceParams { q, dq, i },
            ),
            _ => self.collection.mit_control_one(
                io,
                0,
                &MitParams {
                    kp: MIT_KP,
                    kd: MIT_KD,
                    q,
                    dq: 0.0,
                    tau: 0.0,
                },
            ),
        }
    }

    /// Map a normalised opening onto the raw motor angle.
    fn gripper_to_motor(&self, gripper_position: f64) -> f64 {
        lin_map(
            (
                self.params.gripper_closed_position,
                self.params.gripper_open_position,
            ),
            (
                self.params.motor_closed_position,
                self.params.motor_open_position,
            ),
            gripper_position,
        )
    }

    /// Map a raw motor angle back onto the normalised opening.
    fn motor_to_gripper(&self, motor_position: f64) -> f64 {
        lin_map(
            (
                self.params.motor_closed_position,
                self.params.motor_open_position,
            ),
            (
                self.params.gripper_closed_position,
                self.params.gripper_open_position,
            ),
            motor_position,
        )
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
