//! # Arm component
//!
//! A fixed ordered group of joints sharing one bus, built once from
//! configuration. The arm exposes the collection's broadcast and
//! single-target surface scoped to its joints; joint indices follow the
//! configuration order.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

// External
use log::info;
use std::time::Duration;

// Internal
use can_if::{CanIo, RxFrame};

use crate::collection::{DmCollection, RouteOutcome, RxMode};
use crate::encode::{MitParams, PosForceParams, PosVelParams};
use crate::motor::{ControlMode, Motor, ParamReg};
use crate::params::ArmParams;
use crate::MotorCtrlError;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// An arm of N joints on one bus.
pub struct Arm {
    collection: DmCollection,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Arm {
    /// Build the arm from its parameters.
    pub fn new(params: &ArmParams) -> Result<Self, MotorCtrlError> {
        params.are_valid()?;

        let mut collection = DmCollection::new();
        for motor_params in params.motors.iter() {
            collection.add_motor(Motor::new(
                motor_params.motor_type,
                motor_params.send_can_id,
                motor_params.recv_can_id,
                motor_params.control_mode,
            ))?;
        }

        info!("Arm initialised with {} joints", collection.motor_count());

        Ok(Self { collection })
    }

    /// Get the number of joints.
    pub fn joint_count(&self) -> usize {
        self.collection.motor_count()
    }

    /// Get a joint's motor by index.
    pub fn motor(&self, index: usize) -> Result<&Motor, MotorCtrlError> {
        self.collection.motor(index)
    }

    /// Iterate over the joint motors in joint order.
    pub fn motors(&self) -> impl Iterator<Item = &Motor> {
        self.collection.motors()
    }

    /// Set the receive interpretation for every joint.
    pub fn set_rx_mode_all(&mut self, mode: RxMode) {
        self.collection.set_rx_mode_all(mode)
    }

    /// Set the receive interpretation for one joint.
    pub fn set_rx_mode_one(&mut self, index: usize, mode: RxMode) -> Result<(), MotorCtrlError> {
        self.collection.set_rx_mode_one(index, mode)
    }

    /// Enable every joint.
    pub fn enable_all<T: CanIo>(&mut self, io: &mut T) -> Result<(), MotorCtrlError> {
        self.collection.enable_all(io)
    }

    /// Disable every joint.
    pub fn disable_all<T: CanIo>(&mut self, io: &mut T) -> Result<(), MotorCtrlError> {
        self.collection.disable_all(io)
    }

    /// Flash every joint's current position as its zero.
    pub fn set_zero_all<T: CanIo>(&mut self, io: &mut T) -> Result<(), MotorCtrlError> {
        self.collection.set_zero_all(io)
    }

    /// Request a state report from every joint.
    pub fn refresh_all<T: CanIo>(&mut self, io: &mut T) -> Result<(), MotorCtrlError> {
        self.collection.refresh_all(io)
    }

    /// Query the given register on every joint.
    pub fn query_param_all<T: CanIo>(
        &mut self,
        io: &mut T,
        reg: ParamReg,
    ) -> Result<(), MotorCtrlError> {
        self.collection.query_param_all(io, reg)
    }

    /// Send one MIT demand per joint, in joint order.
    pub fn mit_control_all<T: CanIo>(
        &mut self,
        io: &mut T,
        params: &[MitParams],
    ) -> Result<(), MotorCtrlError> {
        self.collection.mit_control_all(io, params)
    }

    /// Write the control mode register on every joint.
    pub fn set_control_mode_all<T: CanIo>(
        &mut self,
        io: &mut T,
        mode: ControlMode,
    ) -> Result<(), MotorCtrlError> {
        self.collection.set_control_mode_all(io, mode)
    }

    /// Enable one joint.
    pub fn enable_one<T: CanIo>(&mut self, io: &mut T, index: usize) -> Result<(), MotorCtrlError> {
        self.collection.enable_one(io, index)
    }

    /// Disable one joint.
    pub fn disable_one<T: CanIo>(
        &mut self,
        io: &mut T,
        index: usize,
    ) -> Result<(), MotorCtrlError> {
        self.collection.disable_one(io, index)
    }

    /// Flash one joint's current position as its zero.
    pub fn set_zero_one<T: CanIo>(
        &mut self,
        io: &mut T,
        index: usize,
    ) -> Result<(), MotorCtrlError> {
        self.collection.set_zero_one(io, index)
    }

    /// Request a state report from one joint.
    pub fn refresh_one<T: CanIo>(&mut self, io: &mut T, index: usize) -> Result<(), MotorCtrlError> {
        self.collection.refresh_one(io, index)
    }

    /// Query the given register on one joint.
    pub fn query_param_one<T: CanIo>(
        &mut self,
        io: &mut T,
        index: usize,
        reg: ParamReg,
    ) -> Result<(), MotorCtrlError> {
        self.collection.query_param_one(io, index, reg)
    }

    /// Send an MIT demand to one joint.
    pub fn mit_control_one<T: CanIo>(
        &mut self,
        io: &mut T,
        index: usize,
        params: &MitParams,
    ) -> Result<(), MotorCtrlError> {
        self.collection.mit_control_one(io, index, params)
    }

    /// Send a position-velocity demand to one joint.
    pub fn posvel_control_one<T: CanIo>(
        &mut self,
        io: &mut T,
        index: usize,
        params: &PosVelParams,
    ) -> Result<(), MotorCtrlError> {
        self.collection.posvel_control_one(io, index, params)
    }

    /// Send a position-force demand to one joint.
    pub fn posforce_control_one<T: CanIo>(
        &mut self,
        io: &mut T,
        index: usize,
        params: &PosForceParams,
    ) -> Result<(), MotorCtrlError> {
        self.collection.posforce_control_one(io, index, params)
    }

    /// Route one inbound frame to its owning joint.
    pub fn route_inbound(&mut self, frame: &RxFrame) -> Result<RouteOutcome, MotorCtrlError> {
        self.collection.route_inbound(frame)
    }

    /// Drain available inbound frames and route them to the joints.
    pub fn recv_cycle<T: CanIo>(
        &mut self,
        io: &mut T,
        timeout: Duration,
    ) -> Result<usize, MotorCtrlError> {
        self.collection.recv_cycle(io, timeout)
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::motor::MotorType;
    use crate::params::MotorParams;
    use can_if::mock::MockBus;

    fn test_params(joints: u32) -> ArmParams {
        ArmParams {
            motors: (0..joints)
                .map(|i| MotorParams {
                    motor_type: MotorType::Dm4340,
                    send_can_id: 0x01 + i,
                    recv_can_id: 0x11 + i,
                    control_mode: ControlMode::Mit,
                })
                .collect(),
        }
    }

    #[test]
    fn test_build_from_params() {
        let arm = Arm::new(&test_params(7)).unwrap();
        assert_eq!(arm.joint_count(), 7);
        assert_eq!(arm.motor(6).unwrap().send_can_id(), 0x07);
    }

    #[test]
    fn test_empty_params_rejected() {
        assert!(Arm::new(&test_params(0)).is_err());
    }

    #[test]
    fn test_mit_control_all_in_joint_order() {
        let mut arm = Arm::new(&test_params(3)).unwrap();
        let mut bus = MockBus::new();

        let demands = vec![MitParams::default(); 3];
        arm.mit_control_all(&mut bus, &demands).unwrap();

        let ids: Vec<u32> = bus.sent.iter().map(|f| f.id).collect();
        assert_eq!(ids, vec![0x01, 0x02, 0x03]);
    }
}
