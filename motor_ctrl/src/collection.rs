//! # Device collection and dispatcher
//!
//! Owns an ordered set of motors sharing one bus. Broadcast operations send
//! one frame per motor in registration order, which fixes the wire-traffic
//! ordering and keeps test logs reproducible. Inbound frames are routed back
//! to the owning motor by receive identifier and decoded according to that
//! motor's current receive interpretation.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

// External
use log::{trace, warn};
use std::collections::HashMap;
use std::time::Duration;

// Internal
use can_if::{CanIo, RxFrame};

use crate::decode;
use crate::encode::{self, MitParams, PosForceParams, PosVelParams};
use crate::motor::{ControlMode, Motor, ParamReg};
use crate::MotorCtrlError;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// One motor together with its receive interpretation.
#[derive(Debug, Clone)]
struct MotorDevice {
    motor: Motor,
    rx_mode: Option<RxMode>,
}

/// An ordered collection of Damiao motors on one bus.
#[derive(Debug, Default)]
pub struct DmCollection {
    /// Devices in registration order. This order is the broadcast order.
    devices: Vec<MotorDevice>,

    /// Map from receive identifier to index in `devices`.
    recv_id_map: HashMap<u32, usize>,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// How inbound payloads for a device are to be interpreted.
///
/// There is no default: frames cannot be decoded until the caller has set a
/// mode, since telemetry and parameter replies share the same wire bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RxMode {
    /// Payloads are telemetry (position/velocity/torque/temperatures).
    Telemetry,

    /// Payloads are parameter query replies.
    Parameter,
}

/// The outcome of routing one inbound frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteOutcome {
    /// The frame updated a motor's cached telemetry.
    Telemetry,

    /// The frame updated a motor's cached parameter map.
    Parameter,

    /// No motor owns the frame's identifier; the frame was discarded.
    Unroutable,

    /// The payload was malformed; the owning motor's cache was not touched.
    Invalid,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl DmCollection {
    /// Create an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a motor.
    ///
    /// Registration order is the broadcast order. The motor's receive
    /// identifier must not already be registered.
    pub fn add_motor(&mut self, motor: Motor) -> Result<(), MotorCtrlError> {
        let recv_id = motor.recv_can_id();

        if self.recv_id_map.contains_key(&recv_id) {
            return Err(MotorCtrlError::DuplicateRecvId(recv_id));
        }

        self.recv_id_map.insert(recv_id, self.devices.len());
        self.devices.push(MotorDevice {
            motor,
            rx_mode: None,
        });

        Ok(())
    }

    /// Get the number of registered motors.
    pub fn motor_count(&self) -> usize {
        self.devices.len()
    }

    /// Get a motor by collection index.
    pub fn motor(&self, index: usize) -> Result<&Motor, MotorCtrlError> {
        self.devices
            .get(index)
            .map(|d| &d.motor)
            .ok_or(MotorCtrlError::IndexOutOfRange(index))
    }

    /// Iterate over the motors in registration order.
    pub fn motors(&self) -> impl Iterator<Item = &Motor> {
        self.devices.iter().map(|d| &d.motor)
    }

    // ---- RECEIVE INTERPRETATION ----

    /// Set the receive interpretation for one motor.
    pub fn set_rx_mode_one(&mut self, index: usize, mode: RxMode) -> Result<(), MotorCtrlError> {
        let device = self
            .devices
            .get_mut(index)
            .ok_or(MotorCtrlError::IndexOutOfRange(index))?;
        device.rx_mode = Some(mode);
        Ok(())
    }

    /// Set the receive interpretation for every motor.
    ///
    /// Only affects frames received after the switch.
    pub fn set_rx_mode_all(&mut self, mode: RxMode) {
        for device in self.devices.iter_mut() {
            device.rx_mode = Some(mode);
        }
    }

    // ---- BROADCAST OPERATIONS ----

    /// Enable every motor, in registration order.
    pub fn enable_all<T: CanIo>(&mut self, io: &mut T) -> Result<(), MotorCtrlError> {
        for device in self.devices.iter_mut() {
            io.send(&encode::enable_command(&device.motor))?;
            device.motor.set_enabled(true);
        }
        Ok(())
    }

    /// Disable every motor, in registration order.
    pub fn disable_all<T: CanIo>(&mut self, io: &mut T) -> Result<(), MotorCtrlError> {
        for device in self.devices.iter_mut() {
            io.send(&encode::disable_command(&device.motor))?;
            device.motor.set_enabled(false);
        }
        Ok(())
    }

    /// Flash every motor's current position as its zero.
    pub fn set_zero_all<T: CanIo>(&mut self, io: &mut T) -> Result<(), MotorCtrlError> {
        for device in self.devices.iter() {
            io.send(&encode::set_zero_command(&device.motor))?;
        }
        Ok(())
    }

    /// Request a state report from every motor.
    pub fn refresh_all<T: CanIo>(&mut self, io: &mut T) -> Result<(), MotorCtrlError> {
        for device in self.devices.iter() {
            io.send(&encode::refresh_command(&device.motor))?;
        }
        Ok(())
    }

    /// Query the given register on every motor.
    pub fn query_param_all<T: CanIo>(
        &mut self,
        io: &mut T,
        reg: ParamReg,
    ) -> Result<(), MotorCtrlError> {
        for device in self.devices.iter() {
            io.send(&encode::query_param_command(&device.motor, reg))?;
        }
        Ok(())
    }

    /// Send one MIT control demand per motor, by position.
    ///
    /// The demand count must match the motor count exactly; a mismatch is a
    /// caller error and nothing is sent.
    pub fn mit_control_all<T: CanIo>(
        &mut self,
        io: &mut T,
        params: &[MitParams],
    ) -> Result<(), MotorCtrlError> {
        if params.len() != self.devices.len() {
            return Err(MotorCtrlError::ParamCountMismatch {
                expected: self.devices.len(),
                actual: params.len(),
            });
        }

        for (device, param) in self.devices.iter().zip(params.iter()) {
            io.send(&encode::mit_control_command(&device.motor, param))?;
        }
        Ok(())
    }

    /// Write the control mode register on every motor.
    pub fn set_control_mode_all<T: CanIo>(
        &mut self,
        io: &mut T,
        mode: ControlMode,
    ) -> Result<(), MotorCtrlError> {
        for device in self.devices.iter_mut() {
            io.send(&encode::set_control_mode_command(&device.motor, mode))?;
            device.motor.set_control_mode(mode);
        }
        Ok(())
    }

    // ---- SINGLE-TARGET OPERATIONS ----

    /// Enable one motor by collection index.
    pub fn enable_one<T: CanIo>(&mut self, io: &mut T, index: usize) -> Result<(), MotorCtrlError> {
        let device = self
            .devices
            .get_mut(index)
            .ok_or(MotorCtrlError::IndexOutOfRange(index))?;
        io.send(&encode::enable_command(&device.motor))?;
        device.motor.set_enabled(true);
        Ok(())
    }

    /// Disable one motor by collection index.
    pub fn disable_one<T: CanIo>(
        &mut self,
        io: &mut T,
        index: usize,
    ) -> Result<(), MotorCtrlError> {
        let device = self
            .devices
            .get_mut(index)
            .ok_or(MotorCtrlError::IndexOutOfRange(index))?;
        io.send(&encode::disable_command(&device.motor))?;
        device.motor.set_enabled(false);
        Ok(())
    }

    /// Flash one motor's current position as its zero.
    pub fn set_zero_one<T: CanIo>(
        &mut self,
        io: &mut T,
        index: usize,
    ) -> Result<(), MotorCtrlError> {
        let motor = self.motor(index)?;
        io.send(&encode::set_zero_command(motor))?;
        Ok(())
    }

    /// Request a state report from one motor.
    pub fn refresh_one<T: CanIo>(&mut self, io: &mut T, index: usize) -> Result<(), MotorCtrlError> {
        let motor = self.motor(index)?;
        io.send(&encode::refresh_command(motor))?;
        Ok(())
    }

    /// Query the given register on one motor.
    pub fn query_param_one<T: CanIo>(
        &mut self,
        io: &mut T,
        index: usize,
        reg: ParamReg,
    ) -> Result<(), MotorCtrlError> {
        let motor = self.motor(index)?;
        io.send(&encode::query_param_command(motor, reg))?;
        Ok(())
    }

    /// Send an MIT control demand to one motor.
    pub fn mit_control_one<T: CanIo>(
        &mut self,
        io: &mut T,
        index: usize,
        params: &MitParams,
    ) -> Result<(), MotorCtrlError> {
        let motor = self.motor(index)?;
        io.send(&encode::mit_control_command(motor, params))?;
        Ok(())
    }

    /// Send a position-velocity demand to one motor.
    pub fn posvel_control_one<T: CanIo>(
        &mut self,
        io: &mut T,
        index: usize,
        params: &PosVelParams,
    ) -> Result<(), MotorCtrlError> {
        let motor = self.motor(index)?;
        io.send(&encode::posvel_control_command(motor, params))?;
        Ok(())
    }

    /// Send a position-force demand to one motor.
    pub fn posforce_control_one<T: CanIo>(
        &mut self,
        io: &mut T,
        index: usize,
        params: &PosForceParams,
    ) -> Result<(), MotorCtrlError> {
        let motor = self.motor(index)?;
        io.send(&encode::posforce_control_command(motor, params))?;
        Ok(())
    }

    /// Write the control mode register on one motor.
    pub fn set_control_mode_one<T: CanIo>(
        &mut self,
        io: &mut T,
        index: usize,
        mode: ControlMode,
    ) -> Result<(), MotorCtrlError> {
        let device = self
            .devices
            .get_mut(index)
            .ok_or(MotorCtrlError::IndexOutOfRange(index))?;
        io.send(&encode::set_control_mode_command(&device.motor, mode))?;
        device.motor.set_control_mode(mode);
        Ok(())
    }

    // ---- INBOUND ROUTING ----

    /// Route one inbound frame to its owning motor.
    ///
    /// Frames from identifiers no motor owns are discarded silently, since
    /// other systems may share the bus. Malformed payloads are logged and
    /// leave the cached state untouched. Routing a frame to a motor whose
    /// receive interpretation was never set is a caller error.
    pub fn route_inbound(&mut self, frame: &RxFrame) -> Result<RouteOutcome, MotorCtrlError> {
        let index = match self.recv_id_map.get(&frame.id) {
            Some(i) => *i,
            None => {
                trace!("Discarding frame from unknown CAN ID 0x{:X}", frame.id);
                return Ok(RouteOutcome::Unroutable);
            }
        };

        let device = &mut self.devices[index];

        let mode = match device.rx_mode {
            Some(m) => m,
            None => return Err(MotorCtrlError::RxModeUnset(index)),
        };

        match mode {
            RxMode::Telemetry => {
                let reading = decode::decode_telemetry(&device.motor, &frame.data);
                if !reading.valid {
                    warn!(
                        "Invalid telemetry payload ({} bytes) from CAN ID 0x{:X}",
                        frame.data.len(),
                        frame.id
                    );
                    return Ok(RouteOutcome::Invalid);
                }

                device.motor.set_telemetry(reading.telemetry);
                Ok(RouteOutcome::Telemetry)
            }
            RxMode::Parameter => {
                let reading = decode::decode_param(&frame.data);
                if !reading.valid {
                    warn!(
                        "Invalid parameter payload ({} bytes) from CAN ID 0x{:X}",
                        frame.data.len(),
                        frame.id
                    );
                    return Ok(RouteOutcome::Invalid);
                }

                device.motor.set_param(reading.rid, reading.value);
                Ok(RouteOutcome::Parameter)
            }
        }
    }

    /// Drain the frames currently available on the bus and route each one.
    ///
    /// Returns the number of frames which updated a motor's cached state.
    /// Receiving zero frames before the timeout is not an error.
    pub fn recv_cycle<T: CanIo>(
        &mut self,
        io: &mut T,
        timeout: Duration,
    ) -> Result<usize, MotorCtrlError> {
        let frames = io.recv_available(timeout)?;

        let mut routed = 0;
        for frame in frames.iter() {
            match self.route_inbound(frame)? {
                RouteOutcome::Telemetry | RouteOutcome::Parameter => routed += 1,
                RouteOutcome::Unroutable | RouteOutcome::Invalid => (),
            }
        }

        trace!("Receive cycle routed {}/{} frames", routed, frames.len());

        Ok(routed)
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::motor::{MotorType, ParamValue};
    use can_if::mock::MockBus;

    fn test_collection() -> DmCollection {
        let mut collection = DmCollection::new();
        for i in 0..3u32 {
            collection
                .add_motor(Motor::new(
                    MotorType::Dm4310,
                    0x01 + i,
                    0x11 + i,
                    ControlMode::Mit,
                ))
                .unwrap();
        }
        collection
    }

    /// Telemetry payload with q/dq/tau at their field midpoints.
    fn mid_telemetry_payload() -> Vec<u8> {
        vec![0x00, 0x7F, 0xFF, 0x7F, 0xF7, 0xFF, 30, 25]
    }

    #[test]
    fn test_broadcast_order() {
        let mut collection = test_collection();
        let mut bus = MockBus::new();

        collection.enable_all(&mut bus).unwrap();

        assert_eq!(bus.sent.len(), 3);
        assert_eq!(bus.sent[0].id, 0x01);
        assert_eq!(bus.sent[1].id, 0x02);
        assert_eq!(bus.sent[2].id, 0x03);

        for motor in collection.motors() {
            assert!(motor.is_enabled());
        }
    }

    #[test]
    fn test_duplicate_recv_id_rejected() {
        let mut collection = test_collection();
        let result = collection.add_motor(Motor::new(
            MotorType::Dm4310,
            0x09,
            0x11,
            ControlMode::Mit,
        ));
        assert!(matches!(result, Err(MotorCtrlError::DuplicateRecvId(0x11))));
    }

    #[test]
    fn test_mit_control_all_count_mismatch() {
        let mut collection = test_collection();
        let mut bus = MockBus::new();

        let result = collection.mit_control_all(&mut bus, &[MitParams::default(); 2]);
        assert!(matches!(
            result,
            Err(MotorCtrlError::ParamCountMismatch {
                expected: 3,
                actual: 2
            })
        ));
        assert!(bus.sent.is_empty());
    }

    #[test]
    fn test_single_target_index_check() {
        let mut collection = test_collection();
        let mut bus = MockBus::new();

        assert!(matches!(
            collection.refresh_one(&mut bus, 7),
            Err(MotorCtrlError::IndexOutOfRange(7))
        ));

        collection.refresh_one(&mut bus, 1).unwrap();
        assert_eq!(bus.sent.len(), 1);
        assert_eq!(bus.sent[0].id, crate::encode::BROADCAST_CAN_ID);
    }

    #[test]
    fn test_route_unknown_id_discarded() {
        let mut collection = test_collection();
        collection.set_rx_mode_all(RxMode::Telemetry);

        let before: Vec<_> = collection.motors().map(|m| m.telemetry()).collect();

        let outcome = collection
            .route_inbound(&RxFrame::new(0x99, &mid_telemetry_payload()))
            .unwrap();
        assert_eq!(outcome, RouteOutcome::Unroutable);

        let after: Vec<_> = collection.motors().map(|m| m.telemetry()).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn test_route_without_mode_is_error() {
        let mut collection = test_collection();

        let result = collection.route_inbound(&RxFrame::new(0x11, &mid_telemetry_payload()));
        assert!(matches!(result, Err(MotorCtrlError::RxModeUnset(0))));
    }

    #[test]
    fn test_route_telemetry_updates_cache() {
        let mut collection = test_collection();
        collection.set_rx_mode_all(RxMode::Telemetry);

        let outcome = collection
            .route_inbound(&RxFrame::new(0x12, &mid_telemetry_payload()))
            .unwrap();
        assert_eq!(outcome, RouteOutcome::Telemetry);

        let telemetry = collection.motor(1).unwrap().telemetry();
        assert_eq!(telemetry.t_mos, 30);
        assert_eq!(telemetry.t_rotor, 25);
        // Field midpoints decode to (near) zero over the symmetric ranges
        assert!(telemetry.position.abs() < 0.01);

        // Other motors untouched
        assert_eq!(collection.motor(0).unwrap().telemetry(), Default::default());
    }

    #[test]
    fn test_route_malformed_leaves_cache() {
        let mut collection = test_collection();
        collection.set_rx_mode_all(RxMode::Telemetry);

        // Seed motor 0 with known telemetry
        collection
            .route_inbound(&RxFrame::new(0x11, &mid_telemetry_payload()))
            .unwrap();
        let seeded = collection.motor(0).unwrap().telemetry();

        let outcome = collection
            .route_inbound(&RxFrame::new(0x11, &[0x00, 0x01, 0x02]))
            .unwrap();
        assert_eq!(outcome, RouteOutcome::Invalid);
        assert_eq!(collection.motor(0).unwrap().telemetry(), seeded);
    }

    #[test]
    fn test_route_parameter_updates_cache() {
        let mut collection = test_collection();
        collection.set_rx_mode_all(RxMode::Parameter);

        let mut data = [0u8; 8];
        data[2] = 0x33;
        data[3] = 9;
        data[4..8].copy_from_slice(&300u32.to_le_bytes());

        let outcome = collection
            .route_inbound(&RxFrame::new(0x13, &data))
            .unwrap();
        assert_eq!(outcome, RouteOutcome::Parameter);
        assert_eq!(
            collection.motor(2).unwrap().param(9),
            Some(ParamValue::Uint(300))
        );
    }

    #[test]
    fn test_recv_cycle() {
        let mut collection = test_collection();
        collection.set_rx_mode_all(RxMode::Telemetry);

        let mut bus = MockBus::new();
        bus.push_inbound(RxFrame::new(0x11, &mid_telemetry_payload()));
        bus.push_inbound(RxFrame::new(0x99, &mid_telemetry_payload()));
        bus.push_inbound(RxFrame::new(0x12, &[0x00]));

        let routed = collection
            .recv_cycle(&mut bus, Duration::from_millis(10))
            .unwrap();
        assert_eq!(routed, 1);

        // An empty bus is not an error
        let routed = collection
            .recv_cycle(&mut bus, Duration::from_millis(10))
            .unwrap();
        assert_eq!(routed, 0);
    }

    #[test]
    fn test_transport_failure_propagates() {
        let mut collection = test_collection();
        let mut bus = MockBus::new();
        bus.fail_sends = true;

        assert!(matches!(
            collection.enable_all(&mut bus),
            Err(MotorCtrlError::Transport(_))
        ));
    }
}
