//! # Motor model
//!
//! Static data about the Damiao motor family (types, physical limits,
//! register ids) and the per-instance [`Motor`] which carries the bus
//! identifiers and the last observed telemetry and parameter values.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::Deserialize;
use std::collections::HashMap;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Proportional gain range for MIT control, fixed by the protocol.
pub const KP_RANGE: (f64, f64) = (0.0, 500.0);

/// Derivative gain range for MIT control, fixed by the protocol.
pub const KD_RANGE: (f64, f64) = (0.0, 5.0);

/// Physical limits for each motor type, indexed by [`MotorType`].
///
/// Values are taken from the Damiao datasheets. Position is symmetric about
/// zero, as are velocity and torque.
pub const MOTOR_LIMITS: [LimitParams; 13] = [
    LimitParams { p_max: 12.5, v_max: 50.0, t_max: 5.0 },    // Dm3507
    LimitParams { p_max: 12.5, v_max: 30.0, t_max: 10.0 },   // Dm4310
    LimitParams { p_max: 12.5, v_max: 50.0, t_max: 10.0 },   // Dm4310_48v
    LimitParams { p_max: 12.5, v_max: 10.0, t_max: 28.0 },   // Dm4340
    LimitParams { p_max: 12.5, v_max: 10.0, t_max: 28.0 },   // Dm4340_48v
    LimitParams { p_max: 12.5, v_max: 45.0, t_max: 1.2 },    // Dm6006
    LimitParams { p_max: 12.5, v_max: 45.0, t_max: 3.0 },    // Dm8006
    LimitParams { p_max: 12.5, v_max: 25.0, t_max: 54.0 },   // Dm8009
    LimitParams { p_max: 12.5, v_max: 20.0, t_max: 60.0 },   // Dm10010l
    LimitParams { p_max: 12.5, v_max: 20.0, t_max: 100.0 },  // Dm10010
    LimitParams { p_max: 12.5, v_max: 280.0, t_max: 0.75 },  // Dmh3510
    LimitParams { p_max: 12.5, v_max: 100.0, t_max: 13.4 },  // Dmh6215
    LimitParams { p_max: 12.5, v_max: 100.0, t_max: 20.0 },  // Dmg6220
];

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Physical limit magnitudes for one motor type.
///
/// All three values are strictly positive.
#[derive(Debug, Clone, Copy)]
pub struct LimitParams {
    /// Maximum position magnitude.
    ///
    /// Units: radians
    pub p_max: f64,

    /// Maximum velocity magnitude.
    ///
    /// Units: radians/second
    pub v_max: f64,

    /// Maximum torque magnitude.
    ///
    /// Units: newton metres
    pub t_max: f64,
}

/// Last observed telemetry for a motor.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Telemetry {
    /// Position in radians.
    pub position: f64,

    /// Velocity in radians/second.
    pub velocity: f64,

    /// Torque in newton metres.
    pub torque: f64,

    /// Controller (MOSFET) temperature in degrees celsius.
    pub t_mos: i32,

    /// Rotor temperature in degrees celsius.
    pub t_rotor: i32,
}

/// One physical actuator on the bus.
///
/// Identifiers are fixed at construction. The cached telemetry and parameter
/// values are only written by frame routing, see
/// [`crate::collection::DmCollection`].
#[derive(Debug, Clone)]
pub struct Motor {
    motor_type: MotorType,
    send_can_id: u32,
    recv_can_id: u32,
    control_mode: ControlMode,

    telemetry: Telemetry,
    enabled: bool,
    param_cache: HashMap<u8, ParamValue>,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Motor types in the Damiao family.
///
/// Deserialised directly from configuration; an unknown type name is a
/// configuration error at load time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[allow(non_camel_case_types)]
pub enum MotorType {
    Dm3507,
    Dm4310,
    Dm4310_48v,
    Dm4340,
    Dm4340_48v,
    Dm6006,
    Dm8006,
    Dm8009,
    Dm10010l,
    Dm10010,
    Dmh3510,
    Dmh6215,
    Dmg6220,
}

/// Control modes supported by the motor firmware.
///
/// The discriminants are the values written to the CTRL_MODE register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
pub enum ControlMode {
    Mit = 1,
    PosVel = 2,
    Vel = 3,
    PosForce = 4,
}

/// Queryable motor registers.
///
/// The discriminants are the wire register ids (RIDs). The set is sparse:
/// some ids are reserved by the firmware and cannot be queried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamReg {
    UvValue = 0,
    KtValue = 1,
    OtValue = 2,
    OcValue = 3,
    Acc = 4,
    Dec = 5,
    MaxSpd = 6,
    MstId = 7,
    EscId = 8,
    Timeout = 9,
    CtrlMode = 10,
    Damp = 11,
    Inertia = 12,
    HwVer = 13,
    SwVer = 14,
    Sn = 15,
    Npp = 16,
    Rs = 17,
    Ls = 18,
    Flux = 19,
    Gr = 20,
    PMax = 21,
    VMax = 22,
    TMax = 23,
    IBw = 24,
    KpAsr = 25,
    KiAsr = 26,
    KpApr = 27,
    KiApr = 28,
    OvValue = 29,
    Gtefp = 30,
    Gtefn = 31,
    Alias = 32,
    CodeVersion = 33,
    MotorType = 34,
    CanRateLevel = 35,
    CanIdLevel = 36,
    Cbkp = 37,
    Cbkd = 38,
    SubVer = 39,
    UOff = 40,
    VOff = 41,
    K1 = 42,
    K2 = 43,
    MOff = 44,
    Dir = 45,
    PM = 46,
    Xout = 47,
    EnableBkp = 48,
    BkpLoc = 49,
    PMin = 50,
    MasterId = 51,
    IsReduction = 52,
    RunState = 56,
    ErrorState = 80,
    CurAngle = 81,
}

/// A decoded parameter value.
///
/// Whether a register holds an integer or a float is fixed by the protocol
/// (see [`crate::decode::is_int_register`]); the distinction is kept explicit
/// rather than coercing both into one numeric type, since the wire format is
/// an exact byte reinterpretation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamValue {
    /// IEEE-754 32 bit float register.
    Float(f32),

    /// Unsigned 32 bit integer register.
    Uint(u32),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl MotorType {
    /// Get the physical limits for this motor type.
    pub fn limits(self) -> &'static LimitParams {
        &MOTOR_LIMITS[self as usize]
    }
}

impl ParamReg {
    /// Get the wire register id.
    pub fn rid(self) -> u8 {
        self as u8
    }
}

impl Motor {
    /// Create a new motor with no observed state.
    pub fn new(
        motor_type: MotorType,
        send_can_id: u32,
        recv_can_id: u32,
        control_mode: ControlMode,
    ) -> Self {
        Self {
            motor_type,
            send_can_id,
            recv_can_id,
            control_mode,
            telemetry: Telemetry::default(),
            enabled: false,
            param_cache: HashMap::new(),
        }
    }

    /// Get the motor type.
    pub fn motor_type(&self) -> MotorType {
        self.motor_type
    }

    /// Get the identifier used when addressing this motor.
    pub fn send_can_id(&self) -> u32 {
        self.send_can_id
    }

    /// Get the identifier this motor replies from.
    pub fn recv_can_id(&self) -> u32 {
        self.recv_can_id
    }

    /// Get the configured control mode.
    pub fn control_mode(&self) -> ControlMode {
        self.control_mode
    }

    /// Get a snapshot of the last observed telemetry.
    ///
    /// Refreshed only by explicit refresh/receive cycles.
    pub fn telemetry(&self) -> Telemetry {
        self.telemetry
    }

    /// True if the last issued enable/disable command was an enable.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Get the last queried value of a register, if any.
    pub fn param(&self, rid: u8) -> Option<ParamValue> {
        self.param_cache.get(&rid).copied()
    }

    pub(crate) fn set_control_mode(&mut self, mode: ControlMode) {
        self.control_mode = mode;
    }

    pub(crate) fn set_telemetry(&mut self, telemetry: Telemetry) {
        self.telemetry = telemetry;
    }

    pub(crate) fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub(crate) fn set_param(&mut self, rid: u8, value: ParamValue) {
        self.param_cache.insert(rid, value);
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_limits_strictly_positive() {
        for limits in MOTOR_LIMITS.iter() {
            assert!(limits.p_max > 0.0);
            assert!(limits.v_max > 0.0);
            assert!(limits.t_max > 0.0);
        }
    }

    #[test]
    fn test_limit_lookup() {
        let limits = MotorType::Dm4310.limits();
        assert_eq!(limits.v_max, 30.0);
        assert_eq!(limits.t_max, 10.0);
    }

    #[test]
    fn test_param_reg_rids() {
        assert_eq!(ParamReg::MstId.rid(), 7);
        assert_eq!(ParamReg::CtrlMode.rid(), 10);
        assert_eq!(ParamReg::ErrorState.rid(), 80);
    }
}
