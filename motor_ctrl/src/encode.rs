//! # Outbound command encoding
//!
//! Builds the 8 byte payloads for every command the motors understand. Direct
//! commands (enable/disable/set zero/control demands) are addressed to the
//! motor's own send identifier; parameter queries, refresh requests and
//! control-mode writes go to the protocol-wide broadcast identifier with the
//! target motor's id embedded in the payload.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use byteorder::{ByteOrder, LittleEndian};
use can_if::TxFrame;
use util::maths::clamp;

use crate::codec;
use crate::motor::{ControlMode, Motor, ParamReg, KD_RANGE, KP_RANGE};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Identifier all parameter query, refresh and control-mode write commands
/// are addressed to. This is a protocol constant shared by every device on
/// the bus, not a property of any motor.
pub const BROADCAST_CAN_ID: u32 = 0x7FF;

/// Position-velocity demands are addressed at this offset from the send id.
pub const POSVEL_ID_OFFSET: u32 = 0x100;

/// Position-force demands are addressed at this offset from the send id.
pub const POSFORCE_ID_OFFSET: u32 = 0x300;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Demand for one MIT control command.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MitParams {
    /// Proportional gain, `[0, 500]`.
    pub kp: f64,

    /// Derivative gain, `[0, 5]`.
    pub kd: f64,

    /// Target position in radians.
    pub q: f64,

    /// Target velocity in radians/second.
    pub dq: f64,

    /// Feed-forward torque in newton metres.
    pub tau: f64,
}

/// Demand for one position-velocity control command.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PosVelParams {
    /// Target position in radians.
    pub q: f64,

    /// Target velocity in radians/second.
    pub dq: f64,
}

/// Demand for one position-force control command.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PosForceParams {
    /// Target position in radians.
    pub q: f64,

    /// Speed limit in radians/second, `[0, v_max]`.
    pub dq: f64,

    /// Per-unit current limit, `[0, 1]`.
    pub i: f64,
}

// ------------------------------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Build an enable command for the given motor.
pub fn enable_command(motor: &Motor) -> TxFrame {
    opcode_command(motor, 0xFC)
}

/// Build a disable command for the given motor.
pub fn disable_command(motor: &Motor) -> TxFrame {
    opcode_command(motor, 0xFD)
}

/// Build a command flashing the motor's current position as its zero.
pub fn set_zero_command(motor: &Motor) -> TxFrame {
    opcode_command(motor, 0xFE)
}

/// Build an MIT control command.
///
/// All demands are saturated into the motor's physical limits (and the fixed
/// gain ranges) before packing; out of range demands are never an error.
pub fn mit_control_command(motor: &Motor, params: &MitParams) -> TxFrame {
    let limits = motor.motor_type().limits();

    let q = codec::encode(params.q, -limits.p_max, limits.p_max, 16);
    let dq = codec::encode(params.dq, -limits.v_max, limits.v_max, 12);
    let tau = codec::encode(params.tau, -limits.t_max, limits.t_max, 12);
    let kp = codec::encode(params.kp, KP_RANGE.0, KP_RANGE.1, 12);
    let kd = codec::encode(params.kd, KD_RANGE.0, KD_RANGE.1, 12);

    let mut data = [0u8; 8];
    data[0] = (q >> 8) as u8;
    data[1] = (q & 0xFF) as u8;
    data[2] = (dq >> 4) as u8;
    data[3] = (((dq & 0x0F) << 4) as u8) | (((kp >> 8) & 0x0F) as u8);
    data[4] = (kp & 0xFF) as u8;
    data[5] = (kd >> 4) as u8;
    data[6] = (((kd & 0x0F) << 4) as u8) | (((tau >> 8) & 0x0F) as u8);
    data[7] = (tau & 0xFF) as u8;

    TxFrame {
        id: motor.send_can_id(),
        data,
    }
}

/// Build a position-velocity control command.
pub fn posvel_control_command(motor: &Motor, params: &PosVelParams) -> TxFrame {
    let limits = motor.motor_type().limits();

    let q = clamp(&params.q, &-limits.p_max, &limits.p_max);
    let dq = clamp(&params.dq, &-limits.v_max, &limits.v_max);

    let mut data = [0u8; 8];
    LittleEndian::write_i32(&mut data[0..4], (q * 1e4) as i32);
    LittleEndian::write_i32(&mut data[4..8], (dq * 1e4) as i32);

    TxFrame {
        id: motor.send_can_id() + POSVEL_ID_OFFSET,
        data,
    }
}

/// Build a position-force control command.
pub fn posforce_control_command(motor: &Motor, params: &PosForceParams) -> TxFrame {
    let limits = motor.motor_type().limits();

    let q = clamp(&params.q, &-limits.p_max, &limits.p_max);
    let dq = clamp(&params.dq, &0.0, &limits.v_max);
    let i = clamp(&params.i, &0.0, &1.0);

    let mut data = [0u8; 8];
    LittleEndian::write_i32(&mut data[0..4], (q * 1e4) as i32);
    LittleEndian::write_u16(&mut data[4..6], (dq * 100.0) as u16);
    LittleEndian::write_u16(&mut data[6..8], (i * 1e4) as u16);

    TxFrame {
        id: motor.send_can_id() + POSFORCE_ID_OFFSET,
        data,
    }
}

/// Build a parameter query for the given register.
///
/// Addressed to [`BROADCAST_CAN_ID`], with the motor's send id in the first
/// two payload bytes.
pub fn query_param_command(motor: &Motor, reg: ParamReg) -> TxFrame {
    let mut data = [0u8; 8];
    LittleEndian::write_u16(&mut data[0..2], motor.send_can_id() as u16);
    data[2] = 0x33;
    data[3] = reg.rid();

    TxFrame {
        id: BROADCAST_CAN_ID,
        data,
    }
}

/// Build a refresh request, asking the motor to report its state.
pub fn refresh_command(motor: &Motor) -> TxFrame {
    let mut data = [0u8; 8];
    LittleEndian::write_u16(&mut data[0..2], motor.send_can_id() as u16);
    data[2] = 0xCC;

    TxFrame {
        id: BROADCAST_CAN_ID,
        data,
    }
}

/// Build a control-mode write, setting the CTRL_MODE register.
pub fn set_control_mode_command(motor: &Motor, mode: ControlMode) -> TxFrame {
    let mut data = [0u8; 8];
    LittleEndian::write_u16(&mut data[0..2], motor.send_can_id() as u16);
    data[2] = 0x55;
    data[3] = ParamReg::CtrlMode.rid();
    data[4] = mode as u8;

    TxFrame {
        id: BROADCAST_CAN_ID,
        data,
    }
}

// ------------------------------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Build one of the fixed opcode commands (enable/disable/set zero).
fn opcode_command(motor: &Motor, opcode: u8) -> TxFrame {
    TxFrame {
        id: motor.send_can_id(),
        data: [0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, opcode],
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::motor::MotorType;

    fn test_motor() -> Motor {
        Motor::new(MotorType::Dm4310, 0x01, 0x11, ControlMode::Mit)
    }

    #[test]
    fn test_opcode_commands() {
        let motor = test_motor();

        let enable = enable_command(&motor);
        assert_eq!(enable.id, 0x01);
        assert_eq!(enable.data, [0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFC]);

        assert_eq!(disable_command(&motor).data[7], 0xFD);
        assert_eq!(set_zero_command(&motor).data[7], 0xFE);
    }

    #[test]
    fn test_query_param_command() {
        let motor = Motor::new(MotorType::Dm4310, 0x102, 0x112, ControlMode::Mit);
        let frame = query_param_command(&motor, ParamReg::MstId);

        assert_eq!(frame.id, BROADCAST_CAN_ID);
        assert_eq!(frame.data, [0x02, 0x01, 0x33, 0x07, 0x00, 0x00, 0x00, 0x00]);
    }

    #[test]
    fn test_refresh_command() {
        let motor = test_motor();
        let frame = refresh_command(&motor);

        assert_eq!(frame.id, BROADCAST_CAN_ID);
        assert_eq!(frame.data, [0x01, 0x00, 0xCC, 0x00, 0x00, 0x00, 0x00, 0x00]);
    }

    #[test]
    fn test_set_control_mode_command() {
        let motor = test_motor();
        let frame = set_control_mode_command(&motor, ControlMode::PosForce);

        assert_eq!(frame.id, BROADCAST_CAN_ID);
        assert_eq!(frame.data, [0x01, 0x00, 0x55, 0x0A, 0x04, 0x00, 0x00, 0x00]);
    }

    /// Zero demands with zero gains must encode to the field midpoints.
    #[test]
    fn test_mit_zero_demand() {
        let motor = test_motor();
        let frame = mit_control_command(&motor, &MitParams::default());

        assert_eq!(frame.id, 0x01);

        // q is 16 bits over a symmetric range: zero sits at 0x7FFF
        let q = ((frame.data[0] as u32) << 8) | frame.data[1] as u32;
        assert_eq!(q, 0x7FFF);

        // kp/kd are over [0, max]: zero demand encodes to zero
        let kp = (((frame.data[3] & 0x0F) as u32) << 8) | frame.data[4] as u32;
        assert_eq!(kp, 0);
    }

    #[test]
    fn test_posvel_layout() {
        let motor = test_motor();
        let frame = posvel_control_command(&motor, &PosVelParams { q: -0.5, dq: 2.0 });

        assert_eq!(frame.id, 0x01 + POSVEL_ID_OFFSET);
        assert_eq!(&frame.data[0..4], &(-5000i32).to_le_bytes());
        assert_eq!(&frame.data[4..8], &20000i32.to_le_bytes());
    }

    #[test]
    fn test_posforce_layout() {
        let motor = test_motor();
        let frame = posforce_control_command(
            &motor,
            &PosForceParams {
                q: 0.5,
                dq: 2.0,
                i: 0.25,
            },
        );

        assert_eq!(frame.id, 0x01 + POSFORCE_ID_OFFSET);
        assert_eq!(&frame.data[0..4], &5000i32.to_le_bytes());
        assert_eq!(&frame.data[4..6], &200u16.to_le_bytes());
        assert_eq!(&frame.data[6..8], &2500u16.to_le_bytes());
    }
}
