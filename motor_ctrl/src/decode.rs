//! # Inbound frame decoding
//!
//! Interprets payloads received from the motors. The same bytes mean
//! different things depending on whether the motor was last put into
//! telemetry or parameter-query mode, so the caller (the device collection)
//! selects which of these functions to apply.
//!
//! Malformed frames are common on a live bus: both decoders report them
//! through the `valid` flag and never panic.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use byteorder::{ByteOrder, LittleEndian};

use crate::codec;
use crate::motor::{Motor, ParamValue, Telemetry};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// The result of decoding a telemetry payload.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TelemetryReading {
    /// The decoded telemetry, meaningful only when `valid` is true.
    pub telemetry: Telemetry,

    /// False if the payload was malformed.
    pub valid: bool,
}

/// The result of decoding a parameter reply payload.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamReading {
    /// The register id the reply refers to.
    pub rid: u8,

    /// The decoded value, meaningful only when `valid` is true.
    pub value: ParamValue,

    /// False if the payload was malformed.
    pub valid: bool,
}

// ------------------------------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Decode a telemetry payload from the given motor.
///
/// Payloads shorter than 8 bytes yield `valid = false`. The fixed-point
/// fields are converted into physical units using the motor's limits.
pub fn decode_telemetry(motor: &Motor, data: &[u8]) -> TelemetryReading {
    if data.len() < 8 {
        return TelemetryReading::default();
    }

    let q = ((data[1] as u32) << 8) | data[2] as u32;
    let dq = ((data[3] as u32) << 4) | ((data[4] >> 4) as u32);
    let tau = (((data[4] & 0x0F) as u32) << 8) | data[5] as u32;

    let limits = motor.motor_type().limits();

    TelemetryReading {
        telemetry: Telemetry {
            position: codec::decode(q, -limits.p_max, limits.p_max, 16),
            velocity: codec::decode(dq, -limits.v_max, limits.v_max, 12),
            torque: codec::decode(tau, -limits.t_max, limits.t_max, 12),
            t_mos: data[6] as i32,
            t_rotor: data[7] as i32,
        },
        valid: true,
    }
}

/// Decode a parameter reply payload.
///
/// Requires at least 8 bytes and a recognised tag byte (0x33 for query
/// replies, 0x55 for write replies), else `valid = false`. The value bytes
/// are reinterpreted as a little-endian u32 for integer registers and as an
/// IEEE-754 f32 otherwise; the exact bit pattern is preserved either way.
pub fn decode_param(data: &[u8]) -> ParamReading {
    let invalid = ParamReading {
        rid: 0,
        value: ParamValue::Uint(0),
        valid: false,
    };

    if data.len() < 8 {
        return invalid;
    }

    if data[2] != 0x33 && data[2] != 0x55 {
        return invalid;
    }

    let rid = data[3];
    let value = if is_int_register(rid) {
        ParamValue::Uint(LittleEndian::read_u32(&data[4..8]))
    } else {
        ParamValue::Float(LittleEndian::read_f32(&data[4..8]))
    };

    ParamReading {
        rid,
        value,
        valid: true,
    }
}

/// True if the given register id holds an integer value on the wire.
///
/// The integer registers are fixed by the protocol: ids 7-10 (master id, esc
/// id, timeout, control mode), 13-16 (hardware/software version, serial
/// number, pole pairs) and 35-36 (CAN rate/id level).
pub fn is_int_register(rid: u8) -> bool {
    (7..=10).contains(&rid) || (13..=16).contains(&rid) || (35..=36).contains(&rid)
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::encode::{mit_control_command, MitParams};
    use crate::motor::{ControlMode, MotorType};

    #[test]
    fn test_short_payloads_invalid() {
        let motor = Motor::new(MotorType::Dm4310, 0x01, 0x11, ControlMode::Mit);

        assert!(!decode_telemetry(&motor, &[0x00; 7]).valid);
        assert!(!decode_telemetry(&motor, &[]).valid);
        assert!(!decode_param(&[0x00; 7]).valid);
        assert!(!decode_param(&[]).valid);
    }

    #[test]
    fn test_param_bad_tag_invalid() {
        let mut data = [0u8; 8];
        data[2] = 0x34;
        assert!(!decode_param(&data).valid);
    }

    #[test]
    fn test_param_int_register() {
        let mut data = [0u8; 8];
        data[2] = 0x33;
        data[3] = 9;
        data[4..8].copy_from_slice(&300u32.to_le_bytes());

        let reading = decode_param(&data);
        assert!(reading.valid);
        assert_eq!(reading.rid, 9);
        assert_eq!(reading.value, ParamValue::Uint(300));
    }

    #[test]
    fn test_param_float_register() {
        let mut data = [0u8; 8];
        data[2] = 0x55;
        data[3] = 5;
        data[4..8].copy_from_slice(&1.5f32.to_le_bytes());

        let reading = decode_param(&data);
        assert!(reading.valid);
        assert_eq!(reading.rid, 5);
        assert_eq!(reading.value, ParamValue::Float(1.5));
    }

    #[test]
    fn test_int_register_ranges() {
        for rid in 0..=90u8 {
            let expect = (7..=10).contains(&rid)
                || (13..=16).contains(&rid)
                || (35..=36).contains(&rid);
            assert_eq!(is_int_register(rid), expect, "rid {}", rid);
        }
    }

    /// The MIT command payload shares its q/dq/tau bit layout with telemetry
    /// payloads, up to the one byte shift of the q field. Decoding a command
    /// built from known demands checks both layouts against each other.
    #[test]
    fn test_mit_telemetry_bit_layout() {
        let motor = Motor::new(MotorType::Dm4310, 0x01, 0x11, ControlMode::Mit);
        let limits = motor.motor_type().limits();

        let demand = MitParams {
            kp: 50.0,
            kd: 1.0,
            q: 0.0,
            dq: 0.0,
            tau: 2.5,
        };
        let c = mit_control_command(&motor, &demand).data;

        // Realign the command payload to the telemetry layout: telemetry
        // carries q in bytes 1-2 and dq in byte 3 plus the high nibble of
        // byte 4, with tau's high nibble in the low nibble of byte 4. The
        // command packs q one byte earlier and splits tau around the kp/kd
        // fields.
        let state_like = [
            0x00,
            c[0],
            c[1],
            c[2],
            (c[3] & 0xF0) | (c[6] & 0x0F),
            c[7],
            0x00,
            0x00,
        ];

        let reading = decode_telemetry(&motor, &state_like);
        assert!(reading.valid);

        let q_step = 2.0 * limits.p_max / 65535.0;
        let dq_step = 2.0 * limits.v_max / 4095.0;
        let tau_step = 2.0 * limits.t_max / 4095.0;

        assert!((reading.telemetry.position - demand.q).abs() <= q_step);
        assert!((reading.telemetry.velocity - demand.dq).abs() <= dq_step);
        assert!((reading.telemetry.torque - demand.tau).abs() <= tau_step);
    }
}
