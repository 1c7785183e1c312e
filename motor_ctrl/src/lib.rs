//! # Damiao Motor Control Library
//!
//! This crate drives networked Damiao smart-motor actuators (arm joints and a
//! gripper) over a CAN bus. It covers:
//! - the fixed-point codec which packs physical quantities into the 8 byte
//!   CAN payloads and unpacks telemetry/parameter replies,
//! - the per-motor model (physical limits, identifiers, cached state),
//! - outbound command encoding and mode-sensitive inbound decoding,
//! - a device collection which addresses many motors on one bus, broadcasts
//!   commands in registration order and routes inbound frames back to the
//!   owning motor,
//! - arm and gripper components built on top of the collection.
//!
//! The CAN transport itself is external, consumed through [`can_if::CanIo`].

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Arm component: a fixed ordered group of joints.
pub mod arm;

/// Fixed-point codec between physical values and n-bit fields.
pub mod codec;

/// Device collection and frame dispatcher.
pub mod collection;

/// Inbound frame decoding.
pub mod decode;

/// Outbound command encoding.
pub mod encode;

/// Gripper component with position remapping.
pub mod gripper;

/// Motor model: types, limits, registers and cached state.
pub mod motor;

/// Parameter structures for the components.
pub mod params;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use thiserror::Error;

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Errors raised by motor control operations.
///
/// These are caller-contract or transport failures. Bus noise (malformed or
/// unrouteable frames) is never an error, see [`collection::DmCollection::route_inbound`].
#[derive(Debug, Error)]
pub enum MotorCtrlError {
    #[error("Motor index {0} is out of range")]
    IndexOutOfRange(usize),

    #[error("Expected {expected} control parameters but got {actual}")]
    ParamCountMismatch { expected: usize, actual: usize },

    #[error(
        "Motor {0} has no receive interpretation set, call set_rx_mode before \
         receiving"
    )]
    RxModeUnset(usize),

    #[error("Receive CAN ID 0x{0:X} is already registered")]
    DuplicateRecvId(u32),

    #[error("Loaded parameters are invalid: {0}")]
    ParamsInvalid(#[from] params::ParamsError),

    #[error("Transport error: {0}")]
    Transport(#[from] can_if::CanIfError),
}
