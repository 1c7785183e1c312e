//! # CAN bus abstraction
//!
//! The transport is an external collaborator. Anything which can push an
//! outbound frame onto the bus and drain the frames which have arrived
//! implements [`CanIo`], and the motor control software is written against
//! that trait alone.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

use crate::frame::{RxFrame, TxFrame};

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// Trait implemented by the CAN transport.
pub trait CanIo {
    /// Send a single frame onto the bus.
    ///
    /// This is a blocking send, one call per frame. Failures are hard errors
    /// for the operation which issued the frame; no retries are performed at
    /// this level.
    fn send(&mut self, frame: &TxFrame) -> Result<(), CanIfError>;

    /// Drain the frames currently available on the bus.
    ///
    /// Returns whatever arrived before `timeout` elapsed. Receiving zero
    /// frames is not an error.
    fn recv_available(&mut self, timeout: Duration) -> Result<Vec<RxFrame>, CanIfError>;
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Bus-level configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct BusParams {
    /// Name of the CAN network interface, for example `can0`.
    pub interface: String,

    /// Whether the interface should be brought up with CAN-FD framing.
    pub enable_fd: bool,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Errors raised at the transport boundary.
#[derive(Debug, Error)]
pub enum CanIfError {
    #[error("Error sending frame to 0x{id:X}: {reason}")]
    SendError { id: u32, reason: String },

    #[error("Error receiving from the bus: {0}")]
    RecvError(String),

    #[error("The bus is not open")]
    BusNotOpen,
}
