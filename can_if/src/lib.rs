//! # CAN interface crate.
//!
//! Provides the boundary between the motor control software and the CAN bus
//! transport. The transport itself (SocketCAN or otherwise) is supplied by
//! the environment; this crate only defines the frame records exchanged with
//! it, the [`bus::CanIo`] trait it must implement, and an in-memory bus used
//! for testing.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Bus abstraction and configuration
pub mod bus;

/// Frame records exchanged with the transport
pub mod frame;

/// In-memory bus implementation for tests
pub mod mock;

// ------------------------------------------------------------------------------------------------
// EXPORTS
// ------------------------------------------------------------------------------------------------

pub use bus::{BusParams, CanIfError, CanIo};
pub use frame::{RxFrame, TxFrame};
