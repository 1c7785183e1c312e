//! # CAN frame records
//!
//! These records carry payloads between the control software and the
//! transport. The transport is responsible for turning them into raw
//! `can_frame`/`canfd_frame` structures and back; the control software never
//! sees socket-level framing.

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// An outbound command frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxFrame {
    /// The CAN identifier the frame is addressed to.
    pub id: u32,

    /// The 8 byte command payload.
    pub data: [u8; 8],
}

/// An inbound frame as yielded by the transport.
///
/// The payload length is not fixed: a live bus can carry short (malformed)
/// frames, and a CAN-FD bus can carry up to 64 bytes. Consumers must validate
/// the length themselves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RxFrame {
    /// The CAN identifier the frame was sent from.
    pub id: u32,

    /// The payload bytes.
    pub data: Vec<u8>,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl RxFrame {
    /// Build an inbound frame from an identifier and payload bytes.
    pub fn new(id: u32, data: &[u8]) -> Self {
        Self {
            id,
            data: data.to_vec(),
        }
    }
}
