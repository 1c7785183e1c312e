//! # In-memory CAN bus
//!
//! A [`CanIo`] implementation backed by plain queues. Outbound frames are
//! recorded in send order, inbound frames are staged by the test and drained
//! by `recv_available`. No timing is modelled.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::collections::VecDeque;
use std::time::Duration;

use crate::bus::{CanIfError, CanIo};
use crate::frame::{RxFrame, TxFrame};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// An in-memory bus for exercising code written against [`CanIo`].
#[derive(Debug)]
pub struct MockBus {
    /// All frames sent onto the bus, in send order.
    pub sent: Vec<TxFrame>,

    /// Frames waiting to be received.
    pub inbound: VecDeque<RxFrame>,

    /// If true all sends fail, for exercising transport error paths.
    pub fail_sends: bool,

    /// Whether the bus is open. A closed bus rejects all traffic.
    pub open: bool,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl MockBus {
    /// Create an empty, open bus.
    pub fn new() -> Self {
        Self {
            sent: Vec::new(),
            inbound: VecDeque::new(),
            fail_sends: false,
            open: true,
        }
    }

    /// Stage an inbound frame to be yielded by the next `recv_available`.
    pub fn push_inbound(&mut self, frame: RxFrame) {
        self.inbound.push_back(frame);
    }

    /// Clear the record of sent frames.
    pub fn clear_sent(&mut self) {
        self.sent.clear();
    }
}

impl Default for MockBus {
    fn default() -> Self {
        Self::new()
    }
}

impl CanIo for MockBus {
    fn send(&mut self, frame: &TxFrame) -> Result<(), CanIfError> {
        if !self.open {
            return Err(CanIfError::BusNotOpen);
        }

        if self.fail_sends {
            return Err(CanIfError::SendError {
                id: frame.id,
                reason: "mock bus configured to fail sends".into(),
            });
        }

        self.sent.push(*frame);
        Ok(())
    }

    fn recv_available(&mut self, _timeout: Duration) -> Result<Vec<RxFrame>, CanIfError> {
        if !self.open {
            return Err(CanIfError::BusNotOpen);
        }

        Ok(self.inbound.drain(..).collect())
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_send_and_drain() {
        let mut bus = MockBus::new();
        let frame = TxFrame {
            id: 0x01,
            data: [0u8; 8],
        };

        bus.send(&frame).unwrap();
        assert_eq!(bus.sent.len(), 1);

        bus.push_inbound(RxFrame::new(0x11, &[0xAA]));
        let frames = bus.recv_available(Duration::from_millis(1)).unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].id, 0x11);

        // The queue is drained, a second receive yields nothing
        assert!(bus.recv_available(Duration::from_millis(1)).unwrap().is_empty());
    }

    #[test]
    fn test_closed_bus_rejects_traffic() {
        let mut bus = MockBus::new();
        bus.open = false;

        let frame = TxFrame {
            id: 0x01,
            data: [0u8; 8],
        };
        assert!(matches!(bus.send(&frame), Err(CanIfError::BusNotOpen)));
        assert!(matches!(
            bus.recv_available(Duration::from_millis(1)),
            Err(CanIfError::BusNotOpen)
        ));
        assert!(bus.sent.is_empty());
    }
}
