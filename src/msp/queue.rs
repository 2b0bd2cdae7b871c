//! # Outbound MSP Queue
//!
//! Packets pushed by the VTX core wait here until the serial writer sends
//! them. The queue can be purged when its contents have gone stale.

use std::collections::VecDeque;

use tracing::{debug, warn};

use super::packet::MspPacket;

/// Default number of packets held before the oldest is dropped
pub const MSP_QUEUE_CAPACITY: usize = 16;

/// Where the VTX core hands its outbound MSP packets
#[cfg_attr(test, mockall::automock)]
pub trait MspTransport {
    /// Queue a packet for transmission. Ownership moves to the transport.
    fn enqueue(&mut self, packet: MspPacket);

    /// Drop every packet that has not been sent yet
    fn purge(&mut self);
}

/// Bounded FIFO of outbound MSP packets
#[derive(Debug)]
pub struct MspQueue {
    packets: VecDeque<MspPacket>,
    capacity: usize,
}

impl Default for MspQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl MspQueue {
    /// Creates an empty queue with [`MSP_QUEUE_CAPACITY`]
    pub fn new() -> Self {
        Self::with_capacity(MSP_QUEUE_CAPACITY)
    }

    /// Creates an empty queue holding at most `capacity` packets
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            packets: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
        }
    }

    /// Takes the next packet to send, if any
    pub fn pop(&mut self) -> Option<MspPacket> {
        self.packets.pop_front()
    }

    /// Number of packets waiting
    pub fn len(&self) -> usize {
        self.packets.len()
    }

    /// Returns `true` when nothing is waiting
    pub fn is_empty(&self) -> bool {
        self.packets.is_empty()
    }
}

impl MspTransport for MspQueue {
    fn enqueue(&mut self, packet: MspPacket) {
        if self.packets.len() >= self.capacity {
            if let Some(dropped) = self.packets.pop_front() {
                warn!("MSP queue full, dropping oldest packet (function {})", dropped.function);
            }
        }
        self.packets.push_back(packet);
    }

    fn purge(&mut self) {
        if !self.packets.is_empty() {
            debug!("Purging {} queued MSP packets", self.packets.len());
        }
        self.packets.clear();
    }
}
