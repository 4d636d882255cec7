//! The server-side packet transport seam. Implementations deliver whole
//! datagrams keyed by the peer address; everything above this module is
//! transport-agnostic.

use std::fmt;
use std::net::SocketAddr;

pub mod udp;

pub struct SendError;

pub struct RecvError;

impl fmt::Display for RecvError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "transport failed while receiving")
    }
}

pub trait Socket {
    fn listen(self: Box<Self>) -> (Box<dyn PacketSender>, Box<dyn PacketReceiver>);
}

pub trait PacketSender: Send + Sync {
    /// Sends one datagram to a session.
    fn send(&self, address: &SocketAddr, payload: &[u8]) -> Result<(), SendError>;
}

pub trait PacketReceiver: Send + Sync {
    /// Polls for the next datagram from any session. The slice borrows
    /// the receiver's internal buffer and is valid until the next call.
    fn receive(&mut self) -> Result<Option<(SocketAddr, &[u8])>, RecvError>;
}
