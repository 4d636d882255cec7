//! The client-side packet transport seam. Implementations deliver whole
//! datagrams, unordered and unreliable; everything above this module is
//! transport-agnostic.

pub mod udp;

pub struct SendError;

pub struct RecvError;

pub trait Socket {
    fn connect(self: Box<Self>) -> (Box<dyn PacketSender>, Box<dyn PacketReceiver>);
}

pub trait PacketSender: Send + Sync {
    /// Sends one datagram to the server.
    fn send(&self, payload: &[u8]) -> Result<(), SendError>;
}

pub trait PacketReceiver: Send + Sync {
    /// Polls for the next datagram from the server. The slice borrows the
    /// receiver's internal buffer and is valid until the next call.
    fn receive(&mut self) -> Result<Option<&[u8]>, RecvError>;
}
