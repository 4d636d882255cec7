//! UDP-backed transport. One datagram per packet, which matches the
//! session protocol exactly; there is no framing layer.

use std::io::ErrorKind;
use std::net::{Ipv4Addr, SocketAddr, UdpSocket};
use std::sync::Arc;

use super::{PacketReceiver, PacketSender, RecvError, SendError, Socket};

/// Client socket bound to an ephemeral local port and aimed at one
/// server address. All fallible setup happens in [`UdpClientSocket::bind`];
/// the `Socket::connect` split itself cannot fail.
pub struct UdpClientSocket {
    socket: UdpSocket,
}

impl UdpClientSocket {
    pub fn bind(server: SocketAddr) -> std::io::Result<Self> {
        let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0))?;
        socket.connect(server)?;
        socket.set_nonblocking(true)?;
        Ok(Self { socket })
    }
}

impl Socket for UdpClientSocket {
    fn connect(self: Box<Self>) -> (Box<dyn PacketSender>, Box<dyn PacketReceiver>) {
        let socket = Arc::new(self.socket);
        (
            Box::new(UdpPacketSender {
                socket: socket.clone(),
            }),
            Box::new(UdpPacketReceiver {
                socket,
                buffer: vec![0; 65_536].into_boxed_slice(),
            }),
        )
    }
}

struct UdpPacketSender {
    socket: Arc<UdpSocket>,
}

impl PacketSender for UdpPacketSender {
    fn send(&self, payload: &[u8]) -> Result<(), SendError> {
        match self.socket.send(payload) {
            Ok(_) => Ok(()),
            Err(_) => Err(SendError),
        }
    }
}

struct UdpPacketReceiver {
    socket: Arc<UdpSocket>,
    buffer: Box<[u8]>,
}

impl PacketReceiver for UdpPacketReceiver {
    fn receive(&mut self) -> Result<Option<&[u8]>, RecvError> {
        match self.socket.recv(&mut self.buffer) {
            Ok(n) => Ok(Some(&self.buffer[..n])),
            Err(e) if e.kind() == ErrorKind::WouldBlock => Ok(None),
            Err(_) => Err(RecvError),
        }
    }
}
