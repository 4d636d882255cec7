//! UDP-backed transport. One datagram per packet, which matches the
//! session protocol exactly; there is no framing layer.

use std::io::ErrorKind;
use std::net::{SocketAddr, UdpSocket};
use std::sync::Arc;

use super::{PacketReceiver, PacketSender, RecvError, SendError, Socket};

/// Server socket bound to a fixed listen address. All fallible setup
/// happens in [`UdpServerSocket::bind`]; the `Socket::listen` split itself
/// cannot fail.
pub struct UdpServerSocket {
    socket: UdpSocket,
}

impl UdpServerSocket {
    pub fn bind(listen: SocketAddr) -> std::io::Result<Self> {
        let socket = UdpSocket::bind(listen)?;
        socket.set_nonblocking(true)?;
        Ok(Self { socket })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.socket.local_addr()
    }
}

impl Socket for UdpServerSocket {
    fn listen(self: Box<Self>) -> (Box<dyn PacketSender>, Box<dyn PacketReceiver>) {
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
    fn send(&self, address: &SocketAddr, payload: &[u8]) -> Result<(), SendError> {
        match self.socket.send_to(payload, address) {
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
    fn receive(&mut self) -> Result<Option<(SocketAddr, &[u8])>, RecvError> {
        match self.socket.recv_from(&mut self.buffer) {
            Ok((n, addr)) => Ok(Some((addr, &self.buffer[..n]))),
            Err(e) if e.kind() == ErrorKind::WouldBlock => Ok(None),
            Err(_) => Err(RecvError),
        }
    }
}
