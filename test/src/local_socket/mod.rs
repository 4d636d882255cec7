//! In-memory transport for end-to-end testing. Routes datagrams between
//! one server repository and any number of client repositories without
//! network I/O.

use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use strix_client::transport::{
    PacketReceiver as ClientPacketReceiver, PacketSender as ClientPacketSender,
    RecvError as ClientRecvError, SendError as ClientSendError, Socket as ClientSocket,
};
use strix_server::transport::{
    PacketReceiver as ServerPacketReceiver, PacketSender as ServerPacketSender,
    RecvError as ServerRecvError, SendError as ServerSendError, Socket as ServerSocket,
};

/// Returns the fake address the wire uses for client number `n`.
pub fn client_addr(n: u16) -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 40_000 + n))
}

type ToServerQueue = Arc<Mutex<VecDeque<(SocketAddr, Vec<u8>)>>>;
type ToClientQueues = Arc<Mutex<HashMap<SocketAddr, VecDeque<Vec<u8>>>>>;

/// A shared in-memory wire. Clone it freely; all clones route over the
/// same queues.
#[derive(Clone, Default)]
pub struct LocalWire {
    to_server: ToServerQueue,
    to_clients: ToClientQueues,
}

impl LocalWire {
    pub fn new() -> Self {
        Self::default()
    }

    /// A client-side socket that sends from the given fake address.
    pub fn client_socket(&self, address: SocketAddr) -> Box<dyn ClientSocket> {
        Box::new(LocalClientSocket {
            wire: self.clone(),
            address,
        })
    }

    /// The server-side socket. Listen on it once per wire.
    pub fn server_socket(&self) -> Box<dyn ServerSocket> {
        Box::new(LocalServerSocket { wire: self.clone() })
    }

    /// Datagrams queued for a client but not yet received.
    pub fn pending_for(&self, address: SocketAddr) -> usize {
        self.to_clients
            .lock()
            .unwrap()
            .get(&address)
            .map_or(0, VecDeque::len)
    }
}

// Client side

struct LocalClientSocket {
    wire: LocalWire,
    address: SocketAddr,
}

impl ClientSocket for LocalClientSocket {
    fn connect(self: Box<Self>) -> (Box<dyn ClientPacketSender>, Box<dyn ClientPacketReceiver>) {
        (
            Box::new(LocalClientSender {
                wire: self.wire.clone(),
                address: self.address,
            }),
            Box::new(LocalClientReceiver {
                wire: self.wire,
                address: self.address,
                buffer: Vec::new(),
            }),
        )
    }
}

struct LocalClientSender {
    wire: LocalWire,
    address: SocketAddr,
}

impl ClientPacketSender for LocalClientSender {
    fn send(&self, payload: &[u8]) -> Result<(), ClientSendError> {
        self.wire
            .to_server
            .lock()
            .unwrap()
            .push_back((self.address, payload.to_vec()));
        Ok(())
    }
}

struct LocalClientReceiver {
    wire: LocalWire,
    address: SocketAddr,
    buffer: Vec<u8>,
}

impl ClientPacketReceiver for LocalClientReceiver {
    fn receive(&mut self) -> Result<Option<&[u8]>, ClientRecvError> {
        let next = self
            .wire
            .to_clients
            .lock()
            .unwrap()
            .get_mut(&self.address)
            .and_then(VecDeque::pop_front);
        match next {
            Some(bytes) => {
                self.buffer = bytes;
                Ok(Some(&self.buffer))
            }
            None => Ok(None),
        }
    }
}

// Server side

struct LocalServerSocket {
    wire: LocalWire,
}

impl ServerSocket for LocalServerSocket {
    fn listen(self: Box<Self>) -> (Box<dyn ServerPacketSender>, Box<dyn ServerPacketReceiver>) {
        (
            Box::new(LocalServerSender {
                wire: self.wire.clone(),
            }),
            Box::new(LocalServerReceiver {
                wire: self.wire,
                buffer: Vec::new(),
            }),
        )
    }
}

struct LocalServerSender {
    wire: LocalWire,
}

impl ServerPacketSender for LocalServerSender {
    fn send(&self, address: &SocketAddr, payload: &[u8]) -> Result<(), ServerSendError> {
        self.wire
            .to_clients
            .lock()
            .unwrap()
            .entry(*address)
            .or_default()
            .push_back(payload.to_vec());
        Ok(())
    }
}

struct LocalServerReceiver {
    wire: LocalWire,
    buffer: Vec<u8>,
}

impl ServerPacketReceiver for LocalServerReceiver {
    fn receive(&mut self) -> Result<Option<(SocketAddr, &[u8])>, ServerRecvError> {
        let next = self.wire.to_server.lock().unwrap().pop_front();
        match next {
            Some((address, bytes)) => {
                self.buffer = bytes;
                Ok(Some((address, &self.buffer)))
            }
            None => Ok(None),
        }
    }
}
