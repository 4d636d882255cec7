//! A client repository bundled with the scene and messenger it is driven
//! with, so tests read like application code.

use strix_client::{ClientConfig, ClientRepository, StrixClientError};
use strix_shared::{DcSchema, DcValue, DelayDelete, DoId, HeadlessScene, Messenger, ObjectFactory, ZoneId};

use crate::local_socket::{client_addr, LocalWire};

pub struct TestClient {
    pub repo: ClientRepository,
    pub messenger: Messenger,
    pub scene: HeadlessScene,
}

impl TestClient {
    pub fn new(schema: DcSchema, factory: ObjectFactory) -> Self {
        Self::with_config(ClientConfig::default(), schema, factory)
    }

    pub fn with_config(config: ClientConfig, schema: DcSchema, factory: ObjectFactory) -> Self {
        Self {
            repo: ClientRepository::new(config, schema, factory),
            messenger: Messenger::new(),
            scene: HeadlessScene,
        }
    }

    /// Connects over the wire as client number `n`.
    pub fn connect(&mut self, wire: &LocalWire, n: u16, now: f64) {
        self.repo.connect(wire.client_socket(client_addr(n)), now);
    }

    /// Receives and dispatches everything waiting on the wire.
    pub fn pump(&mut self, now: f64) {
        self.repo
            .process_incoming(&mut self.scene, &mut self.messenger, now);
    }

    pub fn create(
        &mut self,
        class_name: &str,
        zone: ZoneId,
        required: Vec<Vec<DcValue>>,
        now: f64,
    ) -> Result<DoId, StrixClientError> {
        self.repo.create_distributed_object(
            class_name,
            zone,
            required,
            &mut self.scene,
            &mut self.messenger,
            now,
        )
    }

    pub fn request_delete(&mut self, do_id: DoId, now: f64) -> Result<(), StrixClientError> {
        self.repo
            .request_delete(do_id, &mut self.scene, &mut self.messenger, now)
    }

    pub fn release(&mut self, handle: DelayDelete, now: f64) {
        self.repo
            .release_delay(handle, &mut self.scene, &mut self.messenger, now);
    }

    pub fn disconnect(&mut self, now: f64) {
        self.repo
            .disconnect(&mut self.scene, &mut self.messenger, now);
    }

    /// Names of every messenger event queued so far, draining the queue.
    pub fn event_names(&mut self) -> Vec<String> {
        self.messenger
            .drain()
            .into_iter()
            .map(|event| event.name)
            .collect()
    }
}
