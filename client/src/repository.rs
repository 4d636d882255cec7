use std::collections::{HashMap, HashSet, VecDeque};

use log::{debug, info, warn};

use strix_shared::{
    begin_message, ActiveState, Datagram, DatagramIterator, DcField, DcSchema, DcValue,
    DelayDelete, DeleteDecision, DistributedObject, DoId, DoIdAllocator, Messenger, MsgType,
    ObjectContext, ObjectError, ObjectFactory, ReleaseOutcome, SceneGraph, Timer, UpdateOutbox,
    ZoneId, UBER_ZONE,
};

use crate::client_config::{ClientConfig, UnknownUpdatePolicy};
use crate::error::StrixClientError;
use crate::events::{ClientEvent, ClientEvents};
use crate::transport::{PacketReceiver, PacketSender, Socket};

struct ServerSession {
    sender: Box<dyn PacketSender>,
    receiver: Box<dyn PacketReceiver>,
    heartbeat: Timer,
    timeout: Timer,
    timed_out: bool,
}

impl ServerSession {
    fn mark_heard(&mut self, now: f64) {
        self.timeout.reset(now);
        self.timed_out = false;
    }
}

/// The client-side object repository.
///
/// Holds every distributed object the server has replicated to this
/// session, keyed by doId, and drives their lifecycle as create, update,
/// disable, and delete messages arrive. Outbound, it packs field updates,
/// interest changes, and client-side creates into session datagrams.
///
/// The repository never reads a clock; callers pass `now` into every
/// entry point so a test or a replay can run it on any timeline.
pub struct ClientRepository {
    config: ClientConfig,
    schema: DcSchema,
    factory: ObjectFactory,
    session: Option<ServerSession>,
    objects: HashMap<DoId, Box<dyn DistributedObject>>,
    deleted: HashSet<DoId>,
    pending_updates: HashMap<DoId, VecDeque<Vec<u8>>>,
    interest: HashSet<ZoneId>,
    pending_zones: HashSet<ZoneId>,
    allocator: Option<DoIdAllocator>,
    outbox: UpdateOutbox,
    events: ClientEvents,
}

impl ClientRepository {
    /// # Panics
    /// Panics if the schema has not been locked.
    pub fn new(config: ClientConfig, schema: DcSchema, factory: ObjectFactory) -> Self {
        schema.require_lock();
        Self {
            config,
            schema,
            factory,
            session: None,
            objects: HashMap::new(),
            deleted: HashSet::new(),
            pending_updates: HashMap::new(),
            interest: HashSet::new(),
            pending_zones: HashSet::new(),
            allocator: None,
            outbox: UpdateOutbox::new(),
            events: ClientEvents::new(),
        }
    }

    /// Connects the transport. The session starts fresh: doIds deleted
    /// under an old session mean nothing under the new one.
    pub fn connect(&mut self, socket: Box<dyn Socket>, now: f64) {
        if self.session.is_some() {
            warn!("connect while already connected, dropping the old session");
        }
        let (sender, receiver) = socket.connect();
        self.session = Some(ServerSession {
            sender,
            receiver,
            heartbeat: Timer::new(self.config.heartbeat_interval, now),
            timeout: Timer::new(self.config.server_timeout, now),
            timed_out: false,
        });
        self.deleted.clear();
        info!("client transport connected");
    }

    pub fn is_connected(&self) -> bool {
        self.session.is_some()
    }

    /// Tells the server goodbye and tears down every object through the
    /// normal lifecycle. Objects held by delay-delete finish their delete
    /// when the last holder releases.
    pub fn disconnect(&mut self, scene: &mut dyn SceneGraph, messenger: &mut Messenger, now: f64) {
        if self.session.is_none() {
            return;
        }
        let dg = begin_message(MsgType::Disconnect);
        if self.send_raw(&dg).is_err() {
            warn!("could not send disconnect, dropping the session anyway");
        }
        self.session = None;
        self.teardown_all(scene, messenger, now);
        self.events.push(ClientEvent::Disconnected);
        info!("client disconnected");
    }

    // Incoming data

    /// Drains the transport and processes every waiting datagram. A
    /// malformed datagram is logged and dropped; the rest of the batch
    /// still runs.
    pub fn process_incoming(
        &mut self,
        scene: &mut dyn SceneGraph,
        messenger: &mut Messenger,
        now: f64,
    ) {
        loop {
            let payload = {
                let Some(session) = self.session.as_mut() else {
                    return;
                };
                match session.receiver.receive() {
                    Ok(Some(bytes)) => {
                        let payload = bytes.to_vec();
                        session.mark_heard(now);
                        payload
                    }
                    Ok(None) => break,
                    Err(_) => {
                        warn!("transport receive failed");
                        break;
                    }
                }
            };
            if let Err(e) = self.handle_datagram(&payload, scene, messenger, now) {
                warn!("dropping datagram from server: {e}");
            }
        }
        self.flush_outbox();
    }

    fn handle_datagram(
        &mut self,
        payload: &[u8],
        scene: &mut dyn SceneGraph,
        messenger: &mut Messenger,
        now: f64,
    ) -> Result<(), StrixClientError> {
        let mut di = DatagramIterator::new(payload);
        let msg = MsgType::try_from(di.get_uint16()?)?;
        match msg {
            MsgType::CreateObjectRequired => self.handle_create(&mut di, false, scene, messenger, now),
            MsgType::CreateObjectRequiredOther => {
                self.handle_create(&mut di, true, scene, messenger, now)
            }
            MsgType::ObjectUpdateField => self.handle_update(&mut di, scene, messenger, now),
            MsgType::ObjectDisable => self.handle_disable(&mut di, scene, messenger, now),
            MsgType::ObjectDelete => self.handle_delete(&mut di, scene, messenger, now),
            MsgType::SetZoneDone => self.handle_set_zone_done(&mut di, messenger),
            MsgType::SetDoidRange => self.handle_set_doid_range(&mut di),
            MsgType::Disconnect => {
                self.handle_server_disconnect(scene, messenger, now);
                Ok(())
            }
            MsgType::SetZone | MsgType::Heartbeat => {
                warn!("received {msg:?}, which only travels client to server");
                Ok(())
            }
        }
    }

    fn handle_create(
        &mut self,
        di: &mut DatagramIterator<'_>,
        with_other: bool,
        scene: &mut dyn SceneGraph,
        messenger: &mut Messenger,
        now: f64,
    ) -> Result<(), StrixClientError> {
        let zone = di.get_uint32()?;
        let class_id = di.get_uint16()?;
        let do_id = di.get_uint32()?;

        if self.deleted.contains(&do_id) {
            warn!("create for doId {do_id}, which was deleted earlier; doIds never come back");
            return Ok(());
        }
        let required: Vec<DcField> = {
            let Some(class) = self.schema.class_by_id(class_id) else {
                return Err(ObjectError::UnknownClass(class_id).into());
            };
            match self.objects.get_mut(&do_id) {
                Some(obj) if obj.repl().class_id() != class_id => {
                    warn!(
                        "create for doId {do_id} as class {class_id}, but it is class {}; dropping",
                        obj.repl().class_id()
                    );
                    return Ok(());
                }
                Some(obj) => {
                    if obj.repl().state() == ActiveState::Disabled {
                        debug!("doId {do_id} re-entering interest in zone {zone}");
                    } else {
                        warn!("create for live doId {do_id}, taking the new state");
                    }
                    obj.repl_mut().set_zone_id(zone);
                    obj.repl_mut().begin_generate(class);
                }
                None => {
                    let mut obj = self.factory.construct(class_id, do_id, zone)?;
                    obj.repl_mut().begin_generate(class);
                    self.objects.insert(do_id, obj);
                }
            }
            class.required_fields().cloned().collect()
        };

        self.with_object(do_id, scene, messenger, now, |obj, ctx| {
            obj.generate(ctx);
            obj.repl_mut().mark_initialized();
        });

        // Required values follow in declaration order.
        for field in &required {
            let args = field.unpack(di)?;
            if let Some(Err(e)) = self.with_object(do_id, scene, messenger, now, |obj, ctx| {
                obj.receive_field(field, &args, ctx)
            }) {
                warn!(
                    "doId {do_id}: required field `{}` handler failed: {e}",
                    field.name()
                );
            }
            if let Some(obj) = self.objects.get_mut(&do_id) {
                obj.repl_mut().note_required(field.id());
            }
        }

        // The _OTHER form carries explicit field pairs after the required
        // block, usually ram state the object picked up before this
        // session saw it.
        if with_other {
            while di.remaining() > 0 {
                let field_id = di.get_uint16()?;
                let (field, owner) = match self.schema.field_by_id(field_id) {
                    Some((class, field)) => (field.clone(), class.id()),
                    None => return Err(ObjectError::UnknownFieldId(field_id).into()),
                };
                let args = field.unpack(di)?;
                if owner != class_id {
                    warn!(
                        "doId {do_id}: create carries field `{}` of another class, ignoring",
                        field.name()
                    );
                    continue;
                }
                if let Some(Err(e)) = self.with_object(do_id, scene, messenger, now, |obj, ctx| {
                    obj.receive_field(&field, &args, ctx)
                }) {
                    warn!("doId {do_id}: field `{}` handler failed: {e}", field.name());
                }
                if field.is_required() {
                    if let Some(obj) = self.objects.get_mut(&do_id) {
                        obj.repl_mut().note_required(field.id());
                    }
                }
            }
        }

        // Updates that raced ahead of this create replay now, before
        // announce fires.
        if let Some(buffered) = self.pending_updates.remove(&do_id) {
            debug!("doId {do_id}: replaying {} buffered updates", buffered.len());
            for body in buffered {
                if let Err(e) = self.apply_update_body(do_id, &body, scene, messenger, now) {
                    warn!("doId {do_id}: dropping buffered update: {e}");
                }
            }
        }

        let fire = self.objects.get(&do_id).map_or(false, |obj| {
            let repl = obj.repl();
            repl.required_complete() && !repl.announced() && repl.state() == ActiveState::Generating
        });
        if fire {
            self.fire_announce(do_id, scene, messenger, now);
        }
        Ok(())
    }

    fn handle_update(
        &mut self,
        di: &mut DatagramIterator<'_>,
        scene: &mut dyn SceneGraph,
        messenger: &mut Messenger,
        now: f64,
    ) -> Result<(), StrixClientError> {
        let do_id = di.get_uint32()?;
        if self.deleted.contains(&do_id) {
            debug!("dropping update for deleted doId {do_id}");
            return Ok(());
        }
        let rest = di.remaining();
        let body = di.extract_bytes(rest)?;
        if self.objects.contains_key(&do_id) {
            return self.apply_update_body(do_id, body, scene, messenger, now);
        }

        // The object's create has not arrived yet.
        if self.config.is_global_doid(do_id) {
            self.pending_updates
                .entry(do_id)
                .or_default()
                .push_back(body.to_vec());
            return Ok(());
        }
        match self.config.unknown_update_policy {
            UnknownUpdatePolicy::Drop => {
                debug!("dropping update for unknown doId {do_id}");
            }
            UnknownUpdatePolicy::Buffer { limit } => {
                let queue = self.pending_updates.entry(do_id).or_default();
                if queue.len() >= limit {
                    warn!("doId {do_id}: unknown-update buffer full ({limit}), dropping update");
                } else {
                    queue.push_back(body.to_vec());
                }
            }
        }
        Ok(())
    }

    /// Applies one `[fieldId][args]` body to a known object.
    fn apply_update_body(
        &mut self,
        do_id: DoId,
        body: &[u8],
        scene: &mut dyn SceneGraph,
        messenger: &mut Messenger,
        now: f64,
    ) -> Result<(), StrixClientError> {
        let mut di = DatagramIterator::new(body);
        let field_id = di.get_uint16()?;
        let (field, owner) = match self.schema.field_by_id(field_id) {
            Some((class, field)) => (field.clone(), class.id()),
            None => return Err(ObjectError::UnknownFieldId(field_id).into()),
        };
        let Some(object_class) = self.objects.get(&do_id).map(|o| o.repl().class_id()) else {
            return Err(ObjectError::UnknownObject(do_id).into());
        };
        if owner != object_class {
            warn!(
                "doId {do_id}: update names field `{}` of another class, dropping",
                field.name()
            );
            return Ok(());
        }
        let args = field.unpack(&mut di)?;
        if di.remaining() > 0 {
            warn!(
                "doId {do_id}: {} trailing bytes after `{}` args",
                di.remaining(),
                field.name()
            );
        }

        let dispatch = self.with_object(do_id, scene, messenger, now, |obj, ctx| {
            obj.receive_field(&field, &args, ctx)
        });
        // The field arrived and decoded whether or not the handler liked
        // it; the announce gate counts arrivals.
        if field.is_required() {
            let fire = self
                .objects
                .get_mut(&do_id)
                .map_or(false, |o| o.repl_mut().note_required(field.id()));
            if fire {
                self.fire_announce(do_id, scene, messenger, now);
            }
        }
        match dispatch {
            Some(Err(e)) => Err(e.into()),
            _ => Ok(()),
        }
    }

    fn handle_disable(
        &mut self,
        di: &mut DatagramIterator<'_>,
        scene: &mut dyn SceneGraph,
        messenger: &mut Messenger,
        now: f64,
    ) -> Result<(), StrixClientError> {
        let do_id = di.get_uint32()?;
        match self.objects.get(&do_id) {
            None => {
                if !self.deleted.contains(&do_id) {
                    warn!("disable for unknown doId {do_id}");
                }
                return Ok(());
            }
            Some(obj) if obj.repl().never_disable() => {
                debug!("doId {do_id} is marked never-disable, ignoring disable");
                return Ok(());
            }
            Some(obj) if !obj.repl().is_alive() => {
                debug!("disable for doId {do_id} in state {:?}", obj.repl().state());
                return Ok(());
            }
            Some(_) => {}
        }
        self.disable_object_local(do_id, scene, messenger, now);
        Ok(())
    }

    fn handle_delete(
        &mut self,
        di: &mut DatagramIterator<'_>,
        scene: &mut dyn SceneGraph,
        messenger: &mut Messenger,
        now: f64,
    ) -> Result<(), StrixClientError> {
        let do_id = di.get_uint32()?;
        if self.deleted.contains(&do_id) {
            debug!("delete repeated for doId {do_id}");
            return Ok(());
        }
        let Some(decision) = self
            .objects
            .get_mut(&do_id)
            .map(|o| o.repl_mut().request_delete())
        else {
            warn!("delete for unknown doId {do_id}");
            return Ok(());
        };
        match decision {
            DeleteDecision::DeleteNow => self.delete_object_local(do_id, scene, messenger, now),
            DeleteDecision::Deferred => {
                debug!("doId {do_id}: delete deferred by delay-delete holders")
            }
            DeleteDecision::AlreadyDeleted => {}
        }
        Ok(())
    }

    fn handle_set_zone_done(
        &mut self,
        di: &mut DatagramIterator<'_>,
        messenger: &mut Messenger,
    ) -> Result<(), StrixClientError> {
        let zone = di.get_uint32()?;
        if !self.pending_zones.remove(&zone) {
            warn!("set-zone-done for zone {zone} without an outstanding request");
        }
        self.events.push(ClientEvent::ZoneComplete(zone));
        messenger.send(&format!("set-zone-done-{zone}"), vec![]);
        Ok(())
    }

    fn handle_set_doid_range(
        &mut self,
        di: &mut DatagramIterator<'_>,
    ) -> Result<(), StrixClientError> {
        let base = di.get_uint32()?;
        let size = di.get_uint32()?;
        let Some(end) = base.checked_add(size) else {
            warn!("doId range [{base}, +{size}) overflows, ignoring");
            return Ok(());
        };
        info!("server granted doId range [{base}, {end})");
        self.allocator = Some(DoIdAllocator::new(base, end));
        self.events.push(ClientEvent::DoIdRangeGranted { base, size });
        Ok(())
    }

    fn handle_server_disconnect(
        &mut self,
        scene: &mut dyn SceneGraph,
        messenger: &mut Messenger,
        now: f64,
    ) {
        info!("server closed the session");
        self.session = None;
        self.teardown_all(scene, messenger, now);
        self.events.push(ClientEvent::Disconnected);
    }

    // Outgoing data

    /// Packs and sends one field update. Fields without the clsend
    /// keyword may only be sent on objects this session created.
    pub fn send_update(
        &mut self,
        do_id: DoId,
        field: &str,
        args: &[DcValue],
    ) -> Result<(), StrixClientError> {
        let dc_field = {
            let obj = self
                .objects
                .get(&do_id)
                .ok_or(ObjectError::UnknownObject(do_id))?;
            let class_id = obj.repl().class_id();
            let class = self
                .schema
                .class_by_id(class_id)
                .ok_or(ObjectError::UnknownClass(class_id))?;
            class
                .field_by_name(field)
                .ok_or_else(|| ObjectError::UnknownField {
                    class: class.name().to_string(),
                    name: field.to_string(),
                })?
                .clone()
        };
        if !dc_field.is_clsend() && !self.owns(do_id) {
            return Err(ObjectError::FieldNotSendable {
                field: field.to_string(),
            }
            .into());
        }
        let mut dg = begin_message(MsgType::ObjectUpdateField);
        dg.add_uint32(do_id);
        dg.add_uint16(dc_field.id());
        dc_field.pack(args, &mut dg)?;
        self.send_raw(&dg)
    }

    /// Creates an object under a doId from the granted block, runs the
    /// full local lifecycle, and tells the server. `required` carries one
    /// argument list per required field, in declaration order.
    pub fn create_distributed_object(
        &mut self,
        class_name: &str,
        zone: ZoneId,
        required: Vec<Vec<DcValue>>,
        scene: &mut dyn SceneGraph,
        messenger: &mut Messenger,
        now: f64,
    ) -> Result<DoId, StrixClientError> {
        if self.session.is_none() {
            return Err(StrixClientError::NotConnected);
        }
        let (class_id, fields) = {
            let Some(class) = self.schema.class_by_name(class_name) else {
                return Err(StrixClientError::UnknownClassName(class_name.to_string()));
            };
            let fields: Vec<DcField> = class.required_fields().cloned().collect();
            if fields.len() != required.len() {
                return Err(StrixClientError::RequiredArity {
                    class: class_name.to_string(),
                    expected: fields.len(),
                    got: required.len(),
                });
            }
            (class.id(), fields)
        };
        if !self.factory.has_class(class_id) {
            return Err(ObjectError::UnknownClass(class_id).into());
        }
        let allocator = self
            .allocator
            .as_mut()
            .ok_or(StrixClientError::NoDoIdRange)?;
        let do_id = allocator.allocate()?;

        // Pack before constructing so argument errors leave no half-made
        // object behind.
        let mut dg = begin_message(MsgType::CreateObjectRequired);
        dg.add_uint32(zone);
        dg.add_uint16(class_id);
        dg.add_uint32(do_id);
        for (field, args) in fields.iter().zip(&required) {
            field.pack(args, &mut dg)?;
        }
        self.send_raw(&dg)?;

        let mut obj = self.factory.construct(class_id, do_id, zone)?;
        if let Some(class) = self.schema.class_by_id(class_id) {
            obj.repl_mut().begin_generate(class);
        }
        self.objects.insert(do_id, obj);

        self.with_object(do_id, scene, messenger, now, |obj, ctx| {
            obj.generate(ctx);
            obj.repl_mut().mark_initialized();
        });
        for (field, args) in fields.iter().zip(&required) {
            if let Some(Err(e)) = self.with_object(do_id, scene, messenger, now, |obj, ctx| {
                obj.receive_field(field, args, ctx)
            }) {
                warn!(
                    "doId {do_id}: required field `{}` handler failed: {e}",
                    field.name()
                );
            }
            if let Some(obj) = self.objects.get_mut(&do_id) {
                obj.repl_mut().note_required(field.id());
            }
        }
        self.fire_announce(do_id, scene, messenger, now);
        self.flush_outbox();
        info!("created {class_name} doId {do_id} in zone {zone}");
        Ok(do_id)
    }

    /// Declares the zones this session wants to see: one primary zone
    /// plus any extras. The UberZone never needs declaring; the server
    /// keeps every session in it.
    pub fn set_interest(
        &mut self,
        primary: ZoneId,
        extras: &[ZoneId],
    ) -> Result<(), StrixClientError> {
        debug_assert!(extras.len() <= u16::MAX as usize);
        let mut dg = begin_message(MsgType::SetZone);
        dg.add_uint32(primary);
        dg.add_uint16(extras.len() as u16);
        for &zone in extras {
            dg.add_uint32(zone);
        }
        self.send_raw(&dg)?;
        self.pending_zones.insert(primary);
        self.interest = extras.iter().copied().chain([primary]).collect();
        debug!("interest set to zone {primary} (+{} extras)", extras.len());
        Ok(())
    }

    /// Deletes an object this session created, on the server and locally.
    /// Local teardown waits for delay-delete holders; the wire message
    /// does not.
    pub fn request_delete(
        &mut self,
        do_id: DoId,
        scene: &mut dyn SceneGraph,
        messenger: &mut Messenger,
        now: f64,
    ) -> Result<(), StrixClientError> {
        if self.deleted.contains(&do_id) {
            warn!("delete requested again for doId {do_id}");
            return Err(ObjectError::AlreadyDeleted(do_id).into());
        }
        if !self.objects.contains_key(&do_id) {
            return Err(ObjectError::UnknownObject(do_id).into());
        }
        if !self.owns(do_id) {
            return Err(StrixClientError::NotOwned(do_id));
        }
        let mut dg = begin_message(MsgType::ObjectDelete);
        dg.add_uint32(do_id);
        self.send_raw(&dg)?;

        match self
            .objects
            .get_mut(&do_id)
            .map(|o| o.repl_mut().request_delete())
        {
            Some(DeleteDecision::DeleteNow) => {
                self.delete_object_local(do_id, scene, messenger, now)
            }
            Some(DeleteDecision::Deferred) => {
                debug!("doId {do_id}: delete deferred by delay-delete holders")
            }
            Some(DeleteDecision::AlreadyDeleted) | None => {}
        }
        self.flush_outbox();
        Ok(())
    }

    /// Keeps the session alive and watches for server silence. Call once
    /// per frame.
    pub fn tick(&mut self, now: f64) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if session.heartbeat.ringing(now) {
            session.heartbeat.reset(now);
            let dg = begin_message(MsgType::Heartbeat);
            if session.sender.send(dg.bytes()).is_err() {
                warn!("could not send heartbeat");
            }
        }
        if session.timeout.ringing(now) && !session.timed_out {
            session.timed_out = true;
            warn!(
                "nothing heard from the server for {:.0} seconds",
                session.timeout.interval()
            );
            self.events.push(ClientEvent::ServerTimeout);
        }
    }

    fn send_raw(&mut self, dg: &Datagram) -> Result<(), StrixClientError> {
        let session = self.session.as_mut().ok_or(StrixClientError::NotConnected)?;
        session
            .sender
            .send(dg.bytes())
            .map_err(|_| StrixClientError::SendError)
    }

    /// Sends everything object hooks queued during dispatch.
    fn flush_outbox(&mut self) {
        for (do_id, field, args) in self.outbox.drain() {
            if let Err(e) = self.send_update(do_id, &field, &args) {
                warn!("dropping queued update `{field}` for doId {do_id}: {e}");
            }
        }
    }

    // Lifecycle

    fn fire_announce(
        &mut self,
        do_id: DoId,
        scene: &mut dyn SceneGraph,
        messenger: &mut Messenger,
        now: f64,
    ) {
        self.with_object(do_id, scene, messenger, now, |obj, ctx| {
            obj.repl_mut().mark_announced();
            obj.announce_generate(ctx);
        });
        self.events.push(ClientEvent::ObjectGenerated(do_id));
    }

    fn disable_object_local(
        &mut self,
        do_id: DoId,
        scene: &mut dyn SceneGraph,
        messenger: &mut Messenger,
        now: f64,
    ) {
        self.with_object(do_id, scene, messenger, now, |obj, ctx| {
            obj.repl_mut().mark_disabled();
            obj.disable(ctx);
        });
        self.events.push(ClientEvent::ObjectDisabled(do_id));
    }

    fn delete_object_local(
        &mut self,
        do_id: DoId,
        scene: &mut dyn SceneGraph,
        messenger: &mut Messenger,
        now: f64,
    ) {
        let Some(mut obj) = self.objects.remove(&do_id) else {
            return;
        };
        {
            let mut ctx = ObjectContext {
                scene,
                messenger,
                outbox: &mut self.outbox,
                now,
            };
            if obj.repl().is_alive() {
                obj.repl_mut().mark_disabled();
                obj.disable(&mut ctx);
            }
            obj.repl_mut().mark_deleted();
            obj.delete(&mut ctx);
        }
        self.deleted.insert(do_id);
        self.pending_updates.remove(&do_id);
        self.events.push(ClientEvent::ObjectDeleted(do_id));
    }

    fn teardown_all(&mut self, scene: &mut dyn SceneGraph, messenger: &mut Messenger, now: f64) {
        let mut ids: Vec<DoId> = self.objects.keys().copied().collect();
        ids.sort_unstable();
        for do_id in ids {
            match self
                .objects
                .get_mut(&do_id)
                .map(|o| o.repl_mut().request_delete())
            {
                Some(DeleteDecision::DeleteNow) => {
                    self.delete_object_local(do_id, scene, messenger, now)
                }
                Some(DeleteDecision::Deferred) => {
                    debug!("doId {do_id}: teardown deferred by delay-delete holders")
                }
                Some(DeleteDecision::AlreadyDeleted) | None => {}
            }
        }
        self.outbox.drain();
        self.pending_updates.clear();
        self.pending_zones.clear();
        self.interest.clear();
        self.allocator = None;
    }

    /// Runs `f` against an object with a full context. The object is
    /// lifted out of the table for the call, so hooks can never observe
    /// themselves through the repository.
    fn with_object<R>(
        &mut self,
        do_id: DoId,
        scene: &mut dyn SceneGraph,
        messenger: &mut Messenger,
        now: f64,
        f: impl FnOnce(&mut dyn DistributedObject, &mut ObjectContext<'_>) -> R,
    ) -> Option<R> {
        let mut obj = self.objects.remove(&do_id)?;
        let result = {
            let mut ctx = ObjectContext {
                scene,
                messenger,
                outbox: &mut self.outbox,
                now,
            };
            f(obj.as_mut(), &mut ctx)
        };
        self.objects.insert(do_id, obj);
        Some(result)
    }

    // Delay-delete

    /// Takes a delay-delete reference on an object, keeping it alive
    /// until every holder releases.
    pub fn delay_delete(
        &mut self,
        do_id: DoId,
        reason: &str,
    ) -> Result<DelayDelete, StrixClientError> {
        self.objects
            .get_mut(&do_id)
            .map(|o| o.repl_mut().acquire_delay(reason))
            .ok_or_else(|| ObjectError::UnknownObject(do_id).into())
    }

    /// Releases a delay-delete reference; a deferred delete due now runs
    /// immediately.
    pub fn release_delay(
        &mut self,
        handle: DelayDelete,
        scene: &mut dyn SceneGraph,
        messenger: &mut Messenger,
        now: f64,
    ) {
        let Some(obj) = self.objects.get_mut(&handle.do_id) else {
            warn!("released delay-delete for unknown doId {}", handle.do_id);
            return;
        };
        match obj.repl_mut().release_delay(handle) {
            ReleaseOutcome::Retained | ReleaseOutcome::Released => {}
            ReleaseOutcome::DeleteNow => {
                self.delete_object_local(handle.do_id, scene, messenger, now);
                self.flush_outbox();
            }
        }
    }

    // Accessors

    pub fn object(&self, do_id: DoId) -> Option<&dyn DistributedObject> {
        self.objects.get(&do_id).map(|o| o.as_ref())
    }

    pub fn object_mut(&mut self, do_id: DoId) -> Option<&mut dyn DistributedObject> {
        self.objects
            .get_mut(&do_id)
            .map(|o| -> &mut dyn DistributedObject { o.as_mut() })
    }

    /// A typed view of an object in the table.
    pub fn object_as<T: 'static>(&self, do_id: DoId) -> Option<&T> {
        self.objects.get(&do_id)?.as_any().downcast_ref()
    }

    pub fn object_as_mut<T: 'static>(&mut self, do_id: DoId) -> Option<&mut T> {
        self.objects.get_mut(&do_id)?.as_any_mut().downcast_mut()
    }

    pub fn num_objects(&self) -> usize {
        self.objects.len()
    }

    /// Whether the doId fell out of this session's granted block.
    pub fn owns(&self, do_id: DoId) -> bool {
        self.allocator.as_ref().map_or(false, |a| a.contains(do_id))
    }

    /// The zones this session currently watches. The UberZone is always
    /// included.
    pub fn interest_zones(&self) -> HashSet<ZoneId> {
        let mut zones = self.interest.clone();
        zones.insert(UBER_ZONE);
        zones
    }

    pub fn schema(&self) -> &DcSchema {
        &self.schema
    }

    /// Drains queued lifecycle notifications, oldest first.
    pub fn take_events(&mut self) -> Vec<ClientEvent> {
        self.events.take()
    }
}
