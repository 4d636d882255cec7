use std::collections::{BTreeMap, HashMap, HashSet};
use std::net::SocketAddr;
use std::ops::Range;

use log::{debug, info, warn};

use strix_shared::{
    begin_message, ClassId, Datagram, DatagramIterator, DcField, DcSchema, DcValue, DoId,
    DoIdAllocator, FieldId, MsgType, ObjectError, Timer, ZoneAllocator, ZoneId, UBER_ZONE,
};

use crate::error::StrixServerError;
use crate::events::{ServerEvent, ServerEvents};
use crate::server_config::ServerConfig;
use crate::transport::{PacketReceiver, PacketSender, Socket};

/// Per-client session state, keyed by socket address.
struct ClientSession {
    /// Zones the client currently sees, always including [`UBER_ZONE`]
    interest: HashSet<ZoneId>,
    /// The doId block granted to this client, if any were left
    doid_range: Option<Range<DoId>>,
    timeout: Timer,
}

impl ClientSession {
    fn new(now: f64, timeout: f64) -> Self {
        let mut interest = HashSet::new();
        interest.insert(UBER_ZONE);
        ClientSession {
            interest,
            doid_range: None,
            timeout: Timer::new(timeout, now),
        }
    }

    fn owns(&self, do_id: DoId) -> bool {
        self.doid_range
            .as_ref()
            .map_or(false, |range| range.contains(&do_id))
    }
}

/// Why a session is being torn down.
enum SessionEnd {
    Disconnect,
    TimedOut,
}

/// The server's authoritative image of one object: enough to answer
/// "what does a client entering this zone need" without keeping a live
/// object instance around.
struct ObjectRecord {
    class_id: ClassId,
    zone: ZoneId,
    /// The session that created the object over the wire, if any
    owner: Option<SocketAddr>,
    /// Latest packed value per required field, in declaration order
    required: Vec<Vec<u8>>,
    /// Latest packed value per ram field that has been set at least once
    ram: BTreeMap<FieldId, Vec<u8>>,
}

/// The authoritative object store and relay.
///
/// A `ServerRepository` owns the canonical table of distributed objects,
/// grants doId blocks to connecting clients, tracks each session's zone
/// interest, and fans field updates out to every interested session. It
/// keeps packed field state rather than live object instances; game logic
/// that must run server-side lives in the host application, driven by
/// [`ServerEvent`]s.
pub struct ServerRepository {
    config: ServerConfig,
    schema: DcSchema,
    sender: Option<Box<dyn PacketSender>>,
    receiver: Option<Box<dyn PacketReceiver>>,
    sessions: HashMap<SocketAddr, ClientSession>,
    objects: HashMap<DoId, ObjectRecord>,
    /// Zone index over `objects`, kept free of empty sets
    zones: HashMap<ZoneId, HashSet<DoId>>,
    /// Allocator for server-side doIds, below the client block space
    allocator: DoIdAllocator,
    zone_allocator: ZoneAllocator,
    /// Next client block ordinal; block N covers
    /// `client_doid_base + N * client_block_size` onward
    next_block: u32,
    events: ServerEvents,
}

impl ServerRepository {
    /// Builds a repository over a locked schema.
    ///
    /// Panics if the schema was never locked, since an open schema could
    /// still be mutated out from under every session.
    pub fn new(config: ServerConfig, schema: DcSchema) -> Self {
        schema.require_lock();
        let allocator = DoIdAllocator::new(config.server_doid_base, config.client_doid_base);
        ServerRepository {
            config,
            schema,
            sender: None,
            receiver: None,
            sessions: HashMap::new(),
            objects: HashMap::new(),
            zones: HashMap::new(),
            allocator,
            zone_allocator: ZoneAllocator::new(),
            next_block: 0,
            events: ServerEvents::new(),
        }
    }

    /// Starts listening on the given socket.
    pub fn listen(&mut self, socket: Box<dyn Socket>) {
        let (sender, receiver) = socket.listen();
        self.sender = Some(sender);
        self.receiver = Some(receiver);
        info!("server repository listening");
    }

    pub fn is_listening(&self) -> bool {
        self.sender.is_some()
    }

    // Incoming data

    /// Drains the socket and dispatches every pending datagram.
    ///
    /// Any datagram from an unknown address implicitly opens a session
    /// for it. Malformed datagrams are logged and dropped without
    /// affecting the session.
    pub fn process_incoming(&mut self, now: f64) {
        let mut receiver = match self.receiver.take() {
            Some(receiver) => receiver,
            None => return,
        };
        loop {
            match receiver.receive() {
                Ok(Some((address, bytes))) => {
                    let payload = bytes.to_vec();
                    self.touch_session(address, now);
                    if let Err(e) = self.handle_datagram(address, &payload) {
                        warn!("dropping datagram from {address}: {e}");
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    warn!("server socket receive error: {e}");
                    break;
                }
            }
        }
        self.receiver = Some(receiver);
    }

    /// Refreshes the sender's timeout, opening a session for a new address.
    fn touch_session(&mut self, address: SocketAddr, now: f64) {
        if let Some(session) = self.sessions.get_mut(&address) {
            session.timeout.reset(now);
            return;
        }
        info!("new client session from {address}");
        let mut session = ClientSession::new(now, self.config.client_timeout);
        session.doid_range = self.grant_block();
        let granted = session.doid_range.clone();
        self.sessions.insert(address, session);
        self.events.push(ServerEvent::SessionConnected(address));
        match granted {
            Some(range) => {
                let mut dg = begin_message(MsgType::SetDoidRange);
                dg.add_uint32(range.start);
                dg.add_uint32(range.end - range.start);
                self.send_to(&address, &dg);
            }
            None => warn!("doId block space exhausted; {address} cannot create objects"),
        }
        for dg in self.creates_for_zones(std::iter::once(UBER_ZONE)) {
            self.send_to(&address, &dg);
        }
    }

    /// Carves the next doId block out of the client space, or `None` once
    /// the u32 space above `client_doid_base` is spent.
    fn grant_block(&mut self) -> Option<Range<DoId>> {
        let size = self.config.client_block_size;
        let base = self
            .next_block
            .checked_mul(size)
            .and_then(|offset| self.config.client_doid_base.checked_add(offset))?;
        let end = base.checked_add(size)?;
        self.next_block += 1;
        Some(base..end)
    }

    fn handle_datagram(&mut self, address: SocketAddr, bytes: &[u8]) -> Result<(), StrixServerError> {
        let mut di = DatagramIterator::new(bytes);
        let msg = MsgType::try_from(di.get_uint16()?)?;
        match msg {
            MsgType::SetZone => self.handle_set_zone(address, &mut di),
            MsgType::ObjectUpdateField => self.handle_update(address, &mut di, bytes),
            MsgType::CreateObjectRequired => self.handle_client_create(address, &mut di, false),
            MsgType::CreateObjectRequiredOther => self.handle_client_create(address, &mut di, true),
            MsgType::ObjectDelete => self.handle_client_delete(address, &mut di),
            // The timeout reset already happened in touch_session.
            MsgType::Heartbeat => Ok(()),
            MsgType::Disconnect => {
                self.drop_session(address, SessionEnd::Disconnect);
                Ok(())
            }
            MsgType::ObjectDisable | MsgType::SetZoneDone | MsgType::SetDoidRange => {
                warn!("{address} sent {msg:?}, which only travels server to client");
                Ok(())
            }
        }
    }

    /// Replaces the session's interest set and synthesizes the object
    /// traffic the move implies: disables for departed zones, creates for
    /// entered ones, then the completion marker for the primary zone.
    fn handle_set_zone(
        &mut self,
        address: SocketAddr,
        di: &mut DatagramIterator<'_>,
    ) -> Result<(), StrixServerError> {
        let primary = di.get_uint32()?;
        let count = di.get_uint16()?;
        let mut wanted = HashSet::new();
        wanted.insert(UBER_ZONE);
        wanted.insert(primary);
        for _ in 0..count {
            wanted.insert(di.get_uint32()?);
        }

        let old = match self.sessions.get(&address) {
            Some(session) => session.interest.clone(),
            None => return Ok(()),
        };

        let mut departed: Vec<DoId> = Vec::new();
        for zone in old.difference(&wanted) {
            if let Some(do_ids) = self.zones.get(zone) {
                departed.extend(do_ids.iter().copied());
            }
        }
        departed.sort_unstable();
        for do_id in departed {
            let mut dg = begin_message(MsgType::ObjectDisable);
            dg.add_uint32(do_id);
            self.send_to(&address, &dg);
        }

        let entered: Vec<ZoneId> = wanted.difference(&old).copied().collect();
        for dg in self.creates_for_zones(entered.iter().copied()) {
            self.send_to(&address, &dg);
        }

        if let Some(session) = self.sessions.get_mut(&address) {
            session.interest = wanted;
        }

        // The completion marker goes out after every synthesized create so
        // the client can trust the zone is fully populated on arrival.
        let mut done = begin_message(MsgType::SetZoneDone);
        done.add_uint32(primary);
        self.send_to(&address, &done);
        debug!("{address} interest now centers on zone {primary}");
        Ok(())
    }

    /// Builds create datagrams for every object in the given zones, in
    /// ascending doId order.
    fn creates_for_zones(&self, zones: impl Iterator<Item = ZoneId>) -> Vec<Datagram> {
        let mut do_ids: Vec<DoId> = Vec::new();
        for zone in zones {
            if let Some(ids) = self.zones.get(&zone) {
                do_ids.extend(ids.iter().copied());
            }
        }
        do_ids.sort_unstable();
        do_ids
            .iter()
            .filter_map(|do_id| {
                self.objects
                    .get(do_id)
                    .map(|record| create_datagram(*do_id, record))
            })
            .collect()
    }

    /// Applies a client's field update and relays it to interested peers.
    ///
    /// The original payload bytes are forwarded verbatim on the broadcast
    /// path; unpacking here only validates the args and refreshes the
    /// stored object image.
    fn handle_update(
        &mut self,
        address: SocketAddr,
        di: &mut DatagramIterator<'_>,
        payload: &[u8],
    ) -> Result<(), StrixServerError> {
        let do_id = di.get_uint32()?;
        let field_id = di.get_uint16()?;

        let record_class = match self.objects.get(&do_id) {
            Some(record) => record.class_id,
            None => {
                warn!("{address} updated unknown object {do_id}");
                return Ok(());
            }
        };
        let (field, owner_class) = {
            let (class, field) = self
                .schema
                .field_by_id(field_id)
                .ok_or(ObjectError::UnknownFieldId(field_id))?;
            (field.clone(), class.id())
        };
        if owner_class != record_class {
            warn!(
                "{address} updated object {do_id} with field `{}` from another class",
                field.name()
            );
            return Ok(());
        }

        let owns = self
            .sessions
            .get(&address)
            .map_or(false, |session| session.owns(do_id));
        if !field.is_clsend() && !owns {
            warn!(
                "{address} may not send `{}` on object {do_id} it does not own",
                field.name()
            );
            self.events.push(ServerEvent::UpdateRejected {
                do_id,
                field: field_id,
                from: address,
            });
            return Ok(());
        }

        let args = field.unpack(di)?;
        if di.remaining() > 0 {
            warn!(
                "update for `{}` on object {do_id} carried {} trailing bytes",
                field.name(),
                di.remaining()
            );
        }
        self.store_field(do_id, &field, &args);

        if field.is_broadcast() {
            for peer in self.interested_in_object(do_id, Some(address)) {
                self.send_raw_to(&peer, payload);
            }
        }
        self.events.push(ServerEvent::FieldUpdated {
            do_id,
            field: field_id,
            from: address,
        });
        Ok(())
    }

    /// Refreshes the stored image of one field from unpacked args.
    ///
    /// Required fields overwrite their declaration-order slot; ram fields
    /// land in the side table replayed by `create_datagram`. Fields that
    /// are neither leave no trace once relayed.
    fn store_field(&mut self, do_id: DoId, field: &DcField, args: &[DcValue]) {
        if !field.is_required() && !field.is_ram() {
            return;
        }
        let class_id = match self.objects.get(&do_id) {
            Some(record) => record.class_id,
            None => return,
        };
        let mut packed = Datagram::default();
        if field.pack(args, &mut packed).is_err() {
            warn!("could not repack `{}` for storage", field.name());
            return;
        }
        let slot = self.schema.class_by_id(class_id).and_then(|class| {
            class
                .required_fields()
                .position(|required| required.id() == field.id())
        });
        let record = match self.objects.get_mut(&do_id) {
            Some(record) => record,
            None => return,
        };
        match slot {
            Some(index) => record.required[index] = packed.into_bytes(),
            None => {
                record.ram.insert(field.id(), packed.into_bytes());
            }
        }
    }

    /// Sessions whose interest covers the object's zone, excluding the
    /// given address. Shuffled so no session is systematically first.
    fn interested_in_object(&self, do_id: DoId, exclude: Option<SocketAddr>) -> Vec<SocketAddr> {
        let zone = match self.objects.get(&do_id) {
            Some(record) => record.zone,
            None => return Vec::new(),
        };
        self.sessions_in_zone(zone, exclude)
    }

    fn sessions_in_zone(&self, zone: ZoneId, exclude: Option<SocketAddr>) -> Vec<SocketAddr> {
        let mut peers: Vec<SocketAddr> = self
            .sessions
            .iter()
            .filter(|(addr, session)| Some(**addr) != exclude && session.interest.contains(&zone))
            .map(|(addr, _)| *addr)
            .collect();
        fastrand::shuffle(&mut peers);
        peers
    }

    /// Admits an object a client generated out of its granted block.
    fn handle_client_create(
        &mut self,
        address: SocketAddr,
        di: &mut DatagramIterator<'_>,
        with_other: bool,
    ) -> Result<(), StrixServerError> {
        let zone = di.get_uint32()?;
        let class_id = di.get_uint16()?;
        let do_id = di.get_uint32()?;

        let owns = self
            .sessions
            .get(&address)
            .map_or(false, |session| session.owns(do_id));
        if !owns {
            warn!("{address} created object {do_id} outside its granted doId block");
            return Ok(());
        }
        if self.objects.contains_key(&do_id) {
            warn!("{address} re-created existing object {do_id}");
            return Ok(());
        }

        let mut required: Vec<Vec<u8>> = Vec::new();
        let mut ram: BTreeMap<FieldId, Vec<u8>> = BTreeMap::new();
        {
            let class = self
                .schema
                .class_by_id(class_id)
                .ok_or(ObjectError::UnknownClass(class_id))?;
            for field in class.required_fields() {
                let args = field.unpack(di)?;
                let mut packed = Datagram::default();
                field.pack(&args, &mut packed)?;
                required.push(packed.into_bytes());
            }
            if with_other {
                while di.remaining() > 0 {
                    let field_id = di.get_uint16()?;
                    let field = match self.schema.field_by_id(field_id) {
                        Some((owner, field)) if owner.id() == class_id => field,
                        Some((owner, field)) => {
                            warn!(
                                "create for object {do_id} carried `{}` from class `{}`",
                                field.name(),
                                owner.name()
                            );
                            continue;
                        }
                        None => return Err(ObjectError::UnknownFieldId(field_id).into()),
                    };
                    let args = field.unpack(di)?;
                    let mut packed = Datagram::default();
                    field.pack(&args, &mut packed)?;
                    ram.insert(field_id, packed.into_bytes());
                }
            }
        }

        self.insert_object(do_id, class_id, zone, Some(address), required, ram);
        Ok(())
    }

    /// Registers the record and replicates the create to every session
    /// already interested in the zone, except the creating one.
    fn insert_object(
        &mut self,
        do_id: DoId,
        class_id: ClassId,
        zone: ZoneId,
        owner: Option<SocketAddr>,
        required: Vec<Vec<u8>>,
        ram: BTreeMap<FieldId, Vec<u8>>,
    ) {
        let record = ObjectRecord {
            class_id,
            zone,
            owner,
            required,
            ram,
        };
        let dg = create_datagram(do_id, &record);
        self.zones.entry(zone).or_default().insert(do_id);
        self.objects.insert(do_id, record);
        for peer in self.sessions_in_zone(zone, owner) {
            self.send_to(&peer, &dg);
        }
        self.events.push(ServerEvent::ObjectCreated {
            do_id,
            class_id,
            zone,
            owner,
        });
        info!("object {do_id} (class {class_id}) entered zone {zone}");
    }

    fn handle_client_delete(
        &mut self,
        address: SocketAddr,
        di: &mut DatagramIterator<'_>,
    ) -> Result<(), StrixServerError> {
        let do_id = di.get_uint32()?;
        match self.objects.get(&do_id) {
            Some(record) if record.owner == Some(address) => {
                self.delete_object_internal(do_id, Some(address));
                Ok(())
            }
            Some(_) => {
                warn!("{address} tried to delete object {do_id} it does not own");
                Ok(())
            }
            None => {
                debug!("{address} deleted unknown object {do_id}");
                Ok(())
            }
        }
    }

    /// Tears a session down and deletes every object it owned.
    fn drop_session(&mut self, address: SocketAddr, end: SessionEnd) {
        if self.sessions.remove(&address).is_none() {
            return;
        }
        match end {
            SessionEnd::Disconnect => {
                info!("client session {address} disconnected");
                self.events.push(ServerEvent::SessionDisconnected(address));
            }
            SessionEnd::TimedOut => {
                warn!("client session {address} timed out");
                self.events.push(ServerEvent::SessionTimedOut(address));
            }
        }
        let mut owned: Vec<DoId> = self
            .objects
            .iter()
            .filter(|(_, record)| record.owner == Some(address))
            .map(|(do_id, _)| *do_id)
            .collect();
        owned.sort_unstable();
        for do_id in owned {
            self.delete_object_internal(do_id, None);
        }
    }

    /// Drops every session whose timeout lapsed before `now`.
    pub fn tick(&mut self, now: f64) {
        let lapsed: Vec<SocketAddr> = self
            .sessions
            .iter()
            .filter(|(_, session)| session.timeout.ringing(now))
            .map(|(addr, _)| *addr)
            .collect();
        for address in lapsed {
            self.drop_session(address, SessionEnd::TimedOut);
        }
    }

    // Outgoing data

    /// Creates a server-owned object from required values in declaration
    /// order, replicating it to every session interested in the zone.
    pub fn generate_with_required(
        &mut self,
        class_name: &str,
        zone: ZoneId,
        required_args: Vec<Vec<DcValue>>,
    ) -> Result<DoId, StrixServerError> {
        self.generate_object(class_name, zone, required_args, Vec::new())
    }

    /// Like [`generate_with_required`](Self::generate_with_required), with
    /// additional `(field name, args)` pairs stored as ram state.
    pub fn generate_with_required_other(
        &mut self,
        class_name: &str,
        zone: ZoneId,
        required_args: Vec<Vec<DcValue>>,
        other: Vec<(String, Vec<DcValue>)>,
    ) -> Result<DoId, StrixServerError> {
        self.generate_object(class_name, zone, required_args, other)
    }

    fn generate_object(
        &mut self,
        class_name: &str,
        zone: ZoneId,
        required_args: Vec<Vec<DcValue>>,
        other: Vec<(String, Vec<DcValue>)>,
    ) -> Result<DoId, StrixServerError> {
        let mut required: Vec<Vec<u8>> = Vec::new();
        let mut ram: BTreeMap<FieldId, Vec<u8>> = BTreeMap::new();
        let class_id = {
            let class = self
                .schema
                .class_by_name(class_name)
                .ok_or_else(|| StrixServerError::UnknownClassName(class_name.to_owned()))?;
            let expected = class.num_required();
            if required_args.len() != expected {
                return Err(StrixServerError::RequiredArity {
                    class: class_name.to_owned(),
                    expected,
                    got: required_args.len(),
                });
            }
            for (field, args) in class.required_fields().zip(required_args.iter()) {
                let mut packed = Datagram::default();
                field.pack(args, &mut packed)?;
                required.push(packed.into_bytes());
            }
            for (name, args) in &other {
                let field = class.field_by_name(name).ok_or_else(|| {
                    ObjectError::UnknownField {
                        class: class.name().to_owned(),
                        name: name.clone(),
                    }
                })?;
                let mut packed = Datagram::default();
                field.pack(args, &mut packed)?;
                ram.insert(field.id(), packed.into_bytes());
            }
            class.id()
        };
        let do_id = self.allocator.allocate()?;
        self.insert_object(do_id, class_id, zone, None, required, ram);
        Ok(do_id)
    }

    /// Updates a field on a server-owned object by name, refreshing the
    /// stored image and broadcasting when the field calls for it.
    pub fn send_update(
        &mut self,
        do_id: DoId,
        field_name: &str,
        args: &[DcValue],
    ) -> Result<(), StrixServerError> {
        let class_id = self
            .objects
            .get(&do_id)
            .ok_or(ObjectError::UnknownObject(do_id))?
            .class_id;
        let field = {
            let class = self
                .schema
                .class_by_id(class_id)
                .ok_or(ObjectError::UnknownClass(class_id))?;
            class
                .field_by_name(field_name)
                .ok_or_else(|| ObjectError::UnknownField {
                    class: class.name().to_owned(),
                    name: field_name.to_owned(),
                })?
                .clone()
        };
        self.store_field(do_id, &field, args);
        if field.is_broadcast() {
            let mut dg = begin_message(MsgType::ObjectUpdateField);
            dg.add_uint32(do_id);
            dg.add_uint16(field.id());
            field.pack(args, &mut dg)?;
            for peer in self.interested_in_object(do_id, None) {
                self.send_to(&peer, &dg);
            }
        } else {
            debug!("`{field_name}` on object {do_id} stored without broadcast");
        }
        Ok(())
    }

    /// Moves an object to another zone, disabling it for sessions that
    /// lose sight of it and creating it for sessions that gain it.
    pub fn set_object_zone(&mut self, do_id: DoId, zone: ZoneId) -> Result<(), StrixServerError> {
        let old = self
            .objects
            .get(&do_id)
            .ok_or(ObjectError::UnknownObject(do_id))?
            .zone;
        if old == zone {
            return Ok(());
        }
        if let Some(ids) = self.zones.get_mut(&old) {
            ids.remove(&do_id);
            if ids.is_empty() {
                self.zones.remove(&old);
            }
        }
        self.zones.entry(zone).or_default().insert(do_id);
        let create = match self.objects.get_mut(&do_id) {
            Some(record) => {
                record.zone = zone;
                create_datagram(do_id, record)
            }
            None => return Ok(()),
        };

        let mut disables: Vec<SocketAddr> = Vec::new();
        let mut creates: Vec<SocketAddr> = Vec::new();
        for (addr, session) in &self.sessions {
            if session.interest.contains(&zone) {
                if !session.interest.contains(&old) {
                    creates.push(*addr);
                }
            } else if session.interest.contains(&old) {
                disables.push(*addr);
            }
        }
        let mut disable = begin_message(MsgType::ObjectDisable);
        disable.add_uint32(do_id);
        for addr in disables {
            self.send_to(&addr, &disable);
        }
        for addr in creates {
            self.send_to(&addr, &create);
        }
        debug!("object {do_id} moved from zone {old} to zone {zone}");
        Ok(())
    }

    /// Deletes an object for every session that can see it.
    pub fn delete_object(&mut self, do_id: DoId) -> Result<(), StrixServerError> {
        if !self.objects.contains_key(&do_id) {
            return Err(ObjectError::UnknownObject(do_id).into());
        }
        self.delete_object_internal(do_id, None);
        Ok(())
    }

    fn delete_object_internal(&mut self, do_id: DoId, exclude: Option<SocketAddr>) {
        let record = match self.objects.remove(&do_id) {
            Some(record) => record,
            None => return,
        };
        if let Some(ids) = self.zones.get_mut(&record.zone) {
            ids.remove(&do_id);
            if ids.is_empty() {
                self.zones.remove(&record.zone);
            }
        }
        let mut dg = begin_message(MsgType::ObjectDelete);
        dg.add_uint32(do_id);
        for peer in self.sessions_in_zone(record.zone, exclude) {
            self.send_to(&peer, &dg);
        }
        self.events.push(ServerEvent::ObjectDeleted(do_id));
        info!("object {do_id} deleted from zone {}", record.zone);
    }

    /// Reserves a fresh zone id, never [`UBER_ZONE`].
    pub fn allocate_zone(&mut self) -> ZoneId {
        self.zone_allocator.allocate()
    }

    /// Returns a zone id to the pool once nothing lives there.
    pub fn deallocate_zone(&mut self, zone: ZoneId) {
        self.zone_allocator.deallocate(zone);
    }

    fn send_to(&self, address: &SocketAddr, dg: &Datagram) {
        self.send_raw_to(address, dg.bytes());
    }

    fn send_raw_to(&self, address: &SocketAddr, payload: &[u8]) {
        let sender = match self.sender.as_ref() {
            Some(sender) => sender,
            None => return,
        };
        if sender.send(address, payload).is_err() {
            warn!("could not send to {address}");
        }
    }

    pub fn num_sessions(&self) -> usize {
        self.sessions.len()
    }

    pub fn has_session(&self, address: SocketAddr) -> bool {
        self.sessions.contains_key(&address)
    }

    pub fn num_objects(&self) -> usize {
        self.objects.len()
    }

    pub fn object_zone(&self, do_id: DoId) -> Option<ZoneId> {
        self.objects.get(&do_id).map(|record| record.zone)
    }

    /// DoIds present in a zone, ascending.
    pub fn objects_in_zone(&self, zone: ZoneId) -> Vec<DoId> {
        let mut ids: Vec<DoId> = self
            .zones
            .get(&zone)
            .map(|ids| ids.iter().copied().collect())
            .unwrap_or_default();
        ids.sort_unstable();
        ids
    }

    pub fn schema(&self) -> &DcSchema {
        &self.schema
    }

    /// Drains the event queue accumulated since the last call.
    pub fn take_events(&mut self) -> Vec<ServerEvent> {
        self.events.take()
    }
}

/// Packs the full create message for an object record: required values in
/// declaration order, then `[fieldId][args]` pairs for any ram state.
fn create_datagram(do_id: DoId, record: &ObjectRecord) -> Datagram {
    let msg = if record.ram.is_empty() {
        MsgType::CreateObjectRequired
    } else {
        MsgType::CreateObjectRequiredOther
    };
    let mut dg = begin_message(msg);
    dg.add_uint32(record.zone);
    dg.add_uint16(record.class_id);
    dg.add_uint32(do_id);
    for packed in &record.required {
        dg.add_data(packed);
    }
    for (field_id, packed) in &record.ram {
        dg.add_uint16(*field_id);
        dg.add_data(packed);
    }
    dg
}
