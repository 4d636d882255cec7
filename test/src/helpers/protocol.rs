//! The schema, factory, and object implementations every integration
//! test shares.

use std::any::Any;
use std::rc::Rc;

use strix_client::DistributedLevel;
use strix_server::ServerConfig;
use strix_shared::{
    ClassId, DcClassDef, DcField, DcFieldDef, DcSchema, DcSubatomicType, DcValue,
    DistributedObject, DoId, EntityRegistry, EntitySpec, LevelSpec, ObjectContext, ObjectError,
    ObjectFactory, ReplicationState, ZoneId, EDIT_MGR_ENT_ID, LEVEL_MGR_ENT_ID,
};

pub const AVATAR_CLASS: ClassId = 0;
pub const LEVEL_CLASS: ClassId = 1;

/// Field ids follow declaration order: setPos = 0, setName = 1,
/// setChat = 2, setHp = 3, setZoneIds = 4.
pub fn game_schema() -> DcSchema {
    let mut schema = DcSchema::builder();
    schema.add_class(
        DcClassDef::new("Avatar")
            .field(
                DcFieldDef::new("setPos")
                    .param(DcSubatomicType::Float64)
                    .param(DcSubatomicType::Float64)
                    .required()
                    .broadcast(),
            )
            .field(
                DcFieldDef::new("setName")
                    .param(DcSubatomicType::Str)
                    .required(),
            )
            .field(
                DcFieldDef::new("setChat")
                    .param(DcSubatomicType::Str)
                    .broadcast()
                    .clsend(),
            )
            .field(
                DcFieldDef::new("setHp")
                    .param(DcSubatomicType::Int16)
                    .ram()
                    .broadcast(),
            ),
    );
    schema.add_class(
        DcClassDef::new("GameLevel").field(
            DcFieldDef::new("setZoneIds")
                .param(DcSubatomicType::Uint32Array)
                .required()
                .broadcast(),
        ),
    );
    schema.lock();
    schema.build()
}

/// A small doId block space so exhaustion is easy to reach: client blocks
/// start at 1000 and hold 10 doIds each.
pub fn server_config() -> ServerConfig {
    ServerConfig {
        server_doid_base: 1,
        client_doid_base: 1_000,
        client_block_size: 10,
        client_timeout: 30.0,
    }
}

/// A factory that builds [`TestAvatar`]s for the Avatar class.
pub fn avatar_factory() -> ObjectFactory {
    let mut factory = ObjectFactory::new();
    factory.register(AVATAR_CLASS, |do_id, zone| {
        Box::new(TestAvatar::new(do_id, zone))
    });
    factory
}

/// [`avatar_factory`] plus a [`DistributedLevel`] for the GameLevel class.
pub fn game_factory(spec: LevelSpec) -> ObjectFactory {
    let registry = Rc::new(EntityRegistry::with_builtins());
    let mut factory = avatar_factory();
    factory.register(LEVEL_CLASS, move |do_id, zone| {
        Box::new(DistributedLevel::new(
            do_id,
            LEVEL_CLASS,
            zone,
            "testLevel",
            spec.clone(),
            registry.clone(),
        ))
    });
    factory
}

/// Level zones 10, 11, 12: standing in 10 shows 11, and the door
/// extender adds 12 while "door-open" carries a true argument.
pub fn level_spec() -> LevelSpec {
    LevelSpec::new()
        .with_entity(LEVEL_MGR_ENT_ID, EntitySpec::new("levelMgr"))
        .with_entity(EDIT_MGR_ENT_ID, EntitySpec::new("editMgr"))
        .with_entity(
            10,
            EntitySpec::new("zone").attrib("visibility", DcValue::List(vec![DcValue::Uint32(11)])),
        )
        .with_entity(11, EntitySpec::new("zone"))
        .with_entity(12, EntitySpec::new("zone"))
        .with_entity(
            2000,
            EntitySpec::new("visibilityExtender")
                .parent(10)
                .attrib("event", DcValue::from("door-open"))
                .attrib("newZones", DcValue::List(vec![DcValue::Uint32(12)])),
        )
}

/// A clientside avatar that records every hook and field it sees.
pub struct TestAvatar {
    repl: ReplicationState,
    pub pos: (f64, f64),
    pub name: String,
    pub chats: Vec<String>,
    pub hp: i16,
    pub generates: u32,
    pub announces: u32,
    pub disables: u32,
}

impl TestAvatar {
    pub fn new(do_id: DoId, zone: ZoneId) -> Self {
        Self {
            repl: ReplicationState::new(do_id, AVATAR_CLASS, zone),
            pos: (0.0, 0.0),
            name: String::new(),
            chats: Vec::new(),
            hp: 0,
            generates: 0,
            announces: 0,
            disables: 0,
        }
    }
}

impl DistributedObject for TestAvatar {
    fn repl(&self) -> &ReplicationState {
        &self.repl
    }

    fn repl_mut(&mut self) -> &mut ReplicationState {
        &mut self.repl
    }

    fn generate(&mut self, _ctx: &mut ObjectContext<'_>) {
        self.generates += 1;
    }

    fn announce_generate(&mut self, _ctx: &mut ObjectContext<'_>) {
        self.announces += 1;
    }

    fn disable(&mut self, _ctx: &mut ObjectContext<'_>) {
        self.disables += 1;
    }

    fn receive_field(
        &mut self,
        field: &DcField,
        args: &[DcValue],
        _ctx: &mut ObjectContext<'_>,
    ) -> Result<(), ObjectError> {
        match field.name() {
            "setPos" => {
                self.pos = (args[0].as_f64().unwrap(), args[1].as_f64().unwrap());
                Ok(())
            }
            "setName" => {
                self.name = args[0].as_str().unwrap().to_string();
                Ok(())
            }
            "setChat" => {
                self.chats.push(args[0].as_str().unwrap().to_string());
                Ok(())
            }
            "setHp" => {
                self.hp = args[0].as_i64().unwrap() as i16;
                Ok(())
            }
            other => Err(ObjectError::UnknownField {
                class: "Avatar".into(),
                name: other.into(),
            }),
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
