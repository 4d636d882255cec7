//! Protocol both halves of the basic demo agree on: one `Character`
//! class, the lobby zone it lives in, and the address the server
//! listens on.

use std::any::Any;
use std::net::SocketAddr;

use strix_shared::{
    ClassId, DcClassDef, DcField, DcFieldDef, DcSchema, DcSubatomicType, DcValue,
    DistributedObject, DoId, ObjectContext, ObjectError, ObjectFactory, ReplicationState, ZoneId,
};

pub const CHARACTER_CLASS: ClassId = 0;
pub const LOBBY_ZONE: ZoneId = 100;

pub fn server_addr() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 14191))
}

/// One class: position and name are required, chat is an open
/// client-sendable broadcast.
pub fn protocol() -> DcSchema {
    let mut schema = DcSchema::builder();
    schema.add_class(
        DcClassDef::new("Character")
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
                    .required()
                    .broadcast(),
            )
            .field(
                DcFieldDef::new("setChat")
                    .param(DcSubatomicType::Str)
                    .broadcast()
                    .clsend(),
            ),
    );
    schema.lock();
    schema.build()
}

pub fn factory() -> ObjectFactory {
    let mut factory = ObjectFactory::new();
    factory.register(CHARACTER_CLASS, |do_id, zone| {
        Box::new(Character::new(do_id, zone))
    });
    factory
}

/// Client-side mirror of a Character. Chat lines go out as `"chat"`
/// messenger events so the app can print them without polling fields.
pub struct Character {
    repl: ReplicationState,
    pub pos: (f64, f64),
    pub name: String,
}

impl Character {
    pub fn new(do_id: DoId, zone: ZoneId) -> Self {
        Self {
            repl: ReplicationState::new(do_id, CHARACTER_CLASS, zone),
            pos: (0.0, 0.0),
            name: String::new(),
        }
    }

    fn node(&self) -> String {
        format!("character-{}", self.repl.do_id())
    }
}

impl DistributedObject for Character {
    fn repl(&self) -> &ReplicationState {
        &self.repl
    }

    fn repl_mut(&mut self) -> &mut ReplicationState {
        &mut self.repl
    }

    fn announce_generate(&mut self, ctx: &mut ObjectContext<'_>) {
        ctx.scene.attach(&self.node(), "lobby");
    }

    fn disable(&mut self, ctx: &mut ObjectContext<'_>) {
        ctx.scene.detach(&self.node());
    }

    fn receive_field(
        &mut self,
        field: &DcField,
        args: &[DcValue],
        ctx: &mut ObjectContext<'_>,
    ) -> Result<(), ObjectError> {
        match field.name() {
            "setPos" => {
                if let (Some(x), Some(y)) = (
                    args.first().and_then(DcValue::as_f64),
                    args.get(1).and_then(DcValue::as_f64),
                ) {
                    self.pos = (x, y);
                }
                Ok(())
            }
            "setName" => {
                if let Some(name) = args.first().and_then(DcValue::as_str) {
                    self.name = name.to_string();
                }
                Ok(())
            }
            "setChat" => {
                if let Some(line) = args.first().and_then(DcValue::as_str) {
                    ctx.messenger.send(
                        "chat",
                        vec![DcValue::from(self.name.as_str()), DcValue::from(line)],
                    );
                }
                Ok(())
            }
            other => Err(ObjectError::UnknownField {
                class: "Character".into(),
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
