//! The level system: declarative entity specs, phased creation, zone
//! entities with reference-counted visibility, and event-driven
//! visibility extension.

mod entity;
mod level;
mod spec;
mod visibility;
mod zone_entity;

pub use entity::{EditMgr, Entity, EntityRegistry, LevelMgr};
pub use level::Level;
pub use spec::{EntId, EntitySpec, LevelSpec, EDIT_MGR_ENT_ID, LEVEL_MGR_ENT_ID, UBER_ZONE_ENT_ID};
pub use visibility::VisibilityExtender;
pub use zone_entity::ZoneEntity;
