pub mod exchange;
pub mod protocol;
pub mod test_client;

pub use exchange::exchange;
pub use protocol::{
    avatar_factory, game_factory, game_schema, level_spec, server_config, TestAvatar,
    AVATAR_CLASS, LEVEL_CLASS,
};
pub use test_client::TestClient;
