pub mod api;
pub mod bootstrap;
pub mod config;
pub mod decode;
pub mod metrics;
pub mod state;

pub use api::create_router;
pub use bootstrap::{assemble_state, build_state};
pub use config::{Config, ModelConfig, get_configuration};
pub use state::AppState;
