pub mod handlers;
pub mod live;
pub mod server;

pub use handlers::AppState;
pub use live::{handle_client_message, LiveError};
pub use server::{build_router, default_pollers, run_server, ServerConfig};
