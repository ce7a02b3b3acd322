/// TCP server: connection admission, client sessions and command processing
pub mod connection_manager;
pub mod dispatcher;
pub mod session;

pub use connection_manager::{ResponseWriter, RmcServer, ServerHandle, SessionSettings, SessionSlot};
pub use dispatcher::{CommandDispatcher, Reply};
