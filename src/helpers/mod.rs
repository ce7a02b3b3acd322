// Helper utilities shared by the server components

pub mod path_resolver;
pub mod session_timer;

pub use path_resolver::ResolveError;
pub use session_timer::SessionTimer;
