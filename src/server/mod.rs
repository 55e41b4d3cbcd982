// Server module entry point
// Binds listeners, accepts connections and hands requests to the router

pub mod connection;
pub mod listener;
pub mod signal;

// `loop` is a keyword, so the module is named server_loop
#[path = "loop.rs"]
pub mod server_loop;

pub use connection::ServeOptions;
pub use listener::create_reusable_listener;
pub use server_loop::serve;
pub use signal::shutdown_signal;
