pub mod audio;
pub mod http;
pub mod pages;
pub mod state;

pub use http::{serve, serve_with};
pub use state::{Mode, ServerState};
