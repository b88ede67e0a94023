mod essential;
mod language;
mod server;

pub use essential::{Help, Ping};
pub use language::Language;
pub use server::Server;
