#![warn(clippy::pedantic)]

pub mod error;
pub mod server;
pub mod transport;

pub use error::RemoteError;
pub use server::BlockServer;
pub use transport::RemoteBlockTransport;
