#![warn(clippy::pedantic)]

pub mod config;
pub mod error;
pub mod metrics;
pub mod stream;
pub mod transport;

pub use config::{DEFAULT_READ_BUFFER_BYTES, StreamConfig};
pub use error::StreamError;
pub use metrics::BytesReadCounter;
pub use stream::BufferedBlockStream;
pub use transport::{BlockId, BlockTransport};
