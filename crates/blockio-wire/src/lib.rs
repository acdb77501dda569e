#![warn(clippy::pedantic)]

pub mod error;
pub mod frame;
pub mod preamble;

pub use error::WireError;
pub use frame::{MAX_PAYLOAD_LEN, Request, Response};
pub use preamble::{PREAMBLE_SIZE, Preamble};
