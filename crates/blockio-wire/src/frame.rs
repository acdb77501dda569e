use std::io::{ErrorKind, Read, Write};

use bytes::{Buf, BufMut};

use crate::error::WireError;

/// Request op codes.
mod op {
    /// Fetch a byte range of a block.
    pub const READ: u8 = 0x01;
    /// Fetch a block's length.
    pub const STAT: u8 = 0x02;
}

/// Response status bytes.
mod status {
    pub const DATA: u8 = 0x00;
    pub const FAULT: u8 = 0x01;
}

/// Upper bound on a response payload the client will accept.
///
/// A corrupt or hostile length field must not translate into an arbitrary
/// allocation; anything above this is rejected before the payload is read.
pub const MAX_PAYLOAD_LEN: u64 = 64 * 1024 * 1024;

/// Upper bound on a fault message. Faults are one-line diagnostics.
const MAX_FAULT_LEN: u64 = 4096;

/// BLAKE3 checksum size on data responses.
const CHECKSUM_LEN: usize = 32;

/// A client request. All integer fields are fixed-width big-endian.
///
/// ```text
/// READ                           STAT
/// ┌──────────────────────┐       ┌──────────────────────┐
/// │ op        u8 = 0x01  │       │ op        u8 = 0x02  │
/// │ block_id  u64        │       │ block_id  u64        │
/// │ offset    u64        │       └──────────────────────┘
/// │ len       u64        │
/// └──────────────────────┘
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Request {
    /// Fetch `len` bytes of block `block_id` starting at `offset`.
    ///
    /// The server clamps `offset + len` to the block's actual length and
    /// answers with whatever the range covers.
    Read { block_id: u64, offset: u64, len: u64 },

    /// Ask for the length of block `block_id` in bytes. The data payload
    /// of the answer is a single big-endian u64.
    Stat { block_id: u64 },
}

impl Request {
    /// Write this request to the connection.
    ///
    /// # Errors
    ///
    /// [`WireError::Io`] if the write fails.
    pub fn write_to(&self, w: &mut impl Write) -> Result<(), WireError> {
        let mut frame = Vec::with_capacity(1 + 3 * 8);
        match *self {
            Self::Read {
                block_id,
                offset,
                len,
            } => {
                frame.put_u8(op::READ);
                frame.put_u64(block_id);
                frame.put_u64(offset);
                frame.put_u64(len);
            }
            Self::Stat { block_id } => {
                frame.put_u8(op::STAT);
                frame.put_u64(block_id);
            }
        }
        w.write_all(&frame)?;
        Ok(())
    }

    /// Read the next request from the connection.
    ///
    /// Returns `Ok(None)` when the peer closed the connection cleanly at a
    /// request boundary — that is the normal end of a serving session, not
    /// an error. EOF *inside* a frame is an I/O error.
    ///
    /// # Errors
    ///
    /// [`WireError::UnknownOp`] for an unrecognized op code,
    /// [`WireError::Io`] for truncated frames and transport failures.
    pub fn read_from(r: &mut impl Read) -> Result<Option<Self>, WireError> {
        let mut op_byte = [0u8; 1];
        match r.read_exact(&mut op_byte) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => return Ok(None),
            Err(e) => return Err(e.into()),
        }

        match op_byte[0] {
            op::READ => {
                let mut body = [0u8; 3 * 8];
                r.read_exact(&mut body)?;
                let mut body = &body[..];
                Ok(Some(Self::Read {
                    block_id: body.get_u64(),
                    offset: body.get_u64(),
                    len: body.get_u64(),
                }))
            }
            op::STAT => {
                let mut body = [0u8; 8];
                r.read_exact(&mut body)?;
                let mut body = &body[..];
                Ok(Some(Self::Stat {
                    block_id: body.get_u64(),
                }))
            }
            found => Err(WireError::UnknownOp { found }),
        }
    }
}

/// A server response.
///
/// ```text
/// DATA                                FAULT
/// ┌───────────────────────────┐       ┌───────────────────────────┐
/// │ status    u8 = 0x00       │       │ status    u8 = 0x01       │
/// │ len       u64             │       │ len       u64             │
/// │ checksum  [u8; 32] BLAKE3 │       │ message   [len] UTF-8     │
/// │ payload   [len] bytes     │       └───────────────────────────┘
/// └───────────────────────────┘
/// ```
///
/// Every data payload travels with its BLAKE3 hash; the receiving side
/// recomputes and rejects the frame on mismatch, so a corrupted transfer
/// surfaces as [`WireError::ChecksumMismatch`] instead of corrupt block
/// bytes reaching a consumer.
///
/// A fault is a per-request failure (unknown block, offset past end); the
/// connection stays usable for further requests afterwards.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Response {
    Data { payload: Vec<u8> },
    Fault { message: String },
}

impl Response {
    /// Write this response to the connection.
    ///
    /// # Errors
    ///
    /// [`WireError::Io`] if the write fails.
    pub fn write_to(&self, w: &mut impl Write) -> Result<(), WireError> {
        match self {
            Self::Data { payload } => {
                let mut head = Vec::with_capacity(1 + 8 + CHECKSUM_LEN);
                head.put_u8(status::DATA);
                head.put_u64(payload.len() as u64);
                head.put_slice(blake3::hash(payload).as_bytes());
                w.write_all(&head)?;
                w.write_all(payload)?;
            }
            Self::Fault { message } => {
                let mut head = Vec::with_capacity(1 + 8);
                head.put_u8(status::FAULT);
                head.put_u64(message.len() as u64);
                w.write_all(&head)?;
                w.write_all(message.as_bytes())?;
            }
        }
        Ok(())
    }

    /// Read one response from the connection.
    ///
    /// # Errors
    ///
    /// - [`WireError::UnknownStatus`] for an unrecognized status byte.
    /// - [`WireError::FrameTooLarge`] if the declared length exceeds the
    ///   safety limit ([`MAX_PAYLOAD_LEN`] for data, less for faults).
    /// - [`WireError::ChecksumMismatch`] if the payload fails verification.
    /// - [`WireError::Io`] for truncated frames and transport failures.
    pub fn read_from(r: &mut impl Read) -> Result<Self, WireError> {
        let mut head = [0u8; 1 + 8];
        r.read_exact(&mut head)?;
        let mut head = &head[..];
        let status_byte = head.get_u8();
        let len = head.get_u64();

        match status_byte {
            status::DATA => {
                if len > MAX_PAYLOAD_LEN {
                    return Err(WireError::FrameTooLarge {
                        len,
                        limit: MAX_PAYLOAD_LEN,
                    });
                }
                let mut checksum = [0u8; CHECKSUM_LEN];
                r.read_exact(&mut checksum)?;
                let mut payload = vec![0u8; len as usize];
                r.read_exact(&mut payload)?;
                if blake3::hash(&payload).as_bytes() != &checksum {
                    return Err(WireError::ChecksumMismatch);
                }
                Ok(Self::Data { payload })
            }
            status::FAULT => {
                if len > MAX_FAULT_LEN {
                    return Err(WireError::FrameTooLarge {
                        len,
                        limit: MAX_FAULT_LEN,
                    });
                }
                let mut raw = vec![0u8; len as usize];
                r.read_exact(&mut raw)?;
                // Fault text is diagnostic only; decode lossily.
                Ok(Self::Fault {
                    message: String::from_utf8_lossy(&raw).into_owned(),
                })
            }
            found => Err(WireError::UnknownStatus { found }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip_request(req: &Request) -> Request {
        let mut buf = Vec::new();
        req.write_to(&mut buf).unwrap();
        Request::read_from(&mut buf.as_slice()).unwrap().unwrap()
    }

    fn roundtrip_response(resp: &Response) -> Response {
        let mut buf = Vec::new();
        resp.write_to(&mut buf).unwrap();
        Response::read_from(&mut buf.as_slice()).unwrap()
    }

    #[test]
    fn read_request_roundtrips() {
        let req = Request::Read {
            block_id: 7,
            offset: 4096,
            len: 65536,
        };
        assert_eq!(roundtrip_request(&req), req);
    }

    #[test]
    fn stat_request_roundtrips() {
        let req = Request::Stat { block_id: u64::MAX };
        assert_eq!(roundtrip_request(&req), req);
    }

    #[test]
    fn clean_eof_at_request_boundary_is_none() {
        let mut empty: &[u8] = &[];
        let result = Request::read_from(&mut empty).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn eof_inside_a_request_is_an_error() {
        let mut buf = Vec::new();
        Request::Read {
            block_id: 1,
            offset: 2,
            len: 3,
        }
        .write_to(&mut buf)
        .unwrap();
        buf.truncate(10);
        let result = Request::read_from(&mut buf.as_slice());
        assert!(matches!(result, Err(WireError::Io(_))));
    }

    #[test]
    fn unknown_op_is_rejected() {
        let buf = [0x7Fu8; 4];
        let result = Request::read_from(&mut buf.as_slice());
        assert!(matches!(result, Err(WireError::UnknownOp { found: 0x7F })));
    }

    #[test]
    fn multiple_requests_read_sequentially() {
        let mut buf = Vec::new();
        let first = Request::Read {
            block_id: 1,
            offset: 0,
            len: 16,
        };
        let second = Request::Stat { block_id: 1 };
        first.write_to(&mut buf).unwrap();
        second.write_to(&mut buf).unwrap();

        let mut cursor = buf.as_slice();
        assert_eq!(Request::read_from(&mut cursor).unwrap().unwrap(), first);
        assert_eq!(Request::read_from(&mut cursor).unwrap().unwrap(), second);
        assert!(Request::read_from(&mut cursor).unwrap().is_none());
    }

    #[test]
    fn data_response_roundtrips() {
        let resp = Response::Data {
            payload: b"block bytes".to_vec(),
        };
        assert_eq!(roundtrip_response(&resp), resp);
    }

    #[test]
    fn empty_data_response_roundtrips() {
        let resp = Response::Data { payload: vec![] };
        assert_eq!(roundtrip_response(&resp), resp);
    }

    #[test]
    fn fault_response_roundtrips() {
        let resp = Response::Fault {
            message: "block 9 not found".to_string(),
        };
        assert_eq!(roundtrip_response(&resp), resp);
    }

    #[test]
    fn corrupted_payload_fails_checksum() {
        let mut buf = Vec::new();
        Response::Data {
            payload: vec![0xAB; 64],
        }
        .write_to(&mut buf)
        .unwrap();
        let last = buf.len() - 1;
        buf[last] ^= 0x01; // flip one payload bit
        let result = Response::read_from(&mut buf.as_slice());
        assert!(matches!(result, Err(WireError::ChecksumMismatch)));
    }

    #[test]
    fn corrupted_checksum_fails_verification() {
        let mut buf = Vec::new();
        Response::Data {
            payload: vec![0xCD; 16],
        }
        .write_to(&mut buf)
        .unwrap();
        buf[10] ^= 0xFF; // inside the checksum field
        let result = Response::read_from(&mut buf.as_slice());
        assert!(matches!(result, Err(WireError::ChecksumMismatch)));
    }

    #[test]
    fn oversized_declared_payload_is_rejected_before_allocation() {
        let mut buf = Vec::new();
        buf.put_u8(0x00); // DATA status
        buf.put_u64(MAX_PAYLOAD_LEN + 1);
        let result = Response::read_from(&mut buf.as_slice());
        assert!(matches!(result, Err(WireError::FrameTooLarge { .. })));
    }

    #[test]
    fn unknown_status_is_rejected() {
        let mut buf = Vec::new();
        buf.put_u8(0x42);
        buf.put_u64(0);
        let result = Response::read_from(&mut buf.as_slice());
        assert!(matches!(
            result,
            Err(WireError::UnknownStatus { found: 0x42 })
        ));
    }

    #[test]
    fn truncated_data_payload_is_an_io_error() {
        let mut buf = Vec::new();
        Response::Data {
            payload: vec![0xEE; 100],
        }
        .write_to(&mut buf)
        .unwrap();
        buf.truncate(buf.len() - 50);
        let result = Response::read_from(&mut buf.as_slice());
        assert!(matches!(result, Err(WireError::Io(_))));
    }
}
