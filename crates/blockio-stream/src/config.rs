/// Default capacity of a stream's internal read buffer: 8 MiB.
///
/// Chosen for remote transports, where each refill is a network round
/// trip and a large window amortizes it. Local consumers doing small
/// sequential reads can size this down via [`StreamConfig`].
pub const DEFAULT_READ_BUFFER_BYTES: usize = 8 * 1024 * 1024;

/// Sizing configuration for [`BufferedBlockStream`](crate::BufferedBlockStream).
///
/// Consumed once at construction — the stream allocates its buffer eagerly
/// and never resizes it afterwards, so changing a config after building a
/// stream has no effect on that stream.
///
/// A capacity of 0 is clamped to 1 at construction; a stream with no
/// buffer at all could never serve a single-byte read.
#[derive(Clone, Copy, Debug)]
pub struct StreamConfig {
    /// Internal read buffer capacity in bytes.
    pub read_buffer_bytes: usize,
}

impl StreamConfig {
    /// Config with an explicit buffer capacity.
    #[must_use]
    pub fn with_buffer_bytes(read_buffer_bytes: usize) -> Self {
        Self { read_buffer_bytes }
    }
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            read_buffer_bytes: DEFAULT_READ_BUFFER_BYTES,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_eight_mebibytes() {
        assert_eq!(StreamConfig::default().read_buffer_bytes, 8 * 1024 * 1024);
    }

    #[test]
    fn with_buffer_bytes_overrides_default() {
        assert_eq!(StreamConfig::with_buffer_bytes(64).read_buffer_bytes, 64);
    }
}
