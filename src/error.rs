//! Error types for mmdb-writer.

use thiserror::Error;

/// Error type for tree construction and serialization.
#[derive(Error, Debug)]
pub enum Error {
    /// IP version other than 4 or 6
    #[error("unsupported IP version: {0}")]
    UnsupportedIpVersion(u8),

    /// Record size other than 24, 28, or 32 bits
    #[error("unsupported record size: {0}")]
    UnsupportedRecordSize(u8),

    /// Insertion at prefix length 0 (the root has no record)
    #[error("cannot insert a network with prefix length 0")]
    InvalidPrefix,

    /// Address family not representable in this tree
    #[error("cannot use an IPv6 address with an IPv4 tree")]
    UnsupportedAddress,

    /// Write attempted before the tree was finalized
    #[error("tree is not finalized; call finalize() before writing")]
    NotFinalized,

    /// Record value does not fit in the configured record size
    #[error("record value {value} does not fit in {record_size} bits")]
    RecordOverflow { value: u64, record_size: u8 },

    /// Nodes written during serialization disagree with the finalized
    /// count; indicates a bug in this library
    #[error("wrote {actual} node records but expected {expected}")]
    InternalInconsistency {
        expected: u32,
        actual: u32,
        /// Bytes emitted before the mismatch was detected
        written: u64,
    },

    /// The underlying sink failed during a write phase
    #[error("error writing {phase} after {written} bytes: {source}")]
    SinkFailure {
        phase: &'static str,
        /// Bytes successfully emitted before the failure
        written: u64,
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias for mmdb-writer operations.
pub type Result<T> = std::result::Result<T, Error>;
