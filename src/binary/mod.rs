//! MMDB binary container layout and serialization.
//!
//! # File Structure
//!
//! ```text
//! +------------------------+
//! |     NODE RECORDS       |  node_count × 2·record_size/8 bytes
//! +------------------------+
//! |     SEPARATOR          |  16 zero bytes
//! +------------------------+
//! |     DATA SECTION       |  concatenated encoded values
//! +------------------------+
//! |     METADATA MARKER    |  0xAB 0xCD 0xEF "MaxMind.com"
//! +------------------------+
//! |     METADATA           |  one encoded map value
//! +------------------------+
//! ```
//!
//! Readers locate the metadata by scanning the file tail for the last
//! occurrence of the marker, so no header is needed.

pub(crate) mod format;
pub(crate) mod writer;
