//! mmdb-writer - build and serialize MaxMind DB (MMDB) v2 files.
//!
//! This crate maintains a binary radix tree mapping IP networks (CIDR
//! blocks) to typed data records and serializes it into the MMDB v2
//! container: packed search-tree records, a pooled data section, and
//! trailing metadata. Memory-mapped readers resolve an address to its
//! most specific network in one bit-comparison per address bit.
//!
//! # Features
//!
//! - **CIDR insertion**: last-write-wins semantics with longest-prefix
//!   lookups, including the IPv4-in-IPv6 dual-stack convention
//! - **Typed records**: maps, slices, strings, integers up to 128
//!   bits, floats, bytes, and booleans
//! - **Value pooling**: identical records are stored once and shared
//!   by reference
//! - **Deterministic output**: the same tree always serializes to the
//!   same bytes
//!
//! # Quick Start
//!
//! ```ignore
//! use mmdb_writer::{Options, Tree, Value};
//!
//! let mut tree = Tree::new(Options {
//!     database_type: "My-IP-Data".to_string(),
//!     ..Options::default()
//! })?;
//!
//! tree.insert("1.1.1.0/24".parse()?, Value::from("record"))?;
//! tree.finalize();
//!
//! let mut file = std::fs::File::create("my.mmdb")?;
//! tree.write_to(&mut file)?;
//! ```
//!
//! # Lifecycle
//!
//! A [`Tree`] is constructed once from validated [`Options`]. Inserts
//! mutate the trie and invalidate any prior finalization;
//! [`Tree::finalize`] numbers the nodes and must run before
//! [`Tree::write_to`]. A finalized tree may be written any number of
//! times. The tree is single-writer and not safe for concurrent use.

mod binary;
mod error;
mod options;
mod tree;
mod value;

pub use error::{Error, Result};
pub use options::Options;
pub use tree::Tree;
pub use value::Value;
