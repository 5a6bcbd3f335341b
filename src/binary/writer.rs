//! Container serialization: the pooled data section writer and the
//! tree write pass.

use std::collections::BTreeMap;
use std::io::{BufWriter, Write};

use ahash::AHashMap;

use super::format::{
    pack_record, record_bytes, DATA_SECTION_SEPARATOR, METADATA_START_MARKER,
};
use crate::error::{Error, Result};
use crate::tree::{Node, Tree};
use crate::value::Value;

/// Append-only data section buffer that pools identical values.
///
/// Values are keyed by their canonical encoding, so writing an equal
/// value twice returns the first offset without emitting more bytes.
/// A hash collision falls back to byte comparison inside the map, so a
/// reused offset always points at an identical encoding.
pub(crate) struct DataWriter {
    buf: Vec<u8>,
    offsets: AHashMap<Vec<u8>, usize>,
}

impl DataWriter {
    pub(crate) fn new() -> Self {
        Self {
            buf: Vec::new(),
            offsets: AHashMap::new(),
        }
    }

    /// Serializes `value` into the data section and returns its byte
    /// offset.
    pub(crate) fn write(&mut self, value: &Value) -> usize {
        let mut encoded = Vec::new();
        value.encode_into(&mut encoded);

        if let Some(&offset) = self.offsets.get(&encoded) {
            return offset;
        }
        let offset = self.buf.len();
        self.buf.extend_from_slice(&encoded);
        self.offsets.insert(encoded, offset);
        offset
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.buf.len()
    }
}

/// One serialization pass over a finalized tree.
struct TreePass<W: Write> {
    sink: BufWriter<W>,
    record_size: u8,
    node_count: u32,
    data: DataWriter,
    written: u64,
}

/// Serializes `tree` to `sink` and returns the total bytes written.
pub(crate) fn write_tree<W: Write>(tree: &Tree, sink: W) -> Result<u64> {
    if tree.node_count == 0 {
        return Err(Error::NotFinalized);
    }

    let mut pass = TreePass {
        sink: BufWriter::new(sink),
        record_size: tree.record_size,
        node_count: tree.node_count,
        data: DataWriter::new(),
        written: 0,
    };

    let nodes_written = pass.write_node(&tree.root)?;
    if nodes_written != tree.node_count {
        return Err(Error::InternalInconsistency {
            expected: tree.node_count,
            actual: nodes_written,
            written: pass.written,
        });
    }

    pass.emit(&DATA_SECTION_SEPARATOR, "data section separator")?;

    let data_section = std::mem::take(&mut pass.data.buf);
    pass.emit(&data_section, "data section")?;

    pass.emit(&METADATA_START_MARKER, "metadata start marker")?;

    let mut metadata = Vec::new();
    metadata_value(tree).encode_into(&mut metadata);
    pass.emit(&metadata, "metadata")?;

    pass.flush()?;
    Ok(pass.written)
}

impl<W: Write> TreePass<W> {
    /// Emits records for the subtree in pre-order and returns the
    /// number of internal nodes written.
    fn write_node(&mut self, node: &Node) -> Result<u32> {
        let Node::Internal { children, .. } = node else {
            return Ok(0);
        };

        let left = self.record_value(&children[0]);
        let right = self.record_value(&children[1]);

        let mut record = [0u8; 8];
        let n = record_bytes(self.record_size);
        pack_record(&mut record[..n], self.record_size, left, right)?;
        self.emit(&record[..n], "node record")?;

        let mut written = 1;
        written += self.write_node(&children[0])?;
        written += self.write_node(&children[1])?;
        Ok(written)
    }

    /// The integer stored in a record slot for `node`: the node number
    /// for an internal child, the node count for an empty leaf (the
    /// "no data" sentinel), or an absolute data-section position for a
    /// valued leaf.
    fn record_value(&mut self, node: &Node) -> u64 {
        match node {
            Node::Internal { node_num, .. } => u64::from(*node_num),
            Node::Empty => u64::from(self.node_count),
            Node::Leaf(value) => {
                let offset = self.data.write(value);
                u64::from(self.node_count)
                    + DATA_SECTION_SEPARATOR.len() as u64
                    + offset as u64
            }
        }
    }

    fn emit(&mut self, bytes: &[u8], phase: &'static str) -> Result<()> {
        match self.sink.write_all(bytes) {
            Ok(()) => {
                self.written += bytes.len() as u64;
                Ok(())
            }
            Err(source) => Err(Error::SinkFailure {
                phase,
                written: self.written,
                source,
            }),
        }
    }

    fn flush(&mut self) -> Result<()> {
        self.sink.flush().map_err(|source| Error::SinkFailure {
            phase: "flush",
            written: self.written,
            source,
        })
    }
}

/// Builds the trailing metadata map from the tree configuration.
fn metadata_value(tree: &Tree) -> Value {
    let description = tree
        .description
        .iter()
        .map(|(lang, text)| (lang.clone(), Value::from(text.as_str())))
        .collect::<BTreeMap<_, _>>();
    let languages = tree
        .languages
        .iter()
        .map(|lang| Value::from(lang.as_str()))
        .collect::<Vec<_>>();

    let mut metadata = BTreeMap::new();
    metadata.insert(
        "binary_format_major_version".to_string(),
        Value::Uint16(2),
    );
    metadata.insert(
        "binary_format_minor_version".to_string(),
        Value::Uint16(0),
    );
    metadata.insert(
        "build_epoch".to_string(),
        Value::Uint64(tree.build_epoch as u64),
    );
    metadata.insert(
        "database_type".to_string(),
        Value::from(tree.database_type.as_str()),
    );
    metadata.insert("description".to_string(), Value::Map(description));
    metadata.insert(
        "ip_version".to_string(),
        Value::Uint16(u16::from(tree.ip_version)),
    );
    metadata.insert("languages".to_string(), Value::Slice(languages));
    metadata.insert("node_count".to_string(), Value::Uint32(tree.node_count));
    metadata.insert(
        "record_size".to_string(),
        Value::Uint16(u16::from(tree.record_size)),
    );
    Value::Map(metadata)
}
