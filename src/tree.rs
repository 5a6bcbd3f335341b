//! Binary radix search tree keyed by IP address bits.
//!
//! The tree supports CIDR insertion with last-write-wins semantics,
//! longest-prefix lookup, and pre-order node numbering, which is the
//! shape the MMDB node section is written in.

use std::collections::BTreeMap;
use std::io::Write;
use std::net::IpAddr;
use std::sync::Arc;

use ipnet::{IpNet, Ipv4Net, Ipv6Net};

use crate::binary;
use crate::error::{Error, Result};
use crate::options::{Options, SUPPORTED_RECORD_SIZES};
use crate::value::Value;

/// A trie node: an internal branch or one of the two leaf kinds.
///
/// An empty leaf stands in for a missing branch, so internal nodes
/// always have two children. Leaf values are reference-counted; when an
/// insert splits a leaf, both halves share the original value.
#[derive(Debug)]
pub(crate) enum Node {
    Internal {
        children: [Box<Node>; 2],
        /// Pre-order index, assigned by finalize.
        node_num: u32,
    },
    Empty,
    Leaf(Arc<Value>),
}

impl Node {
    fn internal() -> Node {
        Node::Internal {
            children: [Box::new(Node::Empty), Box::new(Node::Empty)],
            node_num: 0,
        }
    }

    /// Splits a leaf into an internal node whose two children answer
    /// exactly as the leaf did. Internal nodes are left untouched.
    fn materialize(&mut self) {
        match self {
            Node::Internal { .. } => {}
            Node::Empty => *self = Node::internal(),
            Node::Leaf(value) => {
                let value = value.clone();
                *self = Node::Internal {
                    children: [
                        Box::new(Node::Leaf(value.clone())),
                        Box::new(Node::Leaf(value)),
                    ],
                    node_num: 0,
                };
            }
        }
    }

    fn insert(&mut self, addr: &[u8], prefix_len: u8, depth: u8, value: &Arc<Value>) {
        if depth == prefix_len {
            *self = Node::Leaf(value.clone());
            return;
        }
        self.materialize();
        let Node::Internal { children, .. } = self else {
            unreachable!("materialize always yields an internal node");
        };
        children[bit_at(addr, depth) as usize].insert(addr, prefix_len, depth + 1, value);
    }

    /// Descends until the first leaf and returns its depth and value.
    fn get(&self, addr: &[u8], depth: u8) -> (u8, Option<&Arc<Value>>) {
        match self {
            Node::Empty => (depth, None),
            Node::Leaf(value) => (depth, Some(value)),
            Node::Internal { children, .. } => {
                children[bit_at(addr, depth) as usize].get(addr, depth + 1)
            }
        }
    }

    /// Assigns pre-order numbers starting at `next`; returns the next
    /// free number, i.e. the count of internal nodes seen so far.
    fn finalize(&mut self, next: u32) -> u32 {
        match self {
            Node::Internal { children, node_num } => {
                *node_num = next;
                let next = children[0].finalize(next + 1);
                children[1].finalize(next)
            }
            Node::Empty | Node::Leaf(_) => next,
        }
    }
}

/// Returns bit `index` of a big-endian address, MSB first.
fn bit_at(addr: &[u8], index: u8) -> u8 {
    (addr[usize::from(index >> 3)] >> (7 - (index & 7))) & 1
}

/// An MMDB search tree under construction.
///
/// Lifecycle: construct with [`Tree::new`], populate with
/// [`Tree::insert`], then [`Tree::finalize`] and [`Tree::write_to`].
/// Inserting again invalidates the finalization, so finalize must be
/// re-run before the next write.
#[derive(Debug)]
pub struct Tree {
    pub(crate) build_epoch: i64,
    pub(crate) database_type: String,
    pub(crate) description: BTreeMap<String, String>,
    pub(crate) ip_version: u8,
    pub(crate) languages: Vec<String>,
    pub(crate) record_size: u8,
    pub(crate) root: Node,
    tree_depth: u8,
    /// Set by finalize; 0 means not finalized.
    pub(crate) node_count: u32,
}

impl Tree {
    /// Creates an empty tree from validated options.
    pub fn new(options: Options) -> Result<Tree> {
        let tree_depth = match options.ip_version {
            4 => 32,
            6 => 128,
            other => return Err(Error::UnsupportedIpVersion(other)),
        };
        if !SUPPORTED_RECORD_SIZES.contains(&options.record_size) {
            return Err(Error::UnsupportedRecordSize(options.record_size));
        }

        Ok(Tree {
            build_epoch: options.resolved_build_epoch(),
            database_type: options.database_type,
            description: options.description,
            ip_version: options.ip_version,
            languages: options.languages,
            record_size: options.record_size,
            root: Node::internal(),
            tree_depth,
            node_count: 0,
        })
    }

    /// Inserts a data value for a network, replacing anything the
    /// network previously covered.
    ///
    /// IPv4 networks inserted into an IPv6 tree land under the
    /// `::a.b.c.d` subtree. Returns [`Error::InvalidPrefix`] for a /0
    /// network and [`Error::UnsupportedAddress`] for an IPv6 network
    /// given to an IPv4 tree.
    pub fn insert(&mut self, network: IpNet, value: Value) -> Result<()> {
        let mut prefix_len = network.prefix_len();
        if prefix_len == 0 {
            // The root has no record of its own to hold a value.
            return Err(Error::InvalidPrefix);
        }

        let mut addr = [0u8; 16];
        let addr: &[u8] = match network {
            IpNet::V4(net) => {
                if self.tree_depth == 128 {
                    addr[12..].copy_from_slice(&net.network().octets());
                    prefix_len += 96;
                    &addr
                } else {
                    addr[..4].copy_from_slice(&net.network().octets());
                    &addr[..4]
                }
            }
            IpNet::V6(net) => {
                if self.tree_depth == 32 {
                    return Err(Error::UnsupportedAddress);
                }
                addr.copy_from_slice(&net.network().octets());
                &addr
            }
        };

        // The node numbering is stale from here on; the tree must be
        // finalized again before writing.
        self.node_count = 0;

        let value = Arc::new(value);
        self.root.insert(addr, prefix_len, 0, &value);
        Ok(())
    }

    /// Looks up the most specific network covering `ip`.
    ///
    /// Returns the matched network masked to the depth at which the
    /// lookup ended and the value stored there, or `None` when the
    /// address falls outside every inserted network.
    pub fn get(&self, ip: IpAddr) -> Result<(IpNet, Option<&Value>)> {
        let mut bits = [0u8; 16];
        let addr: &[u8] = match ip {
            IpAddr::V4(v4) => {
                if self.tree_depth == 128 {
                    bits[12..].copy_from_slice(&v4.octets());
                    &bits
                } else {
                    bits[..4].copy_from_slice(&v4.octets());
                    &bits[..4]
                }
            }
            IpAddr::V6(v6) => {
                if self.tree_depth == 32 {
                    return Err(Error::UnsupportedAddress);
                }
                bits.copy_from_slice(&v6.octets());
                &bits
            }
        };

        let (depth, value) = self.root.get(addr, 0);
        Ok((self.masked_network(ip, depth), value.map(Arc::as_ref)))
    }

    fn masked_network(&self, ip: IpAddr, depth: u8) -> IpNet {
        match ip {
            IpAddr::V4(v4) if self.tree_depth == 128 && depth >= 96 => {
                // The lookup ended inside the IPv4 subtree; report an
                // IPv4-sized network.
                let net = Ipv4Net::new(v4, depth - 96)
                    .expect("depth is bounded by the tree depth");
                IpNet::V4(net.trunc())
            }
            IpAddr::V4(v4) if self.tree_depth == 128 => {
                let mut octets = [0u8; 16];
                octets[12..].copy_from_slice(&v4.octets());
                let net = Ipv6Net::new(octets.into(), depth)
                    .expect("depth is bounded by the tree depth");
                IpNet::V6(net.trunc())
            }
            IpAddr::V4(v4) => {
                let net = Ipv4Net::new(v4, depth)
                    .expect("depth is bounded by the tree depth");
                IpNet::V4(net.trunc())
            }
            IpAddr::V6(v6) => {
                let net = Ipv6Net::new(v6, depth)
                    .expect("depth is bounded by the tree depth");
                IpNet::V6(net.trunc())
            }
        }
    }

    /// Numbers the internal nodes in pre-order and returns the node
    /// count. Idempotent until the next insert.
    pub fn finalize(&mut self) -> u32 {
        self.node_count = self.root.finalize(0);
        self.node_count
    }

    /// The finalized node count, or 0 if the tree is not finalized.
    pub fn node_count(&self) -> u32 {
        self.node_count
    }

    /// Serializes the finalized tree to `sink` in the MMDB container
    /// layout and returns the number of bytes written.
    ///
    /// The write does not mutate the tree; repeating it without an
    /// intervening insert produces identical bytes.
    pub fn write_to<W: Write>(&self, sink: W) -> Result<u64> {
        binary::writer::write_tree(self, sink)
    }
}
