//! Tree construction options.

use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};

/// Record sizes accepted by the MMDB format.
pub const SUPPORTED_RECORD_SIZES: [u8; 3] = [24, 28, 32];

/// Configuration for building a search tree.
///
/// All fields have usable defaults; a plain `Options::default()`
/// produces an IPv6 tree with 28-bit records.
#[derive(Debug, Clone)]
pub struct Options {
    /// Database build timestamp as Unix seconds. `None` uses the time
    /// at which the tree is constructed.
    pub build_epoch: Option<i64>,

    /// Label describing the structure of the data records. The meaning
    /// is left to the database creator.
    pub database_type: String,

    /// Database description per language code.
    pub description: BTreeMap<String, String>,

    /// 4 or 6. An IPv6 tree also serves IPv4 lookups through the
    /// `::a.b.c.d` subtree. Default is 6.
    pub ip_version: u8,

    /// Locale codes records may be localized to.
    pub languages: Vec<String>,

    /// Bits per search-tree record: 24, 28, or 32. Smaller records
    /// yield smaller files but cap the database size. Default is 28.
    pub record_size: u8,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            build_epoch: None,
            database_type: String::new(),
            description: BTreeMap::new(),
            ip_version: 6,
            languages: Vec::new(),
            record_size: 28,
        }
    }
}

impl Options {
    pub(crate) fn resolved_build_epoch(&self) -> i64 {
        self.build_epoch.unwrap_or_else(|| {
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default()
                .as_secs() as i64
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let opts = Options::default();
        assert_eq!(opts.ip_version, 6);
        assert_eq!(opts.record_size, 28);
        assert!(opts.build_epoch.is_none());
        assert!(opts.description.is_empty());
        assert!(opts.languages.is_empty());
    }

    #[test]
    fn test_explicit_build_epoch_is_kept() {
        let opts = Options {
            build_epoch: Some(1_700_000_000),
            ..Options::default()
        };
        assert_eq!(opts.resolved_build_epoch(), 1_700_000_000);
    }

    #[test]
    fn test_missing_build_epoch_uses_now() {
        let opts = Options::default();
        // After 2020, before the heat death of the universe.
        assert!(opts.resolved_build_epoch() > 1_577_836_800);
    }
}
