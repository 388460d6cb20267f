//! Cache of compiled filters by filter fingerprint and chromosome.

use std::sync::Arc;

use quick_cache::unsync::Cache;

use super::compiled::VcfFilter;
use super::kind::IdFilter;
use crate::common::CancellationToken;
use crate::error::Error;
use crate::tabix::TabixReader;

/// Default number of compiled filters kept.
pub const DEFAULT_CAPACITY: usize = 64;

/// Canonical serialization of a filter, equal for structurally equal filters.
pub fn fingerprint(filter: &IdFilter) -> Result<String, Error> {
    serde_json::to_string(filter)
        .map_err(|e| Error::InvalidFilter(format!("cannot serialize filter: {}", e)))
}

/// Compiled filters keyed by `(fingerprint, chromosome)`.
pub struct FilterCache {
    cache: Cache<(String, String), Arc<VcfFilter>>,
    hits: usize,
    misses: usize,
}

impl Default for FilterCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl std::fmt::Debug for FilterCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilterCache")
            .field("len", &self.cache.len())
            .field("hits", &self.hits)
            .field("misses", &self.misses)
            .finish()
    }
}

impl FilterCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            cache: Cache::new(capacity.max(1)),
            hits: 0,
            misses: 0,
        }
    }

    /// The compiled filter for `chromosome`, if cached.
    pub fn get(
        &self,
        filter: &IdFilter,
        chromosome: &str,
    ) -> Result<Option<Arc<VcfFilter>>, Error> {
        let key = (fingerprint(filter)?, chromosome.to_string());
        Ok(self.cache.get(&key).cloned())
    }

    /// The compiled filter for `chromosome`, compiling it through `reader` on a miss.
    ///
    /// Returns `Ok(None)` if compilation was cancelled; nothing is cached then.
    pub fn get_or_generate(
        &mut self,
        filter: &IdFilter,
        reader: &mut TabixReader,
        chromosome: &str,
        cancel: &CancellationToken,
    ) -> Result<Option<Arc<VcfFilter>>, Error> {
        let key = (fingerprint(filter)?, chromosome.to_string());
        if let Some(compiled) = self.cache.get(&key) {
            self.hits += 1;
            tracing::trace!("filter cache hit for {}", filter.description());
            return Ok(Some(compiled.clone()));
        }

        self.misses += 1;
        let Some(compiled) = VcfFilter::generate(filter, reader, chromosome, cancel)? else {
            return Ok(None);
        };
        let compiled = Arc::new(compiled);
        self.cache.insert(key, compiled.clone());
        Ok(Some(compiled))
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    /// Number of lookups answered from the cache.
    pub fn hits(&self) -> usize {
        self.hits
    }

    /// Number of lookups that compiled a filter.
    pub fn misses(&self) -> usize {
        self.misses
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::common::testing::{region_lines, write_indexed_vcf, HEADER};
    use crate::filter::kind::{FilterKind, HeaderId};
    use crate::vcf::VcfColumn;

    fn depth_filter(threshold: &str) -> IdFilter {
        IdFilter::new(
            HeaderId::new(VcfColumn::Info, "DP"),
            FilterKind::Numeric {
                first: threshold.parse().ok(),
                second: None,
                cumulative: false,
            },
        )
    }

    #[test]
    fn fingerprints() -> Result<(), anyhow::Error> {
        let filter = depth_filter(">=12");
        assert_eq!(fingerprint(&filter)?, fingerprint(&filter.duplicate())?);
        assert_ne!(fingerprint(&filter)?, fingerprint(&depth_filter(">12"))?);
        insta::assert_snapshot!(
            fingerprint(&filter)?,
            @r#"{"header_id":{"column":"INFO","id":"DP"},"kind":{"type":"numeric","first":">=12","second":null,"cumulative":false},"genome_names":[],"operator":"any"}"#
        );

        Ok(())
    }

    #[test]
    fn hit_returns_compiled_filter() -> Result<(), anyhow::Error> {
        let tmp_dir = temp_testdir::TempDir::default();
        let path = write_indexed_vcf(&tmp_dir, "input.vcf.gz", HEADER, &region_lines())?;
        let mut reader = TabixReader::open(&path)?;
        let cancel = CancellationToken::new();
        let mut cache = FilterCache::default();

        let filter = depth_filter(">=12");
        assert!(cache.get(&filter, "1")?.is_none());

        let first = cache
            .get_or_generate(&filter, &mut reader, "1", &cancel)?
            .expect("not cancelled");
        let second = cache
            .get_or_generate(&filter.duplicate(), &mut reader, "1", &cancel)?
            .expect("not cancelled");
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!((cache.hits(), cache.misses()), (1, 1));

        cache.get_or_generate(&filter, &mut reader, "2", &cancel)?;
        cache.get_or_generate(&depth_filter(">=20"), &mut reader, "1", &cancel)?;
        assert_eq!((cache.hits(), cache.misses()), (1, 3));
        assert_eq!(cache.len(), 3);
        assert!(first.is_valid_position(101));
        assert!(!first.is_valid_position(100));

        Ok(())
    }

    #[test]
    fn cancelled_is_not_cached() -> Result<(), anyhow::Error> {
        let tmp_dir = temp_testdir::TempDir::default();
        let path = write_indexed_vcf(&tmp_dir, "input.vcf.gz", HEADER, &region_lines())?;
        let mut reader = TabixReader::open(&path)?;
        let cancel = CancellationToken::new();
        cancel.cancel();
        let mut cache = FilterCache::new(4);

        assert!(cache
            .get_or_generate(&depth_filter(">1"), &mut reader, "1", &cancel)?
            .is_none());
        assert!(cache.is_empty());

        Ok(())
    }
}
