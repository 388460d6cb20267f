//! Ordered filter sets loaded from YAML.

use std::path::Path;

use anyhow::Context;

use super::kind::IdFilter;
use crate::error::Error;
use crate::variant::Variant;
use crate::vcf::{VcfHeader, VcfLine};

/// Filters that must all pass.
#[derive(Debug, Clone, PartialEq, Default, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct FilterSet {
    filters: Vec<IdFilter>,
}

impl FilterSet {
    pub fn new(filters: Vec<IdFilter>) -> Self {
        Self { filters }
    }

    /// Parse a YAML list of filters.
    pub fn from_yaml(text: &str) -> Result<Self, Error> {
        serde_yaml::from_str(text)
            .map_err(|e| Error::InvalidFilter(format!("cannot parse filter set: {}", e)))
    }

    /// Load a YAML list of filters from `path`.
    pub fn from_path<P>(path: P) -> Result<Self, anyhow::Error>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("could not read filter set {:?}", path))?;
        Self::from_yaml(&text).with_context(|| format!("problem with filter set {:?}", path))
    }

    pub fn to_yaml(&self) -> Result<String, Error> {
        serde_yaml::to_string(self)
            .map_err(|e| Error::InvalidFilter(format!("cannot write filter set: {}", e)))
    }

    pub fn filters(&self) -> &[IdFilter] {
        &self.filters
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Fail if any filter is incomplete, listing the problems of each one.
    pub fn validate(&self) -> Result<(), Error> {
        let problems = self
            .filters
            .iter()
            .enumerate()
            .filter_map(|(idx, filter)| {
                filter.errors().map(|errors| {
                    let name = filter
                        .name
                        .clone()
                        .unwrap_or_else(|| format!("#{}", idx + 1));
                    format!("filter {}: {}", name, errors)
                })
            })
            .collect::<Vec<_>>();
        if problems.is_empty() {
            Ok(())
        } else {
            Err(Error::InvalidFilter(problems.join("\n")))
        }
    }

    /// Filters whose header ID is not declared in `header`, described by name or number.
    ///
    /// Such filters still run; they usually indicate a filter set meant for other files.
    pub fn undeclared_ids(&self, header: &VcfHeader) -> Vec<String> {
        self.filters
            .iter()
            .enumerate()
            .filter_map(|(idx, filter)| {
                filter.undeclared_id(header).map(|problem| {
                    let name = filter
                        .name
                        .clone()
                        .unwrap_or_else(|| format!("#{}", idx + 1));
                    format!("filter {}: {}", name, problem)
                })
            })
            .collect()
    }

    /// Whether every filter passes on `line`.
    pub fn is_valid_line(&self, line: &VcfLine, header: &VcfHeader) -> bool {
        self.filters
            .iter()
            .all(|filter| filter.is_valid_line(line, header))
    }

    /// Whether every filter passes on the line of `variant`.
    pub fn is_valid_variant(&self, variant: &Variant, header: &VcfHeader) -> bool {
        self.is_valid_line(variant.line(), header)
    }
}
