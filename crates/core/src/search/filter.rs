//! Field filters built from request parameters.
//!
//! A [`FilterSet`] is an ordered list of `(field, value)` pairs taken from a
//! variant's field table. It drives both exact store lookups
//! ([`FilterSet::matches`]) and the positional tokens forwarded to the
//! external scorer ([`FilterSet::scorer_tokens`]).

use crate::record::Record;
use std::collections::HashMap;

/// One populated filter field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldFilter {
    pub field: &'static str,
    pub value: String,
}

/// Ordered field filters. Unconstrained fields are simply absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSet {
    filters: Vec<FieldFilter>,
}

impl FilterSet {
    /// Creates an empty filter set, which matches every record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Walks `table` once, in order, keeping every field with a non-empty value in `params`.
    ///
    /// Parameters not named by the table are ignored.
    pub fn from_params(table: &'static [&'static str], params: &HashMap<String, String>) -> Self {
        let filters = table
            .iter()
            .filter_map(|&field| {
                params
                    .get(field)
                    .filter(|value| !value.is_empty())
                    .map(|value| FieldFilter {
                        field,
                        value: value.clone(),
                    })
            })
            .collect();
        Self { filters }
    }

    /// Appends a filter.
    pub fn push(&mut self, field: &'static str, value: impl Into<String>) {
        self.filters.push(FieldFilter {
            field,
            value: value.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldFilter> {
        self.filters.iter()
    }

    /// Exact equality on every filtered field; an empty set matches everything.
    pub fn matches<R: Record + ?Sized>(&self, record: &R) -> bool {
        self.filters
            .iter()
            .all(|f| record.field(f.field) == Some(f.value.as_str()))
    }

    /// Scorer arguments: the optional selector token followed by `value, field` pairs.
    pub fn scorer_tokens(&self, selector: Option<&str>) -> Vec<String> {
        let mut tokens = Vec::with_capacity(self.filters.len() * 2 + 1);
        if let Some(selector) = selector {
            tokens.push(selector.to_string());
        }
        for f in &self.filters {
            tokens.push(f.value.clone());
            tokens.push(f.field.to_string());
        }
        tokens
    }
}
