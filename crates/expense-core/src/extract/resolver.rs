//! Canonical field resolution over summary fields.
//!
//! A [`FieldRule`] is an ordered list of matchers. Matchers are tried left to
//! right; the first one that matches any field wins, and within a matcher the
//! first field in document order is taken.

use serde::Serialize;
use tracing::debug;

use crate::models::config::FieldsConfig;
use crate::models::document::ExpenseField;

pub const INVOICE_ID_TYPE: &str = "INVOICE_RECEIPT_ID";
pub const DATE_TYPE: &str = "INVOICE_RECEIPT_DATE";
pub const TOTAL_TYPE: &str = "TOTAL";

/// A single match predicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldMatch {
    /// Canonical type key equals the given tag.
    TypeKey(String),
    /// Detected label text equals the given text exactly.
    Label(String),
}

impl FieldMatch {
    pub fn matches(&self, field: &ExpenseField) -> bool {
        match self {
            FieldMatch::TypeKey(key) => field.type_key() == Some(key.as_str()),
            FieldMatch::Label(label) => field.label_text() == Some(label.as_str()),
        }
    }
}

/// Prioritized fallback chain for one business field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldRule {
    name: String,
    matchers: Vec<FieldMatch>,
}

impl FieldRule {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            matchers: Vec::new(),
        }
    }

    /// Append a type key matcher.
    pub fn type_key(mut self, key: impl Into<String>) -> Self {
        self.matchers.push(FieldMatch::TypeKey(key.into()));
        self
    }

    /// Append a label matcher. Empty labels are ignored.
    pub fn label(mut self, label: impl Into<String>) -> Self {
        let label = label.into();
        if !label.is_empty() {
            self.matchers.push(FieldMatch::Label(label));
        }
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn matchers(&self) -> &[FieldMatch] {
        &self.matchers
    }

    /// Invoice identifier: `INVOICE_RECEIPT_ID`, else label `INVOICE`.
    pub fn invoice_id() -> Self {
        Self::new("invoice_id").type_key(INVOICE_ID_TYPE).label("INVOICE")
    }

    /// Issue date: `INVOICE_RECEIPT_DATE`, else label `Date Issued:`.
    pub fn date() -> Self {
        Self::new("date").type_key(DATE_TYPE).label("Date Issued:")
    }

    /// Total: `TOTAL`, else label `Amount Due`.
    pub fn total() -> Self {
        Self::new("total").type_key(TOTAL_TYPE).label("Amount Due")
    }

    /// Find the field selected by this rule.
    pub fn resolve<'a>(&self, fields: &'a [ExpenseField]) -> Option<&'a ExpenseField> {
        self.matchers
            .iter()
            .find_map(|m| fields.iter().find(|f| m.matches(f)))
    }
}

/// Resolved business fields. `None` means the field was not found.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResolvedFields {
    pub invoice_id: Option<String>,
    pub date: Option<String>,
    pub total: Option<String>,
}

/// Resolves invoice id, date and total from summary fields.
#[derive(Debug, Clone)]
pub struct FieldResolver {
    invoice_id: FieldRule,
    date: FieldRule,
    total: FieldRule,
}

impl FieldResolver {
    /// Resolver with the standard rules.
    pub fn new() -> Self {
        Self {
            invoice_id: FieldRule::invoice_id(),
            date: FieldRule::date(),
            total: FieldRule::total(),
        }
    }

    /// Standard type keys with label fallbacks taken from configuration.
    pub fn from_config(config: &FieldsConfig) -> Self {
        Self {
            invoice_id: FieldRule::new("invoice_id")
                .type_key(INVOICE_ID_TYPE)
                .label(&config.invoice_id_label),
            date: FieldRule::new("date")
                .type_key(DATE_TYPE)
                .label(&config.date_label),
            total: FieldRule::new("total")
                .type_key(TOTAL_TYPE)
                .label(&config.total_label),
        }
    }

    pub fn resolve(&self, fields: &[ExpenseField]) -> ResolvedFields {
        ResolvedFields {
            invoice_id: resolve_value(&self.invoice_id, fields),
            date: resolve_value(&self.date, fields),
            total: resolve_value(&self.total, fields),
        }
    }
}

impl Default for FieldResolver {
    fn default() -> Self {
        Self::new()
    }
}

fn resolve_value(rule: &FieldRule, fields: &[ExpenseField]) -> Option<String> {
    let value = rule
        .resolve(fields)
        .and_then(|f| f.value_text())
        .map(str::to_string);

    if value.is_none() {
        debug!("No value resolved for {}", rule.name());
    }
    value
}
