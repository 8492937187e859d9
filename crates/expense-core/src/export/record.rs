//! Per-document export records.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Serialize, Serializer};

use crate::extract::{ResolvedFields, Table};

/// Column headers of the flat field block, in record order.
pub const FIELD_HEADERS: [&str; 3] = ["INVOICE", "DATE", "TOTAL"];

/// The flat business fields of one document.
///
/// Unresolved fields are `None` in memory and serialize as `""`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldRecord {
    #[serde(serialize_with = "empty_if_none")]
    pub invoice_id: Option<String>,

    #[serde(serialize_with = "empty_if_none")]
    pub date: Option<String>,

    #[serde(serialize_with = "empty_if_none")]
    pub total: Option<String>,
}

impl FieldRecord {
    /// Values in [`FIELD_HEADERS`] order, empty where unresolved.
    pub fn values(&self) -> [&str; 3] {
        [
            self.invoice_id.as_deref().unwrap_or_default(),
            self.date.as_deref().unwrap_or_default(),
            self.total.as_deref().unwrap_or_default(),
        ]
    }
}

impl From<ResolvedFields> for FieldRecord {
    fn from(fields: ResolvedFields) -> Self {
        Self {
            invoice_id: fields.invoice_id,
            date: fields.date,
            total: fields.total,
        }
    }
}

fn empty_if_none<S: Serializer>(value: &Option<String>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(value.as_deref().unwrap_or_default())
}

/// Typed readings of the resolved date and total, when they parse.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParsedValues {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDateTime>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<Decimal>,
}

impl ParsedValues {
    pub fn is_empty(&self) -> bool {
        self.date.is_none() && self.total.is_none()
    }
}

/// Everything exported for one expense document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportRecord {
    /// Document position within its job.
    pub index: u32,

    #[serde(flatten)]
    pub fields: FieldRecord,

    #[serde(skip_serializing_if = "ParsedValues::is_empty")]
    pub parsed: ParsedValues,

    /// One table per line item group, in document order.
    pub tables: Vec<Table>,
}

impl ExportRecord {
    /// Artifact base name: `<invoice id>_<index>`, or `<index>` without an id.
    pub fn output_name(&self) -> String {
        let id = self
            .fields
            .invoice_id
            .as_deref()
            .map(sanitize)
            .unwrap_or_default();

        if id.is_empty() {
            self.index.to_string()
        } else {
            format!("{}_{}", id, self.index)
        }
    }
}

/// Replace characters that are unsafe in file and sheet names.
fn sanitize(name: &str) -> String {
    name.trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect::<String>()
        .trim_matches(['_', '.'])
        .to_string()
}
