//! Expense document models as produced by the analysis service.
//!
//! Field names follow the service's PascalCase wire format so responses can be
//! deserialized directly. Unknown keys (geometry, block ids) are ignored.

use serde::{Deserialize, Serialize};

/// Field type marking an entry that stands for the whole line item row.
pub const ROW_MARKER_TYPE: &str = "EXPENSE_ROW";

/// One analyzed invoice or receipt.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ExpenseDocument {
    /// Position of the document within its job (assigned by the service).
    #[serde(default)]
    pub expense_index: u32,

    /// Flat business field candidates, in document order.
    #[serde(default)]
    pub summary_fields: Vec<ExpenseField>,

    /// Line item tables, in document order.
    #[serde(default)]
    pub line_item_groups: Vec<LineItemGroup>,
}

/// A detected piece of text with the service's confidence.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Detection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
}

impl Detection {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            confidence: None,
        }
    }
}

/// A summary field or a line item field.
///
/// `field_type` carries the canonical machine tag (e.g. `TOTAL`), the label is
/// the text printed next to the value on the page. Either may be missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ExpenseField {
    #[serde(rename = "Type", default, skip_serializing_if = "Option::is_none")]
    pub field_type: Option<Detection>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label_detection: Option<Detection>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_detection: Option<Detection>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_number: Option<u32>,
}

impl ExpenseField {
    /// Create a field holding only a value.
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value_detection: Some(Detection::new(value)),
            ..Default::default()
        }
    }

    /// Set the canonical type key.
    pub fn with_type(mut self, type_key: impl Into<String>) -> Self {
        self.field_type = Some(Detection::new(type_key));
        self
    }

    /// Set the detected label text.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label_detection = Some(Detection::new(label));
        self
    }

    /// Canonical type key, if the service classified the field.
    pub fn type_key(&self) -> Option<&str> {
        self.field_type.as_ref().and_then(|d| d.text.as_deref())
    }

    /// Label text as detected on the page.
    pub fn label_text(&self) -> Option<&str> {
        self.label_detection.as_ref().and_then(|d| d.text.as_deref())
    }

    /// Detected value text.
    pub fn value_text(&self) -> Option<&str> {
        self.value_detection.as_ref().and_then(|d| d.text.as_deref())
    }

    /// Whether this entry represents the line item row itself.
    pub fn is_row_marker(&self) -> bool {
        self.type_key() == Some(ROW_MARKER_TYPE)
    }
}

/// One logical table within a document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LineItemGroup {
    #[serde(default)]
    pub line_item_group_index: u32,

    #[serde(default)]
    pub line_items: Vec<LineItem>,
}

/// One row of a line item table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LineItem {
    #[serde(default)]
    pub line_item_expense_fields: Vec<ExpenseField>,
}

impl LineItem {
    pub fn new(fields: Vec<ExpenseField>) -> Self {
        Self {
            line_item_expense_fields: fields,
        }
    }

    pub fn fields(&self) -> &[ExpenseField] {
        &self.line_item_expense_fields
    }
}
