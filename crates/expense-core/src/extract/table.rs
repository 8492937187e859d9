//! Line item tabulation.
//!
//! The column schema comes from the first line item of a group only. A column
//! is any field with a non-empty label that is not the row marker.

use serde::Serialize;
use tracing::warn;

use crate::models::document::{ExpenseField, LineItem, LineItemGroup};

/// A rectangular, string-valued table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Table {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,

    /// Rows whose column count differed from the header before normalization.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub drift: Vec<SchemaDrift>,
}

impl Table {
    pub fn column_count(&self) -> usize {
        self.header.len()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

/// A line item whose qualifying field count differs from the first item's.
///
/// Short rows are padded with empty strings, extra values are dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SchemaDrift {
    /// Row index within the group (0-based).
    pub row: usize,
    /// Column count taken from the first line item.
    pub expected: usize,
    /// Qualifying fields found on this row.
    pub actual: usize,
}

/// Builds one [`Table`] per line item group.
#[derive(Debug, Clone, Copy, Default)]
pub struct LineItemTableBuilder;

impl LineItemTableBuilder {
    pub fn new() -> Self {
        Self
    }

    pub fn build(&self, group: &LineItemGroup) -> Table {
        let header: Vec<String> = group
            .line_items
            .first()
            .map(|item| {
                columns(item)
                    .filter_map(|f| f.label_text())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        let width = header.len();
        let mut drift = Vec::new();

        let rows = group
            .line_items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                let mut row: Vec<String> = columns(item)
                    .map(|f| f.value_text().unwrap_or_default().to_string())
                    .collect();

                if row.len() != width {
                    drift.push(SchemaDrift {
                        row: i,
                        expected: width,
                        actual: row.len(),
                    });
                    row.resize(width, String::new());
                }
                row
            })
            .collect();

        if !drift.is_empty() {
            warn!(
                "Line item group {} has {} rows deviating from its {} column schema",
                group.line_item_group_index,
                drift.len(),
                width
            );
        }

        Table { header, rows, drift }
    }

    /// Build every group of a document independently, in order.
    pub fn build_all(&self, groups: &[LineItemGroup]) -> Vec<Table> {
        groups.iter().map(|g| self.build(g)).collect()
    }
}

/// Fields of a line item that map to table columns.
fn columns(item: &LineItem) -> impl Iterator<Item = &ExpenseField> {
    item.fields()
        .iter()
        .filter(|f| !f.is_row_marker() && f.label_text().is_some_and(|l| !l.is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn row_marker() -> ExpenseField {
        ExpenseField::new("Widget 2 10.00").with_type("EXPENSE_ROW")
    }

    fn item(cells: &[(&str, &str)]) -> LineItem {
        let mut fields = vec![row_marker()];
        fields.extend(
            cells
                .iter()
                .map(|(label, value)| ExpenseField::new(*value).with_type("OTHER").with_label(*label)),
        );
        LineItem::new(fields)
    }

    fn group(items: Vec<LineItem>) -> LineItemGroup {
        LineItemGroup {
            line_item_group_index: 1,
            line_items: items,
        }
    }

    #[test]
    fn test_header_from_first_item() {
        let table = LineItemTableBuilder::new().build(&group(vec![
            item(&[("Description", "Widget"), ("Qty", "2"), ("Amount", "10.00")]),
            item(&[("Description", "Gadget"), ("Qty", "1"), ("Amount", "5.00")]),
        ]));

        assert_eq!(table.header, vec!["Description", "Qty", "Amount"]);
        assert_eq!(
            table.rows,
            vec![
                vec!["Widget", "2", "10.00"],
                vec!["Gadget", "1", "5.00"],
            ]
        );
        assert!(table.drift.is_empty());
    }

    #[test]
    fn test_unlabeled_and_row_marker_fields_excluded() {
        let first = LineItem::new(vec![
            row_marker().with_label("Row"),
            ExpenseField::new("Widget").with_type("ITEM").with_label("Item"),
            ExpenseField::new("42").with_type("PRODUCT_CODE"),
            ExpenseField::new("3.00").with_type("PRICE").with_label(""),
            ExpenseField::new("9.00").with_type("PRICE").with_label("Price"),
        ]);

        let table = LineItemTableBuilder::new().build(&group(vec![first]));

        assert_eq!(table.header, vec!["Item", "Price"]);
        assert_eq!(table.rows, vec![vec!["Widget", "9.00"]]);
    }

    #[test]
    fn test_schema_drift_pads_and_truncates() {
        let table = LineItemTableBuilder::new().build(&group(vec![
            item(&[("Description", "Widget"), ("Qty", "2")]),
            item(&[("Description", "Gadget")]),
            item(&[("Description", "Gizmo"), ("Qty", "4"), ("Note", "extra")]),
        ]));

        assert_eq!(table.column_count(), 2);
        assert_eq!(table.row_count(), 3);
        assert_eq!(
            table.rows,
            vec![
                vec!["Widget", "2"],
                vec!["Gadget", ""],
                vec!["Gizmo", "4"],
            ]
        );
        assert_eq!(
            table.drift,
            vec![
                SchemaDrift { row: 1, expected: 2, actual: 1 },
                SchemaDrift { row: 2, expected: 2, actual: 3 },
            ]
        );
    }

    #[test]
    fn test_missing_value_becomes_empty_string() {
        let mut field = ExpenseField::default().with_label("Qty");
        field.value_detection = None;
        let table = LineItemTableBuilder::new().build(&group(vec![LineItem::new(vec![field])]));

        assert_eq!(table.rows, vec![vec![String::new()]]);
    }

    #[test]
    fn test_empty_group() {
        let table = LineItemTableBuilder::new().build(&group(Vec::new()));
        assert_eq!(table, Table::default());
    }

    #[test]
    fn test_groups_built_independently() {
        let groups = vec![
            group(vec![item(&[("A", "1")])]),
            group(vec![item(&[("B", "2"), ("C", "3")]), item(&[("B", "4"), ("C", "5")])]),
        ];

        let tables = LineItemTableBuilder::new().build_all(&groups);

        assert_eq!(tables.len(), 2);
        assert_eq!(tables[0].header, vec!["A"]);
        assert_eq!(tables[1].header, vec!["B", "C"]);
        assert_eq!(tables[1].row_count(), 2);
    }
}
