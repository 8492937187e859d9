//! Field resolution and line item tabulation.

mod resolver;
mod table;
pub mod values;

pub use resolver::{FieldMatch, FieldResolver, FieldRule, ResolvedFields, DATE_TYPE, INVOICE_ID_TYPE, TOTAL_TYPE};
pub use table::{LineItemTableBuilder, SchemaDrift, Table};
pub use values::{parse_amount, parse_date};
