//! Finding the "all contracts" aggregate row across report layouts

use super::html::ParsedRow;
use crate::error::ExtractError;
use crate::schema::AggregateRow;
use crate::text::coerce_int;

/// Value columns after the label: top-5 buy, top-10 buy, top-5 sell,
/// top-10 sell, open interest. Percentages sit in the columns between.
const VALUE_OFFSETS: [usize; 5] = [1, 3, 5, 7, 9];

/// Table layouts the exchange has been seen to publish.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// Contract name announced in an earlier (usually row-spanning) row,
    /// aggregate label in a later row of its own.
    Grouped,
    /// Label and values together in one self-contained row.
    Flat,
}

impl Dialect {
    pub const PRIORITY: [Dialect; 2] = [Dialect::Grouped, Dialect::Flat];

    /// `None` when this layout does not apply to `rows`.
    pub fn locate(self, rows: &[ParsedRow], label: &str) -> Option<LocatedRow> {
        match self {
            Dialect::Grouped => locate_grouped(rows, label),
            Dialect::Flat => locate_flat(rows, label),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatedRow {
    pub dialect: Dialect,
    pub contract: Option<String>,
    pub cells: Vec<String>,
    pub label_index: usize,
}

impl LocatedRow {
    fn new(dialect: Dialect, contract: Option<String>, row: &ParsedRow, label_index: usize) -> Self {
        Self {
            dialect,
            contract,
            cells: row.texts(),
            label_index,
        }
    }

    pub fn aggregate(&self) -> Result<AggregateRow, ExtractError> {
        let last = self.label_index + VALUE_OFFSETS[VALUE_OFFSETS.len() - 1];
        if self.cells.len() <= last {
            return Err(ExtractError::TooFewColumns {
                count: self.cells.len(),
                cells: self.cells.clone(),
            });
        }

        let value = |offset: usize| coerce_int(&self.cells[self.label_index + offset]);
        Ok(AggregateRow {
            buy_top5: value(VALUE_OFFSETS[0]),
            buy_top10: value(VALUE_OFFSETS[1]),
            sell_top5: value(VALUE_OFFSETS[2]),
            sell_top10: value(VALUE_OFFSETS[3]),
            open_interest: value(VALUE_OFFSETS[4]),
        })
    }
}

/// Tries each dialect in priority order.
pub fn locate(rows: &[ParsedRow], label: &str) -> Result<LocatedRow, ExtractError> {
    Dialect::PRIORITY
        .iter()
        .find_map(|dialect| dialect.locate(rows, label))
        .ok_or_else(|| ExtractError::LabelNotFound {
            label: label.to_string(),
        })
}

fn locate_flat(rows: &[ParsedRow], label: &str) -> Option<LocatedRow> {
    rows.iter().find_map(|row| {
        row.position(label)
            .map(|idx| LocatedRow::new(Dialect::Flat, None, row, idx))
    })
}

fn locate_grouped(rows: &[ParsedRow], label: &str) -> Option<LocatedRow> {
    let mut current: Option<String> = None;

    for row in rows {
        if let Some(name) = contract_name(row, label) {
            current = Some(name);
        }
        if let Some(idx) = row.position(label) {
            // The first aggregate row decides; without a remembered name the
            // page is not grouped.
            return current.map(|name| LocatedRow::new(Dialect::Grouped, Some(name), row, idx));
        }
    }
    None
}

/// A data row announcing a contract: its leading cell spans the rows below,
/// or it is a lone cell spanning the table width.
fn contract_name(row: &ParsedRow, label: &str) -> Option<String> {
    let first = row.cells.first()?;
    if first.header || first.text.is_empty() || first.text.contains(label) {
        return None;
    }
    if first.text.chars().all(|c| c.is_ascii_digit() || c == ',') {
        return None;
    }

    let merged_down = first.rowspan > 1;
    let heading = row.cells.len() == 1 && first.colspan > 1;
    (merged_down || heading).then(|| first.text.clone())
}
