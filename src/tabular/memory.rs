//! In-memory tables: [`DataTable`], [`DataRow`], [`DataView`] and [`DataSet`].

use std::rc::Rc;

use super::{Column, DbNull, Row, Table, TableSet};
use crate::error::{FlattenError, Result};
use crate::reflect::Reflect;

/// Boxes a value for use as a cell.
pub fn cell<T: Reflect>(value: T) -> Box<dyn Reflect> {
    Box::new(value)
}

/// A cell holding the [`DbNull`] marker.
pub fn null_cell() -> Box<dyn Reflect> {
    Box::new(DbNull)
}

#[derive(Debug)]
pub struct DataRow {
    columns: Rc<[Column]>,
    cells: Vec<Box<dyn Reflect>>,
}

impl Row for DataRow {
    fn columns(&self) -> &[Column] {
        &self.columns
    }

    fn cell(&self, ordinal: usize) -> Option<&dyn Reflect> {
        self.cells.get(ordinal).map(|cell| cell.as_ref())
    }
}

/// A named table with a fixed column list.
///
/// ```rust
/// use objflat::tabular::memory::{cell, null_cell};
/// use objflat::tabular::DataTable;
///
/// let mut table = DataTable::new("people", &["name", "age"]);
/// table.push_row(vec![cell("Ada".to_string()), cell(36u32)]).unwrap();
/// table.push_row(vec![cell("Bob".to_string()), null_cell()]).unwrap();
/// assert_eq!(table.len(), 2);
/// ```
#[derive(Debug)]
pub struct DataTable {
    name: String,
    columns: Rc<[Column]>,
    rows: Vec<DataRow>,
}

impl DataTable {
    pub fn new(name: impl Into<String>, columns: &[&str]) -> Self {
        let columns: Vec<Column> = columns
            .iter()
            .enumerate()
            .map(|(ordinal, name)| Column::new(*name, ordinal))
            .collect();
        DataTable {
            name: name.into(),
            columns: columns.into(),
            rows: Vec::new(),
        }
    }

    /// Appends a row. The row must hold exactly one cell per column.
    pub fn push_row(&mut self, cells: Vec<Box<dyn Reflect>>) -> Result<()> {
        if cells.len() != self.columns.len() {
            return Err(FlattenError::configuration(format!(
                "Table '{}' has {} columns but the row has {} cells",
                self.name,
                self.columns.len(),
                cells.len()
            )));
        }
        self.rows.push(DataRow {
            columns: Rc::clone(&self.columns),
            cells,
        });
        Ok(())
    }

    pub fn row(&self, index: usize) -> Option<&DataRow> {
        self.rows.get(index)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl Table for DataTable {
    type Row = DataRow;

    fn name(&self) -> &str {
        &self.name
    }

    fn columns(&self) -> &[Column] {
        &self.columns
    }

    fn rows(&self) -> Vec<&DataRow> {
        self.rows.iter().collect()
    }
}

/// A filtered subset of a table's rows, in table order.
#[derive(Debug, Clone)]
pub struct DataView {
    table: Rc<DataTable>,
    rows: Vec<usize>,
}

impl DataView {
    /// The rows of `table` for which `filter` holds.
    pub fn new(table: Rc<DataTable>, filter: impl Fn(&DataRow) -> bool) -> Self {
        let rows = table
            .rows
            .iter()
            .enumerate()
            .filter(|(_, row)| filter(row))
            .map(|(index, _)| index)
            .collect();
        DataView { table, rows }
    }

    /// Every row of `table`.
    pub fn all(table: Rc<DataTable>) -> Self {
        DataView::new(table, |_| true)
    }

    pub fn table(&self) -> &DataTable {
        &self.table
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl Table for DataView {
    type Row = DataRow;

    fn name(&self) -> &str {
        &self.table.name
    }

    fn columns(&self) -> &[Column] {
        &self.table.columns
    }

    fn rows(&self) -> Vec<&DataRow> {
        self.rows
            .iter()
            .filter_map(|&index| self.table.rows.get(index))
            .collect()
    }
}

#[derive(Debug, Default)]
pub struct DataSet {
    tables: Vec<DataTable>,
}

impl DataSet {
    pub fn new() -> Self {
        DataSet::default()
    }

    pub fn push(&mut self, table: DataTable) {
        self.tables.push(table);
    }

    pub fn with_table(mut self, table: DataTable) -> Self {
        self.push(table);
        self
    }

    pub fn table(&self, name: &str) -> Option<&DataTable> {
        self.tables.iter().find(|table| table.name == name)
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

impl TableSet for DataSet {
    type Table = DataTable;

    fn tables(&self) -> Vec<&DataTable> {
        self.tables.iter().collect()
    }
}

crate::reflect_value!(DataRow, DataTable, DataView, DataSet);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_row_checks_width() {
        let mut table = DataTable::new("t", &["a", "b"]);
        assert!(table.push_row(vec![cell(1i32)]).is_err());
        assert!(table.push_row(vec![cell(1i32), null_cell()]).is_ok());
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_rows_share_table_columns() {
        let mut table = DataTable::new("t", &["a", "b"]);
        table.push_row(vec![cell(1i32), cell(2i32)]).unwrap();

        let row = table.row(0).unwrap();
        assert_eq!(row.columns(), table.columns());
        assert_eq!(row.columns()[1], Column::new("b", 1));
        assert_eq!(row.cell(1).and_then(|c| c.downcast_ref::<i32>()), Some(&2));
        assert!(row.cell(2).is_none());
        assert!(row.cell(0).map_or(false, |c| !c.is::<DbNull>()));
    }

    #[test]
    fn test_view_keeps_table_order() {
        let mut table = DataTable::new("t", &["n"]);
        for n in 0..5i32 {
            table.push_row(vec![cell(n)]).unwrap();
        }
        let view = DataView::new(Rc::new(table), |row| {
            row.cell(0)
                .and_then(|c| c.downcast_ref::<i32>())
                .map_or(false, |n| n % 2 == 0)
        });

        let values: Vec<i32> = view
            .rows()
            .iter()
            .filter_map(|row| row.cell(0).and_then(|c| c.downcast_ref::<i32>()).copied())
            .collect();
        assert_eq!(values, vec![0, 2, 4]);
        assert_eq!(view.name(), "t");
        assert_eq!(DataView::all(Rc::clone(&view.table)).len(), 5);
    }

    #[test]
    fn test_data_set_lookup() {
        let set = DataSet::new()
            .with_table(DataTable::new("first", &["a"]))
            .with_table(DataTable::new("second", &["b"]));
        assert_eq!(set.len(), 2);
        assert_eq!(set.table("second").map(|t| t.columns()[0].name.as_str()), Some("b"));
        assert!(set.table("third").is_none());
    }
}
