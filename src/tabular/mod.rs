//! Flattening of tabular data: rows, tables, filtered views and sets of tables.
//!
//! Addresses are built by concatenating bracketed fragments onto the prefix, with no
//! separator: a cell of a table flattens to `prefix + row + column`, e.g.
//! `table[0][Col 1]`, and a table inside a set to `prefix + table + row + column`.
//!
//! Column names are computed once per table and checked for collisions before any
//! cell is produced, whatever the naming mode.

use std::collections::HashSet;
use std::sync::Arc;

use crate::address;
use crate::engine::{empty, single, Entries, Entry, Flatten};
use crate::error::{FlattenError, Result};
use crate::reflect::Reflect;

mod handlers;
pub mod memory;

pub use handlers::{
    RowHandler, RowHandlerBuilder, TableHandler, TableHandlerBuilder, TableSetHandler,
    TableSetHandlerBuilder, ViewHandler,
};
pub use memory::{DataRow, DataSet, DataTable, DataView};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub ordinal: usize,
}

impl Column {
    pub fn new(name: impl Into<String>, ordinal: usize) -> Self {
        Column {
            name: name.into(),
            ordinal,
        }
    }
}

/// The marker stored in a cell that holds no value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DbNull;

pub static DB_NULL: DbNull = DbNull;

crate::reflect_value!(DbNull);

/// One record of a table.
pub trait Row: Reflect + Sized {
    fn columns(&self) -> &[Column];

    /// The cell for a column ordinal; `None` when the row has no such cell.
    fn cell(&self, ordinal: usize) -> Option<&dyn Reflect>;
}

pub trait Table: Reflect + Sized {
    type Row: Row;

    /// Table name; empty when unnamed.
    fn name(&self) -> &str;

    fn columns(&self) -> &[Column];

    /// Rows in output order.
    fn rows(&self) -> Vec<&Self::Row>;
}

pub trait TableSet: Reflect + Sized {
    type Table: Table;

    fn tables(&self) -> Vec<&Self::Table>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColumnNaming {
    /// `[name]`, quoted when the name contains a bracket.
    #[default]
    Name,
    /// `[ordinal position]`.
    Index,
    Custom,
}

mode_names!(ColumnNaming, "column naming mode", {
    Name => "name",
    Index => "index",
    Custom => "custom",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RowNaming {
    /// `[position]`; for a view, the position within the view.
    #[default]
    Index,
    Custom,
}

mode_names!(RowNaming, "row naming mode", {
    Index => "index",
    Custom => "custom",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TableNaming {
    /// `[name]`; an unnamed table is an error.
    #[default]
    Name,
    /// `[position]`. The only mode that skips the collision check.
    Index,
    Custom,
}

mode_names!(TableNaming, "table naming mode", {
    Name => "name",
    Index => "index",
    Custom => "custom",
});

/// Treatment of cells holding the [`DbNull`] marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NullCells {
    /// Leave the cell out.
    #[default]
    Skip,
    /// Report a null leaf at the cell's address.
    Null,
    /// Report the marker itself as the leaf.
    Marker,
}

mode_names!(NullCells, "null cell mode", {
    Skip => "skip",
    Null => "null",
    Marker => "marker",
});

/// Names a column fragment from its position and the column.
pub type ColumnNamer = Arc<dyn Fn(usize, &Column) -> String + Send + Sync>;

/// Names a row fragment from its position and the row.
pub type RowNamer<R> = Arc<dyn Fn(usize, &R) -> String + Send + Sync>;

/// Names a table fragment from its position in the set and the table.
pub type TableNamer<T> = Arc<dyn Fn(usize, &T) -> String + Send + Sync>;

/// The fragment for every column, in column order. Fails on the first collision.
pub(crate) fn column_names(
    naming: ColumnNaming,
    namer: Option<&ColumnNamer>,
    prefix: &str,
    columns: &[Column],
) -> Result<Vec<String>> {
    let mut names = Vec::with_capacity(columns.len());
    let mut seen = HashSet::with_capacity(columns.len());

    for (position, column) in columns.iter().enumerate() {
        let name = match naming {
            ColumnNaming::Name => address::bracketed(&column.name),
            ColumnNaming::Index => format!("[{}]", position),
            ColumnNaming::Custom => match namer {
                Some(namer) => namer(position, column),
                None => return Err(missing_function("column naming mode")),
            },
        };
        if !seen.insert(name.clone()) {
            return Err(FlattenError::duplicate_name(prefix, name));
        }
        names.push(name);
    }

    Ok(names)
}

/// Entries for every cell of a row, `prefix + column` each.
pub(crate) fn row_entries<'a, R: Row>(
    engine: &'a dyn Flatten,
    prefix: String,
    row: &'a R,
    names: Arc<[String]>,
    null_cells: NullCells,
) -> Entries<'a> {
    Box::new(
        row.columns()
            .iter()
            .enumerate()
            .flat_map(move |(position, column)| {
                match (names.get(position), row.cell(column.ordinal)) {
                    (Some(name), Some(cell)) => cell_entries(
                        engine,
                        address::concat(&prefix, &[name.as_str()]),
                        cell,
                        null_cells,
                    ),
                    _ => empty(),
                }
            }),
    )
}

fn cell_entries<'a>(
    engine: &'a dyn Flatten,
    address: String,
    cell: &'a dyn Reflect,
    null_cells: NullCells,
) -> Entries<'a> {
    if !cell.is::<DbNull>() {
        return engine.flatten(address, cell);
    }
    match null_cells {
        NullCells::Skip => empty(),
        NullCells::Null => single(Entry::null(address)),
        NullCells::Marker => single(Entry::borrowed(address, cell)),
    }
}

pub(crate) fn missing_function(kind: &str) -> FlattenError {
    FlattenError::configuration(format!("{} 'custom' requires a naming function", kind))
}
