use std::collections::HashSet;
use std::marker::PhantomData;
use std::sync::Arc;

use tracing::debug;

use super::{
    column_names, missing_function, row_entries, Column, ColumnNamer, ColumnNaming, DataView,
    NullCells, Row, RowNamer, RowNaming, Table, TableNamer, TableNaming, TableSet,
};
use crate::address;
use crate::engine::{empty, failed, Entries, Flatten, Handler};
use crate::error::{FlattenError, Result};
use crate::reflect::Reflect;

/// Flattens a filtered view; rows are numbered by their position in the view.
pub type ViewHandler = TableHandler<DataView>;

/// Flattens a single row as `prefix + column`.
pub struct RowHandler<R> {
    column_naming: ColumnNaming,
    column_namer: Option<ColumnNamer>,
    null_cells: NullCells,
    _row: PhantomData<fn() -> R>,
}

pub struct RowHandlerBuilder<R> {
    column_naming: ColumnNaming,
    column_namer: Option<ColumnNamer>,
    null_cells: NullCells,
    _row: PhantomData<fn() -> R>,
}

impl<R: Row> RowHandlerBuilder<R> {
    pub fn column_naming(mut self, mode: ColumnNaming) -> Self {
        self.column_naming = mode;
        self
    }

    /// The function used by [`ColumnNaming::Custom`].
    pub fn column_namer(
        mut self,
        namer: impl Fn(usize, &Column) -> String + Send + Sync + 'static,
    ) -> Self {
        self.column_namer = Some(Arc::new(namer));
        self
    }

    pub fn null_cells(mut self, mode: NullCells) -> Self {
        self.null_cells = mode;
        self
    }

    pub fn build(self) -> Result<RowHandler<R>> {
        if self.column_naming == ColumnNaming::Custom && self.column_namer.is_none() {
            return Err(missing_function("column naming mode"));
        }
        debug!(
            column_naming = %self.column_naming,
            null_cells = %self.null_cells,
            "Configured row handler"
        );
        Ok(RowHandler {
            column_naming: self.column_naming,
            column_namer: self.column_namer,
            null_cells: self.null_cells,
            _row: PhantomData,
        })
    }
}

impl<R: Row> RowHandler<R> {
    pub fn new() -> Self {
        RowHandler {
            column_naming: ColumnNaming::default(),
            column_namer: None,
            null_cells: NullCells::default(),
            _row: PhantomData,
        }
    }

    pub fn builder() -> RowHandlerBuilder<R> {
        RowHandlerBuilder {
            column_naming: ColumnNaming::default(),
            column_namer: None,
            null_cells: NullCells::default(),
            _row: PhantomData,
        }
    }
}

impl<R: Row> Default for RowHandler<R> {
    fn default() -> Self {
        RowHandler::new()
    }
}

impl<R: Row> Handler for RowHandler<R> {
    fn can_handle(&self, _prefix: &str, value: &dyn Reflect) -> bool {
        value.is::<R>()
    }

    fn process<'a>(
        &'a self,
        engine: &'a dyn Flatten,
        prefix: String,
        value: &'a dyn Reflect,
    ) -> Entries<'a> {
        let Some(row) = value.downcast_ref::<R>() else {
            return empty();
        };
        match column_names(
            self.column_naming,
            self.column_namer.as_ref(),
            &prefix,
            row.columns(),
        ) {
            Ok(names) => row_entries(engine, prefix, row, names.into(), self.null_cells),
            Err(err) => failed(err),
        }
    }
}

/// Flattens every row of a table as `prefix + row + column`, rows outermost.
pub struct TableHandler<T: Table> {
    column_naming: ColumnNaming,
    column_namer: Option<ColumnNamer>,
    row_naming: RowNaming,
    row_namer: Option<RowNamer<T::Row>>,
    null_cells: NullCells,
    _table: PhantomData<fn() -> T>,
}

pub struct TableHandlerBuilder<T: Table> {
    column_naming: ColumnNaming,
    column_namer: Option<ColumnNamer>,
    row_naming: RowNaming,
    row_namer: Option<RowNamer<T::Row>>,
    null_cells: NullCells,
    _table: PhantomData<fn() -> T>,
}

impl<T: Table> TableHandlerBuilder<T> {
    pub fn column_naming(mut self, mode: ColumnNaming) -> Self {
        self.column_naming = mode;
        self
    }

    pub fn column_namer(
        mut self,
        namer: impl Fn(usize, &Column) -> String + Send + Sync + 'static,
    ) -> Self {
        self.column_namer = Some(Arc::new(namer));
        self
    }

    pub fn row_naming(mut self, mode: RowNaming) -> Self {
        self.row_naming = mode;
        self
    }

    pub fn row_namer(
        mut self,
        namer: impl Fn(usize, &T::Row) -> String + Send + Sync + 'static,
    ) -> Self {
        self.row_namer = Some(Arc::new(namer));
        self
    }

    pub fn null_cells(mut self, mode: NullCells) -> Self {
        self.null_cells = mode;
        self
    }

    pub fn build(self) -> Result<TableHandler<T>> {
        if self.column_naming == ColumnNaming::Custom && self.column_namer.is_none() {
            return Err(missing_function("column naming mode"));
        }
        if self.row_naming == RowNaming::Custom && self.row_namer.is_none() {
            return Err(missing_function("row naming mode"));
        }
        debug!(
            column_naming = %self.column_naming,
            row_naming = %self.row_naming,
            null_cells = %self.null_cells,
            "Configured table handler"
        );
        Ok(TableHandler {
            column_naming: self.column_naming,
            column_namer: self.column_namer,
            row_naming: self.row_naming,
            row_namer: self.row_namer,
            null_cells: self.null_cells,
            _table: PhantomData,
        })
    }
}

impl<T: Table> TableHandler<T> {
    pub fn new() -> Self {
        TableHandler {
            column_naming: ColumnNaming::default(),
            column_namer: None,
            row_naming: RowNaming::default(),
            row_namer: None,
            null_cells: NullCells::default(),
            _table: PhantomData,
        }
    }

    pub fn builder() -> TableHandlerBuilder<T> {
        TableHandlerBuilder {
            column_naming: ColumnNaming::default(),
            column_namer: None,
            row_naming: RowNaming::default(),
            row_namer: None,
            null_cells: NullCells::default(),
            _table: PhantomData,
        }
    }

    fn row_name(&self, index: usize, row: &T::Row) -> Result<String> {
        match self.row_naming {
            RowNaming::Index => Ok(format!("[{}]", index)),
            RowNaming::Custom => match &self.row_namer {
                Some(namer) => Ok(namer(index, row)),
                None => Err(missing_function("row naming mode")),
            },
        }
    }
}

impl<T: Table> Default for TableHandler<T> {
    fn default() -> Self {
        TableHandler::new()
    }
}

impl<T: Table> Handler for TableHandler<T> {
    fn can_handle(&self, _prefix: &str, value: &dyn Reflect) -> bool {
        value.is::<T>()
    }

    fn process<'a>(
        &'a self,
        engine: &'a dyn Flatten,
        prefix: String,
        value: &'a dyn Reflect,
    ) -> Entries<'a> {
        let Some(table) = value.downcast_ref::<T>() else {
            return empty();
        };
        let names: Arc<[String]> = match column_names(
            self.column_naming,
            self.column_namer.as_ref(),
            &prefix,
            table.columns(),
        ) {
            Ok(names) => names.into(),
            Err(err) => return failed(err),
        };

        Box::new(
            table
                .rows()
                .into_iter()
                .enumerate()
                .flat_map(move |(index, row)| match self.row_name(index, row) {
                    Ok(name) => row_entries(
                        engine,
                        address::concat(&prefix, &[name.as_str()]),
                        row,
                        Arc::clone(&names),
                        self.null_cells,
                    ),
                    Err(err) => failed(err),
                }),
        )
    }
}

/// Flattens each table of a set under `prefix + table name`, through the engine.
pub struct TableSetHandler<S: TableSet> {
    table_naming: TableNaming,
    table_namer: Option<TableNamer<S::Table>>,
    _set: PhantomData<fn() -> S>,
}

pub struct TableSetHandlerBuilder<S: TableSet> {
    table_naming: TableNaming,
    table_namer: Option<TableNamer<S::Table>>,
    _set: PhantomData<fn() -> S>,
}

impl<S: TableSet> TableSetHandlerBuilder<S> {
    pub fn table_naming(mut self, mode: TableNaming) -> Self {
        self.table_naming = mode;
        self
    }

    pub fn table_namer(
        mut self,
        namer: impl Fn(usize, &S::Table) -> String + Send + Sync + 'static,
    ) -> Self {
        self.table_namer = Some(Arc::new(namer));
        self
    }

    pub fn build(self) -> Result<TableSetHandler<S>> {
        if self.table_naming == TableNaming::Custom && self.table_namer.is_none() {
            return Err(missing_function("table naming mode"));
        }
        debug!(table_naming = %self.table_naming, "Configured table set handler");
        Ok(TableSetHandler {
            table_naming: self.table_naming,
            table_namer: self.table_namer,
            _set: PhantomData,
        })
    }
}

impl<S: TableSet> TableSetHandler<S> {
    pub fn new() -> Self {
        TableSetHandler {
            table_naming: TableNaming::default(),
            table_namer: None,
            _set: PhantomData,
        }
    }

    pub fn builder() -> TableSetHandlerBuilder<S> {
        TableSetHandlerBuilder {
            table_naming: TableNaming::default(),
            table_namer: None,
            _set: PhantomData,
        }
    }

    fn table_name(&self, prefix: &str, index: usize, table: &S::Table) -> Result<String> {
        match self.table_naming {
            TableNaming::Index => Ok(format!("[{}]", index)),
            TableNaming::Name if table.name().is_empty() => {
                Err(FlattenError::configuration(
                    "table naming mode 'name' requires every table to be named",
                ))
            }
            TableNaming::Name => Ok(address::bracketed(table.name())),
            TableNaming::Custom => match &self.table_namer {
                Some(namer) => Ok(namer(index, table)),
                None => Err(missing_function("table naming mode")),
            },
        }
    }

    /// Names for every table, in set order. Collisions fail unless naming by index.
    fn table_names(&self, prefix: &str, tables: &[&S::Table]) -> Result<Vec<String>> {
        let mut names = Vec::with_capacity(tables.len());
        let mut seen = HashSet::with_capacity(tables.len());

        for (index, table) in tables.iter().enumerate() {
            let name = self.table_name(prefix, index, table)?;
            if self.table_naming != TableNaming::Index && !seen.insert(name.clone()) {
                return Err(FlattenError::duplicate_name(prefix, name));
            }
            names.push(name);
        }

        Ok(names)
    }
}

impl<S: TableSet> Default for TableSetHandler<S> {
    fn default() -> Self {
        TableSetHandler::new()
    }
}

impl<S: TableSet> Handler for TableSetHandler<S> {
    fn can_handle(&self, _prefix: &str, value: &dyn Reflect) -> bool {
        value.is::<S>()
    }

    fn process<'a>(
        &'a self,
        engine: &'a dyn Flatten,
        prefix: String,
        value: &'a dyn Reflect,
    ) -> Entries<'a> {
        let Some(set) = value.downcast_ref::<S>() else {
            return empty();
        };
        let tables = set.tables();
        let names = match self.table_names(&prefix, &tables) {
            Ok(names) => names,
            Err(err) => return failed(err),
        };

        Box::new(
            tables
                .into_iter()
                .zip(names)
                .flat_map(move |(table, name)| {
                    engine.flatten(address::concat(&prefix, &[name.as_str()]), table)
                }),
        )
    }
}
