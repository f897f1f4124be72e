//! Serde-loadable settings that assemble a configured [`Flattener`].

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::address;
use crate::document::{
    DuplicatePolicy, JsonHandler, LeafReporting, NodeNaming, NumberMode, StringMode, TreeHandler,
    XmlNode,
};
use crate::engine::{Flattener, NoHandlerPolicy};
use crate::error::{FlattenError, Result};
use crate::handlers::{ArrayHandler, ListHandler, MapHandler, StandardHandler};
use crate::tabular::{
    ColumnNaming, DataRow, DataSet, DataTable, NullCells, RowHandler, RowNaming, TableHandler,
    TableNaming, TableSetHandler, ViewHandler,
};

/// Configuration for the standard handler registry
///
/// Every field has a default, so a configuration file only lists what it changes:
///
/// ```json
/// { "number_mode": "decimal", "duplicate_names": "append-one-based" }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlattenConfig {
    /// What to do with values no handler accepts
    pub no_handler_policy: NoHandlerPolicy,

    /// Separator between markup element names
    pub separator: String,

    pub enums_as_leaf: bool,
    pub optionals_as_leaf: bool,
    pub arrays_as_leaf: bool,
    pub include_properties: bool,
    pub include_fields: bool,

    /// Register the array and list handlers, so sequences are split per element
    pub split_arrays: bool,

    /// How JSON numbers are read
    pub number_mode: NumberMode,

    /// How JSON strings are read
    pub string_mode: StringMode,

    /// When markup elements without content are reported
    pub leaf_reporting: LeafReporting,

    /// How sibling markup elements sharing a name are told apart
    pub duplicate_names: DuplicatePolicy,

    pub node_naming: NodeNaming,
    pub column_naming: ColumnNaming,
    pub row_naming: RowNaming,
    pub table_naming: TableNaming,

    /// What to do with null cells in tables
    pub null_cells: NullCells,
}

impl Default for FlattenConfig {
    fn default() -> Self {
        FlattenConfig {
            no_handler_policy: NoHandlerPolicy::default(),
            separator: String::from(address::DEFAULT_SEPARATOR),
            enums_as_leaf: true,
            optionals_as_leaf: true,
            arrays_as_leaf: true,
            include_properties: true,
            include_fields: false,
            split_arrays: true,
            number_mode: NumberMode::default(),
            string_mode: StringMode::default(),
            leaf_reporting: LeafReporting::default(),
            duplicate_names: DuplicatePolicy::default(),
            node_naming: NodeNaming::default(),
            column_naming: ColumnNaming::default(),
            row_naming: RowNaming::default(),
            table_naming: TableNaming::default(),
            null_cells: NullCells::default(),
        }
    }
}

impl FlattenConfig {
    pub fn from_json_str(text: &str) -> Result<Self> {
        serde_json::from_str(text)
            .map_err(|e| FlattenError::configuration(format!("Invalid configuration: {}", e)))
    }

    /// Builds the registry: JSON, markup, tabular, maps, arrays and lists, then the
    /// standard handler. Custom modes are rejected, as there is no function to run.
    pub fn build(&self) -> Result<Flattener> {
        let json = JsonHandler::builder()
            .number_mode(self.number_mode)
            .string_mode(self.string_mode)
            .build()?;

        let tree = TreeHandler::<XmlNode>::builder()
            .separator(self.separator.as_str())
            .leaf_reporting(self.leaf_reporting)
            .duplicates(self.duplicate_names)
            .naming(self.node_naming)
            .build()?;

        let table_set = TableSetHandler::<DataSet>::builder()
            .table_naming(self.table_naming)
            .build()?;

        let table = TableHandler::<DataTable>::builder()
            .column_naming(self.column_naming)
            .row_naming(self.row_naming)
            .null_cells(self.null_cells)
            .build()?;

        let view = ViewHandler::builder()
            .column_naming(self.column_naming)
            .row_naming(self.row_naming)
            .null_cells(self.null_cells)
            .build()?;

        let row = RowHandler::<DataRow>::builder()
            .column_naming(self.column_naming)
            .null_cells(self.null_cells)
            .build()?;

        let standard = StandardHandler::new()
            .with_enums_as_leaf(self.enums_as_leaf)
            .with_optionals_as_leaf(self.optionals_as_leaf)
            .with_arrays_as_leaf(self.arrays_as_leaf)
            .with_properties(self.include_properties)
            .with_fields(self.include_fields);

        let mut flattener = Flattener::new()
            .with_policy(self.no_handler_policy)
            .with_handler(json)
            .with_handler(tree)
            .with_handler(table_set)
            .with_handler(table)
            .with_handler(view)
            .with_handler(row)
            .with_handler(MapHandler::<String>::display());

        if self.split_arrays {
            flattener.push(ArrayHandler);
            flattener.push(ListHandler);
        }
        flattener.push(standard);

        debug!(
            handlers = flattener.len(),
            policy = %self.no_handler_policy,
            "Built flattener from configuration"
        );
        Ok(flattener)
    }
}

impl Flattener {
    pub fn from_config(config: &FlattenConfig) -> Result<Self> {
        config.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tabular::memory::cell;
    use serde_json::json;

    #[test]
    fn test_default_config() {
        let config = FlattenConfig::default();
        assert_eq!(config.separator, ".");
        assert_eq!(config.number_mode, NumberMode::F64);
        assert!(config.split_arrays);

        let flattener = config.build().unwrap();
        assert_eq!(flattener.len(), 10);
        assert_eq!(flattener.policy(), NoHandlerPolicy::Fail);
    }

    #[test]
    fn test_partial_config_from_json() {
        let config = FlattenConfig::from_json_str(
            r#"{ "number_mode": "i32", "duplicate_names": "append-one-based", "split_arrays": false }"#,
        )
        .unwrap();
        assert_eq!(config.number_mode, NumberMode::I32);
        assert_eq!(config.duplicate_names, DuplicatePolicy::AppendOneBased);
        assert!(!config.split_arrays);
        assert_eq!(config.null_cells, NullCells::Skip);

        assert_eq!(config.build().unwrap().len(), 8);
    }

    #[test]
    fn test_unknown_mode_name_is_rejected() {
        let err = FlattenConfig::from_json_str(r#"{ "number_mode": "int128" }"#).unwrap_err();
        assert!(err.to_string().contains("int128"));
    }

    #[test]
    fn test_custom_mode_cannot_be_built() {
        let config = FlattenConfig {
            column_naming: ColumnNaming::Custom,
            ..FlattenConfig::default()
        };
        assert!(matches!(
            Flattener::from_config(&config),
            Err(FlattenError::Configuration(_))
        ));
    }

    #[test]
    fn test_serializes_mode_names() {
        let text = serde_json::to_string(&FlattenConfig::default()).unwrap();
        assert!(text.contains("\"no_handler_policy\":\"fail\""));
        assert!(text.contains("\"leaf_reporting\":\"empty-if-no-attributes\""));
    }

    #[test]
    fn test_configured_registry_routes_each_family() {
        let flattener = FlattenConfig {
            number_mode: NumberMode::I64,
            ..FlattenConfig::default()
        }
        .build()
        .unwrap();

        let doc = json!({ "n": 3, "list": [true] });
        let entries = flattener.collect("doc", &doc).unwrap();
        assert_eq!(entries[0].address, "doc.n");
        assert_eq!(entries[0].value.downcast_ref::<i64>(), Some(&3));
        assert_eq!(entries[1].address, "doc.list[0]");

        let xml = XmlNode::document(XmlNode::element("root").attr("id", "7"));
        let entries = flattener.collect("", &xml).unwrap();
        assert_eq!(entries[0].address, "root.@id");

        let mut table = DataTable::new("t", &["a"]);
        table.push_row(vec![cell(1u8)]).unwrap();
        let set = DataSet::new().with_table(table);
        let entries = flattener.collect("ds", &set).unwrap();
        assert_eq!(entries[0].address, "ds[t][0][a]");

        let values = vec![vec![1, 2], vec![3]];
        assert_eq!(flattener.collect("v", &values).unwrap().len(), 3);
    }
}
