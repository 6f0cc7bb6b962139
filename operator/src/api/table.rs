use ferrite_types::ResourceInstance;
use serde::Serialize;
use serde_json::Value;

/// `Accept` header fragment that selects the tabular list rendering,
/// mirroring the `kubectl get` table content-type negotiation.
pub const TABLE_ACCEPT_MARKER: &str = "as=Table";

#[derive(Serialize)]
pub struct Table {
    #[serde(rename = "apiVersion")]
    pub api_version: String,
    pub kind: String,
    #[serde(rename = "columnDefinitions")]
    pub column_definitions: Vec<ColumnDefinition>,
    pub rows: Vec<Row>,
}

#[derive(Serialize)]
pub struct ColumnDefinition {
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: String,
}

#[derive(Serialize)]
pub struct Row {
    pub cells: Vec<Value>,
    pub object: Value,
}

pub fn wants_table(accept: &str) -> bool {
    accept.contains(TABLE_ACCEPT_MARKER)
}

pub fn render(group: &str, version: &str, instances: &[ResourceInstance]) -> Table {
    let namespaced = instances.iter().any(|i| i.namespace.is_some());

    let mut column_definitions = vec![ColumnDefinition {
        name: "Name".to_string(),
        column_type: "string".to_string(),
    }];
    if namespaced {
        column_definitions.push(ColumnDefinition {
            name: "Namespace".to_string(),
            column_type: "string".to_string(),
        });
    }
    column_definitions.push(ColumnDefinition {
        name: "Age".to_string(),
        column_type: "date".to_string(),
    });

    let rows = instances
        .iter()
        .map(|i| {
            let mut cells = vec![Value::String(i.name.clone())];
            if namespaced {
                cells.push(match &i.namespace {
                    Some(ns) => Value::String(ns.clone()),
                    None => Value::Null,
                });
            }
            cells.push(Value::String(i.created_at.to_rfc3339()));
            Row {
                cells,
                object: serde_json::to_value(super::envelope::instance_envelope(group, version, i)).unwrap_or(Value::Null),
            }
        })
        .collect();

    Table {
        api_version: "meta.k8s.io/v1".to_string(),
        kind: "Table".to_string(),
        column_definitions,
        rows,
    }
}
