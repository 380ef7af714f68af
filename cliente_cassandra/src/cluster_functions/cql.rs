// Sentencias CQL que manda el cliente. Una column family es siempre una tabla
// (key, column1, value) de blobs, así que las filas aceptan cualquier columna.
use crate::cluster_functions::{
    column_family_definition::ColumnFamilyDefinition, keyspace_definition::KeyspaceDefinition,
};

pub const SYSTEM_KEYSPACES: &str = "system_schema.keyspaces";

/// Identificador entre comillas dobles, respetando mayúsculas.
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

fn tabla(keyspace: &str, column_family: &str) -> String {
    format!(
        "{}.{}",
        quote_identifier(keyspace),
        quote_identifier(column_family)
    )
}

pub fn create_keyspace(definition: &KeyspaceDefinition) -> String {
    let replication: Vec<String> = definition
        .replication
        .to_options()
        .iter()
        .map(|(key, value)| format!("{}: {}", quote_literal(key), quote_literal(value)))
        .collect();
    format!(
        "CREATE KEYSPACE {} WITH replication = {{{}}}",
        quote_identifier(&definition.name),
        replication.join(", ")
    )
}

pub fn create_table(definition: &ColumnFamilyDefinition) -> String {
    format!(
        "CREATE TABLE {} (key blob, column1 blob, value blob, PRIMARY KEY (key, column1))",
        tabla(&definition.keyspace, &definition.name)
    )
}

pub fn drop_keyspace(keyspace: &str) -> String {
    format!("DROP KEYSPACE {}", quote_identifier(keyspace))
}

pub fn drop_table(keyspace: &str, column_family: &str) -> String {
    format!("DROP TABLE {}", tabla(keyspace, column_family))
}

pub fn describe_keyspace() -> String {
    format!(
        "SELECT keyspace_name, replication FROM {} WHERE keyspace_name = ?",
        SYSTEM_KEYSPACES
    )
}

/// Valores: key, column1, value.
pub fn insert(keyspace: &str, column_family: &str, clock: i64) -> String {
    format!(
        "INSERT INTO {} (key, column1, value) VALUES (?, ?, ?) USING TIMESTAMP {}",
        tabla(keyspace, column_family),
        clock
    )
}

/// Valores: key, column1.
pub fn delete(keyspace: &str, column_family: &str, clock: i64) -> String {
    format!(
        "DELETE FROM {} USING TIMESTAMP {} WHERE key = ? AND column1 = ?",
        tabla(keyspace, column_family),
        clock
    )
}

/// Valores: key, column1.
pub fn select_column(keyspace: &str, column_family: &str) -> String {
    format!(
        "SELECT column1, value, WRITETIME(value) FROM {} WHERE key = ? AND column1 = ?",
        tabla(keyspace, column_family)
    )
}
