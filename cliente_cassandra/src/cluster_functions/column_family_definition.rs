// Una column family: nombre dentro de un keyspace, sin esquema de columnas
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnFamilyDefinition {
    pub keyspace: String,
    pub name: String,
}

impl ColumnFamilyDefinition {
    pub fn new(keyspace: &str, name: &str) -> Self {
        ColumnFamilyDefinition {
            keyspace: keyspace.to_string(),
            name: name.to_string(),
        }
    }
}
