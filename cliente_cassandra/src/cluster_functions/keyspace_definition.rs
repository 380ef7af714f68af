use crate::cluster_functions::{
    column_family_definition::ColumnFamilyDefinition, replication_config::ReplicationConfig,
};

// Definición de un keyspace tal como se le pide al cluster
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyspaceDefinition {
    pub name: String,                               // Nombre del keyspace
    pub replication: ReplicationConfig,             // Configuración de replicación
    pub column_families: Vec<ColumnFamilyDefinition>, // Column families a crear junto al keyspace
}

impl KeyspaceDefinition {
    pub fn new(name: &str, strategy_class: &str, replication_factor: u32) -> Self {
        KeyspaceDefinition {
            name: name.to_string(),
            replication: ReplicationConfig::new(strategy_class, replication_factor),
            column_families: vec![],
        }
    }

    pub fn with_column_family(mut self, name: &str) -> Self {
        let definition = ColumnFamilyDefinition::new(&self.name, name);
        self.column_families.push(definition);
        self
    }

    /// Dos definiciones son la misma si coinciden nombre, estrategia y factor.
    /// Las column families no cuentan: se crean aparte y de forma idempotente.
    pub fn same_keyspace(&self, other: &KeyspaceDefinition) -> bool {
        self.name == other.name && self.replication == other.replication
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn qualified_strategy_is_the_same_keyspace() {
        let local = KeyspaceDefinition::new(
            "Keyspace2",
            "org.apache.cassandra.locator.SimpleStrategy",
            1,
        )
        .with_column_family("Users");
        let remote = KeyspaceDefinition::new("Keyspace2", "SimpleStrategy", 1);
        assert!(local.same_keyspace(&remote));
        assert_eq!(local.column_families[0].keyspace, "Keyspace2");
    }

    #[test]
    fn different_factor_is_another_keyspace() {
        let a = KeyspaceDefinition::new("Keyspace2", "SimpleStrategy", 1);
        let b = KeyspaceDefinition::new("Keyspace2", "SimpleStrategy", 3);
        assert!(!a.same_keyspace(&b));
    }
}
