// Estrategias de replicación que entiende el cluster
const LOCATOR_PREFIX: &str = "org.apache.cassandra.locator.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplicationClass {
    SimpleStrategy,
    NetworkTopologyStrategy,
    Other(String), // Cualquier estrategia propia del servidor
}

impl ReplicationClass {
    /// Acepta el nombre corto (`SimpleStrategy`) o el calificado
    /// (`org.apache.cassandra.locator.SimpleStrategy`).
    pub fn from_class(class: &str) -> Self {
        let short = class.trim().trim_start_matches(LOCATOR_PREFIX);
        match short {
            "SimpleStrategy" => ReplicationClass::SimpleStrategy,
            "NetworkTopologyStrategy" => ReplicationClass::NetworkTopologyStrategy,
            _ => ReplicationClass::Other(short.to_string()),
        }
    }

    pub fn short_name(&self) -> &str {
        match self {
            ReplicationClass::SimpleStrategy => "SimpleStrategy",
            ReplicationClass::NetworkTopologyStrategy => "NetworkTopologyStrategy",
            ReplicationClass::Other(name) => name,
        }
    }

    /// Nombre completo, como lo guarda `system_schema.keyspaces`.
    pub fn qualified_name(&self) -> String {
        format!("{}{}", LOCATOR_PREFIX, self.short_name())
    }
}
