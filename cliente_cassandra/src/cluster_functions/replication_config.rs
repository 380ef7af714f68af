use crate::cluster_functions::replication_class::ReplicationClass;

// Configuración de replicación
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplicationConfig {
    pub class: ReplicationClass, // Estrategia de replicación
    pub replication_factor: u32, // Factor de replicación
}

impl ReplicationConfig {
    pub fn new(class: &str, replication_factor: u32) -> Self {
        ReplicationConfig {
            class: ReplicationClass::from_class(class),
            replication_factor,
        }
    }

    /// Entradas del mapa `replication` de CREATE KEYSPACE.
    pub fn to_options(&self) -> Vec<(String, String)> {
        vec![
            ("class".to_string(), self.class.short_name().to_string()),
            (
                "replication_factor".to_string(),
                self.replication_factor.to_string(),
            ),
        ]
    }

    /// Reconstruye la configuración a partir del mapa que devuelve el servidor.
    /// Sin `replication_factor` (ej: NetworkTopologyStrategy) queda en 0.
    pub fn from_options(options: &[(String, String)]) -> Option<Self> {
        let class = options
            .iter()
            .find(|(key, _)| key == "class")
            .map(|(_, value)| ReplicationClass::from_class(value))?;
        let replication_factor = options
            .iter()
            .find(|(key, _)| key == "replication_factor")
            .and_then(|(_, value)| value.trim().parse().ok())
            .unwrap_or(0);
        Some(ReplicationConfig {
            class,
            replication_factor,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn options_from_server_match_local_definition() {
        let options = vec![
            (
                "class".to_string(),
                "org.apache.cassandra.locator.SimpleStrategy".to_string(),
            ),
            ("replication_factor".to_string(), "1".to_string()),
        ];
        assert_eq!(
            ReplicationConfig::from_options(&options),
            Some(ReplicationConfig::new("SimpleStrategy", 1))
        );
    }

    #[test]
    fn missing_class_is_none() {
        let options = vec![("replication_factor".to_string(), "3".to_string())];
        assert_eq!(ReplicationConfig::from_options(&options), None);
    }
}
