// config.rs
use crate::conexion::Credenciales;
use crate::error::ErrorType;
use crate::message_functions::consistency::Consistency;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigTls {
    pub ca_cert: Option<PathBuf>,     // PEM con la CA; sin él, certificados del sistema
    pub server_name: Option<String>, // Nombre a validar; por defecto el host del endpoint
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigCredenciales {
    pub user: String,
    pub password: String,
}

/// Configuración del cliente y del harness. Todos los campos tienen valor
/// por defecto, así que un JSON vacío (`{}`) es válido.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigCliente {
    pub cluster_name: String,
    pub hosts: Vec<String>,
    pub keyspace: String,
    pub column_family: String,
    pub replication_strategy: String,
    pub replication_factor: u32,
    pub consistency: String,
    pub connect_timeout_ms: u64,
    pub request_timeout_ms: u64,
    pub tls: Option<ConfigTls>,
    pub credentials: Option<ConfigCredenciales>,
    pub log_dir: Option<PathBuf>,
    pub log_level: String,
}

impl Default for ConfigCliente {
    fn default() -> Self {
        ConfigCliente {
            cluster_name: "Test Cluster".to_string(),
            hosts: vec!["localhost:9160".to_string()],
            keyspace: "Keyspace2".to_string(),
            column_family: "Users".to_string(),
            replication_strategy: "org.apache.cassandra.locator.SimpleStrategy".to_string(),
            replication_factor: 1,
            consistency: "ONE".to_string(),
            connect_timeout_ms: 5_000,
            request_timeout_ms: 10_000,
            tls: None,
            credentials: None,
            log_dir: Some(PathBuf::from("logs")),
            log_level: "info".to_string(),
        }
    }
}

impl ConfigCliente {
    pub fn from_file(path: &Path) -> Result<Self, ErrorType> {
        let contenido = fs::read_to_string(path).map_err(|e| {
            ErrorType::Configuration(format!("No se pudo leer {}: {}", path.display(), e))
        })?;
        Self::from_json(&contenido)
    }

    pub fn from_json(contenido: &str) -> Result<Self, ErrorType> {
        let config: ConfigCliente = serde_json::from_str(contenido)
            .map_err(|e| ErrorType::Configuration(format!("Configuración inválida: {}", e)))?;
        config.validar()?;
        Ok(config)
    }

    fn validar(&self) -> Result<(), ErrorType> {
        if self.hosts.iter().all(|host| host.trim().is_empty()) {
            return Err(ErrorType::Configuration(
                "hosts no puede estar vacío".to_string(),
            ));
        }
        if self.replication_factor == 0 {
            return Err(ErrorType::Configuration(
                "replication_factor tiene que ser mayor a 0".to_string(),
            ));
        }
        if self.connect_timeout_ms == 0 || self.request_timeout_ms == 0 {
            return Err(ErrorType::Configuration(
                "connect_timeout_ms y request_timeout_ms tienen que ser mayores a 0".to_string(),
            ));
        }
        self.consistency()?;
        Ok(())
    }

    /// Lista de endpoints como la recibe el registro de clusters.
    pub fn endpoints(&self) -> String {
        self.hosts.join(",")
    }

    pub fn consistency(&self) -> Result<Consistency, ErrorType> {
        Consistency::from_name(&self.consistency).ok_or_else(|| {
            ErrorType::Configuration(format!(
                "Nivel de consistencia desconocido: {}",
                self.consistency
            ))
        })
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn credenciales(&self) -> Option<Credenciales> {
        self.credentials.as_ref().map(|c| Credenciales {
            user: c.user.clone(),
            password: c.password.clone(),
        })
    }
}
