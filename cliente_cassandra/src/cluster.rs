// cluster.rs
use crate::cluster_functions::{
    column_family_definition::ColumnFamilyDefinition, cql,
    keyspace_definition::KeyspaceDefinition, replication_config::ReplicationConfig,
};
use crate::conexion::{Conexion, Credenciales};
use crate::error::ErrorType;
use crate::message::{self, Message};
use crate::message_functions::{
    body::Body, body_batch::BodyBatch, consistency::Consistency,
    query_parameters::QueryParameters, query_value::QueryValue, value::decode_text_map,
};
use crate::transporte::Conector;
use log::{debug, info, warn};
use std::collections::HashMap;
use std::sync::atomic::AtomicI64;
use std::sync::{Arc, Mutex, MutexGuard};

/// Registro de clusters por nombre. Pedir dos veces el mismo nombre devuelve
/// handles que comparten la misma conexión.
pub struct ClusterRegistry {
    conector: Arc<dyn Conector>,
    credenciales: Option<Credenciales>,
    clusters: Mutex<HashMap<String, Cluster>>,
}

impl ClusterRegistry {
    pub fn new(conector: Arc<dyn Conector>) -> Self {
        ClusterRegistry {
            conector,
            credenciales: None,
            clusters: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_credentials(mut self, credenciales: Credenciales) -> Self {
        self.credenciales = Some(credenciales);
        self
    }

    /// Devuelve el cluster `name`, creándolo y conectándolo si no existía.
    /// `endpoints` es una lista `host:port` separada por comas.
    pub fn get_or_create(&self, name: &str, endpoints: &str) -> Result<Cluster, ErrorType> {
        let endpoints = parse_endpoints(endpoints)?;
        let mut clusters = self
            .clusters
            .lock()
            .map_err(|_| ErrorType::Connection("Registro de clusters envenenado".to_string()))?;

        if let Some(cluster) = clusters.get(name) {
            if cluster.endpoints() != endpoints.as_slice() {
                warn!(
                    "El cluster {} ya existe con {:?}; se ignoran {:?}",
                    name,
                    cluster.endpoints(),
                    endpoints
                );
            }
            return Ok(cluster.clone());
        }

        let cluster = Cluster {
            inner: Arc::new(ClusterInner {
                name: name.to_string(),
                endpoints,
                conector: Arc::clone(&self.conector),
                credenciales: self.credenciales.clone(),
                conexion: Mutex::new(None),
                clocks: Mutex::new(HashMap::new()),
            }),
        };
        cluster.asegurar_conexion()?;
        info!("Cluster {} creado", name);
        clusters.insert(name.to_string(), cluster.clone());
        Ok(cluster)
    }
}

fn parse_endpoints(endpoints: &str) -> Result<Vec<String>, ErrorType> {
    let parsed: Vec<String> = endpoints
        .split(',')
        .map(str::trim)
        .filter(|endpoint| !endpoint.is_empty())
        .map(str::to_string)
        .collect();
    if parsed.is_empty() {
        return Err(ErrorType::Configuration(
            "La lista de endpoints está vacía".to_string(),
        ));
    }
    Ok(parsed)
}

struct ClusterInner {
    name: String,
    endpoints: Vec<String>,
    conector: Arc<dyn Conector>,
    credenciales: Option<Credenciales>,
    conexion: Mutex<Option<Conexion>>,
    clocks: Mutex<HashMap<String, Arc<AtomicI64>>>, // Último clock entregado por keyspace
}

/// Handle a un cluster. Es barato de clonar; todos los clones usan la misma conexión.
#[derive(Clone)]
pub struct Cluster {
    inner: Arc<ClusterInner>,
}

impl std::fmt::Debug for Cluster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cluster")
            .field("name", &self.inner.name)
            .field("endpoints", &self.inner.endpoints)
            .finish_non_exhaustive()
    }
}

impl Cluster {
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn endpoints(&self) -> &[String] {
        &self.inner.endpoints
    }

    /// Indica si dos handles apuntan al mismo cluster del registro.
    pub fn same_handle(&self, other: &Cluster) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    // Todos los handles de un mismo keyspace comparten el mismo clock
    pub(crate) fn clock_de(&self, keyspace: &str) -> Arc<AtomicI64> {
        let mut clocks = self
            .inner
            .clocks
            .lock()
            .unwrap_or_else(|envenenado| envenenado.into_inner());
        Arc::clone(
            clocks
                .entry(keyspace.to_string())
                .or_insert_with(|| Arc::new(AtomicI64::new(0))),
        )
    }

    fn lock_conexion(&self) -> Result<MutexGuard<'_, Option<Conexion>>, ErrorType> {
        self.inner
            .conexion
            .lock()
            .map_err(|_| ErrorType::Connection("Conexión envenenada".to_string()))
    }

    // Prueba los endpoints en orden hasta que uno complete el handshake
    fn conectar(&self) -> Result<Conexion, ErrorType> {
        let mut errores = vec![];
        for endpoint in &self.inner.endpoints {
            match Conexion::abrir(
                self.inner.conector.as_ref(),
                endpoint,
                self.inner.credenciales.as_ref(),
            ) {
                Ok(conexion) => return Ok(conexion),
                Err(e) => {
                    warn!("No se pudo conectar a {}: {}", endpoint, e);
                    errores.push(format!("{}: {}", endpoint, e));
                }
            }
        }
        Err(ErrorType::Connection(format!(
            "Ningún endpoint de {} respondió ({})",
            self.inner.name,
            errores.join("; ")
        )))
    }

    fn asegurar_conexion(&self) -> Result<(), ErrorType> {
        let mut conexion = self.lock_conexion()?;
        if conexion.is_none() {
            *conexion = Some(self.conectar()?);
        }
        Ok(())
    }

    /// Manda un request por la conexión del cluster y devuelve la respuesta
    /// junto con el endpoint que la atendió. Si la conexión falla se descarta
    /// y el próximo request reconecta; el request fallido no se reintenta.
    pub(crate) fn enviar(&self, request: Message) -> Result<(Message, String), ErrorType> {
        let mut guard = self.lock_conexion()?;
        let mut conexion = match guard.take() {
            Some(conexion) => conexion,
            None => self.conectar()?,
        };

        match conexion.enviar(request) {
            Ok(respuesta) => {
                let endpoint = conexion.endpoint().to_string();
                *guard = Some(conexion);
                Ok((respuesta, endpoint))
            }
            Err(e) if e.is_connection_error() => {
                warn!(
                    "Se descarta la conexión a {}: {}",
                    conexion.endpoint(),
                    e
                );
                Err(e)
            }
            Err(e) => {
                *guard = Some(conexion);
                Err(e)
            }
        }
    }

    pub(crate) fn query(
        &self,
        query: String,
        values: Vec<QueryValue>,
        consistency: Consistency,
    ) -> Result<(Message, String), ErrorType> {
        debug!("QUERY {}", query);
        let parameters = QueryParameters::new(consistency, values);
        self.enviar(message::create_query_message(query, parameters))
    }

    pub(crate) fn batch(&self, batch: BodyBatch) -> Result<(Message, String), ErrorType> {
        debug!("BATCH de {} sentencias", batch.statements.len());
        self.enviar(message::create_batch_message(batch))
    }

    /// Crea el keyspace y sus column families. Si ya existe con la misma
    /// estrategia y factor no hace nada; si existe distinto es un conflicto.
    pub fn add_keyspace(&self, definition: &KeyspaceDefinition) -> Result<(), ErrorType> {
        match self.query(cql::create_keyspace(definition), vec![], Consistency::One) {
            Ok(_) => info!("Keyspace {} creado", definition.name),
            Err(ErrorType::SchemaConflict(message)) => {
                match self.describe_keyspace(&definition.name)? {
                    Some(existente) if existente.same_keyspace(definition) => {
                        debug!("El keyspace {} ya existía igual", definition.name);
                    }
                    Some(existente) => {
                        return Err(ErrorType::SchemaConflict(format!(
                            "El keyspace {} ya existe con {:?}, se pidió {:?}",
                            definition.name, existente.replication, definition.replication
                        )))
                    }
                    None => return Err(ErrorType::SchemaConflict(message)),
                }
            }
            Err(e) => return Err(e),
        }

        for column_family in &definition.column_families {
            self.add_column_family(column_family)?;
        }
        Ok(())
    }

    /// Crea la column family. Todas tienen la misma forma, así que si ya
    /// existe no hay nada que hacer.
    pub fn add_column_family(&self, definition: &ColumnFamilyDefinition) -> Result<(), ErrorType> {
        match self.query(cql::create_table(definition), vec![], Consistency::One) {
            Ok(_) => {
                info!(
                    "Column family {}.{} creada",
                    definition.keyspace, definition.name
                );
                Ok(())
            }
            Err(ErrorType::SchemaConflict(_)) => {
                debug!(
                    "La column family {}.{} ya existía",
                    definition.keyspace, definition.name
                );
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    pub fn drop_keyspace(&self, keyspace: &str) -> Result<(), ErrorType> {
        self.query(cql::drop_keyspace(keyspace), vec![], Consistency::One)?;
        info!("Keyspace {} eliminado", keyspace);
        Ok(())
    }

    pub fn drop_column_family(&self, keyspace: &str, column_family: &str) -> Result<(), ErrorType> {
        self.query(
            cql::drop_table(keyspace, column_family),
            vec![],
            Consistency::One,
        )?;
        info!("Column family {}.{} eliminada", keyspace, column_family);
        Ok(())
    }

    /// Lee la definición de un keyspace desde el esquema del cluster.
    pub fn describe_keyspace(&self, keyspace: &str) -> Result<Option<KeyspaceDefinition>, ErrorType> {
        let (respuesta, _) = self.query(
            cql::describe_keyspace(),
            vec![QueryValue::new(keyspace.as_bytes().to_vec())],
            Consistency::One,
        )?;
        let rows = match respuesta.body {
            Body::Rows(rows) => rows,
            other => {
                return Err(ErrorType::Protocol(format!(
                    "Se esperaban filas de {}, llegó {:?}",
                    cql::SYSTEM_KEYSPACES,
                    other
                )))
            }
        };

        let Some(row) = rows.rows_content.first() else {
            return Ok(None);
        };
        let replication = rows
            .column_index("replication")
            .and_then(|index| row.values.get(index))
            .and_then(|value| value.as_bytes())
            .ok_or_else(|| {
                ErrorType::Protocol(format!("{} sin columna replication", keyspace))
            })?;
        let options = decode_text_map(replication)?;
        let replication = ReplicationConfig::from_options(&options).ok_or_else(|| {
            ErrorType::Protocol(format!("{} sin clase de replicación", keyspace))
        })?;

        Ok(Some(KeyspaceDefinition {
            name: keyspace.to_string(),
            replication,
            column_families: vec![],
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_are_trimmed_and_ordered() {
        assert_eq!(
            parse_endpoints(" localhost:9160 , nodo2:9160,").unwrap(),
            vec!["localhost:9160".to_string(), "nodo2:9160".to_string()]
        );
    }

    #[test]
    fn empty_endpoints_are_a_configuration_error() {
        assert!(matches!(
            parse_endpoints(" , "),
            Err(ErrorType::Configuration(_))
        ));
    }
}
