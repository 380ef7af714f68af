// mutator.rs
use crate::cluster_functions::cql;
use crate::column::Column;
use crate::error::ErrorType;
use crate::keyspace::Keyspace;
use crate::message::Message;
use crate::message_functions::{
    body::Body,
    body_batch::{BatchStatement, BatchType, BodyBatch},
    query_value::QueryValue,
};
use crate::serializer::Serializer;
use log::{debug, info};
use std::time::{Duration, Instant};

// Una operación encolada, ya serializada
#[derive(Debug, Clone, PartialEq, Eq)]
enum Mutacion {
    Insercion {
        key: Vec<u8>,
        column_family: String,
        name: Vec<u8>,
        value: Vec<u8>,
        clock: i64,
    },
    Borrado {
        key: Vec<u8>,
        column_family: String,
        name: Vec<u8>,
        clock: i64,
    },
}

impl Mutacion {
    fn sentencia(self, keyspace: &str) -> BatchStatement {
        match self {
            Mutacion::Insercion {
                key,
                column_family,
                name,
                value,
                clock,
            } => BatchStatement {
                query_string: cql::insert(keyspace, &column_family, clock),
                values: vec![
                    QueryValue::new(key),
                    QueryValue::new(name),
                    QueryValue::new(value),
                ],
            },
            Mutacion::Borrado {
                key,
                column_family,
                name,
                clock,
            } => BatchStatement {
                query_string: cql::delete(keyspace, &column_family, clock),
                values: vec![QueryValue::new(key), QueryValue::new(name)],
            },
        }
    }
}

/// Resultado de ejecutar mutaciones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationResult {
    pub operaciones: usize,   // Cantidad de operaciones aplicadas
    pub tiempo: Duration,     // Tiempo del request
    pub host: Option<String>, // Endpoint que lo atendió; None si no hubo request
}

/// Acumula inserciones y borrados y los manda juntos en un BATCH.
/// Nada de lo encolado es visible hasta `execute`.
pub struct Mutator<KS, NS, VS> {
    keyspace: Keyspace,
    key_serializer: KS,
    name_serializer: NS,
    value_serializer: VS,
    pendientes: Vec<Mutacion>,
}

impl<KS, NS, VS> Mutator<KS, NS, VS>
where
    KS: Serializer,
    NS: Serializer,
    VS: Serializer,
{
    pub fn new(
        keyspace: &Keyspace,
        key_serializer: KS,
        name_serializer: NS,
        value_serializer: VS,
    ) -> Self {
        Mutator {
            keyspace: keyspace.clone(),
            key_serializer,
            name_serializer,
            value_serializer,
            pendientes: vec![],
        }
    }

    fn insercion(
        &self,
        key: &KS::Value,
        column_family: &str,
        column: &Column<NS::Value, VS::Value>,
    ) -> Mutacion {
        Mutacion::Insercion {
            key: self.key_serializer.to_bytes(key),
            column_family: column_family.to_string(),
            name: self.name_serializer.to_bytes(&column.name),
            value: self.value_serializer.to_bytes(&column.value),
            clock: column.clock,
        }
    }

    // El clock del borrado se toma al encolarlo
    fn borrado(&self, key: &KS::Value, column_family: &str, name: &NS::Value) -> Mutacion {
        Mutacion::Borrado {
            key: self.key_serializer.to_bytes(key),
            column_family: column_family.to_string(),
            name: self.name_serializer.to_bytes(name),
            clock: self.keyspace.create_clock(),
        }
    }

    pub fn add_insertion(
        &mut self,
        key: &KS::Value,
        column_family: &str,
        column: Column<NS::Value, VS::Value>,
    ) -> &mut Self {
        let mutacion = self.insercion(key, column_family, &column);
        self.pendientes.push(mutacion);
        self
    }

    pub fn add_deletion(
        &mut self,
        key: &KS::Value,
        column_family: &str,
        name: &NS::Value,
    ) -> &mut Self {
        let mutacion = self.borrado(key, column_family, name);
        self.pendientes.push(mutacion);
        self
    }

    pub fn pending(&self) -> usize {
        self.pendientes.len()
    }

    /// Manda todo lo encolado en un único BATCH logged. Con la cola vacía no
    /// hay request. Si falla, la cola queda como estaba.
    pub fn execute(&mut self) -> Result<MutationResult, ErrorType> {
        if self.pendientes.is_empty() {
            return Ok(MutationResult {
                operaciones: 0,
                tiempo: Duration::ZERO,
                host: None,
            });
        }

        let operaciones = self.pendientes.len();
        let statements = self
            .pendientes
            .iter()
            .cloned()
            .map(|mutacion| mutacion.sentencia(self.keyspace.keyspace_name()))
            .collect();
        let batch = BodyBatch::new(BatchType::Logged, statements, self.keyspace.consistency());

        let inicio = Instant::now();
        let (respuesta, host) = self.keyspace.cluster().batch(batch)?;
        esperar_void(&respuesta)?;
        let tiempo = inicio.elapsed();

        self.pendientes.clear();
        info!(
            "Batch de {} operaciones en {} aplicado por {} ({:?})",
            operaciones,
            self.keyspace.keyspace_name(),
            host,
            tiempo
        );
        Ok(MutationResult {
            operaciones,
            tiempo,
            host: Some(host),
        })
    }

    /// Inserta una columna en el momento, sin pasar por la cola.
    pub fn insert(
        &self,
        key: &KS::Value,
        column_family: &str,
        column: Column<NS::Value, VS::Value>,
    ) -> Result<MutationResult, ErrorType> {
        let mutacion = self.insercion(key, column_family, &column);
        self.ejecutar_una(mutacion)
    }

    /// Borra una columna en el momento, sin pasar por la cola.
    pub fn delete(
        &self,
        key: &KS::Value,
        column_family: &str,
        name: &NS::Value,
    ) -> Result<MutationResult, ErrorType> {
        let mutacion = self.borrado(key, column_family, name);
        self.ejecutar_una(mutacion)
    }

    fn ejecutar_una(&self, mutacion: Mutacion) -> Result<MutationResult, ErrorType> {
        let statement = mutacion.sentencia(self.keyspace.keyspace_name());
        let inicio = Instant::now();
        let (respuesta, host) = self.keyspace.cluster().query(
            statement.query_string,
            statement.values,
            self.keyspace.consistency(),
        )?;
        esperar_void(&respuesta)?;
        let tiempo = inicio.elapsed();
        debug!("Mutación aplicada por {} ({:?})", host, tiempo);
        Ok(MutationResult {
            operaciones: 1,
            tiempo,
            host: Some(host),
        })
    }
}

fn esperar_void(respuesta: &Message) -> Result<(), ErrorType> {
    match &respuesta.body {
        Body::Void(_) => Ok(()),
        other => Err(ErrorType::Protocol(format!(
            "Se esperaba un resultado Void, llegó {:?}",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deletion_binds_key_and_name_only() {
        let statement = Mutacion::Borrado {
            key: b"dhydrated".to_vec(),
            column_family: "Users".to_string(),
            name: b"email".to_vec(),
            clock: 7,
        }
        .sentencia("Keyspace2");
        assert!(statement.query_string.contains("USING TIMESTAMP 7"));
        assert_eq!(
            statement.values,
            vec![
                QueryValue::new(b"dhydrated".to_vec()),
                QueryValue::new(b"email".to_vec())
            ]
        );
    }

    #[test]
    fn insertion_binds_key_name_and_value() {
        let statement = Mutacion::Insercion {
            key: b"cassandra".to_vec(),
            column_family: "Users".to_string(),
            name: b"firstname".to_vec(),
            value: b"cassandra".to_vec(),
            clock: 9,
        }
        .sentencia("Keyspace2");
        assert!(statement.query_string.starts_with("INSERT INTO \"Keyspace2\".\"Users\""));
        assert_eq!(statement.values.len(), 3);
    }
}
