// column_query.rs
use crate::cluster_functions::cql;
use crate::column::Column;
use crate::error::ErrorType;
use crate::keyspace::Keyspace;
use crate::message_functions::{body::Body, body_rows::BodyRows, query_value::QueryValue};
use crate::serializer::Serializer;
use log::debug;
use std::time::{Duration, Instant};

/// Resultado de una lectura, con el endpoint que la respondió.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryResult<T> {
    pub value: T,
    pub tiempo: Duration,
    pub host: String,
}

impl<T> QueryResult<T> {
    pub fn get(&self) -> &T {
        &self.value
    }

    pub fn into_value(self) -> T {
        self.value
    }
}

/// Lectura puntual de una columna por (clave, column family, nombre).
/// Se puede reutilizar cambiando cualquiera de los tres campos.
pub struct ColumnQuery<KS: Serializer, NS: Serializer, VS: Serializer> {
    keyspace: Keyspace,
    key_serializer: KS,
    name_serializer: NS,
    value_serializer: VS,
    key: Option<KS::Value>,
    column_family: Option<String>,
    name: Option<NS::Value>,
}

impl<KS, NS, VS> ColumnQuery<KS, NS, VS>
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
        ColumnQuery {
            keyspace: keyspace.clone(),
            key_serializer,
            name_serializer,
            value_serializer,
            key: None,
            column_family: None,
            name: None,
        }
    }

    pub fn set_key(&mut self, key: KS::Value) -> &mut Self {
        self.key = Some(key);
        self
    }

    pub fn set_column_family(&mut self, column_family: &str) -> &mut Self {
        self.column_family = Some(column_family.to_string());
        self
    }

    pub fn set_name(&mut self, name: NS::Value) -> &mut Self {
        self.name = Some(name);
        self
    }

    /// Ejecuta la lectura. Que la fila o la columna no existan no es un
    /// error: el resultado trae `None`.
    pub fn execute(&self) -> Result<QueryResult<Option<Column<NS::Value, VS::Value>>>, ErrorType> {
        let key = self
            .key
            .as_ref()
            .ok_or_else(|| ErrorType::Configuration("ColumnQuery sin clave".to_string()))?;
        let column_family = self.column_family.as_deref().ok_or_else(|| {
            ErrorType::Configuration("ColumnQuery sin column family".to_string())
        })?;
        let name = self
            .name
            .as_ref()
            .ok_or_else(|| ErrorType::Configuration("ColumnQuery sin nombre de columna".to_string()))?;

        let values = vec![
            QueryValue::new(self.key_serializer.to_bytes(key)),
            QueryValue::new(self.name_serializer.to_bytes(name)),
        ];
        let inicio = Instant::now();
        let (respuesta, host) = self.keyspace.cluster().query(
            cql::select_column(self.keyspace.keyspace_name(), column_family),
            values,
            self.keyspace.consistency(),
        )?;
        let tiempo = inicio.elapsed();

        let rows = match respuesta.body {
            Body::Rows(rows) => rows,
            other => {
                return Err(ErrorType::Protocol(format!(
                    "Se esperaban filas, llegó {:?}",
                    other
                )))
            }
        };
        let value = self.leer_columna(&rows)?;
        debug!(
            "Lectura de {}.{} en {}: {}",
            self.keyspace.keyspace_name(),
            column_family,
            host,
            if value.is_some() { "encontrada" } else { "ausente" }
        );
        Ok(QueryResult { value, tiempo, host })
    }

    fn leer_columna(
        &self,
        rows: &BodyRows,
    ) -> Result<Option<Column<NS::Value, VS::Value>>, ErrorType> {
        let Some(row) = rows.rows_content.first() else {
            return Ok(None);
        };
        // column1, value, writetime(value) en ese orden
        let celda = |index: usize| {
            row.values
                .get(index)
                .ok_or_else(|| ErrorType::Protocol(format!("Fila sin la columna {}", index)))
        };

        let name_bytes = celda(0)?
            .as_bytes()
            .ok_or_else(|| ErrorType::Protocol("Nombre de columna nulo".to_string()))?;
        let value_bytes = match celda(1)?.as_bytes() {
            Some(bytes) => bytes,
            // Una celda sin valor es una columna borrada
            None => return Ok(None),
        };
        let clock = celda(2)?.as_bigint()?.unwrap_or_default();

        Ok(Some(Column {
            name: self.name_serializer.from_bytes(name_bytes)?,
            value: self.value_serializer.from_bytes(value_bytes)?,
            clock,
        }))
    }
}
