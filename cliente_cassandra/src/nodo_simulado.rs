// nodo_simulado.rs
use crate::cluster_functions::replication_class::ReplicationClass;
use crate::conexion::Credenciales;
use crate::error_codes::ErrorCode;
use crate::message::{self, Message};
use crate::message_functions::{
    body::Body,
    body_authenticate::PASSWORD_AUTHENTICATOR,
    body_batch::BodyBatch,
    body_error::BodyError,
    body_query::BodyQuery,
    body_rows::BodyRows,
    change_type::ChangeType,
    column_spec::ColumnType,
    metadata::Metadata,
    query_value::QueryValue,
    row_content::RowContent,
    schema_change::SchemaChange,
    target::Target,
    value::{encode_text_map, Value},
};
use crate::nodo_simulado_functions::{
    almacenamiento::{Almacenamiento, Celda},
    sentencia::{parsear, Sentencia},
};
use byteorder::{BigEndian, ReadBytesExt};
use chrono::Utc;
use log::{debug, info};
use std::io;

/// Estado de una conexión abierta contra el nodo.
#[derive(Debug, Default)]
pub struct Sesion {
    iniciada: bool,
    autenticada: bool,
}

// Mutación validada, lista para aplicar
struct MutacionValidada {
    keyspace: String,
    tabla: String,
    key: Vec<u8>,
    columna: Vec<u8>,
    celda: Celda,
}

/// Un nodo en memoria que habla el mismo protocolo que el cluster: recibe
/// frames de request y devuelve frames de respuesta.
#[derive(Debug, Default)]
pub struct NodoSimulado {
    almacenamiento: Almacenamiento,
    credenciales: Option<Credenciales>,
}

fn error_servidor(e: io::Error) -> BodyError {
    BodyError::new(ErrorCode::ServerError, e.to_string())
}

fn keyspace_inexistente(keyspace: &str) -> BodyError {
    BodyError::new(
        ErrorCode::InvalidQuery,
        format!("Keyspace '{}' does not exist", keyspace),
    )
}

fn clock_actual() -> i64 {
    Utc::now().timestamp_micros()
}

impl NodoSimulado {
    pub fn new() -> Self {
        Self::default()
    }

    /// Exige autenticación con estas credenciales.
    pub fn with_credentials(mut self, credenciales: Credenciales) -> Self {
        self.credenciales = Some(credenciales);
        self
    }

    pub fn existe_keyspace(&self, keyspace: &str) -> bool {
        self.almacenamiento.keyspace(keyspace).is_some()
    }

    /// Procesa un frame completo y devuelve el frame de respuesta.
    pub fn procesar_frame(&mut self, frame: &[u8], sesion: &mut Sesion) -> io::Result<Vec<u8>> {
        let stream = frame
            .get(2..4)
            .map(|mut bytes| bytes.read_u16::<BigEndian>())
            .transpose()?
            .unwrap_or_default();

        let mut respuesta = match Message::deserialize(&mut &frame[..]) {
            Ok(request) => self.responder(request, sesion),
            Err(e) => message::create_error_message(BodyError::new(
                ErrorCode::ProtocolError,
                format!("Frame inválido: {}", e),
            )),
        };
        respuesta.stream = stream;
        respuesta.serialize()
    }

    fn responder(&mut self, request: Message, sesion: &mut Sesion) -> Message {
        let resultado = match request.body {
            Body::Startup(_) => Ok(self.startup(sesion)),
            Body::AuthResponse(token) => {
                let credenciales = token.plain_credentials();
                self.autenticar(credenciales, sesion)
            }
            Body::Query(query) if self.lista(sesion) => self.ejecutar_query(&query),
            Body::Batch(batch) if self.lista(sesion) => self.ejecutar_batch(&batch),
            Body::Query(_) | Body::Batch(_) => Err(BodyError::new(
                ErrorCode::ProtocolError,
                "Unexpected message, expecting STARTUP or AUTH_RESPONSE",
            )),
            other => Err(BodyError::new(
                ErrorCode::ProtocolError,
                format!("Mensaje inesperado del cliente: {:?}", other),
            )),
        };
        resultado.unwrap_or_else(|error| {
            debug!("Nodo simulado responde ERROR {:?}: {}", error.code, error.message);
            message::create_error_message(error)
        })
    }

    fn lista(&self, sesion: &Sesion) -> bool {
        sesion.iniciada && (self.credenciales.is_none() || sesion.autenticada)
    }

    fn startup(&mut self, sesion: &mut Sesion) -> Message {
        sesion.iniciada = true;
        match self.credenciales {
            Some(_) => message::create_request_authenticate_message(PASSWORD_AUTHENTICATOR),
            None => message::create_ready_message(),
        }
    }

    fn autenticar(
        &mut self,
        recibidas: Option<(String, String)>,
        sesion: &mut Sesion,
    ) -> Result<Message, BodyError> {
        let esperadas = self
            .credenciales
            .as_ref()
            .map(|c| (c.user.clone(), c.password.clone()));
        if !sesion.iniciada || esperadas.is_none() {
            return Err(BodyError::new(
                ErrorCode::ProtocolError,
                "AUTH_RESPONSE sin AUTHENTICATE previo",
            ));
        }
        if recibidas != esperadas {
            return Err(BodyError::new(
                ErrorCode::BadCredentials,
                "Provided username and/or password are incorrect",
            ));
        }
        sesion.autenticada = true;
        Ok(message::create_response_auth_success())
    }

    fn ejecutar_query(&mut self, query: &BodyQuery) -> Result<Message, BodyError> {
        let sentencia = parsear(&query.query_string)?;
        let values = &query.parameters.values;
        validar_marcadores(&sentencia, values)?;

        match sentencia {
            Sentencia::CreateKeyspace {
                keyspace,
                replication,
            } => self.create_keyspace(keyspace, replication),
            Sentencia::CreateTable { keyspace, tabla } => self.create_table(keyspace, tabla),
            Sentencia::DropKeyspace { keyspace } => {
                if !self.almacenamiento.borrar_keyspace(&keyspace) {
                    return Err(BodyError::new(
                        ErrorCode::ConfigError,
                        format!("Cannot drop non existing keyspace '{}'.", keyspace),
                    ));
                }
                info!("Nodo simulado: keyspace {} eliminado", keyspace);
                Ok(cambio_esquema(ChangeType::Dropped, Target::Keyspace, keyspace, None))
            }
            Sentencia::DropTable { keyspace, tabla } => {
                if !self.existe_keyspace(&keyspace) {
                    return Err(keyspace_inexistente(&keyspace));
                }
                if !self.almacenamiento.borrar_column_family(&keyspace, &tabla) {
                    return Err(BodyError::new(
                        ErrorCode::ConfigError,
                        format!(
                            "Cannot drop non existing table '{}' in keyspace '{}'.",
                            tabla, keyspace
                        ),
                    ));
                }
                Ok(cambio_esquema(
                    ChangeType::Dropped,
                    Target::Table,
                    keyspace,
                    Some(tabla),
                ))
            }
            Sentencia::Select { keyspace, tabla } => self.select(&keyspace, &tabla, values),
            Sentencia::DescribeKeyspace => self.describe_keyspace(values),
            mutacion => {
                let default_clock = query.parameters.timestamp.unwrap_or_else(clock_actual);
                let validada = self.validar_mutacion(mutacion, values, default_clock)?;
                self.aplicar(validada);
                Ok(message::create_void_message())
            }
        }
    }

    // Se valida todo el batch antes de aplicar nada
    fn ejecutar_batch(&mut self, batch: &BodyBatch) -> Result<Message, BodyError> {
        let default_clock = batch.timestamp.unwrap_or_else(clock_actual);
        let mut validadas = Vec::with_capacity(batch.statements.len());
        for statement in &batch.statements {
            let sentencia = parsear(&statement.query_string)?;
            if !sentencia.es_mutacion() {
                return Err(BodyError::new(
                    ErrorCode::InvalidQuery,
                    "Only INSERT, UPDATE, and DELETE statements are allowed in BATCH",
                ));
            }
            validar_marcadores(&sentencia, &statement.values)?;
            validadas.push(self.validar_mutacion(sentencia, &statement.values, default_clock)?);
        }

        let cantidad = validadas.len();
        for validada in validadas {
            self.aplicar(validada);
        }
        debug!("Nodo simulado: batch de {} mutaciones aplicado", cantidad);
        Ok(message::create_void_message())
    }

    fn create_keyspace(
        &mut self,
        keyspace: String,
        replication: Vec<(String, String)>,
    ) -> Result<Message, BodyError> {
        // El esquema guarda la clase con el nombre completo
        let mut normalizada = vec![];
        for (clave, valor) in replication {
            if clave == "class" {
                normalizada.push((clave, ReplicationClass::from_class(&valor).qualified_name()));
            } else {
                normalizada.push((clave, valor));
            }
        }
        if !normalizada.iter().any(|(clave, _)| clave == "class") {
            return Err(BodyError::new(
                ErrorCode::ConfigError,
                "Missing mandatory replication strategy class",
            ));
        }

        if !self.almacenamiento.crear_keyspace(&keyspace, normalizada) {
            return Err(BodyError::already_exists(
                format!("Cannot add existing keyspace \"{}\"", keyspace),
                &keyspace,
                "",
            )
            .map_err(error_servidor)?);
        }
        info!("Nodo simulado: keyspace {} creado", keyspace);
        Ok(cambio_esquema(ChangeType::Created, Target::Keyspace, keyspace, None))
    }

    fn create_table(&mut self, keyspace: String, tabla: String) -> Result<Message, BodyError> {
        match self.almacenamiento.crear_column_family(&keyspace, &tabla) {
            None => Err(keyspace_inexistente(&keyspace)),
            Some(false) => Err(BodyError::already_exists(
                format!(
                    "Cannot add already existing table \"{}\" to keyspace \"{}\"",
                    tabla, keyspace
                ),
                &keyspace,
                &tabla,
            )
            .map_err(error_servidor)?),
            Some(true) => Ok(cambio_esquema(
                ChangeType::Created,
                Target::Table,
                keyspace,
                Some(tabla),
            )),
        }
    }

    fn verificar_tabla(&self, keyspace: &str, tabla: &str) -> Result<(), BodyError> {
        if self.almacenamiento.keyspace(keyspace).is_none() {
            return Err(keyspace_inexistente(keyspace));
        }
        if !self.almacenamiento.existe_column_family(keyspace, tabla) {
            return Err(BodyError::new(
                ErrorCode::InvalidQuery,
                format!("unconfigured table {}", tabla),
            ));
        }
        Ok(())
    }

    fn validar_mutacion(
        &self,
        sentencia: Sentencia,
        values: &[QueryValue],
        default_clock: i64,
    ) -> Result<MutacionValidada, BodyError> {
        let (keyspace, tabla, clock, valor) = match sentencia {
            Sentencia::Insert {
                keyspace,
                tabla,
                clock,
            } => {
                // Insertar null equivale a borrar
                let valor = values.get(2).and_then(|v| v.value.clone());
                (keyspace, tabla, clock, valor)
            }
            Sentencia::Delete {
                keyspace,
                tabla,
                clock,
            } => (keyspace, tabla, clock, None),
            other => {
                return Err(BodyError::new(
                    ErrorCode::InvalidQuery,
                    format!("{:?} no es una mutación", other),
                ))
            }
        };
        self.verificar_tabla(&keyspace, &tabla)?;

        let key = valor_no_nulo(values, 0, "Invalid null value for partition key part key")?;
        let columna =
            valor_no_nulo(values, 1, "Invalid null value for clustering key part column1")?;
        Ok(MutacionValidada {
            keyspace,
            tabla,
            key,
            columna,
            celda: Celda {
                valor,
                clock: clock.unwrap_or(default_clock),
            },
        })
    }

    fn aplicar(&mut self, mutacion: MutacionValidada) {
        self.almacenamiento.aplicar(
            &mutacion.keyspace,
            &mutacion.tabla,
            &mutacion.key,
            &mutacion.columna,
            mutacion.celda,
        );
    }

    fn select(
        &self,
        keyspace: &str,
        tabla: &str,
        values: &[QueryValue],
    ) -> Result<Message, BodyError> {
        self.verificar_tabla(keyspace, tabla)?;
        let key = valor_no_nulo(values, 0, "Invalid null value for partition key part key")?;
        let columna = valor_no_nulo(values, 1, "Invalid null value in condition for column column1")?;

        let mut rows_content = vec![];
        if let Some((valor, clock)) = self.almacenamiento.leer(keyspace, tabla, &key, &columna) {
            rows_content.push(RowContent {
                values: vec![
                    Value::new(columna.clone()),
                    Value::new(valor.to_vec()),
                    Value::new(clock.to_be_bytes().to_vec()),
                ],
            });
        }
        let metadata = Metadata::for_table(
            keyspace,
            tabla,
            vec![
                ("column1".to_string(), ColumnType::Blob),
                ("value".to_string(), ColumnType::Blob),
                ("writetime(value)".to_string(), ColumnType::Bigint),
            ],
        );
        Ok(message::create_rows_message(BodyRows {
            metadata,
            rows_content,
        }))
    }

    fn describe_keyspace(&self, values: &[QueryValue]) -> Result<Message, BodyError> {
        let nombre = valor_no_nulo(values, 0, "Invalid null value for keyspace_name")?;
        let nombre = String::from_utf8(nombre)
            .map_err(|_| BodyError::new(ErrorCode::InvalidQuery, "keyspace_name no es UTF-8"))?;

        let mut rows_content = vec![];
        if let Some(keyspace) = self.almacenamiento.keyspace(&nombre) {
            let replication = encode_text_map(&keyspace.replication).map_err(error_servidor)?;
            rows_content.push(RowContent {
                values: vec![Value::new(nombre.clone().into_bytes()), Value::new(replication)],
            });
        }
        let metadata = Metadata::for_table(
            "system_schema",
            "keyspaces",
            vec![
                ("keyspace_name".to_string(), ColumnType::Varchar),
                (
                    "replication".to_string(),
                    ColumnType::Map(Box::new(ColumnType::Varchar), Box::new(ColumnType::Varchar)),
                ),
            ],
        );
        Ok(message::create_rows_message(BodyRows {
            metadata,
            rows_content,
        }))
    }
}

fn validar_marcadores(sentencia: &Sentencia, values: &[QueryValue]) -> Result<(), BodyError> {
    if sentencia.marcadores() != values.len() {
        return Err(BodyError::new(
            ErrorCode::InvalidQuery,
            format!(
                "There were {} markers(?) in CQL but {} bound variables",
                sentencia.marcadores(),
                values.len()
            ),
        ));
    }
    Ok(())
}

fn valor_no_nulo(values: &[QueryValue], index: usize, mensaje: &str) -> Result<Vec<u8>, BodyError> {
    values
        .get(index)
        .and_then(|v| v.value.clone())
        .ok_or_else(|| BodyError::new(ErrorCode::InvalidQuery, mensaje))
}

fn cambio_esquema(
    change_type: ChangeType,
    target: Target,
    keyspace: String,
    table_or_type: Option<String>,
) -> Message {
    message::create_schema_change_message(SchemaChange {
        change_type,
        target,
        keyspace,
        table_or_type,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message_functions::{consistency::Consistency, query_parameters::QueryParameters};

    fn enviar(nodo: &mut NodoSimulado, sesion: &mut Sesion, request: Message) -> Message {
        let bytes = request.serialize().unwrap();
        let respuesta = nodo.procesar_frame(&bytes, sesion).unwrap();
        Message::deserialize(&mut respuesta.as_slice()).unwrap()
    }

    fn query(texto: &str, values: Vec<QueryValue>) -> Message {
        message::create_query_message(
            texto.to_string(),
            QueryParameters::new(Consistency::One, values),
        )
    }

    fn codigo_error(respuesta: &Message) -> Option<ErrorCode> {
        match &respuesta.body {
            Body::Error(error) => Some(error.code),
            _ => None,
        }
    }

    #[test]
    fn query_before_startup_is_protocol_error() {
        let mut nodo = NodoSimulado::new();
        let mut sesion = Sesion::default();
        let respuesta = enviar(&mut nodo, &mut sesion, query("DROP KEYSPACE ks", vec![]));
        assert_eq!(codigo_error(&respuesta), Some(ErrorCode::ProtocolError));
    }

    #[test]
    fn response_keeps_request_stream() {
        let mut nodo = NodoSimulado::new();
        let mut sesion = Sesion::default();
        let mut startup = message::create_startup_message();
        startup.stream = 42;
        let respuesta = enviar(&mut nodo, &mut sesion, startup);
        assert_eq!(respuesta.stream, 42);
        assert_eq!(respuesta.body, Body::Ready);
    }

    #[test]
    fn wrong_password_is_bad_credentials() {
        let credenciales = Credenciales {
            user: "cassandra".to_string(),
            password: "cassandra".to_string(),
        };
        let mut nodo = NodoSimulado::new().with_credentials(credenciales);
        let mut sesion = Sesion::default();
        let respuesta = enviar(&mut nodo, &mut sesion, message::create_startup_message());
        assert!(matches!(respuesta.body, Body::Authenticate(_)));

        let respuesta = enviar(
            &mut nodo,
            &mut sesion,
            message::create_response_auth_response("cassandra", "otra"),
        );
        assert_eq!(codigo_error(&respuesta), Some(ErrorCode::BadCredentials));

        let respuesta = enviar(
            &mut nodo,
            &mut sesion,
            message::create_response_auth_response("cassandra", "cassandra"),
        );
        assert!(matches!(respuesta.body, Body::AuthSuccess(_)));
    }

    #[test]
    fn batch_with_unknown_table_applies_nothing() {
        use crate::message_functions::body_batch::{BatchStatement, BatchType};

        let mut nodo = NodoSimulado::new();
        let mut sesion = Sesion::default();
        enviar(&mut nodo, &mut sesion, message::create_startup_message());
        enviar(
            &mut nodo,
            &mut sesion,
            query(
                "CREATE KEYSPACE ks WITH replication = {'class': 'SimpleStrategy', 'replication_factor': '1'}",
                vec![],
            ),
        );
        enviar(
            &mut nodo,
            &mut sesion,
            query(
                "CREATE TABLE ks.cf (key blob, column1 blob, value blob, PRIMARY KEY (key, column1))",
                vec![],
            ),
        );

        let insert = |tabla: &str| BatchStatement {
            query_string: format!(
                "INSERT INTO ks.{} (key, column1, value) VALUES (?, ?, ?) USING TIMESTAMP 1",
                tabla
            ),
            values: vec![
                QueryValue::new(b"k".to_vec()),
                QueryValue::new(b"c".to_vec()),
                QueryValue::new(b"v".to_vec()),
            ],
        };
        let batch = BodyBatch::new(
            BatchType::Logged,
            vec![insert("cf"), insert("otra")],
            Consistency::One,
        );
        let respuesta = enviar(&mut nodo, &mut sesion, message::create_batch_message(batch));
        assert_eq!(codigo_error(&respuesta), Some(ErrorCode::InvalidQuery));
        assert_eq!(nodo.almacenamiento.leer("ks", "cf", b"k", b"c"), None);
    }

    #[test]
    fn garbage_frame_gets_protocol_error() {
        let mut nodo = NodoSimulado::new();
        let mut sesion = Sesion::default();
        let frame = [0x03, 0x00, 0x00, 0x07, 0x55, 0, 0, 0, 0];
        let respuesta = nodo.procesar_frame(&frame, &mut sesion).unwrap();
        let respuesta = Message::deserialize(&mut respuesta.as_slice()).unwrap();
        assert_eq!(respuesta.stream, 7);
        assert_eq!(codigo_error(&respuesta), Some(ErrorCode::ProtocolError));
    }
}
