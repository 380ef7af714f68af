// message.rs
use crate::message_functions::{
    body::Body, body_auth_token_maybe_empty::BodyAuthTokenMaybeEmpty,
    body_authenticate::BodyAuthenticate, body_batch::BodyBatch, body_error::BodyError,
    body_query::BodyQuery, body_rows::BodyRows, body_startup::BodyStartup, body_void::BodyVoid,
    query_parameters::QueryParameters, schema_change::SchemaChange,
};
use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use std::io::{self, Read};

pub const VERSION_REQUEST: u8 = 0x03; //03 -> 00000011, el primer 0 nos define una solicitud
pub const VERSION_RESPONSE: u8 = 0x83; //83 -> 10000011, el primer 1 nos define un responde

pub const OPCODE_ERROR: u8 = 0x00;
pub const OPCODE_STARTUP: u8 = 0x01;
pub const OPCODE_READY: u8 = 0x02;
pub const OPCODE_AUTHENTICATE: u8 = 0x03;
pub const OPCODE_QUERY: u8 = 0x07;
pub const OPCODE_RESULT: u8 = 0x08;
pub const OPCODE_BATCH: u8 = 0x0D;
pub const OPCODE_AUTH_CHALLENGE: u8 = 0x0E;
pub const OPCODE_AUTH_RESPONSE: u8 = 0x0F;
pub const OPCODE_AUTH_SUCCESS: u8 = 0x10;

pub const HEADER_LEN: usize = 9;
// Límite del protocolo para el cuerpo de un frame
pub const MAX_BODY_LEN: u32 = 256 * 1024 * 1024;

const FLAG_COMPRESSION: u8 = 0x01;
const FLAG_TRACING: u8 = 0x02;
const TRACING_ID_LEN: usize = 16;

const RESULT_VOID: u32 = 0x0001;
const RESULT_ROWS: u32 = 0x0002;
const RESULT_SCHEMA_CHANGE: u32 = 0x0005;

#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub version: u8, // Versión del protocolo
    pub flags: u8,   // Flags del frame
    pub stream: u16, // ID del stream
    pub opcode: u8,  // Código de operación (ej: QUERY)
    pub body: Body,  // Cuerpo del mensaje como enum Body
}

impl Message {
    pub fn new(version: u8, opcode: u8, body: Body) -> Self {
        Self {
            version,
            flags: 0x00,
            stream: 0x0001,
            opcode,
            body,
        }
    }

    pub fn is_response(&self) -> bool {
        self.version & 0x80 != 0
    }

    pub fn serialize(&self) -> io::Result<Vec<u8>> {
        let body_bytes = self.body.serialize()?;
        let length = u32::try_from(body_bytes.len())
            .ok()
            .filter(|len| *len <= MAX_BODY_LEN)
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "Cuerpo del frame demasiado grande"))?;

        let mut message = Vec::with_capacity(HEADER_LEN + body_bytes.len());
        message.push(self.version);
        message.push(self.flags);
        message.write_u16::<BigEndian>(self.stream)?;
        message.push(self.opcode);
        message.write_u32::<BigEndian>(length)?;
        message.extend(body_bytes);
        Ok(message)
    }

    fn deserialize_result_kind(body_bytes: &[u8]) -> io::Result<Body> {
        let kind = (&body_bytes[..]).read_u32::<BigEndian>()?;
        match kind {
            RESULT_VOID => Ok(Body::Void(BodyVoid)),
            RESULT_ROWS => BodyRows::deserialize(body_bytes).map(Body::Rows),
            RESULT_SCHEMA_CHANGE => SchemaChange::deserialize(body_bytes).map(Body::SchemaChange),
            _ => Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("Unknown result kind: {}", kind),
            )),
        }
    }

    fn deserialize_opcode(opcode: u8, body_bytes: &[u8]) -> io::Result<Body> {
        match opcode {
            OPCODE_STARTUP => BodyStartup::deserialize(body_bytes).map(Body::Startup),
            OPCODE_READY => Ok(Body::Ready),
            OPCODE_AUTHENTICATE => BodyAuthenticate::deserialize(body_bytes).map(Body::Authenticate),
            OPCODE_AUTH_RESPONSE => {
                BodyAuthTokenMaybeEmpty::deserialize(body_bytes).map(Body::AuthResponse)
            }
            OPCODE_AUTH_CHALLENGE => {
                BodyAuthTokenMaybeEmpty::deserialize(body_bytes).map(Body::AuthChallenge)
            }
            OPCODE_AUTH_SUCCESS => {
                BodyAuthTokenMaybeEmpty::deserialize(body_bytes).map(Body::AuthSuccess)
            }
            OPCODE_QUERY => BodyQuery::deserialize(body_bytes).map(Body::Query),
            OPCODE_BATCH => BodyBatch::deserialize(body_bytes).map(Body::Batch),
            OPCODE_RESULT => Self::deserialize_result_kind(body_bytes),
            OPCODE_ERROR => BodyError::deserialize(body_bytes).map(Body::Error),
            _ => Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("Opcode desconocido: {:#04x}", opcode),
            )),
        }
    }

    // Método para deserializar el mensaje desde bytes
    pub fn deserialize(reader: &mut dyn Read) -> io::Result<Self> {
        let mut header = [0; HEADER_LEN];
        reader.read_exact(&mut header)?;

        let version = header[0];
        let flags = header[1];
        let stream = (&header[2..4]).read_u16::<BigEndian>()?;
        let opcode = header[4];
        let length = (&header[5..9]).read_u32::<BigEndian>()?;

        if version & 0x7F != VERSION_REQUEST {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("Versión de protocolo no soportada: {:#04x}", version),
            ));
        }
        if flags & FLAG_COMPRESSION != 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "Frames comprimidos no soportados",
            ));
        }
        if length > MAX_BODY_LEN {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("Cuerpo del frame demasiado grande: {}", length),
            ));
        }

        let mut body_bytes = vec![0; length as usize];
        reader.read_exact(&mut body_bytes)?;

        // Una respuesta con tracing trae el id de la sesión antes del cuerpo
        let body_start = if flags & FLAG_TRACING != 0 && version & 0x80 != 0 {
            TRACING_ID_LEN.min(body_bytes.len())
        } else {
            0
        };
        let body = Self::deserialize_opcode(opcode, &body_bytes[body_start..])?;
        Ok(Self {
            version,
            flags,
            stream,
            opcode,
            body,
        })
    }
}

/// Largo total del primer frame de `buffer`, si ya llegó el header completo.
pub fn frame_len(buffer: &[u8]) -> Option<usize> {
    if buffer.len() < HEADER_LEN {
        return None;
    }
    let length = (&buffer[5..9]).read_u32::<BigEndian>().ok()?;
    Some(HEADER_LEN + length as usize)
}

/// Crea un mensaje de inicio para establecer una conexión inicial con CQL.
pub fn create_startup_message() -> Message {
    Message::new(
        VERSION_REQUEST,
        OPCODE_STARTUP,
        Body::Startup(BodyStartup::default()),
    )
}

/// Crea un mensaje de tipo `READY` para indicar que el nodo está listo.
pub fn create_ready_message() -> Message {
    Message::new(VERSION_RESPONSE, OPCODE_READY, Body::Ready)
}

pub fn create_request_authenticate_message(authenticator: &str) -> Message {
    Message::new(
        VERSION_RESPONSE,
        OPCODE_AUTHENTICATE,
        Body::Authenticate(BodyAuthenticate {
            authenticator: authenticator.to_string(),
        }),
    )
}

/// Respuesta SASL PLAIN con las credenciales del usuario.
pub fn create_response_auth_response(user: &str, password: &str) -> Message {
    Message::new(
        VERSION_REQUEST,
        OPCODE_AUTH_RESPONSE,
        Body::AuthResponse(BodyAuthTokenMaybeEmpty::plain(user, password)),
    )
}

pub fn create_response_auth_success() -> Message {
    Message::new(
        VERSION_RESPONSE,
        OPCODE_AUTH_SUCCESS,
        Body::AuthSuccess(BodyAuthTokenMaybeEmpty { token: None }),
    )
}

/// Crea un mensaje QUERY con la consulta y sus parámetros.
pub fn create_query_message(query: String, parameters: QueryParameters) -> Message {
    Message::new(
        VERSION_REQUEST,
        OPCODE_QUERY,
        Body::Query(BodyQuery {
            query_string: query,
            parameters,
        }),
    )
}

pub fn create_batch_message(batch: BodyBatch) -> Message {
    Message::new(VERSION_REQUEST, OPCODE_BATCH, Body::Batch(batch))
}

// Genera un mensaje de tipo Void (para consultas que no sean SELECT)
pub fn create_void_message() -> Message {
    Message::new(VERSION_RESPONSE, OPCODE_RESULT, Body::Void(BodyVoid))
}

/// Genera un mensaje de tipo `Rows` para consultas `SELECT`.
pub fn create_rows_message(rows: BodyRows) -> Message {
    Message::new(VERSION_RESPONSE, OPCODE_RESULT, Body::Rows(rows))
}

/// Crea un mensaje de cambio de esquema, como la creación de una tabla.
pub fn create_schema_change_message(schema_change: SchemaChange) -> Message {
    Message::new(
        VERSION_RESPONSE,
        OPCODE_RESULT,
        Body::SchemaChange(schema_change),
    )
}

pub fn create_error_message(error: BodyError) -> Message {
    Message::new(VERSION_RESPONSE, OPCODE_ERROR, Body::Error(error))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error_codes::ErrorCode;
    use crate::message_functions::consistency::Consistency;

    #[test]
    fn header_has_length_of_body() {
        let message = create_query_message(
            "SELECT".to_string(),
            QueryParameters::new(Consistency::One, vec![]),
        );
        let bytes = message.serialize().unwrap();
        assert_eq!(bytes[0], VERSION_REQUEST);
        assert_eq!(bytes[4], OPCODE_QUERY);
        assert_eq!(frame_len(&bytes), Some(bytes.len()));
        // long string (4 + 6) + consistency (2) + flags (1)
        assert_eq!(&bytes[5..9], &13_u32.to_be_bytes());
    }

    #[test]
    fn error_frame_decodes_code_and_message() {
        let message = create_error_message(BodyError::new(
            ErrorCode::InvalidQuery,
            "unconfigured table disabled",
        ));
        let bytes = message.serialize().unwrap();
        let decoded = Message::deserialize(&mut bytes.as_slice()).unwrap();
        assert!(decoded.is_response());
        match decoded.body {
            Body::Error(error) => {
                assert_eq!(error.code, ErrorCode::InvalidQuery);
                assert_eq!(error.message, "unconfigured table disabled");
            }
            other => panic!("se esperaba ERROR, llegó {other:?}"),
        }
    }

    #[test]
    fn rejects_other_protocol_versions() {
        let mut bytes = create_ready_message().serialize().unwrap();
        bytes[0] = 0x84;
        let err = Message::deserialize(&mut bytes.as_slice()).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn skips_tracing_id_in_responses() {
        let mut bytes = create_void_message().serialize().unwrap();
        bytes[1] = FLAG_TRACING;
        let mut with_tracing = bytes[..HEADER_LEN].to_vec();
        with_tracing[5..9].copy_from_slice(&(4_u32 + TRACING_ID_LEN as u32).to_be_bytes());
        with_tracing.extend([0xAB; TRACING_ID_LEN]);
        with_tracing.extend(&bytes[HEADER_LEN..]);
        let decoded = Message::deserialize(&mut with_tracing.as_slice()).unwrap();
        assert_eq!(decoded.body, Body::Void(BodyVoid));
    }

    #[test]
    fn partial_header_has_no_frame_len() {
        assert_eq!(frame_len(&[VERSION_REQUEST, 0, 0]), None);
    }
}
