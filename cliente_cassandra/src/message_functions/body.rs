use crate::message_functions::{
    body_auth_token_maybe_empty::BodyAuthTokenMaybeEmpty, body_authenticate::BodyAuthenticate,
    body_batch::BodyBatch, body_error::BodyError, body_query::BodyQuery, body_rows::BodyRows,
    body_startup::BodyStartup, body_void::BodyVoid, schema_change::SchemaChange,
};
use std::io;

// Definición del enum Body para manejar los distintos cuerpos de request y respuesta.
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    Startup(BodyStartup), // Mensaje STARTUP
    Ready,                // READY no tiene cuerpo
    Authenticate(BodyAuthenticate),
    AuthResponse(BodyAuthTokenMaybeEmpty), // Respuesta de autenticación
    AuthChallenge(BodyAuthTokenMaybeEmpty),
    AuthSuccess(BodyAuthTokenMaybeEmpty),
    Query(BodyQuery), // Consulta CQL
    Batch(BodyBatch), // Varias sentencias en un solo request
    Void(BodyVoid),
    Rows(BodyRows),
    SchemaChange(SchemaChange),
    Error(BodyError),
}

impl Body {
    pub fn serialize(&self) -> io::Result<Vec<u8>> {
        match self {
            Body::Startup(startup_body) => startup_body.serialize(),
            Body::Ready => Ok(vec![]),
            Body::Authenticate(auth_body) => auth_body.serialize(),
            Body::AuthResponse(auth_body)
            | Body::AuthChallenge(auth_body)
            | Body::AuthSuccess(auth_body) => auth_body.serialize(),
            Body::Query(query_body) => query_body.serialize(),
            Body::Batch(batch_body) => batch_body.serialize(),
            Body::Void(void_body) => Ok(void_body.serialize()),
            Body::Rows(rows_body) => rows_body.serialize(),
            Body::SchemaChange(schema_change) => schema_change.serialize(),
            Body::Error(error_body) => error_body.serialize(),
        }
    }
}
