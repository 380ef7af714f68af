// error.rs

use crate::error_codes::ErrorCode;
use std::io;
use thiserror::Error;

// Define los tipos de errores que ve quien usa el cliente
#[derive(Debug, Error)]
pub enum ErrorType {
    #[error("Error de conexión: {0}")]
    Connection(String),
    #[error("Conflicto de esquema: {0}")]
    SchemaConflict(String),
    #[error("No encontrado: {0}")]
    NotFound(String),
    #[error("Error de configuración: {0}")]
    Configuration(String),
    #[error("Request inválido: {0}")]
    Request(String),
    #[error("Error de protocolo: {0}")]
    Protocol(String),
    #[error("Error del servidor ({code:?}): {message}")]
    Server { code: ErrorCode, message: String },
}

impl ErrorType {
    /// Indica si el error deja inutilizable la conexión actual.
    pub fn is_connection_error(&self) -> bool {
        matches!(self, ErrorType::Connection(_) | ErrorType::Protocol(_))
    }
}

// Los errores de E/S que vienen del codec o del socket
impl From<io::Error> for ErrorType {
    fn from(e: io::Error) -> Self {
        match e.kind() {
            io::ErrorKind::InvalidData | io::ErrorKind::UnexpectedEof => {
                ErrorType::Protocol(e.to_string())
            }
            _ => ErrorType::Connection(e.to_string()),
        }
    }
}
