// error_codes.rs

use crate::error::ErrorType;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    ServerError,
    ProtocolError,
    BadCredentials,
    UnavailableException,
    Overloaded,
    IsBootstrapping,
    TruncateError,
    WriteTimeout,
    ReadTimeout,
    SyntaxError,
    Unauthorized,
    InvalidQuery,
    ConfigError,
    AlreadyExists,
    Unprepared,
    Unknown(u32), // Para cualquier código de error no documentado
}

impl ErrorCode {
    /// Convierte el código `[int]` del frame ERROR en una variante de ErrorCode.
    pub fn from_u32(code: u32) -> Self {
        match code {
            0x0000 => ErrorCode::ServerError,
            0x000A => ErrorCode::ProtocolError,
            0x0100 => ErrorCode::BadCredentials,
            0x1000 => ErrorCode::UnavailableException,
            0x1001 => ErrorCode::Overloaded,
            0x1002 => ErrorCode::IsBootstrapping,
            0x1003 => ErrorCode::TruncateError,
            0x1100 => ErrorCode::WriteTimeout,
            0x1200 => ErrorCode::ReadTimeout,
            0x2000 => ErrorCode::SyntaxError,
            0x2100 => ErrorCode::Unauthorized,
            0x2200 => ErrorCode::InvalidQuery,
            0x2300 => ErrorCode::ConfigError,
            0x2400 => ErrorCode::AlreadyExists,
            0x2500 => ErrorCode::Unprepared,
            _ => ErrorCode::Unknown(code),
        }
    }

    /// Convierte una variante de ErrorCode de nuevo a su representación en el frame.
    pub fn to_u32(&self) -> u32 {
        match *self {
            ErrorCode::ServerError => 0x0000,
            ErrorCode::ProtocolError => 0x000A,
            ErrorCode::BadCredentials => 0x0100,
            ErrorCode::UnavailableException => 0x1000,
            ErrorCode::Overloaded => 0x1001,
            ErrorCode::IsBootstrapping => 0x1002,
            ErrorCode::TruncateError => 0x1003,
            ErrorCode::WriteTimeout => 0x1100,
            ErrorCode::ReadTimeout => 0x1200,
            ErrorCode::SyntaxError => 0x2000,
            ErrorCode::Unauthorized => 0x2100,
            ErrorCode::InvalidQuery => 0x2200,
            ErrorCode::ConfigError => 0x2300,
            ErrorCode::AlreadyExists => 0x2400,
            ErrorCode::Unprepared => 0x2500,
            ErrorCode::Unknown(code) => code, // Devuelve el código directamente si es Unknown
        }
    }

    /// Traduce un ERROR del servidor al tipo de error del cliente.
    ///
    /// El servidor informa con el mismo código (Invalid) tanto una tabla
    /// inexistente como un keyspace inexistente, así que el mensaje decide
    /// cuál de los dos es.
    pub fn into_error(self, message: String) -> ErrorType {
        match self {
            ErrorCode::AlreadyExists => ErrorType::SchemaConflict(message),
            ErrorCode::InvalidQuery | ErrorCode::ConfigError if is_missing_keyspace(&message) => {
                ErrorType::NotFound(message)
            }
            ErrorCode::InvalidQuery
            | ErrorCode::ConfigError
            | ErrorCode::SyntaxError
            | ErrorCode::Unauthorized
            | ErrorCode::Unprepared => ErrorType::Request(message),
            ErrorCode::BadCredentials => ErrorType::Connection(message),
            ErrorCode::ProtocolError => ErrorType::Protocol(message),
            code => ErrorType::Server { code, message },
        }
    }
}

// Sólo las formas que nombran al keyspace como sujeto: "Keyspace x does not
// exist" o "... non existing keyspace x". Un mensaje sobre una tabla puede
// incluir el nombre del keyspace y sigue siendo un request inválido.
fn is_missing_keyspace(message: &str) -> bool {
    let lower = message.trim_start().to_lowercase();
    let sujeto_keyspace = lower.starts_with("keyspace ")
        && (lower.contains("does not exist") || lower.contains("doesn't exist"));
    sujeto_keyspace || lower.contains("non existing keyspace")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unconfigured_table_is_request_error() {
        let err = ErrorCode::from_u32(0x2200).into_error("unconfigured table disabled".into());
        assert!(matches!(err, ErrorType::Request(_)));
    }

    #[test]
    fn missing_keyspace_is_not_found() {
        let err = ErrorCode::InvalidQuery.into_error("Keyspace 'Keyspace2' does not exist".into());
        assert!(matches!(err, ErrorType::NotFound(_)));

        let err = ErrorCode::ConfigError
            .into_error("Cannot drop non existing keyspace 'Keyspace2'.".into());
        assert!(matches!(err, ErrorType::NotFound(_)));
    }

    #[test]
    fn missing_table_naming_its_keyspace_is_request_error() {
        let err = ErrorCode::InvalidQuery.into_error("table Keyspace2.disabled does not exist".into());
        assert!(matches!(err, ErrorType::Request(_)), "{err:?}");

        let err = ErrorCode::InvalidQuery.into_error("Table Keyspace2.Users does not exist".into());
        assert!(matches!(err, ErrorType::Request(_)), "{err:?}");

        let err = ErrorCode::ConfigError
            .into_error("Cannot drop non existing table 'disabled' in keyspace 'Keyspace2'.".into());
        assert!(matches!(err, ErrorType::Request(_)), "{err:?}");
    }

    #[test]
    fn missing_keyspace_without_quotes_is_not_found() {
        let err = ErrorCode::InvalidQuery.into_error("Keyspace keyspace2 doesn't exist".into());
        assert!(matches!(err, ErrorType::NotFound(_)), "{err:?}");
    }

    #[test]
    fn already_exists_is_schema_conflict() {
        let err = ErrorCode::AlreadyExists.into_error("Keyspace x already exists".into());
        assert!(matches!(err, ErrorType::SchemaConflict(_)));
    }

    #[test]
    fn timeouts_stay_server_errors() {
        let err = ErrorCode::from_u32(0x1200).into_error("timeout".into());
        match err {
            ErrorType::Server { code, .. } => assert_eq!(code, ErrorCode::ReadTimeout),
            other => panic!("se esperaba Server, llegó {other:?}"),
        }
    }

    #[test]
    fn unknown_code_keeps_its_value() {
        assert_eq!(ErrorCode::from_u32(0x7777).to_u32(), 0x7777);
    }
}
