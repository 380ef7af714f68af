use crate::error_codes::ErrorCode;
use crate::message_functions::primitivas::{read_string, write_string};
use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use std::io;

// Cuerpo de un frame ERROR: <code int><message string>[detalle según el código]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BodyError {
    pub code: ErrorCode,
    pub message: String,
    pub detail: Vec<u8>, // Campos extra (ej: keyspace/tabla de Already_exists), sin interpretar
}

impl BodyError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        BodyError {
            code,
            message: message.into(),
            detail: vec![],
        }
    }

    /// Already_exists lleva el keyspace y la tabla afectados.
    pub fn already_exists(message: impl Into<String>, keyspace: &str, table: &str) -> io::Result<Self> {
        let mut detail = vec![];
        write_string(&mut detail, keyspace)?;
        write_string(&mut detail, table)?;
        Ok(BodyError {
            code: ErrorCode::AlreadyExists,
            message: message.into(),
            detail,
        })
    }

    pub fn serialize(&self) -> io::Result<Vec<u8>> {
        let mut bytes = vec![];
        bytes.write_u32::<BigEndian>(self.code.to_u32())?;
        write_string(&mut bytes, &self.message)?;
        bytes.extend_from_slice(&self.detail);
        Ok(bytes)
    }

    pub fn deserialize(bytes: &[u8]) -> io::Result<Self> {
        let mut reader = bytes;
        let code = ErrorCode::from_u32(reader.read_u32::<BigEndian>()?);
        let message = read_string(&mut reader)?;
        Ok(BodyError {
            code,
            message,
            detail: reader.to_vec(),
        })
    }
}
