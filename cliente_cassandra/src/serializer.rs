// serializer.rs
use crate::error::ErrorType;
use byteorder::{BigEndian, ReadBytesExt};

/// Convierte un valor tipado a los bytes que se guardan en el cluster, y de vuelta.
///
/// Claves de fila, nombres de columna y valores pasan todos por un `Serializer`;
/// el cluster sólo ve bytes.
pub trait Serializer {
    type Value;

    fn to_bytes(&self, value: &Self::Value) -> Vec<u8>;

    fn from_bytes(&self, bytes: &[u8]) -> Result<Self::Value, ErrorType>;
}

/// Texto en UTF-8.
#[derive(Debug, Clone, Copy, Default)]
pub struct StringSerializer;

/// Entero de 64 bits, big endian.
#[derive(Debug, Clone, Copy, Default)]
pub struct LongSerializer;

/// Bytes sin transformar.
#[derive(Debug, Clone, Copy, Default)]
pub struct BytesSerializer;

impl Serializer for StringSerializer {
    type Value = String;

    fn to_bytes(&self, value: &String) -> Vec<u8> {
        value.as_bytes().to_vec()
    }

    fn from_bytes(&self, bytes: &[u8]) -> Result<String, ErrorType> {
        String::from_utf8(bytes.to_vec())
            .map_err(|e| ErrorType::Protocol(format!("Texto UTF-8 inválido: {}", e)))
    }
}

impl Serializer for LongSerializer {
    type Value = i64;

    fn to_bytes(&self, value: &i64) -> Vec<u8> {
        value.to_be_bytes().to_vec()
    }

    fn from_bytes(&self, bytes: &[u8]) -> Result<i64, ErrorType> {
        if bytes.len() != 8 {
            return Err(ErrorType::Protocol(format!(
                "Se esperaban 8 bytes para un long, llegaron {}",
                bytes.len()
            )));
        }
        let mut reader = bytes;
        Ok(reader.read_i64::<BigEndian>()?)
    }
}

impl Serializer for BytesSerializer {
    type Value = Vec<u8>;

    fn to_bytes(&self, value: &Vec<u8>) -> Vec<u8> {
        value.clone()
    }

    fn from_bytes(&self, bytes: &[u8]) -> Result<Vec<u8>, ErrorType> {
        Ok(bytes.to_vec())
    }
}
