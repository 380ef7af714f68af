use crate::message_functions::{
    consistency::Consistency,
    primitivas::{read_long_string, write_long_string},
    query_value::QueryValue,
};
use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use std::io::{self, Read};

const KIND_QUERY_STRING: u8 = 0x00;
const KIND_PREPARED: u8 = 0x01;
const FLAG_SERIAL_CONSISTENCY: u8 = 0x10;
const FLAG_DEFAULT_TIMESTAMP: u8 = 0x20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchType {
    Logged = 0x00,
    Unlogged = 0x01,
    Counter = 0x02,
}

impl BatchType {
    pub fn from_u8(value: u8) -> io::Result<Self> {
        match value {
            0x00 => Ok(BatchType::Logged),
            0x01 => Ok(BatchType::Unlogged),
            0x02 => Ok(BatchType::Counter),
            _ => Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("Tipo de batch no válido: {}", value),
            )),
        }
    }
}

// Una sentencia del batch, siempre como texto CQL
#[derive(Debug, Clone, PartialEq)]
pub struct BatchStatement {
    pub query_string: String,
    pub values: Vec<QueryValue>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BodyBatch {
    pub batch_type: BatchType,
    pub statements: Vec<BatchStatement>,
    pub consistency: Consistency,
    pub serial_consistency: Option<Consistency>,
    pub timestamp: Option<i64>,
}

impl BodyBatch {
    pub fn new(batch_type: BatchType, statements: Vec<BatchStatement>, consistency: Consistency) -> Self {
        BodyBatch {
            batch_type,
            statements,
            consistency,
            serial_consistency: None,
            timestamp: None,
        }
    }

    pub fn serialize(&self) -> io::Result<Vec<u8>> {
        let mut bytes = vec![self.batch_type as u8];
        let count = u16::try_from(self.statements.len())
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "Batch demasiado grande"))?;
        bytes.write_u16::<BigEndian>(count)?;

        for statement in &self.statements {
            bytes.push(KIND_QUERY_STRING);
            write_long_string(&mut bytes, &statement.query_string)?;
            let values = u16::try_from(statement.values.len()).map_err(|_| {
                io::Error::new(io::ErrorKind::InvalidInput, "Demasiados valores en la sentencia")
            })?;
            bytes.write_u16::<BigEndian>(values)?;
            for value in &statement.values {
                value.serialize(&mut bytes)?;
            }
        }

        bytes.write_u16::<BigEndian>(self.consistency.as_u16())?;
        let mut flags = 0x00;
        if self.serial_consistency.is_some() {
            flags |= FLAG_SERIAL_CONSISTENCY;
        }
        if self.timestamp.is_some() {
            flags |= FLAG_DEFAULT_TIMESTAMP;
        }
        bytes.push(flags);
        if let Some(serial) = self.serial_consistency {
            bytes.write_u16::<BigEndian>(serial.as_u16())?;
        }
        if let Some(timestamp) = self.timestamp {
            bytes.write_i64::<BigEndian>(timestamp)?;
        }
        Ok(bytes)
    }

    pub fn deserialize(bytes: &[u8]) -> io::Result<Self> {
        let mut reader = bytes;
        let batch_type = BatchType::from_u8(reader.read_u8()?)?;
        let count = reader.read_u16::<BigEndian>()?;

        let mut statements = Vec::with_capacity(count as usize);
        for _ in 0..count {
            statements.push(Self::deserialize_statement(&mut reader)?);
        }

        let consistency = Consistency::from_u16(reader.read_u16::<BigEndian>()?)?;
        let flags = reader.read_u8()?;
        let serial_consistency = if flags & FLAG_SERIAL_CONSISTENCY != 0 {
            Some(Consistency::from_u16(reader.read_u16::<BigEndian>()?)?)
        } else {
            None
        };
        let timestamp = if flags & FLAG_DEFAULT_TIMESTAMP != 0 {
            Some(reader.read_i64::<BigEndian>()?)
        } else {
            None
        };

        Ok(BodyBatch {
            batch_type,
            statements,
            consistency,
            serial_consistency,
            timestamp,
        })
    }

    fn deserialize_statement(reader: &mut dyn Read) -> io::Result<BatchStatement> {
        match reader.read_u8()? {
            KIND_QUERY_STRING => {}
            KIND_PREPARED => {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    "Sentencias preparadas no soportadas en el batch",
                ))
            }
            kind => {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("Tipo de sentencia desconocido: {}", kind),
                ))
            }
        }
        let query_string = read_long_string(reader)?;
        let count = reader.read_u16::<BigEndian>()?;
        let mut values = Vec::with_capacity(count as usize);
        for _ in 0..count {
            values.push(QueryValue::deserialize(reader)?);
        }
        Ok(BatchStatement {
            query_string,
            values,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_starts_with_type_and_count() {
        let body = BodyBatch::new(
            BatchType::Logged,
            vec![BatchStatement {
                query_string: "DELETE".to_string(),
                values: vec![QueryValue::new(vec![1])],
            }],
            Consistency::One,
        );
        let bytes = body.serialize().unwrap();
        assert_eq!(&bytes[..3], &[0x00, 0x00, 0x01]);
        // kind + long string "DELETE"
        assert_eq!(bytes[3], KIND_QUERY_STRING);
        assert_eq!(&bytes[4..8], &[0, 0, 0, 6]);
        // consistency ONE y flags vacíos al final
        assert_eq!(&bytes[bytes.len() - 3..], &[0x00, 0x01, 0x00]);
    }

    #[test]
    fn prepared_statements_are_rejected() {
        let bytes = [0x00, 0x00, 0x01, KIND_PREPARED, 0x00, 0x00];
        assert!(BodyBatch::deserialize(&bytes).is_err());
    }

    #[test]
    fn timestamp_survives_decoding() {
        let mut body = BodyBatch::new(BatchType::Unlogged, vec![], Consistency::Quorum);
        body.timestamp = Some(42);
        let decoded = BodyBatch::deserialize(&body.serialize().unwrap()).unwrap();
        assert_eq!(decoded, body);
    }
}
