use crate::message_functions::{
    consistency::Consistency,
    primitivas::{read_bytes, write_bytes},
    query_value::QueryValue,
};
use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use std::io::{self, Read};

const FLAG_VALUES: u8 = 0x01;
const FLAG_SKIP_METADATA: u8 = 0x02;
const FLAG_PAGE_SIZE: u8 = 0x04;
const FLAG_PAGING_STATE: u8 = 0x08;
const FLAG_SERIAL_CONSISTENCY: u8 = 0x10;
const FLAG_DEFAULT_TIMESTAMP: u8 = 0x20;
const FLAG_NAMES_FOR_VALUES: u8 = 0x40;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryParameters {
    pub consistency: Consistency,                // Nivel de consistencia
    pub values: Vec<QueryValue>,                 // Valores ligados a los `?`
    pub skip_metadata: bool,                     // El servidor puede omitir la metadata
    pub result_page_size: Option<i32>,           // Tamaño de la página
    pub paging_state: Option<Vec<u8>>,           // Estado de paginación
    pub serial_consistency: Option<Consistency>, // Consistencia serial
    pub timestamp: Option<i64>,                  // Timestamp por defecto, en microsegundos
}

impl QueryParameters {
    pub fn new(consistency: Consistency, values: Vec<QueryValue>) -> Self {
        QueryParameters {
            consistency,
            values,
            ..Default::default()
        }
    }

    /// Flags que describen qué campos opcionales viajan en el frame.
    pub fn flags(&self) -> u8 {
        let mut flags = 0x00;
        if !self.values.is_empty() {
            flags |= FLAG_VALUES;
        }
        if self.skip_metadata {
            flags |= FLAG_SKIP_METADATA;
        }
        if self.result_page_size.is_some() {
            flags |= FLAG_PAGE_SIZE;
        }
        if self.paging_state.is_some() {
            flags |= FLAG_PAGING_STATE;
        }
        if self.serial_consistency.is_some() {
            flags |= FLAG_SERIAL_CONSISTENCY;
        }
        if self.timestamp.is_some() {
            flags |= FLAG_DEFAULT_TIMESTAMP;
        }
        flags
    }

    /// Serializa los parámetros de consulta al final de `bytes`.
    pub fn serialize(&self, bytes: &mut Vec<u8>) -> io::Result<()> {
        bytes.write_u16::<BigEndian>(self.consistency.as_u16())?;
        bytes.push(self.flags());
        if !self.values.is_empty() {
            let count = u16::try_from(self.values.len()).map_err(|_| {
                io::Error::new(io::ErrorKind::InvalidInput, "Demasiados valores en la query")
            })?;
            bytes.write_u16::<BigEndian>(count)?;
            for value in &self.values {
                value.serialize(bytes)?;
            }
        }
        if let Some(page_size) = self.result_page_size {
            bytes.write_i32::<BigEndian>(page_size)?;
        }
        if let Some(paging_state) = &self.paging_state {
            write_bytes(bytes, Some(paging_state))?;
        }
        if let Some(serial) = self.serial_consistency {
            bytes.write_u16::<BigEndian>(serial.as_u16())?;
        }
        if let Some(timestamp) = self.timestamp {
            bytes.write_i64::<BigEndian>(timestamp)?;
        }
        Ok(())
    }

    /// Deserializa los parámetros de consulta desde el lector.
    pub fn deserialize(reader: &mut dyn Read) -> io::Result<Self> {
        let consistency = Consistency::from_u16(reader.read_u16::<BigEndian>()?)?;
        let flags = reader.read_u8()?;
        if flags & FLAG_NAMES_FOR_VALUES != 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "Valores con nombre no soportados",
            ));
        }

        let mut values = vec![];
        if flags & FLAG_VALUES != 0 {
            let count = reader.read_u16::<BigEndian>()?;
            for _ in 0..count {
                values.push(QueryValue::deserialize(reader)?);
            }
        }
        let result_page_size = if flags & FLAG_PAGE_SIZE != 0 {
            Some(reader.read_i32::<BigEndian>()?)
        } else {
            None
        };
        let paging_state = if flags & FLAG_PAGING_STATE != 0 {
            read_bytes(reader)?
        } else {
            None
        };
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

        Ok(QueryParameters {
            consistency,
            values,
            skip_metadata: flags & FLAG_SKIP_METADATA != 0,
            result_page_size,
            paging_state,
            serial_consistency,
            timestamp,
        })
    }
}
