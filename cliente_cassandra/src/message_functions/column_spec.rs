use crate::message_functions::primitivas::{read_string, write_string};
use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use std::io::{self, Read};

// Tipo de una columna, codificado como [option]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnType {
    Custom(String),
    Bigint,
    Blob,
    Boolean,
    Int,
    Text,
    Varchar,
    Map(Box<ColumnType>, Box<ColumnType>),
    Other(u16), // Tipos simples que el cliente no interpreta
}

impl ColumnType {
    pub fn serialize(&self, bytes: &mut Vec<u8>) -> io::Result<()> {
        match self {
            ColumnType::Custom(class) => {
                bytes.write_u16::<BigEndian>(0x0000)?;
                write_string(bytes, class)?;
            }
            ColumnType::Bigint => bytes.write_u16::<BigEndian>(0x0002)?,
            ColumnType::Blob => bytes.write_u16::<BigEndian>(0x0003)?,
            ColumnType::Boolean => bytes.write_u16::<BigEndian>(0x0004)?,
            ColumnType::Int => bytes.write_u16::<BigEndian>(0x0009)?,
            ColumnType::Text => bytes.write_u16::<BigEndian>(0x000A)?,
            ColumnType::Varchar => bytes.write_u16::<BigEndian>(0x000D)?,
            ColumnType::Map(key, value) => {
                bytes.write_u16::<BigEndian>(0x0021)?;
                key.serialize(bytes)?;
                value.serialize(bytes)?;
            }
            ColumnType::Other(id) => bytes.write_u16::<BigEndian>(*id)?,
        }
        Ok(())
    }

    pub fn deserialize(reader: &mut dyn Read) -> io::Result<Self> {
        let id = reader.read_u16::<BigEndian>()?;
        let col_type = match id {
            0x0000 => ColumnType::Custom(read_string(reader)?),
            0x0002 => ColumnType::Bigint,
            0x0003 => ColumnType::Blob,
            0x0004 => ColumnType::Boolean,
            0x0009 => ColumnType::Int,
            0x000A => ColumnType::Text,
            0x000D => ColumnType::Varchar,
            0x0021 => {
                let key = ColumnType::deserialize(reader)?;
                let value = ColumnType::deserialize(reader)?;
                ColumnType::Map(Box::new(key), Box::new(value))
            }
            0x0020 | 0x0022 | 0x0030 | 0x0031 => {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("Tipo de columna compuesto no soportado: {:#06x}", id),
                ))
            }
            other => ColumnType::Other(other),
        };
        Ok(col_type)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSpec {
    pub keyspace: String,
    pub table: String,
    pub name: String,
    pub col_type: ColumnType,
}
