use crate::message_functions::primitivas::{read_bytes, write_bytes};
use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use std::io::{self, Read};

// Un valor de celda tal como viaja en un resultado Rows
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Value {
    pub data: Option<Vec<u8>>,
}

impl Value {
    pub fn new(data: Vec<u8>) -> Self {
        Value { data: Some(data) }
    }

    pub fn null() -> Self {
        Value { data: None }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        self.data.as_deref()
    }

    pub fn as_bigint(&self) -> io::Result<Option<i64>> {
        match &self.data {
            Some(data) => {
                let mut reader = data.as_slice();
                let number = reader.read_i64::<BigEndian>()?;
                if !reader.is_empty() {
                    return Err(io::Error::new(
                        io::ErrorKind::InvalidData,
                        "bigint con bytes de más",
                    ));
                }
                Ok(Some(number))
            }
            None => Ok(None),
        }
    }
}

/// Codifica un `map<text, text>` como lo hace el protocolo v3.
pub fn encode_text_map(entries: &[(String, String)]) -> io::Result<Vec<u8>> {
    let mut bytes = vec![];
    let count = i32::try_from(entries.len())
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "Mapa demasiado grande"))?;
    bytes.write_i32::<BigEndian>(count)?;
    for (key, value) in entries {
        write_bytes(&mut bytes, Some(key.as_bytes()))?;
        write_bytes(&mut bytes, Some(value.as_bytes()))?;
    }
    Ok(bytes)
}

pub fn decode_text_map(bytes: &[u8]) -> io::Result<Vec<(String, String)>> {
    let mut reader = bytes;
    let count = reader.read_i32::<BigEndian>()?;
    let mut entries = vec![];
    for _ in 0..count.max(0) {
        let key = read_text(&mut reader)?;
        let value = read_text(&mut reader)?;
        entries.push((key, value));
    }
    Ok(entries)
}

fn read_text(reader: &mut dyn Read) -> io::Result<String> {
    let data = read_bytes(reader)?
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "null dentro de un mapa"))?;
    String::from_utf8(data).map_err(|_| io::Error::new(io::ErrorKind::InvalidData, "Invalid UTF-8 data"))
}
