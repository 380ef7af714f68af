// Notaciones del protocolo: [string], [long string], [bytes], [string map]
use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use std::io::{self, Read};

/// Escribe un `[string]`: largo `u16` seguido de los bytes UTF-8.
pub fn write_string(bytes: &mut Vec<u8>, value: &str) -> io::Result<()> {
    let len = u16::try_from(value.len())
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "[string] demasiado largo"))?;
    bytes.write_u16::<BigEndian>(len)?;
    bytes.extend_from_slice(value.as_bytes());
    Ok(())
}

pub fn read_string(reader: &mut dyn Read) -> io::Result<String> {
    let len = reader.read_u16::<BigEndian>()? as usize;
    read_utf8(reader, len)
}

/// Escribe un `[long string]`: largo `u32` seguido de los bytes UTF-8.
pub fn write_long_string(bytes: &mut Vec<u8>, value: &str) -> io::Result<()> {
    let len = u32::try_from(value.len())
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "[long string] demasiado largo"))?;
    bytes.write_u32::<BigEndian>(len)?;
    bytes.extend_from_slice(value.as_bytes());
    Ok(())
}

pub fn read_long_string(reader: &mut dyn Read) -> io::Result<String> {
    let len = reader.read_u32::<BigEndian>()? as usize;
    read_utf8(reader, len)
}

/// Escribe un `[bytes]`; `None` se codifica como largo negativo (null).
pub fn write_bytes(bytes: &mut Vec<u8>, value: Option<&[u8]>) -> io::Result<()> {
    match value {
        Some(data) => {
            let len = i32::try_from(data.len())
                .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "[bytes] demasiado largo"))?;
            bytes.write_i32::<BigEndian>(len)?;
            bytes.extend_from_slice(data);
        }
        None => bytes.write_i32::<BigEndian>(-1)?,
    }
    Ok(())
}

pub fn read_bytes(reader: &mut dyn Read) -> io::Result<Option<Vec<u8>>> {
    let len = reader.read_i32::<BigEndian>()?;
    if len < 0 {
        return Ok(None);
    }
    let mut data = vec![0; len as usize];
    reader.read_exact(&mut data)?;
    Ok(Some(data))
}

pub fn write_string_map(bytes: &mut Vec<u8>, entries: &[(String, String)]) -> io::Result<()> {
    let count = u16::try_from(entries.len())
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "[string map] demasiado grande"))?;
    bytes.write_u16::<BigEndian>(count)?;
    for (key, value) in entries {
        write_string(bytes, key)?;
        write_string(bytes, value)?;
    }
    Ok(())
}

pub fn read_string_map(reader: &mut dyn Read) -> io::Result<Vec<(String, String)>> {
    let count = reader.read_u16::<BigEndian>()? as usize;
    let mut entries = Vec::with_capacity(count);
    for _ in 0..count {
        let key = read_string(reader)?;
        let value = read_string(reader)?;
        entries.push((key, value));
    }
    Ok(entries)
}

fn read_utf8(reader: &mut dyn Read, len: usize) -> io::Result<String> {
    let mut data = vec![0; len];
    reader.read_exact(&mut data)?;
    String::from_utf8(data).map_err(|_| io::Error::new(io::ErrorKind::InvalidData, "UTF-8 inválido"))
}
