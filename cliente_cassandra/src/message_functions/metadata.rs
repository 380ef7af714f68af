use crate::message_functions::{
    column_spec::{ColumnSpec, ColumnType},
    primitivas::{read_bytes, read_string, write_bytes, write_string},
};
use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use std::io::{self, Read};

const FLAG_GLOBAL_TABLES_SPEC: u32 = 0x0001;
const FLAG_HAS_MORE_PAGES: u32 = 0x0002;
const FLAG_NO_METADATA: u32 = 0x0004;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Metadata {
    pub columns_count: u32,                          // Número de columnas.
    pub global_table_spec: Option<(String, String)>, // Keyspace y tabla comunes a todas las columnas.
    pub paging_state: Option<Vec<u8>>,               // Presente si quedan páginas.
    pub column_specs: Vec<ColumnSpec>,               // Vacío si el servidor omitió la metadata.
}

impl Metadata {
    /// Metadata con todas las columnas de una misma tabla.
    pub fn for_table(keyspace: &str, table: &str, columns: Vec<(String, ColumnType)>) -> Self {
        let column_specs: Vec<ColumnSpec> = columns
            .into_iter()
            .map(|(name, col_type)| ColumnSpec {
                keyspace: keyspace.to_string(),
                table: table.to_string(),
                name,
                col_type,
            })
            .collect();
        Metadata {
            columns_count: column_specs.len() as u32,
            global_table_spec: Some((keyspace.to_string(), table.to_string())),
            paging_state: None,
            column_specs,
        }
    }

    fn flags(&self) -> u32 {
        let mut flags = 0;
        if self.global_table_spec.is_some() {
            flags |= FLAG_GLOBAL_TABLES_SPEC;
        }
        if self.paging_state.is_some() {
            flags |= FLAG_HAS_MORE_PAGES;
        }
        if self.column_specs.is_empty() && self.columns_count > 0 {
            flags |= FLAG_NO_METADATA;
        }
        flags
    }

    /// Serializa la estructura al final de `bytes`.
    pub fn serialize(&self, bytes: &mut Vec<u8>) -> io::Result<()> {
        let flags = self.flags();
        bytes.write_u32::<BigEndian>(flags)?;
        bytes.write_u32::<BigEndian>(self.columns_count)?;
        if let Some(paging_state) = &self.paging_state {
            write_bytes(bytes, Some(paging_state))?;
        }
        if flags & FLAG_NO_METADATA != 0 {
            return Ok(());
        }

        if let Some((ks, table)) = &self.global_table_spec {
            write_string(bytes, ks)?;
            write_string(bytes, table)?;
        }
        for col in &self.column_specs {
            if self.global_table_spec.is_none() {
                write_string(bytes, &col.keyspace)?;
                write_string(bytes, &col.table)?;
            }
            write_string(bytes, &col.name)?;
            col.col_type.serialize(bytes)?;
        }
        Ok(())
    }

    /// Deserializa los datos de un lector de bytes en una estructura.
    pub fn deserialize(reader: &mut dyn Read) -> io::Result<Self> {
        let flags = reader.read_u32::<BigEndian>()?;
        let columns_count = reader.read_u32::<BigEndian>()?;
        let paging_state = if flags & FLAG_HAS_MORE_PAGES != 0 {
            read_bytes(reader)?
        } else {
            None
        };
        if flags & FLAG_NO_METADATA != 0 {
            return Ok(Self {
                columns_count,
                global_table_spec: None,
                paging_state,
                column_specs: vec![],
            });
        }

        let global_table_spec = if flags & FLAG_GLOBAL_TABLES_SPEC != 0 {
            let keyspace = read_string(reader)?;
            let table = read_string(reader)?;
            Some((keyspace, table))
        } else {
            None
        };

        let mut column_specs = vec![];
        for _ in 0..columns_count {
            let (keyspace, table) = match &global_table_spec {
                Some((ks, table)) => (ks.clone(), table.clone()),
                None => (read_string(reader)?, read_string(reader)?),
            };
            let name = read_string(reader)?;
            let col_type = ColumnType::deserialize(reader)?;
            column_specs.push(ColumnSpec {
                keyspace,
                table,
                name,
                col_type,
            });
        }
        Ok(Self {
            columns_count,
            global_table_spec,
            paging_state,
            column_specs,
        })
    }
}
