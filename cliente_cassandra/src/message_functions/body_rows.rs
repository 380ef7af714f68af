use crate::message_functions::{
    metadata::Metadata,
    primitivas::{read_bytes, write_bytes},
    row_content::RowContent,
    value::Value,
};
use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use std::io;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BodyRows {
    pub metadata: Metadata,            // Metadata sobre las columnas.
    pub rows_content: Vec<RowContent>, // Contenido de las filas.
}

// Serialización y deserialización de `BodyRows`
impl BodyRows {
    pub fn rows_count(&self) -> usize {
        self.rows_content.len()
    }

    /// Índice de una columna por nombre, según la metadata.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.metadata
            .column_specs
            .iter()
            .position(|spec| spec.name == name)
    }

    pub fn serialize(&self) -> io::Result<Vec<u8>> {
        let mut bytes = Vec::new();
        bytes.write_u32::<BigEndian>(0x0002)?; // `kind = 0x0002` para "Rows".
        self.metadata.serialize(&mut bytes)?;

        let rows_count = i32::try_from(self.rows_content.len())
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "Demasiadas filas"))?;
        bytes.write_i32::<BigEndian>(rows_count)?;
        for row in &self.rows_content {
            for value in &row.values {
                write_bytes(&mut bytes, value.as_bytes())?;
            }
        }
        Ok(bytes)
    }

    pub fn deserialize(bytes: &[u8]) -> io::Result<Self> {
        let mut reader = bytes.get(4..).ok_or_else(|| {
            io::Error::new(io::ErrorKind::UnexpectedEof, "Resultado Rows sin kind")
        })?; // Saltamos los primeros 4 bytes (kind = 0x0002).

        let metadata = Metadata::deserialize(&mut reader)?;
        let rows_count = reader.read_i32::<BigEndian>()?;

        let mut rows_content = vec![];
        for _ in 0..rows_count.max(0) {
            let mut values = vec![];
            for _ in 0..metadata.columns_count {
                values.push(Value {
                    data: read_bytes(&mut reader)?,
                });
            }
            rows_content.push(RowContent { values });
        }

        Ok(Self {
            metadata,
            rows_content,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message_functions::column_spec::ColumnType;

    fn users_rows() -> BodyRows {
        BodyRows {
            metadata: Metadata::for_table(
                "Keyspace2",
                "Users",
                vec![
                    ("column1".to_string(), ColumnType::Blob),
                    ("value".to_string(), ColumnType::Blob),
                    ("writetime(value)".to_string(), ColumnType::Bigint),
                ],
            ),
            rows_content: vec![RowContent {
                values: vec![
                    Value::new(b"email".to_vec()),
                    Value::new(b"dhydrated@gmail.com".to_vec()),
                    Value::new(10_i64.to_be_bytes().to_vec()),
                ],
            }],
        }
    }

    #[test]
    fn decodes_what_the_node_sends() {
        let rows = users_rows();
        let decoded = BodyRows::deserialize(&rows.serialize().unwrap()).unwrap();
        assert_eq!(decoded.rows_count(), 1);
        assert_eq!(decoded.column_index("value"), Some(1));
        assert_eq!(decoded.rows_content[0].values[2].as_bigint().unwrap(), Some(10));
        assert_eq!(decoded, rows);
    }

    #[test]
    fn per_column_table_spec_without_global_flag() {
        let mut rows = users_rows();
        rows.metadata.global_table_spec = None;
        let decoded = BodyRows::deserialize(&rows.serialize().unwrap()).unwrap();
        assert_eq!(decoded.metadata.column_specs[0].keyspace, "Keyspace2");
        assert_eq!(decoded.metadata.column_specs[2].table, "Users");
    }

    #[test]
    fn truncated_rows_fail() {
        let bytes = users_rows().serialize().unwrap();
        assert!(BodyRows::deserialize(&bytes[..bytes.len() - 3]).is_err());
    }
}
