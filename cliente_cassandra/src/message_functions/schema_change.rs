use crate::message_functions::{
    change_type::ChangeType,
    primitivas::{read_string, write_string},
    target::Target,
};
use byteorder::{BigEndian, WriteBytesExt};
use std::io;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaChange {
    pub change_type: ChangeType,
    pub target: Target,
    pub keyspace: String,
    pub table_or_type: Option<String>, // Solo para TABLE o TYPE
}

// Serialización y deserialización de `SchemaChange`
impl SchemaChange {
    pub fn serialize(&self) -> io::Result<Vec<u8>> {
        let mut bytes = Vec::new();
        bytes.write_u32::<BigEndian>(0x0005)?; // `kind = 0x0005` para "SchemaChange".
        write_string(&mut bytes, self.change_type.as_str())?;
        write_string(&mut bytes, self.target.as_str())?;
        write_string(&mut bytes, &self.keyspace)?;
        if self.target != Target::Keyspace {
            write_string(&mut bytes, self.table_or_type.as_deref().unwrap_or_default())?;
        }
        Ok(bytes)
    }

    pub fn deserialize(bytes: &[u8]) -> io::Result<Self> {
        let mut reader = bytes.get(4..).ok_or_else(|| {
            io::Error::new(io::ErrorKind::UnexpectedEof, "SchemaChange sin kind")
        })?;

        let change_type = ChangeType::from_wire(&read_string(&mut reader)?)?;
        let target = Target::from_wire(&read_string(&mut reader)?)?;
        let keyspace = read_string(&mut reader)?;
        let table_or_type = match target {
            Target::Keyspace => None,
            Target::Table | Target::Type => Some(read_string(&mut reader)?),
        };

        Ok(SchemaChange {
            change_type,
            target,
            keyspace,
            table_or_type,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyspace_change_has_no_table() {
        let change = SchemaChange {
            change_type: ChangeType::Dropped,
            target: Target::Keyspace,
            keyspace: "Keyspace2".to_string(),
            table_or_type: Some("ignorado".to_string()),
        };
        let decoded = SchemaChange::deserialize(&change.serialize().unwrap()).unwrap();
        assert_eq!(decoded.table_or_type, None);
        assert_eq!(decoded.change_type, ChangeType::Dropped);
    }

    #[test]
    fn table_change_carries_its_name() {
        let change = SchemaChange {
            change_type: ChangeType::Created,
            target: Target::Table,
            keyspace: "Keyspace2".to_string(),
            table_or_type: Some("Users".to_string()),
        };
        let decoded = SchemaChange::deserialize(&change.serialize().unwrap()).unwrap();
        assert_eq!(decoded, change);
    }
}
