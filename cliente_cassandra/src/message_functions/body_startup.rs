use crate::message_functions::primitivas::{read_string_map, write_string_map};
use std::io;

pub const CQL_VERSION: &str = "3.0.0";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BodyStartup {
    pub options: Vec<(String, String)>, // Mapa de opciones, clave-valor
}

impl Default for BodyStartup {
    fn default() -> Self {
        BodyStartup {
            options: vec![("CQL_VERSION".to_string(), CQL_VERSION.to_string())],
        }
    }
}

impl BodyStartup {
    pub fn option(&self, key: &str) -> Option<&str> {
        self.options
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn serialize(&self) -> io::Result<Vec<u8>> {
        let mut bytes = vec![];
        write_string_map(&mut bytes, &self.options)?;
        Ok(bytes)
    }

    pub fn deserialize(bytes: &[u8]) -> io::Result<Self> {
        let mut reader = bytes;
        Ok(BodyStartup {
            options: read_string_map(&mut reader)?,
        })
    }
}
