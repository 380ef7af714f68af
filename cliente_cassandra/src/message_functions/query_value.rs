use crate::message_functions::primitivas::{read_bytes, write_bytes};
use std::io::{self, Read};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryValue {
    pub value: Option<Vec<u8>>, // Valor serializado, None es null
}

impl QueryValue {
    pub fn new(value: Vec<u8>) -> Self {
        QueryValue { value: Some(value) }
    }

    pub fn null() -> Self {
        QueryValue { value: None }
    }

    pub fn deserialize(reader: &mut dyn Read) -> io::Result<Self> {
        Ok(QueryValue {
            value: read_bytes(reader)?,
        })
    }

    pub fn serialize(&self, bytes: &mut Vec<u8>) -> io::Result<()> {
        write_bytes(bytes, self.value.as_deref())
    }
}
