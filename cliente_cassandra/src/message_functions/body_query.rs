use crate::message_functions::{
    primitivas::{read_long_string, write_long_string},
    query_parameters::QueryParameters,
};
use std::io;

#[derive(Debug, Clone, PartialEq)]
pub struct BodyQuery {
    pub query_string: String,        // La consulta CQL (long string)
    pub parameters: QueryParameters, // Parámetros de la consulta
}

impl BodyQuery {
    pub fn serialize(&self) -> io::Result<Vec<u8>> {
        let mut bytes = vec![];
        write_long_string(&mut bytes, &self.query_string)?;
        self.parameters.serialize(&mut bytes)?;
        Ok(bytes)
    }

    pub fn deserialize(bytes: &[u8]) -> io::Result<Self> {
        let mut reader = bytes;
        let query_string = read_long_string(&mut reader)?;
        let parameters = QueryParameters::deserialize(&mut reader)?;

        Ok(BodyQuery {
            query_string,
            parameters,
        })
    }
}
