use crate::message_functions::primitivas::{read_string, write_string};
use std::io;

pub const PASSWORD_AUTHENTICATOR: &str = "org.apache.cassandra.auth.PasswordAuthenticator";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BodyAuthenticate {
    pub authenticator: String, // Clase del autenticador del servidor
}

impl BodyAuthenticate {
    pub fn serialize(&self) -> io::Result<Vec<u8>> {
        let mut bytes: Vec<u8> = vec![];
        write_string(&mut bytes, &self.authenticator)?;
        Ok(bytes)
    }

    pub fn deserialize(bytes: &[u8]) -> io::Result<Self> {
        let mut reader: &[u8] = bytes;
        Ok(BodyAuthenticate {
            authenticator: read_string(&mut reader)?,
        })
    }
}
