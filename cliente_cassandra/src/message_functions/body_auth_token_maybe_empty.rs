use crate::message_functions::primitivas::{read_bytes, write_bytes};
use std::io;

// Token SASL de AUTH_RESPONSE, AUTH_CHALLENGE y AUTH_SUCCESS; puede venir vacío (null)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BodyAuthTokenMaybeEmpty {
    pub token: Option<Vec<u8>>,
}

impl BodyAuthTokenMaybeEmpty {
    /// Token del mecanismo PLAIN: `\0usuario\0contraseña`.
    pub fn plain(user: &str, password: &str) -> Self {
        let token = format!("\0{}\0{}", user, password).into_bytes();
        BodyAuthTokenMaybeEmpty { token: Some(token) }
    }

    /// Separa usuario y contraseña de un token PLAIN.
    pub fn plain_credentials(&self) -> Option<(String, String)> {
        let token = self.token.as_ref()?;
        let text = String::from_utf8(token.clone()).ok()?;
        let mut parts = text.split('\0');
        let _authzid = parts.next()?;
        let user = parts.next()?;
        let password = parts.next()?;
        Some((user.to_string(), password.to_string()))
    }

    pub fn serialize(&self) -> io::Result<Vec<u8>> {
        let mut bytes: Vec<u8> = vec![];
        write_bytes(&mut bytes, self.token.as_deref())?;
        Ok(bytes)
    }

    pub fn deserialize(bytes: &[u8]) -> io::Result<Self> {
        let mut reader: &[u8] = bytes;
        Ok(BodyAuthTokenMaybeEmpty {
            token: read_bytes(&mut reader)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_token_splits_back_into_credentials() {
        let body = BodyAuthTokenMaybeEmpty::plain("cassandra", "secreto");
        let decoded = BodyAuthTokenMaybeEmpty::deserialize(&body.serialize().unwrap()).unwrap();
        assert_eq!(
            decoded.plain_credentials(),
            Some(("cassandra".to_string(), "secreto".to_string()))
        );
    }

    #[test]
    fn empty_token_has_no_credentials() {
        let body = BodyAuthTokenMaybeEmpty { token: None };
        assert_eq!(body.plain_credentials(), None);
    }
}
