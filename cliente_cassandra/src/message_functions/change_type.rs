use std::io;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeType {
    Created,
    Updated,
    Dropped,
}

impl ChangeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeType::Created => "CREATED",
            ChangeType::Updated => "UPDATED",
            ChangeType::Dropped => "DROPPED",
        }
    }

    pub fn from_wire(value: &str) -> io::Result<Self> {
        match value {
            "CREATED" => Ok(ChangeType::Created),
            "UPDATED" => Ok(ChangeType::Updated),
            "DROPPED" => Ok(ChangeType::Dropped),
            _ => Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "Tipo de cambio no válido",
            )),
        }
    }
}
