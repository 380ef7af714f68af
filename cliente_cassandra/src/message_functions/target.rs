use std::io;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Keyspace,
    Table,
    Type,
}

impl Target {
    /// Nombre del objetivo tal como viaja en el frame.
    pub fn as_str(&self) -> &'static str {
        match self {
            Target::Keyspace => "KEYSPACE",
            Target::Table => "TABLE",
            Target::Type => "TYPE",
        }
    }

    pub fn from_wire(value: &str) -> io::Result<Self> {
        match value {
            "KEYSPACE" => Ok(Target::Keyspace),
            "TABLE" => Ok(Target::Table),
            "TYPE" => Ok(Target::Type),
            _ => Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "Objetivo no válido",
            )),
        }
    }
}
