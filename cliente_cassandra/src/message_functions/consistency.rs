use std::io;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Consistency {
    Any = 0x0000,
    #[default]
    One = 0x0001,
    Two = 0x0002,
    Three = 0x0003,
    Quorum = 0x0004,
    All = 0x0005,
    LocalQuorum = 0x0006,
    EachQuorum = 0x0007,
    Serial = 0x0008,
    LocalSerial = 0x0009,
    LocalOne = 0x000A,
}

impl Consistency {
    /// Convierte un valor `u16` en una variante de `Consistency`
    pub fn from_u16(value: u16) -> io::Result<Self> {
        match value {
            0x0000 => Ok(Consistency::Any),
            0x0001 => Ok(Consistency::One),
            0x0002 => Ok(Consistency::Two),
            0x0003 => Ok(Consistency::Three),
            0x0004 => Ok(Consistency::Quorum),
            0x0005 => Ok(Consistency::All),
            0x0006 => Ok(Consistency::LocalQuorum),
            0x0007 => Ok(Consistency::EachQuorum),
            0x0008 => Ok(Consistency::Serial),
            0x0009 => Ok(Consistency::LocalSerial),
            0x000A => Ok(Consistency::LocalOne),
            _ => Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "Consistencia no válida",
            )),
        }
    }

    pub fn as_u16(self) -> u16 {
        self as u16
    }

    /// Nombre tal como aparece en la configuración ("ONE", "LOCAL_QUORUM", ...).
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_uppercase().as_str() {
            "ANY" => Some(Consistency::Any),
            "ONE" => Some(Consistency::One),
            "TWO" => Some(Consistency::Two),
            "THREE" => Some(Consistency::Three),
            "QUORUM" => Some(Consistency::Quorum),
            "ALL" => Some(Consistency::All),
            "LOCAL_QUORUM" => Some(Consistency::LocalQuorum),
            "EACH_QUORUM" => Some(Consistency::EachQuorum),
            "SERIAL" => Some(Consistency::Serial),
            "LOCAL_SERIAL" => Some(Consistency::LocalSerial),
            "LOCAL_ONE" => Some(Consistency::LocalOne),
            _ => None,
        }
    }
}
