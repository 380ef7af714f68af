#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BodyVoid;

// Serialización de `BodyVoid`
impl BodyVoid {
    pub fn serialize(&self) -> Vec<u8> {
        0x0001_u32.to_be_bytes().to_vec() // `kind = 0x0001` para "Void".
    }
}
