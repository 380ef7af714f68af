// column.rs

// Una columna: nombre, valor y el clock (microsegundos) con el que se escribió
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column<N, V> {
    pub name: N,
    pub value: V,
    pub clock: i64,
}

impl<N, V> Column<N, V> {
    pub fn new(name: N, value: V, clock: i64) -> Self {
        Column { name, value, clock }
    }
}
