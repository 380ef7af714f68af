// Datos en memoria del nodo simulado: keyspace -> column family -> fila -> columna
use std::collections::{BTreeMap, HashMap};

// Valor de una columna; sin valor es un borrado (tombstone)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Celda {
    pub valor: Option<Vec<u8>>,
    pub clock: i64,
}

impl Celda {
    /// Last-writer-wins: gana el clock mayor. Con el mismo clock gana el
    /// borrado, y entre dos escrituras gana el valor mayor.
    pub fn gana_sobre(&self, actual: &Celda) -> bool {
        if self.clock != actual.clock {
            return self.clock > actual.clock;
        }
        match (&self.valor, &actual.valor) {
            (None, _) => true,
            (Some(_), None) => false,
            (Some(nuevo), Some(viejo)) => nuevo > viejo,
        }
    }
}

pub type Filas = BTreeMap<Vec<u8>, BTreeMap<Vec<u8>, Celda>>;

#[derive(Debug, Clone)]
pub struct KeyspaceSimulado {
    pub replication: Vec<(String, String)>,
    pub column_families: HashMap<String, Filas>,
}

#[derive(Debug, Default)]
pub struct Almacenamiento {
    keyspaces: HashMap<String, KeyspaceSimulado>,
}

impl Almacenamiento {
    pub fn keyspace(&self, keyspace: &str) -> Option<&KeyspaceSimulado> {
        self.keyspaces.get(keyspace)
    }

    pub fn existe_column_family(&self, keyspace: &str, column_family: &str) -> bool {
        self.keyspaces
            .get(keyspace)
            .map_or(false, |ks| ks.column_families.contains_key(column_family))
    }

    /// Devuelve false si el keyspace ya existía.
    pub fn crear_keyspace(&mut self, keyspace: &str, replication: Vec<(String, String)>) -> bool {
        if self.keyspaces.contains_key(keyspace) {
            return false;
        }
        self.keyspaces.insert(
            keyspace.to_string(),
            KeyspaceSimulado {
                replication,
                column_families: HashMap::new(),
            },
        );
        true
    }

    /// `None` si no existe el keyspace; `Some(false)` si la column family ya existía.
    pub fn crear_column_family(&mut self, keyspace: &str, column_family: &str) -> Option<bool> {
        let ks = self.keyspaces.get_mut(keyspace)?;
        if ks.column_families.contains_key(column_family) {
            return Some(false);
        }
        ks.column_families
            .insert(column_family.to_string(), BTreeMap::new());
        Some(true)
    }

    pub fn borrar_keyspace(&mut self, keyspace: &str) -> bool {
        self.keyspaces.remove(keyspace).is_some()
    }

    pub fn borrar_column_family(&mut self, keyspace: &str, column_family: &str) -> bool {
        self.keyspaces
            .get_mut(keyspace)
            .map_or(false, |ks| ks.column_families.remove(column_family).is_some())
    }

    /// Aplica una escritura o un borrado con last-writer-wins. La column
    /// family tiene que existir; si no, no hace nada y devuelve false.
    pub fn aplicar(
        &mut self,
        keyspace: &str,
        column_family: &str,
        key: &[u8],
        columna: &[u8],
        celda: Celda,
    ) -> bool {
        let Some(filas) = self
            .keyspaces
            .get_mut(keyspace)
            .and_then(|ks| ks.column_families.get_mut(column_family))
        else {
            return false;
        };
        let fila = filas.entry(key.to_vec()).or_default();
        match fila.get(columna) {
            Some(actual) if !celda.gana_sobre(actual) => {}
            _ => {
                fila.insert(columna.to_vec(), celda);
            }
        }
        true
    }

    /// Columna viva, si existe. Un borrado cuenta como ausente.
    pub fn leer(
        &self,
        keyspace: &str,
        column_family: &str,
        key: &[u8],
        columna: &[u8],
    ) -> Option<(&[u8], i64)> {
        let celda = self
            .keyspaces
            .get(keyspace)?
            .column_families
            .get(column_family)?
            .get(key)?
            .get(columna)?;
        celda.valor.as_deref().map(|valor| (valor, celda.clock))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn escritura(valor: &[u8], clock: i64) -> Celda {
        Celda {
            valor: Some(valor.to_vec()),
            clock,
        }
    }

    fn almacenamiento_con_users() -> Almacenamiento {
        let mut almacenamiento = Almacenamiento::default();
        almacenamiento.crear_keyspace("Keyspace2", vec![]);
        almacenamiento.crear_column_family("Keyspace2", "Users");
        almacenamiento
    }

    #[test]
    fn older_write_does_not_overwrite() {
        let mut almacenamiento = almacenamiento_con_users();
        almacenamiento.aplicar("Keyspace2", "Users", b"k", b"email", escritura(b"nuevo", 20));
        almacenamiento.aplicar("Keyspace2", "Users", b"k", b"email", escritura(b"viejo", 10));
        assert_eq!(
            almacenamiento.leer("Keyspace2", "Users", b"k", b"email"),
            Some((&b"nuevo"[..], 20))
        );
    }

    #[test]
    fn tombstone_wins_on_equal_clock() {
        let mut almacenamiento = almacenamiento_con_users();
        almacenamiento.aplicar("Keyspace2", "Users", b"k", b"email", escritura(b"a", 5));
        let borrado = Celda { valor: None, clock: 5 };
        almacenamiento.aplicar("Keyspace2", "Users", b"k", b"email", borrado);
        assert_eq!(almacenamiento.leer("Keyspace2", "Users", b"k", b"email"), None);

        // Y una escritura con el mismo clock no lo revive
        almacenamiento.aplicar("Keyspace2", "Users", b"k", b"email", escritura(b"b", 5));
        assert_eq!(almacenamiento.leer("Keyspace2", "Users", b"k", b"email"), None);
    }

    #[test]
    fn greater_value_wins_on_equal_clock() {
        let mut almacenamiento = almacenamiento_con_users();
        almacenamiento.aplicar("Keyspace2", "Users", b"k", b"c", escritura(b"b", 5));
        almacenamiento.aplicar("Keyspace2", "Users", b"k", b"c", escritura(b"a", 5));
        assert_eq!(
            almacenamiento.leer("Keyspace2", "Users", b"k", b"c"),
            Some((&b"b"[..], 5))
        );
    }

    #[test]
    fn writes_need_an_existing_column_family() {
        let mut almacenamiento = almacenamiento_con_users();
        assert!(!almacenamiento.aplicar("Keyspace2", "disabled", b"k", b"c", escritura(b"a", 1)));
        assert_eq!(almacenamiento.crear_column_family("otro", "Users"), None);
        assert_eq!(almacenamiento.crear_column_family("Keyspace2", "Users"), Some(false));
    }
}
