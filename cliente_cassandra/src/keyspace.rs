// keyspace.rs
use crate::cluster::Cluster;
use crate::column::Column;
use crate::message_functions::consistency::Consistency;
use chrono::Utc;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

/// Un keyspace de un cluster: da el clock de las mutaciones y la consistencia
/// con la que se leen y escriben sus datos.
#[derive(Clone)]
pub struct Keyspace {
    name: String,
    cluster: Cluster,
    ultimo_clock: Arc<AtomicI64>,
    consistency: Consistency,
}

impl Keyspace {
    pub fn new(name: &str, cluster: &Cluster) -> Self {
        Keyspace {
            name: name.to_string(),
            cluster: cluster.clone(),
            ultimo_clock: cluster.clock_de(name),
            consistency: Consistency::One,
        }
    }

    pub fn with_consistency(mut self, consistency: Consistency) -> Self {
        self.consistency = consistency;
        self
    }

    pub fn keyspace_name(&self) -> &str {
        &self.name
    }

    pub fn cluster(&self) -> &Cluster {
        &self.cluster
    }

    pub fn consistency(&self) -> Consistency {
        self.consistency
    }

    /// Microsegundos desde epoch, estrictamente creciente para este keyspace
    /// aunque dos llamadas caigan en el mismo microsegundo.
    pub fn create_clock(&self) -> i64 {
        let ahora = Utc::now().timestamp_micros();
        let mut anterior = self.ultimo_clock.load(Ordering::SeqCst);
        loop {
            let siguiente = ahora.max(anterior + 1);
            match self.ultimo_clock.compare_exchange(
                anterior,
                siguiente,
                Ordering::SeqCst,
                Ordering::SeqCst,
            ) {
                Ok(_) => return siguiente,
                Err(actual) => anterior = actual,
            }
        }
    }

    /// Columna con el clock actual del keyspace.
    pub fn create_column<N, V>(&self, name: N, value: V) -> Column<N, V> {
        Column::new(name, value, self.create_clock())
    }
}
