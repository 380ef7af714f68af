#![allow(dead_code)]
use cliente_cassandra::cluster::{Cluster, ClusterRegistry};
use cliente_cassandra::cluster_functions::keyspace_definition::KeyspaceDefinition;
use cliente_cassandra::column::Column;
use cliente_cassandra::column_query::ColumnQuery;
use cliente_cassandra::error::ErrorType;
use cliente_cassandra::harness::{
    CLUSTER_NAME, COLUMN_FAMILY, KEYSPACE, REPLICATION_FACTOR, REPLICATION_STRATEGY,
};
use cliente_cassandra::keyspace::Keyspace;
use cliente_cassandra::mutator::Mutator;
use cliente_cassandra::nodo_simulado_functions::conector_simulado::ClusterSimulado;
use cliente_cassandra::serializer::StringSerializer;
use std::sync::Arc;

pub const ENDPOINT: &str = "localhost:9160";

pub type StringMutator = Mutator<StringSerializer, StringSerializer, StringSerializer>;
pub type StringQuery = ColumnQuery<StringSerializer, StringSerializer, StringSerializer>;

pub fn init_logs() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn cluster_simulado() -> ClusterSimulado {
    init_logs();
    ClusterSimulado::new(&[ENDPOINT])
}

pub fn registry(simulado: &ClusterSimulado) -> ClusterRegistry {
    ClusterRegistry::new(Arc::new(simulado.clone()))
}

pub fn definicion() -> KeyspaceDefinition {
    KeyspaceDefinition::new(KEYSPACE, REPLICATION_STRATEGY, REPLICATION_FACTOR)
        .with_column_family(COLUMN_FAMILY)
}

/// Cluster con `Keyspace2.Users` ya creado.
pub fn preparar(registry: &ClusterRegistry) -> (Cluster, Keyspace) {
    let cluster = registry.get_or_create(CLUSTER_NAME, ENDPOINT).unwrap();
    cluster.add_keyspace(&definicion()).unwrap();
    let keyspace = Keyspace::new(KEYSPACE, &cluster);
    (cluster, keyspace)
}

pub fn mutator(keyspace: &Keyspace) -> StringMutator {
    Mutator::new(keyspace, StringSerializer, StringSerializer, StringSerializer)
}

pub fn query(keyspace: &Keyspace) -> StringQuery {
    ColumnQuery::new(keyspace, StringSerializer, StringSerializer, StringSerializer)
}

pub fn leer(
    keyspace: &Keyspace,
    key: &str,
    column_family: &str,
    name: &str,
) -> Result<Option<Column<String, String>>, ErrorType> {
    let mut query = query(keyspace);
    query
        .set_key(key.to_string())
        .set_column_family(column_family)
        .set_name(name.to_string());
    Ok(query.execute()?.into_value())
}

pub fn insertar(keyspace: &Keyspace, key: &str, name: &str, value: &str) {
    mutator(keyspace)
        .insert(
            &key.to_string(),
            COLUMN_FAMILY,
            keyspace.create_column(name.to_string(), value.to_string()),
        )
        .unwrap();
}
