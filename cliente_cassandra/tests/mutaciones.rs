mod common;

use cliente_cassandra::column::Column;
use cliente_cassandra::column_query::ColumnQuery;
use cliente_cassandra::error::ErrorType;
use cliente_cassandra::harness::{
    CLUSTER_NAME, COLUMN_EMAIL, COLUMN_FAMILY, COLUMN_FIRSTNAME, EMAIL_1, KEYSPACE, KEY_1, KEY_2,
};
use cliente_cassandra::keyspace::Keyspace;
use cliente_cassandra::mutator::Mutator;
use cliente_cassandra::serializer::{BytesSerializer, LongSerializer, StringSerializer};
use common::{cluster_simulado, insertar, leer, mutator, preparar, query, registry};

#[test]
fn execute_with_nothing_queued_sends_nothing() {
    let simulado = cluster_simulado();
    let registry = registry(&simulado);
    let (_cluster, keyspace) = preparar(&registry);

    let resultado = mutator(&keyspace).execute().unwrap();
    assert_eq!(resultado.operaciones, 0);
    assert_eq!(resultado.host, None);
}

#[test]
fn batch_reports_operations_and_host() {
    let simulado = cluster_simulado();
    let registry = registry(&simulado);
    let (_cluster, keyspace) = preparar(&registry);

    let mut mutator = mutator(&keyspace);
    mutator
        .add_insertion(
            &KEY_1.to_string(),
            COLUMN_FAMILY,
            keyspace.create_column(COLUMN_EMAIL.to_string(), EMAIL_1.to_string()),
        )
        .add_deletion(&KEY_2.to_string(), COLUMN_FAMILY, &COLUMN_EMAIL.to_string());
    assert_eq!(mutator.pending(), 2);

    let resultado = mutator.execute().unwrap();
    assert_eq!(resultado.operaciones, 2);
    assert_eq!(resultado.host.as_deref(), Some(common::ENDPOINT));
    assert_eq!(mutator.pending(), 0);

    // Ejecutar de nuevo no manda nada
    assert_eq!(mutator.execute().unwrap().operaciones, 0);
}

#[test]
fn failed_batch_applies_nothing_and_keeps_the_queue() {
    let simulado = cluster_simulado();
    let registry = registry(&simulado);
    let (_cluster, keyspace) = preparar(&registry);

    let mut mutator = mutator(&keyspace);
    mutator
        .add_insertion(
            &KEY_1.to_string(),
            COLUMN_FAMILY,
            keyspace.create_column(COLUMN_EMAIL.to_string(), EMAIL_1.to_string()),
        )
        .add_insertion(
            &KEY_1.to_string(),
            "NoExiste",
            keyspace.create_column(COLUMN_EMAIL.to_string(), EMAIL_1.to_string()),
        );

    let err = mutator.execute().unwrap_err();
    assert!(matches!(err, ErrorType::Request(_)), "{err:?}");
    assert_eq!(mutator.pending(), 2);
    assert_eq!(
        leer(&keyspace, KEY_1, COLUMN_FAMILY, COLUMN_EMAIL).unwrap(),
        None
    );
}

#[test]
fn query_without_key_is_a_configuration_error() {
    let simulado = cluster_simulado();
    let registry = registry(&simulado);
    let (_cluster, keyspace) = preparar(&registry);

    let mut query = query(&keyspace);
    query
        .set_column_family(COLUMN_FAMILY)
        .set_name(COLUMN_EMAIL.to_string());
    let err = query.execute().unwrap_err();
    assert!(matches!(err, ErrorType::Configuration(_)), "{err:?}");

    let mut sin_nombre = common::query(&keyspace);
    sin_nombre
        .set_key(KEY_1.to_string())
        .set_column_family(COLUMN_FAMILY);
    let err = sin_nombre.execute().unwrap_err();
    assert!(matches!(err, ErrorType::Configuration(_)), "{err:?}");
}

#[test]
fn query_can_be_reused_after_changing_the_name() {
    let simulado = cluster_simulado();
    let registry = registry(&simulado);
    let (_cluster, keyspace) = preparar(&registry);
    insertar(&keyspace, KEY_2, COLUMN_EMAIL, "nathan@example.com");
    insertar(&keyspace, KEY_2, COLUMN_FIRSTNAME, "Nathan");

    let mut query = query(&keyspace);
    query
        .set_key(KEY_2.to_string())
        .set_column_family(COLUMN_FAMILY)
        .set_name(COLUMN_EMAIL.to_string());
    let email = query.execute().unwrap().into_value().unwrap();
    assert_eq!(email.value, "nathan@example.com");

    query.set_name(COLUMN_FIRSTNAME.to_string());
    let resultado = query.execute().unwrap();
    assert_eq!(resultado.host, common::ENDPOINT);
    assert_eq!(resultado.get().as_ref().unwrap().value, "Nathan");
}

#[test]
fn clocks_are_strictly_increasing() {
    let simulado = cluster_simulado();
    let registry = registry(&simulado);
    let (_cluster, keyspace) = preparar(&registry);

    let clocks: Vec<i64> = (0..1000).map(|_| keyspace.create_clock()).collect();
    assert!(clocks.windows(2).all(|par| par[0] < par[1]));
}

#[test]
fn handles_on_the_same_keyspace_share_one_clock() {
    let simulado = cluster_simulado();
    let registry = registry(&simulado);
    let (_cluster, keyspace) = preparar(&registry);
    let otro_cluster = registry
        .get_or_create(CLUSTER_NAME, common::ENDPOINT)
        .unwrap();
    let otro = Keyspace::new(KEYSPACE, &otro_cluster);

    let mut clocks = vec![];
    for _ in 0..1000 {
        clocks.push(keyspace.create_clock());
        clocks.push(otro.create_clock());
    }
    assert!(clocks.windows(2).all(|par| par[0] < par[1]));
}

#[test]
fn read_returns_the_clock_of_the_write() {
    let simulado = cluster_simulado();
    let registry = registry(&simulado);
    let (_cluster, keyspace) = preparar(&registry);

    let column = keyspace.create_column(COLUMN_EMAIL.to_string(), EMAIL_1.to_string());
    let clock = column.clock;
    mutator(&keyspace)
        .insert(&KEY_1.to_string(), COLUMN_FAMILY, column)
        .unwrap();

    let leida = leer(&keyspace, KEY_1, COLUMN_FAMILY, COLUMN_EMAIL)
        .unwrap()
        .unwrap();
    assert_eq!(leida.clock, clock);
}

#[test]
fn older_clock_does_not_overwrite_a_newer_write() {
    let simulado = cluster_simulado();
    let registry = registry(&simulado);
    let (_cluster, keyspace) = preparar(&registry);
    let mutator = mutator(&keyspace);
    let key = KEY_1.to_string();

    mutator
        .insert(
            &key,
            COLUMN_FAMILY,
            Column::new(COLUMN_EMAIL.to_string(), "nuevo".to_string(), 200),
        )
        .unwrap();
    mutator
        .insert(
            &key,
            COLUMN_FAMILY,
            Column::new(COLUMN_EMAIL.to_string(), "viejo".to_string(), 100),
        )
        .unwrap();

    let leida = leer(&keyspace, KEY_1, COLUMN_FAMILY, COLUMN_EMAIL)
        .unwrap()
        .unwrap();
    assert_eq!(leida.value, "nuevo");
    assert_eq!(leida.clock, 200);
}

#[test]
fn immediate_delete_hides_the_column() {
    let simulado = cluster_simulado();
    let registry = registry(&simulado);
    let (_cluster, keyspace) = preparar(&registry);
    insertar(&keyspace, KEY_1, COLUMN_EMAIL, EMAIL_1);

    let resultado = mutator(&keyspace)
        .delete(&KEY_1.to_string(), COLUMN_FAMILY, &COLUMN_EMAIL.to_string())
        .unwrap();
    assert_eq!(resultado.operaciones, 1);
    assert_eq!(
        leer(&keyspace, KEY_1, COLUMN_FAMILY, COLUMN_EMAIL).unwrap(),
        None
    );

    // Se puede volver a escribir después del borrado
    insertar(&keyspace, KEY_1, COLUMN_EMAIL, "otro@example.com");
    let leida = leer(&keyspace, KEY_1, COLUMN_FAMILY, COLUMN_EMAIL)
        .unwrap()
        .unwrap();
    assert_eq!(leida.value, "otro@example.com");
}

#[test]
fn long_and_bytes_serializers_round_trip_through_the_node() {
    let simulado = cluster_simulado();
    let registry = registry(&simulado);
    let (_cluster, keyspace) = preparar(&registry);

    let mutator = Mutator::new(&keyspace, LongSerializer, StringSerializer, BytesSerializer);
    mutator
        .insert(
            &42,
            COLUMN_FAMILY,
            keyspace.create_column("avatar".to_string(), vec![0u8, 1, 2, 255]),
        )
        .unwrap();

    let mut query = ColumnQuery::new(&keyspace, LongSerializer, StringSerializer, BytesSerializer);
    query
        .set_key(42)
        .set_column_family(COLUMN_FAMILY)
        .set_name("avatar".to_string());
    let leida = query.execute().unwrap().into_value().unwrap();
    assert_eq!(leida.name, "avatar");
    assert_eq!(leida.value, vec![0u8, 1, 2, 255]);

    // Otra clave long no ve la columna
    query.set_key(43);
    assert_eq!(query.execute().unwrap().into_value(), None);
}

#[test]
fn connection_is_reopened_after_the_node_comes_back() {
    let simulado = cluster_simulado();
    let registry = registry(&simulado);
    let (_cluster, keyspace) = preparar(&registry);
    assert_eq!(simulado.conexiones(), 1);

    simulado.set_disponible(false);
    let err = leer(&keyspace, KEY_1, COLUMN_FAMILY, COLUMN_EMAIL).unwrap_err();
    assert!(matches!(err, ErrorType::Connection(_)), "{err:?}");

    simulado.set_disponible(true);
    insertar(&keyspace, KEY_1, COLUMN_EMAIL, EMAIL_1);
    assert!(leer(&keyspace, KEY_1, COLUMN_FAMILY, COLUMN_EMAIL)
        .unwrap()
        .is_some());
    assert_eq!(simulado.conexiones(), 2);
}
