mod common;

use cliente_cassandra::error::ErrorType;
use cliente_cassandra::harness::{
    run_all, HarnessContext, CLUSTER_NAME, COLUMN_DOB, COLUMN_EMAIL, COLUMN_FAMILY,
    COLUMN_FIRSTNAME, COLUMN_STATUS, DOB_1, EMAIL_1, EMAIL_2, FIRSTNAME_2, KEYSPACE, KEY_1,
    KEY_2, STATUS_1,
};
use cliente_cassandra::cluster_functions::keyspace_definition::KeyspaceDefinition;
use cliente_cassandra::keyspace::Keyspace;
use common::{cluster_simulado, insertar, leer, mutator, preparar, registry, ENDPOINT};

#[test]
fn get_or_create_twice_shares_the_cluster() {
    let simulado = cluster_simulado();
    let registry = registry(&simulado);
    let (cluster, keyspace) = preparar(&registry);

    let otro = registry.get_or_create(CLUSTER_NAME, ENDPOINT).unwrap();
    assert!(otro.same_handle(&cluster));
    assert_eq!(simulado.conexiones(), 1);

    insertar(&keyspace, KEY_1, COLUMN_EMAIL, EMAIL_1);
    let column = leer(&Keyspace::new(KEYSPACE, &otro), KEY_1, COLUMN_FAMILY, COLUMN_EMAIL)
        .unwrap()
        .unwrap();
    assert_eq!(column.value, EMAIL_1);
}

#[test]
fn different_endpoints_for_an_existing_name_are_ignored() {
    let simulado = cluster_simulado();
    let registry = registry(&simulado);
    let cluster = registry.get_or_create(CLUSTER_NAME, ENDPOINT).unwrap();

    let otro = registry.get_or_create(CLUSTER_NAME, "nodo9:9160").unwrap();
    assert!(otro.same_handle(&cluster));
    assert_eq!(otro.endpoints(), &[ENDPOINT.to_string()]);
}

#[test]
fn write_then_read_returns_name_and_value() {
    let simulado = cluster_simulado();
    let registry = registry(&simulado);
    let (_cluster, keyspace) = preparar(&registry);

    insertar(&keyspace, KEY_1, COLUMN_EMAIL, EMAIL_1);

    let column = leer(&keyspace, KEY_1, COLUMN_FAMILY, COLUMN_EMAIL)
        .unwrap()
        .unwrap();
    assert_eq!(column.name, COLUMN_EMAIL);
    assert_eq!(column.value, EMAIL_1);
}

#[test]
fn batch_insertions_are_visible_only_after_execute() {
    let simulado = cluster_simulado();
    let registry = registry(&simulado);
    let (_cluster, keyspace) = preparar(&registry);

    let mut batch = mutator(&keyspace);
    batch
        .add_insertion(
            &KEY_2.to_string(),
            COLUMN_FAMILY,
            keyspace.create_column(COLUMN_FIRSTNAME.to_string(), FIRSTNAME_2.to_string()),
        )
        .add_insertion(
            &KEY_2.to_string(),
            COLUMN_FAMILY,
            keyspace.create_column(COLUMN_EMAIL.to_string(), EMAIL_2.to_string()),
        )
        .add_insertion(
            &KEY_1.to_string(),
            COLUMN_FAMILY,
            keyspace.create_column(COLUMN_DOB.to_string(), DOB_1.to_string()),
        );
    assert_eq!(batch.pending(), 3);
    assert_eq!(leer(&keyspace, KEY_2, COLUMN_FAMILY, COLUMN_EMAIL).unwrap(), None);

    let result = batch.execute().unwrap();
    assert_eq!(result.operaciones, 3);
    assert_eq!(result.host.as_deref(), Some(ENDPOINT));
    assert_eq!(batch.pending(), 0);

    for (key, name, value) in [
        (KEY_2, COLUMN_FIRSTNAME, FIRSTNAME_2),
        (KEY_2, COLUMN_EMAIL, EMAIL_2),
        (KEY_1, COLUMN_DOB, DOB_1),
    ] {
        let column = leer(&keyspace, key, COLUMN_FAMILY, name).unwrap().unwrap();
        assert_eq!(column.name, name);
        assert_eq!(column.value, value);
    }
}

#[test]
fn read_with_a_value_as_column_family_is_a_request_error() {
    let simulado = cluster_simulado();
    let registry = registry(&simulado);
    let (_cluster, keyspace) = preparar(&registry);

    insertar(&keyspace, KEY_1, COLUMN_STATUS, STATUS_1);
    let column = leer(&keyspace, KEY_1, COLUMN_FAMILY, COLUMN_STATUS)
        .unwrap()
        .unwrap();
    assert_eq!(column.value, STATUS_1);

    let mut borrado = mutator(&keyspace);
    borrado.add_deletion(&KEY_1.to_string(), COLUMN_FAMILY, &COLUMN_STATUS.to_string());
    borrado.execute().unwrap();

    let err = leer(&keyspace, KEY_1, STATUS_1, COLUMN_STATUS).unwrap_err();
    assert!(matches!(err, ErrorType::Request(_)), "{err:?}");

    // En la column family correcta el borrado se ve como ausencia
    assert_eq!(leer(&keyspace, KEY_1, COLUMN_FAMILY, COLUMN_STATUS).unwrap(), None);
}

#[test]
fn never_written_column_is_absent() {
    let simulado = cluster_simulado();
    let registry = registry(&simulado);
    let (_cluster, keyspace) = preparar(&registry);

    assert_eq!(leer(&keyspace, KEY_1, COLUMN_FAMILY, "nickname").unwrap(), None);
    assert_eq!(leer(&keyspace, "nadie", COLUMN_FAMILY, COLUMN_EMAIL).unwrap(), None);
}

#[test]
fn reads_after_drop_keyspace_are_not_found() {
    let simulado = cluster_simulado();
    let registry = registry(&simulado);
    let (cluster, keyspace) = preparar(&registry);
    insertar(&keyspace, KEY_1, COLUMN_EMAIL, EMAIL_1);

    cluster.drop_keyspace(KEYSPACE).unwrap();

    let err = leer(&keyspace, KEY_1, COLUMN_FAMILY, COLUMN_EMAIL).unwrap_err();
    assert!(matches!(err, ErrorType::NotFound(_)), "{err:?}");

    // Recrearlo no trae de vuelta los datos viejos
    cluster.add_keyspace(&common::definicion()).unwrap();
    assert_eq!(leer(&keyspace, KEY_1, COLUMN_FAMILY, COLUMN_EMAIL).unwrap(), None);
}

#[test]
fn harness_runs_every_scenario_against_the_simulated_node() {
    let simulado = cluster_simulado();
    let ctx = HarnessContext::new(registry(&simulado));

    let informe = run_all(&ctx);

    assert!(informe.exitoso(), "{informe:?}");
    assert!(informe.fallidos().is_empty());
    assert_eq!(informe.escenarios.len(), 6);
    assert!(informe
        .resultado("delete_then_read_invalid_column_family")
        .unwrap()
        .is_ok());
    let nodo = simulado.nodo();
    assert!(!nodo.lock().unwrap().existe_keyspace(KEYSPACE));
}

#[test]
fn failed_setup_still_runs_teardown() {
    let simulado = cluster_simulado();
    let ctx = HarnessContext::new(registry(&simulado));

    // Un keyspace con el mismo nombre y otro factor de replicación
    let cluster = ctx.registry.get_or_create(CLUSTER_NAME, ENDPOINT).unwrap();
    cluster
        .add_keyspace(&KeyspaceDefinition::new(KEYSPACE, "SimpleStrategy", 3))
        .unwrap();

    let informe = run_all(&ctx);

    assert!(!informe.exitoso());
    assert!(matches!(
        informe.setup,
        Some(cliente_cassandra::harness::FalloEscenario::Cliente(
            ErrorType::SchemaConflict(_)
        ))
    ));
    assert!(informe.escenarios.is_empty());
    assert!(informe.teardown.is_none(), "{:?}", informe.teardown);
    assert!(!simulado.nodo().lock().unwrap().existe_keyspace(KEYSPACE));
}

#[test]
fn teardown_failure_is_reported() {
    let simulado = cluster_simulado();
    let mut ctx = HarnessContext::new(registry(&simulado));
    ctx.endpoints = "nodo-inexistente:9160".to_string();

    let informe = run_all(&ctx);

    assert!(matches!(
        informe.setup,
        Some(cliente_cassandra::harness::FalloEscenario::Cliente(
            ErrorType::Connection(_)
        ))
    ));
    assert!(matches!(
        informe.teardown,
        Some(cliente_cassandra::harness::FalloEscenario::Cliente(
            ErrorType::Connection(_)
        ))
    ));
}
