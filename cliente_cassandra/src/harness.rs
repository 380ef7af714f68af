// harness.rs
use crate::cluster::{Cluster, ClusterRegistry};
use crate::cluster_functions::{
    column_family_definition::ColumnFamilyDefinition, keyspace_definition::KeyspaceDefinition,
};
use crate::column::Column;
use crate::column_query::ColumnQuery;
use crate::config::ConfigCliente;
use crate::error::ErrorType;
use crate::keyspace::Keyspace;
use crate::message_functions::consistency::Consistency;
use crate::mutator::Mutator;
use crate::serializer::StringSerializer;
use log::{debug, error, info};
use thiserror::Error;

pub const CLUSTER_NAME: &str = "Test Cluster";
pub const HOST: &str = "localhost";
pub const PORT: u16 = 9160;
pub const KEYSPACE: &str = "Keyspace2";
pub const COLUMN_FAMILY: &str = "Users";
pub const COLUMN_EMAIL: &str = "email";
pub const COLUMN_FIRSTNAME: &str = "firstname";
pub const COLUMN_DOB: &str = "dob";
pub const COLUMN_STATUS: &str = "status";
pub const REPLICATION_STRATEGY: &str = "org.apache.cassandra.locator.SimpleStrategy";
pub const REPLICATION_FACTOR: u32 = 1;

pub const KEY_1: &str = "dhydrated";
pub const EMAIL_1: &str = "dhydrated@gmail.com";
pub const DOB_1: &str = "1999-02-01";
pub const STATUS_1: &str = "disabled";

pub const KEY_2: &str = "cassandra";
pub const EMAIL_2: &str = "cassandra@gmail.com";
pub const FIRSTNAME_2: &str = "cassandra";

const COLUMN_NEVER_WRITTEN: &str = "nickname";

#[derive(Debug, Error)]
pub enum FalloEscenario {
    #[error(transparent)]
    Cliente(#[from] ErrorType),
    #[error("Verificación fallida: {0}")]
    Verificacion(String),
}

pub type Escenario = fn(&HarnessContext, &Cluster) -> Result<(), FalloEscenario>;

/// Escenarios en el orden en que los corre `run_all`.
pub const ESCENARIOS: &[(&str, Escenario)] = &[
    ("create_column_family", create_column_family),
    ("insert_and_get", insert_and_get),
    ("multi_insert_and_get", multi_insert_and_get),
    (
        "delete_then_read_invalid_column_family",
        delete_then_read_invalid_column_family,
    ),
    ("absent_is_not_error", absent_is_not_error),
    ("idempotent_cluster", idempotent_cluster),
];

/// Todo lo que necesitan los hooks y los escenarios; se pasa explícitamente
/// en vez de vivir en estado global.
pub struct HarnessContext {
    pub registry: ClusterRegistry,
    pub cluster_name: String,
    pub endpoints: String,
    pub keyspace: String,
    pub column_family: String,
    pub replication_strategy: String,
    pub replication_factor: u32,
    pub consistency: Consistency,
}

impl HarnessContext {
    pub fn new(registry: ClusterRegistry) -> Self {
        HarnessContext {
            registry,
            cluster_name: CLUSTER_NAME.to_string(),
            endpoints: format!("{}:{}", HOST, PORT),
            keyspace: KEYSPACE.to_string(),
            column_family: COLUMN_FAMILY.to_string(),
            replication_strategy: REPLICATION_STRATEGY.to_string(),
            replication_factor: REPLICATION_FACTOR,
            consistency: Consistency::One,
        }
    }

    pub fn from_config(registry: ClusterRegistry, config: &ConfigCliente) -> Result<Self, ErrorType> {
        Ok(HarnessContext {
            registry,
            cluster_name: config.cluster_name.clone(),
            endpoints: config.endpoints(),
            keyspace: config.keyspace.clone(),
            column_family: config.column_family.clone(),
            replication_strategy: config.replication_strategy.clone(),
            replication_factor: config.replication_factor,
            consistency: config.consistency()?,
        })
    }

    fn cluster(&self) -> Result<Cluster, ErrorType> {
        self.registry
            .get_or_create(&self.cluster_name, &self.endpoints)
    }

    fn keyspace(&self, cluster: &Cluster) -> Keyspace {
        Keyspace::new(&self.keyspace, cluster).with_consistency(self.consistency)
    }

    fn mutator(
        &self,
        keyspace: &Keyspace,
    ) -> Mutator<StringSerializer, StringSerializer, StringSerializer> {
        Mutator::new(keyspace, StringSerializer, StringSerializer, StringSerializer)
    }

    fn query(
        &self,
        keyspace: &Keyspace,
    ) -> ColumnQuery<StringSerializer, StringSerializer, StringSerializer> {
        ColumnQuery::new(keyspace, StringSerializer, StringSerializer, StringSerializer)
    }
}

/// Resultado de un escenario.
#[derive(Debug)]
pub struct ResultadoEscenario {
    pub nombre: &'static str,
    pub resultado: Result<(), FalloEscenario>,
}

#[derive(Debug, Default)]
pub struct InformeHarness {
    pub setup: Option<FalloEscenario>,
    pub escenarios: Vec<ResultadoEscenario>,
    pub teardown: Option<FalloEscenario>,
}

impl InformeHarness {
    pub fn exitoso(&self) -> bool {
        self.setup.is_none()
            && self.teardown.is_none()
            && self.escenarios.iter().all(|e| e.resultado.is_ok())
    }

    pub fn fallidos(&self) -> Vec<&'static str> {
        self.escenarios
            .iter()
            .filter(|e| e.resultado.is_err())
            .map(|e| e.nombre)
            .collect()
    }

    pub fn resultado(&self, nombre: &str) -> Option<&Result<(), FalloEscenario>> {
        self.escenarios
            .iter()
            .find(|e| e.nombre == nombre)
            .map(|e| &e.resultado)
    }
}

/// Crea el keyspace (con su column family) una vez antes de todos los escenarios.
pub fn before_all(ctx: &HarnessContext) -> Result<(), FalloEscenario> {
    let cluster = ctx.cluster()?;
    let definition = KeyspaceDefinition::new(
        &ctx.keyspace,
        &ctx.replication_strategy,
        ctx.replication_factor,
    )
    .with_column_family(&ctx.column_family);
    cluster.add_keyspace(&definition)?;

    let keyspace = ctx.keyspace(&cluster);
    verificar_igual(keyspace.keyspace_name(), ctx.keyspace.as_str(), "nombre del keyspace")
}

/// Obtiene el cluster para un escenario.
pub fn set_up(ctx: &HarnessContext) -> Result<Cluster, ErrorType> {
    ctx.cluster()
}

/// Borra el keyspace y verifica que ya no se pueda leer de él.
pub fn after_all(ctx: &HarnessContext) -> Result<(), FalloEscenario> {
    let cluster = ctx.cluster()?;
    cluster.drop_keyspace(&ctx.keyspace)?;

    let keyspace = ctx.keyspace(&cluster);
    let mut query = ctx.query(&keyspace);
    query
        .set_key(KEY_1.to_string())
        .set_column_family(&ctx.column_family)
        .set_name(COLUMN_EMAIL.to_string());
    match query.execute() {
        Err(ErrorType::NotFound(_)) => Ok(()),
        Err(e) => Err(e.into()),
        Ok(result) => Err(FalloEscenario::Verificacion(format!(
            "Se leyó {:?} de un keyspace eliminado",
            result.value
        ))),
    }
}

/// Corre setup, los escenarios y el teardown. El teardown se corre siempre.
pub fn run_all(ctx: &HarnessContext) -> InformeHarness {
    let mut informe = InformeHarness::default();

    match before_all(ctx) {
        Ok(()) => {
            for &(nombre, escenario) in ESCENARIOS {
                let resultado = set_up(ctx)
                    .map_err(FalloEscenario::from)
                    .and_then(|cluster| escenario(ctx, &cluster));
                match &resultado {
                    Ok(()) => info!("Escenario {} OK", nombre),
                    Err(e) => error!("Escenario {} falló: {}", nombre, e),
                }
                informe.escenarios.push(ResultadoEscenario { nombre, resultado });
            }
        }
        Err(e) => {
            error!("No se pudo preparar el keyspace {}: {}", ctx.keyspace, e);
            informe.setup = Some(e);
        }
    }

    if let Err(e) = after_all(ctx) {
        error!("Falló el teardown del keyspace {}: {}", ctx.keyspace, e);
        informe.teardown = Some(e);
    }
    informe
}

fn verificar_igual<T: PartialEq + std::fmt::Debug + ?Sized>(
    obtenido: &T,
    esperado: &T,
    que: &str,
) -> Result<(), FalloEscenario> {
    if obtenido == esperado {
        Ok(())
    } else {
        Err(FalloEscenario::Verificacion(format!(
            "{}: se esperaba {:?}, llegó {:?}",
            que, esperado, obtenido
        )))
    }
}

fn verificar_columna(
    column: Option<Column<String, String>>,
    name: &str,
    value: &str,
) -> Result<(), FalloEscenario> {
    let column = column.ok_or_else(|| {
        FalloEscenario::Verificacion(format!("No se encontró la columna {}", name))
    })?;
    verificar_igual(column.name.as_str(), name, "nombre de la columna")?;
    verificar_igual(column.value.as_str(), value, "valor de la columna")
}

fn leer(
    ctx: &HarnessContext,
    keyspace: &Keyspace,
    key: &str,
    name: &str,
) -> Result<Option<Column<String, String>>, ErrorType> {
    let mut query = ctx.query(keyspace);
    query
        .set_key(key.to_string())
        .set_name(name.to_string())
        .set_column_family(&ctx.column_family);
    Ok(query.execute()?.into_value())
}

pub fn create_column_family(ctx: &HarnessContext, cluster: &Cluster) -> Result<(), FalloEscenario> {
    let definition = ColumnFamilyDefinition::new(&ctx.keyspace, &ctx.column_family);
    cluster.add_column_family(&definition)?;
    Ok(())
}

pub fn insert_and_get(ctx: &HarnessContext, cluster: &Cluster) -> Result<(), FalloEscenario> {
    let keyspace = ctx.keyspace(cluster);

    // insert
    let mutator = ctx.mutator(&keyspace);
    mutator.insert(
        &KEY_1.to_string(),
        &ctx.column_family,
        keyspace.create_column(COLUMN_EMAIL.to_string(), EMAIL_1.to_string()),
    )?;

    // get
    let column = leer(ctx, &keyspace, KEY_1, COLUMN_EMAIL)?;
    verificar_columna(column, COLUMN_EMAIL, EMAIL_1)
}

pub fn multi_insert_and_get(ctx: &HarnessContext, cluster: &Cluster) -> Result<(), FalloEscenario> {
    let keyspace = ctx.keyspace(cluster);

    let mut mutator = ctx.mutator(&keyspace);
    mutator
        .add_insertion(
            &KEY_2.to_string(),
            &ctx.column_family,
            keyspace.create_column(COLUMN_FIRSTNAME.to_string(), FIRSTNAME_2.to_string()),
        )
        .add_insertion(
            &KEY_2.to_string(),
            &ctx.column_family,
            keyspace.create_column(COLUMN_EMAIL.to_string(), EMAIL_2.to_string()),
        )
        .add_insertion(
            &KEY_1.to_string(),
            &ctx.column_family,
            keyspace.create_column(COLUMN_DOB.to_string(), DOB_1.to_string()),
        );
    let result = mutator.execute()?;
    verificar_igual(&result.operaciones, &3, "operaciones del batch")?;

    let column = leer(ctx, &keyspace, KEY_2, COLUMN_EMAIL)?;
    debug!("test: {:?}", column);
    verificar_columna(column, COLUMN_EMAIL, EMAIL_2)?;

    // Cada inserción del batch se lee por separado
    verificar_columna(
        leer(ctx, &keyspace, KEY_2, COLUMN_FIRSTNAME)?,
        COLUMN_FIRSTNAME,
        FIRSTNAME_2,
    )?;
    verificar_columna(leer(ctx, &keyspace, KEY_1, COLUMN_DOB)?, COLUMN_DOB, DOB_1)
}

/// Después de borrar, la lectura usa a propósito un valor como column family:
/// el cluster tiene que rechazarla como request inválido.
pub fn delete_then_read_invalid_column_family(
    ctx: &HarnessContext,
    cluster: &Cluster,
) -> Result<(), FalloEscenario> {
    let keyspace = ctx.keyspace(cluster);

    // insert
    let insert_mutator = ctx.mutator(&keyspace);
    insert_mutator.insert(
        &KEY_1.to_string(),
        &ctx.column_family,
        keyspace.create_column(COLUMN_STATUS.to_string(), STATUS_1.to_string()),
    )?;

    // get
    let mut query = ctx.query(&keyspace);
    query
        .set_key(KEY_1.to_string())
        .set_name(COLUMN_STATUS.to_string())
        .set_column_family(&ctx.column_family);
    verificar_columna(query.execute()?.into_value(), COLUMN_STATUS, STATUS_1)?;

    // delete
    let mut delete_mutator = ctx.mutator(&keyspace);
    delete_mutator.add_deletion(&KEY_1.to_string(), &ctx.column_family, &COLUMN_STATUS.to_string());
    delete_mutator.execute()?;

    // get
    match query.set_column_family(STATUS_1).execute() {
        Err(ErrorType::Request(message)) => {
            debug!("Lectura rechazada como se esperaba: {}", message);
            Ok(())
        }
        Err(e) => Err(e.into()),
        Ok(result) => Err(FalloEscenario::Verificacion(format!(
            "La lectura sobre la column family {} no falló: {:?}",
            STATUS_1, result.value
        ))),
    }
}

pub fn absent_is_not_error(ctx: &HarnessContext, cluster: &Cluster) -> Result<(), FalloEscenario> {
    let keyspace = ctx.keyspace(cluster);
    let column = leer(ctx, &keyspace, KEY_1, COLUMN_NEVER_WRITTEN)?;
    match column {
        None => Ok(()),
        Some(column) => Err(FalloEscenario::Verificacion(format!(
            "Se leyó {:?} de una columna nunca escrita",
            column
        ))),
    }
}

/// Pedir de nuevo el cluster devuelve el mismo handle y ve los mismos datos.
pub fn idempotent_cluster(ctx: &HarnessContext, cluster: &Cluster) -> Result<(), FalloEscenario> {
    let otro = ctx.cluster()?;
    if !otro.same_handle(cluster) {
        return Err(FalloEscenario::Verificacion(
            "get_or_create devolvió otro cluster".to_string(),
        ));
    }

    let keyspace = ctx.keyspace(cluster);
    let mutator = ctx.mutator(&keyspace);
    mutator.insert(
        &KEY_2.to_string(),
        &ctx.column_family,
        keyspace.create_column(COLUMN_DOB.to_string(), DOB_1.to_string()),
    )?;

    let column = leer(ctx, &ctx.keyspace(&otro), KEY_2, COLUMN_DOB)?;
    verificar_columna(column, COLUMN_DOB, DOB_1)
}
