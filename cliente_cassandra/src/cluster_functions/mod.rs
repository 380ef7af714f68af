pub mod column_family_definition;
pub mod cql;
pub mod keyspace_definition;
pub mod replication_class;
pub mod replication_config;
