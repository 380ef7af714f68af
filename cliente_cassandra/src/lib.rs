pub mod cluster;
pub mod cluster_functions;
pub mod column;
pub mod column_query;
pub mod conexion;
pub mod config;
pub mod error;
pub mod error_codes;
pub mod harness;
pub mod keyspace;
pub mod logger;
pub mod message;
pub mod message_functions;
pub mod mutator;
pub mod nodo_simulado;
pub mod nodo_simulado_functions;
pub mod serializer;
pub mod transporte;
