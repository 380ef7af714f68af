pub mod almacenamiento;
pub mod conector_simulado;
pub mod sentencia;
