// logger.rs
use crate::error::ErrorType;
use flexi_logger::{Duplicate, FileSpec, Logger, LoggerHandle, WriteMode};
use std::io::Write;
use std::path::Path;

/// Inicializa el logger del binario. Con `log_dir` escribe a archivo y
/// duplica a stdout desde Info; sin él usa env_logger por consola.
/// El handle devuelto tiene que vivir hasta el final del programa.
pub fn init_logger(log_dir: Option<&Path>, level: &str) -> Result<Option<LoggerHandle>, ErrorType> {
    let Some(log_dir) = log_dir else {
        env_logger::Builder::new()
            .parse_filters(level)
            .try_init()
            .map_err(|e| ErrorType::Configuration(format!("No se pudo iniciar el logger: {}", e)))?;
        return Ok(None);
    };

    // Definimos un FileSpec que almacene los logs en la carpeta pedida
    let file_spec = FileSpec::default().directory(log_dir);

    let handle = Logger::try_with_str(level)
        .map_err(|e| ErrorType::Configuration(format!("Nivel de log inválido {}: {}", level, e)))?
        .log_to_file(file_spec)
        .write_mode(WriteMode::BufferAndFlush)
        .duplicate_to_stdout(Duplicate::Info)
        .format(|write, _now, record| {
            write!(
                write,
                "{} [{}] - {}",
                chrono::Local::now().format("%Y-%m-%d: %H:%M:%S"),
                record.level(),
                record.args()
            )
        })
        .start()
        .map_err(|e| ErrorType::Configuration(format!("No se pudo iniciar el logger: {}", e)))?;
    Ok(Some(handle))
}
