use cliente_cassandra::cluster::ClusterRegistry;
use cliente_cassandra::config::ConfigCliente;
use cliente_cassandra::error::ErrorType;
use cliente_cassandra::harness::{run_all, HarnessContext};
use cliente_cassandra::logger::init_logger;
use cliente_cassandra::transporte::ConectorTcp;
use log::{error, info};
use std::env;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

fn registry(config: &ConfigCliente) -> Result<ClusterRegistry, ErrorType> {
    let mut conector = ConectorTcp::new(config.connect_timeout(), config.request_timeout());
    if let Some(tls) = &config.tls {
        conector = conector.with_tls(tls.ca_cert.as_deref(), tls.server_name.as_deref())?;
    }
    let registry = ClusterRegistry::new(Arc::new(conector));
    Ok(match config.credenciales() {
        Some(credenciales) => registry.with_credentials(credenciales),
        None => registry,
    })
}

fn run(config: ConfigCliente) -> Result<bool, ErrorType> {
    let ctx = HarnessContext::from_config(registry(&config)?, &config)?;
    info!(
        "Corriendo escenarios contra {} ({})",
        ctx.cluster_name, ctx.endpoints
    );
    let informe = run_all(&ctx);

    for escenario in &informe.escenarios {
        match &escenario.resultado {
            Ok(()) => println!("OK    {}", escenario.nombre),
            Err(e) => println!("FALLO {}: {}", escenario.nombre, e),
        }
    }
    if let Some(e) = &informe.setup {
        println!("FALLO setup: {}", e);
    }
    if let Some(e) = &informe.teardown {
        println!("FALLO teardown: {}", e);
    }
    Ok(informe.exitoso())
}

// Uso: cliente_cassandra [config.json]
fn main() -> ExitCode {
    let args: Vec<String> = env::args().collect();
    let config = match args.get(1) {
        Some(path) => ConfigCliente::from_file(Path::new(path)),
        None => Ok(ConfigCliente::default()),
    };
    let config = match config {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let _logger = match init_logger(config.log_dir.as_deref(), &config.log_level) {
        Ok(handle) => handle,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    match run(config) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
