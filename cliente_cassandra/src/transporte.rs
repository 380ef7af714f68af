// transporte.rs
use crate::error::ErrorType;
use log::{debug, warn};
use rustls::{ClientConfig, ClientConnection, RootCertStore, ServerName, StreamOwned};
use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Canal de bytes hacia un nodo: un socket, un socket con TLS o un nodo en memoria.
pub trait Transporte: Read + Write + Send {}

impl<T: Read + Write + Send> Transporte for T {}

/// Abre transportes hacia un endpoint `host:port`.
pub trait Conector: Send + Sync {
    fn conectar(&self, endpoint: &str) -> Result<Box<dyn Transporte>, ErrorType>;
}

// Conector por TCP, con TLS opcional
pub struct ConectorTcp {
    connect_timeout: Duration,
    request_timeout: Duration,
    tls: Option<Arc<ClientConfig>>,
    server_name: Option<String>,
}

impl ConectorTcp {
    pub fn new(connect_timeout: Duration, request_timeout: Duration) -> Self {
        ConectorTcp {
            connect_timeout,
            request_timeout,
            tls: None,
            server_name: None,
        }
    }

    /// Activa TLS. Sin `ca_cert` se confía en los certificados raíz del sistema.
    pub fn with_tls(
        mut self,
        ca_cert: Option<&Path>,
        server_name: Option<&str>,
    ) -> Result<Self, ErrorType> {
        let root_cert_store = match ca_cert {
            Some(path) => load_root_certificates(path)?,
            None => load_native_root_certificates()?,
        };
        let config = ClientConfig::builder()
            .with_safe_defaults()
            .with_root_certificates(root_cert_store)
            .with_no_client_auth();
        self.tls = Some(Arc::new(config));
        self.server_name = server_name.map(str::to_string);
        Ok(self)
    }

    fn abrir_socket(&self, endpoint: &str) -> Result<TcpStream, ErrorType> {
        let addrs = endpoint.to_socket_addrs().map_err(|e| {
            ErrorType::Connection(format!("No se pudo resolver {}: {}", endpoint, e))
        })?;

        let mut ultimo_error = None;
        for addr in addrs {
            match TcpStream::connect_timeout(&addr, self.connect_timeout) {
                Ok(stream) => {
                    stream.set_read_timeout(Some(self.request_timeout))?;
                    stream.set_write_timeout(Some(self.request_timeout))?;
                    stream.set_nodelay(true)?;
                    return Ok(stream);
                }
                Err(e) => {
                    debug!("No se pudo conectar a {}: {}", addr, e);
                    ultimo_error = Some(e);
                }
            }
        }
        Err(ErrorType::Connection(match ultimo_error {
            Some(e) => format!("No se pudo conectar a {}: {}", endpoint, e),
            None => format!("{} no resuelve a ninguna dirección", endpoint),
        }))
    }
}

impl Conector for ConectorTcp {
    fn conectar(&self, endpoint: &str) -> Result<Box<dyn Transporte>, ErrorType> {
        let stream = self.abrir_socket(endpoint)?;
        let config = match &self.tls {
            Some(config) => Arc::clone(config),
            None => return Ok(Box::new(stream)),
        };

        let host = self
            .server_name
            .clone()
            .unwrap_or_else(|| host_de(endpoint).to_string());
        let server_name = ServerName::try_from(host.as_str()).map_err(|_| {
            ErrorType::Configuration(format!("Nombre del servidor no válido: {}", host))
        })?;
        let client = ClientConnection::new(config, server_name).map_err(|e| {
            ErrorType::Connection(format!("Error al crear conexión TLS: {:?}", e))
        })?;
        Ok(Box::new(StreamOwned::new(client, stream)))
    }
}

// "localhost:9160" -> "localhost", "[::1]:9042" -> "::1"
fn host_de(endpoint: &str) -> &str {
    let host = match endpoint.rsplit_once(':') {
        Some((host, _)) => host,
        None => endpoint,
    };
    host.trim_start_matches('[').trim_end_matches(']')
}

// Cargar certificados raíz desde un archivo PEM
fn load_root_certificates(path: &Path) -> Result<RootCertStore, ErrorType> {
    let mut root_cert_store = RootCertStore::empty();
    let cert_file = File::open(path).map_err(|e| {
        ErrorType::Configuration(format!("No se pudo abrir {}: {}", path.display(), e))
    })?;
    let mut reader = BufReader::new(cert_file);
    let certs = rustls_pemfile::certs(&mut reader).map_err(|e| {
        ErrorType::Configuration(format!("PEM inválido en {}: {}", path.display(), e))
    })?;

    for cert in certs {
        root_cert_store
            .add(&rustls::Certificate(cert))
            .map_err(|_| ErrorType::Configuration("Certificado no válido".to_string()))?;
    }
    if root_cert_store.is_empty() {
        return Err(ErrorType::Configuration(format!(
            "{} no contiene certificados",
            path.display()
        )));
    }
    Ok(root_cert_store)
}

fn load_native_root_certificates() -> Result<RootCertStore, ErrorType> {
    let mut root_cert_store = RootCertStore::empty();
    let certs = rustls_native_certs::load_native_certs().map_err(|e| {
        ErrorType::Configuration(format!("No se pudieron leer los certificados del sistema: {}", e))
    })?;
    for cert in certs {
        if let Err(e) = root_cert_store.add(&rustls::Certificate(cert.0)) {
            warn!("Certificado del sistema ignorado: {:?}", e);
        }
    }
    Ok(root_cert_store)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;

    #[test]
    fn host_without_port() {
        assert_eq!(host_de("localhost:9160"), "localhost");
        assert_eq!(host_de("[::1]:9042"), "::1");
        assert_eq!(host_de("nodo1"), "nodo1");
    }

    #[test]
    fn closed_port_is_connection_error() {
        // Tomamos un puerto libre y lo soltamos antes de conectar
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let endpoint = listener.local_addr().unwrap().to_string();
        drop(listener);

        let conector = ConectorTcp::new(Duration::from_millis(500), Duration::from_millis(500));
        let result = conector.conectar(&endpoint);
        assert!(matches!(result, Err(ErrorType::Connection(_))));
    }

    #[test]
    fn missing_ca_file_is_configuration_error() {
        let conector = ConectorTcp::new(Duration::from_millis(500), Duration::from_millis(500));
        let result = conector.with_tls(Some(Path::new("/no/existe/ca.pem")), None);
        assert!(matches!(result, Err(ErrorType::Configuration(_))));
    }
}
