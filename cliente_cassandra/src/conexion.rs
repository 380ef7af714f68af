// conexion.rs
use crate::error::ErrorType;
use crate::message::{self, Message};
use crate::message_functions::{body::Body, body_authenticate::BodyAuthenticate};
use crate::transporte::{Conector, Transporte};
use log::{debug, info};

/// Usuario y contraseña para el autenticador del cluster (SASL PLAIN).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credenciales {
    pub user: String,
    pub password: String,
}

// Una conexión abierta y ya inicializada contra un nodo
pub struct Conexion {
    transporte: Box<dyn Transporte>,
    endpoint: String,
    stream_id: u16,
}

impl Conexion {
    /// Abre el transporte y hace el handshake: STARTUP, y si el nodo lo pide,
    /// AUTH_RESPONSE con las credenciales hasta recibir AUTH_SUCCESS.
    pub fn abrir(
        conector: &dyn Conector,
        endpoint: &str,
        credenciales: Option<&Credenciales>,
    ) -> Result<Self, ErrorType> {
        let transporte = conector.conectar(endpoint)?;
        let mut conexion = Conexion {
            transporte,
            endpoint: endpoint.to_string(),
            stream_id: 0,
        };

        let respuesta = conexion.enviar(message::create_startup_message())?;
        match respuesta.body {
            Body::Ready => {}
            Body::Authenticate(autenticador) => {
                conexion.autenticar(&autenticador, credenciales)?;
            }
            other => {
                return Err(ErrorType::Protocol(format!(
                    "Respuesta inesperada a STARTUP: {:?}",
                    other
                )))
            }
        }
        info!("Conectado a {}", endpoint);
        Ok(conexion)
    }

    fn autenticar(
        &mut self,
        autenticador: &BodyAuthenticate,
        credenciales: Option<&Credenciales>,
    ) -> Result<(), ErrorType> {
        let credenciales = credenciales.ok_or_else(|| {
            ErrorType::Connection(format!(
                "{} pide autenticación ({}) y no hay credenciales configuradas",
                self.endpoint, autenticador.authenticator
            ))
        })?;
        debug!("Autenticando contra {} como {}", self.endpoint, credenciales.user);

        let respuesta = self.enviar(message::create_response_auth_response(
            &credenciales.user,
            &credenciales.password,
        ))?;
        match respuesta.body {
            Body::AuthSuccess(_) => Ok(()),
            // PLAIN se resuelve en un solo paso
            Body::AuthChallenge(_) => Err(ErrorType::Connection(
                "El autenticador pidió más de un paso SASL".to_string(),
            )),
            other => Err(ErrorType::Protocol(format!(
                "Respuesta inesperada a AUTH_RESPONSE: {:?}",
                other
            ))),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Manda un request y espera su respuesta. Un frame ERROR se traduce al
    /// tipo de error del cliente.
    pub fn enviar(&mut self, mut request: Message) -> Result<Message, ErrorType> {
        self.stream_id = (self.stream_id + 1) % 0x8000;
        request.stream = self.stream_id;

        let bytes = request.serialize()?;
        self.transporte.write_all(&bytes)?;
        self.transporte.flush()?;

        let respuesta = Message::deserialize(&mut self.transporte)?;
        if !respuesta.is_response() {
            return Err(ErrorType::Protocol(format!(
                "Se esperaba una respuesta y llegó la versión {:#04x}",
                respuesta.version
            )));
        }
        if respuesta.stream != self.stream_id {
            return Err(ErrorType::Protocol(format!(
                "Stream de respuesta {} distinto del pedido {}",
                respuesta.stream, self.stream_id
            )));
        }

        match respuesta.body {
            Body::Error(error) => {
                debug!("{} respondió {:?}: {}", self.endpoint, error.code, error.message);
                Err(error.code.into_error(error.message))
            }
            _ => Ok(respuesta),
        }
    }
}
