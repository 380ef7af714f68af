// Conector en memoria: cada conexión es una sesión contra el mismo NodoSimulado
use crate::error::ErrorType;
use crate::message::{frame_len, HEADER_LEN, MAX_BODY_LEN};
use crate::nodo_simulado::{NodoSimulado, Sesion};
use crate::transporte::{Conector, Transporte};
use byteorder::{BigEndian, ReadBytesExt};
use std::collections::{HashSet, VecDeque};
use std::io::{self, Read, Write};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

fn lock_nodo(nodo: &Mutex<NodoSimulado>) -> io::Result<MutexGuard<'_, NodoSimulado>> {
    nodo.lock()
        .map_err(|_| io::Error::new(io::ErrorKind::Other, "Nodo simulado envenenado"))
}

/// Cluster de un solo nodo en memoria, alcanzable por los endpoints registrados.
#[derive(Clone)]
pub struct ClusterSimulado {
    nodo: Arc<Mutex<NodoSimulado>>,
    endpoints: HashSet<String>,
    disponible: Arc<AtomicBool>,
    conexiones: Arc<AtomicUsize>,
}

impl ClusterSimulado {
    pub fn new(endpoints: &[&str]) -> Self {
        Self::with_nodo(NodoSimulado::new(), endpoints)
    }

    pub fn with_nodo(nodo: NodoSimulado, endpoints: &[&str]) -> Self {
        ClusterSimulado {
            nodo: Arc::new(Mutex::new(nodo)),
            endpoints: endpoints.iter().map(|e| e.to_string()).collect(),
            disponible: Arc::new(AtomicBool::new(true)),
            conexiones: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn nodo(&self) -> Arc<Mutex<NodoSimulado>> {
        Arc::clone(&self.nodo)
    }

    /// Con el nodo caído no se aceptan conexiones y las abiertas fallan.
    pub fn set_disponible(&self, disponible: bool) {
        self.disponible.store(disponible, Ordering::SeqCst);
    }

    /// Conexiones abiertas con éxito desde que se creó el cluster.
    pub fn conexiones(&self) -> usize {
        self.conexiones.load(Ordering::SeqCst)
    }

    /// Atiende una conexión real (ej: un TcpStream) hasta que el cliente cierre.
    pub fn atender<S: Read + Write>(&self, mut stream: S) -> io::Result<()> {
        let mut sesion = Sesion::default();
        loop {
            let mut header = [0; HEADER_LEN];
            match stream.read_exact(&mut header) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(()),
                Err(e) => return Err(e),
            }
            let length = (&header[5..9]).read_u32::<BigEndian>()?;
            if length > MAX_BODY_LEN {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("Frame de {} bytes supera el máximo", length),
                ));
            }
            let mut frame = header.to_vec();
            frame.resize(HEADER_LEN + length as usize, 0);
            stream.read_exact(&mut frame[HEADER_LEN..])?;

            let respuesta = lock_nodo(&self.nodo)?.procesar_frame(&frame, &mut sesion)?;
            stream.write_all(&respuesta)?;
            stream.flush()?;
        }
    }
}

impl Conector for ClusterSimulado {
    fn conectar(&self, endpoint: &str) -> Result<Box<dyn Transporte>, ErrorType> {
        if !self.endpoints.contains(endpoint) {
            return Err(ErrorType::Connection(format!(
                "Conexión rechazada por {}",
                endpoint
            )));
        }
        if !self.disponible.load(Ordering::SeqCst) {
            return Err(ErrorType::Connection(format!("{} no responde", endpoint)));
        }
        self.conexiones.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(TransporteSimulado {
            nodo: Arc::clone(&self.nodo),
            disponible: Arc::clone(&self.disponible),
            sesion: Sesion::default(),
            entrada: vec![],
            salida: VecDeque::new(),
        }))
    }
}

// Lo que se escribe se junta hasta completar un frame; la respuesta queda para leer
struct TransporteSimulado {
    nodo: Arc<Mutex<NodoSimulado>>,
    disponible: Arc<AtomicBool>,
    sesion: Sesion,
    entrada: Vec<u8>,
    salida: VecDeque<u8>,
}

impl Write for TransporteSimulado {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if !self.disponible.load(Ordering::SeqCst) {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "Nodo simulado caído"));
        }
        self.entrada.extend_from_slice(buf);
        loop {
            let largo = match frame_len(&self.entrada) {
                Some(largo) if self.entrada.len() >= largo => largo,
                _ => break,
            };
            let frame: Vec<u8> = self.entrada.drain(..largo).collect();
            let respuesta = lock_nodo(&self.nodo)?.procesar_frame(&frame, &mut self.sesion)?;
            self.salida.extend(respuesta);
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Read for TransporteSimulado {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.salida.is_empty() && !self.disponible.load(Ordering::SeqCst) {
            return Err(io::Error::new(
                io::ErrorKind::ConnectionReset,
                "Nodo simulado caído",
            ));
        }
        self.salida.read(buf)
    }
}
