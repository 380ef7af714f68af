// Parser de las sentencias CQL que entiende el nodo simulado
use crate::error_codes::ErrorCode;
use crate::message_functions::body_error::BodyError;

const SYSTEM_SCHEMA: &str = "system_schema";
const KEYSPACES: &str = "keyspaces";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sentencia {
    CreateKeyspace {
        keyspace: String,
        replication: Vec<(String, String)>,
    },
    CreateTable {
        keyspace: String,
        tabla: String,
    },
    DropKeyspace {
        keyspace: String,
    },
    DropTable {
        keyspace: String,
        tabla: String,
    },
    Insert {
        keyspace: String,
        tabla: String,
        clock: Option<i64>,
    },
    Delete {
        keyspace: String,
        tabla: String,
        clock: Option<i64>,
    },
    Select {
        keyspace: String,
        tabla: String,
    },
    DescribeKeyspace,
}

impl Sentencia {
    /// Cantidad de `?` que tienen que venir ligados.
    pub fn marcadores(&self) -> usize {
        match self {
            Sentencia::Insert { .. } => 3,
            Sentencia::Delete { .. } | Sentencia::Select { .. } => 2,
            Sentencia::DescribeKeyspace => 1,
            _ => 0,
        }
    }

    pub fn es_mutacion(&self) -> bool {
        matches!(self, Sentencia::Insert { .. } | Sentencia::Delete { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Palabra(String),       // Palabra clave, identificador sin comillas o número
    Identificador(String), // Entre comillas dobles, respeta mayúsculas
    Literal(String),       // Entre comillas simples
    Simbolo(char),
}

impl Token {
    fn texto(&self) -> String {
        match self {
            Token::Palabra(palabra) => palabra.clone(),
            Token::Identificador(nombre) => format!("\"{}\"", nombre),
            Token::Literal(literal) => format!("'{}'", literal),
            Token::Simbolo(simbolo) => simbolo.to_string(),
        }
    }
}

fn error_sintaxis(mensaje: String) -> BodyError {
    BodyError::new(ErrorCode::SyntaxError, mensaje)
}

fn error_invalido(mensaje: String) -> BodyError {
    BodyError::new(ErrorCode::InvalidQuery, mensaje)
}

// Lee hasta la comilla de cierre; dos comillas seguidas son una comilla escapada
fn leer_entre_comillas(
    chars: &mut std::iter::Peekable<std::str::Chars<'_>>,
    comilla: char,
) -> Result<String, BodyError> {
    let mut contenido = String::new();
    loop {
        match chars.next() {
            Some(c) if c == comilla => {
                if chars.peek() == Some(&comilla) {
                    chars.next();
                    contenido.push(comilla);
                } else {
                    return Ok(contenido);
                }
            }
            Some(c) => contenido.push(c),
            None => {
                return Err(error_sintaxis(format!(
                    "Falta cerrar {}{}",
                    comilla, contenido
                )))
            }
        }
    }
}

fn tokenizar(query: &str) -> Result<Vec<Token>, BodyError> {
    let mut tokens = vec![];
    let mut chars = query.chars().peekable();
    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
        } else if c == '"' {
            chars.next();
            tokens.push(Token::Identificador(leer_entre_comillas(&mut chars, '"')?));
        } else if c == '\'' {
            chars.next();
            tokens.push(Token::Literal(leer_entre_comillas(&mut chars, '\'')?));
        } else if c.is_alphanumeric() || c == '_' || c == '-' {
            let mut palabra = String::new();
            while let Some(&c) = chars.peek() {
                if c.is_alphanumeric() || c == '_' || c == '-' {
                    palabra.push(c);
                    chars.next();
                } else {
                    break;
                }
            }
            tokens.push(Token::Palabra(palabra));
        } else if "(),.=?{}:;*".contains(c) {
            chars.next();
            tokens.push(Token::Simbolo(c));
        } else {
            return Err(error_sintaxis(format!("Caracter inesperado '{}'", c)));
        }
    }
    Ok(tokens)
}

struct Tokens {
    tokens: Vec<Token>,
    pos: usize,
}

impl Tokens {
    fn error(&self, esperado: &str) -> BodyError {
        match self.tokens.get(self.pos) {
            Some(token) => error_sintaxis(format!(
                "line 1:{} mismatched input '{}' expecting {}",
                self.pos,
                token.texto(),
                esperado
            )),
            None => error_sintaxis(format!(
                "line 1:{} mismatched input '<EOF>' expecting {}",
                self.pos, esperado
            )),
        }
    }

    fn es_palabra(&self, clave: &str) -> bool {
        matches!(self.tokens.get(self.pos), Some(Token::Palabra(p)) if p.eq_ignore_ascii_case(clave))
    }

    fn es_simbolo(&self, simbolo: char) -> bool {
        self.tokens.get(self.pos) == Some(&Token::Simbolo(simbolo))
    }

    fn palabra(&mut self, clave: &str) -> Result<(), BodyError> {
        if self.es_palabra(clave) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.error(clave))
        }
    }

    fn simbolo(&mut self, simbolo: char) -> Result<(), BodyError> {
        if self.es_simbolo(simbolo) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.error(&simbolo.to_string()))
        }
    }

    // Sin comillas los nombres se pasan a minúscula
    fn nombre(&mut self) -> Result<String, BodyError> {
        match self.tokens.get(self.pos).cloned() {
            Some(Token::Identificador(nombre)) => {
                self.pos += 1;
                Ok(nombre)
            }
            Some(Token::Palabra(palabra)) if !palabra.starts_with(|c: char| c.is_ascii_digit()) => {
                self.pos += 1;
                Ok(palabra.to_lowercase())
            }
            _ => Err(self.error("identifier")),
        }
    }

    fn literal(&mut self) -> Result<String, BodyError> {
        match self.tokens.get(self.pos).cloned() {
            Some(Token::Literal(literal)) => {
                self.pos += 1;
                Ok(literal)
            }
            _ => Err(self.error("string literal")),
        }
    }

    fn numero(&mut self) -> Result<i64, BodyError> {
        let parsed = match self.tokens.get(self.pos) {
            Some(Token::Palabra(palabra)) => palabra.parse::<i64>().ok(),
            _ => None,
        };
        match parsed {
            Some(numero) => {
                self.pos += 1;
                Ok(numero)
            }
            None => Err(self.error("integer")),
        }
    }

    // keyspace.tabla, ambos obligatorios
    fn tabla(&mut self) -> Result<(String, String), BodyError> {
        let keyspace = self.nombre()?;
        self.simbolo('.')?;
        let tabla = self.nombre()?;
        Ok((keyspace, tabla))
    }

    fn fin(&mut self) -> Result<(), BodyError> {
        if self.es_simbolo(';') {
            self.pos += 1;
        }
        if self.pos < self.tokens.len() {
            return Err(self.error("<EOF>"));
        }
        Ok(())
    }

    fn using_timestamp(&mut self) -> Result<Option<i64>, BodyError> {
        if !self.es_palabra("USING") {
            return Ok(None);
        }
        self.palabra("USING")?;
        self.palabra("TIMESTAMP")?;
        Ok(Some(self.numero()?))
    }

    // col = ? AND col = ? ...
    fn condiciones(&mut self) -> Result<Vec<String>, BodyError> {
        let mut columnas = vec![];
        loop {
            columnas.push(self.nombre()?);
            self.simbolo('=')?;
            self.simbolo('?')?;
            if !self.es_palabra("AND") {
                return Ok(columnas);
            }
            self.palabra("AND")?;
        }
    }

    // a, b, FUNCION(c) ... hasta FROM
    fn seleccion(&mut self) -> Result<Vec<String>, BodyError> {
        let mut columnas = vec![];
        loop {
            let nombre = self.nombre()?;
            if self.es_simbolo('(') {
                self.simbolo('(')?;
                let argumento = self.nombre()?;
                self.simbolo(')')?;
                columnas.push(format!("{}({})", nombre, argumento));
            } else {
                columnas.push(nombre);
            }
            if !self.es_simbolo(',') {
                return Ok(columnas);
            }
            self.simbolo(',')?;
        }
    }
}

fn validar_where(condiciones: &[String], esperadas: &[&str]) -> Result<(), BodyError> {
    if condiciones.iter().map(String::as_str).eq(esperadas.iter().copied()) {
        Ok(())
    } else {
        Err(error_invalido(format!(
            "Sólo se admite WHERE {}",
            esperadas
                .iter()
                .map(|columna| format!("{} = ?", columna))
                .collect::<Vec<_>>()
                .join(" AND ")
        )))
    }
}

fn parse_create_keyspace(tokens: &mut Tokens) -> Result<Sentencia, BodyError> {
    let keyspace = tokens.nombre()?;
    tokens.palabra("WITH")?;
    tokens.palabra("replication")?;
    tokens.simbolo('=')?;
    tokens.simbolo('{')?;
    let mut replication = vec![];
    loop {
        let clave = tokens.literal()?;
        tokens.simbolo(':')?;
        let valor = tokens.literal()?;
        replication.push((clave, valor));
        if !tokens.es_simbolo(',') {
            break;
        }
        tokens.simbolo(',')?;
    }
    tokens.simbolo('}')?;
    tokens.fin()?;
    Ok(Sentencia::CreateKeyspace {
        keyspace,
        replication,
    })
}

// Sólo la forma (key blob, column1 blob, value blob, PRIMARY KEY (key, column1))
fn parse_create_table(tokens: &mut Tokens) -> Result<Sentencia, BodyError> {
    let (keyspace, tabla) = tokens.tabla()?;
    tokens.simbolo('(')?;
    let mut columnas = vec![];
    let mut primary_key = vec![];
    loop {
        if tokens.es_palabra("PRIMARY") {
            tokens.palabra("PRIMARY")?;
            tokens.palabra("KEY")?;
            tokens.simbolo('(')?;
            primary_key.push(tokens.nombre()?);
            while tokens.es_simbolo(',') {
                tokens.simbolo(',')?;
                primary_key.push(tokens.nombre()?);
            }
            tokens.simbolo(')')?;
        } else {
            let columna = tokens.nombre()?;
            let tipo = tokens.nombre()?;
            columnas.push(format!("{} {}", columna, tipo));
        }
        if !tokens.es_simbolo(',') {
            break;
        }
        tokens.simbolo(',')?;
    }
    tokens.simbolo(')')?;
    tokens.fin()?;

    if columnas != ["key blob", "column1 blob", "value blob"] || primary_key != ["key", "column1"] {
        return Err(error_invalido(format!(
            "La tabla {}.{} no tiene la forma (key blob, column1 blob, value blob)",
            keyspace, tabla
        )));
    }
    Ok(Sentencia::CreateTable { keyspace, tabla })
}

fn parse_insert(tokens: &mut Tokens) -> Result<Sentencia, BodyError> {
    tokens.palabra("INTO")?;
    let (keyspace, tabla) = tokens.tabla()?;
    tokens.simbolo('(')?;
    let mut columnas = vec![tokens.nombre()?];
    while tokens.es_simbolo(',') {
        tokens.simbolo(',')?;
        columnas.push(tokens.nombre()?);
    }
    tokens.simbolo(')')?;
    tokens.palabra("VALUES")?;
    tokens.simbolo('(')?;
    tokens.simbolo('?')?;
    let mut marcadores = 1;
    while tokens.es_simbolo(',') {
        tokens.simbolo(',')?;
        tokens.simbolo('?')?;
        marcadores += 1;
    }
    tokens.simbolo(')')?;
    let clock = tokens.using_timestamp()?;
    tokens.fin()?;

    if columnas != ["key", "column1", "value"] || marcadores != 3 {
        return Err(error_invalido(
            "Sólo se admite INSERT (key, column1, value) VALUES (?, ?, ?)".to_string(),
        ));
    }
    Ok(Sentencia::Insert {
        keyspace,
        tabla,
        clock,
    })
}

fn parse_delete(tokens: &mut Tokens) -> Result<Sentencia, BodyError> {
    tokens.palabra("FROM")?;
    let (keyspace, tabla) = tokens.tabla()?;
    let clock = tokens.using_timestamp()?;
    tokens.palabra("WHERE")?;
    let condiciones = tokens.condiciones()?;
    tokens.fin()?;
    validar_where(&condiciones, &["key", "column1"])?;
    Ok(Sentencia::Delete {
        keyspace,
        tabla,
        clock,
    })
}

fn parse_select(tokens: &mut Tokens) -> Result<Sentencia, BodyError> {
    let seleccion = tokens.seleccion()?;
    tokens.palabra("FROM")?;
    let (keyspace, tabla) = tokens.tabla()?;
    tokens.palabra("WHERE")?;
    let condiciones = tokens.condiciones()?;
    tokens.fin()?;

    if keyspace == SYSTEM_SCHEMA && tabla == KEYSPACES {
        validar_where(&condiciones, &["keyspace_name"])?;
        if seleccion != ["keyspace_name", "replication"] {
            return Err(error_invalido(
                "Sólo se admite SELECT keyspace_name, replication".to_string(),
            ));
        }
        return Ok(Sentencia::DescribeKeyspace);
    }

    validar_where(&condiciones, &["key", "column1"])?;
    if seleccion != ["column1", "value", "writetime(value)"] {
        return Err(error_invalido(
            "Sólo se admite SELECT column1, value, WRITETIME(value)".to_string(),
        ));
    }
    Ok(Sentencia::Select { keyspace, tabla })
}

fn parse_drop(tokens: &mut Tokens) -> Result<Sentencia, BodyError> {
    if tokens.es_palabra("KEYSPACE") {
        tokens.palabra("KEYSPACE")?;
        let keyspace = tokens.nombre()?;
        tokens.fin()?;
        return Ok(Sentencia::DropKeyspace { keyspace });
    }
    tokens.palabra("TABLE")?;
    let (keyspace, tabla) = tokens.tabla()?;
    tokens.fin()?;
    Ok(Sentencia::DropTable { keyspace, tabla })
}

/// Parsea una sentencia. Los errores ya vienen como el frame ERROR que
/// respondería un nodo real (Syntax_error o Invalid).
pub fn parsear(query: &str) -> Result<Sentencia, BodyError> {
    let mut tokens = Tokens {
        tokens: tokenizar(query)?,
        pos: 0,
    };

    if tokens.es_palabra("CREATE") {
        tokens.palabra("CREATE")?;
        if tokens.es_palabra("KEYSPACE") {
            tokens.palabra("KEYSPACE")?;
            return parse_create_keyspace(&mut tokens);
        }
        tokens.palabra("TABLE")?;
        return parse_create_table(&mut tokens);
    }
    if tokens.es_palabra("DROP") {
        tokens.palabra("DROP")?;
        return parse_drop(&mut tokens);
    }
    if tokens.es_palabra("INSERT") {
        tokens.palabra("INSERT")?;
        return parse_insert(&mut tokens);
    }
    if tokens.es_palabra("DELETE") {
        tokens.palabra("DELETE")?;
        return parse_delete(&mut tokens);
    }
    if tokens.es_palabra("SELECT") {
        tokens.palabra("SELECT")?;
        return parse_select(&mut tokens);
    }
    Err(tokens.error("CREATE, DROP, INSERT, DELETE or SELECT"))
}
