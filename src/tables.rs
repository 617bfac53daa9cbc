//! Tablas de estado de un análisis.
//!
//! Las tres tablas que la capa de presentación lee al terminar una
//! corrida: símbolos declarados, diagnósticos acumulados y lexemas
//! vistos. Todas preservan orden de inserción y se vacían con `reset`
//! antes de reanalizar; ninguna se comparte entre corridas
//! concurrentes.

use crate::semantic::Kind;
use crate::source::Line;
use std::collections::HashMap;
use thiserror::Error;

/// Señal de que un nombre ya contaba con una declaración previa.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Declaración duplicada")]
pub struct AlreadyDeclared;

/// Tabla de símbolos: identificador declarado → tipo.
///
/// El tipo de un símbolo es inmutable después de su primera
/// declaración. No hay borrado individual.
#[derive(Default)]
pub struct SymbolTable {
    kinds: HashMap<String, Kind>,
    order: Vec<String>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registra una declaración.
    ///
    /// Si el nombre ya existe, el tipo original queda intacto y se
    /// señala la duplicación; quien llama la convierte en diagnóstico.
    pub fn declare(&mut self, name: &str, kind: Kind) -> Result<(), AlreadyDeclared> {
        if self.kinds.contains_key(name) {
            return Err(AlreadyDeclared);
        }

        self.kinds.insert(name.to_owned(), kind);
        self.order.push(name.to_owned());
        Ok(())
    }

    pub fn exists(&self, name: &str) -> bool {
        self.kinds.contains_key(name)
    }

    /// Tipo declarado de un nombre; quien llama convierte la ausencia
    /// en un diagnóstico de variable indefinida.
    pub fn lookup(&self, name: &str) -> Option<Kind> {
        self.kinds.get(name).copied()
    }

    /// Pares `(nombre, tipo)` en orden de declaración.
    pub fn rows(&self) -> impl Iterator<Item = (&str, Kind)> {
        self.order
            .iter()
            .map(move |name| (name.as_str(), self.kinds[name]))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn reset(&mut self) {
        self.kinds.clear();
        self.order.clear();
    }
}

/// Un diagnóstico acumulado, en orden de detección.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorRecord {
    pub code: String,
    pub lexeme: String,
    pub line: Line,
    pub message: String,
}

/// Tabla de errores.
///
/// Acumula diagnósticos sin detener jamás el análisis. Los repetidos
/// byte-idénticos en `(lexema, renglón, descripción)` se suprimen; dos
/// diagnósticos distintos sobre el mismo renglón se conservan ambos.
#[derive(Default)]
pub struct ErrorTable {
    rows: Vec<ErrorRecord>,
    counter: u32,
}

impl ErrorTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Agrega un diagnóstico, numerándolo `ES<n>` si no trae código.
    ///
    /// Retorna si la fila fue agregada o suprimida como repetición
    /// exacta.
    pub fn record(
        &mut self,
        code: Option<String>,
        lexeme: &str,
        line: Line,
        message: &str,
    ) -> bool {
        let duplicate = self
            .rows
            .iter()
            .any(|row| row.lexeme == lexeme && row.line == line && row.message == message);

        if duplicate {
            return false;
        }

        let code = code.unwrap_or_else(|| {
            self.counter += 1;
            format!("ES{}", self.counter)
        });

        self.rows.push(ErrorRecord {
            code,
            lexeme: lexeme.to_owned(),
            line,
            message: message.to_owned(),
        });

        true
    }

    /// Diagnósticos en orden de detección.
    pub fn rows(&self) -> &[ErrorRecord] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn reset(&mut self) {
        self.rows.clear();
        self.counter = 0;
    }
}

/// Tabla de lexemas para la capa de presentación.
///
/// Lista todos los lexemas visibles del programa (identificadores,
/// operadores, literales, puntuación) en orden de primera aparición.
/// El tipo se conoce de inmediato para literales y se completa después
/// del análisis para los identificadores declarados. Las palabras
/// reservadas no se listan.
#[derive(Default)]
pub struct LexemeTable {
    kinds: HashMap<String, Option<Kind>>,
    order: Vec<String>,
}

impl LexemeTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Agrega un lexema; la primera aparición gana y las siguientes no
    /// sobreescriben.
    pub fn add(&mut self, lexeme: &str, kind: Option<Kind>) {
        if self.kinds.contains_key(lexeme) {
            return;
        }

        self.kinds.insert(lexeme.to_owned(), kind);
        self.order.push(lexeme.to_owned());
    }

    /// Completa el tipo de un lexema ya listado, si está presente.
    pub fn set_kind_if_present(&mut self, lexeme: &str, kind: Kind) {
        if let Some(slot) = self.kinds.get_mut(lexeme) {
            *slot = Some(kind);
        }
    }

    /// Pares `(lexema, tipo)` en orden de primera aparición.
    pub fn rows(&self) -> impl Iterator<Item = (&str, Option<Kind>)> {
        self.order
            .iter()
            .map(move |lexeme| (lexeme.as_str(), self.kinds[lexeme]))
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn reset(&mut self) {
        self.kinds.clear();
        self.order.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declarar_y_consultar() {
        let mut symbols = SymbolTable::new();
        assert!(symbols.declare("$1A", Kind::Int).is_ok());
        assert!(symbols.declare("$2B", Kind::Text).is_ok());

        assert!(symbols.exists("$1A"));
        assert_eq!(symbols.lookup("$1A"), Some(Kind::Int));
        assert_eq!(symbols.lookup("$2B"), Some(Kind::Text));
        assert_eq!(symbols.lookup("$3C"), None);
        assert!(!symbols.exists("$3C"));
    }

    #[test]
    fn redeclaracion_no_cambia_el_tipo() {
        let mut symbols = SymbolTable::new();
        symbols.declare("$1A", Kind::Int).unwrap();

        assert_eq!(symbols.declare("$1A", Kind::Float), Err(AlreadyDeclared));
        assert_eq!(symbols.lookup("$1A"), Some(Kind::Int));
        assert_eq!(symbols.len(), 1);
    }

    #[test]
    fn simbolos_en_orden_de_declaracion() {
        let mut symbols = SymbolTable::new();
        symbols.declare("$2B", Kind::Float).unwrap();
        symbols.declare("$1A", Kind::Int).unwrap();

        let rows: Vec<_> = symbols.rows().collect();
        assert_eq!(rows, vec![("$2B", Kind::Float), ("$1A", Kind::Int)]);

        symbols.reset();
        assert!(symbols.is_empty());
    }

    #[test]
    fn errores_numerados_en_orden() {
        let mut errors = ErrorTable::new();
        assert!(errors.record(None, "$1A", 3, "Variable indefinida"));
        assert!(errors.record(None, "$2B", 1, "Declaración duplicada"));

        let codes: Vec<_> = errors.rows().iter().map(|row| row.code.as_str()).collect();
        assert_eq!(codes, vec!["ES1", "ES2"]);
        assert_eq!(errors.rows()[0].line, 3);
    }

    #[test]
    fn errores_repetidos_se_suprimen() {
        let mut errors = ErrorTable::new();
        assert!(errors.record(None, "$1A", 3, "Variable indefinida"));
        assert!(!errors.record(None, "$1A", 3, "Variable indefinida"));

        // Distinto mensaje sobre el mismo renglón sí se conserva
        assert!(errors.record(None, "$1A", 3, "Incompatibilidad de tipos (cat <- meow)"));
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn codigo_explicito_se_respeta() {
        let mut errors = ErrorTable::new();
        errors.record(Some("EL1".into()), "@@", 1, "Token inválido");
        errors.record(None, "$1A", 2, "Variable indefinida");

        let codes: Vec<_> = errors.rows().iter().map(|row| row.code.as_str()).collect();
        assert_eq!(codes, vec!["EL1", "ES1"]);
    }

    #[test]
    fn lexemas_primera_aparicion_gana() {
        let mut lexemes = LexemeTable::new();
        lexemes.add("$1A", None);
        lexemes.add("5", Some(Kind::Int));
        lexemes.add("$1A", Some(Kind::Text));

        let rows: Vec<_> = lexemes.rows().collect();
        assert_eq!(rows, vec![("$1A", None), ("5", Some(Kind::Int))]);
    }

    #[test]
    fn lexemas_completan_tipo_despues() {
        let mut lexemes = LexemeTable::new();
        lexemes.add("$1A", None);
        lexemes.set_kind_if_present("$1A", Kind::Int);
        lexemes.set_kind_if_present("$9Z", Kind::Float);

        let rows: Vec<_> = lexemes.rows().collect();
        assert_eq!(rows, vec![("$1A", Some(Kind::Int))]);
    }
}
