//! Taxonomía de diagnósticos semánticos y léxicos.
//!
//! Todo diagnóstico que llega al usuario pertenece a una de estas
//! clases y se acumula en la tabla de errores sin detener el análisis.
//! Los errores de sintaxis no aparecen aquí: se detectan internamente
//! en [`crate::parse`] y nunca se presentan al usuario.

use crate::semantic::Kind;
use thiserror::Error;

/// Diagnóstico acumulable del análisis.
///
/// El texto de despliegue de cada variante es la descripción que se
/// almacena en la tabla de errores, junto al lexema y renglón donde se
/// detectó.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// Secuencia de caracteres que no forma ningún token del lenguaje.
    #[error("Token inválido")]
    LexicalInvalid,

    /// Un identificador ya declarado se declara de nuevo. El tipo
    /// original queda intacto.
    #[error("Declaración duplicada")]
    DuplicateDeclaration,

    /// Referencia a un identificador sin declaración, o identificador
    /// mal formado.
    #[error("Variable indefinida")]
    UndefinedVariable,

    /// Los tipos de una operación o asignación no son compatibles.
    ///
    /// El primer tipo es el del lado donde se reporta y el segundo el
    /// del lado opuesto.
    #[error("Incompatibilidad de tipos ({0} <- {1})")]
    TypeIncompatibility(Kind, Kind),

    /// El operador `%` se aplicó sobre un operando no entero.
    #[error("El operador % requiere operandos enteros")]
    ModuloRequiresInt,
}
