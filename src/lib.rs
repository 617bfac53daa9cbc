//! Compilador didáctico del lenguaje `cat`/`cats`/`meow`.
//!
//! # Front end
//! Cada análisis parte de un único texto fuente. El texto se somete
//! primero a análisis léxico en [`lex`], de lo cual se obtiene un flujo
//! de tokens con número de renglón. El flujo de tokens se dispone en un
//! AST por medio de análisis sintáctico en [`parse`]. El árbol es
//! procesado por análisis semántico en [`semantic`]: verificación de
//! tipos sobre la tabla de símbolos, registro de diagnósticos y
//! generación de la representación intermedia de triplos descrita en
//! [`ir`].
//!
//! # Back end
//! La tabla de triplos terminada se traduce en [`asm`] a un listado de
//! mnemónicos estilo 8086. La traducción es ilustrativa: cada triplo
//! produce siempre la misma plantilla fija de instrucciones, sin
//! asignación de registros ni análisis entre triplos.
//!
//! # Estado por corrida
//! Todo el estado del análisis (símbolos, errores, lexemas, triplos y
//! contadores) vive en un [`semantic::Session`] que se instancia por
//! corrida y se reinicia explícitamente con [`semantic::Session::reset`].
//! No hay estado global.

#[macro_use]
mod macros;

pub mod asm;
pub mod error;
pub mod ir;
pub mod lex;
pub mod optimize;
pub mod parse;
pub mod semantic;
pub mod source;
pub mod tables;
