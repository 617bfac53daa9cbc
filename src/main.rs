//! Punto de entrada ("driver").
//!
//! Este módulo orquesta las fases del análisis y expone una CLI: lee
//! un archivo fuente (o stdin), corre una sesión de compilación,
//! imprime las tres tablas que deja el análisis y opcionalmente emite
//! el listado de ensamblador.

use anyhow::{bail, Context};
use clap::{crate_version, Arg, Command};
use triplos::{asm, optimize, semantic::Session};

use std::{
    fs::File,
    io::{self, Read},
};

fn main() -> anyhow::Result<()> {
    // Parsing de CLI
    let args = Command::new("triplos")
        .version(crate_version!())
        .about("Compilador didáctico con representación intermedia de triplos")
        .arg(
            Arg::new("optimize")
                .short('O')
                .long("optimize")
                .help("Reorganiza subexpresiones comunes en el texto antes de analizar"),
        )
        .arg(
            Arg::new("asm")
                .short('S')
                .long("asm")
                .help("Emite el listado de ensamblador al final de las tablas"),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .takes_value(true)
                .value_name("FILE")
                .help("Archivo de salida para el ensamblador ('-' para stdout)"),
        )
        .arg(
            Arg::new("input")
                .required(true)
                .value_name("INPUT")
                .help("Archivo fuente ('-' para stdin)"),
        )
        .get_matches();

    let input = args.value_of("input").unwrap();
    let mut source = read_source(input)?;

    if args.is_present("optimize") {
        source = optimize::rewrite(&source);
    }

    let mut session = Session::new();
    session.analyze(&source);

    print_tables(&session);

    match (args.is_present("asm"), args.value_of("output")) {
        (false, None) => (),
        (false, Some(_)) => bail!("-o solo tiene sentido junto a -S"),

        // Salida a stdout
        (true, None) | (true, Some("-")) => {
            println!();
            println!("== Ensamblador ==");
            let mut stdout = io::stdout();
            asm::write(session.triplets.rows(), &mut stdout)
                .context("No se pudo emitir el ensamblador a stdout")?;
        }

        // Salida a archivo
        (true, Some(path)) => {
            let mut file = File::create(path)
                .with_context(|| format!("No se pudo abrir para escritura: {}", path))?;

            asm::write(session.triplets.rows(), &mut file)
                .with_context(|| format!("No se pudo emitir el ensamblador a: {}", path))?;
        }
    }

    Ok(())
}

fn read_source(input: &str) -> anyhow::Result<String> {
    match input {
        "-" => {
            let mut source = String::new();
            io::stdin()
                .lock()
                .read_to_string(&mut source)
                .context("No se pudo leer stdin")?;

            Ok(source)
        }

        path => std::fs::read_to_string(path)
            .with_context(|| format!("No se pudo leer el archivo fuente: {}", path)),
    }
}

/// Imprime las tres tablas que la capa de presentación lee al terminar
/// cada corrida: lexemas, errores y triplos.
fn print_tables(session: &Session) {
    println!("== Tabla de lexemas ==");
    println!("{:<20} | Tipo", "Lexema");
    for (lexeme, kind) in session.lexemes.rows() {
        let kind = kind.map(|kind| kind.to_string()).unwrap_or_default();
        println!("{:<20} | {}", lexeme, kind);
    }

    println!();
    println!("== Tabla de errores ==");
    println!("{:<5} | {:<12} | {:<7} | Descripción", "Token", "Lexema", "Renglón");
    for record in session.errors.rows() {
        println!(
            "{:<5} | {:<12} | {:<7} | {}",
            record.code, record.lexeme, record.line, record.message
        );
    }

    println!();
    println!("== Tabla de triplos ==");
    println!("{}", session.triplets.pretty());
}
