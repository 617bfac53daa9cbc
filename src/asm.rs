//! Generación de ensamblador ilustrativo.
//!
//! Traduce la secuencia terminada de triplos a un listado de
//! mnemónicos estilo 8086. La traducción es total y de mejor esfuerzo:
//! cada triplo produce siempre su misma plantilla fija de
//! instrucciones, sin análisis entre triplos, sin encabezados y sin
//! punto de entrada. Una fuente ausente se sustituye por el centinela
//! `0`. Los triplos sin significado ejecutable (`PRINT`, `READ`,
//! `ERROR`) se emiten como comentario; la traducción nunca falla.

use crate::ir::{Op, Place, Triplet};
use std::io::{self, Write};

/// Traduce una secuencia de triplos a renglones de ensamblador.
pub fn lines(triplets: &[Triplet]) -> Vec<String> {
    let mut asm = Vec::new();
    for triplet in triplets {
        lower(triplet, &mut asm);
    }

    asm
}

/// Escribe el listado de ensamblador en una salida cualquiera.
pub fn write<W: Write>(triplets: &[Triplet], output: &mut W) -> io::Result<()> {
    for line in lines(triplets) {
        writeln!(output, "{}", line)?;
    }

    Ok(())
}

fn lower(triplet: &Triplet, asm: &mut Vec<String>) {
    let a1 = source(&triplet.arg1);
    let a2 = source(&triplet.arg2);

    match triplet.op {
        // res = a1
        Op::Assign => {
            emit!(asm, "MOV AX, {}", a1);
            if let Some(res) = &triplet.res {
                emit!(asm, "MOV {}, AX", res);
            }
        }

        // res = a1 + a2
        Op::Add => {
            emit!(asm, "MOV AX, {}", a1);
            emit!(asm, "ADD AX, {}", a2);
            if let Some(res) = &triplet.res {
                emit!(asm, "MOV {}, AX", res);
            }
        }

        // res = a1 - a2
        Op::Sub => {
            emit!(asm, "MOV AX, {}", a1);
            emit!(asm, "SUB AX, {}", a2);
            if let Some(res) = &triplet.res {
                emit!(asm, "MOV {}, AX", res);
            }
        }

        // El producto opera sobre los bytes bajos y queda en AX
        Op::Mul => {
            emit!(asm, "MOV AL, {}", a1);
            emit!(asm, "MOV BL, {}", a2);
            emit!(asm, "MUL BL");
            if let Some(res) = &triplet.res {
                emit!(asm, "MOV {}, AX", res);
            }
        }

        // DIV BL deja el cociente en AL y el residuo en AH
        Op::Div => {
            emit!(asm, "MOV AX, {}", a1);
            emit!(asm, "MOV BL, {}", a2);
            emit!(asm, "DIV BL");
            if let Some(res) = &triplet.res {
                emit!(asm, "MOV {}, AL", res);
            }
        }

        Op::Mod => {
            emit!(asm, "MOV AX, {}", a1);
            emit!(asm, "MOV BL, {}", a2);
            emit!(asm, "DIV BL");
            if let Some(res) = &triplet.res {
                emit!(asm, "MOV {}, AH", res);
            }
        }

        Op::Neg => {
            emit!(asm, "MOV AX, {}", a1);
            emit!(asm, "NEG AX");
            if let Some(res) = &triplet.res {
                emit!(asm, "MOV {}, AX", res);
            }
        }

        // El desenlace queda implícito en las banderas, lo consume el
        // salto condicional que sigue
        op if op.is_comparison() => {
            emit!(asm, "; CMP {} {} {}", a1, op, a2);
            emit!(asm, "MOV AX, {}", a1);
            emit!(asm, "CMP AX, {}", a2);
        }

        Op::IfFalseGoto => {
            emit!(asm, "MOV AX, {}", a1);
            emit!(asm, "CMP AX, 0");
            emit!(asm, "JE {}", destination(triplet));
        }

        Op::Goto => {
            emit!(asm, "JMP {}", destination(triplet));
        }

        Op::Label => {
            emit!(asm, "{}:", destination(triplet));
        }

        Op::Print => {
            emit!(asm, "; PRINT {}", a1);
        }

        Op::Read => {
            emit!(asm, "; READ {}", destination(triplet));
        }

        Op::Error => {
            emit!(asm, "; ERROR de compilación (no se genera código)");
        }

        // is_comparison cubre el resto de operadores; el enum es
        // cerrado y aquí no puede llegar nada más
        _ => unreachable!(),
    }
}

fn source(place: &Option<Place>) -> String {
    place
        .as_ref()
        .map(Place::to_string)
        .unwrap_or_else(|| String::from("0"))
}

fn destination(triplet: &Triplet) -> String {
    source(&triplet.res)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{LabelHint, TripletTable};

    fn var(name: &str) -> Option<Place> {
        Some(Place::Var(name.into()))
    }

    fn lit(lexeme: &str) -> Option<Place> {
        Some(Place::Lit(lexeme.into()))
    }

    #[test]
    fn asignacion() {
        let mut table = TripletTable::new();
        table.push(Op::Assign, lit("5"), None, var("$1A"));

        assert_eq!(lines(table.rows()), vec!["MOV AX, 5", "MOV $1A, AX"]);
    }

    #[test]
    fn suma_y_resta() {
        let mut table = TripletTable::new();
        let temp = table.new_temp();
        table.push(Op::Add, var("$1A"), lit("2"), Some(Place::Temp(temp)));
        table.push(Op::Sub, Some(Place::Temp(temp)), lit("1"), var("$1A"));

        assert_eq!(
            lines(table.rows()),
            vec![
                "MOV AX, $1A",
                "ADD AX, 2",
                "MOV t1, AX",
                "MOV AX, t1",
                "SUB AX, 1",
                "MOV $1A, AX",
            ]
        );
    }

    #[test]
    fn multiplicacion_division_y_modulo() {
        let mut table = TripletTable::new();
        table.push(Op::Mul, var("$A"), var("$B"), var("$C"));
        table.push(Op::Div, var("$A"), var("$B"), var("$C"));
        table.push(Op::Mod, var("$A"), var("$B"), var("$C"));

        assert_eq!(
            lines(table.rows()),
            vec![
                "MOV AL, $A",
                "MOV BL, $B",
                "MUL BL",
                "MOV $C, AX",
                "MOV AX, $A",
                "MOV BL, $B",
                "DIV BL",
                "MOV $C, AL",
                "MOV AX, $A",
                "MOV BL, $B",
                "DIV BL",
                "MOV $C, AH",
            ]
        );
    }

    #[test]
    fn negacion() {
        let mut table = TripletTable::new();
        let temp = table.new_temp();
        table.push(Op::Neg, var("$A"), None, Some(Place::Temp(temp)));

        assert_eq!(
            lines(table.rows()),
            vec!["MOV AX, $A", "NEG AX", "MOV t1, AX"]
        );
    }

    #[test]
    fn comparacion_y_salto_condicional() {
        let mut table = TripletTable::new();
        let temp = table.new_temp();
        let end = table.new_label(LabelHint::LoopEnd);
        table.push(Op::Less, var("$I"), lit("10"), Some(Place::Temp(temp)));
        table.push(
            Op::IfFalseGoto,
            Some(Place::Temp(temp)),
            None,
            Some(Place::Label(end)),
        );

        assert_eq!(
            lines(table.rows()),
            vec![
                "; CMP $I LT 10",
                "MOV AX, $I",
                "CMP AX, 10",
                "MOV AX, t1",
                "CMP AX, 0",
                "JE L1_FIN_FOR",
            ]
        );
    }

    #[test]
    fn saltos_y_etiquetas() {
        let mut table = TripletTable::new();
        let begin = table.new_label(LabelHint::LoopBegin);
        table.push(Op::Label, None, None, Some(Place::Label(begin)));
        table.push(Op::Goto, None, None, Some(Place::Label(begin)));

        assert_eq!(
            lines(table.rows()),
            vec!["L1_INICIO_FOR:", "JMP L1_INICIO_FOR"]
        );
    }

    #[test]
    fn comentarios_sin_instruccion() {
        let mut table = TripletTable::new();
        table.push(Op::Print, var("$A"), None, None);
        table.push(Op::Read, lit("stdin"), None, var("$A"));
        table.push(Op::Error, lit("$9Z"), None, lit("-"));

        assert_eq!(
            lines(table.rows()),
            vec![
                "; PRINT $A",
                "; READ $A",
                "; ERROR de compilación (no se genera código)",
            ]
        );
    }

    #[test]
    fn fuente_ausente_usa_centinela_cero() {
        let mut table = TripletTable::new();
        table.push(Op::Assign, None, None, var("$A"));

        assert_eq!(lines(table.rows()), vec!["MOV AX, 0", "MOV $A, AX"]);
    }
}
