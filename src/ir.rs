//! Representación intermedia de triplos.
//!
//! Un triplo es una instrucción de tres direcciones: hasta dos fuentes,
//! un operador y un destino. La tabla de triplos acumula la secuencia
//! en orden final de emisión y asigna índices con base 1. Los
//! temporales (`t1`, `t2`, …) y las etiquetas (`L1_INICIO_FOR`, …)
//! provienen de contadores independientes que solo crecen durante la
//! corrida; liberar un temporal es una pista sin efecto. Una etiqueta
//! se resuelve únicamente por el triplo `LABEL` que la emite después en
//! la misma secuencia, nunca por aritmética de direcciones.

use std::fmt::{self, Display};

/// Un temporal: contenedor sintético de un resultado intermedio.
///
/// Cada temporal es producido por exactamente un triplo y consumido por
/// triplos posteriores.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Temp(u32);

impl Display for Temp {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Temp(number) = self;
        write!(fmt, "t{}", number)
    }
}

/// Una etiqueta: destino simbólico de salto con prefijo descriptivo.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Label {
    number: u32,
    hint: LabelHint,
}

impl Display for Label {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(fmt, "L{}_{}", self.number, self.hint)
    }
}

/// Papel que cumple una etiqueta dentro de su constructo.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum LabelHint {
    LoopBegin,
    LoopEnd,
    Else,
    EndIf,
}

impl Display for LabelHint {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            LabelHint::LoopBegin => "INICIO_FOR",
            LabelHint::LoopEnd => "FIN_FOR",
            LabelHint::Else => "SINO",
            LabelHint::EndIf => "FIN_SI",
        };

        fmt.write_str(text)
    }
}

/// Operador de un triplo.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Op {
    Assign,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Neg,
    Greater,
    GreaterEq,
    Less,
    LessEq,
    Equal,
    NotEqual,
    Goto,
    IfFalseGoto,
    Label,
    Print,
    Read,
    Error,
}

impl Op {
    /// Determina si el operador es una comparación relacional.
    pub fn is_comparison(self) -> bool {
        use Op::*;
        matches!(
            self,
            Greater | GreaterEq | Less | LessEq | Equal | NotEqual
        )
    }
}

impl Display for Op {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Op::*;

        let text = match self {
            Assign => ":=",
            Add => "ADD",
            Sub => "SUB",
            Mul => "MUL",
            Div => "DIV",
            Mod => "MOD",
            Neg => "NEG",
            Greater => "GT",
            GreaterEq => "GTE",
            Less => "LT",
            LessEq => "LTE",
            Equal => "EQ",
            NotEqual => "NEQ",
            Goto => "GOTO",
            IfFalseGoto => "IF_FALSE_GOTO",
            Label => "LABEL",
            Print => "PRINT",
            Read => "READ",
            Error => "ERROR",
        };

        fmt.write_str(text)
    }
}

/// Una dirección de triplo.
///
/// El destino de un triplo es un nombre declarado (o crudo, si la
/// referencia falló), un temporal generado o una etiqueta, según el
/// operador.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Place {
    /// Identificador, tal cual apareció en el fuente.
    Var(String),

    /// Literal, con su lexema original.
    Lit(String),

    /// Temporal generado.
    Temp(Temp),

    /// Etiqueta de salto.
    Label(Label),
}

impl Display for Place {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Place::Var(name) => fmt.write_str(name),
            Place::Lit(lexeme) => fmt.write_str(lexeme),
            Place::Temp(temp) => temp.fmt(fmt),
            Place::Label(label) => label.fmt(fmt),
        }
    }
}

/// Un triplo emitido.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Triplet {
    /// Índice de secuencia, con base 1, creciente en orden de emisión.
    pub idx: usize,
    pub op: Op,
    pub arg1: Option<Place>,
    pub arg2: Option<Place>,
    pub res: Option<Place>,
}

/// Tabla de triplos de una corrida.
#[derive(Default)]
pub struct TripletTable {
    rows: Vec<Triplet>,
    temps: u32,
    labels: u32,
}

impl TripletTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Emite un triplo al final de la secuencia y retorna su índice.
    pub fn push(
        &mut self,
        op: Op,
        arg1: Option<Place>,
        arg2: Option<Place>,
        res: Option<Place>,
    ) -> usize {
        let idx = self.rows.len() + 1;
        self.rows.push(Triplet {
            idx,
            op,
            arg1,
            arg2,
            res,
        });

        idx
    }

    /// Asigna un temporal fresco. La asignación nunca falla.
    pub fn new_temp(&mut self) -> Temp {
        self.temps += 1;
        Temp(self.temps)
    }

    /// Pista de que un temporal ya no se usará.
    ///
    /// Los temporales nunca se reciclan físicamente: el contador solo
    /// crece, una simplificación documentada de esta herramienta de un
    /// solo paso.
    pub fn free_temp(&mut self, _temp: Temp) {}

    /// Asigna una etiqueta fresca con el prefijo indicado.
    pub fn new_label(&mut self, hint: LabelHint) -> Label {
        self.labels += 1;
        Label {
            number: self.labels,
            hint,
        }
    }

    /// Triplos en orden final de emisión.
    pub fn rows(&self) -> &[Triplet] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Vacía la tabla y regresa ambos contadores a cero.
    pub fn reset(&mut self) {
        self.rows.clear();
        self.temps = 0;
        self.labels = 0;
    }

    /// Filas `(#, OP, DO, DF)` para la capa de presentación.
    ///
    /// DO (dato objeto) es el destino y DF (dato fuente) las fuentes.
    /// `PRINT` no tiene destino y su valor se lee mejor bajo DO, igual
    /// que en la tabla de referencia del curso.
    pub fn display_rows(&self) -> Vec<(usize, String, String, String)> {
        self.rows
            .iter()
            .map(|triplet| {
                let op = triplet.op.to_string();

                let (dato_objeto, dato_fuente) = match triplet.op {
                    Op::Print => (display(&triplet.arg1), String::new()),

                    _ => {
                        let fuente = match (&triplet.arg1, &triplet.arg2) {
                            (Some(arg1), Some(arg2)) => format!("{}, {}", arg1, arg2),
                            (Some(arg1), None) => arg1.to_string(),
                            (None, Some(arg2)) => arg2.to_string(),
                            (None, None) => String::new(),
                        };

                        (display(&triplet.res), fuente)
                    }
                };

                (triplet.idx, op, dato_objeto, dato_fuente)
            })
            .collect()
    }

    /// Listado alineado para consola.
    pub fn pretty(&self) -> String {
        let mut lines = vec![
            String::from("#  | OP            | DO           | DF"),
            String::from("---+---------------+--------------+---------------------"),
        ];

        for (idx, op, dato_objeto, dato_fuente) in self.display_rows() {
            lines.push(format!(
                "{:<2} | {:<13} | {:<12} | {:<19}",
                idx, op, dato_objeto, dato_fuente
            ));
        }

        lines.join("\n")
    }
}

fn display(place: &Option<Place>) -> String {
    place.as_ref().map(Place::to_string).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indices_con_base_uno() {
        let mut table = TripletTable::new();
        let first = table.push(
            Op::Assign,
            Some(Place::Lit("5".into())),
            None,
            Some(Place::Var("$1A".into())),
        );
        let temp = table.new_temp();
        let second = table.push(
            Op::Add,
            Some(Place::Var("$1A".into())),
            Some(Place::Lit("1".into())),
            Some(Place::Temp(temp)),
        );

        assert_eq!((first, second), (1, 2));
        assert_eq!(table.rows()[0].idx, 1);
        assert_eq!(table.rows()[1].idx, 2);
    }

    #[test]
    fn contadores_independientes() {
        let mut table = TripletTable::new();
        let t1 = table.new_temp();
        let label = table.new_label(LabelHint::LoopBegin);
        let t2 = table.new_temp();

        assert_eq!(t1.to_string(), "t1");
        assert_eq!(t2.to_string(), "t2");
        assert_eq!(label.to_string(), "L1_INICIO_FOR");

        // Liberar es una pista sin efecto: el contador no retrocede
        table.free_temp(t2);
        assert_eq!(table.new_temp().to_string(), "t3");
    }

    #[test]
    fn reset_regresa_contadores_a_cero() {
        let mut table = TripletTable::new();
        table.new_temp();
        table.new_label(LabelHint::Else);
        table.push(Op::Error, Some(Place::Lit("@".into())), None, None);

        table.reset();
        assert!(table.is_empty());
        assert_eq!(table.new_temp().to_string(), "t1");
        assert_eq!(table.new_label(LabelHint::EndIf).to_string(), "L1_FIN_SI");
    }

    #[test]
    fn columnas_do_y_df() {
        let mut table = TripletTable::new();
        let begin = table.new_label(LabelHint::LoopBegin);
        let end = table.new_label(LabelHint::LoopEnd);
        let temp = table.new_temp();

        table.push(Op::Label, None, None, Some(Place::Label(begin)));
        table.push(
            Op::Less,
            Some(Place::Var("$I".into())),
            Some(Place::Lit("10".into())),
            Some(Place::Temp(temp)),
        );
        table.push(
            Op::IfFalseGoto,
            Some(Place::Temp(temp)),
            None,
            Some(Place::Label(end)),
        );
        table.push(Op::Goto, None, None, Some(Place::Label(begin)));
        table.push(Op::Print, Some(Place::Var("$I".into())), None, None);

        let rows = table.display_rows();
        assert_eq!(rows[0], (1, "LABEL".into(), "L1_INICIO_FOR".into(), "".into()));
        assert_eq!(rows[1], (2, "LT".into(), "t1".into(), "$I, 10".into()));
        assert_eq!(
            rows[2],
            (3, "IF_FALSE_GOTO".into(), "L2_FIN_FOR".into(), "t1".into())
        );
        assert_eq!(rows[3], (4, "GOTO".into(), "L1_INICIO_FOR".into(), "".into()));
        assert_eq!(rows[4], (5, "PRINT".into(), "$I".into(), "".into()));
    }
}
