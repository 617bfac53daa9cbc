//! Análisis semántico y construcción de la representación intermedia.
//!
//! Esta fase recorre el AST una sola vez: consulta y alimenta la tabla
//! de símbolos, verifica tipos, acumula diagnósticos y emite triplos en
//! su orden final. Ninguna falla semántica detiene el recorrido: una
//! subexpresión errónea adquiere tipo desconocido, el cual se propaga
//! hacia arriba y se considera universalmente compatible para no
//! desatar cascadas de diagnósticos derivados del mismo origen.
//!
//! # Sesión de compilación
//! Todo el estado vive en un [`Session`] explícito que se instancia por
//! corrida: no hay tablas globales. Reanalizar exige [`Session::reset`]
//! o una sesión nueva; dos sesiones con el mismo fuente producen
//! listados idénticos.

use std::fmt::{self, Display};

use crate::{
    error::Diagnostic,
    ir::{LabelHint, Op, Place, TripletTable},
    lex::{self, Token},
    parse::{self, Assign, BinOp, Expr, Ident, Stmt, UnaryOp},
    source::{Line, Located},
    tables::{ErrorTable, LexemeTable, SymbolTable},
};

/// Tipo declarable del lenguaje.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Kind {
    /// `cat`: entero.
    Int,

    /// `cats`: real.
    Float,

    /// `meow`: cadena.
    Text,
}

impl Display for Kind {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Kind::Int => fmt.write_str("cat"),
            Kind::Float => fmt.write_str("cats"),
            Kind::Text => fmt.write_str("meow"),
        }
    }
}

/// Tipo calculado de una expresión.
///
/// Además del dominio declarable, una expresión puede ser booleana
/// (resultado de una comparación, consumido por un salto condicional) o
/// de tipo desconocido tras una falla de resolución o de tipos. Ambos
/// estados son compatibles con todo para suprimir cascadas.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ExprKind {
    Known(Kind),
    Boolean,
    Unknown,
}

impl ExprKind {
    /// Tipo declarable, si se conoce.
    pub fn known(self) -> Option<Kind> {
        match self {
            ExprKind::Known(kind) => Some(kind),
            _ => None,
        }
    }
}

/// Resultado de un operador aritmético según el retículo de promoción:
/// la cadena es infecciosa, el real domina al entero, y entero con
/// entero produce entero. Un operando desconocido colapsa al lado
/// conocido.
pub fn arithmetic_result(left: ExprKind, right: ExprKind) -> ExprKind {
    use Kind::*;

    match (left.known(), right.known()) {
        (Some(a), Some(b)) => ExprKind::Known(match (a, b) {
            (Text, _) | (_, Text) => Text,
            (Float, _) | (_, Float) => Float,
            (Int, Int) => Int,
        }),

        (Some(a), None) => ExprKind::Known(a),
        (None, Some(b)) => ExprKind::Known(b),
        (None, None) => ExprKind::Unknown,
    }
}

/// Resultado del operador `%`: entero solo cuando ambos operandos se
/// conocen enteros, desconocido en cualquier otro caso.
pub fn modulo_result(left: ExprKind, right: ExprKind) -> ExprKind {
    match (left.known(), right.known()) {
        (Some(Kind::Int), Some(Kind::Int)) => ExprKind::Known(Kind::Int),
        _ => ExprKind::Unknown,
    }
}

/// Compatibilidad de asignación: igualdad exacta siempre, ampliación de
/// entero a real permitida, todo lo demás rechazado. Un valor
/// desconocido o booleano se acepta en silencio.
pub fn assignment_allowed(target: Kind, value: ExprKind) -> bool {
    match value {
        ExprKind::Unknown | ExprKind::Boolean => true,
        ExprKind::Known(value) => value == target || (target == Kind::Float && value == Kind::Int),
    }
}

/// Atributos sintetizados de una expresión ya generada.
struct ExprAttr {
    /// Dirección donde quedó el valor.
    place: Place,

    kind: ExprKind,

    /// Lexema representativo para diagnósticos: el del operando
    /// izquierdo más profundo, igual que en la tabla de referencia.
    lexeme: String,

    line: Line,
}

/// Sesión de compilación: todo el estado de una corrida.
///
/// La capa de presentación lee las tablas al terminar [`Session::analyze`]
/// y debe llamar [`Session::reset`] (o estrenar sesión) antes de
/// reanalizar. Las sesiones no se comparten entre análisis
/// concurrentes.
#[derive(Default)]
pub struct Session {
    pub symbols: SymbolTable,
    pub errors: ErrorTable,
    pub lexemes: LexemeTable,
    pub triplets: TripletTable,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Vacía toda tabla y regresa todo contador a cero.
    pub fn reset(&mut self) {
        self.symbols.reset();
        self.errors.reset();
        self.lexemes.reset();
        self.triplets.reset();
    }

    /// Corre el análisis completo de un texto fuente.
    ///
    /// Escanea, registra lexemas y diagnósticos léxicos, parsea y
    /// genera triplos. Siempre termina y siempre deja en las tablas
    /// todo lo que pudo construirse, por erróneo que sea el fuente.
    pub fn analyze(&mut self, source: &str) {
        let tokens = self.collect_lexemes(lex::scan(source));
        let ast = parse::parse(&tokens);

        for statement in ast.statements() {
            self.lower_stmt(statement);
        }

        // Los identificadores declarados reciben su tipo en la tabla
        // de lexemas al final de la corrida
        for (name, kind) in self.symbols.rows() {
            self.lexemes.set_kind_if_present(name, kind);
        }
    }

    /// Puebla la tabla de lexemas y convierte cada token inválido en un
    /// diagnóstico léxico, retirándolo del flujo que verá el parser.
    fn collect_lexemes(&mut self, tokens: Vec<Located<Token>>) -> Vec<Located<Token>> {
        let mut kept = Vec::with_capacity(tokens.len());

        for token in tokens {
            match token.as_ref() {
                Token::Invalid(lexeme) => {
                    let message = Diagnostic::LexicalInvalid.to_string();
                    self.errors.record(None, lexeme, token.line(), &message);
                }

                inner => {
                    if !inner.is_reserved() {
                        let kind = match inner {
                            Token::IntLiteral(_) => Some(Kind::Int),
                            Token::RealLiteral(_) => Some(Kind::Float),
                            Token::StrLiteral(_) => Some(Kind::Text),
                            _ => None,
                        };

                        self.lexemes.add(&inner.to_string(), kind);
                    }

                    kept.push(token);
                }
            }
        }

        kept
    }

    /// Registra un diagnóstico semántico y tiende el puente hacia la
    /// representación intermedia: cada diagnóstico nuevo deja un triplo
    /// `ERROR` sin significado ejecutable en la secuencia.
    fn report(&mut self, lexeme: &str, line: Line, diagnostic: Diagnostic) {
        if self.errors.record(None, lexeme, line, &diagnostic.to_string()) {
            self.triplets.push(
                Op::Error,
                Some(Place::Lit(lexeme.to_owned())),
                None,
                Some(Place::Lit(String::from("-"))),
            );
        }
    }

    /// Pista de liberación para un temporal ya consumido.
    fn release(&mut self, place: &Place) {
        if let Place::Temp(temp) = place {
            self.triplets.free_temp(*temp);
        }
    }

    fn lower_stmt(&mut self, statement: &Stmt) {
        match statement {
            Stmt::Decl { typ, name } => self.lower_decl(typ, name),
            Stmt::Assign(assign) => self.lower_assign(assign),

            Stmt::If {
                condition,
                then_body,
                else_body,
            } => self.lower_if(condition, then_body, else_body.as_deref()),

            Stmt::For {
                init,
                condition,
                step,
                body,
            } => self.lower_for(init, condition.as_ref(), step, body),

            Stmt::Print(value) => {
                let value = self.lower_expr(value);
                self.triplets.push(Op::Print, Some(value.place.clone()), None, None);
                self.release(&value.place);
            }

            Stmt::Read(target) => self.lower_read(target),

            Stmt::Expr(value) => {
                let value = self.lower_expr(value);
                self.release(&value.place);
            }
        }
    }

    fn lower_decl(&mut self, typ: &Located<Kind>, name: &Located<Ident>) {
        match name.as_ref() {
            // Un identificador mal formado no llega a declararse
            Ident::Bad(lexeme) => {
                let lexeme = lexeme.clone();
                self.report(&lexeme, name.line(), Diagnostic::UndefinedVariable);
            }

            Ident::Good(lexeme) => {
                let lexeme = lexeme.clone();
                if self.symbols.declare(&lexeme, *typ.as_ref()).is_err() {
                    self.report(&lexeme, name.line(), Diagnostic::DuplicateDeclaration);
                }
            }
        }
    }

    fn lower_assign(&mut self, assign: &Assign) {
        let value = self.lower_expr(&assign.value);

        let lexeme = assign.target.as_ref().lexeme().to_owned();
        let line = assign.target.line();

        let target_kind = match assign.target.as_ref() {
            Ident::Bad(_) => {
                self.report(&lexeme, line, Diagnostic::UndefinedVariable);
                None
            }

            Ident::Good(name) => match self.symbols.lookup(name) {
                Some(kind) => Some(kind),
                None => {
                    self.report(&lexeme, line, Diagnostic::UndefinedVariable);
                    None
                }
            },
        };

        // Un destino indefinido suprime la verificación derivada de
        // compatibilidad; dos errores independientes sí se reportan
        if let Some(target_kind) = target_kind {
            if let ExprKind::Known(value_kind) = value.kind {
                if !assignment_allowed(target_kind, value.kind) {
                    self.report(
                        &lexeme,
                        line,
                        Diagnostic::TypeIncompatibility(target_kind, value_kind),
                    );
                }
            }
        }

        // El triplo de asignación se emite siempre, con el nombre crudo
        self.triplets.push(
            Op::Assign,
            Some(value.place.clone()),
            None,
            Some(Place::Var(lexeme)),
        );
        self.release(&value.place);
    }

    fn lower_if(&mut self, condition: &Located<Expr>, then_body: &[Stmt], else_body: Option<&[Stmt]>) {
        let condition = self.lower_expr(condition);

        match else_body {
            None => {
                let end = self.triplets.new_label(LabelHint::EndIf);
                self.triplets.push(
                    Op::IfFalseGoto,
                    Some(condition.place.clone()),
                    None,
                    Some(Place::Label(end)),
                );
                self.release(&condition.place);

                self.lower_block(then_body);
                self.triplets.push(Op::Label, None, None, Some(Place::Label(end)));
            }

            Some(else_body) => {
                let else_label = self.triplets.new_label(LabelHint::Else);
                self.triplets.push(
                    Op::IfFalseGoto,
                    Some(condition.place.clone()),
                    None,
                    Some(Place::Label(else_label)),
                );
                self.release(&condition.place);

                self.lower_block(then_body);

                let end = self.triplets.new_label(LabelHint::EndIf);
                self.triplets.push(Op::Goto, None, None, Some(Place::Label(end)));
                self.triplets
                    .push(Op::Label, None, None, Some(Place::Label(else_label)));

                self.lower_block(else_body);
                self.triplets.push(Op::Label, None, None, Some(Place::Label(end)));
            }
        }
    }

    /// Genera un ciclo `for` directamente en su orden final:
    /// inicializador, etiqueta de inicio, condición y salto de salida
    /// (solo si hay condición), cuerpo, incremento, salto al inicio y
    /// etiqueta de fin.
    fn lower_for(
        &mut self,
        init: &Assign,
        condition: Option<&Located<Expr>>,
        step: &Assign,
        body: &[Stmt],
    ) {
        self.lower_assign(init);

        let begin = self.triplets.new_label(LabelHint::LoopBegin);
        let end = self.triplets.new_label(LabelHint::LoopEnd);
        self.triplets.push(Op::Label, None, None, Some(Place::Label(begin)));

        if let Some(condition) = condition {
            let condition = self.lower_expr(condition);
            self.triplets.push(
                Op::IfFalseGoto,
                Some(condition.place.clone()),
                None,
                Some(Place::Label(end)),
            );
            self.release(&condition.place);
        }

        self.lower_block(body);
        self.lower_assign(step);

        self.triplets.push(Op::Goto, None, None, Some(Place::Label(begin)));
        self.triplets.push(Op::Label, None, None, Some(Place::Label(end)));
    }

    fn lower_read(&mut self, target: &Located<Ident>) {
        let lexeme = target.as_ref().lexeme().to_owned();

        let undefined = match target.as_ref() {
            Ident::Bad(_) => true,
            Ident::Good(name) => !self.symbols.exists(name),
        };

        if undefined {
            self.report(&lexeme, target.line(), Diagnostic::UndefinedVariable);
        }

        self.triplets.push(
            Op::Read,
            Some(Place::Lit(String::from("stdin"))),
            None,
            Some(Place::Var(lexeme)),
        );
    }

    fn lower_block(&mut self, body: &[Stmt]) {
        for statement in body {
            self.lower_stmt(statement);
        }
    }

    fn lower_expr(&mut self, expr: &Located<Expr>) -> ExprAttr {
        let line = expr.line();

        match expr.as_ref() {
            Expr::IntLiteral(lexeme) => literal(lexeme, Kind::Int, line),
            Expr::RealLiteral(lexeme) => literal(lexeme, Kind::Float, line),
            Expr::StrLiteral(lexeme) => literal(lexeme, Kind::Text, line),

            Expr::Var(ident) => self.lower_var(ident, line),

            Expr::Unary(op, operand) => {
                let operand = self.lower_expr(operand);
                match op {
                    // El más unario es un paso directo, sin triplo
                    UnaryOp::Plus => operand,

                    // El menos unario preserva el tipo del operando
                    UnaryOp::Minus => {
                        let temp = self.triplets.new_temp();
                        self.triplets.push(
                            Op::Neg,
                            Some(operand.place.clone()),
                            None,
                            Some(Place::Temp(temp)),
                        );
                        self.release(&operand.place);

                        ExprAttr {
                            place: Place::Temp(temp),
                            ..operand
                        }
                    }
                }
            }

            Expr::Binary(left, op, right) => self.lower_binary(left, *op, right),
        }
    }

    fn lower_var(&mut self, ident: &Ident, line: Line) -> ExprAttr {
        let lexeme = ident.lexeme().to_owned();

        let kind = match ident {
            Ident::Bad(_) => {
                self.report(&lexeme, line, Diagnostic::UndefinedVariable);
                ExprKind::Unknown
            }

            Ident::Good(name) => match self.symbols.lookup(name) {
                Some(kind) => ExprKind::Known(kind),
                None => {
                    self.report(&lexeme, line, Diagnostic::UndefinedVariable);
                    ExprKind::Unknown
                }
            },
        };

        ExprAttr {
            place: Place::Var(lexeme.clone()),
            kind,
            lexeme,
            line,
        }
    }

    fn lower_binary(&mut self, left: &Located<Expr>, op: BinOp, right: &Located<Expr>) -> ExprAttr {
        let left = self.lower_expr(left);
        let right = self.lower_expr(right);

        let kind = if op == BinOp::Mod {
            // `%` exige enteros; cada operando conocido no entero
            // recibe su propio diagnóstico
            for operand in [&left, &right] {
                if matches!(operand.kind.known(), Some(kind) if kind != Kind::Int) {
                    self.report(&operand.lexeme, operand.line, Diagnostic::ModuloRequiresInt);
                }
            }

            modulo_result(left.kind, right.kind)
        } else if op.is_relational() {
            // Una comparación acepta cualquier par de tipos; solo se
            // diagnostica cuando ambos se conocen y difieren
            if let (Some(a), Some(b)) = (left.kind.known(), right.kind.known()) {
                if a != b {
                    self.report(&left.lexeme, left.line, Diagnostic::TypeIncompatibility(a, b));
                }
            }

            ExprKind::Boolean
        } else {
            // Tipos conocidos distintos se reportan en ambos operandos,
            // cada uno desde su propia perspectiva
            if let (Some(a), Some(b)) = (left.kind.known(), right.kind.known()) {
                if a != b {
                    self.report(&left.lexeme, left.line, Diagnostic::TypeIncompatibility(a, b));
                    self.report(&right.lexeme, right.line, Diagnostic::TypeIncompatibility(b, a));
                }
            }

            arithmetic_result(left.kind, right.kind)
        };

        let temp = self.triplets.new_temp();
        self.triplets.push(
            ir_op(op),
            Some(left.place.clone()),
            Some(right.place.clone()),
            Some(Place::Temp(temp)),
        );
        self.release(&left.place);
        self.release(&right.place);

        ExprAttr {
            place: Place::Temp(temp),
            kind,
            lexeme: left.lexeme,
            line: left.line,
        }
    }
}

fn literal(lexeme: &str, kind: Kind, line: Line) -> ExprAttr {
    ExprAttr {
        place: Place::Lit(lexeme.to_owned()),
        kind: ExprKind::Known(kind),
        lexeme: lexeme.to_owned(),
        line,
    }
}

fn ir_op(op: BinOp) -> Op {
    match op {
        BinOp::Add => Op::Add,
        BinOp::Sub => Op::Sub,
        BinOp::Mul => Op::Mul,
        BinOp::Div => Op::Div,
        BinOp::Mod => Op::Mod,
        BinOp::Greater => Op::Greater,
        BinOp::GreaterEq => Op::GreaterEq,
        BinOp::Less => Op::Less,
        BinOp::LessEq => Op::LessEq,
        BinOp::Equal => Op::Equal,
        BinOp::NotEqual => Op::NotEqual,
    }
}
