//! Análisis léxico.
//!
//! # Tokenization
//! Esta es la primera fase del compilador. Descompone el texto fuente
//! en unidades léxicas denominadas tokens. Los espacios en blanco y los
//! comentarios (`//` de renglón y `/* */` de bloque) se descartan
//! durante esta operación. Cada token emitido queda asociado al renglón
//! del código fuente donde inicia, con base 1.
//!
//! # Reglas importantes del lenguaje
//! - Los identificadores inician con `'$'` seguido de dígitos y/o
//!   letras mayúsculas: `$1A`, `$TOTAL`.
//! - Un número seguido de letras mayúsculas (`2ITALIA`) es un
//!   identificador mal formado y se emite como [`Token::BadId`].
//! - Las palabras reservadas van en minúscula: `cat`, `cats`, `meow`,
//!   `for`, `if`, `else`, `print`, `read`.
//! - Las constantes conservan su lexema original; las cadenas incluyen
//!   sus comillas.
//!
//! # Errores
//! El escaneo nunca falla. Los caracteres que no pueden iniciar ningún
//! token se agrupan, mientras sean contiguos, en un único
//! [`Token::Invalid`]; la fase semántica los convierte en un solo
//! diagnóstico léxico en vez de uno por carácter.

use crate::semantic::Kind;
use crate::source::{Line, Located};
use std::{
    fmt::{self, Display},
    iter::Peekable,
    str::{Chars, FromStr},
};

/// Objeto resultante del análisis léxico.
///
/// Un token contiene suficiente información para describir por completo
/// a una entidad léxica del programa fuente. Su implementación de
/// [`Display`] produce el lexema tal y como se lista en la tabla de
/// lexemas.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Identificador bien formado, lexema con su `$` inicial.
    Id(String),

    /// Identificador mal formado: dígitos seguidos de mayúsculas.
    BadId(String),

    /// Constante entera, lexema original.
    IntLiteral(String),

    /// Constante real, lexema original.
    RealLiteral(String),

    /// Constante de cadena, lexema con comillas incluidas.
    StrLiteral(String),

    /// Palabra reservada de tipo: `cat`, `cats` o `meow`.
    TypeName(Kind),

    /// Palabra reservada que no denota tipo.
    Keyword(Keyword),

    /// `=`
    Assign,

    /// `+`
    Plus,

    /// `-`
    Minus,

    /// `*`
    Times,

    /// `/`
    Slash,

    /// `%`
    Percent,

    /// `>`
    Greater,

    /// `>=`
    GreaterEq,

    /// `<`
    Less,

    /// `<=`
    LessEq,

    /// `==`
    Equal,

    /// `!=`
    NotEqual,

    /// `&&`
    And,

    /// `||`
    Or,

    /// `(`
    OpenParen,

    /// `)`
    CloseParen,

    /// `{`
    OpenCurly,

    /// `}`
    CloseCurly,

    /// `,`
    Comma,

    /// `;`
    Semicolon,

    /// Secuencia contigua de caracteres que no forma ningún token.
    Invalid(String),
}

impl Display for Token {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Token::*;

        match self {
            Id(lexeme) | BadId(lexeme) | Invalid(lexeme) => fmt.write_str(lexeme),
            IntLiteral(lexeme) | RealLiteral(lexeme) | StrLiteral(lexeme) => {
                fmt.write_str(lexeme)
            }
            TypeName(kind) => kind.fmt(fmt),
            Keyword(keyword) => keyword.fmt(fmt),
            Assign => fmt.write_str("="),
            Plus => fmt.write_str("+"),
            Minus => fmt.write_str("-"),
            Times => fmt.write_str("*"),
            Slash => fmt.write_str("/"),
            Percent => fmt.write_str("%"),
            Greater => fmt.write_str(">"),
            GreaterEq => fmt.write_str(">="),
            Less => fmt.write_str("<"),
            LessEq => fmt.write_str("<="),
            Equal => fmt.write_str("=="),
            NotEqual => fmt.write_str("!="),
            And => fmt.write_str("&&"),
            Or => fmt.write_str("||"),
            OpenParen => fmt.write_str("("),
            CloseParen => fmt.write_str(")"),
            OpenCurly => fmt.write_str("{"),
            CloseCurly => fmt.write_str("}"),
            Comma => fmt.write_str(","),
            Semicolon => fmt.write_str(";"),
        }
    }
}

impl Token {
    /// Determina si el token es una palabra reservada.
    ///
    /// Las palabras reservadas no se listan en la tabla de lexemas.
    pub fn is_reserved(&self) -> bool {
        matches!(self, Token::TypeName(_) | Token::Keyword(_))
    }
}

/// Una palabra reservada que no denota tipo.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Keyword {
    For,
    If,
    Else,
    Print,
    Read,
}

impl Display for Keyword {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Keyword::*;
        let string = match self {
            For => "for",
            If => "if",
            Else => "else",
            Print => "print",
            Read => "read",
        };

        fmt.write_str(string)
    }
}

impl FromStr for Keyword {
    type Err = ();

    fn from_str(string: &str) -> Result<Self, Self::Err> {
        use Keyword::*;

        const KEYWORDS: &[(&str, Keyword)] = &[
            ("for", For),
            ("if", If),
            ("else", Else),
            ("print", Print),
            ("read", Read),
        ];

        KEYWORDS
            .iter()
            .find(|&&(name, _)| name == string)
            .map(|&(_, keyword)| keyword)
            .ok_or(())
    }
}

/// Escanea un texto fuente completo.
pub fn scan(source: &str) -> Vec<Located<Token>> {
    Lexer::new(source).collect()
}

/// Máquina de escaneo sobre un flujo de caracteres.
///
/// La salida del lexer se determina a partir del siguiente carácter no
/// consumido, observado con lookahead de uno.
pub struct Lexer<'a> {
    chars: Peekable<Chars<'a>>,
    line: Line,
    pending: Option<Located<Token>>,
}

impl<'a> Lexer<'a> {
    /// Crea un lexer en estado inicial a partir de un texto.
    pub fn new(source: &'a str) -> Self {
        Lexer {
            chars: source.chars().peekable(),
            line: 1,
            pending: None,
        }
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.chars.next();
        if c == Some('\n') {
            self.line += 1;
        }

        c
    }

    /// Consume caracteres mientras satisfagan un predicado,
    /// acumulándolos al final de `text`.
    fn take_while<F>(&mut self, text: &mut String, accept: F)
    where
        F: Fn(char) -> bool,
    {
        while matches!(self.chars.peek(), Some(&c) if accept(c)) {
            text.push(self.bump().unwrap());
        }
    }

    /// Emite el token para un operador de dos caracteres si el
    /// siguiente carácter es `second`, o `single` en caso contrario.
    fn operator(&mut self, second: char, double: Token, single: Token) -> Token {
        if self.chars.peek() == Some(&second) {
            self.bump();
            double
        } else {
            single
        }
    }

    /// Identificador: `$` seguido de dígitos y mayúsculas.
    fn identifier(&mut self) -> Token {
        let mut lexeme = String::from('$');
        self.take_while(&mut lexeme, is_id_char);

        if lexeme.len() == 1 {
            // `$` huérfano, no inicia identificador alguno
            self.invalid(lexeme)
        } else {
            Token::Id(lexeme)
        }
    }

    /// Constante numérica o identificador mal formado.
    ///
    /// Un entero o real seguido inmediatamente de una letra mayúscula
    /// degenera en [`Token::BadId`], según la regla `\d+[A-Z][0-9A-Z]*`
    /// del lenguaje. Un punto no seguido de dígito no pertenece a la
    /// constante y pasa a formar una secuencia inválida.
    fn number(&mut self, first: char) -> Token {
        let mut lexeme = String::from(first);
        self.take_while(&mut lexeme, |c| c.is_ascii_digit());

        if matches!(self.chars.peek(), Some(c) if c.is_ascii_uppercase()) {
            self.take_while(&mut lexeme, is_id_char);
            return Token::BadId(lexeme);
        }

        if self.chars.peek() == Some(&'.') {
            self.bump();

            if matches!(self.chars.peek(), Some(c) if c.is_ascii_digit()) {
                lexeme.push('.');
                self.take_while(&mut lexeme, |c| c.is_ascii_digit());
                return Token::RealLiteral(lexeme);
            }

            // El punto consumido no forma parte de la constante
            self.pending = Some(Located::at(self.invalid(String::from('.')), self.line));
            return Token::IntLiteral(lexeme);
        }

        Token::IntLiteral(lexeme)
    }

    /// Constante de cadena con comillas y secuencias `\x` de escape.
    ///
    /// Una cadena sin cerrar antes del fin de renglón se emite completa
    /// como token inválido.
    fn string(&mut self) -> Token {
        let mut lexeme = String::from('"');

        loop {
            match self.chars.peek() {
                None | Some('\n') => return Token::Invalid(lexeme),

                Some('"') => {
                    self.bump();
                    lexeme.push('"');
                    return Token::StrLiteral(lexeme);
                }

                Some('\\') => {
                    self.bump();
                    lexeme.push('\\');
                    if let Some(escaped) = self.bump() {
                        lexeme.push(escaped);
                    }
                }

                Some(_) => lexeme.push(self.bump().unwrap()),
            }
        }
    }

    /// Palabra en minúscula: reservada o inválida.
    fn word(&mut self, first: char) -> Token {
        let mut lexeme = String::from(first);
        self.take_while(&mut lexeme, |c| c.is_ascii_lowercase());

        match lexeme.as_str() {
            "cat" => Token::TypeName(Kind::Int),
            "cats" => Token::TypeName(Kind::Float),
            "meow" => Token::TypeName(Kind::Text),
            _ => match Keyword::from_str(&lexeme) {
                Ok(keyword) => Token::Keyword(keyword),
                Err(()) => self.invalid(lexeme),
            },
        }
    }

    /// Agrupa caracteres no reconocidos contiguos en un solo token.
    fn invalid(&mut self, mut lexeme: String) -> Token {
        while matches!(self.chars.peek(), Some(&c) if !is_token_start(c) && !c.is_whitespace()) {
            lexeme.push(self.bump().unwrap());
        }

        Token::Invalid(lexeme)
    }

    /// Descarta un comentario tras haber consumido el `/` inicial.
    ///
    /// Retorna `false` si no seguía un comentario y el `/` era el
    /// operador de división.
    fn comment(&mut self) -> bool {
        match self.chars.peek() {
            Some('/') => {
                while !matches!(self.chars.peek(), None | Some('\n')) {
                    self.bump();
                }

                true
            }

            Some('*') => {
                self.bump();
                loop {
                    match self.bump() {
                        None => break,
                        Some('*') if self.chars.peek() == Some(&'/') => {
                            self.bump();
                            break;
                        }
                        Some(_) => (),
                    }
                }

                true
            }

            _ => false,
        }
    }
}

impl Iterator for Lexer<'_> {
    type Item = Located<Token>;

    fn next(&mut self) -> Option<Self::Item> {
        use Token::*;

        if let Some(pending) = self.pending.take() {
            return Some(pending);
        }

        loop {
            let line = self.line;
            let c = self.bump()?;

            let token = match c {
                c if c.is_whitespace() => continue,
                '/' if self.comment() => continue,

                '$' => self.identifier(),
                '"' => self.string(),
                c if c.is_ascii_digit() => self.number(c),
                c if c.is_ascii_lowercase() => self.word(c),

                '=' => self.operator('=', Equal, Assign),
                '>' => self.operator('=', GreaterEq, Greater),
                '<' => self.operator('=', LessEq, Less),

                '+' => Plus,
                '-' => Minus,
                '*' => Times,
                '/' => Slash,
                '%' => Percent,
                '(' => OpenParen,
                ')' => CloseParen,
                '{' => OpenCurly,
                '}' => CloseCurly,
                ',' => Comma,
                ';' => Semicolon,

                '!' if self.chars.peek() == Some(&'=') => {
                    self.bump();
                    NotEqual
                }

                '&' if self.chars.peek() == Some(&'&') => {
                    self.bump();
                    And
                }

                '|' if self.chars.peek() == Some(&'|') => {
                    self.bump();
                    Or
                }

                c => self.invalid(String::from(c)),
            };

            break Some(Located::at(token, line));
        }
    }
}

/// Determina si un carácter puede continuar un identificador.
fn is_id_char(c: char) -> bool {
    c.is_ascii_digit() || c.is_ascii_uppercase()
}

/// Determina si un carácter puede iniciar un token válido.
fn is_token_start(c: char) -> bool {
    c.is_ascii_digit()
        || c.is_ascii_lowercase()
        || matches!(
            c,
            '$' | '"'
                | '='
                | '+'
                | '-'
                | '*'
                | '/'
                | '%'
                | '>'
                | '<'
                | '!'
                | '&'
                | '|'
                | '('
                | ')'
                | '{'
                | '}'
                | ','
                | ';'
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<Token> {
        scan(source).into_iter().map(Located::into_inner).collect()
    }

    #[test]
    fn programa_simple() {
        use Token::*;

        let tokens = kinds("cat $1A;\n$1A = 5;\n");
        assert_eq!(
            tokens,
            vec![
                TypeName(Kind::Int),
                Id("$1A".into()),
                Semicolon,
                Id("$1A".into()),
                Assign,
                IntLiteral("5".into()),
                Semicolon,
            ]
        );
    }

    #[test]
    fn renglones_con_base_uno() {
        let tokens = scan("cat $1A;\n\n$1A = 5;");
        let lines: Vec<_> = tokens.iter().map(Located::line).collect();
        assert_eq!(lines, vec![1, 1, 1, 3, 3, 3, 3]);
    }

    #[test]
    fn identificador_mal_formado() {
        use Token::*;

        assert_eq!(kinds("2ITALIA"), vec![BadId("2ITALIA".into())]);
        assert_eq!(
            kinds("cat 2B;"),
            vec![TypeName(Kind::Int), BadId("2B".into()), Semicolon]
        );
    }

    #[test]
    fn invalidos_contiguos_se_agrupan() {
        use Token::*;

        assert_eq!(kinds("@#~"), vec![Invalid("@#~".into())]);
        assert_eq!(
            kinds("@@ $1A"),
            vec![Invalid("@@".into()), Id("$1A".into())]
        );
        assert_eq!(kinds("hola"), vec![Invalid("hola".into())]);
    }

    #[test]
    fn comentarios_descartados() {
        use Token::*;

        let tokens = kinds("// encabezado\ncat /* tipo */ $1A; /* fin");
        assert_eq!(
            tokens,
            vec![TypeName(Kind::Int), Id("$1A".into()), Semicolon]
        );

        let lines: Vec<_> = scan("// x\n$1A").iter().map(Located::line).collect();
        assert_eq!(lines, vec![2]);
    }

    #[test]
    fn constantes() {
        use Token::*;

        assert_eq!(kinds("5"), vec![IntLiteral("5".into())]);
        assert_eq!(kinds("3.14"), vec![RealLiteral("3.14".into())]);
        assert_eq!(kinds("\"ho la\""), vec![StrLiteral("\"ho la\"".into())]);
        assert_eq!(
            kinds("5. "),
            vec![IntLiteral("5".into()), Invalid(".".into())]
        );
        assert_eq!(kinds("\"sin cierre"), vec![Invalid("\"sin cierre".into())]);
    }

    #[test]
    fn operadores_dobles() {
        use Token::*;

        assert_eq!(
            kinds(">= <= == != && || > < ="),
            vec![
                GreaterEq, LessEq, Equal, NotEqual, And, Or, Greater, Less, Assign
            ]
        );
    }

    #[test]
    fn palabras_reservadas() {
        use Token::*;

        assert_eq!(
            kinds("for if else print read cats meow"),
            vec![
                Keyword(super::Keyword::For),
                Keyword(super::Keyword::If),
                Keyword(super::Keyword::Else),
                Keyword(super::Keyword::Print),
                Keyword(super::Keyword::Read),
                TypeName(Kind::Float),
                TypeName(Kind::Text),
            ]
        );
        assert!(Token::TypeName(Kind::Int).is_reserved());
        assert!(!Token::Semicolon.is_reserved());
    }
}
