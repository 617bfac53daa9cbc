//! Optimización textual de instrucciones dependientes.
//!
//! Técnica de reorganización sobre el texto fuente, independiente por
//! completo de la representación intermedia: si una asignación usa
//! dentro de su expresión algo que otra asignación anterior ya
//! calculó, la subexpresión se reemplaza por la variable que ya la
//! almacena.
//!
//! ```text
//! $1A = $Z + 22;
//! $2B = $W - $Z + 22;
//! ```
//!
//! se reescribe como
//!
//! ```text
//! $1A = $Z + 22;
//! $2B = $W-$1A;
//! ```
//!
//! Solo participan los renglones con forma `$ID = expresión;`; el
//! resto (ciclos, llaves, comentarios) pasa intacto. Las expresiones
//! se comparan sin espacios y el resultado no los reinserta.

/// Reescribe un texto fuente completo, renglón por renglón.
pub fn rewrite(source: &str) -> String {
    // expresión normalizada -> variable que ya la almacena
    let mut previous: Vec<(String, String)> = Vec::new();
    let mut output: Vec<String> = Vec::new();

    for line in source.lines() {
        let (var, expr) = match assignment_parts(line) {
            Some(parts) => parts,

            // No es una asignación simple reconocida
            None => {
                output.push(line.to_owned());
                continue;
            }
        };

        let normalized = normalize(expr);

        let mut rewritten = normalized.clone();
        for (seen, holder) in &previous {
            rewritten = rewritten.replace(seen.as_str(), holder);
        }

        // Se registra la expresión original, no la reescrita, para que
        // una aparición posterior idéntica también se sustituya
        match previous.iter_mut().find(|(seen, _)| *seen == normalized) {
            Some((_, holder)) => *holder = var.to_owned(),
            None => previous.push((normalized, var.to_owned())),
        }

        output.push(format!("{} = {};", var, rewritten));
    }

    output.join("\n")
}

/// Reconoce un renglón `$ID = expresión;` y separa sus dos partes.
///
/// El `==` de comparación no cuenta como asignación. La expresión
/// abarca hasta el último `;` del renglón.
fn assignment_parts(line: &str) -> Option<(&str, &str)> {
    let trimmed = line.trim_start();
    let after_dollar = trimmed.strip_prefix('$')?;

    let id_len = after_dollar
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .unwrap_or(after_dollar.len());
    if id_len == 0 {
        return None;
    }

    let var = &trimmed[..1 + id_len];
    let rest = after_dollar[id_len..].trim_start();

    let rest = rest.strip_prefix('=')?;
    if rest.starts_with('=') {
        return None;
    }

    let rest = rest.trim_start();
    let expr = &rest[..rest.rfind(';')?];
    if expr.is_empty() {
        return None;
    }

    Some((var, expr))
}

fn normalize(expr: &str) -> String {
    expr.chars().filter(|c| !c.is_whitespace()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subexpresion_repetida_se_sustituye() {
        let source = "$1A = $Z + 22;\n$2B = $W - $Z + 22;";
        assert_eq!(rewrite(source), "$1A = $Z+22;\n$2B = $W-$1A;");
    }

    #[test]
    fn expresion_identica_completa() {
        let source = "$1A = $Z * 3;\n$2B = $Z * 3;";
        assert_eq!(rewrite(source), "$1A = $Z*3;\n$2B = $1A;");
    }

    #[test]
    fn renglones_ajenos_pasan_intactos() {
        let source = "cat $1A;\nfor ($I = 0; $I < 2; $I = $I + 1) {\n}\n// nota";
        assert_eq!(rewrite(source), source);
    }

    #[test]
    fn comparacion_no_es_asignacion() {
        let source = "$1A == 5;";
        assert_eq!(rewrite(source), source);
    }

    #[test]
    fn normalizacion_ignora_espacios() {
        let source = "$1A = $Z+22;\n$2B = $W - $Z + 22;";
        assert_eq!(rewrite(source), "$1A = $Z+22;\n$2B = $W-$1A;");
    }

    #[test]
    fn reconocimiento_de_partes() {
        assert_eq!(assignment_parts("$1A = 5;"), Some(("$1A", "5")));
        assert_eq!(assignment_parts("  $2B = $1A + 1;"), Some(("$2B", "$1A + 1")));
        assert_eq!(assignment_parts("cat $1A;"), None);
        assert_eq!(assignment_parts("$ = 5;"), None);
        assert_eq!(assignment_parts("$1A = ;"), None);
        assert_eq!(assignment_parts("$1A = 5"), None);
    }
}
