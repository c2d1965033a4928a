//! `quote`, `subst`, `concat`.

use crate::value::Value;

use super::super::Interpreter;

pub(in crate::interp) fn register(interp: &mut Interpreter) {
    interp.register("quote", quote);
    interp.register("subst", subst);
    interp.register("concat", concat);
}

fn join_with_spaces(args: &[Value]) -> Value {
    let mut out = Value::empty();
    for (i, a) in args.iter().enumerate() {
        if i > 0 {
            out.append_byte(b' ');
        }
        out.append_value(a);
    }
    out
}

/// Returns its arguments joined with single spaces, unescaped -- this is
/// how scenario 2 (`quote $foo $baz` -> `"bar qux"`) works: substitution
/// already happened at word-parse time, `quote` just assembles the result.
fn quote(_interp: &mut Interpreter, args: &[Value]) -> crate::error::EvalResult {
    Ok(join_with_spaces(args))
}

fn subst(interp: &mut Interpreter, args: &[Value]) -> crate::error::EvalResult {
    let code = join_with_spaces(args);
    interp.subst_to_value(code.as_bytes())
}

fn concat(_interp: &mut Interpreter, args: &[Value]) -> crate::error::EvalResult {
    Ok(join_with_spaces(args))
}

#[cfg(test)]
mod tests {
    use super::Interpreter;

    #[test]
    fn quote_joins_already_substituted_words() {
        let mut i = Interpreter::new();
        i.parse(b"set foo bar", false).unwrap();
        i.parse(b"set baz qux", false).unwrap();
        assert_eq!(i.parse(b"quote $foo $baz", false).unwrap().as_str(), "bar qux");
    }

    #[test]
    fn quote_does_not_reinterpret_its_arguments() {
        let mut i = Interpreter::new();
        assert_eq!(i.parse(br#"quote {$nosuch}"#, false).unwrap().as_str(), "$nosuch");
    }

    #[test]
    fn subst_evaluates_its_joined_argument_as_code() {
        let mut i = Interpreter::new();
        assert_eq!(i.parse(b"subst {expr 2 + 2}", false).unwrap().as_str(), "4");
    }

    #[test]
    fn concat_joins_multiple_words_with_single_spaces() {
        let mut i = Interpreter::new();
        assert_eq!(i.parse(b"concat a b c", false).unwrap().as_str(), "a b c");
    }
}
