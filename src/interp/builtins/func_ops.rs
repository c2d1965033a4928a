//! `func`, `rename`, `unusedname`.

use crate::error::{EvalResult, LittleError};
use crate::value::Value;

use super::super::Interpreter;
use super::require_args;

pub(in crate::interp) fn register(interp: &mut Interpreter) {
    interp.register("func", func);
    interp.register("rename", rename);
    interp.register("unusedname", unusedname);
}

/// `func name argnames? body`: 1-arg form is `body` only (argnames
/// default to the literal `args`); 2-arg is `argnames body`; 3-arg is
/// `name argnames body`. The 1- and 2-arg forms get an anonymous unique
/// name.
fn func(interp: &mut Interpreter, args: &[Value]) -> EvalResult {
    require_args(args, 1, "func ?name? ?argnames? body")?;
    let (name, argnames_value, body) = match args.len() {
        1 => (None, None, &args[0]),
        2 => (None, Some(&args[0]), &args[1]),
        _ => (Some(&args[0]), Some(&args[1]), &args[2]),
    };

    let argnames = match argnames_value {
        Some(v) => interp
            .subst_to_list(v.as_bytes())?
            .iter()
            .map(|v| v.as_str().into_owned())
            .collect(),
        None => vec!["args".to_string()],
    };

    let func_name = match name {
        Some(n) => n.as_str().into_owned(),
        None => interp.unused_name("func"),
    };

    interp.register_script(&func_name, argnames, body.clone());
    Ok(Value::from_str(&func_name))
}

fn rename(interp: &mut Interpreter, args: &[Value]) -> EvalResult {
    require_args(args, 2, "rename old new")?;
    let old = args[0].as_str().into_owned();
    let new = args[1].as_str().into_owned();
    if !interp.rename_command(&old, &new) {
        return Err(LittleError::default_err(0, format!("unknown function {old}")));
    }
    Ok(Value::from_str(&new))
}

fn unusedname(interp: &mut Interpreter, args: &[Value]) -> EvalResult {
    let prefix = args.first().map(|v| v.as_str().into_owned()).unwrap_or_else(|| "anon".to_string());
    Ok(Value::from_str(&interp.unused_name(&prefix)))
}

#[cfg(test)]
mod tests {
    use super::Interpreter;

    #[test]
    fn three_arg_func_names_itself() {
        let mut i = Interpreter::new();
        let name = i.parse(b"func double {x} { expr $x * 2 }", false).unwrap();
        assert_eq!(name.as_str(), "double");
        assert_eq!(i.parse(b"double 21", false).unwrap().as_str(), "42");
    }

    #[test]
    fn one_arg_func_gets_anonymous_name_and_binds_args() {
        let mut i = Interpreter::new();
        let name = i.parse(b"func { count $args }", false).unwrap();
        assert!(!name.as_str().is_empty());
        assert_ne!(name.as_str(), "count");
        let call = format!("{} a b c", name.as_str());
        assert_eq!(i.parse(call.as_bytes(), false).unwrap().as_str(), "3");
    }

    #[test]
    fn rename_preserves_callability_under_new_name() {
        let mut i = Interpreter::new();
        i.parse(b"func greet {} { quote hi }", false).unwrap();
        i.parse(b"rename greet hello", false).unwrap();
        assert_eq!(i.parse(b"hello", false).unwrap().as_str(), "hi");
        assert!(i.parse(b"greet", false).is_err());
    }

    #[test]
    fn unusedname_never_collides() {
        let mut i = Interpreter::new();
        let a = i.parse(b"unusedname f", false).unwrap();
        i.parse(format!("func {} {{}} {{ quote x }}", a.as_str()).as_bytes(), false).unwrap();
        let b = i.parse(b"unusedname f", false).unwrap();
        assert_ne!(a.as_str(), b.as_str());
    }
}
