//! `error`, `try`, `catcher`, `watch`.

use crate::error::{EvalResult, LittleError};
use crate::value::Value;

use super::super::Interpreter;
use super::require_args;

pub(in crate::interp) fn register(interp: &mut Interpreter) {
    interp.register("error", error_cmd);
    interp.register("try", try_cmd);
    interp.register("catcher", catcher);
    interp.register("watch", watch);
}

fn error_cmd(_interp: &mut Interpreter, args: &[Value]) -> EvalResult {
    let message = args.first().map(|v| v.as_str().into_owned()).unwrap_or_default();
    Err(LittleError::fix_head(message))
}

/// `try body recovery`: runs `body`; on success returns its value
/// untouched (recovery never runs). On error, clears the error and runs
/// `recovery`, returning its value.
fn try_cmd(interp: &mut Interpreter, args: &[Value]) -> EvalResult {
    require_args(args, 2, "try body recovery")?;
    match interp.parse(args[0].as_bytes(), false) {
        Ok(v) => Ok(v),
        Err(_) => {
            interp.clear_error();
            interp.parse(args[1].as_bytes(), false)
        }
    }
}

fn catcher(interp: &mut Interpreter, args: &[Value]) -> EvalResult {
    match args.first() {
        Some(program) => {
            interp.set_catcher(Some(program.as_bytes().to_vec()));
            Ok(program.clone())
        }
        None => Ok(Value::empty()),
    }
}

fn watch(interp: &mut Interpreter, args: &[Value]) -> EvalResult {
    require_args(args, 1, "watch name ?program?")?;
    let name = args[0].as_str().into_owned();
    let program = args.get(1).map(|v| v.as_bytes().to_vec());

    let target_env = interp.envs.find(&name).map(|(env, _)| env);
    let Some(env) = target_env else {
        return Err(LittleError::default_err(0, format!("no such variable {name}")));
    };
    interp.envs.get_mut(env).set_watch(&name, program.clone());
    Ok(program.map(Value::from_bytes).unwrap_or_else(Value::empty))
}

#[cfg(test)]
mod tests {
    use super::Interpreter;

    #[test]
    fn error_carries_user_message() {
        let mut i = Interpreter::new();
        let err = i.parse(b"error boom", false).unwrap_err();
        assert_eq!(err.message(), "boom");
    }

    #[test]
    fn try_passes_through_success_without_running_recovery() {
        let mut i = Interpreter::new();
        let v = i.parse(b"try { quote ok } { quote never }", false).unwrap();
        assert_eq!(v.as_str(), "ok");
    }

    #[test]
    fn catcher_intercepts_unknown_commands() {
        let mut i = Interpreter::new();
        i.parse(b"catcher { quote caught-[index $args 0] }", false).unwrap();
        let v = i.parse(b"frobnicate", false).unwrap();
        assert_eq!(v.as_str(), "caught-frobnicate");
    }

    #[test]
    fn watch_errors_on_unknown_variable() {
        let mut i = Interpreter::new();
        assert!(i.parse(b"watch nosuchvar { quote x }", false).is_err());
    }
}
