//! `reflect` — introspection.
//!
//! A single builtin dispatching on its first argument. Listing-shaped
//! queries (`funcs`, `vars`) return a quoted List the caller then
//! iterates, rather than an unspecified opaque string.

use crate::error::{EvalResult, LittleError};
use crate::list::List;
use crate::value::Value;

use super::super::Interpreter;
use super::require_args;

pub(in crate::interp) fn register(interp: &mut Interpreter) {
    interp.register("reflect", reflect);
}

const VERSION: &str = "little 0.1";

fn reflect(interp: &mut Interpreter, args: &[Value]) -> EvalResult {
    require_args(args, 1, "reflect kind ?arg?")?;
    let kind = args[0].as_str().into_owned();
    match kind.as_str() {
        "version" => Ok(Value::from_str(VERSION)),
        "funcs" => {
            let list: List = interp.function_names().into_iter().map(|n| Value::from_str(&n)).collect();
            Ok(list.to_value(true))
        }
        "vars" => {
            let list: List = interp.envs.current().var_names().into_iter().map(|n| Value::from_str(&n)).collect();
            Ok(list.to_value(true))
        }
        "has-func" => {
            let name = arg1(args)?;
            Ok(Value::from_int(interp.has_function(name.as_str().as_ref()) as i64))
        }
        "has-var" => {
            let name = arg1(args)?;
            Ok(Value::from_int(interp.envs.find(name.as_str().as_ref()).is_some() as i64))
        }
        "has-global" => {
            let name = arg1(args)?;
            let root = interp.envs.root;
            Ok(Value::from_int(interp.envs.get(root).has_local(name.as_str().as_ref()) as i64))
        }
        "dollar-prefix" => match args.get(1) {
            Some(new_prefix) => {
                interp.set_dollar_prefix(new_prefix.as_str().into_owned());
                Ok(new_prefix.clone())
            }
            None => Ok(Value::from_str(interp.dollar_prefix())),
        },
        "this" => Ok(interp.current_body().cloned().unwrap_or_else(Value::empty)),
        "name" => Ok(interp
            .current_fn_name()
            .map(Value::from_str)
            .or_else(|| interp.catcher_target().cloned())
            .unwrap_or_else(Value::empty)),
        other => Err(LittleError::fix_head(format!("unknown reflect kind \"{other}\""))),
    }
}

fn arg1(args: &[Value]) -> Result<Value, LittleError> {
    args.get(1).cloned().ok_or_else(|| LittleError::fix_head("reflect: missing argument"))
}

#[cfg(test)]
mod tests {
    use super::Interpreter;

    #[test]
    fn has_func_and_has_var() {
        let mut i = Interpreter::new();
        i.parse(b"set x 1", false).unwrap();
        assert_eq!(i.parse(b"reflect has-func set", false).unwrap().as_str(), "1");
        assert_eq!(i.parse(b"reflect has-func nosuch", false).unwrap().as_str(), "0");
        assert_eq!(i.parse(b"reflect has-var x", false).unwrap().as_str(), "1");
        assert_eq!(i.parse(b"reflect has-var nosuch", false).unwrap().as_str(), "0");
    }

    #[test]
    fn dollar_prefix_getter_and_setter() {
        let mut i = Interpreter::new();
        assert_eq!(i.parse(b"reflect dollar-prefix", false).unwrap().as_str(), "set ");
        i.parse(b"reflect dollar-prefix {myset }", false).unwrap();
        assert_eq!(i.dollar_prefix(), "myset ");
        // Restoring the default re-enables ordinary `$name` substitution.
        i.set_dollar_prefix("set ");
        i.parse(b"set n 7", false).unwrap();
        assert_eq!(i.parse(b"$n", false).unwrap().as_str(), "7");
    }

    #[test]
    fn name_reports_the_currently_executing_function() {
        let mut i = Interpreter::new();
        i.parse(b"func whoami {} { reflect name }", false).unwrap();
        assert_eq!(i.parse(b"whoami", false).unwrap().as_str(), "whoami");
    }

    #[test]
    fn unknown_kind_is_an_error() {
        let mut i = Interpreter::new();
        assert!(i.parse(b"reflect bogus", false).is_err());
    }
}
