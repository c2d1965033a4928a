//! `topeval`, `upeval`, `downeval`, `enveval`, `jaileval`. The first three
//! retarget the "current environment" pointer for
//! the duration of one fragment and restore it on every exit path,
//! including error unwind.

use crate::environment::SetMode;
use crate::error::{EvalResult, LittleError};
use crate::value::Value;

use super::super::Interpreter;
use super::require_args;

pub(in crate::interp) fn register(interp: &mut Interpreter) {
    interp.register("topeval", topeval);
    interp.register("upeval", upeval);
    interp.register("downeval", downeval);
    interp.register("enveval", enveval);
    interp.register("jaileval", jaileval);
}

fn topeval(interp: &mut Interpreter, args: &[Value]) -> EvalResult {
    require_args(args, 1, "topeval body")?;
    let prev = interp.envs.current;
    interp.envs.current = interp.envs.root;
    let result = interp.parse(args[0].as_bytes(), false);
    interp.envs.current = prev;
    result
}

fn upeval(interp: &mut Interpreter, args: &[Value]) -> EvalResult {
    require_args(args, 1, "upeval body")?;
    let prev = interp.envs.current;
    let parent = interp.envs.get(prev).parent.unwrap_or(prev);
    interp.envs.down = Some(prev);
    interp.envs.current = parent;
    let result = interp.parse(args[0].as_bytes(), false);
    interp.envs.current = prev;
    result
}

fn downeval(interp: &mut Interpreter, args: &[Value]) -> EvalResult {
    require_args(args, 1, "downeval body")?;
    let Some(down) = interp.envs.down else {
        return Err(LittleError::default_err(0, "downeval: no enclosing upeval"));
    };
    let prev = interp.envs.current;
    interp.envs.current = down;
    let result = interp.parse(args[0].as_bytes(), false);
    interp.envs.current = prev;
    result
}

fn enveval(interp: &mut Interpreter, args: &[Value]) -> EvalResult {
    require_args(args, 1, "enveval ?invars? ?outvars? body")?;
    let (invars, outvars, body) = match args.len() {
        1 => (None, None, &args[0]),
        2 => (Some(&args[0]), None, &args[1]),
        _ => (Some(&args[0]), Some(&args[1]), &args[2]),
    };

    let names = |interp: &mut Interpreter, v: &Value| -> Result<Vec<String>, LittleError> {
        Ok(interp.subst_to_list(v.as_bytes())?.iter().map(|x| x.as_str().into_owned()).collect())
    };

    let invar_names = match invars {
        Some(v) => names(interp, v)?,
        None => Vec::new(),
    };
    let outvar_names = match outvars {
        Some(v) => names(interp, v)?,
        None => invar_names.clone(),
    };

    let caller = interp.envs.current;
    let callsite_values: Vec<Value> = invar_names
        .iter()
        .map(|n| interp.envs.find(n).map(|(_, v)| v.clone()).unwrap_or_else(Value::empty))
        .collect();

    let frame = interp.envs.push();
    for (name, value) in invar_names.iter().zip(callsite_values.iter()) {
        interp.envs.assign(SetMode::LocalNew, name, value.clone());
    }

    let result = interp.parse(body.as_bytes(), false);

    let outvar_values: Vec<(String, Value)> = outvar_names
        .iter()
        .map(|n| (n.clone(), interp.envs.get(frame).local_get(n).cloned().unwrap_or_else(Value::empty)))
        .collect();

    interp.envs.pop();
    for (name, value) in outvar_values {
        interp.envs.current = caller;
        interp.envs.assign(SetMode::Local, &name, value);
    }
    interp.envs.current = caller;

    result
}

fn jaileval(interp: &mut Interpreter, args: &[Value]) -> EvalResult {
    require_args(args, 1, "jaileval ?clean? body")?;
    let (clean, body) = if args.len() > 1 && args[0].as_str().as_ref() == "clean" {
        (true, &args[1])
    } else {
        (false, &args[0])
    };

    let mut jail = Interpreter::new_bare();
    if !clean {
        interp.clone_builtins_into(&mut jail);
    }
    jail.parse(body.as_bytes(), false)
}

#[cfg(test)]
mod tests {
    use super::Interpreter;

    #[test]
    fn topeval_runs_against_root_regardless_of_current_frame() {
        let mut i = Interpreter::new();
        i.parse(b"func setter {} { topeval { set g 9 } }", false).unwrap();
        i.parse(b"setter", false).unwrap();
        assert_eq!(i.parse(b"set g", false).unwrap().as_str(), "9");
    }

    #[test]
    fn upeval_writes_into_the_caller_frame() {
        let mut i = Interpreter::new();
        i.parse(b"func child {} { upeval { set fromchild 1 } }", false).unwrap();
        i.parse(b"func parent {} { child; reflect has-var fromchild }", false).unwrap();
        assert_eq!(i.parse(b"parent", false).unwrap().as_str(), "1");
    }

    #[test]
    fn downeval_restores_the_callees_own_frame() {
        let mut i = Interpreter::new();
        i.parse(b"func child {} { local marker; set marker childval; upeval { downeval { quote $marker } } }", false).unwrap();
        assert_eq!(i.parse(b"child", false).unwrap().as_str(), "childval");
    }

    #[test]
    fn enveval_copies_invars_in_and_outvars_back_out() {
        let mut i = Interpreter::new();
        i.parse(b"set x 10", false).unwrap();
        let v = i.parse(b"enveval x { set x [expr $x + 1] }", false).unwrap();
        assert_eq!(v.as_str(), "11");
        assert_eq!(i.parse(b"set x", false).unwrap().as_str(), "11");
    }

    #[test]
    fn jaileval_does_not_see_caller_script_functions() {
        let mut i = Interpreter::new();
        i.parse(b"func onlyhere {} { quote yes }", false).unwrap();
        let err = i.parse(b"jaileval { onlyhere }", false).unwrap_err();
        assert!(err.message().contains("unknown function"));
    }

    #[test]
    fn jaileval_can_still_use_host_builtins() {
        let mut i = Interpreter::new();
        let v = i.parse(b"jaileval { expr 2 + 2 }", false).unwrap();
        assert_eq!(v.as_str(), "4");
    }
}
