//! `set`, `local`, `global`, `eval`, `return`, `result`, `if`, `while`,
//! `for`, `inc`, `dec`, `break`, `continue`.

use crate::environment::{LoopSignal, SetMode};
use crate::error::{EvalResult, LittleError};
use crate::expr;
use crate::value::Value;

use super::super::Interpreter;
use super::{require_args, truthy_cond};

pub(in crate::interp) fn register(interp: &mut Interpreter) {
    interp.register("set", set);
    interp.register("local", local);
    interp.register("global", global);
    interp.register("eval", eval);
    interp.register("return", cmd_return);
    interp.register("result", result);
    interp.register("if", cmd_if);
    interp.register("while", cmd_while);
    interp.register("for", cmd_for);
    interp.register("inc", inc);
    interp.register("dec", dec);
    interp.register("break", cmd_break);
    interp.register("continue", cmd_continue);
    interp.register("expr", cmd_expr);
}

fn cmd_expr(interp: &mut Interpreter, args: &[Value]) -> EvalResult {
    let mut joined = Value::empty();
    for (i, a) in args.iter().enumerate() {
        if i > 0 {
            joined.append_byte(b' ');
        }
        joined.append_value(a);
    }
    let substituted = interp.substitute_inline(joined.as_bytes())?;
    expr::eval_expr(&substituted.as_str())
}

fn assign_and_mirror(interp: &mut Interpreter, mode: SetMode, name: &str, value: Value) -> EvalResult {
    let out = interp.envs.assign(mode, name, value.clone());
    if out.is_root {
        interp.env_set(name, value.as_str().as_ref());
    }
    if let Some(watch) = out.watch {
        run_watch(interp, out.env, &watch);
    }
    Ok(value)
}

fn run_watch(interp: &mut Interpreter, owner: crate::environment::EnvId, program: &[u8]) {
    let saved = interp.envs.current;
    interp.envs.current = owner;
    let _ = interp.parse(program, false);
    interp.envs.current = saved;
}

fn set(interp: &mut Interpreter, args: &[Value]) -> EvalResult {
    require_args(args, 1, "set name ?value? ?name value ...?")?;
    if args.len() == 1 {
        let name = args[0].as_str().into_owned();
        if let Some(rooted) = interp.env_get(&name) {
            return Ok(Value::from_str(&rooted));
        }
        return Ok(interp.envs.find(&name).map(|(_, v)| v.clone()).unwrap_or_else(Value::empty));
    }
    if args.len() % 2 != 0 {
        return Err(LittleError::fix_head("set requires name/value pairs"));
    }
    let mut last = Value::empty();
    for pair in args.chunks(2) {
        let name = pair[0].as_str().into_owned();
        last = assign_and_mirror(interp, SetMode::Local, &name, pair[1].clone())?;
    }
    Ok(last)
}

fn local(interp: &mut Interpreter, args: &[Value]) -> EvalResult {
    require_args(args, 1, "local name ?value? ?name value ...?")?;
    if args.len() == 1 {
        let name = args[0].as_str().into_owned();
        interp.envs.assign(SetMode::LocalNew, &name, Value::empty());
        return Ok(Value::empty());
    }
    if args.len() % 2 != 0 {
        return Err(LittleError::fix_head("local requires name/value pairs"));
    }
    let mut last = Value::empty();
    for pair in args.chunks(2) {
        let name = pair[0].as_str().into_owned();
        interp.envs.assign(SetMode::LocalNew, &name, pair[1].clone());
        last = pair[1].clone();
    }
    Ok(last)
}

fn global(interp: &mut Interpreter, args: &[Value]) -> EvalResult {
    require_args(args, 1, "global name ?value? ?name value ...?")?;
    if args.len() == 1 {
        let name = args[0].as_str().into_owned();
        if let Some(rooted) = interp.env_get(&name) {
            return Ok(Value::from_str(&rooted));
        }
        return Ok(interp.envs.get(interp.envs.root).local_get(&name).cloned().unwrap_or_else(Value::empty));
    }
    if args.len() % 2 != 0 {
        return Err(LittleError::fix_head("global requires name/value pairs"));
    }
    let mut last = Value::empty();
    for pair in args.chunks(2) {
        let name = pair[0].as_str().into_owned();
        last = assign_and_mirror(interp, SetMode::Global, &name, pair[1].clone())?;
    }
    Ok(last)
}

fn eval(interp: &mut Interpreter, args: &[Value]) -> EvalResult {
    require_args(args, 1, "eval body")?;
    let mut combined = Value::empty();
    for (i, a) in args.iter().enumerate() {
        if i > 0 {
            combined.append_byte(b' ');
        }
        combined.append_value(a);
    }
    interp.parse(combined.as_bytes(), false)
}

fn cmd_return(interp: &mut Interpreter, args: &[Value]) -> EvalResult {
    let value = args.first().cloned().unwrap_or_else(Value::empty);
    let env = interp.envs.current_mut();
    env.retval = value.clone();
    env.retval_set = true;
    env.breakrun = true;
    Ok(value)
}

fn result(interp: &mut Interpreter, args: &[Value]) -> EvalResult {
    let value = args.first().cloned().unwrap_or_else(Value::empty);
    let env = interp.envs.current_mut();
    env.retval = value.clone();
    env.retval_set = true;
    Ok(value)
}

fn cmd_if(interp: &mut Interpreter, args: &[Value]) -> EvalResult {
    let (invert, rest) = split_not(args);
    require_args(rest, 2, "if ?not? cond then ?else?")?;
    let truth = truthy_cond(interp, &rest[0])? ^ invert;
    if truth {
        interp.parse(rest[1].as_bytes(), false)
    } else if let Some(else_body) = rest.get(2) {
        interp.parse(else_body.as_bytes(), false)
    } else {
        Ok(Value::empty())
    }
}

fn split_not(args: &[Value]) -> (bool, &[Value]) {
    if args.first().map(|v| v.as_str().as_ref() == "not").unwrap_or(false) {
        (true, &args[1..])
    } else {
        (false, args)
    }
}

fn cmd_while(interp: &mut Interpreter, args: &[Value]) -> EvalResult {
    let (invert, rest) = split_not(args);
    require_args(rest, 2, "while ?not? cond body")?;
    let cond = rest[0].clone();
    let body = rest[1].clone();
    let mut last = Value::empty();
    loop {
        if !(truthy_cond(interp, &cond)? ^ invert) {
            break;
        }
        last = interp.parse(body.as_bytes(), false)?;
        if interp.envs.current().breakrun {
            match interp.take_loop_signal() {
                LoopSignal::Break => {
                    interp.envs.current_mut().breakrun = false;
                    break;
                }
                LoopSignal::Continue => {
                    interp.envs.current_mut().breakrun = false;
                    continue;
                }
                LoopSignal::None => return Ok(last),
            }
        }
    }
    Ok(last)
}

fn cmd_for(interp: &mut Interpreter, args: &[Value]) -> EvalResult {
    require_args(args, 4, "for init cond step body")?;
    let (init, cond, step, body) = (args[0].clone(), args[1].clone(), args[2].clone(), args[3].clone());
    interp.parse(init.as_bytes(), false)?;
    let mut last = Value::empty();
    loop {
        if !truthy_cond(interp, &cond)? {
            break;
        }
        last = interp.parse(body.as_bytes(), false)?;
        if interp.envs.current().breakrun {
            match interp.take_loop_signal() {
                LoopSignal::Break => {
                    interp.envs.current_mut().breakrun = false;
                    break;
                }
                LoopSignal::Continue => {
                    interp.envs.current_mut().breakrun = false;
                }
                LoopSignal::None => return Ok(last),
            }
        }
        interp.parse(step.as_bytes(), false)?;
    }
    Ok(last)
}

fn inc(interp: &mut Interpreter, args: &[Value]) -> EvalResult {
    require_args(args, 1, "inc name ?amount?")?;
    step_var(interp, args, 1)
}

fn dec(interp: &mut Interpreter, args: &[Value]) -> EvalResult {
    require_args(args, 1, "dec name ?amount?")?;
    step_var(interp, args, -1)
}

fn step_var(interp: &mut Interpreter, args: &[Value], default_sign: i64) -> EvalResult {
    let name = args[0].as_str().into_owned();
    let amount = match args.get(1) {
        Some(v) => v.to_int().unwrap_or(1) * default_sign.signum(),
        None => default_sign,
    };
    let current = interp.envs.find(&name).and_then(|(_, v)| v.to_int()).unwrap_or(0);
    let updated = Value::from_int(current.wrapping_add(amount));
    assign_and_mirror(interp, SetMode::Local, &name, updated)
}

fn cmd_break(interp: &mut Interpreter, _args: &[Value]) -> EvalResult {
    let env = interp.envs.current_mut();
    env.loop_signal = LoopSignal::Break;
    env.breakrun = true;
    Ok(Value::empty())
}

fn cmd_continue(interp: &mut Interpreter, _args: &[Value]) -> EvalResult {
    let env = interp.envs.current_mut();
    env.loop_signal = LoopSignal::Continue;
    env.breakrun = true;
    Ok(Value::empty())
}

#[cfg(test)]
mod tests {
    use super::Interpreter;

    #[test]
    fn set_reads_and_writes_name_value_pairs() {
        let mut i = Interpreter::new();
        assert_eq!(i.parse(b"set x 1 y 2", false).unwrap().as_str(), "2");
        assert_eq!(i.parse(b"set x", false).unwrap().as_str(), "1");
        assert_eq!(i.parse(b"set y", false).unwrap().as_str(), "2");
        assert_eq!(i.parse(b"set nosuch", false).unwrap().as_str(), "");
    }

    #[test]
    fn local_with_no_value_resets_to_empty() {
        let mut i = Interpreter::new();
        i.parse(b"func f {} { local x; set x }", false).unwrap();
        assert_eq!(i.parse(b"f", false).unwrap().as_str(), "");
    }

    #[test]
    fn global_reaches_root_from_inside_a_function() {
        let mut i = Interpreter::new();
        i.parse(b"set g 1", false).unwrap();
        i.parse(b"func bump {} { global g [expr [global g] + 1] }", false).unwrap();
        i.parse(b"bump", false).unwrap();
        assert_eq!(i.parse(b"set g", false).unwrap().as_str(), "2");
    }

    #[test]
    fn eval_runs_its_joined_argument_as_one_program() {
        let mut i = Interpreter::new();
        assert_eq!(i.parse(b"eval {set x 5} {set y 6}", false).unwrap().as_str(), "6");
        assert_eq!(i.parse(b"set x", false).unwrap().as_str(), "5");
    }

    #[test]
    fn return_stops_the_body_but_result_lets_it_keep_running() {
        let mut i = Interpreter::new();
        i.parse(b"set hit_after_return 0", false).unwrap();
        i.parse(b"func early {} { return first; global hit_after_return 1 }", false).unwrap();
        assert_eq!(i.parse(b"early", false).unwrap().as_str(), "first");
        assert_eq!(i.parse(b"set hit_after_return", false).unwrap().as_str(), "0");

        i.parse(b"set hit_after_result 0", false).unwrap();
        i.parse(b"func late {} { result first; global hit_after_result 1 }", false).unwrap();
        assert_eq!(i.parse(b"late", false).unwrap().as_str(), "first");
        assert_eq!(i.parse(b"set hit_after_result", false).unwrap().as_str(), "1");
    }

    #[test]
    fn if_not_inverts_the_condition() {
        let mut i = Interpreter::new();
        assert_eq!(i.parse(b"if not 0 { quote yes } { quote no }", false).unwrap().as_str(), "yes");
        assert_eq!(i.parse(b"if 0 { quote yes }", false).unwrap().as_str(), "");
    }

    #[test]
    fn while_break_stops_the_loop_early() {
        let mut i = Interpreter::new();
        i.parse(b"set i 0", false).unwrap();
        i.parse(b"set hits 0", false).unwrap();
        i.parse(
            b"while {$i < 10} { if {$i == 3} { break }; inc hits; inc i }",
            false,
        )
        .unwrap();
        assert_eq!(i.parse(b"set hits", false).unwrap().as_str(), "3");
    }

    #[test]
    fn while_continue_skips_the_rest_of_the_body() {
        let mut i = Interpreter::new();
        i.parse(b"set i 0", false).unwrap();
        i.parse(b"set hits 0", false).unwrap();
        i.parse(
            b"while {$i < 5} { inc i; if {$i == 2} { continue }; inc hits }",
            false,
        )
        .unwrap();
        assert_eq!(i.parse(b"set hits", false).unwrap().as_str(), "4");
    }

    #[test]
    fn for_loop_runs_init_cond_step_in_order() {
        let mut i = Interpreter::new();
        i.parse(b"set sum 0", false).unwrap();
        i.parse(b"for {set i 0} {$i < 4} {inc i} { inc sum $i }", false).unwrap();
        assert_eq!(i.parse(b"set sum", false).unwrap().as_str(), "6");
    }

    #[test]
    fn inc_and_dec_default_to_step_one() {
        let mut i = Interpreter::new();
        i.parse(b"set n 5", false).unwrap();
        assert_eq!(i.parse(b"inc n", false).unwrap().as_str(), "6");
        assert_eq!(i.parse(b"dec n", false).unwrap().as_str(), "5");
        assert_eq!(i.parse(b"inc n 10", false).unwrap().as_str(), "15");
        assert_eq!(i.parse(b"dec n 4", false).unwrap().as_str(), "11");
    }
}
