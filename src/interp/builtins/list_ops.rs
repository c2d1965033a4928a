//! `list`, `lmap`, `count`, `index`, `indexof`, `append`, `slice`,
//! `filter`, `foreach`.

use crate::environment::{LoopSignal, SetMode};
use crate::error::EvalResult;
use crate::list::List;
use crate::value::Value;

use super::super::Interpreter;
use super::{require_args, truthy_cond};

pub(in crate::interp) fn register(interp: &mut Interpreter) {
    interp.register("list", list);
    interp.register("lmap", lmap);
    interp.register("count", count);
    interp.register("index", index);
    interp.register("indexof", indexof);
    interp.register("append", append);
    interp.register("slice", slice);
    interp.register("filter", filter);
    interp.register("foreach", foreach);
}

fn list(_interp: &mut Interpreter, args: &[Value]) -> EvalResult {
    Ok(List::from_vec(args.to_vec()).to_value(true))
}

fn parse_list(interp: &mut Interpreter, value: &Value) -> Result<List, crate::error::LittleError> {
    interp.subst_to_list(value.as_bytes())
}

fn count(interp: &mut Interpreter, args: &[Value]) -> EvalResult {
    require_args(args, 1, "count list")?;
    let l = parse_list(interp, &args[0])?;
    Ok(Value::from_int(l.len() as i64))
}

fn index(interp: &mut Interpreter, args: &[Value]) -> EvalResult {
    require_args(args, 2, "index list i")?;
    let l = parse_list(interp, &args[0])?;
    let i = args[1].to_int().unwrap_or(-1);
    Ok(l.get(i).cloned().unwrap_or_else(Value::empty))
}

fn indexof(interp: &mut Interpreter, args: &[Value]) -> EvalResult {
    require_args(args, 2, "indexof list value")?;
    let l = parse_list(interp, &args[0])?;
    let target = &args[1];
    let found = l.iter().position(|v| v == target);
    Ok(Value::from_int(found.map(|i| i as i64).unwrap_or(-1)))
}

fn append(interp: &mut Interpreter, args: &[Value]) -> EvalResult {
    require_args(args, 1, "append list ?value ...?")?;
    let mut l = parse_list(interp, &args[0])?;
    for v in &args[1..] {
        l.push(v.clone());
    }
    Ok(l.to_value(true))
}

fn slice(interp: &mut Interpreter, args: &[Value]) -> EvalResult {
    require_args(args, 3, "slice list start end")?;
    let l = parse_list(interp, &args[0])?;
    let len = l.len() as i64;
    let clamp = |n: i64| n.clamp(0, len) as usize;
    let start = clamp(args[1].to_int().unwrap_or(0));
    let end = clamp(args[2].to_int().unwrap_or(len));
    let mut out = List::new();
    if start < end {
        for v in &l.as_slice()[start..end] {
            out.push(v.clone());
        }
    }
    Ok(out.to_value(true))
}

fn lmap(interp: &mut Interpreter, args: &[Value]) -> EvalResult {
    require_args(args, 3, "lmap var list body")?;
    let varname = args[0].as_str().into_owned();
    let items = parse_list(interp, &args[1])?;
    let body = args[2].clone();

    let mut out = List::new();
    for item in items.iter() {
        interp.envs.assign(SetMode::LocalNew, &varname, item.clone());
        let v = interp.parse(body.as_bytes(), false)?;
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
                LoopSignal::None => return Ok(out.to_value(true)),
            }
        }
        out.push(v);
    }
    Ok(out.to_value(true))
}

fn filter(interp: &mut Interpreter, args: &[Value]) -> EvalResult {
    require_args(args, 3, "filter var list cond")?;
    let varname = args[0].as_str().into_owned();
    let items = parse_list(interp, &args[1])?;
    let cond = args[2].clone();

    let mut out = List::new();
    for item in items.iter() {
        interp.envs.assign(SetMode::LocalNew, &varname, item.clone());
        if truthy_cond(interp, &cond)? {
            out.push(item.clone());
        }
    }
    Ok(out.to_value(true))
}

fn foreach(interp: &mut Interpreter, args: &[Value]) -> EvalResult {
    require_args(args, 3, "foreach var list body")?;
    let varname = args[0].as_str().into_owned();
    let items = parse_list(interp, &args[1])?;
    let body = args[2].clone();

    let mut last = Value::empty();
    for item in items.iter() {
        interp.envs.assign(SetMode::LocalNew, &varname, item.clone());
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

#[cfg(test)]
mod tests {
    use super::Interpreter;

    #[test]
    fn count_index_and_indexof() {
        let mut i = Interpreter::new();
        i.parse(b"set l [list a b c]", false).unwrap();
        assert_eq!(i.parse(b"count $l", false).unwrap().as_str(), "3");
        assert_eq!(i.parse(b"index $l 1", false).unwrap().as_str(), "b");
        assert_eq!(i.parse(b"indexof $l c", false).unwrap().as_str(), "2");
        assert_eq!(i.parse(b"indexof $l z", false).unwrap().as_str(), "-1");
    }

    #[test]
    fn append_and_slice() {
        let mut i = Interpreter::new();
        i.parse(b"set l [list a b]", false).unwrap();
        assert_eq!(i.parse(b"append $l c d", false).unwrap().as_str(), "a b c d");
        assert_eq!(i.parse(b"slice [list a b c d] 1 3", false).unwrap().as_str(), "b c");
    }

    #[test]
    fn foreach_accumulates_and_break_stops_early() {
        let mut i = Interpreter::new();
        i.parse(b"set total 0", false).unwrap();
        i.parse(b"foreach n [list 1 2 3] { inc total $n; if {$n == 2} { break } }", false).unwrap();
        assert_eq!(i.parse(b"set total", false).unwrap().as_str(), "3");
    }

    #[test]
    fn filter_keeps_matching_items() {
        let mut i = Interpreter::new();
        let v = i.parse(b"filter n [list 1 2 3 4] {$n >= 3}", false).unwrap();
        assert_eq!(v.as_str(), "3 4");
    }

    #[test]
    fn lmap_transforms_each_item() {
        let mut i = Interpreter::new();
        let v = i.parse(b"lmap n [list 1 2 3] { expr $n * $n }", false).unwrap();
        assert_eq!(v.as_str(), "1 4 9");
    }
}
