//! `char`, `charat`, `codeat`, `substr`, `strpos`, `length`, `trim`/
//! `ltrim`/`rtrim`, `strcmp`, `streq`, `repstr`, `split`.

use std::cmp::Ordering;

use crate::error::EvalResult;
use crate::list::List;
use crate::value::Value;

use super::super::Interpreter;
use super::require_args;

pub(in crate::interp) fn register(interp: &mut Interpreter) {
    interp.register("char", char_cmd);
    interp.register("charat", charat);
    interp.register("codeat", codeat);
    interp.register("substr", substr);
    interp.register("strpos", strpos);
    interp.register("length", length);
    interp.register("trim", trim);
    interp.register("ltrim", ltrim);
    interp.register("rtrim", rtrim);
    interp.register("strcmp", strcmp);
    interp.register("streq", streq);
    interp.register("repstr", repstr);
    interp.register("split", split);
}

fn char_cmd(_interp: &mut Interpreter, args: &[Value]) -> EvalResult {
    require_args(args, 1, "char code ?code ...?")?;
    let mut out = Vec::with_capacity(args.len());
    for a in args {
        let code = a.to_int().unwrap_or(0);
        out.push((code & 0xFF) as u8);
    }
    Ok(Value::from_bytes(out))
}

fn charat(_interp: &mut Interpreter, args: &[Value]) -> EvalResult {
    require_args(args, 2, "charat string index")?;
    let bytes = args[0].as_bytes();
    let idx = args[1].to_int().unwrap_or(-1);
    if idx < 0 || idx as usize >= bytes.len() {
        return Ok(Value::empty());
    }
    Ok(Value::from_bytes(vec![bytes[idx as usize]]))
}

fn codeat(_interp: &mut Interpreter, args: &[Value]) -> EvalResult {
    require_args(args, 2, "codeat string index")?;
    let bytes = args[0].as_bytes();
    let idx = args[1].to_int().unwrap_or(-1);
    if idx < 0 || idx as usize >= bytes.len() {
        return Ok(Value::from_int(-1));
    }
    Ok(Value::from_int(bytes[idx as usize] as i64))
}

fn substr(_interp: &mut Interpreter, args: &[Value]) -> EvalResult {
    require_args(args, 2, "substr string start ?length?")?;
    let bytes = args[0].as_bytes();
    let len = bytes.len() as i64;
    let start = args[1].to_int().unwrap_or(0).clamp(0, len) as usize;
    let count = args.get(2).map(|v| v.to_int().unwrap_or(len)).unwrap_or(len);
    let end = (start as i64 + count.max(0)).clamp(0, len) as usize;
    if start >= end {
        return Ok(Value::empty());
    }
    Ok(Value::from_bytes(bytes[start..end].to_vec()))
}

fn strpos(_interp: &mut Interpreter, args: &[Value]) -> EvalResult {
    require_args(args, 2, "strpos string needle")?;
    let hay = args[0].as_bytes();
    let needle = args[1].as_bytes();
    if needle.is_empty() {
        return Ok(Value::from_int(0));
    }
    let pos = hay
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|p| p as i64)
        .unwrap_or(-1);
    Ok(Value::from_int(pos))
}

fn length(_interp: &mut Interpreter, args: &[Value]) -> EvalResult {
    require_args(args, 1, "length string")?;
    Ok(Value::from_int(args[0].len() as i64))
}

fn trim(_interp: &mut Interpreter, args: &[Value]) -> EvalResult {
    require_args(args, 1, "trim string")?;
    Ok(Value::from_str(args[0].as_str().trim()))
}

fn ltrim(_interp: &mut Interpreter, args: &[Value]) -> EvalResult {
    require_args(args, 1, "ltrim string")?;
    Ok(Value::from_str(args[0].as_str().trim_start()))
}

fn rtrim(_interp: &mut Interpreter, args: &[Value]) -> EvalResult {
    require_args(args, 1, "rtrim string")?;
    Ok(Value::from_str(args[0].as_str().trim_end()))
}

/// Returns the raw signed comparison outcome. Only the sign is a
/// contract; the exact magnitude here (-1 / 0 / 1) is incidental, not a
/// guarantee.
fn strcmp(_interp: &mut Interpreter, args: &[Value]) -> EvalResult {
    require_args(args, 2, "strcmp a b")?;
    let ord = args[0].as_bytes().cmp(args[1].as_bytes());
    Ok(Value::from_int(match ord {
        Ordering::Less => -1,
        Ordering::Equal => 0,
        Ordering::Greater => 1,
    }))
}

fn streq(_interp: &mut Interpreter, args: &[Value]) -> EvalResult {
    require_args(args, 2, "streq a b")?;
    Ok(Value::from_int((args[0].as_bytes() == args[1].as_bytes()) as i64))
}

fn repstr(_interp: &mut Interpreter, args: &[Value]) -> EvalResult {
    require_args(args, 3, "repstr string from to")?;
    let s = args[0].as_str();
    let from = args[1].as_str();
    let to = args[2].as_str();
    if from.is_empty() {
        return Ok(args[0].clone());
    }
    Ok(Value::from_str(&s.replace(from.as_ref(), to.as_ref())))
}

fn split(_interp: &mut Interpreter, args: &[Value]) -> EvalResult {
    require_args(args, 1, "split string ?sep?")?;
    let s = args[0].as_str();
    let sep = args.get(1).map(|v| v.as_str().into_owned());
    let mut out = List::new();
    match sep.as_deref() {
        None | Some("") => {
            for part in s.split_whitespace() {
                out.push(Value::from_str(part));
            }
        }
        Some(sep) => {
            for part in s.split(sep) {
                out.push(Value::from_str(part));
            }
        }
    }
    Ok(out.to_value(true))
}

#[cfg(test)]
mod tests {
    use super::Interpreter;

    #[test]
    fn charat_codeat_and_char_round_trip() {
        let mut i = Interpreter::new();
        assert_eq!(i.parse(b"charat hello 1", false).unwrap().as_str(), "e");
        assert_eq!(i.parse(b"codeat hello 0", false).unwrap().as_str(), "104");
        assert_eq!(i.parse(b"char 104 105", false).unwrap().as_str(), "hi");
    }

    #[test]
    fn substr_and_strpos() {
        let mut i = Interpreter::new();
        assert_eq!(i.parse(b"substr hello 1 3", false).unwrap().as_str(), "ell");
        assert_eq!(i.parse(b"strpos hello ll", false).unwrap().as_str(), "2");
        assert_eq!(i.parse(b"strpos hello zz", false).unwrap().as_str(), "-1");
    }

    #[test]
    fn trim_family() {
        let mut i = Interpreter::new();
        assert_eq!(i.parse(br#"trim "  hi  ""#, false).unwrap().as_str(), "hi");
        assert_eq!(i.parse(br#"ltrim "  hi  ""#, false).unwrap().as_str(), "hi  ");
        assert_eq!(i.parse(br#"rtrim "  hi  ""#, false).unwrap().as_str(), "  hi");
    }

    #[test]
    fn strcmp_sign_only_and_streq() {
        let mut i = Interpreter::new();
        let lt = i.parse(b"strcmp abc abd", false).unwrap().to_int().unwrap();
        assert!(lt < 0);
        assert_eq!(i.parse(b"strcmp abc abc", false).unwrap().as_str(), "0");
        assert_eq!(i.parse(b"streq abc abc", false).unwrap().as_str(), "1");
        assert_eq!(i.parse(b"streq abc abd", false).unwrap().as_str(), "0");
    }

    #[test]
    fn repstr_and_split() {
        let mut i = Interpreter::new();
        assert_eq!(i.parse(b"repstr banana a o", false).unwrap().as_str(), "bonono");
        assert_eq!(i.parse(b"split a,b,c ,", false).unwrap().as_str(), "a b c");
        assert_eq!(i.parse(br#"split "a  b   c""#, false).unwrap().as_str(), "a b c");
    }
}
