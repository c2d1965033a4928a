//! Builtin command families.
//!
//! Each submodule registers a related group of host procedures.
//! Registration order doesn't matter; the command registry is a flat
//! name-indexed vector.

mod core;
mod error_ops;
mod func_ops;
mod list_ops;
mod quoting;
mod reflect;
mod scope_ops;
mod string_ops;

use super::Interpreter;

pub(super) fn register_builtins(interp: &mut Interpreter) {
    core::register(interp);
    quoting::register(interp);
    list_ops::register(interp);
    string_ops::register(interp);
    func_ops::register(interp);
    scope_ops::register(interp);
    error_ops::register(interp);
    reflect::register(interp);
}

/// Shared helper: require at least `min` arguments, else a `fix_head`
/// error (position filled in by the dispatcher at the call site).
pub(super) fn require_args(args: &[crate::value::Value], min: usize, usage: &str) -> Result<(), crate::error::LittleError> {
    if args.len() < min {
        Err(crate::error::LittleError::fix_head(format!("wrong # args: should be \"{usage}\"")))
    } else {
        Ok(())
    }
}

/// Substitutes `$name`/`[cmd]` inline into `cond`'s text and evaluates it
/// through the infix expression evaluator. Shared by `if`/`while`/`for`
/// and the list builtins that take a condition (`filter`).
pub(super) fn truthy_cond(interp: &mut Interpreter, cond: &crate::value::Value) -> Result<bool, crate::error::LittleError> {
    let substituted = interp.substitute_inline(cond.as_bytes())?;
    let n = crate::expr::eval_expr(&substituted.as_str())?.to_int().unwrap_or(0);
    Ok(n != 0)
}
