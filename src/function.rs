//! Function
//!
//! A callable: either a host procedure pointer supplied at embedding time,
//! or a script-defined function created with `func`. The host hook is a
//! plain `fn` item type rather than a boxed closure, since the host has no
//! need to capture state beyond what it can already reach through the
//! `Interpreter` it's given.

use crate::error::EvalResult;
use crate::interp::Interpreter;
use crate::value::Value;

pub type HostProc = fn(&mut Interpreter, &[Value]) -> EvalResult;

#[derive(Clone)]
pub enum FunctionBody {
    Host(HostProc),
    Script { argnames: Vec<String>, body: Value },
}

#[derive(Clone)]
pub struct Function {
    pub name: String,
    pub body: FunctionBody,
}

impl Function {
    pub fn host(name: impl Into<String>, proc: HostProc) -> Self {
        Self { name: name.into(), body: FunctionBody::Host(proc) }
    }

    pub fn script(name: impl Into<String>, argnames: Vec<String>, body: Value) -> Self {
        Self { name: name.into(), body: FunctionBody::Script { argnames, body } }
    }

    pub fn is_host(&self) -> bool {
        matches!(self.body, FunctionBody::Host(_))
    }
}

impl std::fmt::Debug for Function {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.body {
            FunctionBody::Host(_) => write!(f, "Function({}, host)", self.name),
            FunctionBody::Script { argnames, .. } => {
                write!(f, "Function({}, script({:?}))", self.name, argnames)
            }
        }
    }
}
