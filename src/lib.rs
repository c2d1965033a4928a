//! little - an embeddable core for a small Tcl-like command interpreter.
//!
//! The crate accepts a source text, parses it into commands, evaluates
//! each command by looking up its name in a command table, and returns a
//! result value. See `Interpreter` for the evaluation entry points and
//! `DESIGN.md` for how each module is grounded.

pub mod environment;
pub mod error;
pub mod expr;
pub mod function;
pub mod interp;
pub mod list;
pub mod strmap;
pub mod value;

pub use environment::{EnvArena, EnvId, Environment, SetMode, Variable};
pub use error::{ErrorKind, EvalResult, LittleError};
pub use function::{Function, FunctionBody, HostProc};
pub use interp::{EnvStore, InterruptPoll, Interpreter, InterpreterOptions};
pub use list::List;
pub use value::Value;
