//! Command dispatch: resolves the first word of a line against the
//! command registry, binds arguments, and runs the callee.

use crate::environment::LoopSignal;
use crate::error::{EvalResult, LittleError};
use crate::function::FunctionBody;
use crate::list::List;
use crate::value::Value;

use super::Interpreter;

/// Default unknown-command catcher recursion guard; overridable at
/// runtime via `Interpreter::set_catcher_depth_limit` /
/// `InterpreterOptions::catcher_depth_limit`.
pub(super) const DEFAULT_CATCHER_DEPTH_LIMIT: usize = 16384;

impl Interpreter {
    /// Truncates a command name at its first `.`, non-destructively:
    /// host commands may register qualified names but remain resolvable
    /// by their root.
    pub(super) fn dotted_lookup_key(name: &str) -> &str {
        match name.find('.') {
            Some(idx) => &name[..idx],
            None => name,
        }
    }

    pub(super) fn find_command(&self, name: &str) -> Option<usize> {
        self.cmd_index.get(Self::dotted_lookup_key(name)).copied()
    }

    pub(super) fn dispatch_line(&mut self, words: &List, dispatch_pos: usize) -> EvalResult {
        if words.is_empty() {
            return Ok(Value::empty());
        }
        let head = words.get(0).unwrap().clone();
        let head_name = head.as_str().into_owned();
        let rest: Vec<Value> = words.iter().skip(1).cloned().collect();

        match self.find_command(&head_name) {
            Some(idx) => {
                let result = self.call_function(idx, &rest);
                result.map_err(|e| e.fixed_to(dispatch_pos))
            }
            None => self.run_catcher(&head, words),
        }
    }

    fn run_catcher(&mut self, head: &Value, full_line: &List) -> EvalResult {
        let Some(program) = self.catcher.clone() else {
            return Err(LittleError::default_err(0, format!("unknown function {}", head.as_str())));
        };
        if self.catcher_depth >= self.catcher_depth_limit {
            return Err(LittleError::default_err(0, "catcher limit reached, aborting"));
        }
        self.catcher_depth += 1;
        let env = self.envs.push();
        self.envs.get_mut(env).catcher_for = Some(head.clone());
        let args_value = full_line.to_value(true);
        self.envs.assign(crate::environment::SetMode::LocalNew, "args", args_value);
        let saved_name = self.current_fn_name.take();
        let result = self.parse_with_eol(&program, true, false);
        self.current_fn_name = saved_name;
        self.envs.pop();
        self.catcher_depth -= 1;
        result
    }

    pub(super) fn call_function(&mut self, idx: usize, args: &[Value]) -> EvalResult {
        let func = self.commands[idx].clone();
        match func.body {
            FunctionBody::Host(proc) => proc(self, args),
            FunctionBody::Script { argnames, body } => {
                self.call_script_function(idx, &func.name, &argnames, &body, args)
            }
        }
    }

    fn call_script_function(&mut self, idx: usize, name: &str, argnames: &[String], body: &Value, args: &[Value]) -> EvalResult {
        self.parse_depth += 1;
        if let Some(max) = self.max_parse_depth {
            if self.parse_depth > max {
                self.parse_depth -= 1;
                return Err(LittleError::default_err(0, "Too many recursive calls"));
            }
        }

        let env = self.envs.push();
        self.envs.get_mut(env).owner_fn = Some(idx);

        if argnames.len() == 1 && argnames[0] == "args" {
            let list: List = args.iter().cloned().collect();
            self.envs.assign(crate::environment::SetMode::LocalNew, "args", list.to_value(true));
        } else {
            for (i, argname) in argnames.iter().enumerate() {
                let value = args.get(i).cloned().unwrap_or_else(Value::empty);
                self.envs.assign(crate::environment::SetMode::LocalNew, argname, value);
            }
        }

        let saved_name = self.current_fn_name.replace(name.to_string());
        let saved_body = self.current_body.replace(body.clone());
        let result = self.parse_with_eol(body.as_bytes(), true, false);
        self.current_fn_name = saved_name;
        self.current_body = saved_body;

        self.envs.pop();
        self.parse_depth -= 1;
        result
    }

    /// Consults the loop-local unwind signal set by `break`/`continue`,
    /// clearing it. Used by the `while`/`for`/`foreach` builtins.
    pub(super) fn take_loop_signal(&mut self) -> LoopSignal {
        let sig = self.envs.current().loop_signal;
        self.envs.current_mut().loop_signal = LoopSignal::None;
        sig
    }
}
