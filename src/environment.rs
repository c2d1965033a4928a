//! Environment & Variable
//!
//! A lexical scope. This crate chooses the
//! arena-plus-index representation over a pointer graph: `Interpreter` owns
//! a `Vec<Environment>` arena and every parent/owner/back-pointer relation
//! here is an index into that arena rather than a raw or reference-counted
//! pointer.

use crate::strmap::StringMap;
use crate::value::Value;

pub type EnvId = usize;

/// Loop-local unwind signal, consumed by the nearest enclosing `while`/
/// `for`/`foreach` builtin. This is additive to the `breakrun` flag on
/// `Environment`, which `break`/`continue` also set so that the
/// command-execution loop in `Interpreter::parse` stops the current body
/// immediately; the loop construct distinguishes the two cases via this
/// field instead of re-running the body. Loop nesting levels are not
/// modeled here since environments are flat, not lexically nested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoopSignal {
    #[default]
    None,
    Break,
    Continue,
}

/// A named, Value-holding slot belonging to one Environment.
#[derive(Debug, Clone)]
pub struct Variable {
    pub name: String,
    pub value: Value,
    /// Non-owning back-pointer to the owning Environment, used by watches.
    pub env: EnvId,
    /// Optional watch program, fired on overwrite (not on LOCAL_NEW creation).
    pub watch: Option<Vec<u8>>,
}

/// A lexical scope: owns its local Variables and a StringMap index over
/// them, plus the unwind flags a frame created for a function call needs.
#[derive(Debug, Clone)]
pub struct Environment {
    pub parent: Option<EnvId>,
    /// Set for frames pushed by a script-function call.
    pub owner_fn: Option<usize>,
    /// Set for frames pushed by the unknown-command catcher (§4.2 step 4);
    /// holds the original word that failed to resolve.
    pub catcher_for: Option<Value>,
    vars: Vec<Variable>,
    var_index: StringMap<usize>,
    pub retval: Value,
    pub retval_set: bool,
    pub breakrun: bool,
    pub loop_signal: LoopSignal,
}

impl Environment {
    pub fn root() -> Self {
        Self {
            parent: None,
            owner_fn: None,
            catcher_for: None,
            vars: Vec::new(),
            var_index: StringMap::new(),
            retval: Value::empty(),
            retval_set: false,
            breakrun: false,
            loop_signal: LoopSignal::None,
        }
    }

    pub fn child(parent: EnvId) -> Self {
        Self { parent: Some(parent), ..Self::root() }
    }

    pub fn local_get(&self, name: &str) -> Option<&Value> {
        self.var_index.get(name).map(|&i| &self.vars[i].value)
    }

    pub fn local_var(&self, name: &str) -> Option<&Variable> {
        self.var_index.get(name).map(|&i| &self.vars[i])
    }

    pub fn has_local(&self, name: &str) -> bool {
        self.var_index.contains(name)
    }

    pub fn var_names(&self) -> Vec<String> {
        self.vars.iter().map(|v| v.name.clone()).collect()
    }

    /// Overwrite an existing local variable or create it if absent. Returns
    /// the index and whether it already existed (watches only fire on the
    /// "already existed" branch).
    fn upsert(&mut self, id: EnvId, name: &str, value: Value) -> (usize, bool) {
        if let Some(&idx) = self.var_index.get(name) {
            self.vars[idx].value = value;
            (idx, true)
        } else {
            let idx = self.vars.len();
            self.vars.push(Variable { name: name.to_string(), value, env: id, watch: None });
            self.var_index.insert(name, idx);
            (idx, false)
        }
    }

    /// Always creates a fresh slot, shadowing any existing variable of the
    /// same name (used by LOCAL_NEW / `local`). The old slot's storage stays
    /// in `vars` (nothing else references it by index) but becomes
    /// unreachable through `var_index`, matching the watch invariant that
    /// LOCAL_NEW creation never fires a watch.
    fn force_create(&mut self, id: EnvId, name: &str, value: Value) -> usize {
        let idx = self.vars.len();
        self.vars.push(Variable { name: name.to_string(), value, env: id, watch: None });
        self.var_index.insert(name, idx);
        idx
    }

    pub fn set_watch(&mut self, name: &str, program: Option<Vec<u8>>) -> bool {
        if let Some(&idx) = self.var_index.get(name) {
            self.vars[idx].watch = program;
            true
        } else {
            false
        }
    }

    pub fn var_at(&self, idx: usize) -> &Variable {
        &self.vars[idx]
    }
}

/// The four assignment modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetMode {
    Global,
    Local,
    LocalNew,
    LocalOnly,
}

/// Outcome of an assignment, used by the caller to decide whether to fire a
/// watch and whether to mirror to the host environment store.
pub struct AssignOutcome {
    pub env: EnvId,
    pub var_index: usize,
    pub existed: bool,
    pub watch: Option<Vec<u8>>,
    pub is_root: bool,
}

/// Arena of Environments plus the two-level variable lookup policy: search
/// the current Environment, and if absent and current isn't the root, fall
/// through *directly* to the root (intermediate parents are deliberately
/// skipped).
pub struct EnvArena {
    envs: Vec<Environment>,
    pub root: EnvId,
    pub current: EnvId,
    pub down: Option<EnvId>,
}

impl EnvArena {
    pub fn new() -> Self {
        Self { envs: vec![Environment::root()], root: 0, current: 0, down: None }
    }

    pub fn get(&self, id: EnvId) -> &Environment {
        &self.envs[id]
    }

    pub fn get_mut(&mut self, id: EnvId) -> &mut Environment {
        &mut self.envs[id]
    }

    pub fn current(&self) -> &Environment {
        &self.envs[self.current]
    }

    pub fn current_mut(&mut self) -> &mut Environment {
        &mut self.envs[self.current]
    }

    /// Allocate a new Environment with parent = current, and make it current.
    pub fn push(&mut self) -> EnvId {
        let parent = self.current;
        self.envs.push(Environment::child(parent));
        let id = self.envs.len() - 1;
        self.current = id;
        id
    }

    /// Restore the current environment to its pushed frame's parent. The
    /// root environment is never popped.
    pub fn pop(&mut self) {
        if self.current == self.root {
            return;
        }
        if let Some(parent) = self.envs[self.current].parent {
            self.current = parent;
        }
    }

    /// Looks up a variable: current scope only, else (if not root)
    /// straight to root.
    pub fn find(&self, name: &str) -> Option<(EnvId, &Value)> {
        if let Some(v) = self.envs[self.current].local_get(name) {
            return Some((self.current, v));
        }
        if self.current != self.root {
            if let Some(v) = self.envs[self.root].local_get(name) {
                return Some((self.root, v));
            }
        }
        None
    }

    pub fn assign(&mut self, mode: SetMode, name: &str, value: Value) -> AssignOutcome {
        let target = match mode {
            SetMode::Global => self.root,
            SetMode::LocalNew => self.current,
            SetMode::Local | SetMode::LocalOnly => {
                // Overwrite an existing match found via the two-level lookup;
                // LOCAL_ONLY never writes through to root unless current IS root.
                if self.envs[self.current].has_local(name) {
                    self.current
                } else if self.current != self.root && self.envs[self.root].has_local(name) {
                    if mode == SetMode::LocalOnly {
                        self.current
                    } else {
                        self.root
                    }
                } else {
                    self.current
                }
            }
        };

        let (var_index, existed) = if mode == SetMode::LocalNew {
            let idx = self.envs[target].force_create(target, name, value);
            (idx, false)
        } else {
            self.envs[target].upsert(target, name, value)
        };

        let watch = if existed { self.envs[target].vars[var_index].watch.clone() } else { None };

        AssignOutcome { env: target, var_index, existed, watch, is_root: target == self.root }
    }
}

impl Default for EnvArena {
    fn default() -> Self {
        Self::new()
    }
}
