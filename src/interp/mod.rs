//! Interpreter
//!
//! The top-level object: owns the environment arena, the command
//! registry, the error slot, the catcher program, and the
//! `$`-substitution prefix. `parse`/`parse_value`/`call`/`subst_to_*` are
//! its public evaluation entry points.

mod cursor;
mod dispatch;
mod subst;

pub mod builtins;

use tracing::{instrument, trace};

use crate::environment::EnvArena;
use crate::error::{EvalResult, LittleError};
use crate::function::{Function, HostProc};
use crate::list::List;
use crate::strmap::StringMap;
use crate::value::Value;
use cursor::ParseCtx;

/// Host hook for the persistent "environment store" backing rooted
/// globals. Left as a trait object so an embedding host can back it with
/// anything (process environment, a config file, a database row) -- the
/// core only ever calls through this interface.
pub trait EnvStore {
    fn env_get(&self, name: &str) -> Option<String>;
    fn env_set(&mut self, name: &str, value: &str);
}

/// Host-supplied cooperative-cancellation poll. Consulted once per
/// command line; a `true` reading unwinds the current evaluation with an
/// "interrupted" error.
pub type InterruptPoll = Box<dyn FnMut() -> bool>;

/// Construction-time options: an all-`Option` struct consumed once at
/// construction, distinct from any per-call option since every knob here
/// lives for the Interpreter's whole lifetime.
#[derive(Default)]
pub struct InterpreterOptions {
    /// Script-function call depth limit; `None` disables the check.
    pub max_parse_depth: Option<usize>,
    /// Overrides the unknown-command catcher's recursion guard, default
    /// 16384.
    pub catcher_depth_limit: Option<usize>,
    /// Overrides the `$`-substitution prefix, default `"set "`.
    pub dollar_prefix: Option<String>,
    /// Host-supplied persistent rooted-global backing store.
    pub env_store: Option<Box<dyn EnvStore>>,
}

pub struct Interpreter {
    pub(crate) envs: EnvArena,
    commands: Vec<Function>,
    cmd_index: StringMap<usize>,
    system_command_count: usize,

    catcher: Option<Vec<u8>>,
    catcher_depth: usize,
    catcher_depth_limit: usize,

    dollar_prefix: String,

    error: Option<LittleError>,

    parse_depth: usize,
    max_parse_depth: Option<usize>,

    root_source: Vec<u8>,

    env_store: Option<Box<dyn EnvStore>>,
    interrupt: Option<InterruptPoll>,

    anon_counter: u64,
    current_fn_name: Option<String>,
    current_body: Option<Value>,
}

impl Interpreter {
    pub fn new() -> Self {
        Self::with_options(InterpreterOptions::default())
    }

    /// Constructs an Interpreter with construction-time knobs set up front.
    pub fn with_options(options: InterpreterOptions) -> Self {
        let mut interp = Self::new_bare();
        builtins::register_builtins(&mut interp);
        interp.system_command_count = interp.commands.len();
        if let Some(limit) = options.max_parse_depth {
            interp.max_parse_depth = Some(limit);
        }
        if let Some(limit) = options.catcher_depth_limit {
            interp.catcher_depth_limit = limit;
        }
        if let Some(prefix) = options.dollar_prefix {
            interp.dollar_prefix = prefix;
        }
        if let Some(store) = options.env_store {
            interp.env_store = Some(store);
        }
        interp
    }

    /// An Interpreter with no builtins registered at all, used by
    /// `jaileval clean`.
    pub(crate) fn new_bare() -> Self {
        Self {
            envs: EnvArena::new(),
            commands: Vec::new(),
            cmd_index: StringMap::new(),
            system_command_count: 0,
            catcher: None,
            catcher_depth: 0,
            catcher_depth_limit: dispatch::DEFAULT_CATCHER_DEPTH_LIMIT,
            dollar_prefix: "set ".to_string(),
            error: None,
            parse_depth: 0,
            max_parse_depth: None,
            root_source: Vec::new(),
            env_store: None,
            interrupt: None,
            anon_counter: 0,
            current_fn_name: None,
            current_body: None,
        }
    }

    /// Sets the maximum script-function call depth; `None` (the default)
    /// disables the check.
    pub fn set_max_parse_depth(&mut self, limit: Option<usize>) {
        self.max_parse_depth = limit;
    }

    pub fn set_interrupt(&mut self, poll: InterruptPoll) {
        self.interrupt = Some(poll);
    }

    /// Overrides the unknown-command catcher's recursion guard, default
    /// 16384; exposed as a runtime knob the same way `set_max_parse_depth`
    /// is.
    pub fn set_catcher_depth_limit(&mut self, limit: usize) {
        self.catcher_depth_limit = limit;
    }

    pub fn set_env_store(&mut self, store: Box<dyn EnvStore>) {
        self.env_store = Some(store);
    }

    pub fn env_get(&self, name: &str) -> Option<String> {
        self.env_store.as_ref().and_then(|s| s.env_get(name))
    }

    pub(crate) fn env_set(&mut self, name: &str, value: &str) {
        if let Some(store) = self.env_store.as_mut() {
            store.env_set(name, value);
        }
    }

    pub fn dollar_prefix(&self) -> &str {
        &self.dollar_prefix
    }

    pub fn set_dollar_prefix(&mut self, prefix: impl Into<String>) {
        self.dollar_prefix = prefix.into();
    }

    pub fn set_catcher(&mut self, program: Option<Vec<u8>>) {
        self.catcher = program;
    }

    pub fn has_catcher(&self) -> bool {
        self.catcher.is_some()
    }

    pub fn current_fn_name(&self) -> Option<&str> {
        self.current_fn_name.as_deref()
    }

    pub fn current_body(&self) -> Option<&Value> {
        self.current_body.as_ref()
    }

    pub fn catcher_target(&self) -> Option<&Value> {
        self.envs.current().catcher_for.as_ref()
    }

    /// Registers a host procedure under `name`. Re-registration replaces
    /// the Function's body in place, preserving identity.
    pub fn register(&mut self, name: &str, proc: HostProc) {
        if let Some(&idx) = self.cmd_index.get(name) {
            self.commands[idx] = Function::host(name, proc);
        } else {
            let idx = self.commands.len();
            self.commands.push(Function::host(name, proc));
            self.cmd_index.insert(name, idx);
        }
    }

    pub(crate) fn register_script(&mut self, name: &str, argnames: Vec<String>, body: Value) {
        if let Some(&idx) = self.cmd_index.get(name) {
            self.commands[idx] = Function::script(name, argnames, body);
        } else {
            let idx = self.commands.len();
            self.commands.push(Function::script(name, argnames, body));
            self.cmd_index.insert(name, idx);
        }
    }

    pub(crate) fn rename_command(&mut self, old: &str, new: &str) -> bool {
        let Some(&idx) = self.cmd_index.get(old) else { return false };
        self.commands[idx].name = new.to_string();
        self.cmd_index.remove(old);
        self.cmd_index.insert(new, idx);
        true
    }

    pub(crate) fn unused_name(&mut self, prefix: &str) -> String {
        loop {
            self.anon_counter += 1;
            let candidate = format!("{prefix}#{}", self.anon_counter);
            if !self.cmd_index.contains(&candidate) {
                return candidate;
            }
        }
    }

    pub(crate) fn function_names(&self) -> Vec<String> {
        self.commands.iter().map(|f| f.name.clone()).collect()
    }

    pub(crate) fn has_function(&self, name: &str) -> bool {
        self.find_command(name).is_some()
    }

    pub(crate) fn is_host_function(&self, name: &str) -> Option<bool> {
        self.find_command(name).map(|idx| self.commands[idx].is_host())
    }

    pub(crate) fn host_builtin_count(&self) -> usize {
        self.system_command_count
    }

    /// Clones every host-registered builtin into a fresh `Interpreter`.
    /// Used by `jaileval` (non-`clean` form); script-defined functions of
    /// the caller are intentionally not copied.
    pub(crate) fn clone_builtins_into(&self, other: &mut Interpreter) {
        for f in self.commands.iter().filter(|f| f.is_host()) {
            if let crate::function::FunctionBody::Host(proc) = f.body {
                other.register(&f.name, proc);
            }
        }
    }

    pub fn error(&mut self) -> Option<LittleError> {
        self.error.take()
    }

    pub fn set_error(&mut self, err: LittleError) {
        self.error = Some(err);
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    /// Evaluates `source` as a sequence of command lines.
    /// `funclevel` marks this call as the body of a function frame: on
    /// entry the current frame's `breakrun` is reset, and on exit a set
    /// `retval_set` takes over as the result.
    #[instrument(level = "trace", skip(self, source))]
    pub fn parse(&mut self, source: &[u8], funclevel: bool) -> EvalResult {
        self.parse_with_eol(source, funclevel, false)
    }

    pub fn parse_value(&mut self, source: &Value, funclevel: bool) -> EvalResult {
        self.parse(source.as_bytes(), funclevel)
    }

    pub fn call(&mut self, name: &str, args: &[Value]) -> EvalResult {
        let result = match self.find_command(name) {
            Some(idx) => self.call_function(idx, args),
            None => Err(LittleError::default_err(0, format!("unknown function {name}"))),
        };
        if let Err(e) = &result {
            self.set_error(e.clone());
        }
        result
    }

    /// Evaluates `code` with "ignore end-of-line" on, so it is treated as
    /// a single logical line, and returns the dispatched result. Used
    /// internally for `$name`/`[...]` substitution as well as exposed to
    /// the host.
    pub fn subst_to_value(&mut self, code: &[u8]) -> EvalResult {
        self.parse_with_eol(code, false, true)
    }

    /// Same "ignore end-of-line" treatment, but returns the raw word list
    /// without dispatching it as a command.
    pub fn subst_to_list(&mut self, code: &[u8]) -> Result<List, LittleError> {
        let mut ctx = ParseCtx::new(code, true);
        Ok(self.extract_line(&mut ctx)?.map(|(_, words)| words).unwrap_or_default())
    }

    pub(crate) fn parse_with_eol(&mut self, source: &[u8], funclevel: bool, ignore_eol: bool) -> EvalResult {
        match self.parse_with_eol_inner(source, funclevel, ignore_eol) {
            Ok(v) => Ok(v),
            Err(e) => {
                self.set_error(e.clone());
                Err(e)
            }
        }
    }

    /// Does the actual work of `parse_with_eol`. Kept separate so the
    /// outer wrapper can mirror every raised error into the error slot
    /// (§4.7/§7: the slot is the host-facing side channel; the `Result`
    /// return is this crate's idiomatic-Rust surface for the same event).
    fn parse_with_eol_inner(&mut self, source: &[u8], funclevel: bool, ignore_eol: bool) -> EvalResult {
        if funclevel {
            self.envs.current_mut().breakrun = false;
        }

        let mut ctx = ParseCtx::new(source, ignore_eol);
        let mut last = Value::empty();

        loop {
            if let Some(poll) = self.interrupt.as_mut() {
                if poll() {
                    return Err(LittleError::default_err(0, "interrupted"));
                }
            }
            let Some((line_pos, words)) = self.extract_line(&mut ctx)? else { break };
            if words.is_empty() {
                continue;
            }
            trace!(words = words.len(), "dispatch line");
            last = self.dispatch_line(&words, line_pos)?;
            if self.envs.current().breakrun {
                break;
            }
        }

        if funclevel {
            let env = self.envs.current_mut();
            if env.retval_set {
                last = std::mem::replace(&mut env.retval, Value::empty());
                env.retval_set = false;
                env.breakrun = false;
            }
        }

        Ok(last)
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_then_read() {
        let mut i = Interpreter::new();
        i.parse(b"set a 3", false).unwrap();
        let v = i.parse(b"set a", false).unwrap();
        assert_eq!(v.as_str(), "3");
    }

    #[test]
    fn dollar_equals_set() {
        let mut i = Interpreter::new();
        i.parse(b"set a 3", false).unwrap();
        let v = i.parse(b"$a", false).unwrap();
        assert_eq!(v.as_str(), "3");
    }

    #[test]
    fn braced_literal_round_trips() {
        let mut i = Interpreter::new();
        let v = i.parse(b"quote {hi there}", false).unwrap();
        assert_eq!(v.as_str(), "hi there");
    }

    #[test]
    fn error_slot_mirrors_result_and_clears_on_read() {
        let mut i = Interpreter::new();
        assert!(i.parse(b"nosuchcommand", false).is_err());
        let err = i.error().expect("error slot should hold the last failure");
        assert!(err.message().contains("nosuchcommand"));
        assert!(i.error().is_none(), "reading the slot clears it");
    }

    #[test]
    fn fix_head_error_position_reflects_the_dispatch_site_not_zero() {
        let mut i = Interpreter::new();
        // "quote first\n" is 12 bytes; "error" on the next line starts there.
        let err = i.parse(b"quote first\nerror boom", false).unwrap_err();
        assert_eq!(err.position(), 12);
    }

    #[test]
    fn try_clears_error_slot_on_recovery() {
        let mut i = Interpreter::new();
        let v = i.parse(br#"try { error boom } { quote caught }"#, false).unwrap();
        assert_eq!(v.as_str(), "caught");
        assert!(i.error().is_none());
    }

    #[test]
    fn scenario_multiple_set_then_quote() {
        let mut i = Interpreter::new();
        i.parse(b"set foo bar baz qux", false).unwrap();
        let v = i.parse(b"quote $foo $baz", false).unwrap();
        assert_eq!(v.as_str(), "bar qux");
    }

    #[test]
    fn scenario_func_squares_its_argument() {
        let mut i = Interpreter::new();
        i.parse(b"func sq {x} { expr $x * $x }", false).unwrap();
        let v = i.parse(b"sq 7", false).unwrap();
        assert_eq!(v.as_str(), "49");
    }

    #[test]
    fn scenario_if_picks_then_branch() {
        let mut i = Interpreter::new();
        let v = i.parse(br#"if {1 + 1 == 2} { quote yes } { quote no }"#, false).unwrap();
        assert_eq!(v.as_str(), "yes");
    }

    #[test]
    fn scenario_trim_dollar_substitution() {
        let mut i = Interpreter::new();
        i.parse(br#"set s "  hi  ""#, false).unwrap();
        let v = i.parse(b"trim $s", false).unwrap();
        assert_eq!(v.as_str(), "hi");
    }

    #[test]
    fn scenario_list_serializes_with_brace_escaping() {
        let mut i = Interpreter::new();
        let v = i.parse(b"list a {b c} d", false).unwrap();
        assert_eq!(v.as_str(), "a {b c} d");
    }

    #[test]
    fn list_to_value_round_trips_through_subst_to_list() {
        let mut i = Interpreter::new();
        let v = i.parse(b"list a {b c} d", false).unwrap();
        let parsed = i.subst_to_list(v.as_bytes()).unwrap();
        let words: Vec<String> = parsed.iter().map(|v| v.as_str().into_owned()).collect();
        assert_eq!(words, vec!["a", "b c", "d"]);
    }

    #[test]
    fn scoping_local_does_not_leak_into_called_function() {
        // `inner`'s frame's two-level lookup skips straight to root, so it
        // never sees `outer`'s own local `x` even though `outer` called it.
        let mut i = Interpreter::new();
        i.parse(b"func inner {} { reflect has-var x }", false).unwrap();
        i.parse(b"func outer {} { local x; set x 1; inner }", false).unwrap();
        let v = i.parse(b"outer", false).unwrap();
        assert_eq!(v.as_str(), "0", "a called function frame must not see the caller's local x");
    }

    #[test]
    fn return_stops_remaining_commands_in_body() {
        let mut i = Interpreter::new();
        i.parse(b"func early {} { return 1; set touched yes }", false).unwrap();
        let v = i.parse(b"early", false).unwrap();
        assert_eq!(v.as_str(), "1");
        assert_eq!(i.parse(b"reflect has-var touched", false).unwrap().as_str(), "0");
    }

    #[test]
    fn watch_fires_once_per_assignment_in_owning_environment() {
        let mut i = Interpreter::new();
        i.parse(b"set w 1", false).unwrap();
        i.parse(b"set hits 0", false).unwrap();
        i.parse(b"watch w { inc hits }", false).unwrap();
        i.parse(b"set w 2", false).unwrap();
        assert_eq!(i.parse(b"set hits", false).unwrap().as_str(), "1");
        i.parse(b"set w 3", false).unwrap();
        assert_eq!(i.parse(b"set hits", false).unwrap().as_str(), "2");
    }

    #[test]
    fn recursion_guard_trips_past_configured_depth() {
        let mut i = Interpreter::with_options(InterpreterOptions { max_parse_depth: Some(8), ..Default::default() });
        i.parse(b"func loop {} { loop }", false).unwrap();
        let err = i.parse(b"loop", false).unwrap_err();
        assert!(err.message().contains("Too many recursive calls"));
    }

    struct MapEnvStore(std::collections::HashMap<String, String>);
    impl EnvStore for MapEnvStore {
        fn env_get(&self, name: &str) -> Option<String> {
            self.0.get(name).cloned()
        }
        fn env_set(&mut self, name: &str, value: &str) {
            self.0.insert(name.to_string(), value.to_string());
        }
    }

    #[test]
    fn global_assignment_mirrors_to_env_store_and_wins_on_read() {
        let mut i = Interpreter::with_options(InterpreterOptions {
            env_store: Some(Box::new(MapEnvStore(std::collections::HashMap::new()))),
            ..Default::default()
        });
        i.parse(b"set g hello", false).unwrap();
        assert_eq!(i.env_get("g").as_deref(), Some("hello"));
        // The store's value wins on read even if mutated directly underneath.
        i.env_set("g", "from-store");
        assert_eq!(i.parse(b"set g", false).unwrap().as_str(), "from-store");
    }
}
