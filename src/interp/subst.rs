//! Inline text substitution.
//!
//! Separate from `Interpreter::subst_to_value` (the host-facing API that
//! dispatches one whole logical line as a command). Expression
//! text such as an `if`/`while` condition or an `expr` argument is not a
//! command line -- `$x > 2` must become `5 > 2`, not be word-split into a
//! 3-word command named `5`. This scans the buffer left to right, only
//! expanding `$name` and `[cmd]`, and copies every other byte through
//! unchanged.

use crate::error::EvalResult;
use crate::value::Value;

use super::Interpreter;

impl Interpreter {
    pub(super) fn substitute_inline(&mut self, text: &[u8]) -> EvalResult {
        let mut out = Value::empty();
        let mut i = 0usize;
        while i < text.len() {
            match text[i] {
                b'\\' if i + 1 < text.len() && matches!(text[i + 1], b'$' | b'[') => {
                    out.append_byte(text[i + 1]);
                    i += 2;
                }
                b'$' => {
                    i += 1;
                    let start = i;
                    while i < text.len() && (text[i].is_ascii_alphanumeric() || text[i] == b'_' || text[i] == b'.') {
                        i += 1;
                    }
                    let name = String::from_utf8_lossy(&text[start..i]).into_owned();
                    let mut fragment = Value::from_str(&self.dollar_prefix);
                    fragment.append_bytes(name.as_bytes());
                    let result = self.parse_with_eol(fragment.as_bytes(), false, true)?;
                    out.append_value(&result);
                }
                b'[' => {
                    let mut depth = 1usize;
                    let start = i + 1;
                    let mut j = start;
                    while j < text.len() && depth > 0 {
                        match text[j] {
                            b'[' => depth += 1,
                            b']' => depth -= 1,
                            _ => {}
                        }
                        j += 1;
                    }
                    let inner = &text[start..j.saturating_sub(1)];
                    let result = self.parse_with_eol(inner, false, true)?;
                    out.append_value(&result);
                    i = j;
                }
                b => {
                    out.append_byte(b);
                    i += 1;
                }
            }
        }
        Ok(out)
    }
}
