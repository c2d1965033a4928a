//! Expression evaluator
//!
//! A second, independent recursive-descent parser that runs over a
//! string *after* word substitution has already happened. It never
//! touches the Interpreter's cursor or Environment stack; it works on a
//! private `&str` slice with its own byte offset.
//!
//! Grammar, lowest precedence first:
//!
//! ```text
//! expr  := logor
//! logor := logand ('||' logand)*
//! logand:= bitor  ('&&' bitor)*
//! bitor := bitand ('|'  bitand)*
//! bitand:= equals ('&'  equals)*
//! equals:= compare (('=='|'!=') compare)*
//! compare:= shift (('<'|'>'|'<='|'>=') shift)*
//! shift := addsub (('<<'|'>>') addsub)*
//! addsub:= muldiv (('+'|'-') muldiv)*
//! muldiv:= unary  (('*'|'/'|'\\'|'%') unary)*
//! unary := ('-'|'+'|'~'|'!') unary | paren
//! paren := '(' expr ')' | element
//! element := digits | <anything else -> value 1>
//! ```

use crate::error::{EvalResult, LittleError};
use crate::value::Value;

struct ExprParser<'a> {
    src: &'a [u8],
    pos: usize,
}

/// Internal result carrier for the precedence-climbing functions. A plain
/// `LittleError` would force the non-numeric-atom case to look like a real
/// failure to every caller up the chain; `NonNumeric` instead unwinds all
/// the way to `eval_expr` untouched by intervening operators, so "stops
/// parsing, yields 1" is a whole-expression outcome rather than just the
/// one operand `element` happened to be parsing.
enum ExprAbort {
    NonNumeric,
    Error(LittleError),
}

impl From<LittleError> for ExprAbort {
    fn from(e: LittleError) -> Self {
        ExprAbort::Error(e)
    }
}

type PResult<T> = Result<T, ExprAbort>;

impl<'a> ExprParser<'a> {
    fn new(src: &'a str) -> Self {
        Self { src: src.as_bytes(), pos: 0 }
    }

    fn peek(&self) -> Option<u8> {
        self.src.get(self.pos).copied()
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(b' ') | Some(b'\t') | Some(b'\n') | Some(b'\r')) {
            self.pos += 1;
        }
    }

    fn at_eof(&mut self) -> bool {
        self.skip_ws();
        self.pos >= self.src.len()
    }

    fn starts_with(&mut self, tok: &str) -> bool {
        self.skip_ws();
        self.src[self.pos..].starts_with(tok.as_bytes())
    }

    fn consume(&mut self, tok: &str) {
        self.skip_ws();
        self.pos += tok.len();
    }

    /// Binary operators require the next non-space byte after the operator
    /// to not be a punctuation character other than the operators
    /// themselves -- a lookahead disambiguation that prevents e.g. `<`
    /// from swallowing into `<=` incorrectly or an
    /// operator run being misread as part of the next operand.
    fn op_lookahead_ok(&self, after: usize) -> bool {
        match self.src.get(after) {
            None => true,
            Some(&b) => {
                if b.is_ascii_whitespace() || b.is_ascii_alphanumeric() || b == b'(' || b == b'-' || b == b'+' || b == b'~' || b == b'!' {
                    true
                } else {
                    matches!(b, b'<' | b'>' | b'=' | b'&' | b'|')
                }
            }
        }
    }

    fn expr(&mut self) -> PResult<i64> {
        self.logor()
    }

    fn logor(&mut self) -> PResult<i64> {
        let mut lhs = self.logand()?;
        loop {
            if self.starts_with("||") && self.op_lookahead_ok(self.pos + 2) {
                self.consume("||");
                let rhs = self.logand()?;
                lhs = ((lhs != 0) || (rhs != 0)) as i64;
            } else {
                break;
            }
        }
        Ok(lhs)
    }

    fn logand(&mut self) -> PResult<i64> {
        let mut lhs = self.bitor()?;
        loop {
            if self.starts_with("&&") && self.op_lookahead_ok(self.pos + 2) {
                self.consume("&&");
                let rhs = self.bitor()?;
                lhs = ((lhs != 0) && (rhs != 0)) as i64;
            } else {
                break;
            }
        }
        Ok(lhs)
    }

    fn bitor(&mut self) -> PResult<i64> {
        let mut lhs = self.bitand()?;
        loop {
            if self.starts_with("|") && !self.starts_with("||") && self.op_lookahead_ok(self.pos + 1) {
                self.consume("|");
                let rhs = self.bitand()?;
                lhs |= rhs;
            } else {
                break;
            }
        }
        Ok(lhs)
    }

    fn bitand(&mut self) -> PResult<i64> {
        let mut lhs = self.equals()?;
        loop {
            if self.starts_with("&") && !self.starts_with("&&") && self.op_lookahead_ok(self.pos + 1) {
                self.consume("&");
                let rhs = self.equals()?;
                lhs &= rhs;
            } else {
                break;
            }
        }
        Ok(lhs)
    }

    fn equals(&mut self) -> PResult<i64> {
        let mut lhs = self.compare()?;
        loop {
            if self.starts_with("==") && self.op_lookahead_ok(self.pos + 2) {
                self.consume("==");
                let rhs = self.compare()?;
                lhs = (lhs == rhs) as i64;
            } else if self.starts_with("!=") && self.op_lookahead_ok(self.pos + 2) {
                self.consume("!=");
                let rhs = self.compare()?;
                lhs = (lhs != rhs) as i64;
            } else {
                break;
            }
        }
        Ok(lhs)
    }

    fn compare(&mut self) -> PResult<i64> {
        let mut lhs = self.shift()?;
        loop {
            if self.starts_with("<=") && self.op_lookahead_ok(self.pos + 2) {
                self.consume("<=");
                let rhs = self.shift()?;
                lhs = (lhs <= rhs) as i64;
            } else if self.starts_with(">=") && self.op_lookahead_ok(self.pos + 2) {
                self.consume(">=");
                let rhs = self.shift()?;
                lhs = (lhs >= rhs) as i64;
            } else if self.starts_with("<") && !self.starts_with("<<") && self.op_lookahead_ok(self.pos + 1) {
                self.consume("<");
                let rhs = self.shift()?;
                lhs = (lhs < rhs) as i64;
            } else if self.starts_with(">") && !self.starts_with(">>") && self.op_lookahead_ok(self.pos + 1) {
                self.consume(">");
                let rhs = self.shift()?;
                lhs = (lhs > rhs) as i64;
            } else {
                break;
            }
        }
        Ok(lhs)
    }

    fn shift(&mut self) -> PResult<i64> {
        let mut lhs = self.addsub()?;
        loop {
            if self.starts_with("<<") && self.op_lookahead_ok(self.pos + 2) {
                self.consume("<<");
                let rhs = self.addsub()?;
                lhs = lhs.wrapping_shl(rhs as u32 & 63);
            } else if self.starts_with(">>") && self.op_lookahead_ok(self.pos + 2) {
                self.consume(">>");
                let rhs = self.addsub()?;
                lhs = lhs.wrapping_shr(rhs as u32 & 63);
            } else {
                break;
            }
        }
        Ok(lhs)
    }

    fn addsub(&mut self) -> PResult<i64> {
        let mut lhs = self.muldiv()?;
        loop {
            if self.starts_with("+") && self.op_lookahead_ok(self.pos + 1) {
                self.consume("+");
                let rhs = self.muldiv()?;
                lhs = lhs.wrapping_add(rhs);
            } else if self.starts_with("-") && self.op_lookahead_ok(self.pos + 1) {
                self.consume("-");
                let rhs = self.muldiv()?;
                lhs = lhs.wrapping_sub(rhs);
            } else {
                break;
            }
        }
        Ok(lhs)
    }

    fn muldiv(&mut self) -> PResult<i64> {
        let mut lhs = self.unary()?;
        loop {
            self.skip_ws();
            match self.peek() {
                Some(b'*') if self.op_lookahead_ok(self.pos + 1) => {
                    self.consume("*");
                    let rhs = self.unary()?;
                    lhs = lhs.wrapping_mul(rhs);
                }
                Some(b'/') if self.op_lookahead_ok(self.pos + 1) => {
                    self.consume("/");
                    let rhs = self.unary()?;
                    lhs = checked_div(lhs, rhs)?;
                }
                Some(b'\\') if self.op_lookahead_ok(self.pos + 1) => {
                    // Treated as identical to `/`.
                    self.consume("\\");
                    let rhs = self.unary()?;
                    lhs = checked_div(lhs, rhs)?;
                }
                Some(b'%') if self.op_lookahead_ok(self.pos + 1) => {
                    self.consume("%");
                    let rhs = self.unary()?;
                    lhs = checked_rem(lhs, rhs)?;
                }
                _ => break,
            }
        }
        Ok(lhs)
    }

    fn unary(&mut self) -> PResult<i64> {
        self.skip_ws();
        match self.peek() {
            Some(b'-') => {
                self.pos += 1;
                Ok(self.unary()?.wrapping_neg())
            }
            Some(b'+') => {
                self.pos += 1;
                self.unary()
            }
            Some(b'~') => {
                self.pos += 1;
                Ok(!self.unary()?)
            }
            Some(b'!') => {
                self.pos += 1;
                Ok((self.unary()? == 0) as i64)
            }
            _ => self.paren(),
        }
    }

    fn paren(&mut self) -> PResult<i64> {
        self.skip_ws();
        if self.peek() == Some(b'(') {
            self.pos += 1;
            let v = self.expr()?;
            self.skip_ws();
            if self.peek() != Some(b')') {
                return Err(ExprAbort::Error(LittleError::default_err(self.pos, "expression syntax error")));
            }
            self.pos += 1;
            Ok(v)
        } else {
            self.element()
        }
    }

    /// `digits | <anything else aborts the whole expression>`. Hitting a
    /// non-numeric token here isn't a value of this one operand; the entire
    /// expression stops parsing and evaluates to 1 at the top (`eval_expr`
    /// is where `ExprAbort::NonNumeric` is actually turned into `1`).
    fn element(&mut self) -> PResult<i64> {
        self.skip_ws();
        let start = self.pos;
        if self.peek().map(|b| b.is_ascii_digit()).unwrap_or(false) {
            while self.peek().map(|b| b.is_ascii_digit()).unwrap_or(false) {
                self.pos += 1;
            }
            let text = std::str::from_utf8(&self.src[start..self.pos]).unwrap_or("0");
            return Ok(text.parse::<i64>().unwrap_or(0));
        }
        Err(ExprAbort::NonNumeric)
    }
}

fn checked_div(a: i64, b: i64) -> PResult<i64> {
    if b == 0 {
        return Err(ExprAbort::Error(LittleError::default_err(0, "division by zero in expression")));
    }
    Ok(a.wrapping_div(b))
}

fn checked_rem(a: i64, b: i64) -> PResult<i64> {
    if b == 0 {
        return Err(ExprAbort::Error(LittleError::default_err(0, "division by zero in expression")));
    }
    Ok(a.wrapping_rem(b))
}

/// Evaluate an already-substituted expression string to a Value holding
/// the decimal text of the resulting signed integer. An empty expression
/// yields 0.
pub fn eval_expr(src: &str) -> EvalResult {
    let trimmed = src.trim();
    if trimmed.is_empty() {
        return Ok(Value::from_int(0));
    }
    let mut p = ExprParser::new(trimmed);
    match p.expr() {
        Ok(v) => Ok(Value::from_int(v)),
        Err(ExprAbort::NonNumeric) => Ok(Value::from_int(1)),
        Err(ExprAbort::Error(e)) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> i64 {
        eval_expr(s).unwrap().to_int().unwrap()
    }

    #[test]
    fn precedence() {
        assert_eq!(v("1 + 2 * 3"), 7);
        assert_eq!(v("~(2*3)+1"), -6);
        assert_eq!(v("1 || 0 && 0"), 1);
    }

    #[test]
    fn division_by_zero_errors() {
        assert!(eval_expr("1 / 0").is_err());
        assert!(eval_expr("1 % 0").is_err());
    }

    #[test]
    fn backslash_division_matches_slash() {
        assert_eq!(v("7 \\ 2"), 3);
        assert_eq!(v("7 / 2"), 3);
    }

    #[test]
    fn empty_expression_is_zero() {
        assert_eq!(v("   "), 0);
    }

    #[test]
    fn nonnumeric_atom_is_truthy_one() {
        assert_eq!(v("nonsense"), 1);
    }

    #[test]
    fn nonnumeric_atom_aborts_the_whole_expression_not_just_the_operand() {
        // Hitting a non-numeric token doesn't just contribute 1 to the
        // addition in progress (which would give 3) -- it abandons the
        // rest of the expression and the overall result is 1.
        assert_eq!(v("2 + foo"), 1);
        assert_eq!(v("foo * 100"), 1);
    }

    #[test]
    fn comparisons() {
        assert_eq!(v("3 <= 3"), 1);
        assert_eq!(v("3 < 3"), 0);
        assert_eq!(v("5 >> 1"), 2);
        assert_eq!(v("1 << 3"), 8);
    }
}
