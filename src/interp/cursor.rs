//! Tokenizer / word parser.
//!
//! A `ParseCtx` is a private, non-shared cursor over one source buffer.
//! Recursive word forms (`$name`, `[...]`) don't share this cursor with
//! the fragment they trigger — they hand the extracted fragment to a fresh
//! `Interpreter::parse_with_eol` call, which allocates its own `ParseCtx`.
//! That's what gives nested `parse` calls save/restore-on-entry semantics
//! for free: each recursion owns its own cursor.

use crate::error::LittleError;
use crate::list::List;
use crate::value::Value;

use super::Interpreter;

type PResult<T> = Result<T, LittleError>;

const SPECIALS: &[u8] = b"${}[]\"';";

pub(super) struct ParseCtx<'s> {
    src: &'s [u8],
    pos: usize,
    ignore_eol: bool,
}

impl<'s> ParseCtx<'s> {
    pub(super) fn new(src: &'s [u8], ignore_eol: bool) -> Self {
        Self { src, pos: 0, ignore_eol }
    }

    fn peek(&self) -> Option<u8> {
        self.src.get(self.pos).copied()
    }

    fn peek_at(&self, off: usize) -> Option<u8> {
        self.src.get(self.pos + off).copied()
    }

    fn bump(&mut self) -> Option<u8> {
        let b = self.peek();
        if b.is_some() {
            self.pos += 1;
        }
        b
    }

    fn is_eol_byte(b: u8) -> bool {
        matches!(b, b'\n' | b'\r' | b';')
    }

    fn at_eof(&self) -> bool {
        self.pos >= self.src.len()
    }

    /// Skips whitespace, line-continuations and comments. When
    /// `ignore_eol` is set, LF/CR/`;` count as whitespace too.
    fn skip_trivia(&mut self) {
        loop {
            match self.peek() {
                Some(b' ') | Some(b'\t') => {
                    self.pos += 1;
                }
                Some(b) if Self::is_eol_byte(b) && self.ignore_eol => {
                    self.pos += 1;
                }
                Some(b'\\') if Self::is_eol_byte(self.peek_at(1).unwrap_or(0)) => {
                    self.pos += 1;
                    while self.peek().map(Self::is_eol_byte).unwrap_or(false) {
                        self.pos += 1;
                    }
                }
                Some(b'#') if self.peek_at(1) == Some(b'#') && self.peek_at(2) != Some(b'#') => {
                    self.pos += 2;
                    while !self.at_eof() {
                        if self.peek() == Some(b'#')
                            && self.peek_at(1) == Some(b'#')
                            && self.peek_at(2) != Some(b'#')
                        {
                            self.pos += 2;
                            break;
                        }
                        self.pos += 1;
                    }
                }
                Some(b'#') => {
                    while !self.at_eof() && !Self::is_eol_byte(self.peek().unwrap()) {
                        self.pos += 1;
                    }
                }
                _ => break,
            }
        }
    }
}

impl Interpreter {
    /// Extracts one line of words, along with the byte offset its first
    /// word starts at (the line's dispatch position). Returns `None` only
    /// at end of input; a blank line (just a terminator) comes back as an
    /// empty `List` so the caller's per-line loop can skip it and keep going.
    pub(super) fn extract_line(&mut self, ctx: &mut ParseCtx) -> PResult<Option<(usize, List)>> {
        ctx.skip_trivia();
        if ctx.at_eof() {
            return Ok(None);
        }
        if !ctx.ignore_eol {
            if let Some(b) = ctx.peek() {
                if ParseCtx::is_eol_byte(b) {
                    ctx.pos += 1;
                    return Ok(Some((ctx.pos, List::new())));
                }
            }
        }

        let line_pos = ctx.pos;
        let mut words = List::new();
        loop {
            ctx.skip_trivia();
            if ctx.at_eof() {
                break;
            }
            if !ctx.ignore_eol {
                if let Some(b) = ctx.peek() {
                    if ParseCtx::is_eol_byte(b) {
                        ctx.pos += 1;
                        break;
                    }
                }
            }
            let word = self.extract_word(ctx)?;
            words.push(word);
        }
        Ok(Some((line_pos, words)))
    }

    /// Extracts one word, concatenating adjacent word-forms with no
    /// intervening whitespace (`a$b"c"` is one word).
    fn extract_word(&mut self, ctx: &mut ParseCtx) -> PResult<Value> {
        let mut out = Value::empty();
        loop {
            match ctx.peek() {
                Some(b'$') => {
                    ctx.pos += 1;
                    let name_word = self.extract_word(ctx)?;
                    let mut fragment = Value::from_str(&self.dollar_prefix);
                    fragment.append_value(&name_word);
                    let result = self.parse_with_eol(fragment.as_bytes(), false, true)?;
                    out.append_value(&result);
                }
                Some(b'{') => {
                    let lit = self.extract_braced(ctx)?;
                    out.append_value(&lit);
                }
                Some(b'[') => {
                    let inner = self.extract_bracketed(ctx)?;
                    let result = self.parse_with_eol(&inner, false, true)?;
                    out.append_value(&result);
                }
                Some(q @ b'"') | Some(q @ b'\'') => {
                    let s = self.extract_quoted(ctx, q)?;
                    out.append_value(&s);
                }
                Some(b) if !b.is_ascii_whitespace() && !SPECIALS.contains(&b) => {
                    let start = ctx.pos;
                    while let Some(b) = ctx.peek() {
                        if b.is_ascii_whitespace() || SPECIALS.contains(&b) {
                            break;
                        }
                        ctx.pos += 1;
                    }
                    out.append_bytes(&ctx.src[start..ctx.pos]);
                }
                _ => break,
            }
        }
        Ok(out)
    }

    fn extract_braced(&mut self, ctx: &mut ParseCtx) -> PResult<Value> {
        let open_pos = ctx.pos;
        ctx.pos += 1; // consume '{'
        let start = ctx.pos;
        let mut depth = 1usize;
        loop {
            match ctx.bump() {
                Some(b'{') => depth += 1,
                Some(b'}') => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(Value::from_bytes(ctx.src[start..ctx.pos - 1].to_vec()));
                    }
                }
                Some(_) => {}
                None => return Err(LittleError::unbalanced(open_pos, "expected }")),
            }
        }
    }

    fn extract_bracketed(&mut self, ctx: &mut ParseCtx) -> PResult<Vec<u8>> {
        let open_pos = ctx.pos;
        ctx.pos += 1; // consume '['
        let start = ctx.pos;
        let mut depth = 1usize;
        loop {
            match ctx.bump() {
                Some(b'[') => depth += 1,
                Some(b']') => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(ctx.src[start..ctx.pos - 1].to_vec());
                    }
                }
                Some(_) => {}
                None => return Err(LittleError::unbalanced(open_pos, "expected ]")),
            }
        }
    }

    fn extract_quoted(&mut self, ctx: &mut ParseCtx, quote: u8) -> PResult<Value> {
        let open_pos = ctx.pos;
        ctx.pos += 1; // consume opening quote
        let mut out = Value::empty();
        loop {
            match ctx.bump() {
                Some(b) if b == quote => return Ok(out),
                Some(b'\\') => match ctx.bump() {
                    Some(b'b') => out.append_byte(0x08),
                    Some(b't') => out.append_byte(b'\t'),
                    Some(b'n') => out.append_byte(b'\n'),
                    Some(b'v') => out.append_byte(0x0B),
                    Some(b'f') => out.append_byte(0x0C),
                    Some(b'r') => out.append_byte(b'\r'),
                    Some(b'0') => out.append_byte(0x00),
                    Some(b'a') => out.append_byte(0x07),
                    Some(b'o') => out.append_byte(b'{'),
                    Some(b'c') => out.append_byte(b'}'),
                    Some(other) => out.append_byte(other),
                    None => return Err(LittleError::unbalanced(open_pos, "expected closing quote")),
                },
                Some(b'$') => {
                    let name_word = self.extract_word(ctx)?;
                    let mut fragment = Value::from_str(&self.dollar_prefix);
                    fragment.append_value(&name_word);
                    let result = self.parse_with_eol(fragment.as_bytes(), false, true)?;
                    out.append_value(&result);
                }
                Some(b'[') => {
                    ctx.pos -= 1;
                    let inner = self.extract_bracketed(ctx)?;
                    let result = self.parse_with_eol(&inner, false, true)?;
                    out.append_value(&result);
                }
                Some(b) => out.append_byte(b),
                None => return Err(LittleError::unbalanced(open_pos, "expected closing quote")),
            }
        }
    }
}
