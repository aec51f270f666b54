//! Context-aware EcmaScript lexer
//!
//! This crate provides the scanner for the EcmaScript parser. JavaScript
//! cannot be tokenized without help from the grammar: `/` is either division
//! or the start of a regular expression, and a `}` may close a block or resume
//! a template literal. The lexer therefore exposes a plain [`Lexer::next_token`]
//! stream plus two parser-driven entry points, [`Lexer::read_regex`] and
//! [`Lexer::continue_template`], invoked exactly where the grammar knows which
//! interpretation applies.
//!
//! # Architecture
//!
//! - **Newline bookkeeping**: tokens never represent line terminators; instead
//!   each token carries a `newline_before` flag, which is what automatic
//!   semicolon insertion and the restricted productions consult. A block
//!   comment spanning lines counts as a line terminator.
//! - **Comments as tokens**: comments are returned to the caller (the parser's
//!   token buffer records and swallows them), classified as line, block,
//!   jsdoc, or Annex-B HTML comments.
//! - **Escapes**: identifiers may contain `\u` escapes; the decoded name is
//!   attached to the token and the `had_escape` flag set, because an escaped
//!   keyword never acts as a keyword.
//! - **Position tracking**: byte offsets plus 1-based line / 0-based column on
//!   every token.
//!
//! # Usage
//!
//! ```
//! use ecma_lexer::Lexer;
//! use ecma_token::TokenKind;
//!
//! let mut lexer = Lexer::new("let x = 42;");
//! let tok = lexer.next_token().unwrap();
//! assert_eq!(tok.kind, TokenKind::Let);
//! ```

mod error;

pub use error::LexError;

use ecma_token::{CommentKind, Token, TokenKind, TokenValue, KEYWORDS};
use std::sync::Arc;

/// Scanner over a single source string.
///
/// The lexer owns no lookahead; buffering lives in the parser so that the
/// regex/template re-entry points stay exact (they rely on the lexer position
/// sitting immediately after the token that triggered them).
pub struct Lexer<'a> {
    src: &'a str,
    bytes: &'a [u8],
    pos: usize,
    line: u32,
    line_start: usize,
    /// A line terminator was seen since the last emitted token
    newline_pending: bool,
    /// Annex-B `<!--` / `-->` comments; disabled for module sources
    html_comments: bool,
}

impl<'a> Lexer<'a> {
    /// Create a lexer starting at line 1.
    pub fn new(src: &'a str) -> Self {
        Self::with_start_line(src, 1)
    }

    /// Create a lexer whose first line reports as `start_line`, for sources
    /// embedded at an offset (eval-style callers).
    pub fn with_start_line(src: &'a str, start_line: u32) -> Self {
        Lexer {
            src,
            bytes: src.as_bytes(),
            pos: 0,
            line: start_line.max(1),
            line_start: 0,
            newline_pending: false,
            html_comments: true,
        }
    }

    /// Disable Annex-B HTML comments (module sources).
    pub fn set_html_comments(&mut self, enabled: bool) {
        self.html_comments = enabled;
    }

    /// Current byte offset into the source.
    pub fn offset(&self) -> usize {
        self.pos
    }

    /// Scan the next token, skipping whitespace and line terminators.
    ///
    /// Comments are returned as `Comment` tokens; everything else is a real
    /// token of the grammar. At end of input an `Eof` token is produced (and
    /// will be produced again on every subsequent call).
    pub fn next_token(&mut self) -> Result<Token, LexError> {
        self.skip_whitespace();

        let start = self.pos;
        let line = self.line;
        let column = (self.pos - self.line_start) as u32;

        let Some(&b) = self.bytes.get(self.pos) else {
            return Ok(self.finish(TokenKind::Eof, start, line, column, TokenValue::None));
        };

        match b {
            b'/' => match self.bytes.get(self.pos + 1) {
                Some(b'/') => self.read_line_comment(start, line, column, CommentKind::Line),
                Some(b'*') => self.read_block_comment(start, line, column),
                Some(b'=') => {
                    self.pos += 2;
                    Ok(self.finish(TokenKind::SlashAssign, start, line, column, TokenValue::None))
                }
                _ => {
                    self.pos += 1;
                    Ok(self.finish(TokenKind::Slash, start, line, column, TokenValue::None))
                }
            },
            b'<' if self.html_comments && self.src[self.pos..].starts_with("<!--") => {
                self.read_line_comment(start, line, column, CommentKind::Html)
            }
            b'-' if self.html_comments
                && self.newline_pending
                && self.src[self.pos..].starts_with("-->") =>
            {
                self.read_line_comment(start, line, column, CommentKind::Html)
            }
            b'\'' | b'"' => self.read_string(start, line, column),
            b'`' => self.read_template_chunk(start, line, column, true),
            b'0'..=b'9' => self.read_number(start, line, column),
            b'.' => {
                if matches!(self.bytes.get(self.pos + 1), Some(b'0'..=b'9')) {
                    self.read_number(start, line, column)
                } else if self.bytes.get(self.pos + 1) == Some(&b'.')
                    && self.bytes.get(self.pos + 2) == Some(&b'.')
                {
                    self.pos += 3;
                    Ok(self.finish(TokenKind::DotDotDot, start, line, column, TokenValue::None))
                } else {
                    self.pos += 1;
                    Ok(self.finish(TokenKind::Dot, start, line, column, TokenValue::None))
                }
            }
            b'#' => {
                // Hashbang on the very first byte is treated as a comment
                if start == 0 && self.bytes.get(1) == Some(&b'!') {
                    return self.read_line_comment(start, line, column, CommentKind::Line);
                }
                // Private names: `#` immediately followed by an identifier
                self.pos += 1;
                match self.char_at(self.pos) {
                    Some(c) if is_id_start(c) || c == '\\' => {
                        let (name, had_escape) = self.scan_identifier_name()?;
                        let mut tok =
                            self.finish(TokenKind::PrivateName, start, line, column, TokenValue::None);
                        if had_escape {
                            tok.had_escape = true;
                            tok.value = TokenValue::Name { decoded: Arc::from(format!("#{name}")) };
                        }
                        Ok(tok)
                    }
                    _ => Err(LexError::UnexpectedChar { ch: '#', offset: start }),
                }
            }
            b'$' | b'_' | b'a'..=b'z' | b'A'..=b'Z' | b'\\' => {
                self.read_identifier(start, line, column)
            }
            _ if b < 0x80 => self.read_punctuator(start, line, column),
            _ => {
                let c = self.char_at(self.pos).unwrap_or('\u{FFFD}');
                if is_id_start(c) {
                    self.read_identifier(start, line, column)
                } else {
                    // Step past the offender so error recovery always makes
                    // progress
                    self.pos += c.len_utf8().max(1);
                    Err(LexError::UnexpectedChar { ch: c, offset: start })
                }
            }
        }
    }

    /// Re-scan a peeked `/` or `/=` token as a regular expression literal.
    ///
    /// The caller guarantees the lexer has not advanced past that token. The
    /// `newline_before` flag of the original token is threaded through so the
    /// replacement token keeps its ASI behavior.
    pub fn read_regex(&mut self, slash: &Token) -> Result<Token, LexError> {
        let start = slash.start;
        // The `=` of a `/=` token belongs to the pattern body
        self.pos = start + 1;
        let body_start = self.pos;
        let mut in_class = false;
        loop {
            match self.char_at(self.pos) {
                None => return Err(LexError::UnterminatedRegex { offset: start }),
                Some(c) if is_line_terminator(c) => {
                    return Err(LexError::UnterminatedRegex { offset: start });
                }
                Some('\\') => {
                    self.pos += 1;
                    match self.char_at(self.pos) {
                        None => return Err(LexError::UnterminatedRegex { offset: start }),
                        Some(c) if is_line_terminator(c) => {
                            return Err(LexError::UnterminatedRegex { offset: start });
                        }
                        Some(c) => self.pos += c.len_utf8(),
                    }
                }
                Some('[') => {
                    in_class = true;
                    self.pos += 1;
                }
                Some(']') => {
                    in_class = false;
                    self.pos += 1;
                }
                Some('/') if !in_class => break,
                Some(c) => self.pos += c.len_utf8(),
            }
        }
        let pattern: Arc<str> = Arc::from(&self.src[body_start..self.pos]);
        self.pos += 1; // closing slash
        let flags_start = self.pos;
        while let Some(c) = self.char_at(self.pos) {
            if is_id_part(c) {
                self.pos += c.len_utf8();
            } else {
                break;
            }
        }
        let flags: Arc<str> = Arc::from(&self.src[flags_start..self.pos]);
        let mut tok = self.finish(
            TokenKind::Regex,
            start,
            slash.line,
            slash.column,
            TokenValue::Regex { pattern, flags },
        );
        tok.newline_before = slash.newline_before;
        Ok(tok)
    }

    /// Resume a template literal after the `}` that closed a substitution.
    ///
    /// The caller has just seen a `}` token and decided (from its own state)
    /// that it terminates a `${` substitution; the lexer position is the byte
    /// after that brace, and the emitted chunk's lexeme includes it.
    pub fn continue_template(&mut self) -> Result<Token, LexError> {
        let start = self.pos.saturating_sub(1);
        let line = self.line;
        let column = (start.saturating_sub(self.line_start)) as u32;
        self.read_template_chunk(start, line, column, false)
    }

    // ===== whitespace and position helpers =====

    fn char_at(&self, pos: usize) -> Option<char> {
        self.src.get(pos..).and_then(|s| s.chars().next())
    }

    fn newline(&mut self) {
        self.line += 1;
        self.line_start = self.pos;
        self.newline_pending = true;
    }

    fn skip_whitespace(&mut self) {
        while self.pos < self.bytes.len() {
            match self.bytes[self.pos] {
                b' ' | b'\t' | 0x0B | 0x0C => self.pos += 1,
                b'\n' => {
                    self.pos += 1;
                    self.newline();
                }
                b'\r' => {
                    self.pos += 1;
                    if self.bytes.get(self.pos) == Some(&b'\n') {
                        self.pos += 1;
                    }
                    self.newline();
                }
                b if b < 0x80 => break,
                _ => {
                    let Some(c) = self.char_at(self.pos) else { break };
                    if c == '\u{2028}' || c == '\u{2029}' {
                        self.pos += c.len_utf8();
                        self.newline();
                    } else if c == '\u{FEFF}' || c.is_whitespace() {
                        self.pos += c.len_utf8();
                    } else {
                        break;
                    }
                }
            }
        }
    }

    /// Build a token ending at the current position and clear the pending
    /// newline flag.
    fn finish(
        &mut self,
        kind: TokenKind,
        start: usize,
        line: u32,
        column: u32,
        value: TokenValue,
    ) -> Token {
        let tok = Token {
            kind,
            text: Arc::from(&self.src[start..self.pos]),
            start,
            end: self.pos,
            line,
            column,
            newline_before: self.newline_pending,
            had_escape: false,
            value,
        };
        self.newline_pending = false;
        tok
    }

    // ===== comments =====

    fn read_line_comment(
        &mut self,
        start: usize,
        line: u32,
        column: u32,
        kind: CommentKind,
    ) -> Result<Token, LexError> {
        // Consume up to (not including) the next line terminator. memchr gets
        // us to the next LF/CR or the lead byte of U+2028/U+2029 quickly.
        let mut p = self.pos;
        loop {
            match memchr::memchr3(b'\n', b'\r', 0xE2, &self.bytes[p..]) {
                None => {
                    p = self.bytes.len();
                    break;
                }
                Some(off) => {
                    let at = p + off;
                    if self.bytes[at] != 0xE2 {
                        p = at;
                        break;
                    }
                    match self.char_at(at) {
                        Some('\u{2028}') | Some('\u{2029}') => {
                            p = at;
                            break;
                        }
                        _ => p = at + 1,
                    }
                }
            }
        }
        self.pos = p;
        Ok(self.finish(
            TokenKind::Comment,
            start,
            line,
            column,
            TokenValue::Comment { kind, multiline: false },
        ))
    }

    fn read_block_comment(
        &mut self,
        start: usize,
        line: u32,
        column: u32,
    ) -> Result<Token, LexError> {
        // `/**` (but not the degenerate `/**/`) is a documentation comment
        let kind = if self.src[self.pos..].starts_with("/**")
            && !self.src[self.pos..].starts_with("/**/")
        {
            CommentKind::JsDoc
        } else {
            CommentKind::Block
        };
        self.pos += 2;
        let mut multiline = false;
        loop {
            match self.char_at(self.pos) {
                None => return Err(LexError::UnterminatedComment { offset: start }),
                Some('*') if self.bytes.get(self.pos + 1) == Some(&b'/') => {
                    self.pos += 2;
                    break;
                }
                Some('\r') => {
                    self.pos += 1;
                    if self.bytes.get(self.pos) == Some(&b'\n') {
                        self.pos += 1;
                    }
                    self.line += 1;
                    self.line_start = self.pos;
                    multiline = true;
                }
                Some(c) if is_line_terminator(c) => {
                    self.pos += c.len_utf8();
                    self.line += 1;
                    self.line_start = self.pos;
                    multiline = true;
                }
                Some(c) => self.pos += c.len_utf8(),
            }
        }
        let mut tok = self.finish(
            TokenKind::Comment,
            start,
            line,
            column,
            TokenValue::Comment { kind, multiline },
        );
        // A comment spanning lines terminates the line for ASI purposes
        if multiline {
            self.newline_pending = true;
            tok.value = TokenValue::Comment { kind, multiline };
        }
        Ok(tok)
    }

    // ===== identifiers =====

    /// Scan an identifier body from the current position, decoding escapes.
    /// Returns the decoded name and whether any escape was present.
    fn scan_identifier_name(&mut self) -> Result<(String, bool), LexError> {
        let mut name = String::new();
        let mut had_escape = false;
        let mut first = true;
        loop {
            match self.char_at(self.pos) {
                Some('\\') => {
                    let esc_start = self.pos;
                    self.pos += 1;
                    if self.char_at(self.pos) != Some('u') {
                        return Err(LexError::InvalidUnicodeEscape { offset: esc_start });
                    }
                    self.pos += 1;
                    let c = self.read_unicode_escape_body(esc_start)?;
                    let ok = if first { is_id_start(c) } else { is_id_part(c) };
                    if !ok {
                        return Err(LexError::InvalidUnicodeEscape { offset: esc_start });
                    }
                    name.push(c);
                    had_escape = true;
                }
                Some(c) if (first && is_id_start(c)) || (!first && is_id_part(c)) => {
                    name.push(c);
                    self.pos += c.len_utf8();
                }
                _ => break,
            }
            first = false;
        }
        if name.is_empty() {
            return Err(LexError::InvalidUnicodeEscape { offset: self.pos });
        }
        Ok((name, had_escape))
    }

    fn read_identifier(
        &mut self,
        start: usize,
        line: u32,
        column: u32,
    ) -> Result<Token, LexError> {
        let (name, had_escape) = self.scan_identifier_name()?;
        let kind = match KEYWORDS.get(name.as_str()) {
            // An escaped `let`/`yield`/`await` is always a plain identifier;
            // an escaped hard keyword keeps its kind so the parser can reject
            // it at the point of use.
            Some(&k) if had_escape && matches!(k, TokenKind::Let | TokenKind::Yield | TokenKind::Await) => {
                TokenKind::Identifier
            }
            Some(&k) => k,
            None => TokenKind::Identifier,
        };
        let mut tok = self.finish(kind, start, line, column, TokenValue::None);
        if had_escape {
            tok.had_escape = true;
            tok.value = TokenValue::Name { decoded: Arc::from(name) };
        }
        Ok(tok)
    }

    /// Body of a `\uXXXX` or `\u{...}` escape, positioned after the `u`.
    fn read_unicode_escape_body(&mut self, esc_start: usize) -> Result<char, LexError> {
        if self.char_at(self.pos) == Some('{') {
            self.pos += 1;
            let mut value: u32 = 0;
            let mut digits = 0;
            loop {
                match self.char_at(self.pos) {
                    Some('}') => {
                        self.pos += 1;
                        break;
                    }
                    Some(c) if c.is_ascii_hexdigit() => {
                        value = value
                            .checked_mul(16)
                            .and_then(|v| v.checked_add(c.to_digit(16).unwrap_or(0)))
                            .ok_or(LexError::InvalidUnicodeEscape { offset: esc_start })?;
                        digits += 1;
                        self.pos += 1;
                    }
                    _ => return Err(LexError::InvalidUnicodeEscape { offset: esc_start }),
                }
            }
            if digits == 0 || value > 0x10FFFF {
                return Err(LexError::InvalidUnicodeEscape { offset: esc_start });
            }
            char::from_u32(value).ok_or(LexError::InvalidUnicodeEscape { offset: esc_start })
        } else {
            let mut value: u32 = 0;
            for _ in 0..4 {
                match self.char_at(self.pos) {
                    Some(c) if c.is_ascii_hexdigit() => {
                        value = value * 16 + c.to_digit(16).unwrap_or(0);
                        self.pos += 1;
                    }
                    _ => return Err(LexError::InvalidUnicodeEscape { offset: esc_start }),
                }
            }
            char::from_u32(value).ok_or(LexError::InvalidUnicodeEscape { offset: esc_start })
        }
    }

    // ===== numbers =====

    /// Scan `radix` digits with `_` separators; separators must sit between
    /// two digits. Returns the digits with separators stripped.
    fn scan_digits(&mut self, radix: u32, out: &mut String) -> Result<usize, LexError> {
        let mut count = 0;
        let mut last_was_sep = false;
        loop {
            match self.char_at(self.pos) {
                Some('_') => {
                    if count == 0 || last_was_sep {
                        return Err(LexError::InvalidNumber { offset: self.pos });
                    }
                    last_was_sep = true;
                    self.pos += 1;
                }
                Some(c) if c.to_digit(radix).is_some() => {
                    out.push(c);
                    count += 1;
                    last_was_sep = false;
                    self.pos += 1;
                }
                _ => break,
            }
        }
        if last_was_sep {
            return Err(LexError::InvalidNumber { offset: self.pos });
        }
        Ok(count)
    }

    fn read_number(&mut self, start: usize, line: u32, column: u32) -> Result<Token, LexError> {
        let mut digits = String::new();
        let mut is_float = false;
        let mut legacy_octal = false;
        let mut radix = 10u32;

        if self.bytes[self.pos] == b'0' {
            match self.bytes.get(self.pos + 1) {
                Some(b'x') | Some(b'X') => {
                    radix = 16;
                    self.pos += 2;
                    if self.scan_digits(16, &mut digits)? == 0 {
                        return Err(LexError::InvalidNumber { offset: start });
                    }
                }
                Some(b'o') | Some(b'O') => {
                    radix = 8;
                    self.pos += 2;
                    if self.scan_digits(8, &mut digits)? == 0 {
                        return Err(LexError::InvalidNumber { offset: start });
                    }
                }
                Some(b'b') | Some(b'B') => {
                    radix = 2;
                    self.pos += 2;
                    if self.scan_digits(2, &mut digits)? == 0 {
                        return Err(LexError::InvalidNumber { offset: start });
                    }
                }
                Some(b'0'..=b'9') => {
                    // Legacy octal, or a non-octal decimal like `089`
                    legacy_octal = true;
                    let mut saw_eight_or_nine = false;
                    while let Some(c) = self.char_at(self.pos) {
                        match c {
                            '0'..='7' => {
                                digits.push(c);
                                self.pos += 1;
                            }
                            '8' | '9' => {
                                digits.push(c);
                                saw_eight_or_nine = true;
                                self.pos += 1;
                            }
                            _ => break,
                        }
                    }
                    if saw_eight_or_nine {
                        // Decimal with a useless leading zero; fraction and
                        // exponent are still allowed
                        radix = 10;
                        self.scan_fraction_and_exponent(&mut digits, &mut is_float)?;
                    } else {
                        radix = 8;
                        if matches!(self.char_at(self.pos), Some('.') | Some('e') | Some('E')) {
                            return Err(LexError::InvalidNumber { offset: start });
                        }
                    }
                }
                _ => {
                    // A lone `0`, possibly with fraction/exponent
                    digits.push('0');
                    self.pos += 1;
                    self.scan_fraction_and_exponent(&mut digits, &mut is_float)?;
                }
            }
        } else {
            self.scan_digits(10, &mut digits)?;
            self.scan_fraction_and_exponent(&mut digits, &mut is_float)?;
        }

        // BigInt suffix
        if self.char_at(self.pos) == Some('n') {
            if is_float || legacy_octal {
                return Err(LexError::InvalidBigInt { offset: start });
            }
            self.pos += 1;
            self.check_number_boundary()?;
            let payload = match radix {
                16 => format!("0x{digits}"),
                8 => format!("0o{digits}"),
                2 => format!("0b{digits}"),
                _ => digits,
            };
            return Ok(self.finish(
                TokenKind::BigInt,
                start,
                line,
                column,
                TokenValue::BigInt { digits: Arc::from(payload) },
            ));
        }

        self.check_number_boundary()?;

        let value = if radix == 10 {
            digits.parse::<f64>().map_err(|_| LexError::InvalidNumber { offset: start })?
        } else {
            let mut v = 0f64;
            for c in digits.chars() {
                v = v * radix as f64 + c.to_digit(radix).unwrap_or(0) as f64;
            }
            v
        };
        Ok(self.finish(
            TokenKind::Number,
            start,
            line,
            column,
            TokenValue::Number { value, legacy_octal },
        ))
    }

    fn scan_fraction_and_exponent(
        &mut self,
        digits: &mut String,
        is_float: &mut bool,
    ) -> Result<(), LexError> {
        if self.char_at(self.pos) == Some('.') {
            *is_float = true;
            digits.push('.');
            self.pos += 1;
            self.scan_digits(10, digits)?;
        }
        if matches!(self.char_at(self.pos), Some('e') | Some('E')) {
            *is_float = true;
            digits.push('e');
            self.pos += 1;
            if matches!(self.char_at(self.pos), Some('+') | Some('-')) {
                digits.push(self.char_at(self.pos).unwrap_or('+'));
                self.pos += 1;
            }
            if self.scan_digits(10, digits)? == 0 {
                return Err(LexError::InvalidNumber { offset: self.pos });
            }
        }
        Ok(())
    }

    /// A numeric literal may not run straight into an identifier or digit.
    fn check_number_boundary(&self) -> Result<(), LexError> {
        match self.char_at(self.pos) {
            Some(c) if is_id_start(c) || c.is_ascii_digit() => {
                Err(LexError::IdentifierAfterNumber { offset: self.pos })
            }
            _ => Ok(()),
        }
    }

    // ===== strings =====

    fn read_string(&mut self, start: usize, line: u32, column: u32) -> Result<Token, LexError> {
        let quote = self.bytes[self.pos] as char;
        self.pos += 1;
        let mut cooked = String::new();
        let mut has_octal_escape = false;
        loop {
            match self.char_at(self.pos) {
                None => return Err(LexError::UnterminatedString { offset: start }),
                Some(c) if c == quote => {
                    self.pos += 1;
                    break;
                }
                Some('\\') => {
                    self.pos += 1;
                    if let Some(c) = self.read_escape(&mut has_octal_escape)? {
                        cooked.push(c);
                    }
                }
                Some(c) if c == '\n' || c == '\r' => {
                    return Err(LexError::UnterminatedString { offset: start });
                }
                Some(c) => {
                    // U+2028/U+2029 are legal unescaped in string literals
                    if is_line_terminator(c) {
                        self.line += 1;
                    }
                    cooked.push(c);
                    self.pos += c.len_utf8();
                }
            }
        }
        Ok(self.finish(
            TokenKind::String,
            start,
            line,
            column,
            TokenValue::Str { cooked: Arc::from(cooked), has_octal_escape },
        ))
    }

    /// Decode one escape sequence, positioned after the backslash. Returns
    /// `None` for line continuations, which contribute no character.
    fn read_escape(&mut self, has_octal_escape: &mut bool) -> Result<Option<char>, LexError> {
        let esc_start = self.pos - 1;
        let Some(c) = self.char_at(self.pos) else {
            return Err(LexError::InvalidEscape { offset: esc_start });
        };
        self.pos += c.len_utf8();
        let decoded = match c {
            'n' => '\n',
            't' => '\t',
            'r' => '\r',
            'b' => '\u{8}',
            'f' => '\u{C}',
            'v' => '\u{B}',
            'x' => {
                let mut value = 0u32;
                for _ in 0..2 {
                    match self.char_at(self.pos) {
                        Some(h) if h.is_ascii_hexdigit() => {
                            value = value * 16 + h.to_digit(16).unwrap_or(0);
                            self.pos += 1;
                        }
                        _ => return Err(LexError::InvalidEscape { offset: esc_start }),
                    }
                }
                char::from_u32(value).unwrap_or('\u{FFFD}')
            }
            'u' => self.read_unicode_escape_body(esc_start)?,
            '0'..='7' => {
                // Legacy octal escape; `\0` not followed by a digit is NUL and
                // carries no flag
                let mut value = c.to_digit(8).unwrap_or(0);
                let mut len = 1;
                let max_len = if c <= '3' { 3 } else { 2 };
                while len < max_len {
                    match self.char_at(self.pos) {
                        Some(d @ '0'..='7') => {
                            value = value * 8 + d.to_digit(8).unwrap_or(0);
                            self.pos += 1;
                            len += 1;
                        }
                        _ => break,
                    }
                }
                let followed_by_digit =
                    matches!(self.char_at(self.pos), Some('0'..='9'));
                if !(c == '0' && len == 1 && !followed_by_digit) {
                    *has_octal_escape = true;
                }
                char::from_u32(value).unwrap_or('\u{FFFD}')
            }
            '8' | '9' => {
                // Annex-B NonOctalDecimalEscape: the digit itself
                *has_octal_escape = true;
                c
            }
            '\r' => {
                if self.char_at(self.pos) == Some('\n') {
                    self.pos += 1;
                }
                self.line += 1;
                self.line_start = self.pos;
                return Ok(None);
            }
            c if is_line_terminator(c) => {
                self.line += 1;
                self.line_start = self.pos;
                return Ok(None);
            }
            other => other,
        };
        Ok(Some(decoded))
    }

    // ===== templates =====

    /// Scan one template chunk. `opening` distinguishes the first chunk
    /// (starts at a backtick) from continuations (start at the `}` closing a
    /// substitution).
    fn read_template_chunk(
        &mut self,
        start: usize,
        line: u32,
        column: u32,
        opening: bool,
    ) -> Result<Token, LexError> {
        if opening {
            self.pos = start + 1;
        }
        let mut cooked = Some(String::new());
        let mut raw = String::new();
        let ends_with_substitution;
        loop {
            match self.char_at(self.pos) {
                None => return Err(LexError::UnterminatedTemplate { offset: start }),
                Some('`') => {
                    self.pos += 1;
                    ends_with_substitution = false;
                    break;
                }
                Some('$') if self.bytes.get(self.pos + 1) == Some(&b'{') => {
                    self.pos += 2;
                    ends_with_substitution = true;
                    break;
                }
                Some('\\') => {
                    let esc_raw_start = self.pos;
                    self.pos += 1;
                    let mut octal = false;
                    let before = self.pos;
                    match self.read_escape(&mut octal) {
                        // Octal escapes are illegal in templates; treat them
                        // like any other invalid escape (legal when tagged)
                        Ok(Some(c)) if !octal => {
                            if let Some(s) = cooked.as_mut() {
                                s.push(c);
                            }
                        }
                        Ok(None) => {}
                        _ => {
                            cooked = None;
                            // Make sure scanning moved past the backslash
                            if self.pos == before {
                                self.pos += 1;
                            }
                        }
                    }
                    if octal {
                        cooked = None;
                    }
                    raw.push_str(&self.src[esc_raw_start..self.pos.min(self.src.len())]);
                    continue;
                }
                Some('\r') => {
                    self.pos += 1;
                    if self.bytes.get(self.pos) == Some(&b'\n') {
                        self.pos += 1;
                    }
                    self.line += 1;
                    self.line_start = self.pos;
                    // Raw text normalizes CRLF / CR to LF
                    raw.push('\n');
                    if let Some(s) = cooked.as_mut() {
                        s.push('\n');
                    }
                    continue;
                }
                Some(c) => {
                    if is_line_terminator(c) {
                        self.line += 1;
                        self.line_start = self.pos + c.len_utf8();
                    }
                    raw.push(c);
                    if let Some(s) = cooked.as_mut() {
                        s.push(c);
                    }
                    self.pos += c.len_utf8();
                }
            }
        }
        let kind = match (opening, ends_with_substitution) {
            (true, false) => TokenKind::TemplateNoSub,
            (true, true) => TokenKind::TemplateHead,
            (false, true) => TokenKind::TemplateMiddle,
            (false, false) => TokenKind::TemplateTail,
        };
        Ok(self.finish(
            kind,
            start,
            line,
            column,
            TokenValue::Template {
                cooked: cooked.map(|s| Arc::from(s)),
                raw: Arc::from(raw),
            },
        ))
    }

    // ===== punctuators =====

    fn read_punctuator(
        &mut self,
        start: usize,
        line: u32,
        column: u32,
    ) -> Result<Token, LexError> {
        let b = self.bytes[self.pos];
        let b1 = self.bytes.get(self.pos + 1).copied();
        let b2 = self.bytes.get(self.pos + 2).copied();
        let b3 = self.bytes.get(self.pos + 3).copied();
        let (kind, len) = match b {
            b'{' => (TokenKind::LeftBrace, 1),
            b'}' => (TokenKind::RightBrace, 1),
            b'(' => (TokenKind::LeftParen, 1),
            b')' => (TokenKind::RightParen, 1),
            b'[' => (TokenKind::LeftBracket, 1),
            b']' => (TokenKind::RightBracket, 1),
            b';' => (TokenKind::Semicolon, 1),
            b',' => (TokenKind::Comma, 1),
            b':' => (TokenKind::Colon, 1),
            b'~' => (TokenKind::BitNot, 1),
            b'?' => match b1 {
                // `?.` only when not followed by a digit (`x?.3:y` is a
                // conditional, not optional chaining)
                Some(b'.') if !matches!(b2, Some(b'0'..=b'9')) => (TokenKind::QuestionDot, 2),
                Some(b'?') if b2 == Some(b'=') => (TokenKind::QuestionQuestionAssign, 3),
                Some(b'?') => (TokenKind::QuestionQuestion, 2),
                _ => (TokenKind::Question, 1),
            },
            b'<' => match b1 {
                Some(b'<') if b2 == Some(b'=') => (TokenKind::LeftShiftAssign, 3),
                Some(b'<') => (TokenKind::LeftShift, 2),
                Some(b'=') => (TokenKind::LessEqual, 2),
                _ => (TokenKind::Less, 1),
            },
            b'>' => match b1 {
                Some(b'>') if b2 == Some(b'>') && b3 == Some(b'=') => {
                    (TokenKind::UnsignedRightShiftAssign, 4)
                }
                Some(b'>') if b2 == Some(b'>') => (TokenKind::UnsignedRightShift, 3),
                Some(b'>') if b2 == Some(b'=') => (TokenKind::RightShiftAssign, 3),
                Some(b'>') => (TokenKind::RightShift, 2),
                Some(b'=') => (TokenKind::GreaterEqual, 2),
                _ => (TokenKind::Greater, 1),
            },
            b'=' => match b1 {
                Some(b'=') if b2 == Some(b'=') => (TokenKind::StrictEq, 3),
                Some(b'=') => (TokenKind::Eq, 2),
                Some(b'>') => (TokenKind::Arrow, 2),
                _ => (TokenKind::Assign, 1),
            },
            b'!' => match b1 {
                Some(b'=') if b2 == Some(b'=') => (TokenKind::StrictNotEq, 3),
                Some(b'=') => (TokenKind::NotEq, 2),
                _ => (TokenKind::Not, 1),
            },
            b'+' => match b1 {
                Some(b'+') => (TokenKind::Increment, 2),
                Some(b'=') => (TokenKind::PlusAssign, 2),
                _ => (TokenKind::Plus, 1),
            },
            b'-' => match b1 {
                Some(b'-') => (TokenKind::Decrement, 2),
                Some(b'=') => (TokenKind::MinusAssign, 2),
                _ => (TokenKind::Minus, 1),
            },
            b'*' => match b1 {
                Some(b'*') if b2 == Some(b'=') => (TokenKind::StarStarAssign, 3),
                Some(b'*') => (TokenKind::StarStar, 2),
                Some(b'=') => (TokenKind::StarAssign, 2),
                _ => (TokenKind::Star, 1),
            },
            b'%' => match b1 {
                Some(b'=') => (TokenKind::PercentAssign, 2),
                _ => (TokenKind::Percent, 1),
            },
            b'&' => match b1 {
                Some(b'&') if b2 == Some(b'=') => (TokenKind::AndAndAssign, 3),
                Some(b'&') => (TokenKind::AndAnd, 2),
                Some(b'=') => (TokenKind::BitAndAssign, 2),
                _ => (TokenKind::BitAnd, 1),
            },
            b'|' => match b1 {
                Some(b'|') if b2 == Some(b'=') => (TokenKind::OrOrAssign, 3),
                Some(b'|') => (TokenKind::OrOr, 2),
                Some(b'=') => (TokenKind::BitOrAssign, 2),
                _ => (TokenKind::BitOr, 1),
            },
            b'^' => match b1 {
                Some(b'=') => (TokenKind::BitXorAssign, 2),
                _ => (TokenKind::BitXor, 1),
            },
            _ => {
                self.pos += 1;
                return Err(LexError::UnexpectedChar { ch: b as char, offset: start });
            }
        };
        self.pos += len;
        Ok(self.finish(kind, start, line, column, TokenValue::None))
    }
}

/// Line terminators per the lexical grammar: LF, CR, LS, PS.
fn is_line_terminator(c: char) -> bool {
    matches!(c, '\n' | '\r' | '\u{2028}' | '\u{2029}')
}

/// Identifier start: `$`, `_`, or XID_Start.
fn is_id_start(c: char) -> bool {
    c == '$' || c == '_' || unicode_ident::is_xid_start(c)
}

/// Identifier continuation: `$`, XID_Continue, ZWNJ, ZWJ.
fn is_id_part(c: char) -> bool {
    c == '$' || c == '\u{200C}' || c == '\u{200D}' || unicode_ident::is_xid_continue(c)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn all_kinds(src: &str) -> Vec<TokenKind> {
        let mut lexer = Lexer::new(src);
        let mut out = Vec::new();
        loop {
            let tok = lexer.next_token().expect("lex");
            if tok.kind == TokenKind::Eof {
                break;
            }
            out.push(tok.kind);
        }
        out
    }

    #[test]
    fn keywords_and_identifiers() {
        assert_eq!(
            all_kinds("let x = await of"),
            vec![
                TokenKind::Let,
                TokenKind::Identifier,
                TokenKind::Assign,
                TokenKind::Await,
                TokenKind::Identifier,
            ]
        );
    }

    #[test]
    fn escaped_let_is_an_identifier() {
        let mut lexer = Lexer::new("l\\u0065t");
        let tok = lexer.next_token().unwrap();
        assert_eq!(tok.kind, TokenKind::Identifier);
        assert!(tok.had_escape);
        assert_eq!(tok.name(), "let");
    }

    #[test]
    fn escaped_hard_keyword_keeps_its_kind() {
        let mut lexer = Lexer::new("v\\u0061r");
        let tok = lexer.next_token().unwrap();
        assert_eq!(tok.kind, TokenKind::Var);
        assert!(tok.had_escape);
    }

    #[test]
    fn newline_flag_tracks_line_terminators() {
        let mut lexer = Lexer::new("a\nb c");
        let a = lexer.next_token().unwrap();
        let b = lexer.next_token().unwrap();
        let c = lexer.next_token().unwrap();
        assert!(!a.newline_before);
        assert!(b.newline_before);
        assert!(!c.newline_before);
        assert_eq!(b.line, 2);
    }

    #[test]
    fn multiline_block_comment_counts_as_newline() {
        let mut lexer = Lexer::new("a /* x\ny */ b");
        let _a = lexer.next_token().unwrap();
        let comment = lexer.next_token().unwrap();
        assert_eq!(comment.kind, TokenKind::Comment);
        assert!(matches!(
            comment.value,
            TokenValue::Comment { kind: CommentKind::Block, multiline: true }
        ));
        let b = lexer.next_token().unwrap();
        assert!(b.newline_before);
    }

    #[test]
    fn jsdoc_comment_classified() {
        let mut lexer = Lexer::new("/** doc */ x");
        let comment = lexer.next_token().unwrap();
        assert!(matches!(
            comment.value,
            TokenValue::Comment { kind: CommentKind::JsDoc, .. }
        ));
    }

    #[test]
    fn html_comments_in_scripts() {
        let kinds = all_kinds("x <!-- hidden\n--> also hidden\ny");
        assert_eq!(
            kinds,
            vec![
                TokenKind::Identifier,
                TokenKind::Comment,
                TokenKind::Comment,
                TokenKind::Identifier,
            ]
        );
    }

    #[test]
    fn html_close_requires_line_start() {
        // Mid-line `-->` must lex as decrement + greater
        let kinds = all_kinds("a --> b");
        assert_eq!(
            kinds,
            vec![
                TokenKind::Identifier,
                TokenKind::Decrement,
                TokenKind::Greater,
                TokenKind::Identifier,
            ]
        );
    }

    #[test]
    fn numbers() {
        let mut lexer = Lexer::new("0x1f 1_000 .5 1e3 0b101 0o17");
        let expect = [31.0, 1000.0, 0.5, 1000.0, 5.0, 15.0];
        for want in expect {
            let tok = lexer.next_token().unwrap();
            assert_eq!(tok.kind, TokenKind::Number);
            match tok.value {
                TokenValue::Number { value, .. } => assert_eq!(value, want),
                other => panic!("expected number payload, got {other:?}"),
            }
        }
    }

    #[test]
    fn legacy_octal_flagged() {
        let mut lexer = Lexer::new("0755");
        let tok = lexer.next_token().unwrap();
        assert!(matches!(
            tok.value,
            TokenValue::Number { value, legacy_octal: true } if value == 493.0
        ));
    }

    #[test]
    fn bigint_literals() {
        let mut lexer = Lexer::new("123n 0xffn");
        let a = lexer.next_token().unwrap();
        assert_eq!(a.kind, TokenKind::BigInt);
        assert!(matches!(a.value, TokenValue::BigInt { ref digits } if &**digits == "123"));
        let b = lexer.next_token().unwrap();
        assert!(matches!(b.value, TokenValue::BigInt { ref digits } if &**digits == "0xff"));
    }

    #[test]
    fn bigint_rejects_float() {
        let mut lexer = Lexer::new("1.5n");
        assert!(matches!(lexer.next_token(), Err(LexError::InvalidBigInt { .. })));
    }

    #[test]
    fn string_cooking_and_octal_flag() {
        let mut lexer = Lexer::new(r#""a\n\x41B\u{43}" '\07'"#);
        let a = lexer.next_token().unwrap();
        assert!(matches!(
            a.value,
            TokenValue::Str { ref cooked, has_octal_escape: false } if &**cooked == "a\nABC"
        ));
        let b = lexer.next_token().unwrap();
        assert!(matches!(
            b.value,
            TokenValue::Str { ref cooked, has_octal_escape: true } if &**cooked == "\u{7}"
        ));
    }

    #[test]
    fn string_line_continuation() {
        let mut lexer = Lexer::new("\"a\\\nb\"");
        let tok = lexer.next_token().unwrap();
        assert!(matches!(tok.value, TokenValue::Str { ref cooked, .. } if &**cooked == "ab"));
    }

    #[test]
    fn template_chunks() {
        let mut lexer = Lexer::new("`a${x}b`");
        let head = lexer.next_token().unwrap();
        assert_eq!(head.kind, TokenKind::TemplateHead);
        assert!(matches!(
            head.value,
            TokenValue::Template { cooked: Some(ref c), .. } if &**c == "a"
        ));
        let x = lexer.next_token().unwrap();
        assert_eq!(x.kind, TokenKind::Identifier);
        let brace = lexer.next_token().unwrap();
        assert_eq!(brace.kind, TokenKind::RightBrace);
        let tail = lexer.continue_template().unwrap();
        assert_eq!(tail.kind, TokenKind::TemplateTail);
        assert!(matches!(
            tail.value,
            TokenValue::Template { cooked: Some(ref c), .. } if &**c == "b"
        ));
    }

    #[test]
    fn template_invalid_escape_defers() {
        let mut lexer = Lexer::new("`\\u{bad}`");
        let tok = lexer.next_token().unwrap();
        assert_eq!(tok.kind, TokenKind::TemplateNoSub);
        assert!(matches!(tok.value, TokenValue::Template { cooked: None, .. }));
    }

    #[test]
    fn regex_on_demand() {
        let mut lexer = Lexer::new("/ab[/]c/gi");
        let slash = lexer.next_token().unwrap();
        assert_eq!(slash.kind, TokenKind::Slash);
        let re = lexer.read_regex(&slash).unwrap();
        assert_eq!(re.kind, TokenKind::Regex);
        assert!(matches!(
            re.value,
            TokenValue::Regex { ref pattern, ref flags }
                if &**pattern == "ab[/]c" && &**flags == "gi"
        ));
    }

    #[test]
    fn regex_from_slash_assign() {
        let mut lexer = Lexer::new("/=x/");
        let tok = lexer.next_token().unwrap();
        assert_eq!(tok.kind, TokenKind::SlashAssign);
        let re = lexer.read_regex(&tok).unwrap();
        assert!(matches!(
            re.value,
            TokenValue::Regex { ref pattern, .. } if &**pattern == "=x"
        ));
    }

    #[test]
    fn optional_chain_vs_conditional() {
        assert_eq!(
            all_kinds("a?.b"),
            vec![TokenKind::Identifier, TokenKind::QuestionDot, TokenKind::Identifier]
        );
        assert_eq!(
            all_kinds("a?.3:b"),
            vec![
                TokenKind::Identifier,
                TokenKind::Question,
                TokenKind::Number,
                TokenKind::Colon,
                TokenKind::Identifier,
            ]
        );
    }

    #[test]
    fn compound_operators() {
        assert_eq!(
            all_kinds("a >>>= b ??= c ||= d &&= e ** f"),
            vec![
                TokenKind::Identifier,
                TokenKind::UnsignedRightShiftAssign,
                TokenKind::Identifier,
                TokenKind::QuestionQuestionAssign,
                TokenKind::Identifier,
                TokenKind::OrOrAssign,
                TokenKind::Identifier,
                TokenKind::AndAndAssign,
                TokenKind::Identifier,
                TokenKind::StarStar,
                TokenKind::Identifier,
            ]
        );
    }

    #[test]
    fn private_names() {
        let mut lexer = Lexer::new("#count");
        let tok = lexer.next_token().unwrap();
        assert_eq!(tok.kind, TokenKind::PrivateName);
        assert_eq!(tok.name(), "count");
    }

    #[test]
    fn unicode_identifiers() {
        let mut lexer = Lexer::new("π = 1");
        let tok = lexer.next_token().unwrap();
        assert_eq!(tok.kind, TokenKind::Identifier);
        assert_eq!(&*tok.text, "π");
    }

    #[test]
    fn empty_input_is_eof() {
        let mut lexer = Lexer::new("");
        assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Eof);
        assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Eof);
    }
}
