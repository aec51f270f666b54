//! Single-token lookahead over the lexer.
//!
//! The buffer is the only component that talks to the scanner. It swallows
//! comment tokens (recording them when asked to), accumulates line-terminator
//! information into the `newline_before` flag of the next real token, and
//! exposes the handful of primitives the grammar needs: `peek`, `consume`,
//! `match_kind`, `must_match`, and `peek_or_eol` for the restricted
//! productions that refuse a line break.
//!
//! Exactly one token of lookahead is held. The regex and template re-entry
//! points depend on that: they hand the peeked token back to the lexer for
//! re-scanning, which is only sound while nothing beyond it has been read.

use crate::Comment;
use ecma_error::{ParseError, ParseResult};
use ecma_lexer::Lexer;
use ecma_token::{CommentKind, Token, TokenKind, TokenValue};

pub struct TokenBuffer<'a> {
    lexer: Lexer<'a>,
    peeked: Option<Token>,
    /// Line terminators seen while skipping comments, folded into the next
    /// real token
    eol_pending: bool,
    /// End position of the last consumed token; statements end here
    last_end: usize,
    last_line: u32,
    record_comments: bool,
    comments: Vec<Comment>,
    /// Most recent jsdoc comment, waiting for the next declaration
    pending_jsdoc: Option<Box<str>>,
}

impl<'a> TokenBuffer<'a> {
    pub fn new(source: &'a str, start_line: u32, record_comments: bool) -> Self {
        TokenBuffer {
            lexer: Lexer::with_start_line(source, start_line),
            peeked: None,
            eol_pending: false,
            last_end: 0,
            last_line: start_line.max(1),
            record_comments,
            comments: Vec::new(),
            pending_jsdoc: None,
        }
    }

    /// Turn off Annex-B HTML comments (module sources).
    pub fn set_html_comments(&mut self, enabled: bool) {
        self.lexer.set_html_comments(enabled);
    }

    /// End offset of the most recently consumed token.
    pub fn last_end(&self) -> usize {
        self.last_end
    }

    pub fn last_line(&self) -> u32 {
        self.last_line
    }

    fn fill(&mut self) -> ParseResult<()> {
        while self.peeked.is_none() {
            let mut tok = self.lexer.next_token()?;
            if tok.kind == TokenKind::Comment {
                if tok.newline_before {
                    self.eol_pending = true;
                }
                if let TokenValue::Comment { kind, multiline } = tok.value {
                    if multiline {
                        self.eol_pending = true;
                    }
                    if self.record_comments {
                        if kind == CommentKind::JsDoc {
                            self.pending_jsdoc = Some(Box::from(&*tok.text));
                        }
                        self.comments.push(Comment {
                            span: ecma_ast::Span::new(tok.start, tok.end, tok.line, tok.column),
                            kind,
                            text: tok.text.to_string(),
                        });
                    }
                }
                continue;
            }
            if self.eol_pending {
                tok.newline_before = true;
                self.eol_pending = false;
            }
            self.peeked = Some(tok);
        }
        Ok(())
    }

    /// Look at the next token without consuming it.
    pub fn peek(&mut self) -> ParseResult<&Token> {
        self.fill()?;
        match self.peeked.as_ref() {
            Some(tok) => Ok(tok),
            // fill() always leaves a token behind
            None => Err(ParseError::Syntax {
                message: "token buffer exhausted".into(),
                offset: self.last_end,
                line: self.last_line,
                column: 0,
            }),
        }
    }

    /// Kind of the next token.
    pub fn peek_kind(&mut self) -> ParseResult<TokenKind> {
        Ok(self.peek()?.kind)
    }

    /// Kind of the next token, or the synthetic `Eol` kind when the token
    /// sits on a fresh line. Grammar points that forbid a line terminator
    /// consult this instead of `peek_kind`.
    pub fn peek_or_eol(&mut self) -> ParseResult<TokenKind> {
        let tok = self.peek()?;
        if tok.newline_before {
            Ok(TokenKind::Eol)
        } else {
            Ok(tok.kind)
        }
    }

    /// True when the next token begins on a new line.
    pub fn peek_newline_before(&mut self) -> ParseResult<bool> {
        Ok(self.peek()?.newline_before)
    }

    /// Consume and return the next token.
    pub fn consume(&mut self) -> ParseResult<Token> {
        self.fill()?;
        match self.peeked.take() {
            Some(tok) => {
                self.last_end = tok.end;
                self.last_line = tok.line;
                Ok(tok)
            }
            None => Err(ParseError::Syntax {
                message: "token buffer exhausted".into(),
                offset: self.last_end,
                line: self.last_line,
                column: 0,
            }),
        }
    }

    /// Consume the next token if it has the expected kind.
    pub fn match_kind(&mut self, kind: TokenKind) -> ParseResult<bool> {
        if self.peek_kind()? == kind {
            self.consume()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Re-scan the peeked `/` or `/=` as a regular expression literal and
    /// leave it as the lookahead.
    pub fn regex_token(&mut self) -> ParseResult<()> {
        self.fill()?;
        let Some(tok) = self.peeked.take() else {
            return Ok(());
        };
        debug_assert!(matches!(tok.kind, TokenKind::Slash | TokenKind::SlashAssign));
        let regex = self.lexer.read_regex(&tok)?;
        self.peeked = Some(regex);
        Ok(())
    }

    /// Drop the peeked `}` and rescan from it as a template continuation,
    /// leaving the chunk token as the lookahead.
    pub fn template_continue(&mut self) -> ParseResult<()> {
        self.fill()?;
        let Some(tok) = self.peeked.take() else {
            return Ok(());
        };
        debug_assert_eq!(tok.kind, TokenKind::RightBrace);
        let chunk = self.lexer.continue_template()?;
        self.peeked = Some(chunk);
        Ok(())
    }

    /// Take the jsdoc comment waiting for the next declaration, if any.
    pub fn take_jsdoc(&mut self) -> Option<Box<str>> {
        self.pending_jsdoc.take()
    }

    /// Hand over the recorded comments.
    pub fn take_comments(&mut self) -> Vec<Comment> {
        std::mem::take(&mut self.comments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comments_are_swallowed_and_fold_newlines() {
        let mut buf = TokenBuffer::new("a // trailing\nb", 1, true);
        let a = buf.consume().unwrap();
        assert_eq!(a.kind, TokenKind::Identifier);
        let b = buf.consume().unwrap();
        assert_eq!(b.kind, TokenKind::Identifier);
        assert!(b.newline_before);
        assert_eq!(buf.take_comments().len(), 1);
    }

    #[test]
    fn peek_or_eol_reports_line_breaks() {
        let mut buf = TokenBuffer::new("a\n++", 1, false);
        buf.consume().unwrap();
        assert_eq!(buf.peek_or_eol().unwrap(), TokenKind::Eol);
        assert_eq!(buf.peek_kind().unwrap(), TokenKind::Increment);
    }

    #[test]
    fn jsdoc_is_retained_for_attachment() {
        let mut buf = TokenBuffer::new("/** docs */ function", 1, true);
        assert_eq!(buf.peek_kind().unwrap(), TokenKind::Function);
        let doc = buf.take_jsdoc().expect("jsdoc");
        assert!(doc.contains("docs"));
    }

    #[test]
    fn regex_rescan_replaces_lookahead() {
        let mut buf = TokenBuffer::new("/x/g", 1, false);
        assert_eq!(buf.peek_kind().unwrap(), TokenKind::Slash);
        buf.regex_token().unwrap();
        assert_eq!(buf.peek_kind().unwrap(), TokenKind::Regex);
    }
}
