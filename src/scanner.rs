//! Text preparation for definition lumps: `#include` expansion and comment stripping.
//!
//! The two stages run as separate passes. Include expansion is a single,
//! non-recursive pass: the text of an included lump is copied in verbatim, so
//! `#include` directives inside it stay untouched. Comment stripping runs
//! afterwards over the merged text.

use std::iter::Peekable;
use std::str::Chars;

use crate::IncludeProvider;

#[derive(Clone)]
struct LocationTracking<I> {
    iter: I,
    line: u32,
}

impl<I> Iterator for LocationTracking<I>
where
    I: Iterator<Item = char>,
{
    type Item = (u32, <I as Iterator>::Item);

    #[inline]
    fn next(&mut self) -> Option<(u32, <I as Iterator>::Item)> {
        self.iter.next().map(|a| {
            let nl = a == '\n';
            let ret = (self.line, a);
            if nl {
                self.line += 1;
            }
            ret
        })
    }
}

enum Mode<'b> {
    ExpandIncludes(&'b mut dyn IncludeProvider),
    StripComments,
}

struct Scanner<'a, 'b> {
    mode: Mode<'b>,
    input_iter: Peekable<LocationTracking<Chars<'a>>>,
    output: String,
}

/// Replace every `#include "X"` directive with the text of `X`.
///
/// Names are resolved through `include_provider`. An include that cannot be
/// resolved or read is logged and dropped; a directive without a quoted or
/// bracketed name is left in place.
pub fn expand_includes(input: &str, include_provider: &mut dyn IncludeProvider) -> String {
    let mut scanner = Scanner::new(input, Mode::ExpandIncludes(include_provider));
    scanner.process_input();
    scanner.output
}

/// Remove `/* block */` and `// line` comments.
///
/// Block comments are replaced by whitespace of the same shape, so line
/// numbers in the stripped text match the input. Line comments are removed up
/// to, but not including, the newline.
pub fn strip_comments(input: &str) -> String {
    let mut scanner = Scanner::new(input, Mode::StripComments);
    scanner.process_input();
    scanner.output
}

impl<'a, 'b> Scanner<'a, 'b> {
    fn new(input: &'a str, mode: Mode<'b>) -> Scanner<'a, 'b> {
        Scanner {
            mode,
            input_iter: LocationTracking {
                iter: input.chars(),
                line: 1,
            }
            .peekable(),
            output: String::with_capacity(input.len()),
        }
    }

    fn read_char(&mut self) -> Option<(u32, char)> {
        self.input_iter.next()
    }

    fn peek_char(&mut self) -> Option<&(u32, char)> {
        self.input_iter.peek()
    }

    fn skip_whitespace_until_eol(&mut self) {
        while let Some(&(_, c)) = self.peek_char() {
            if c != '\n' && c.is_whitespace() {
                let _ = self.read_char();
            } else {
                break;
            }
        }
    }

    /// Only an escaped closing delimiter is unescaped. Other backslashes are
    /// kept, since lump names may use them as path separators.
    fn read_string(&mut self, right_delim: char) -> Option<String> {
        let mut s = String::new();

        while let Some(&(_, c)) = self.peek_char() {
            if c == '\n' {
                break;
            } else if c == '\\' {
                let _ = self.read_char();
                if let Some(&(_, next)) = self.peek_char() {
                    if next == right_delim {
                        let _ = self.read_char();
                        s.push(next);
                        continue;
                    }
                }
                s.push(c);
            } else if c == right_delim {
                let _ = self.read_char();
                return Some(s);
            } else {
                s.push(c);
                let _ = self.read_char();
            }
        }

        None
    }

    fn skip_block_comment(&mut self) {
        while let Some((_, c)) = self.read_char() {
            if c == '*' {
                self.output.push(' ');
                if let Some(&(_, '/')) = self.peek_char() {
                    let _ = self.read_char();
                    self.output.push(' ');
                    break;
                }
            } else if c == '\n' {
                self.output.push('\n');
            } else {
                self.output.push(' ');
            }
        }
    }

    fn skip_line(&mut self) {
        while let Some(&(_, c)) = self.peek_char() {
            if c == '\n' {
                break;
            }
            let _ = self.read_char();
        }
    }

    fn peek_preprocessor_ident(&mut self) -> (String, Peekable<LocationTracking<Chars<'a>>>) {
        let mut token = String::new();
        let mut it = self.input_iter.clone();

        while let Some(&(_, c)) = it.peek() {
            if c.is_alphabetic() {
                let _ = it.next();
                token.push(c);
            } else if token.is_empty() && c != '\n' && c.is_whitespace() {
                let _ = it.next();
            } else {
                break;
            }
        }

        (token, it)
    }

    fn include_child(&mut self, path: &str, line: u32) {
        let provider = match &mut self.mode {
            Mode::ExpandIncludes(provider) => provider,
            Mode::StripComments => return,
        };

        let child_code = provider
            .resolve_path(path)
            .and_then(|resolved| provider.get_include(&resolved));

        match child_code {
            Ok(child_code) => {
                log::debug!("expanded include {:?} on line {}", path, line);
                self.output.push_str(&child_code);
            }
            Err(err) => {
                log::warn!("skipping include {:?} on line {}: {}", path, line, err);
            }
        }
    }

    fn try_include_directive(&mut self, line: u32) -> bool {
        let rewind = self.input_iter.clone();

        let (ident, it) = self.peek_preprocessor_ident();
        if !ident.eq_ignore_ascii_case("include") {
            return false;
        }

        self.input_iter = it;
        self.skip_whitespace_until_eol();

        let right_delim = match self.read_char() {
            Some((_, '"')) => Some('"'),
            Some((_, '<')) => Some('>'),
            _ => None,
        };

        match right_delim.and_then(|delim| self.read_string(delim)) {
            Some(path) => {
                self.include_child(&path, line);
                true
            }
            None => {
                log::warn!("malformed #include directive on line {}", line);
                self.input_iter = rewind;
                false
            }
        }
    }

    fn process_input(&mut self) {
        let strip_comments = matches!(self.mode, Mode::StripComments);

        while let Some((c_line, c)) = self.read_char() {
            match c {
                '/' if strip_comments => {
                    let next = self.peek_char();

                    if let Some(&(_, '*')) = next {
                        let _ = self.read_char();
                        self.output.push_str("  ");
                        self.skip_block_comment();
                    } else if let Some(&(_, '/')) = next {
                        let _ = self.read_char();
                        self.skip_line();
                    } else {
                        self.output.push(c);
                    }
                }
                '#' if !strip_comments => {
                    if !self.try_include_directive(c_line) {
                        self.output.push(c);
                    }
                }
                _ => {
                    self.output.push(c);
                }
            }
        }
    }
}
