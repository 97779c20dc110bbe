//! Lexical scan for static module specifiers.
//!
//! Enumerates the specifier of every static `import`/`export ... from`
//! declaration and every dynamic `import(...)` whose argument is a string
//! literal. Comments, string literals and template literals are skipped;
//! dynamic imports with non-literal arguments are not reported at all, so
//! downstream passes leave them byte-identical.

/// Location of one module specifier in the scanned text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSpan {
    /// Byte offset of the first byte of the specifier (inside the quotes)
    pub start: usize,
    /// Byte offset one past the last byte of the specifier
    pub end: usize,
    /// The surrounding quote byte (`'` or `"`)
    pub quote: u8,
    /// True for `import(...)` call forms
    pub dynamic: bool,
}

impl ImportSpan {
    /// The specifier text within `source`.
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        &source[self.start..self.end]
    }
}

/// Scan `source` and return every static specifier span in order.
pub fn scan_imports(source: &str) -> Vec<ImportSpan> {
    Scanner::new(source).run()
}

struct Scanner<'a> {
    bytes: &'a [u8],
    pos: usize,
    spans: Vec<ImportSpan>,
}

impl<'a> Scanner<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            bytes: source.as_bytes(),
            pos: 0,
            spans: Vec::new(),
        }
    }

    fn run(mut self) -> Vec<ImportSpan> {
        while self.pos < self.bytes.len() {
            match self.bytes[self.pos] {
                b'/' if self.peek(1) == Some(b'/') => self.skip_line_comment(),
                b'/' if self.peek(1) == Some(b'*') => self.skip_block_comment(),
                b'\'' | b'"' => {
                    let quote = self.bytes[self.pos];
                    self.pos += 1;
                    self.skip_string(quote);
                }
                b'`' => {
                    self.pos += 1;
                    self.skip_template();
                }
                c if is_ident_start(c) => {
                    let word_start = self.pos;
                    let word = self.read_word();
                    // A preceding `.` means property access (`foo.import`).
                    let preceded_by_dot = word_start > 0
                        && self.bytes[..word_start]
                            .iter()
                            .rev()
                            .find(|b| !b.is_ascii_whitespace())
                            == Some(&b'.');
                    if preceded_by_dot {
                        continue;
                    }
                    match word {
                        "import" => self.scan_import_tail(),
                        "export" => self.scan_export_tail(),
                        _ => {}
                    }
                }
                _ => self.pos += 1,
            }
        }
        self.spans
    }

    fn peek(&self, offset: usize) -> Option<u8> {
        self.bytes.get(self.pos + offset).copied()
    }

    fn skip_line_comment(&mut self) {
        while self.pos < self.bytes.len() && self.bytes[self.pos] != b'\n' {
            self.pos += 1;
        }
    }

    fn skip_block_comment(&mut self) {
        self.pos += 2;
        while self.pos + 1 < self.bytes.len() {
            if self.bytes[self.pos] == b'*' && self.bytes[self.pos + 1] == b'/' {
                self.pos += 2;
                return;
            }
            self.pos += 1;
        }
        self.pos = self.bytes.len();
    }

    /// Advance past a string body; `pos` is just after the opening quote.
    /// Returns the byte range of the string contents.
    fn skip_string(&mut self, quote: u8) -> (usize, usize) {
        let start = self.pos;
        while self.pos < self.bytes.len() {
            match self.bytes[self.pos] {
                b'\\' => self.pos += 2,
                c if c == quote => {
                    let end = self.pos;
                    self.pos += 1;
                    return (start, end);
                }
                _ => self.pos += 1,
            }
        }
        (start, self.pos)
    }

    fn skip_template(&mut self) {
        while self.pos < self.bytes.len() {
            match self.bytes[self.pos] {
                b'\\' => self.pos += 2,
                b'`' => {
                    self.pos += 1;
                    return;
                }
                b'$' if self.peek(1) == Some(b'{') => {
                    // Interpolations may nest strings and templates; track
                    // brace depth and recurse into nested literals.
                    self.pos += 2;
                    let mut depth = 1usize;
                    while self.pos < self.bytes.len() && depth > 0 {
                        match self.bytes[self.pos] {
                            b'{' => {
                                depth += 1;
                                self.pos += 1;
                            }
                            b'}' => {
                                depth -= 1;
                                self.pos += 1;
                            }
                            b'\'' | b'"' => {
                                let quote = self.bytes[self.pos];
                                self.pos += 1;
                                self.skip_string(quote);
                            }
                            b'`' => {
                                self.pos += 1;
                                self.skip_template();
                            }
                            _ => self.pos += 1,
                        }
                    }
                }
                _ => self.pos += 1,
            }
        }
    }

    fn read_word(&mut self) -> &'a str {
        let start = self.pos;
        while self.pos < self.bytes.len() && is_ident_continue(self.bytes[self.pos]) {
            self.pos += 1;
        }
        std::str::from_utf8(&self.bytes[start..self.pos]).unwrap_or("")
    }

    fn skip_trivia(&mut self) {
        loop {
            while self.pos < self.bytes.len() && self.bytes[self.pos].is_ascii_whitespace() {
                self.pos += 1;
            }
            if self.bytes[self.pos..].starts_with(b"//") {
                self.skip_line_comment();
            } else if self.bytes[self.pos..].starts_with(b"/*") {
                self.skip_block_comment();
            } else {
                return;
            }
        }
    }

    /// After the `import` keyword.
    fn scan_import_tail(&mut self) {
        self.skip_trivia();
        match self.peek(0) {
            // import.meta
            Some(b'.') => {}
            // import("spec") or import(expr)
            Some(b'(') => {
                self.pos += 1;
                self.skip_trivia();
                match self.peek(0) {
                    Some(q @ (b'\'' | b'"')) => {
                        self.pos += 1;
                        let (start, end) = self.skip_string(q);
                        self.spans.push(ImportSpan {
                            start,
                            end,
                            quote: q,
                            dynamic: true,
                        });
                    }
                    // Non-literal argument: left alone entirely.
                    _ => {}
                }
            }
            // import "spec";
            Some(q @ (b'\'' | b'"')) => {
                self.pos += 1;
                let (start, end) = self.skip_string(q);
                self.spans.push(ImportSpan {
                    start,
                    end,
                    quote: q,
                    dynamic: false,
                });
            }
            // import defaultExport, { named } from "spec";
            Some(_) => self.scan_until_from_specifier(true),
            None => {}
        }
    }

    /// After the `export` keyword: only re-export forms carry a specifier.
    fn scan_export_tail(&mut self) {
        self.skip_trivia();
        // Re-exports start with `*`, `{`, or the TS `type` modifier.
        match self.peek(0) {
            Some(b'*') | Some(b'{') => self.scan_until_from_specifier(false),
            Some(c) if is_ident_start(c) => {
                let checkpoint = self.pos;
                let word = self.read_word();
                if word == "type" {
                    self.scan_until_from_specifier(false);
                } else {
                    self.pos = checkpoint;
                }
            }
            _ => {}
        }
    }

    /// Scan forward to the `from "spec"` clause of the current declaration.
    /// Bails at `;`, `=`, `(` or end of input. For import declarations the
    /// binding list cannot contain a string, so any quote found after `from`
    /// is the specifier.
    fn scan_until_from_specifier(&mut self, is_import: bool) {
        let mut saw_from = false;
        let mut brace_depth = 0usize;
        loop {
            self.skip_trivia();
            match self.peek(0) {
                None | Some(b';') | Some(b'=') => return,
                Some(b'(') if !is_import => return,
                Some(b'{') => {
                    brace_depth += 1;
                    self.pos += 1;
                }
                Some(b'}') => {
                    brace_depth = brace_depth.saturating_sub(1);
                    self.pos += 1;
                }
                Some(q @ (b'\'' | b'"')) => {
                    if saw_from && brace_depth == 0 {
                        self.pos += 1;
                        let (start, end) = self.skip_string(q);
                        self.spans.push(ImportSpan {
                            start,
                            end,
                            quote: q,
                            dynamic: false,
                        });
                        return;
                    }
                    // A string before `from` cannot be a specifier; this is
                    // not a re-export declaration after all.
                    return;
                }
                Some(c) if is_ident_start(c) => {
                    let word = self.read_word();
                    if word == "from" && brace_depth == 0 {
                        saw_from = true;
                    }
                }
                Some(_) => self.pos += 1,
            }
        }
    }
}

fn is_ident_start(c: u8) -> bool {
    c.is_ascii_alphabetic() || c == b'_' || c == b'$'
}

fn is_ident_continue(c: u8) -> bool {
    c.is_ascii_alphanumeric() || c == b'_' || c == b'$'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn specs(source: &str) -> Vec<&str> {
        scan_imports(source)
            .iter()
            .map(|s| s.text(source))
            .collect()
    }

    #[test]
    fn named_and_default_imports() {
        let src = r#"import { SwissApp } from '@swissjs/core';
import App from "./App.uix";
import * as utils from './utils';
"#;
        assert_eq!(specs(src), vec!["@swissjs/core", "./App.uix", "./utils"]);
    }

    #[test]
    fn side_effect_import() {
        assert_eq!(specs(r#"import './styles.css';"#), vec!["./styles.css"]);
    }

    #[test]
    fn dynamic_import_literal_only() {
        let src = r#"
const a = import('@x/y');
const b = import(someVar);
const c = import(`./tmpl-${name}`);
"#;
        assert_eq!(specs(src), vec!["@x/y"]);
    }

    #[test]
    fn reexports_carry_specifiers() {
        let src = r#"
export { thing } from './thing';
export * from "@swissjs/router";
export const notAnImport = "plain string";
"#;
        assert_eq!(specs(src), vec!["./thing", "@swissjs/router"]);
    }

    #[test]
    fn comments_and_strings_are_skipped() {
        let src = r#"
// import nope from 'commented';
/* import nope from "blocked"; */
const s = "import fake from 'inner'";
import real from './real';
"#;
        assert_eq!(specs(src), vec!["./real"]);
    }

    #[test]
    fn template_interpolation_does_not_confuse_scan() {
        // Code inside interpolations is not scanned; the import after the
        // template must still be found.
        let src = "const t = `prefix ${fn('./dyn')} suffix`; import a from './a';";
        assert_eq!(specs(src), vec!["./a"]);
    }

    #[test]
    fn property_access_import_is_ignored() {
        assert_eq!(specs("foo.import('bar'); obj.export;"), Vec::<&str>::new());
    }

    #[test]
    fn quote_byte_is_recorded() {
        let spans = scan_imports(r#"import a from "dq"; import b from 'sq';"#);
        assert_eq!(spans[0].quote, b'"');
        assert_eq!(spans[1].quote, b'\'');
    }

    #[test]
    fn import_meta_is_ignored() {
        assert_eq!(specs("const u = import.meta.url;"), Vec::<&str>::new());
    }
}
