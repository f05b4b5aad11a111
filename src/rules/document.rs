//! Profile document parsing.
//!
//! A profile document is the free text shown in the editor: JSON with
//! comments and trailing commas allowed. This module is the boundary between
//! that text and `ForwardConfig`; the compiler never sees raw text.

use thiserror::Error;

use crate::rules::forward::ForwardConfig;

/// Document used for a profile that has never been saved.
pub const DEFAULT_DOCUMENT: &str = r#"{
  // Redirect rules: [match pattern, target]. Use (.*) and $1 to carry paths over.
  // ["https://cdn.example.com/(.*)", "http://127.0.0.1:3000/$1"]
  "proxy": [],

  // Domains whose XHR/websocket responses get permissive CORS headers.
  "cors": []
}
"#;

/// Errors from parsing a profile document.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("Invalid profile document: {0}")]
    Syntax(#[from] serde_json::Error),
}

/// Parse a profile document into a `ForwardConfig`.
pub fn parse_document(text: &str) -> Result<ForwardConfig, DocumentError> {
    let json = strip_trailing_commas(&strip_comments(text));
    Ok(serde_json::from_str(&json)?)
}

/// Remove `//` and `/* */` comments that are outside string literals.
fn strip_comments(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    let mut in_string = false;

    while let Some(c) = chars.next() {
        if in_string {
            out.push(c);
            match c {
                '\\' => {
                    if let Some(escaped) = chars.next() {
                        out.push(escaped);
                    }
                }
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match (c, chars.peek().copied()) {
            ('"', _) => {
                in_string = true;
                out.push(c);
            }
            ('/', Some('/')) => {
                for skipped in chars.by_ref() {
                    if skipped == '\n' {
                        out.push('\n');
                        break;
                    }
                }
            }
            ('/', Some('*')) => {
                chars.next();
                let mut prev = '\0';
                for skipped in chars.by_ref() {
                    if prev == '*' && skipped == '/' {
                        break;
                    }
                    prev = skipped;
                }
                out.push(' ');
            }
            _ => out.push(c),
        }
    }

    out
}

/// Remove commas that directly precede `]` or `}` (ignoring whitespace).
fn strip_trailing_commas(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut in_string = false;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if in_string {
            out.push(c);
            if c == '\\' {
                if let Some(&escaped) = chars.get(i + 1) {
                    out.push(escaped);
                    i += 1;
                }
            } else if c == '"' {
                in_string = false;
            }
        } else if c == '"' {
            in_string = true;
            out.push(c);
        } else if c == ',' {
            let next = chars[i + 1..].iter().copied().find(|n| !n.is_whitespace());
            if !matches!(next, Some(']') | Some('}')) {
                out.push(c);
            }
        } else {
            out.push(c);
        }
        i += 1;
    }

    out
}
