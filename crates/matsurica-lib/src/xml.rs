//! A small pull reader over the parts of a workbook archive.

use std::borrow::Cow;
use std::mem;

use anyhow::Result;
use relative_path::RelativePathBuf;
use xmlparser::{ElementEnd, Token, Tokenizer};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Output<'a> {
    /// An element was opened.
    Open(&'a str),
    /// An attribute of the most recently opened element.
    Attribute(&'a str, &'a str),
    /// Raw text content, entities are not yet decoded.
    Text(&'a str),
    /// The element with the given local name was closed.
    Close(&'a str),
    Eof,
}

pub struct Reader<'a> {
    closed: bool,
    stack: Vec<&'a str>,
    tokenizer: Tokenizer<'a>,
}

impl<'a> Reader<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            closed: false,
            stack: Vec::new(),
            tokenizer: Tokenizer::from(input),
        }
    }

    /// The path of local element names leading to the current position.
    pub fn path(&self) -> RelativePathBuf {
        self.stack.iter().copied().collect()
    }

    /// Read the next output.
    pub fn next(&mut self) -> Result<Output<'a>> {
        loop {
            if mem::take(&mut self.closed) {
                self.stack.pop();
            }

            let Some(token) = self.tokenizer.next() else {
                return Ok(Output::Eof);
            };

            match token? {
                Token::Text { text } => {
                    return Ok(Output::Text(text.as_str()));
                }
                Token::Cdata { text, .. } => {
                    return Ok(Output::Text(text.as_str()));
                }
                Token::ElementStart { local, .. } => {
                    self.stack.push(local.as_str());
                    tracing::trace!(path = ?self.path(), "enter");
                    return Ok(Output::Open(local.as_str()));
                }
                Token::ElementEnd { end, .. } => {
                    let name = match end {
                        ElementEnd::Open => continue,
                        ElementEnd::Close(_, local) => local.as_str(),
                        ElementEnd::Empty => self.stack.last().copied().unwrap_or_default(),
                    };

                    tracing::trace!(path = ?self.path(), "leave");
                    self.closed = true;
                    return Ok(Output::Close(name));
                }
                Token::Attribute { local, value, .. } => {
                    return Ok(Output::Attribute(local.as_str(), value.as_str()));
                }
                _ => {
                    // intentionally ignore declarations, comments and the like.
                }
            }
        }
    }
}

/// Decode the predefined and numeric character references in XML text.
///
/// Unknown or malformed references are kept verbatim.
pub fn unescape(text: &str) -> Cow<'_, str> {
    if !text.contains('&') {
        return Cow::Borrowed(text);
    }

    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(start) = rest.find('&') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];

        let decoded = tail
            .find(';')
            .and_then(|end| Some((decode_reference(&tail[1..end])?, end)));

        match decoded {
            Some((c, end)) => {
                out.push(c);
                rest = &tail[end + 1..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }

    out.push_str(rest);
    Cow::Owned(out)
}

fn decode_reference(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        _ => {
            let number = name.strip_prefix('#')?;

            let code = match number.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => number.parse::<u32>().ok()?,
            };

            char::from_u32(code)
        }
    }
}

/// Escape text for inclusion in element content or attribute values.
pub fn escape(text: &str) -> Cow<'_, str> {
    if !text.contains(['&', '<', '>', '"']) {
        return Cow::Borrowed(text);
    }

    let mut out = String::with_capacity(text.len() + 8);

    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            c => out.push(c),
        }
    }

    Cow::Owned(out)
}

#[test]
fn test_reader() {
    let mut reader = Reader::new(r#"<a x="1"><b/>text</a>"#);
    assert_eq!(reader.next().unwrap(), Output::Open("a"));
    assert_eq!(reader.next().unwrap(), Output::Attribute("x", "1"));
    assert_eq!(reader.next().unwrap(), Output::Open("b"));
    assert_eq!(reader.path().as_str(), "a/b");
    assert_eq!(reader.next().unwrap(), Output::Close("b"));
    assert_eq!(reader.next().unwrap(), Output::Text("text"));
    assert_eq!(reader.path().as_str(), "a");
    assert_eq!(reader.next().unwrap(), Output::Close("a"));
    assert_eq!(reader.next().unwrap(), Output::Eof);
}

#[test]
fn test_unescape() {
    assert_eq!(unescape("plain"), "plain");
    assert_eq!(unescape("a &amp; b &lt;c&gt;"), "a & b <c>");
    assert_eq!(unescape("&#12354;&#x3044;"), "あい");
    assert_eq!(unescape("AT&T &bogus; &"), "AT&T &bogus; &");
}

#[test]
fn test_escape() {
    assert_eq!(escape("plain"), "plain");
    assert_eq!(escape(r#"<a & "b">"#), "&lt;a &amp; &quot;b&quot;&gt;");
}
