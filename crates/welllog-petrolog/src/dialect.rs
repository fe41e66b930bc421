//! The tag dialect shared by `.header` and `.wellheader` documents.
//!
//! This is a small subset of XML: nested elements with text content,
//! self-closing elements, the five predefined entities and `CDATA`
//! sections. Attributes are accepted but ignored. The `<?...?>` prolog,
//! comments and `<!DOCTYPE>` are skipped.

use crate::error::{PetrologError, Result};

/// Prolog written at the top of every serialised document.
pub const PROLOG: &str = r#"<?xml version="1.0" encoding="utf-8"?>"#;

/// Nesting limit; real documents nest four levels at most.
const MAX_DEPTH: usize = 64;

const INDENT: &str = "  ";

/// One element with its trimmed text content and child elements.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    pub text: String,
    pub children: Vec<Element>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// A leaf element holding `text`.
    pub fn leaf(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
            children: Vec::new(),
        }
    }

    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }

    pub fn push(&mut self, child: Element) -> &mut Self {
        self.children.push(child);
        self
    }

    /// Append a leaf child.
    pub fn push_leaf(&mut self, name: &str, text: impl Into<String>) -> &mut Self {
        self.push(Element::leaf(name, text))
    }

    /// First child named `name`.
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == name)
    }

    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// Text of the first child named `name`.
    pub fn child_text(&self, name: &str) -> Option<&str> {
        self.child(name).map(|c| c.text.as_str())
    }

    /// Serialise as a complete document with prolog and two-space indentation.
    pub fn to_document(&self) -> String {
        let mut out = String::with_capacity(256);
        out.push_str(PROLOG);
        out.push('\n');
        self.write_into(&mut out, 0);
        out
    }

    fn write_into(&self, out: &mut String, depth: usize) {
        let indent = INDENT.repeat(depth);
        out.push_str(&indent);
        if self.children.is_empty() {
            if self.text.is_empty() {
                out.push_str(&format!("<{}/>\n", self.name));
            } else {
                out.push_str(&format!("<{0}>{1}</{0}>\n", self.name, escape(&self.text)));
            }
            return;
        }

        out.push_str(&format!("<{}>", self.name));
        out.push_str(&escape(&self.text));
        out.push('\n');
        for child in &self.children {
            child.write_into(out, depth + 1);
        }
        out.push_str(&indent);
        out.push_str(&format!("</{}>\n", self.name));
    }
}

/// Parse a document and return its root element.
pub fn parse(text: &str) -> Result<Element> {
    let mut parser = Parser { src: text, pos: 0 };
    parser.skip_misc()?;
    if parser.at_end() {
        return Err(parser.error("document has no root element"));
    }
    let root = parser.element(0)?;
    parser.skip_misc()?;
    if !parser.at_end() {
        return Err(parser.error("content after the root element"));
    }
    Ok(root)
}

/// Escape text content.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
    out
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn at_end(&self) -> bool {
        self.pos >= self.src.len()
    }

    fn error(&self, reason: impl Into<String>) -> PetrologError {
        PetrologError::Dialect {
            position: self.pos,
            reason: reason.into(),
        }
    }

    fn skip_whitespace(&mut self) {
        let rest = self.rest();
        self.pos += rest.len() - rest.trim_start().len();
    }

    /// Advance past the next occurrence of `terminator`.
    fn skip_past(&mut self, terminator: &str, what: &str) -> Result<()> {
        match self.rest().find(terminator) {
            Some(i) => {
                self.pos += i + terminator.len();
                Ok(())
            }
            None => Err(self.error(format!("unterminated {what}"))),
        }
    }

    /// Skip whitespace, prologs, comments and doctype declarations.
    fn skip_misc(&mut self) -> Result<()> {
        loop {
            self.skip_whitespace();
            let rest = self.rest();
            if rest.starts_with("<?") {
                self.skip_past("?>", "processing instruction")?;
            } else if rest.starts_with("<!--") {
                self.skip_past("-->", "comment")?;
            } else if rest.starts_with("<!") {
                self.skip_past(">", "declaration")?;
            } else {
                return Ok(());
            }
        }
    }

    fn name(&mut self) -> Result<&'a str> {
        let rest = self.rest();
        let len = rest
            .find(|c: char| c.is_whitespace() || c == '>' || c == '/')
            .unwrap_or(rest.len());
        if len == 0 {
            return Err(self.error("expected an element name"));
        }
        self.pos += len;
        Ok(&rest[..len])
    }

    /// Skip attributes up to the end of the start tag. Returns true for `/>`.
    fn end_of_start_tag(&mut self) -> Result<bool> {
        let mut quote: Option<char> = None;
        for (i, ch) in self.rest().char_indices() {
            match (quote, ch) {
                (Some(q), c) if c == q => quote = None,
                (Some(_), _) => {}
                (None, '"') | (None, '\'') => quote = Some(ch),
                (None, '>') => {
                    let self_closing = self.rest()[..i].trim_end().ends_with('/');
                    self.pos += i + 1;
                    return Ok(self_closing);
                }
                (None, '<') => return Err(self.error("'<' inside a start tag")),
                _ => {}
            }
        }
        Err(self.error("unterminated start tag"))
    }

    fn element(&mut self, depth: usize) -> Result<Element> {
        if depth > MAX_DEPTH {
            return Err(self.error("elements nested too deeply"));
        }
        if !self.rest().starts_with('<') {
            return Err(self.error("expected '<'"));
        }
        self.pos += 1;
        let name = self.name()?;
        let mut element = Element::new(name);
        if self.end_of_start_tag()? {
            return Ok(element);
        }

        let mut text = String::new();
        loop {
            let rest = self.rest();
            let Some(lt) = rest.find('<') else {
                return Err(self.error(format!("missing </{name}>")));
            };
            text.push_str(&self.unescape(&rest[..lt])?);
            self.pos += lt;

            let rest = self.rest();
            if let Some(after) = rest.strip_prefix("</") {
                let close_len = after.find('>').ok_or_else(|| self.error("unterminated end tag"))?;
                let closing = after[..close_len].trim();
                if closing != name {
                    return Err(self.error(format!("expected </{name}>, found </{closing}>")));
                }
                self.pos += 2 + close_len + 1;
                break;
            } else if rest.starts_with("<!--") {
                self.skip_past("-->", "comment")?;
            } else if let Some(after) = rest.strip_prefix("<![CDATA[") {
                let end = after.find("]]>").ok_or_else(|| self.error("unterminated CDATA"))?;
                text.push_str(&after[..end]);
                self.pos += "<![CDATA[".len() + end + "]]>".len();
            } else if rest.starts_with("<?") {
                self.skip_past("?>", "processing instruction")?;
            } else {
                element.children.push(self.element(depth + 1)?);
            }
        }

        element.text = text.trim().to_string();
        Ok(element)
    }

    fn unescape(&self, raw: &str) -> Result<String> {
        if !raw.contains('&') {
            return Ok(raw.to_string());
        }
        let mut out = String::with_capacity(raw.len());
        let mut rest = raw;
        while let Some(amp) = rest.find('&') {
            out.push_str(&rest[..amp]);
            let tail = &rest[amp..];
            let semi = tail
                .find(';')
                .ok_or_else(|| self.error("unterminated entity reference"))?;
            let entity = &tail[1..semi];
            match entity {
                "lt" => out.push('<'),
                "gt" => out.push('>'),
                "amp" => out.push('&'),
                "quot" => out.push('"'),
                "apos" => out.push('\''),
                _ => match char_reference(entity) {
                    Some(ch) => out.push(ch),
                    None => return Err(self.error(format!("unknown entity &{entity};"))),
                },
            }
            rest = &tail[semi + 1..];
        }
        out.push_str(rest);
        Ok(out)
    }
}

/// `#65` or `#x41` style numeric references.
fn char_reference(entity: &str) -> Option<char> {
    let digits = entity.strip_prefix('#')?;
    let code = match digits.strip_prefix('x').or_else(|| digits.strip_prefix('X')) {
        Some(hex) => u32::from_str_radix(hex, 16).ok()?,
        None => digits.parse().ok()?,
    };
    char::from_u32(code)
}
