//! Display rendering of bound values.
//!
//! Panes show every cell as a string. The rendering is:
//!
//! | value                          | display                |
//! |--------------------------------|------------------------|
//! | named identifier               | `urn:a#x`              |
//! | blank node                     | `_:b0`                 |
//! | literal with language          | `"chat"@fr`            |
//! | literal with non-string type   | `"42"^^<…#integer>`    |
//! | plain / `xsd:string` literal   | `hello`                |
//!
//! [`parse_display`] inverts the literal forms. Plain strings survive a
//! render/parse round trip unless their text mimics one of the other forms.

use crate::term::{Term, RDF_LANG_STRING, XSD_STRING};

/// Render a term for display.
pub fn render_term(term: &Term) -> String {
    match term {
        Term::NamedNode { iri } => iri.clone(),
        Term::BlankNode { id } => format!("_:{id}"),
        Term::Literal {
            value,
            language: Some(language),
            ..
        } => format!("\"{value}\"@{language}"),
        Term::Literal {
            value,
            datatype: Some(datatype),
            ..
        } if datatype != XSD_STRING && datatype != RDF_LANG_STRING => {
            format!("\"{value}\"^^<{datatype}>")
        }
        Term::Literal { value, .. } => value.clone(),
    }
}

/// A display string split back into its parts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayValue<'a> {
    /// Bare text: a plain literal or an identifier.
    Plain(&'a str),
    /// `_:label`
    Blank(&'a str),
    /// `"lexical"@language`
    Tagged { lexical: &'a str, language: &'a str },
    /// `"lexical"^^<datatype>`
    Typed { lexical: &'a str, datatype: &'a str },
}

impl<'a> DisplayValue<'a> {
    /// Lexical part of the value (the label for blank nodes).
    pub fn lexical(&self) -> &'a str {
        match *self {
            DisplayValue::Plain(text) => text,
            DisplayValue::Blank(label) => label,
            DisplayValue::Tagged { lexical, .. } | DisplayValue::Typed { lexical, .. } => lexical,
        }
    }
}

/// Parse a string produced by [`render_term`].
///
/// Plain literals render bare, so the inversion is ambiguous: a plain literal
/// whose text already looks like `_:label`, `"x"@lang` or `"x"^^<type>`
/// parses as that form, not as [`DisplayValue::Plain`]. Only plain strings
/// without those shapes round-trip.
pub fn parse_display(text: &str) -> DisplayValue<'_> {
    if let Some(label) = text.strip_prefix("_:") {
        if !label.is_empty() && !label.chars().any(char::is_whitespace) {
            return DisplayValue::Blank(label);
        }
    }

    if let Some(body) = text.strip_prefix('"') {
        if let Some(inner) = body.strip_suffix('>') {
            if let Some(split) = inner.rfind("\"^^<") {
                return DisplayValue::Typed {
                    lexical: &inner[..split],
                    datatype: &inner[split + 4..],
                };
            }
        }
        if let Some(split) = body.rfind("\"@") {
            let language = &body[split + 2..];
            if is_language_tag(language) {
                return DisplayValue::Tagged {
                    lexical: &body[..split],
                    language,
                };
            }
        }
    }

    DisplayValue::Plain(text)
}

fn is_language_tag(tag: &str) -> bool {
    !tag.is_empty()
        && tag.starts_with(|c: char| c.is_ascii_alphabetic())
        && tag.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
}
