//! Templates and the `${key}` substitution language.
//!
//! A template body is literal text with `${name}` placeholders. A `$` or `}`
//! directly preceded by a backslash loses its special meaning; the backslash
//! is kept in the output. Bodies (and rendered output) must have balanced
//! curly braces.

use std::collections::{BTreeSet, HashMap};

use sha2::{Digest, Sha256};

use crate::domain::errors::{VolumeError, VolumeResult};

/// Path segment under which templates are stored for a name/version.
pub const TEMPLATES_SEGMENT: &str = "templates";

/// Storage key prefix identifying a template entry.
pub const TEMPLATE_KEY_PREFIX: &str = "templates/";

/// Key/value pairs substituted into templates.
pub type Bindings = HashMap<String, String>;

/// A named template body with its content hash and last rendered output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    name: String,
    body: Vec<u8>,
    content_hash: String,
    rendered: Vec<u8>,
}

impl Template {
    pub fn new(name: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        let body = body.into();
        Self {
            name: name.into(),
            content_hash: content_hash(&body),
            rendered: body.clone(),
            body,
        }
    }

    /// Build a template from a `templates/<name>` storage key.
    ///
    /// Returns `None` when the key is not a template key or names nothing.
    pub fn from_storage_key(key: &str, body: impl Into<Vec<u8>>) -> Option<Self> {
        let name = key.strip_prefix(TEMPLATE_KEY_PREFIX)?;
        if name.is_empty() {
            return None;
        }
        Some(Self::new(name, body))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Hex-encoded SHA-256 of the body.
    pub fn content_hash(&self) -> &str {
        &self.content_hash
    }

    /// Output of the last successful render, or the raw body before any render.
    pub fn rendered(&self) -> &[u8] {
        &self.rendered
    }

    /// Storage key relative to `name/version/`.
    pub fn storage_key(&self) -> String {
        format!("{TEMPLATE_KEY_PREFIX}{}", self.name)
    }

    /// Replace the body, recomputing the hash and resetting the render cache.
    pub fn set_body(&mut self, body: impl Into<Vec<u8>>) {
        self.body = body.into();
        self.content_hash = content_hash(&self.body);
        self.rendered = self.body.clone();
    }

    /// Keys referenced by the template's placeholders.
    pub fn keys(&self) -> VolumeResult<BTreeSet<String>> {
        extract_keys(&self.body)
    }

    /// Render against `bindings`, caching the output on success.
    pub fn render(&mut self, bindings: &Bindings) -> VolumeResult<Vec<u8>> {
        let out = render(&self.body, bindings)?;
        self.rendered.clone_from(&out);
        Ok(out)
    }
}

fn content_hash(body: &[u8]) -> String {
    hex::encode(Sha256::digest(body))
}

/// Check that `{` and `}` are balanced.
///
/// A closing brace with no matching opener is rejected as soon as it is seen.
pub fn validate_braces(input: &[u8]) -> VolumeResult<()> {
    let mut depth: usize = 0;
    for (offset, byte) in input.iter().enumerate() {
        match byte {
            b'{' => depth += 1,
            b'}' => {
                if depth == 0 {
                    return Err(VolumeError::UnbalancedBraces(format!(
                        "unexpected '}}' at offset {offset}"
                    )));
                }
                depth -= 1;
            }
            _ => {}
        }
    }

    if depth != 0 {
        return Err(VolumeError::UnbalancedBraces(format!(
            "missing {depth} closing brace(s)"
        )));
    }
    Ok(())
}

/// Collect the names of every `${name}` placeholder in `body`.
pub fn extract_keys(body: &[u8]) -> VolumeResult<BTreeSet<String>> {
    validate_braces(body)?;

    let mut keys = BTreeSet::new();
    scan(body, |segment| {
        if let Segment::Placeholder(name) = segment {
            keys.insert(String::from_utf8_lossy(name).into_owned());
        }
    });
    Ok(keys)
}

/// Substitute placeholders in `body` with values from `bindings`.
///
/// Unknown keys render as empty. Both the body and the rendered output must
/// pass brace validation.
pub fn render(body: &[u8], bindings: &Bindings) -> VolumeResult<Vec<u8>> {
    validate_braces(body)?;

    let mut out = Vec::with_capacity(body.len());
    scan(body, |segment| match segment {
        Segment::Literal(byte) => out.push(byte),
        Segment::Placeholder(name) => {
            let key = String::from_utf8_lossy(name);
            if let Some(value) = bindings.get(key.as_ref()) {
                out.extend_from_slice(value.as_bytes());
            }
        }
    });

    validate_braces(&out)?;
    Ok(out)
}

enum Segment<'a> {
    Literal(u8),
    Placeholder(&'a [u8]),
}

fn scan<'a>(body: &'a [u8], mut visit: impl FnMut(Segment<'a>)) {
    let mut start: Option<usize> = None;
    let mut i = 0;

    while i < body.len() {
        let byte = body[i];
        let escaped = i > 0 && body[i - 1] == b'\\';

        match byte {
            b'$' if !escaped && body.get(i + 1) == Some(&b'{') => {
                start = Some(i + 2);
                i += 2;
                continue;
            }
            b'}' if !escaped => {
                if let Some(from) = start.take() {
                    visit(Segment::Placeholder(&body[from..i]));
                    i += 1;
                    continue;
                }
            }
            _ => {}
        }

        if start.is_none() {
            visit(Segment::Literal(byte));
        }
        i += 1;
    }
}
