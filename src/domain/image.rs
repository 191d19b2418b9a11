use std::fmt;

const SHORT_ID_LEN: usize = 12;

/// A local image as reported by the runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    pub id: String,
    /// `repository:tag` references; empty for an untagged image.
    pub tags: Vec<String>,
    pub created: Option<String>,
}

impl Image {
    pub fn new(id: impl Into<String>, tags: Vec<String>) -> Self {
        Self {
            id: id.into(),
            tags,
            created: None,
        }
    }

    pub fn is_untagged(&self) -> bool {
        self.tags.is_empty()
    }

    pub fn short_id(&self) -> &str {
        truncate_id(&self.id)
    }

    pub fn has_tag(&self, reference: &str) -> bool {
        self.tags.iter().any(|tag| tag == reference)
    }

    /// True when `id` names this image, with or without the digest prefix.
    pub fn has_id(&self, id: &str) -> bool {
        strip_digest(&self.id) == strip_digest(id)
    }
}

impl fmt::Display for Image {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.tags.first().map(String::as_str).unwrap_or("<untagged>");
        write!(f, "{}[{}]", name, self.short_id())
    }
}

pub fn strip_digest(id: &str) -> &str {
    id.strip_prefix("sha256:").unwrap_or(id)
}

/// Shortened id used in every human-readable listing.
pub fn truncate_id(id: &str) -> &str {
    let id = strip_digest(id);
    match id.char_indices().nth(SHORT_ID_LEN) {
        Some((idx, _)) => &id[..idx],
        None => id,
    }
}

/// Appends the implicit `:latest` to a reference that carries no tag.
pub fn normalize_reference(reference: &str) -> String {
    let name = reference.rsplit('/').next().unwrap_or(reference);
    if name.contains(':') || name.contains('@') {
        reference.to_string()
    } else {
        format!("{reference}:latest")
    }
}
