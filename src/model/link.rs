use std::fmt;
use std::str::FromStr;

use crate::model::Timestamp;

/// The structural role of a [`Link`].
///
/// The role selects which element each format produces. `None` on a link
/// means "unset", which both formats treat like `Alternate` except that Atom
/// omits the `rel` attribute.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LinkRel {
    Alternate,
    /// Atom out-of-line content (`<content src=...>`).
    Content,
    /// Atom `<source>` or RSS `<source>`.
    Source,
    /// RSS media attachment.
    Enclosure,
    /// RSS comments page.
    Comments,
    /// RSS item guid taken from a link instead of the item id.
    Guid,
    /// Any other relation, rendered as an element (RSS) or `rel` (Atom).
    Custom(String),
}

impl LinkRel {
    pub fn as_str(&self) -> &str {
        match self {
            LinkRel::Alternate => "alternate",
            LinkRel::Content => "content",
            LinkRel::Source => "source",
            LinkRel::Enclosure => "enclosure",
            LinkRel::Comments => "comments",
            LinkRel::Guid => "guid",
            LinkRel::Custom(rel) => rel,
        }
    }
}

impl FromStr for LinkRel {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "alternate" => LinkRel::Alternate,
            "content" => LinkRel::Content,
            "source" => LinkRel::Source,
            "enclosure" => LinkRel::Enclosure,
            "comments" => LinkRel::Comments,
            "guid" => LinkRel::Guid,
            other => LinkRel::Custom(other.to_string()),
        })
    }
}

impl fmt::Display for LinkRel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A hyperlink attached to an item, image or channel.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Link {
    /// Target URI. Relative references are allowed; an empty URI is rejected
    /// by both formats.
    pub uri: String,
    pub title: Option<String>,
    pub media_type: Option<String>,
    pub rel: Option<LinkRel>,
    /// Size in bytes, 0 when unknown.
    pub length: u64,
    pub last_updated: Option<Timestamp>,
}

impl Link {
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            ..Self::default()
        }
    }

    pub fn with_rel(uri: impl Into<String>, rel: LinkRel) -> Self {
        Self {
            uri: uri.into(),
            rel: Some(rel),
            ..Self::default()
        }
    }

    /// True when the link is the default "view this item" link.
    pub fn is_alternate(&self) -> bool {
        matches!(self.rel, None | Some(LinkRel::Alternate))
    }

    pub(crate) fn has_rel(&self, rel: &LinkRel) -> bool {
        self.rel.as_ref() == Some(rel)
    }
}
