use std::string::FromUtf8Error;
use thiserror::Error;

/// Errors raised while building or emitting feed content.
///
/// Validation errors (`MissingField`, `Conflict`, `OutOfRange`, `MissingValue`)
/// are produced while a content tree is constructed, before any bytes reach
/// the output. The remaining variants come from the XML and I/O layers.
#[derive(Debug, Error)]
pub enum FeedError {
    /// A required field was absent or empty.
    #[error("missing required field: {field}")]
    MissingField { field: &'static str },

    /// Two fields were set that cannot appear together.
    #[error("conflicting content: {0}")]
    Conflict(&'static str),

    /// A value was present but outside the permitted range.
    #[error("{field} out of range: {reason}")]
    OutOfRange {
        field: &'static str,
        reason: &'static str,
    },

    /// A value formatted to "absent" where an element value was required.
    #[error("no value to write for element '{name}'")]
    MissingValue { name: String },

    /// An XML or XHTML value was not a well-formed fragment.
    #[error("malformed markup in element value: {0}")]
    MalformedMarkup(&'static str),

    /// Element text could not be converted to the requested type.
    #[error("cannot convert '{value}' to the requested type")]
    InvalidValue { value: String },

    /// A URI could not be parsed or was not absolute.
    #[error("invalid URI: {0}")]
    InvalidUri(#[from] url::ParseError),

    /// A prefixed attribute or element referenced an undeclared prefix.
    #[error("namespace prefix '{prefix}' is not declared")]
    UnboundNamespace { prefix: String },

    /// The XML layer rejected a fragment or event.
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// The output transport failed.
    #[error("write failed: {0}")]
    Io(#[from] std::io::Error),

    /// Rendered bytes were not valid UTF-8.
    #[error("rendered content is not valid UTF-8: {0}")]
    Utf8(#[from] FromUtf8Error),
}

impl FeedError {
    pub(crate) fn missing(field: &'static str) -> Self {
        FeedError::MissingField { field }
    }

    /// True for errors caused by the caller's domain objects rather than the
    /// output stream. Callers generating many items can skip these and continue.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            FeedError::MissingField { .. }
                | FeedError::Conflict(_)
                | FeedError::OutOfRange { .. }
                | FeedError::MissingValue { .. }
                | FeedError::MalformedMarkup(_)
                | FeedError::InvalidUri(_)
        )
    }
}

impl From<quick_xml::events::attributes::AttrError> for FeedError {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        FeedError::Xml(err.into())
    }
}
