use std::borrow::Cow;

use crate::feed::FeedError;

/// A single `name="value"` pair attached to a [`Content`] node.
///
/// Names may carry a prefix (`xmlns:atom`, `xml:lang`). Statics are
/// supported so that default attribute sets can be shared without allocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: Cow<'static, str>,
    pub value: Cow<'static, str>,
    /// Namespace URI for unprefixed names that still belong to a namespace.
    pub namespace: Option<Cow<'static, str>>,
}

impl Attribute {
    pub fn new(name: impl Into<Cow<'static, str>>, value: impl Into<Cow<'static, str>>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            namespace: None,
        }
    }

    /// Const constructor for shared attribute tables.
    pub const fn from_static(name: &'static str, value: &'static str) -> Self {
        Self {
            name: Cow::Borrowed(name),
            value: Cow::Borrowed(value),
            namespace: None,
        }
    }

    pub fn with_namespace(mut self, namespace: impl Into<Cow<'static, str>>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// True for `xmlns` and `xmlns:*` declarations.
    pub fn is_namespace_declaration(&self) -> bool {
        self.name == "xmlns" || self.name.starts_with("xmlns:")
    }
}

/// One node of the format-neutral content tree.
///
/// A node is either a leaf carrying a `value` or a container carrying
/// `fields`. Both formats build these trees from domain objects and then
/// render them; the tree itself knows nothing about RSS or Atom.
///
/// Attribute and field collections start out borrowed (usually from an empty
/// or `'static` default) and switch to an owned copy on the first mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Content {
    name: Cow<'static, str>,
    namespace: Option<String>,
    value: Option<String>,
    attributes: Cow<'static, [Attribute]>,
    fields: Cow<'static, [Content]>,
}

impl Content {
    /// Creates a container node. Fails if `name` is empty.
    pub fn new(name: impl Into<Cow<'static, str>>) -> Result<Self, FeedError> {
        let name = name.into();
        if name.is_empty() {
            return Err(FeedError::missing("name"));
        }
        Ok(Self {
            name,
            namespace: None,
            value: None,
            attributes: Cow::Borrowed(&[]),
            fields: Cow::Borrowed(&[]),
        })
    }

    /// Creates a leaf node holding `value`. Fails if `name` is empty.
    pub fn with_value(
        name: impl Into<Cow<'static, str>>,
        value: impl Into<String>,
    ) -> Result<Self, FeedError> {
        let mut content = Self::new(name)?;
        content.value = Some(value.into());
        Ok(content)
    }

    /// Creates a node whose attributes and fields start as shared slices.
    ///
    /// Nothing is copied until `add_attribute`/`add_field` is called.
    pub fn with_shared(
        name: &'static str,
        attributes: &'static [Attribute],
        fields: &'static [Content],
    ) -> Result<Self, FeedError> {
        let mut content = Self::new(name)?;
        content.attributes = Cow::Borrowed(attributes);
        content.fields = Cow::Borrowed(fields);
        Ok(content)
    }

    /// Infallible constructor for element names known at compile time.
    pub(crate) fn element(name: &'static str) -> Self {
        debug_assert!(!name.is_empty());
        Self {
            name: Cow::Borrowed(name),
            namespace: None,
            value: None,
            attributes: Cow::Borrowed(&[]),
            fields: Cow::Borrowed(&[]),
        }
    }

    pub(crate) fn leaf(name: &'static str, value: impl Into<String>) -> Self {
        let mut content = Self::element(name);
        content.value = Some(value.into());
        content
    }

    pub fn in_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    pub fn set_value(&mut self, value: impl Into<String>) {
        self.value = Some(value.into());
    }

    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    pub fn fields(&self) -> &[Content] {
        &self.fields
    }

    /// First attribute value with the given name.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_ref())
    }

    pub fn add_attribute(&mut self, attribute: Attribute) {
        self.attributes.to_mut().push(attribute);
    }

    pub fn add_field(&mut self, field: Content) {
        self.fields.to_mut().push(field);
    }

    /// Whether the attribute collection is still the shared default.
    pub fn shares_attributes(&self) -> bool {
        matches!(self.attributes, Cow::Borrowed(_))
    }

    /// Whether the field collection is still the shared default.
    pub fn shares_fields(&self) -> bool {
        matches!(self.fields, Cow::Borrowed(_))
    }
}
