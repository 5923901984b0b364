use quick_xml::escape::partial_escape;
use quick_xml::events::{BytesCData, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use crate::feed::FeedError;
use crate::model::{Attribute, Content};

pub const XHTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";

/// Text needs escaping if it contains markup characters or characters
/// outside the Basic Multilingual Plane (surrogate pairs in UTF-16).
pub fn needs_escape(value: &str) -> bool {
    value
        .chars()
        .any(|ch| matches!(ch, '<' | '>' | '&') || ch.len_utf16() == 2)
}

/// `xml`, `*/xml` and `*+xml` media types.
pub fn is_xml_media_type(value: Option<&str>) -> bool {
    value.is_some_and(|v| v == "xml" || v.ends_with("/xml") || v.ends_with("+xml"))
}

pub fn is_xhtml_media_type(value: Option<&str>) -> bool {
    value == Some("xhtml")
}

/// Splits `prefix:local` into its parts.
pub fn split_name(name: &str) -> (Option<&str>, &str) {
    match name.find(':') {
        Some(i) if i > 0 => (Some(&name[..i]), &name[i + 1..]),
        _ => (None, name),
    }
}

/// Splits text into CDATA-safe pieces; `]]>` is broken across two sections.
fn cdata_sections(text: &str) -> Vec<&str> {
    let mut sections = Vec::new();
    let mut rest = text;
    while let Some(i) = rest.find("]]>") {
        sections.push(&rest[..i + 2]);
        rest = &rest[i + 2..];
    }
    sections.push(rest);
    sections
}

/// Prefix bindings visible at the current point of a forward-only write.
///
/// Bindings declared before any frame is pushed form the root scope and
/// survive every render. Each element pushes a frame; its declarations are
/// dropped when the element closes.
#[derive(Debug, Default)]
pub struct NamespaceScope {
    bindings: Vec<(Option<String>, String)>,
    frames: Vec<usize>,
}

impl NamespaceScope {
    pub fn declare(&mut self, prefix: Option<&str>, uri: &str) {
        self.bindings
            .push((prefix.map(str::to_string), uri.to_string()));
    }

    /// URI bound to `prefix` (`None` = default namespace).
    pub fn lookup_uri(&self, prefix: Option<&str>) -> Option<&str> {
        self.bindings
            .iter()
            .rev()
            .find(|(p, _)| p.as_deref() == prefix)
            .map(|(_, uri)| uri.as_str())
    }

    /// Prefix currently bound to `uri`. `Some(None)` means the default namespace.
    pub fn lookup_prefix(&self, uri: &str) -> Option<Option<&str>> {
        self.bindings
            .iter()
            .rev()
            .filter(|(_, u)| u == uri)
            .map(|(p, _)| p.as_deref())
            .find(|p| self.lookup_uri(*p) == Some(uri))
    }

    pub fn default_namespace(&self) -> Option<&str> {
        self.lookup_uri(None).filter(|uri| !uri.is_empty())
    }

    fn push(&mut self) {
        self.frames.push(self.bindings.len());
    }

    fn pop(&mut self) {
        if let Some(len) = self.frames.pop() {
            self.bindings.truncate(len);
        }
    }

    /// Drops every frame, keeping only root bindings.
    fn reset(&mut self) {
        if let Some(&len) = self.frames.first() {
            self.bindings.truncate(len);
        }
        self.frames.clear();
    }
}

/// How a leaf node's value is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueMode {
    /// Escaped text, or CDATA when enabled and needed.
    Text,
    /// Parsed markup wrapped in an XHTML `<div>`.
    Xhtml,
    /// Parsed markup written as-is, outside the surrounding default namespace.
    Xml,
}

/// Chooses the value mode for a node given its `type` attribute.
pub type ValueModeFn = fn(&Content, Option<&str>) -> ValueMode;

/// Renders content trees into standalone XML fragment strings.
///
/// One writer owns one buffer; every [`render`](Self::render) drains it,
/// whether or not rendering succeeded.
pub struct FragmentWriter {
    writer: Writer<Vec<u8>>,
    scope: NamespaceScope,
    use_cdata: bool,
}

impl FragmentWriter {
    /// Creates a writer and primes it with `known_attributes`.
    pub fn new(known_attributes: &[Attribute]) -> Result<Self, FeedError> {
        let mut fragment_writer = Self::default();
        fragment_writer.prime_namespaces(known_attributes)?;
        Ok(fragment_writer)
    }

    pub fn set_use_cdata(&mut self, use_cdata: bool) {
        self.use_cdata = use_cdata;
    }

    pub fn use_cdata(&self) -> bool {
        self.use_cdata
    }

    pub fn scope(&self) -> &NamespaceScope {
        &self.scope
    }

    /// One-time setup: establishes the namespace bindings of `attributes` as
    /// the root scope, so fragments rendered later can use those prefixes
    /// without redeclaring them.
    ///
    /// The declarations are written on a throwaway `<w>` wrapper holding a
    /// placeholder `<y/>`, and the bytes are then discarded. Only the
    /// resulting scope is kept; the wrapper never appears in output.
    fn prime_namespaces(&mut self, attributes: &[Attribute]) -> Result<(), FeedError> {
        if attributes.is_empty() {
            return Ok(());
        }

        let mut wrapper = BytesStart::new("w");
        for attribute in attributes {
            if attribute.is_namespace_declaration() {
                let (_, local) = split_name(&attribute.name);
                let prefix = (attribute.name != "xmlns").then_some(local);
                self.scope.declare(prefix, &attribute.value);
            }
            wrapper.push_attribute((attribute.name.as_ref(), attribute.value.as_ref()));
        }

        self.writer.write_event(Event::Start(wrapper))?;
        self.writer.write_event(Event::Empty(BytesStart::new("y")))?;
        self.writer.get_mut().clear();

        tracing::debug!(
            declarations = attributes.len(),
            default_ns = self.scope.default_namespace().unwrap_or(""),
            "Primed formatter namespace scope"
        );
        Ok(())
    }

    /// Renders `content` to a fragment string.
    ///
    /// Elements without an explicit namespace are placed in `default_ns`.
    pub fn render(
        &mut self,
        content: &Content,
        default_ns: Option<&str>,
        value_mode: ValueModeFn,
    ) -> Result<String, FeedError> {
        let result = self.write_content(content, default_ns, value_mode);
        let bytes = std::mem::take(self.writer.get_mut());
        self.scope.reset();
        result?;
        Ok(String::from_utf8(bytes)?)
    }

    fn write_content(
        &mut self,
        content: &Content,
        default_ns: Option<&str>,
        value_mode: ValueModeFn,
    ) -> Result<(), FeedError> {
        let (qname, start) = self.start_element(content, default_ns)?;

        match content.value() {
            Some(value) => {
                self.writer.write_event(Event::Start(start))?;
                match value_mode(content, content.attribute("type")) {
                    ValueMode::Text => self.write_text(value)?,
                    ValueMode::Xhtml => self.write_xhtml(value)?,
                    ValueMode::Xml => self.write_xml_fragment(value, "")?,
                }
                self.writer.write_event(Event::End(BytesEnd::new(qname)))?;
            }
            None if content.fields().is_empty() => {
                self.writer.write_event(Event::Empty(start))?;
            }
            None => {
                self.writer.write_event(Event::Start(start))?;
                for field in content.fields() {
                    self.write_content(field, default_ns, value_mode)?;
                }
                self.writer.write_event(Event::End(BytesEnd::new(qname)))?;
            }
        }

        self.scope.pop();
        Ok(())
    }

    /// Opens a scope frame and builds the start tag, adding namespace
    /// declarations only where the current scope does not already bind them.
    fn start_element(
        &mut self,
        content: &Content,
        default_ns: Option<&str>,
    ) -> Result<(String, BytesStart<'static>), FeedError> {
        self.scope.push();

        for attribute in content.attributes() {
            if attribute.is_namespace_declaration() {
                let (_, local) = split_name(&attribute.name);
                let prefix = (attribute.name != "xmlns").then_some(local);
                self.scope.declare(prefix, &attribute.value);
            }
        }

        let mut declarations: Vec<(String, String)> = Vec::new();
        let (prefix, local) = split_name(content.name());
        let qname = match content.namespace().or(default_ns) {
            None => content.name().to_string(),
            Some(ns) => match prefix {
                Some(prefix) => {
                    if self.scope.lookup_uri(Some(prefix)) != Some(ns) {
                        declarations.push((format!("xmlns:{prefix}"), ns.to_string()));
                        self.scope.declare(Some(prefix), ns);
                    }
                    content.name().to_string()
                }
                None => match self.scope.lookup_prefix(ns) {
                    Some(None) => local.to_string(),
                    Some(Some(bound)) => format!("{bound}:{local}"),
                    None => {
                        declarations.push(("xmlns".to_string(), ns.to_string()));
                        self.scope.declare(None, ns);
                        local.to_string()
                    }
                },
            },
        };

        let mut attributes: Vec<(String, &str)> = Vec::with_capacity(content.attributes().len());
        for attribute in content.attributes() {
            let name = self.attribute_name(attribute, &mut declarations)?;
            attributes.push((name, attribute.value.as_ref()));
        }

        let mut start = BytesStart::new(qname.clone());
        for (name, value) in &declarations {
            start.push_attribute((name.as_str(), value.as_str()));
        }
        for (name, value) in attributes {
            start.push_attribute((name.as_str(), value));
        }
        Ok((qname, start))
    }

    fn attribute_name(
        &mut self,
        attribute: &Attribute,
        declarations: &mut Vec<(String, String)>,
    ) -> Result<String, FeedError> {
        if attribute.is_namespace_declaration() {
            return Ok(attribute.name.to_string());
        }

        match (split_name(&attribute.name), attribute.namespace.as_deref()) {
            ((Some("xml"), _), _) => Ok(attribute.name.to_string()),
            ((Some(prefix), _), ns) => {
                if self.scope.lookup_uri(Some(prefix)).is_none() {
                    let ns = ns.ok_or_else(|| FeedError::UnboundNamespace {
                        prefix: prefix.to_string(),
                    })?;
                    declarations.push((format!("xmlns:{prefix}"), ns.to_string()));
                    self.scope.declare(Some(prefix), ns);
                }
                Ok(attribute.name.to_string())
            }
            ((None, local), Some(ns)) => match self.scope.lookup_prefix(ns) {
                Some(Some(prefix)) => Ok(format!("{prefix}:{local}")),
                _ => Err(FeedError::UnboundNamespace {
                    prefix: ns.to_string(),
                }),
            },
            ((None, local), None) => Ok(local.to_string()),
        }
    }

    fn write_text(&mut self, text: &str) -> Result<(), FeedError> {
        if text.is_empty() {
            return Ok(());
        }
        if self.use_cdata && needs_escape(text) {
            for section in cdata_sections(text) {
                self.writer
                    .write_event(Event::CData(BytesCData::new(section)))?;
            }
        } else {
            self.writer
                .write_event(Event::Text(BytesText::from_escaped(partial_escape(text))))?;
        }
        Ok(())
    }

    fn write_xhtml(&mut self, value: &str) -> Result<(), FeedError> {
        self.scope.push();
        let mut div = BytesStart::new("div");
        if self.scope.lookup_prefix(XHTML_NAMESPACE) != Some(None) {
            div.push_attribute(("xmlns", XHTML_NAMESPACE));
            self.scope.declare(None, XHTML_NAMESPACE);
        }
        self.writer.write_event(Event::Start(div))?;
        self.write_xml_fragment(value, XHTML_NAMESPACE)?;
        self.writer.write_event(Event::End(BytesEnd::new("div")))?;
        self.scope.pop();
        Ok(())
    }

    /// Re-emits a markup fragment event by event.
    ///
    /// With an empty `namespace`, top-level elements are moved out of any
    /// surrounding default namespace with `xmlns=""`. The fragment must be
    /// well-formed on its own: every element closed and every `&` part of an
    /// entity. Comments and processing instructions are dropped.
    fn write_xml_fragment(&mut self, fragment: &str, namespace: &str) -> Result<(), FeedError> {
        let unset_default = namespace.is_empty() && self.scope.default_namespace().is_some();
        let mut reader = Reader::from_str(fragment);
        let mut depth: usize = 0;

        loop {
            match reader.read_event()? {
                Event::Start(e) => {
                    let e = if depth == 0 && unset_default {
                        clear_default_namespace(e)?
                    } else {
                        e
                    };
                    depth += 1;
                    self.writer.write_event(Event::Start(e))?;
                }
                Event::Empty(e) => {
                    let e = if depth == 0 && unset_default {
                        clear_default_namespace(e)?
                    } else {
                        e
                    };
                    self.writer.write_event(Event::Empty(e))?;
                }
                Event::End(e) => {
                    depth = depth
                        .checked_sub(1)
                        .ok_or(FeedError::MalformedMarkup("end tag without start tag"))?;
                    self.writer.write_event(Event::End(e))?;
                }
                Event::Text(e) => {
                    e.unescape()
                        .map_err(|_| FeedError::MalformedMarkup("bare '&' or unknown entity"))?;
                    self.writer.write_event(Event::Text(e))?;
                }
                event @ Event::CData(_) => {
                    self.writer.write_event(event)?;
                }
                Event::Eof if depth > 0 => {
                    return Err(FeedError::MalformedMarkup("unclosed element"));
                }
                Event::Eof => break,
                // Comments, processing instructions, declarations and doctypes
                _ => {}
            }
        }
        Ok(())
    }
}

impl Default for FragmentWriter {
    fn default() -> Self {
        Self {
            writer: Writer::new(Vec::new()),
            scope: NamespaceScope::default(),
            use_cdata: false,
        }
    }
}

fn clear_default_namespace(mut start: BytesStart<'_>) -> Result<BytesStart<'_>, FeedError> {
    let mut declared = false;
    for attribute in start.attributes() {
        if attribute?.key.as_ref() == b"xmlns" {
            declared = true;
            break;
        }
    }
    if !declared {
        start.push_attribute(("xmlns", ""));
    }
    Ok(start)
}

/// Renders an unclosed start tag, used for document envelopes such as
/// `<rss version="2.0">`.
pub fn render_start_tag(name: &str, attributes: &[Attribute]) -> Result<String, FeedError> {
    let mut writer = Writer::new(Vec::new());
    let mut start = BytesStart::new(name);
    for attribute in attributes {
        start.push_attribute((attribute.name.as_ref(), attribute.value.as_ref()));
    }
    writer.write_event(Event::Start(start))?;
    Ok(String::from_utf8(writer.into_inner())?)
}
