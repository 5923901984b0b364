//! Low-level output helpers.
//!
//! - **XML emission**: escape decisions, namespace scope and priming, fragment
//!   rendering of content trees
//! - **Transport**: blocking or async sinks for rendered fragments

mod sink;
mod xml;

pub use sink::{AsyncSink, BlockingSink, FeedSink};
pub use xml::{
    is_xhtml_media_type, is_xml_media_type, needs_escape, render_start_tag, split_name,
    FragmentWriter, NamespaceScope, ValueMode, ValueModeFn, XHTML_NAMESPACE,
};
