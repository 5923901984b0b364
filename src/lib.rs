//! Syndication feed serialization.
//!
//! Domain objects from [`model`] are encoded by the RSS or Atom formatter in
//! [`feed`] and written through a [`util::FeedSink`].

pub mod config;
pub mod feed;
pub mod model;
pub mod util;
