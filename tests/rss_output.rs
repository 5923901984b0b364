//! End-to-end RSS 2.0 document generation.

use chrono::{DateTime, Weekday};
use pretty_assertions::assert_eq;
use std::time::Duration;

use syndic::feed::{FeedError, Formatter, RssFeedWriter, RssFormatter};
use syndic::model::{Attribute, Category, Content, Image, Item, Link, LinkRel, Person};
use syndic::util::BlockingSink;

fn hello_item() -> Item {
    let mut item = Item {
        id: Some("123".to_string()),
        title: Some("Hello".to_string()),
        description: Some("World".to_string()),
        ..Item::default()
    };
    item.add_link(Link::new("https://example.com/a"));
    item.add_contributor(Person::email("a@example.com"));
    item
}

fn to_string(bytes: Vec<u8>) -> String {
    String::from_utf8(bytes).unwrap()
}

#[test]
fn test_item_scenario() {
    let mut formatter = RssFormatter::new();
    let out = formatter.format_item(&hello_item()).unwrap();

    assert_eq!(
        out,
        concat!(
            "<item>",
            "<title>Hello</title>",
            "<link>https://example.com/a</link>",
            "<description>World</description>",
            "<author>a@example.com</author>",
            r#"<guid isPermaLink="false">123</guid>"#,
            "</item>"
        )
    );
}

#[tokio::test]
async fn test_full_channel_document() {
    let mut writer = RssFeedWriter::new(BlockingSink::new(Vec::new()), &[]).unwrap();

    writer.write_title("Example Blog").await.unwrap();
    writer
        .write_link(&Link::new("https://example.com/"))
        .await
        .unwrap();
    writer.write_description("Notes & links").await.unwrap();
    writer.write_language("en-US").await.unwrap();
    let built = DateTime::parse_from_rfc3339("2024-01-15T10:30:00Z").unwrap();
    writer.write_last_build_date(&built).await.unwrap();
    writer.write_generator("syndic").await.unwrap();
    writer.write_docs().await.unwrap();
    writer
        .write_time_to_live(Duration::from_secs(90))
        .await
        .unwrap();
    writer.write_skip_hours(&[0, 23]).await.unwrap();
    writer
        .write_skip_days(&[Weekday::Sat, Weekday::Sun])
        .await
        .unwrap();
    writer
        .write_image(&Image {
            url: "https://example.com/logo.png".to_string(),
            title: Some("Example Blog".to_string()),
            link: Some(Link::new("https://example.com/")),
            ..Image::default()
        })
        .await
        .unwrap();

    let mut item = hello_item();
    item.published = Some(built);
    item.add_category(Category::new("rust"));
    writer.write_item(&item).await.unwrap();

    let out = to_string(writer.finish().await.unwrap().into_inner());

    assert!(out.starts_with(r#"<rss version="2.0"><channel><title>Example Blog</title>"#));
    assert!(out.ends_with("</item></channel></rss>"));
    assert!(out.contains("<description>Notes &amp; links</description>"));
    assert!(out.contains("<lastBuildDate>Mon, 15 Jan 2024 10:30:00 GMT</lastBuildDate>"));
    assert!(out.contains("<ttl>2</ttl>"));
    assert!(out.contains("<skipHours><hour>0</hour><hour>23</hour></skipHours>"));
    assert!(out.contains("<skipDays><day>Saturday</day><day>Sunday</day></skipDays>"));
    assert!(out.contains(concat!(
        "<image><url>https://example.com/logo.png</url>",
        "<title>Example Blog</title>",
        "<link>https://example.com/</link></image>"
    )));
    assert!(out.contains("<pubDate>Mon, 15 Jan 2024 10:30:00 GMT</pubDate>"));

    let feed = feed_rs::parser::parse(out.as_bytes()).unwrap();
    assert_eq!(feed.feed_type, feed_rs::model::FeedType::RSS2);
    assert_eq!(feed.title.unwrap().content, "Example Blog");
    assert_eq!(feed.entries.len(), 1);
    let entry = &feed.entries[0];
    assert_eq!(entry.id, "123");
    assert_eq!(entry.title.as_ref().unwrap().content, "Hello");
    assert_eq!(entry.links[0].href, "https://example.com/a");
    assert_eq!(entry.categories[0].term, "rust");
}

#[tokio::test]
async fn test_envelope_opened_once() {
    let mut writer = RssFeedWriter::new(BlockingSink::new(Vec::new()), &[]).unwrap();
    writer.write_title("One").await.unwrap();
    writer.write_title("Two").await.unwrap();
    writer.write_item(&hello_item()).await.unwrap();
    let out = to_string(writer.finish().await.unwrap().into_inner());

    assert_eq!(out.matches("<rss").count(), 1);
    assert_eq!(out.matches("<channel>").count(), 1);
    assert_eq!(out.matches("</channel></rss>").count(), 1);
}

#[tokio::test]
async fn test_empty_document_still_well_formed() {
    let writer = RssFeedWriter::new(BlockingSink::new(Vec::new()), &[]).unwrap();
    let out = to_string(writer.finish().await.unwrap().into_inner());
    assert_eq!(out, r#"<rss version="2.0"><channel></channel></rss>"#);
}

#[tokio::test]
async fn test_known_attributes_on_root_and_prefixed_elements() {
    let attributes = [Attribute::new("xmlns:atom", "http://www.w3.org/2005/Atom")];
    let mut writer = RssFeedWriter::new(BlockingSink::new(Vec::new()), &attributes).unwrap();

    let mut self_link = Content::new("atom:link").unwrap();
    self_link.add_attribute(Attribute::new("href", "https://example.com/rss"));
    self_link.add_attribute(Attribute::new("rel", "self"));
    writer.write_content(&self_link).await.unwrap();

    let out = to_string(writer.finish().await.unwrap().into_inner());
    assert_eq!(
        out,
        concat!(
            r#"<rss xmlns:atom="http://www.w3.org/2005/Atom" version="2.0"><channel>"#,
            r#"<atom:link href="https://example.com/rss" rel="self"/>"#,
            "</channel></rss>"
        )
    );
}

#[tokio::test]
async fn test_invalid_item_writes_nothing() {
    let mut writer = RssFeedWriter::new(BlockingSink::new(Vec::new()), &[]).unwrap();
    writer.write_title("Blog").await.unwrap();

    let mut enclosure = Link::with_rel("https://cdn.example.com/ep.mp3", LinkRel::Enclosure);
    enclosure.media_type = Some("audio/mpeg".to_string());
    let mut item = hello_item();
    item.add_link(enclosure);

    let err = writer.write_item(&item).await.unwrap_err();
    assert!(matches!(err, FeedError::OutOfRange { field: "length", .. }));
    assert!(err.is_validation());

    // The formatter stays usable after a failure
    writer.write_item(&hello_item()).await.unwrap();
    let out = to_string(writer.finish().await.unwrap().into_inner());
    assert_eq!(out.matches("<item>").count(), 1);
    assert!(!out.contains("enclosure"));
}

#[tokio::test]
async fn test_cdata_mode() {
    let formatter = RssFormatter::new().use_cdata(true);
    let mut writer =
        RssFeedWriter::with_formatter(BlockingSink::new(Vec::new()), &[], formatter).unwrap();
    writer.write_description("<p>Hi</p>").await.unwrap();
    writer.write_title("Plain").await.unwrap();
    let out = to_string(writer.finish().await.unwrap().into_inner());

    assert!(out.contains("<description><![CDATA[<p>Hi</p>]]></description>"));
    assert!(out.contains("<title>Plain</title>"));
}
