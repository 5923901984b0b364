//! End-to-end Atom 1.0 document generation.

use chrono::DateTime;
use pretty_assertions::assert_eq;

use syndic::feed::{AtomFeedWriter, AtomFormatter, FeedError};
use syndic::model::{AtomEntry, Attribute, Category, Item, Link, LinkRel, Person, Timestamp};
use syndic::util::{AsyncSink, BlockingSink};

fn ts(value: &str) -> Timestamp {
    DateTime::parse_from_rfc3339(value).unwrap()
}

fn entry() -> AtomEntry {
    let mut item = Item {
        id: Some("urn:uuid:1225c695-cfb8-4ebb-aaaa-80da344efa6a".to_string()),
        title: Some("Hello".to_string()),
        description: Some("<p>World</p>".to_string()),
        last_updated: Some(ts("2024-01-15T10:30:00Z")),
        published: Some(ts("2024-01-14T08:00:00+02:00")),
        ..Item::default()
    };
    item.add_link(Link::with_rel("https://example.com/a", LinkRel::Alternate));
    item.add_contributor(Person::author("Jane"));
    item.add_category(Category::new("rust"));

    AtomEntry {
        item,
        content_type: Some("html".to_string()),
        summary: Some("Short".to_string()),
        rights: None,
    }
}

#[test]
fn test_entry_fragment() {
    let mut formatter = AtomFormatter::new();
    let out = formatter.format_entry(&entry()).unwrap();

    assert_eq!(
        out,
        concat!(
            "<entry>",
            "<id>urn:uuid:1225c695-cfb8-4ebb-aaaa-80da344efa6a</id>",
            "<title>Hello</title>",
            "<updated>2024-01-15T10:30:00Z</updated>",
            "<published>2024-01-14T08:00:00+02:00</published>",
            r#"<link href="https://example.com/a" rel="alternate"/>"#,
            "<author><name>Jane</name></author>",
            r#"<category term="rust"/>"#,
            r#"<content type="html">&lt;p&gt;World&lt;/p&gt;</content>"#,
            "<summary>Short</summary>",
            "</entry>"
        )
    );
}

#[test]
fn test_entry_without_id_fails() {
    let mut formatter = AtomFormatter::new();
    let mut entry = entry();
    entry.item.id = None;

    let err = formatter.format_entry(&entry).unwrap_err();
    assert!(matches!(err, FeedError::MissingField { field: "id" }));
}

#[test]
fn test_entry_requires_author() {
    let formatter = AtomFormatter::new();
    let mut entry = entry();
    entry.item.contributors = vec![Person {
        rel: Some(syndic::model::PersonRel::Contributor),
        ..Person::author("Sam")
    }];

    let err = formatter.create_entry(&entry).unwrap_err();
    assert!(matches!(err, FeedError::MissingField { field: "author" }));
}

#[test]
fn test_content_link_excludes_description() {
    let formatter = AtomFormatter::new();
    let mut entry = entry();
    entry
        .item
        .add_link(Link::with_rel("https://example.com/a.html", LinkRel::Content));

    let err = formatter.create_entry(&entry).unwrap_err();
    assert!(matches!(err, FeedError::Conflict(_)));

    entry.item.description = None;
    let content = formatter.create_entry(&entry).unwrap();
    assert!(content.fields().iter().any(|f| f.name() == "content"
        && f.attribute("src") == Some("https://example.com/a.html")));
}

#[tokio::test]
async fn test_full_feed_document() {
    let mut writer = AtomFeedWriter::new(BlockingSink::new(Vec::new()), &[]).unwrap();

    writer.write_id("https://example.com/").await.unwrap();
    writer.write_title("Example Blog").await.unwrap();
    writer.write_subtitle("Notes").await.unwrap();
    writer
        .write_updated(&ts("2024-01-15T10:30:00Z"))
        .await
        .unwrap();
    writer
        .write_link(&Link::with_rel("https://example.com/", LinkRel::Alternate))
        .await
        .unwrap();
    writer.write_person(&Person::author("Jane")).await.unwrap();
    writer
        .write_generator("syndic", Some("https://example.com/syndic"), Some("0.1"))
        .await
        .unwrap();
    writer.write_entry(&entry()).await.unwrap();

    let out = String::from_utf8(writer.finish().await.unwrap().into_inner()).unwrap();

    assert!(out.starts_with(
        r#"<feed xmlns="http://www.w3.org/2005/Atom"><id>https://example.com/</id>"#
    ));
    assert!(out.ends_with("</entry></feed>"));
    assert!(out.contains(
        r#"<generator uri="https://example.com/syndic" version="0.1">syndic</generator>"#
    ));
    // Fragments inherit the envelope's default namespace
    assert_eq!(out.matches("xmlns=").count(), 1);

    let feed = feed_rs::parser::parse(out.as_bytes()).unwrap();
    assert_eq!(feed.feed_type, feed_rs::model::FeedType::Atom);
    assert_eq!(feed.id, "https://example.com/");
    assert_eq!(feed.title.unwrap().content, "Example Blog");
    assert_eq!(feed.entries.len(), 1);
    let parsed = &feed.entries[0];
    assert_eq!(parsed.id, "urn:uuid:1225c695-cfb8-4ebb-aaaa-80da344efa6a");
    assert_eq!(parsed.authors[0].name, "Jane");
    assert_eq!(parsed.categories[0].term, "rust");
    assert_eq!(parsed.links[0].href, "https://example.com/a");
}

#[tokio::test]
async fn test_channel_writers_validate() {
    let mut writer = AtomFeedWriter::new(BlockingSink::new(Vec::new()), &[]).unwrap();

    assert!(matches!(
        writer.write_id("").await.unwrap_err(),
        FeedError::MissingField { field: "id" }
    ));
    assert!(matches!(
        writer
            .write_updated(&ts("1970-01-01T00:00:00Z"))
            .await
            .unwrap_err(),
        FeedError::OutOfRange {
            field: "updated",
            ..
        }
    ));
    assert!(matches!(
        writer.write_value("", "x").await.unwrap_err(),
        FeedError::MissingField { field: "name" }
    ));

    // Nothing was written, so the document is just the envelope
    let out = String::from_utf8(writer.finish().await.unwrap().into_inner()).unwrap();
    assert_eq!(out, r#"<feed xmlns="http://www.w3.org/2005/Atom"></feed>"#);
}

#[tokio::test]
async fn test_prefixed_atom_binding() {
    let attributes = [Attribute::new("xmlns:a", "http://www.w3.org/2005/Atom")];
    let mut writer = AtomFeedWriter::new(AsyncSink::new(Vec::new()), &attributes).unwrap();
    writer.write_title("Prefixed").await.unwrap();
    let out = String::from_utf8(writer.finish().await.unwrap().into_inner()).unwrap();

    assert_eq!(
        out,
        concat!(
            r#"<a:feed xmlns:a="http://www.w3.org/2005/Atom">"#,
            "<a:title>Prefixed</a:title>",
            "</a:feed>"
        )
    );
}

#[tokio::test]
async fn test_xhtml_and_xml_content() {
    let mut writer = AtomFeedWriter::new(BlockingSink::new(Vec::new()), &[]).unwrap();

    let mut xhtml = entry();
    xhtml.content_type = Some("xhtml".to_string());
    xhtml.item.description = Some("<p>Hi <b>there</b></p>".to_string());
    writer.write_entry(&xhtml).await.unwrap();

    let mut xml = entry();
    xml.content_type = Some("application/xml".to_string());
    xml.item.description = Some("<data><v>1</v></data>".to_string());
    writer.write_entry(&xml).await.unwrap();

    let out = String::from_utf8(writer.finish().await.unwrap().into_inner()).unwrap();
    assert!(out.contains(concat!(
        r#"<content type="xhtml"><div xmlns="http://www.w3.org/1999/xhtml">"#,
        "<p>Hi <b>there</b></p></div></content>"
    )));
    assert!(out.contains(
        r#"<content type="application/xml"><data xmlns=""><v>1</v></data></content>"#
    ));
}

#[tokio::test]
async fn test_malformed_markup_entry_skipped() {
    let mut writer = AtomFeedWriter::new(BlockingSink::new(Vec::new()), &[]).unwrap();
    writer.write_id("https://example.com/").await.unwrap();
    writer.write_title("Example Blog").await.unwrap();
    writer
        .write_updated(&ts("2024-01-15T10:30:00Z"))
        .await
        .unwrap();

    let cases = [
        ("xhtml", "<p>unclosed"),
        ("xhtml", "Tom & Jerry"),
        ("application/xml", "<p>unclosed"),
        ("application/xml", "Tom & Jerry"),
    ];
    for (content_type, description) in cases {
        let mut bad = entry();
        bad.content_type = Some(content_type.to_string());
        bad.item.description = Some(description.to_string());

        let err = writer.write_entry(&bad).await.unwrap_err();
        assert!(err.is_validation(), "{content_type}: {err:?}");
    }
    writer.write_entry(&entry()).await.unwrap();

    let out = String::from_utf8(writer.finish().await.unwrap().into_inner()).unwrap();
    assert_eq!(out.matches("<entry>").count(), 1);

    let feed = feed_rs::parser::parse(out.as_bytes()).unwrap();
    assert_eq!(feed.entries.len(), 1);
    assert_eq!(feed.title.unwrap().content, "Example Blog");
}
