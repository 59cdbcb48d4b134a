use chrono::{Duration, TimeZone, Utc};
use relay_core::{filter_recent, parse_feed, FeedEntry, RelayError, PUB_DATE_FORMAT};

fn sample_feed() -> String {
    r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Test Feed</title>
    <link>http://example.com/</link>
    <description>Test</description>
    <item>
      <title>Item 1</title>
      <link>http://example.com/1</link>
      <description>First</description>
      <pubDate>Mon, 21 Oct 2024 08:00:00 GMT</pubDate>
    </item>
    <item>
      <title>Item 2</title>
      <link>http://example.com/2</link>
      <description>Second</description>
      <pubDate>Mon, 21 Oct 2024 07:28:00 GMT</pubDate>
    </item>
  </channel>
</rss>"#
        .to_string()
}

fn entry(link: &str, pub_date: String) -> FeedEntry {
    FeedEntry {
        title: "t".into(),
        link: link.into(),
        description: "d".into(),
        pub_date,
    }
}

#[test]
fn parse_preserves_document_order() {
    let entries = parse_feed(&sample_feed()).unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].link, "http://example.com/1");
    assert_eq!(entries[1].link, "http://example.com/2");
    assert_eq!(entries[0].description, "First");
    assert_eq!(entries[0].pub_date, "Mon, 21 Oct 2024 08:00:00 GMT");
}

#[test]
fn parse_rejects_malformed_document() {
    assert!(matches!(
        parse_feed("this is not xml"),
        Err(RelayError::Parse(_))
    ));
}

#[test]
fn parse_rejects_item_missing_required_field() {
    let feed = r#"<?xml version="1.0"?>
<rss version="2.0">
  <channel>
    <title>T</title>
    <item>
      <title>no link or date</title>
      <description>d</description>
    </item>
  </channel>
</rss>"#;
    assert!(matches!(
        parse_feed(feed),
        Err(RelayError::MissingField(_))
    ));
}

#[test]
fn recency_boundary_is_inclusive() {
    let now = Utc.with_ymd_and_hms(2024, 10, 21, 12, 0, 0).unwrap();
    let max_age = Duration::days(3);
    let on_boundary = entry(
        "http://e/boundary",
        (now - max_age).format(PUB_DATE_FORMAT).to_string(),
    );
    let too_old = entry(
        "http://e/old",
        (now - max_age - Duration::seconds(1))
            .format(PUB_DATE_FORMAT)
            .to_string(),
    );
    let kept = filter_recent(vec![on_boundary, too_old], now, max_age, true).unwrap();
    assert_eq!(kept.len(), 1);
    assert_eq!(kept[0].link, "http://e/boundary");
}

#[test]
fn strict_mode_fails_on_bad_timestamp() {
    let now = Utc::now();
    let bad = entry("http://e/bad", "not a date".into());
    assert!(matches!(
        filter_recent(vec![bad], now, Duration::days(3), true),
        Err(RelayError::Timestamp { .. })
    ));
}

#[test]
fn lenient_mode_skips_bad_timestamp() {
    let now = Utc::now();
    let bad = entry("http://e/bad", "not a date".into());
    let good = entry(
        "http://e/good",
        now.format(PUB_DATE_FORMAT).to_string(),
    );
    let kept = filter_recent(vec![bad, good], now, Duration::days(3), false).unwrap();
    assert_eq!(kept.len(), 1);
    assert_eq!(kept[0].link, "http://e/good");
}
