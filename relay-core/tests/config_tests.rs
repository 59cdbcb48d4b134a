use relay_core::{load_feeds, FeedConfig};

#[test]
fn parses_subscription_records() {
    let raw = r#"[
        {
            "catalog": "zhihu",
            "key": "daily",
            "url": ["https://a.example/feed", "https://b.example/feed"],
            "duration_in_minutes": 15,
            "receiver_name": ["alice"],
            "group_name": ["Reading Club"]
        }
    ]"#;
    let feeds: Vec<FeedConfig> = serde_json::from_str(raw).unwrap();
    assert_eq!(feeds.len(), 1);
    let feed = &feeds[0];
    assert_eq!(feed.rss_key(), "zhihu_daily");
    assert_eq!(feed.urls.len(), 2);
    assert_eq!(feed.poll_interval().as_secs(), 15 * 60);
    assert_eq!(feed.receivers, vec!["alice".to_string()]);
    assert_eq!(feed.groups, vec!["Reading Club".to_string()]);
}

#[test]
fn receiver_and_group_lists_default_to_empty() {
    let raw = r#"[
        {
            "catalog": "news",
            "key": "k",
            "url": ["https://a.example/feed"],
            "duration_in_minutes": 5
        }
    ]"#;
    let feeds: Vec<FeedConfig> = serde_json::from_str(raw).unwrap();
    assert!(feeds[0].receivers.is_empty());
    assert!(feeds[0].groups.is_empty());
}

#[test]
fn missing_config_file_falls_back_to_bundled_template() {
    let mut path = std::env::temp_dir();
    path.push("relay_config_that_does_not_exist.json");
    let feeds = load_feeds(&path).unwrap();
    assert!(!feeds.is_empty());
    assert!(feeds[0].urls.len() >= 1);
}
