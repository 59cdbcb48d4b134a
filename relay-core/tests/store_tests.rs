use relay_core::{FeedEntry, ItemStore};

fn temp_db(tag: &str) -> std::path::PathBuf {
    let mut path = std::env::temp_dir();
    path.push(format!(
        "relay_{}_{}.db",
        tag,
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ));
    path
}

fn entry(link: &str) -> FeedEntry {
    FeedEntry {
        title: format!("title for {}", link),
        link: link.into(),
        description: "<p>body</p>".into(),
        pub_date: "Mon, 21 Oct 2024 08:00:00 GMT".into(),
    }
}

#[tokio::test]
async fn filter_unseen_returns_only_unrecorded_links() {
    let path = temp_db("unseen");
    let store = ItemStore::new(&path);
    store.init().await.unwrap();

    let e1 = entry("http://e/1");
    let e2 = entry("http://e/2");
    let unseen = store
        .filter_unseen(vec![e1.clone(), e2.clone()])
        .await
        .unwrap();
    assert_eq!(unseen.len(), 2);

    store.record("news_a", &e1).await.unwrap();
    let unseen = store
        .filter_unseen(vec![e1.clone(), e2.clone()])
        .await
        .unwrap();
    assert_eq!(unseen, vec![e2.clone()]);

    let _ = tokio::fs::remove_file(&path).await;
}

#[tokio::test]
async fn duplicate_record_is_silently_ignored() {
    let path = temp_db("dup");
    let store = ItemStore::new(&path);
    store.init().await.unwrap();

    let e1 = entry("http://e/1");
    store.record("news_a", &e1).await.unwrap();
    // Same link again, under a different feed namespace: tolerated, no-op.
    store.record("tech_b", &e1).await.unwrap();

    let unseen = store.filter_unseen(vec![e1]).await.unwrap();
    assert!(unseen.is_empty());

    let _ = tokio::fs::remove_file(&path).await;
}

#[tokio::test]
async fn init_is_idempotent() {
    let path = temp_db("init");
    let store = ItemStore::new(&path);
    store.init().await.unwrap();
    store.init().await.unwrap();

    let e1 = entry("http://e/1");
    store.record("news_a", &e1).await.unwrap();
    store.init().await.unwrap();
    let unseen = store.filter_unseen(vec![e1]).await.unwrap();
    assert!(unseen.is_empty());

    let _ = tokio::fs::remove_file(&path).await;
}

#[tokio::test]
async fn filter_unseen_on_empty_input_is_empty() {
    let path = temp_db("empty");
    let store = ItemStore::new(&path);
    store.init().await.unwrap();
    assert!(store.filter_unseen(Vec::new()).await.unwrap().is_empty());
    let _ = tokio::fs::remove_file(&path).await;
}

#[tokio::test]
async fn concurrent_records_of_same_link_both_complete() {
    let path = temp_db("race");
    let store = ItemStore::new(&path);
    store.init().await.unwrap();

    let e1 = entry("http://e/race");
    let s1 = store.clone();
    let s2 = store.clone();
    let a = {
        let e = e1.clone();
        tokio::spawn(async move { s1.record("news_a", &e).await })
    };
    let b = {
        let e = e1.clone();
        tokio::spawn(async move { s2.record("news_b", &e).await })
    };
    a.await.unwrap().unwrap();
    b.await.unwrap().unwrap();

    let unseen = store.filter_unseen(vec![e1]).await.unwrap();
    assert!(unseen.is_empty());

    let _ = tokio::fs::remove_file(&path).await;
}
