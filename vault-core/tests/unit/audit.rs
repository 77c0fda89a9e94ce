use std::collections::BTreeMap;
use vault_core::domain::{AUDIT_STATUS_ERROR, AUDIT_STATUS_OK};
use vault_core::infrastructure::audit::AuditLogger;

fn labels(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
}

#[tokio::test]
async fn logged_entries_are_queryable_after_close() {
    let logger = AuditLogger::new(16, None);
    logger.log("Sign", "k-1", AUDIT_STATUS_OK, "127.0.0.1:1234", labels(&[("note", "first")]));
    logger.close().await;

    let entries = logger.query("", "", None, None, 0);
    assert_eq!(entries.len(), 1);
    let entry = &entries[0];
    assert_eq!(entry.operation, "Sign");
    assert_eq!(entry.key_id, "k-1");
    assert_eq!(entry.status, AUDIT_STATUS_OK);
    assert_eq!(entry.peer_address, "127.0.0.1:1234");
    assert_eq!(entry.metadata.get("note").map(String::as_str), Some("first"));
    assert!(!entry.id.is_empty());
}

#[tokio::test]
async fn query_filters_and_orders_newest_first() {
    let logger = AuditLogger::new(16, None);
    logger.log("GenerateKey", "k-1", AUDIT_STATUS_OK, "", BTreeMap::new());
    logger.log("Sign", "k-1", AUDIT_STATUS_OK, "", BTreeMap::new());
    logger.log("Sign", "k-2", AUDIT_STATUS_ERROR, "", BTreeMap::new());
    logger.close().await;

    let all = logger.query("", "", None, None, 0);
    assert_eq!(all.len(), 3);
    // Reverse chronological: last logged comes first.
    assert_eq!(all[0].key_id, "k-2");
    assert_eq!(all[2].operation, "GenerateKey");
    for window in all.windows(2) {
        assert!(window[0].timestamp >= window[1].timestamp);
    }

    let signs = logger.query("", "Sign", None, None, 0);
    assert_eq!(signs.len(), 2);

    let for_key = logger.query("k-1", "", None, None, 0);
    assert_eq!(for_key.len(), 2);

    let both = logger.query("k-1", "Sign", None, None, 0);
    assert_eq!(both.len(), 1);

    let limited = logger.query("", "", None, None, 2);
    assert_eq!(limited.len(), 2);
    assert_eq!(limited[0].key_id, "k-2");
}

#[tokio::test]
async fn query_honors_time_bounds() {
    let logger = AuditLogger::new(16, None);
    logger.log("Sign", "k-1", AUDIT_STATUS_OK, "", BTreeMap::new());
    logger.log("Sign", "k-2", AUDIT_STATUS_OK, "", BTreeMap::new());
    logger.close().await;

    let all = logger.query("", "", None, None, 0);
    assert_eq!(all.len(), 2);
    let newest = all[0].timestamp;
    let oldest = all[1].timestamp;

    let from_newest = logger.query("", "", Some(newest), None, 0);
    assert!(from_newest.iter().all(|entry| entry.timestamp >= newest));

    let until_oldest = logger.query("", "", None, Some(oldest), 0);
    assert!(until_oldest.iter().all(|entry| entry.timestamp <= oldest));
}

#[tokio::test]
async fn full_buffer_drops_instead_of_blocking() {
    // Current-thread test runtime: the processor task cannot run between
    // the synchronous log calls below, so the queue fills deterministically.
    let logger = AuditLogger::new(4, None);
    for i in 0..10 {
        logger.log("Sign", &format!("k-{i}"), AUDIT_STATUS_OK, "", BTreeMap::new());
    }
    logger.close().await;

    let retained = logger.query("", "", None, None, 0);
    assert_eq!(retained.len(), 4);
}

#[tokio::test]
async fn subscribers_receive_entries_and_deregister_on_drop() {
    let logger = AuditLogger::new(16, None);
    let mut subscription = logger.subscribe();

    logger.log("Encrypt", "k-1", AUDIT_STATUS_OK, "", BTreeMap::new());
    let entry = subscription.recv().await.expect("delivered entry");
    assert_eq!(entry.operation, "Encrypt");

    drop(subscription);
    // Logging after the subscriber left must not fail or block.
    logger.log("Decrypt", "k-1", AUDIT_STATUS_OK, "", BTreeMap::new());
    logger.close().await;
    assert_eq!(logger.query("", "", None, None, 0).len(), 2);
}

#[tokio::test]
async fn log_after_close_is_dropped_silently() {
    let logger = AuditLogger::new(16, None);
    logger.close().await;
    logger.log("Sign", "k-1", AUDIT_STATUS_OK, "", BTreeMap::new());
    assert!(logger.query("", "", None, None, 0).is_empty());
}
