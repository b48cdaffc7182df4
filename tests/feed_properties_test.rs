//! Behavioral tests for the notification feed through its public API.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use notification_feed::desktop::DesktopNotifier;
use notification_feed::types::Envelope;
use notification_feed::{
    Category, FeedBuilder, FeedFilter, NotificationFeed, Permission, Priority, SettingsPatch,
};
use serde_json::json;

/// Notifier that is granted but fails every display.
#[derive(Debug, Default)]
struct BrokenNotifier {
    attempts: AtomicUsize,
}

#[async_trait]
impl DesktopNotifier for BrokenNotifier {
    fn current_permission(&self) -> Permission {
        Permission::Granted
    }

    async fn request_permission(&self) -> Permission {
        Permission::Granted
    }

    fn show(&self, _title: &str, _body: &str, _icon: &str) -> anyhow::Result<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        anyhow::bail!("display server unavailable")
    }
}

fn data(id: &str, category: &str, priority: &str) -> serde_json::Value {
    json!({
        "id": id,
        "type": "email",
        "priority": priority,
        "category": category,
        "title": format!("{category} update"),
        "message": "details",
        "read": true,
    })
}

fn frame(id: &str) -> String {
    json!({"type": "notification", "data": data(id, "stock", "low")}).to_string()
}

fn ids(feed: &NotificationFeed) -> Vec<&str> {
    feed.notifications().iter().map(|n| n.id.as_str()).collect()
}

#[test]
fn test_sender_read_flag_is_ignored() {
    let mut feed = FeedBuilder::new().build();
    feed.receive(&frame("n1"));
    assert!(!feed.get("n1").unwrap().read);
    assert_eq!(feed.unread_count(), 1);
}

#[test]
fn test_created_at_formats() {
    let mut feed = FeedBuilder::new().build();

    let mut rfc = data("rfc", "system", "low");
    rfc["createdAt"] = json!("2026-03-01T12:00:00Z");
    let mut millis = data("millis", "system", "low");
    millis["createdAt"] = json!(1_772_366_400_000_i64);
    let mut bogus = data("bogus", "system", "low");
    bogus["createdAt"] = json!("yesterday-ish");

    let before = Utc::now();
    for d in [rfc, millis, bogus] {
        feed.receive_envelope(Envelope::notification(d));
    }

    assert_eq!(
        feed.get("rfc").unwrap().created_at,
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
    );
    assert_eq!(
        feed.get("millis").unwrap().created_at.timestamp_millis(),
        1_772_366_400_000
    );
    assert!(feed.get("bogus").unwrap().created_at >= before);
}

#[test]
fn test_created_at_without_offset_or_time() {
    let mut feed = FeedBuilder::new().build();

    let mut naive = data("naive", "system", "low");
    naive["createdAt"] = json!("2020-03-01T12:00:00");
    let mut date_only = data("date-only", "system", "low");
    date_only["createdAt"] = json!("2020-03-01");
    for d in [naive, date_only] {
        feed.receive(&json!({"type": "notification", "data": d}).to_string());
    }

    assert_eq!(
        feed.get("naive").unwrap().created_at,
        Utc.with_ymd_and_hms(2020, 3, 1, 12, 0, 0).unwrap()
    );
    assert_eq!(
        feed.get("date-only").unwrap().created_at,
        Utc.with_ymd_and_hms(2020, 3, 1, 0, 0, 0).unwrap()
    );
}

#[test]
fn test_string_envelope_timestamp_still_delivers() {
    let mut feed = FeedBuilder::new().build();
    let raw = json!({
        "type": "notification",
        "timestamp": "1700000000000",
        "data": data("late", "alert", "high"),
    })
    .to_string();

    feed.receive(&raw);

    assert_eq!(ids(&feed), vec!["late"]);
    assert_eq!(feed.unread_count(), 1);
}

#[test]
fn test_unread_count_tracks_every_operation() {
    let mut feed = FeedBuilder::new().build();
    for id in ["a", "b", "c", "d"] {
        feed.receive(&frame(id));
    }
    assert_eq!(feed.unread_count(), 4);

    feed.mark_as_read("b");
    assert_eq!(feed.unread_count(), 3);

    feed.delete("c");
    assert_eq!(feed.unread_count(), 2);

    feed.delete("b");
    assert_eq!(feed.unread_count(), 2);

    feed.mark_all_as_read();
    assert_eq!(feed.unread_count(), 0);

    feed.receive(&frame("e"));
    assert_eq!(feed.unread_count(), 1);
    assert_eq!(ids(&feed), vec!["e", "d", "a"]);

    feed.clear_all();
    assert_eq!(feed.unread_count(), 0);
}

#[test]
fn test_deleted_id_can_arrive_again() {
    let mut feed = FeedBuilder::new().build();
    feed.receive(&frame("a"));
    feed.mark_as_read("a");
    feed.delete("a");
    feed.receive(&frame("a"));
    assert_eq!(ids(&feed), vec!["a"]);
    assert!(!feed.get("a").unwrap().read);
}

#[test]
fn test_settings_merge_one_level_deep() {
    let mut feed = FeedBuilder::new().build();
    feed.update_settings(
        SettingsPatch::new()
            .category(Category::Stock, false)
            .priority(Priority::Low, false),
    );
    feed.update_settings(SettingsPatch::new().category(Category::Alert, false));

    let settings = feed.settings();
    assert!(!settings.is_category_enabled(Category::Stock));
    assert!(!settings.is_category_enabled(Category::Alert));
    assert!(settings.is_category_enabled(Category::System));
    assert!(settings.is_category_enabled(Category::Portfolio));
    assert!(!settings.is_priority_enabled(Priority::Low));
    assert!(settings.is_priority_enabled(Priority::Urgent));
    assert!(settings.push_enabled);
}

#[test]
fn test_invalid_quiet_hours_rejected_rest_applied() {
    let mut feed = FeedBuilder::new().build();
    feed.update_settings(
        SettingsPatch::new()
            .email_enabled(true)
            .quiet_hours_enabled(true)
            .quiet_hours_window("25:00", "07:30"),
    );

    let settings = feed.settings();
    assert!(settings.email_enabled);
    assert!(settings.quiet_hours.enabled);
    assert_eq!(settings.quiet_hours.start, "22:00");
    assert_eq!(settings.quiet_hours.end, "07:30");
}

#[test]
fn test_failing_desktop_display_keeps_record() {
    let notifier = Arc::new(BrokenNotifier::default());
    let mut feed = FeedBuilder::new()
        .notifier(Arc::clone(&notifier) as Arc<dyn DesktopNotifier>)
        .build();

    feed.receive(&frame("a"));
    feed.receive(&frame("a"));
    feed.receive(&frame("b"));

    assert_eq!(notifier.attempts.load(Ordering::SeqCst), 2);
    assert_eq!(ids(&feed), vec!["b", "a"]);
}

#[test]
fn test_filtered_view() {
    let mut feed = FeedBuilder::new().build();
    let arrivals = [
        ("1", "stock", "low"),
        ("2", "alert", "urgent"),
        ("3", "stock", "urgent"),
        ("4", "system", "medium"),
    ];
    for (id, category, priority) in arrivals {
        feed.receive_envelope(Envelope::notification(data(id, category, priority)));
    }
    feed.mark_as_read("3");

    let urgent: Vec<_> = feed
        .filtered(&FeedFilter::new().priority(Priority::Urgent))
        .iter()
        .map(|n| n.id.as_str())
        .collect();
    assert_eq!(urgent, vec!["3", "2"]);

    let unread_stock: Vec<_> = feed
        .filtered(&FeedFilter::new().category(Category::Stock).unread_only())
        .iter()
        .map(|n| n.id.as_str())
        .collect();
    assert_eq!(unread_stock, vec!["1"]);

    assert_eq!(feed.filtered(&FeedFilter::new().max_items(2)).len(), 2);
}

#[test]
fn test_age_label_buckets() {
    let mut feed = FeedBuilder::new().build();
    let mut d = data("old", "system", "low");
    d["createdAt"] = json!("2026-03-01T12:00:00Z");
    feed.receive_envelope(Envelope::notification(d));
    let record = feed.get("old").unwrap();

    let at = |h: u32, m: u32| Utc.with_ymd_and_hms(2026, 3, 1, h, m, 0).unwrap();
    assert_eq!(record.age_label(at(12, 0)), "just now");
    assert_eq!(record.age_label(at(12, 45)), "45m ago");
    assert_eq!(record.age_label(at(15, 0)), "3h ago");
    assert_eq!(
        record.age_label(Utc.with_ymd_and_hms(2026, 3, 4, 13, 0, 0).unwrap()),
        "3d ago"
    );
}
