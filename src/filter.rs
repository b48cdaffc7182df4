//! Read-only views over the notification list.

use crate::types::{Category, NotificationRecord, Priority};

/// Which records a list view shows.
///
/// Every criterion is optional; an empty filter shows everything. Filtering
/// never reorders: the result keeps the feed's newest-first order, and
/// `max_items` truncates after the other criteria have been applied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeedFilter {
    /// Only this category.
    pub category: Option<Category>,
    /// Only this priority.
    pub priority: Option<Priority>,
    /// Only unread records.
    pub unread_only: bool,
    /// At most this many records.
    pub max_items: Option<usize>,
}

impl FeedFilter {
    /// Filter that shows everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict to one category.
    #[must_use]
    pub fn category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    /// Restrict to one priority.
    #[must_use]
    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Hide read records.
    #[must_use]
    pub fn unread_only(mut self) -> Self {
        self.unread_only = true;
        self
    }

    /// Cap the number of records.
    #[must_use]
    pub fn max_items(mut self, max: usize) -> Self {
        self.max_items = Some(max);
        self
    }

    /// Whether `record` passes every criterion except `max_items`.
    pub fn matches(&self, record: &NotificationRecord) -> bool {
        self.category.map_or(true, |c| record.category == c)
            && self.priority.map_or(true, |p| record.priority == p)
            && !(self.unread_only && record.read)
    }

    /// Matching records, in list order.
    pub fn apply<'a>(&self, records: &'a [NotificationRecord]) -> Vec<&'a NotificationRecord> {
        let matching = records.iter().filter(|r| self.matches(r));
        match self.max_items {
            Some(max) => matching.take(max).collect(),
            None => matching.collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NotificationKind;
    use chrono::Utc;

    fn record(id: &str, category: Category, priority: Priority, read: bool) -> NotificationRecord {
        NotificationRecord {
            id: id.to_string(),
            kind: NotificationKind::Push,
            priority,
            category,
            title: format!("title {id}"),
            message: String::new(),
            created_at: Utc::now(),
            read,
            action_url: None,
            metadata: None,
        }
    }

    fn sample() -> Vec<NotificationRecord> {
        vec![
            record("4", Category::Stock, Priority::Urgent, false),
            record("3", Category::System, Priority::Low, true),
            record("2", Category::Stock, Priority::Low, true),
            record("1", Category::Alert, Priority::Urgent, false),
        ]
    }

    fn ids(view: &[&NotificationRecord]) -> Vec<String> {
        view.iter().map(|r| r.id.clone()).collect()
    }

    #[test]
    fn test_empty_filter_shows_all_in_order() {
        let records = sample();
        assert_eq!(ids(&FeedFilter::new().apply(&records)), vec!["4", "3", "2", "1"]);
    }

    #[test]
    fn test_category_and_priority() {
        let records = sample();
        let view = FeedFilter::new().category(Category::Stock).apply(&records);
        assert_eq!(ids(&view), vec!["4", "2"]);

        let view = FeedFilter::new()
            .category(Category::Stock)
            .priority(Priority::Low)
            .apply(&records);
        assert_eq!(ids(&view), vec!["2"]);
    }

    #[test]
    fn test_unread_only() {
        let records = sample();
        let view = FeedFilter::new().unread_only().apply(&records);
        assert_eq!(ids(&view), vec!["4", "1"]);
    }

    #[test]
    fn test_max_items_applies_after_filtering() {
        let records = sample();
        let view = FeedFilter::new().priority(Priority::Low).max_items(1).apply(&records);
        assert_eq!(ids(&view), vec!["3"]);
        assert!(FeedFilter::new().max_items(0).apply(&records).is_empty());
        assert_eq!(FeedFilter::new().max_items(10).apply(&records).len(), 4);
    }
}
