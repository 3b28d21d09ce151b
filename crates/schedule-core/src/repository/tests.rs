//! Repository Integration Tests
//!
//! Tests for MemoryStore through the ScheduleStore trait.

#[cfg(test)]
mod tests {
    use crate::domain::{ItemId, NewScheduleItem, ParsedDraft, ScheduleUpdate, UserId};
    use crate::error::StoreError;
    use crate::repository::{MemoryStore, ScheduleStore};
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicI64, Ordering};
    use std::sync::Arc;

    fn base_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap()
    }

    /// Store whose clock advances one minute per reading
    fn setup_store() -> MemoryStore {
        let ticks = Arc::new(AtomicI64::new(0));
        MemoryStore::with_clock(Box::new(move || {
            base_time() + Duration::minutes(ticks.fetch_add(1, Ordering::SeqCst))
        }))
    }

    fn new_item(user: &str, title: &str, parent: Option<&ItemId>) -> NewScheduleItem {
        NewScheduleItem::from_draft(
            UserId::from(user),
            &ParsedDraft::literal(title),
            parent.cloned(),
            false,
        )
    }

    fn dated_item(title: &str, date: Option<DateTime<Utc>>) -> NewScheduleItem {
        let mut draft = ParsedDraft::literal(title);
        draft.scheduled_date = date;
        NewScheduleItem::from_draft(UserId::from("u1"), &draft, None, false)
    }

    #[tokio::test]
    async fn test_create_item() {
        let store = setup_store();
        let id = store.create(new_item("u1", "Test item", None)).await.expect("Failed to create");

        let created = store.get(&id).expect("missing");
        assert_eq!(created.title, "Test item");
        assert!(!created.is_completed);
        assert_eq!(created.created_at, Some(base_time()));
    }

    #[tokio::test]
    async fn test_subscription_filters_by_owner() {
        let store = setup_store();
        store.create(new_item("u1", "mine", None)).await.unwrap();
        store.create(new_item("u2", "theirs", None)).await.unwrap();

        let mut sub = store.subscribe(&UserId::from("u1")).await.unwrap();
        let snapshot = sub.next().await.unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].title, "mine");
    }

    #[tokio::test]
    async fn test_subscription_sees_mutations() {
        let store = setup_store();
        let user = UserId::from("u1");
        let mut sub = store.subscribe(&user).await.unwrap();
        assert!(sub.next().await.unwrap().is_empty());

        let id = store.create(new_item("u1", "later", None)).await.unwrap();
        let snapshot = sub.next().await.unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].id, id);

        store.delete(&id).await.unwrap();
        assert!(sub.next().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_snapshot_is_ordered_by_date_then_creation() {
        let store = setup_store();
        let at = |hours: i64| Some(base_time() + Duration::hours(hours));
        for (title, date) in [
            ("late", at(3)),
            ("undated first", None),
            ("early", at(1)),
            ("undated second", None),
            ("early created later", at(1)),
        ] {
            store.create(dated_item(title, date)).await.unwrap();
        }

        let mut sub = store.subscribe(&UserId::from("u1")).await.unwrap();
        let titles: Vec<String> = sub.next().await.unwrap().into_iter().map(|i| i.title).collect();
        assert_eq!(
            titles,
            vec!["early", "early created later", "late", "undated first", "undated second"]
        );
    }

    #[tokio::test]
    async fn test_snapshot_breaks_full_ties_by_id() {
        let store = setup_store();
        let id = store.create(new_item("u1", "twin", None)).await.unwrap();
        let original = store.get(&id).unwrap();
        let mut b = original.clone();
        b.id = ItemId::from("b");
        let mut a = original;
        a.id = ItemId::from("a");
        store.seed(vec![b, a]);

        let sub = store.subscribe(&UserId::from("u1")).await.unwrap();
        let ids: Vec<ItemId> = sub.current().into_iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![ItemId::from("a"), ItemId::from("b")]);
    }

    #[tokio::test]
    async fn test_complete_then_uncomplete_only_touches_updated_at() {
        let store = setup_store();
        let id = store.create(new_item("u1", "toggle me", None)).await.unwrap();
        let before = store.get(&id).unwrap();

        store.set_completed(&id, true).await.unwrap();
        assert!(store.get(&id).unwrap().is_completed);
        store.set_completed(&id, false).await.unwrap();

        let mut after = store.get(&id).unwrap();
        assert!(after.updated_at > before.updated_at);
        after.updated_at = before.updated_at;
        assert_eq!(after, before);
    }

    #[tokio::test]
    async fn test_update_unknown_item() {
        let store = setup_store();
        let missing = ItemId::from("nope");
        let result = store.update(&missing, ScheduleUpdate::title("x")).await;
        assert_eq!(result, Err(StoreError::NotFound(missing.clone())));
        assert_eq!(store.delete(&missing).await, Err(StoreError::NotFound(missing)));
    }

    #[tokio::test]
    async fn test_parent_must_exist_and_share_owner() {
        let store = setup_store();
        let parent = store.create(new_item("u1", "parent", None)).await.unwrap();
        let child = store.create(new_item("u1", "child", Some(&parent))).await.unwrap();
        assert_eq!(store.get(&child).unwrap().parent_id, Some(parent.clone()));

        let missing = ItemId::from("ghost");
        assert_eq!(
            store.create(new_item("u1", "orphan", Some(&missing))).await,
            Err(StoreError::NotFound(missing))
        );
        assert!(matches!(
            store.create(new_item("u2", "intruder", Some(&parent))).await,
            Err(StoreError::Permission(_))
        ));
        assert!(store.update(&child, ScheduleUpdate::parent(Some(child.clone()))).await.is_err());
    }

    #[tokio::test]
    async fn test_reparent_changes_only_parent() {
        let store = setup_store();
        let a = store.create(new_item("u1", "a", None)).await.unwrap();
        let b = store.create(new_item("u1", "b", None)).await.unwrap();
        let before = store.get(&b).unwrap();

        store.update(&b, ScheduleUpdate::parent(Some(a.clone()))).await.unwrap();
        let after = store.get(&b).unwrap();
        assert_eq!(after.parent_id, Some(a));
        assert_eq!(after.title, before.title);
        assert_eq!(after.scheduled_date, before.scheduled_date);
        assert_eq!(after.is_completed, before.is_completed);
    }

    #[tokio::test]
    async fn test_subscription_ends_with_store() {
        let store = setup_store();
        let mut sub = store.subscribe(&UserId::from("u1")).await.unwrap();
        assert!(sub.next().await.is_some());
        drop(store);
        assert!(sub.next().await.is_none());
    }
}
