use std::collections::HashSet;

use chrono::{Duration, Utc};
use murmur_core::backend::{Backend, MemoryBackend, User};
use murmur_core::filter::{self, Selector};
use murmur_core::tag::TAG_PALETTE;
use murmur_core::{ops, tags};

fn backend() -> MemoryBackend {
    MemoryBackend::new(User {
        id: "user_1".to_string(),
        email: Some("ada@example.com".to_string()),
    })
}

const USER: &str = "user_1";

#[tokio::test]
async fn created_task_appears_in_all_and_pending_only() {
    let store = backend();
    let now = Utc::now();

    ops::create_task(&store, USER, "Buy milk", now)
        .await
        .expect("create task");

    let all = ops::load_tasks(&store, USER).await.expect("load tasks");
    let pending = filter::resolve(&store, &all, &Selector::Pending, now)
        .await
        .expect("pending view");
    let completed = filter::resolve(&store, &all, &Selector::Completed, now)
        .await
        .expect("completed view");

    assert_eq!(all.len(), 1);
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].title, "Buy milk");
    assert!(completed.is_empty());
}

#[tokio::test]
async fn pending_and_completed_partition_the_store() {
    let store = backend();
    let now = Utc::now();

    for title in ["one", "two", "three"] {
        ops::create_task(&store, USER, title, now).await.expect("create task");
    }
    let all = ops::load_tasks(&store, USER).await.expect("load tasks");
    ops::toggle_complete(&store, &all[1], now).await.expect("toggle");

    let all = ops::load_tasks(&store, USER).await.expect("reload tasks");
    let pending = filter::resolve(&store, &all, &Selector::Pending, now)
        .await
        .expect("pending view");
    let completed = filter::resolve(&store, &all, &Selector::Completed, now)
        .await
        .expect("completed view");

    assert_eq!(pending.len() + completed.len(), all.len());
    let union: HashSet<&str> = pending
        .iter()
        .chain(completed.iter())
        .map(|task| task.id.as_str())
        .collect();
    assert_eq!(union.len(), all.len());
}

#[tokio::test]
async fn toggling_twice_restores_the_flag() {
    let store = backend();
    let now = Utc::now();

    let task = ops::create_task(&store, USER, "flip me", now)
        .await
        .expect("create task");
    let original = task.completed;

    ops::toggle_complete(&store, &task, now).await.expect("first toggle");
    let task = ops::load_tasks(&store, USER).await.expect("load")[0].clone();
    assert!(task.is_completed());

    ops::toggle_complete(&store, &task, now).await.expect("second toggle");
    let task = ops::load_tasks(&store, USER).await.expect("load")[0].clone();
    assert_eq!(task.completed, original);
}

#[tokio::test]
async fn yesterday_deadline_is_overdue_until_completed() {
    let store = backend();
    let now = Utc::now();

    let task = ops::create_task(&store, USER, "late already", now)
        .await
        .expect("create task");
    ops::set_deadline(&store, &task.id, Some(now - Duration::days(1)), now)
        .await
        .expect("set deadline");

    let all = ops::load_tasks(&store, USER).await.expect("load tasks");
    let overdue = filter::resolve(&store, &all, &Selector::Overdue, now)
        .await
        .expect("overdue view");
    let pending = filter::resolve(&store, &all, &Selector::Pending, now)
        .await
        .expect("pending view");
    assert_eq!(overdue.len(), 1);
    assert_eq!(pending.len(), 1);

    // Overdue is a subset of pending: completing the task removes it.
    ops::toggle_complete(&store, &all[0], now).await.expect("complete");
    let all = ops::load_tasks(&store, USER).await.expect("reload tasks");
    let overdue = filter::resolve(&store, &all, &Selector::Overdue, now)
        .await
        .expect("overdue view");
    assert!(overdue.is_empty());
}

#[tokio::test]
async fn clearing_a_deadline_removes_it() {
    let store = backend();
    let now = Utc::now();

    let task = ops::create_task(&store, USER, "no rush", now)
        .await
        .expect("create task");
    ops::set_deadline(&store, &task.id, Some(now), now)
        .await
        .expect("set deadline");
    assert!(ops::load_tasks(&store, USER).await.expect("load")[0].deadline.is_some());

    ops::set_deadline(&store, &task.id, None, now)
        .await
        .expect("clear deadline");
    assert!(ops::load_tasks(&store, USER).await.expect("load")[0].deadline.is_none());
}

#[tokio::test]
async fn empty_titles_and_names_are_rejected_before_any_write() {
    let store = backend();
    let now = Utc::now();

    assert!(ops::create_task(&store, USER, "   ", now).await.is_err());
    assert!(tags::create_tag(&store, USER, " \t ", TAG_PALETTE[0], now).await.is_err());
    assert!(ops::load_tasks(&store, USER).await.expect("load tasks").is_empty());
    assert!(tags::load_tags(&store, USER).await.expect("load tags").is_empty());

    let task = ops::create_task(&store, USER, "keep me", now)
        .await
        .expect("create task");
    assert!(ops::rename_task(&store, &task.id, "", now).await.is_err());
    let reloaded = ops::load_tasks(&store, USER).await.expect("reload");
    assert_eq!(reloaded[0].title, "keep me");
}

#[tokio::test]
async fn colors_come_from_the_palette() {
    let store = backend();
    let now = Utc::now();

    assert!(tags::create_tag(&store, USER, "errands", "#101010", now).await.is_err());
    let tag = tags::create_tag(&store, USER, "errands", TAG_PALETTE[3], now)
        .await
        .expect("create tag");
    assert_eq!(tag.color, TAG_PALETTE[3]);
}

#[tokio::test]
async fn replacing_a_tag_set_reaches_the_exact_end_state() {
    let store = backend();
    let now = Utc::now();

    let task = ops::create_task(&store, USER, "organize", now)
        .await
        .expect("create task");
    let a = tags::create_tag(&store, USER, "a", TAG_PALETTE[0], now).await.expect("tag a");
    let b = tags::create_tag(&store, USER, "b", TAG_PALETTE[1], now).await.expect("tag b");
    let c = tags::create_tag(&store, USER, "c", TAG_PALETTE[2], now).await.expect("tag c");

    tags::replace_task_tags(&store, &task.id, &[a.id.clone(), b.id.clone()], now)
        .await
        .expect("first replace");
    tags::replace_task_tags(&store, &task.id, &[b.id.clone(), c.id.clone()], now)
        .await
        .expect("second replace");

    let linked: HashSet<String> = store
        .list_task_associations(&task.id)
        .await
        .expect("list associations")
        .into_iter()
        .map(|association| association.tag_id)
        .collect();
    let expected: HashSet<String> = [b.id.clone(), c.id.clone()].into_iter().collect();
    assert_eq!(linked, expected);

    // A duplicated desired id still yields a single row.
    tags::replace_task_tags(&store, &task.id, &[c.id.clone(), c.id.clone()], now)
        .await
        .expect("dedup replace");
    let rows = store
        .list_task_associations(&task.id)
        .await
        .expect("list associations");
    assert_eq!(rows.len(), 1);
}

#[tokio::test]
async fn deleting_a_tag_cascades_and_empties_its_filter() {
    let store = backend();
    let now = Utc::now();

    let task = ops::create_task(&store, USER, "tagged", now)
        .await
        .expect("create task");
    let tag = tags::create_tag(&store, USER, "errands", TAG_PALETTE[0], now)
        .await
        .expect("create tag");
    tags::replace_task_tags(&store, &task.id, &[tag.id.clone()], now)
        .await
        .expect("attach tag");

    tags::delete_tag(&store, &tag.id).await.expect("delete tag");

    assert!(
        store
            .list_tag_associations(&tag.id)
            .await
            .expect("list associations")
            .is_empty()
    );
    assert!(tags::load_tags(&store, USER).await.expect("load tags").is_empty());

    let all = ops::load_tasks(&store, USER).await.expect("load tasks");
    let selector = Selector::Tag {
        id: tag.id.clone(),
        name: tag.name.clone(),
    };
    let by_tag = filter::resolve(&store, &all, &selector, now)
        .await
        .expect("tag view");
    assert!(by_tag.is_empty());
}

#[tokio::test]
async fn deleting_a_task_cascades_its_associations() {
    let store = backend();
    let now = Utc::now();

    let task = ops::create_task(&store, USER, "short lived", now)
        .await
        .expect("create task");
    let tag = tags::create_tag(&store, USER, "errands", TAG_PALETTE[0], now)
        .await
        .expect("create tag");
    tags::replace_task_tags(&store, &task.id, &[tag.id.clone()], now)
        .await
        .expect("attach tag");

    ops::delete_task(&store, &task.id).await.expect("delete task");

    assert!(ops::load_tasks(&store, USER).await.expect("load tasks").is_empty());
    assert!(
        store
            .list_tag_associations(&tag.id)
            .await
            .expect("list associations")
            .is_empty()
    );
}

#[tokio::test]
async fn lists_come_back_newest_first() {
    let store = backend();
    let base = Utc::now();

    for (offset, title) in ["oldest", "middle", "newest"].iter().enumerate() {
        ops::create_task(&store, USER, title, base + Duration::minutes(offset as i64))
            .await
            .expect("create task");
    }

    let all = ops::load_tasks(&store, USER).await.expect("load tasks");
    let titles: Vec<&str> = all.iter().map(|task| task.title.as_str()).collect();
    assert_eq!(titles, vec!["newest", "middle", "oldest"]);
}
