use super::{create_test_storage, reply, say, start_conversation};
use crate::StatsQuery;
use chrono::Utc;
use isp_chat_core::bucket_date;

fn today_for(user_id: Option<&str>) -> StatsQuery {
    StatsQuery {
        date: Some(bucket_date(Utc::now())),
        user_id: user_id.map(str::to_owned),
        ..StatsQuery::default()
    }
}

#[test]
fn test_bucket_counts_messages_by_role_and_level() {
    let (storage, _temp_dir) = create_test_storage();
    let conversation = start_conversation(&storage, Some("1"));
    say(&storage, &conversation.id, "hello");
    reply(&storage, &conversation.id, "hi", 100.0);

    let stats = storage.daily_statistics(&today_for(Some("1"))).unwrap();
    assert_eq!(stats.len(), 1);
    let bucket = &stats[0];
    assert_eq!(bucket.user_id.as_deref(), Some("1"));
    assert_eq!(bucket.total_conversations, 1);
    assert_eq!(bucket.total_messages, 2);
    assert_eq!(bucket.user_messages, 1);
    assert_eq!(bucket.assistant_messages, 1);
    assert_eq!(bucket.total_tokens, 7);
    assert_eq!(bucket.message_levels.low, 1);
    assert_eq!(bucket.message_levels.mid, 1);
    assert_eq!(bucket.total_api_calls, 1);
}

#[test]
fn test_running_average_over_three_replies() {
    let (storage, _temp_dir) = create_test_storage();
    let conversation = start_conversation(&storage, Some("1"));
    reply(&storage, &conversation.id, "a", 100.0);
    reply(&storage, &conversation.id, "b", 200.0);
    reply(&storage, &conversation.id, "c", 300.0);

    let bucket = storage.daily_statistics(&today_for(Some("1"))).unwrap().remove(0);
    assert!((bucket.avg_response_time_ms - 200.0).abs() < 1e-9);
}

#[test]
fn test_zero_latency_replies_leave_average_alone() {
    let (storage, _temp_dir) = create_test_storage();
    let conversation = start_conversation(&storage, Some("1"));
    reply(&storage, &conversation.id, "a", 100.0);
    reply(&storage, &conversation.id, "b", 0.0);

    let bucket = storage.daily_statistics(&today_for(Some("1"))).unwrap().remove(0);
    assert_eq!(bucket.assistant_messages, 2);
    assert!((bucket.avg_response_time_ms - 100.0).abs() < 1e-9);
}

#[test]
fn test_anonymous_bucket_is_separate() {
    let (storage, _temp_dir) = create_test_storage();
    let anonymous = start_conversation(&storage, None);
    let named = start_conversation(&storage, Some("1"));
    say(&storage, &anonymous.id, "hello");
    say(&storage, &named.id, "hello");
    say(&storage, &named.id, "again");

    let anon = storage.daily_statistics(&today_for(Some("ANONYMOUS"))).unwrap();
    assert_eq!(anon.len(), 1);
    assert!(anon[0].user_id.is_none());
    assert_eq!(anon[0].total_messages, 1);

    let all = storage.daily_statistics(&today_for(None)).unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all.iter().map(|b| b.total_messages).sum::<u64>(), 3);
}

#[test]
fn test_window_query_includes_today() {
    let (storage, _temp_dir) = create_test_storage();
    let conversation = start_conversation(&storage, Some("1"));
    say(&storage, &conversation.id, "hello");

    let stats = storage
        .daily_statistics(&StatsQuery { days: 1, ..StatsQuery::default() })
        .unwrap();
    assert_eq!(stats.len(), 1);
    assert_eq!(stats[0].date, bucket_date(Utc::now()));
}

#[test]
fn test_unknown_date_returns_empty() {
    let (storage, _temp_dir) = create_test_storage();
    start_conversation(&storage, Some("1"));

    let stats = storage
        .daily_statistics(&StatsQuery { date: Some("1999-01-01".to_owned()), ..StatsQuery::default() })
        .unwrap();
    assert!(stats.is_empty());
}
