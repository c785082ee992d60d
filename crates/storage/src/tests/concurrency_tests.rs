use std::collections::HashSet;
use std::sync::Arc;

use super::{create_test_storage, start_conversation};
use crate::StatsQuery;
use crate::traits::{MessageStore, StatsStore};
use isp_chat_core::NewMessage;

#[test]
fn test_concurrent_appends_get_distinct_indexes() {
    let (storage, _temp_dir) = create_test_storage();
    let conversation = start_conversation(&storage, Some("20"));
    let storage = Arc::new(storage);

    let handles: Vec<_> = (0..8)
        .map(|t| {
            let storage = Arc::clone(&storage);
            let id = conversation.id.clone();
            std::thread::spawn(move || {
                (0..5)
                    .map(|i| {
                        storage
                            .append_message(
                                &NewMessage::assistant(&id, format!("t{t} m{i}"))
                                    .response_time_ms(100.0),
                            )
                            .unwrap()
                            .message_index
                    })
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let indexes: Vec<u32> = handles.into_iter().flat_map(|h| h.join().unwrap()).collect();
    let unique: HashSet<u32> = indexes.iter().copied().collect();
    assert_eq!(indexes.len(), 40);
    assert_eq!(unique.len(), 40);
    assert_eq!(unique.iter().max(), Some(&40));

    let bucket = storage.daily_statistics(&StatsQuery::default()).unwrap().remove(0);
    assert_eq!(bucket.total_messages, 40);
    assert_eq!(bucket.assistant_messages, 40);
    assert!((bucket.avg_response_time_ms - 100.0).abs() < 1e-9);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_async_appends_share_one_bucket() {
    let (storage, _temp_dir) = create_test_storage();
    let conversations: Vec<_> = (0..4).map(|_| start_conversation(&storage, Some("21"))).collect();

    let mut tasks = Vec::new();
    for conversation in &conversations {
        for i in 0..5 {
            let storage = storage.clone();
            let id = conversation.id.clone();
            tasks.push(tokio::spawn(async move {
                MessageStore::append_message(&storage, &NewMessage::user(id, format!("m{i}")))
                    .await
                    .unwrap()
            }));
        }
    }
    for task in tasks {
        task.await.unwrap();
    }

    let stats = StatsStore::daily_statistics(
        &storage,
        &StatsQuery { user_id: Some("21".to_owned()), ..StatsQuery::default() },
    )
    .await
    .unwrap();
    assert_eq!(stats.len(), 1);
    assert_eq!(stats[0].total_conversations, 4);
    assert_eq!(stats[0].total_messages, 20);
    assert_eq!(stats[0].user_messages, 20);
}
