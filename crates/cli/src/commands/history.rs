use anyhow::Result;
use isp_chat_core::ConversationFilter;
use isp_chat_service::HistoryService;
use serde::Serialize;

use crate::open_storage;

async fn history_service() -> Result<HistoryService> {
    Ok(HistoryService::new(open_storage().await?))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub(crate) async fn run_stats(date: Option<String>, user_id: Option<String>, days: u32) -> Result<()> {
    let service = history_service().await?;
    let stats = service.daily_statistics(date.as_deref(), user_id.as_deref(), days).await?;
    print_json(&stats)
}

pub(crate) async fn run_conversations(user_id: Option<String>, limit: usize) -> Result<()> {
    let service = history_service().await?;
    let page = match user_id {
        Some(user_id) => service.user_conversations(&user_id, 0, limit).await?,
        None => service.list_conversations(&ConversationFilter::default(), 0, limit).await?,
    };
    print_json(&page)
}

pub(crate) async fn run_search(term: String, user_id: Option<String>, limit: usize) -> Result<()> {
    let service = history_service().await?;
    let page = service.search(&term, user_id.as_deref(), 0, limit).await?;
    print_json(&page)
}

pub(crate) async fn run_delete_user(user_id: String) -> Result<()> {
    let service = history_service().await?;
    let result = service.delete_user(&user_id).await?;
    print_json(&result)
}

pub(crate) async fn run_purge(confirm: bool) -> Result<()> {
    if !confirm {
        anyhow::bail!("refusing to purge all chat history without --confirm");
    }
    let service = history_service().await?;
    let counts = service.purge_all(true).await?;
    print_json(&counts)
}
