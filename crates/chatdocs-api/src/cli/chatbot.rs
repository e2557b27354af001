//! Chatbot commands: list, delete, objects.

use anyhow::Result;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;

use chatdocs_core::storage::ObjectStore;
use chatdocs_types::chatbot::ChatbotId;
use chatdocs_types::user::UserId;

use crate::state::AppState;

pub async fn list_chatbots(state: &AppState, owner: i64, json: bool) -> Result<()> {
    let chatbots = state.chatbots.list_for_owner(UserId(owner)).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&chatbots)?);
        return Ok(());
    }

    if chatbots.is_empty() {
        println!();
        println!("  {} User {owner} has no chatbots", style("i").blue().bold());
        println!();
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("ID").fg(Color::White),
        Cell::new("Name").fg(Color::White),
        Cell::new("Prefix").fg(Color::White),
        Cell::new("Created").fg(Color::White),
    ]);
    for chatbot in &chatbots {
        table.add_row(vec![
            Cell::new(chatbot.id).fg(Color::DarkGrey),
            Cell::new(&chatbot.name).fg(Color::Cyan),
            Cell::new(chatbot.object_prefix()),
            Cell::new(chatbot.created_at.format("%Y-%m-%d %H:%M")).fg(Color::DarkGrey),
        ]);
    }

    println!();
    println!("{table}");
    println!();
    Ok(())
}

pub async fn delete_chatbot(state: &AppState, id: i64, owner: i64, json: bool) -> Result<()> {
    let deleted = state.deletion.delete(ChatbotId(id), UserId(owner)).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&deleted)?);
        return Ok(());
    }

    println!();
    println!(
        "  {} Deleted chatbot {} ({} stored object{} removed)",
        style("✓").green().bold(),
        deleted.chatbot_id,
        deleted.objects_deleted,
        if deleted.objects_deleted == 1 { "" } else { "s" }
    );
    println!();
    Ok(())
}

/// Print every key under the chatbot's prefix. Handy after a failed
/// deletion or rollback.
pub async fn list_objects(state: &AppState, id: i64, owner: i64, json: bool) -> Result<()> {
    let chatbot = state
        .chatbots
        .get_for_owner(ChatbotId(id), UserId(owner))
        .await?;
    let keys = state.objects.list_keys(&chatbot.object_prefix()).await?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "chatbot_id": chatbot.id,
                "prefix": chatbot.object_prefix(),
                "keys": keys,
            }))?
        );
        return Ok(());
    }

    println!();
    println!(
        "  {} {}",
        style("Prefix:").bold(),
        style(chatbot.object_prefix()).cyan()
    );
    if keys.is_empty() {
        println!("  {}", style("(no objects)").dim());
    }
    for key in &keys {
        println!("    {} {key}", style("•").dim());
    }
    println!();
    Ok(())
}
