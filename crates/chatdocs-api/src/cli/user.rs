//! User account commands: add, list, delete.

use anyhow::Result;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;

use chatdocs_types::user::{RegisterUserRequest, Role, UserId};

use crate::state::AppState;

pub async fn add_user(
    state: &AppState,
    request: RegisterUserRequest,
    json: bool,
) -> Result<()> {
    let user = state.users.register(request).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&user)?);
        return Ok(());
    }

    println!();
    println!("  {} User registered", style("✓").green().bold());
    println!("  {}  {}", style("ID:").bold(), user.id);
    println!("  {}  {}", style("Email:").bold(), style(&user.email).cyan());
    println!(
        "  {}  {}",
        style("Roles:").bold(),
        chatdocs_types::user::format_roles(&user.roles)
    );
    println!();
    Ok(())
}

pub async fn list_users(state: &AppState, json: bool) -> Result<()> {
    let users = state.users.list_users().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&users)?);
        return Ok(());
    }

    if users.is_empty() {
        println!();
        println!(
            "  {} No users yet. Add one with: {}",
            style("i").blue().bold(),
            style("chatdocs user add").yellow()
        );
        println!();
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("ID").fg(Color::White),
        Cell::new("Username").fg(Color::White),
        Cell::new("Email").fg(Color::White),
        Cell::new("Roles").fg(Color::White),
        Cell::new("Created").fg(Color::White),
    ]);

    for user in &users {
        let roles = if user.has_role(Role::Admin) {
            Cell::new("ADMIN").fg(Color::Yellow)
        } else {
            Cell::new("USER")
        };
        table.add_row(vec![
            Cell::new(user.id).fg(Color::DarkGrey),
            Cell::new(&user.username).fg(Color::Cyan),
            Cell::new(&user.email),
            roles,
            Cell::new(user.created_at.format("%Y-%m-%d %H:%M")).fg(Color::DarkGrey),
        ]);
    }

    println!();
    println!("{table}");
    println!();
    println!(
        "  {} user{}",
        style(users.len()).bold(),
        if users.len() == 1 { "" } else { "s" }
    );
    println!();
    Ok(())
}

/// Delete a user after cascading over their chatbots.
pub async fn delete_user(state: &AppState, id: i64, json: bool) -> Result<()> {
    let result = state.user_deletion.delete_user(UserId(id)).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    println!();
    println!(
        "  {} Deleted user {} and {} chatbot{}",
        style("✓").green().bold(),
        result.user_id,
        result.chatbots_deleted.len(),
        if result.chatbots_deleted.len() == 1 { "" } else { "s" }
    );
    println!();
    Ok(())
}
