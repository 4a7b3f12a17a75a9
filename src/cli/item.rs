//! Item commands

use std::rc::Rc;

use anyhow::{Context, Result};
use serde::Serialize;

use super::context::AppContext;
use super::views::{items_left_label, FooterView};
use crate::controller::EditOutcome;
use crate::domain::{Item, TodoQuery};

/// Counters reported in JSON mode
#[derive(Debug, Serialize)]
struct Counts {
    total: usize,
    active: usize,
    completed: usize,
}

impl Counts {
    fn of(todos: &dyn TodoQuery) -> Self {
        Self {
            total: todos.size(),
            active: todos.incomplete_count(),
            completed: todos.completed_count(),
        }
    }
}

pub fn add(ctx: &mut AppContext, words: &[String]) -> Result<()> {
    let title = words.join(" ");
    if title.trim().is_empty() {
        anyhow::bail!("Title cannot be empty");
    }

    let filter = ctx.config.default_filter;
    ctx.attach_text_views(filter);

    let id = ctx.controller.create(title.as_str())?;
    ctx.output.verbose_ctx("add", &format!("Created {}", id));

    if ctx.output.is_json() {
        let item = ctx
            .controller
            .get_by_id(id.as_str())
            .context("Created item vanished")?;
        ctx.output.data(item);
    } else {
        ctx.output.success(&format!("Created item: {} - {}", id.short(), title));
    }

    Ok(())
}

pub fn list(ctx: &AppContext, filter_arg: Option<&str>) -> Result<()> {
    let filter = ctx.filter(filter_arg);
    ctx.output.verbose_ctx("list", &format!("Listing with filter '{}'", filter));

    if ctx.output.is_json() {
        let items = ctx.controller.filtered(filter);
        ctx.output.data(&serde_json::json!({
            "filter": filter,
            "items": items,
            "counts": Counts::of(&ctx.controller),
        }));
    } else {
        ctx.attach_text_views(filter);
        ctx.controller.notify_views()?;
    }

    Ok(())
}

pub fn show(ctx: &AppContext, id_arg: &str) -> Result<()> {
    let id = ctx.resolve_id(id_arg)?;
    let item = ctx
        .controller
        .get_by_id(id.as_str())
        .with_context(|| format!("Item not found: {}", id))?;

    if ctx.output.is_json() {
        ctx.output.data(item);
    } else {
        print_item(item);
    }

    Ok(())
}

fn print_item(item: &Item) {
    println!("ID:     {}", item.id);
    println!("Title:  {}", item.title);
    println!(
        "Status: {}",
        if item.completed { "completed" } else { "active" }
    );
}

pub fn toggle(ctx: &mut AppContext, id_arg: &str) -> Result<()> {
    let id = ctx.resolve_id(id_arg)?;
    ctx.attach_text_views(ctx.config.default_filter);

    ctx.controller.toggle(id.as_str())?;

    let item = ctx
        .controller
        .get_by_id(id.as_str())
        .with_context(|| format!("Item not found: {}", id))?;
    let state = if item.completed { "completed" } else { "active" };

    if ctx.output.is_json() {
        ctx.output.data(item);
    } else {
        ctx.output
            .success(&format!("Marked {} as {}: {}", id.short(), state, item.title));
    }

    Ok(())
}

pub fn toggle_all(ctx: &mut AppContext, status: Option<bool>) -> Result<()> {
    // Without an explicit status this behaves like the "mark all" checkbox
    let completed = status.unwrap_or_else(|| ctx.controller.incomplete_count() > 0);
    ctx.output
        .verbose_ctx("toggle-all", &format!("Setting completed={}", completed));
    ctx.attach_text_views(ctx.config.default_filter);

    ctx.controller.toggle_all(completed)?;

    if ctx.output.is_json() {
        ctx.output.data(&serde_json::json!({
            "completed": completed,
            "counts": Counts::of(&ctx.controller),
        }));
    } else {
        let state = if completed { "completed" } else { "active" };
        ctx.output
            .success(&format!("Marked {} item(s) as {}", ctx.controller.size(), state));
    }

    Ok(())
}

pub fn edit(ctx: &mut AppContext, id_arg: &str, words: &[String]) -> Result<()> {
    let id = ctx.resolve_id(id_arg)?;
    let title = words.join(" ");
    ctx.attach_text_views(ctx.config.default_filter);

    let outcome = ctx.controller.commit_edit(id.as_str(), &title)?;
    ctx.output
        .verbose_ctx("edit", &format!("Edit of {} -> {:?}", id, outcome));

    match outcome {
        EditOutcome::Edited => {
            if ctx.output.is_json() {
                let item = ctx
                    .controller
                    .get_by_id(id.as_str())
                    .with_context(|| format!("Item not found: {}", id))?;
                ctx.output.data(item);
            } else {
                ctx.output
                    .success(&format!("Updated item: {} - {}", id.short(), title));
            }
        }
        EditOutcome::Removed => {
            ctx.output
                .success(&format!("Removed item {} (empty title)", id.short()));
        }
        EditOutcome::NotFound => anyhow::bail!("Item not found: {}", id),
    }

    Ok(())
}

pub fn remove(ctx: &mut AppContext, id_arg: &str) -> Result<()> {
    let id = ctx.resolve_id(id_arg)?;
    ctx.attach_text_views(ctx.config.default_filter);

    if !ctx.controller.remove(id.as_str())? {
        anyhow::bail!("Item not found: {}", id);
    }

    ctx.output.success(&format!("Removed item {}", id.short()));
    Ok(())
}

pub fn clear_completed(ctx: &mut AppContext) -> Result<()> {
    ctx.attach_text_views(ctx.config.default_filter);

    let removed = ctx.controller.clear_completed()?;

    if ctx.output.is_json() {
        ctx.output.data(&serde_json::json!({
            "removed": removed,
            "counts": Counts::of(&ctx.controller),
        }));
    } else {
        ctx.output
            .success(&format!("Cleared {} completed item(s)", removed));
    }

    Ok(())
}

pub fn status(ctx: &AppContext) -> Result<()> {
    let filter = ctx.config.default_filter;

    if ctx.output.is_json() {
        ctx.output.data(&serde_json::json!({
            "counts": Counts::of(&ctx.controller),
            "summary": items_left_label(ctx.controller.incomplete_count()),
        }));
    } else {
        ctx.controller
            .register_view(Rc::new(FooterView::stdout(filter)));
        ctx.controller.notify_views()?;
    }

    Ok(())
}
