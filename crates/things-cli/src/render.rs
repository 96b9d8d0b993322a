//! [`Renderable`] implementations for the records the library returns.

use crate::output::{Renderable, json_object, pretty_kv, pretty_rule, pretty_section};
use serde::Serialize;
use std::fmt::Display;
use std::io::{self, Write};
use things_core::model::{Area, ChecklistItem, Parent, Status, Tag, Task, TaskType};

const NONE: &str = "-";

/// Check box drawn in front of a task or checklist item.
const fn status_box(status: Status) -> &'static str {
    match status {
        Status::Incomplete => "[ ]",
        Status::Completed => "[x]",
        Status::Canceled => "[-]",
    }
}

/// A text-mode cell: tabs and line breaks would split the row.
fn cell(value: &str) -> String {
    value.replace(['\t', '\n', '\r'], " ")
}

fn opt<T: Display>(value: Option<T>) -> String {
    value.map_or_else(|| NONE.to_string(), |v| v.to_string())
}

fn parent_label(parent: Option<&Parent>) -> Option<String> {
    parent.map(|p| p.title.clone().unwrap_or_else(|| p.uuid.clone()))
}

impl Renderable for Task {
    fn render_human(&self, w: &mut dyn Write) -> io::Result<()> {
        let kind = if self.task_type == TaskType::Todo {
            String::new()
        } else {
            format!(" ({})", self.task_type)
        };
        writeln!(w, "{} {}{kind}", status_box(self.status), self.title)?;

        let mut details = Vec::new();
        if let Some(date) = self.start_date {
            details.push(format!("when {date}"));
        }
        if let Some(deadline) = self.deadline {
            details.push(format!("due {deadline}"));
        }
        if let Some(label) = parent_label(self.project.as_ref()) {
            details.push(format!("project {label}"));
        } else if let Some(label) = parent_label(self.area.as_ref()) {
            details.push(format!("area {label}"));
        }
        if !self.tags.is_empty() {
            details.push(format!("#{}", self.tags.join(" #")));
        }
        if !details.is_empty() {
            writeln!(w, "    {}", details.join("  "))?;
        }
        Ok(())
    }

    fn render_json(&self, w: &mut dyn Write) -> io::Result<()> {
        json_object(w, self)
    }

    fn render_table(&self, w: &mut dyn Write) -> io::Result<()> {
        writeln!(
            w,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}",
            self.uuid,
            self.task_type,
            self.status,
            self.start,
            opt(self.start_date),
            opt(self.deadline),
            cell(&self.title)
        )
    }

    fn table_headers() -> &'static [&'static str] {
        &[
            "UUID", "TYPE", "STATUS", "START", "START_DATE", "DEADLINE", "TITLE",
        ]
    }
}

impl Renderable for Area {
    fn render_human(&self, w: &mut dyn Write) -> io::Result<()> {
        if self.tags.is_empty() {
            writeln!(w, "{}", self.title)
        } else {
            writeln!(w, "{}  #{}", self.title, self.tags.join(" #"))
        }
    }

    fn render_json(&self, w: &mut dyn Write) -> io::Result<()> {
        json_object(w, self)
    }

    fn render_table(&self, w: &mut dyn Write) -> io::Result<()> {
        writeln!(
            w,
            "{}\t{}\t{}",
            self.uuid,
            cell(&self.title),
            cell(&self.tags.join(","))
        )
    }

    fn table_headers() -> &'static [&'static str] {
        &["UUID", "TITLE", "TAGS"]
    }
}

impl Renderable for Tag {
    fn render_human(&self, w: &mut dyn Write) -> io::Result<()> {
        match &self.shortcut {
            Some(key) => writeln!(w, "#{}  ({key})", self.title),
            None => writeln!(w, "#{}", self.title),
        }
    }

    fn render_json(&self, w: &mut dyn Write) -> io::Result<()> {
        json_object(w, self)
    }

    fn render_table(&self, w: &mut dyn Write) -> io::Result<()> {
        writeln!(
            w,
            "{}\t{}\t{}",
            self.uuid,
            cell(&self.title),
            self.shortcut
                .as_deref()
                .map_or_else(|| NONE.to_string(), cell)
        )
    }

    fn table_headers() -> &'static [&'static str] {
        &["UUID", "TITLE", "SHORTCUT"]
    }
}

impl Renderable for ChecklistItem {
    fn render_human(&self, w: &mut dyn Write) -> io::Result<()> {
        writeln!(w, "  {} {}", status_box(self.status), self.title)
    }

    fn render_json(&self, w: &mut dyn Write) -> io::Result<()> {
        json_object(w, self)
    }

    fn render_table(&self, w: &mut dyn Write) -> io::Result<()> {
        writeln!(w, "{}\t{}\t{}", self.uuid, self.status, cell(&self.title))
    }

    fn table_headers() -> &'static [&'static str] {
        &["UUID", "STATUS", "TITLE"]
    }
}

/// One task with its checklist, as printed by `show`.
#[derive(Debug, Serialize)]
pub struct TaskDetail {
    #[serde(flatten)]
    pub task: Task,
    pub checklist: Vec<ChecklistItem>,
}

impl Renderable for TaskDetail {
    fn render_human(&self, w: &mut dyn Write) -> io::Result<()> {
        let task = &self.task;
        pretty_section(
            w,
            &format!("{} {}", status_box(task.status), task.title),
        )?;
        pretty_kv(w, "UUID", &task.uuid)?;
        pretty_kv(w, "Type", task.task_type.to_string())?;
        pretty_kv(w, "Status", task.status.to_string())?;
        pretty_kv(w, "List", task.start.to_string())?;
        pretty_kv(w, "When", opt(task.start_date))?;
        pretty_kv(w, "Deadline", opt(task.deadline))?;
        pretty_kv(w, "Reminder", opt(task.reminder_time.map(|t| t.format("%H:%M"))))?;
        pretty_kv(w, "Area", parent_label(task.area.as_ref()).unwrap_or_else(|| NONE.into()))?;
        pretty_kv(
            w,
            "Project",
            parent_label(task.project.as_ref()).unwrap_or_else(|| NONE.into()),
        )?;
        pretty_kv(
            w,
            "Heading",
            parent_label(task.heading.as_ref()).unwrap_or_else(|| NONE.into()),
        )?;
        if !task.tags.is_empty() {
            pretty_kv(w, "Tags", task.tags.join(", "))?;
        }
        pretty_kv(w, "Created", opt(task.created.map(|t| t.format("%Y-%m-%d %H:%M"))))?;
        if let Some(stopped) = task.stop_date {
            pretty_kv(w, "Closed", stopped.format("%Y-%m-%d %H:%M").to_string())?;
        }
        if task.trashed {
            pretty_kv(w, "Trashed", "yes")?;
        }
        if let Some(notes) = task.notes.as_deref().filter(|n| !n.is_empty()) {
            pretty_rule(w)?;
            writeln!(w, "{notes}")?;
        }
        if !self.checklist.is_empty() {
            pretty_rule(w)?;
            for item in &self.checklist {
                item.render_human(w)?;
            }
        }
        Ok(())
    }

    fn render_json(&self, w: &mut dyn Write) -> io::Result<()> {
        json_object(w, self)
    }

    fn render_table(&self, w: &mut dyn Write) -> io::Result<()> {
        self.task.render_table(w)?;
        for item in &self.checklist {
            item.render_table(w)?;
        }
        Ok(())
    }
}
