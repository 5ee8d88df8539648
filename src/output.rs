use chrono::NaiveDate;
use clap::ValueEnum;
use colored::{ColoredString, Colorize};
use serde::Serialize;

use crate::error::Result;
use crate::model::{Counter, Priority, Task};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Json,
    Pretty,
    Minimal,
}

/// JSON shape for a task at the CLI boundary. Positions are 1-based and
/// match what `complete`/`restore`/`edit` accept.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TaskRow<'a> {
    position: usize,
    task_text: &'a str,
    priority: Priority,
    due_date: Option<NaiveDate>,
}

impl<'a> TaskRow<'a> {
    fn new(position: usize, task: &'a Task) -> Self {
        Self {
            position,
            task_text: &task.text,
            priority: task.priority,
            due_date: task.due_date,
        }
    }
}

fn priority_label(priority: Priority) -> ColoredString {
    match priority {
        Priority::High => "high".red(),
        Priority::Medium => "medium".yellow(),
        Priority::Low => "low".green(),
    }
}

fn pretty_line(task: &Task, position: usize, done: bool) -> String {
    let text = if done {
        task.text.strikethrough().dimmed().to_string()
    } else {
        task.text.clone()
    };
    let mut line = format!("{position:>3}. {text} [{}]", priority_label(task.priority));
    if let Some(due) = task.due_date {
        line.push_str(&format!(" (due {due})"));
    }
    line
}

pub fn print_task(task: &Task, position: usize, format: Format) -> Result<()> {
    match format {
        Format::Json => println!("{}", serde_json::to_string(&TaskRow::new(position, task))?),
        Format::Pretty => println!("{}", pretty_line(task, position, false)),
        Format::Minimal => println!("{}", minimal_row(task, position)),
    }
    Ok(())
}

/// Render the two sequences plus the counter. `None` for a sequence means it
/// was filtered out of the view entirely.
pub fn print_board(
    pending: Option<&[Task]>,
    completed: Option<&[Task]>,
    counter: Counter,
    format: Format,
) -> Result<()> {
    match format {
        Format::Json => {
            #[derive(Serialize)]
            struct BoardOut<'a> {
                #[serde(skip_serializing_if = "Option::is_none")]
                pending: Option<Vec<TaskRow<'a>>>,
                #[serde(skip_serializing_if = "Option::is_none")]
                completed: Option<Vec<TaskRow<'a>>>,
                counter: Counter,
            }
            fn rows(tasks: &[Task]) -> Vec<TaskRow<'_>> {
                tasks
                    .iter()
                    .enumerate()
                    .map(|(i, t)| TaskRow::new(i + 1, t))
                    .collect()
            }
            let out = BoardOut {
                pending: pending.map(rows),
                completed: completed.map(rows),
                counter,
            };
            println!("{}", serde_json::to_string(&out)?);
        }
        Format::Pretty => {
            if let Some(tasks) = pending {
                println!("{}", "Pending".bold());
                if tasks.is_empty() {
                    println!("  (nothing pending)");
                }
                for (i, task) in tasks.iter().enumerate() {
                    println!("{}", pretty_line(task, i + 1, false));
                }
            }
            if let Some(tasks) = completed {
                if pending.is_some() {
                    println!();
                }
                println!("{}", "Completed".bold());
                if tasks.is_empty() {
                    println!("  (nothing completed)");
                }
                for (i, task) in tasks.iter().enumerate() {
                    println!("{}", pretty_line(task, i + 1, true));
                }
            }
            println!();
            println!("{counter}");
        }
        Format::Minimal => {
            println!("{:>4} {:30} {:8} {:10} LIST", "POS", "TEXT", "PRIO", "DUE");
            println!("{}", "-".repeat(60));
            for (label, tasks) in [("pending", pending), ("completed", completed)] {
                let Some(tasks) = tasks else { continue };
                for (i, task) in tasks.iter().enumerate() {
                    println!("{} {label}", minimal_row(task, i + 1));
                }
            }
        }
    }
    Ok(())
}

fn minimal_row(task: &Task, position: usize) -> String {
    let due = task
        .due_date
        .map(|d| d.to_string())
        .unwrap_or_else(|| "-".to_string());
    format!(
        "{position:>4} {:30} {:8} {due:10}",
        truncate_text(&task.text, 30),
        task.priority.to_string(),
    )
}

pub fn print_counter(counter: Counter, format: Format) -> Result<()> {
    match format {
        Format::Json => println!("{}", serde_json::to_string(&counter)?),
        _ => println!("{counter}"),
    }
    Ok(())
}

pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        let truncated: String = text.chars().take(max_len - 3).collect();
        format!("{truncated}...")
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task_id::TaskId;

    #[test]
    fn truncate_leaves_short_text_alone() {
        assert_eq!(truncate_text("short", 12), "short");
    }

    #[test]
    fn truncate_appends_ellipsis() {
        assert_eq!(truncate_text("a very long task text", 12), "a very lo...");
    }

    #[test]
    fn task_row_serializes_wire_field_names() {
        let task = Task {
            id: TaskId::from(1_u64),
            text: "x".into(),
            priority: Priority::High,
            due_date: Some("2024-01-02".parse().unwrap()),
        };
        let json = serde_json::to_string(&TaskRow::new(1, &task)).unwrap();
        assert!(json.contains(r#""taskText":"x""#));
        assert!(json.contains(r#""priority":"high""#));
        assert!(json.contains(r#""dueDate":"2024-01-02""#));
    }
}
