//! Task records and their lifecycle.
//!
//! Tasks carry a persisted surrogate id assigned at creation; positional
//! indices are a presentation-layer convenience only and are never used as
//! the durable key.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::store::{Record, Table, TableStore};
use crate::users::UserDirectory;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Priority::High => write!(f, "High"),
            Priority::Medium => write!(f, "Medium"),
            Priority::Low => write!(f, "Low"),
        }
    }
}

impl FromStr for Priority {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "high" => Ok(Priority::High),
            "medium" => Ok(Priority::Medium),
            "low" => Ok(Priority::Low),
            other => Err(Error::InvalidInput(format!("unknown priority '{other}'"))),
        }
    }
}

/// Lifecycle state of a task. The on-disk labels are the human-readable
/// forms ("To Be Done", "On Track", "Not Done").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskStatus {
    Done,
    Delayed,
    #[serde(rename = "To Be Done")]
    ToBeDone,
    #[serde(rename = "On Track")]
    OnTrack,
    #[serde(rename = "Not Done")]
    NotDone,
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskStatus::Done => write!(f, "Done"),
            TaskStatus::Delayed => write!(f, "Delayed"),
            TaskStatus::ToBeDone => write!(f, "To Be Done"),
            TaskStatus::OnTrack => write!(f, "On Track"),
            TaskStatus::NotDone => write!(f, "Not Done"),
        }
    }
}

impl FromStr for TaskStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "done" => Ok(TaskStatus::Done),
            "delayed" => Ok(TaskStatus::Delayed),
            "to be done" => Ok(TaskStatus::ToBeDone),
            "on track" => Ok(TaskStatus::OnTrack),
            "not done" => Ok(TaskStatus::NotDone),
            other => Err(Error::InvalidInput(format!("unknown status '{other}'"))),
        }
    }
}

/// Free-form label describing the assignee's position. Not tied to the
/// assignee's access [`Role`](crate::users::Role).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EmployeeRole {
    Manager,
    Staff,
    Intern,
}

impl fmt::Display for EmployeeRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EmployeeRole::Manager => write!(f, "Manager"),
            EmployeeRole::Staff => write!(f, "Staff"),
            EmployeeRole::Intern => write!(f, "Intern"),
        }
    }
}

impl FromStr for EmployeeRole {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "manager" => Ok(EmployeeRole::Manager),
            "staff" => Ok(EmployeeRole::Staff),
            "intern" => Ok(EmployeeRole::Intern),
            other => Err(Error::InvalidInput(format!(
                "unknown employee role '{other}'"
            ))),
        }
    }
}

/// One stored task assignment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    #[serde(rename = "Id")]
    pub id: u64,
    #[serde(rename = "Task")]
    pub name: String,
    #[serde(rename = "Priority")]
    pub priority: Priority,
    #[serde(rename = "Employee Name")]
    pub employee_name: String,
    #[serde(rename = "Employee Role")]
    pub employee_role: EmployeeRole,
    #[serde(rename = "Status")]
    pub status: TaskStatus,
    #[serde(rename = "Start Date")]
    pub start_date: NaiveDate,
    #[serde(rename = "End Date")]
    pub end_date: NaiveDate,
}

impl Record for Task {
    const COLUMNS: &'static [&'static str] = &[
        "Id",
        "Task",
        "Priority",
        "Employee Name",
        "Employee Role",
        "Status",
        "Start Date",
        "End Date",
    ];
}

/// Fields of a task before the board assigns its id.
#[derive(Debug, Clone)]
pub struct NewTask {
    pub name: String,
    pub priority: Priority,
    pub employee_name: String,
    pub employee_role: EmployeeRole,
    pub status: TaskStatus,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

/// Owns the tasks table.
pub struct TaskBoard {
    store: TableStore<Task>,
}

impl TaskBoard {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self {
            store: TableStore::open(path),
        }
    }

    /// Full task table in insertion order.
    pub fn list(&self) -> Result<Vec<Task>> {
        Ok(self.store.load()?.into_rows())
    }

    /// Appends a new task. The assignee must be a registered employee; the
    /// check lives here so callers cannot bypass it.
    pub fn add(&self, directory: &UserDirectory, new: NewTask) -> Result<Task> {
        if new.name.trim().is_empty() {
            return Err(Error::InvalidInput("task name cannot be empty".to_string()));
        }
        let employees = directory.list_employees()?;
        if !employees.contains(&new.employee_name) {
            return Err(Error::UnknownEmployee(new.employee_name));
        }

        let table = self.store.update(|table| {
            let id = table.iter().map(|task| task.id).max().map_or(1, |m| m + 1);
            Ok(table.append(Task {
                id,
                name: new.name,
                priority: new.priority,
                employee_name: new.employee_name,
                employee_role: new.employee_role,
                status: new.status,
                start_date: new.start_date,
                end_date: new.end_date,
            }))
        })?;

        let task = table
            .rows()
            .last()
            .cloned()
            .ok_or_else(|| Error::InvalidInput("task table empty after append".to_string()))?;
        tracing::info!(id = task.id, assignee = %task.employee_name, "added task");
        Ok(task)
    }

    /// Self-service status update: only the assigned employee may change the
    /// status of their own task. Admins reshape the board through deletion
    /// and recreation instead.
    pub fn update_status(&self, id: u64, status: TaskStatus, acting_username: &str) -> Result<Task> {
        let table = self.store.update(|table| {
            let mut rows = table.into_rows();
            let task = rows
                .iter_mut()
                .find(|task| task.id == id)
                .ok_or(Error::UnknownTask(id))?;
            if task.employee_name != acting_username {
                return Err(Error::Forbidden(format!(
                    "task {id} is not assigned to '{acting_username}'"
                )));
            }
            task.status = status;
            Ok(Table::from_rows(rows))
        })?;

        let task = table
            .iter()
            .find(|task| task.id == id)
            .cloned()
            .ok_or(Error::UnknownTask(id))?;
        tracing::info!(id, status = %task.status, "updated task status");
        Ok(task)
    }

    /// Removes one task by id.
    pub fn delete_one(&self, id: u64) -> Result<()> {
        self.store.update(|table| {
            let position = table
                .iter()
                .position(|task| task.id == id)
                .ok_or(Error::UnknownTask(id))?;
            table.remove_at(position)
        })?;
        tracing::info!(id, "deleted task");
        Ok(())
    }

    /// Removes every task.
    pub fn delete_all(&self) -> Result<()> {
        self.store.update(|table| Ok(table.clear()))?;
        tracing::info!("deleted all tasks");
        Ok(())
    }

    /// Case-insensitive substring match on the assignee name. No match is an
    /// empty result, never an error.
    pub fn search(&self, employee_name_fragment: &str) -> Result<Vec<Task>> {
        let needle = employee_name_fragment.to_lowercase();
        let table = self.store.load()?;
        Ok(table
            .iter()
            .filter(|task| task.employee_name.to_lowercase().contains(&needle))
            .cloned()
            .collect())
    }
}
