//! Session state and role gating for every call into the stores.

use std::fmt;

use chrono::NaiveDate;

use crate::audit::{AuditAction, AuditEvent, AuditLog};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::tasks::{NewTask, Task, TaskBoard, TaskStatus};
use crate::users::{Role, User, UserDirectory};

/// Identity of the current caller. The only transitions are
/// [`AccessController::login`] and [`AccessController::logout`]; there is no
/// session timeout or expiry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Session {
    Anonymous,
    Authenticated { username: String, role: Role },
}

impl Session {
    fn role(&self) -> Option<Role> {
        match self {
            Session::Anonymous => None,
            Session::Authenticated { role, .. } => Some(*role),
        }
    }
}

/// Gated operations, one entry per row of the permission table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Register,
    ViewTasks,
    AddTask,
    UpdateTaskStatus,
    DeleteTask,
    DeleteUser,
    ViewCredentials,
    ViewAuditLog,
    ClearAuditLog,
}

impl Operation {
    /// The static permission table: which role may perform which operation.
    /// Registration is open to anonymous callers (self-service signup).
    fn allowed_for(self, role: Option<Role>) -> bool {
        match self {
            Operation::Register => true,
            Operation::ViewTasks => role.is_some(),
            Operation::UpdateTaskStatus => role == Some(Role::Employee),
            Operation::AddTask
            | Operation::DeleteTask
            | Operation::DeleteUser
            | Operation::ViewCredentials
            | Operation::ViewAuditLog
            | Operation::ClearAuditLog => role == Some(Role::Admin),
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::Register => "register",
            Operation::ViewTasks => "view tasks",
            Operation::AddTask => "add task",
            Operation::UpdateTaskStatus => "update task status",
            Operation::DeleteTask => "delete task",
            Operation::DeleteUser => "delete user",
            Operation::ViewCredentials => "view credentials",
            Operation::ViewAuditLog => "view audit log",
            Operation::ClearAuditLog => "clear audit log",
        };
        write!(f, "{name}")
    }
}

/// Mediates every call into the directory, board and ledger for one session.
/// A call from a disallowed role fails with [`Error::Forbidden`] before any
/// store is touched, so it has no side effect.
pub struct AccessController {
    users: UserDirectory,
    tasks: TaskBoard,
    audit: AuditLog,
    session: Session,
}

impl AccessController {
    /// Opens all three stores under the configured data directory, creating
    /// the directory when missing.
    pub fn open(config: &Config) -> Result<Self> {
        std::fs::create_dir_all(&config.data_dir).map_err(|e| Error::Persistence {
            path: config.data_dir.clone(),
            message: e.to_string(),
        })?;
        Ok(Self {
            users: UserDirectory::open(config.users_file())?,
            tasks: TaskBoard::open(config.tasks_file()),
            audit: AuditLog::open(config.audit_file()),
            session: Session::Anonymous,
        })
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    fn authorize(&self, operation: Operation) -> Result<()> {
        if operation.allowed_for(self.session.role()) {
            Ok(())
        } else {
            let who = match &self.session {
                Session::Anonymous => "anonymous callers".to_string(),
                Session::Authenticated { role, .. } => format!("role '{role}'"),
            };
            Err(Error::Forbidden(format!(
                "{operation} is not permitted for {who}"
            )))
        }
    }

    fn authenticated_username(&self) -> Result<&str> {
        match &self.session {
            Session::Authenticated { username, .. } => Ok(username),
            Session::Anonymous => Err(Error::Forbidden(
                "no session is currently authenticated".to_string(),
            )),
        }
    }

    /// Authenticates and, on success, records the login event and moves the
    /// session to `Authenticated`.
    pub fn login(&mut self, username: &str, password: &str) -> Result<Role> {
        let role = self
            .users
            .authenticate(username, password)?
            .ok_or(Error::InvalidCredentials)?;
        self.audit.record(username, AuditAction::Login)?;
        self.session = Session::Authenticated {
            username: username.to_string(),
            role,
        };
        tracing::info!(username, %role, "session authenticated");
        Ok(role)
    }

    /// Records the logout event and returns to `Anonymous`. A no-op for a
    /// session that never logged in.
    pub fn logout(&mut self) -> Result<()> {
        if let Session::Authenticated { username, .. } = &self.session {
            self.audit.record(username, AuditAction::Logout)?;
            tracing::info!(username, "session closed");
        }
        self.session = Session::Anonymous;
        Ok(())
    }

    /// Self-service signup, open to anonymous callers.
    pub fn register(&self, username: &str, password: &str, role: Role) -> Result<()> {
        self.authorize(Operation::Register)?;
        self.users.register(username, password, role)
    }

    pub fn delete_user(&self, username: &str) -> Result<bool> {
        self.authorize(Operation::DeleteUser)?;
        self.users.delete(username)
    }

    pub fn credentials(&self) -> Result<Vec<User>> {
        self.authorize(Operation::ViewCredentials)?;
        self.users.list_all()
    }

    pub fn list_tasks(&self) -> Result<Vec<Task>> {
        self.authorize(Operation::ViewTasks)?;
        self.tasks.list()
    }

    pub fn search_tasks(&self, employee_name_fragment: &str) -> Result<Vec<Task>> {
        self.authorize(Operation::ViewTasks)?;
        self.tasks.search(employee_name_fragment)
    }

    pub fn add_task(&self, new: NewTask) -> Result<Task> {
        self.authorize(Operation::AddTask)?;
        self.tasks.add(&self.users, new)
    }

    /// Status updates are self-service: the acting session must be the
    /// employee the task is assigned to.
    pub fn update_task_status(&self, id: u64, status: TaskStatus) -> Result<Task> {
        self.authorize(Operation::UpdateTaskStatus)?;
        let acting = self.authenticated_username()?.to_string();
        self.tasks.update_status(id, status, &acting)
    }

    pub fn delete_task(&self, id: u64) -> Result<()> {
        self.authorize(Operation::DeleteTask)?;
        self.tasks.delete_one(id)
    }

    pub fn delete_all_tasks(&self) -> Result<()> {
        self.authorize(Operation::DeleteTask)?;
        self.tasks.delete_all()
    }

    pub fn audit_events(
        &self,
        username: Option<&str>,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<Vec<AuditEvent>> {
        self.authorize(Operation::ViewAuditLog)?;
        self.audit.filter(username, start_date, end_date)
    }

    pub fn audit_today(&self) -> Result<Vec<AuditEvent>> {
        self.authorize(Operation::ViewAuditLog)?;
        self.audit.today()
    }

    pub fn clear_audit_log(&self) -> Result<()> {
        self.authorize(Operation::ClearAuditLog)?;
        self.audit.clear_all()
    }
}
