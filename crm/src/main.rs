use anyhow::Context;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};

use crm::access::AccessController;
use crm::audit::AuditEvent;
use crm::config::Config;
use crm::tasks::{EmployeeRole, NewTask, Priority, Task, TaskStatus};
use crm::users::Role;

/// Record-keeping backend for users, tasks and login/logout history.
///
/// Every invocation is one session: credentialed commands log in, run the
/// operation and log out, recording both audit events.
#[derive(Parser, Debug)]
#[command(name = "crm")]
struct Cli {
    /// Username to run the command as. Goes before the subcommand.
    #[arg(short, long)]
    username: Option<String>,

    /// Password for --username. Goes before the subcommand.
    #[arg(short, long)]
    password: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Subcommand)]
enum Commands {
    /// Create a new account (open to anonymous callers).
    Register {
        username: String,
        password: String,
        /// "admin" or "employee".
        role: Role,
    },
    /// Task board operations.
    Tasks {
        #[command(subcommand)]
        command: TaskCommands,
    },
    /// User directory operations.
    Users {
        #[command(subcommand)]
        command: UserCommands,
    },
    /// Login/logout ledger operations.
    Audit {
        #[command(subcommand)]
        command: AuditCommands,
    },
}

#[derive(Debug, Clone, Subcommand)]
enum TaskCommands {
    /// Show every task.
    List,
    /// Show tasks whose assignee name contains the fragment (case-insensitive).
    Search { employee_name: String },
    /// Add a task (admin only).
    Add {
        name: String,
        /// High, Medium or Low.
        priority: Priority,
        /// Must be a registered employee.
        employee_name: String,
        /// Manager, Staff or Intern.
        employee_role: EmployeeRole,
        /// Done, Delayed, "To Be Done", "On Track" or "Not Done".
        status: TaskStatus,
        /// YYYY-MM-DD.
        start_date: NaiveDate,
        /// YYYY-MM-DD.
        end_date: NaiveDate,
    },
    /// Update the status of one of your own tasks (employees only).
    UpdateStatus { id: u64, status: TaskStatus },
    /// Delete one task by id (admin only).
    Delete { id: u64 },
    /// Delete every task (admin only).
    DeleteAll,
}

#[derive(Debug, Clone, Subcommand)]
enum UserCommands {
    /// Delete an account (admin only).
    Delete { username: String },
    /// Dump all stored credentials (admin only).
    Credentials,
}

#[derive(Debug, Clone, Subcommand)]
enum AuditCommands {
    /// Show ledger rows, optionally filtered.
    Show {
        #[arg(long)]
        username: Option<String>,
        /// YYYY-MM-DD.
        #[arg(long)]
        start_date: Option<NaiveDate>,
        /// YYYY-MM-DD.
        #[arg(long)]
        end_date: Option<NaiveDate>,
    },
    /// Show today's ledger rows.
    Today,
    /// Clear the entire ledger (admin only).
    Clear,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = Config::load()?;
    let mut controller = AccessController::open(&config)?;

    // Registration is the one anonymous command; everything else runs inside
    // a login/logout pair so the ledger sees the session.
    if let Commands::Register {
        username,
        password,
        role,
    } = &cli.command
    {
        controller.register(username, password, *role)?;
        println!("Account created for {username} as {role}.");
        return Ok(());
    }

    let username = cli
        .username
        .context("--username is required for this command")?;
    let password = cli
        .password
        .context("--password is required for this command")?;

    controller.login(&username, &password)?;
    let outcome = run(&controller, cli.command);
    controller.logout()?;
    outcome
}

fn run(controller: &AccessController, command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Register { .. } => unreachable!("handled before login"),
        Commands::Tasks { command } => run_tasks(controller, command),
        Commands::Users { command } => run_users(controller, command),
        Commands::Audit { command } => run_audit(controller, command),
    }
}

fn run_tasks(controller: &AccessController, command: TaskCommands) -> anyhow::Result<()> {
    match command {
        TaskCommands::List => print_tasks(&controller.list_tasks()?),
        TaskCommands::Search { employee_name } => {
            print_tasks(&controller.search_tasks(&employee_name)?)
        }
        TaskCommands::Add {
            name,
            priority,
            employee_name,
            employee_role,
            status,
            start_date,
            end_date,
        } => {
            let task = controller.add_task(NewTask {
                name,
                priority,
                employee_name,
                employee_role,
                status,
                start_date,
                end_date,
            })?;
            println!("Task added with id {}", task.id);
        }
        TaskCommands::UpdateStatus { id, status } => {
            let task = controller.update_task_status(id, status)?;
            println!("Task {} is now '{}'", task.id, task.status);
        }
        TaskCommands::Delete { id } => {
            controller.delete_task(id)?;
            println!("Task {id} deleted");
        }
        TaskCommands::DeleteAll => {
            controller.delete_all_tasks()?;
            println!("All tasks deleted");
        }
    }
    Ok(())
}

fn run_users(controller: &AccessController, command: UserCommands) -> anyhow::Result<()> {
    match command {
        UserCommands::Delete { username } => {
            if controller.delete_user(&username)? {
                println!("User '{username}' has been deleted");
            } else {
                println!("User '{username}' not found");
            }
        }
        UserCommands::Credentials => {
            for user in controller.credentials()? {
                println!("{}\t{}\t{}", user.username, user.password, user.role);
            }
        }
    }
    Ok(())
}

fn run_audit(controller: &AccessController, command: AuditCommands) -> anyhow::Result<()> {
    match command {
        AuditCommands::Show {
            username,
            start_date,
            end_date,
        } => print_events(&controller.audit_events(username.as_deref(), start_date, end_date)?),
        AuditCommands::Today => print_events(&controller.audit_today()?),
        AuditCommands::Clear => {
            controller.clear_audit_log()?;
            println!("All login/logout details have been deleted");
        }
    }
    Ok(())
}

fn print_tasks(tasks: &[Task]) {
    if tasks.is_empty() {
        println!("No tasks found");
        return;
    }
    for task in tasks {
        println!(
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
            task.id,
            task.name,
            task.priority,
            task.employee_name,
            task.employee_role,
            task.status,
            task.start_date,
            task.end_date
        );
    }
}

fn print_events(events: &[AuditEvent]) {
    if events.is_empty() {
        println!("No log entries found");
        return;
    }
    for event in events {
        println!("{}\t{}\t{}", event.username, event.action, event.timestamp);
    }
}
