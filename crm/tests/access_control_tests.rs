use crm::access::{AccessController, Session};
use crm::audit::AuditAction;
use crm::config::Config;
use crm::error::Error;
use crm::tasks::{EmployeeRole, NewTask, Priority, TaskStatus};
use crm::users::Role;

fn setup() -> (tempfile::TempDir, Config) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("debug")
        .try_init();
    let dir = tempfile::tempdir().unwrap();
    let config = Config::for_data_dir(dir.path());
    (dir, config)
}

fn new_task(name: &str, assignee: &str) -> NewTask {
    NewTask {
        name: name.to_string(),
        priority: Priority::High,
        employee_name: assignee.to_string(),
        employee_role: EmployeeRole::Staff,
        status: TaskStatus::ToBeDone,
        start_date: "2024-03-01".parse().unwrap(),
        end_date: "2024-03-15".parse().unwrap(),
    }
}

#[test]
fn full_workflow_survives_a_restart() {
    let (_dir, config) = setup();

    {
        let mut controller = AccessController::open(&config).unwrap();
        controller.register("Samantha", "pw", Role::Employee).unwrap();
        controller.register("Tom", "pw", Role::Employee).unwrap();
        controller.login("admin", "admin123").unwrap();
        controller.add_task(new_task("Write report", "Samantha")).unwrap();
        controller.add_task(new_task("Ship release", "Tom")).unwrap();
        controller.logout().unwrap();
    }

    // A fresh controller over the same data dir sees every committed change.
    let mut controller = AccessController::open(&config).unwrap();
    controller.login("Samantha", "pw").unwrap();
    assert_eq!(
        controller.session(),
        &Session::Authenticated {
            username: "Samantha".to_string(),
            role: Role::Employee,
        }
    );

    let tasks = controller.list_tasks().unwrap();
    assert_eq!(tasks.len(), 2);
    assert_eq!(tasks[0].name, "Write report");
    assert_eq!(tasks[0].id, 1);
    assert_eq!(tasks[1].id, 2);

    controller
        .update_task_status(1, TaskStatus::Done)
        .unwrap();
    controller.logout().unwrap();

    // Status change hit the disk before update_task_status returned.
    let users = crm::users::UserDirectory::open(config.users_file()).unwrap();
    assert_eq!(users.authenticate("Tom", "pw").unwrap(), Some(Role::Employee));
    let board = crm::tasks::TaskBoard::open(config.tasks_file());
    assert_eq!(board.list().unwrap()[0].status, TaskStatus::Done);
}

#[test]
fn search_is_a_case_insensitive_substring_match() {
    let (_dir, config) = setup();
    let mut controller = AccessController::open(&config).unwrap();
    controller.register("Samantha", "pw", Role::Employee).unwrap();
    controller.register("Tom", "pw", Role::Employee).unwrap();
    controller.login("admin", "admin123").unwrap();
    controller.add_task(new_task("Write report", "Samantha")).unwrap();
    controller.add_task(new_task("Ship release", "Tom")).unwrap();

    let hits = controller.search_tasks("sam").unwrap();

    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].employee_name, "Samantha");
    assert!(controller.search_tasks("nobody").unwrap().is_empty());
}

#[test]
fn audit_trail_is_ordered_and_admin_clearable() {
    let (_dir, config) = setup();
    let mut controller = AccessController::open(&config).unwrap();
    controller.register("Samantha", "pw", Role::Employee).unwrap();
    controller.login("Samantha", "pw").unwrap();
    controller.logout().unwrap();
    controller.login("admin", "admin123").unwrap();

    let events = controller.audit_events(None, None, None).unwrap();
    let summary: Vec<(String, AuditAction)> = events
        .iter()
        .map(|e| (e.username.clone(), e.action))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("Samantha".to_string(), AuditAction::Login),
            ("Samantha".to_string(), AuditAction::Logout),
            ("admin".to_string(), AuditAction::Login),
        ]
    );
    assert_eq!(
        controller
            .audit_events(Some("Samantha"), None, None)
            .unwrap()
            .len(),
        2
    );
    assert_eq!(controller.audit_today().unwrap().len(), 3);

    controller.clear_audit_log().unwrap();
    assert!(controller.audit_events(None, None, None).unwrap().is_empty());
}

#[test]
fn deleting_a_user_does_not_disturb_other_tables() {
    let (_dir, config) = setup();
    let mut controller = AccessController::open(&config).unwrap();
    controller.register("Samantha", "pw", Role::Employee).unwrap();
    controller.login("admin", "admin123").unwrap();
    controller.add_task(new_task("Write report", "Samantha")).unwrap();

    assert!(controller.delete_user("Samantha").unwrap());
    assert!(!controller.delete_user("Samantha").unwrap());

    // Existing tasks keep the stale assignee; only new assignments check it.
    assert_eq!(controller.list_tasks().unwrap().len(), 1);
    let err = controller.add_task(new_task("Another", "Samantha")).unwrap_err();
    assert!(matches!(err, Error::UnknownEmployee(_)));
}

#[test]
fn persisted_files_carry_the_canonical_headers() {
    let (_dir, config) = setup();
    let mut controller = AccessController::open(&config).unwrap();
    controller.register("Samantha", "pw", Role::Employee).unwrap();
    controller.login("admin", "admin123").unwrap();
    controller.add_task(new_task("Write report", "Samantha")).unwrap();

    let users = std::fs::read_to_string(config.users_file()).unwrap();
    assert!(users.starts_with("Username,Password,Role\n"));
    assert!(users.contains("admin,admin123,admin"));

    let tasks = std::fs::read_to_string(config.tasks_file()).unwrap();
    assert!(tasks.starts_with(
        "Id,Task,Priority,Employee Name,Employee Role,Status,Start Date,End Date\n"
    ));
    assert!(tasks.contains("1,Write report,High,Samantha,Staff,To Be Done,2024-03-01,2024-03-15"));

    let audit = std::fs::read_to_string(config.audit_file()).unwrap();
    assert!(audit.starts_with("Username,Action,Timestamp\n"));
    assert!(audit.contains("admin,Login,"));
}

#[test]
fn corrupt_table_blocks_the_subsystem() {
    let (_dir, config) = setup();
    let mut controller = AccessController::open(&config).unwrap();
    controller.login("admin", "admin123").unwrap();

    std::fs::write(config.tasks_file(), "Task,Owner\nsomething,alice\n").unwrap();

    assert!(matches!(
        controller.list_tasks(),
        Err(Error::StoreCorrupt { .. })
    ));
    // The other tables keep working.
    assert!(controller.credentials().is_ok());
}
