//! Shared fixtures for the integration tests: a seeded in-memory database
//! and the entities mapped onto it.

#![allow(dead_code)]

use chrono::{DateTime, NaiveDateTime, Utc};
use criteria_resolver::{Entity, Projection};
use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;

const SCHEMA: &[&str] = &[
    "CREATE TABLE departments (
        id INTEGER PRIMARY KEY,
        name TEXT NOT NULL,
        budget INTEGER NOT NULL
    )",
    "CREATE TABLE employees (
        id INTEGER PRIMARY KEY,
        name TEXT NOT NULL,
        salary INTEGER NOT NULL,
        active BOOLEAN NOT NULL,
        hire_date TEXT NOT NULL,
        department_id INTEGER REFERENCES departments(id)
    )",
    "CREATE TABLE tasks (
        id INTEGER PRIMARY KEY,
        title TEXT NOT NULL,
        status TEXT NOT NULL,
        employee_id INTEGER NOT NULL REFERENCES employees(id)
    )",
    "INSERT INTO departments (id, name, budget) VALUES
        (1, 'Engineering', 1000),
        (2, 'Sales', 500),
        (3, 'Empty', 10)",
    "INSERT INTO employees (id, name, salary, active, hire_date, department_id) VALUES
        (1, 'Ann', 120, 1, '2020-01-15', 1),
        (2, 'zabc', 90, 1, '2021-06-01', 1),
        (3, 'xabcy', 70, 0, '2019-03-20', 2),
        (4, 'abcd', 50, 1, '2023-11-05', NULL)",
    "INSERT INTO tasks (id, title, status, employee_id) VALUES
        (1, 'Ship v1', 'open', 1),
        (2, 'Write docs', 'done', 1),
        (3, 'Call client', 'open', 3),
        (4, 'Review', 'open', 2)",
    "CREATE TABLE audit_events (
        id BLOB PRIMARY KEY,
        external_ref TEXT NOT NULL,
        recorded_at TEXT NOT NULL,
        local_at TEXT NOT NULL,
        label TEXT NOT NULL
    )",
];

/// Install a test subscriber once; `RUST_LOG=criteria_resolver=debug` shows
/// the rendered SQL.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Fresh in-memory database with the schema and seed rows.
pub async fn seeded_pool() -> SqlitePool {
    init_tracing();

    // A single connection that never expires keeps the in-memory database alive
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to open in-memory database");

    for statement in SCHEMA {
        sqlx::query(statement)
            .execute(&pool)
            .await
            .expect("Failed to seed database");
    }

    pool
}

#[derive(Entity, Debug, Clone, PartialEq)]
#[entity(table = "departments")]
#[has_many(employees, target = Employee, foreign_key = "department_id")]
pub struct Department {
    pub id: i64,
    pub name: String,
    pub budget: i64,
}

#[derive(Entity, Debug, Clone, PartialEq)]
#[belongs_to(department, target = Department)]
#[has_many(tasks, target = Task)]
pub struct Employee {
    #[primary_key]
    pub id: i64,
    pub name: String,
    pub salary: i64,
    pub active: bool,
    #[column(name = "hire_date")]
    pub hired_on: String,
    pub department_id: Option<i64>,
}

#[derive(Entity, Debug, Clone, PartialEq)]
#[belongs_to(employee, target = Employee)]
pub struct Task {
    pub id: i64,
    pub title: String,
    pub status: String,
    pub employee_id: i64,
}

/// Rows are written through sqlx binds by the tests that need them
#[derive(Entity, Debug, Clone, PartialEq)]
pub struct AuditEvent {
    pub id: uuid::Uuid,
    pub external_ref: String,
    pub recorded_at: DateTime<Utc>,
    pub local_at: NaiveDateTime,
    pub label: String,
}

impl AuditEvent {
    pub async fn insert(&self, pool: &SqlitePool) {
        sqlx::query(
            "INSERT INTO audit_events (id, external_ref, recorded_at, local_at, label)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(self.id)
        .bind(&self.external_ref)
        .bind(self.recorded_at)
        .bind(self.local_at)
        .bind(&self.label)
        .execute(pool)
        .await
        .expect("Failed to insert audit event");
    }
}

#[derive(Projection, Debug, Clone, PartialEq)]
pub struct EmployeeSummary {
    #[projection(path = "department.name")]
    pub department_name: String,
    pub name: String,
}

/// Sorted ids, since queries carry no ORDER BY
pub fn ids(employees: &[Employee]) -> Vec<i64> {
    let mut ids: Vec<i64> = employees.iter().map(|employee| employee.id).collect();
    ids.sort_unstable();
    ids
}
