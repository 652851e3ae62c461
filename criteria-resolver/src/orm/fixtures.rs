//! Entities shared by the unit tests

use crate::{Entity, Projection, SearchObject};

#[derive(Entity, Debug, Clone, PartialEq)]
#[entity(table = "departments")]
#[has_many(employees, target = Employee, foreign_key = "department_id")]
pub struct Department {
    #[primary_key]
    pub id: i64,
    pub name: String,
    pub budget: i64,
}

#[derive(Entity, Debug, Clone, PartialEq)]
#[entity(table = "employees")]
#[belongs_to(department, target = Department, foreign_key = "department_id")]
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

#[derive(SearchObject, Debug, Default)]
pub struct EmployeeSearch {
    #[criteria(comparison = "like")]
    pub name: Option<String>,

    #[criteria(path = "department.name")]
    pub department: Option<String>,

    #[criteria(path = "salary", comparison = "greater_equals")]
    pub min_salary: Option<i64>,

    #[criteria(path = "tasks.status", comparison = "in")]
    pub task_statuses: Option<Vec<String>>,

    #[criteria(path = "tasks.title", comparison = "starts_with")]
    pub task_title: Option<String>,

    /// Not a filter
    pub page: Option<u32>,
}

#[derive(Projection, Debug, PartialEq)]
pub struct EmployeeSummary {
    #[projection(path = "department.name")]
    pub department_name: String,
    pub name: String,
}
