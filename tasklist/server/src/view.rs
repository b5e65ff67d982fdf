//! HTML rendering.
//!
//! Templates live under `views/` and are compiled in by askama. Interpolated
//! values are HTML-escaped; `|safe` in a template inserts a value verbatim.

use askama::Template;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};

use crate::task::{Task, TaskEntry};

pub const HTML_CONTENT_TYPE: &str = "text/html; charset=UTF-8";

/// Renders `template` as a 200 HTML response.
pub fn render<T: Template>(template: &T) -> Result<Response, askama::Error> {
    render_with_status(StatusCode::OK, template)
}

pub fn render_with_status<T: Template>(
    status: StatusCode,
    template: &T,
) -> Result<Response, askama::Error> {
    let body = template.render()?;
    Ok((status, [(header::CONTENT_TYPE, HTML_CONTENT_TYPE)], body).into_response())
}

#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginTemplate;

#[derive(Template)]
#[template(path = "tasks.html")]
pub struct TasksTemplate {
    tasks: Vec<Task>,
}

impl TasksTemplate {
    pub fn new(tasks: Vec<Task>) -> Self {
        Self { tasks }
    }
}

#[derive(Template)]
#[template(path = "task.html")]
pub struct TaskTemplate {
    task: Task,
    entries: Option<Vec<TaskEntry>>,
}

impl TaskTemplate {
    pub fn new(task: Task, entries: Option<Vec<TaskEntry>>) -> Self {
        Self { task, entries }
    }
}

#[derive(Template)]
#[template(path = "404.html")]
pub struct NotFoundTemplate;
