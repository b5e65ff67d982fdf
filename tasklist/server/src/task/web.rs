use axum::{
    Form, Router,
    extract::State,
    response::{Redirect, Response},
    routing::{get, post},
};
use serde::Deserialize;
use std::sync::Arc;

use crate::db::Gateway;
use crate::task::TaskStore;
use crate::view::{self, TaskTemplate, TasksTemplate};
use crate::web::{IdPath, WebError};

#[derive(Debug, Deserialize)]
pub struct CreateTaskForm {
    #[serde(default)]
    name: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateEntryForm {
    #[serde(default)]
    details: String,
}

#[derive(Clone)]
pub struct TaskState {
    pub gateway: Gateway,
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

fn task_location(task_id: i32) -> String {
    format!("/tasks/{task_id}")
}

/// Handler for `GET /` that lists every task.
#[tracing::instrument(skip(state))]
async fn tasks_handler(State(state): State<Arc<TaskState>>) -> Result<Response, WebError> {
    let tasks = TaskStore::new(&state.gateway).list_tasks().await?;
    Ok(view::render(&TasksTemplate::new(tasks))?)
}

/// Handler for creating a task. A blank name writes nothing.
#[tracing::instrument(skip(state))]
async fn create_task_handler(
    State(state): State<Arc<TaskState>>,
    Form(form): Form<CreateTaskForm>,
) -> Result<Redirect, WebError> {
    if is_blank(&form.name) {
        tracing::debug!("Ignoring task with blank name");
        return Ok(Redirect::to("/"));
    }

    TaskStore::new(&state.gateway)
        .create_task(&form.name)
        .await?;
    Ok(Redirect::to("/"))
}

#[tracing::instrument(skip(state))]
async fn delete_task_handler(
    State(state): State<Arc<TaskState>>,
    IdPath(id): IdPath<i32>,
) -> Result<Redirect, WebError> {
    TaskStore::new(&state.gateway).delete_task_by_id(id).await?;
    Ok(Redirect::to("/"))
}

/// Handler for `GET /tasks/{id}` that shows a task with its entries.
#[tracing::instrument(skip(state))]
async fn task_handler(
    State(state): State<Arc<TaskState>>,
    IdPath(id): IdPath<i32>,
) -> Result<Response, WebError> {
    let store = TaskStore::new(&state.gateway);
    let task = store.get_task_name(id).await?.ok_or(WebError::NotFound)?;
    let entries = store.list_task_entries(id).await?;
    Ok(view::render(&TaskTemplate::new(task, entries))?)
}

/// Handler for adding an entry to a task. Blank details write nothing.
#[tracing::instrument(skip(state))]
async fn create_entry_handler(
    State(state): State<Arc<TaskState>>,
    IdPath(id): IdPath<i32>,
    Form(form): Form<CreateEntryForm>,
) -> Result<Redirect, WebError> {
    if is_blank(&form.details) {
        tracing::debug!("Ignoring entry with blank details");
        return Ok(Redirect::to(&task_location(id)));
    }

    TaskStore::new(&state.gateway)
        .create_task_entry(id, &form.details)
        .await?;
    Ok(Redirect::to(&task_location(id)))
}

#[tracing::instrument(skip(state))]
async fn delete_entry_handler(
    State(state): State<Arc<TaskState>>,
    IdPath((id, entry_id)): IdPath<(i32, i32)>,
) -> Result<Redirect, WebError> {
    TaskStore::new(&state.gateway)
        .delete_task_entry(entry_id)
        .await?;
    Ok(Redirect::to(&task_location(id)))
}

/// Creates and returns the task router with all task-related routes.
pub fn create_task_router(state: Arc<TaskState>) -> Router {
    Router::new()
        .route("/", get(tasks_handler))
        .route("/tasks", post(create_task_handler))
        .route("/tasks/{id}", get(task_handler))
        .route("/tasks/{id}/delete", post(delete_task_handler))
        .route("/tasks/{id}/entries", post(create_entry_handler))
        .route(
            "/tasks/{id}/entries/{entry_id}/delete",
            post(delete_entry_handler),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use sea_orm::{DatabaseBackend, MockDatabase, Transaction, Value};
    use tower::ServiceExt;

    fn app(gateway: Gateway) -> Router {
        create_task_router(Arc::new(TaskState { gateway }))
    }

    fn form_post(uri: &str, body: &'static str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/x-www-form-urlencoded")
            .body(Body::from(body))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn location(response: &Response) -> &str {
        response.headers().get("location").unwrap().to_str().unwrap()
    }

    async fn body_text(response: Response) -> String {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(body.to_vec()).unwrap()
    }

    fn task_row(id: i32, name: &str) -> MockRow {
        MockRow::from([
            ("id".to_string(), Value::from(id)),
            ("name".to_string(), Value::from(name)),
        ])
    }

    #[tokio::test]
    async fn can_create_task_and_redirect_to_list() {
        let mock = SharedMock::with_results(vec![no_rows()]);
        let response = app(mock.gateway())
            .oneshot(form_post("/tasks", "name=Buy%20milk"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        insta::assert_snapshot!(location(&response), @"/");
        assert_eq!(
            mock.transaction_log(),
            vec![Transaction::from_sql_and_values(
                DatabaseBackend::Postgres,
                "INSERT INTO task (name) VALUES ($1)",
                [Value::from("Buy milk")],
            )]
        );
    }

    #[tokio::test]
    async fn can_skip_write_for_blank_task_name() {
        for body in ["name=", "name=%20%20", ""] {
            let response = app(untouchable_gateway())
                .oneshot(form_post("/tasks", body))
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::SEE_OTHER);
            assert_eq!(location(&response), "/");
        }
    }

    #[tokio::test]
    async fn can_skip_write_for_blank_entry_details() {
        let response = app(untouchable_gateway())
            .oneshot(form_post("/tasks/7/entries", "details="))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/tasks/7");
    }

    #[tokio::test]
    async fn can_list_tasks() {
        let mock = SharedMock::with_results(vec![vec![
            task_row(1, "Buy milk"),
            task_row(2, "Walk dog"),
        ]]);
        let response = app(mock.gateway())
            .oneshot(get("/"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_text(response).await;
        assert!(body.contains("<a href=\"/tasks/1\">Buy milk</a>"));
        assert!(body.contains("<a href=\"/tasks/2\">Walk dog</a>"));
    }

    #[tokio::test]
    async fn can_show_task_with_entries() {
        let entry = MockRow::from([
            ("id".to_string(), Value::from(42)),
            ("task_id".to_string(), Value::from(7)),
            ("task_details".to_string(), Value::from("2 litres")),
        ]);
        let mock = SharedMock::with_results(vec![vec![task_row(7, "Buy milk")], vec![entry]]);
        let response = app(mock.gateway())
            .oneshot(get("/tasks/7"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_text(response).await;
        assert!(body.contains("<h1>Buy milk</h1>"));
        assert!(body.contains("2 litres"));
    }

    #[tokio::test]
    async fn can_render_not_found_for_missing_task() {
        let mock = SharedMock::with_results(vec![no_rows()]);
        let response = app(mock.gateway())
            .oneshot(get("/tasks/99"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(body_text(response).await.contains("Page not found"));
    }

    #[tokio::test]
    async fn can_create_and_delete_entries() {
        let mock = SharedMock::with_results(vec![no_rows(), no_rows()]);
        let gateway = mock.gateway();

        let response = app(gateway.clone())
            .oneshot(form_post("/tasks/7/entries", "details=2%20litres"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        insta::assert_snapshot!(location(&response), @"/tasks/7");

        let response = app(gateway)
            .oneshot(form_post("/tasks/7/entries/42/delete", ""))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        insta::assert_snapshot!(location(&response), @"/tasks/7");

        assert_eq!(
            mock.transaction_log(),
            vec![
                Transaction::from_sql_and_values(
                    DatabaseBackend::Postgres,
                    "INSERT INTO task_entry (task_id, task_details) VALUES ($1, $2)",
                    [Value::from(7), Value::from("2 litres")],
                ),
                Transaction::from_sql_and_values(
                    DatabaseBackend::Postgres,
                    "DELETE FROM task_entry WHERE id = $1",
                    [Value::from(42)],
                ),
            ]
        );
    }

    #[tokio::test]
    async fn can_delete_task_and_redirect_to_list() {
        let mock = SharedMock::with_results(vec![no_rows()]);
        let response = app(mock.gateway())
            .oneshot(form_post("/tasks/7/delete", ""))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/");
    }

    #[tokio::test]
    async fn can_hide_database_errors_behind_internal_server_error() {
        let mock = SharedMock::new(
            MockDatabase::new(DatabaseBackend::Postgres).append_query_errors([
                sea_orm::DbErr::Custom(
                    "insert or update on table \"task_entry\" violates foreign key constraint"
                        .to_string(),
                ),
            ]),
        );
        let response = app(mock.gateway())
            .oneshot(form_post("/tasks/99/entries", "details=orphan"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_text(response).await;
        assert!(!body.contains("foreign key"));
        assert!(body.contains("Internal Server Error"));
    }
}
