//! Binary entry point: the task REST API over a single JSON file.
//!
//! Configuration comes from the environment: `PORT` (default 3000)
//! and `TASKS_FILE` (default `tasks.json` in the working directory).

use std::env;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use taskdeck::http::{router, AppState};
use taskdeck::persist::TasksFile;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("taskdeck=info,tower_http=info")),
        )
        .init();

    let port: u16 = env::var("PORT")
        .ok()
        .and_then(|raw| raw.parse().ok())
        .unwrap_or(3000);
    let tasks_file = env::var("TASKS_FILE").unwrap_or_else(|_| "tasks.json".to_string());

    let state = Arc::new(AppState {
        tasks: Mutex::new(TasksFile::new(&tasks_file)),
    });
    let app = router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();

    tracing::info!(%addr, file = %tasks_file, "todo API listening");
    tracing::info!(
        "endpoints: GET /health, GET /tasks, POST /tasks, PUT /tasks/:id, DELETE /tasks/:id"
    );

    axum::serve(listener, app).await.unwrap();
}
