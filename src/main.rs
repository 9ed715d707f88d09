use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use axum::extract::{Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use clap::Parser;
use rel_db::cfg::watch_config;
use rel_db::db_error::Result;
use rel_db::init_tracing;
use rel_db::storage::FileStore;
use rel_db::Session;
use serde::Deserialize;
use serde_json::json;
use tokio::net::TcpListener;
use tokio::sync::broadcast;

type SharedSession = Arc<Mutex<Session<FileStore>>>;

/// 数据库服务入口：一行查询文本进，一个结果或错误的JSON出
#[derive(Parser, Debug)]
struct Args {
    /// 配置文件路径，覆盖REL_DB_CONFIG与默认的./config.toml
    #[arg(long)]
    config: Option<PathBuf>,

    /// 监听地址，覆盖配置文件里的listen_addr
    #[arg(long)]
    addr: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ImportParams {
    overwrite: Option<bool>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    if let Some(path) = &args.config {
        std::env::set_var("REL_DB_CONFIG", path);
    }
    // 初始化日志
    init_tracing();
    // 启动配置监听
    watch_config(broadcast::channel(10).1).await;
    // 打开存储并恢复快照
    let config = rel_db::cfg::current()?;
    let store = FileStore::open(&config.storage_path)?;
    let session = Session::open(store)?.with_autosave(config.autosave);
    let state: SharedSession = Arc::new(Mutex::new(session));
    // 起服务
    let addr = args.addr.unwrap_or(config.listen_addr);
    let app = Router::new()
        .route("/query", post(run_query))
        .route("/export", get(export_snapshot))
        .route("/import", post(import_snapshot))
        .with_state(state);
    let listener = TcpListener::bind(addr.as_str()).await?;
    tracing::info!("listening on {addr}");
    axum::serve(listener, app).await?;
    Ok(())
}

/// 结果信封：成功给序列化的结果，失败给{"error": ...}，两者不同时出现
fn envelope<T: serde::Serialize>(result: Result<T>) -> Json<serde_json::Value> {
    Json(match result.and_then(|v| Ok(serde_json::to_value(v)?)) {
        Ok(value) => value,
        Err(err) => json!({ "error": err.to_string() }),
    })
}

async fn run_query(State(state): State<SharedSession>, body: String) -> Json<serde_json::Value> {
    let result = state
        .lock()
        .map_err(|e| rel_db::db_error::Error::Mutex(e.to_string()))
        .and_then(|mut session| session.execute(&body));
    envelope(result)
}

async fn export_snapshot(State(state): State<SharedSession>) -> Json<serde_json::Value> {
    let result = state
        .lock()
        .map_err(|e| rel_db::db_error::Error::Mutex(e.to_string()))
        .and_then(|session| session.export());
    envelope(result)
}

async fn import_snapshot(
    State(state): State<SharedSession>,
    Query(params): Query<ImportParams>,
    Json(document): Json<serde_json::Value>,
) -> Json<serde_json::Value> {
    let overwrite = params.overwrite.unwrap_or(false);
    let result = state
        .lock()
        .map_err(|e| rel_db::db_error::Error::Mutex(e.to_string()))
        .and_then(|mut session| session.import(document, overwrite))
        .map(|_| json!({ "imported": true }));
    envelope(result)
}
