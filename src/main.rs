use errhttp::config::Config;
use errhttp::server::shutdown_signal;
use errhttp::{logger, BoxError, Context, Router, StatusCode};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
struct Item {
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    age: Option<u32>,
}

async fn get_user(c: Context) -> Result<(), BoxError> {
    let name = c.param("name").unwrap_or_default().to_owned();
    c.json(&Item { name, age: None })
}

async fn create_item(c: Context) -> Result<(), BoxError> {
    let item: Item = c
        .decode_json()
        .map_err(|e| c.fail(e, StatusCode::BAD_REQUEST))?;
    c.json(&item)
}

async fn update_item(c: Context) -> Result<(), BoxError> {
    let mut item: Item = c
        .decode_json()
        .map_err(|e| c.fail(e, StatusCode::BAD_REQUEST))?;
    item.name = c.param("name").unwrap_or_default().to_owned();
    c.json(&item)
}

async fn delete_item(c: Context) -> Result<(), BoxError> {
    let name = c.param("name").unwrap_or_default();
    c.json(&serde_json::json!({ "message": format!("Deleted {name}") }))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = std::env::var("ERRHTTP_CONFIG").unwrap_or_else(|_| "errhttp".to_string());
    let cfg = Config::load_from(&config_path)?;
    logger::init(&cfg.logging);

    let addr = cfg.socket_addr()?;
    tracing::info!(
        %addr,
        cors = cfg.http.enable_cors,
        basic_auth = cfg.http.basic_auth.is_some(),
        max_body_size = cfg.server.max_body_size,
        "starting server"
    );

    let mut router = Router::from_config(&cfg);
    router
        .get("/users/{name}", get_user)?
        .post("/items", create_item)?
        .put("/items/{name}", update_item)?
        .delete("/items/{name}", delete_item)?;

    router
        .start_with_shutdown(&addr.to_string(), shutdown_signal())
        .await?;

    tracing::info!("server stopped");
    Ok(())
}
