use log::info;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let addr = format!("127.0.0.1:{port}");
    let listener = TcpListener::bind(&addr).await?;

    match std::env::var("MOCK_API_KEY") {
        Ok(key) => {
            info!("serving with custom API key");
            axum::serve(listener, mock_server::app_with_key(&key)).await
        }
        Err(_) => {
            info!("serving with API key {}", mock_server::MOCK_API_KEY);
            mock_server::run(listener).await
        }
    }
}
