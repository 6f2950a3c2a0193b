use liscap::server;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let port = server::port_from_env()?;
    server::serve(port).await
}
