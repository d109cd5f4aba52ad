use fieldscan::app;

#[tokio::main]
async fn main() {
    // Exit explicitly: a pending stdin read would otherwise keep the runtime alive
    std::process::exit(app::startup::startup().await);
}
