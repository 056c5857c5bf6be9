#[tokio::main]
async fn main() {
    if let Err(e) = flowspace::run().await {
        eprintln!("flowspace: {}", e);
        std::process::exit(1);
    }
}
