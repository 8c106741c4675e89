#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    gabi_schedule::run().await
}
