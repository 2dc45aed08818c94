#[tokio::main]
async fn main() {
    padel_league_server::run().await;
}
