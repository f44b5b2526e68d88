#[tokio::main]
async fn main() {
    if let Err(err) = county_forecast_lib::run().await {
        eprintln!("county-forecast: {}", err);
        std::process::exit(1);
    }
}
