use anyhow::{Context, Result};
use datagouv::{Client, Table};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

#[derive(Serialize)]
struct Attendance {
    month: &'static str,
    restaurant: &'static str,
    meals: u32,
}

#[tokio::main]
async fn main() -> Result<()> {
    // RUST_LOG=datagouv=debug shows every request.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // Configure authentication via env vars or a `.datagouvrc` file.
    let client = Client::from_env()?;
    let dataset_id = std::env::args()
        .nth(1)
        .context("usage: upload_report <dataset-id>")?;

    let table = Table::from_records([
        Attendance {
            month: "2024-01",
            restaurant: "Beaulieu",
            meals: 18_240,
        },
        Attendance {
            month: "2024-01",
            restaurant: "Villejean",
            meals: 15_902,
        },
        Attendance {
            month: "2024-02",
            restaurant: "Beaulieu",
            meals: 19_004,
        },
    ])?;

    let datasets = client.datasets();
    let dataset = datasets.get_dataset(&dataset_id).await?;
    println!("dataset: {}", dataset["title"]);

    let resource = datasets
        .upload_resource(&dataset_id, &table, "attendance.csv", "Monthly meals served")
        .await?;
    println!("uploaded resource {}", resource["id"]);
    Ok(())
}
