use std::fs::File;
use catalog_ingest::modules::config::get_arguments;
use catalog_ingest::modules::ingest::{preview_record, print_report, run_ingestion, Ingestor};
use catalog_ingest::modules::source::ProductSource;
use catalog_ingest::modules::store::Destination;
use catalog_ingest::modules::utility::init_tracing;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    init_tracing("catalog_ingest=info")?;
    let (filename, config) = get_arguments()?;

    println!("Reading csv...");
    let source = ProductSource::from_path(&filename, &config.vendor.columns)?;
    let headers = source.headers().clone();
    let mut records = source.peekable();

    let first = match records.peek() {
        Some(first) => first,
        None => {
            println!("Empty csv, exiting...");
            return Ok(());
        }
    };

    // a broken first row is reported by the run itself
    if config.should_preview_record {
        if let Ok(record) = first {
            if let Err(error) = preview_record(record, &config.vendor) {
                println!("Incorrect format, exiting...");
                return Err(error);
            }
        }
    }

    let rejects_file = config.rejects_path.as_ref().map(File::create).transpose()?;

    // from here on every exit path goes through close
    let destination = Destination::connect(&config.database_url, &config.table_name).await?;
    let outcome = match rejects_file {
        Some(file) => match Ingestor::new(&config.vendor).with_rejects(file, &headers) {
            Ok(mut ingestor) => run_ingestion(&destination, &mut ingestor, records).await,
            Err(error) => Err(error),
        },
        None => run_ingestion(&destination, &mut Ingestor::new(&config.vendor), records).await,
    };
    destination.close().await;

    let report = outcome?;
    print_report(&report);
    if report.rejected > 0 {
        if let Some(path) = &config.rejects_path {
            println!("Rejected rows have been saved to {}", path);
        }
    }
    Ok(())
}
