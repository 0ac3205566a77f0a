use chrono::{DateTime, Utc};
use csv::{QuoteStyle, StringRecord, Writer, WriterBuilder};
use std::io::{self, Write};
use tracing::{debug, warn};
use super::config::VendorConfig;
use super::error::{IngestError, IngestResult};
use super::parser::{parse_price, primary_color};
use super::source::ProductRecord;
use super::store::{Destination, ProductStore, StoredItem};
use super::utility::read_yes_or_no;

#[derive(Debug, Clone, PartialEq)]
pub enum RowOutcome {
    Inserted,
    Skipped,
    // the price could not be parsed and the vendor skips such rows
    Rejected(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct IngestionReport {
    pub vendor: String,
    pub inserted: usize,
    pub skipped: usize,
    pub rejected: usize,
    // inserted with a price of zero because the raw price had no number
    pub zero_filled: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl IngestionReport {
    fn new(vendor: &str) -> IngestionReport {
        let now = Utc::now();
        IngestionReport {
            vendor: vendor.to_string(),
            inserted: 0,
            skipped: 0,
            rejected: 0,
            zero_filled: 0,
            started_at: now,
            finished_at: now,
        }
    }

    pub fn processed(&self) -> usize {
        self.inserted + self.skipped + self.rejected
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Normalized {
    Item { item: StoredItem, zero_filled: bool },
    Rejected(String),
}

// vendor price and color rules for one record
pub fn normalize(record: &ProductRecord, vendor: &VendorConfig) -> IngestResult<Normalized> {
    let outcome = parse_price(&record.raw_price, &vendor.price.format);
    let (price, zero_filled) = match outcome.resolve(vendor.price.on_failure) {
        Ok(Some(resolved)) => resolved,
        Ok(None) => {
            return Ok(Normalized::Rejected(format!(
                "unparseable price `{}`",
                record.raw_price
            )))
        }
        Err(reason) => {
            return Err(IngestError::PriceParse {
                product_id: record.product_id.clone(),
                line: record.line,
                reason,
            })
        }
    };

    let color_primary = primary_color(&record.raw_color, vendor.color_fallback.as_deref())
        .ok_or_else(|| IngestError::MissingColor {
            product_id: record.product_id.clone(),
            line: record.line,
        })?;

    Ok(Normalized::Item {
        item: StoredItem {
            product_id: record.product_id.clone(),
            name: record.name.clone(),
            price,
            currency: vendor.currency.clone(),
            image_url: record.image_url.clone(),
            color_primary,
            is_active: true,
            brand_id: vendor.brand_id,
            category_id: vendor.category_id,
        },
        zero_filled,
    })
}

pub struct Ingestor<'v, W: Write> {
    vendor: &'v VendorConfig,
    rejects: Option<Writer<W>>,
}

impl<'v> Ingestor<'v, io::Sink> {
    pub fn new(vendor: &'v VendorConfig) -> Self {
        Ingestor {
            vendor,
            rejects: None,
        }
    }
}

impl<'v, W: Write> Ingestor<'v, W> {
    // rejected rows are copied as read, every field quoted
    pub fn with_rejects<T: Write>(
        self,
        writer: T,
        headers: &StringRecord,
    ) -> IngestResult<Ingestor<'v, T>> {
        let mut rejects = WriterBuilder::new()
            .quote_style(QuoteStyle::Always)
            .flexible(true)
            .from_writer(writer);
        rejects.write_record(headers)?;

        Ok(Ingestor {
            vendor: self.vendor,
            rejects: Some(rejects),
        })
    }

    // the first structural error ends the run
    pub async fn run<S, I>(&mut self, records: I, store: &mut S) -> IngestResult<IngestionReport>
    where
        S: ProductStore + ?Sized,
        I: IntoIterator<Item = IngestResult<ProductRecord>>,
    {
        let mut report = IngestionReport::new(&self.vendor.name);

        for record in records {
            let record = record?;
            let outcome = self.ingest_record(&record, store, &mut report).await?;

            match outcome {
                RowOutcome::Inserted => println!("Inserted product: {}", record.product_id),
                RowOutcome::Skipped => println!("Skipping existing product: {}", record.product_id),
                RowOutcome::Rejected(reason) => {
                    println!("Rejected product: {} ({})", record.product_id, reason)
                }
            }
        }

        if let Some(rejects) = self.rejects.as_mut() {
            rejects.flush()?;
        }

        report.finished_at = Utc::now();
        Ok(report)
    }

    async fn ingest_record<S>(
        &mut self,
        record: &ProductRecord,
        store: &mut S,
        report: &mut IngestionReport,
    ) -> IngestResult<RowOutcome>
    where
        S: ProductStore + ?Sized,
    {
        if store.find_by_product_id(&record.product_id).await?.is_some() {
            report.skipped += 1;
            return Ok(RowOutcome::Skipped);
        }

        match normalize(record, self.vendor)? {
            Normalized::Item { item, zero_filled } => {
                if zero_filled {
                    warn!(
                        product_id = %record.product_id,
                        line = record.line,
                        raw_price = %record.raw_price,
                        "no number in price, storing zero"
                    );
                    report.zero_filled += 1;
                }
                store.insert(&item).await?;
                report.inserted += 1;
                Ok(RowOutcome::Inserted)
            }
            Normalized::Rejected(reason) => {
                warn!(product_id = %record.product_id, line = record.line, %reason, "row rejected");
                if let Some(rejects) = self.rejects.as_mut() {
                    rejects.write_record(&record.raw)?;
                }
                report.rejected += 1;
                Ok(RowOutcome::Rejected(reason))
            }
        }
    }
}

pub async fn ingest<S, I>(
    records: I,
    vendor: &VendorConfig,
    store: &mut S,
) -> IngestResult<IngestionReport>
where
    S: ProductStore + ?Sized,
    I: IntoIterator<Item = IngestResult<ProductRecord>>,
{
    Ingestor::new(vendor).run(records, store).await
}

// one transaction per run, committed once at the end. on error it is dropped
// and rolls back, rows already reported as inserted included
pub async fn run_ingestion<W, I>(
    destination: &Destination,
    ingestor: &mut Ingestor<'_, W>,
    records: I,
) -> IngestResult<IngestionReport>
where
    W: Write,
    I: IntoIterator<Item = IngestResult<ProductRecord>>,
{
    let mut session = destination.begin().await?;
    let report = ingestor.run(records, &mut session).await?;
    debug!(processed = report.processed(), "all rows processed, committing");
    session.commit().await?;
    Ok(report)
}

// preview a record for user to check the vendor rules work as expected
pub fn preview_record(record: &ProductRecord, vendor: &VendorConfig) -> anyhow::Result<()> {
    match normalize(record, vendor)? {
        Normalized::Item { item, zero_filled } => {
            println!(
                "Preview the first record as it will be stored: {}",
                serde_json::to_string(&item)?
            );
            if zero_filled {
                println!(
                    "Note: price `{}` has no number and will be stored as 0",
                    record.raw_price
                );
            }
        }
        Normalized::Rejected(reason) => {
            println!("The first record will be rejected: {}", reason);
        }
    }

    let confirmed = read_yes_or_no("Does the record look correct?", true)?;
    println!();
    Ok(accept_preview(confirmed)?)
}

fn accept_preview(confirmed: bool) -> IngestResult<()> {
    if confirmed {
        Ok(())
    } else {
        Err(IngestError::PreviewDeclined)
    }
}

pub fn print_report(report: &IngestionReport) {
    let elapsed = report.finished_at - report.started_at;

    println!();
    println!(
        "{}/{} rows inserted for {}, {} skipped as existing, {} rejected, {} with a zero price.",
        report.inserted,
        report.processed(),
        report.vendor,
        report.skipped,
        report.rejected,
        report.zero_filled
    );
    println!("Finished in {} ms", elapsed.num_milliseconds());
    println!("✅ {} CSV ingestion complete.", report.vendor);
}
