//! Parquet output for extracted events
//!
//! Every run that extracted at least one event writes a new part file
//! `<period> - pNN.parquet`, so repeated runs over the same month never
//! overwrite each other's output. With a shared store attached, part numbers
//! already taken there are skipped as well.

use crate::config::object_key;
use crate::output::traits::{OutputError, OutputResult, ResultSink};
use crate::state::{period_file_stem, EarthquakeEvent};
use crate::storage::ObjectStore;
use arrow_array::{
    ArrayRef, BooleanArray, Float64Array, RecordBatch, StringArray, TimestampMillisecondArray,
    UInt32Array,
};
use arrow_schema::{DataType, Field, Schema, SchemaRef, TimeUnit};
use async_trait::async_trait;
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Arrow schema of the event files
pub fn event_schema() -> SchemaRef {
    let timestamp = DataType::Timestamp(TimeUnit::Millisecond, None);
    Arc::new(Schema::new(vec![
        Field::new("recorded_at", timestamp.clone(), false),
        Field::new("depth", DataType::UInt32, false),
        Field::new("origin", DataType::Utf8, false),
        Field::new("magnitude", DataType::Float64, false),
        Field::new("latitude", DataType::Float64, false),
        Field::new("longitude", DataType::Float64, false),
        Field::new("damage_expected", DataType::Boolean, false),
        Field::new("aftershock_expected", DataType::Boolean, false),
        Field::new("intensity", DataType::Utf8, false),
        Field::new("issued_on", timestamp, false),
        Field::new("prepared_by", DataType::Utf8, false),
    ]))
}

/// Builds one record batch holding all events
pub fn events_to_batch(events: &[EarthquakeEvent]) -> OutputResult<RecordBatch> {
    let millis = |f: fn(&EarthquakeEvent) -> chrono::NaiveDateTime| -> Vec<i64> {
        events
            .iter()
            .map(|e| f(e).and_utc().timestamp_millis())
            .collect()
    };

    let columns: Vec<ArrayRef> = vec![
        Arc::new(TimestampMillisecondArray::from(millis(|e| e.recorded_at))),
        Arc::new(UInt32Array::from(
            events.iter().map(|e| e.depth).collect::<Vec<_>>(),
        )),
        Arc::new(StringArray::from(
            events.iter().map(|e| e.origin.as_str()).collect::<Vec<_>>(),
        )),
        Arc::new(Float64Array::from(
            events.iter().map(|e| e.magnitude).collect::<Vec<_>>(),
        )),
        Arc::new(Float64Array::from(
            events.iter().map(|e| e.latitude).collect::<Vec<_>>(),
        )),
        Arc::new(Float64Array::from(
            events.iter().map(|e| e.longitude).collect::<Vec<_>>(),
        )),
        Arc::new(BooleanArray::from(
            events.iter().map(|e| e.damage_expected).collect::<Vec<_>>(),
        )),
        Arc::new(BooleanArray::from(
            events.iter().map(|e| e.aftershock_expected).collect::<Vec<_>>(),
        )),
        Arc::new(StringArray::from(
            events.iter().map(|e| e.intensity.as_str()).collect::<Vec<_>>(),
        )),
        Arc::new(TimestampMillisecondArray::from(millis(|e| e.issued_on))),
        Arc::new(StringArray::from(
            events.iter().map(|e| e.prepared_by.as_str()).collect::<Vec<_>>(),
        )),
    ];

    Ok(RecordBatch::try_new(event_schema(), columns)?)
}

/// Writes events to a Snappy-compressed Parquet file
pub fn write_events_parquet(path: &Path, events: &[EarthquakeEvent]) -> OutputResult<()> {
    let batch = events_to_batch(events)?;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file = File::create(path)?;
    let props = WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .build();
    let mut writer = ArrowWriter::try_new(file, batch.schema(), Some(props))?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(())
}

/// File name of part `part` for a period
pub fn part_file_name(period: &str, part: usize) -> String {
    format!("{} - p{:02}.parquet", period_file_stem(period), part)
}

/// Number of part files for a period already in `output_dir`
///
/// The next part written locally is this count plus one.
fn count_local_parts(output_dir: &Path, period: &str) -> std::io::Result<usize> {
    let prefix = format!("{} - p", period_file_stem(period));
    match std::fs::read_dir(output_dir) {
        Ok(entries) => Ok(entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_name().to_string_lossy().starts_with(&prefix))
            .count()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(0),
        Err(e) => Err(e),
    }
}

/// Writes each run's events to a new Parquet part file
#[derive(Clone)]
pub struct ParquetSink {
    output_dir: PathBuf,
    remote: Option<Arc<dyn ObjectStore>>,
    prefix: String,
}

impl ParquetSink {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            remote: None,
            prefix: String::new(),
        }
    }

    /// Uploads every written file to `remote` under `prefix`
    pub fn with_remote(mut self, remote: Arc<dyn ObjectStore>, prefix: impl Into<String>) -> Self {
        self.remote = Some(remote);
        self.prefix = prefix.into();
        self
    }
}

#[async_trait]
impl ResultSink for ParquetSink {
    async fn finalize(
        &self,
        period: &str,
        events: &[EarthquakeEvent],
    ) -> OutputResult<Option<PathBuf>> {
        if events.is_empty() {
            tracing::info!("No events extracted for {}, skipping output", period);
            return Ok(None);
        }

        let mut part = count_local_parts(&self.output_dir, period)? + 1;

        // Parts written from other machines only exist in the shared store
        if let Some(remote) = &self.remote {
            while remote
                .exists(&object_key(&self.prefix, &part_file_name(period, part)))
                .await?
            {
                part += 1;
            }
        }

        let name = part_file_name(period, part);
        let path = self.output_dir.join(&name);
        let target = path.clone();
        let events_owned = events.to_vec();

        tokio::task::spawn_blocking(move || write_events_parquet(&target, &events_owned))
            .await
            .map_err(|e| OutputError::Write(e.to_string()))??;

        tracing::info!("Data saved into {}", path.display());

        if let Some(remote) = &self.remote {
            let key = object_key(&self.prefix, &name);
            remote.upload(&path, &key).await?;
            tracing::info!("{} uploaded to {}", key, remote.location());
        }

        Ok(Some(path))
    }
}
