//! # Exporter Module
//!
//! Writes scraped items to one JSON Lines file per item type.
//!
//! ## Overview
//!
//! [`MultiJsonLinesPipeline`] owns one output stream per known type (`product`,
//! `review`, `user`, `brand` by default), named `<dir>/<type>.jsonl`. Streams are
//! created (and truncated) in [`Pipeline::open`] and flushed and closed in
//! [`Pipeline::close`].
//!
//! Every item becomes one compact JSON object followed by a newline:
//!
//! - non-ASCII text is written as literal UTF-8, never as `\u` escapes;
//! - floats are rounded to four significant digits, so `4.3000000000000007`
//!   is written as `4.3`;
//! - items of a type without a stream pass through untouched.
//!
//! Each stream sits behind its own lock. Appends to the same stream never
//! interleave; appends to different streams do not contend.

use crate::error::PipelineError;
use crate::items::{ItemType, ScrapedItem};
use crate::pipeline::Pipeline;
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{Number, Value};
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

/// Significant digits kept for floating-point values.
const FLOAT_SIGNIFICANT_DIGITS: i32 = 4;
const STREAM_EXTENSION: &str = "jsonl";

type Stream = Mutex<Option<BufWriter<File>>>;

pub struct MultiJsonLinesPipeline {
    dir: PathBuf,
    streams: HashMap<&'static str, Stream>,
}

impl MultiJsonLinesPipeline {
    /// Creates a pipeline writing one stream per [`ItemType`] into `dir`.
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            streams: HashMap::new(),
        }
        .with_types(ItemType::ALL.iter().map(ItemType::as_str))
    }

    /// Replaces the set of types that get a stream.
    pub fn with_types<I>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = &'static str>,
    {
        self.streams = types
            .into_iter()
            .map(|name| (name, Mutex::new(None)))
            .collect();
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the stream file for `item_type`.
    pub fn stream_path(&self, item_type: &str) -> PathBuf {
        self.dir.join(format!("{}.{}", item_type, STREAM_EXTENSION))
    }

    /// Types that currently own a stream, in no particular order.
    pub fn stream_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.streams.keys().copied()
    }

    fn append(&self, stream: &str, line: &[u8]) -> Result<(), PipelineError> {
        let Some(slot) = self.streams.get(stream) else {
            return Ok(());
        };
        let mut guard = slot.lock();
        let writer = guard
            .as_mut()
            .ok_or_else(|| PipelineError::StreamClosed(stream.to_string()))?;
        writer
            .write_all(line)
            .map_err(|source| PipelineError::StreamWrite {
                stream: stream.to_string(),
                source,
            })
    }
}

#[async_trait]
impl<I: ScrapedItem> Pipeline<I> for MultiJsonLinesPipeline {
    fn name(&self) -> &str {
        "MultiJsonLinesPipeline"
    }

    async fn open(&self) -> Result<(), PipelineError> {
        fs::create_dir_all(&self.dir).map_err(|source| PipelineError::StreamWrite {
            stream: self.dir.display().to_string(),
            source,
        })?;

        for (name, slot) in &self.streams {
            let path = self.stream_path(name);
            let file = File::create(&path).map_err(|source| PipelineError::StreamWrite {
                stream: name.to_string(),
                source,
            })?;
            *slot.lock() = Some(BufWriter::new(file));
            debug!("Opened stream `{}` at {:?}", name, path);
        }
        info!(
            "Opened {} output streams in {:?}",
            self.streams.len(),
            self.dir
        );
        Ok(())
    }

    async fn process_item(&self, item: I) -> Result<Option<I>, PipelineError> {
        let stream = item.item_type();
        if !self.streams.contains_key(stream) {
            debug!("No stream for item type `{}`, passing item through", stream);
            return Ok(Some(item));
        }

        let mut value = serde_json::to_value(&item)?;
        normalize_floats(&mut value);
        let mut line = serde_json::to_vec(&value)?;
        line.push(b'\n');

        self.append(stream, &line)?;
        Ok(Some(item))
    }

    async fn close(&self) -> Result<(), PipelineError> {
        let mut first_error = None;
        for (name, slot) in &self.streams {
            let Some(mut writer) = slot.lock().take() else {
                continue;
            };
            if let Err(source) = writer.flush() {
                error!("Failed to flush stream `{}`: {}", name, source);
                first_error.get_or_insert(PipelineError::StreamWrite {
                    stream: name.to_string(),
                    source,
                });
            }
        }
        info!("Closed output streams in {:?}", self.dir);
        first_error.map_or(Ok(()), Err)
    }
}

/// Rounds every float in `value` to [`FLOAT_SIGNIFICANT_DIGITS`] significant digits.
/// Integers are left alone.
pub fn normalize_floats(value: &mut Value) {
    match value {
        Value::Number(n) if n.is_f64() => {
            if let Some(rounded) = n
                .as_f64()
                .and_then(|x| Number::from_f64(round_significant(x, FLOAT_SIGNIFICANT_DIGITS)))
            {
                *n = rounded;
            }
        }
        Value::Array(values) => values.iter_mut().for_each(normalize_floats),
        Value::Object(map) => map.values_mut().for_each(normalize_floats),
        _ => {}
    }
}

/// Rounds `x` to `digits` significant digits.
pub fn round_significant(x: f64, digits: i32) -> f64 {
    if x == 0.0 || !x.is_finite() {
        return x;
    }
    let magnitude = x.abs().log10().floor() as i32;
    let exponent = digits - 1 - magnitude;
    if exponent >= 0 {
        let scale = 10f64.powi(exponent);
        (x * scale).round() / scale
    } else {
        let scale = 10f64.powi(-exponent);
        (x / scale).round() * scale
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coerce::Coerced;
    use crate::items::{CosmeItem, Product, Review, User};
    use std::sync::Arc;

    fn read_lines(path: &Path) -> Vec<String> {
        fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn rounds_to_four_significant_digits() {
        assert_eq!(round_significant(4.3000000000000007, 4), 4.3);
        assert_eq!(round_significant(4.29999999999, 4), 4.3);
        assert_eq!(round_significant(5.0, 4), 5.0);
        assert_eq!(round_significant(0.000123456, 4), 0.0001235);
        assert_eq!(round_significant(123456.0, 4), 123500.0);
        assert_eq!(round_significant(-2.71828, 4), -2.718);
        assert_eq!(round_significant(0.0, 4), 0.0);
    }

    #[test]
    fn normalization_leaves_integers_and_text() {
        let mut value = serde_json::json!({
            "id": 10084858,
            "rating": 4.3000000000000007,
            "ranking": [3, "乳液"],
            "nested": {"point": 5.123456}
        });
        normalize_floats(&mut value);
        assert_eq!(
            serde_json::to_string(&value).unwrap(),
            r#"{"id":10084858,"nested":{"point":5.123},"ranking":[3,"乳液"],"rating":4.3}"#
        );
    }

    #[tokio::test]
    async fn writes_compact_utf8_lines_per_type() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = MultiJsonLinesPipeline::new(dir.path());
        Pipeline::<CosmeItem>::open(&pipeline).await.unwrap();

        let product = CosmeItem::from(Product {
            product_id: 10084858,
            maker: Some("Acme Corp".into()),
            rating: Some(Coerced::Float(4.29999999999)),
            ..Default::default()
        });
        let user = CosmeItem::from(User {
            user_id: 7,
            name: Some("はなこ".into()),
            ..Default::default()
        });
        assert!(pipeline.process_item(product).await.unwrap().is_some());
        pipeline.process_item(user).await.unwrap();
        Pipeline::<CosmeItem>::close(&pipeline).await.unwrap();

        let products = read_lines(&dir.path().join("product.jsonl"));
        assert_eq!(products.len(), 1);
        assert!(products[0].contains(r#""rating":4.3"#));
        assert!(!products[0].contains("have_count"));
        let value: Value = serde_json::from_str(&products[0]).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"product_id": 10084858, "maker": "Acme Corp", "rating": 4.3})
        );

        let users = read_lines(&dir.path().join("user.jsonl"));
        assert_eq!(users.len(), 1);
        assert!(users[0].contains(r#""name":"はなこ""#));
        assert!(!users[0].contains("\\u"));

        // every known stream exists even when nothing was written to it
        assert!(read_lines(&dir.path().join("review.jsonl")).is_empty());
        assert!(read_lines(&dir.path().join("brand.jsonl")).is_empty());
    }

    #[tokio::test]
    async fn items_without_stream_pass_through() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = MultiJsonLinesPipeline::new(dir.path()).with_types(["product"]);
        Pipeline::<CosmeItem>::open(&pipeline).await.unwrap();

        let review = CosmeItem::from(Review {
            user_id: 1,
            ..Default::default()
        });
        let passed = pipeline.process_item(review.clone()).await.unwrap();
        assert_eq!(passed, Some(review));
        Pipeline::<CosmeItem>::close(&pipeline).await.unwrap();
        assert!(!dir.path().join("review.jsonl").exists());
    }

    #[tokio::test]
    async fn concurrent_writers_never_interleave() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = Arc::new(MultiJsonLinesPipeline::new(dir.path()));
        Pipeline::<CosmeItem>::open(pipeline.as_ref()).await.unwrap();

        let long_text = "とても良い".repeat(400);
        let mut handles = Vec::new();
        for user_id in 0..32u64 {
            let pipeline = Arc::clone(&pipeline);
            let text = long_text.clone();
            handles.push(tokio::spawn(async move {
                let review = CosmeItem::from(Review {
                    user_id,
                    text: vec![text],
                    ..Default::default()
                });
                pipeline.process_item(review).await.unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
        Pipeline::<CosmeItem>::close(pipeline.as_ref()).await.unwrap();

        let lines = read_lines(&dir.path().join("review.jsonl"));
        assert_eq!(lines.len(), 32);
        let mut ids: Vec<u64> = lines
            .iter()
            .map(|line| {
                let value: Value = serde_json::from_str(line).unwrap();
                value["user_id"].as_u64().unwrap()
            })
            .collect();
        ids.sort_unstable();
        assert_eq!(ids, (0..32).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn write_after_close_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = MultiJsonLinesPipeline::new(dir.path());
        Pipeline::<CosmeItem>::open(&pipeline).await.unwrap();
        Pipeline::<CosmeItem>::close(&pipeline).await.unwrap();

        let item = CosmeItem::from(User {
            user_id: 1,
            ..Default::default()
        });
        let err = pipeline.process_item(item).await.unwrap_err();
        assert!(matches!(err, PipelineError::StreamClosed(ref name) if name == "user"));
        assert!(err.is_fatal());

        // closing twice is harmless
        Pipeline::<CosmeItem>::close(&pipeline).await.unwrap();
    }

    #[tokio::test]
    async fn extracted_product_line_has_rounded_rating() {
        let page = scraper::Html::parse_document(
            r#"<html><body>
                 <dl class="maker"><dd><a href="/maker/1">Acme Corp</a></dd></dl>
                 <p itemprop="ratingValue">4.29999999999</p>
                 <div class="info-related"><ul class="rev-btn">
                   <li>Like <span class="num">85</span></li>
                 </ul></div>
               </body></html>"#,
        );
        let url = url::Url::parse("http://www.cosme.net/product/product_id/10084858/top").unwrap();
        let product = crate::extract::extract_product(&page, &url).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let pipeline = MultiJsonLinesPipeline::new(dir.path());
        Pipeline::<CosmeItem>::open(&pipeline).await.unwrap();
        pipeline.process_item(CosmeItem::from(product)).await.unwrap();
        Pipeline::<CosmeItem>::close(&pipeline).await.unwrap();

        let lines = read_lines(&dir.path().join("product.jsonl"));
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains(r#""rating":4.3"#));
        assert!(lines[0].contains(r#""maker":"Acme Corp""#));
        assert!(!lines[0].contains("have_count"));
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn failed_flush_at_close_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        std::os::unix::fs::symlink("/dev/full", dir.path().join("product.jsonl")).unwrap();
        let pipeline = MultiJsonLinesPipeline::new(dir.path());
        Pipeline::<CosmeItem>::open(&pipeline).await.unwrap();

        let item = CosmeItem::from(Product {
            product_id: 1,
            ..Default::default()
        });
        // the line sits in the buffer until close
        pipeline.process_item(item).await.unwrap();

        let err = Pipeline::<CosmeItem>::close(&pipeline).await.unwrap_err();
        assert!(matches!(err, PipelineError::StreamWrite { ref stream, .. } if stream == "product"));
        assert!(err.is_fatal());
    }

    #[tokio::test]
    async fn open_reports_unwritable_directory() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("taken");
        fs::write(&blocker, b"not a directory").unwrap();

        let pipeline = MultiJsonLinesPipeline::new(&blocker);
        let err = Pipeline::<CosmeItem>::open(&pipeline).await.unwrap_err();
        assert!(err.is_fatal());
    }
}
