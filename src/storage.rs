use std::path::Path;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client as S3Client;
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};
use tracing::warn;

const EVIDENCE_PREFIX: &str = "evidence";
const SIGNATURE_PREFIX: &str = "signatures";
const FALLBACK_EXTENSION: &str = "bin";

const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'?')
    .add(b'<')
    .add(b'>')
    .add(b'`')
    .add(b'{')
    .add(b'}');

#[async_trait]
pub trait ObjectStorage: Send + Sync + 'static {
    async fn upload(&self, key: &str, bytes: Vec<u8>, content_type: Option<String>) -> Result<()>;

    fn public_url(&self, key: &str) -> String;

    /// Inverse of [`ObjectStorage::public_url`]; `None` for foreign URLs.
    fn key_from_public_url(&self, url: &str) -> Option<String>;

    async fn remove(&self, keys: &[String]) -> Result<()>;
}

pub struct S3Storage {
    client: S3Client,
    bucket: String,
    public_base: String,
}

impl S3Storage {
    pub fn new(client: S3Client, bucket: impl Into<String>, public_base: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
            public_base: public_base.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl ObjectStorage for S3Storage {
    async fn upload(&self, key: &str, bytes: Vec<u8>, content_type: Option<String>) -> Result<()> {
        let mut request = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(bytes));

        if let Some(content_type) = content_type {
            request = request.content_type(content_type);
        }

        request
            .send()
            .await
            .context("failed to upload object to S3")?;

        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        public_url_for(&self.public_base, key)
    }

    fn key_from_public_url(&self, url: &str) -> Option<String> {
        key_from_url(&self.public_base, url)
    }

    async fn remove(&self, keys: &[String]) -> Result<()> {
        let mut failed = Vec::new();
        for key in keys {
            if let Err(err) = self
                .client
                .delete_object()
                .bucket(&self.bucket)
                .key(key)
                .send()
                .await
            {
                warn!(key = %key, error = %err, "failed to delete object from S3");
                failed.push(key.as_str());
            }
        }
        if !failed.is_empty() {
            bail!("failed to delete objects: {}", failed.join(", "));
        }
        Ok(())
    }
}

pub fn public_url_for(base: &str, key: &str) -> String {
    let encoded: Vec<String> = key
        .split('/')
        .map(|segment| utf8_percent_encode(segment, PATH_SEGMENT).to_string())
        .collect();
    format!("{}/{}", base.trim_end_matches('/'), encoded.join("/"))
}

pub fn key_from_url(base: &str, url: &str) -> Option<String> {
    let prefix = format!("{}/", base.trim_end_matches('/'));
    let rest = url.strip_prefix(&prefix)?;
    let rest = rest.split(['?', '#']).next().unwrap_or(rest);
    if rest.is_empty() {
        return None;
    }
    percent_decode_str(rest)
        .decode_utf8()
        .ok()
        .map(|decoded| decoded.into_owned())
}

/// `evidence/{job_id}_{millis}.{ext}`
pub fn evidence_key(job_id: i64, epoch_millis: i64, extension: &str) -> String {
    format!("{EVIDENCE_PREFIX}/{job_id}_{epoch_millis}.{extension}")
}

/// `signatures/sig_{job_id}_{millis}.png`, or `sig_public_...` for the
/// customer-facing link.
pub fn signature_key(job_id: i64, epoch_millis: i64, public: bool) -> String {
    if public {
        format!("{SIGNATURE_PREFIX}/sig_public_{job_id}_{epoch_millis}.png")
    } else {
        format!("{SIGNATURE_PREFIX}/sig_{job_id}_{epoch_millis}.png")
    }
}

/// Extension for an uploaded evidence file: the file name's own extension
/// when it has a sane one, otherwise one guessed from the content type.
pub fn evidence_extension(file_name: Option<&str>, content_type: Option<&str>) -> String {
    let from_name = file_name
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .filter(|ext| !ext.is_empty() && ext.len() <= 8 && ext.chars().all(|c| c.is_ascii_alphanumeric()));
    if let Some(ext) = from_name {
        return ext;
    }

    content_type
        .and_then(mime_guess::get_mime_extensions_str)
        .and_then(|exts| exts.first())
        .map(|ext| ext.to_string())
        .unwrap_or_else(|| FALLBACK_EXTENSION.to_string())
}
