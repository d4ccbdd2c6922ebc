//! Contest submission validation.

use bytes::Bytes;
use chrono::Utc;
use sha2::{Digest, Sha256};

use crate::config::ContestConfig;
use crate::error::ValidationError;
use crate::media;
use crate::types::*;

/// Uploaded video as received from the client
#[derive(Debug, Clone, Default)]
pub struct VideoUpload {
    pub file_name: Option<String>,
    pub mime_type: String,
    /// Declared size in bytes (the multipart part length)
    pub size: u64,
    pub bytes: Bytes,
    /// Duration reported by the browser, used when the container can't be probed
    pub declared_duration: Option<f64>,
}

/// Raw contest submission. Every field is optional so absence can be reported
/// precisely instead of failing at deserialization.
#[derive(Debug, Clone, Default)]
pub struct SubmissionCandidate {
    pub language: Option<String>,
    pub region: Option<String>,
    pub caption: Option<String>,
    pub video: Option<VideoUpload>,
}

pub struct SubmissionValidator {
    config: ContestConfig,
}

fn required(value: Option<&str>, field: &'static str) -> Result<String, ValidationError> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or(ValidationError::MissingField(field))
}

impl SubmissionValidator {
    pub fn new(config: ContestConfig) -> Self {
        Self { config }
    }

    /// Check a submission and build the entry it would create.
    pub fn validate(
        &self,
        candidate: SubmissionCandidate,
        ctx: &ClientContext,
    ) -> Result<ContestEntry, ValidationError> {
        let language = required(candidate.language.as_deref(), "language")?;
        let region = required(candidate.region.as_deref(), "region")?;
        let caption = required(candidate.caption.as_deref(), "caption")?;
        let video = candidate
            .video
            .filter(|v| v.size > 0 || !v.bytes.is_empty())
            .ok_or(ValidationError::MissingField("video"))?;

        let language =
            canonical_option(LANGUAGES, &language).ok_or(ValidationError::UnknownLanguage(language))?;
        let region =
            canonical_option(REGIONS, &region).ok_or(ValidationError::UnknownRegion(region))?;

        let caption_len = caption.chars().count();
        if caption_len > self.config.max_caption_chars {
            return Err(ValidationError::CaptionTooLong {
                len: caption_len,
                max: self.config.max_caption_chars,
            });
        }

        if !video.mime_type.to_ascii_lowercase().starts_with("video/") {
            return Err(ValidationError::InvalidMediaType(video.mime_type));
        }

        let size = video.size.max(video.bytes.len() as u64);
        if size > self.config.max_video_bytes {
            return Err(ValidationError::FileTooLarge {
                size,
                max: self.config.max_video_bytes,
            });
        }

        let seconds = self.duration_of(&video)?;
        if seconds > self.config.max_video_seconds as f64 {
            return Err(ValidationError::VideoTooLong {
                seconds,
                max: self.config.max_video_seconds,
            });
        }

        let digest = hex::encode(Sha256::digest(&video.bytes));
        let id = ulid::Ulid::new().to_string();
        let user_id = ctx
            .user_id
            .clone()
            .unwrap_or_else(|| format!("user_{}", ulid::Ulid::new()));
        let user_name = ctx.display_name.clone().unwrap_or_else(generated_display_name);

        Ok(ContestEntry {
            id,
            user_id,
            user_name,
            language: language.to_string(),
            region: region.to_string(),
            caption,
            video_url: format!("{}/{}", self.config.media_base_url.trim_end_matches('/'), digest),
            video_digest: digest,
            votes: 0,
            views: 0,
            created_at: Utc::now(),
            rank: 0,
        })
    }

    fn duration_of(&self, video: &VideoUpload) -> Result<f64, ValidationError> {
        match media::probe_duration(&video.bytes) {
            Ok(seconds) => Ok(seconds),
            Err(e) => {
                tracing::debug!(
                    file_name = video.file_name.as_deref().unwrap_or(""),
                    "Could not probe video duration: {}",
                    e
                );
                video
                    .declared_duration
                    .filter(|d| d.is_finite() && *d >= 0.0)
                    .ok_or(ValidationError::UnknownDuration)
            }
        }
    }
}
