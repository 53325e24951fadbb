use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};

use super::EngineError;
use crate::models::NewFeedback;

const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\n";

/// The six 1-5 survey scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ratings {
    pub politeness: i16,
    pub speed: i16,
    pub quality: i16,
    pub cleanliness: i16,
    pub punctuality: i16,
    pub overall: i16,
}

impl Ratings {
    fn named(&self) -> [(&'static str, i16); 6] {
        [
            ("politeness", self.politeness),
            ("speed", self.speed),
            ("quality", self.quality),
            ("cleanliness", self.cleanliness),
            ("punctuality", self.punctuality),
            ("overall", self.overall),
        ]
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        for (name, value) in self.named() {
            if !(1..=5).contains(&value) {
                return Err(EngineError::Validation(format!(
                    "{name} rating must be between 1 and 5"
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct FeedbackForm {
    pub ratings: Ratings,
    pub suggestion: Option<String>,
    pub signature_png: Vec<u8>,
}

impl FeedbackForm {
    pub fn validate(&self) -> Result<(), EngineError> {
        self.ratings.validate()?;
        if self.signature_png.is_empty() {
            return Err(EngineError::Validation(
                "customer signature is required".into(),
            ));
        }
        if !self.signature_png.starts_with(PNG_MAGIC) {
            return Err(EngineError::Validation(
                "signature must be a PNG image".into(),
            ));
        }
        Ok(())
    }

    pub(crate) fn to_record(&self, job_id: i64, signature_url: String) -> NewFeedback {
        NewFeedback {
            job_id,
            rating_politeness: self.ratings.politeness,
            rating_speed: self.ratings.speed,
            rating_quality: self.ratings.quality,
            rating_cleanliness: self.ratings.cleanliness,
            rating_punctuality: self.ratings.punctuality,
            rating_overall: self.ratings.overall,
            suggestion: self
                .suggestion
                .as_deref()
                .map(str::trim)
                .filter(|text| !text.is_empty())
                .map(str::to_string),
            signature_url,
        }
    }
}

/// Decodes a signature pad export: a `data:image/png;base64,` URL or bare
/// base64. Blank input yields no bytes.
pub fn decode_signature(data: &str) -> Result<Vec<u8>, EngineError> {
    let trimmed = data.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }
    let payload = match trimmed.strip_prefix("data:") {
        Some(rest) => {
            let (meta, body) = rest.split_once(',').ok_or_else(|| {
                EngineError::Validation("signature data URL is malformed".into())
            })?;
            if !meta.ends_with(";base64") {
                return Err(EngineError::Validation(
                    "signature data URL must be base64 encoded".into(),
                ));
            }
            body
        }
        None => trimmed,
    };
    STANDARD
        .decode(payload)
        .map_err(|err| EngineError::Validation(format!("signature is not valid base64: {err}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ratings(value: i16) -> Ratings {
        Ratings {
            politeness: value,
            speed: value,
            quality: value,
            cleanliness: value,
            punctuality: value,
            overall: value,
        }
    }

    fn png() -> Vec<u8> {
        let mut bytes = PNG_MAGIC.to_vec();
        bytes.extend_from_slice(b"IHDR");
        bytes
    }

    #[test]
    fn ratings_must_be_in_range() {
        assert!(ratings(1).validate().is_ok());
        assert!(ratings(5).validate().is_ok());
        assert!(ratings(0).validate().is_err());
        let mut bad = ratings(3);
        bad.punctuality = 6;
        let err = bad.validate().unwrap_err();
        assert_eq!(err.to_string(), "punctuality rating must be between 1 and 5");
    }

    #[test]
    fn empty_signature_is_rejected() {
        let form = FeedbackForm {
            ratings: ratings(4),
            suggestion: None,
            signature_png: Vec::new(),
        };
        assert_eq!(
            form.validate().unwrap_err().to_string(),
            "customer signature is required"
        );
    }

    #[test]
    fn signature_must_be_png() {
        let form = FeedbackForm {
            ratings: ratings(4),
            suggestion: None,
            signature_png: b"GIF89a".to_vec(),
        };
        assert!(form.validate().is_err());
    }

    #[test]
    fn decodes_data_url_and_bare_base64() {
        let encoded = STANDARD.encode(png());
        assert_eq!(
            decode_signature(&format!("data:image/png;base64,{encoded}")).unwrap(),
            png()
        );
        assert_eq!(decode_signature(&encoded).unwrap(), png());
        assert!(decode_signature("   ").unwrap().is_empty());
        assert!(decode_signature("data:image/png,abc").is_err());
        assert!(decode_signature("***").is_err());
    }

    #[test]
    fn blank_suggestion_is_dropped() {
        let form = FeedbackForm {
            ratings: ratings(5),
            suggestion: Some("   ".into()),
            signature_png: png(),
        };
        let record = form.to_record(3, "https://cdn/sig.png".into());
        assert_eq!(record.suggestion, None);
        assert_eq!(record.rating_overall, 5);
    }
}
