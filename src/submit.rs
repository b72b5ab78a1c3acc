use crate::card::inputs::CardInputs;
use crate::color::model::ColorRgb;
use crate::export::ExportArtifact;
use crate::foundation::error::{CardError, CardResult};

/// The JSON part of a submission.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct SubmissionPayload {
    pub title: String,
    pub series: String,
    /// Relative timestamp token, `<t:{unix}:R>`.
    pub submitted: String,
    /// `(R << 16) | (G << 8) | B` of the dominant color.
    pub accent_color: u32,
}

/// One file part of the multipart bundle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubmissionPart {
    pub field: &'static str,
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Upload supplied by the user, forwarded as-is.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OriginalUpload {
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Submission {
    pub payload: SubmissionPayload,
    pub parts: Vec<SubmissionPart>,
}

impl Submission {
    pub fn payload_json(&self) -> CardResult<String> {
        serde_json::to_string_pretty(&self.payload)
            .map_err(|e| CardError::validation(format!("serialize submission payload: {e}")))
    }
}

/// Build the submission bundle. Nothing is sent; the caller owns the network call.
///
/// Cards with a print number are refused locally.
pub fn prepare_submission(
    inputs: &CardInputs,
    dominant: ColorRgb,
    artifact: &ExportArtifact,
    original_upload: Option<&OriginalUpload>,
    unix_now: u64,
) -> CardResult<Submission> {
    if !inputs.print_number.trim().is_empty() {
        return Err(CardError::rejected(
            "cards with a print number cannot be submitted",
        ));
    }

    let payload = SubmissionPayload {
        title: inputs.character_name.clone(),
        series: inputs.series_title.clone(),
        submitted: format!("<t:{unix_now}:R>"),
        accent_color: dominant.accent_int(),
    };

    let mut parts = vec![SubmissionPart {
        field: "file",
        filename: artifact.filename.clone(),
        content_type: "image/png".to_string(),
        bytes: artifact.png_bytes()?,
    }];
    if let Some(up) = original_upload {
        parts.push(SubmissionPart {
            field: "original",
            filename: up.filename.clone(),
            content_type: up.content_type.clone(),
            bytes: up.bytes.clone(),
        });
    }

    tracing::debug!(parts = parts.len(), accent = payload.accent_color, "submission prepared");
    Ok(Submission { payload, parts })
}

#[cfg(test)]
#[path = "../tests/unit/submit.rs"]
mod tests;
