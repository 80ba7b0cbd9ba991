//! Request decoding.
//!
//! Code and image requests are JSON documents. Summary requests carry a
//! base64-encoded MIME email whose `text/plain` content is what gets
//! summarized.

use crate::models::{CodeRequest, ImageRequest};
use base64::Engine;
use mailparse::ParsedMail;
use thiserror::Error;
use validator::Validate;

/// Error type for request decoding.
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("Request body is missing")]
    MissingBody,

    #[error("Invalid JSON body: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("Invalid request: {0}")]
    Invalid(#[from] validator::ValidationErrors),

    #[error("Invalid base64 body: {0}")]
    InvalidBase64(#[from] base64::DecodeError),

    #[error("Body is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),

    #[error("Invalid MIME message: {0}")]
    InvalidMime(#[from] mailparse::MailParseError),
}

/// Decode a `{"message": ..., "key": ...}` code generation request.
pub fn decode_code_request(body: &str) -> Result<CodeRequest, DecodeError> {
    let request: CodeRequest = serde_json::from_str(body)?;
    request.validate()?;
    Ok(request)
}

/// Decode a `{"message": ...}` image generation request.
pub fn decode_image_request(body: &str) -> Result<ImageRequest, DecodeError> {
    let request: ImageRequest = serde_json::from_str(body)?;
    request.validate()?;
    Ok(request)
}

/// Decode standard base64, ignoring any ASCII whitespace (line wrapping).
pub fn decode_base64(body: &str) -> Result<Vec<u8>, DecodeError> {
    let compact: String = body.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    Ok(base64::engine::general_purpose::STANDARD.decode(compact)?)
}

/// Base64-decode a summary request body and extract its plain text.
pub fn decode_summary_body(body: &str) -> Result<Option<String>, DecodeError> {
    let raw = decode_base64(body)?;
    extract_plain_text(&raw)
}

/// Extract the `text/plain` content of a MIME message.
///
/// For multipart messages every `text/plain` part, at any depth and inside
/// attached `message/rfc822` messages, contributes its decoded payload
/// followed by a newline. A single-part message
/// contributes its payload only when it is `text/plain` (the default when no
/// Content-Type is given). The result is trimmed; `None` means no plain text
/// was found.
pub fn extract_plain_text(data: &[u8]) -> Result<Option<String>, DecodeError> {
    let mail = mailparse::parse_mail(data)?;

    let mut text = String::new();
    if is_multipart(&mail) || is_attached_message(&mail) {
        collect_plain_text(&mail, &mut text)?;
    } else if is_plain_text(&mail) {
        text = mail.get_body()?;
    }

    let trimmed = text.trim();
    if trimmed.is_empty() {
        Ok(None)
    } else {
        Ok(Some(trimmed.to_string()))
    }
}

fn is_multipart(part: &ParsedMail<'_>) -> bool {
    part.ctype
        .mimetype
        .to_ascii_lowercase()
        .starts_with("multipart/")
}

fn is_attached_message(part: &ParsedMail<'_>) -> bool {
    part.ctype.mimetype.eq_ignore_ascii_case("message/rfc822")
}

fn is_plain_text(part: &ParsedMail<'_>) -> bool {
    part.ctype.mimetype.eq_ignore_ascii_case("text/plain")
}

/// Depth-first walk, parent before children.
fn collect_plain_text(part: &ParsedMail<'_>, out: &mut String) -> Result<(), DecodeError> {
    if is_plain_text(part) {
        let body = part.get_body()?;
        // The line break before a boundary delimiter belongs to the delimiter.
        let body = body
            .strip_suffix("\r\n")
            .or_else(|| body.strip_suffix('\n'))
            .unwrap_or(&body);
        out.push_str(body);
        out.push('\n');
    }

    if is_attached_message(part) {
        let raw = part.get_body_raw()?;
        let attached = mailparse::parse_mail(&raw)?;
        collect_plain_text(&attached, out)?;
    }

    for subpart in &part.subparts {
        collect_plain_text(subpart, out)?;
    }

    Ok(())
}
