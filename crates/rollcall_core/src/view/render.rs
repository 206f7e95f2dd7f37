//! Slot rendering for one attendance row.
//!
//! # Responsibility
//! - Turn a record plus its resolved sort key into the content of one slot.
//!
//! # Invariants
//! - Text is HTML-escaped before newlines become `<br>` markers.
//! - Image bodies are only used when the text is empty.
//! - Rendering never fails; odd input degrades to an empty body.

use crate::model::record::Record;
use chrono::{DateTime, Utc};

const SIZED_PROFILE_PIC_HOST: &str = "googleusercontent.com";
const PROFILE_PIC_SIZE_SUFFIX: &str = "?sz=150";

/// Visual state of a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    /// Just inserted; waiting for the next tick.
    Pending,
    Visible,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageBody {
    /// Escaped markup with `<br>` line breaks.
    Text(String),
    /// Cache-busted image URL.
    Image(String),
    Empty,
}

/// Everything one row in the attendance table shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedSlot {
    pub name: String,
    pub rollno: String,
    pub body: MessageBody,
    pub profile_pic_url: Option<String>,
    /// Resolved sort key (provisional or authoritative) in epoch ms.
    pub sort_key: i64,
    pub record_time: String,
    /// Curriculum class used by the tab filter.
    pub row_class: String,
    pub visibility: Visibility,
}

/// Renders a record into a pending slot.
pub fn render_slot(record: &Record, sort_key: i64, now_ms: i64) -> RenderedSlot {
    let fields = &record.fields;
    let body = if !fields.text.is_empty() {
        MessageBody::Text(text_with_line_breaks(&fields.text))
    } else if let Some(url) = fields.image_url.as_deref().filter(|url| !url.is_empty()) {
        MessageBody::Image(cache_busted_image_url(url, now_ms))
    } else {
        MessageBody::Empty
    };

    RenderedSlot {
        name: fields.name.clone(),
        rollno: fields.rollno.clone(),
        body,
        profile_pic_url: fields.profile_pic_url.as_deref().map(sized_profile_pic_url),
        sort_key,
        record_time: format_record_time(sort_key),
        row_class: row_class(&fields.text),
        visibility: Visibility::Pending,
    }
}

/// Escapes markup and converts newlines into `<br>`.
pub fn text_with_line_breaks(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            '\n' => out.push_str("<br>"),
            other => out.push(other),
        }
    }
    out
}

pub fn cache_busted_image_url(url: &str, now_ms: i64) -> String {
    let separator = if url.contains('?') { '&' } else { '?' };
    format!("{url}{separator}{now_ms}")
}

/// Requests a 150px avatar from Google-hosted profile pictures.
pub fn sized_profile_pic_url(url: &str) -> String {
    if url.contains(SIZED_PROFILE_PIC_HOST) && !url.contains('?') {
        format!("{url}{PROFILE_PIC_SIZE_SUFFIX}")
    } else {
        url.to_string()
    }
}

/// Curriculum class for a subject: whitespace removed, lowercased.
pub fn row_class(subject: &str) -> String {
    subject
        .chars()
        .filter(|ch| !ch.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

pub fn format_record_time(epoch_ms: i64) -> String {
    match DateTime::<Utc>::from_timestamp_millis(epoch_ms) {
        Some(time) => time.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        None => String::new(),
    }
}
