//! JSON draft codec and draft file helpers.
//!
//! A draft is the restorable JSON form of a [`Report`], tagged with a schema
//! `version` so unrecognized drafts are rejected explicitly instead of being
//! partially parsed. Logo bytes travel base64-encoded. Deserialization
//! re-runs the data model validation, so a corrupted-but-parseable draft
//! surfaces [`Error::Validation`](crate::Error::Validation) rather than
//! silently producing an invalid report.

use std::path::{Path, PathBuf};

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::report::{Field, Logo, Report, Section, SectionContent};

/// Current draft schema version. Drafts with any other version are rejected.
pub const DRAFT_VERSION: u32 = 1;

/// Serialized draft file layout.
#[derive(Debug, Serialize, Deserialize)]
struct DraftFile {
    version: u32,
    title: String,
    author: String,
    date: NaiveDate,
    sections: Vec<DraftSection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    logo: Option<DraftLogo>,
}

#[derive(Debug, Serialize, Deserialize)]
struct DraftSection {
    heading: String,
    #[serde(flatten)]
    content: DraftContent,
}

/// Section body, tagged by its variant kind.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum DraftContent {
    Fields {
        fields: Vec<DraftField>,
    },
    Paragraphs {
        paragraphs: Vec<String>,
    },
}

#[derive(Debug, Serialize, Deserialize)]
struct DraftField {
    label: String,
    value: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct DraftLogo {
    width_cm: f64,
    data: String,
}

/// Serialize a report to pretty-printed draft JSON.
///
/// # Errors
///
/// [`Error::DraftCorrupt`] if JSON encoding fails (practically unreachable
/// for a valid report).
pub fn serialize(report: &Report) -> Result<String> {
    let draft = DraftFile {
        version: DRAFT_VERSION,
        title: report.title().to_string(),
        author: report.author().to_string(),
        date: report.date(),
        sections: report.sections().iter().map(section_to_draft).collect(),
        logo: report.logo().map(|logo| DraftLogo {
            width_cm: logo.width_cm,
            data: BASE64.encode(&logo.data),
        }),
    };
    serde_json::to_string_pretty(&draft).map_err(|e| Error::draft(format!("encoding failed: {e}")))
}

/// Deserialize draft JSON back into a validated report.
///
/// # Errors
///
/// [`Error::DraftCorrupt`] on malformed JSON, missing required fields, an
/// unrecognized `version`, or an undecodable logo payload;
/// [`Error::Validation`](crate::Error::Validation) when the parsed draft
/// holds an invalid report.
pub fn deserialize(json: &str) -> Result<Report> {
    let draft: DraftFile =
        serde_json::from_str(json).map_err(|e| Error::draft(format!("malformed JSON: {e}")))?;

    if draft.version != DRAFT_VERSION {
        return Err(Error::draft(format!(
            "unsupported draft version {} (supported: {DRAFT_VERSION})",
            draft.version
        )));
    }

    let logo = draft
        .logo
        .map(|logo| -> Result<Logo> {
            let data = BASE64
                .decode(logo.data.as_bytes())
                .map_err(|e| Error::draft(format!("logo payload is not valid base64: {e}")))?;
            Ok(Logo::new(data, logo.width_cm))
        })
        .transpose()?;

    let sections = draft.sections.into_iter().map(section_from_draft).collect();

    Report::new(draft.title, draft.author, draft.date, sections, logo)
}

fn section_to_draft(section: &Section) -> DraftSection {
    DraftSection {
        heading: section.heading.clone(),
        content: match &section.content {
            SectionContent::Fields(fields) => DraftContent::Fields {
                fields: fields
                    .iter()
                    .map(|f| DraftField {
                        label: f.label.clone(),
                        value: f.value.clone(),
                    })
                    .collect(),
            },
            SectionContent::Paragraphs(paragraphs) => DraftContent::Paragraphs {
                paragraphs: paragraphs.clone(),
            },
        },
    }
}

fn section_from_draft(section: DraftSection) -> Section {
    let content = match section.content {
        DraftContent::Fields { fields } => SectionContent::Fields(
            fields
                .into_iter()
                .map(|f| Field::new(f.label, f.value))
                .collect(),
        ),
        DraftContent::Paragraphs { paragraphs } => SectionContent::Paragraphs(paragraphs),
    };
    Section {
        heading: section.heading,
        content,
    }
}

// === Draft files on disk ===

/// Write a report's draft JSON to `path`.
pub fn save_to(report: &Report, path: impl AsRef<Path>) -> Result<()> {
    let json = serialize(report)?;
    std::fs::write(path, json)?;
    Ok(())
}

/// Load and validate a draft file from `path`.
pub fn load_from(path: impl AsRef<Path>) -> Result<Report> {
    let json = std::fs::read_to_string(path)?;
    deserialize(&json)
}

/// List draft files (`*.json`) in a directory, sorted by file name.
///
/// The counter file used by [`next_report_code`] is excluded.
pub fn list_drafts(dir: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
    let mut drafts: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.extension().is_some_and(|ext| ext == "json")
                && path.file_name().is_some_and(|name| name != COUNTER_FILE)
        })
        .collect();
    drafts.sort();
    Ok(drafts)
}

/// Name of the persistent report-code counter file.
const COUNTER_FILE: &str = "counter.json";

#[derive(Debug, Default, Serialize, Deserialize)]
struct Counter {
    counter: u64,
}

/// Allocate the next sequential report code, e.g. `RTEC001`.
///
/// The counter persists in `counter.json` inside `dir` (created if missing).
/// A corrupt counter file restarts the sequence at one.
pub fn next_report_code(dir: impl AsRef<Path>, prefix: &str) -> Result<String> {
    let dir = dir.as_ref();
    std::fs::create_dir_all(dir)?;
    let counter_path = dir.join(COUNTER_FILE);

    let mut counter = match std::fs::read_to_string(&counter_path) {
        Ok(text) => serde_json::from_str::<Counter>(&text).unwrap_or_default(),
        Err(_) => Counter::default(),
    };
    counter.counter += 1;

    let text = serde_json::to_string_pretty(&counter)
        .map_err(|e| Error::draft(format!("encoding counter failed: {e}")))?;
    std::fs::write(&counter_path, text)?;

    Ok(format!("{prefix}{:03}", counter.counter))
}
