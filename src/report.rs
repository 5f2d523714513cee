//! Structured report data model.
//!
//! A [`Report`] is an immutable value built once through the validating
//! constructor and then passed by reference into every renderer and the
//! draft codec. Validation happens exactly here; downstream consumers trust
//! an already-valid report.

use chrono::NaiveDate;

use crate::error::{Error, Result};

/// The root structured document submitted for rendering or persistence.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    title: String,
    author: String,
    date: NaiveDate,
    sections: Vec<Section>,
    logo: Option<Logo>,
}

/// A named, ordered subdivision of a report.
#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    /// Section heading, rendered as a second-level heading in every format.
    pub heading: String,
    /// Section body. The variant is fixed at construction and never mixed.
    pub content: SectionContent,
}

/// Body of a [`Section`]: either labeled fields or free-text paragraphs.
#[derive(Debug, Clone, PartialEq)]
pub enum SectionContent {
    /// Ordered label/value pairs, rendered as definition lines or table rows.
    Fields(Vec<Field>),
    /// Ordered free-text paragraphs.
    Paragraphs(Vec<String>),
}

/// A label/value pair within a section.
///
/// Both sides are plain text, never pre-escaped markup; each renderer escapes
/// into its own target syntax.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    /// Field label.
    pub label: String,
    /// Field value.
    pub value: String,
}

/// Optional logo: raw PNG/JPEG bytes plus the target physical width.
#[derive(Debug, Clone, PartialEq)]
pub struct Logo {
    /// Raw image bytes as uploaded.
    pub data: Vec<u8>,
    /// Target width in centimeters, strictly positive.
    pub width_cm: f64,
}

impl Field {
    /// Create a field from a label and value.
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }
}

impl Section {
    /// Create a section holding labeled fields.
    pub fn fields(heading: impl Into<String>, fields: Vec<Field>) -> Self {
        Self {
            heading: heading.into(),
            content: SectionContent::Fields(fields),
        }
    }

    /// Create a section holding free-text paragraphs.
    pub fn paragraphs(heading: impl Into<String>, paragraphs: Vec<String>) -> Self {
        Self {
            heading: heading.into(),
            content: SectionContent::Paragraphs(paragraphs),
        }
    }
}

impl Logo {
    /// Create a logo from raw image bytes and a target width in centimeters.
    pub fn new(data: Vec<u8>, width_cm: f64) -> Self {
        Self { data, width_cm }
    }
}

impl Report {
    /// Build a validated report.
    ///
    /// This is the only validation gate: `title` and every section heading
    /// must be non-empty, a logo width must be strictly positive, and all
    /// text must be free of control characters other than `\n`.
    ///
    /// # Errors
    ///
    /// [`Error::Validation`] naming the offending attribute.
    pub fn new(
        title: impl Into<String>,
        author: impl Into<String>,
        date: NaiveDate,
        sections: Vec<Section>,
        logo: Option<Logo>,
    ) -> Result<Self> {
        let title = title.into();
        let author = author.into();

        if title.trim().is_empty() {
            return Err(Error::validation("title", "must not be empty"));
        }
        check_text("title", &title)?;
        check_text("author", &author)?;

        for (idx, section) in sections.iter().enumerate() {
            if section.heading.trim().is_empty() {
                return Err(Error::validation(
                    format!("sections[{idx}].heading"),
                    "must not be empty",
                ));
            }
            check_text(format!("sections[{idx}].heading"), &section.heading)?;
            match &section.content {
                SectionContent::Fields(fields) => {
                    for (fidx, field) in fields.iter().enumerate() {
                        check_text(
                            format!("sections[{idx}].fields[{fidx}].label"),
                            &field.label,
                        )?;
                        check_text(
                            format!("sections[{idx}].fields[{fidx}].value"),
                            &field.value,
                        )?;
                    }
                },
                SectionContent::Paragraphs(paragraphs) => {
                    for (pidx, paragraph) in paragraphs.iter().enumerate() {
                        check_text(format!("sections[{idx}].paragraphs[{pidx}]"), paragraph)?;
                    }
                },
            }
        }

        if let Some(logo) = &logo {
            if !(logo.width_cm > 0.0) || !logo.width_cm.is_finite() {
                return Err(Error::validation("logo.width_cm", "must be strictly positive"));
            }
        }

        Ok(Self {
            title,
            author,
            date,
            sections,
            logo,
        })
    }

    /// Report title.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Report author; may be empty.
    pub fn author(&self) -> &str {
        &self.author
    }

    /// Report date.
    pub fn date(&self) -> NaiveDate {
        self.date
    }

    /// Sections in their significant order.
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// Optional logo.
    pub fn logo(&self) -> Option<&Logo> {
        self.logo.as_ref()
    }
}

/// Reject control characters other than newline.
fn check_text(field: impl Into<String>, text: &str) -> Result<()> {
    if let Some(c) = text.chars().find(|c| c.is_control() && *c != '\n') {
        return Err(Error::validation(
            field,
            format!("contains control character U+{:04X}", c as u32),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 31).unwrap()
    }

    #[test]
    fn test_valid_report() {
        let report = Report::new(
            "Q1 Summary",
            "Alice",
            date(),
            vec![Section::fields("Overview", vec![Field::new("Status", "Green")])],
            None,
        )
        .unwrap();

        assert_eq!(report.title(), "Q1 Summary");
        assert_eq!(report.author(), "Alice");
        assert_eq!(report.sections().len(), 1);
        assert!(report.logo().is_none());
    }

    #[test]
    fn test_empty_title_rejected() {
        let err = Report::new("  ", "", date(), vec![], None).unwrap_err();
        match err {
            Error::Validation { field, .. } => assert_eq!(field, "title"),
            other => panic!("expected Validation, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_heading_rejected() {
        let err = Report::new(
            "Report",
            "",
            date(),
            vec![Section::paragraphs("", vec!["text".into()])],
            None,
        )
        .unwrap_err();
        match err {
            Error::Validation { field, .. } => assert_eq!(field, "sections[0].heading"),
            other => panic!("expected Validation, got {other:?}"),
        }
    }

    #[test]
    fn test_nonpositive_logo_width_rejected() {
        let logo = Logo::new(vec![1, 2, 3], 0.0);
        let err = Report::new("Report", "", date(), vec![], Some(logo)).unwrap_err();
        match err {
            Error::Validation { field, .. } => assert_eq!(field, "logo.width_cm"),
            other => panic!("expected Validation, got {other:?}"),
        }
    }

    #[test]
    fn test_control_characters_rejected() {
        let err = Report::new("Ti\x07tle", "", date(), vec![], None).unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));

        // Newlines are the one permitted control character.
        let report = Report::new(
            "Report",
            "",
            date(),
            vec![Section::paragraphs("Notes", vec!["line one\nline two".into()])],
            None,
        );
        assert!(report.is_ok());
    }

    #[test]
    fn test_field_value_control_character_rejected() {
        let err = Report::new(
            "Report",
            "",
            date(),
            vec![Section::fields("Overview", vec![Field::new("Status", "a\tb")])],
            None,
        )
        .unwrap_err();
        match err {
            Error::Validation { field, .. } => {
                assert_eq!(field, "sections[0].fields[0].value");
            },
            other => panic!("expected Validation, got {other:?}"),
        }
    }

    #[test]
    fn test_section_order_preserved() {
        let report = Report::new(
            "Report",
            "",
            date(),
            vec![
                Section::paragraphs("First", vec![]),
                Section::paragraphs("Second", vec![]),
                Section::paragraphs("Third", vec![]),
            ],
            None,
        )
        .unwrap();
        let headings: Vec<_> = report.sections().iter().map(|s| s.heading.as_str()).collect();
        assert_eq!(headings, ["First", "Second", "Third"]);
    }
}
