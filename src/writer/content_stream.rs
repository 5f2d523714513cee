//! PDF content stream builder.
//!
//! Builds the operator sequence for a page: text positioning/showing,
//! basic path drawing and image XObject painting. Text is shown with the
//! Type1 base fonts in WinAnsi encoding, so strings are folded to single
//! bytes before escaping; characters outside Latin-1 degrade to `?`.

use std::io::Write;

/// Operations that can be added to a content stream.
#[derive(Debug, Clone)]
pub enum ContentStreamOp {
    /// Save graphics state (q)
    SaveState,
    /// Restore graphics state (Q)
    RestoreState,
    /// Set transformation matrix (cm)
    Transform(f64, f64, f64, f64, f64, f64),
    /// Begin text object (BT)
    BeginText,
    /// End text object (ET)
    EndText,
    /// Set font and size (Tf)
    SetFont(String, f64),
    /// Set text matrix (Tm)
    SetTextMatrix(f64, f64, f64, f64, f64, f64),
    /// Show text (Tj)
    ShowText(String),
    /// Set stroke color RGB (RG)
    SetStrokeColorRGB(f64, f64, f64),
    /// Set line width (w)
    SetLineWidth(f64),
    /// Move to (m)
    MoveTo(f64, f64),
    /// Line to (l)
    LineTo(f64, f64),
    /// Stroke (S)
    Stroke,
    /// Paint XObject (Do)
    PaintXObject(String),
}

/// Builder for PDF content streams.
#[derive(Debug, Default)]
pub struct ContentStreamBuilder {
    operations: Vec<ContentStreamOp>,
    current_font: Option<(String, f64)>,
    in_text_object: bool,
}

impl ContentStreamBuilder {
    /// Create a new content stream builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an operation to the stream.
    pub fn op(&mut self, op: ContentStreamOp) -> &mut Self {
        self.operations.push(op);
        self
    }

    /// Begin a text object if one is not already open.
    pub fn begin_text(&mut self) -> &mut Self {
        if !self.in_text_object {
            self.op(ContentStreamOp::BeginText);
            self.in_text_object = true;
        }
        self
    }

    /// End the current text object, if open.
    pub fn end_text(&mut self) -> &mut Self {
        if self.in_text_object {
            self.op(ContentStreamOp::EndText);
            self.in_text_object = false;
        }
        self
    }

    /// Set font for subsequent text, skipping redundant Tf operators.
    pub fn set_font(&mut self, font_name: &str, size: f64) -> &mut Self {
        let desired = (font_name.to_string(), size);
        if self.current_font.as_ref() != Some(&desired) {
            self.op(ContentStreamOp::SetFont(desired.0.clone(), size));
            self.current_font = Some(desired);
        }
        self
    }

    /// Show text at a position.
    pub fn text(&mut self, text: &str, x: f64, y: f64) -> &mut Self {
        self.begin_text();
        self.op(ContentStreamOp::SetTextMatrix(1.0, 0.0, 0.0, 1.0, x, y));
        self.op(ContentStreamOp::ShowText(text.to_string()));
        self
    }

    /// Draw a horizontal rule.
    pub fn horizontal_rule(&mut self, x0: f64, x1: f64, y: f64, width: f64) -> &mut Self {
        self.end_text();
        self.op(ContentStreamOp::SetStrokeColorRGB(0.5, 0.5, 0.5));
        self.op(ContentStreamOp::SetLineWidth(width));
        self.op(ContentStreamOp::MoveTo(x0, y));
        self.op(ContentStreamOp::LineTo(x1, y));
        self.op(ContentStreamOp::Stroke);
        self
    }

    /// Paint an image XObject at the given position and display size.
    ///
    /// `x`/`y` address the lower-left corner of the placed image.
    pub fn draw_image(&mut self, resource_id: &str, x: f64, y: f64, width: f64, height: f64) -> &mut Self {
        self.end_text();
        self.op(ContentStreamOp::SaveState);
        self.op(ContentStreamOp::Transform(width, 0.0, 0.0, height, x, y));
        self.op(ContentStreamOp::PaintXObject(resource_id.to_string()));
        self.op(ContentStreamOp::RestoreState);
        self
    }

    /// True when no operation has been added.
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Build the content stream bytes.
    pub fn build(mut self) -> Vec<u8> {
        self.end_text();
        let mut buf = Vec::new();
        for op in &self.operations {
            write_op(&mut buf, op).expect("writing to Vec cannot fail");
            buf.push(b'\n');
        }
        buf
    }
}

fn write_op<W: Write>(w: &mut W, op: &ContentStreamOp) -> std::io::Result<()> {
    match op {
        ContentStreamOp::SaveState => write!(w, "q"),
        ContentStreamOp::RestoreState => write!(w, "Q"),
        ContentStreamOp::Transform(a, b, c, d, e, f) => {
            write!(w, "{} {} {} {} {} {} cm", n(*a), n(*b), n(*c), n(*d), n(*e), n(*f))
        },
        ContentStreamOp::BeginText => write!(w, "BT"),
        ContentStreamOp::EndText => write!(w, "ET"),
        ContentStreamOp::SetFont(name, size) => write!(w, "/{} {} Tf", name, n(*size)),
        ContentStreamOp::SetTextMatrix(a, b, c, d, e, f) => {
            write!(w, "{} {} {} {} {} {} Tm", n(*a), n(*b), n(*c), n(*d), n(*e), n(*f))
        },
        ContentStreamOp::ShowText(text) => {
            write!(w, "(")?;
            write_escaped_string(w, text)?;
            write!(w, ") Tj")
        },
        ContentStreamOp::SetStrokeColorRGB(r, g, b) => {
            write!(w, "{} {} {} RG", n(*r), n(*g), n(*b))
        },
        ContentStreamOp::SetLineWidth(width) => write!(w, "{} w", n(*width)),
        ContentStreamOp::MoveTo(x, y) => write!(w, "{} {} m", n(*x), n(*y)),
        ContentStreamOp::LineTo(x, y) => write!(w, "{} {} l", n(*x), n(*y)),
        ContentStreamOp::Stroke => write!(w, "S"),
        ContentStreamOp::PaintXObject(name) => write!(w, "/{} Do", name),
    }
}

/// Format an operand with at most two decimal places, trimming zeros.
fn n(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        let formatted = format!("{:.2}", value);
        formatted.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}

/// Fold a string to WinAnsi single bytes and escape PDF string delimiters.
fn write_escaped_string<W: Write>(w: &mut W, text: &str) -> std::io::Result<()> {
    for c in text.chars() {
        let byte = if (c as u32) <= 0xFF { c as u32 as u8 } else { b'?' };
        match byte {
            b'(' => write!(w, "\\(")?,
            b')' => write!(w, "\\)")?,
            b'\\' => write!(w, "\\\\")?,
            b'\n' => write!(w, "\\n")?,
            b'\r' => write!(w, "\\r")?,
            b'\t' => write!(w, "\\t")?,
            _ => w.write_all(&[byte])?,
        }
    }
    Ok(())
}
