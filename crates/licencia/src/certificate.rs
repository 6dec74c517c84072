//! Certificate rendering: one A4 licence page per student

use crate::config::IssuerConfig;
use crate::record::TripMetadata;
use crate::students::Student;
use crate::Result;
use pdf_core::{
    unsupported_win_ansi, wrap_runs, Align, Color, ImageScaleMode, PdfDocument, StandardFont,
    TextRun, A4_HEIGHT, A4_WIDTH,
};
use spanish_text::sanitize_file_component;

const MARGIN_LEFT: f64 = 50.0;
const MARGIN_RIGHT: f64 = 50.0;
const MARGIN_TOP: f64 = 40.0;

const LOGO_WIDTH: f64 = 120.0;
const LOGO_HEIGHT: f64 = 60.0;

const TITLE: &str = "LICENCIA DE NAVEGACIÓN";
const TITLE_SIZE: f32 = 18.0;
/// Navy, #1F3A5F
const TITLE_COLOR: (u8, u8, u8) = (0x1F, 0x3A, 0x5F);
const BODY_SIZE: f32 = 12.0;
const LINE_HEIGHT: f64 = 16.0;
const PARAGRAPH_GAP: f64 = 12.0;
const SECTION_GAP: f64 = 24.0;

/// Room left above each signature line
const SIGNATURE_SPACE: f64 = 48.0;

/// A rendered certificate
#[derive(Debug, Clone)]
pub struct RenderedCertificate {
    pub bytes: Vec<u8>,
    /// Form keys that were empty and printed as blanks
    pub missing_fields: Vec<String>,
    /// Characters the base-14 fonts cannot show, printed as `?`
    pub unprintable: Vec<char>,
}

/// Renders licence certificates for one issuer
pub struct CertificateRenderer<'a> {
    issuer: &'a IssuerConfig,
    logo: Option<&'a [u8]>,
}

impl<'a> CertificateRenderer<'a> {
    pub fn new(issuer: &'a IssuerConfig) -> Self {
        Self { issuer, logo: None }
    }

    /// Print this image (JPEG or PNG) at the top left of every certificate
    pub fn with_logo(mut self, logo: &'a [u8]) -> Self {
        self.logo = Some(logo);
        self
    }

    /// Render the certificate of one student
    ///
    /// Fails only when the document cannot be built or the trip date is
    /// present but invalid; empty trip values are printed as blanks.
    pub fn render(&self, student: &Student, trip: &TripMetadata) -> Result<RenderedCertificate> {
        let date = trip.formatted_date()?;
        let missing_fields: Vec<String> =
            trip.missing_fields().into_iter().map(str::to_string).collect();
        if !missing_fields.is_empty() {
            tracing::warn!(
                student = %student.identifier,
                missing = ?missing_fields,
                "Certificate rendered with blank fields"
            );
        }

        let mut doc = PdfDocument::new();
        let page = doc.add_page(A4_WIDTH, A4_HEIGHT)?;
        let mut y = MARGIN_TOP;

        if let Some(logo) = self.logo {
            match doc.insert_image(
                logo,
                page,
                MARGIN_LEFT,
                y,
                LOGO_WIDTH,
                LOGO_HEIGHT,
                ImageScaleMode::FitBox,
            ) {
                Ok(()) => y += LOGO_HEIGHT + SECTION_GAP,
                Err(e) => tracing::warn!(error = %e, "Logo could not be embedded"),
            }
        }

        let (r, g, b) = TITLE_COLOR;
        doc.set_font(StandardFont::HelveticaBold, TITLE_SIZE);
        doc.set_text_color(Color::from_rgb(r, g, b));
        y += TITLE_SIZE as f64;
        doc.insert_text(TITLE, page, A4_WIDTH / 2.0, y, Align::Center)?;
        doc.set_text_color(Color::black());
        y += SECTION_GAP;

        let paragraphs = self.body(student, trip, &date);
        doc.set_font(StandardFont::Helvetica, BODY_SIZE);
        for paragraph in &paragraphs {
            y = write_paragraph(&mut doc, page, paragraph, y)?;
            y += PARAGRAPH_GAP;
        }

        y += SECTION_GAP;
        let student_name = student.name().display_name();
        let signatures = [
            (
                "El instructor",
                value(&trip.instructor_name),
                value(&trip.instructor_id),
            ),
            ("El director", "", ""),
            (
                "El interesado",
                student_name.as_str(),
                student.identifier.as_str(),
            ),
        ];
        write_signatures(&mut doc, page, &signatures, y)?;

        let printed: String = paragraphs
            .iter()
            .flatten()
            .map(|run| run.text.as_str())
            .chain(signatures.iter().flat_map(|(role, name, id)| [*role, *name, *id]))
            .collect();
        let unprintable = unsupported_win_ansi(&printed);
        if !unprintable.is_empty() {
            tracing::warn!(
                student = %student.identifier,
                chars = ?unprintable,
                "Characters outside WinAnsi printed as '?'"
            );
        }

        Ok(RenderedCertificate {
            bytes: doc.to_bytes()?,
            missing_fields,
            unprintable,
        })
    }

    fn body(&self, student: &Student, trip: &TripMetadata, date: &str) -> Vec<Vec<TextRun>> {
        let issuer = self.issuer;
        let location = value(&trip.location);
        let closing = if location.is_empty() {
            "A".to_string()
        } else {
            format!("En {location}, a")
        };

        vec![
            vec![
                TextRun::regular(format!(
                    "D. {}, con DNI: {}, en calidad de Director de:",
                    issuer.director_name, issuer.director_id
                )),
                TextRun::bold(issuer.school_name.as_str()),
                TextRun::regular("declaro bajo mi responsabilidad que"),
                TextRun::bold(student.name().display_name()),
                TextRun::regular("con DNI/PASAPORTE:"),
                TextRun::bold(student.identifier.as_str()),
                TextRun::regular("ha recibido la formación teórico-práctica exigida por el"),
                TextRun::bold(issuer.regulation.as_str()),
                TextRun::regular(
                    "por el que se regulan las titulaciones para el gobierno de las \
                     embarcaciones de recreo.",
                ),
            ],
            vec![
                TextRun::regular(
                    "Las prácticas para la obtención de esta licencia se realizaron en la embarcación",
                ),
                TextRun::bold(value(&trip.vessel_name)),
                TextRun::regular("con matrícula"),
                TextRun::bold(value(&trip.vessel_registration)),
                TextRun::regular("el"),
                TextRun::bold(date),
                TextRun::regular("en el"),
                TextRun::bold(format!("{}.", issuer.venue)),
            ],
            vec![TextRun::regular(
                "Para que conste y a petición del interesado, expido el presente certificado, \
                 copia fiel de lo que figura en el registro que a tal efecto se dispone.",
            )],
            vec![TextRun::regular(closing), TextRun::bold(date)],
        ]
    }
}

fn value(field: &Option<String>) -> &str {
    field.as_deref().unwrap_or_default()
}

/// Write a wrapped paragraph starting at `y`, returning the y below it
fn write_paragraph(doc: &mut PdfDocument, page: usize, runs: &[TextRun], mut y: f64) -> Result<f64> {
    let width = A4_WIDTH - MARGIN_LEFT - MARGIN_RIGHT;
    for line in wrap_runs(runs, width, doc.font_size()) {
        y += LINE_HEIGHT;
        doc.insert_runs(&line, page, MARGIN_LEFT, y, Align::Left)?;
    }
    Ok(y)
}

/// Three signature columns: line, role, printed name, identifier
fn write_signatures(
    doc: &mut PdfDocument,
    page: usize,
    signatures: &[(&str, &str, &str)],
    top: f64,
) -> Result<()> {
    let column_width = (A4_WIDTH - MARGIN_LEFT - MARGIN_RIGHT) / signatures.len() as f64;
    let line_y = top + SIGNATURE_SPACE;

    for (i, (role, name, id)) in signatures.iter().enumerate() {
        let left = MARGIN_LEFT + column_width * i as f64;
        let center = left + column_width / 2.0;

        doc.draw_line(page, left + 10.0, line_y, left + column_width - 10.0, line_y, 0.8, Color::black())?;

        doc.set_font(StandardFont::HelveticaBold, 11.0);
        doc.insert_text(role, page, center, line_y + 14.0, Align::Center)?;
        doc.set_font(StandardFont::Helvetica, 10.0);
        doc.insert_text(name, page, center, line_y + 28.0, Align::Center)?;
        doc.insert_text(id, page, center, line_y + 41.0, Align::Center)?;
    }

    Ok(())
}

/// `Certificado_<name>_<id>.pdf` with unsafe characters replaced
pub fn certificate_file_name(student: &Student) -> String {
    format!(
        "Certificado_{}_{}.pdf",
        sanitize_file_component(&student.full_name),
        sanitize_file_component(&student.identifier)
    )
}
