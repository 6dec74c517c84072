//! Roster Reporter: one gridded table listing every student

use crate::record::TripMetadata;
use crate::students::Student;
use crate::Result;
use pdf_core::{Align, Color, FieldRect, PdfDocument, StandardFont, MM};

/// Column labels
pub const HEADERS: [&str; 5] = ["FECHA", "DNI", "APELLIDOS Y NOMBRE", "N° LICENCIA", "INSTRUCTOR"];

/// Column widths in millimetres
const COLUMN_WIDTHS_MM: [f64; 5] = [20.0, 30.0, 75.0, 30.0, 75.0];

/// Index of the hand-filled licence number column
const LICENCE_COLUMN: usize = 3;

const ROW_HEIGHT_MM: f64 = 8.0;
const MARGIN_MM: f64 = 15.0;
const FONT_SIZE: f32 = 10.0;

/// Header fill, #92D050
const HEADER_FILL: (u8, u8, u8) = (0x92, 0xD0, 0x50);

/// Renders the roster table
pub struct RosterReporter;

impl RosterReporter {
    /// Cell values of one student row
    pub fn row(student: &Student, trip: &TripMetadata) -> [String; 5] {
        [
            trip.raw_date(),
            student.identifier.clone(),
            student.name().roster_name(),
            String::new(),
            trip.instructor_name.clone().unwrap_or_default(),
        ]
    }

    /// Render the table on a single page sized to fit every row
    ///
    /// Each licence cell carries an empty text field `licencia_<row>` so the
    /// number can be typed in later.
    pub fn render(students: &[Student], trip: &TripMetadata) -> Result<Vec<u8>> {
        let widths: Vec<f64> = COLUMN_WIDTHS_MM.iter().map(|w| w * MM).collect();
        let row_height = ROW_HEIGHT_MM * MM;
        let margin = MARGIN_MM * MM;
        let row_count = students.len() + 1;

        let page_width = widths.iter().sum::<f64>() + margin * 2.0;
        let page_height = margin * 2.0 + row_height * row_count as f64;

        let mut doc = PdfDocument::new();
        let page = doc.add_page(page_width, page_height)?;

        let header = HEADERS.map(str::to_string);
        let (r, g, b) = HEADER_FILL;
        draw_row(
            &mut doc,
            page,
            &header,
            &widths,
            margin,
            Color::from_rgb(r, g, b),
            StandardFont::HelveticaBold,
        )?;

        for (i, student) in students.iter().enumerate() {
            let top = margin + row_height * (i + 1) as f64;
            draw_row(
                &mut doc,
                page,
                &Self::row(student, trip),
                &widths,
                top,
                Color::white(),
                StandardFont::Helvetica,
            )?;

            let left = margin + widths[..LICENCE_COLUMN].iter().sum::<f64>();
            doc.add_text_field(
                page,
                &format!("licencia_{}", i + 1),
                FieldRect::new(left + 2.0, top + 2.0, widths[LICENCE_COLUMN] - 4.0, row_height - 4.0),
                FONT_SIZE,
            )?;
        }

        tracing::debug!(rows = students.len(), "Roster rendered");
        Ok(doc.to_bytes()?)
    }
}

fn draw_row(
    doc: &mut PdfDocument,
    page: usize,
    cells: &[String],
    widths: &[f64],
    top: f64,
    fill: Color,
    font: StandardFont,
) -> Result<()> {
    let height = ROW_HEIGHT_MM * MM;
    let mut x = MARGIN_MM * MM;
    doc.set_font(font, FONT_SIZE);

    for (cell, width) in cells.iter().zip(widths) {
        doc.draw_rect(page, x, top, *width, height, Some(fill), Some(0.5))?;
        // baseline slightly below the middle so capitals sit centred
        doc.insert_text(cell, page, x + width / 2.0, top + height / 2.0 + 3.0, Align::Center)?;
        x += width;
    }

    Ok(())
}

/// `Reporte_estudiantes_<timestamp>.pdf`
pub fn roster_file_name(timestamp: &str) -> String {
    format!("Reporte_estudiantes_{timestamp}.pdf")
}
