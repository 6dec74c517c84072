//! Typed view of the Field Store

use crate::fields::FieldStore;
use crate::students::{extract_students, Student};
use crate::Result;
use chrono::NaiveDate;
use serde::Serialize;
use spanish_text::{format_date, parse_date_parts, parse_numeric_date};

/// Instructor name
pub const A_INSTR: &str = "A_INSTR";
/// Instructor identifier
pub const A_DNI: &str = "A_DNI";
/// Vessel name
pub const B_NOMEMB: &str = "B_NOMEMB";
/// Vessel registration
pub const B_MATRICULA: &str = "B_MATRICULA";
pub const B_AMARRE: &str = "B_AMARRE";
pub const B_FONDEO: &str = "B_FONDEO";
pub const B_POTENCIA: &str = "B_POTENCIA";
pub const B_ESLORA: &str = "B_ESLORA";
pub const B_INSTALACION: &str = "B_INSTALACION";
/// Trip date, `dd/mm/yyyy`
pub const C_1: &str = "C_1";
/// Location where the certificate is signed
pub const D_LLOC: &str = "D_LLOC";
pub const D_DIA: &str = "D_DIA";
pub const D_MES: &str = "D_MES";
pub const D_ANY: &str = "D_ANY";

/// Every named (non-student) key the pipeline understands
pub const RECOGNISED_KEYS: [&str; 14] = [
    A_INSTR,
    A_DNI,
    B_NOMEMB,
    B_MATRICULA,
    B_AMARRE,
    B_FONDEO,
    B_POTENCIA,
    B_ESLORA,
    B_INSTALACION,
    C_1,
    D_LLOC,
    D_DIA,
    D_MES,
    D_ANY,
];

/// Trip date as found on the form
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TripDate {
    /// `C_1` text
    Numeric { text: String },
    /// `D_DIA` / `D_MES` / `D_ANY`
    Parts {
        day: String,
        month: String,
        year: String,
    },
}

/// Values shared by every document of one run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TripMetadata {
    pub instructor_name: Option<String>,
    pub instructor_id: Option<String>,
    pub vessel_name: Option<String>,
    pub vessel_registration: Option<String>,
    pub berth: Option<String>,
    pub mooring: Option<String>,
    pub power: Option<String>,
    pub length: Option<String>,
    pub facility: Option<String>,
    pub date: Option<TripDate>,
    pub location: Option<String>,
}

impl TripMetadata {
    /// Parse the trip date
    ///
    /// `Ok(None)` when the form carries no date at all; an error when the date
    /// is present but impossible (month 13, 31 de abril...).
    pub fn parsed_date(&self) -> Result<Option<NaiveDate>> {
        let date = match &self.date {
            None => return Ok(None),
            Some(TripDate::Numeric { text }) => parse_numeric_date(text)?,
            Some(TripDate::Parts { day, month, year }) => parse_date_parts(day, month, year)?,
        };
        Ok(Some(date))
    }

    /// Long Spanish date, empty when no date was given
    pub fn formatted_date(&self) -> Result<String> {
        Ok(self.parsed_date()?.map(format_date).unwrap_or_default())
    }

    /// Date as written on the form, used as-is in the roster
    pub fn raw_date(&self) -> String {
        match &self.date {
            None => String::new(),
            Some(TripDate::Numeric { text }) => text.clone(),
            Some(TripDate::Parts { day, month, year }) => format!("{day}/{month}/{year}"),
        }
    }

    /// Keys of the values a certificate prints but the form left empty
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let checks = [
            (A_INSTR, self.instructor_name.is_none()),
            (A_DNI, self.instructor_id.is_none()),
            (B_NOMEMB, self.vessel_name.is_none()),
            (B_MATRICULA, self.vessel_registration.is_none()),
            (C_1, self.date.is_none()),
            (D_LLOC, self.location.is_none()),
        ];
        checks
            .into_iter()
            .filter(|(_, missing)| *missing)
            .map(|(key, _)| key)
            .collect()
    }
}

/// The form contents in typed form
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FormRecord {
    pub trip: TripMetadata,
    pub students: Vec<Student>,
    /// Keys with a known prefix that nothing reads
    pub unrecognised: Vec<String>,
}

impl FormRecord {
    /// Build the record from the Field Store
    pub fn parse(fields: &FieldStore) -> Self {
        let owned = |key: &str| fields.get(key).map(str::to_string);

        let date = match (fields.get(C_1), fields.get(D_DIA), fields.get(D_MES), fields.get(D_ANY)) {
            (Some(text), _, _, _) => Some(TripDate::Numeric {
                text: text.to_string(),
            }),
            (None, Some(day), Some(month), Some(year)) => Some(TripDate::Parts {
                day: day.to_string(),
                month: month.to_string(),
                year: year.to_string(),
            }),
            _ => None,
        };

        let trip = TripMetadata {
            instructor_name: owned(A_INSTR),
            instructor_id: owned(A_DNI),
            vessel_name: owned(B_NOMEMB),
            vessel_registration: owned(B_MATRICULA),
            berth: owned(B_AMARRE),
            mooring: owned(B_FONDEO),
            power: owned(B_POTENCIA),
            length: owned(B_ESLORA),
            facility: owned(B_INSTALACION),
            date,
            location: owned(D_LLOC),
        };

        let unrecognised: Vec<String> = fields
            .iter()
            .map(|(key, _)| key)
            .filter(|key| !RECOGNISED_KEYS.contains(key) && !is_student_key(key))
            .map(str::to_string)
            .collect();
        for key in &unrecognised {
            tracing::debug!(key = %key, "Ignoring unrecognised form field");
        }

        Self {
            trip,
            students: extract_students(fields),
            unrecognised,
        }
    }
}

/// `D_` followed by a number
fn is_student_key(key: &str) -> bool {
    key.strip_prefix("D_")
        .map(|n| !n.is_empty() && n.chars().all(|c| c.is_ascii_digit()))
        .unwrap_or(false)
}
