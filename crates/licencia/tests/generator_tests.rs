//! End-to-end runs of the generator against forms built in memory

use chrono::NaiveDate;
use licencia::{
    ArtifactOutcome, Catalog, CatalogLoader, FieldStore, FormMutator, GenerationRequest,
    Generator, GeneratorConfig, Instructor, JsonCatalogFile, LicenciaError, Selection,
    StaticCatalog, Vessel,
};
use lopdf::{dictionary, Object, StringFormat};
use pdf_core::{encode_text_string, PdfDocument};
use pretty_assertions::assert_eq;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

const SCENARIO: [(&str, &str); 8] = [
    ("A_INSTR", "Juan Pérez"),
    ("A_DNI", "11111111-A"),
    ("B_NOMEMB", "Velero Águila"),
    ("B_MATRICULA", "AB-1234"),
    ("C_1", "05/03/2024"),
    ("D_LLOC", "Alicante"),
    ("D_1", "22222222-B"),
    ("D_2", "García, Ana"),
];

/// A one-page practice form with a text field `<key>[0]` per entry
fn create_form(fields: &[(&str, &str)]) -> Vec<u8> {
    let mut doc = lopdf::Document::with_version("1.5");

    let pages_id = doc.new_object_id();
    let contents_id = doc.add_object(lopdf::Stream::new(dictionary! {}, vec![]));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "MediaBox" => vec![0.into(), 0.into(), 595.28.into(), 841.89.into()],
        "Resources" => dictionary! {},
        "Contents" => contents_id,
    });
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Count" => 1,
            "Kids" => vec![page_id.into()],
        }),
    );

    let field_ids: Vec<Object> = fields
        .iter()
        .map(|(key, value)| {
            let value = encode_text_string(value);
            let format = if value.starts_with(&[0xFE, 0xFF]) {
                StringFormat::Hexadecimal
            } else {
                StringFormat::Literal
            };
            doc.add_object(dictionary! {
                "FT" => "Tx",
                "T" => Object::string_literal(format!("{key}[0]")),
                "V" => Object::String(value, format),
                "Subtype" => "Widget",
                "P" => page_id,
                "Rect" => vec![0.into(), 0.into(), 100.into(), 20.into()],
            })
            .into()
        })
        .collect();
    let form_id = doc.add_object(dictionary! { "Fields" => field_ids });

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
        "AcroForm" => form_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).unwrap();
    buffer
}

fn write_form(dir: &Path, fields: &[(&str, &str)]) -> PathBuf {
    let path = dir.join("practicas.pdf");
    std::fs::write(&path, create_form(fields)).unwrap();
    path
}

fn config(root: &Path) -> GeneratorConfig {
    GeneratorConfig {
        output_root: root.join("output"),
        ..Default::default()
    }
}

fn catalog() -> StaticCatalog {
    StaticCatalog(Catalog {
        instructors: vec![Instructor {
            id: "33333333-C".to_string(),
            name: "Marta Gil".to_string(),
        }],
        vessels: vec![Vessel {
            name: "Goleta Brisa".to_string(),
            registration: "CD-5678".to_string(),
            ..Default::default()
        }],
    })
}

fn timestamp() -> chrono::NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 3, 5)
        .unwrap()
        .and_hms_opt(10, 15, 0)
        .unwrap()
}

fn page_text(path: &Path) -> String {
    let doc = PdfDocument::open(path).unwrap();
    doc.extract_text_runs(1)
        .unwrap()
        .join(" ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

#[test]
fn test_scenario_run() {
    let dir = tempfile::tempdir().unwrap();
    let source = write_form(dir.path(), &SCENARIO);
    let generator = Generator::new(config(dir.path()), catalog());

    let report = generator
        .run_at(
            &GenerationRequest {
                source: source.clone(),
                selection: Selection::default(),
            },
            timestamp(),
        )
        .unwrap();

    assert_eq!(report.output_dir, dir.path().join("output").join("20240305_101500"));
    assert_eq!(report.students, 1);
    assert_eq!(report.certificates_produced(), 1);
    assert!(report.is_complete());
    assert!(report.warnings.is_empty());

    let certificate = report.certificates[0].path();
    assert_eq!(
        certificate,
        report.output_dir.join("PDFs").join("Certificado_García_Ana_22222222-B.pdf")
    );
    let text = page_text(certificate);
    assert!(text.contains("Ana García"));
    assert!(text.contains("Juan Pérez"));
    assert!(text.contains("11111111-A"));
    assert!(text.contains("5 de marzo de 2024"));

    assert_eq!(
        report.form.path(),
        report.output_dir.join("practicas_modificado_20240305_101500.pdf")
    );
    assert_eq!(
        report.roster.path(),
        report.output_dir.join("Reporte_estudiantes_20240305_101500.pdf")
    );
    assert!(page_text(report.roster.path()).contains("García Ana"));

    // the source is left as it was
    assert_eq!(std::fs::read(&source).unwrap(), create_form(&SCENARIO));
}

#[test]
fn test_gap_truncates_students() {
    let dir = tempfile::tempdir().unwrap();
    let source = write_form(
        dir.path(),
        &[
            ("D_1", "1"),
            ("D_2", "Ana García"),
            ("D_3", "2"),
            ("D_4", "Luis Ortega"),
            ("D_5", "3"),
            ("D_6", "Eva Ruiz"),
            ("D_9", "5"),
            ("D_10", "Pablo Soler"),
        ],
    );
    let generator = Generator::new(config(dir.path()), catalog());

    let report = generator
        .run_at(
            &GenerationRequest {
                source,
                selection: Selection::default(),
            },
            timestamp(),
        )
        .unwrap();

    assert_eq!(report.students, 3);
    assert_eq!(report.certificates.len(), 3);
}

#[test]
fn test_zero_students() {
    let dir = tempfile::tempdir().unwrap();
    let source = write_form(dir.path(), &SCENARIO[..6]);
    let generator = Generator::new(config(dir.path()), catalog());

    let report = generator
        .run_at(
            &GenerationRequest {
                source,
                selection: Selection::default(),
            },
            timestamp(),
        )
        .unwrap();

    assert!(report.certificates.is_empty());
    assert!(report.form.is_written());
    assert!(report.roster.is_written());
    assert_eq!(report.warnings, vec!["No students found on the form".to_string()]);
    assert!(!report.output_dir.join("PDFs").exists());

    let roster = PdfDocument::open(report.roster.path()).unwrap();
    assert_eq!(roster.extract_text_runs(1).unwrap().len(), 5);
}

#[test]
fn test_invalid_month_fails_certificates_only() {
    let dir = tempfile::tempdir().unwrap();
    let mut fields = SCENARIO.to_vec();
    fields[4] = ("C_1", "05/13/2024");
    let source = write_form(dir.path(), &fields);
    let generator = Generator::new(config(dir.path()), catalog());

    let report = generator
        .run_at(
            &GenerationRequest {
                source,
                selection: Selection::default(),
            },
            timestamp(),
        )
        .unwrap();

    assert_eq!(report.certificates_produced(), 0);
    match &report.certificates[0] {
        ArtifactOutcome::Failed { reason, .. } => assert!(reason.starts_with("Invalid date")),
        other => panic!("expected a failed certificate, got {other:?}"),
    }
    assert!(report.form.is_written());
    assert!(report.roster.is_written());
    assert!(page_text(report.roster.path()).contains("05/13/2024"));
}

#[test]
fn test_selection_overrides_every_artifact() {
    let dir = tempfile::tempdir().unwrap();
    let source = write_form(dir.path(), &SCENARIO);
    let generator = Generator::new(config(dir.path()), catalog());

    let report = generator
        .run_at(
            &GenerationRequest {
                source,
                selection: Selection::new(Some("Marta Gil"), Some("CD-5678")),
            },
            timestamp(),
        )
        .unwrap();
    assert!(report.warnings.is_empty());

    let certificate = page_text(report.certificates[0].path());
    assert!(certificate.contains("Marta Gil"));
    assert!(certificate.contains("33333333-C"));
    assert!(certificate.contains("Goleta Brisa"));
    assert!(!certificate.contains("Juan Pérez"));

    let form = FieldStore::read(report.form.path()).unwrap();
    assert_eq!(form.get("A_INSTR"), Some("Marta Gil"));
    assert_eq!(form.get("A_DNI"), Some("33333333-C"));
    assert_eq!(form.get("B_MATRICULA"), Some("CD-5678"));
    assert_eq!(form.get("D_2"), Some("García, Ana"));
}

#[test]
fn test_unknown_selection_is_a_warning() {
    let dir = tempfile::tempdir().unwrap();
    let source = write_form(dir.path(), &SCENARIO);
    let generator = Generator::new(config(dir.path()), catalog());

    let report = generator
        .run_at(
            &GenerationRequest {
                source,
                selection: Selection::new(Some("Nadie"), None),
            },
            timestamp(),
        )
        .unwrap();

    assert_eq!(report.warnings, vec!["Unknown instructor: Nadie".to_string()]);
    assert!(page_text(report.certificates[0].path()).contains("Juan Pérez"));
}

#[test]
fn test_missing_catalog_is_a_warning() {
    let dir = tempfile::tempdir().unwrap();
    let source = write_form(dir.path(), &SCENARIO);
    let generator = Generator::new(
        config(dir.path()),
        JsonCatalogFile::new(dir.path().join("no_existe.json")),
    );

    let report = generator
        .run_at(
            &GenerationRequest {
                source,
                selection: Selection::new(Some("Marta Gil"), None),
            },
            timestamp(),
        )
        .unwrap();

    assert_eq!(report.warnings.len(), 1);
    assert_eq!(report.certificates_produced(), 1);
}

#[test]
fn test_two_runs_get_distinct_directories() {
    let dir = tempfile::tempdir().unwrap();
    let source = write_form(dir.path(), &SCENARIO);
    let generator = Generator::new(config(dir.path()), catalog());
    let request = GenerationRequest {
        source,
        selection: Selection::default(),
    };

    let first = generator.run_at(&request, timestamp()).unwrap();
    let second = generator.run_at(&request, timestamp()).unwrap();

    assert_ne!(first.output_dir, second.output_dir);
    assert!(first.certificates[0].path().exists());
    assert!(second.certificates[0].path().exists());
    assert!(!second.certificates[0].path().starts_with(&first.output_dir));
}

#[test]
fn test_duplicate_students_do_not_overwrite() {
    let dir = tempfile::tempdir().unwrap();
    let source = write_form(
        dir.path(),
        &[
            ("D_1", "22222222-B"),
            ("D_2", "García, Ana"),
            ("D_3", "22222222-B"),
            ("D_4", "García, Ana"),
        ],
    );
    let generator = Generator::new(config(dir.path()), catalog());

    let report = generator
        .run_at(
            &GenerationRequest {
                source,
                selection: Selection::default(),
            },
            timestamp(),
        )
        .unwrap();

    let names: Vec<String> = report
        .certificates
        .iter()
        .map(|c| c.path().file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(
        names,
        vec![
            "Certificado_García_Ana_22222222-B.pdf",
            "Certificado_García_Ana_22222222-B_2.pdf",
        ]
    );
}

#[test]
fn test_unreadable_source_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("roto.pdf");
    std::fs::write(&source, b"not a pdf").unwrap();
    let generator = Generator::new(config(dir.path()), catalog());

    let result = generator.run_at(
        &GenerationRequest {
            source,
            selection: Selection::default(),
        },
        timestamp(),
    );

    assert!(matches!(result, Err(LicenciaError::SourceUnreadable { .. })));
    assert!(!dir.path().join("output").exists());
}

#[test]
fn test_form_without_fields_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let source = write_form(dir.path(), &[]);
    let generator = Generator::new(config(dir.path()), catalog());

    let result = generator.run_at(
        &GenerationRequest {
            source,
            selection: Selection::default(),
        },
        timestamp(),
    );

    assert!(matches!(result, Err(LicenciaError::NoFormFields)));
    assert!(!dir.path().join("output").exists());
}

#[test]
fn test_blank_form_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let source = write_form(
        dir.path(),
        &[("A_INSTR", ""), ("D_1", "  "), ("D_2", ""), ("Observaciones", "ninguna")],
    );
    let generator = Generator::new(config(dir.path()), catalog());

    let result = generator.run_at(
        &GenerationRequest {
            source,
            selection: Selection::default(),
        },
        timestamp(),
    );

    assert!(matches!(result, Err(LicenciaError::NoFormFields)));
    assert!(!dir.path().join("output").exists());
}

#[test]
fn test_mutating_with_no_overrides_keeps_values() {
    let source = create_form(&SCENARIO);
    let mutated = FormMutator::mutate(&source, &BTreeMap::new()).unwrap();
    assert!(mutated.changed.is_empty());

    let before = FieldStore::from_document(&PdfDocument::open_from_bytes(&source).unwrap()).unwrap();
    let after =
        FieldStore::from_document(&PdfDocument::open_from_bytes(&mutated.bytes).unwrap()).unwrap();
    assert_eq!(before, after);
}

#[test]
fn test_mutator_skips_unknown_keys() {
    let source = create_form(&SCENARIO[..2]);
    let overrides = BTreeMap::from([
        ("A_INSTR".to_string(), "Marta Gil".to_string()),
        ("B_NOMEMB".to_string(), "Goleta Brisa".to_string()),
        ("X_OTRO".to_string(), "valor".to_string()),
    ]);

    let mutated = FormMutator::mutate(&source, &overrides).unwrap();
    assert_eq!(mutated.changed, vec!["A_INSTR".to_string()]);

    let after =
        FieldStore::from_document(&PdfDocument::open_from_bytes(&mutated.bytes).unwrap()).unwrap();
    assert_eq!(after.get("A_INSTR"), Some("Marta Gil"));
    assert_eq!(after.get("B_NOMEMB"), None);
}

#[test]
fn test_json_catalog_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("catalogo.json");
    std::fs::write(
        &path,
        r#"{
            "instructors": [{ "dni": "33333333-C", "name": "Marta Gil" }],
            "vessels": [{ "name": "Goleta Brisa", "registration": "CD-5678" }]
        }"#,
    )
    .unwrap();

    let catalog = JsonCatalogFile::new(&path).load().unwrap();
    assert_eq!(catalog.find_instructor("33333333-c").unwrap().name, "Marta Gil");
    assert_eq!(catalog.find_vessel("goleta brisa").unwrap().registration, "CD-5678");
}
