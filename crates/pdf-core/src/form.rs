//! AcroForm fields: reading values, filling them and adding new text fields

use crate::font::{decode_text_string, encode_text_string};
use crate::{PdfDocument, PdfError, Result, StandardFont};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, StringFormat};

/// Field trees deeper than this are treated as malformed
const MAX_FIELD_DEPTH: usize = 32;

/// A terminal field of the document's interactive form
#[derive(Debug, Clone, PartialEq)]
pub struct FormField {
    /// Partial name (`/T`) of the field
    pub name: String,
    /// Fully qualified name, partial names joined with `.`
    pub full_name: String,
    /// Field type (`Tx`, `Btn`, `Ch`, `Sig`), inherited from ancestors
    pub field_type: Option<String>,
    /// Current value, decoded from the PDF text string
    pub value: Option<String>,
    /// Object holding the field dictionary
    pub id: ObjectId,
}

impl FormField {
    /// Whether this is a text field
    pub fn is_text(&self) -> bool {
        self.field_type.as_deref() == Some("Tx")
    }
}

/// Placement of a new widget, in points with a top-left origin
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl FieldRect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// Where the AcroForm dictionary lives
enum AcroForm {
    /// Indirect object
    Object(ObjectId),
    /// Inline in the catalog with this ID
    InCatalog(ObjectId),
}

/// Attributes a field inherits from its ancestors
#[derive(Default)]
struct Inherited {
    full_name: String,
    field_type: Option<String>,
    value: Option<String>,
}

impl PdfDocument {
    /// List the terminal fields of the form
    ///
    /// Returns an empty list when the document has no AcroForm. Broken
    /// references inside the field tree are skipped.
    pub fn form_fields(&self) -> Result<Vec<FormField>> {
        let doc = self.inner();
        let Some(location) = self.acroform()? else {
            return Ok(Vec::new());
        };

        let roots = match acroform_dict(doc, &location)?.get(b"Fields") {
            Ok(Object::Array(items)) => reference_ids(items),
            Ok(Object::Reference(id)) => match doc.get_object(*id) {
                Ok(Object::Array(items)) => reference_ids(items),
                _ => Vec::new(),
            },
            _ => Vec::new(),
        };

        let mut fields = Vec::new();
        for id in roots {
            collect_fields(doc, id, &Inherited::default(), 0, &mut fields);
        }
        Ok(fields)
    }

    /// Set the value of every field whose partial name is `name`
    ///
    /// Stale appearance streams are removed and the form is flagged with
    /// `NeedAppearances` so viewers regenerate them. Returns how many fields
    /// were updated.
    pub fn set_field_value(&mut self, name: &str, value: &str) -> Result<usize> {
        let targets: Vec<ObjectId> = self
            .form_fields()?
            .into_iter()
            .filter(|field| field.name == name)
            .map(|field| field.id)
            .collect();
        if targets.is_empty() {
            return Ok(0);
        }

        let encoded = encode_text_string(value);
        let format = if encoded.starts_with(&[0xFE, 0xFF]) {
            StringFormat::Hexadecimal
        } else {
            StringFormat::Literal
        };

        for id in &targets {
            let field = self.inner_mut().get_dictionary_mut(*id)?;
            field.set("V", Object::String(encoded.clone(), format.clone()));
            field.remove(b"AP");

            let widgets = match field.get(b"Kids") {
                Ok(Object::Array(items)) => reference_ids(items),
                _ => Vec::new(),
            };
            for widget in widgets {
                if let Ok(dict) = self.inner_mut().get_dictionary_mut(widget) {
                    if !dict.has(b"T") {
                        dict.remove(b"AP");
                    }
                }
            }
        }

        self.set_need_appearances()?;
        Ok(targets.len())
    }

    /// Add an empty single-line text field on a page
    ///
    /// The form is created on first use with Helvetica as its default
    /// resource font.
    pub fn add_text_field(
        &mut self,
        page: usize,
        name: &str,
        rect: FieldRect,
        font_size: f32,
    ) -> Result<ObjectId> {
        let page_id = self.page_id(page)?;
        let lower_y = self.page_height(page)? - rect.y - rect.height;
        let location = self.ensure_acroform()?;

        let widget = dictionary! {
            "Type" => "Annot",
            "Subtype" => "Widget",
            "FT" => "Tx",
            "T" => Object::string_literal(name),
            "V" => Object::string_literal(""),
            "F" => Object::Integer(4),
            "Q" => Object::Integer(1),
            "P" => Object::Reference(page_id),
            "Rect" => vec![
                Object::Real(rect.x as f32),
                Object::Real(lower_y as f32),
                Object::Real((rect.x + rect.width) as f32),
                Object::Real((lower_y + rect.height) as f32),
            ],
            "DA" => Object::string_literal(format!("/Helv {font_size} Tf 0 g")),
            "MK" => Dictionary::new(),
        };
        let widget_id = self.inner_mut().add_object(widget);

        let doc = self.inner_mut();
        let annots_ref = match doc.get_dictionary(page_id)?.get(b"Annots") {
            Ok(Object::Reference(id)) => Some(*id),
            _ => None,
        };
        match annots_ref {
            Some(id) => doc
                .get_object_mut(id)?
                .as_array_mut()?
                .push(Object::Reference(widget_id)),
            None => {
                let page_dict = doc.get_dictionary_mut(page_id)?;
                match page_dict.get_mut(b"Annots") {
                    Ok(Object::Array(items)) => items.push(Object::Reference(widget_id)),
                    _ => page_dict.set("Annots", vec![Object::Reference(widget_id)]),
                }
            }
        }

        let fields_ref = match acroform_dict(doc, &location)?.get(b"Fields") {
            Ok(Object::Reference(id)) => Some(*id),
            _ => None,
        };
        match fields_ref {
            Some(id) => doc
                .get_object_mut(id)?
                .as_array_mut()?
                .push(Object::Reference(widget_id)),
            None => {
                let form = acroform_dict_mut(doc, &location)?;
                match form.get_mut(b"Fields") {
                    Ok(Object::Array(items)) => items.push(Object::Reference(widget_id)),
                    _ => form.set("Fields", vec![Object::Reference(widget_id)]),
                }
            }
        }

        Ok(widget_id)
    }

    fn acroform(&self) -> Result<Option<AcroForm>> {
        let catalog_id = self.catalog_id()?;
        let catalog = self.inner().get_dictionary(catalog_id)?;
        Ok(match catalog.get(b"AcroForm") {
            Ok(Object::Reference(id)) => Some(AcroForm::Object(*id)),
            Ok(Object::Dictionary(_)) => Some(AcroForm::InCatalog(catalog_id)),
            _ => None,
        })
    }

    fn ensure_acroform(&mut self) -> Result<AcroForm> {
        if let Some(location) = self.acroform()? {
            return Ok(location);
        }

        let catalog_id = self.catalog_id()?;
        let doc = self.inner_mut();
        let helv = doc.add_object(StandardFont::Helvetica.to_pdf_dictionary());
        let form = dictionary! {
            "Fields" => Vec::<Object>::new(),
            "DR" => dictionary! {
                "Font" => dictionary! { "Helv" => Object::Reference(helv) },
            },
            "DA" => Object::string_literal("/Helv 0 Tf 0 g"),
            "NeedAppearances" => true,
        };
        let form_id = doc.add_object(form);
        doc.get_dictionary_mut(catalog_id)?
            .set("AcroForm", Object::Reference(form_id));

        Ok(AcroForm::Object(form_id))
    }

    fn set_need_appearances(&mut self) -> Result<()> {
        let location = self
            .acroform()?
            .ok_or_else(|| PdfError::FormError("Document has no AcroForm".to_string()))?;
        acroform_dict_mut(self.inner_mut(), &location)?.set("NeedAppearances", true);
        Ok(())
    }
}

fn acroform_dict<'a>(doc: &'a Document, location: &AcroForm) -> Result<&'a Dictionary> {
    match location {
        AcroForm::Object(id) => Ok(doc.get_dictionary(*id)?),
        AcroForm::InCatalog(catalog_id) => Ok(doc
            .get_dictionary(*catalog_id)?
            .get(b"AcroForm")?
            .as_dict()?),
    }
}

fn acroform_dict_mut<'a>(doc: &'a mut Document, location: &AcroForm) -> Result<&'a mut Dictionary> {
    match location {
        AcroForm::Object(id) => Ok(doc.get_dictionary_mut(*id)?),
        AcroForm::InCatalog(catalog_id) => Ok(doc
            .get_dictionary_mut(*catalog_id)?
            .get_mut(b"AcroForm")?
            .as_dict_mut()?),
    }
}

fn reference_ids(items: &[Object]) -> Vec<ObjectId> {
    items
        .iter()
        .filter_map(|item| item.as_reference().ok())
        .collect()
}

/// Text of a `/V` entry; names (check boxes, radio buttons) are returned as-is
fn value_text(object: &Object) -> Option<String> {
    match object {
        Object::String(bytes, _) => Some(decode_text_string(bytes)),
        Object::Name(name) => Some(String::from_utf8_lossy(name).into_owned()),
        _ => None,
    }
}

fn collect_fields(
    doc: &Document,
    id: ObjectId,
    parent: &Inherited,
    depth: usize,
    out: &mut Vec<FormField>,
) {
    if depth > MAX_FIELD_DEPTH {
        return;
    }
    let Ok(dict) = doc.get_dictionary(id) else {
        return;
    };

    let partial = dict
        .get(b"T")
        .ok()
        .and_then(|t| t.as_str().ok())
        .map(decode_text_string);
    let full_name = match &partial {
        Some(name) if parent.full_name.is_empty() => name.clone(),
        Some(name) => format!("{}.{}", parent.full_name, name),
        None => parent.full_name.clone(),
    };
    let inherited = Inherited {
        full_name,
        field_type: dict
            .get(b"FT")
            .ok()
            .and_then(|ft| ft.as_name().ok())
            .map(|ft| String::from_utf8_lossy(ft).into_owned())
            .or_else(|| parent.field_type.clone()),
        value: dict
            .get(b"V")
            .ok()
            .and_then(value_text)
            .or_else(|| parent.value.clone()),
    };

    // Kids without /T are widget annotations of this field, not child fields
    let child_fields: Vec<ObjectId> = match dict.get(b"Kids") {
        Ok(Object::Array(items)) => reference_ids(items)
            .into_iter()
            .filter(|kid| {
                doc.get_dictionary(*kid)
                    .map(|d| d.has(b"T"))
                    .unwrap_or(false)
            })
            .collect(),
        _ => Vec::new(),
    };

    if !child_fields.is_empty() {
        for kid in child_fields {
            collect_fields(doc, kid, &inherited, depth + 1, out);
        }
        return;
    }

    if let Some(name) = partial {
        out.push(FormField {
            name,
            full_name: inherited.full_name,
            field_type: inherited.field_type,
            value: inherited.value,
            id,
        });
    }
}
