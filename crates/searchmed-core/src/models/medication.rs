//! Registry record models.
//!
//! These mirror the wire shapes of the pharmaceutical-registry API: a full
//! medication record from the single-record endpoint, the summary rows the
//! search endpoint returns, and the document/presentation sub-objects.
//! Dates arrive as Unix epoch milliseconds and are exposed through chrono
//! accessors.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Authorization state of a medication or presentation.
///
/// An authorized medication carries only the authorization date; revoked or
/// suspended ones also carry those dates.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AuthorizationStatus {
    /// Authorization date (epoch milliseconds)
    pub aut: Option<i64>,
    /// Suspension date (epoch milliseconds)
    pub susp: Option<i64>,
    /// Revocation date (epoch milliseconds)
    pub rev: Option<i64>,
}

impl AuthorizationStatus {
    pub fn authorized_at(&self) -> Option<DateTime<Utc>> {
        self.aut.and_then(epoch_ms_to_datetime)
    }

    pub fn suspended_at(&self) -> Option<DateTime<Utc>> {
        self.susp.and_then(epoch_ms_to_datetime)
    }

    pub fn revoked_at(&self) -> Option<DateTime<Utc>> {
        self.rev.and_then(epoch_ms_to_datetime)
    }

    /// Authorized and neither suspended nor revoked.
    pub fn is_active(&self) -> bool {
        self.aut.is_some() && self.susp.is_none() && self.rev.is_none()
    }
}

fn epoch_ms_to_datetime(ms: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_millis_opt(ms).single()
}

/// Kind of official document attached to a medication.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(try_from = "u8", into = "u8")]
pub enum DocumentKind {
    /// Ficha técnica (summary of product characteristics)
    TechnicalSheet,
    /// Prospecto (package leaflet)
    Leaflet,
    /// Informe público de evaluación
    PublicAssessmentReport,
    /// Plan de gestión de riesgos
    RiskManagementPlan,
}

impl TryFrom<u8> for DocumentKind {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(DocumentKind::TechnicalSheet),
            2 => Ok(DocumentKind::Leaflet),
            3 => Ok(DocumentKind::PublicAssessmentReport),
            4 => Ok(DocumentKind::RiskManagementPlan),
            other => Err(format!("unknown document kind: {other}")),
        }
    }
}

impl From<DocumentKind> for u8 {
    fn from(kind: DocumentKind) -> u8 {
        match kind {
            DocumentKind::TechnicalSheet => 1,
            DocumentKind::Leaflet => 2,
            DocumentKind::PublicAssessmentReport => 3,
            DocumentKind::RiskManagementPlan => 4,
        }
    }
}

/// A document attached to a medication record.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DocumentReference {
    /// Document kind
    pub tipo: Option<DocumentKind>,
    /// URL of the document (usually PDF)
    pub url: Option<String>,
    /// Whether the document is available as sectioned HTML
    pub secc: Option<bool>,
    /// HTML URL, only present when `secc` is true
    #[serde(rename = "urlHtml")]
    pub url_html: Option<String>,
    /// Last modification date (epoch milliseconds)
    pub fecha: Option<i64>,
}

impl DocumentReference {
    pub fn modified_at(&self) -> Option<DateTime<Utc>> {
        self.fecha.and_then(epoch_ms_to_datetime)
    }

    /// Best URL for text retrieval: the sectioned HTML rendering when the
    /// registry offers one, otherwise the primary URL.
    pub fn retrieval_url(&self) -> Option<&str> {
        self.url_html.as_deref().or(self.url.as_deref())
    }
}

/// A photo attached to a medication record.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Photo {
    /// Photo kind ("materialas" or "formafarmac")
    pub tipo: Option<String>,
    /// Image URL
    pub url: Option<String>,
    /// Last update date (epoch milliseconds)
    pub fecha: Option<i64>,
}

/// Generic registry item: numeric id, alphanumeric code, display name.
///
/// Used for ATC codes, administration routes, pharmaceutical forms and
/// presentations.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Item {
    pub id: Option<i64>,
    pub codigo: Option<String>,
    pub nombre: Option<String>,
}

/// One active ingredient of a medication.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ActiveIngredient {
    /// Registry id of the ingredient
    pub id: Option<i64>,
    /// Ingredient name
    pub nombre: Option<String>,
    /// Quantity
    pub cantidad: Option<String>,
    /// Unit for the quantity
    pub unidad: Option<String>,
    /// Position in the medication's ingredient list
    pub orden: Option<i64>,
}

/// A full medication record from the single-record endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Medication {
    /// Registration number — the registry's primary identifier
    pub nregistro: String,
    /// Commercial name
    pub nombre: String,
    /// Comma-separated active-ingredient names
    #[serde(default)]
    pub pactivos: Option<String>,
    /// Marketing-authorization holder
    #[serde(default)]
    pub labtitular: Option<String>,
    /// Authorization state
    #[serde(default)]
    pub estado: Option<AuthorizationStatus>,
    /// Prescription conditions
    #[serde(default)]
    pub cpresc: Option<String>,
    /// Has at least one commercialized presentation
    #[serde(default)]
    pub comerc: bool,
    /// Requires a prescription
    #[serde(default)]
    pub receta: bool,
    /// Affects driving
    #[serde(default)]
    pub conduc: bool,
    /// Carries the black-triangle additional-monitoring mark
    #[serde(default)]
    pub triangulo: bool,
    /// Orphan designation
    #[serde(default)]
    pub huerfano: bool,
    /// Biosimilar
    #[serde(default)]
    pub biosimilar: bool,
    /// Authorized through the centralized (EMA) procedure
    #[serde(default)]
    pub ema: bool,
    /// Has open supply problems
    #[serde(default)]
    pub psum: bool,
    /// Attached official documents
    #[serde(default)]
    pub docs: Vec<DocumentReference>,
    /// Attached photos
    #[serde(default)]
    pub fotos: Vec<Photo>,
    /// Has safety notes
    #[serde(default)]
    pub notas: bool,
    /// Has informative safety materials
    #[serde(default, rename = "materialesInf")]
    pub materiales_inf: bool,
    /// ATC classification entries
    #[serde(default)]
    pub atcs: Vec<Item>,
    /// Structured active-ingredient list
    #[serde(default, rename = "principiosActivos")]
    pub principios_activos: Vec<ActiveIngredient>,
    /// Authorized administration routes
    #[serde(default, rename = "viasAdministracion")]
    pub vias_administracion: Vec<Item>,
    /// Non-substitutable marker and type
    #[serde(default)]
    pub nosustituible: Option<Item>,
    /// Presentations of the medication
    #[serde(default)]
    pub presentaciones: Vec<Item>,
    /// Pharmaceutical form
    #[serde(default, rename = "formaFarmaceutica")]
    pub forma_farmaceutica: Option<Item>,
    /// Simplified pharmaceutical form
    #[serde(default, rename = "formaFarmaceuticaSimplificada")]
    pub forma_farmaceutica_simplificada: Option<Item>,
    /// Dosage of the active ingredients, '/'-separated in ingredient order
    #[serde(default)]
    pub dosis: Option<String>,
}

impl Medication {
    /// First attached document of the given kind.
    pub fn document_of_kind(&self, kind: DocumentKind) -> Option<&DocumentReference> {
        self.docs.iter().find(|d| d.tipo == Some(kind))
    }
}

/// A summary row from the multi-record search endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MedicationSummary {
    /// Registration number
    pub nregistro: String,
    /// Commercial name
    pub nombre: String,
    /// Marketing-authorization holder
    #[serde(default)]
    pub labtitular: Option<String>,
    /// Authorization state
    #[serde(default)]
    pub estado: Option<AuthorizationStatus>,
    /// Prescription conditions
    #[serde(default)]
    pub cpresc: Option<String>,
    /// Has at least one commercialized presentation
    #[serde(default)]
    pub comerc: bool,
    /// Requires a prescription
    #[serde(default)]
    pub receta: bool,
    /// Affects driving
    #[serde(default)]
    pub conduc: bool,
    /// Carries the black-triangle additional-monitoring mark
    #[serde(default)]
    pub triangulo: bool,
    /// Orphan designation
    #[serde(default)]
    pub huerfano: bool,
    /// Biosimilar
    #[serde(default)]
    pub biosimilar: bool,
    /// Non-substitutable marker and type
    #[serde(default)]
    pub nosustituible: Option<Item>,
    /// Has open supply problems
    #[serde(default)]
    pub psum: bool,
    /// Authorized through the centralized (EMA) procedure
    #[serde(default)]
    pub ema: bool,
    /// Has safety notes
    #[serde(default)]
    pub notas: bool,
    /// Has informative safety materials
    #[serde(default, rename = "materialesInf")]
    pub materiales_inf: bool,
    /// Attached official documents
    #[serde(default)]
    pub docs: Vec<DocumentReference>,
    /// Attached photos
    #[serde(default)]
    pub fotos: Vec<Photo>,
    /// Authorized administration routes
    #[serde(default, rename = "viasAdministracion")]
    pub vias_administracion: Vec<Item>,
    /// Pharmaceutical form
    #[serde(default, rename = "formaFarmaceutica")]
    pub forma_farmaceutica: Option<Item>,
    /// Simplified pharmaceutical form
    #[serde(default, rename = "formaFarmaceuticaSimplificada")]
    pub forma_farmaceutica_simplificada: Option<Item>,
    /// Dosage of the active ingredients
    #[serde(default)]
    pub dosis: Option<String>,
}

/// A single presentation (pack) of a medication.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Presentation {
    /// National code of the presentation
    pub cn: Option<String>,
    /// Presentation name
    pub nombre: Option<String>,
    /// Authorization state
    #[serde(default)]
    pub estado: Option<AuthorizationStatus>,
    /// Commercialized
    #[serde(default)]
    pub comerc: Option<bool>,
    /// Has open supply problems
    #[serde(default)]
    pub psum: Option<bool>,
}
