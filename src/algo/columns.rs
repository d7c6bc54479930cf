//! Column-header normalization.
//!
//! Survey exports name the same question a dozen different ways, in English
//! and French. Every observed header is mapped onto a [`CanonicalField`] via
//! an ordered synonym table, or passed through untouched.

use std::collections::HashMap;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::SurveyRow;

/// Semantic fields recognized in branch survey exports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CanonicalField {
    CaseId,
    Country,
    Branch,
    Date,
    Name,
    Surname,
    Email,
    Phone,
    IpAddress,
    ReasonForScore,
    NeedCallback,
    AdvocateScore,
    AccountType,
    ImprovementArea,
    ServedByStaff,
    SatisfactionRating,
}

impl CanonicalField {
    pub const ALL: [CanonicalField; 16] = [
        Self::CaseId,
        Self::Country,
        Self::Branch,
        Self::Date,
        Self::Name,
        Self::Surname,
        Self::Email,
        Self::Phone,
        Self::IpAddress,
        Self::ReasonForScore,
        Self::NeedCallback,
        Self::AdvocateScore,
        Self::AccountType,
        Self::ImprovementArea,
        Self::ServedByStaff,
        Self::SatisfactionRating,
    ];

    /// The column name written into normalized rows.
    pub fn label(&self) -> &'static str {
        match self {
            Self::CaseId => "Case #",
            Self::Country => "Country",
            Self::Branch => "Branch",
            Self::Date => "Date",
            Self::Name => "Name",
            Self::Surname => "Surname",
            Self::Email => "Email",
            Self::Phone => "Phone",
            Self::IpAddress => "IP",
            Self::ReasonForScore => "Reasons Of Score",
            Self::NeedCallback => "Need Callback",
            Self::AdvocateScore => "AS",
            Self::AccountType => "What is the primary account that you have with Ecobank",
            Self::ImprovementArea => "What needs to be improved based on your experience",
            Self::ServedByStaff => "Which staff served you",
            Self::SatisfactionRating => {
                "How would you rate your overall satisfaction with your branch visit"
            }
        }
    }
}

/// Result of normalizing one header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Column {
    Canonical(CanonicalField),
    Passthrough(String),
}

impl Column {
    pub fn label(&self) -> &str {
        match self {
            Column::Canonical(field) => field.label(),
            Column::Passthrough(original) => original,
        }
    }

    pub fn field(&self) -> Option<CanonicalField> {
        match self {
            Column::Canonical(field) => Some(*field),
            Column::Passthrough(_) => None,
        }
    }
}

use CanonicalField::*;

/// Synonym table. Iteration order decides substring matches and must stay
/// exactly as is.
pub const COLUMN_SYNONYMS: &[(&str, CanonicalField)] = &[
    // case number
    ("case", CaseId),
    ("case number", CaseId),
    ("case #", CaseId),
    ("case_number", CaseId),
    ("casenumber", CaseId),
    ("case no", CaseId),
    ("case no.", CaseId),
    ("id", CaseId),
    ("reference", CaseId),
    ("ref", CaseId),
    ("ref.", CaseId),
    ("ticket", CaseId),
    ("ticket #", CaseId),
    ("ticket number", CaseId),
    ("numéro de dossier", CaseId),
    ("numero de dossier", CaseId),
    ("numéro", CaseId),
    ("numero", CaseId),
    // country
    ("country", Country),
    ("pays", Country),
    ("nation", Country),
    ("country/region", Country),
    ("region", Country),
    ("location country", Country),
    // branch
    ("branch", Branch),
    ("agence", Branch),
    ("office", Branch),
    ("succursale", Branch),
    ("location", Branch),
    ("site", Branch),
    ("branch name", Branch),
    ("branch office", Branch),
    ("branch location", Branch),
    ("nom de l'agence", Branch),
    ("nom agence", Branch),
    // date
    ("date", Date),
    ("survey date", Date),
    ("date of survey", Date),
    ("submission date", Date),
    ("response date", Date),
    ("date de réponse", Date),
    ("date de soumission", Date),
    ("created at", Date),
    ("timestamp", Date),
    // first name
    ("name", Name),
    ("first name", Name),
    ("firstname", Name),
    ("prénom", Name),
    ("prenom", Name),
    ("given name", Name),
    ("customer name", Name),
    ("client name", Name),
    ("respondent name", Name),
    // surname
    ("surname", Surname),
    ("last name", Surname),
    ("lastname", Surname),
    ("nom", Surname),
    ("family name", Surname),
    ("nom de famille", Surname),
    // email
    ("email", Email),
    ("e-mail", Email),
    ("courriel", Email),
    ("email address", Email),
    ("adresse email", Email),
    ("adresse e-mail", Email),
    ("customer email", Email),
    ("client email", Email),
    // phone
    ("phone", Phone),
    ("telephone", Phone),
    ("phone number", Phone),
    ("tel", Phone),
    ("tel.", Phone),
    ("téléphone", Phone),
    ("telephone number", Phone),
    ("mobile", Phone),
    ("mobile number", Phone),
    ("cell", Phone),
    ("cell phone", Phone),
    ("numéro de téléphone", Phone),
    ("numero de telephone", Phone),
    // ip
    ("ip", IpAddress),
    ("ip address", IpAddress),
    ("adresse ip", IpAddress),
    ("ipaddress", IpAddress),
    // reasons of score
    ("reasons of score", ReasonForScore),
    ("reason", ReasonForScore),
    ("reasons", ReasonForScore),
    ("score reason", ReasonForScore),
    ("raisons du score", ReasonForScore),
    ("comments", ReasonForScore),
    ("feedback", ReasonForScore),
    ("comment", ReasonForScore),
    ("verbatim", ReasonForScore),
    ("customer feedback", ReasonForScore),
    ("client feedback", ReasonForScore),
    ("additional comments", ReasonForScore),
    ("commentaires", ReasonForScore),
    ("commentaire", ReasonForScore),
    ("remarques", ReasonForScore),
    ("observations", ReasonForScore),
    // callback
    ("need callback", NeedCallback),
    ("callback", NeedCallback),
    ("rappel nécessaire", NeedCallback),
    ("call back", NeedCallback),
    ("callback required", NeedCallback),
    ("requires callback", NeedCallback),
    ("needs callback", NeedCallback),
    ("follow up", NeedCallback),
    ("follow-up", NeedCallback),
    ("followup", NeedCallback),
    ("rappel", NeedCallback),
    ("besoin de rappel", NeedCallback),
    ("contact customer", NeedCallback),
    // advocate score
    ("as", AdvocateScore),
    ("advocate score", AdvocateScore),
    ("nps", AdvocateScore),
    ("net promoter score", AdvocateScore),
    ("score", AdvocateScore),
    ("promoter score", AdvocateScore),
    ("recommendation score", AdvocateScore),
    ("likelihood to recommend", AdvocateScore),
    ("would recommend", AdvocateScore),
    ("recommendation", AdvocateScore),
    ("promoter", AdvocateScore),
    ("score de recommandation", AdvocateScore),
    // account type
    ("what is the primary account that you have with ecobank", AccountType),
    ("account type", AccountType),
    ("primary account", AccountType),
    ("type de compte", AccountType),
    ("account", AccountType),
    ("compte", AccountType),
    ("type of account", AccountType),
    ("account category", AccountType),
    ("product type", AccountType),
    ("product", AccountType),
    // improvement
    ("what needs to be improved based on your experience", ImprovementArea),
    ("improvements", ImprovementArea),
    ("improvement areas", ImprovementArea),
    ("areas for improvement", ImprovementArea),
    ("amélioration", ImprovementArea),
    ("what can be improved", ImprovementArea),
    ("suggestions for improvement", ImprovementArea),
    ("improvement suggestions", ImprovementArea),
    ("what would you improve", ImprovementArea),
    ("how can we improve", ImprovementArea),
    ("suggestions", ImprovementArea),
    ("améliorer", ImprovementArea),
    ("à améliorer", ImprovementArea),
    ("a ameliorer", ImprovementArea),
    // staff
    ("which staff served you", ServedByStaff),
    ("staff", ServedByStaff),
    ("employee", ServedByStaff),
    ("served by", ServedByStaff),
    ("personnel", ServedByStaff),
    ("staff member", ServedByStaff),
    ("employee name", ServedByStaff),
    ("agent", ServedByStaff),
    ("agent name", ServedByStaff),
    ("representative", ServedByStaff),
    ("rep", ServedByStaff),
    ("service agent", ServedByStaff),
    ("nom de l'employé", ServedByStaff),
    ("nom de l'agent", ServedByStaff),
    ("servi par", ServedByStaff),
    // satisfaction
    (
        "how would you rate your overall satisfaction with your branch visit",
        SatisfactionRating,
    ),
    ("satisfaction", SatisfactionRating),
    ("overall satisfaction", SatisfactionRating),
    ("rating", SatisfactionRating),
    ("satisfaction rating", SatisfactionRating),
    ("satisfaction score", SatisfactionRating),
    ("niveau de satisfaction", SatisfactionRating),
    ("customer satisfaction", SatisfactionRating),
    ("visit satisfaction", SatisfactionRating),
    ("branch satisfaction", SatisfactionRating),
    ("experience rating", SatisfactionRating),
    ("how satisfied", SatisfactionRating),
    ("satisfaction level", SatisfactionRating),
    ("rate your experience", SatisfactionRating),
    ("rate your satisfaction", SatisfactionRating),
    ("évaluation", SatisfactionRating),
    ("evaluation", SatisfactionRating),
    ("note", SatisfactionRating),
];

/// Header fragments that suggest a branch column when nothing maps to Branch.
const BRANCH_HINTS: &[&str] = &["branch", "agence", "office", "location"];

/// Map an observed header onto a canonical field.
///
/// Exact synonym match first, then the first synonym contained in the header
/// (table order), then the "branch"/"agence" and "satisfaction"/"rating"
/// keyword checks. Unrecognized headers come back unchanged.
pub fn normalize_column_name(header: &str) -> Column {
    let key = header.trim().to_lowercase();

    if let Some((_, field)) = COLUMN_SYNONYMS.iter().find(|(syn, _)| *syn == key) {
        return Column::Canonical(*field);
    }

    if let Some((syn, field)) = COLUMN_SYNONYMS.iter().find(|(syn, _)| key.contains(syn)) {
        tracing::debug!(header, synonym = syn, field = field.label(), "partial column match");
        return Column::Canonical(*field);
    }

    if key.contains("branch") || key.contains("agence") {
        return Column::Canonical(Branch);
    }
    if key.contains("satisfaction") || key.contains("rating") {
        return Column::Canonical(SatisfactionRating);
    }

    Column::Passthrough(header.to_string())
}

/// Header → output column, built once per distinct header set.
#[derive(Debug, Clone, Default)]
pub struct ColumnMap {
    columns: HashMap<String, Column>,
}

impl ColumnMap {
    pub fn from_headers<'a>(headers: impl IntoIterator<Item = &'a str>) -> Self {
        let mut columns = HashMap::new();
        for header in headers {
            columns
                .entry(header.to_string())
                .or_insert_with(|| normalize_column_name(header));
        }
        Self { columns }
    }

    /// Union of every key seen across `rows`.
    pub fn from_rows(rows: &[SurveyRow]) -> Self {
        Self::from_headers(rows.iter().flat_map(|r| r.keys().map(String::as_str)))
    }

    pub fn get(&self, header: &str) -> Column {
        self.columns
            .get(header)
            .cloned()
            .unwrap_or_else(|| normalize_column_name(header))
    }

    pub fn has_field(&self, field: CanonicalField) -> bool {
        self.columns.values().any(|c| c.field() == Some(field))
    }
}

/// Rename the keys of one row. When two headers collapse onto the same
/// canonical field, the later column wins.
pub fn normalize_row(row: &SurveyRow, map: &ColumnMap) -> SurveyRow {
    let mut out = Map::with_capacity(row.len());
    for (key, value) in row {
        out.insert(map.get(key).label().to_string(), value.clone());
    }
    out
}

/// Normalize every row, then fill in Branch from a hinted column when no
/// header mapped to it directly.
pub fn normalize_rows(rows: &[SurveyRow]) -> Vec<SurveyRow> {
    let map = ColumnMap::from_rows(rows);
    let mut normalized: Vec<SurveyRow> = rows.par_iter().map(|r| normalize_row(r, &map)).collect();

    if !rows.is_empty() && !map.has_field(Branch) {
        let first_headers: Vec<&str> = rows
            .first()
            .map(|r| r.keys().map(String::as_str).collect())
            .unwrap_or_default();
        if let Some(column) = infer_branch_column(&first_headers) {
            tracing::info!(column, "using inferred branch column");
            for (out, raw) in normalized.iter_mut().zip(rows) {
                if let Some(v) = raw.get(column) {
                    out.insert(Branch.label().to_string(), v.clone());
                }
            }
        } else {
            tracing::warn!("no branch column found");
        }
    }

    normalized
}

/// First header hinting at a branch (branch/agence/office/location).
pub fn infer_branch_column<'a>(headers: &[&'a str]) -> Option<&'a str> {
    headers.iter().copied().find(|h| {
        let lower = h.to_lowercase();
        BRANCH_HINTS.iter().any(|hint| lower.contains(hint))
    })
}

/// Row value for a canonical field, treating JSON null as absent.
pub fn field_value(row: &SurveyRow, field: CanonicalField) -> Option<&Value> {
    row.get(field.label()).filter(|v| !v.is_null())
}
