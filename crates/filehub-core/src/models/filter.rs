use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::hierarchy::{ApplicationId, LocationId};

/// Query constraints for the upload listing. Every field is optional and an
/// absent (or blank) field means "unconstrained".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSet {
    pub from_date: Option<NaiveDate>,
    pub to_date: Option<NaiveDate>,
    pub search: Option<String>,
    pub application_id: Option<ApplicationId>,
    pub location_id: Option<LocationId>,
}

/// Individually clearable filter fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterField {
    FromDate,
    ToDate,
    Search,
    Application,
    Location,
}

impl FilterSet {
    pub fn is_empty(&self) -> bool {
        self.to_query_pairs().is_empty()
    }

    pub fn clear(&mut self, field: FilterField) {
        match field {
            FilterField::FromDate => self.from_date = None,
            FilterField::ToDate => self.to_date = None,
            FilterField::Search => self.search = None,
            FilterField::Application => self.application_id = None,
            FilterField::Location => self.location_id = None,
        }
    }

    /// Request parameters for `GET /uploads`.
    ///
    /// Blank search text is omitted rather than sent as an empty constraint.
    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(from) = self.from_date {
            pairs.push(("from_date", from.format("%Y-%m-%d").to_string()));
        }
        if let Some(to) = self.to_date {
            pairs.push(("to_date", to.format("%Y-%m-%d").to_string()));
        }
        if let Some(search) = self.search.as_deref().map(str::trim) {
            if !search.is_empty() {
                pairs.push(("search", search.to_string()));
            }
        }
        if let Some(app) = self.application_id {
            pairs.push(("application_id", app.to_string()));
        }
        if let Some(loc) = self.location_id {
            pairs.push(("location_id", loc.to_string()));
        }
        pairs
    }
}
