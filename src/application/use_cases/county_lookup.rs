use crate::domain::county::{normalize_county, FormulaRow, SuperchargerRow};

/// Formula rows in sheet order plus optional supercharger counts.
///
/// Built once at startup and never mutated. Counties are not unique keys:
/// the first row whose normalized name matches wins.
#[derive(Debug, Clone, Default)]
pub struct CountyTable {
    rows: Vec<FormulaRow>,
    superchargers: Vec<SuperchargerRow>,
}

impl CountyTable {
    pub fn new(rows: Vec<FormulaRow>) -> Self {
        Self {
            rows,
            superchargers: Vec::new(),
        }
    }

    pub fn with_superchargers(mut self, superchargers: Vec<SuperchargerRow>) -> Self {
        self.superchargers = superchargers;
        self
    }

    pub fn find(&self, county_input: &str) -> Option<&FormulaRow> {
        let county_clean = normalize_county(county_input);
        self.rows.iter().find(|row| row.county_clean == county_clean)
    }

    pub fn supercharger_count(&self, county_input: &str) -> Option<f64> {
        let county_clean = normalize_county(county_input);
        self.superchargers
            .iter()
            .find(|row| row.county_clean == county_clean)
            .map(|row| row.supercharger_count)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
