// Grid template domain model and validation
use serde::{Deserialize, Serialize};

/// CSS-grid-style layout specification owned by the dashboard.
/// `template_areas` is replaced wholesale on edit, never row by row.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridSpec {
    pub columns: String,
    pub rows: String,
    pub gap: String,
    pub template_areas: Vec<String>,
}

impl GridSpec {
    pub fn new(columns: String, rows: String, gap: String, template_areas: Vec<String>) -> Self {
        Self {
            columns,
            rows,
            gap,
            template_areas,
        }
    }

    pub fn areas(&self) -> Vec<String> {
        extract_areas(&self.template_areas)
    }
}

impl Default for GridSpec {
    fn default() -> Self {
        generate_default_grid(2, 2)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<String>,
}

/// Extract all unique area names from the template rows.
/// `.` marks an empty cell and is never an area name. First-seen
/// order is preserved.
pub fn extract_areas(template_areas: &[String]) -> Vec<String> {
    let mut areas = Vec::new();
    for token in template_areas.join(" ").split_whitespace() {
        if token != "." && !areas.iter().any(|a| a == token) {
            areas.push(token.to_string());
        }
    }
    areas
}

/// Check a grid candidate for structural problems. Never panics;
/// every offending row is reported, 1-indexed.
pub fn validate(grid: &GridSpec) -> ValidationReport {
    let mut errors = Vec::new();

    if grid.template_areas.is_empty() {
        errors.push("Template areas cannot be empty".to_string());
    }

    if let Some(first_row) = grid.template_areas.first() {
        let first_cols = first_row.split_whitespace().count();
        for (i, row) in grid.template_areas.iter().enumerate().skip(1) {
            let cols = row.split_whitespace().count();
            if cols != first_cols {
                errors.push(format!(
                    "Row {} has {} columns, but row 1 has {} columns",
                    i + 1,
                    cols,
                    first_cols
                ));
            }
        }
    }

    if grid.columns.is_empty() {
        errors.push("Columns value is required".to_string());
    }
    if grid.rows.is_empty() {
        errors.push("Rows value is required".to_string());
    }

    ValidationReport {
        valid: errors.is_empty(),
        errors,
    }
}

pub fn is_valid_area(area: &str, template_areas: &[String]) -> bool {
    extract_areas(template_areas).iter().any(|a| a == area)
}

/// Generate a sequential `area1..areaN` layout with `1fr` columns
/// and `auto` rows.
pub fn generate_default_grid(rows: usize, cols: usize) -> GridSpec {
    let columns = vec!["1fr"; cols].join(" ");
    let rows_str = vec!["auto"; rows].join(" ");

    let mut template_areas = Vec::with_capacity(rows);
    let mut area_index = 1;
    for _ in 0..rows {
        let row: Vec<String> = (0..cols)
            .map(|_| {
                let name = format!("area{}", area_index);
                area_index += 1;
                name
            })
            .collect();
        template_areas.push(row.join(" "));
    }

    GridSpec::new(columns, rows_str, "16px".to_string(), template_areas)
}

/// Strip wrapping quote characters agents sometimes include in
/// template rows, e.g. `"\"a a b\""`.
pub fn normalize_template_row(row: &str) -> String {
    row.trim()
        .trim_start_matches(['"', '\''])
        .trim_end_matches(['"', '\''])
        .trim()
        .to_string()
}
