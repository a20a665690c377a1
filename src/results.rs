use crate::inference::InferenceResult;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

pub const CSV_FILE_NAME: &str = "results.csv";

/// Aggregate failure of a classification batch.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum BatchError {
    Empty,
    UnusableRows { failed: usize, first_reason: String },
}

impl fmt::Display for BatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "No response successful, please review your input and try again"
        )
    }
}

impl std::error::Error for BatchError {}

impl BatchError {
    /// Diagnostic detail for logs; the user only sees the aggregate message.
    pub fn detail(&self) -> String {
        match self {
            BatchError::Empty => "no rows returned".to_string(),
            BatchError::UnusableRows {
                failed,
                first_reason,
            } => format!("{failed} unusable rows, first: {first_reason}"),
        }
    }
}

#[derive(Debug)]
pub enum ExportError {
    Csv(csv::Error),
    Io(std::io::Error),
}

impl fmt::Display for ExportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportError::Csv(err) => write!(f, "csv error: {err}"),
            ExportError::Io(err) => write!(f, "io error: {err}"),
        }
    }
}

impl std::error::Error for ExportError {}

impl From<csv::Error> for ExportError {
    fn from(value: csv::Error) -> Self {
        ExportError::Csv(value)
    }
}

impl From<std::io::Error> for ExportError {
    fn from(value: std::io::Error) -> Self {
        ExportError::Io(value)
    }
}

impl From<csv::IntoInnerError<csv::Writer<Vec<u8>>>> for ExportError {
    fn from(value: csv::IntoInnerError<csv::Writer<Vec<u8>>>) -> Self {
        ExportError::Io(value.into_error())
    }
}

/// One classified keyphrase, ready for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRow {
    pub index: usize,
    pub keyphrase: String,
    pub labels: Vec<String>,
    #[serde(rename = "classification scores")]
    pub scores: Vec<String>,
}

impl ResultRow {
    /// The highest-ranked label (the service orders labels by score).
    pub fn top_label(&self) -> Option<&str> {
        self.labels.first().map(String::as_str)
    }

    fn cell(&self, column: GridColumn) -> String {
        match column {
            GridColumn::Keyphrase => self.keyphrase.clone(),
            GridColumn::Labels => list_cell(&self.labels),
            GridColumn::Scores => list_cell(&self.scores),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultTable {
    pub rows: Vec<ResultRow>,
}

impl ResultTable {
    /// Builds the table from a batch. An empty batch or any failed row fails
    /// the whole batch.
    pub fn from_results(results: Vec<InferenceResult>) -> Result<Self, BatchError> {
        if results.is_empty() {
            return Err(BatchError::Empty);
        }
        let mut rows = Vec::with_capacity(results.len());
        let mut failed = 0usize;
        let mut first_reason = None;
        for (index, result) in results.into_iter().enumerate() {
            match result {
                InferenceResult::Success {
                    sequence,
                    labels,
                    scores,
                } => rows.push(ResultRow {
                    index,
                    keyphrase: sequence,
                    labels,
                    scores: scores.into_iter().map(format_percent).collect(),
                }),
                InferenceResult::Failure { reason } => {
                    failed += 1;
                    first_reason.get_or_insert(reason);
                }
            }
        }
        if failed > 0 {
            return Err(BatchError::UnusableRows {
                failed,
                first_reason: first_reason.unwrap_or_default(),
            });
        }
        Ok(Self { rows })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows visible under the view's filter and sort.
    pub fn view(&self, view: &TableView) -> Vec<&ResultRow> {
        let needle = view
            .filter
            .as_deref()
            .map(str::trim)
            .filter(|needle| !needle.is_empty())
            .map(str::to_lowercase);
        let mut rows: Vec<&ResultRow> = self
            .rows
            .iter()
            .filter(|row| match &needle {
                Some(needle) => GridColumn::ALL
                    .iter()
                    .any(|column| row.cell(*column).to_lowercase().contains(needle)),
                None => true,
            })
            .collect();
        if let Some(column) = view.sort {
            rows.sort_by(|a, b| {
                let ordering = compare_cells(a, b, column);
                match view.dir {
                    SortDirection::Asc => ordering,
                    SortDirection::Desc => ordering.reverse(),
                }
            });
        }
        rows
    }

    /// Group counts of the visible rows by the view's grouping column.
    pub fn groups(&self, view: &TableView) -> Vec<GroupSummary> {
        let Some(column) = view.group else {
            return Vec::new();
        };
        let mut counts: BTreeMap<String, usize> = BTreeMap::new();
        for row in self.view(view) {
            let key = match column {
                GridColumn::Labels => row.top_label().unwrap_or_default().to_string(),
                other => row.cell(other),
            };
            *counts.entry(key).or_default() += 1;
        }
        counts
            .into_iter()
            .map(|(value, rows)| GroupSummary { value, rows })
            .collect()
    }

    /// Exports the visible rows (restricted to `selected` indices when any are
    /// given) as UTF-8 CSV with a leading index column.
    pub fn to_csv(&self, view: &TableView, selected: &[usize]) -> Result<Vec<u8>, ExportError> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        let mut header = vec![String::new()];
        header.extend(GridColumn::ALL.iter().map(|column| column.title().to_string()));
        writer.write_record(&header)?;
        for row in self.view(view) {
            if !selected.is_empty() && !selected.contains(&row.index) {
                continue;
            }
            let mut record = vec![row.index.to_string()];
            record.extend(GridColumn::ALL.iter().map(|column| row.cell(*column)));
            writer.write_record(&record)?;
        }
        Ok(writer.into_inner()?)
    }
}

fn compare_cells(a: &ResultRow, b: &ResultRow, column: GridColumn) -> Ordering {
    let ordering = match column {
        GridColumn::Keyphrase => a.keyphrase.cmp(&b.keyphrase),
        GridColumn::Labels => a.labels.cmp(&b.labels),
        GridColumn::Scores => {
            let left = a.scores.first().and_then(|score| parse_percent(score));
            let right = b.scores.first().and_then(|score| parse_percent(score));
            left.partial_cmp(&right).unwrap_or(Ordering::Equal)
        }
    };
    ordering.then_with(|| a.index.cmp(&b.index))
}

/// Formats a probability as a two-decimal percentage, e.g. `0.7345` → `73.45%`.
pub fn format_percent(score: f64) -> String {
    format!("{:.2}%", score * 100.0)
}

fn parse_percent(value: &str) -> Option<f64> {
    value.strip_suffix('%')?.parse().ok()
}

fn list_cell(items: &[String]) -> String {
    serde_json::to_string(items).unwrap_or_default()
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GridColumn {
    Keyphrase,
    Labels,
    Scores,
}

impl GridColumn {
    pub const ALL: [GridColumn; 3] = [GridColumn::Keyphrase, GridColumn::Labels, GridColumn::Scores];

    pub fn title(&self) -> &'static str {
        match self {
            GridColumn::Keyphrase => "keyphrase",
            GridColumn::Labels => "labels",
            GridColumn::Scores => "classification scores",
        }
    }

    pub fn query_value(&self) -> &'static str {
        match self {
            GridColumn::Keyphrase => "keyphrase",
            GridColumn::Labels => "labels",
            GridColumn::Scores => "scores",
        }
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn query_value(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }

    pub fn flipped(&self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }
}

/// Sort, filter and grouping applied to the grid; also drives export.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct TableView {
    pub sort: Option<GridColumn>,
    #[serde(default)]
    pub dir: SortDirection,
    pub filter: Option<String>,
    pub group: Option<GridColumn>,
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct GroupSummary {
    pub value: String,
    pub rows: usize,
}

/// Per-column grid capabilities, serialized for the page.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnDef {
    pub field: &'static str,
    pub header_name: &'static str,
    pub sortable: bool,
    pub filter: bool,
    pub enable_pivot: bool,
    pub enable_value: bool,
    pub enable_row_group: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GridOptions {
    pub column_defs: Vec<ColumnDef>,
    pub row_selection: &'static str,
    pub checkbox_selection: bool,
    pub side_bar: bool,
}

impl GridOptions {
    /// Multi-select with checkboxes and pivot, value and grouping enabled on
    /// every column.
    pub fn for_results() -> Self {
        Self {
            column_defs: GridColumn::ALL
                .iter()
                .map(|column| ColumnDef {
                    field: column.query_value(),
                    header_name: column.title(),
                    sortable: true,
                    filter: true,
                    enable_pivot: true,
                    enable_value: true,
                    enable_row_group: true,
                })
                .collect(),
            row_selection: "multiple",
            checkbox_selection: true,
            side_bar: true,
        }
    }
}
