use crate::column_map::ColumnRoleMapping;
use crate::delimited::RawTable;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PointRecord {
    pub id: u32,
    pub label: String,
    pub x: String,
    pub y: String,
    pub selected: bool,
}

/// Outcome of table operations that cannot fail but may have nothing to
/// do, reported to the caller instead of being thrown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableOutcome {
    Done,
    TableEmpty,
    NothingToReset,
}

/// Ordered, editable collection of point records. Ids stay dense 1..N
/// across structural changes. The first mutation captures a baseline
/// snapshot so edits can be rolled back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PointTable {
    records: Vec<PointRecord>,
    label_header: String,
    original: Option<Vec<PointRecord>>,
}

impl PointTable {
    pub fn from_mapped_rows(raw: &RawTable, mapping: &ColumnRoleMapping) -> Self {
        let point_index = header_index(&raw.headers, &mapping.point_column);
        let x_index = header_index(&raw.headers, &mapping.x_column);
        let y_index = header_index(&raw.headers, &mapping.y_column);

        let records = raw
            .rows
            .iter()
            .enumerate()
            .map(|(row_index, row)| PointRecord {
                id: row_index as u32 + 1,
                label: cell(row, point_index),
                x: cell(row, x_index),
                y: cell(row, y_index),
                selected: false,
            })
            .collect::<Vec<_>>();

        tracing::debug!(rows = records.len(), "point table materialized");

        Self {
            original: Some(records.clone()),
            records,
            label_header: mapping.point_column.clone(),
        }
    }

    /// A manually-authored table starts with one blank record and no
    /// baseline; the first mutation captures one.
    pub fn create_empty() -> Self {
        Self {
            records: vec![PointRecord {
                id: 1,
                label: String::new(),
                x: String::new(),
                y: String::new(),
                selected: false,
            }],
            label_header: "Точка".to_string(),
            original: None,
        }
    }

    pub fn records(&self) -> &[PointRecord] {
        &self.records
    }

    pub fn label_header(&self) -> &str {
        &self.label_header
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn add_row(&mut self) -> u32 {
        self.ensure_snapshot();
        let id = self
            .records
            .iter()
            .map(|record| record.id)
            .max()
            .map_or(1, |max| max + 1);
        self.records.push(PointRecord {
            id,
            label: format!("Точка {id}"),
            x: "0.0".to_string(),
            y: "0.0".to_string(),
            selected: false,
        });
        id
    }

    /// Removes selected records and renumbers the rest to 1..N. Returns
    /// how many were deleted, or `TableEmpty` when there was nothing to
    /// operate on.
    pub fn delete_selected(&mut self) -> Result<usize, TableOutcome> {
        if self.records.is_empty() {
            return Err(TableOutcome::TableEmpty);
        }
        self.ensure_snapshot();

        let before = self.records.len();
        self.records.retain(|record| !record.selected);
        let deleted = before - self.records.len();
        self.renumber();
        Ok(deleted)
    }

    /// Exchanges x and y text for every record. Ids, labels and
    /// selection are untouched.
    pub fn swap_xy(&mut self) -> TableOutcome {
        if self.records.is_empty() {
            return TableOutcome::TableEmpty;
        }
        self.ensure_snapshot();
        for record in &mut self.records {
            std::mem::swap(&mut record.x, &mut record.y);
        }
        TableOutcome::Done
    }

    pub fn reset_to_original(&mut self) -> TableOutcome {
        match &self.original {
            Some(snapshot) => {
                self.records = snapshot.clone();
                TableOutcome::Done
            }
            None => TableOutcome::NothingToReset,
        }
    }

    pub fn set_selected(&mut self, id: u32, selected: bool) -> bool {
        match self.records.iter_mut().find(|record| record.id == id) {
            Some(record) => {
                record.selected = selected;
                true
            }
            None => false,
        }
    }

    pub fn select_all(&mut self, selected: bool) {
        for record in &mut self.records {
            record.selected = selected;
        }
    }

    pub fn selected_count(&self) -> usize {
        self.records.iter().filter(|record| record.selected).count()
    }

    pub fn set_label(&mut self, id: u32, value: impl Into<String>) -> bool {
        self.edit(id, |record| record.label = value.into())
    }

    pub fn set_x(&mut self, id: u32, value: impl Into<String>) -> bool {
        self.edit(id, |record| record.x = value.into())
    }

    pub fn set_y(&mut self, id: u32, value: impl Into<String>) -> bool {
        self.edit(id, |record| record.y = value.into())
    }

    /// Header `ID,<label header>,X,Y`, label double-quoted with internal
    /// quotes doubled, id/x/y unquoted, `\n` line endings.
    pub fn to_csv(&self) -> Result<String, TableOutcome> {
        if self.records.is_empty() {
            return Err(TableOutcome::TableEmpty);
        }
        Ok(crate::export::points_to_csv(
            &self.label_header,
            &self.records,
        ))
    }

    fn edit(&mut self, id: u32, apply: impl FnOnce(&mut PointRecord)) -> bool {
        self.ensure_snapshot();
        match self.records.iter_mut().find(|record| record.id == id) {
            Some(record) => {
                apply(record);
                true
            }
            None => false,
        }
    }

    fn ensure_snapshot(&mut self) {
        if self.original.is_none() {
            self.original = Some(self.records.clone());
        }
    }

    fn renumber(&mut self) {
        for (index, record) in self.records.iter_mut().enumerate() {
            record.id = index as u32 + 1;
        }
    }
}

fn header_index(headers: &[String], name: &str) -> Option<usize> {
    headers.iter().position(|header| header == name)
}

fn cell(row: &[String], index: Option<usize>) -> String {
    index
        .and_then(|i| row.get(i))
        .cloned()
        .unwrap_or_default()
}
