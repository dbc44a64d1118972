use std::cmp::Ordering;

use super::money::parse_money;
use super::{CellValue, ColumnType, RenderedRow, RenderedTable, RowStyle};
use crate::view::RenderError;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

#[derive(Debug, PartialEq)]
enum SortKey<'a> {
    Missing,
    Number(f64),
    Text(&'a str),
}

impl SortKey<'_> {
    fn rank(&self) -> u8 {
        match self {
            Self::Missing => 0,
            Self::Number(_) => 1,
            Self::Text(_) => 2,
        }
    }

    fn compare(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Number(a), Self::Number(b)) => a.total_cmp(b),
            (Self::Text(a), Self::Text(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

fn sort_key(kind: ColumnType, value: Option<&CellValue>) -> SortKey<'_> {
    match value {
        None | Some(CellValue::Null) => SortKey::Missing,
        Some(CellValue::Number(n)) => SortKey::Number(*n),
        Some(CellValue::Text(s)) if kind == ColumnType::Money => match parse_money(s) {
            Some(cents) => SortKey::Number(cents as f64 / 100.0),
            None => SortKey::Text(s),
        },
        Some(CellValue::Text(s)) => SortKey::Text(s),
    }
}

impl RenderedTable {
    // Money columns compare by amount even when sent pre-formatted.
    pub fn sorted_by(
        &self,
        position: usize,
        direction: SortDirection,
    ) -> Result<RenderedTable, RenderError> {
        let (kind, index) = match (self.formats.get(position), self.indices.get(position)) {
            (Some(kind), Some(index)) => (*kind, *index),
            _ => {
                return Err(RenderError::UnknownColumn {
                    position,
                    columns: self.header.len(),
                })
            }
        };

        let mut body: Vec<RenderedRow> = self.body.clone();
        body.sort_by(|a, b| {
            let ord = sort_key(kind, a.raw.get(index)).compare(&sort_key(kind, b.raw.get(index)));
            match direction {
                SortDirection::Ascending => ord,
                SortDirection::Descending => ord.reverse(),
            }
        });
        for (i, row) in body.iter_mut().enumerate() {
            row.style = RowStyle::for_index(i);
        }

        Ok(RenderedTable {
            body,
            ..self.clone()
        })
    }
}
