use std::collections::HashMap;

use crate::error::{CardError, Result};
use crate::geometry::{Rect, Size};
use crate::model::{ColumnId, ItemId};

/// Rows a single card occupies, including its trailing gap row.
pub const CARD_HEIGHT: u16 = 4;

/// One independently scrolling column of cards.
#[derive(Debug, Clone)]
pub struct ColumnSpec {
    pub id: ColumnId,
    pub items: Vec<ItemId>,
    /// How many cards are scrolled off the top.
    pub scroll: usize,
}

impl ColumnSpec {
    pub fn new(id: ColumnId, items: Vec<ItemId>) -> Self {
        Self {
            id,
            items,
            scroll: 0,
        }
    }
}

/// Column layout solver: splits the terminal width evenly across columns
/// and stacks fixed-height cards inside each, honoring per-column scroll.
/// Cards scrolled out of view get no rectangle.
#[derive(Debug, Clone)]
pub struct FeedLayout {
    columns: Vec<ColumnSpec>,
}

impl FeedLayout {
    pub fn new(columns: Vec<ColumnSpec>) -> Result<Self> {
        if columns.is_empty() {
            return Err(CardError::EmptyLayout);
        }
        Ok(Self { columns })
    }

    pub fn columns(&self) -> &[ColumnSpec] {
        &self.columns
    }

    pub fn column_mut(&mut self, id: &ColumnId) -> Result<&mut ColumnSpec> {
        self.columns
            .iter_mut()
            .find(|column| &column.id == id)
            .ok_or_else(|| CardError::ColumnNotFound(id.as_str().to_string()))
    }

    /// Identities in visual order: columns left to right, cards top down.
    pub fn ordered_identities(&self) -> Vec<(ColumnId, ItemId)> {
        self.columns
            .iter()
            .flat_map(|column| {
                column
                    .items
                    .iter()
                    .map(|item| (column.id.clone(), item.clone()))
            })
            .collect()
    }

    /// Solve rectangles for the given terminal size.
    pub fn solve(&self, size: Size) -> HashMap<(ColumnId, ItemId), Rect> {
        let mut rects = HashMap::new();
        if size.width == 0 || size.height == 0 {
            return rects;
        }

        let count = self.columns.len() as u16;
        let base_width = size.width / count;
        if base_width == 0 {
            return rects;
        }

        for (index, column) in self.columns.iter().enumerate() {
            let x = base_width * index as u16;
            // Last column absorbs the division remainder.
            let width = if index as u16 == count - 1 {
                size.width - x
            } else {
                base_width
            };

            for (slot, item) in column.items.iter().skip(column.scroll).enumerate() {
                let y = slot as u16 * CARD_HEIGHT;
                if y >= size.height {
                    break;
                }
                let height = (CARD_HEIGHT - 1).min(size.height - y);
                rects.insert(
                    (column.id.clone(), item.clone()),
                    Rect::new(x, y, width, height),
                );
            }
        }
        rects
    }

    /// Map a terminal cell to the card occupying it, if any.
    pub fn hit_test(
        rects: &HashMap<(ColumnId, ItemId), Rect>,
        x: u16,
        y: u16,
    ) -> Option<(ColumnId, ItemId)> {
        rects
            .iter()
            .find(|(_, rect)| rect.contains(x, y))
            .map(|(identity, _)| identity.clone())
    }
}
