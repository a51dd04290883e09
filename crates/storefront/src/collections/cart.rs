//! Cart store.

use chrono::{DateTime, Utc};
use keycraft_core::{CartLine, CollectionKind, ItemDetails, LineId, Price};
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::Collection;

/// Ordered cart lines keyed by [`LineId`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CartStore {
    lines: Vec<CartLine>,
}

impl CartStore {
    /// Create an empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { lines: Vec::new() }
    }

    /// Add `quantity` units of `item`.
    ///
    /// Merges into an existing line with the same product and variant
    /// attributes, otherwise appends a new line. A quantity of 0 counts as 1.
    /// Returns the ID of the line that now holds the item.
    pub fn add(&mut self, item: ItemDetails, quantity: u32) -> LineId {
        self.add_with_line_id(item, quantity, None)
    }

    /// Like [`add`](Self::add), using `line_id` for the new line if one is
    /// created. Ignored when the item merges into an existing line.
    pub fn add_with_line_id(
        &mut self,
        item: ItemDetails,
        quantity: u32,
        line_id: Option<LineId>,
    ) -> LineId {
        let quantity = quantity.max(1);

        if let Some(line) = self
            .lines
            .iter_mut()
            .find(|line| line.item.same_identity(&item))
        {
            line.quantity = line.quantity.saturating_add(quantity);
            return line.line_id.clone();
        }

        let line_id = line_id.unwrap_or_else(|| LineId::generate(&item.product_id));
        self.lines.push(CartLine {
            line_id: line_id.clone(),
            item,
            quantity,
        });
        line_id
    }

    /// Remove by line ID, falling back to product ID.
    ///
    /// If no line has `id` as its line ID, every line for the product `id`
    /// is removed. Returns `true` if anything was removed.
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.lines.len();
        if self.has_line_id(id) {
            self.lines.retain(|line| line.line_id.as_str() != id);
        } else {
            self.lines.retain(|line| line.product_id().as_str() != id);
        }
        self.lines.len() != before
    }

    /// Set the quantity of the line matched by `id` (same fallback as
    /// [`remove`](Self::remove)). A quantity below 1 removes the line.
    ///
    /// Returns `true` if anything changed.
    pub fn update_quantity(&mut self, id: &str, quantity: i64) -> bool {
        if quantity < 1 {
            return self.remove(id);
        }
        let quantity = u32::try_from(quantity).unwrap_or(u32::MAX);

        let by_line_id = self.has_line_id(id);
        let mut changed = false;
        for line in &mut self.lines {
            let matched = if by_line_id {
                line.line_id.as_str() == id
            } else {
                line.product_id().as_str() == id
            };
            if matched && line.quantity != quantity {
                line.quantity = quantity;
                changed = true;
            }
        }
        changed
    }

    /// Remove every line.
    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Lines in insertion order.
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// Look up a line by its ID.
    #[must_use]
    pub fn line(&self, line_id: &str) -> Option<&CartLine> {
        self.lines.iter().find(|line| line.line_id.as_str() == line_id)
    }

    /// Sum of `unit_price * quantity` over all lines.
    #[must_use]
    pub fn subtotal(&self) -> Price {
        self.lines.iter().map(CartLine::line_total).sum()
    }

    /// Total number of units in the cart.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.lines
            .iter()
            .fold(0u32, |count, line| count.saturating_add(line.quantity))
    }

    fn has_line_id(&self, id: &str) -> bool {
        self.lines.iter().any(|line| line.line_id.as_str() == id)
    }
}

/// Persisted cart line.
///
/// `cartItemId` is optional so snapshots written before line IDs existed
/// still load; quantity is signed so out-of-range values are caught at load
/// instead of failing the whole snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartRecord {
    #[serde(rename = "cartItemId", default, skip_serializing_if = "Option::is_none")]
    pub line_id: Option<LineId>,
    #[serde(flatten)]
    pub item: ItemDetails,
    pub quantity: i64,
}

impl From<&CartLine> for CartRecord {
    fn from(line: &CartLine) -> Self {
        Self {
            line_id: Some(line.line_id.clone()),
            item: line.item.clone(),
            quantity: i64::from(line.quantity),
        }
    }
}

impl Collection for CartStore {
    const KIND: CollectionKind = CollectionKind::Cart;
    type Record = CartRecord;

    fn len(&self) -> usize {
        self.lines.len()
    }

    fn to_records(&self) -> Vec<CartRecord> {
        self.lines.iter().map(CartRecord::from).collect()
    }

    fn from_records(records: Vec<CartRecord>, loaded_at: DateTime<Utc>) -> Self {
        let discriminator = loaded_at.timestamp_millis();
        let lines = records
            .into_iter()
            .enumerate()
            .filter_map(|(position, record)| {
                let Ok(quantity) = u32::try_from(record.quantity) else {
                    warn!(product_id = %record.item.product_id, quantity = record.quantity, "Dropping stored cart line with invalid quantity");
                    return None;
                };
                if quantity == 0 {
                    warn!(product_id = %record.item.product_id, "Dropping stored cart line with zero quantity");
                    return None;
                }
                let line_id = record.line_id.unwrap_or_else(|| {
                    LineId::backfill(&record.item.product_id, discriminator, position)
                });
                Some(CartLine {
                    line_id,
                    item: record.item,
                    quantity,
                })
            })
            .collect();
        Self { lines }
    }
}
