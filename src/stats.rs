use serde::Serialize;

use crate::constants::ITEM_COLUMNS;
use crate::store::HackRecord;

/// Aggregate totals over the whole record sequence.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Stats {
    pub total_hacks: u64,
    pub total_items: u64,
    pub avg_items_per_hack: f64,
    pub total_records: usize,
}

/// Per-item breakdown row; only columns with a non-zero total are reported.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemStats {
    pub column: String,
    pub total: u64,
    pub percentage: f64,
    pub avg_per_hack: f64,
}

/// Fold the record sequence into totals. Pure; an empty sequence yields all
/// zeros rather than dividing by zero.
pub fn aggregate(records: &[HackRecord]) -> Stats {
    let total_hacks: u64 = records.iter().map(|r| u64::from(r.hack_count())).sum();
    let total_items: u64 = records.iter().map(|r| r.total_items()).sum();
    let avg_items_per_hack = if total_hacks > 0 {
        round2(total_items as f64 / total_hacks as f64)
    } else {
        0.0
    };

    Stats {
        total_hacks,
        total_items,
        avg_items_per_hack,
        total_records: records.len(),
    }
}

/// Per-column totals, share of all items, and average yield per hack.
pub fn item_stats(records: &[HackRecord]) -> Vec<ItemStats> {
    let totals = aggregate(records);

    ITEM_COLUMNS
        .iter()
        .filter_map(|column| {
            let total: u64 = records.iter().map(|r| r.item(column)).sum();
            if total == 0 {
                return None;
            }
            let percentage = if totals.total_items > 0 {
                round2(total as f64 / totals.total_items as f64 * 100.0)
            } else {
                0.0
            };
            let avg_per_hack = if totals.total_hacks > 0 {
                round2(total as f64 / totals.total_hacks as f64)
            } else {
                0.0
            };
            Some(ItemStats {
                column: column.to_string(),
                total,
                percentage,
                avg_per_hack,
            })
        })
        .collect()
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
