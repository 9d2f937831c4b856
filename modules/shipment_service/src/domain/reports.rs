//! Report aggregate arithmetic
//!
//! Pure rollup computations for the donor×shipment and donor×category
//! materialized aggregates. The service fetches the inputs and stores the
//! results; keeping the arithmetic here makes it testable without storage.

use crate::contract::{DonorCategoryData, DonorShipmentData, PackageItem};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::HashSet;

/// Compute the donor×shipment rollup from the items attributed to the pair.
///
/// Returns None when there are no items, which the caller must translate
/// into deleting the aggregate row.
pub fn donor_shipment_rollup(
    donor_id: Option<i64>,
    shipment_id: i64,
    items: &[PackageItem],
    total_shipment_items: usize,
    received_package_ids: &HashSet<i64>,
) -> Option<DonorShipmentData> {
    if items.is_empty() {
        return None;
    }
    let package_ids: HashSet<i64> = items.iter().map(|i| i.package_id).collect();
    let delivered_count = items
        .iter()
        .filter(|i| received_package_ids.contains(&i.package_id))
        .count() as u32;
    let percentage = if total_shipment_items > 0 {
        (Decimal::from(items.len()) / Decimal::from(total_shipment_items)).round_dp(4)
    } else {
        Decimal::ZERO
    };
    Some(DonorShipmentData {
        donor_id,
        shipment_id,
        package_count: package_ids.len() as u32,
        item_count: items.len() as u32,
        delivered_count,
        percentage_of_shipment: percentage,
        price_usd: items.iter().map(PackageItem::extended_price_usd).sum(),
        price_local: items.iter().map(PackageItem::extended_price_local).sum(),
    })
}

/// Compute the donor×category rollup from the items attributed to the pair.
///
/// `shipment_dates` are the shipment dates of every shipment containing at
/// least one of the items. Returns None when there are no items.
pub fn donor_category_rollup(
    donor_id: Option<i64>,
    category_id: Option<i64>,
    items: &[PackageItem],
    shipment_dates: &[NaiveDate],
) -> Option<DonorCategoryData> {
    if items.is_empty() {
        return None;
    }
    Some(DonorCategoryData {
        donor_id,
        category_id,
        item_count: items.len() as u32,
        total_quantity: items.iter().map(|i| i.quantity as u64).sum(),
        price_usd: items.iter().map(PackageItem::extended_price_usd).sum(),
        price_local: items.iter().map(PackageItem::extended_price_local).sum(),
        first_date_shipped: shipment_dates.iter().min().copied(),
        last_date_shipped: shipment_dates.iter().max().copied(),
    })
}

/// Donor summary for a shipment: the single donor name when every item with
/// a donor shares one, "Multiple" for more than one, "None" otherwise.
pub fn donor_summary(donor_names: &HashSet<String>) -> String {
    match donor_names.len() {
        0 => "None".to_string(),
        1 => donor_names.iter().next().cloned().unwrap_or_default(),
        _ => "Multiple".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn item(package_id: i64, quantity: i32, price_usd: &str) -> PackageItem {
        PackageItem {
            id: 0,
            package_id,
            catalog_item_id: None,
            description: "Blanket".to_string(),
            unit: "each".to_string(),
            price_usd: price_usd.parse().unwrap(),
            price_local: Decimal::ZERO,
            item_category_id: Some(1),
            donor_id: Some(1),
            supplier_id: None,
            weight_grams: None,
            quantity,
        }
    }

    #[test]
    fn empty_item_set_yields_no_rollup() {
        assert!(donor_shipment_rollup(Some(1), 1, &[], 0, &HashSet::new()).is_none());
        assert!(donor_category_rollup(Some(1), Some(1), &[], &[]).is_none());
    }

    #[test]
    fn shipment_rollup_counts_and_prices() {
        let items = vec![item(1, 2, "3.50"), item(1, 1, "1.00"), item(2, 4, "0.25")];
        let received: HashSet<i64> = [2].into_iter().collect();
        let data = donor_shipment_rollup(Some(1), 7, &items, 6, &received).unwrap();
        assert_eq!(data.package_count, 2);
        assert_eq!(data.item_count, 3);
        assert_eq!(data.delivered_count, 1);
        assert_eq!(data.percentage_of_shipment, "0.5".parse::<Decimal>().unwrap());
        assert_eq!(data.price_usd, "9.00".parse::<Decimal>().unwrap());
    }

    #[test]
    fn category_rollup_spans_shipment_dates() {
        let items = vec![item(1, 2, "3.50"), item(2, 3, "1.00")];
        let dates = vec![
            NaiveDate::from_ymd_opt(2015, 3, 1).unwrap(),
            NaiveDate::from_ymd_opt(2014, 12, 25).unwrap(),
        ];
        let data = donor_category_rollup(Some(1), Some(1), &items, &dates).unwrap();
        assert_eq!(data.total_quantity, 5);
        assert_eq!(data.first_date_shipped, dates.last().copied());
        assert_eq!(data.last_date_shipped, dates.first().copied());
    }

    #[test]
    fn donor_summary_names() {
        assert_eq!(donor_summary(&HashSet::new()), "None");
        let one: HashSet<String> = ["ECHO".to_string()].into_iter().collect();
        assert_eq!(donor_summary(&one), "ECHO");
        let two: HashSet<String> = ["ECHO".to_string(), "OFDA".to_string()].into_iter().collect();
        assert_eq!(donor_summary(&two), "Multiple");
    }
}
