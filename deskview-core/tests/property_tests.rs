//! Property tests for validation and formatting invariants.
//!
//! 1. Target ids inside `1..=latest` are accepted and returned unchanged
//! 2. Everything outside that range is rejected
//! 3. Money columns always carry exactly two decimals
//! 4. Table rows have one cell per header

use proptest::prelude::*;
use deskview_core::format::table_rows;
use deskview_core::{
    format_money, validate_target_id, EventId, PositionRecord, TableRow, ValidationError,
};

proptest! {
    #[test]
    fn in_range_targets_are_accepted(latest in 1u64..1_000_000, frac in 0.0..1.0_f64) {
        let candidate = 1 + ((latest - 1) as f64 * frac) as u64;
        let got = validate_target_id(&candidate.to_string(), Some(EventId(latest)));
        prop_assert_eq!(got, Ok(EventId(candidate)));
    }

    #[test]
    fn above_latest_is_rejected(latest in 1u64..1_000_000, over in 1u64..1_000) {
        let candidate = latest + over;
        let got = validate_target_id(&candidate.to_string(), Some(EventId(latest)));
        let is_above = matches!(got, Err(ValidationError::AboveLatest { .. }));
        prop_assert!(is_above);
    }

    #[test]
    fn non_positive_is_rejected(latest in 1u64..1_000, candidate in -1_000_000i64..=0) {
        let got = validate_target_id(&candidate.to_string(), Some(EventId(latest)));
        prop_assert_eq!(got, Err(ValidationError::NotPositive(candidate)));
    }

    #[test]
    fn money_has_exactly_two_decimals(value in -1e12..1e12_f64) {
        let s = format_money(value);
        let (_, decimals) = s.split_once('.').expect("decimal point");
        prop_assert_eq!(decimals.len(), 2);
        prop_assert!(decimals.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn row_count_matches_record_count(n in 0usize..50, nv in -1e6..1e6_f64) {
        let records: Vec<PositionRecord> = (0..n)
            .map(|i| PositionRecord {
                desk: format!("DK{i:02}"),
                trader: "TR01".into(),
                book: "BK01".into(),
                position: i as f64,
                nv,
            })
            .collect();
        let rows = table_rows(&records);
        prop_assert_eq!(rows.len(), n);
        for row in &rows {
            prop_assert_eq!(row.len(), PositionRecord::HEADERS.len());
            prop_assert_eq!(&row[4], &format_money(nv));
        }
    }
}
