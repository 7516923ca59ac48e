use crate::schema::{AggregateRow, Band, NormalizedData};

pub fn build_snapshot(row: &AggregateRow) -> NormalizedData {
    NormalizedData {
        top5: Band::new(row.buy_top5, row.sell_top5),
        top10: Band::new(row.buy_top10, row.sell_top10),
        oi: row.open_interest,
    }
}

/// Relations the exchange's own figures should satisfy. Violations are
/// reported, never corrected.
pub fn band_inconsistencies(row: &AggregateRow) -> Vec<String> {
    let mut issues = Vec::new();
    if row.buy_top10 < row.buy_top5 {
        issues.push(format!(
            "top-10 buy {} below top-5 buy {}",
            row.buy_top10, row.buy_top5
        ));
    }
    if row.sell_top10 < row.sell_top5 {
        issues.push(format!(
            "top-10 sell {} below top-5 sell {}",
            row.sell_top10, row.sell_top5
        ));
    }
    if row.open_interest > 0
        && (row.buy_top10 > row.open_interest || row.sell_top10 > row.open_interest)
    {
        issues.push(format!(
            "top-10 positions exceed open interest {}",
            row.open_interest
        ));
    }
    issues
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(b5: i64, s5: i64, b10: i64, s10: i64, oi: i64) -> AggregateRow {
        AggregateRow {
            buy_top5: b5,
            sell_top5: s5,
            buy_top10: b10,
            sell_top10: s10,
            open_interest: oi,
        }
    }

    #[test]
    fn test_build_snapshot() {
        let data = build_snapshot(&row(12_000, 5_000, 8_000, 3_000, 100_000));
        assert_eq!(data.top5, Band { buy: 12_000, sell: 5_000, net: 7_000 });
        assert_eq!(data.top10, Band { buy: 8_000, sell: 3_000, net: 5_000 });
        assert_eq!(data.oi, 100_000);
    }

    #[test]
    fn test_net_is_negative_when_sell_dominates() {
        for (b, s) in [(0, 1), (100, 2_500), (-5, 5)] {
            let data = build_snapshot(&row(b, s, b, s, 0));
            assert_eq!(data.top5.net, b - s);
            assert_eq!(data.top10.net, b - s);
            assert!(data.top5.net < 0);
        }
    }

    #[test]
    fn test_inconsistencies_are_surfaced() {
        // Same figures as the reference page: top-10 below top-5 on both sides.
        let issues = band_inconsistencies(&row(12_000, 5_000, 8_000, 3_000, 100_000));
        assert_eq!(issues.len(), 2);
        assert!(band_inconsistencies(&row(10, 10, 20, 20, 100)).is_empty());
        assert_eq!(band_inconsistencies(&row(10, 10, 200, 20, 100)).len(), 1);
    }
}
