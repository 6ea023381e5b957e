use chrono::{DateTime, Duration, Utc};

use super::core::{Money, PaymentLedger, PaymentStatus, ReservationStore, SalesRecord, YearMonth};

/// ダッシュボードの「直近」とみなす日数
pub const UPCOMING_WINDOW_DAYS: i64 = 7;

/// ダッシュボードの集計値
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DashboardSummary {
    pub total_sales: Money,
    pub current_month: YearMonth,
    pub current_month_sales: Money,
    pub outstanding_payments: Money,
    pub overdue_payments: usize,
    pub upcoming_reservations: usize,
    pub total_reservations: usize,
    pub payments_paid: usize,
    pub payments_due: usize,
    pub payments_overdue: usize,
}

impl DashboardSummary {
    pub fn collect(
        reservations: &ReservationStore,
        sales: &[SalesRecord],
        payments: &PaymentLedger,
        now: DateTime<Utc>,
    ) -> Self {
        let current_month = YearMonth::of(now.date_naive());
        Self {
            total_sales: Money::eur(sales.iter().map(|r| r.revenue().amount()).sum()),
            current_month,
            current_month_sales: Money::eur(
                sales
                    .iter()
                    .filter(|r| r.month() == current_month)
                    .map(|r| r.revenue().amount())
                    .sum(),
            ),
            outstanding_payments: payments.outstanding_total(),
            overdue_payments: payments.count(PaymentStatus::Overdue),
            upcoming_reservations: reservations
                .starting_within(now, Duration::days(UPCOMING_WINDOW_DAYS))
                .len(),
            total_reservations: reservations.len(),
            payments_paid: payments.count(PaymentStatus::Paid),
            payments_due: payments.count(PaymentStatus::Due),
            payments_overdue: payments.count(PaymentStatus::Overdue),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use crate::application::demo;

    use super::*;

    #[test]
    fn test_collect_demo_summary() {
        let now = Utc.with_ymd_and_hms(2025, 12, 16, 12, 0, 0).unwrap();
        let summary = DashboardSummary::collect(
            &ReservationStore::new(demo::reservations()),
            &demo::sales_records(),
            &PaymentLedger::new(demo::author_payments()),
            now,
        );
        assert_eq!(summary.total_sales, Money::eur(18770));
        assert_eq!(summary.current_month.to_string(), "2025-12");
        assert_eq!(summary.current_month_sales, Money::eur(10480));
        assert_eq!(summary.outstanding_payments, Money::eur(13900));
        assert_eq!(summary.overdue_payments, 1);
        assert_eq!(summary.upcoming_reservations, 4);
        assert_eq!(summary.total_reservations, 4);
        assert_eq!(
            (summary.payments_paid, summary.payments_due, summary.payments_overdue),
            (2, 3, 1)
        );
    }

    #[test]
    fn test_upcoming_window_excludes_started_and_distant() {
        let now = Utc.with_ymd_and_hms(2025, 12, 18, 8, 0, 0).unwrap();
        let summary = DashboardSummary::collect(
            &ReservationStore::new(demo::reservations()),
            &[],
            &PaymentLedger::default(),
            now,
        );
        assert_eq!(summary.upcoming_reservations, 2);
        assert_eq!(summary.total_sales, Money::eur(0));
    }
}
