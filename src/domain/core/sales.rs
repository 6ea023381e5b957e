use std::collections::BTreeMap;

use chrono::{Datelike, Month, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::domain::{prefixed_id, Entity};

use super::{CurrentUser, Money};

prefixed_id!(
    /// 売上ID
    SalesRecordId,
    "s"
);

/// 売上実績
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesRecord {
    id: SalesRecordId,
    rep_name: String,
    product_name: String,
    quantity: u32,
    revenue: Money,
    date: NaiveDate,
}

impl SalesRecord {
    pub fn new(
        id: SalesRecordId,
        rep_name: impl Into<String>,
        product_name: impl Into<String>,
        quantity: u32,
        revenue: Money,
        date: NaiveDate,
    ) -> Self {
        Self {
            id,
            rep_name: rep_name.into(),
            product_name: product_name.into(),
            quantity,
            revenue,
            date,
        }
    }

    pub fn rep_name(&self) -> &str {
        &self.rep_name
    }

    pub fn product_name(&self) -> &str {
        &self.product_name
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    pub fn revenue(&self) -> Money {
        self.revenue
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    /// `YYYY-MM`
    pub fn month(&self) -> YearMonth {
        YearMonth::of(self.date)
    }
}

impl Entity for SalesRecord {
    type Id = SalesRecordId;

    const ENTITY_NAME: &'static str = "sales_record";

    fn id(&self) -> Self::Id {
        self.id
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn name(&self) -> &'static str {
        u8::try_from(self.month)
            .ok()
            .and_then(|m| Month::try_from(m).ok())
            .map(|m| m.name())
            .unwrap_or("Unknown")
    }
}

impl std::fmt::Display for YearMonth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// 月別売上
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MonthlySales {
    pub month: YearMonth,
    pub revenue: Money,
    pub quantity: u64,
}

/// 商品別売上
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProductSales {
    pub product: String,
    pub revenue: Money,
    pub quantity: u64,
}

/// 担当者別売上
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RepSales {
    pub name: String,
    pub revenue: Money,
    pub quantity: u64,
    pub transactions: u32,
}

impl RepSales {
    /// 1件あたりの平均売上（四捨五入）
    pub fn average_sale(&self) -> i64 {
        if self.transactions == 0 {
            return 0;
        }
        (self.revenue.amount() as f64 / f64::from(self.transactions)).round() as i64
    }

    pub fn performance(&self) -> PerformanceLevel {
        match self.average_sale() {
            avg if avg > 15000 => PerformanceLevel::Excellent,
            avg if avg > 10000 => PerformanceLevel::Good,
            _ => PerformanceLevel::Standard,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PerformanceLevel {
    Excellent,
    Good,
    Standard,
}

/// 売上レポート
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SalesReport {
    pub total_revenue: Money,
    pub total_quantity: u64,
    pub by_month: Vec<MonthlySales>,
    pub by_product: Vec<ProductSales>,
    /// マネージャーのみ
    pub by_rep: Vec<RepSales>,
}

impl SalesReport {
    /// 営業担当は自分の実績のみ、マネージャーは全体と担当者別を集計する
    pub fn for_user(records: &[SalesRecord], user: &CurrentUser) -> Self {
        let relevant = records
            .iter()
            .filter(|r| user.is_manager() || r.rep_name == user.name)
            .collect::<Vec<_>>();

        let mut by_month = BTreeMap::<YearMonth, MonthlySales>::new();
        let mut by_product = Vec::<ProductSales>::new();
        for record in &relevant {
            let month = by_month.entry(record.month()).or_insert_with(|| MonthlySales {
                month: record.month(),
                revenue: Money::eur(0),
                quantity: 0,
            });
            month.revenue = Money::eur(month.revenue.amount() + record.revenue.amount());
            month.quantity += u64::from(record.quantity);

            match by_product.iter_mut().find(|p| p.product == record.product_name) {
                Some(product) => {
                    product.revenue =
                        Money::eur(product.revenue.amount() + record.revenue.amount());
                    product.quantity += u64::from(record.quantity);
                }
                None => by_product.push(ProductSales {
                    product: record.product_name.clone(),
                    revenue: record.revenue,
                    quantity: u64::from(record.quantity),
                }),
            }
        }
        by_product.sort_by_key(|p| std::cmp::Reverse(p.revenue.amount()));

        let by_rep = match user.is_manager() {
            true => Self::by_rep(records),
            false => Vec::new(),
        };

        Self {
            total_revenue: Money::eur(relevant.iter().map(|r| r.revenue.amount()).sum()),
            total_quantity: relevant.iter().map(|r| u64::from(r.quantity)).sum(),
            by_month: by_month.into_values().collect(),
            by_product,
            by_rep,
        }
    }

    fn by_rep(records: &[SalesRecord]) -> Vec<RepSales> {
        let mut reps = Vec::<RepSales>::new();
        for record in records {
            match reps.iter_mut().find(|r| r.name == record.rep_name) {
                Some(rep) => {
                    rep.revenue = Money::eur(rep.revenue.amount() + record.revenue.amount());
                    rep.quantity += u64::from(record.quantity);
                    rep.transactions += 1;
                }
                None => reps.push(RepSales {
                    name: record.rep_name.clone(),
                    revenue: record.revenue,
                    quantity: u64::from(record.quantity),
                    transactions: 1,
                }),
            }
        }
        reps.sort_by_key(|r| std::cmp::Reverse(r.revenue.amount()));
        reps
    }
}
