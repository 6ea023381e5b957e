use chrono::NaiveDate;
use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::domain::{prefixed_id, Aggregation, Entity, Event, EventQueue};

use super::Money;

prefixed_id!(
    /// 著者支払ID
    PaymentId,
    "ap"
);

/// 支払ステータス
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    /// 支払済み
    Paid,
    /// 支払予定
    Due,
    /// 期限超過
    Overdue,
}

impl PaymentStatus {
    /// 一覧での並び順（期限超過が先頭）
    fn priority(&self) -> u8 {
        match self {
            PaymentStatus::Overdue => 0,
            PaymentStatus::Due => 1,
            PaymentStatus::Paid => 2,
        }
    }
}

/// 支払イベント
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentEvent {
    /// ステータスが変更された
    StatusChanged {
        id: PaymentId,
        status: PaymentStatus,
        paid_date: Option<NaiveDate>,
    },
    /// 支払一覧が初期データに戻された
    PaymentsReset { payments: Vec<AuthorPayment> },
}

impl Event for PaymentEvent {
    type Id = PaymentId;
}

/// 著者への印税支払
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorPayment {
    id: PaymentId,
    author_name: String,
    book_title: String,
    amount_due: Money,
    status: PaymentStatus,
    due_date: NaiveDate,
    paid_date: Option<NaiveDate>,
}

impl AuthorPayment {
    pub fn new(
        id: PaymentId,
        author_name: impl Into<String>,
        book_title: impl Into<String>,
        amount_due: Money,
        status: PaymentStatus,
        due_date: NaiveDate,
        paid_date: Option<NaiveDate>,
    ) -> Self {
        Self {
            id,
            author_name: author_name.into(),
            book_title: book_title.into(),
            amount_due,
            status,
            due_date,
            paid_date,
        }
    }

    pub fn author_name(&self) -> &str {
        &self.author_name
    }

    pub fn book_title(&self) -> &str {
        &self.book_title
    }

    pub fn amount_due(&self) -> Money {
        self.amount_due
    }

    pub fn status(&self) -> PaymentStatus {
        self.status
    }

    pub fn due_date(&self) -> NaiveDate {
        self.due_date
    }

    pub fn paid_date(&self) -> Option<NaiveDate> {
        self.paid_date
    }
}

impl Entity for AuthorPayment {
    type Id = PaymentId;

    const ENTITY_NAME: &'static str = "author_payment";

    fn id(&self) -> Self::Id {
        self.id
    }
}

/// 著者支払の台帳
#[derive(Clone, Debug, Default)]
pub struct PaymentLedger {
    payments: Vec<AuthorPayment>,
    events: EventQueue<PaymentEvent>,
}

impl PaymentLedger {
    pub fn new(payments: Vec<AuthorPayment>) -> Self {
        Self {
            payments,
            ..Default::default()
        }
    }

    pub fn update_status(
        &mut self,
        id: PaymentId,
        status: PaymentStatus,
        paid_date: Option<NaiveDate>,
    ) -> Result<(), PaymentError> {
        self.validate_status_changed(&id, &status, &paid_date)?;
        self.payments
            .iter_mut()
            .filter(|p| p.id == id)
            .for_each(|p| {
                p.status = status;
                p.paid_date = paid_date;
            });
        debug!(%id, ?status, "支払ステータスを変更しました");
        self.events.push(PaymentEvent::StatusChanged {
            id,
            status,
            paid_date,
        });
        Ok(())
    }

    pub fn mark_paid(&mut self, id: PaymentId, today: NaiveDate) -> Result<(), PaymentError> {
        self.update_status(id, PaymentStatus::Paid, Some(today))
    }

    pub fn mark_due(&mut self, id: PaymentId) -> Result<(), PaymentError> {
        self.update_status(id, PaymentStatus::Due, None)
    }

    pub fn reset(&mut self, payments: Vec<AuthorPayment>) {
        self.payments = payments.clone();
        self.events.push(PaymentEvent::PaymentsReset { payments });
    }

    pub fn payments(&self) -> &[AuthorPayment] {
        &self.payments
    }

    pub fn find(&self, id: PaymentId) -> Option<&AuthorPayment> {
        self.payments.iter().find(|p| p.id == id)
    }

    /// 未払（支払済み以外）の合計
    pub fn outstanding_total(&self) -> Money {
        self.total(|p| p.status != PaymentStatus::Paid)
    }

    pub fn overdue_total(&self) -> Money {
        self.total(|p| p.status == PaymentStatus::Overdue)
    }

    pub fn paid_total(&self) -> Money {
        self.total(|p| p.status == PaymentStatus::Paid)
    }

    pub fn count(&self, status: PaymentStatus) -> usize {
        self.payments.iter().filter(|p| p.status == status).count()
    }

    /// 期限超過・支払予定・支払済みの順、同じステータス内は期日の早い順
    pub fn sorted(&self) -> Vec<&AuthorPayment> {
        let mut sorted = self.payments.iter().collect::<Vec<_>>();
        sorted.sort_by_key(|p| (p.status.priority(), p.due_date));
        sorted
    }

    fn total(&self, predicate: impl Fn(&AuthorPayment) -> bool) -> Money {
        Money::eur(
            self.payments
                .iter()
                .filter(|p| predicate(p))
                .map(|p| p.amount_due.amount())
                .sum(),
        )
    }

    fn validate_status_changed(
        &self,
        id: &PaymentId,
        status: &PaymentStatus,
        paid_date: &Option<NaiveDate>,
    ) -> Result<(), PaymentError> {
        if self.find(*id).is_none() {
            return Err(PaymentError::NotFound { id: *id });
        }
        match (status, paid_date) {
            (PaymentStatus::Paid, None) => Err(PaymentError::PaidDateRequired),
            (PaymentStatus::Due | PaymentStatus::Overdue, Some(_)) => {
                Err(PaymentError::UnexpectedPaidDate)
            }
            _ => Ok(()),
        }
    }
}

impl Aggregation for PaymentLedger {
    type Event = PaymentEvent;
    type Error = PaymentError;

    fn validate(&self, event: &Self::Event) -> Result<(), Self::Error> {
        match event {
            PaymentEvent::StatusChanged {
                id,
                status,
                paid_date,
            } => self.validate_status_changed(id, status, paid_date),
            PaymentEvent::PaymentsReset { .. } => Ok(()),
        }
    }

    fn apply(&mut self, event: Self::Event) {
        match event {
            PaymentEvent::StatusChanged {
                id,
                status,
                paid_date,
            } => {
                if let Err(e) = self.update_status(id, status, paid_date) {
                    warn!("不正な支払イベントを読み飛ばしました: {}", e);
                }
            }
            PaymentEvent::PaymentsReset { payments } => self.reset(payments),
        }
    }

    fn events(&self) -> &EventQueue<Self::Event> {
        &self.events
    }

    fn events_mut(&mut self) -> &mut EventQueue<Self::Event> {
        &mut self.events
    }
}

/// 支払エラー
#[derive(Error, Display, Debug)]
pub enum PaymentError {
    /// 支払が見つかりません
    #[display(fmt = "Payment not found: {}", id)]
    NotFound { id: PaymentId },
    /// 支払済みには支払日が必要です
    #[display(fmt = "Paid date is required for paid status")]
    PaidDateRequired,
    /// 未払のステータスに支払日は指定できません
    #[display(fmt = "Paid date is only allowed for paid status")]
    UnexpectedPaidDate,
}

#[cfg(test)]
mod tests {
    use crate::application::demo;

    use super::*;

    fn ledger() -> PaymentLedger {
        PaymentLedger::new(demo::author_payments())
    }

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn test_totals() {
        let ledger = ledger();
        assert_eq!(ledger.outstanding_total(), Money::eur(2800 + 4200 + 3100 + 3800));
        assert_eq!(ledger.overdue_total(), Money::eur(3100));
        assert_eq!(ledger.paid_total(), Money::eur(3500 + 5000));
        assert_eq!(ledger.count(PaymentStatus::Paid), 2);
        assert_eq!(ledger.count(PaymentStatus::Due), 3);
        assert_eq!(ledger.count(PaymentStatus::Overdue), 1);
    }

    #[test]
    fn test_sorted_by_priority_then_due_date() {
        let ledger = ledger();
        let ids = ledger
            .sorted()
            .iter()
            .map(|p| p.id().to_string())
            .collect::<Vec<_>>();
        assert_eq!(ids, vec!["ap-4", "ap-2", "ap-3", "ap-6", "ap-5", "ap-1"]);
    }

    #[test]
    fn test_mark_paid_and_due() {
        let mut ledger = ledger();
        let id = PaymentId::from(4);
        ledger.mark_paid(id, date("2025-12-18")).unwrap();
        let payment = ledger.find(id).unwrap();
        assert_eq!(payment.status(), PaymentStatus::Paid);
        assert_eq!(payment.paid_date(), Some(date("2025-12-18")));
        assert_eq!(ledger.overdue_total(), Money::eur(0));

        ledger.mark_due(id).unwrap();
        let payment = ledger.find(id).unwrap();
        assert_eq!(payment.status(), PaymentStatus::Due);
        assert_eq!(payment.paid_date(), None);
        assert_eq!(ledger.pop_all().len(), 2);
    }

    #[test]
    fn test_update_status_validation() {
        let mut ledger = ledger();
        assert!(matches!(
            ledger.update_status(PaymentId::from(99), PaymentStatus::Due, None),
            Err(PaymentError::NotFound { .. })
        ));
        assert!(matches!(
            ledger.update_status(PaymentId::from(2), PaymentStatus::Paid, None),
            Err(PaymentError::PaidDateRequired)
        ));
        assert!(matches!(
            ledger.update_status(PaymentId::from(2), PaymentStatus::Overdue, Some(date("2025-12-01"))),
            Err(PaymentError::UnexpectedPaidDate)
        ));
        assert!(ledger.peek().is_none());
        assert_eq!(ledger.payments(), demo::author_payments().as_slice());
    }

    #[test]
    fn test_replay_status_change() {
        let mut ledger = ledger();
        ledger.mark_paid(PaymentId::from(2), date("2025-12-10")).unwrap();
        let mut replayed = self::ledger();
        for event in ledger.pop_all() {
            replayed.apply(event);
        }
        assert_eq!(replayed.payments(), ledger.payments());
    }

    #[test]
    fn test_payment_serde_shape() {
        let payment = ledger().find(PaymentId::from(1)).unwrap().clone();
        let json = serde_json::to_value(&payment).unwrap();
        assert_eq!(json["id"], "ap-1");
        assert_eq!(json["status"], "paid");
        assert_eq!(json["dueDate"], "2025-11-30");
        assert_eq!(json["paidDate"], "2025-11-28");
        assert_eq!(serde_json::from_value::<AuthorPayment>(json).unwrap(), payment);
    }
}
