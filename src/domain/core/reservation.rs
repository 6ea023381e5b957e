use bio::data_structures::interval_tree::IntervalTree;
use chrono::{DateTime, Duration, Utc};
use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::domain::{generate_id, prefixed_id, Aggregation, Entity, Event, EventQueue};

use super::{CarId, Period};

prefixed_id!(
    /// 予約ID
    ReservationId,
    "res"
);

/// 予約イベント
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReservationEvent {
    /// 予約が追加された
    ReservationAdded { reservation: Reservation },
    /// 予約が削除された
    ReservationDeleted { id: ReservationId },
    /// 予約一覧が初期データに戻された
    ReservationsReset { reservations: Vec<Reservation> },
}

impl Event for ReservationEvent {
    type Id = ReservationId;
}

/// 社用車の予約
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reservation {
    id: ReservationId,
    car_id: CarId,
    #[serde(flatten)]
    period: Period,
    employee_name: String,
    purpose: String,
}

impl Reservation {
    pub fn new(
        id: ReservationId,
        car_id: CarId,
        period: Period,
        employee_name: impl Into<String>,
        purpose: impl Into<String>,
    ) -> Self {
        Self {
            id,
            car_id,
            period,
            employee_name: employee_name.into(),
            purpose: purpose.into(),
        }
    }

    pub fn car_id(&self) -> CarId {
        self.car_id
    }

    pub fn period(&self) -> &Period {
        &self.period
    }

    pub fn employee_name(&self) -> &str {
        &self.employee_name
    }

    pub fn purpose(&self) -> &str {
        &self.purpose
    }
}

impl Entity for Reservation {
    type Id = ReservationId;

    const ENTITY_NAME: &'static str = "reservation";

    fn id(&self) -> Self::Id {
        self.id
    }
}

/// 追加前の予約内容（IDは未採番）
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewReservation {
    pub car_id: CarId,
    pub period: Period,
    pub employee_name: String,
    pub purpose: String,
}

/// 予約の集合。追加・削除・空き確認を受け持つ
#[derive(Clone, Debug, Default)]
pub struct ReservationStore {
    reservations: Vec<Reservation>,
    events: EventQueue<ReservationEvent>,
}

impl ReservationStore {
    pub fn new(reservations: Vec<Reservation>) -> Self {
        Self {
            reservations,
            ..Default::default()
        }
    }

    /// 予約を追加する。重なりの確認は呼び出し側の責務
    pub fn add(&mut self, candidate: NewReservation) -> Result<Reservation, ReservationError> {
        Self::validate_candidate(&candidate)?;
        let reservation = Reservation {
            id: self.next_id(),
            car_id: candidate.car_id,
            period: candidate.period,
            employee_name: candidate.employee_name,
            purpose: candidate.purpose,
        };
        self.insert(reservation.clone());
        Ok(reservation)
    }

    /// 空きを確認してから追加する
    pub fn reserve(&mut self, candidate: NewReservation) -> Result<Reservation, ReservationError> {
        Self::validate_candidate(&candidate)?;
        if !self.check_availability(candidate.car_id, &candidate.period, None) {
            warn!(car_id = %candidate.car_id, "予約が重複するため受け付けませんでした");
            return Err(ReservationError::Unavailable {
                car_id: candidate.car_id,
            });
        }
        self.add(candidate)
    }

    /// 予約を削除する。存在しないIDなら何もしない
    pub fn delete(&mut self, id: ReservationId) -> bool {
        let before = self.reservations.len();
        self.reservations.retain(|r| r.id != id);
        if self.reservations.len() == before {
            debug!(%id, "削除対象の予約がありません");
            return false;
        }
        debug!(%id, "予約を削除しました");
        self.events.push(ReservationEvent::ReservationDeleted { id });
        true
    }

    pub fn check_availability(
        &self,
        car_id: CarId,
        period: &Period,
        exclude_id: Option<ReservationId>,
    ) -> bool {
        self.conflicts(car_id, period, exclude_id).is_empty()
    }

    /// 指定期間と重なる同じ車の予約（開始順）
    pub fn conflicts(
        &self,
        car_id: CarId,
        period: &Period,
        exclude_id: Option<ReservationId>,
    ) -> Vec<&Reservation> {
        let tree = self
            .reservations
            .iter()
            .filter(|r| r.car_id == car_id && Some(r.id) != exclude_id)
            .map(|r| (r.period.range(), r))
            .collect::<IntervalTree<DateTime<Utc>, &Reservation>>();
        let mut conflicts = tree
            .find(period.range())
            .map(|entry| *entry.data())
            .filter(|r| r.period.overlaps(period))
            .collect::<Vec<_>>();
        conflicts.sort_by_key(|r| r.period.start());
        conflicts
    }

    /// 予約一覧を丸ごと置き換える
    pub fn reset(&mut self, reservations: Vec<Reservation>) {
        debug!(count = reservations.len(), "予約一覧を置き換えました");
        self.reservations = reservations.clone();
        self.events
            .push(ReservationEvent::ReservationsReset { reservations });
    }

    pub fn reservations(&self) -> &[Reservation] {
        &self.reservations
    }

    pub fn find(&self, id: ReservationId) -> Option<&Reservation> {
        self.reservations.iter().find(|r| r.id == id)
    }

    pub fn len(&self) -> usize {
        self.reservations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reservations.is_empty()
    }

    /// 終了前の予約（開始の早い順）
    pub fn upcoming(&self, now: DateTime<Utc>) -> Vec<&Reservation> {
        let mut upcoming = self
            .reservations
            .iter()
            .filter(|r| r.period.end() > now)
            .collect::<Vec<_>>();
        upcoming.sort_by_key(|r| r.period.start());
        upcoming
    }

    /// 終了済みの予約（開始の遅い順）
    pub fn past(&self, now: DateTime<Utc>) -> Vec<&Reservation> {
        let mut past = self
            .reservations
            .iter()
            .filter(|r| r.period.end() < now)
            .collect::<Vec<_>>();
        past.sort_by_key(|r| std::cmp::Reverse(r.period.start()));
        past
    }

    /// その時刻に使用中の予約
    pub fn active_at(&self, car_id: CarId, now: DateTime<Utc>) -> Option<&Reservation> {
        self.reservations
            .iter()
            .find(|r| r.car_id == car_id && r.period.surrounds(now))
    }

    /// `now` から `window` 以内に始まる予約（開始の早い順）
    pub fn starting_within(&self, now: DateTime<Utc>, window: Duration) -> Vec<&Reservation> {
        let until = now + window;
        let mut starting = self
            .reservations
            .iter()
            .filter(|r| now < r.period.start() && r.period.start() < until)
            .collect::<Vec<_>>();
        starting.sort_by_key(|r| r.period.start());
        starting
    }

    fn next_id(&self) -> ReservationId {
        loop {
            let id = generate_id();
            if self.find(id).is_none() {
                return id;
            }
        }
    }

    fn insert(&mut self, reservation: Reservation) {
        debug!(id = %reservation.id, car_id = %reservation.car_id, "予約を追加しました");
        self.reservations.push(reservation.clone());
        self.events
            .push(ReservationEvent::ReservationAdded { reservation });
    }

    fn validate_candidate(candidate: &NewReservation) -> Result<(), ReservationError> {
        Self::validate_employee_name(&candidate.employee_name)?;
        Self::validate_purpose(&candidate.purpose)
    }

    fn validate_employee_name(name: &str) -> Result<(), ReservationError> {
        match name.trim().is_empty() {
            true => Err(ReservationError::EmployeeNameRequired),
            false => Ok(()),
        }
    }

    fn validate_purpose(purpose: &str) -> Result<(), ReservationError> {
        match purpose.trim().is_empty() {
            true => Err(ReservationError::PurposeRequired),
            false => Ok(()),
        }
    }

    fn validate_not_duplicate(&self, id: ReservationId) -> Result<(), ReservationError> {
        match self.find(id) {
            Some(_) => Err(ReservationError::DuplicateId { id }),
            None => Ok(()),
        }
    }
}

impl Aggregation for ReservationStore {
    type Event = ReservationEvent;
    type Error = ReservationError;

    fn validate(&self, event: &Self::Event) -> Result<(), Self::Error> {
        match event {
            ReservationEvent::ReservationAdded { reservation } => {
                self.validate_not_duplicate(reservation.id)?;
                Self::validate_employee_name(&reservation.employee_name)?;
                Self::validate_purpose(&reservation.purpose)
            }
            ReservationEvent::ReservationDeleted { .. } => Ok(()),
            ReservationEvent::ReservationsReset { .. } => Ok(()),
        }
    }

    fn apply(&mut self, event: Self::Event) {
        if let Err(e) = self.validate(&event) {
            warn!("不正な予約イベントを読み飛ばしました: {}", e);
            return;
        }
        match event {
            ReservationEvent::ReservationAdded { reservation } => self.insert(reservation),
            ReservationEvent::ReservationDeleted { id } => {
                self.delete(id);
            }
            ReservationEvent::ReservationsReset { reservations } => self.reset(reservations),
        }
    }

    fn events(&self) -> &EventQueue<Self::Event> {
        &self.events
    }

    fn events_mut(&mut self) -> &mut EventQueue<Self::Event> {
        &mut self.events
    }
}

/// 予約エラー
#[derive(Error, Display, Debug)]
pub enum ReservationError {
    /// 必須項目が空です
    #[display(fmt = "Required field is missing: {}", field)]
    MissingField { field: &'static str },
    /// 日時の形式が不正です
    #[display(fmt = "Invalid timestamp for {}: {:?}", field, value)]
    InvalidTimestamp { field: &'static str, value: String },
    /// 終了が開始より後ではありません
    #[display(fmt = "End date must be after start date")]
    EndNotAfterStart,
    /// 社員名が指定されていません
    #[display(fmt = "Employee name is not specified")]
    EmployeeNameRequired,
    /// 目的が指定されていません
    #[display(fmt = "Purpose is not specified")]
    PurposeRequired,
    /// カタログに無い車です
    #[display(fmt = "Unknown car: {}", car_id)]
    UnknownCar { car_id: CarId },
    /// 指定期間は予約済みです
    #[display(fmt = "{} is not available during the selected time period", car_id)]
    Unavailable { car_id: CarId },
    /// IDが重複しています
    #[display(fmt = "Duplicate reservation id: {}", id)]
    DuplicateId { id: ReservationId },
}
