//! アプリケーション全体の状態
//!
//! すべてのコレクションとストレージを1つの `AppState` にまとめ、変更は必ずここを経由させる。
//! 変更操作の最後に `persist` で未保存のイベントを確認し、変わったコレクションだけを
//! スナップショットとして書き戻す。

pub mod demo;

use chrono::{DateTime, NaiveDate, Utc};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::domain::core::{
    AuthorPayment, Car, CarCatalog, CarId, CurrentUser, Employee, NewReservation, PaymentError,
    PaymentId, PaymentLedger, PaymentStatus, Period, Reservation, ReservationError, ReservationId,
    ReservationStore, Role, SalesRecord, SalesReport,
};
use crate::domain::dashboard::DashboardSummary;
use crate::domain::{Aggregation, DataAccessError, Storage};
use crate::infrastructure::{load_snapshot, save_snapshot};

pub const CURRENT_USER_KEY: &str = "currentUser";
pub const RESERVATIONS_KEY: &str = "carReservations";
pub const SALES_KEY: &str = "salesRecords";
pub const PAYMENTS_KEY: &str = "authorPayments";

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Reservation(#[from] ReservationError),
    #[error(transparent)]
    Payment(#[from] PaymentError),
    #[error(transparent)]
    DataAccess(#[from] DataAccessError),
    #[error("This operation is only available to managers")]
    ManagerOnly,
    #[error("No employee with role {0:?}")]
    NoEmployeeWithRole(Role),
}

pub struct AppState<S: Storage> {
    storage: S,
    catalog: CarCatalog,
    employees: Vec<Employee>,
    current_user: CurrentUser,
    reservations: ReservationStore,
    sales: Vec<SalesRecord>,
    payments: PaymentLedger,
    sales_changed: bool,
    user_changed: bool,
}

impl<S: Storage> AppState<S> {
    /// 保存済みのスナップショットを読み込む。無いものはデモデータで始める
    pub fn open(storage: S) -> Result<Self, AppError> {
        let current_user: CurrentUser =
            load_snapshot(&storage, CURRENT_USER_KEY)?.unwrap_or_default();
        let reservations: Vec<Reservation> =
            load_snapshot(&storage, RESERVATIONS_KEY)?.unwrap_or_else(demo::reservations);
        let sales: Vec<SalesRecord> =
            load_snapshot(&storage, SALES_KEY)?.unwrap_or_else(demo::sales_records);
        let payments: Vec<AuthorPayment> =
            load_snapshot(&storage, PAYMENTS_KEY)?.unwrap_or_else(demo::author_payments);
        let state = Self {
            storage,
            catalog: CarCatalog::new(demo::cars()),
            employees: demo::employees(),
            current_user,
            reservations: ReservationStore::new(reservations),
            sales,
            payments: PaymentLedger::new(payments),
            sales_changed: false,
            user_changed: false,
        };
        info!(
            reservations = state.reservations.len(),
            sales = state.sales.len(),
            payments = state.payments.payments().len(),
            "状態を読み込みました"
        );
        Ok(state)
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn cars(&self) -> &[Car] {
        self.catalog.cars()
    }

    pub fn employees(&self) -> &[Employee] {
        &self.employees
    }

    pub fn current_user(&self) -> &CurrentUser {
        &self.current_user
    }

    pub fn reservations(&self) -> &ReservationStore {
        &self.reservations
    }

    pub fn sales_records(&self) -> &[SalesRecord] {
        &self.sales
    }

    pub fn payments(&self) -> &PaymentLedger {
        &self.payments
    }

    pub fn add_reservation(&mut self, candidate: NewReservation) -> Result<Reservation, AppError> {
        self.validate_car(candidate.car_id)?;
        let reservation = self.reservations.add(candidate)?;
        self.persist()?;
        Ok(reservation)
    }

    /// 操作中のユーザーとして、空きを確認したうえで予約する
    pub fn book(
        &mut self,
        car_id: CarId,
        period: Period,
        purpose: impl Into<String>,
    ) -> Result<Reservation, AppError> {
        self.validate_car(car_id)?;
        let reservation = self.reservations.reserve(NewReservation {
            car_id,
            period,
            employee_name: self.current_user.name.clone(),
            purpose: purpose.into(),
        })?;
        self.persist()?;
        Ok(reservation)
    }

    pub fn delete_reservation(&mut self, id: ReservationId) -> Result<bool, AppError> {
        let deleted = self.reservations.delete(id);
        self.persist()?;
        Ok(deleted)
    }

    pub fn check_availability(
        &self,
        car_id: CarId,
        period: &Period,
        exclude_id: Option<ReservationId>,
    ) -> bool {
        self.reservations.check_availability(car_id, period, exclude_id)
    }

    pub fn update_payment_status(
        &mut self,
        id: PaymentId,
        status: PaymentStatus,
        paid_date: Option<NaiveDate>,
    ) -> Result<&AuthorPayment, AppError> {
        self.require_manager()?;
        self.payments.update_status(id, status, paid_date)?;
        self.persist()?;
        self.payments
            .find(id)
            .ok_or(AppError::Payment(PaymentError::NotFound { id }))
    }

    pub fn mark_payment_paid(&mut self, id: PaymentId, today: NaiveDate) -> Result<(), AppError> {
        self.update_payment_status(id, PaymentStatus::Paid, Some(today))
            .map(|_| ())
    }

    pub fn mark_payment_due(&mut self, id: PaymentId) -> Result<(), AppError> {
        self.update_payment_status(id, PaymentStatus::Due, None)
            .map(|_| ())
    }

    /// その役割を持つ最初の社員に切り替える
    pub fn switch_role(&mut self, role: Role) -> Result<&CurrentUser, AppError> {
        let user = CurrentUser::switch_to(&self.employees, role)
            .ok_or(AppError::NoEmployeeWithRole(role))?;
        info!(name = %user.name, ?role, "ユーザーを切り替えました");
        self.current_user = user;
        self.user_changed = true;
        self.persist()?;
        Ok(&self.current_user)
    }

    /// 予約・売上・支払をデモデータに戻す（操作中のユーザーはそのまま）
    pub fn reset_demo_data(&mut self) -> Result<(), AppError> {
        info!("デモデータに戻します");
        self.reservations.reset(demo::reservations());
        self.sales = demo::sales_records();
        self.sales_changed = true;
        self.payments.reset(demo::author_payments());
        self.persist()
    }

    pub fn sales_report(&self) -> SalesReport {
        SalesReport::for_user(&self.sales, &self.current_user)
    }

    pub fn dashboard(&self, now: DateTime<Utc>) -> DashboardSummary {
        DashboardSummary::collect(&self.reservations, &self.sales, &self.payments, now)
    }

    /// 未保存の変更があるコレクションをスナップショットとして書き戻す
    ///
    /// 書き込みに成功したものだけを保存済みにする。失敗した分は次の `persist` で再試行される
    pub fn persist(&mut self) -> Result<(), AppError> {
        if self.reservations.peek().is_some() {
            debug!(events = self.reservations.events().len(), "予約を保存します");
            save_snapshot(&mut self.storage, RESERVATIONS_KEY, self.reservations.reservations())?;
            self.reservations.clear();
        }
        if self.payments.peek().is_some() {
            debug!(events = self.payments.events().len(), "支払を保存します");
            save_snapshot(&mut self.storage, PAYMENTS_KEY, self.payments.payments())?;
            self.payments.clear();
        }
        if self.sales_changed {
            save_snapshot(&mut self.storage, SALES_KEY, self.sales.as_slice())?;
            self.sales_changed = false;
        }
        if self.user_changed {
            save_snapshot(&mut self.storage, CURRENT_USER_KEY, &self.current_user)?;
            self.user_changed = false;
        }
        Ok(())
    }

    fn validate_car(&self, car_id: CarId) -> Result<(), AppError> {
        if !self.catalog.contains(car_id) {
            warn!(%car_id, "カタログに無い車が指定されました");
            return Err(ReservationError::UnknownCar { car_id }.into());
        }
        Ok(())
    }

    fn require_manager(&self) -> Result<(), AppError> {
        match self.current_user.is_manager() {
            true => Ok(()),
            false => {
                warn!(name = %self.current_user.name, "マネージャー以外の操作を拒否しました");
                Err(AppError::ManagerOnly)
            }
        }
    }
}
