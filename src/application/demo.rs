//! デモ用の初期データ。リセット時にこの内容へ戻る
//!
//! 日付はすべて固定値で、組み立てに失敗した行は含めない（件数はテストで確認する）。

use chrono::{NaiveDate, TimeZone, Utc};

use crate::domain::core::{
    AuthorPayment, Car, CarId, Employee, EmployeeId, Money, PaymentId, PaymentStatus, Period,
    Reservation, ReservationId, Role, SalesRecord, SalesRecordId,
};

pub fn cars() -> Vec<Car> {
    vec![
        Car::new(CarId::from(1), "VW Golf", "B-AB 1234"),
        Car::new(CarId::from(2), "Toyota Corolla", "B-CD 5678"),
        Car::new(CarId::from(3), "Skoda Octavia", "B-EF 9012"),
    ]
}

pub fn employees() -> Vec<Employee> {
    vec![
        Employee::new(EmployeeId::from(1), "Anna Schmidt", Role::Sales),
        Employee::new(EmployeeId::from(2), "Michael Weber", Role::Sales),
        Employee::new(EmployeeId::from(3), "Sarah Klein", Role::Sales),
        Employee::new(EmployeeId::from(4), "Thomas Müller", Role::Sales),
        Employee::new(EmployeeId::from(5), "Julia Becker", Role::Manager),
    ]
}

pub fn reservations() -> Vec<Reservation> {
    [
        reservation(1, 1, 17, (9, 17), "Anna Schmidt", "Client meeting in Frankfurt"),
        reservation(2, 2, 18, (8, 16), "Michael Weber", "Book fair preparation"),
        reservation(3, 1, 19, (10, 15), "Sarah Klein", "Author meeting in Berlin"),
        reservation(4, 3, 20, (9, 18), "Thomas Müller", "Bookstore visits"),
    ]
    .into_iter()
    .flatten()
    .collect()
}

pub fn sales_records() -> Vec<SalesRecord> {
    [
        sale(1, "Anna Schmidt", "Business Guide 2025", 45, 1350, (11, 5)),
        sale(2, "Michael Weber", "Marketing Handbook", 32, 960, (11, 8)),
        sale(3, "Sarah Klein", "Tech Trends", 28, 1120, (11, 12)),
        sale(4, "Thomas Müller", "Leadership Stories", 38, 1140, (11, 15)),
        sale(5, "Anna Schmidt", "Sales Masterclass", 52, 2080, (11, 20)),
        sale(6, "Michael Weber", "Digital Strategy", 41, 1640, (11, 22)),
        sale(7, "Sarah Klein", "Business Guide 2025", 38, 1140, (12, 3)),
        sale(8, "Thomas Müller", "Marketing Handbook", 44, 1320, (12, 5)),
        sale(9, "Anna Schmidt", "Tech Trends", 55, 2200, (12, 8)),
        sale(10, "Michael Weber", "Leadership Stories", 36, 1080, (12, 10)),
        sale(11, "Sarah Klein", "Sales Masterclass", 48, 1920, (12, 12)),
        sale(12, "Thomas Müller", "Digital Strategy", 39, 1560, (12, 15)),
        sale(13, "Anna Schmidt", "Business Guide 2025", 42, 1260, (12, 16)),
    ]
    .into_iter()
    .flatten()
    .collect()
}

pub fn author_payments() -> Vec<AuthorPayment> {
    use PaymentStatus::*;

    [
        payment(1, "Dr. Klaus Fischer", "Business Guide 2025", 3500, Paid, (11, 30), Some((11, 28))),
        payment(2, "Lisa Hoffmann", "Marketing Handbook", 2800, Due, (12, 15), None),
        payment(3, "Stefan Berg", "Tech Trends", 4200, Due, (12, 20), None),
        payment(4, "Maria Schneider", "Leadership Stories", 3100, Overdue, (12, 5), None),
        payment(5, "Robert Wagner", "Sales Masterclass", 5000, Paid, (11, 20), Some((11, 18))),
        payment(6, "Nina Krause", "Digital Strategy", 3800, Due, (12, 28), None),
    ]
    .into_iter()
    .flatten()
    .collect()
}

fn date((month, day): (u32, u32)) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(2025, month, day)
}

fn reservation(
    id: u64,
    car: u64,
    day: u32,
    (from, to): (u32, u32),
    employee_name: &str,
    purpose: &str,
) -> Option<Reservation> {
    let day = date((12, day))?;
    let start = Utc.from_utc_datetime(&day.and_hms_opt(from, 0, 0)?);
    let end = Utc.from_utc_datetime(&day.and_hms_opt(to, 0, 0)?);
    Some(Reservation::new(
        ReservationId::from(id),
        CarId::from(car),
        Period::new(start, end).ok()?,
        employee_name,
        purpose,
    ))
}

fn sale(
    id: u64,
    rep_name: &str,
    product_name: &str,
    quantity: u32,
    revenue: i64,
    on: (u32, u32),
) -> Option<SalesRecord> {
    Some(SalesRecord::new(
        SalesRecordId::from(id),
        rep_name,
        product_name,
        quantity,
        Money::eur(revenue),
        date(on)?,
    ))
}

fn payment(
    id: u64,
    author_name: &str,
    book_title: &str,
    amount_due: i64,
    status: PaymentStatus,
    due: (u32, u32),
    paid: Option<(u32, u32)>,
) -> Option<AuthorPayment> {
    let paid_date = match paid {
        Some(on) => Some(date(on)?),
        None => None,
    };
    Some(AuthorPayment::new(
        PaymentId::from(id),
        author_name,
        book_title,
        Money::eur(amount_due),
        status,
        date(due)?,
        paid_date,
    ))
}

#[cfg(test)]
mod tests {
    use crate::domain::Entity;

    use super::*;

    #[test]
    fn test_seed_sizes() {
        assert_eq!(cars().len(), 3);
        assert_eq!(employees().len(), 5);
        assert_eq!(reservations().len(), 4);
        assert_eq!(sales_records().len(), 13);
        assert_eq!(author_payments().len(), 6);
    }

    #[test]
    fn test_seed_reservations_reference_catalog() {
        let cars = cars();
        for reservation in reservations() {
            assert!(cars.iter().any(|c| c.id() == reservation.car_id()));
        }
    }
}
