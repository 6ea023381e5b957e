use std::error::Error;

use chrono::Utc;
use kontor::{
    application::AppState,
    domain::{core::PaymentStatus, Entity},
    infrastructure::JsonFileStorage,
    KontorConfig,
};
use tracing::{error, info, Level};

fn main() {
    match KontorConfig::load() {
        Ok(config) => {
            tracing_subscriber::fmt()
                .with_max_level(Level::from(&config.logger.level))
                .init();
            if let Err(error) = run(&config) {
                error!("アプリケーションエラー: {}", error);
            }
        }
        Err(error) => {
            tracing_subscriber::fmt::init();
            error!("設定の読み込みに失敗しました: {}", error)
        }
    }
}

fn run(config: &KontorConfig) -> Result<(), Box<dyn Error>> {
    let storage = JsonFileStorage::open(&config.storage.path)?;
    info!("ストレージ: {}", storage.dir().display());
    let state = AppState::open(storage)?;
    let now = Utc::now();
    let summary = state.dashboard(now);

    println!("Signed in as {} ({:?})", state.current_user().name, state.current_user().role);
    println!("Total sales:            {}", summary.total_sales);
    println!(
        "Sales {} ({}):  {}",
        summary.current_month.name(),
        summary.current_month,
        summary.current_month_sales
    );
    println!("Outstanding payments:   {}", summary.outstanding_payments);
    println!("Overdue payments:       {}", summary.overdue_payments);
    println!(
        "Reservations next week: {} of {}",
        summary.upcoming_reservations, summary.total_reservations
    );

    println!();
    for car in state.cars() {
        match state.reservations().active_at(car.id(), now) {
            Some(r) => println!("{} [{}]: in use by {}", car.name(), car.plate(), r.employee_name()),
            None => println!("{} [{}]: available", car.name(), car.plate()),
        }
    }

    println!();
    for payment in state.payments().sorted() {
        if payment.status() == PaymentStatus::Paid {
            continue;
        }
        println!(
            "{:<20} {:<22} {:>8}  due {} ({:?})",
            payment.author_name(),
            payment.book_title(),
            payment.amount_due().to_string(),
            payment.due_date(),
            payment.status()
        );
    }
    Ok(())
}
