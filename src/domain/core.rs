mod car;
mod employee;
mod money;
mod payment;
mod period;
mod reservation;
mod sales;

pub use self::car::*;
pub use self::employee::*;
pub use self::money::*;
pub use self::payment::*;
pub use self::period::*;
pub use self::reservation::*;
pub use self::sales::*;
