use serde::{Deserialize, Serialize};

use crate::domain::{prefixed_id, Entity};

prefixed_id!(
    /// 社用車ID
    CarId,
    "car"
);

/// 社用車
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Car {
    id: CarId,
    name: String,
    plate: String,
}

impl Car {
    pub fn new(id: CarId, name: impl Into<String>, plate: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            plate: plate.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn plate(&self) -> &str {
        &self.plate
    }
}

impl Entity for Car {
    type Id = CarId;

    const ENTITY_NAME: &'static str = "car";

    fn id(&self) -> Self::Id {
        self.id
    }
}

/// 社用車カタログ（外部から与えられ、変更されない）
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CarCatalog {
    cars: Vec<Car>,
}

impl CarCatalog {
    pub fn new(cars: Vec<Car>) -> Self {
        Self { cars }
    }

    pub fn cars(&self) -> &[Car] {
        &self.cars
    }

    pub fn get(&self, id: CarId) -> Option<&Car> {
        self.cars.iter().find(|car| car.id == id)
    }

    pub fn contains(&self, id: CarId) -> bool {
        self.get(id).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_lookup() {
        let catalog = CarCatalog::new(vec![
            Car::new(CarId::from(1), "VW Golf", "B-AB 1234"),
            Car::new(CarId::from(2), "Toyota Corolla", "B-CD 5678"),
        ]);
        assert_eq!(catalog.get(CarId::from(2)).unwrap().name(), "Toyota Corolla");
        assert!(catalog.contains(CarId::from(1)));
        assert!(!catalog.contains(CarId::from(3)));
    }

    #[test]
    fn test_car_serde() {
        let car = Car::new(CarId::from(1), "VW Golf", "B-AB 1234");
        let json = serde_json::to_value(&car).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"id": "car-1", "name": "VW Golf", "plate": "B-AB 1234"})
        );
    }
}
