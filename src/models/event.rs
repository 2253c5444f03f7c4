use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

/// A single performance of an event. Stored embedded in the event row,
/// never as a table of its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    pub id: String,
    pub date: DateTime<Utc>,
}

/// A price tier of an event. `category` is the zone key seats are tagged
/// with in the seat catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceCategory {
    pub id: i32,
    pub name: String,
    pub price: Decimal,
    pub category: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Event {
    pub id: Uuid,
    pub title: String,
    pub schedules: Json<Vec<Schedule>>,
    pub price_categories: Json<Vec<PriceCategory>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Event {
    pub fn schedule(&self, schedule_id: &str) -> Option<&Schedule> {
        self.schedules.iter().find(|s| s.id == schedule_id)
    }

    pub fn price_category(&self, id: i32) -> Option<&PriceCategory> {
        self.price_categories.iter().find(|c| c.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event() -> Event {
        Event {
            id: Uuid::new_v4(),
            title: "Gala".to_string(),
            schedules: Json(vec![Schedule {
                id: "S1".to_string(),
                date: Utc::now(),
            }]),
            price_categories: Json(vec![
                PriceCategory {
                    id: 1,
                    name: "Stalls".to_string(),
                    price: Decimal::new(5000, 2),
                    category: "zone1".to_string(),
                },
                PriceCategory {
                    id: 2,
                    name: "Balcony".to_string(),
                    price: Decimal::new(3500, 2),
                    category: "zone2".to_string(),
                },
            ]),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_lookup_by_id() {
        let event = event();
        assert_eq!(event.price_category(2).map(|c| c.name.as_str()), Some("Balcony"));
        assert!(event.price_category(9).is_none());
        assert!(event.schedule("S1").is_some());
        assert!(event.schedule("S2").is_none());
    }
}
