use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Restaurant {
    pub name: String,
    pub detail: String,
    pub image_url: String,
    pub rating: String,
    pub info_link: String,
    pub address: String,
}

/// Source of restaurant listings
pub trait RestaurantDirectory: Send + Sync {
    fn restaurants(&self) -> Vec<Restaurant>;
}

#[derive(Debug, Default)]
pub struct InMemoryRestaurants {
    restaurants: Vec<Restaurant>,
}

impl InMemoryRestaurants {
    pub fn new(restaurants: Vec<Restaurant>) -> Self {
        Self { restaurants }
    }
}

impl RestaurantDirectory for InMemoryRestaurants {
    fn restaurants(&self) -> Vec<Restaurant> {
        self.restaurants.clone()
    }
}
