//! Catalog data as the backend sends it

use serde::{Deserialize, Serialize};

pub type ProductId = u64;
pub type CategoryId = u64;

/// A single bid placed on an auctioned product
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bid {
    #[serde(default)]
    pub bidder: String,
    pub amount: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub image: String,
    #[serde(default)]
    pub rating: f32,
    pub price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub listed_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bids: Option<Vec<Bid>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_sold: Option<bool>,
}

impl Product {
    /// Highest bid so far, if the product is auctioned
    pub fn top_bid(&self) -> Option<&Bid> {
        self.bids
            .as_deref()?
            .iter()
            .max_by(|a, b| a.amount.total_cmp(&b.amount))
    }

    pub fn is_sold(&self) -> bool {
        self.is_sold.unwrap_or(false)
    }
}

/// A category; the backend nests at most one level of subcategories
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    #[serde(default)]
    pub image: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subcategories: Option<Vec<Category>>,
}

impl Category {
    /// Depth-first search through this category and its subcategories
    pub fn find(&self, id: CategoryId) -> Option<&Category> {
        if self.id == id {
            return Some(self);
        }
        self.subcategories
            .as_deref()?
            .iter()
            .find_map(|sub| sub.find(id))
    }
}

/// The authenticated user as returned by the login endpoint
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRef {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default, alias = "emailId")]
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}
