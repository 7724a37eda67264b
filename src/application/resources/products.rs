//! Alumni marketplace listings (products and services).

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::application::error::Entity;
use crate::application::policy::MutationPolicy;
use crate::application::resource::Resource;
use crate::domain::entities::ProductRecord;
use crate::domain::types::ProductCategory;
use crate::domain::validation::{Rule, ValidationErrors};

use super::non_blank;

/// Largest value a `NUMERIC(10,2)` column holds.
const MAX_PRICE: f64 = 99_999_999.99;

pub struct Products;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProductInput {
    pub name: String,
    pub description: String,
    pub price: Option<f64>,
    pub category: Option<ProductCategory>,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ProductDraft {
    pub name: String,
    pub description: String,
    pub price: f64,
    pub category: ProductCategory,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub category: Option<ProductCategory>,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ProductFilter {
    pub category: Option<ProductCategory>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub posted_by_id: Option<Uuid>,
}

impl ProductFilter {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if self.min_price.is_some_and(|price| price < 0.0) {
            errors.push("min_price", Rule::NotNegative);
        }
        if let (Some(min), Some(max)) = (self.min_price, self.max_price)
            && max < min
        {
            errors.push("max_price", Rule::After("min_price"));
        }
        errors.into_result()
    }
}

/// Rounds to cents and rejects negative or out-of-range amounts.
fn check_price(errors: &mut ValidationErrors, price: f64) -> f64 {
    if !price.is_finite() {
        errors.push("price", Rule::Invalid);
        return 0.0;
    }
    if price < 0.0 {
        errors.push("price", Rule::NotNegative);
    } else if price > MAX_PRICE {
        errors.push("price", Rule::Invalid);
    }
    (price * 100.0).round() / 100.0
}

impl Resource for Products {
    const NAMESPACE: &'static str = "products";
    const ENTITY: Entity = Entity::Product;
    const POLICY: MutationPolicy = MutationPolicy::OwnerOrAdmin;
    const SORT_FIELDS: &'static [&'static str] = &["name", "price", "created_at"];
    const DEFAULT_SORT: &'static str = "created_at";

    type Record = ProductRecord;
    type Input = ProductInput;
    type Draft = ProductDraft;
    type Patch = ProductPatch;
    type Filter = ProductFilter;

    fn id(record: &ProductRecord) -> Uuid {
        record.id
    }

    fn owner(record: &ProductRecord) -> Uuid {
        record.posted_by_id
    }

    fn validate_draft(input: ProductInput) -> Result<ProductDraft, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.min_chars("name", &input.name, 3);
        errors.min_chars("description", &input.description, 10);
        let price = match input.price {
            Some(price) => check_price(&mut errors, price),
            None => {
                errors.push("price", Rule::Required);
                0.0
            }
        };
        if input.category.is_none() {
            errors.push("category", Rule::Required);
        }
        errors.into_result()?;
        let category = input
            .category
            .ok_or_else(|| ValidationErrors::single("category", Rule::Required))?;
        Ok(ProductDraft {
            name: input.name.trim().to_string(),
            description: input.description.trim().to_string(),
            price,
            category,
            image_url: non_blank(input.image_url),
        })
    }

    fn validate_patch(patch: &ProductPatch, _current: &ProductRecord) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.min_chars_opt("name", patch.name.as_deref(), 3);
        errors.min_chars_opt("description", patch.description.as_deref(), 10);
        if let Some(price) = patch.price {
            check_price(&mut errors, price);
        }
        errors.into_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn price_is_rounded_to_cents_and_must_not_be_negative() {
        let draft = Products::validate_draft(ProductInput {
            name: "Kopi Alumni".to_string(),
            description: "Kopi arabika dari kebun alumni".to_string(),
            price: Some(25000.456),
            category: Some(ProductCategory::Produk),
            image_url: None,
        })
        .unwrap();
        assert_eq!(draft.price, 25000.46);

        let err = Products::validate_draft(ProductInput {
            price: Some(-1.0),
            ..Default::default()
        })
        .unwrap_err();
        assert!(err.violations().iter().any(|v| v.field == "price" && v.rule == Rule::NotNegative));
        assert!(err.has("category"));
    }

    #[test]
    fn inverted_price_range_is_rejected() {
        let filter = ProductFilter {
            min_price: Some(100.0),
            max_price: Some(10.0),
            ..Default::default()
        };
        assert!(filter.validate().unwrap_err().has("max_price"));
    }
}
