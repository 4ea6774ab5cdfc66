//! Product records (the parent artifact).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use nova_core::{DomainError, DomainResult, Entity, LifecycleStatus, ProductId, UserId};

use crate::publish::PublishStatus;

/// A device product line (e.g. one hardware model).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub model: String,
    /// Natural key devices report with; unique among active products.
    pub model_id: String,
    pub kind: Option<String>,
    pub stage: Option<String>,
    /// Compatible products.
    pub fit_products: Vec<ProductId>,
    pub area: Option<String>,
    pub dept: Option<String>,
    pub project_manager: Option<String>,
    pub description: Option<String>,
    /// Blob key of the uploaded logo.
    pub logo: Option<String>,
    pub publish_status: PublishStatus,
    pub published_by: Option<UserId>,
    pub lifecycle: LifecycleStatus,
    pub created_by: Option<UserId>,
    pub updated_by: Option<UserId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for Product {
    type Id = ProductId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn lifecycle(&self) -> LifecycleStatus {
        self.lifecycle
    }
}

/// Editable product attributes (create and update share the same shape).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductFields {
    pub name: String,
    pub model: String,
    pub model_id: String,
    pub kind: Option<String>,
    pub stage: Option<String>,
    pub fit_products: Vec<ProductId>,
    pub area: Option<String>,
    pub dept: Option<String>,
    pub project_manager: Option<String>,
    pub description: Option<String>,
}

impl ProductFields {
    pub fn validate(&self) -> DomainResult<()> {
        if self.name.trim().is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }
        if self.model_id.trim().is_empty() {
            return Err(DomainError::validation("modelId cannot be empty"));
        }
        Ok(())
    }
}

/// Row to insert for a new product. Status fields take their defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProduct {
    pub id: ProductId,
    pub fields: ProductFields,
    pub logo: Option<String>,
    pub created_by: UserId,
}

/// Column changes for an update of an active product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductChanges {
    pub fields: ProductFields,
    /// `Some` replaces the logo key; `None` keeps the current one.
    pub logo: Option<String>,
    pub updated_by: UserId,
}

/// Filters for product listings. All set filters must match.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductQuery {
    pub publish_status: Option<PublishStatus>,
    pub kind: Option<String>,
    /// Substring match on the product name.
    pub name: Option<String>,
}

impl ProductQuery {
    /// Evaluate the filter against an active product (in-memory adapters).
    pub fn matches(&self, product: &Product) -> bool {
        if !product.is_active() {
            return false;
        }
        if let Some(status) = self.publish_status {
            if product.publish_status != status {
                return false;
            }
        }
        if let Some(kind) = &self.kind {
            if product.kind.as_deref() != Some(kind.as_str()) {
                return false;
            }
        }
        if let Some(name) = &self.name {
            if !product.name.contains(name.as_str()) {
                return false;
            }
        }
        true
    }
}

/// Id + name pair used to resolve compatible products in listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSummary {
    pub id: ProductId,
    pub name: String,
}

impl From<&Product> for ProductSummary {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id,
            name: product.name.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_product(name: &str, model_id: &str) -> Product {
        let now = Utc::now();
        Product {
            id: ProductId::new(),
            name: name.to_string(),
            model: "NV-1".to_string(),
            model_id: model_id.to_string(),
            kind: Some("pro_type_01".to_string()),
            stage: None,
            fit_products: Vec::new(),
            area: None,
            dept: None,
            project_manager: None,
            description: None,
            logo: None,
            publish_status: PublishStatus::Unpublished,
            published_by: None,
            lifecycle: LifecycleStatus::Active,
            created_by: None,
            updated_by: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn validate_rejects_blank_model_id() {
        let fields = ProductFields {
            name: "Gateway".into(),
            model_id: "  ".into(),
            ..Default::default()
        };
        assert_eq!(
            fields.validate(),
            Err(DomainError::validation("modelId cannot be empty"))
        );
    }

    #[test]
    fn query_skips_retired_products() {
        let mut product = sample_product("Gateway", "GW-01");
        assert!(ProductQuery::default().matches(&product));
        product.lifecycle = LifecycleStatus::Retired;
        assert!(!ProductQuery::default().matches(&product));
    }

    #[test]
    fn query_combines_filters() {
        let product = sample_product("Smart Gateway", "GW-01");
        let query = ProductQuery {
            publish_status: Some(PublishStatus::Unpublished),
            kind: Some("pro_type_01".into()),
            name: Some("Gate".into()),
        };
        assert!(query.matches(&product));

        let query = ProductQuery {
            publish_status: Some(PublishStatus::Published),
            ..query
        };
        assert!(!query.matches(&product));
    }
}
