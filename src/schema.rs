//! The extraction schema sent with every request, and its typed mirror.
//!
//! The remote service conforms its output to whatever JSON Schema is sent in
//! the `fields_schema` form field. [`PRODUCT_SCHEMA`] is the contract agreed
//! for floral catalogs: a list of products, one entry per size (S, M, L),
//! each with eight required fields. [`ProductRecord`] is the same shape as a
//! Rust type so callers never index into raw JSON.
//!
//! Edit the descriptions in the schema rather than the parsing code when
//! extraction quality needs tuning; the service reads them as guidance.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;

/// JSON Schema (draft 2020-12) for a page of catalog products.
///
/// Built once per process and shared read-only by every request.
pub static PRODUCT_SCHEMA: Lazy<Arc<Value>> = Lazy::new(|| {
    Arc::new(json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "title": "API Response for Products",
        "description": "A schema for a list of products returned from an API, representing ALL floral arrangements (S, M, L sizes) extracted from the markdown document.",
        "type": "object",
        "properties": {
            "products": {
                "title": "Product List",
                "description": "An array of product objects, each representing a specific floral arrangement in ALL available sizes (S, M, L). Extract each size as a separate product with the appropriate size suffix in the ID.",
                "type": "array",
                "items": {
                    "type": "object",
                    "title": "Product",
                    "description": "A single product (floral arrangement) with its details for a specific size.",
                    "properties": {
                        "id": {
                            "type": "string",
                            "title": "Product ID",
                            "description": "Unique identifier for the product with size suffix, such as '197766S', '197766M', '197766L', '197756S', '197756M', '197756L'."
                        },
                        "name": {
                            "type": "string",
                            "title": "Product Name",
                            "description": "Name of the product, such as 'Petal Palooza' or 'Field Study'."
                        },
                        "size": {
                            "type": "string",
                            "title": "Product Size",
                            "description": "Size of the product (S, M, or L)."
                        },
                        "price": {
                            "type": "number",
                            "title": "Product Price",
                            "description": "Suggested retail price of the product in USD for this specific size."
                        },
                        "flower-data": {
                            "type": "string",
                            "title": "Flower Data",
                            "description": "Type and number of flowers in the arrangement for this specific size, e.g., '2 stems Hydrangea - Blue, 4 stems Carnation - Orange'."
                        },
                        "foliage-data": {
                            "type": "string",
                            "title": "Foliage Data",
                            "description": "Type and number of foliage in the arrangement for this specific size, e.g., '3 stems Tree Fern - Painted, 1 stem Eucalyptus - Gunni'."
                        },
                        "dimensions": {
                            "type": "string",
                            "title": "Dimensions",
                            "description": "Dimensions of the arrangement for this specific size, e.g., 'Arrangement Height 11\", Length 10\"'."
                        },
                        "construction-material": {
                            "type": "string",
                            "description": "description of the construction material eg 6\" gathering vase - clear"
                        }
                    },
                    "required": [
                        "id",
                        "name",
                        "size",
                        "price",
                        "flower-data",
                        "foliage-data",
                        "dimensions",
                        "construction-material"
                    ]
                }
            }
        },
        "required": ["products"]
    }))
});

/// Shared handle to the default product schema.
pub fn product_schema() -> Arc<Value> {
    Arc::clone(&PRODUCT_SCHEMA)
}

/// One catalog product in one size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    /// Catalog number with size suffix, e.g. `197766S`.
    pub id: String,
    pub name: String,
    /// `S`, `M` or `L`.
    pub size: String,
    /// Suggested retail price in USD.
    pub price: f64,
    #[serde(rename = "flower-data")]
    pub flower_data: String,
    #[serde(rename = "foliage-data")]
    pub foliage_data: String,
    pub dimensions: String,
    #[serde(rename = "construction-material")]
    pub construction_material: String,
}

/// The `extracted_schema` object returned for one document.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProductExtraction {
    pub products: Vec<ProductRecord>,
}
