//! Canned demo schemas and the showcase state around them.
//!
//! The registry is a plain ordered table: callers construct it (usually via
//! [`SampleRegistry::builtin`]) and hand it to whatever presents it.
use indexmap::IndexMap;

use crate::emit::{emit_module, EmitOptions, Emitted};
use crate::field::Field;

#[derive(Debug, Clone, PartialEq)]
pub struct SampleRegistry {
    collections: IndexMap<String, Field>,
    active: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("no collection named `{0}`")]
    UnknownCollection(String),
    #[error("a collection named `{0}` already exists")]
    DuplicateCollection(String),
    #[error("collection name must not be blank")]
    BlankName,
    #[error("registry has no collections")]
    Empty,
}

impl SampleRegistry {
    /// Registry over `collections`, with the first entry active.
    pub fn new(collections: IndexMap<String, Field>) -> Result<Self, RegistryError> {
        let active = collections.keys().next().cloned().ok_or(RegistryError::Empty)?;
        Ok(Self { collections, active })
    }

    pub fn builtin() -> Self {
        let collections = IndexMap::from([
            ("users".to_string(), users()),
            ("products".to_string(), products()),
            ("orders".to_string(), orders()),
        ]);
        Self { collections, active: "users".to_string() }
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.collections.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Field)> {
        self.collections.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn get(&self, key: &str) -> Option<&Field> {
        self.collections.get(key)
    }

    pub fn len(&self) -> usize {
        self.collections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.collections.is_empty()
    }

    pub fn active_key(&self) -> &str {
        &self.active
    }

    pub fn active(&self) -> &Field {
        &self.collections[self.active.as_str()]
    }

    pub fn select(&mut self, key: &str) -> Result<&Field, RegistryError> {
        if !self.collections.contains_key(key) {
            return Err(RegistryError::UnknownCollection(key.to_string()));
        }
        tracing::debug!(from = %self.active, to = key, "switching active collection");
        self.active = key.to_string();
        Ok(self.active())
    }

    /// Replace the active collection's schema.
    pub fn save(&mut self, schema: Field) {
        tracing::debug!(collection = %self.active, fields = schema.count(), "saving collection");
        self.collections.insert(self.active.clone(), schema);
    }

    /// Add an empty object schema called `name` and make it active.
    pub fn create(&mut self, name: &str) -> Result<&Field, RegistryError> {
        if name.trim().is_empty() {
            return Err(RegistryError::BlankName);
        }
        if self.collections.contains_key(name) {
            return Err(RegistryError::DuplicateCollection(name.to_string()));
        }
        tracing::debug!(collection = name, "creating collection");
        self.collections.insert(name.to_string(), Field::object(name, Vec::new()));
        self.active = name.to_string();
        Ok(self.active())
    }

    pub fn emit_active(&self, options: &EmitOptions) -> Emitted {
        emit_module(self.active(), options)
    }
}

// ————————————————————————————————————————————————————————————————————————————
// BUILT-IN COLLECTIONS
// ————————————————————————————————————————————————————————————————————————————

fn users() -> Field {
    Field::object(
        "Users",
        vec![
            Field::string("id").required().with_description("Unique identifier for the user"),
            Field::string("username")
                .required()
                .min(3.0)
                .max(20.0)
                .with_description("Unique username for the user"),
            Field::string("email")
                .required()
                .regex(r"^[\w-\.]+@([\w-]+\.)+[\w-]{2,4}$")
                .with_description("Email address"),
            Field::string("password")
                .required()
                .min(8.0)
                .with_description("User password (min 8 characters)"),
            Field::number("age").min(13.0).with_description("User age (must be at least 13)"),
            Field::boolean("isActive").required().with_description("Active status"),
            Field::enumeration("role", ["user", "admin", "moderator"])
                .required()
                .with_description("User role in the system"),
            Field::date("lastLogin").with_description("Last login timestamp"),
            Field::object(
                "profile",
                vec![
                    Field::string("fullName").required().with_description("Full name of the user"),
                    Field::string("bio").max(500.0).with_description("User biography (max 500 characters)"),
                    Field::string("avatarUrl")
                        .regex("^https?://.*$")
                        .with_description("URL to user's avatar image"),
                ],
            ),
            Field::array(
                "socialMedia",
                Field::object(
                    "account",
                    vec![
                        Field::enumeration("platform", ["twitter", "facebook", "instagram", "linkedin"])
                            .required(),
                        Field::string("username").required(),
                        Field::string("url").regex("^https?://.*$"),
                    ],
                ),
            )
            .with_description("List of user's social media accounts"),
        ],
    )
}

fn products() -> Field {
    Field::object(
        "Products",
        vec![
            Field::string("id").required().with_description("Unique identifier for the product"),
            Field::string("name").required().min(2.0).max(100.0).with_description("Product name"),
            Field::string("description").max(1000.0).with_description("Detailed product description"),
            Field::number("price").required().min(0.0).with_description("Product price in cents"),
            Field::enumeration("category", ["electronics", "clothing", "books", "home", "other"])
                .required()
                .with_description("Product category"),
            Field::array("tags", Field::string("tag")).with_description("Product tags for easy searching"),
            Field::boolean("inStock").required().with_description("Whether the product is in stock"),
            Field::date("createdAt").required().with_description("Product creation date"),
            Field::object(
                "dimensions",
                vec![
                    Field::number("width").required().min(0.0).with_description("Width in centimeters"),
                    Field::number("height").required().min(0.0).with_description("Height in centimeters"),
                    Field::number("depth").required().min(0.0).with_description("Depth in centimeters"),
                ],
            )
            .with_description("Product dimensions"),
            Field::array(
                "reviews",
                Field::object(
                    "review",
                    vec![
                        Field::string("userId")
                            .required()
                            .with_description("ID of the user who left the review"),
                        Field::number("rating")
                            .required()
                            .min(1.0)
                            .max(5.0)
                            .with_description("Rating from 1 to 5"),
                        Field::string("comment")
                            .max(500.0)
                            .with_description("Review comment (max 500 characters)"),
                        Field::date("createdAt").required().with_description("Review creation date"),
                    ],
                ),
            )
            .with_description("Product reviews"),
        ],
    )
}

fn orders() -> Field {
    Field::object(
        "Orders",
        vec![
            Field::string("id").required().with_description("Unique identifier for the order"),
            Field::string("userId").required().with_description("ID of the user who placed the order"),
            Field::enumeration("status", ["pending", "processing", "shipped", "delivered", "cancelled"])
                .required()
                .with_description("Current status of the order"),
            Field::date("createdAt").required().with_description("Order creation date"),
            Field::array(
                "items",
                Field::object(
                    "item",
                    vec![
                        Field::string("productId").required().with_description("ID of the ordered product"),
                        Field::number("quantity")
                            .required()
                            .min(1.0)
                            .with_description("Quantity of the product ordered"),
                        Field::number("price")
                            .required()
                            .min(0.0)
                            .with_description("Price of the product at the time of order"),
                    ],
                ),
            )
            .with_description("List of items in the order"),
            Field::object(
                "shippingAddress",
                vec![
                    Field::string("street").required().with_description("Street address"),
                    Field::string("city").required().with_description("City"),
                    Field::string("state").required().with_description("State/Province"),
                    Field::string("country").required().with_description("Country"),
                    Field::string("zipCode").required().with_description("ZIP/Postal code"),
                ],
            )
            .with_description("Shipping address for the order"),
            Field::calculated(
                "totalAmount",
                ["items"],
                "(items) => items.reduce((sum, item) => sum + item.price * item.quantity, 0)",
            )
            .with_description("Total order amount"),
            Field::number("tax").required().min(0.0).with_description("Tax amount for the order"),
            Field::number("shippingCost").required().min(0.0).with_description("Shipping cost for the order"),
            Field::calculated(
                "grandTotal",
                ["totalAmount", "tax", "shippingCost"],
                "(totalAmount, tax, shippingCost) => totalAmount + tax + shippingCost",
            )
            .with_description("Grand total including tax and shipping"),
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::{Anomaly, TextSlot};
    use crate::field::FieldType;

    #[test]
    fn builtin_collections_in_order() {
        let registry = SampleRegistry::builtin();
        assert_eq!(registry.keys().collect::<Vec<_>>(), ["users", "products", "orders"]);
        assert_eq!(registry.active_key(), "users");
        assert_eq!(registry.active().name, "Users");
    }

    #[test]
    fn builtin_collections_emit_cleanly() {
        let registry = SampleRegistry::builtin();
        for (key, field) in registry.iter() {
            let emitted = emit_module(field, &EmitOptions::default());
            // URL patterns contain `/`, which has to be escaped inside a regex literal.
            let unexpected: Vec<_> = emitted
                .anomalies
                .iter()
                .filter(|a| !matches!(a, Anomaly::EscapedText { slot: TextSlot::Regex, .. }))
                .collect();
            assert!(unexpected.is_empty(), "{key}: {unexpected:?}");
            assert!(emitted.source.contains(&format!("const {}Schema = z.object({{", field.name)));
        }
        let users = emit_module(registry.get("users").unwrap(), &EmitOptions::default());
        assert_eq!(users.anomalies.len(), 2);
        assert!(users.source.contains(r"avatarUrl: z.string().regex(/^https?:\/\/.*$/)"));
    }

    #[test]
    fn users_sample_carries_expected_members() {
        let registry = SampleRegistry::builtin();
        let source = registry.emit_active(&EmitOptions::default()).source;
        assert!(source.contains("age: z.coerce.number().min(13).describe(\"User age (must be at least 13)\")"));
        assert!(source.contains(
            "role: z.enum(['user', 'admin', 'moderator']).describe(\"User role in the system\")"
        ));
        assert!(source.contains("lastLogin: z.coerce.date().describe(\"Last login timestamp\")"));
    }

    #[test]
    fn select_switches_and_rejects_unknown() {
        let mut registry = SampleRegistry::builtin();
        assert_eq!(registry.select("orders").unwrap().name, "Orders");
        assert_eq!(
            registry.select("invoices"),
            Err(RegistryError::UnknownCollection("invoices".into()))
        );
        assert_eq!(registry.active_key(), "orders");
    }

    #[test]
    fn save_replaces_active_only() {
        let mut registry = SampleRegistry::builtin();
        registry.select("products").unwrap();
        registry.save(Field::object("Products", vec![Field::string("sku")]));
        assert_eq!(registry.get("products").unwrap().children().len(), 1);
        assert_eq!(registry.get("users").unwrap().children().len(), 10);
    }

    #[test]
    fn create_adds_empty_object_and_activates_it() {
        let mut registry = SampleRegistry::builtin();
        let created = registry.create("Invoices").unwrap();
        assert_eq!(created.ty, FieldType::Object);
        assert!(created.children().is_empty());
        assert_eq!(registry.active_key(), "Invoices");
        assert_eq!(registry.len(), 4);
        assert_eq!(
            registry.emit_active(&EmitOptions::default()).source,
            "import { z } from 'zod';\n\nconst InvoicesSchema = z.object({});\n\nexport default InvoicesSchema;"
        );
    }

    #[test]
    fn create_rejects_blank_and_duplicate_names() {
        let mut registry = SampleRegistry::builtin();
        assert_eq!(registry.create("   "), Err(RegistryError::BlankName));
        assert_eq!(registry.create("users"), Err(RegistryError::DuplicateCollection("users".into())));
        assert_eq!(registry.active_key(), "users");
    }

    #[test]
    fn new_requires_a_collection() {
        assert_eq!(SampleRegistry::new(IndexMap::new()), Err(RegistryError::Empty));
        let registry = SampleRegistry::new(IndexMap::from([("a".to_string(), Field::string("a"))])).unwrap();
        assert_eq!(registry.active_key(), "a");
    }
}
