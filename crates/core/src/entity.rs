//! Records the seeder creates on, and reads back from, the backend.
//!
//! Only the fields the seeder needs to resolve references are modelled; any
//! extra fields in backend responses are ignored.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::id::RecordId;

/// Every record type the seeder knows about.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Actor,
    Brand,
    Catalogue,
    Product,
    Provider,
    Entry,
    Purchase,
    Exit,
    Sale,
}

impl EntityKind {
    pub const ALL: [EntityKind; 9] = [
        EntityKind::Actor,
        EntityKind::Brand,
        EntityKind::Catalogue,
        EntityKind::Product,
        EntityKind::Provider,
        EntityKind::Entry,
        EntityKind::Purchase,
        EntityKind::Exit,
        EntityKind::Sale,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Actor => "actor",
            EntityKind::Brand => "brand",
            EntityKind::Catalogue => "catalogue",
            EntityKind::Product => "product",
            EntityKind::Provider => "provider",
            EntityKind::Entry => "entry",
            EntityKind::Purchase => "purchase",
            EntityKind::Exit => "exit",
            EntityKind::Sale => "sale",
        }
    }

    /// Kinds only an administrator may create.
    pub fn requires_admin(&self) -> bool {
        matches!(
            self,
            EntityKind::Actor
                | EntityKind::Brand
                | EntityKind::Catalogue
                | EntityKind::Product
                | EntityKind::Provider
        )
    }
}

impl core::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A record type that can be listed from the backend and sampled as a parent
/// reference.
pub trait CatalogEntity: DeserializeOwned + Clone + Send {
    const KIND: EntityKind;

    /// Natural key other records use to point at this one.
    fn natural_key(&self) -> &str;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Brand {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalogue {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub code: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provider {
    pub name: String,
}

macro_rules! impl_catalog_entity {
    ($t:ty, $kind:expr, $key:ident) => {
        impl CatalogEntity for $t {
            const KIND: EntityKind = $kind;

            fn natural_key(&self) -> &str {
                &self.$key
            }
        }
    };
}

impl_catalog_entity!(Actor, EntityKind::Actor, username);
impl_catalog_entity!(Brand, EntityKind::Brand, name);
impl_catalog_entity!(Catalogue, EntityKind::Catalogue, name);
impl_catalog_entity!(Product, EntityKind::Product, code);
impl_catalog_entity!(Provider, EntityKind::Provider, name);

/// The part of a creation response the pipeline depends on: the primary key.
///
/// Accepts either `pk` or `id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedRecord {
    #[serde(alias = "id")]
    pub pk: RecordId,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn created_record_accepts_pk_or_id() {
        let a: CreatedRecord = serde_json::from_value(json!({ "pk": 7, "date": "x" })).unwrap();
        let b: CreatedRecord = serde_json::from_value(json!({ "id": "e-7" })).unwrap();
        assert_eq!(a.pk, RecordId::Int(7));
        assert_eq!(b.pk, RecordId::from("e-7"));
    }

    #[test]
    fn catalog_records_ignore_unknown_fields() {
        let p: Product = serde_json::from_value(json!({
            "code": "PRD-1",
            "name": "Lamp",
            "brand": 3,
            "price": "9.99",
        }))
        .unwrap();
        assert_eq!(p.natural_key(), "PRD-1");
        assert_eq!(<Product as CatalogEntity>::KIND, EntityKind::Product);
    }

    #[test]
    fn only_catalog_kinds_need_an_administrator() {
        let admin_only: Vec<_> = EntityKind::ALL
            .iter()
            .filter(|k| k.requires_admin())
            .copied()
            .collect();
        assert_eq!(
            admin_only,
            vec![
                EntityKind::Actor,
                EntityKind::Brand,
                EntityKind::Catalogue,
                EntityKind::Product,
                EntityKind::Provider,
            ]
        );
    }
}
