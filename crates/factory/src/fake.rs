//! Random-but-valid payloads built from small word lists.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde_json::{Value as JsonValue, json};
use uuid::Uuid;

use stockseed_core::{Brand, Catalogue, Credentials, Product, Provider, RecordId};

use crate::{ActorRole, PayloadFactory};

const FIRST_NAMES: &[&str] = &[
    "Alice", "Bruno", "Carmen", "Diego", "Elena", "Felipe", "Gloria", "Hugo", "Irene", "Javier",
    "Lucia", "Mateo", "Nora", "Oscar", "Paula", "Ramon", "Sofia", "Tomas", "Valeria", "Ximena",
];

const LAST_NAMES: &[&str] = &[
    "Alvarez", "Benitez", "Castro", "Delgado", "Estrada", "Flores", "Guerrero", "Herrera",
    "Ibarra", "Jimenez", "Lozano", "Morales", "Navarro", "Ortega", "Pineda", "Ramirez",
];

const BRAND_WORDS: &[&str] = &[
    "Acme", "Northwind", "Bluebird", "Ironclad", "Summit", "Evergreen", "Solstice", "Redwood",
    "Keystone", "Harbor", "Falcon", "Orchid",
];

const CATALOGUE_WORDS: &[&str] = &[
    "Kitchen", "Garden", "Hardware", "Stationery", "Toys", "Cleaning", "Beverages", "Snacks",
    "Electronics", "Lighting", "Textiles", "Personal care",
];

const PRODUCT_NOUNS: &[&str] = &[
    "lamp", "kettle", "notebook", "drill", "mug", "towel", "charger", "broom", "blender",
    "backpack", "scissors", "candle",
];

const PRODUCT_ADJECTIVES: &[&str] = &[
    "compact", "deluxe", "classic", "portable", "heavy-duty", "eco", "mini", "premium",
];

const STREETS: &[&str] = &["Main St", "Oak Ave", "Market St", "Pine Rd", "Lake Blvd", "Hill St"];

const SUPPLIER_SUFFIXES: &[&str] = &["Supply", "Wholesale", "Distribution", "Trading", "Imports"];

/// [`PayloadFactory`] drawing from fixed word lists.
///
/// Names that the backend keeps unique (brand, catalogue, provider, product
/// code, username) carry a random suffix so repeated runs do not collide.
#[derive(Debug, Clone)]
pub struct FakeDataFactory<R = StdRng> {
    rng: R,
}

impl FakeDataFactory<StdRng> {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }
}

impl Default for FakeDataFactory<StdRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Rng> FakeDataFactory<R> {
    pub fn from_rng(rng: R) -> Self {
        Self { rng }
    }

    fn pick(&mut self, words: &[&'static str]) -> &'static str {
        words.choose(&mut self.rng).copied().unwrap_or_default()
    }

    fn suffix(&mut self) -> String {
        // The tail of a v7 UUID is random; the head is a timestamp.
        let simple = Uuid::now_v7().simple().to_string();
        let tail = &simple[simple.len() - 6..];
        format!("{}{:02}", tail.to_uppercase(), self.rng.gen_range(0..100))
    }

    fn money(&mut self, min_cents: u32, max_cents: u32) -> String {
        let cents = self.rng.gen_range(min_cents..=max_cents);
        format!("{}.{:02}", cents / 100, cents % 100)
    }

    fn phone(&mut self) -> String {
        format!(
            "+1-555-{:03}-{:04}",
            self.rng.gen_range(100..1000),
            self.rng.gen_range(0..10_000)
        )
    }

    fn address(&mut self) -> String {
        let number = self.rng.gen_range(1..2000);
        format!("{} {}", number, self.pick(STREETS))
    }
}

impl<R: Rng + Send> PayloadFactory for FakeDataFactory<R> {
    fn username(&mut self) -> String {
        let first = self.pick(FIRST_NAMES).to_lowercase();
        format!("{}_{}", first, self.suffix().to_lowercase())
    }

    fn actor(&mut self, credentials: &Credentials, role: ActorRole) -> JsonValue {
        json!({
            "username": credentials.username,
            "password": credentials.password,
            "email": format!("{}@example.com", credentials.username.to_lowercase()),
            "role": role.as_str(),
        })
    }

    fn profile(&mut self) -> JsonValue {
        json!({
            "first_name": self.pick(FIRST_NAMES),
            "last_name": self.pick(LAST_NAMES),
            "phone": self.phone(),
            "address": self.address(),
        })
    }

    fn brand(&mut self) -> JsonValue {
        let word = self.pick(BRAND_WORDS);
        json!({ "name": format!("{} {}", word, self.suffix()) })
    }

    fn catalogue(&mut self) -> JsonValue {
        let word = self.pick(CATALOGUE_WORDS);
        json!({ "name": format!("{} {}", word, self.suffix()) })
    }

    fn product(&mut self, brand: &Brand, catalogue: &Catalogue) -> JsonValue {
        let adjective = self.pick(PRODUCT_ADJECTIVES);
        let noun = self.pick(PRODUCT_NOUNS);
        json!({
            "code": format!("PRD-{}", self.suffix()),
            "name": format!("{adjective} {noun}"),
            "description": format!("{adjective} {noun} by {}", brand.name),
            "price": self.money(100, 50_000),
            "brand_name": brand.name,
            "catalogue_name": catalogue.name,
        })
    }

    fn provider(&mut self) -> JsonValue {
        let last = self.pick(LAST_NAMES);
        let kind = self.pick(SUPPLIER_SUFFIXES);
        let name = format!("{last} {kind} {}", self.suffix());
        json!({
            "name": name,
            "email": format!("orders@{}.example.com", last.to_lowercase()),
            "phone": self.phone(),
            "address": self.address(),
        })
    }

    fn entry(&mut self, provider: &Provider) -> JsonValue {
        json!({ "provider_name": provider.name })
    }

    fn purchase(&mut self, entry: &RecordId, product: &Product) -> JsonValue {
        json!({
            "entry_id": entry,
            "product_code": product.code,
            "quantity": self.rng.gen_range(1..=50),
            "cost": self.money(50, 25_000),
        })
    }

    fn exit(&mut self) -> JsonValue {
        json!({})
    }

    fn sale(&mut self, exit: &RecordId, product: &Product) -> JsonValue {
        json!({
            "exit_id": exit,
            "product_code": product.code,
            "quantity": self.rng.gen_range(1..=10),
            "price": self.money(100, 50_000),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn factory() -> FakeDataFactory {
        FakeDataFactory::from_rng(StdRng::seed_from_u64(42))
    }

    #[test]
    fn references_come_from_arguments() {
        let mut f = factory();
        let brand = Brand { name: "Acme 01".into() };
        let catalogue = Catalogue { name: "Garden 02".into() };
        let product = f.product(&brand, &catalogue);
        assert_eq!(product["brand_name"], "Acme 01");
        assert_eq!(product["catalogue_name"], "Garden 02");

        let code = Product { code: "PRD-X".into(), name: None };
        let purchase = f.purchase(&RecordId::Int(9), &code);
        assert_eq!(purchase["entry_id"], 9);
        assert_eq!(purchase["product_code"], "PRD-X");

        let sale = f.sale(&RecordId::from("ex-1"), &code);
        assert_eq!(sale["exit_id"], "ex-1");
    }

    #[test]
    fn unique_names_do_not_repeat() {
        let mut f = factory();
        let names: std::collections::BTreeSet<_> = (0..50)
            .map(|_| f.brand()["name"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(names.len(), 50);
    }

    #[test]
    fn money_fields_have_two_decimals() {
        let mut f = factory();
        for _ in 0..20 {
            let price = f.money(100, 999);
            let (_, cents) = price.split_once('.').unwrap();
            assert_eq!(cents.len(), 2);
        }
    }

    #[test]
    fn actor_payload_carries_role_and_credentials() {
        let mut f = factory();
        let creds = Credentials::new("admin_dp", "admin1234admin");
        let payload = f.actor(&creds, ActorRole::Admin);
        assert_eq!(payload["username"], "admin_dp");
        assert_eq!(payload["password"], "admin1234admin");
        assert_eq!(payload["role"], "admin");
    }
}
