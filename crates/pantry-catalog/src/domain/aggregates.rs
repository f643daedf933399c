//! Aggregate root for the Product Catalog context.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use pantry_core::aggregate::AggregateRoot;
use pantry_core::error::DomainError;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::properties::reconcile;

/// Maximum length, in characters, of product names and property text.
pub const MAX_TEXT_LENGTH: usize = 255;

/// Closed set of product categories.
///
/// `FRUITS_AND_VEGETABLES` is the category existing producers already send.
/// The rest are this catalog's own grouping of common pantry goods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProductType {
    /// Fresh produce.
    FruitsAndVegetables,
    /// Grains, flours and cereals.
    GrainsAndCereals,
    /// Milk products and eggs.
    DairyAndEggs,
    /// Meat and poultry.
    MeatAndPoultry,
    /// Fish and seafood.
    FishAndSeafood,
    /// Beans, lentils and peas.
    Legumes,
    /// Nuts and seeds.
    NutsAndSeeds,
    /// Fats and oils.
    FatsAndOils,
    /// Sweets and snacks.
    SweetsAndSnacks,
    /// Drinks.
    Beverages,
    /// Anything else.
    Other,
}

impl ProductType {
    /// Every category, in declaration order.
    pub const ALL: [Self; 11] = [
        Self::FruitsAndVegetables,
        Self::GrainsAndCereals,
        Self::DairyAndEggs,
        Self::MeatAndPoultry,
        Self::FishAndSeafood,
        Self::Legumes,
        Self::NutsAndSeeds,
        Self::FatsAndOils,
        Self::SweetsAndSnacks,
        Self::Beverages,
        Self::Other,
    ];

    /// Returns the persisted and wire name of the category.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::FruitsAndVegetables => "FRUITS_AND_VEGETABLES",
            Self::GrainsAndCereals => "GRAINS_AND_CEREALS",
            Self::DairyAndEggs => "DAIRY_AND_EGGS",
            Self::MeatAndPoultry => "MEAT_AND_POULTRY",
            Self::FishAndSeafood => "FISH_AND_SEAFOOD",
            Self::Legumes => "LEGUMES",
            Self::NutsAndSeeds => "NUTS_AND_SEEDS",
            Self::FatsAndOils => "FATS_AND_OILS",
            Self::SweetsAndSnacks => "SWEETS_AND_SNACKS",
            Self::Beverages => "BEVERAGES",
            Self::Other => "OTHER",
        }
    }
}

impl fmt::Display for ProductType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProductType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|product_type| product_type.as_str() == s)
            .ok_or_else(|| DomainError::Validation(format!("unknown product type: {s}")))
    }
}

/// A named custom property owned by exactly one product.
///
/// Equality, ordering and hashing consider the name only, so a property set
/// holds at most one property per name.
#[derive(Debug, Clone)]
pub struct CustomProperty {
    /// Store-assigned identifier; `None` until persisted.
    pub id: Option<Uuid>,
    /// The owning product; `None` while the owner is still a draft.
    pub product_id: Option<Uuid>,
    /// Property name, unique within the owning product.
    pub name: String,
    /// Property value.
    pub value: String,
}

impl CustomProperty {
    /// Checks the name and value length invariants.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the name or value is empty or
    /// longer than [`MAX_TEXT_LENGTH`] characters.
    pub fn validate(&self) -> Result<(), DomainError> {
        check_text("property name", &self.name)?;
        check_text("property value", &self.value)
    }
}

impl PartialEq for CustomProperty {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for CustomProperty {}

impl Hash for CustomProperty {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl PartialOrd for CustomProperty {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CustomProperty {
    fn cmp(&self, other: &Self) -> Ordering {
        self.name.cmp(&other.name)
    }
}

/// A product that has not been persisted yet.
///
/// Identity, version and timestamps are assigned by the store on insert.
#[derive(Debug, Clone)]
pub struct NewProduct {
    /// Product name.
    pub name: String,
    /// Energy per 100 g.
    pub kcal: f64,
    /// Product category.
    pub product_type: ProductType,
    /// Custom properties, unbound to any owner yet.
    pub properties: BTreeSet<CustomProperty>,
}

impl NewProduct {
    /// Builds a validated draft from command input.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if any field invariant is violated.
    pub fn new(
        name: String,
        kcal: f64,
        product_type: ProductType,
        properties: &BTreeMap<String, String>,
    ) -> Result<Self, DomainError> {
        let draft = Self {
            name,
            kcal,
            product_type,
            properties: reconcile(properties, None),
        };
        draft.validate()?;
        Ok(draft)
    }

    /// Checks every field invariant of the draft.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` on the first violated invariant.
    pub fn validate(&self) -> Result<(), DomainError> {
        check_text("name", &self.name)?;
        check_kcal(self.kcal)?;
        self.properties.iter().try_for_each(CustomProperty::validate)
    }
}

/// The aggregate root for a catalog product.
#[derive(Debug, Clone)]
pub struct Product {
    /// Aggregate identifier.
    pub id: Uuid,
    /// Product name.
    pub name: String,
    /// Energy per 100 g.
    pub kcal: f64,
    /// Product category.
    pub product_type: ProductType,
    /// Custom properties owned by this product.
    pub properties: BTreeSet<CustomProperty>,
    /// Optimistic concurrency version (store-managed).
    pub version: i64,
    /// Set once on insert (store-managed).
    pub created_date: DateTime<Utc>,
    /// Set on insert and on every update (store-managed).
    pub last_updated_date: DateTime<Utc>,
}

impl Product {
    /// Overwrites the mutable fields and replaces the whole property set.
    ///
    /// Properties missing from `properties` are dropped, the rest are
    /// recreated without their previous identifiers. Nothing changes if the
    /// input is invalid.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if any field invariant is violated.
    pub fn revise(
        &mut self,
        name: String,
        kcal: f64,
        product_type: ProductType,
        properties: &BTreeMap<String, String>,
    ) -> Result<(), DomainError> {
        check_text("name", &name)?;
        check_kcal(kcal)?;
        let replacement = reconcile(properties, Some(self.id));
        replacement.iter().try_for_each(CustomProperty::validate)?;

        self.name = name;
        self.kcal = kcal;
        self.product_type = product_type;
        self.properties.clear();
        self.properties.extend(replacement);
        Ok(())
    }

    /// Checks every field invariant of the aggregate.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` on the first violated invariant.
    pub fn validate(&self) -> Result<(), DomainError> {
        check_text("name", &self.name)?;
        check_kcal(self.kcal)?;
        self.properties.iter().try_for_each(CustomProperty::validate)
    }

    /// Returns the properties as a flat name-to-value map.
    #[must_use]
    pub fn property_map(&self) -> BTreeMap<String, String> {
        self.properties
            .iter()
            .map(|property| (property.name.clone(), property.value.clone()))
            .collect()
    }
}

impl AggregateRoot for Product {
    fn aggregate_id(&self) -> Uuid {
        self.id
    }

    fn version(&self) -> i64 {
        self.version
    }
}

fn check_text(field: &str, text: &str) -> Result<(), DomainError> {
    let length = text.chars().count();
    if length == 0 || length > MAX_TEXT_LENGTH {
        return Err(DomainError::Validation(format!(
            "{field} must be between 1 and {MAX_TEXT_LENGTH} characters, got {length}"
        )));
    }
    Ok(())
}

fn check_kcal(kcal: f64) -> Result<(), DomainError> {
    if !kcal.is_finite() || kcal < 0.0 {
        return Err(DomainError::Validation(format!(
            "kcal must be a non-negative number, got {kcal}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn flat(entries: &[(&str, &str)]) -> BTreeMap<String, String> {
        entries
            .iter()
            .map(|(name, value)| ((*name).to_owned(), (*value).to_owned()))
            .collect()
    }

    fn persisted_product(properties: &[(&str, &str)]) -> Product {
        let id = Uuid::new_v4();
        let fixed_now = Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap();
        Product {
            id,
            name: "Potato".to_owned(),
            kcal: 73.0,
            product_type: ProductType::FruitsAndVegetables,
            properties: properties
                .iter()
                .map(|(name, value)| CustomProperty {
                    id: Some(Uuid::new_v4()),
                    product_id: Some(id),
                    name: (*name).to_owned(),
                    value: (*value).to_owned(),
                })
                .collect(),
            version: 3,
            created_date: fixed_now,
            last_updated_date: fixed_now,
        }
    }

    #[test]
    fn test_product_type_round_trips_through_its_name() {
        for product_type in ProductType::ALL {
            assert_eq!(product_type.as_str().parse::<ProductType>().unwrap(), product_type);
        }
    }

    #[test]
    fn test_product_type_rejects_unknown_name() {
        let result = "CANDY".parse::<ProductType>();

        assert!(matches!(result, Err(DomainError::Validation(_))));
    }

    #[test]
    fn test_product_type_serializes_in_screaming_snake_case() {
        let json = serde_json::to_value(ProductType::FruitsAndVegetables).unwrap();

        assert_eq!(json, "FRUITS_AND_VEGETABLES");
    }

    #[test]
    fn test_new_product_accepts_valid_input() {
        // Arrange
        let properties = flat(&[("KCAL_AFTER_BOILED", "66.0")]);

        // Act
        let draft = NewProduct::new(
            "Potato".to_owned(),
            73.0,
            ProductType::FruitsAndVegetables,
            &properties,
        )
        .unwrap();

        // Assert
        assert_eq!(draft.name, "Potato");
        assert_eq!(draft.properties.len(), 1);
        let property = draft.properties.iter().next().unwrap();
        assert_eq!(property.name, "KCAL_AFTER_BOILED");
        assert_eq!(property.value, "66.0");
        assert!(property.id.is_none());
        assert!(property.product_id.is_none());
    }

    #[test]
    fn test_new_product_rejects_empty_name() {
        let result = NewProduct::new(String::new(), 10.0, ProductType::Other, &BTreeMap::new());

        assert!(matches!(result, Err(DomainError::Validation(_))));
    }

    #[test]
    fn test_new_product_rejects_name_longer_than_limit() {
        let name = "x".repeat(MAX_TEXT_LENGTH + 1);

        let result = NewProduct::new(name, 10.0, ProductType::Other, &BTreeMap::new());

        assert!(matches!(result, Err(DomainError::Validation(_))));
    }

    #[test]
    fn test_new_product_accepts_name_at_limit_counted_in_characters() {
        let name = "ż".repeat(MAX_TEXT_LENGTH);

        let result = NewProduct::new(name, 10.0, ProductType::Other, &BTreeMap::new());

        assert!(result.is_ok());
    }

    #[test]
    fn test_new_product_rejects_negative_kcal() {
        let result = NewProduct::new("Oil".to_owned(), -1.0, ProductType::FatsAndOils, &BTreeMap::new());

        assert!(matches!(result, Err(DomainError::Validation(_))));
    }

    #[test]
    fn test_new_product_rejects_non_finite_kcal() {
        let result = NewProduct::new(
            "Oil".to_owned(),
            f64::NAN,
            ProductType::FatsAndOils,
            &BTreeMap::new(),
        );

        assert!(matches!(result, Err(DomainError::Validation(_))));
    }

    #[test]
    fn test_new_product_rejects_empty_property_value() {
        let properties = flat(&[("ORIGIN", "")]);

        let result = NewProduct::new("Apple".to_owned(), 52.0, ProductType::FruitsAndVegetables, &properties);

        assert!(matches!(result, Err(DomainError::Validation(_))));
    }

    #[test]
    fn test_revise_replaces_the_whole_property_set() {
        // Arrange
        let mut product = persisted_product(&[("A", "1"), ("B", "2")]);
        let incoming = flat(&[("B", "9"), ("C", "3")]);

        // Act
        product
            .revise("Potato".to_owned(), 73.0, ProductType::FruitsAndVegetables, &incoming)
            .unwrap();

        // Assert
        assert_eq!(product.property_map(), incoming);
        assert!(product.properties.iter().all(|p| p.id.is_none()));
        assert!(product.properties.iter().all(|p| p.product_id == Some(product.id)));
    }

    #[test]
    fn test_revise_overwrites_scalar_fields_and_keeps_store_managed_ones() {
        // Arrange
        let mut product = persisted_product(&[]);
        let created = product.created_date;

        // Act
        product
            .revise("Potato_updated".to_owned(), 74.0, ProductType::Other, &BTreeMap::new())
            .unwrap();

        // Assert
        assert_eq!(product.name, "Potato_updated");
        assert!((product.kcal - 74.0).abs() < f64::EPSILON);
        assert_eq!(product.product_type, ProductType::Other);
        assert_eq!(product.version, 3);
        assert_eq!(product.created_date, created);
    }

    #[test]
    fn test_revise_leaves_product_untouched_on_invalid_input() {
        // Arrange
        let mut product = persisted_product(&[("A", "1")]);
        let incoming = flat(&[("B", "")]);

        // Act
        let result = product.revise("Other".to_owned(), 1.0, ProductType::Other, &incoming);

        // Assert
        assert!(matches!(result, Err(DomainError::Validation(_))));
        assert_eq!(product.name, "Potato");
        assert_eq!(product.property_map(), flat(&[("A", "1")]));
    }

    #[test]
    fn test_properties_with_same_name_collapse_to_one() {
        let mut set = BTreeSet::new();
        set.insert(CustomProperty {
            id: Some(Uuid::new_v4()),
            product_id: None,
            name: "ORIGIN".to_owned(),
            value: "PL".to_owned(),
        });
        set.insert(CustomProperty {
            id: Some(Uuid::new_v4()),
            product_id: None,
            name: "ORIGIN".to_owned(),
            value: "DE".to_owned(),
        });

        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_aggregate_root_exposes_identity_and_version() {
        let product = persisted_product(&[]);

        assert_eq!(product.aggregate_id(), product.id);
        assert_eq!(AggregateRoot::version(&product), 3);
    }
}
