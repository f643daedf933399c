//! Outcome notifications and their publisher.
//!
//! Exactly one notification is published per processed command. Failure
//! notifications carry a message only, never aggregate state.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use pantry_core::channel::MessageSink;
use pantry_core::error::DomainError;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::application::views::ProductView;
use crate::domain::commands::CommandKind;

/// Key under which success notifications carry the product.
pub const PRODUCT_PROPERTY_KEY: &str = "product";

/// Outcome codes published on the notification channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationCode {
    /// A product was created.
    ProductCreated,
    /// A create command failed.
    ProductCreatedError,
    /// A product was updated.
    ProductUpdated,
    /// An update command failed.
    ProductUpdatedError,
    /// A product was removed.
    ProductRemoved,
    /// A delete command failed.
    ProductRemovedError,
}

impl NotificationCode {
    /// The failure code reported for a command of the given kind.
    #[must_use]
    pub fn failure_for(kind: CommandKind) -> Self {
        match kind {
            CommandKind::Create => Self::ProductCreatedError,
            CommandKind::Update => Self::ProductUpdatedError,
            CommandKind::Delete => Self::ProductRemovedError,
        }
    }

    /// Whether this code reports a failed command.
    #[must_use]
    pub fn is_failure(self) -> bool {
        matches!(
            self,
            Self::ProductCreatedError | Self::ProductUpdatedError | Self::ProductRemovedError
        )
    }

    /// Returns the wire name of the code.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ProductCreated => "PRODUCT_CREATED",
            Self::ProductCreatedError => "PRODUCT_CREATED_ERROR",
            Self::ProductUpdated => "PRODUCT_UPDATED",
            Self::ProductUpdatedError => "PRODUCT_UPDATED_ERROR",
            Self::ProductRemoved => "PRODUCT_REMOVED",
            Self::ProductRemovedError => "PRODUCT_REMOVED_ERROR",
        }
    }
}

impl fmt::Display for NotificationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single outcome event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    message: String,
    code: NotificationCode,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    properties: BTreeMap<String, serde_json::Value>,
}

impl Notification {
    /// A product was created.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if the view cannot be serialized.
    pub fn created(product: &ProductView) -> Result<Self, DomainError> {
        Self::with_product(
            NotificationCode::ProductCreated,
            format!("New product was created ({})", product.name),
            product,
        )
    }

    /// A product was updated.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if the view cannot be serialized.
    pub fn updated(product: &ProductView) -> Result<Self, DomainError> {
        Self::with_product(
            NotificationCode::ProductUpdated,
            format!("Product was updated ({})", product.name),
            product,
        )
    }

    /// A product was removed. Only the name is reported.
    #[must_use]
    pub fn removed(name: &str) -> Self {
        Self {
            message: format!("Product was removed ({name})"),
            code: NotificationCode::ProductRemoved,
            properties: BTreeMap::new(),
        }
    }

    /// A command of the given kind failed.
    #[must_use]
    pub fn failed(kind: CommandKind, error: &DomainError) -> Self {
        Self {
            message: error.to_string(),
            code: NotificationCode::failure_for(kind),
            properties: BTreeMap::new(),
        }
    }

    fn with_product(
        code: NotificationCode,
        message: String,
        product: &ProductView,
    ) -> Result<Self, DomainError> {
        let value = serde_json::to_value(product).map_err(|e| {
            DomainError::Infrastructure(format!("product serialization failed: {e}"))
        })?;
        Ok(Self {
            message,
            code,
            properties: BTreeMap::from([(PRODUCT_PROPERTY_KEY.to_owned(), value)]),
        })
    }

    /// Human-readable outcome message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Outcome code.
    #[must_use]
    pub fn code(&self) -> NotificationCode {
        self.code
    }

    /// Additional properties; empty for removals and failures.
    #[must_use]
    pub fn properties(&self) -> &BTreeMap<String, serde_json::Value> {
        &self.properties
    }

    /// The product carried by a success notification.
    #[must_use]
    pub fn product(&self) -> Option<&serde_json::Value> {
        self.properties.get(PRODUCT_PROPERTY_KEY)
    }
}

/// Encodes notifications and emits them on the notification channel.
#[derive(Clone)]
pub struct NotificationPublisher {
    sink: Arc<dyn MessageSink>,
}

impl fmt::Debug for NotificationPublisher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotificationPublisher").finish_non_exhaustive()
    }
}

impl NotificationPublisher {
    /// Creates a publisher on top of a transport sink.
    #[must_use]
    pub fn new(sink: Arc<dyn MessageSink>) -> Self {
        Self { sink }
    }

    /// Emits one notification.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Transport` if encoding or sending fails.
    pub async fn publish(&self, notification: &Notification) -> Result<(), DomainError> {
        let payload = serde_json::to_vec(notification).map_err(|e| {
            DomainError::Transport(format!("notification encoding failed: {e}"))
        })?;
        self.sink.send(payload).await?;
        debug!(code = %notification.code, "notification published");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use chrono::{TimeZone, Utc};
    use uuid::Uuid;

    use super::*;
    use crate::domain::aggregates::ProductType;

    fn potato_view() -> ProductView {
        let fixed_now = Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap();
        ProductView {
            id: Uuid::new_v4(),
            name: "Potato".to_owned(),
            kcal: 73.0,
            product_type: ProductType::FruitsAndVegetables,
            properties: BTreeMap::from([("KCAL_AFTER_BOILED".to_owned(), "66.0".to_owned())]),
            created_date: fixed_now,
            last_updated_date: fixed_now,
            version: 0,
        }
    }

    #[test]
    fn test_created_notification_carries_product_under_fixed_key() {
        let view = potato_view();

        let notification = Notification::created(&view).unwrap();

        assert_eq!(notification.code(), NotificationCode::ProductCreated);
        assert_eq!(notification.message(), "New product was created (Potato)");
        let product = notification.product().unwrap();
        assert_eq!(product["name"], "Potato");
        assert_eq!(product["type"], "FRUITS_AND_VEGETABLES");
        assert_eq!(product["properties"]["KCAL_AFTER_BOILED"], "66.0");
        assert_eq!(product["version"], 0);
    }

    #[test]
    fn test_removed_notification_has_no_properties() {
        let notification = Notification::removed("Potato");

        assert_eq!(notification.code(), NotificationCode::ProductRemoved);
        assert_eq!(notification.message(), "Product was removed (Potato)");
        assert!(notification.properties().is_empty());
    }

    #[test]
    fn test_failed_notification_maps_kind_to_error_code_without_payload() {
        let id = Uuid::new_v4();
        let error = DomainError::NotFound(id);

        for (kind, code) in [
            (CommandKind::Create, NotificationCode::ProductCreatedError),
            (CommandKind::Update, NotificationCode::ProductUpdatedError),
            (CommandKind::Delete, NotificationCode::ProductRemovedError),
        ] {
            let notification = Notification::failed(kind, &error);

            assert_eq!(notification.code(), code);
            assert!(notification.code().is_failure());
            assert_eq!(notification.message(), format!("product not found by id {id}"));
            assert!(notification.product().is_none());
        }
    }

    #[test]
    fn test_wire_shape_omits_empty_properties() {
        let notification = Notification::removed("Potato");

        let json = serde_json::to_value(&notification).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "message": "Product was removed (Potato)",
                "code": "PRODUCT_REMOVED"
            })
        );
    }

    #[test]
    fn test_success_codes_are_not_failures() {
        assert!(!NotificationCode::ProductCreated.is_failure());
        assert!(!NotificationCode::ProductUpdated.is_failure());
        assert!(!NotificationCode::ProductRemoved.is_failure());
    }
}
