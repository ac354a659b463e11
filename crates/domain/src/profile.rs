//! Customer profile record served by the storefront backend.

use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize};

/// Avatar shown when the backend has no picture for the user.
pub const DEFAULT_AVATAR: &str = "assets/img/user.png";

/// Profile of a storefront customer (`GET /usuarios/{id}`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Avatar path or URL.
    #[serde(rename = "imagen", default = "default_avatar", deserialize_with = "avatar_or_default")]
    pub image: String,
    /// Full name.
    #[serde(rename = "nombre")]
    pub name: String,
    /// Contact email.
    pub email: String,
    /// Registration date.
    #[serde(
        rename = "fechaRegistro",
        default,
        deserialize_with = "optional_date",
        skip_serializing_if = "Option::is_none"
    )]
    pub member_since: Option<NaiveDate>,
    /// Street address.
    #[serde(rename = "direccion", default)]
    pub address: Option<String>,
    /// City.
    #[serde(rename = "ciudad", default)]
    pub city: Option<String>,
    /// State or department.
    #[serde(rename = "departamento", default)]
    pub state: Option<String>,
    /// Country.
    #[serde(rename = "pais", default)]
    pub country: Option<String>,
    /// Masked payment method description.
    #[serde(rename = "metodoPago", default)]
    pub payment_method: Option<String>,
    /// Past orders.
    #[serde(rename = "pedidos", default, deserialize_with = "orders_or_empty")]
    pub orders: Vec<OrderSummary>,
}

/// One past order on the profile page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSummary {
    /// Order id.
    pub id: u64,
    /// Number of items.
    #[serde(rename = "articulos")]
    pub items: u32,
    /// Delivery date.
    #[serde(
        rename = "fechaEntrega",
        default,
        deserialize_with = "optional_date",
        skip_serializing_if = "Option::is_none"
    )]
    pub delivered_on: Option<NaiveDate>,
}

impl UserProfile {
    /// Demo profile shown when the backend cannot be reached.
    #[must_use]
    pub fn placeholder() -> Self {
        Self {
            image: DEFAULT_AVATAR.to_string(),
            name: "Usuario de Prueba".to_string(),
            email: "usuario@demo.com".to_string(),
            member_since: NaiveDate::from_ymd_opt(2024, 1, 1),
            address: Some("Calle Falsa 123".to_string()),
            city: Some("Bogotá".to_string()),
            state: Some("Cundinamarca".to_string()),
            country: Some("Colombia".to_string()),
            payment_method: Some("Tarjeta Visa terminada en 1234".to_string()),
            orders: vec![
                OrderSummary {
                    id: 1,
                    items: 2,
                    delivered_on: NaiveDate::from_ymd_opt(2024, 5, 10),
                },
                OrderSummary {
                    id: 2,
                    items: 1,
                    delivered_on: NaiveDate::from_ymd_opt(2024, 6, 21),
                },
            ],
        }
    }
}

fn default_avatar() -> String {
    DEFAULT_AVATAR.to_string()
}

fn avatar_or_default<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let image = Option::<String>::deserialize(deserializer)?;
    Ok(image
        .filter(|value| !value.is_empty())
        .unwrap_or_else(default_avatar))
}

fn orders_or_empty<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Vec<OrderSummary>, D::Error> {
    Ok(Option::<Vec<OrderSummary>>::deserialize(deserializer)?.unwrap_or_default())
}

// Backends send either a plain date or a full RFC 3339 timestamp.
fn optional_date<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<NaiveDate>, D::Error> {
    let Some(raw) = Option::<String>::deserialize(deserializer)? else {
        return Ok(None);
    };
    if let Ok(date) = NaiveDate::parse_from_str(&raw, "%Y-%m-%d") {
        return Ok(Some(date));
    }
    DateTime::parse_from_rfc3339(&raw)
        .map(|timestamp| Some(timestamp.date_naive()))
        .map_err(serde::de::Error::custom)
}
