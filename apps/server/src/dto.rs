//! # Request / Response Bodies
//!
//! JSON shapes of the HTTP API and their conversion to domain types.
//!
//! ## Wire Conventions
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Client JSON                         Domain                             │
//! │  ───────────                         ──────                             │
//! │  "price": 3.5          ──────────►   Money::from_cents(350)            │
//! │  "total_amount": "7.00" ─────────►   Money::from_cents(700)            │
//! │  "quantity": "2"       ──────────►   2_i64                             │
//! │  "id": 1  or  "product_id": 1 ───►   CartLine.product_id               │
//! │                                                                         │
//! │  Money::from_cents(700) ─────────►   "total": 7.0                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Catalog and ledger objects go out in snake_case (`stock_quantity`,
//! `total_amount`). The commit, create and stats acknowledgements use the
//! camelCase keys the register client reads (`saleId`, `orderCount`).

use axum::extract::rejection::JsonRejection;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ApiError;
use tally_core::{
    CartLine, DayStats, Money, NewOrder, Order, OrderLine, OrderType, Product, ProductInput,
    ValidationError,
};

// =============================================================================
// Lenient Number Decoding
// =============================================================================

/// A JSON number, or a string holding one.
#[derive(Deserialize)]
#[serde(untagged)]
enum Numeric {
    Int(i64),
    Float(f64),
    Text(String),
}

impl Numeric {
    /// `Ok(None)` for a blank string.
    fn as_f64(&self) -> Result<Option<f64>, String> {
        match self {
            Numeric::Int(n) => Ok(Some(*n as f64)),
            Numeric::Float(n) => Ok(Some(*n)),
            Numeric::Text(s) if s.trim().is_empty() => Ok(None),
            Numeric::Text(s) => s
                .trim()
                .parse::<f64>()
                .map(Some)
                .map_err(|_| format!("'{s}' is not a number")),
        }
    }

    fn as_i64(&self) -> Result<Option<i64>, String> {
        match self {
            Numeric::Int(n) => Ok(Some(*n)),
            Numeric::Float(n) if n.fract() == 0.0 && n.abs() < i64::MAX as f64 => {
                Ok(Some(*n as i64))
            }
            Numeric::Float(n) => Err(format!("{n} is not a whole number")),
            Numeric::Text(s) if s.trim().is_empty() => Ok(None),
            Numeric::Text(s) => s
                .trim()
                .parse::<i64>()
                .map(Some)
                .map_err(|_| format!("'{s}' is not a whole number")),
        }
    }
}

/// Decimal amount (number or numeric string) into [`Money`].
fn lenient_money<'de, D>(deserializer: D) -> Result<Option<Money>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(raw) = Option::<Numeric>::deserialize(deserializer)? else {
        return Ok(None);
    };
    match raw.as_f64().map_err(serde::de::Error::custom)? {
        None => Ok(None),
        Some(amount) => Money::from_decimal(amount)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("{amount} is not a valid amount"))),
    }
}

/// Integer (number or numeric string).
fn lenient_int<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Numeric>::deserialize(deserializer)? {
        None => Ok(None),
        Some(raw) => raw.as_i64().map_err(serde::de::Error::custom),
    }
}

/// Body decoding failures are input errors.
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::validation(rejection.body_text())
    }
}

fn required(field: &str) -> ValidationError {
    ValidationError::Required {
        field: field.to_string(),
    }
}

/// Blank and missing optional strings are the same thing.
fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn parse_order_type(value: Option<&str>) -> Result<Option<OrderType>, ValidationError> {
    match value.map(str::trim).filter(|s| !s.is_empty()) {
        Some(label) => label.parse().map(Some),
        None => Ok(None),
    }
}

// =============================================================================
// Products
// =============================================================================

/// Body of `POST /api/products` and `PUT /api/products/{id}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductRequest {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_money")]
    pub price: Option<Money>,
    pub sku: Option<String>,
    #[serde(default, deserialize_with = "lenient_int")]
    pub stock_quantity: Option<i64>,
}

impl ProductRequest {
    /// Converts to a catalog entry. Name and price are required; stock
    /// defaults to 0.
    pub fn into_input(self) -> Result<ProductInput, ApiError> {
        let name = non_blank(self.name);
        let (Some(name), Some(price)) = (name, self.price) else {
            return Err(ApiError::validation("Name and price are required."));
        };

        Ok(ProductInput {
            name,
            price,
            sku: non_blank(self.sku),
            stock_quantity: self.stock_quantity.unwrap_or(0),
        })
    }
}

/// A catalog entry as sent to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductDto {
    pub id: i64,
    pub name: String,
    pub price: f64,
    pub sku: Option<String>,
    pub stock_quantity: i64,
}

impl From<Product> for ProductDto {
    fn from(product: Product) -> Self {
        ProductDto {
            id: product.id,
            name: product.name,
            price: product.price.to_decimal(),
            sku: product.sku,
            stock_quantity: product.stock_quantity,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductResponse {
    pub message: String,
    pub product_id: i64,
}

// =============================================================================
// Orders
// =============================================================================

/// One cart line of `POST /api/sales`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CartItemRequest {
    /// Older clients send the product id as `id`.
    #[serde(default, alias = "id", deserialize_with = "lenient_int")]
    pub product_id: Option<i64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_money")]
    pub price: Option<Money>,
    #[serde(default, deserialize_with = "lenient_int")]
    pub quantity: Option<i64>,
}

impl CartItemRequest {
    fn into_line(self) -> Result<CartLine, ValidationError> {
        Ok(CartLine {
            product_id: self.product_id.ok_or_else(|| required("product_id"))?,
            name: self.name.unwrap_or_default(),
            price: self.price.ok_or_else(|| required("price"))?,
            quantity: self.quantity.ok_or_else(|| required("quantity"))?,
        })
    }
}

/// Body of `POST /api/sales`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CommitOrderRequest {
    #[serde(default)]
    pub items: Vec<CartItemRequest>,
    #[serde(default, deserialize_with = "lenient_money")]
    pub total_amount: Option<Money>,
    #[serde(default, deserialize_with = "lenient_money")]
    pub tax_amount: Option<Money>,
    pub order_type: Option<String>,
    pub payment_method: Option<String>,
}

impl CommitOrderRequest {
    /// Builds the order to commit, stamped with `date_time`.
    ///
    /// Tax defaults to zero and order type to dine-in. An unrecognized order
    /// type is rejected rather than defaulted.
    pub fn into_new_order(self, date_time: DateTime<Utc>) -> Result<NewOrder, ValidationError> {
        let lines = self
            .items
            .into_iter()
            .map(CartItemRequest::into_line)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(NewOrder {
            lines,
            total_amount: self.total_amount.ok_or_else(|| required("total_amount"))?,
            tax_amount: self.tax_amount.unwrap_or_default(),
            order_type: parse_order_type(self.order_type.as_deref())?.unwrap_or_default(),
            payment_method: non_blank(self.payment_method),
            date_time,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitResponse {
    pub message: String,
    pub sale_id: i64,
    pub total: f64,
    pub order_type: OrderType,
}

/// Body of `PUT /api/orders/{id}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateOrderRequest {
    #[serde(default, deserialize_with = "lenient_money")]
    pub total_amount: Option<Money>,
    pub order_type: Option<String>,
}

impl UpdateOrderRequest {
    /// Both fields are replaced, so both are required.
    pub fn into_parts(self) -> Result<(Money, OrderType), ValidationError> {
        let total = self.total_amount.ok_or_else(|| required("total_amount"))?;
        let order_type =
            parse_order_type(self.order_type.as_deref())?.ok_or_else(|| required("order_type"))?;
        Ok((total, order_type))
    }
}

/// A line of an order, as listed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItemDto {
    pub sale_id: i64,
    pub product_id: i64,
    pub quantity: i64,
    pub name: Option<String>,
    pub price_at_sale: f64,
}

impl From<OrderLine> for OrderItemDto {
    fn from(line: OrderLine) -> Self {
        OrderItemDto {
            sale_id: line.sale_id,
            product_id: line.product_id,
            quantity: line.quantity,
            name: line.name,
            price_at_sale: line.price_at_sale.to_decimal(),
        }
    }
}

/// A committed order with its lines, as listed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderDto {
    pub id: i64,
    pub total_amount: f64,
    pub tax_amount: f64,
    pub order_type: OrderType,
    pub payment_method: Option<String>,
    /// RFC 3339, UTC (`2024-03-10T12:00:00Z`).
    pub date_time: String,
    pub items: Vec<OrderItemDto>,
}

impl From<Order> for OrderDto {
    fn from(order: Order) -> Self {
        let sale = order.sale;
        OrderDto {
            id: sale.id,
            total_amount: sale.total_amount.to_decimal(),
            tax_amount: sale.tax_amount.to_decimal(),
            order_type: sale.order_type,
            payment_method: sale.payment_method,
            date_time: sale.date_time.to_rfc3339_opts(SecondsFormat::Secs, true),
            items: order.items.into_iter().map(OrderItemDto::from).collect(),
        }
    }
}

// =============================================================================
// Stats & Misc
// =============================================================================

/// Query string of `GET /api/daystats`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatsQuery {
    pub period: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    pub total_sales: f64,
    pub order_count: i64,
}

impl From<DayStats> for StatsResponse {
    fn from(stats: DayStats) -> Self {
        StatsResponse {
            total_sales: stats.total_sales.to_decimal(),
            order_count: stats.order_count,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        MessageResponse {
            message: message.into(),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
