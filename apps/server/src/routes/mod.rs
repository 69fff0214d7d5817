//! # HTTP Routes
//!
//! ```text
//! GET    /api/test              liveness check
//! GET    /api/products          list catalog
//! POST   /api/products          create product
//! PUT    /api/products/{id}     replace product
//! DELETE /api/products/{id}     delete product
//! POST   /api/sales             commit an order
//! GET    /api/orders            list orders with items
//! PUT    /api/orders/{id}       edit total / order type
//! DELETE /api/orders/{id}       delete order and its items
//! GET    /api/daystats          totals for today | 3days | 7days
//! ```
//!
//! Each module exposes `router()`; [`crate::build_router`] merges them.

pub mod health;
pub mod orders;
pub mod products;
pub mod sales;
pub mod stats;
