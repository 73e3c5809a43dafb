pub mod aggregate;
pub mod cache;
pub mod cancel;
pub mod error;
pub mod models;
pub mod nutritionix;
pub mod resolver;
pub mod service;
pub mod snapshot;
pub mod storage;
pub mod store;
