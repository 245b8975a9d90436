// Core modules implementing row layout, packing storage, views, and error modeling.
pub mod column;
pub mod error;
pub mod missing;
pub mod order;
pub mod schema;
pub mod storage;
pub mod view;
