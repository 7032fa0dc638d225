// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

pub mod controller;
pub mod export;
pub mod filter;
pub mod forms;
pub mod ids;
pub mod model;
pub mod notice;
pub mod pager;
pub mod schema;
pub mod session;
pub mod sync;

pub use controller::*;
pub use export::*;
pub use filter::*;
pub use forms::*;
pub use ids::*;
pub use model::*;
pub use notice::*;
pub use pager::*;
pub use schema::*;
pub use session::*;
pub use sync::*;
