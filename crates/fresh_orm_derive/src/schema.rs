mod error;
pub(crate) use error::ErrorSet;

mod field;
pub(crate) use field::{option_inner, Field};

mod model;
pub(crate) use model::Model;
