mod node;
mod profile;
mod property;
mod signature;

pub use node::{Node, MAX_NUMERIC_DIGITS};
pub(crate) use node::parse_numeric;
pub use profile::Profile;
pub use property::{Component, Property, Value};
pub use signature::Signature;
