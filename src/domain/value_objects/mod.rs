mod checksum;
mod indices;
mod match_method;
mod property_value;

pub use checksum::Checksum;
pub use indices::{
    ComponentIndex, NodeIndex, ProfileIndex, PropertyIndex, SignatureIndex, StringIndex,
    ValueIndex, NO_INDEX,
};
pub use match_method::MatchMethod;
pub use property_value::{PropertyValue, ValueLiteral};
