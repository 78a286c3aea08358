//! SDP (RFC 4566) document model and text codec
//!
//! [`SessionDescription::parse`] turns SDP text into a document model;
//! `Display` serializes it back in the fixed RFC field order. Parsing a
//! serialized document yields an equal document, including attribute
//! insertion order.

pub mod attributes;
pub mod connection;
pub mod media;
pub mod origin;
pub mod parser;
pub mod session;
pub mod types;

pub use attributes::{Attribute, Attributes};
pub use connection::Connection;
pub use media::Media;
pub use origin::{Origin, SessionIdentity};
pub use parser::ParseOptions;
pub use session::SessionDescription;
pub use types::{Bandwidth, TimeRange};
