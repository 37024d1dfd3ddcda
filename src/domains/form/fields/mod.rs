//! One module per registered field type. Each narrows the attribute bag to its
//! own shape and exposes a static registry entry.

pub mod attributes;
pub mod checkbox;
pub mod date;
pub mod file_upload;
pub mod number;
pub mod paragraph;
pub mod select;
pub mod separator;
pub mod spacer;
pub mod subtitle;
pub mod telephone;
pub mod text;
pub mod textarea;
pub mod title;

pub use attributes::InputAttributes;
pub use file_upload::UploadConstraints;
