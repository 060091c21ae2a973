//! The OCR.space `/parse/image` protocol.
//!
//! [`request`] turns an item's binary payload into a multipart upload,
//! [`client`] sends it, and [`response`] decides whether the service actually
//! succeeded and pulls out the text.

pub mod client;
pub mod options;
pub mod request;
pub mod response;
