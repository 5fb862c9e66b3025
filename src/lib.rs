//! `obfid` turns sequential integer IDs into short, unambiguous codes for URLs and back,
//! together with a handful of small helpers for storing and serving web application data.
//!
//! The codec is a reversible integer permutation: a plain value of `bits` bits is multiplied
//! by an odd constant modulo 2^bits and XORed with a mask.  Both constants are derived from
//! the bit width and an optional seed, so the same configuration always gives the same
//! codes.  The result is rendered with 5 bits per character over the alphabet
//! `abcdefghijkmnpqrstuvwxyz23456789`, which leaves out characters that are easy to confuse.
//!
//! This is not encryption.  The goal is only that consecutive rows do not get consecutive
//! looking codes; anyone with enough samples can recover the constants.
//!
//! # Usage
//!
//! ##  Generic `Field` API (recommended)
//!
//! Use the generic `Field` type to define a type for each type of object you're exposing
//! in your public APIs.  The `Field` type supports automatic encoding and decoding with Diesel
//! and Serde.
//!
//! ```
//! use obfid_rs;
//! use serde::{Serialize, Deserialize};
//! use serde_json;
//!
//! // Define the OrderId field type.  The type marker fixes the bit width and seed.
//! #[derive(Clone, Copy, Debug)]
//! pub struct OrderIdMarker;
//! impl obfid_rs::TypeMarker for OrderIdMarker {
//!     fn name() -> &'static str { "order" }
//! }
//!
//! type OrderId = obfid_rs::Field<OrderIdMarker>;
//!
//! #[derive(serde::Serialize)]
//! struct Order {
//!     pub id: OrderId,
//! }
//!
//! let obj = Order { id: OrderId::from(12345) };
//! let obj_str = serde_json::to_string(&obj).unwrap();
//! assert_eq!(obj_str.len(), "{\"id\":\"\"}".len() + 7);
//! ```
//!
//! ## Low level API
//!
//! `configure`, `encode`, `decode`, `render` and `parse` work on an explicit `CodecParams`.
//! `Codec` bundles them.
//!
//! ```
//! use obfid_rs::{configure, decode, encode, parse, render};
//!
//! let params = configure(20).unwrap();
//! let code = render(&params, encode(&params, 12345).unwrap()).unwrap();
//! assert_eq!(code.len(), 4);
//! assert_eq!(decode(&params, parse(&params, &code).unwrap()).unwrap(), 12345);
//! ```
//!
//! ## Other helpers
//!
//! - [`choices`]: enumerated value tables with labels and extra data.
//! - [`blob`]: compressed JSON values for text columns.
//! - [`password`]: salted password hashes.
//! - [`slug`]: restricted slug validation.
//! - [`uuid_field`]: random UUID defaults.
//! - [`response`]: HTTP method gating and JSON response envelopes.
//! - [`settings`]: per-machine settings selection.

mod alphabet;
mod codec;
mod config;
mod field;
mod params;

pub mod blob;
pub mod choices;
pub mod password;
pub mod response;
pub mod settings;
pub mod slug;
pub mod uuid_field;

pub use alphabet::{Alphabet, ALPHABET_SIZE, DEFAULT_CODE_CHARS};
pub use codec::{decode, encode, parse, render, Codec, Error, FormatError};
pub use config::{Config, ConfigError, MAX_BITS};
pub use field::{Field, TypeMarker};
pub use params::{configure, CodecParams};
