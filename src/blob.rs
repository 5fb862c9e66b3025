//! JSON values stored compressed in a text column.
//!
//! The stored form is base64(zlib(json)), which keeps arbitrary structured
//! data safe for any text column type.

use std::io::{Read, Write};

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use diesel::deserialize::{self, FromSql, Queryable};
use diesel::expression::AsExpression;
use diesel::pg::{Pg, PgValue};
use diesel::serialize::{self, Output, ToSql};
use diesel::sql_types::Text;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BlobError {
    #[error("JSON conversion failed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Compression failed: {0}")]
    Compression(#[from] std::io::Error),
    #[error("Invalid base64: {0}")]
    Base64(#[from] base64::DecodeError),
}

/// Serializes `value` to JSON, compresses it and encodes it as base64.
pub fn encode<T: Serialize + ?Sized>(value: &T) -> Result<String, BlobError> {
    let json = serde_json::to_vec(value)?;
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&json)?;
    let compressed = encoder.finish()?;
    Ok(STANDARD.encode(compressed))
}

/// Reverses `encode`.
pub fn decode<T: DeserializeOwned>(stored: &str) -> Result<T, BlobError> {
    let compressed = STANDARD.decode(stored.trim())?;
    let mut json = Vec::new();
    ZlibDecoder::new(compressed.as_slice()).read_to_end(&mut json)?;
    Ok(serde_json::from_slice(&json)?)
}

/// A value kept as compressed JSON in a Postgres `TEXT` column.
///
/// In Rust code and over Serde the value behaves like `T`; only the database
/// sees the encoded form.
///
/// ```
/// use obfid_rs::blob::JsonBlob;
/// use std::collections::BTreeMap;
///
/// let blob = JsonBlob::new(BTreeMap::from([("foo", 1), ("bar", 2)]));
/// let raw = blob.raw().unwrap();
/// let back: BTreeMap<String, i32> = obfid_rs::blob::decode(&raw).unwrap();
/// assert_eq!(back["foo"], 1);
/// ```
#[derive(AsExpression, Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[diesel(sql_type = Text)]
#[serde(transparent)]
pub struct JsonBlob<T>(pub T);

impl<T> JsonBlob<T> {
    pub fn new(value: T) -> Self {
        JsonBlob(value)
    }

    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T: Serialize> JsonBlob<T> {
    /// The encoded text as it is stored in the database.
    pub fn raw(&self) -> Result<String, BlobError> {
        encode(&self.0)
    }
}

impl<T: DeserializeOwned> JsonBlob<T> {
    pub fn from_raw(stored: &str) -> Result<Self, BlobError> {
        Ok(JsonBlob(decode(stored)?))
    }
}

impl<T> std::ops::Deref for JsonBlob<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T> std::ops::DerefMut for JsonBlob<T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.0
    }
}

impl<T: Serialize + std::fmt::Debug> ToSql<Text, Pg> for JsonBlob<T> {
    fn to_sql(&self, out: &mut Output<'_, '_, Pg>) -> serialize::Result {
        let encoded = self.raw()?;
        <str as ToSql<Text, Pg>>::to_sql(encoded.as_str(), &mut out.reborrow())
    }
}

impl<T: DeserializeOwned> FromSql<Text, Pg> for JsonBlob<T> {
    fn from_sql(bytes: PgValue<'_>) -> deserialize::Result<Self> {
        let stored = <String as FromSql<Text, Pg>>::from_sql(bytes)?;
        Ok(JsonBlob::from_raw(&stored)?)
    }
}

impl<T: DeserializeOwned> Queryable<Text, Pg> for JsonBlob<T> {
    type Row = <String as Queryable<Text, Pg>>::Row;

    fn build(row: Self::Row) -> deserialize::Result<Self> {
        let stored = <String as Queryable<Text, Pg>>::build(row)?;
        Ok(JsonBlob::from_raw(&stored)?)
    }
}
