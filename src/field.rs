use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use diesel::deserialize::{self, FromSql, Queryable};
use diesel::expression::AsExpression;
use diesel::pg::{Pg, PgValue};
use diesel::serialize::{self, Output, ToSql};
use diesel::sql_types::BigInt;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::trace;

use crate::{Codec, Config, ConfigError, Error};

thread_local! {
    static CODEC_CACHE: RefCell<HashMap<CodecKey, Arc<Codec>>> = RefCell::new(HashMap::new());
}

type CodecKey = (&'static str, u32, &'static [u8]);

fn get_or_create_codec<T: TypeMarker>() -> Result<Arc<Codec>, ConfigError> {
    let key = (T::name(), T::bits(), T::seed());
    CODEC_CACHE.with(|cache| {
        let mut cache = cache.borrow_mut();
        if let Some(codec) = cache.get(&key) {
            return Ok(codec.clone());
        }
        trace!(name = key.0, bits = key.1, "creating field codec");
        let config = Config::new(T::bits())?.seed(T::seed());
        let codec = Arc::new(Codec::new(&config));
        cache.insert(key, codec.clone());
        Ok(codec)
    })
}

/// Fixes the codec settings of a `Field` type.
pub trait TypeMarker: std::fmt::Debug {
    fn name() -> &'static str;

    /// Bit width of the plain values. Codes use 5 bits per character, so a
    /// multiple of 5 wastes nothing.
    fn bits() -> u32 {
        35
    }

    /// Seed for the mixing constants. Defaults to the name, so every field
    /// type gets its own sequence.
    fn seed() -> &'static [u8] {
        Self::name().as_bytes()
    }
}

/// A generic type-safe object ID field (a wrapped u64).
///
/// When serialized with Serde, the number is automatically obfuscated and
/// rendered into a short URL safe code.  Deserialization parses the code back
/// to the plain integer.  The codec settings come from the type marker.
///
/// Traits are also provided for Diesel compatibility with Postgres BigInt
/// fields; the column stores the plain value.  Negative column values are
/// rejected when loading.
///
/// # Examples
///
/// ```
/// use obfid_rs;
/// use serde::{Serialize, Deserialize};
/// use serde_json;
///
/// #[derive(Clone, Copy, Debug)]
/// pub struct ArticleIdMarker;
/// impl obfid_rs::TypeMarker for ArticleIdMarker {
///     fn name() -> &'static str { "article" }
///     fn bits() -> u32 { 30 }
/// }
///
/// type ArticleId = obfid_rs::Field<ArticleIdMarker>;
///
/// #[derive(Serialize, Deserialize)]
/// struct Article {
///     pub id: ArticleId,
/// }
///
/// let obj = Article { id: ArticleId::from(12345) };
/// let obj_str = serde_json::to_string(&obj).unwrap();
/// let back: Article = serde_json::from_str(&obj_str).unwrap();
/// assert_eq!(back.id, obj.id);
/// ```
#[derive(AsExpression, Debug, Clone, Copy)]
#[diesel(sql_type = BigInt)]
pub struct Field<T: TypeMarker> {
    id: u64,
    _marker: std::marker::PhantomData<T>,
}

impl<T: TypeMarker> From<Field<T>> for u64 {
    /// Returns the raw `u64` value.
    fn from(field: Field<T>) -> Self {
        field.id
    }
}

impl<T: TypeMarker> PartialEq for Field<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<T: TypeMarker> Eq for Field<T> {}

impl<T: TypeMarker> fmt::Display for Field<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Field {{ id: {}, marker: {} }}", self.id, T::name())
    }
}

impl<T: TypeMarker> Field<T> {
    /// Creates a `Field<T>` value from a `u64`.
    ///
    /// This method converts a `u64` into a `Field<T>`, effectively changing its type.
    pub fn from(id: u64) -> Self {
        Field {
            id,
            _marker: std::marker::PhantomData,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// The external identifier for this value.
    pub fn external_id(&self) -> Result<String, Error> {
        let codec = get_or_create_codec::<T>()?;
        codec.obfuscate(self.id)
    }

    /// Parses an external identifier produced by `external_id`.
    pub fn parse_external(encoded: &str) -> Result<Self, Error> {
        let codec = get_or_create_codec::<T>()?;
        Ok(Field::from(codec.deobfuscate(encoded)?))
    }
}

impl<T: TypeMarker> FromStr for Field<T> {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Field::parse_external(s)
    }
}

impl<T: TypeMarker> Serialize for Field<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let encoded = self.external_id().map_err(serde::ser::Error::custom)?;
        serializer.serialize_str(&encoded)
    }
}

impl<'de, T: TypeMarker> Deserialize<'de> for Field<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let encoded = String::deserialize(deserializer)?;
        Field::parse_external(&encoded).map_err(serde::de::Error::custom)
    }
}

impl<T: TypeMarker> ToSql<BigInt, Pg> for Field<T> {
    fn to_sql(&self, out: &mut Output<'_, '_, Pg>) -> serialize::Result {
        let id = i64::try_from(self.id)?;
        <i64 as ToSql<BigInt, Pg>>::to_sql(&id, &mut out.reborrow())
    }
}

impl<T: TypeMarker> FromSql<BigInt, Pg> for Field<T> {
    fn from_sql(bytes: PgValue<'_>) -> deserialize::Result<Self> {
        let id = <i64 as FromSql<BigInt, Pg>>::from_sql(bytes)?;
        Ok(Field::from(u64::try_from(id)?))
    }
}

impl<T> Queryable<BigInt, Pg> for Field<T>
where
    T: TypeMarker,
{
    type Row = <i64 as Queryable<BigInt, Pg>>::Row;

    fn build(row: Self::Row) -> deserialize::Result<Self> {
        let id = i64::build(row)?;
        Ok(Field::from(u64::try_from(id)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FormatError;

    #[derive(Clone, Copy, Debug)]
    struct ArticleMarker;
    impl TypeMarker for ArticleMarker {
        fn name() -> &'static str {
            "article"
        }
        fn bits() -> u32 {
            30
        }
    }

    #[derive(Clone, Copy, Debug)]
    struct CommentMarker;
    impl TypeMarker for CommentMarker {
        fn name() -> &'static str {
            "comment"
        }
        fn bits() -> u32 {
            30
        }
    }

    #[derive(Clone, Copy, Debug)]
    struct BrokenMarker;
    impl TypeMarker for BrokenMarker {
        fn name() -> &'static str {
            "broken"
        }
        fn bits() -> u32 {
            0
        }
    }

    type ArticleId = Field<ArticleMarker>;
    type CommentId = Field<CommentMarker>;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Article {
        id: ArticleId,
        title: String,
    }

    #[test]
    fn test_serde_roundtrip() {
        let article = Article {
            id: ArticleId::from(42),
            title: "Hello".to_string(),
        };
        let json = serde_json::to_value(&article).unwrap();
        let code = json["id"].as_str().unwrap();
        assert_eq!(code.len(), 6);
        assert_eq!(code, ArticleId::from(42).external_id().unwrap());

        let back: Article = serde_json::from_value(json).unwrap();
        assert_eq!(back, article);
    }

    #[test]
    fn test_types_use_separate_sequences() {
        let article = ArticleId::from(7).external_id().unwrap();
        let comment = CommentId::from(7).external_id().unwrap();
        assert_ne!(article, comment);
    }

    #[test]
    fn test_from_str() {
        let code = ArticleId::from(1000).external_id().unwrap();
        let parsed: ArticleId = code.parse().unwrap();
        assert_eq!(u64::from(parsed), 1000);
        assert_eq!(parsed.id(), 1000);

        let err = "abc".parse::<ArticleId>().unwrap_err();
        assert_eq!(
            err,
            Error::Format(FormatError::InvalidLength {
                received: 3,
                expected: 6
            })
        );
    }

    #[test]
    fn test_out_of_domain_fails_to_serialize() {
        let article = Article {
            id: ArticleId::from(1 << 30),
            title: String::new(),
        };
        assert!(serde_json::to_string(&article).is_err());
    }

    #[test]
    fn test_invalid_code_fails_to_deserialize() {
        let result: Result<Article, _> =
            serde_json::from_str(r#"{"id": "000000", "title": ""}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_marker() {
        assert_eq!(
            Field::<BrokenMarker>::from(1).external_id(),
            Err(Error::Config(ConfigError::InvalidBitWidth(0)))
        );
    }

    #[test]
    fn test_queryable_build() {
        let id = <ArticleId as Queryable<BigInt, Pg>>::build(1000).unwrap();
        assert_eq!(id, ArticleId::from(1000));
        assert_eq!(
            id.external_id().unwrap(),
            ArticleId::from(1000).external_id().unwrap()
        );
        assert_eq!(
            <ArticleId as Queryable<BigInt, Pg>>::build(0).unwrap().id(),
            0
        );
    }

    #[test]
    fn test_queryable_rejects_negative_ids() {
        assert!(<ArticleId as Queryable<BigInt, Pg>>::build(-1).is_err());
        assert!(<ArticleId as Queryable<BigInt, Pg>>::build(i64::MIN).is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(
            ArticleId::from(5).to_string(),
            "Field { id: 5, marker: article }"
        );
    }
}
