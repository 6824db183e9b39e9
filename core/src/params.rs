//! Per-endpoint parameter objects.
//!
//! # Design
//! Several endpoints take a `params` form field holding a JSON object. The
//! remote expects every known key to be present, so unset optional values
//! are written as `""` instead of being omitted. Each struct here serializes
//! straight to that object; the client JSON-encodes it into the form.

use std::fmt;

use serde::{Serialize, Serializer};

pub const DEFAULT_PAGE_SIZE: u32 = 500;

/// Serialize `Some(v)` as `v` and `None` as `""`.
fn value_or_empty<T, S>(value: &Option<T>, serializer: S) -> Result<S::Ok, S::Error>
where
    T: Serialize,
    S: Serializer,
{
    match value {
        Some(v) => v.serialize(serializer),
        None => serializer.serialize_str(""),
    }
}

/// Serialize `Some(true)` as `1`, `Some(false)` as `0` and `None` as `""`.
fn flag_or_empty<S: Serializer>(value: &Option<bool>, serializer: S) -> Result<S::Ok, S::Error> {
    match value {
        Some(flag) => serializer.serialize_u8(u8::from(*flag)),
        None => serializer.serialize_str(""),
    }
}

/// Field a set listing can be sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Number,
    YearFrom,
    Pieces,
    Minifigs,
    Rating,
    UKRetailPrice,
    USRetailPrice,
    CARetailPrice,
    DERetailPrice,
    FRRetailPrice,
    UKPricePerPiece,
    USPricePerPiece,
    CAPricePerPiece,
    DEPricePerPiece,
    FRPricePerPiece,
    Theme,
    Subtheme,
    Name,
    Random,
    QtyOwned,
    OwnCount,
    WantCount,
    UserRating,
    CollectionID,
}

impl SortKey {
    pub fn as_str(self) -> &'static str {
        match self {
            SortKey::Number => "Number",
            SortKey::YearFrom => "YearFrom",
            SortKey::Pieces => "Pieces",
            SortKey::Minifigs => "Minifigs",
            SortKey::Rating => "Rating",
            SortKey::UKRetailPrice => "UKRetailPrice",
            SortKey::USRetailPrice => "USRetailPrice",
            SortKey::CARetailPrice => "CARetailPrice",
            SortKey::DERetailPrice => "DERetailPrice",
            SortKey::FRRetailPrice => "FRRetailPrice",
            SortKey::UKPricePerPiece => "UKPricePerPiece",
            SortKey::USPricePerPiece => "USPricePerPiece",
            SortKey::CAPricePerPiece => "CAPricePerPiece",
            SortKey::DEPricePerPiece => "DEPricePerPiece",
            SortKey::FRPricePerPiece => "FRPricePerPiece",
            SortKey::Theme => "Theme",
            SortKey::Subtheme => "Subtheme",
            SortKey::Name => "Name",
            SortKey::Random => "Random",
            SortKey::QtyOwned => "QtyOwned",
            SortKey::OwnCount => "OwnCount",
            SortKey::WantCount => "WantCount",
            SortKey::UserRating => "UserRating",
            SortKey::CollectionID => "CollectionID",
        }
    }
}

/// Sort order for `getSets`.
///
/// `Raw` is sent as-is; the remote decides whether it is valid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderBy {
    Ascending(SortKey),
    Descending(SortKey),
    Raw(String),
}

impl fmt::Display for OrderBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderBy::Ascending(key) => f.write_str(key.as_str()),
            OrderBy::Descending(key) => write!(f, "{}DESC", key.as_str()),
            OrderBy::Raw(raw) => f.write_str(raw),
        }
    }
}

impl From<SortKey> for OrderBy {
    fn from(key: SortKey) -> Self {
        OrderBy::Ascending(key)
    }
}

impl Serialize for OrderBy {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Filters for `getSets`. `owned`/`wanted` only mean something once logged in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GetSetsParams {
    pub page_size: u32,
    #[serde(serialize_with = "value_or_empty")]
    pub theme: Option<String>,
    #[serde(serialize_with = "value_or_empty")]
    pub subtheme: Option<String>,
    #[serde(serialize_with = "value_or_empty")]
    pub set_number: Option<String>,
    #[serde(serialize_with = "value_or_empty")]
    pub year: Option<String>,
    #[serde(serialize_with = "value_or_empty")]
    pub order_by: Option<OrderBy>,
    #[serde(serialize_with = "flag_or_empty")]
    pub owned: Option<bool>,
    #[serde(serialize_with = "flag_or_empty")]
    pub wanted: Option<bool>,
}

impl Default for GetSetsParams {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            theme: None,
            subtheme: None,
            set_number: None,
            year: None,
            order_by: None,
            owned: None,
            wanted: None,
        }
    }
}

impl GetSetsParams {
    pub fn theme(theme: &str) -> Self {
        Self {
            theme: Some(theme.to_string()),
            ..Self::default()
        }
    }
}

/// Filters for `getMinifigCollection`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MinifigCollectionParams {
    #[serde(serialize_with = "flag_or_empty")]
    pub owned: Option<bool>,
    #[serde(serialize_with = "flag_or_empty")]
    pub wanted: Option<bool>,
    #[serde(serialize_with = "value_or_empty")]
    pub query: Option<String>,
}

/// Fixed parameters of the owned-minifigs shortcut: `{"owned": 1}`.
#[derive(Debug, Clone, Copy, Serialize)]
pub(crate) struct OwnedOnly {
    pub owned: u8,
}

/// Collection changes for one set. Unset fields are sent as `""`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SetCollectionParams {
    #[serde(serialize_with = "flag_or_empty")]
    pub own: Option<bool>,
    #[serde(serialize_with = "flag_or_empty")]
    pub want: Option<bool>,
    #[serde(serialize_with = "value_or_empty")]
    pub qty_owned: Option<u32>,
    #[serde(serialize_with = "value_or_empty")]
    pub notes: Option<String>,
    #[serde(serialize_with = "value_or_empty")]
    pub rating: Option<u8>,
}

/// Collection changes for one minifig.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MinifigCollectionUpdate {
    #[serde(serialize_with = "flag_or_empty")]
    pub own: Option<bool>,
    #[serde(serialize_with = "flag_or_empty")]
    pub want: Option<bool>,
    #[serde(serialize_with = "value_or_empty")]
    pub qty_owned: Option<u32>,
    #[serde(serialize_with = "value_or_empty")]
    pub notes: Option<String>,
}
