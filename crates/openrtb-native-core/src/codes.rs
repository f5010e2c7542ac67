//! Native 1.2 code tables.
//!
//! Every table is a closed set of small integers. The integer is what crosses
//! the wire, so each enum is `#[repr(i32)]` and (de)serializes through
//! `serde_repr`. Record fields hold a [`Coded`] instead of the bare enum so a
//! code added by a later revision of the tables still decodes.

use phf::phf_map;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_repr::{Deserialize_repr, Serialize_repr};
use std::fmt;

/// Codes at or above this value are reserved for exchange-specific use in
/// every Native 1.2 table.
pub const EXCHANGE_SPECIFIC_MIN: i64 = 500;

/// Shared surface of the code tables.
pub trait CodeTable: Copy + Eq + Sized + 'static {
    /// Table name used in diagnostics.
    const NAME: &'static str;

    fn code(self) -> i64;
    fn from_code(code: i64) -> Option<Self>;

    /// Symbolic name, e.g. `VIEWABLE_MRC_50`.
    fn label(self) -> &'static str;
    fn from_label(label: &str) -> Option<Self>;
}

macro_rules! code_table {
    (
        $ty:ident, $name:literal, $labels:ident,
        { $($variant:ident = $code:literal => $label:literal),+ $(,)? }
    ) => {
        impl CodeTable for $ty {
            const NAME: &'static str = $name;

            fn code(self) -> i64 {
                self as i64
            }

            fn from_code(code: i64) -> Option<Self> {
                match code {
                    $($code => Some($ty::$variant),)+
                    _ => None,
                }
            }

            fn label(self) -> &'static str {
                match self {
                    $($ty::$variant => $label,)+
                }
            }

            fn from_label(label: &str) -> Option<Self> {
                $labels.get(label).copied()
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", self.label(), self.code())
            }
        }
    };
}

/// The context in which the ad appears.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize_repr, Deserialize_repr)]
pub enum ContextType {
    /// Newsfeed, article, image or video gallery.
    Content = 1,
    /// Social network feed, email, chat.
    Social = 2,
    /// Product listings, details, recommendations, reviews.
    Product = 3,
}

static CONTEXT_TYPE_LABELS: phf::Map<&'static str, ContextType> = phf_map! {
    "CONTENT" => ContextType::Content,
    "SOCIAL" => ContextType::Social,
    "PRODUCT" => ContextType::Product,
};

code_table!(ContextType, "ContextType", CONTEXT_TYPE_LABELS, {
    Content = 1 => "CONTENT",
    Social = 2 => "SOCIAL",
    Product = 3 => "PRODUCT",
});

/// Next-level context in which the ad appears.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize_repr, Deserialize_repr)]
pub enum ContextSubType {
    GeneralContent = 10,
    Article = 11,
    Video = 12,
    Audio = 13,
    Image = 14,
    /// Forums, comments and similar.
    UserGenerated = 15,
    GeneralSocial = 20,
    Email = 21,
    /// Chat and instant messaging.
    Chat = 22,
    ProductSales = 30,
    AppStore = 31,
    Reviews = 32,
}

static CONTEXT_SUB_TYPE_LABELS: phf::Map<&'static str, ContextSubType> = phf_map! {
    "GENERAL_CONTENT" => ContextSubType::GeneralContent,
    "ARTICLE" => ContextSubType::Article,
    "VIDEO" => ContextSubType::Video,
    "AUDIO" => ContextSubType::Audio,
    "IMAGE" => ContextSubType::Image,
    "USER_GENERATED" => ContextSubType::UserGenerated,
    "GENERAL_SOCIAL" => ContextSubType::GeneralSocial,
    "EMAIL" => ContextSubType::Email,
    "CHAT" => ContextSubType::Chat,
    "PRODUCT_SALES" => ContextSubType::ProductSales,
    "APP_STORE" => ContextSubType::AppStore,
    "REVIEWS" => ContextSubType::Reviews,
};

code_table!(ContextSubType, "ContextSubType", CONTEXT_SUB_TYPE_LABELS, {
    GeneralContent = 10 => "GENERAL_CONTENT",
    Article = 11 => "ARTICLE",
    Video = 12 => "VIDEO",
    Audio = 13 => "AUDIO",
    Image = 14 => "IMAGE",
    UserGenerated = 15 => "USER_GENERATED",
    GeneralSocial = 20 => "GENERAL_SOCIAL",
    Email = 21 => "EMAIL",
    Chat = 22 => "CHAT",
    ProductSales = 30 => "PRODUCT_SALES",
    AppStore = 31 => "APP_STORE",
    Reviews = 32 => "REVIEWS",
});

impl ContextSubType {
    /// The top-level context this subtype refines. Subtypes are grouped by
    /// decade: 1x content, 2x social, 3x product.
    pub fn context(self) -> ContextType {
        match self {
            ContextSubType::GeneralContent
            | ContextSubType::Article
            | ContextSubType::Video
            | ContextSubType::Audio
            | ContextSubType::Image
            | ContextSubType::UserGenerated => ContextType::Content,
            ContextSubType::GeneralSocial | ContextSubType::Email | ContextSubType::Chat => {
                ContextType::Social
            }
            ContextSubType::ProductSales | ContextSubType::AppStore | ContextSubType::Reviews => {
                ContextType::Product
            }
        }
    }
}

/// Design/format/layout of the ad unit being offered.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize_repr, Deserialize_repr)]
pub enum PlacementType {
    /// In the feed of content.
    FeedContent = 1,
    /// In the atomic unit of the content.
    AtomicContent = 2,
    OutsideCore = 3,
    RecommendationWidget = 4,
}

static PLACEMENT_TYPE_LABELS: phf::Map<&'static str, PlacementType> = phf_map! {
    "FEED_CONTENT" => PlacementType::FeedContent,
    "ATOMIC_CONTENT" => PlacementType::AtomicContent,
    "OUTSIDE_CORE" => PlacementType::OutsideCore,
    "RECOMMENDATION_WIDGET" => PlacementType::RecommendationWidget,
};

code_table!(PlacementType, "PlacementType", PLACEMENT_TYPE_LABELS, {
    FeedContent = 1 => "FEED_CONTENT",
    AtomicContent = 2 => "ATOMIC_CONTENT",
    OutsideCore = 3 => "OUTSIDE_CORE",
    RecommendationWidget = 4 => "RECOMMENDATION_WIDGET",
});

/// Non-core elements of a native unit (brand name, ratings, prices...).
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize_repr, Deserialize_repr)]
pub enum DataAssetType {
    /// "Sponsored by" message, should contain the brand name.
    Sponsored = 1,
    Desc = 2,
    /// Product rating, e.g. app store stars.
    Rating = 3,
    Likes = 4,
    Downloads = 5,
    Price = 6,
    /// Used together with `Price` to show a discount.
    SalePrice = 7,
    Phone = 8,
    Address = 9,
    Desc2 = 10,
    DisplayUrl = 11,
    /// Call-to-action button text.
    CtaText = 12,
}

static DATA_ASSET_TYPE_LABELS: phf::Map<&'static str, DataAssetType> = phf_map! {
    "SPONSORED" => DataAssetType::Sponsored,
    "DESC" => DataAssetType::Desc,
    "RATING" => DataAssetType::Rating,
    "LIKES" => DataAssetType::Likes,
    "DOWNLOADS" => DataAssetType::Downloads,
    "PRICE" => DataAssetType::Price,
    "SALE_PRICE" => DataAssetType::SalePrice,
    "PHONE" => DataAssetType::Phone,
    "ADDRESS" => DataAssetType::Address,
    "DESC2" => DataAssetType::Desc2,
    "DISPLAY_URL" => DataAssetType::DisplayUrl,
    "CTA_TEXT" => DataAssetType::CtaText,
};

code_table!(DataAssetType, "DataAssetType", DATA_ASSET_TYPE_LABELS, {
    Sponsored = 1 => "SPONSORED",
    Desc = 2 => "DESC",
    Rating = 3 => "RATING",
    Likes = 4 => "LIKES",
    Downloads = 5 => "DOWNLOADS",
    Price = 6 => "PRICE",
    SalePrice = 7 => "SALE_PRICE",
    Phone = 8 => "PHONE",
    Address = 9 => "ADDRESS",
    Desc2 = 10 => "DESC2",
    DisplayUrl = 11 => "DISPLAY_URL",
    CtaText = 12 => "CTA_TEXT",
});

/// Image asset roles. Code 2 was retired by Native 1.2 and stays unassigned.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize_repr, Deserialize_repr)]
pub enum ImageAssetType {
    /// App icon, brand logo or similar.
    Icon = 1,
    /// Large image preview.
    Main = 3,
}

static IMAGE_ASSET_TYPE_LABELS: phf::Map<&'static str, ImageAssetType> = phf_map! {
    "ICON" => ImageAssetType::Icon,
    "MAIN" => ImageAssetType::Main,
};

code_table!(ImageAssetType, "ImageAssetType", IMAGE_ASSET_TYPE_LABELS, {
    Icon = 1 => "ICON",
    Main = 3 => "MAIN",
});

/// Events a tracker can fire on.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize_repr, Deserialize_repr)]
pub enum EventType {
    Impression = 1,
    /// MRC viewability: 50% in view for 1 second.
    ViewableMrc50 = 2,
    /// 100% in view for 1 second.
    ViewableMrc100 = 3,
    /// Video viewability: 50% in view for 2 seconds.
    ViewableVideo50 = 4,
}

static EVENT_TYPE_LABELS: phf::Map<&'static str, EventType> = phf_map! {
    "IMPRESSION" => EventType::Impression,
    "VIEWABLE_MRC_50" => EventType::ViewableMrc50,
    "VIEWABLE_MRC_100" => EventType::ViewableMrc100,
    "VIEWABLE_VIDEO_50" => EventType::ViewableVideo50,
};

code_table!(EventType, "EventType", EVENT_TYPE_LABELS, {
    Impression = 1 => "IMPRESSION",
    ViewableMrc50 = 2 => "VIEWABLE_MRC_50",
    ViewableMrc100 = 3 => "VIEWABLE_MRC_100",
    ViewableVideo50 = 4 => "VIEWABLE_VIDEO_50",
});

#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize_repr, Deserialize_repr)]
pub enum EventTrackingMethod {
    /// Image pixel, fired with an `<img>` request.
    Img = 1,
    Js = 2,
}

static EVENT_TRACKING_METHOD_LABELS: phf::Map<&'static str, EventTrackingMethod> = phf_map! {
    "IMG" => EventTrackingMethod::Img,
    "JS" => EventTrackingMethod::Js,
};

code_table!(EventTrackingMethod, "EventTrackingMethod", EVENT_TRACKING_METHOD_LABELS, {
    Img = 1 => "IMG",
    Js = 2 => "JS",
});

/// A code-typed field value.
///
/// Any integer decodes: codes present in the table become `Known`, anything
/// else is kept verbatim as `Unknown` and re-encodes to the same integer.
/// Build values with [`Coded::from_code`] or `From<T>` so a known code is never
/// stored as `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Coded<T> {
    Known(T),
    Unknown(i64),
}

impl<T: CodeTable> Coded<T> {
    pub fn from_code(code: i64) -> Self {
        match T::from_code(code) {
            Some(known) => Coded::Known(known),
            None => Coded::Unknown(code),
        }
    }

    pub fn code(&self) -> i64 {
        match self {
            Coded::Known(known) => known.code(),
            Coded::Unknown(code) => *code,
        }
    }

    pub fn known(&self) -> Option<T> {
        match self {
            Coded::Known(known) => Some(*known),
            Coded::Unknown(_) => None,
        }
    }

    pub fn is_known(&self) -> bool {
        matches!(self, Coded::Known(_))
    }

    /// True for codes in the 500+ range the exchange defines itself.
    pub fn is_exchange_specific(&self) -> bool {
        matches!(self, Coded::Unknown(code) if *code >= EXCHANGE_SPECIFIC_MIN)
    }
}

impl<T: CodeTable> From<T> for Coded<T> {
    fn from(value: T) -> Self {
        Coded::Known(value)
    }
}

impl<T: CodeTable + fmt::Display> fmt::Display for Coded<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Coded::Known(known) => known.fmt(f),
            Coded::Unknown(code) => write!(f, "{}?({})", T::NAME, code),
        }
    }
}

impl<T: CodeTable> Serialize for Coded<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_i64(self.code())
    }
}

impl<'de, T: CodeTable> Deserialize<'de> for Coded<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let code = i64::deserialize(deserializer)?;
        Ok(Coded::from_code(code))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_type_serializes_as_integer() {
        assert_eq!(serde_json::to_string(&ContextType::Product).unwrap(), "3");
        let decoded: ContextType = serde_json::from_str("3").unwrap();
        assert_eq!(decoded, ContextType::Product);
    }

    #[test]
    fn test_bare_enum_rejects_unknown_code() {
        assert!(serde_json::from_str::<ImageAssetType>("2").is_err());
    }

    #[test]
    fn test_coded_keeps_unknown_codes() {
        let known: Coded<ImageAssetType> = serde_json::from_str("3").unwrap();
        assert_eq!(known, Coded::Known(ImageAssetType::Main));

        let unknown: Coded<ImageAssetType> = serde_json::from_str("2").unwrap();
        assert_eq!(unknown, Coded::Unknown(2));
        assert!(!unknown.is_known());
        assert!(!unknown.is_exchange_specific());
        assert_eq!(serde_json::to_string(&unknown).unwrap(), "2");
    }

    #[test]
    fn test_coded_exchange_specific_range() {
        let custom: Coded<EventTrackingMethod> = Coded::from_code(501);
        assert!(custom.is_exchange_specific());
        assert_eq!(custom.code(), 501);
    }

    #[test]
    fn test_coded_rejects_non_integer() {
        assert!(serde_json::from_str::<Coded<EventType>>("\"1\"").is_err());
    }

    #[test]
    fn test_labels_round_trip_through_lookup() {
        assert_eq!(EventType::ViewableMrc50.label(), "VIEWABLE_MRC_50");
        assert_eq!(
            EventType::from_label("VIEWABLE_MRC_50"),
            Some(EventType::ViewableMrc50)
        );
        assert_eq!(DataAssetType::from_label("CTA_TEXT"), Some(DataAssetType::CtaText));
        assert_eq!(DataAssetType::from_label("cta_text"), None);
        assert_eq!(
            ContextSubType::from_label("APP_STORE").map(CodeTable::code),
            Some(31)
        );
    }

    #[test]
    fn test_from_code_covers_every_label() {
        for (label, value) in DATA_ASSET_TYPE_LABELS.entries() {
            assert_eq!(DataAssetType::from_code(value.code()), Some(*value));
            assert_eq!(value.label(), *label);
        }
        for (label, value) in CONTEXT_SUB_TYPE_LABELS.entries() {
            assert_eq!(ContextSubType::from_code(value.code()), Some(*value));
            assert_eq!(value.label(), *label);
        }
    }

    #[test]
    fn test_subtype_parent_context() {
        assert_eq!(ContextSubType::UserGenerated.context(), ContextType::Content);
        assert_eq!(ContextSubType::Chat.context(), ContextType::Social);
        assert_eq!(ContextSubType::Reviews.context(), ContextType::Product);
    }

    #[test]
    fn test_display_includes_label_and_code() {
        assert_eq!(PlacementType::OutsideCore.to_string(), "OUTSIDE_CORE(3)");
        let unknown: Coded<PlacementType> = Coded::from_code(9);
        assert_eq!(unknown.to_string(), "PlacementType?(9)");
    }
}
