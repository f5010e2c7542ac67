//! Native Markup Response object graph.

use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::Validate;

use crate::codes::{Coded, DataAssetType, EventTrackingMethod, EventType, ImageAssetType};
use crate::request::AssetVariant;
use crate::wire::{bool_int, default_ver, is_false, keep_null, null_default, NATIVE_VERSION};

/// Where the bidder put the assets of a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Representation {
    /// Assets are embedded in `assets` and ids join the request.
    Inline,
    /// `assetsurl` or `dcourl` is present and overrides inline assets.
    Remote,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct NativeResponse {
    #[serde(default = "default_ver", deserialize_with = "null_default::ver")]
    pub ver: String,
    /// Required unless `assetsurl` or `dcourl` is given; recommended as a
    /// fallback even then.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assets: Option<Vec<AssetResponse>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(url)]
    pub assetsurl: Option<String>,
    /// Dynamic creative specification URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(url)]
    pub dcourl: Option<String>,
    /// Default destination link for the whole ad.
    pub link: LinkResponse,
    /// Superseded by `eventtrackers`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub imptrackers: Option<Vec<String>>,
    /// Superseded by `eventtrackers`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jstracker: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eventtrackers: Option<Vec<EventTrackerResponse>>,
    /// Privacy notice URL. The request-side `privacy` is a support flag.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(url)]
    pub privacy: Option<String>,
    #[serde(default, deserialize_with = "keep_null", skip_serializing_if = "Option::is_none")]
    pub ext: Option<Value>,
}

impl NativeResponse {
    pub fn new(link: LinkResponse) -> Self {
        Self {
            ver: NATIVE_VERSION.to_string(),
            assets: None,
            assetsurl: None,
            dcourl: None,
            link,
            imptrackers: None,
            jstracker: None,
            eventtrackers: None,
            privacy: None,
            ext: None,
        }
    }

    pub fn with_assets(mut self, assets: Vec<AssetResponse>) -> Self {
        self.assets = Some(assets);
        self
    }

    pub fn representation(&self) -> Representation {
        if self.assetsurl.is_some() || self.dcourl.is_some() {
            Representation::Remote
        } else {
            Representation::Inline
        }
    }

    pub fn asset(&self, id: i64) -> Option<&AssetResponse> {
        self.assets
            .as_deref()
            .unwrap_or_default()
            .iter()
            .find(|asset| asset.id == Some(id))
    }

    /// The link a click on `asset` should follow.
    pub fn effective_link<'a>(&'a self, asset: &'a AssetResponse) -> &'a LinkResponse {
        asset.link.as_ref().unwrap_or(&self.link)
    }
}

/// Answers one request [`crate::request::Asset`].
#[derive(Debug, Clone, PartialEq)]
pub struct AssetResponse {
    /// Optional with `assetsurl`/`dcourl`, otherwise must match a request
    /// asset id.
    pub id: Option<i64>,
    pub required: bool,
    pub kind: AssetResponseKind,
    /// Overrides the response-level link when this asset is clicked.
    pub link: Option<LinkResponse>,
    pub ext: Option<Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AssetResponseKind {
    Title(TitleResponse),
    Image(ImageResponse),
    Video(VideoResponse),
    Data(DataResponse),
}

impl AssetResponseKind {
    pub fn variant(&self) -> AssetVariant {
        match self {
            AssetResponseKind::Title(_) => AssetVariant::Title,
            AssetResponseKind::Image(_) => AssetVariant::Image,
            AssetResponseKind::Video(_) => AssetVariant::Video,
            AssetResponseKind::Data(_) => AssetVariant::Data,
        }
    }
}

impl AssetResponse {
    pub fn new(id: Option<i64>, kind: AssetResponseKind) -> Self {
        Self {
            id,
            required: false,
            kind,
            link: None,
            ext: None,
        }
    }

    pub fn title(id: i64, text: impl Into<String>) -> Self {
        Self::new(
            Some(id),
            AssetResponseKind::Title(TitleResponse {
                text: text.into(),
                len: None,
                ext: None,
            }),
        )
    }

    pub fn image(id: i64, img: ImageResponse) -> Self {
        Self::new(Some(id), AssetResponseKind::Image(img))
    }

    pub fn video(id: i64, vasttag: impl Into<String>) -> Self {
        Self::new(
            Some(id),
            AssetResponseKind::Video(VideoResponse {
                vasttag: vasttag.into(),
            }),
        )
    }

    pub fn data(id: i64, data: DataResponse) -> Self {
        Self::new(Some(id), AssetResponseKind::Data(data))
    }

    pub fn with_link(mut self, link: LinkResponse) -> Self {
        self.link = Some(link);
        self
    }

    pub fn variant(&self) -> AssetVariant {
        self.kind.variant()
    }
}

#[derive(Deserialize)]
struct AssetResponseWire {
    #[serde(default)]
    id: Option<i64>,
    #[serde(default, with = "bool_int")]
    required: bool,
    #[serde(default)]
    title: Option<TitleResponse>,
    #[serde(default)]
    img: Option<ImageResponse>,
    #[serde(default)]
    video: Option<VideoResponse>,
    #[serde(default)]
    data: Option<DataResponse>,
    #[serde(default)]
    link: Option<LinkResponse>,
    #[serde(default, deserialize_with = "keep_null")]
    ext: Option<Value>,
}

#[derive(Serialize)]
struct AssetResponseWireRef<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<i64>,
    #[serde(with = "bool_int", skip_serializing_if = "is_false")]
    required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<&'a TitleResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    img: Option<&'a ImageResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    video: Option<&'a VideoResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<&'a DataResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    link: Option<&'a LinkResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    ext: Option<&'a Value>,
}

impl Serialize for AssetResponse {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut wire = AssetResponseWireRef {
            id: self.id,
            required: self.required,
            title: None,
            img: None,
            video: None,
            data: None,
            link: self.link.as_ref(),
            ext: self.ext.as_ref(),
        };
        match &self.kind {
            AssetResponseKind::Title(title) => wire.title = Some(title),
            AssetResponseKind::Image(img) => wire.img = Some(img),
            AssetResponseKind::Video(video) => wire.video = Some(video),
            AssetResponseKind::Data(data) => wire.data = Some(data),
        }
        wire.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for AssetResponse {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let wire = AssetResponseWire::deserialize(deserializer)?;
        let found = usize::from(wire.title.is_some())
            + usize::from(wire.img.is_some())
            + usize::from(wire.video.is_some())
            + usize::from(wire.data.is_some());
        let kind = match (wire.title, wire.img, wire.video, wire.data) {
            (Some(title), None, None, None) => AssetResponseKind::Title(title),
            (None, Some(img), None, None) => AssetResponseKind::Image(img),
            (None, None, Some(video), None) => AssetResponseKind::Video(video),
            (None, None, None, Some(data)) => AssetResponseKind::Data(data),
            _ => {
                return Err(de::Error::custom(format!(
                    "response asset must populate exactly one of {} (found {})",
                    "title, img, video, data", found
                )))
            }
        };
        Ok(AssetResponse {
            id: wire.id,
            required: wire.required,
            kind,
            link: wire.link,
            ext: wire.ext,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct TitleResponse {
    pub text: String,
    /// Required with `assetsurl`/`dcourl`.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 1))]
    pub len: Option<i64>,
    #[serde(default, deserialize_with = "keep_null", skip_serializing_if = "Option::is_none")]
    pub ext: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct ImageResponse {
    /// Required with `assetsurl`/`dcourl`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub r#type: Option<Coded<ImageAssetType>>,
    #[validate(url)]
    pub url: String,
    /// With `assetsurl`/`dcourl`, required when several images share a type.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 1))]
    pub w: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 1))]
    pub h: Option<i64>,
    #[serde(default, deserialize_with = "keep_null", skip_serializing_if = "Option::is_none")]
    pub ext: Option<Value>,
}

impl ImageResponse {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            r#type: None,
            url: url.into(),
            w: None,
            h: None,
            ext: None,
        }
    }

    pub fn with_type(mut self, kind: ImageAssetType) -> Self {
        self.r#type = Some(kind.into());
        self
    }

    pub fn with_size(mut self, w: i64, h: i64) -> Self {
        self.w = Some(w);
        self.h = Some(h);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct DataResponse {
    /// Required with `assetsurl`/`dcourl`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub r#type: Option<Coded<DataAssetType>>,
    /// Required with `assetsurl`/`dcourl`.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 1))]
    pub len: Option<i64>,
    /// Formatted display string such as "5 stars" or "$10".
    pub value: String,
    #[serde(default, deserialize_with = "keep_null", skip_serializing_if = "Option::is_none")]
    pub ext: Option<Value>,
}

impl DataResponse {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            r#type: None,
            len: None,
            value: value.into(),
            ext: None,
        }
    }

    pub fn with_type(mut self, kind: DataAssetType) -> Self {
        self.r#type = Some(kind.into());
        self
    }
}

/// A VAST document and nothing else.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct VideoResponse {
    #[validate(length(min = 1))]
    pub vasttag: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct LinkResponse {
    /// Landing URL; may be a deep link.
    #[validate(url)]
    pub url: String,
    /// Fired on click.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clicktrackers: Option<Vec<String>>,
    /// Used when the deep link in `url` cannot be opened.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(url)]
    pub fallback: Option<String>,
    #[serde(default, deserialize_with = "keep_null", skip_serializing_if = "Option::is_none")]
    pub ext: Option<Value>,
}

impl LinkResponse {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            clicktrackers: None,
            fallback: None,
            ext: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct EventTrackerResponse {
    pub event: Coded<EventType>,
    pub method: Coded<EventTrackingMethod>,
    /// Required for the img and js methods, optional for custom ones.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(url)]
    pub url: Option<String>,
    #[serde(default, deserialize_with = "keep_null", skip_serializing_if = "Option::is_none")]
    pub customdata: Option<Value>,
    #[serde(default, deserialize_with = "keep_null", skip_serializing_if = "Option::is_none")]
    pub ext: Option<Value>,
}

impl EventTrackerResponse {
    pub fn new(event: EventType, method: EventTrackingMethod, url: impl Into<String>) -> Self {
        Self {
            event: event.into(),
            method: method.into(),
            url: Some(url.into()),
            customdata: None,
            ext: None,
        }
    }
}
