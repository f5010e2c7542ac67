//! Native Markup Request object graph.
//!
//! An exchange sends a [`NativeRequest`] describing the assets it can render;
//! the bidder answers with a [`crate::response::NativeResponse`] whose asset
//! ids refer back to [`Asset::id`].

use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::Validate;

use crate::codes::{
    Coded, ContextSubType, ContextType, DataAssetType, EventTrackingMethod, EventType,
    ImageAssetType, PlacementType,
};
use crate::wire::{
    bool_int, default_plcmtcnt, default_ver, is_false, keep_null, null_default, NATIVE_VERSION,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct NativeRequest {
    #[serde(default = "default_ver", deserialize_with = "null_default::ver")]
    pub ver: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<Coded<ContextType>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contextsubtype: Option<Coded<ContextSubType>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plcmttype: Option<Coded<PlacementType>>,
    /// Number of identical placements in this layout.
    #[serde(default = "default_plcmtcnt", deserialize_with = "null_default::plcmtcnt")]
    #[validate(range(min = 1))]
    pub plcmtcnt: i64,
    /// 0 for the first ad of a sequence, 1 for the second, and so on.
    #[serde(default, deserialize_with = "null_default::zero")]
    #[validate(range(min = 0))]
    pub seq: i64,
    /// The bid response must comply with exactly this list.
    #[validate(length(min = 1))]
    pub assets: Vec<Asset>,
    /// Supply accepts `assetsurl` in place of inline assets.
    #[serde(default, with = "bool_int", skip_serializing_if = "is_false")]
    pub aurlsupport: bool,
    /// Supply accepts `dcourl` in place of inline assets.
    #[serde(default, with = "bool_int", skip_serializing_if = "is_false")]
    pub durlsupport: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eventtrackers: Option<Vec<EventTracker>>,
    /// Supply renders a buyer-specific privacy notice.
    #[serde(default, with = "bool_int", skip_serializing_if = "is_false")]
    pub privacy: bool,
    #[serde(default, deserialize_with = "keep_null", skip_serializing_if = "Option::is_none")]
    pub ext: Option<Value>,
}

impl Default for NativeRequest {
    fn default() -> Self {
        Self {
            ver: NATIVE_VERSION.to_string(),
            context: None,
            contextsubtype: None,
            plcmttype: None,
            plcmtcnt: default_plcmtcnt(),
            seq: 0,
            assets: Vec::new(),
            aurlsupport: false,
            durlsupport: false,
            eventtrackers: None,
            privacy: false,
            ext: None,
        }
    }
}

impl NativeRequest {
    pub fn new(assets: Vec<Asset>) -> Self {
        Self {
            assets,
            ..Default::default()
        }
    }

    /// Look up a request asset by its exchange-assigned id.
    pub fn asset(&self, id: i64) -> Option<&Asset> {
        self.assets.iter().find(|asset| asset.id == id)
    }

    pub fn required_assets(&self) -> impl Iterator<Item = &Asset> {
        self.assets.iter().filter(|asset| asset.is_required())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct EventTracker {
    pub event: Coded<EventType>,
    #[validate(length(min = 1))]
    pub methods: Vec<Coded<EventTrackingMethod>>,
    #[serde(default, deserialize_with = "keep_null", skip_serializing_if = "Option::is_none")]
    pub ext: Option<Value>,
}

impl EventTracker {
    pub fn new(event: EventType, methods: &[EventTrackingMethod]) -> Self {
        Self {
            event: event.into(),
            methods: methods.iter().copied().map(Coded::from).collect(),
            ext: None,
        }
    }
}

/// Which of the four asset shapes an asset carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetVariant {
    Title,
    Image,
    Video,
    Data,
}

impl AssetVariant {
    /// Wire key of the variant.
    pub fn name(self) -> &'static str {
        match self {
            AssetVariant::Title => "title",
            AssetVariant::Image => "img",
            AssetVariant::Video => "video",
            AssetVariant::Data => "data",
        }
    }
}

pub(crate) const ASSET_VARIANT_KEYS: [&str; 4] = ["title", "img", "video", "data"];

/// One element of the native ad. On the wire exactly one of `title`, `img`,
/// `video` or `data` is present; here that choice is [`AssetKind`].
#[derive(Debug, Clone, PartialEq)]
pub struct Asset {
    /// Unique within the request, the join key for response assets.
    pub id: i64,
    /// The exchange will not accept a bid without this asset.
    pub required: bool,
    pub kind: AssetKind,
    pub ext: Option<Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AssetKind {
    Title(TitleRequest),
    Image(ImageRequest),
    Video(VideoRequest),
    Data(DataRequest),
}

impl AssetKind {
    pub fn variant(&self) -> AssetVariant {
        match self {
            AssetKind::Title(_) => AssetVariant::Title,
            AssetKind::Image(_) => AssetVariant::Image,
            AssetKind::Video(_) => AssetVariant::Video,
            AssetKind::Data(_) => AssetVariant::Data,
        }
    }

    /// Wire key this asset is stored under.
    pub fn name(&self) -> &'static str {
        self.variant().name()
    }
}

impl Asset {
    pub fn new(id: i64, kind: AssetKind) -> Self {
        Self {
            id,
            required: false,
            kind,
            ext: None,
        }
    }

    pub fn title(id: i64, len: i64) -> Self {
        Self::new(id, AssetKind::Title(TitleRequest { len, ext: None }))
    }

    pub fn image(id: i64, img: ImageRequest) -> Self {
        Self::new(id, AssetKind::Image(img))
    }

    pub fn video(id: i64, video: VideoRequest) -> Self {
        Self::new(id, AssetKind::Video(video))
    }

    pub fn data(id: i64, data: DataRequest) -> Self {
        Self::new(id, AssetKind::Data(data))
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn variant(&self) -> AssetVariant {
        self.kind.variant()
    }
}

#[derive(Deserialize)]
struct AssetWire {
    id: i64,
    #[serde(default, with = "bool_int")]
    required: bool,
    #[serde(default)]
    title: Option<TitleRequest>,
    #[serde(default)]
    img: Option<ImageRequest>,
    #[serde(default)]
    video: Option<VideoRequest>,
    #[serde(default)]
    data: Option<DataRequest>,
    #[serde(default, deserialize_with = "keep_null")]
    ext: Option<Value>,
}

#[derive(Serialize)]
struct AssetWireRef<'a> {
    id: i64,
    #[serde(with = "bool_int", skip_serializing_if = "is_false")]
    required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<&'a TitleRequest>,
    #[serde(skip_serializing_if = "Option::is_none")]
    img: Option<&'a ImageRequest>,
    #[serde(skip_serializing_if = "Option::is_none")]
    video: Option<&'a VideoRequest>,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<&'a DataRequest>,
    #[serde(skip_serializing_if = "Option::is_none")]
    ext: Option<&'a Value>,
}

impl Serialize for Asset {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut wire = AssetWireRef {
            id: self.id,
            required: self.required,
            title: None,
            img: None,
            video: None,
            data: None,
            ext: self.ext.as_ref(),
        };
        match &self.kind {
            AssetKind::Title(title) => wire.title = Some(title),
            AssetKind::Image(img) => wire.img = Some(img),
            AssetKind::Video(video) => wire.video = Some(video),
            AssetKind::Data(data) => wire.data = Some(data),
        }
        wire.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Asset {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let wire = AssetWire::deserialize(deserializer)?;
        let found = usize::from(wire.title.is_some())
            + usize::from(wire.img.is_some())
            + usize::from(wire.video.is_some())
            + usize::from(wire.data.is_some());
        let kind = match (wire.title, wire.img, wire.video, wire.data) {
            (Some(title), None, None, None) => AssetKind::Title(title),
            (None, Some(img), None, None) => AssetKind::Image(img),
            (None, None, Some(video), None) => AssetKind::Video(video),
            (None, None, None, Some(data)) => AssetKind::Data(data),
            _ => {
                return Err(de::Error::custom(format!(
                    "asset {} must populate exactly one of title, img, video, data (found {})",
                    wire.id, found
                )))
            }
        };
        Ok(Asset {
            id: wire.id,
            required: wire.required,
            kind,
            ext: wire.ext,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct TitleRequest {
    /// Maximum title length in characters; 25, 90 or 140 are typical.
    #[validate(range(min = 1))]
    pub len: i64,
    #[serde(default, deserialize_with = "keep_null", skip_serializing_if = "Option::is_none")]
    pub ext: Option<Value>,
}

/// Icons, main images and other image elements. Send `w` or `wmin`, and `h`
/// or `hmin`.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct ImageRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub r#type: Option<Coded<ImageAssetType>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 1))]
    pub w: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 1))]
    pub wmin: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 1))]
    pub h: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 1))]
    pub hmin: Option<i64>,
    /// Absent means all types are allowed.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1))]
    pub mimes: Option<Vec<String>>,
    #[serde(default, deserialize_with = "keep_null", skip_serializing_if = "Option::is_none")]
    pub ext: Option<Value>,
}

impl ImageRequest {
    pub fn of_type(kind: ImageAssetType) -> Self {
        Self {
            r#type: Some(kind.into()),
            ..Default::default()
        }
    }

    pub fn with_size(mut self, w: i64, h: i64) -> Self {
        self.w = Some(w);
        self.h = Some(h);
        self
    }

    pub fn with_min_size(mut self, wmin: i64, hmin: i64) -> Self {
        self.wmin = Some(wmin);
        self.hmin = Some(hmin);
        self
    }

    pub fn allows_mime(&self, mime: &str) -> bool {
        match &self.mimes {
            Some(mimes) => mimes.iter().any(|m| m.eq_ignore_ascii_case(mime)),
            None => true,
        }
    }
}

/// Mirrors the OpenRTB 2.x Video object, restricted to what native needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct VideoRequest {
    #[validate(length(min = 1))]
    pub mimes: Vec<String>,
    /// Seconds.
    #[validate(range(min = 0))]
    pub minduration: i64,
    /// Seconds.
    #[validate(range(min = 0))]
    pub maxduration: i64,
    /// OpenRTB video bid response protocol codes.
    #[validate(length(min = 1))]
    pub protocols: Vec<i64>,
    #[serde(default, deserialize_with = "keep_null", skip_serializing_if = "Option::is_none")]
    pub ext: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct DataRequest {
    pub r#type: Coded<DataAssetType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 1))]
    pub len: Option<i64>,
    #[serde(default, deserialize_with = "keep_null", skip_serializing_if = "Option::is_none")]
    pub ext: Option<Value>,
}

impl DataRequest {
    pub fn new(kind: DataAssetType, len: Option<i64>) -> Self {
        Self {
            r#type: kind.into(),
            len,
            ext: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_minimal_request_applies_defaults() {
        let v = json!({"assets": [{"id": 1, "required": 1, "title": {"len": 90}}]});
        let req: NativeRequest = serde_json::from_value(v).unwrap();
        assert_eq!(req.ver, "1.2");
        assert_eq!(req.plcmtcnt, 1);
        assert_eq!(req.seq, 0);
        assert!(!req.aurlsupport);
        assert!(!req.privacy);
        assert_eq!(req.assets.len(), 1);
        let asset = &req.assets[0];
        assert!(asset.required);
        assert_eq!(
            asset.kind,
            AssetKind::Title(TitleRequest { len: 90, ext: None })
        );
    }

    #[test]
    fn test_null_default_fields_resolve_to_defaults() {
        let v = json!({
            "ver": null,
            "plcmtcnt": null,
            "seq": null,
            "aurlsupport": null,
            "durlsupport": null,
            "privacy": null,
            "assets": [{"id": 1, "required": null, "title": {"len": 90}}]
        });
        let req: NativeRequest = serde_json::from_value(v).unwrap();
        assert_eq!(req, NativeRequest::new(vec![Asset::title(1, 90)]));
    }

    #[test]
    fn test_null_ext_survives_reencode() {
        let mut req = NativeRequest::new(vec![Asset::title(1, 90)]);
        req.ext = Some(Value::Null);
        req.assets[0].ext = Some(Value::Null);
        let v = serde_json::to_value(&req).unwrap();
        assert_eq!(v["ext"], Value::Null);
        assert!(v["assets"][0].get("ext").is_some());
        let back: NativeRequest = serde_json::from_value(v).unwrap();
        assert_eq!(back, req);
    }

    #[test]
    fn test_context_codes_decode_to_variants() {
        let v = json!({
            "context": 3,
            "contextsubtype": 31,
            "plcmttype": 4,
            "assets": [{"id": 1, "title": {"len": 25}}]
        });
        let req: NativeRequest = serde_json::from_value(v).unwrap();
        assert_eq!(req.context, Some(Coded::Known(ContextType::Product)));
        assert_eq!(req.contextsubtype, Some(Coded::Known(ContextSubType::AppStore)));
        assert_eq!(
            req.plcmttype,
            Some(Coded::Known(PlacementType::RecommendationWidget))
        );
    }

    #[test]
    fn test_asset_with_two_variants_is_rejected() {
        let v = json!({"id": 4, "title": {"len": 25}, "img": {"type": 3}});
        let err = serde_json::from_value::<Asset>(v).unwrap_err();
        assert!(err.to_string().contains("exactly one"), "{}", err);
    }

    #[test]
    fn test_asset_without_variant_is_rejected() {
        let v = json!({"id": 4, "required": 1});
        assert!(serde_json::from_value::<Asset>(v).is_err());
    }

    #[test]
    fn test_null_variant_counts_as_absent() {
        let v = json!({"id": 2, "title": null, "data": {"type": 2, "len": 140}});
        let asset: Asset = serde_json::from_value(v).unwrap();
        assert_eq!(asset.variant(), AssetVariant::Data);
    }

    #[test]
    fn test_asset_serializes_flat() {
        let asset = Asset::image(
            2,
            ImageRequest::of_type(ImageAssetType::Main).with_min_size(600, 314),
        )
        .required();
        let v = serde_json::to_value(&asset).unwrap();
        assert_eq!(
            v,
            json!({"id": 2, "required": 1, "img": {"type": 3, "wmin": 600, "hmin": 314}})
        );
    }

    #[test]
    fn test_request_serializes_defaults_and_omits_false_flags() {
        let req = NativeRequest::new(vec![Asset::title(1, 90)]);
        let v = serde_json::to_value(&req).unwrap();
        assert_eq!(
            v,
            json!({
                "ver": "1.2",
                "plcmtcnt": 1,
                "seq": 0,
                "assets": [{"id": 1, "title": {"len": 90}}]
            })
        );
    }

    #[test]
    fn test_unknown_fields_are_dropped() {
        let v = json!({
            "assets": [{"id": 1, "title": {"len": 90, "foo": 1}, "bar": true}],
            "layout": 3
        });
        let req: NativeRequest = serde_json::from_value(v).unwrap();
        let out = serde_json::to_value(&req).unwrap();
        assert!(out.get("layout").is_none());
        assert!(out["assets"][0].get("bar").is_none());
    }

    #[test]
    fn test_ext_accepts_arbitrary_json() {
        let v = json!({
            "assets": [{"id": 1, "title": {"len": 90}, "ext": {"nested": [1, "two", null]}}],
            "ext": {"exchange": {"layout": "grid", "cols": 3}}
        });
        let req: NativeRequest = serde_json::from_value(v.clone()).unwrap();
        assert_eq!(req.ext, Some(v["ext"].clone()));
        assert_eq!(req.assets[0].ext, Some(json!({"nested": [1, "two", null]})));
    }

    #[test]
    fn test_asset_lookup_and_required_assets() {
        let req = NativeRequest::new(vec![
            Asset::title(1, 90).required(),
            Asset::data(2, DataRequest::new(DataAssetType::Sponsored, None)),
        ]);
        assert_eq!(req.asset(2).map(Asset::variant), Some(AssetVariant::Data));
        assert_eq!(req.asset(2).map(|a| a.kind.name()), Some("data"));
        assert!(req.asset(1).is_some_and(Asset::is_required));
        assert!(req.asset(9).is_none());
        let required: Vec<i64> = req.required_assets().map(|a| a.id).collect();
        assert_eq!(required, vec![1]);
    }

    #[test]
    fn test_image_mime_whitelist() {
        let any = ImageRequest::default();
        assert!(any.allows_mime("image/webp"));
        let jpeg_only = ImageRequest {
            mimes: Some(vec!["image/jpeg".to_string()]),
            ..Default::default()
        };
        assert!(jpeg_only.allows_mime("IMAGE/JPEG"));
        assert!(!jpeg_only.allows_mime("image/png"));
    }

    #[test]
    fn test_event_tracker_methods() {
        let tracker = EventTracker::new(
            EventType::Impression,
            &[EventTrackingMethod::Img, EventTrackingMethod::Js],
        );
        let v = serde_json::to_value(&tracker).unwrap();
        assert_eq!(v, json!({"event": 1, "methods": [1, 2]}));
    }

    #[test]
    fn test_video_requires_durations() {
        let v = json!({"mimes": ["video/mp4"], "protocols": [2, 3], "minduration": 5});
        let err = serde_json::from_value::<VideoRequest>(v).unwrap_err();
        assert!(err.to_string().contains("maxduration"));
    }
}
