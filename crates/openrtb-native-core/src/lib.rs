//! OpenRTB Dynamic Native Ads 1.2 object model.
//!
//! Typed request/response records with a JSON codec and a validation layer
//! that checks what serde cannot express: value ranges, code-table
//! membership, remote asset completeness and the request/response asset join.

pub mod codec;
pub mod codes;
pub mod config;
pub mod error;
pub mod request;
pub mod response;
pub mod validation;
mod wire;

pub use codec::{
    decode_request, decode_request_slice, decode_request_value, decode_response,
    decode_response_slice, decode_response_value, encode_request, encode_request_value,
    encode_response, encode_response_value,
};
pub use codes::{
    CodeTable, Coded, ContextSubType, ContextType, DataAssetType, EventTrackingMethod, EventType,
    ImageAssetType, PlacementType, EXCHANGE_SPECIFIC_MIN,
};
pub use config::{ConfigError, NativeConfig, UnknownEnumPolicy, ValidationConfig};
pub use error::NativeError;
pub use request::{
    Asset, AssetKind, AssetVariant, DataRequest, EventTracker, ImageRequest, NativeRequest,
    TitleRequest, VideoRequest,
};
pub use response::{
    AssetResponse, AssetResponseKind, DataResponse, EventTrackerResponse, ImageResponse,
    LinkResponse, NativeResponse, Representation, TitleResponse, VideoResponse,
};
pub use validation::{
    validate_exchange, validate_remote_assets, validate_request, validate_response,
    ValidationReport,
};
pub use wire::NATIVE_VERSION;
