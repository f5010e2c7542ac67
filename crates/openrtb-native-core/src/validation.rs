//! Validation layer over decoded (or hand-built) records.
//!
//! Decoding only guarantees shape. The checks here cover ranges, URL syntax,
//! code-table membership, the assetsurl/dcourl completeness rules and the
//! request/response asset join. Problems are collected into a
//! [`ValidationReport`] rather than stopping at the first one.

use std::collections::{HashMap, HashSet};

use validator::{Validate, ValidationError, ValidationErrors};

use crate::codes::{CodeTable, Coded, EventTrackingMethod};
use crate::config::{UnknownEnumPolicy, ValidationConfig};
use crate::error::NativeError;
use crate::request::{Asset, AssetKind, ImageRequest, NativeRequest};
use crate::response::{
    AssetResponse, AssetResponseKind, LinkResponse, NativeResponse, Representation,
};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub errors: Vec<NativeError>,
    pub warnings: Vec<NativeError>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// `Ok` carries the warnings of a valid payload.
    pub fn into_result(self) -> Result<Vec<NativeError>, Vec<NativeError>> {
        if self.errors.is_empty() {
            Ok(self.warnings)
        } else {
            Err(self.errors)
        }
    }
}

pub fn validate_request(request: &NativeRequest, config: &ValidationConfig) -> ValidationReport {
    let mut checker = Checker::new(config);
    checker.request("", request);
    checker.report
}

pub fn validate_response(response: &NativeResponse, config: &ValidationConfig) -> ValidationReport {
    let mut checker = Checker::new(config);
    checker.response("", response);
    checker.report
}

/// Checks an asset list served from `assetsurl`: every asset must carry the
/// fields that let the renderer place it without the request.
pub fn validate_remote_assets(
    assets: &[AssetResponse],
    config: &ValidationConfig,
) -> ValidationReport {
    let mut checker = Checker::new(config);
    for (index, asset) in assets.iter().enumerate() {
        checker.asset_response(&format!("[{}]", index), asset);
    }
    checker.remote_assets("", assets);
    checker.report
}

/// Validates both sides and joins response assets to request assets by id.
/// Paths are prefixed with `request.` and `response.`.
pub fn validate_exchange(
    request: &NativeRequest,
    response: &NativeResponse,
    config: &ValidationConfig,
) -> ValidationReport {
    let mut checker = Checker::new(config);
    checker.request("request", request);
    checker.response("response", response);
    checker.cross_reference(request, response);
    checker.report
}

fn join(prefix: &str, field: &str) -> String {
    if prefix.is_empty() {
        field.to_string()
    } else if field.starts_with('[') {
        format!("{}{}", prefix, field)
    } else {
        format!("{}.{}", prefix, field)
    }
}

fn describe(err: &ValidationError) -> String {
    let bound = |key: &str| err.params.get(key).map(|v| v.to_string());
    match &*err.code {
        "range" => match (bound("min"), bound("max")) {
            (Some(min), Some(max)) => format!("must be between {} and {}", min, max),
            (Some(min), None) => format!("must be at least {}", min),
            (None, Some(max)) => format!("must be at most {}", max),
            (None, None) => "is out of range".to_string(),
        },
        "length" => match bound("min") {
            Some(min) => format!("must have a length of at least {}", min),
            None => "has an invalid length".to_string(),
        },
        "url" => "must be a valid URL".to_string(),
        code => format!("failed the `{}` check", code),
    }
}

struct Checker<'a> {
    config: &'a ValidationConfig,
    report: ValidationReport,
}

impl<'a> Checker<'a> {
    fn new(config: &'a ValidationConfig) -> Self {
        Self {
            config,
            report: ValidationReport::default(),
        }
    }

    fn error(&mut self, err: NativeError) {
        self.report.errors.push(err);
    }

    fn warn(&mut self, err: NativeError) {
        log::warn!("native validation: {}", err);
        self.report.warnings.push(err);
    }

    fn constraint(&mut self, path: String, message: impl Into<String>) {
        self.error(NativeError::ConstraintViolation {
            path,
            message: message.into(),
        });
    }

    fn missing(&mut self, path: String) {
        self.error(NativeError::MissingRequiredField { path });
    }

    /// Field-level `#[validate]` results of one record.
    fn fields(&mut self, prefix: &str, result: Result<(), ValidationErrors>) {
        let Err(errors) = result else {
            return;
        };
        let mut found: Vec<(String, String)> = Vec::new();
        for (field, errs) in errors.field_errors() {
            for err in errs.iter() {
                let message = match &err.message {
                    Some(message) => message.to_string(),
                    None => describe(err),
                };
                found.push((join(prefix, &field.to_string()), message));
            }
        }
        // field_errors is a HashMap
        found.sort();
        for (path, message) in found {
            self.constraint(path, message);
        }
    }

    fn code<T: CodeTable>(&mut self, path: String, coded: &Coded<T>) {
        let code = match coded {
            Coded::Known(_) => return,
            Coded::Unknown(code) => *code,
        };
        if coded.is_exchange_specific() {
            log::debug!("{} uses exchange-specific {} code {}", path, T::NAME, code);
            return;
        }
        let err = NativeError::UnknownEnumValue {
            path,
            table: T::NAME,
            code,
        };
        match self.config.unknown_enums {
            UnknownEnumPolicy::Warn => self.warn(err),
            UnknownEnumPolicy::Reject => self.error(err),
        }
    }

    fn url(&mut self, path: String, value: &str) {
        if let Err(e) = url::Url::parse(value) {
            self.constraint(path, format!("must be a valid URL ({})", e));
        }
    }

    fn urls(&mut self, path: &str, values: &[String]) {
        for (index, value) in values.iter().enumerate() {
            self.url(format!("{}[{}]", path, index), value);
        }
    }

    fn request(&mut self, prefix: &str, request: &NativeRequest) {
        self.fields(prefix, request.validate());

        if request.assets.len() > self.config.max_assets {
            self.constraint(
                join(prefix, "assets"),
                format!("must not have more than {} entries", self.config.max_assets),
            );
        }

        if let Some(context) = &request.context {
            self.code(join(prefix, "context"), context);
        }
        if let Some(subtype) = &request.contextsubtype {
            self.code(join(prefix, "contextsubtype"), subtype);
        }
        if let Some(plcmttype) = &request.plcmttype {
            self.code(join(prefix, "plcmttype"), plcmttype);
        }
        if let (Some(context), Some(subtype)) = (
            request.context.as_ref().and_then(Coded::known),
            request.contextsubtype.as_ref().and_then(Coded::known),
        ) {
            if subtype.context() != context {
                self.warn(NativeError::ConstraintViolation {
                    path: join(prefix, "contextsubtype"),
                    message: format!("{} does not refine context {}", subtype, context),
                });
            }
        }

        let mut seen = HashSet::new();
        for (index, asset) in request.assets.iter().enumerate() {
            let path = join(prefix, &format!("assets[{}]", index));
            if !seen.insert(asset.id) {
                self.constraint(
                    join(&path, "id"),
                    format!("duplicates asset id {}", asset.id),
                );
            }
            self.asset_request(&path, asset);
        }

        for (index, tracker) in request.eventtrackers.iter().flatten().enumerate() {
            let path = join(prefix, &format!("eventtrackers[{}]", index));
            self.fields(&path, tracker.validate());
            self.code(join(&path, "event"), &tracker.event);
            for (m, method) in tracker.methods.iter().enumerate() {
                self.code(join(&path, &format!("methods[{}]", m)), method);
            }
        }
    }

    fn asset_request(&mut self, path: &str, asset: &Asset) {
        match &asset.kind {
            AssetKind::Title(title) => {
                self.fields(&join(path, "title"), title.validate());
            }
            AssetKind::Image(img) => {
                let path = join(path, "img");
                self.fields(&path, img.validate());
                if let Some(kind) = &img.r#type {
                    self.code(join(&path, "type"), kind);
                }
                self.image_dimensions(&path, img);
            }
            AssetKind::Video(video) => {
                let path = join(path, "video");
                self.fields(&path, video.validate());
                if video.minduration > video.maxduration {
                    self.constraint(
                        join(&path, "minduration"),
                        format!(
                            "must not exceed maxduration ({} > {})",
                            video.minduration, video.maxduration
                        ),
                    );
                }
            }
            AssetKind::Data(data) => {
                let path = join(path, "data");
                self.fields(&path, data.validate());
                self.code(join(&path, "type"), &data.r#type);
            }
        }
    }

    fn image_dimensions(&mut self, path: &str, img: &ImageRequest) {
        let pairs = [
            ("w", img.w.is_some() || img.wmin.is_some()),
            ("h", img.h.is_some() || img.hmin.is_some()),
        ];
        for (dimension, present) in pairs {
            if present {
                continue;
            }
            let err = NativeError::ConstraintViolation {
                path: join(path, dimension),
                message: format!("either {0} or {0}min should be present", dimension),
            };
            if self.config.require_image_dimensions {
                self.error(err);
            } else {
                self.warn(err);
            }
        }
    }

    fn response(&mut self, prefix: &str, response: &NativeResponse) {
        self.fields(prefix, response.validate());
        self.link(&join(prefix, "link"), &response.link);

        let representation = response.representation();
        match (&response.assets, representation) {
            (None, Representation::Inline) => self.missing(join(prefix, "assets")),
            (Some(assets), Representation::Inline) if assets.is_empty() => self.constraint(
                join(prefix, "assets"),
                "must not be empty without assetsurl or dcourl",
            ),
            _ => {}
        }

        if let Some(assets) = &response.assets {
            let mut seen = HashSet::new();
            for (index, asset) in assets.iter().enumerate() {
                let path = join(prefix, &format!("assets[{}]", index));
                match asset.id {
                    Some(id) if !seen.insert(id) => {
                        self.constraint(join(&path, "id"), format!("duplicates asset id {}", id))
                    }
                    None if representation == Representation::Inline => {
                        self.missing(join(&path, "id"))
                    }
                    _ => {}
                }
                self.asset_response(&path, asset);
            }
            if representation == Representation::Remote {
                self.remote_assets(&join(prefix, "assets"), assets);
            }
        }

        if let Some(imptrackers) = &response.imptrackers {
            let path = join(prefix, "imptrackers");
            self.urls(&path, imptrackers);
            if self.config.report_deprecated {
                self.warn(NativeError::Deprecated {
                    path,
                    replacement: "eventtrackers",
                });
            }
        }
        if response.jstracker.is_some() && self.config.report_deprecated {
            self.warn(NativeError::Deprecated {
                path: join(prefix, "jstracker"),
                replacement: "eventtrackers",
            });
        }

        for (index, tracker) in response.eventtrackers.iter().flatten().enumerate() {
            let path = join(prefix, &format!("eventtrackers[{}]", index));
            self.fields(&path, tracker.validate());
            self.code(join(&path, "event"), &tracker.event);
            self.code(join(&path, "method"), &tracker.method);
            let needs_url = matches!(
                tracker.method,
                Coded::Known(EventTrackingMethod::Img | EventTrackingMethod::Js)
            );
            if needs_url && tracker.url.is_none() {
                self.missing(join(&path, "url"));
            }
        }
    }

    fn link(&mut self, path: &str, link: &LinkResponse) {
        self.fields(path, link.validate());
        if let Some(clicktrackers) = &link.clicktrackers {
            self.urls(&join(path, "clicktrackers"), clicktrackers);
        }
    }

    fn asset_response(&mut self, path: &str, asset: &AssetResponse) {
        match &asset.kind {
            AssetResponseKind::Title(title) => {
                self.fields(&join(path, "title"), title.validate());
            }
            AssetResponseKind::Image(img) => {
                let path = join(path, "img");
                self.fields(&path, img.validate());
                if let Some(kind) = &img.r#type {
                    self.code(join(&path, "type"), kind);
                }
            }
            AssetResponseKind::Video(video) => {
                self.fields(&join(path, "video"), video.validate());
            }
            AssetResponseKind::Data(data) => {
                let path = join(path, "data");
                self.fields(&path, data.validate());
                if let Some(kind) = &data.r#type {
                    self.code(join(&path, "type"), kind);
                }
            }
        }
        if let Some(link) = &asset.link {
            self.link(&join(path, "link"), link);
        }
    }

    /// Without the request to join against, remote assets must describe
    /// themselves: title and data lengths, data and image types, and image
    /// sizes whenever two images share a type.
    fn remote_assets(&mut self, prefix: &str, assets: &[AssetResponse]) {
        let mut images_per_type: HashMap<i64, usize> = HashMap::new();
        for asset in assets {
            if let AssetResponseKind::Image(img) = &asset.kind {
                if let Some(kind) = &img.r#type {
                    *images_per_type.entry(kind.code()).or_default() += 1;
                }
            }
        }

        for (index, asset) in assets.iter().enumerate() {
            let path = join(prefix, &format!("[{}]", index));
            match &asset.kind {
                AssetResponseKind::Title(title) => {
                    if title.len.is_none() {
                        self.missing(join(&path, "title.len"));
                    }
                }
                AssetResponseKind::Data(data) => {
                    if data.r#type.is_none() {
                        self.missing(join(&path, "data.type"));
                    }
                    if data.len.is_none() {
                        self.missing(join(&path, "data.len"));
                    }
                }
                AssetResponseKind::Image(img) => match &img.r#type {
                    None => self.missing(join(&path, "img.type")),
                    Some(kind) => {
                        let shared = images_per_type.get(&kind.code()).copied().unwrap_or(0) > 1;
                        if shared && img.w.is_none() {
                            self.missing(join(&path, "img.w"));
                        }
                        if shared && img.h.is_none() {
                            self.missing(join(&path, "img.h"));
                        }
                    }
                },
                AssetResponseKind::Video(_) => {}
            }
        }
    }

    fn cross_reference(&mut self, request: &NativeRequest, response: &NativeResponse) {
        if response.representation() == Representation::Remote {
            return;
        }
        let Some(assets) = &response.assets else {
            return;
        };

        let mut answered = HashSet::new();
        for (index, asset) in assets.iter().enumerate() {
            let Some(id) = asset.id else {
                continue;
            };
            let path = format!("response.assets[{}]", index);
            match request.asset(id) {
                None => self.error(NativeError::CrossReferenceMismatch {
                    path: join(&path, "id"),
                    reason: format!("asset id {} is not present in the request", id),
                }),
                Some(requested) if requested.variant() != asset.variant() => {
                    self.error(NativeError::CrossReferenceMismatch {
                        path,
                        reason: format!(
                            "request asset {} is {}, response answers with {}",
                            id,
                            requested.variant().name(),
                            asset.variant().name()
                        ),
                    })
                }
                Some(_) => {
                    answered.insert(id);
                }
            }
        }

        for required in request.required_assets() {
            if !answered.contains(&required.id) {
                self.missing(format!("response.assets[id={}]", required.id));
            }
        }
    }
}
