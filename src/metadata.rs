use serde::Serialize;

#[allow(dead_code)]
mod build_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

/// Build information, logged at startup and printed by the host tool.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct ApplicationMetadata {
    pub app: &'static str,
    pub firmware_version: &'static str,
    pub rust_version: &'static str,
    pub profile: &'static str,
    pub git_dirty: bool,
    pub features: &'static str,
}

impl ApplicationMetadata {
    pub fn new() -> Self {
        Self {
            app: build_info::PKG_NAME,
            firmware_version: build_info::GIT_VERSION.unwrap_or(build_info::PKG_VERSION),
            rust_version: build_info::RUSTC_VERSION,
            profile: build_info::PROFILE,
            git_dirty: build_info::GIT_DIRTY.unwrap_or(false),
            features: build_info::FEATURES_STR,
        }
    }
}

impl Default for ApplicationMetadata {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metadata() {
        let meta = ApplicationMetadata::new();
        assert_eq!(meta.app, "thermocouple-logger");
        assert!(!meta.firmware_version.is_empty());
        let json = serde_json_core::to_string::<_, 512>(&meta).unwrap();
        assert!(json.starts_with(r#"{"app":"thermocouple-logger""#));
    }
}
