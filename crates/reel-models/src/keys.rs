//! Deterministic object-key scheme.
//!
//! Every stage locates artifacts purely from `{owner, name}`, so the key
//! layout is the contract between stages:
//!
//! ```text
//! users/{owner}/videos/{name}/vid          upstream source / normalized blob
//! users/{owner}/videos/{name}/thumbnail    preview frame (JPEG)
//! users/{owner}/videos/{name}/hls/...      segment manifest + segments
//! ```

/// Artifact name of the upstream source blob (replaced in place by the
/// normalized output).
pub const SOURCE_ARTIFACT: &str = "vid";

/// Artifact name of the preview image.
pub const THUMBNAIL_ARTIFACT: &str = "thumbnail";

/// Directory artifact holding the segment manifest and segment files.
pub const HLS_DIR: &str = "hls";

/// Manifest filename inside the HLS directory.
pub const HLS_MANIFEST: &str = "vid.m3u8";

/// Prefix under which all artifacts for one video live.
pub fn video_prefix(owner: &str, name: &str) -> String {
    format!("users/{}/videos/{}", owner, name)
}

/// Key of the upstream source blob.
pub fn source_key(owner: &str, name: &str) -> String {
    format!("{}/{}", video_prefix(owner, name), SOURCE_ARTIFACT)
}

/// Key of the preview image.
pub fn thumbnail_key(owner: &str, name: &str) -> String {
    format!("{}/{}", video_prefix(owner, name), THUMBNAIL_ARTIFACT)
}

/// Prefix of the HLS package for a video.
pub fn hls_prefix(owner: &str, name: &str) -> String {
    format!("{}/{}", video_prefix(owner, name), HLS_DIR)
}

/// Key of the HLS manifest.
pub fn manifest_key(owner: &str, name: &str) -> String {
    format!("{}/{}", hls_prefix(owner, name), HLS_MANIFEST)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_namespaced_by_owner_and_name() {
        assert_eq!(source_key("u1", "v1"), "users/u1/videos/v1/vid");
        assert_eq!(thumbnail_key("u1", "v1"), "users/u1/videos/v1/thumbnail");
        assert_eq!(manifest_key("u1", "v1"), "users/u1/videos/v1/hls/vid.m3u8");
        assert_ne!(source_key("u1", "v1"), source_key("u2", "v1"));
    }
}
