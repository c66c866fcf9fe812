/// Container/codec choices in order of preference.
pub const PREFERRED_MIME_TYPES: [&str; 3] = [
    "video/webm;codecs=vp9",
    "video/webm;codecs=vp8",
    "video/webm",
];

/// First preferred type the encoder supports, or `None` to use its defaults.
pub fn select_mime<F>(is_supported: F) -> Option<&'static str>
where
    F: Fn(&str) -> bool,
{
    PREFERRED_MIME_TYPES
        .iter()
        .copied()
        .find(|mime| is_supported(mime))
}

#[cfg(test)]
mod tests {
    use super::select_mime;

    #[test]
    fn prefers_vp9() {
        assert_eq!(select_mime(|_| true), Some("video/webm;codecs=vp9"));
    }

    #[test]
    fn falls_back_down_the_list() {
        assert_eq!(
            select_mime(|m| m == "video/webm;codecs=vp8" || m == "video/webm"),
            Some("video/webm;codecs=vp8")
        );
        assert_eq!(select_mime(|m| m == "video/webm"), Some("video/webm"));
    }

    #[test]
    fn nothing_supported_means_defaults() {
        assert_eq!(select_mime(|_| false), None);
    }
}
