//! Extraction of tile coordinates from `{z}/{x}/{y}.{ext}` paths.

use camino::{Utf8Component, Utf8Components, Utf8Path};

use crate::TileCoord;

/// Image extension recognised when no other is configured.
pub const DEFAULT_TILE_EXTENSION: &str = "png";

/// Parses tile coordinates from the trailing components of a file path.
///
/// Only the last three components are inspected, so the cache may live at
/// any depth. The `x` component and the file stem must consist solely of
/// ASCII digits. The zoom is the run of digits ending the `z` component, so
/// `L07/3/5.png` is tile (7, 3, 5). The extension must match exactly,
/// including case.
///
/// # Examples
///
/// ```
/// use camino::Utf8Path;
/// use tilepack_core::{TileCoord, TilePathParser};
///
/// let parser = TilePathParser::default();
/// assert_eq!(
///     parser.parse(Utf8Path::new("/srv/cache/7/3/5.png")),
///     Some(TileCoord::new(7, 3, 5))
/// );
/// assert_eq!(parser.parse(Utf8Path::new("/srv/cache/notes.txt")), None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TilePathParser {
    extension: String,
}

impl Default for TilePathParser {
    fn default() -> Self {
        Self::new(DEFAULT_TILE_EXTENSION)
    }
}

impl TilePathParser {
    /// Create a parser for files ending in `.{extension}`.
    ///
    /// A leading dot is accepted and ignored, so `"png"` and `".png"` are
    /// equivalent.
    #[must_use]
    pub fn new(extension: impl Into<String>) -> Self {
        let raw: String = extension.into();
        Self {
            extension: raw.trim_start_matches('.').to_owned(),
        }
    }

    /// The recognised extension without its leading dot.
    #[must_use]
    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Extract coordinates from `path`, or `None` when it is not a tile.
    #[must_use]
    pub fn parse(&self, path: &Utf8Path) -> Option<TileCoord> {
        let mut components = path.components();
        let file_name = normal_component(&mut components)?;
        let stem = file_name
            .strip_suffix(self.extension.as_str())?
            .strip_suffix('.')?;
        let y = parse_segment(stem)?;
        let x = normal_component(&mut components).and_then(parse_segment)?;
        let z = normal_component(&mut components)
            .map(trailing_digits)
            .and_then(parse_segment)?;
        Some(TileCoord::new(z, x, y))
    }
}

fn normal_component<'a>(components: &mut Utf8Components<'a>) -> Option<&'a str> {
    match components.next_back()? {
        Utf8Component::Normal(name) => Some(name),
        _ => None,
    }
}

fn trailing_digits(component: &str) -> &str {
    let prefix = component.trim_end_matches(|c: char| c.is_ascii_digit());
    component.get(prefix.len()..).unwrap_or_default()
}

fn parse_segment(segment: &str) -> Option<u32> {
    if segment.is_empty() || !segment.bytes().all(|byte| byte.is_ascii_digit()) {
        return None;
    }
    segment.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn parser() -> TilePathParser {
        TilePathParser::default()
    }

    #[rstest]
    #[case("7/3/5.png", TileCoord::new(7, 3, 5))]
    #[case("/var/cache/tiles/0/0/0.png", TileCoord::new(0, 0, 0))]
    #[case("tiles/18/131072/87654.png", TileCoord::new(18, 131_072, 87_654))]
    #[case("cache/007/003/005.png", TileCoord::new(7, 3, 5))]
    #[case::prefixed_zoom("/srv/L07/3/5.png", TileCoord::new(7, 3, 5))]
    #[case::dated_zoom("tiles-2024/3/5.png", TileCoord::new(2024, 3, 5))]
    #[case::mixed_segment("tiles7/3/5.png", TileCoord::new(7, 3, 5))]
    fn parses_tile_paths(
        parser: TilePathParser,
        #[case] path: &str,
        #[case] expected: TileCoord,
    ) {
        assert_eq!(parser.parse(Utf8Path::new(path)), Some(expected));
    }

    #[rstest]
    #[case::wrong_extension("7/3/5.jpg")]
    #[case::upper_case_extension("7/3/5.PNG")]
    #[case::extension_without_dot("7/3/5png")]
    #[case::no_stem("7/3/.png")]
    #[case::text_file("notes.txt")]
    #[case::too_shallow("3/5.png")]
    #[case::single_file("5.png")]
    #[case::non_numeric_zoom("a/3/5.png")]
    #[case::zoom_without_trailing_digits("7a/3/5.png")]
    #[case::mixed_column("7/x3/5.png")]
    #[case::mixed_stem("7/3/y5.png")]
    #[case::overflowing_zoom("z99999999999/3/5.png")]
    #[case::non_numeric_stem("7/3/five.png")]
    #[case::negative_segment("7/-3/5.png")]
    #[case::double_extension("7/3/5.png.bak")]
    #[case::overflowing_segment("7/3/99999999999.png")]
    #[case::parent_component("7/../5.png")]
    fn rejects_non_tile_paths(parser: TilePathParser, #[case] path: &str) {
        assert_eq!(parser.parse(Utf8Path::new(path)), None);
    }

    #[rstest]
    fn honours_configured_extension() {
        let parser = TilePathParser::new(".webp");
        assert_eq!(parser.extension(), "webp");
        assert_eq!(TilePathParser::new("webp"), parser);
        assert_eq!(
            parser.parse(Utf8Path::new("1/2/3.webp")),
            Some(TileCoord::new(1, 2, 3))
        );
        assert_eq!(parser.parse(Utf8Path::new("1/2/3.png")), None);
    }
}
