//! Property tests for tile path parsing.

use camino::Utf8PathBuf;
use proptest::prelude::*;
use tilepack_core::{TileCoord, TilePathParser};

proptest! {
    #[test]
    fn parses_any_coordinate_under_any_prefix(
        prefix in proptest::collection::vec("[a-z]{1,8}", 0..4),
        z in 0u32..=30,
        x in any::<u32>(),
        y in any::<u32>(),
    ) {
        let mut path = Utf8PathBuf::from("/");
        for segment in &prefix {
            path.push(segment);
        }
        path.push(z.to_string());
        path.push(x.to_string());
        path.push(format!("{y}.png"));

        let parsed = TilePathParser::default().parse(&path);
        prop_assert_eq!(parsed, Some(TileCoord::new(z, x, y)));
    }

    #[test]
    fn reads_the_zoom_from_trailing_digits(
        label in "[A-Za-z_-]{1,6}",
        z in 0u32..=30,
        x in any::<u32>(),
        y in any::<u32>(),
    ) {
        let path = Utf8PathBuf::from(format!("/srv/{label}{z}/{x}/{y}.png"));
        prop_assert_eq!(
            TilePathParser::default().parse(&path),
            Some(TileCoord::new(z, x, y))
        );
    }

    #[test]
    fn ignores_files_with_other_extensions(
        z in 0u32..=30,
        x in 0u32..1_000_000,
        y in 0u32..1_000_000,
        extension in "(jpg|jpeg|webp|txt|PNG|pbf)",
    ) {
        let path = Utf8PathBuf::from(format!("tiles/{z}/{x}/{y}.{extension}"));
        prop_assert_eq!(TilePathParser::default().parse(&path), None);
    }
}
