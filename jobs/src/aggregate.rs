//! Resolution of aggregate constituents.
//!
//! An aggregate job bundles other jobs. Its `constituents` attribute is
//! coerced to a string purely for the dependency markers that coercion
//! produces; the recipe paths encoded in the output-class markers are
//! the constituent derivations.

use std::collections::BTreeSet;

use crate::evaluator::ContextMarker;

/// Collects the constituent recipe paths from coercion markers,
/// deduplicated and space-joined. Only output references contribute;
/// whole-derivation and plain-path markers are ignored.
pub fn constituents(markers: &[ContextMarker]) -> String {
    let mut drvs = BTreeSet::new();
    for marker in markers {
        if let ContextMarker::Output { drv_path, .. } = marker {
            drvs.insert(drv_path.as_str());
        }
    }
    drvs.into_iter().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn output(drv: &str) -> ContextMarker {
        ContextMarker::Output {
            output: "out".to_string(),
            drv_path: drv.to_string(),
        }
    }

    #[test]
    fn deduplicates_repeated_recipe_paths() {
        let markers = vec![
            output("/nix/store/aaaa-x.drv"),
            output("/nix/store/bbbb-y.drv"),
            output("/nix/store/aaaa-x.drv"),
        ];
        assert_eq!(
            constituents(&markers),
            "/nix/store/aaaa-x.drv /nix/store/bbbb-y.drv"
        );
    }

    #[test]
    fn same_derivation_through_different_outputs_counts_once() {
        let markers = vec![
            ContextMarker::Output {
                output: "out".to_string(),
                drv_path: "/nix/store/aaaa-x.drv".to_string(),
            },
            ContextMarker::Output {
                output: "dev".to_string(),
                drv_path: "/nix/store/aaaa-x.drv".to_string(),
            },
        ];
        assert_eq!(constituents(&markers), "/nix/store/aaaa-x.drv");
    }

    #[test]
    fn non_output_markers_are_ignored() {
        let markers = vec![
            ContextMarker::Plain("/nix/store/cccc-src".to_string()),
            ContextMarker::Derivation("/nix/store/dddd-z.drv".to_string()),
        ];
        assert_eq!(constituents(&markers), "");
    }

    #[test]
    fn empty_markers_yield_empty_string() {
        assert_eq!(constituents(&[]), "");
    }
}
