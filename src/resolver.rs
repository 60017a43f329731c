//! Artist name → catalog entity resolution.
//!
//! Matching is an exact, case-sensitive string comparison against the primary
//! artist of each search result. No normalization is applied: "Beyonce" does
//! not match "Beyoncé". Artifact file names are derived from the input name,
//! so a fuzzy match here would silently change which artist a file describes.

use crate::catalog::{CatalogArtist, CatalogClient, ResolvedArtist};
use crate::error::CatalogError;

/// Number of ranked results inspected when the top result is not an exact match.
pub const SEARCH_WINDOW: usize = 10;

/// Resolve `name` to a catalog entity.
///
/// Returns `Ok(None)` when no acceptable match exists; that is not an error.
/// Only a failing catalog call produces `Err`.
pub fn resolve<C: CatalogClient + ?Sized>(client: &C, name: &str) -> Result<Option<ResolvedArtist>, CatalogError> {
    let results = client.search(name)?;
    let exact = |entry: &Option<CatalogArtist>| entry.as_ref().filter(|a| a.name == name).cloned();

    let top = match results.first() {
        Some(top) => top,
        None => {
            log::debug!("\"{}\": search returned no results", name);
            return Ok(None);
        }
    };
    let top_name = top.as_ref().map_or("<no artist>", |a| a.name.as_str());

    if let Some(hit) = exact(top) {
        return Ok(Some(resolved(hit)));
    }

    if results.len() < SEARCH_WINDOW {
        log::debug!(
            "\"{}\": top result is \"{}\" and only {} result(s) to fall back on",
            name,
            top_name,
            results.len()
        );
        return Ok(None);
    }

    match results.iter().take(SEARCH_WINDOW).enumerate().find_map(|(i, entry)| Some((i, exact(entry)?))) {
        Some((i, hit)) => {
            log::debug!("\"{}\": top result was \"{}\", exact match at position {}", name, top_name, i);
            Ok(Some(resolved(hit)))
        }
        None => {
            log::debug!("\"{}\": no exact match in the top {} results", name, SEARCH_WINDOW);
            Ok(None)
        }
    }
}

fn resolved(artist: CatalogArtist) -> ResolvedArtist {
    ResolvedArtist {
        canonical_id: artist.id,
        canonical_name: artist.name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{artist, MockCatalog};
    use pretty_assertions::assert_eq;

    fn catalog_with(query: &str, results: Vec<CatalogArtist>) -> MockCatalog {
        let mut catalog = MockCatalog::new();
        catalog.search_results.insert(query.to_string(), results.into_iter().map(Some).collect());
        catalog
    }

    fn ten_with(position: Option<usize>, name: &str) -> Vec<CatalogArtist> {
        let mut results: Vec<CatalogArtist> = (0..10).map(|i| artist(&format!("id{i}"), &format!("Other {i}"))).collect();
        results[0] = artist("bey", "Beyoncé");
        results[1] = artist("jay", "Jay-Z");
        if let Some(p) = position {
            results[p] = artist("target", name);
        }
        results
    }

    #[test]
    fn test_exact_top_result_accepted() {
        let catalog = catalog_with("Tom Misch", vec![artist("tm", "Tom Misch"), artist("x", "Tom Misch & Yussef Dayes")]);
        let resolved = resolve(&catalog, "Tom Misch").unwrap();
        assert_eq!(
            resolved,
            Some(ResolvedArtist {
                canonical_id: "tm".to_string(),
                canonical_name: "Tom Misch".to_string()
            })
        );
        assert_eq!(catalog.call_count(), 1);
    }

    #[test]
    fn test_exact_match_further_down_accepted() {
        let catalog = catalog_with("Beyonce", ten_with(Some(6), "Beyonce"));
        let resolved = resolve(&catalog, "Beyonce").unwrap().unwrap();
        assert_eq!(resolved.canonical_id, "target");
        assert_eq!(resolved.canonical_name, "Beyonce");
    }

    #[test]
    fn test_first_exact_match_wins() {
        let mut results = ten_with(Some(3), "Beyonce");
        results[8] = artist("later", "Beyonce");
        let catalog = catalog_with("Beyonce", results);
        assert_eq!(resolve(&catalog, "Beyonce").unwrap().unwrap().canonical_id, "target");
    }

    #[test]
    fn test_no_exact_match_in_window_is_not_found() {
        let catalog = catalog_with("Beyonce", ten_with(None, "Beyonce"));
        assert_eq!(resolve(&catalog, "Beyonce").unwrap(), None);
    }

    #[test]
    fn test_match_beyond_window_ignored() {
        let mut results = ten_with(None, "Beyonce");
        results.push(artist("eleventh", "Beyonce"));
        let catalog = catalog_with("Beyonce", results);
        assert_eq!(resolve(&catalog, "Beyonce").unwrap(), None);
    }

    #[test]
    fn test_unusable_result_keeps_positions() {
        let mut results: Vec<Option<CatalogArtist>> = ten_with(Some(7), "Beyonce").into_iter().map(Some).collect();
        results[2] = None;
        let mut catalog = MockCatalog::new();
        catalog.search_results.insert("Beyonce".to_string(), results);

        let resolved = resolve(&catalog, "Beyonce").unwrap().unwrap();
        assert_eq!(resolved.canonical_id, "target");
    }

    #[test]
    fn test_unusable_top_result_falls_back_to_window() {
        let mut results: Vec<Option<CatalogArtist>> = ten_with(Some(5), "Beyonce").into_iter().map(Some).collect();
        results[0] = None;
        let mut catalog = MockCatalog::new();
        catalog.search_results.insert("Beyonce".to_string(), results);

        assert_eq!(resolve(&catalog, "Beyonce").unwrap().unwrap().canonical_id, "target");
    }

    #[test]
    fn test_comparison_is_case_sensitive() {
        let catalog = catalog_with("tom misch", vec![artist("tm", "Tom Misch")]);
        assert_eq!(resolve(&catalog, "tom misch").unwrap(), None);
    }

    #[test]
    fn test_fewer_than_window_results_is_not_found() {
        let mut results = ten_with(Some(4), "Beyonce");
        results.truncate(9);
        let catalog = catalog_with("Beyonce", results);
        assert_eq!(resolve(&catalog, "Beyonce").unwrap(), None);
    }

    #[test]
    fn test_empty_results_is_not_found() {
        let catalog = MockCatalog::new();
        assert_eq!(resolve(&catalog, "Nobody").unwrap(), None);
    }

    #[test]
    fn test_search_failure_propagates() {
        let mut catalog = MockCatalog::new();
        catalog.failing_searches.insert("Tom Misch".to_string());
        assert!(matches!(resolve(&catalog, "Tom Misch"), Err(CatalogError::RetriesExhausted { .. })));
    }
}
