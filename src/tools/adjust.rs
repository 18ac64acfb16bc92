//! Filter adjustments on the main image.
//!
//! Slider positions are the user-facing values; [`FilterKind::filter_for`]
//! turns them into normalized filters. Sliders at their default are left
//! out of the filter list entirely.

use std::collections::HashMap;

use crate::error::Result;
use crate::scene::{Filter, FilterKind, ObjectId};
use crate::session::{Applied, EditorSession, commit};

/// Slider position per filter.
pub type FilterValues = HashMap<FilterKind, i32>;

/// Every slider at its default.
pub fn default_values() -> FilterValues {
    FilterKind::ALL
        .into_iter()
        .map(|k| (k, k.range().default))
        .collect()
}

/// Filter list for `values`, in application order, defaults omitted.
pub fn build_filters(values: &FilterValues) -> Vec<Filter> {
    FilterKind::ALL
        .into_iter()
        .filter_map(|kind| {
            let value = *values.get(&kind)?;
            (value != kind.range().default).then(|| kind.filter_for(value))
        })
        .collect()
}

/// Slider positions that reproduce `filters`.
pub fn extract_values(filters: &[Filter]) -> FilterValues {
    let mut values = default_values();
    for filter in filters {
        let (kind, value) = FilterKind::slider_for(filter);
        values.insert(kind, value);
    }
    values
}

/// Slider positions of the main image's current filters.
pub async fn current_values(session: &EditorSession) -> Result<FilterValues> {
    let surface = session.surface()?;
    let id = super::main_image(&surface).await?;
    let guard = surface.lock().await;
    let filters = guard
        .scene()
        .get(id)
        .and_then(|o| o.as_image())
        .map(|img| img.filters.clone())
        .unwrap_or_default();
    Ok(extract_values(&filters))
}

/// Replace the main image's filters with those for `values`.
///
/// The whole list is swapped in one transaction, so the change produces a
/// single modification event.
pub async fn apply(session: &EditorSession, values: &FilterValues) -> Result<Applied<ObjectId>> {
    let surface = session.surface()?;
    let id = super::main_image(&surface).await?;
    let filters = build_filters(values);
    let count = filters.len();
    match commit(&surface, |s| s.apply_filters(id, filters)).await {
        Applied::Done(result) => {
            result?;
            tracing::debug!(object = id.0, filters = count, "Filters applied");
            Ok(Applied::Done(id))
        }
        Applied::Stale => Ok(Applied::Stale),
    }
}

/// Move one slider, keeping the others where they are.
pub async fn set_value(
    session: &EditorSession,
    kind: FilterKind,
    value: i32,
) -> Result<Applied<ObjectId>> {
    let mut values = current_values(session).await?;
    values.insert(kind, value);
    apply(session, &values).await
}

/// Remove every filter from the main image.
pub async fn reset(session: &EditorSession) -> Result<Applied<ObjectId>> {
    apply(session, &default_values()).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults_are_omitted() {
        assert!(build_filters(&default_values()).is_empty());
    }

    #[test]
    fn test_filters_follow_fixed_order() {
        let mut values = default_values();
        values.insert(FilterKind::Hue, 90);
        values.insert(FilterKind::Brightness, 20);
        let kinds: Vec<FilterKind> = build_filters(&values).iter().map(|f| f.kind()).collect();
        assert_eq!(kinds, vec![FilterKind::Brightness, FilterKind::Hue]);
    }

    #[test]
    fn test_extract_round_trip() {
        let mut values = default_values();
        values.insert(FilterKind::Contrast, -35);
        values.insert(FilterKind::Blur, 12);
        values.insert(FilterKind::Hue, -120);
        assert_eq!(extract_values(&build_filters(&values)), values);
    }
}
