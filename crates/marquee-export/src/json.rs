//! JSON persistence for selections.
//!
//! The document is the serde form of [`Selection`]: the mask as
//! `[width, height, bytes]`, cached bounds, the optional shape
//! descriptor and whether that shape is still exact. Restoring through
//! [`SelectionManager::restore_selection`](marquee_engine::SelectionManager::restore_selection)
//! reproduces the selection exactly.

use marquee_engine::Selection;

use crate::ExportError;

/// Serialize a selection to a JSON string.
///
/// # Errors
///
/// Returns [`ExportError::Json`] if serialization fails.
pub fn selection_to_json(selection: &Selection) -> Result<String, ExportError> {
    Ok(serde_json::to_string(selection)?)
}

/// Parse a selection from JSON.
///
/// # Errors
///
/// Returns [`ExportError::Json`] for malformed documents, including a
/// mask whose byte count does not match its declared extent.
pub fn selection_from_json(json: &str) -> Result<Selection, ExportError> {
    Ok(serde_json::from_str(json)?)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use marquee_engine::{Bounds, CombinationMode, Dimensions, SelectionConfig, SelectionManager};

    #[test]
    fn round_trip_is_exact() {
        let mut m = SelectionManager::new(SelectionConfig {
            canvas: Dimensions::new(40, 30),
            ..SelectionConfig::default()
        });
        m.create_rectangle(Bounds::new(5.0, 5.0, 20.0, 10.0), CombinationMode::Replace)
            .unwrap();
        m.feather(1.0);
        let selection = m.snapshot().unwrap();

        let json = selection_to_json(&selection).unwrap();
        assert_eq!(selection_from_json(&json).unwrap(), selection);
    }

    #[test]
    fn inconsistent_mask_is_rejected() {
        let json = r#"{"mask":[3,3,[0,0]],"bounds":{"x":0,"y":0,"width":0,"height":0},"shape":null}"#;
        assert!(matches!(selection_from_json(json), Err(ExportError::Json(_))));
    }
}
