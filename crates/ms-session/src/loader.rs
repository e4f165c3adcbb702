//! Style loading
//!
//! Synchronous loads set the current style straight away. Asynchronous loads
//! park a single callback that is handed back when the engine reports the
//! resolved scene path; a newer load overwrites the parked callback.

use ms_core::{ApiKey, Locale, MapResult, SceneUpdate, SceneUpdateBuilder, StyleCatalog, StyleId};
use ms_render::MapEngine;

/// Loader state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    Idle,
    Loading,
}

/// Outcome of an asynchronous completion
#[derive(Debug)]
pub struct LoadCompletion<C> {
    /// Style matched from the resolved path
    pub style: Option<StyleId>,
    /// Parked callback, present only when the path matched
    pub callback: Option<C>,
}

/// Drives scene loads for house styles
pub struct StyleLoader<C> {
    catalog: StyleCatalog,
    state: LoadState,
    current: Option<StyleId>,
    pending: Option<C>,
}

impl<C> StyleLoader<C> {
    /// Create a new idle loader
    pub fn new(catalog: StyleCatalog) -> Self {
        Self {
            catalog,
            state: LoadState::Idle,
            current: None,
            pending: None,
        }
    }

    pub fn catalog(&self) -> &StyleCatalog {
        &self.catalog
    }

    pub fn state(&self) -> LoadState {
        self.state
    }

    /// Style of the last synchronous load or matched completion
    pub fn current_style(&self) -> Option<StyleId> {
        self.current
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Load a style and wait for the engine
    pub fn load_sync(
        &mut self,
        engine: &mut dyn MapEngine,
        style: StyleId,
        api_key: Option<&ApiKey>,
        locale: &Locale,
        updates: &[SceneUpdate],
    ) -> MapResult<()> {
        let updates = SceneUpdateBuilder::build(updates, api_key, locale)?;
        let path = self.catalog.scene_path(style);

        self.state = LoadState::Loading;
        let status = engine.load_scene_file(&path, &updates);
        self.state = LoadState::Idle;

        if status != 0 {
            tracing::warn!("Engine returned status {} loading {}", status, path);
        }
        self.current = Some(style);
        tracing::info!("Loaded style {} ({} updates)", style, updates.len());
        Ok(())
    }

    /// Start loading a style; `on_loaded` is parked until [`StyleLoader::complete`]
    pub fn load_async(
        &mut self,
        engine: &mut dyn MapEngine,
        style: StyleId,
        api_key: Option<&ApiKey>,
        locale: &Locale,
        updates: &[SceneUpdate],
        on_loaded: C,
    ) -> MapResult<()> {
        let updates = SceneUpdateBuilder::build(updates, api_key, locale)?;
        let path = self.catalog.scene_path(style);

        if self.pending.replace(on_loaded).is_some() {
            tracing::debug!("Load of {} supersedes a pending load callback", style);
        }
        self.state = LoadState::Loading;
        engine.load_scene_file_async(&path, &updates);
        tracing::debug!("Requested async load of {}", path);
        Ok(())
    }

    /// Handle the engine's completion report.
    ///
    /// The parked callback is always cleared; it is only returned when the
    /// resolved path identifies a catalog style.
    pub fn complete(&mut self, resolved_path: &str) -> LoadCompletion<C> {
        self.state = LoadState::Idle;
        let pending = self.pending.take();

        match self.catalog.identify(resolved_path) {
            Some(style) => {
                self.current = Some(style);
                LoadCompletion {
                    style: Some(style),
                    callback: pending,
                }
            }
            None => {
                tracing::debug!("Scene {} is not a known style", resolved_path);
                LoadCompletion {
                    style: None,
                    callback: None,
                }
            }
        }
    }

    /// Drop any parked callback and return to idle
    pub fn reset(&mut self) -> bool {
        self.state = LoadState::Idle;
        self.pending.take().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ms_core::MapError;
    use ms_render::HeadlessEngine;

    fn key() -> ApiKey {
        ApiKey::new("test-key").unwrap()
    }

    #[test]
    fn test_load_sync_sets_style_immediately() {
        let mut engine = HeadlessEngine::new();
        let mut loader: StyleLoader<()> = StyleLoader::new(StyleCatalog::default());

        loader
            .load_sync(&mut engine, StyleId::Refill, Some(&key()), &Locale::new("fr-FR"), &[])
            .unwrap();

        assert_eq!(loader.current_style(), Some(StyleId::Refill));
        assert_eq!(loader.state(), LoadState::Idle);
        assert_eq!(
            engine.scene_path().as_deref(),
            Some("housestyles.bundle/refill/refill-style-more-labels.yaml")
        );
        assert_eq!(engine.scene_value("global.ux_language").as_deref(), Some("fr"));
    }

    #[test]
    fn test_missing_key_fails_before_engine_call() {
        let mut engine = HeadlessEngine::new();
        let mut loader = StyleLoader::new(StyleCatalog::default());

        let result = loader.load_async(&mut engine, StyleId::Zinc, None, &Locale::new("en"), &[], 1);
        assert_eq!(result, Err(MapError::ApiKeyNotSet));
        assert_eq!(engine.pending_load_count(), 0);
        assert!(!loader.has_pending());
        assert_eq!(loader.state(), LoadState::Idle);
    }

    #[test]
    fn test_second_async_load_overwrites_callback() {
        let mut engine = HeadlessEngine::new();
        let mut loader = StyleLoader::new(StyleCatalog::default());
        let locale = Locale::new("en-US");

        loader
            .load_async(&mut engine, StyleId::Walkabout, Some(&key()), &locale, &[], "first")
            .unwrap();
        loader
            .load_async(&mut engine, StyleId::Tron, Some(&key()), &locale, &[], "second")
            .unwrap();
        assert_eq!(loader.state(), LoadState::Loading);

        let completion = loader.complete("file:///app/housestyles.bundle/tron/tron-style-more-labels.yaml");
        assert_eq!(completion.style, Some(StyleId::Tron));
        assert_eq!(completion.callback, Some("second"));
        assert!(!loader.has_pending());

        let again = loader.complete("file:///app/housestyles.bundle/tron/tron-style-more-labels.yaml");
        assert_eq!(again.callback, None);
    }

    #[test]
    fn test_unmatched_completion_drops_callback() {
        let mut engine = HeadlessEngine::new();
        let mut loader = StyleLoader::new(StyleCatalog::default());
        loader
            .load_async(&mut engine, StyleId::Zinc, Some(&key()), &Locale::new("en"), &[], ())
            .unwrap();

        let completion = loader.complete("file:///custom/scene.yaml");
        assert_eq!(completion.style, None);
        assert!(completion.callback.is_none());
        assert!(!loader.has_pending());
        assert_eq!(loader.current_style(), None);
    }

    #[test]
    fn test_reset_drops_pending() {
        let mut engine = HeadlessEngine::new();
        let mut loader = StyleLoader::new(StyleCatalog::default());
        loader
            .load_async(&mut engine, StyleId::Zinc, Some(&key()), &Locale::new("en"), &[], ())
            .unwrap();

        assert!(loader.reset());
        assert!(!loader.reset());
        assert_eq!(loader.state(), LoadState::Idle);
    }
}
