//! The restriction state machine.
//!
//! A response starts `Inactive`. If any configured include/exclude key is
//! present in the request, [`RestrictionEngine::activate`] builds the
//! top-level frame once and the walk continues `Active`, descending one frame
//! per relation it enters.

use returnfields_proto::{ParamSource, PATH_SEPARATOR};
use tracing::debug;

use super::frame::Frame;
use super::pathset::PathSet;
use crate::config::RestrictionConfig;
use crate::error::Error;

/// Fetch optimization implied by the initial frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OptimizeMode {
    /// Only include paths were given: select just those columns.
    Include,
    /// Exclude paths were given: select everything but those columns.
    Exclude,
    /// Nothing to optimize.
    None,
}

/// Result of activating restriction for one response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Activation {
    /// The top-level frame.
    pub frame: Frame,
    /// Optimization mode derived from the request.
    pub mode: OptimizeMode,
    /// Whether fetch-plan optimization was requested.
    pub aggressive: bool,
}

/// Computes frames and pruned field lists for a fixed configuration.
#[derive(Debug, Clone)]
pub struct RestrictionEngine {
    config: RestrictionConfig,
}

impl RestrictionEngine {
    /// Create an engine, rejecting invalid configurations eagerly.
    pub fn new(config: RestrictionConfig) -> Result<Self, Error> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Engine over the standard configuration.
    pub fn standard() -> Self {
        Self {
            config: RestrictionConfig::standard(),
        }
    }

    /// The configuration in use.
    pub fn config(&self) -> &RestrictionConfig {
        &self.config
    }

    /// Check whether the request asks for restriction at all.
    ///
    /// An unreadable parameter container counts as "not requested".
    pub fn is_active(&self, params: &dyn ParamSource) -> bool {
        match self.requested(params) {
            Ok(active) => active,
            Err(err) => {
                debug!(error = %err, "request parameters unavailable, restriction inactive");
                false
            }
        }
    }

    fn requested(&self, params: &dyn ParamSource) -> Result<bool, returnfields_proto::Error> {
        Ok(params.contains(&self.config.include_key)? || params.contains(&self.config.exclude_key)?)
    }

    /// Check whether the request asks for fetch-plan optimization.
    pub fn is_aggressive(&self, params: &dyn ParamSource) -> bool {
        params.contains(&self.config.aggressive_key).unwrap_or(false)
    }

    /// Parse a raw parameter value with this engine's tokens.
    pub fn parse_paths(&self, raw: &str) -> PathSet {
        PathSet::parse(raw, &self.config.all_token, &self.config.separator)
    }

    /// Build the top-level frame for a response, or `None` when inactive.
    ///
    /// An absent include key means no include restriction. An include list
    /// that is empty while exclusions are present also means ALL; this
    /// defaulting happens here, once, and never during descent.
    pub fn activate(&self, record_type: &str, params: &dyn ParamSource) -> Option<Activation> {
        let read = |key: &str| -> Result<Option<PathSet>, returnfields_proto::Error> {
            Ok(params.param(key)?.map(|raw| self.parse_paths(raw)))
        };

        let (include, exclude) = match (
            read(&self.config.include_key),
            read(&self.config.exclude_key),
        ) {
            (Ok(include), Ok(exclude)) => (include, exclude),
            (Err(err), _) | (_, Err(err)) => {
                debug!(record_type, error = %err, "request parameters unavailable, restriction inactive");
                return None;
            }
        };

        if include.is_none() && exclude.is_none() {
            return None;
        }

        let include_given = include.is_some();
        let exclude = exclude.unwrap_or_default();
        let requested = include.unwrap_or_default();
        let mode = if !exclude.is_empty() {
            OptimizeMode::Exclude
        } else if !requested.is_empty() {
            OptimizeMode::Include
        } else {
            OptimizeMode::None
        };

        let include = if include_given && !(requested.is_empty() && !exclude.is_empty()) {
            requested
        } else {
            PathSet::all()
        };

        let activation = Activation {
            frame: Frame::top_level(record_type, include, exclude),
            mode,
            aggressive: self.is_aggressive(params),
        };
        debug!(
            record_type,
            mode = ?activation.mode,
            aggressive = activation.aggressive,
            include = %describe(&activation.frame.include),
            exclude = %describe(&activation.frame.exclude),
            "restriction activated"
        );
        Some(activation)
    }

    /// Prune a field list under `frame`, keeping their order.
    ///
    /// A field survives when some include path starts with it (or include is
    /// ALL) and it is not excluded as a complete single-segment path. Nested
    /// exclusions are left to the child frame.
    pub fn prune_fields<'a>(&self, frame: &Frame, fields: &[&'a str]) -> Vec<&'a str> {
        fields
            .iter()
            .copied()
            .filter(|name| frame.admits(name))
            .collect()
    }

    /// Derive the child frame for relation `field`.
    pub fn descend(&self, frame: &Frame, field: &str) -> Frame {
        frame.descend(field)
    }
}

impl Default for RestrictionEngine {
    fn default() -> Self {
        Self::standard()
    }
}

fn describe(set: &PathSet) -> String {
    if set.matches_all() {
        return "*".to_string();
    }
    set.paths()
        .map(|p| p.join(PATH_SEPARATOR))
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;
    use returnfields_proto::QueryParams;

    const FIELDS: [&str; 3] = ["id", "name", "email"];

    fn activate(params: QueryParams) -> Option<Activation> {
        RestrictionEngine::standard().activate("User", &params)
    }

    fn pruned(params: QueryParams) -> Vec<&'static str> {
        let engine = RestrictionEngine::standard();
        let activation = engine.activate("User", &params).unwrap();
        engine.prune_fields(&activation.frame, &FIELDS)
    }

    #[test]
    fn test_inactive_without_keys() {
        let params = QueryParams::new().with("page", "2");
        assert!(!RestrictionEngine::standard().is_active(&params));
        assert!(activate(params).is_none());
    }

    #[test]
    fn test_missing_context_is_inactive() {
        let engine = RestrictionEngine::standard();
        let missing: Option<QueryParams> = None;
        assert!(!engine.is_active(&missing));
        assert!(engine.activate("User", &missing).is_none());
        assert!(!engine.is_aggressive(&missing));
    }

    #[test]
    fn test_flat_include_keeps_schema_order() {
        let params = QueryParams::new().with("return_fields", "name,id");
        assert_eq!(pruned(params), vec!["id", "name"]);
    }

    #[test]
    fn test_exclude_only_defaults_to_all() {
        let params = QueryParams::new().with("skip_fields", "email");
        let activation = activate(params.clone()).unwrap();
        assert!(activation.frame.include.matches_all());
        assert_eq!(activation.mode, OptimizeMode::Exclude);
        assert_eq!(pruned(params), vec!["id", "name"]);
    }

    #[test]
    fn test_empty_include_with_exclude_defaults_to_all() {
        let params = QueryParams::new()
            .with("return_fields", "")
            .with("skip_fields", "email");
        assert_eq!(pruned(params), vec!["id", "name"]);
    }

    #[test]
    fn test_empty_include_selects_nothing() {
        let params = QueryParams::new().with("return_fields", "");
        let activation = activate(params.clone()).unwrap();
        assert_eq!(activation.mode, OptimizeMode::None);
        assert!(pruned(params).is_empty());
    }

    #[test]
    fn test_modes() {
        let include = activate(QueryParams::new().with("return_fields", "id")).unwrap();
        assert_eq!(include.mode, OptimizeMode::Include);
        assert!(!include.aggressive);

        let both = activate(
            QueryParams::new()
                .with("return_fields", "id")
                .with("skip_fields", "name")
                .with("aggressive", ""),
        )
        .unwrap();
        assert_eq!(both.mode, OptimizeMode::Exclude);
        assert!(both.aggressive);
    }

    #[test]
    fn test_noise_is_ignored() {
        let params = QueryParams::new().with("return_fields", "name,bogus");
        assert_eq!(pruned(params), vec!["name"]);
    }

    #[test]
    fn test_exclusion_wins() {
        let params = QueryParams::new()
            .with("return_fields", "id,name")
            .with("skip_fields", "name");
        assert_eq!(pruned(params), vec!["id"]);
    }

    #[test]
    fn test_custom_keys_ignore_defaults() {
        let engine =
            RestrictionEngine::new(RestrictionConfig::with_keys("include", "exclude")).unwrap();
        let params = QueryParams::new().with("return_fields", "id");
        assert!(!engine.is_active(&params));

        let params = QueryParams::new().with("include", "id");
        let activation = engine.activate("User", &params).unwrap();
        assert_eq!(engine.prune_fields(&activation.frame, &FIELDS), vec!["id"]);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let result = RestrictionEngine::new(RestrictionConfig::with_keys("f", "f"));
        assert!(matches!(result, Err(Error::Configuration(_))));
    }

    #[test]
    fn test_prune_is_idempotent() {
        let engine = RestrictionEngine::standard();
        let params = QueryParams::new().with("return_fields", "email,id");
        let activation = engine.activate("User", &params).unwrap();
        let once = engine.prune_fields(&activation.frame, &FIELDS);
        let twice = engine.prune_fields(&activation.frame, &once);
        assert_eq!(once, twice);
    }
}
