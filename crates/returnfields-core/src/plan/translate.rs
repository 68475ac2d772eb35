//! API name to storage name translation.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use parking_lot::RwLock;
use returnfields_proto::{FieldPath, PATH_SEPARATOR};
use tracing::trace;

use crate::catalog::{EntityDescriptor, FieldKind, SchemaIndex};
use crate::restrict::PathSet;

/// Translates requested API paths into the storage paths a fetch must read.
///
/// The per-type default column list (every scalar column plus foreign keys of
/// singular relations) is memoized; it is what a whole-record request expands
/// to.
pub struct NameTranslator {
    index: Arc<SchemaIndex>,
    defaults: RwLock<HashMap<String, Arc<Vec<String>>>>,
}

impl NameTranslator {
    /// Create a translator over a schema index.
    pub fn new(index: Arc<SchemaIndex>) -> Self {
        Self {
            index,
            defaults: RwLock::new(HashMap::new()),
        }
    }

    /// Storage columns read when a record of `record_type` is fetched whole.
    pub fn default_columns(&self, record_type: &str) -> Arc<Vec<String>> {
        if let Some(cached) = self.defaults.read().get(record_type) {
            return Arc::clone(cached);
        }

        let desc = self.index.describe(record_type);
        let columns = Arc::new(default_columns_of(&desc));
        if desc.is_empty() {
            // Unknown types are not memoized, mirroring the schema index.
            return columns;
        }
        let mut defaults = self.defaults.write();
        Arc::clone(
            defaults
                .entry(record_type.to_string())
                .or_insert(columns),
        )
    }

    /// Translate an include set rooted at `record_type` into storage paths.
    ///
    /// Unknown names and paths continuing past a scalar are dropped. A
    /// relation requested as a whole expands to the default columns of its
    /// target; a computed field expands to the paths it depends on. An ALL
    /// set yields the default columns of the root.
    pub fn translate_include(&self, record_type: &str, include: &PathSet) -> BTreeSet<FieldPath> {
        let mut out = BTreeSet::new();
        if include.matches_all() {
            self.expand_whole(record_type, &FieldPath::default(), &mut out);
            return out;
        }
        let desc = self.index.describe(record_type);
        for path in include.paths() {
            self.translate_path(&desc, path, &FieldPath::default(), &mut out);
        }
        out
    }

    /// Translate an exclude set into storage paths.
    ///
    /// A scalar maps to its column and a relation to its relation path;
    /// computed fields and unknown names translate to nothing. ALL is not
    /// meaningful for exclusion and yields nothing.
    pub fn translate_exclude(&self, record_type: &str, exclude: &PathSet) -> BTreeSet<FieldPath> {
        let mut out = BTreeSet::new();
        for path in exclude.paths() {
            let mut desc = self.index.describe(record_type);
            let mut storage = FieldPath::default();
            let segments = path.segments();
            for (i, segment) in segments.iter().enumerate() {
                let Some(field) = desc.get(segment) else {
                    break;
                };
                let last = i + 1 == segments.len();
                match field.kind {
                    FieldKind::Scalar if last => {
                        out.insert(storage.child(field.storage_name()));
                    }
                    FieldKind::Singular | FieldKind::Plural => {
                        storage = storage.child(field.storage_name());
                        if last {
                            out.insert(storage.clone());
                            break;
                        }
                        let Some(target) = field.target.as_deref() else {
                            break;
                        };
                        desc = self.index.describe(target);
                    }
                    _ => break,
                }
            }
        }
        out
    }

    /// Every flat API path a record of `record_type` can produce.
    ///
    /// Top-level scalars and computed fields appear by name; each relation
    /// contributes `relation__field` for every non-relation field of its
    /// target. Write-only fields are skipped. The list is sorted.
    pub fn all_name_list(&self, record_type: &str) -> Vec<String> {
        let desc = self.index.describe(record_type);
        let mut names = BTreeSet::new();
        for field in desc.readable_fields() {
            let Some(target) = field.target.as_deref() else {
                names.insert(field.name.clone());
                continue;
            };
            let target = self.index.describe(target);
            for sub in target.readable_fields().filter(|f| !f.is_relation()) {
                names.insert(format!("{}{}{}", field.name, PATH_SEPARATOR, sub.name));
            }
        }
        names.into_iter().collect()
    }

    fn translate_path(
        &self,
        desc: &EntityDescriptor,
        path: &FieldPath,
        prefix: &FieldPath,
        out: &mut BTreeSet<FieldPath>,
    ) {
        let Some(head) = path.head() else {
            return;
        };
        let Some(field) = desc.get(head).filter(|f| f.is_readable()) else {
            trace!(record_type = desc.name(), field = head, "dropping unknown field");
            return;
        };
        let rest = path.tail();

        match field.kind {
            FieldKind::Scalar if rest.is_empty() => {
                out.insert(prefix.child(field.storage_name()));
            }
            FieldKind::Computed if rest.is_empty() => {
                for dep in &field.depends_on {
                    let dep = FieldPath::parse_with(dep, PATH_SEPARATOR);
                    let mut full = prefix.clone();
                    for segment in dep.segments() {
                        full = full.child(segment.as_str());
                    }
                    out.insert(full);
                }
            }
            FieldKind::Singular | FieldKind::Plural => {
                let Some(target) = field.target.as_deref() else {
                    return;
                };
                let nested = prefix.child(field.storage_name());
                if rest.is_empty() {
                    self.expand_whole(target, &nested, out);
                } else {
                    let target = self.index.describe(target);
                    self.translate_path(&target, &rest, &nested, out);
                }
            }
            _ => {
                trace!(record_type = desc.name(), field = head, "dropping path below a leaf");
            }
        }
    }

    fn expand_whole(&self, record_type: &str, prefix: &FieldPath, out: &mut BTreeSet<FieldPath>) {
        let columns = self.default_columns(record_type);
        if columns.is_empty() && !prefix.is_empty() {
            // Keep the relation itself so the fetch still reaches it.
            out.insert(prefix.clone());
            return;
        }
        for column in columns.iter() {
            out.insert(prefix.child(column.as_str()));
        }
    }
}

impl std::fmt::Debug for NameTranslator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NameTranslator")
            .field("memoized", &self.defaults.read().len())
            .finish()
    }
}

fn default_columns_of(desc: &EntityDescriptor) -> Vec<String> {
    let mut columns = BTreeSet::new();
    if !desc.identity_field().is_empty() {
        columns.insert(desc.identity_field().to_string());
    }
    for field in desc.fields() {
        match field.kind {
            FieldKind::Scalar if field.is_readable() => {
                columns.insert(field.storage_name().to_string());
            }
            FieldKind::Singular => {
                if let Some(fk) = &field.foreign_key {
                    columns.insert(fk.clone());
                }
            }
            _ => {}
        }
    }
    columns.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{EntityDef, FieldDef, StaticSchema};

    fn translator() -> NameTranslator {
        let schema = StaticSchema::new()
            .with_entity(
                EntityDef::new("User", "id")
                    .with_field(FieldDef::scalar("id"))
                    .with_field(FieldDef::scalar("fullname").stored_as("name"))
                    .with_field(FieldDef::scalar("password").write_only())
                    .with_field(FieldDef::computed("initials", ["name"]))
                    .with_field(FieldDef::plural("skills", "Skill").stored_as("skill_set")),
            )
            .with_entity(
                EntityDef::new("Skill", "id")
                    .with_field(FieldDef::scalar("id"))
                    .with_field(FieldDef::scalar("label"))
                    .with_field(
                        FieldDef::singular("owner", "User")
                            .stored_as("user")
                            .with_foreign_key("user_id"),
                    ),
            );
        NameTranslator::new(Arc::new(SchemaIndex::from_provider(schema)))
    }

    fn names(paths: &BTreeSet<FieldPath>) -> Vec<String> {
        paths.iter().map(|p| p.to_string()).collect()
    }

    #[test]
    fn test_translate_renamed_and_computed() {
        let t = translator();
        let include = PathSet::parse("fullname,initials,bogus,fullname__x", "*", "__");
        assert_eq!(names(&t.translate_include("User", &include)), vec!["name"]);
    }

    #[test]
    fn test_translate_nested_and_whole_relation() {
        let t = translator();
        let include = PathSet::parse("skills__label", "*", "__");
        assert_eq!(
            names(&t.translate_include("User", &include)),
            vec!["skill_set__label"]
        );

        let whole = PathSet::parse("skills", "*", "__");
        assert_eq!(
            names(&t.translate_include("User", &whole)),
            vec!["skill_set__id", "skill_set__label", "skill_set__user_id"]
        );
    }

    #[test]
    fn test_translate_all_uses_defaults() {
        let t = translator();
        let all = t.translate_include("User", &PathSet::all());
        // Write-only columns are never read for output.
        assert_eq!(names(&all), vec!["id", "name"]);
        assert_eq!(t.default_columns("Skill").as_slice(), ["id", "label", "user_id"]);
    }

    #[test]
    fn test_translate_write_only_dropped() {
        let t = translator();
        let include = PathSet::parse("password", "*", "__");
        assert!(t.translate_include("User", &include).is_empty());
    }

    #[test]
    fn test_translate_exclude() {
        let t = translator();
        let exclude = PathSet::parse("fullname,skills__owner,initials,nope", "*", "__");
        assert_eq!(
            names(&t.translate_exclude("User", &exclude)),
            vec!["name", "skill_set__user"]
        );
    }

    #[test]
    fn test_all_name_list() {
        let t = translator();
        assert_eq!(
            t.all_name_list("User"),
            vec!["fullname", "id", "initials", "skills__id", "skills__label"]
        );
        assert!(t.all_name_list("Nope").is_empty());
    }
}
