use crate::project::RelativePath;
use crate::scope::{IgnoreEntry, Scope, ScopeKind, SkipRule};
use crate::store::entries::Entries;
use serde::{Deserialize, Serialize};

/// The one reversible mutation kept by a store. A new insertion replaces it
/// and undoing consumes it. `inserted` is false when the request found the
/// decision already in place, in which case undoing it changes nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UndoRecord {
    Ignore { entry: IgnoreEntry, inserted: bool },
    Skip { rule: SkipRule, inserted: bool },
}

impl UndoRecord {
    /// Apply the reverse of the recorded insertion to `entries`.
    pub(crate) fn revert(&self, entries: &mut Entries) -> bool {
        match self {
            UndoRecord::Ignore { inserted: false, .. } | UndoRecord::Skip { inserted: false, .. } => {
                false
            }
            UndoRecord::Ignore { entry, .. } => entries.remove(entry),
            UndoRecord::Skip { rule, .. } => entries.remove_skip(rule),
        }
    }

    pub(crate) fn touches_global(&self) -> bool {
        match self {
            UndoRecord::Ignore { entry, .. } => entry.scope.is_global(),
            UndoRecord::Skip { .. } => false,
        }
    }
}

/// Storage form of a pending record, one row or one table wide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct StoredUndo {
    pub kind: String,
    pub key: Option<String>,
    pub value: String,
    pub inserted: bool,
}

impl From<&UndoRecord> for StoredUndo {
    fn from(record: &UndoRecord) -> Self {
        match record {
            UndoRecord::Ignore { entry, inserted } => Self {
                kind: entry.scope.kind().to_string(),
                key: entry.scope.key().map(str::to_string),
                value: entry.word.clone(),
                inserted: *inserted,
            },
            UndoRecord::Skip { rule, inserted } => {
                let (kind, value) = match rule {
                    SkipRule::SkipPath(path) => ("skip_path", path.as_str()),
                    SkipRule::SkipFileName(name) => ("skip_name", name.as_str()),
                    SkipRule::SkipPattern(glob) => ("skip_pattern", glob.as_str()),
                };
                Self {
                    kind: kind.to_string(),
                    key: None,
                    value: value.to_string(),
                    inserted: *inserted,
                }
            }
        }
    }
}

impl TryFrom<StoredUndo> for UndoRecord {
    type Error = String;

    fn try_from(stored: StoredUndo) -> Result<Self, Self::Error> {
        let inserted = stored.inserted;
        let rule = match stored.kind.as_str() {
            "skip_path" => Some(SkipRule::SkipPath(RelativePath::from(stored.value.as_str()))),
            "skip_name" => Some(SkipRule::SkipFileName(stored.value.clone())),
            "skip_pattern" => Some(SkipRule::SkipPattern(stored.value.clone())),
            _ => None,
        };
        if let Some(rule) = rule {
            return Ok(UndoRecord::Skip { rule, inserted });
        }

        let kind: ScopeKind = stored.kind.parse()?;
        let scope = Scope::from_kind(kind, stored.key.as_deref())
            .ok_or_else(|| format!("pending {} record has no key", kind))?;
        Ok(UndoRecord::Ignore {
            entry: IgnoreEntry::new(scope, stored.value),
            inserted,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_revert_ignore() {
        let mut entries = Entries::default();
        let entry = IgnoreEntry::new(Scope::Global, "foo");
        entries.insert(&entry);
        let record = UndoRecord::Ignore {
            entry: entry.clone(),
            inserted: true,
        };
        assert!(record.revert(&mut entries));
        assert!(!entries.contains(&entry));
        assert!(record.touches_global());
    }

    #[test]
    fn test_revert_skip() {
        let mut entries = Entries::default();
        let rule = SkipRule::SkipFileName("Cargo.lock".to_string());
        entries.insert_skip(&rule);
        let record = UndoRecord::Skip {
            rule: rule.clone(),
            inserted: true,
        };
        assert!(record.revert(&mut entries));
        assert!(!entries.contains_skip(&rule));
        assert!(!record.touches_global());
    }

    #[test]
    fn test_revert_of_existing_decision_keeps_it() {
        let mut entries = Entries::default();
        let entry = IgnoreEntry::new(Scope::Project, "foo");
        entries.insert(&entry);
        let record = UndoRecord::Ignore {
            entry: entry.clone(),
            inserted: false,
        };
        assert!(!record.revert(&mut entries));
        assert!(entries.contains(&entry));
    }

    #[test]
    fn test_stored_form_keeps_scope_and_rule() {
        let records = [
            UndoRecord::Ignore {
                entry: IgnoreEntry::new(Scope::Extension("rs".to_string()), "fn"),
                inserted: true,
            },
            UndoRecord::Ignore {
                entry: IgnoreEntry::new(Scope::Path("docs/a.md".into()), "qux"),
                inserted: false,
            },
            UndoRecord::Skip {
                rule: SkipRule::SkipPattern("*.lock".to_string()),
                inserted: true,
            },
        ];
        for record in records {
            let stored = StoredUndo::from(&record);
            assert_eq!(UndoRecord::try_from(stored), Ok(record));
        }
    }

    #[test]
    fn test_unknown_stored_kind_is_rejected() {
        let stored = StoredUndo {
            kind: "everywhere".to_string(),
            key: None,
            value: "foo".to_string(),
            inserted: true,
        };
        assert!(UndoRecord::try_from(stored).is_err());
    }
}
