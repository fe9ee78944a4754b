//! Knowledge base of target-side sources.
//!
//! Holds what is known about target extensions, indexed two ways: by
//! canonical domain and by normalised name. Entries are either confirmed
//! records (an id is known) or placeholders left by aliases whose target
//! domain has no id yet. Registering a domain retroactively confirms every
//! alias that points at it.
//!
//! Mutation protocol: the knowledge base is written during ingest phases
//! (static load, registry sync, probe discoveries) and only read while the
//! resolver runs. Concurrent ingest goes through [`SharedKnowledge`]; the
//! resolver borrows a plain `&KnowledgeBase` after the writers have joined.

pub mod tables;

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};


use crate::ids::parse_registry_id;
use crate::normalize::{canonical_domain, normalize_name};

/// Longest alias chain followed when resolving a placeholder.
const MAX_ALIAS_HOPS: usize = 4;

/// A known target-side source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRecord {
    /// Canonical signed 64-bit id.
    pub id: i64,
    /// Human-readable canonical name.
    pub name: String,
    /// Canonical domain, when known.
    pub domain: Option<String>,
}

/// Result of looking up a normalised name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameLookup<'a> {
    /// The name maps to a confirmed record.
    Confirmed(&'a SourceRecord),
    /// The name is an alias whose target domain has no id yet.
    Pending(&'a str),
    /// Nothing is known under this name.
    Missing,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Link {
    Confirmed(SourceRecord),
    Pending(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Slot {
    link: Link,
    /// Target domain when this slot was written by an alias.
    alias_of: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum SlotKey {
    Domain(String),
    Name(String),
}

/// Indexed store of confirmed records and alias placeholders.
#[derive(Debug, Clone, Default)]
pub struct KnowledgeBase {
    by_domain: BTreeMap<String, Slot>,
    by_name: BTreeMap<String, Slot>,
    /// Slots written by aliases, grouped by the target they wait on.
    alias_slots: BTreeMap<String, Vec<SlotKey>>,
}

impl KnowledgeBase {
    /// Creates an empty knowledge base.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a knowledge base seeded from the built-in static tables.
    #[must_use]
    pub fn with_static_tables() -> Self {
        let mut kb = Self::new();
        kb.load_static(tables::STATIC_ALIASES, tables::DEAD_DOMAINS);
        for (raw_id, name, domain) in tables::STATIC_RECORDS {
            kb.register(parse_registry_id(raw_id), name, Some(*domain));
        }
        kb
    }

    /// Seeds alias placeholders from an alias table and a dead-domain table.
    ///
    /// Each entry resolves immediately if its target domain is already
    /// confirmed, and otherwise waits for a later [`register`](Self::register).
    pub fn load_static(&mut self, aliases: &[(&str, &str)], dead_domains: &[(&str, &str)]) {
        for (alias, target) in aliases.iter().chain(dead_domains) {
            self.add_alias(alias, target);
        }
    }

    /// Records a confirmed source.
    ///
    /// `id` must already be in signed 64-bit form; `None` makes this a no-op
    /// since nothing is learnable without an id. `domain` may be a URL or a
    /// bare host. Returns `true` if anything was recorded.
    pub fn register(&mut self, id: Option<i64>, name: &str, domain: Option<&str>) -> bool {
        let Some(id) = id else {
            return false;
        };
        let domain = domain.and_then(canonical_domain);
        let record = SourceRecord { id, name: name.trim().to_string(), domain: domain.clone() };

        if let Some(domain) = domain {
            self.by_domain.insert(
                domain.clone(),
                Slot { link: Link::Confirmed(record.clone()), alias_of: None },
            );
            self.relink(&domain, &record);
        }

        let key = normalize_name(name);
        if !key.is_empty() {
            self.by_name.insert(key, Slot { link: Link::Confirmed(record), alias_of: None });
        }
        true
    }

    /// Adds an alias (a name or a retired domain) pointing at `target`.
    ///
    /// A placeholder never displaces a confirmed entry. Returns `false` if
    /// `target` is not a usable domain or the alias normalises to nothing.
    pub fn add_alias(&mut self, alias: &str, target: &str) -> bool {
        let Some(target) = canonical_domain(target) else {
            return false;
        };

        let link = match self.follow(&target) {
            Some(record) => Link::Confirmed(record.clone()),
            None => Link::Pending(target.clone()),
        };

        let mut keys = Vec::new();
        if let Some(domain) = domain_key(alias) {
            if domain != target {
                keys.push(SlotKey::Domain(domain));
            }
        }
        let name_key = normalize_name(alias);
        if !name_key.is_empty() {
            keys.push(SlotKey::Name(name_key));
        }
        if keys.is_empty() {
            return false;
        }

        for key in keys {
            let map = match &key {
                SlotKey::Domain(k) => self.by_domain.entry(k.clone()),
                SlotKey::Name(k) => self.by_name.entry(k.clone()),
            };
            let slot = Slot { link: link.clone(), alias_of: Some(target.clone()) };
            match map {
                Entry::Vacant(vacant) => {
                    vacant.insert(slot);
                }
                Entry::Occupied(mut occupied) => {
                    let confirmed = matches!(occupied.get().link, Link::Confirmed(_));
                    if confirmed && matches!(slot.link, Link::Pending(_)) {
                        continue;
                    }
                    occupied.insert(slot);
                }
            }
            self.alias_slots.entry(target.clone()).or_default().push(key);
        }
        true
    }

    /// Points `name` at an already-confirmed record, as an alias of its domain.
    ///
    /// Used for discoveries such as a redirect landing on a known domain.
    /// Records without a domain are linked by name only.
    pub fn link_name(&mut self, name: &str, record: &SourceRecord) -> bool {
        if let Some(domain) = &record.domain {
            return self.add_alias(name, domain);
        }
        let key = normalize_name(name);
        if key.is_empty() {
            return false;
        }
        self.by_name.insert(key, Slot { link: Link::Confirmed(record.clone()), alias_of: None });
        true
    }

    /// Returns the confirmed record indexed under a canonical domain.
    #[must_use]
    pub fn domain(&self, domain: &str) -> Option<&SourceRecord> {
        match self.by_domain.get(domain).map(|slot| &slot.link) {
            Some(Link::Confirmed(record)) => Some(record),
            _ => None,
        }
    }

    /// Looks up a normalised name, following placeholders through the domain
    /// index.
    #[must_use]
    pub fn name(&self, normalized: &str) -> NameLookup<'_> {
        match self.by_name.get(normalized).map(|slot| &slot.link) {
            Some(Link::Confirmed(record)) => NameLookup::Confirmed(record),
            Some(Link::Pending(target)) => match self.follow(target) {
                Some(record) => NameLookup::Confirmed(record),
                None => NameLookup::Pending(target.as_str()),
            },
            None => NameLookup::Missing,
        }
    }

    /// Iterates confirmed name entries in key order.
    pub fn confirmed_names(&self) -> impl Iterator<Item = (&str, &SourceRecord)> {
        self.by_name.iter().filter_map(|(key, slot)| match &slot.link {
            Link::Confirmed(record) => Some((key.as_str(), record)),
            Link::Pending(_) => None,
        })
    }

    /// Number of domains with a confirmed record.
    #[must_use]
    pub fn confirmed_domain_count(&self) -> usize {
        self.by_domain.values().filter(|slot| matches!(slot.link, Link::Confirmed(_))).count()
    }

    /// Number of name entries still waiting for their target's id.
    #[must_use]
    pub fn pending_name_count(&self) -> usize {
        self.by_name.values().filter(|slot| matches!(slot.link, Link::Pending(_))).count()
    }

    /// Returns `true` if nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_domain.is_empty() && self.by_name.is_empty()
    }

    /// Follows a target domain through alias placeholders to a confirmed record.
    fn follow(&self, target: &str) -> Option<&SourceRecord> {
        let mut current = target;
        for _ in 0..MAX_ALIAS_HOPS {
            match &self.by_domain.get(current)?.link {
                Link::Confirmed(record) => return Some(record),
                Link::Pending(next) if next != current => current = next.as_str(),
                Link::Pending(_) => return None,
            }
        }
        None
    }

    /// Confirms every alias slot still waiting on `domain`.
    fn relink(&mut self, domain: &str, record: &SourceRecord) {
        let Some(keys) = self.alias_slots.get(domain) else {
            return;
        };
        for key in keys {
            let slot = match key {
                SlotKey::Domain(k) => self.by_domain.get_mut(k),
                SlotKey::Name(k) => self.by_name.get_mut(k),
            };
            if let Some(slot) = slot {
                if slot.alias_of.as_deref() == Some(domain) {
                    slot.link = Link::Confirmed(record.clone());
                }
            }
        }
    }
}

/// Canonical domain of an alias that is itself a domain (`asuratoon.com`).
fn domain_key(alias: &str) -> Option<String> {
    let alias = alias.trim();
    if alias.contains(char::is_whitespace) || !alias.contains('.') {
        return None;
    }
    canonical_domain(alias)
}

/// Knowledge base wrapper for concurrent ingest phases.
///
/// Every write takes a single coarse lock. Call [`into_inner`](Self::into_inner)
/// once all writers have joined to hand the knowledge base to the resolver.
#[derive(Debug, Default)]
pub struct SharedKnowledge {
    inner: Mutex<KnowledgeBase>,
}

impl SharedKnowledge {
    /// Wraps a knowledge base for shared mutation.
    #[must_use]
    pub fn new(kb: KnowledgeBase) -> Self {
        Self { inner: Mutex::new(kb) }
    }

    /// See [`KnowledgeBase::register`].
    pub fn register(&self, id: Option<i64>, name: &str, domain: Option<&str>) -> bool {
        self.lock().register(id, name, domain)
    }

    /// See [`KnowledgeBase::add_alias`].
    pub fn add_alias(&self, alias: &str, target: &str) -> bool {
        self.lock().add_alias(alias, target)
    }

    /// See [`KnowledgeBase::link_name`].
    pub fn link_name(&self, name: &str, record: &SourceRecord) -> bool {
        self.lock().link_name(name, record)
    }

    /// Returns a copy of the confirmed record for a canonical domain.
    #[must_use]
    pub fn domain(&self, domain: &str) -> Option<SourceRecord> {
        self.lock().domain(domain).cloned()
    }

    /// Releases the knowledge base once all writers are done.
    #[must_use]
    pub fn into_inner(self) -> KnowledgeBase {
        self.inner.into_inner().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock(&self) -> MutexGuard<'_, KnowledgeBase> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: i64, name: &str, domain: &str) -> SourceRecord {
        SourceRecord { id, name: name.into(), domain: Some(domain.into()) }
    }

    #[test]
    fn register_without_id_is_noop() {
        let mut kb = KnowledgeBase::new();
        assert!(!kb.register(None, "Nameless", Some("https://nameless.com")));
        assert!(kb.is_empty());
    }

    #[test]
    fn register_indexes_domain_and_name() {
        let mut kb = KnowledgeBase::new();
        kb.register(Some(42), "Asura Comic", Some("https://www.asuracomic.net/"));

        assert_eq!(kb.domain("asuracomic.net"), Some(&record(42, "Asura Comic", "asuracomic.net")));
        assert_eq!(
            kb.name("ASURA"),
            NameLookup::Confirmed(&record(42, "Asura Comic", "asuracomic.net"))
        );
    }

    #[test]
    fn last_registration_for_a_domain_wins() {
        let mut kb = KnowledgeBase::new();
        kb.register(Some(1), "Old Name", Some("example.com"));
        kb.register(Some(2), "New Name", Some("example.com"));
        assert_eq!(kb.domain("example.com").map(|r| r.id), Some(2));
        assert_eq!(kb.confirmed_domain_count(), 1);
    }

    #[test]
    fn alias_before_registration_is_linked_retroactively() {
        let mut kb = KnowledgeBase::new();
        kb.add_alias("Mystery Scans", "mystery.net");
        assert_eq!(kb.name("MYSTERY"), NameLookup::Pending("mystery.net"));

        kb.register(Some(7), "X", Some("mystery.net"));
        assert_eq!(kb.name("MYSTERY"), NameLookup::Confirmed(&record(7, "X", "mystery.net")));
    }

    #[test]
    fn alias_after_registration_resolves_immediately() {
        let mut kb = KnowledgeBase::new();
        kb.register(Some(9), "Flame Comics", Some("flamecomics.com"));
        kb.add_alias("flamescans.org", "flamecomics.com");
        assert_eq!(kb.domain("flamescans.org").map(|r| r.id), Some(9));
    }

    #[test]
    fn dead_domain_alias_is_linked_retroactively() {
        let mut kb = KnowledgeBase::new();
        kb.load_static(&[], &[("asuratoon.com", "asuracomic.net")]);
        assert_eq!(kb.domain("asuratoon.com"), None);

        kb.register(Some(42), "Asura Comic", Some("asuracomic.net"));
        assert_eq!(kb.domain("asuratoon.com").map(|r| r.id), Some(42));
    }

    #[test]
    fn re_registration_relinks_aliases_to_newest_record() {
        let mut kb = KnowledgeBase::new();
        kb.add_alias("asuratoon.com", "asuracomic.net");
        kb.register(Some(1), "Asura", Some("asuracomic.net"));
        kb.register(Some(2), "Asura Comic", Some("asuracomic.net"));
        assert_eq!(kb.domain("asuratoon.com").map(|r| r.id), Some(2));
    }

    #[test]
    fn direct_registration_of_alias_domain_is_not_relinked() {
        let mut kb = KnowledgeBase::new();
        kb.add_alias("asuratoon.com", "asuracomic.net");
        kb.register(Some(5), "Asura Toon", Some("asuratoon.com"));
        kb.register(Some(6), "Asura Comic", Some("asuracomic.net"));
        assert_eq!(kb.domain("asuratoon.com").map(|r| r.id), Some(5));
    }

    #[test]
    fn pending_alias_never_displaces_confirmed_record() {
        let mut kb = KnowledgeBase::new();
        kb.register(Some(3), "Reaper Scans", Some("reaperscans.com"));
        kb.add_alias("REAPER", "reaper-old.com");
        assert_eq!(kb.name("REAPER"), NameLookup::Confirmed(&record(3, "Reaper Scans", "reaperscans.com")));
    }

    #[test]
    fn name_lookup_follows_alias_chains() {
        let mut kb = KnowledgeBase::new();
        kb.add_alias("ASURA_SCANS", "asuratoon.com");
        kb.add_alias("asuratoon.com", "asuracomic.net");
        kb.register(Some(42), "AC Official", Some("asuracomic.net"));

        assert_eq!(kb.name("ASURA"), NameLookup::Confirmed(&record(42, "AC Official", "asuracomic.net")));
    }

    #[test]
    fn alias_with_unusable_target_is_rejected() {
        let mut kb = KnowledgeBase::new();
        assert!(!kb.add_alias("Something", ""));
        assert!(!kb.add_alias("---", "example.com"));
        assert!(kb.is_empty());
    }

    #[test]
    fn link_name_points_discovered_name_at_record() {
        let mut kb = KnowledgeBase::new();
        let rec = record(11, "Night Owl", "nightowl.io");
        kb.register(Some(11), "Night Owl", Some("nightowl.io"));
        assert!(kb.link_name("Old Owl Reader", &rec));
        assert_eq!(kb.name(&normalize_name("Old Owl Reader")), NameLookup::Confirmed(&rec));
    }

    #[test]
    fn static_tables_seed_confirmed_records() {
        let kb = KnowledgeBase::with_static_tables();
        assert_eq!(kb.domain("mangadex.org").map(|r| r.id), Some(2_499_283_573_021_220_255));
        assert_eq!(kb.domain("asuratoon.com").map(|r| r.name.as_str()), Some("Asura Scans"));
        assert!(matches!(kb.name("MANGADEX"), NameLookup::Confirmed(_)));
        assert!(matches!(kb.name("FLAME"), NameLookup::Pending("flamecomics.com")));
    }

    #[test]
    fn confirmed_names_are_ordered_and_skip_placeholders() {
        let mut kb = KnowledgeBase::new();
        kb.register(Some(2), "Zeta", Some("zeta.com"));
        kb.register(Some(1), "Alpha", Some("alpha.com"));
        kb.add_alias("Pending One", "unknown.com");

        let keys: Vec<&str> = kb.confirmed_names().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["ALPHA", "ZETA"]);
        assert_eq!(kb.pending_name_count(), 1);
    }

    #[test]
    fn shared_knowledge_accepts_concurrent_writers() {
        let shared = SharedKnowledge::new(KnowledgeBase::new());
        std::thread::scope(|scope| {
            for i in 0..8_i64 {
                let shared = &shared;
                scope.spawn(move || {
                    shared.register(Some(i), &format!("Source {i}"), Some(format!("s{i}.com").as_str()));
                });
            }
        });
        let kb = shared.into_inner();
        assert_eq!(kb.confirmed_domain_count(), 8);
    }
}
