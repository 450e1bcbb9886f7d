//! Composable, side-effect-free record queries.
//!
//! A [`Query`] is a resource type, a [`Predicate`] filter, and an ordering.
//! Narrowing always returns a new value; the in-memory [`Query::apply`] and
//! the SQL rendering in the storage layer interpret the same tree.
use crate::{AgentId, JoinableRef, Privacy, RecordId, Resource, ResourceType};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "op", content = "arg")]
pub enum Predicate {
    Always,
    Never,
    PrivacyIs(Privacy),
    /// Privacy other than `unlisted`.
    Listed,
    /// Publish state; never added by a scope, hosts narrow live listings with it.
    Published,
    CreatorIs(AgentId),
    SubjectIs(AgentId),
    InviteeIs(AgentId),
    IdIn(BTreeSet<RecordId>),
    ContainerIn(BTreeSet<JoinableRef>),
    HostIn(BTreeSet<JoinableRef>),
    And(Vec<Predicate>),
    Or(Vec<Predicate>),
}

impl Predicate {
    /// Conjunction with `Always` as identity and `Never` absorbing.
    pub fn and(self, other: Predicate) -> Predicate {
        match (self, other) {
            (Predicate::Never, _) | (_, Predicate::Never) => Predicate::Never,
            (Predicate::Always, other) | (other, Predicate::Always) => other,
            (Predicate::And(mut left), Predicate::And(right)) => {
                left.extend(right);
                Predicate::And(left)
            }
            (Predicate::And(mut left), other) => {
                left.push(other);
                Predicate::And(left)
            }
            (this, other) => Predicate::And(vec![this, other]),
        }
    }

    /// Disjunction with `Never` as identity and `Always` absorbing.
    pub fn or(self, other: Predicate) -> Predicate {
        match (self, other) {
            (Predicate::Always, _) | (_, Predicate::Always) => Predicate::Always,
            (Predicate::Never, other) | (other, Predicate::Never) => other,
            (Predicate::Or(mut left), Predicate::Or(right)) => {
                left.extend(right);
                Predicate::Or(left)
            }
            (Predicate::Or(mut left), other) => {
                left.push(other);
                Predicate::Or(left)
            }
            (this, other) => Predicate::Or(vec![this, other]),
        }
    }

    /// `IdIn` that collapses to `Never` when the set is empty.
    pub fn id_in(ids: impl IntoIterator<Item = RecordId>) -> Predicate {
        let ids: BTreeSet<_> = ids.into_iter().collect();
        if ids.is_empty() {
            Predicate::Never
        } else {
            Predicate::IdIn(ids)
        }
    }

    pub fn container_in(containers: impl IntoIterator<Item = JoinableRef>) -> Predicate {
        let containers: BTreeSet<_> = containers.into_iter().collect();
        if containers.is_empty() {
            Predicate::Never
        } else {
            Predicate::ContainerIn(containers)
        }
    }

    pub fn host_in(hosts: impl IntoIterator<Item = JoinableRef>) -> Predicate {
        let hosts: BTreeSet<_> = hosts.into_iter().collect();
        if hosts.is_empty() {
            Predicate::Never
        } else {
            Predicate::HostIn(hosts)
        }
    }

    pub fn matches(&self, record: &Resource) -> bool {
        match self {
            Predicate::Always => true,
            Predicate::Never => false,
            Predicate::PrivacyIs(privacy) => record.privacy == Some(*privacy),
            Predicate::Listed => record
                .privacy
                .is_some_and(|privacy| !privacy.is_unlisted()),
            Predicate::Published => record.is_published(),
            Predicate::CreatorIs(agent) => record.is_created_by(agent),
            Predicate::SubjectIs(agent) => record.is_about(agent),
            Predicate::InviteeIs(agent) => record.is_invited(agent),
            Predicate::IdIn(ids) => ids.contains(&record.id),
            Predicate::ContainerIn(containers) => record
                .container
                .as_ref()
                .is_some_and(|container| containers.contains(container)),
            Predicate::HostIn(hosts) => record.hosts.iter().any(|host| hosts.contains(host)),
            Predicate::And(all) => all.iter().all(|predicate| predicate.matches(record)),
            Predicate::Or(any) => any.iter().any(|predicate| predicate.matches(record)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Order {
    /// Newest first, ties broken by id.
    NewestFirst,
    /// Oldest first, ties broken by id.
    OldestFirst,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    kind: ResourceType,
    filter: Predicate,
    order: Option<Order>,
}

impl Query {
    /// Every record of `kind`.
    pub fn all(kind: ResourceType) -> Self {
        Self {
            kind,
            filter: Predicate::Always,
            order: None,
        }
    }

    pub fn kind(&self) -> ResourceType {
        self.kind
    }

    pub fn filter(&self) -> &Predicate {
        &self.filter
    }

    pub fn order(&self) -> Option<Order> {
        self.order
    }

    /// A narrower copy of this query.
    pub fn and(&self, predicate: Predicate) -> Query {
        Query {
            kind: self.kind,
            filter: self.filter.clone().and(predicate),
            order: self.order,
        }
    }

    pub fn ordered(&self, order: Order) -> Query {
        Query {
            order: Some(order),
            ..self.clone()
        }
    }

    pub fn matches(&self, record: &Resource) -> bool {
        record.kind == self.kind && self.filter.matches(record)
    }

    /// Evaluate against in-memory records.
    pub fn apply<'r>(&self, records: impl IntoIterator<Item = &'r Resource>) -> Vec<&'r Resource> {
        let mut hits: Vec<_> = records
            .into_iter()
            .filter(|record| self.matches(record))
            .collect();
        match self.order {
            Some(Order::NewestFirst) => hits.sort_by(|a, b| {
                b.created_at
                    .cmp(&a.created_at)
                    .then_with(|| a.id.cmp(&b.id))
            }),
            Some(Order::OldestFirst) => hits.sort_by(|a, b| {
                a.created_at
                    .cmp(&b.created_at)
                    .then_with(|| a.id.cmp(&b.id))
            }),
            None => {}
        }
        hits
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn and_or_simplify() {
        let creator = Predicate::CreatorIs(AgentId::new("p1"));
        assert_eq!(Predicate::Always.and(creator.clone()), creator);
        assert_eq!(creator.clone().and(Predicate::Never), Predicate::Never);
        assert_eq!(Predicate::Never.or(creator.clone()), creator);
        assert_eq!(creator.clone().or(Predicate::Always), Predicate::Always);
        assert_eq!(Predicate::id_in(Vec::new()), Predicate::Never);
    }

    #[test]
    fn narrowing_leaves_the_base_untouched() {
        let base = Query::all(ResourceType::Community);
        let narrowed = base.and(Predicate::PrivacyIs(Privacy::Public));
        assert_eq!(base.filter(), &Predicate::Always);
        assert_eq!(narrowed.filter(), &Predicate::PrivacyIs(Privacy::Public));
    }

    #[test]
    fn apply_filters_kind_and_orders_newest_first() {
        let at = |day| Utc.with_ymd_and_hms(2024, 1, day, 0, 0, 0).unwrap();
        let records = vec![
            Resource::new(ResourceType::Community, "a")
                .with_privacy(Privacy::Public)
                .created_at(at(1)),
            Resource::new(ResourceType::Community, "b")
                .with_privacy(Privacy::Public)
                .created_at(at(3)),
            Resource::new(ResourceType::Community, "c").created_at(at(2)),
            Resource::new(ResourceType::Event, "d")
                .with_privacy(Privacy::Public)
                .created_at(at(4)),
        ];
        let query = Query::all(ResourceType::Community)
            .and(Predicate::PrivacyIs(Privacy::Public))
            .ordered(Order::NewestFirst);
        let ids: Vec<_> = query.apply(&records).iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);
    }

    #[test]
    fn listed_excludes_unlisted_and_privacyless_records() {
        let unlisted = Resource::new(ResourceType::Page, "p").with_privacy(Privacy::Unlisted);
        let role = Resource::new(ResourceType::Role, "r");
        assert!(!Predicate::Listed.matches(&unlisted));
        assert!(!Predicate::Listed.matches(&role));
    }
}
