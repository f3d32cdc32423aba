use std::collections::{BTreeSet, HashMap};

use crate::foundation::error::{TapestryError, TapestryResult};

#[derive(Clone, Debug, PartialEq, Eq)]
enum Constraint {
    Before(String),
    After(String),
}

struct Entry<T> {
    id: String,
    target: T,
    constraints: Vec<Constraint>,
}

/// Orders named targets by `before:<id>` / `after:<id>` constraints (`*` addresses every peer).
///
/// Targets without constraints keep their insertion order. Constraints naming an unknown peer
/// are ignored with a warning; cycles are errors.
pub struct Orderer<T> {
    context: String,
    entries: Vec<Entry<T>>,
    index: HashMap<String, usize>,
}

impl<T> Orderer<T> {
    pub fn new(context: impl Into<String>) -> Self {
        Self {
            context: context.into(),
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }

    pub fn add<S: AsRef<str>>(
        &mut self,
        id: &str,
        target: T,
        constraints: &[S],
    ) -> TapestryResult<()> {
        let key = id.to_ascii_lowercase();
        if self.index.contains_key(&key) {
            return Err(TapestryError::config(format!(
                "{}: duplicate id '{id}'",
                self.context
            )));
        }
        let mut parsed = Vec::with_capacity(constraints.len());
        for raw in constraints {
            for c in raw.as_ref().split(';').map(str::trim).filter(|c| !c.is_empty()) {
                parsed.push(parse_constraint(&self.context, c)?);
            }
        }
        self.index.insert(key, self.entries.len());
        self.entries.push(Entry {
            id: id.to_string(),
            target,
            constraints: parsed,
        });
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn order(self) -> TapestryResult<Vec<T>> {
        let n = self.entries.len();
        let mut succ: Vec<BTreeSet<usize>> = vec![BTreeSet::new(); n];

        let has = |e: &Entry<T>, f: fn(&Constraint) -> bool| e.constraints.iter().any(f);
        let before_all: Vec<bool> = self
            .entries
            .iter()
            .map(|e| has(e, |c| matches!(c, Constraint::Before(p) if p == "*")))
            .collect();
        let after_all: Vec<bool> = self
            .entries
            .iter()
            .map(|e| has(e, |c| matches!(c, Constraint::After(p) if p == "*")))
            .collect();

        for (i, entry) in self.entries.iter().enumerate() {
            for c in &entry.constraints {
                match c {
                    Constraint::Before(p) if p == "*" => {
                        for j in (0..n).filter(|&j| j != i && !before_all[j]) {
                            succ[i].insert(j);
                        }
                    }
                    Constraint::After(p) if p == "*" => {
                        for j in (0..n).filter(|&j| j != i && !after_all[j]) {
                            succ[j].insert(i);
                        }
                    }
                    Constraint::Before(p) => match self.index.get(p) {
                        Some(&j) if j != i => {
                            succ[i].insert(j);
                        }
                        Some(_) => {}
                        None => self.warn_unknown(&entry.id, p),
                    },
                    Constraint::After(p) => match self.index.get(p) {
                        Some(&j) if j != i => {
                            succ[j].insert(i);
                        }
                        Some(_) => {}
                        None => self.warn_unknown(&entry.id, p),
                    },
                }
            }
        }

        let mut indegree = vec![0usize; n];
        for edges in &succ {
            for &j in edges {
                indegree[j] += 1;
            }
        }

        let mut ready: BTreeSet<usize> = (0..n).filter(|&i| indegree[i] == 0).collect();
        let mut sequence = Vec::with_capacity(n);
        while let Some(i) = ready.pop_first() {
            sequence.push(i);
            for &j in &succ[i] {
                indegree[j] -= 1;
                if indegree[j] == 0 {
                    ready.insert(j);
                }
            }
        }

        if sequence.len() != n {
            let stuck: Vec<&str> = (0..n)
                .filter(|i| indegree[*i] > 0)
                .map(|i| self.entries[i].id.as_str())
                .collect();
            return Err(TapestryError::config(format!(
                "{}: ordering constraints form a cycle among {}",
                self.context,
                stuck.join(", ")
            )));
        }

        let mut slots: Vec<Option<T>> = self.entries.into_iter().map(|e| Some(e.target)).collect();
        Ok(sequence
            .into_iter()
            .filter_map(|i| slots[i].take())
            .collect())
    }

    fn warn_unknown(&self, id: &str, peer: &str) {
        tracing::warn!(
            context = %self.context,
            id,
            peer,
            "ordering constraint references unknown peer; ignored"
        );
    }
}

fn parse_constraint(context: &str, raw: &str) -> TapestryResult<Constraint> {
    let (kind, peer) = raw.split_once(':').ok_or_else(|| {
        TapestryError::config(format!("{context}: malformed ordering constraint '{raw}'"))
    })?;
    let peer = peer.trim().to_ascii_lowercase();
    if peer.is_empty() {
        return Err(TapestryError::config(format!(
            "{context}: ordering constraint '{raw}' has no peer"
        )));
    }
    match kind.trim().to_ascii_lowercase().as_str() {
        "before" => Ok(Constraint::Before(peer)),
        "after" => Ok(Constraint::After(peer)),
        _ => Err(TapestryError::config(format!(
            "{context}: unknown ordering constraint '{raw}'"
        ))),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/orderer.rs"]
mod tests;
