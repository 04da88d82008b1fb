use std::{collections::VecDeque, fmt::Display};

use ahash::{AHashMap, AHashSet};
use indexmap::IndexMap;
use itertools::Itertools;
use log::trace;
use serde::{Deserialize, Serialize};

use crate::{
    expression::{product::Product, sum::Sum, symmetry::Relabeling, Expr, Factor},
    qft::{propagator::Propagator, IndexKind, IndexValue},
    render::{Render, RenderSettings},
};

use super::ContractionError;

/// Index values at the start and at the end of a chain, one per index kind.
pub type Endpoints = (Vec<IndexValue>, Vec<IndexValue>);

/// Factors glued along one or more index kinds.
///
/// The exit values of every link are the entry values of the next one. When
/// the exit of the last link equals the entry of the first the chain is a
/// closed trace, otherwise an open chain between `entry` and `exit`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trace {
    links: Vec<Factor>,
    kinds: Vec<IndexKind>,
    entry: Vec<IndexValue>,
    exit: Vec<IndexValue>,
}

impl Trace {
    pub fn links(&self) -> &[Factor] {
        &self.links
    }

    pub fn kinds(&self) -> &[IndexKind] {
        &self.kinds
    }

    pub fn entry(&self) -> &[IndexValue] {
        &self.entry
    }

    pub fn exit(&self) -> &[IndexValue] {
        &self.exit
    }

    pub fn is_closed(&self) -> bool {
        self.entry == self.exit
    }

    /// The values the chain exposes along `kinds`.
    ///
    /// For its own kinds these are its entry and exit. For any other kind the
    /// links are chained again along that kind alone, and they must form a
    /// single chain. `None` when no link carries one of the kinds.
    pub fn endpoints(&self, kinds: &[IndexKind]) -> Result<Option<Endpoints>, ContractionError> {
        let mut entry = vec![];
        let mut exit = vec![];
        for kind in kinds {
            if let Some(p) = self.kinds.iter().position(|k| k == kind) {
                entry.push(self.entry[p].clone());
                exit.push(self.exit[p].clone());
                continue;
            }

            let single = std::slice::from_ref(kind);
            let mut segments = vec![];
            for link in &self.links {
                if let Some((a, b)) = link.endpoints(single)? {
                    segments.push(Segment::new(link.clone(), a, b));
                }
            }
            let mut chains = link_segments(segments, single)?;
            match chains.len() {
                0 => return Ok(None),
                1 => {
                    let chain = chains.remove(0);
                    entry.extend(chain.entry);
                    exit.extend(chain.exit);
                }
                pieces => {
                    return Err(ContractionError::Disconnected {
                        traced: self.kinds.clone(),
                        kind: kind.clone(),
                        pieces,
                    })
                }
            }
        }
        Ok(Some((entry, exit)))
    }

    pub fn relabel(&self, relabeling: &Relabeling) -> Trace {
        let relabel_values = |values: &[IndexValue]| -> Vec<IndexValue> {
            self.kinds
                .iter()
                .zip(values)
                .map(|(k, v)| relabeling.index(k, v).clone())
                .collect()
        };
        Trace {
            links: self.links.iter().map(|l| l.relabel(relabeling)).collect(),
            kinds: self.kinds.clone(),
            entry: relabel_values(&self.entry),
            exit: relabel_values(&self.exit),
        }
    }

    fn kinds_label(&self) -> String {
        self.kinds.iter().map(IndexKind::as_str).join(",")
    }

    /// Whether the chain may be read backwards, i.e. it is made of symmetric
    /// lines only.
    fn reversible(&self) -> bool {
        self.links
            .iter()
            .all(|l| matches!(l, Factor::Propagator(p) if p.symmetric()))
    }

    /// Closed traces are keyed by their smallest rotation, chains of
    /// symmetric lines by the smaller of both reading directions.
    pub fn canonical_key(&self) -> String {
        let keys: Vec<String> = self.links.iter().map(Factor::canonical_key).collect();
        let mut readings = vec![keys.clone()];
        if self.reversible() {
            readings.push(keys.iter().rev().cloned().collect());
        }

        if self.is_closed() {
            let body = readings
                .iter()
                .flat_map(|keys| {
                    (0..keys.len()).map(move |r| keys[r..].iter().chain(&keys[..r]).join(" * "))
                })
                .min()
                .unwrap_or_default();
            format!("Tr_{}[{body}]", self.kinds_label())
        } else {
            let (entry, exit) = (self.entry.join(","), self.exit.join(","));
            let forward = format!("[{}]({entry}, {exit})", keys.join(" * "));
            match readings.get(1) {
                Some(backward) => forward.min(format!("[{}]({exit}, {entry})", backward.join(" * "))),
                None => forward,
            }
        }
    }
}

impl Render for Trace {
    fn render(&self, settings: &RenderSettings) -> String {
        let inner = settings.hiding(&self.kinds);
        let body = self
            .links
            .iter()
            .map(|l| l.render(&inner))
            .join(settings.product_separator());
        let kinds = self.kinds_label();
        let (entry, exit) = (self.entry.join(","), self.exit.join(","));
        match (self.is_closed(), settings.latex) {
            (true, true) => format!(r"\mathrm{{Tr}}_\mathrm{{{kinds}}} \big[{body} \big]"),
            (true, false) => format!("Tr_{kinds}[{body}]"),
            (false, true) => format!(r"\big[{body} \big]({entry}, {exit})"),
            (false, false) => format!("[{body}]({entry}, {exit})"),
        }
    }
}

impl Display for Trace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.render(&RenderSettings::default()))
    }
}

impl Factor {
    /// The values the factor exposes along `kinds`, `None` if it does not
    /// carry all of them. Fields never take part in a chain.
    pub fn endpoints(&self, kinds: &[IndexKind]) -> Result<Option<Endpoints>, ContractionError> {
        match self {
            Factor::Field(_) => Ok(None),
            Factor::Propagator(p) => Ok(kinds
                .iter()
                .map(|k| p.endpoints(k).map(|(a, b)| (a.clone(), b.clone())))
                .collect::<Option<Vec<_>>>()
                .map(|pairs| pairs.into_iter().unzip())),
            Factor::Trace(t) => t.endpoints(kinds),
        }
    }
}

#[derive(Debug, Clone)]
struct Segment {
    factor: Factor,
    entry: Vec<IndexValue>,
    exit: Vec<IndexValue>,
}

impl Segment {
    fn new(factor: Factor, entry: Vec<IndexValue>, exit: Vec<IndexValue>) -> Self {
        Segment {
            factor,
            entry,
            exit,
        }
    }

    fn reversible(&self) -> bool {
        matches!(&self.factor, Factor::Propagator(p) if p.symmetric())
    }

    fn reversed(&self) -> Segment {
        let factor = match &self.factor {
            Factor::Propagator(p) => Factor::Propagator(p.reversed()),
            f => f.clone(),
        };
        Segment::new(factor, self.exit.clone(), self.entry.clone())
    }
}

struct Chain {
    links: VecDeque<Factor>,
    entry: Vec<IndexValue>,
    exit: Vec<IndexValue>,
}

impl Chain {
    fn start(head: &Segment) -> Self {
        Chain {
            links: VecDeque::from([head.factor.clone()]),
            entry: head.entry.clone(),
            exit: head.exit.clone(),
        }
    }

    fn push_back(&mut self, s: Segment) {
        self.exit = s.exit;
        self.links.push_back(s.factor);
    }

    fn push_front(&mut self, s: Segment) {
        self.entry = s.entry;
        self.links.push_front(s.factor);
    }

    fn is_closed(&self) -> bool {
        self.entry == self.exit
    }

    fn into_trace(self, kinds: &[IndexKind]) -> Trace {
        Trace {
            links: self.links.into(),
            kinds: kinds.to_vec(),
            entry: self.entry,
            exit: self.exit,
        }
    }
}

/// The unused segment continuing a chain at `value`, and whether it has to
/// be reversed. Segments that fit as they are take precedence over reversed
/// symmetric ones.
fn continuation(
    segments: &[Segment],
    used: &[bool],
    value: &[IndexValue],
    forward: bool,
    kinds: &[IndexKind],
) -> Result<Option<(usize, bool)>, ContractionError> {
    let mut direct = vec![];
    let mut flipped = vec![];
    for (i, s) in segments.iter().enumerate().filter(|(i, _)| !used[*i]) {
        let (near, far) = if forward {
            (&s.entry, &s.exit)
        } else {
            (&s.exit, &s.entry)
        };
        if near == value {
            direct.push(i);
        } else if s.reversible() && far == value {
            flipped.push(i);
        }
    }

    let (candidates, flip) = if direct.is_empty() {
        (flipped, true)
    } else {
        (direct, false)
    };
    match candidates.as_slice() {
        [] => Ok(None),
        [i] => Ok(Some((*i, flip))),
        _ => Err(ContractionError::Ambiguous {
            kinds: kinds.to_vec(),
            value: value.to_vec(),
        }),
    }
}

/// Greedily glues segments into maximal chains, extending each chain first
/// after its exit and then before its entry.
///
/// A value may sit on at most two segment ends, otherwise the gluing would
/// depend on the order of the segments.
fn link_segments(segments: Vec<Segment>, kinds: &[IndexKind]) -> Result<Vec<Chain>, ContractionError> {
    let mut ends: AHashMap<&[IndexValue], usize> = AHashMap::new();
    for value in segments.iter().flat_map(|s| [&s.entry, &s.exit]) {
        let count = ends.entry(value.as_slice()).or_insert(0);
        *count += 1;
        if *count > 2 {
            return Err(ContractionError::Ambiguous {
                kinds: kinds.to_vec(),
                value: value.clone(),
            });
        }
    }

    let mut used = vec![false; segments.len()];
    let mut chains = vec![];

    for head in 0..segments.len() {
        if used[head] {
            continue;
        }
        used[head] = true;
        let mut chain = Chain::start(&segments[head]);

        for forward in [true, false] {
            while !chain.is_closed() {
                let value = if forward { &chain.exit } else { &chain.entry };
                let Some((next, flip)) = continuation(&segments, &used, value, forward, kinds)?
                else {
                    break;
                };
                used[next] = true;
                let s = if flip {
                    segments[next].reversed()
                } else {
                    segments[next].clone()
                };
                if forward {
                    chain.push_back(s);
                } else {
                    chain.push_front(s);
                }
            }
        }

        trace!(
            "{} chain of {} link(s) along {:?}",
            if chain.is_closed() { "closed" } else { "open" },
            chain.links.len(),
            kinds
        );
        chains.push(chain);
    }

    let mut open_ends = AHashSet::new();
    for chain in chains.iter().filter(|c| !c.is_closed()) {
        for value in [&chain.entry, &chain.exit] {
            if !open_ends.insert(value.clone()) {
                return Err(ContractionError::Ambiguous {
                    kinds: kinds.to_vec(),
                    value: value.clone(),
                });
            }
        }
    }

    Ok(chains)
}

fn find(parent: &mut [usize], mut i: usize) -> usize {
    while parent[i] != i {
        parent[i] = parent[parent[i]];
        i = parent[i];
    }
    i
}

fn union(parent: &mut [usize], a: usize, b: usize) {
    let (ra, rb) = (find(parent, a), find(parent, b));
    if ra != rb {
        parent[ra.max(rb)] = ra.min(rb);
    }
}

impl Product {
    /// Glues every factor carrying all of `kinds` into chains along them.
    ///
    /// Closed chains become traces, open ones chains between their two free
    /// values. Fields and factors lacking one of the kinds are left alone.
    pub fn contract(&self, kinds: &[IndexKind]) -> Result<Product, ContractionError> {
        if kinds.is_empty() {
            return Ok(self.clone());
        }

        let mut untouched = vec![];
        let mut segments = vec![];
        for f in self.data() {
            match f.endpoints(kinds)? {
                Some((entry, exit)) => segments.push(Segment::new(f.clone(), entry, exit)),
                None => untouched.push(Expr::from(f.clone())),
            }
        }

        let chains = link_segments(segments, kinds)?;
        let mut factors = vec![Expr::Product(self.prefactor())];
        factors.extend(untouched);
        factors.extend(chains.into_iter().map(|c| Expr::Trace(c.into_trace(kinds))));
        Ok(Product::new(factors))
    }

    /// Propagators grouped into connected components, reading each one as an
    /// undirected edge between its two values of `kind`. Propagators inside
    /// traces take part, ones without `kind` are skipped.
    pub fn topologies(&self, kind: &IndexKind) -> Vec<Vec<Propagator>> {
        let lines: Vec<(&Propagator, (&IndexValue, &IndexValue))> = self
            .data()
            .iter()
            .flat_map(Factor::propagators)
            .filter_map(|p| p.endpoints(kind).map(|ends| (p, ends)))
            .collect();

        let mut parent: Vec<usize> = (0..lines.len()).collect();
        let mut owner: AHashMap<&IndexValue, usize> = AHashMap::new();
        for (i, (_, (a, b))) in lines.iter().enumerate() {
            for v in [*a, *b] {
                match owner.get(v) {
                    Some(&j) => union(&mut parent, i, j),
                    None => {
                        owner.insert(v, i);
                    }
                }
            }
        }

        let mut groups: IndexMap<usize, Vec<Propagator>> = IndexMap::new();
        for (i, (p, _)) in lines.iter().enumerate() {
            let root = find(&mut parent, i);
            groups.entry(root).or_default().push((*p).clone());
        }
        groups.into_values().collect()
    }
}

impl Sum {
    pub fn contract(&self, kinds: &[IndexKind]) -> Result<Sum, ContractionError> {
        let terms = self
            .terms()
            .iter()
            .map(|t| t.contract(kinds).map(Expr::Product))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Sum::new(terms))
    }
}

#[cfg(test)]
mod tests {
    use crate::qft::{
        factory::{FieldFactory, Quark},
        field::Field,
    };

    use super::*;

    fn line(q: &Quark, from: (u32, &str), to: (u32, &str)) -> Expr {
        let a: Field = q.psi(from.0, format!("s{}", from.0), from.1);
        let b: Field = q.psibar(to.0, format!("s{}", to.0), to.1);
        Expr::Propagator(a.contract(&b))
    }

    #[test]
    fn closed_color_loop() {
        let mut factory = FieldFactory::new();
        let q = factory.quark("q");
        let p = Product::new([
            line(&q, (1, "i"), (2, "j")),
            line(&q, (2, "j"), (3, "k")),
            line(&q, (3, "k"), (1, "i")),
        ]);
        let traced = p.contract(&[IndexKind::Color]).unwrap();
        assert_eq!(traced.data().len(), 1);
        let t = traced.data()[0].clone().try_into_trace().unwrap();
        assert!(t.is_closed());
        assert_eq!(
            traced.to_string(),
            "Tr_color[S_q(1, 2)(s1, s2) * S_q(2, 3)(s2, s3) * S_q(3, 1)(s3, s1)]"
        );
    }

    #[test]
    fn open_chain_keeps_free_ends() {
        let mut factory = FieldFactory::new();
        let q = factory.quark("q");
        let p = Product::new([line(&q, (2, "j"), (3, "k")), line(&q, (1, "i"), (2, "j"))]);
        let traced = p.contract(&[IndexKind::Color]).unwrap();
        let t = traced.data()[0].clone().try_into_trace().unwrap();
        assert!(!t.is_closed());
        assert_eq!(t.entry(), ["i".to_string()]);
        assert_eq!(t.exit(), ["k".to_string()]);
        assert_eq!(
            t.render(&RenderSettings::default().with_verbose(IndexKind::Spin, false)),
            "[S_q(1, 2) * S_q(2, 3)](i, k)"
        );
    }

    #[test]
    fn rotations_share_a_key() {
        let mut factory = FieldFactory::new();
        let q = factory.quark("q");
        let a = Product::new([
            line(&q, (1, "i"), (2, "j")),
            line(&q, (2, "j"), (1, "i")),
        ]);
        let b = Product::new([
            line(&q, (2, "j"), (1, "i")),
            line(&q, (1, "i"), (2, "j")),
        ]);
        let ta = a.contract(&[IndexKind::Color]).unwrap();
        let tb = b.contract(&[IndexKind::Color]).unwrap();
        assert_ne!(ta, tb);
        assert_eq!(ta.canonical_key(), tb.canonical_key());
        assert!(ta.contains(&tb.data()[0]));
    }

    #[test]
    fn topologies_split_disconnected_lines() {
        let mut factory = FieldFactory::new();
        let phi = factory.real_scalar("phi");
        let p = Product::new([
            Expr::Propagator(phi.at(1).contract(&phi.at("x"))),
            Expr::Propagator(phi.at(3).contract(&phi.at(4))),
            Expr::Propagator(phi.at("x").contract(&phi.at(2))),
        ]);
        let groups = p.topologies(&IndexKind::Position);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].len(), 2);
        assert_eq!(groups[1].len(), 1);
    }
}
