//! Text renderings of diagrams
//!
//! Three advisory formats: set-of-minterms notation over variable indices,
//! the same compacted through the finite-domain table (consecutive values
//! coalesce into `lo-hi` ranges), and Graphviz DOT with dotted low edges and
//! solid high edges. The exact layout is not a stable contract; the
//! enumerations behind it are.

use std::io::{self, Write};

use num_bigint::BigUint;

use crate::factory::Bdd;
use crate::node::{DiagramKind, ONE_NODE, ZERO_NODE};

impl Bdd {
    /// Set-of-minterms notation: one `<var:val, …>` group per satisfying
    /// ternary vector, don't-cares left out. The constants render as `F`
    /// and `T`.
    pub fn to_set_string(&self) -> String {
        if self.is_zero() {
            return "F".to_string();
        }
        let kind = self.factory.borrow().kind();
        if self.is_one() && kind == DiagramKind::Bdd {
            return "T".to_string();
        }
        let mut out = String::new();
        for vec in self.all_sat() {
            let mut parts = Vec::new();
            for (var, value) in vec.iter().enumerate() {
                match (kind, value) {
                    (DiagramKind::Bdd, Some(b)) => {
                        parts.push(format!("{}:{}", var, u8::from(*b)))
                    }
                    (DiagramKind::Zdd, Some(true)) => parts.push(format!("{}:1", var)),
                    _ => {}
                }
            }
            out.push('<');
            out.push_str(&parts.join(", "));
            out.push('>');
        }
        out
    }

    /// Set notation compacted through the finite-domain table: per cube,
    /// each constrained domain prints as `name:values`, where consecutive
    /// values coalesce into `lo-hi` and disjoint runs join with `/`.
    /// Variables not bound to any domain are omitted.
    pub fn to_domain_string(&self) -> String {
        if self.is_zero() {
            return "F".to_string();
        }
        let kind = self.factory.borrow().kind();
        if self.is_one() && kind == DiagramKind::Bdd {
            return "T".to_string();
        }

        let domains: Vec<(String, Vec<usize>)> = {
            let inner = self.factory.borrow();
            inner
                .domains
                .iter()
                .map(|d| (d.name.clone(), d.vars.clone()))
                .collect()
        };

        let mut out = String::new();
        for vec in self.all_sat() {
            let mut parts = Vec::new();
            for (name, vars) in &domains {
                if vars.iter().all(|&v| vec[v].is_none()) {
                    continue;
                }
                let values = expand_domain_values(&vec, vars);
                parts.push(format!("{}:{}", name, format_ranges(&values)));
            }
            out.push('<');
            out.push_str(&parts.join(", "));
            out.push('>');
        }
        out
    }

    /// Write the diagram as a Graphviz digraph: branch nodes labeled with
    /// their variable index, dotted edges to low children, solid edges to
    /// high children, and the two terminals as boxes.
    pub fn write_dot<W: Write>(&self, output: &mut W) -> io::Result<()> {
        let inner = self.factory.borrow();

        // Reachable branch nodes, root first.
        let mut seen = std::collections::BTreeSet::new();
        let mut work = vec![self.root];
        while let Some(id) = work.pop() {
            if id <= ONE_NODE || !seen.insert(id) {
                continue;
            }
            work.push(inner.store.low(id));
            work.push(inner.store.high(id));
        }

        writeln!(output, "digraph G {{")?;
        writeln!(
            output,
            "init__ [label=\"\", style=invis, height=0, width=0];"
        )?;
        writeln!(output, "init__ -> {};", self.root)?;
        for &id in seen.iter().rev() {
            let var = inner.var_at_level(inner.store.level(id));
            writeln!(output, "{} [label=\"{}\"];", id, var)?;
            writeln!(
                output,
                "{} -> {} [style=filled];",
                id,
                inner.store.high(id)
            )?;
            writeln!(output, "{} -> {} [style=dotted];", id, inner.store.low(id))?;
        }
        writeln!(
            output,
            "{} [shape=box, label=\"0\", style=filled, height=0.3, width=0.3];",
            ZERO_NODE
        )?;
        writeln!(
            output,
            "{} [shape=box, label=\"1\", style=filled, height=0.3, width=0.3];",
            ONE_NODE
        )?;
        writeln!(output, "}}")?;
        Ok(())
    }
}

/// All domain values consistent with one ternary vector, sorted.
fn expand_domain_values(vec: &[Option<bool>], vars: &[usize]) -> Vec<BigUint> {
    let mut base = BigUint::default();
    let mut free: Vec<u64> = Vec::new();
    for (bit, &var) in vars.iter().enumerate() {
        match vec[var] {
            Some(true) => base.set_bit(bit as u64, true),
            Some(false) => {}
            None => free.push(bit as u64),
        }
    }
    let mut values = Vec::with_capacity(1 << free.len());
    for combo in 0u64..(1 << free.len()) {
        let mut value = base.clone();
        for (i, &bit) in free.iter().enumerate() {
            if (combo >> i) & 1 == 1 {
                value.set_bit(bit, true);
            }
        }
        values.push(value);
    }
    values.sort();
    values
}

/// Render sorted values with consecutive runs as `lo-hi`, runs joined by `/`.
fn format_ranges(values: &[BigUint]) -> String {
    let mut runs: Vec<String> = Vec::new();
    let mut i = 0;
    while i < values.len() {
        let mut j = i;
        while j + 1 < values.len() && values[j + 1] == &values[j] + 1u32 {
            j += 1;
        }
        if i == j {
            runs.push(values[i].to_string());
        } else {
            runs.push(format!("{}-{}", values[i], values[j]));
        }
        i = j + 1;
    }
    runs.join("/")
}
