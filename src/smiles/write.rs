//! Canonical SMILES writer.

use std::collections::HashMap;

use super::canon::canonical_labeling;
use super::{BondOrder, Molecule, Stereo, StereoNeighbor, Winding, symmetry_classes};
use crate::constants::smiles::ORGANIC_SUBSET;

/// Write `mol` as canonical SMILES.
///
/// Two molecules that differ only in atom order produce the same string.
/// Each connected component is written on its own and the pieces are joined
/// with `.` in sorted order; an empty molecule yields an empty string. A
/// tetrahedral tag is written only when its neighbours are pairwise
/// distinguishable.
pub fn write_smiles(mol: &Molecule) -> String {
    if mol.is_empty() {
        return String::new();
    }
    let mut pieces: Vec<String> = mol.fragments().iter().map(write_component).collect();
    pieces.sort_unstable();
    pieces.join(".")
}

fn write_component(mol: &Molecule) -> String {
    let classes = symmetry_classes(mol);
    let stereo_ok: Vec<bool> = mol
        .atoms()
        .map(|atom| {
            atom.stereo
                .as_ref()
                .is_some_and(|stereo| distinguishable(stereo, &classes))
        })
        .collect();
    canonical_labeling(mol, classes, |ranks| render(mol, ranks, &stereo_ok)).1
}

/// SMILES for `mol` with traversal order fixed by `ranks`.
fn render(mol: &Molecule, ranks: &[usize], stereo_ok: &[bool]) -> String {
    let tree = SpanningForest::build(mol, ranks);
    let mut emitter = Emitter {
        mol,
        tree: &tree,
        stereo_ok,
        out: String::new(),
        digits: HashMap::new(),
        in_use: Vec::new(),
    };
    for (component, &root) in tree.roots.iter().enumerate() {
        if component > 0 {
            emitter.out.push('.');
        }
        emitter.emit(root);
    }
    emitter.out
}

/// Depth-first traversal recorded ahead of writing, so ring openings are known
/// when their first atom is emitted.
struct SpanningForest {
    roots: Vec<usize>,
    parent: Vec<Option<usize>>,
    children: Vec<Vec<usize>>,
    /// `(partner, bond)` ring bonds opened at each atom.
    openings: Vec<Vec<(usize, usize)>>,
    /// `(partner, bond)` ring bonds closed at each atom.
    closings: Vec<Vec<(usize, usize)>>,
}

impl SpanningForest {
    fn build(mol: &Molecule, ranks: &[usize]) -> Self {
        let n = mol.atom_count();
        let mut forest = Self {
            roots: Vec::new(),
            parent: vec![None; n],
            children: vec![Vec::new(); n],
            openings: vec![Vec::new(); n],
            closings: vec![Vec::new(); n],
        };
        let mut visited = vec![false; n];
        let mut bond_used = vec![false; mol.bond_count()];

        let mut starts: Vec<usize> = (0..n).collect();
        starts.sort_by_key(|&atom| (mol.degree(atom), ranks[atom]));
        for start in starts {
            if visited[start] {
                continue;
            }
            forest.roots.push(start);
            forest.visit(mol, ranks, start, &mut visited, &mut bond_used);
        }

        for atom in 0..n {
            forest.openings[atom].sort_by_key(|&(partner, _)| ranks[partner]);
            forest.closings[atom].sort_by_key(|&(partner, _)| ranks[partner]);
        }
        forest
    }

    fn visit(
        &mut self,
        mol: &Molecule,
        ranks: &[usize],
        atom: usize,
        visited: &mut [bool],
        bond_used: &mut [bool],
    ) {
        visited[atom] = true;
        let mut around: Vec<(usize, usize)> = mol.neighbors(atom).collect();
        around.sort_by_key(|&(neighbor, _)| ranks[neighbor]);

        for (neighbor, bond) in around {
            if bond_used[bond] {
                continue;
            }
            bond_used[bond] = true;
            if visited[neighbor] {
                self.openings[neighbor].push((atom, bond));
                self.closings[atom].push((neighbor, bond));
            } else {
                self.parent[neighbor] = Some(atom);
                self.children[atom].push(neighbor);
                self.visit(mol, ranks, neighbor, visited, bond_used);
            }
        }
    }
}

struct Emitter<'a> {
    mol: &'a Molecule,
    tree: &'a SpanningForest,
    stereo_ok: &'a [bool],
    out: String,
    digits: HashMap<usize, usize>,
    in_use: Vec<bool>,
}

impl Emitter<'_> {
    fn emit(&mut self, atom: usize) {
        let tree = self.tree;
        let mut ring_tokens: Vec<(usize, &'static str, usize)> = Vec::new();
        let mut released = Vec::new();
        for &(partner, bond) in &tree.closings[atom] {
            if let Some(digit) = self.digits.remove(&bond) {
                ring_tokens.push((digit, "", partner));
                released.push(digit);
            }
        }
        for &(partner, bond) in &tree.openings[atom] {
            let digit = self.claim_digit();
            self.digits.insert(bond, digit);
            ring_tokens.push((digit, bond_symbol(self.mol, atom, partner), partner));
        }

        let stereo = self
            .mol
            .atom(atom)
            .stereo
            .as_ref()
            .filter(|_| self.stereo_ok[atom]);
        let winding = stereo.and_then(|stereo| {
            let written = self.written_neighbors(atom, stereo, &ring_tokens);
            output_winding(stereo, &written)
        });
        let token = atom_token(self.mol, atom, winding);
        self.out.push_str(&token);

        for &(digit, symbol, _) in &ring_tokens {
            self.out.push_str(symbol);
            if digit < 10 {
                self.out.push_str(&digit.to_string());
            } else {
                self.out.push_str(&format!("%{digit:02}"));
            }
        }
        for digit in released {
            self.in_use[digit] = false;
        }

        let children = &tree.children[atom];
        for (position, &child) in children.iter().enumerate() {
            let last = position + 1 == children.len();
            if !last {
                self.out.push('(');
            }
            self.out.push_str(bond_symbol(self.mol, atom, child));
            self.emit(child);
            if !last {
                self.out.push(')');
            }
        }
    }

    fn claim_digit(&mut self) -> usize {
        // digit 0 is never handed out so ring labels start at 1
        if self.in_use.is_empty() {
            self.in_use.push(true);
        }
        let digit = match self.in_use.iter().position(|used| !used) {
            Some(free) => free,
            None => {
                self.in_use.push(false);
                self.in_use.len() - 1
            }
        };
        self.in_use[digit] = true;
        digit
    }

    /// Neighbours of `atom` in the order they appear around it in the output.
    fn written_neighbors(
        &self,
        atom: usize,
        stereo: &Stereo,
        ring_tokens: &[(usize, &'static str, usize)],
    ) -> Vec<StereoNeighbor> {
        let mut written = Vec::with_capacity(4);
        if let Some(parent) = self.tree.parent[atom] {
            written.push(StereoNeighbor::Atom(parent));
        }
        if stereo.order.contains(&StereoNeighbor::Hydrogen) {
            written.push(StereoNeighbor::Hydrogen);
        }
        written.extend(
            ring_tokens
                .iter()
                .map(|&(_, _, partner)| StereoNeighbor::Atom(partner)),
        );
        written.extend(
            self.tree.children[atom]
                .iter()
                .map(|&child| StereoNeighbor::Atom(child)),
        );
        written
    }
}

fn distinguishable(stereo: &Stereo, classes: &[usize]) -> bool {
    let mut seen: Vec<usize> = stereo
        .order
        .iter()
        .filter_map(|neighbor| match neighbor {
            StereoNeighbor::Atom(atom) => Some(classes[*atom]),
            StereoNeighbor::Hydrogen => None,
        })
        .collect();
    let total = seen.len();
    seen.sort_unstable();
    seen.dedup();
    seen.len() == total
}

/// Winding relative to `written`, or `None` when it names different neighbours.
fn output_winding(stereo: &Stereo, written: &[StereoNeighbor]) -> Option<Winding> {
    if stereo.order.len() != written.len() {
        return None;
    }
    let positions = written
        .iter()
        .map(|neighbor| stereo.order.iter().position(|stored| stored == neighbor))
        .collect::<Option<Vec<usize>>>()?;
    let mut check = positions.clone();
    check.sort_unstable();
    if check.iter().enumerate().any(|(idx, &pos)| idx != pos) {
        return None;
    }

    let mut inversions = 0;
    for (i, &left) in positions.iter().enumerate() {
        inversions += positions[i + 1..].iter().filter(|&&right| right < left).count();
    }
    Some(if inversions % 2 == 0 {
        stereo.winding
    } else {
        stereo.winding.flipped()
    })
}

fn bond_symbol(mol: &Molecule, a: usize, b: usize) -> &'static str {
    let Some(bond) = mol.bond_between(a, b) else {
        return "";
    };
    match bond.order {
        BondOrder::Single => {
            if mol.atom(a).aromatic && mol.atom(b).aromatic {
                "-"
            } else {
                ""
            }
        }
        BondOrder::Double => "=",
        BondOrder::Triple => "#",
        BondOrder::Quadruple => "$",
        BondOrder::Aromatic => "",
    }
}

fn atom_token(mol: &Molecule, idx: usize, winding: Option<Winding>) -> String {
    let atom = mol.atom(idx);
    let symbol = if atom.aromatic {
        atom.symbol().to_ascii_lowercase()
    } else {
        atom.symbol().to_string()
    };

    let organic = atom.atomic_number == 0 || ORGANIC_SUBSET.contains(&atom.atomic_number);
    let bare_aromatic = !atom.aromatic || matches!(atom.atomic_number, 5 | 6 | 7 | 8 | 15 | 16);
    if organic
        && bare_aromatic
        && atom.charge == 0
        && atom.isotope.is_none()
        && winding.is_none()
        && atom.hydrogens == mol.implied_hydrogens(idx)
    {
        return symbol;
    }

    let mut token = String::from("[");
    if let Some(isotope) = atom.isotope {
        token.push_str(&isotope.to_string());
    }
    token.push_str(&symbol);
    if let Some(winding) = winding {
        token.push_str(winding.symbol());
    }
    match atom.hydrogens {
        0 => {}
        1 => token.push('H'),
        count => token.push_str(&format!("H{count}")),
    }
    match atom.charge {
        0 => {}
        1 => token.push('+'),
        -1 => token.push('-'),
        charge if charge > 0 => token.push_str(&format!("+{charge}")),
        charge => token.push_str(&format!("-{}", charge.unsigned_abs())),
    }
    token.push(']');
    token
}
