//! Canonical atom ranking.
//!
//! Atoms start out classed by local invariants and classes are refined by
//! neighbour ranks until stable. Ties that survive refinement are settled by
//! a search: each atom of the lowest tied class is individualized in turn,
//! the partition is refined again, and the discrete labeling whose rendering
//! sorts first wins. Two leaves with the same rendering and the same
//! labelled graph give an automorphism, and candidates in the same orbit as
//! one already searched are skipped.

use std::cmp::Ordering;

use petgraph::unionfind::UnionFind;

use super::{BondOrder, Molecule};

type Invariant = (u8, u16, i8, bool, u8, usize, bool);

/// Atom invariants in label order plus the relabelled, sorted bond list.
type Certificate = (Vec<Invariant>, Vec<(usize, usize, BondOrder)>);

/// A distinct rank in `0..atom_count` for every atom.
pub fn canonical_ranks(mol: &Molecule) -> Vec<usize> {
    canonical_labeling(mol, symmetry_classes(mol), |_| String::new()).0
}

/// Refined invariant classes before tie-breaking; atoms sharing a class are
/// treated as topologically equivalent.
pub fn symmetry_classes(mol: &Molecule) -> Vec<usize> {
    let invariants: Vec<Invariant> = (0..mol.atom_count())
        .map(|atom| invariant(mol, atom))
        .collect();
    refine(mol, dense_ranks(&invariants))
}

/// Discrete labeling starting from `classes`, chosen so that `render` of the
/// labeling is lexicographically smallest. Returns the ranks and their
/// rendering.
pub(crate) fn canonical_labeling<F>(
    mol: &Molecule,
    classes: Vec<usize>,
    render: F,
) -> (Vec<usize>, String)
where
    F: FnMut(&[usize]) -> String,
{
    let mut search = LabelSearch {
        mol,
        invariants: (0..mol.atom_count())
            .map(|atom| invariant(mol, atom))
            .collect(),
        render,
        best: None,
        automorphisms: Vec::new(),
    };
    search.descend(classes, &mut Vec::new());
    search
        .best
        .map(|leaf| (leaf.ranks, leaf.rendered))
        .unwrap_or_default()
}

struct Leaf {
    ranks: Vec<usize>,
    rendered: String,
    certificate: Certificate,
}

struct LabelSearch<'a, F> {
    mol: &'a Molecule,
    invariants: Vec<Invariant>,
    render: F,
    best: Option<Leaf>,
    /// Atom maps between equal leaves; `map[atom]` is the image of `atom`.
    automorphisms: Vec<Vec<usize>>,
}

impl<F> LabelSearch<'_, F>
where
    F: FnMut(&[usize]) -> String,
{
    fn descend(&mut self, ranks: Vec<usize>, fixed: &mut Vec<usize>) {
        let Some(tied) = lowest_tied_rank(&ranks) else {
            self.finish_leaf(ranks);
            return;
        };
        let cell: Vec<usize> = (0..ranks.len())
            .filter(|&atom| ranks[atom] == tied)
            .collect();
        let mut searched: Vec<usize> = Vec::with_capacity(cell.len());
        for chosen in cell {
            let orbits = self.orbits_fixing(fixed);
            if searched.iter().any(|&done| orbits.equiv(done, chosen)) {
                continue;
            }
            searched.push(chosen);

            let split: Vec<(usize, bool)> = ranks
                .iter()
                .enumerate()
                .map(|(atom, &rank)| (rank, atom != chosen))
                .collect();
            fixed.push(chosen);
            self.descend(refine(self.mol, dense_ranks(&split)), fixed);
            fixed.pop();
        }
    }

    /// Orbits of the automorphisms found so far that leave every atom in
    /// `fixed` in place.
    fn orbits_fixing(&self, fixed: &[usize]) -> UnionFind<usize> {
        let mut orbits = UnionFind::new(self.invariants.len());
        for map in &self.automorphisms {
            if fixed.iter().all(|&atom| map[atom] == atom) {
                for (atom, &image) in map.iter().enumerate() {
                    orbits.union(atom, image);
                }
            }
        }
        orbits
    }

    fn finish_leaf(&mut self, ranks: Vec<usize>) {
        let rendered = (self.render)(&ranks);
        let certificate = self.certificate(&ranks);
        let against_best = self.best.as_ref().map(|best| {
            (&rendered, &certificate).cmp(&(&best.rendered, &best.certificate))
        });
        match against_best {
            Some(Ordering::Greater) => {}
            Some(Ordering::Equal) => {
                let Some(best) = &self.best else {
                    return;
                };
                let mut atom_at = vec![0; ranks.len()];
                for (atom, &rank) in best.ranks.iter().enumerate() {
                    atom_at[rank] = atom;
                }
                let map = ranks.iter().map(|&rank| atom_at[rank]).collect();
                self.automorphisms.push(map);
            }
            Some(Ordering::Less) | None => {
                self.best = Some(Leaf {
                    ranks,
                    rendered,
                    certificate,
                });
            }
        }
    }

    fn certificate(&self, ranks: &[usize]) -> Certificate {
        let mut labelled = self.invariants.clone();
        for (atom, &rank) in ranks.iter().enumerate() {
            labelled[rank] = self.invariants[atom];
        }
        let mut bonds: Vec<(usize, usize, BondOrder)> = self
            .mol
            .bonds()
            .map(|(begin, end, bond)| {
                let (a, b) = (ranks[begin], ranks[end]);
                (a.min(b), a.max(b), bond.order)
            })
            .collect();
        bonds.sort_unstable();
        (labelled, bonds)
    }
}

fn invariant(mol: &Molecule, atom: usize) -> Invariant {
    let current = mol.atom(atom);
    (
        current.atomic_number,
        current.isotope.unwrap_or(0),
        current.charge,
        current.aromatic,
        current.hydrogens,
        mol.degree(atom),
        mol.is_ring_atom(atom),
    )
}

/// Map each key to its position among the sorted distinct keys.
fn dense_ranks<K: Ord + Clone>(keys: &[K]) -> Vec<usize> {
    let mut distinct = keys.to_vec();
    distinct.sort();
    distinct.dedup();
    keys.iter()
        .map(|key| distinct.partition_point(|candidate| candidate < key))
        .collect()
}

fn class_count(ranks: &[usize]) -> usize {
    let mut seen = ranks.to_vec();
    seen.sort_unstable();
    seen.dedup();
    seen.len()
}

fn refine(mol: &Molecule, mut ranks: Vec<usize>) -> Vec<usize> {
    let mut classes = class_count(&ranks);
    loop {
        let keys: Vec<(usize, Vec<(usize, BondOrder)>)> = (0..mol.atom_count())
            .map(|atom| {
                let mut around: Vec<(usize, BondOrder)> = mol
                    .neighbors(atom)
                    .map(|(neighbor, bond)| (ranks[neighbor], mol.bond(bond).order))
                    .collect();
                around.sort();
                (ranks[atom], around)
            })
            .collect();
        let next = dense_ranks(&keys);
        let next_classes = class_count(&next);
        if next_classes == classes {
            return ranks;
        }
        ranks = next;
        classes = next_classes;
    }
}

fn lowest_tied_rank(ranks: &[usize]) -> Option<usize> {
    let mut sorted = ranks.to_vec();
    sorted.sort_unstable();
    sorted
        .windows(2)
        .find(|pair| pair[0] == pair[1])
        .map(|pair| pair[0])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::smiles::parse_smiles;

    fn sorted(mut ranks: Vec<usize>) -> Vec<usize> {
        ranks.sort_unstable();
        ranks
    }

    #[test]
    fn ranks_are_a_permutation() {
        let mol = parse_smiles("c1ccccc1").unwrap();
        assert_eq!(sorted(canonical_ranks(&mol)), (0..6).collect::<Vec<_>>());

        let mol = parse_smiles("CC(C)(C)C").unwrap();
        assert_eq!(sorted(canonical_ranks(&mol)), (0..5).collect::<Vec<_>>());
    }

    #[test]
    fn ranks_follow_atoms_across_input_orders() {
        let forward = parse_smiles("OCC").unwrap();
        let backward = parse_smiles("CCO").unwrap();
        let forward_ranks = canonical_ranks(&forward);
        let backward_ranks = canonical_ranks(&backward);
        // the oxygen is atom 0 in one spelling and atom 2 in the other
        assert_eq!(forward_ranks[0], backward_ranks[2]);
        assert_eq!(forward_ranks[1], backward_ranks[1]);
        assert_eq!(forward_ranks[2], backward_ranks[0]);
    }

    #[test]
    fn symmetric_atoms_share_a_class() {
        let mol = parse_smiles("CC(C)O").unwrap();
        let classes = symmetry_classes(&mol);
        assert_eq!(classes[0], classes[2]);
        assert_ne!(classes[0], classes[1]);
        assert_ne!(canonical_ranks(&mol)[0], canonical_ranks(&mol)[2]);
    }

    #[test]
    fn ring_symmetry_prunes_the_search() {
        let mol = parse_smiles("C1CCCCC1").unwrap();
        let classes = symmetry_classes(&mol);
        assert!(classes.iter().all(|&class| class == classes[0]));
        let mut leaves = 0;
        let (ranks, _) = canonical_labeling(&mol, classes, |_| {
            leaves += 1;
            String::new()
        });
        assert_eq!(sorted(ranks), (0..6).collect::<Vec<_>>());
        // six starting atoms times two directions without pruning
        assert!(leaves < 12, "searched {leaves} leaves");
    }

    #[test]
    fn smallest_rendering_wins() {
        let mol = parse_smiles("CC(C)C").unwrap();
        let classes = symmetry_classes(&mol);
        let (ranks, rendered) = canonical_labeling(&mol, classes, |ranks| {
            // lower rank for atom 0 sorts first
            ranks[0].to_string()
        });
        assert_eq!(rendered, "1");
        // the central carbon holds rank 0, so a methyl can do no better than 1
        assert_eq!(ranks[0], 1);
        assert_eq!(ranks[1], 0);
    }

    #[test]
    fn empty_molecule_has_no_ranks() {
        assert!(canonical_ranks(&Molecule::new()).is_empty());
    }

    #[test]
    fn dense_ranks_share_equal_keys() {
        assert_eq!(dense_ranks(&[5, 1, 5, 3]), vec![2, 0, 2, 1]);
    }
}
