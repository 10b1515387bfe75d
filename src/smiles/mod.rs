//! Molecule graph with just enough chemistry to derive canonical scaffold keys.
//!
//! Reading lives in [`parse`], ring/aromaticity perception in `aromaticity`,
//! canonical atom ranking in [`canon`], and canonical SMILES output in [`write`].

mod aromaticity;
pub mod canon;
pub mod parse;
pub mod write;

use petgraph::algo::has_path_connecting;
use petgraph::graph::{EdgeIndex, EdgeReference, NodeIndex, UnGraph};
use petgraph::unionfind::UnionFind;
use petgraph::visit::{EdgeFiltered, EdgeRef};

use crate::constants::smiles::{ELEMENT_SYMBOLS, normal_valences};

pub use canon::{canonical_ranks, symmetry_classes};
pub use parse::parse_smiles;
pub use write::write_smiles;

/// Bond multiplicity as read from SMILES or assigned by aromaticity perception.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BondOrder {
    /// `-`, `/`, `\`, or an implicit bond between non-aromatic atoms.
    Single,
    /// `=`
    Double,
    /// `#`
    Triple,
    /// `$`
    Quadruple,
    /// `:` or an implicit ring bond between aromatic atoms.
    Aromatic,
}

impl BondOrder {
    /// Valence units consumed on each endpoint; aromatic bonds count as one.
    pub fn valence(self) -> u8 {
        match self {
            BondOrder::Single | BondOrder::Aromatic => 1,
            BondOrder::Double => 2,
            BondOrder::Triple => 3,
            BondOrder::Quadruple => 4,
        }
    }
}

/// Tetrahedral winding of the neighbours as listed, looking from the first one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Winding {
    /// `@`
    CounterClockwise,
    /// `@@`
    Clockwise,
}

impl Winding {
    /// The opposite winding.
    pub fn flipped(self) -> Self {
        match self {
            Winding::CounterClockwise => Winding::Clockwise,
            Winding::Clockwise => Winding::CounterClockwise,
        }
    }

    /// SMILES token for this winding.
    pub fn symbol(self) -> &'static str {
        match self {
            Winding::CounterClockwise => "@",
            Winding::Clockwise => "@@",
        }
    }
}

/// One entry of a stereocentre's neighbour ordering.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StereoNeighbor {
    /// A bonded atom, by index.
    Atom(usize),
    /// The implicit hydrogen written inside the bracket.
    Hydrogen,
}

/// Tetrahedral configuration recorded against a concrete neighbour order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Stereo {
    /// Winding of `order[1..]` viewed from `order[0]`.
    pub winding: Winding,
    /// Neighbours in the order the winding refers to.
    pub order: Vec<StereoNeighbor>,
}

/// A heavy atom (or explicit hydrogen) with its implicit hydrogen count folded in.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Atom {
    /// Atomic number; `0` is the `*` wildcard.
    pub atomic_number: u8,
    /// Whether the atom belongs to an aromatic system.
    pub aromatic: bool,
    /// Mass number when one was written.
    pub isotope: Option<u16>,
    /// Formal charge.
    pub charge: i8,
    /// Total attached hydrogens that are not graph atoms.
    pub hydrogens: u8,
    /// Tetrahedral configuration, if specified.
    pub stereo: Option<Stereo>,
}

impl Atom {
    /// A neutral, non-aromatic atom of the given element with no hydrogens.
    pub fn new(atomic_number: u8) -> Self {
        Self {
            atomic_number,
            aromatic: false,
            isotope: None,
            charge: 0,
            hydrogens: 0,
            stereo: None,
        }
    }

    /// Element symbol, capitalised.
    pub fn symbol(&self) -> &'static str {
        ELEMENT_SYMBOLS
            .get(usize::from(self.atomic_number))
            .copied()
            .unwrap_or("*")
    }
}

/// Edge weight of the molecular graph; endpoints live in the graph itself.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Bond {
    /// Bond multiplicity.
    pub order: BondOrder,
    /// Whether the bond lies on a cycle.
    pub in_ring: bool,
}

impl Bond {
    /// A bond of `order` with ring membership unset.
    pub fn new(order: BondOrder) -> Self {
        Self {
            order,
            in_ring: false,
        }
    }
}

/// Undirected molecular graph on a `petgraph` [`UnGraph`].
///
/// Atoms and bonds are only ever appended, so node and edge indices are dense
/// and double as plain `usize` atom and bond indices throughout the crate.
#[derive(Clone, Debug, Default)]
pub struct Molecule {
    graph: UnGraph<Atom, Bond>,
}

impl Molecule {
    /// An empty molecule.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an atom and return its index.
    pub fn add_atom(&mut self, atom: Atom) -> usize {
        self.graph.add_node(atom).index()
    }

    /// Append a bond and return its index. Ring membership starts unset.
    pub fn add_bond(&mut self, begin: usize, end: usize, order: BondOrder) -> usize {
        self.connect(begin, end, Bond::new(order))
    }

    pub(crate) fn connect(&mut self, begin: usize, end: usize, bond: Bond) -> usize {
        self.graph
            .add_edge(NodeIndex::new(begin), NodeIndex::new(end), bond)
            .index()
    }

    /// Atom at `atom`.
    pub fn atom(&self, atom: usize) -> &Atom {
        &self.graph[NodeIndex::new(atom)]
    }

    /// All atoms in index order.
    pub fn atoms(&self) -> impl Iterator<Item = &Atom> + '_ {
        self.graph.node_weights()
    }

    /// Bond at `bond`.
    pub fn bond(&self, bond: usize) -> &Bond {
        &self.graph[EdgeIndex::new(bond)]
    }

    /// `(begin, end, bond)` for every bond, in index order.
    pub fn bonds(&self) -> impl Iterator<Item = (usize, usize, &Bond)> + '_ {
        self.graph
            .edge_references()
            .map(|edge| (edge.source().index(), edge.target().index(), edge.weight()))
    }

    pub(crate) fn atom_mut(&mut self, atom: usize) -> &mut Atom {
        &mut self.graph[NodeIndex::new(atom)]
    }

    pub(crate) fn bond_mut(&mut self, bond: usize) -> &mut Bond {
        &mut self.graph[EdgeIndex::new(bond)]
    }

    /// Number of graph atoms.
    pub fn atom_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of bonds.
    pub fn bond_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// True when the molecule has no atoms.
    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// `(neighbour, bond index)` pairs of `atom`, in bond insertion order.
    pub fn neighbors(&self, atom: usize) -> impl Iterator<Item = (usize, usize)> + use<> {
        let node = NodeIndex::new(atom);
        let mut around: Vec<(usize, usize)> = self
            .graph
            .edges(node)
            .map(|edge| {
                let other = if edge.source() == node {
                    edge.target()
                } else {
                    edge.source()
                };
                (other.index(), edge.id().index())
            })
            .collect();
        around.sort_unstable_by_key(|&(_, bond)| bond);
        around.into_iter()
    }

    /// Number of graph neighbours of `atom`.
    pub fn degree(&self, atom: usize) -> usize {
        self.graph.edges(NodeIndex::new(atom)).count()
    }

    /// Bond joining `a` and `b`, if any.
    pub fn bond_between(&self, a: usize, b: usize) -> Option<&Bond> {
        self.graph
            .find_edge(NodeIndex::new(a), NodeIndex::new(b))
            .map(|edge| &self.graph[edge])
    }

    /// True when any bond of `atom` lies on a cycle.
    pub fn is_ring_atom(&self, atom: usize) -> bool {
        self.graph
            .edges(NodeIndex::new(atom))
            .any(|edge| edge.weight().in_ring)
    }

    /// Sum of bond valences on `atom`.
    pub fn bond_valence(&self, atom: usize) -> u32 {
        self.graph
            .edges(NodeIndex::new(atom))
            .map(|edge| u32::from(edge.weight().order.valence()))
            .sum()
    }

    /// Hydrogen count the atom would carry if written without brackets.
    pub fn implied_hydrogens(&self, atom: usize) -> u8 {
        let current = self.atom(atom);
        implied_hydrogens(current.atomic_number, current.aromatic, self.bond_valence(atom))
    }

    /// Drop every tetrahedral tag.
    pub fn clear_stereo(&mut self) {
        for atom in self.graph.node_weights_mut() {
            atom.stereo = None;
        }
    }

    /// Mark each bond that lies on a cycle.
    ///
    /// A bond is a ring bond when its endpoints stay connected without it.
    pub fn perceive_rings(&mut self) {
        let graph = &self.graph;
        let flags: Vec<bool> = graph
            .edge_references()
            .map(|edge| {
                let skipped = edge.id();
                let rest = EdgeFiltered::from_fn(graph, |other: EdgeReference<'_, Bond>| {
                    other.id() != skipped
                });
                has_path_connecting(&rest, edge.source(), edge.target(), None)
            })
            .collect();
        for (bond, in_ring) in self.graph.edge_weights_mut().zip(flags) {
            bond.in_ring = in_ring;
        }
    }

    /// Atom indices of each connected component, ascending, components
    /// ordered by their lowest atom.
    pub fn components(&self) -> Vec<Vec<usize>> {
        let mut sets = UnionFind::<usize>::new(self.atom_count());
        for edge in self.graph.edge_references() {
            sets.union(edge.source().index(), edge.target().index());
        }
        let mut slot_of_root: Vec<Option<usize>> = vec![None; self.atom_count()];
        let mut components: Vec<Vec<usize>> = Vec::new();
        for atom in 0..self.atom_count() {
            let root = sets.find(atom);
            let slot = *slot_of_root[root].get_or_insert_with(|| {
                components.push(Vec::new());
                components.len() - 1
            });
            components[slot].push(atom);
        }
        components
    }

    /// Each connected component as its own molecule.
    pub fn fragments(&self) -> Vec<Molecule> {
        let components = self.components();
        if components.len() <= 1 {
            return vec![self.clone()];
        }
        components
            .iter()
            .map(|atoms| {
                let mut kept = vec![false; self.atom_count()];
                for &atom in atoms {
                    kept[atom] = true;
                }
                self.induced(&kept).0
            })
            .collect()
    }

    /// Copy the atoms flagged in `kept` and the bonds among them.
    ///
    /// Returns the new molecule and the old-to-new index map. Stereo
    /// references to dropped neighbours become implicit hydrogens; a tag left
    /// with more than one hydrogen is dropped.
    pub(crate) fn induced(&self, kept: &[bool]) -> (Molecule, Vec<Option<usize>>) {
        let mut remap = vec![None; self.atom_count()];
        let mut sub = Molecule::new();
        for (atom, current) in self.atoms().enumerate() {
            if kept[atom] {
                let mut copy = current.clone();
                copy.stereo = None;
                remap[atom] = Some(sub.add_atom(copy));
            }
        }
        for (begin, end, bond) in self.bonds() {
            if let (Some(begin), Some(end)) = (remap[begin], remap[end]) {
                sub.connect(begin, end, *bond);
            }
        }
        for (atom, new_idx) in remap.iter().enumerate() {
            let (Some(new_idx), Some(stereo)) = (new_idx, &self.atom(atom).stereo) else {
                continue;
            };
            sub.atom_mut(*new_idx).stereo = remap_stereo(stereo, &remap);
        }
        (sub, remap)
    }
}

fn remap_stereo(stereo: &Stereo, remap: &[Option<usize>]) -> Option<Stereo> {
    let order: Vec<StereoNeighbor> = stereo
        .order
        .iter()
        .map(|neighbor| match *neighbor {
            StereoNeighbor::Atom(atom) => remap[atom]
                .map(StereoNeighbor::Atom)
                .unwrap_or(StereoNeighbor::Hydrogen),
            StereoNeighbor::Hydrogen => StereoNeighbor::Hydrogen,
        })
        .collect();
    let hydrogens = order
        .iter()
        .filter(|neighbor| matches!(neighbor, StereoNeighbor::Hydrogen))
        .count();
    (hydrogens <= 1).then_some(Stereo {
        winding: stereo.winding,
        order,
    })
}

/// Implicit hydrogens for an element given the valence already used by bonds.
///
/// Picks the smallest normal valence that fits; aromatic atoms reserve one
/// unit for the π system. Elements without a normal valence get none.
pub fn implied_hydrogens(atomic_number: u8, aromatic: bool, bond_valence: u32) -> u8 {
    let Some(&target) = normal_valences(atomic_number)
        .iter()
        .find(|&&valence| u32::from(valence) >= bond_valence)
    else {
        return 0;
    };
    // target fits in u8 and is at least bond_valence
    let free = u8::try_from(u32::from(target) - bond_valence).unwrap_or(0);
    if aromatic { free.saturating_sub(1) } else { free }
}
