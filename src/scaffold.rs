//! Murcko scaffold keys.
//!
//! A record's scaffold key is the canonical SMILES of its Bemis–Murcko
//! framework: every ring system plus the linker atoms joining them, with
//! double-bonded atoms hanging directly off that framework kept in place.
//! Acyclic molecules have no framework and map to the empty key.

use std::collections::VecDeque;

use crate::errors::SmilesError;
use crate::smiles::{BondOrder, Molecule, parse_smiles, write_smiles};
use crate::types::{ScaffoldKey, SmilesStr};

/// Derives a grouping key from a structure encoding.
///
/// Records with equal keys are kept in the same split. Implement this to swap
/// in another canonicalizer; any `Fn(&str, bool) -> Result<ScaffoldKey, SmilesError>`
/// already qualifies.
pub trait ScaffoldKeyExtractor {
    /// Key for `smiles`; stereo tags participate only when `include_chirality` is set.
    fn scaffold_key(
        &self,
        smiles: &SmilesStr,
        include_chirality: bool,
    ) -> Result<ScaffoldKey, SmilesError>;
}

impl<F> ScaffoldKeyExtractor for F
where
    F: Fn(&SmilesStr, bool) -> Result<ScaffoldKey, SmilesError>,
{
    fn scaffold_key(
        &self,
        smiles: &SmilesStr,
        include_chirality: bool,
    ) -> Result<ScaffoldKey, SmilesError> {
        self(smiles, include_chirality)
    }
}

/// Built-in extractor: canonical SMILES of the Murcko framework.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MurckoScaffold;

impl ScaffoldKeyExtractor for MurckoScaffold {
    fn scaffold_key(
        &self,
        smiles: &SmilesStr,
        include_chirality: bool,
    ) -> Result<ScaffoldKey, SmilesError> {
        generate_scaffold(smiles, include_chirality)
    }
}

/// Canonical Murcko scaffold SMILES for `smiles`.
///
/// Returns the empty string for molecules without rings. Spelling-level
/// differences (atom order, Kekulé vs aromatic form, redundant brackets)
/// do not change the key.
///
/// ```
/// use molsplit::scaffold::generate_scaffold;
///
/// let aspirin = generate_scaffold("CC(=O)Oc1ccccc1C(=O)O", false).unwrap();
/// assert_eq!(aspirin, "c1ccccc1");
/// assert_eq!(generate_scaffold("CCO", false).unwrap(), "");
/// ```
pub fn generate_scaffold(
    smiles: &SmilesStr,
    include_chirality: bool,
) -> Result<ScaffoldKey, SmilesError> {
    let mut mol = parse_smiles(smiles)?;
    if !include_chirality {
        mol.clear_stereo();
    }
    Ok(write_smiles(&murcko_framework(&mol)))
}

/// Ring systems, linkers, and exocyclic double-bonded atoms of `mol`.
///
/// Atoms lose their stripped neighbours to implicit hydrogens, one per unit
/// of bond order. A tetrahedral tag survives when the centre ends up with at
/// most one hydrogen among its listed neighbours.
pub fn murcko_framework(mol: &Molecule) -> Molecule {
    let n = mol.atom_count();
    if !(0..n).any(|atom| mol.is_ring_atom(atom)) {
        return Molecule::new();
    }

    let mut kept = vec![true; n];
    let mut degree: Vec<usize> = (0..n).map(|atom| mol.degree(atom)).collect();
    let mut queue: VecDeque<usize> = (0..n)
        .filter(|&atom| !mol.is_ring_atom(atom) && degree[atom] <= 1)
        .collect();
    while let Some(atom) = queue.pop_front() {
        if !kept[atom] {
            continue;
        }
        kept[atom] = false;
        for (neighbor, _) in mol.neighbors(atom) {
            if !kept[neighbor] {
                continue;
            }
            degree[neighbor] -= 1;
            if !mol.is_ring_atom(neighbor) && degree[neighbor] <= 1 {
                queue.push_back(neighbor);
            }
        }
    }

    let exocyclic: Vec<usize> = (0..n)
        .filter(|&atom| !kept[atom] && mol.degree(atom) == 1)
        .filter(|&atom| {
            mol.neighbors(atom).any(|(neighbor, bond)| {
                kept[neighbor] && mol.bond(bond).order == BondOrder::Double
            })
        })
        .collect();
    for atom in exocyclic {
        kept[atom] = true;
    }

    extract(mol, &kept)
}

/// Copy the atoms flagged in `kept` into a fresh molecule.
fn extract(mol: &Molecule, kept: &[bool]) -> Molecule {
    let (mut framework, remap) = mol.induced(kept);
    for (atom, new_idx) in remap.iter().enumerate() {
        let Some(new_idx) = *new_idx else {
            continue;
        };
        let stripped: u32 = mol
            .neighbors(atom)
            .filter(|&(neighbor, _)| !kept[neighbor])
            .map(|(_, bond)| u32::from(mol.bond(bond).order.valence()))
            .sum();
        let copy = framework.atom_mut(new_idx);
        copy.hydrogens = copy
            .hydrogens
            .saturating_add(u8::try_from(stripped).unwrap_or(u8::MAX));
    }
    framework
}
